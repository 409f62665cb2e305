//! Error types for JWE operations.
//!
//! This module provides a unified error type for all JWE operations.
//! Errors fall into a few families: structural (the envelope or header is
//! malformed), algorithm (an identifier is unknown or unsupported), key
//! (the supplied key cannot serve the requested algorithm) and
//! cryptographic. Error messages are intentionally vague for the
//! cryptographic family to avoid leaking information that could aid
//! padding-oracle or key-recovery attacks.

use thiserror::Error;

/// Errors that can occur when producing or opening a JWE.
#[derive(Debug, Error)]
pub enum JweError {
    /// The serialized envelope does not have the expected shape.
    #[error("Invalid JWE format: {0}")]
    InvalidFormat(String),

    /// Base64url decoding error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// JSON parsing error (header or JSON serialization).
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A header parameter required by the selected algorithm is missing.
    #[error("Missing required header parameter: {0}")]
    MissingHeader(&'static str),

    /// A header parameter is present but malformed.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// An IV or tag does not have the length fixed by the content algorithm.
    #[error("Invalid {field} length: expected {expected}, got {actual}")]
    InvalidLength {
        /// The offending field (`iv` or `tag`).
        field: &'static str,
        /// Length required by the algorithm.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// A wrapped key has a length no key-wrap output can have.
    #[error("Invalid ciphertext length")]
    InvalidCiphertext,

    /// The `alg` or `enc` identifier is not registered.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The `zip` identifier is not registered.
    #[error("Unsupported compression algorithm: {0}")]
    UnsupportedCompression(String),

    /// The elliptic curve is not supported.
    #[error("Unsupported curve: {0}")]
    UnsupportedCurve(String),

    /// A `crit` entry names an extension this registry does not understand.
    #[error("Unsupported critical header parameter: {0}")]
    UnsupportedCritical(String),

    /// The key kind cannot be used with the requested algorithm.
    #[error("Key of type {key} cannot be used with {algorithm}")]
    KeyMismatch {
        /// Algorithm identifier.
        algorithm: String,
        /// Declared key kind.
        key: &'static str,
    },

    /// The symmetric key length does not match the algorithm.
    #[error("Invalid key size: expected {expected} bytes, got {actual}")]
    InvalidKeySize {
        /// Length required by the algorithm.
        expected: usize,
        /// Length of the supplied key.
        actual: usize,
    },

    /// The key material is invalid (bad point, weak modulus, etc.).
    #[error("Invalid key material")]
    InvalidKey,

    /// A PBES2 iteration count falls outside the accepted policy bounds.
    #[error("PBES2 iteration count {0} outside accepted bounds")]
    IterationCountOutOfRange(u32),

    /// Decryption failed (wrong key, tampered data, bad padding, etc.).
    /// Intentionally vague for security.
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Generic cryptographic error.
    /// Intentionally vague for security.
    #[error("Cryptographic operation failed")]
    CryptoError,

    /// Compression or decompression failed.
    #[error("Compression failed: {0}")]
    Compression(String),
}

impl JweError {
    /// Returns `true` for errors raised while parsing or validating the
    /// envelope shape, before any key is touched.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat(_)
                | Self::Base64Decode(_)
                | Self::Json(_)
                | Self::MissingHeader(_)
                | Self::InvalidHeader(_)
                | Self::InvalidLength { .. }
                | Self::InvalidCiphertext
        )
    }

    /// Returns `true` for unknown or unsupported identifiers.
    #[must_use]
    pub const fn is_algorithm(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedAlgorithm(_)
                | Self::UnsupportedCompression(_)
                | Self::UnsupportedCurve(_)
                | Self::UnsupportedCritical(_)
        )
    }

    /// Returns `true` for the undifferentiated cryptographic failures.
    #[must_use]
    pub const fn is_cryptographic(&self) -> bool {
        matches!(self, Self::DecryptionFailed | Self::CryptoError)
    }
}

/// Result type alias for JWE operations.
pub type JweResult<T> = Result<T, JweError>;
