//! JSON Web Encryption (JWE, RFC 7516) with the RFC 7518 algorithms.
//!
//! This crate turns plaintext into an authenticated, optionally compressed
//! envelope addressed to one or more recipients, and reverses it given the
//! right key. Callers pick the algorithms and supply keys; the crate drives
//! key management, content encryption and serialization.
//!
//! # Quick Start
//!
//! ```rust
//! use jwekit::core::jwe;
//! use jwekit::core::types::{Key, SealedEnvelope};
//! use jwekit::{AesKeySize, ContentAlgorithm, KeyAlgorithm, Registry};
//!
//! let registry = Registry::with_defaults();
//! let key = Key::symmetric([0x42u8; 32]);
//!
//! // Encrypt and serialize
//! let envelope = jwe::encrypt(
//!     &registry,
//!     b"The true sign of intelligence is not knowledge but imagination.",
//!     KeyAlgorithm::AesKeyWrap(AesKeySize::A256),
//!     &key,
//!     ContentAlgorithm::CbcHmac(AesKeySize::A128),
//! )
//! .expect("encrypt should succeed");
//! let compact = envelope.to_compact().expect("single recipient");
//! assert_eq!(compact.split('.').count(), 5);
//!
//! // Parse and decrypt
//! let parsed: SealedEnvelope = compact.parse().expect("parse should succeed");
//! let plaintext = jwe::decrypt(&registry, &parsed, &key).expect("decrypt should succeed");
//! assert!(plaintext.starts_with(b"The true sign"));
//! ```
//!
//! # Algorithms
//!
//! | `alg` | Key | Feature |
//! |-------|-----|---------|
//! | `dir` | symmetric | |
//! | `A128KW`, `A192KW`, `A256KW` | symmetric | |
//! | `A128GCMKW`, `A192GCMKW`, `A256GCMKW` | symmetric | |
//! | `PBES2-HS256+A128KW`, `PBES2-HS384+A192KW`, `PBES2-HS512+A256KW` | password | |
//! | `RSA-OAEP`, `RSA-OAEP-256`, `RSA-OAEP-384`, `RSA-OAEP-512` | RSA | `rsa` |
//! | `RSA1_5` | RSA | `rsa1_5` |
//! | `ECDH-ES`, `ECDH-ES+A128KW`, `ECDH-ES+A192KW`, `ECDH-ES+A256KW` | P-256, P-384, X25519 | `ecdh` |
//!
//! | `enc` | CEK |
//! |-------|-----|
//! | `A128GCM`, `A192GCM`, `A256GCM` | 16, 24, 32 bytes |
//! | `A128CBC-HS256`, `A192CBC-HS384`, `A256CBC-HS512` | 32, 48, 64 bytes |
//!
//! `zip`: `DEF` (raw DEFLATE, feature `deflate`).
//!
//! # Features
//!
//! ```toml
//! [dependencies]
//! jwekit = "0.1"  # rsa, ecdh, deflate, prelude
//! jwekit = { version = "0.1", default-features = false }  # symmetric and password only
//! jwekit = { version = "0.1", features = ["rsa1_5"] }  # legacy RSA1_5 (insecure)
//! ```
//!
//! # Security
//!
//! - Key material is zeroized on drop
//! - Debug output redacts sensitive key material
//! - Every decryption failure maps to the same [`JweError::DecryptionFailed`]
//! - RSA failures continue with a random CEK (RFC 7516 section 11.5)
//! - CBC-HMAC verifies the tag in constant time before removing padding
//! - PBES2 iteration counts are bounded on decryption
//! - Decompression output is capped
//! - No unsafe code
//!
//! # Modules
//!
//! - [`core`] - Core types and operations
//! - [`prelude`] - Ergonomic imports (requires `prelude` feature)

pub mod core;

#[cfg(feature = "prelude")]
pub mod prelude;

// Re-export commonly used items at crate root
pub use crate::core::algorithm::{AesKeySize, ContentAlgorithm, KeyAlgorithm, RsaPadding};
pub use crate::core::error::{JweError, JweResult};
pub use crate::core::header::JoseHeader;
pub use crate::core::jwe::{decrypt, decrypt_with, encrypt, encrypt_with};
pub use crate::core::registry::Registry;
pub use crate::core::types::{ContentEncryptionKey, Key, Recipient, SealedEnvelope};
