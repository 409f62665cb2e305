//! Core JWE types and operations.
//!
//! - [`error`] - Error types for JWE operations
//! - [`algorithm`] - `alg` and `enc` identifiers
//! - [`header`] - JOSE header model
//! - [`registry`] - Algorithm, compressor and `crit` registry
//! - [`types`] - Keys, CEK and the sealed envelope
//! - [`operations`] - Cryptographic operations (content, key management, compression)
//! - [`serialization`] - Compact and JSON serializations
//! - [`jwe`] - Encrypt/decrypt facade

pub mod algorithm;
pub mod error;
pub mod header;
pub mod jwe;
pub mod operations;
pub mod registry;
pub mod serialization;
pub mod types;

// Re-export commonly used items
pub use algorithm::{AesKeySize, ContentAlgorithm, KeyAlgorithm, RsaPadding};
pub use error::{JweError, JweResult};
pub use header::JoseHeader;
pub use registry::Registry;
