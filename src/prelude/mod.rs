//! Ergonomic layer for JWE operations.
//!
//! The prelude module re-exports the types most callers need, together
//! with builder patterns and parameter presets.
//!
//! # Usage
//!
//! ```rust
//! use jwekit::prelude::*;
//! ```

pub mod builders;

pub use builders::{JweBuilder, Pbes2Builder};

// Re-export core types for convenience
pub use crate::core::algorithm::{AesKeySize, ContentAlgorithm, KeyAlgorithm, RsaPadding};
pub use crate::core::error::{JweError, JweResult};
pub use crate::core::header::JoseHeader;
pub use crate::core::jwe::{
    decrypt, decrypt_with, encrypt, encrypt_with, DecryptOptions, EncryptOptions, RecipientSpec,
};
pub use crate::core::operations::pbes2::{Pbes2Params, Pbes2Policy};
pub use crate::core::registry::Registry;
#[cfg(feature = "ecdh")]
pub use crate::core::types::{EcPrivateKey, EcPublicKey};
pub use crate::core::types::{ContentEncryptionKey, Curve, Key, SealedEnvelope};

#[cfg(feature = "deflate")]
pub use crate::core::operations::compress::Deflate;
pub use crate::core::operations::compress::Compressor;
