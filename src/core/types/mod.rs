//! JWE value types.
//!
//! - [`Key`] - Caller key material and its capabilities
//! - [`ContentEncryptionKey`] - The per-message CEK
//! - [`SealedEnvelope`] / [`Recipient`] - A JWE independent of its serialization

mod cek;
mod envelope;
mod key;

pub use cek::ContentEncryptionKey;
pub use envelope::{Recipient, SealedEnvelope};
#[cfg(feature = "ecdh")]
pub use key::{EcPrivateKey, EcPublicKey};
pub use key::{Curve, Key, KeyKind, KeyUse, Password, SealedKey, SymmetricKey};
