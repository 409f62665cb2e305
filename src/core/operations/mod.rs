//! Cryptographic operations for JWE.
//!
//! - [`content`] - Content encryption (AES-GCM, AES-CBC-HMAC-SHA2)
//! - [`wrap`] - AES key wrap and AES-GCM key wrap
//! - [`pbes2`] - Password-based key wrapping (PBKDF2)
//! - [`rsa_kem`] - RSA key encryption (requires `rsa`)
//! - [`ecdh`] - ECDH-ES key agreement (requires `ecdh`)
//! - [`kdf`] - Concat KDF
//! - [`dispatch`] - Key management per `alg`
//! - [`compress`] - `zip` codecs

pub mod compress;
pub mod content;
pub mod dispatch;
pub mod kdf;
pub mod pbes2;
pub mod wrap;

#[cfg(feature = "ecdh")]
pub mod ecdh;

#[cfg(feature = "rsa")]
pub mod rsa_kem;
