//! RSA key encryption (`RSA1_5`, `RSA-OAEP`, `RSA-OAEP-256/384/512`).
//!
//! The CEK is encrypted directly under the recipient's RSA public key.
//! Moduli below 2048 bits are refused.
//!
//! # Security Warning
//!
//! **The `rsa` crate is vulnerable to [RUSTSEC-2023-0071] (Marvin Attack).**
//! Every decryption failure is reported as the same opaque error, and the
//! dispatcher continues with a random CEK on failure so the outcome is only
//! observable after content decryption. Prefer ECDH-ES for new deployments.
//!
//! [RUSTSEC-2023-0071]: https://rustsec.org/advisories/RUSTSEC-2023-0071

use rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::core::algorithm::RsaPadding;
use crate::core::error::{JweError, JweResult};

/// Smallest accepted modulus, in bytes (2048 bits).
pub const MIN_MODULUS_SIZE: usize = 256;

/// Encrypts `cek` for `recipient`.
///
/// # Errors
///
/// - [`JweError::InvalidKey`] if the modulus is shorter than 2048 bits
/// - [`JweError::UnsupportedAlgorithm`] for `RSA1_5` without the `rsa1_5` feature
pub fn encrypt(recipient: &RsaPublicKey, padding: RsaPadding, cek: &[u8]) -> JweResult<Vec<u8>> {
    if recipient.size() < MIN_MODULUS_SIZE {
        return Err(JweError::InvalidKey);
    }

    let result = match padding {
        RsaPadding::Pkcs1v15 => return encrypt_pkcs1v15(recipient, cek),
        RsaPadding::Oaep => recipient.encrypt(&mut OsRng, Oaep::new::<sha1::Sha1>(), cek),
        RsaPadding::Oaep256 => recipient.encrypt(&mut OsRng, Oaep::new::<sha2::Sha256>(), cek),
        RsaPadding::Oaep384 => recipient.encrypt(&mut OsRng, Oaep::new::<sha2::Sha384>(), cek),
        RsaPadding::Oaep512 => recipient.encrypt(&mut OsRng, Oaep::new::<sha2::Sha512>(), cek),
    };
    result.map_err(|_| JweError::CryptoError)
}

/// Decrypts an encrypted CEK.
///
/// # Errors
///
/// Returns [`JweError::DecryptionFailed`] for every failure, including a
/// ciphertext of the wrong length.
pub fn decrypt(
    private: &RsaPrivateKey,
    padding: RsaPadding,
    encrypted_key: &[u8],
) -> JweResult<Zeroizing<Vec<u8>>> {
    if private.size() < MIN_MODULUS_SIZE {
        return Err(JweError::InvalidKey);
    }
    if encrypted_key.len() != private.size() {
        return Err(JweError::DecryptionFailed);
    }

    let result = match padding {
        RsaPadding::Pkcs1v15 => return decrypt_pkcs1v15(private, encrypted_key),
        RsaPadding::Oaep => private.decrypt(Oaep::new::<sha1::Sha1>(), encrypted_key),
        RsaPadding::Oaep256 => private.decrypt(Oaep::new::<sha2::Sha256>(), encrypted_key),
        RsaPadding::Oaep384 => private.decrypt(Oaep::new::<sha2::Sha384>(), encrypted_key),
        RsaPadding::Oaep512 => private.decrypt(Oaep::new::<sha2::Sha512>(), encrypted_key),
    };
    result
        .map(Zeroizing::new)
        .map_err(|_| JweError::DecryptionFailed)
}

#[cfg(feature = "rsa1_5")]
fn encrypt_pkcs1v15(recipient: &RsaPublicKey, cek: &[u8]) -> JweResult<Vec<u8>> {
    recipient
        .encrypt(&mut OsRng, rsa::Pkcs1v15Encrypt, cek)
        .map_err(|_| JweError::CryptoError)
}

#[cfg(not(feature = "rsa1_5"))]
fn encrypt_pkcs1v15(_recipient: &RsaPublicKey, _cek: &[u8]) -> JweResult<Vec<u8>> {
    Err(JweError::UnsupportedAlgorithm("RSA1_5".into()))
}

#[cfg(feature = "rsa1_5")]
fn decrypt_pkcs1v15(private: &RsaPrivateKey, encrypted_key: &[u8]) -> JweResult<Zeroizing<Vec<u8>>> {
    private
        .decrypt(rsa::Pkcs1v15Encrypt, encrypted_key)
        .map(Zeroizing::new)
        .map_err(|_| JweError::DecryptionFailed)
}

#[cfg(not(feature = "rsa1_5"))]
fn decrypt_pkcs1v15(
    _private: &RsaPrivateKey,
    _encrypted_key: &[u8],
) -> JweResult<Zeroizing<Vec<u8>>> {
    Err(JweError::UnsupportedAlgorithm("RSA1_5".into()))
}
