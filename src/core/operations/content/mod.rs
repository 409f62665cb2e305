//! Content encryption (the `enc` algorithms).
//!
//! - [`gcm`] - AES-GCM (`A128GCM`, `A192GCM`, `A256GCM`)
//! - [`cbc_hmac`] - AES-CBC with HMAC-SHA2 (`A128CBC-HS256`, `A192CBC-HS384`, `A256CBC-HS512`)
//!
//! Both families take the CEK, IV and AAD and produce a ciphertext and a
//! detached authentication tag. Key, IV and tag lengths are checked before
//! any cipher is constructed.

pub mod cbc_hmac;
pub mod gcm;

use rand_core::{OsRng, RngCore};

use crate::core::algorithm::ContentAlgorithm;
use crate::core::error::{JweError, JweResult};

/// Output of content encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCiphertext {
    /// Initialization vector.
    pub iv: Vec<u8>,
    /// Ciphertext.
    pub ciphertext: Vec<u8>,
    /// Authentication tag.
    pub tag: Vec<u8>,
}

/// Encrypts `plaintext` under `cek`.
///
/// A fresh random IV is generated unless `iv` is supplied.
///
/// # Errors
///
/// - [`JweError::InvalidKeySize`] if the CEK does not fit `enc`
/// - [`JweError::InvalidLength`] if a supplied IV has the wrong length
pub fn encrypt_content(
    enc: ContentAlgorithm,
    cek: &[u8],
    iv: Option<&[u8]>,
    aad: &[u8],
    plaintext: &[u8],
) -> JweResult<ContentCiphertext> {
    check_key(enc, cek)?;
    let iv = match iv {
        Some(iv) => {
            check_len("iv", enc.iv_len(), iv.len())?;
            iv.to_vec()
        }
        None => random_bytes(enc.iv_len())?,
    };

    let (ciphertext, tag) = match enc {
        ContentAlgorithm::Gcm(size) => gcm::encrypt(size, cek, &iv, aad, plaintext)?,
        ContentAlgorithm::CbcHmac(size) => cbc_hmac::encrypt(size, cek, &iv, aad, plaintext)?,
    };

    Ok(ContentCiphertext {
        iv,
        ciphertext,
        tag,
    })
}

/// Verifies and decrypts a ciphertext.
///
/// # Errors
///
/// - [`JweError::InvalidKeySize`] if the CEK does not fit `enc`
/// - [`JweError::InvalidLength`] if the IV or tag has the wrong length
/// - [`JweError::DecryptionFailed`] on any authentication or padding failure
pub fn decrypt_content(
    enc: ContentAlgorithm,
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> JweResult<Vec<u8>> {
    check_key(enc, cek)?;
    check_len("iv", enc.iv_len(), iv.len())?;
    check_len("tag", enc.tag_len(), tag.len())?;

    match enc {
        ContentAlgorithm::Gcm(size) => gcm::decrypt(size, cek, iv, aad, ciphertext, tag),
        ContentAlgorithm::CbcHmac(size) => cbc_hmac::decrypt(size, cek, iv, aad, ciphertext, tag),
    }
}

fn check_key(enc: ContentAlgorithm, cek: &[u8]) -> JweResult<()> {
    if cek.len() == enc.key_len() {
        Ok(())
    } else {
        Err(JweError::InvalidKeySize {
            expected: enc.key_len(),
            actual: cek.len(),
        })
    }
}

fn check_len(field: &'static str, expected: usize, actual: usize) -> JweResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(JweError::InvalidLength {
            field,
            expected,
            actual,
        })
    }
}

/// Fills a new buffer from the OS CSPRNG.
pub(crate) fn random_bytes(len: usize) -> JweResult<Vec<u8>> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|_| JweError::CryptoError)?;
    Ok(bytes)
}
