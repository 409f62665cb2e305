//! AES-GCM content encryption.
//!
//! 96-bit IV, 128-bit detached tag. The same primitive backs the
//! `A*GCMKW` key wrap algorithms.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::{Aes128, Aes192, Aes256};
use aes_gcm::AesGcm;

use crate::core::algorithm::AesKeySize;
use crate::core::error::{JweError, JweResult};

/// GCM IV length in bytes.
pub const GCM_IV_SIZE: usize = 12;

/// GCM tag length in bytes.
pub const GCM_TAG_SIZE: usize = 16;

type Aes128Gcm = AesGcm<Aes128, U12>;
type Aes192Gcm = AesGcm<Aes192, U12>;
type Aes256Gcm = AesGcm<Aes256, U12>;

/// Encrypts `plaintext`, returning `(ciphertext, tag)`.
pub fn encrypt(
    size: AesKeySize,
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> JweResult<(Vec<u8>, Vec<u8>)> {
    check_iv(iv)?;
    match size {
        AesKeySize::A128 => seal::<Aes128Gcm>(key, iv, aad, plaintext),
        AesKeySize::A192 => seal::<Aes192Gcm>(key, iv, aad, plaintext),
        AesKeySize::A256 => seal::<Aes256Gcm>(key, iv, aad, plaintext),
    }
}

/// Verifies `tag` and decrypts `ciphertext`.
///
/// No plaintext is released when the tag does not verify.
pub fn decrypt(
    size: AesKeySize,
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> JweResult<Vec<u8>> {
    check_iv(iv)?;
    if tag.len() != GCM_TAG_SIZE {
        return Err(JweError::InvalidLength {
            field: "tag",
            expected: GCM_TAG_SIZE,
            actual: tag.len(),
        });
    }
    match size {
        AesKeySize::A128 => open::<Aes128Gcm>(key, iv, aad, ciphertext, tag),
        AesKeySize::A192 => open::<Aes192Gcm>(key, iv, aad, ciphertext, tag),
        AesKeySize::A256 => open::<Aes256Gcm>(key, iv, aad, ciphertext, tag),
    }
}

fn check_iv(iv: &[u8]) -> JweResult<()> {
    if iv.len() == GCM_IV_SIZE {
        Ok(())
    } else {
        Err(JweError::InvalidLength {
            field: "iv",
            expected: GCM_IV_SIZE,
            actual: iv.len(),
        })
    }
}

fn seal<C: KeyInit + AeadInPlace>(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> JweResult<(Vec<u8>, Vec<u8>)> {
    let cipher = C::new_from_slice(key).map_err(|_| JweError::InvalidKeySize {
        expected: C::key_size(),
        actual: key.len(),
    })?;
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(aes_gcm::aead::Nonce::<C>::from_slice(iv), aad, &mut buffer)
        .map_err(|_| JweError::CryptoError)?;
    Ok((buffer, tag.to_vec()))
}

fn open<C: KeyInit + AeadInPlace>(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> JweResult<Vec<u8>> {
    let cipher = C::new_from_slice(key).map_err(|_| JweError::InvalidKeySize {
        expected: C::key_size(),
        actual: key.len(),
    })?;
    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            aes_gcm::aead::Nonce::<C>::from_slice(iv),
            aad,
            &mut buffer,
            aes_gcm::aead::Tag::<C>::from_slice(tag),
        )
        .map_err(|_| JweError::DecryptionFailed)?;
    Ok(buffer)
}
