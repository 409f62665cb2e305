//! AES-CBC + HMAC-SHA2 composite authenticated encryption.
//!
//! The CEK is split in two halves: the first is the HMAC key, the second
//! the AES key. The tag is
//! `HMAC(MAC_KEY, AAD || IV || ciphertext || AL)` truncated to the length
//! of the MAC key, where `AL` is the AAD length in bits as a 64-bit
//! big-endian integer.
//!
//! Decryption verifies the tag in constant time before touching the
//! padding; padding and tag failures are reported identically.

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::core::algorithm::AesKeySize;
use crate::core::error::{JweError, JweResult};

/// CBC IV length in bytes.
pub const CBC_IV_SIZE: usize = 16;

/// Encrypts `plaintext`, returning `(ciphertext, tag)`.
pub fn encrypt(
    size: AesKeySize,
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> JweResult<(Vec<u8>, Vec<u8>)> {
    let (mac_key, enc_key) = split_key(size, cek)?;
    check_iv(iv)?;

    let ciphertext = match size {
        AesKeySize::A128 => cbc::Encryptor::<aes::Aes128>::new_from_slices(enc_key, iv)
            .map_err(|_| JweError::CryptoError)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        AesKeySize::A192 => cbc::Encryptor::<aes::Aes192>::new_from_slices(enc_key, iv)
            .map_err(|_| JweError::CryptoError)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        AesKeySize::A256 => cbc::Encryptor::<aes::Aes256>::new_from_slices(enc_key, iv)
            .map_err(|_| JweError::CryptoError)?
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
    };

    let tag = compute_tag(size, mac_key, aad, iv, &ciphertext)?;
    Ok((ciphertext, tag))
}

/// Verifies `tag` and decrypts `ciphertext`.
pub fn decrypt(
    size: AesKeySize,
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> JweResult<Vec<u8>> {
    let (mac_key, enc_key) = split_key(size, cek)?;
    check_iv(iv)?;

    let expected = compute_tag(size, mac_key, aad, iv, ciphertext)?;
    if !bool::from(expected.ct_eq(tag)) {
        return Err(JweError::DecryptionFailed);
    }

    let plaintext = match size {
        AesKeySize::A128 => cbc::Decryptor::<aes::Aes128>::new_from_slices(enc_key, iv)
            .map_err(|_| JweError::DecryptionFailed)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        AesKeySize::A192 => cbc::Decryptor::<aes::Aes192>::new_from_slices(enc_key, iv)
            .map_err(|_| JweError::DecryptionFailed)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        AesKeySize::A256 => cbc::Decryptor::<aes::Aes256>::new_from_slices(enc_key, iv)
            .map_err(|_| JweError::DecryptionFailed)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
    };
    plaintext.map_err(|_| JweError::DecryptionFailed)
}

fn split_key(size: AesKeySize, cek: &[u8]) -> JweResult<(&[u8], &[u8])> {
    let half = size.bytes();
    if cek.len() != half * 2 {
        return Err(JweError::InvalidKeySize {
            expected: half * 2,
            actual: cek.len(),
        });
    }
    Ok(cek.split_at(half))
}

fn check_iv(iv: &[u8]) -> JweResult<()> {
    if iv.len() == CBC_IV_SIZE {
        Ok(())
    } else {
        Err(JweError::InvalidLength {
            field: "iv",
            expected: CBC_IV_SIZE,
            actual: iv.len(),
        })
    }
}

/// Computes the truncated tag; the digest is chosen by the key size.
fn compute_tag(
    size: AesKeySize,
    mac_key: &[u8],
    aad: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> JweResult<Vec<u8>> {
    let al = u64::try_from(aad.len())
        .ok()
        .and_then(|len| len.checked_mul(8))
        .ok_or(JweError::CryptoError)?
        .to_be_bytes();

    let full = match size {
        AesKeySize::A128 => mac::<Hmac<Sha256>>(mac_key, &[aad, iv, ciphertext, &al])?,
        AesKeySize::A192 => mac::<Hmac<Sha384>>(mac_key, &[aad, iv, ciphertext, &al])?,
        AesKeySize::A256 => mac::<Hmac<Sha512>>(mac_key, &[aad, iv, ciphertext, &al])?,
    };
    Ok(full[..size.bytes()].to_vec())
}

fn mac<M: Mac + hmac::digest::KeyInit>(key: &[u8], parts: &[&[u8]]) -> JweResult<Zeroizing<Vec<u8>>> {
    let mut mac = <M as Mac>::new_from_slice(key).map_err(|_| JweError::CryptoError)?;
    for part in parts {
        mac.update(part);
    }
    Ok(Zeroizing::new(mac.finalize().into_bytes().to_vec()))
}
