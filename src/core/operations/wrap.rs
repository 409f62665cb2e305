//! Symmetric key wrapping.
//!
//! - AES Key Wrap (RFC 3394), used by `A*KW`, `PBES2-*` and `ECDH-ES+A*KW`
//! - AES-GCM key wrap, used by `A*GCMKW`

use aes::cipher::generic_array::GenericArray;
use aes_kw::{KekAes128, KekAes192, KekAes256};
use zeroize::Zeroizing;

use crate::core::algorithm::AesKeySize;
use crate::core::error::{JweError, JweResult};
use crate::core::operations::content::{gcm, random_bytes};
use crate::core::types::SealedKey;

/// Size of the RFC 3394 integrity check block.
pub const AES_KW_IV_SIZE: usize = 8;

/// Wraps `cek` with `kek` using RFC 3394 AES key wrap.
///
/// # Errors
///
/// - [`JweError::InvalidKeySize`] if `kek` does not match `size`
/// - [`JweError::InvalidKey`] if `cek` is shorter than 16 bytes or not a
///   multiple of 8
pub fn aes_key_wrap(size: AesKeySize, kek: &[u8], cek: &[u8]) -> JweResult<Vec<u8>> {
    check_kek(size, kek)?;
    if cek.len() < 16 || cek.len() % 8 != 0 {
        return Err(JweError::InvalidKey);
    }

    let mut out = vec![0u8; cek.len() + AES_KW_IV_SIZE];
    let result = match size {
        AesKeySize::A128 => KekAes128::new(GenericArray::from_slice(kek)).wrap(cek, &mut out),
        AesKeySize::A192 => KekAes192::new(GenericArray::from_slice(kek)).wrap(cek, &mut out),
        AesKeySize::A256 => KekAes256::new(GenericArray::from_slice(kek)).wrap(cek, &mut out),
    };
    result.map_err(|_| JweError::CryptoError)?;
    Ok(out)
}

/// Unwraps an RFC 3394 wrapped key.
///
/// # Errors
///
/// - [`JweError::InvalidKeySize`] if `kek` does not match `size`
/// - [`JweError::InvalidCiphertext`] if `wrapped` is shorter than 24 bytes
///   or not a multiple of 8
/// - [`JweError::DecryptionFailed`] if the integrity check fails
pub fn aes_key_unwrap(
    size: AesKeySize,
    kek: &[u8],
    wrapped: &[u8],
) -> JweResult<Zeroizing<Vec<u8>>> {
    check_kek(size, kek)?;
    if wrapped.len() < 24 || wrapped.len() % 8 != 0 {
        return Err(JweError::InvalidCiphertext);
    }

    let mut out = Zeroizing::new(vec![0u8; wrapped.len() - AES_KW_IV_SIZE]);
    let result = match size {
        AesKeySize::A128 => KekAes128::new(GenericArray::from_slice(kek)).unwrap(wrapped, &mut out),
        AesKeySize::A192 => KekAes192::new(GenericArray::from_slice(kek)).unwrap(wrapped, &mut out),
        AesKeySize::A256 => KekAes256::new(GenericArray::from_slice(kek)).unwrap(wrapped, &mut out),
    };
    result.map_err(|_| JweError::DecryptionFailed)?;
    Ok(out)
}

/// Seals `cek` with AES-GCM under `kek`, authenticating `aad`.
///
/// A fresh 96-bit IV is generated unless one is supplied.
pub fn aes_gcm_wrap(
    size: AesKeySize,
    kek: &[u8],
    cek: &[u8],
    iv: Option<&[u8]>,
    aad: &[u8],
) -> JweResult<SealedKey> {
    check_kek(size, kek)?;
    let iv = match iv {
        Some(iv) => iv.to_vec(),
        None => random_bytes(gcm::GCM_IV_SIZE)?,
    };
    let (ciphertext, tag) = gcm::encrypt(size, kek, &iv, aad, cek)?;
    Ok(SealedKey {
        iv,
        ciphertext,
        tag,
    })
}

/// Opens an AES-GCM wrapped key.
///
/// # Errors
///
/// Returns [`JweError::DecryptionFailed`] if the tag does not verify.
pub fn aes_gcm_unwrap(
    size: AesKeySize,
    kek: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
    aad: &[u8],
) -> JweResult<Zeroizing<Vec<u8>>> {
    check_kek(size, kek)?;
    gcm::decrypt(size, kek, iv, aad, ciphertext, tag).map(Zeroizing::new)
}

fn check_kek(size: AesKeySize, kek: &[u8]) -> JweResult<()> {
    if kek.len() == size.bytes() {
        Ok(())
    } else {
        Err(JweError::InvalidKeySize {
            expected: size.bytes(),
            actual: kek.len(),
        })
    }
}
