//! Concat KDF (NIST SP 800-56A section 5.8.1) with SHA-256.
//!
//! Used by ECDH-ES to turn the agreed secret `Z` into a CEK or KEK:
//!
//! ```text
//! K(i) = SHA-256(i || Z || OtherInfo), i = 1, 2, ...  (i is u32 big-endian)
//! OtherInfo = AlgorithmID || PartyUInfo || PartyVInfo || SuppPubInfo
//! ```
//!
//! `AlgorithmID`, `PartyUInfo` and `PartyVInfo` are each prefixed with
//! their length as a u32 big-endian integer. `SuppPubInfo` is the output
//! length in bits. `SuppPrivInfo` is empty.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::core::error::{JweError, JweResult};

/// Derives `key_len` bytes from the shared secret `z`.
///
/// # Errors
///
/// Returns [`JweError::CryptoError`] if a length does not fit in 32 bits.
pub fn concat_kdf(
    z: &[u8],
    algorithm_id: &str,
    apu: &[u8],
    apv: &[u8],
    key_len: usize,
) -> JweResult<Zeroizing<Vec<u8>>> {
    let bits = key_len
        .checked_mul(8)
        .and_then(|bits| u32::try_from(bits).ok())
        .ok_or(JweError::CryptoError)?;

    let mut other_info = Vec::new();
    for field in [algorithm_id.as_bytes(), apu, apv] {
        let len = u32::try_from(field.len()).map_err(|_| JweError::CryptoError)?;
        other_info.extend_from_slice(&len.to_be_bytes());
        other_info.extend_from_slice(field);
    }
    other_info.extend_from_slice(&bits.to_be_bytes());

    let mut output = Zeroizing::new(Vec::with_capacity(key_len + 32));
    let mut counter: u32 = 1;
    while output.len() < key_len {
        let mut hasher = Sha256::new();
        hasher.update(counter.to_be_bytes());
        hasher.update(z);
        hasher.update(&other_info);
        output.extend_from_slice(&hasher.finalize());
        counter = counter.checked_add(1).ok_or(JweError::CryptoError)?;
    }
    output.truncate(key_len);
    Ok(output)
}
