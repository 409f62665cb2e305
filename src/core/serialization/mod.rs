//! JWE serializations.
//!
//! - [`compact`] - `B64U(protected).B64U(ek).B64U(iv).B64U(ct).B64U(tag)`
//! - [`json`] - flattened and general JSON
//!
//! Parsing only checks structure; no key is involved. Errors raised here
//! are all [`JweError::is_structural`](crate::core::error::JweError::is_structural)
//! or base64/JSON decoding errors.

pub mod compact;
pub mod json;

use base64::prelude::*;

use crate::core::error::JweResult;

/// Builds the content AAD: `ASCII(B64U(protected))`, followed by
/// `"." || ASCII(B64U(aad))` when the caller supplied AAD.
#[must_use]
pub fn content_aad(protected_b64: &str, aad: Option<&[u8]>) -> Vec<u8> {
    let mut out = protected_b64.as_bytes().to_vec();
    if let Some(aad) = aad {
        out.push(b'.');
        out.extend_from_slice(BASE64_URL_SAFE_NO_PAD.encode(aad).as_bytes());
    }
    out
}

pub(crate) fn b64_decode(encoded: &str) -> JweResult<Vec<u8>> {
    Ok(BASE64_URL_SAFE_NO_PAD.decode(encoded)?)
}

pub(crate) fn b64_encode(bytes: &[u8]) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(bytes)
}
