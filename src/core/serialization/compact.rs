//! Compact serialization (RFC 7516 section 7.1).
//!
//! Format: `B64U(protected).B64U(encrypted_key).B64U(iv).B64U(ciphertext).B64U(tag)`
//!
//! Only single-recipient envelopes whose whole header is protected and
//! that carry no caller AAD can be written in this form.

use crate::core::error::{JweError, JweResult};
use crate::core::header::JoseHeader;
use crate::core::serialization::{b64_decode, b64_encode};
use crate::core::types::{Recipient, SealedEnvelope};

/// Number of dot-separated segments.
pub const SEGMENTS: usize = 5;

/// Writes the compact serialization.
///
/// # Errors
///
/// Returns [`JweError::InvalidFormat`] if the envelope cannot be expressed
/// compactly.
pub fn encode(envelope: &SealedEnvelope) -> JweResult<String> {
    let [recipient] = envelope.recipients() else {
        return Err(JweError::InvalidFormat(
            "compact serialization needs exactly one recipient".into(),
        ));
    };
    if envelope.unprotected().is_some_and(|h| !h.is_empty())
        || recipient.header().is_some_and(|h| !h.is_empty())
    {
        return Err(JweError::InvalidFormat(
            "compact serialization cannot carry unprotected headers".into(),
        ));
    }
    if envelope.aad().is_some() {
        return Err(JweError::InvalidFormat(
            "compact serialization cannot carry AAD".into(),
        ));
    }

    Ok([
        envelope.protected_b64().to_string(),
        b64_encode(recipient.encrypted_key()),
        b64_encode(envelope.iv()),
        b64_encode(envelope.ciphertext()),
        b64_encode(envelope.tag()),
    ]
    .join("."))
}

/// Parses the compact serialization.
///
/// # Errors
///
/// - [`JweError::InvalidFormat`] if there are not exactly five segments or
///   the protected header is empty
/// - [`JweError::Base64Decode`] for malformed base64url
/// - [`JweError::Json`] / [`JweError::InvalidHeader`] for a bad header
pub fn decode(input: &str) -> JweResult<SealedEnvelope> {
    let segments: Vec<&str> = input.split('.').collect();
    let [protected_b64, encrypted_key, iv, ciphertext, tag] = segments.as_slice() else {
        return Err(JweError::InvalidFormat(format!(
            "expected {SEGMENTS} segments, found {}",
            segments.len()
        )));
    };
    if protected_b64.is_empty() {
        return Err(JweError::InvalidFormat("empty protected header".into()));
    }

    let envelope = SealedEnvelope {
        protected: JoseHeader::decode_b64(protected_b64)?,
        protected_b64: (*protected_b64).to_string(),
        unprotected: None,
        recipients: vec![Recipient::new(b64_decode(encrypted_key)?, None)],
        iv: b64_decode(iv)?,
        ciphertext: b64_decode(ciphertext)?,
        tag: b64_decode(tag)?,
        aad: None,
    };
    envelope.validate()?;
    Ok(envelope)
}
