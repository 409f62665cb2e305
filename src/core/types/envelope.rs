//! `SealedEnvelope` and `Recipient` - the in-memory form of a JWE.
//!
//! An envelope is independent of its serialization: the same value can be
//! written as compact, flattened JSON or general JSON (see
//! [`crate::core::serialization`]), subject to each form's restrictions.

use std::str::FromStr;

use crate::core::error::{JweError, JweResult};
use crate::core::header::JoseHeader;
use crate::core::serialization;

/// One recipient of a JWE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub(crate) header: Option<JoseHeader>,
    pub(crate) encrypted_key: Vec<u8>,
}

impl Recipient {
    /// Creates a recipient from its encrypted key and optional header.
    #[must_use]
    pub fn new(encrypted_key: Vec<u8>, header: Option<JoseHeader>) -> Self {
        Self {
            header,
            encrypted_key,
        }
    }

    /// Per-recipient unprotected header.
    #[must_use]
    pub const fn header(&self) -> Option<&JoseHeader> {
        self.header.as_ref()
    }

    /// Encrypted key bytes (empty for `dir` and `ECDH-ES`).
    #[must_use]
    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }
}

/// A sealed JWE.
///
/// The protected header is kept together with the exact base64url text it
/// was parsed from; that text is what the AAD covers.
///
/// # Example
///
/// ```rust
/// use jwekit::core::types::SealedEnvelope;
///
/// let compact = "eyJhbGciOiJBMTI4S1ciLCJlbmMiOiJBMTI4Q0JDLUhTMjU2In0.\
///     6KB707dM9YTIgHtLvtgWQ8mKwboJW3of9locizkDTHzBC2IlrT1oOQ.\
///     AxY8DCtDaGlsbGljb3RoZQ.\
///     KDlTtXchhZTGufMYmOYGS4HffxPSUrfmqCHXaI9wOGY.\
///     U0m_YmjN04DJvceFICbCVQ";
///
/// let envelope: SealedEnvelope = compact.parse().expect("valid compact JWE");
/// assert_eq!(envelope.protected().alg().ok().flatten(), Some("A128KW"));
/// assert_eq!(envelope.recipients().len(), 1);
/// assert_eq!(envelope.to_compact().expect("compact"), compact);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedEnvelope {
    pub(crate) protected: JoseHeader,
    pub(crate) protected_b64: String,
    pub(crate) unprotected: Option<JoseHeader>,
    pub(crate) recipients: Vec<Recipient>,
    pub(crate) iv: Vec<u8>,
    pub(crate) ciphertext: Vec<u8>,
    pub(crate) tag: Vec<u8>,
    pub(crate) aad: Option<Vec<u8>>,
}

impl SealedEnvelope {
    /// Integrity protected header.
    #[must_use]
    pub const fn protected(&self) -> &JoseHeader {
        &self.protected
    }

    /// The base64url text of the protected header.
    #[must_use]
    pub fn protected_b64(&self) -> &str {
        &self.protected_b64
    }

    /// Shared unprotected header.
    #[must_use]
    pub const fn unprotected(&self) -> Option<&JoseHeader> {
        self.unprotected.as_ref()
    }

    /// Recipients, in order.
    #[must_use]
    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// Content encryption IV.
    #[must_use]
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Content ciphertext.
    #[must_use]
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Content authentication tag.
    #[must_use]
    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    /// Caller supplied additional authenticated data.
    #[must_use]
    pub fn aad(&self) -> Option<&[u8]> {
        self.aad.as_deref()
    }

    /// The additional authenticated data passed to the content cipher.
    #[must_use]
    pub fn authenticated_data(&self) -> Vec<u8> {
        serialization::content_aad(&self.protected_b64, self.aad.as_deref())
    }

    /// Effective header for recipient `index`.
    ///
    /// # Errors
    ///
    /// - [`JweError::InvalidFormat`] if there is no such recipient
    /// - [`JweError::InvalidHeader`] if the scopes overlap
    pub fn effective_header(&self, index: usize) -> JweResult<JoseHeader> {
        let recipient = self.recipients.get(index).ok_or_else(|| {
            JweError::InvalidFormat(format!("no recipient at index {index}"))
        })?;
        JoseHeader::merge(
            Some(&self.protected),
            self.unprotected.as_ref(),
            recipient.header.as_ref(),
        )
    }

    /// Checks the invariants every parsed or produced envelope holds: at
    /// least one recipient and disjoint header scopes.
    pub(crate) fn validate(&self) -> JweResult<()> {
        if self.recipients.is_empty() {
            return Err(JweError::InvalidFormat(
                "a JWE needs at least one recipient".into(),
            ));
        }
        for index in 0..self.recipients.len() {
            self.effective_header(index)?;
        }
        Ok(())
    }

    /// Compact serialization.
    ///
    /// # Errors
    ///
    /// Returns [`JweError::InvalidFormat`] unless the envelope has a single
    /// recipient, no unprotected headers and no caller AAD.
    pub fn to_compact(&self) -> JweResult<String> {
        serialization::compact::encode(self)
    }

    /// Flattened JSON serialization.
    ///
    /// # Errors
    ///
    /// Returns [`JweError::InvalidFormat`] unless the envelope has a single
    /// recipient.
    pub fn to_json_flattened(&self) -> JweResult<String> {
        serialization::json::encode_flattened(self)
    }

    /// General JSON serialization.
    pub fn to_json_general(&self) -> JweResult<String> {
        serialization::json::encode_general(self)
    }

    /// Parses any serialization: JSON when the input starts with `{`,
    /// compact otherwise.
    pub fn parse_any(input: &str) -> JweResult<Self> {
        if input.trim_start().starts_with('{') {
            serialization::json::decode(input)
        } else {
            serialization::compact::decode(input)
        }
    }
}

impl FromStr for SealedEnvelope {
    type Err = JweError;

    /// Parses the compact serialization.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serialization::compact::decode(s)
    }
}

impl TryFrom<&str> for SealedEnvelope {
    type Error = JweError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}
