//! JSON serializations (RFC 7516 section 7.2).
//!
//! General form:
//!
//! ```json
//! {"protected":"..","unprotected":{..},
//!  "recipients":[{"header":{..},"encrypted_key":".."}],
//!  "aad":"..","iv":"..","ciphertext":"..","tag":".."}
//! ```
//!
//! The flattened form lifts the single recipient's `header` and
//! `encrypted_key` to the top level and has no `recipients` member.
//! [`decode`] picks the form by the presence of `recipients`. Unknown
//! members are ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::error::{JweError, JweResult};
use crate::core::header::JoseHeader;
use crate::core::serialization::{b64_decode, b64_encode};
use crate::core::types::{Recipient, SealedEnvelope};

#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonRecipient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    header: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encrypted_key: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    protected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unprotected: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    header: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encrypted_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recipients: Option<Vec<JsonRecipient>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aad: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ciphertext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
}

/// Writes the flattened JSON serialization.
///
/// # Errors
///
/// Returns [`JweError::InvalidFormat`] unless there is exactly one
/// recipient.
pub fn encode_flattened(envelope: &SealedEnvelope) -> JweResult<String> {
    let [recipient] = envelope.recipients() else {
        return Err(JweError::InvalidFormat(
            "flattened serialization needs exactly one recipient".into(),
        ));
    };
    let JsonRecipient {
        header,
        encrypted_key,
    } = to_json_recipient(recipient);

    let mut json = shared_members(envelope);
    json.header = header;
    json.encrypted_key = encrypted_key;
    Ok(serde_json::to_string(&json)?)
}

/// Writes the general JSON serialization.
pub fn encode_general(envelope: &SealedEnvelope) -> JweResult<String> {
    let mut json = shared_members(envelope);
    json.recipients = Some(envelope.recipients().iter().map(to_json_recipient).collect());
    Ok(serde_json::to_string(&json)?)
}

/// Parses either JSON serialization.
///
/// # Errors
///
/// - [`JweError::InvalidFormat`] if `protected`, `iv`, `ciphertext` or
///   `tag` is missing, `recipients` is empty, or a general object also has
///   flattened members
/// - [`JweError::Json`] for malformed JSON or non-object headers
/// - [`JweError::Base64Decode`] for malformed base64url
/// - [`JweError::InvalidHeader`] for overlapping header scopes
pub fn decode(input: &str) -> JweResult<SealedEnvelope> {
    let json: JsonEnvelope = serde_json::from_str(input)?;

    let recipients = match json.recipients {
        Some(recipients) => {
            if json.header.is_some() || json.encrypted_key.is_some() {
                return Err(JweError::InvalidFormat(
                    "general serialization cannot also carry header or encrypted_key".into(),
                ));
            }
            if recipients.is_empty() {
                return Err(JweError::InvalidFormat("recipients must not be empty".into()));
            }
            recipients
                .into_iter()
                .map(from_json_recipient)
                .collect::<JweResult<Vec<_>>>()?
        }
        None => vec![from_json_recipient(JsonRecipient {
            header: json.header,
            encrypted_key: json.encrypted_key,
        })?],
    };

    let protected_b64 = required("protected", json.protected)?;
    if protected_b64.is_empty() {
        return Err(JweError::InvalidFormat("empty protected header".into()));
    }

    let envelope = SealedEnvelope {
        protected: JoseHeader::decode_b64(&protected_b64)?,
        protected_b64,
        unprotected: json.unprotected.map(JoseHeader::from),
        recipients,
        iv: b64_decode(&required("iv", json.iv)?)?,
        ciphertext: b64_decode(&required("ciphertext", json.ciphertext)?)?,
        tag: b64_decode(&required("tag", json.tag)?)?,
        aad: json.aad.as_deref().map(b64_decode).transpose()?,
    };
    envelope.validate()?;
    Ok(envelope)
}

fn required(name: &str, member: Option<String>) -> JweResult<String> {
    member.ok_or_else(|| JweError::InvalidFormat(format!("missing {name} member")))
}

fn shared_members(envelope: &SealedEnvelope) -> JsonEnvelope {
    JsonEnvelope {
        protected: Some(envelope.protected_b64().to_string()),
        unprotected: envelope
            .unprotected()
            .filter(|h| !h.is_empty())
            .map(|h| h.as_map().clone()),
        aad: envelope.aad().map(b64_encode),
        iv: Some(b64_encode(envelope.iv())),
        ciphertext: Some(b64_encode(envelope.ciphertext())),
        tag: Some(b64_encode(envelope.tag())),
        ..JsonEnvelope::default()
    }
}

fn to_json_recipient(recipient: &Recipient) -> JsonRecipient {
    JsonRecipient {
        header: recipient
            .header()
            .filter(|h| !h.is_empty())
            .map(|h| h.as_map().clone()),
        encrypted_key: Some(recipient.encrypted_key())
            .filter(|ek| !ek.is_empty())
            .map(b64_encode),
    }
}

fn from_json_recipient(recipient: JsonRecipient) -> JweResult<Recipient> {
    let encrypted_key = match recipient.encrypted_key {
        Some(ek) => b64_decode(&ek)?,
        None => Vec::new(),
    };
    Ok(Recipient::new(
        encrypted_key,
        recipient.header.map(JoseHeader::from),
    ))
}
