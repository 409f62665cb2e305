//! JOSE header model.
//!
//! A [`JoseHeader`] is an ordered JSON object. Field order is insertion
//! order, so a header built as `alg` then `enc` serializes exactly that
//! way; the base64url of the protected header is part of the AAD.
//!
//! A JWE spreads its header over up to three scopes: the integrity
//! protected header, the shared unprotected header and a per-recipient
//! header. [`JoseHeader::merge`] combines them into the effective header
//! and rejects overlapping member names.

use base64::prelude::*;
use serde_json::{Map, Value};

use crate::core::error::{JweError, JweResult};
use crate::core::registry::Registry;

/// Registered header parameter names.
pub mod params {
    /// Key management algorithm.
    pub const ALG: &str = "alg";
    /// Content encryption algorithm.
    pub const ENC: &str = "enc";
    /// Compression algorithm.
    pub const ZIP: &str = "zip";
    /// Key identifier.
    pub const KID: &str = "kid";
    /// Ephemeral public key (ECDH-ES).
    pub const EPK: &str = "epk";
    /// Agreement PartyUInfo (ECDH-ES).
    pub const APU: &str = "apu";
    /// Agreement PartyVInfo (ECDH-ES).
    pub const APV: &str = "apv";
    /// PBES2 salt input.
    pub const P2S: &str = "p2s";
    /// PBES2 iteration count.
    pub const P2C: &str = "p2c";
    /// AES-GCM key wrap IV.
    pub const IV: &str = "iv";
    /// AES-GCM key wrap tag.
    pub const TAG: &str = "tag";
    /// Critical extensions.
    pub const CRIT: &str = "crit";
    /// Media type.
    pub const TYP: &str = "typ";
    /// Content type.
    pub const CTY: &str = "cty";
}

/// Names defined by RFC 7515/7516/7518. They may not appear in `crit`.
const REGISTERED: &[&str] = &[
    "alg", "enc", "zip", "jku", "jwk", "kid", "x5u", "x5c", "x5t", "x5t#S256", "typ", "cty",
    "crit", "epk", "apu", "apv", "iv", "tag", "p2s", "p2c",
];

/// An ordered JOSE header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoseHeader {
    fields: Map<String, Value>,
}

impl JoseHeader {
    /// Creates an empty header.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header with `alg` and `enc` set, in that order.
    #[must_use]
    pub fn with_algorithms(alg: &str, enc: &str) -> Self {
        let mut header = Self::new();
        header.set(params::ALG, alg);
        header.set(params::ENC, enc);
        header
    }

    /// Sets a field, replacing any previous value in place.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Sets a field to the base64url encoding of `bytes`.
    pub fn set_b64(&mut self, name: &str, bytes: &[u8]) -> &mut Self {
        self.set(name, BASE64_URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.shift_remove(name)
    }

    /// Returns the raw value of a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns `true` if the field is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns `true` if the header has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns a string field, failing if it exists with another type.
    pub fn get_str(&self, name: &str) -> JweResult<Option<&str>> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(JweError::InvalidHeader(format!("{name} must be a string"))),
        }
    }

    /// Returns a base64url-encoded binary field, decoded.
    pub fn get_b64(&self, name: &str) -> JweResult<Option<Vec<u8>>> {
        self.get_str(name)?
            .map(|s| BASE64_URL_SAFE_NO_PAD.decode(s).map_err(JweError::from))
            .transpose()
    }

    // =========================================================================
    // Registered parameter accessors
    // =========================================================================

    /// The `alg` parameter.
    pub fn alg(&self) -> JweResult<Option<&str>> {
        self.get_str(params::ALG)
    }

    /// The `enc` parameter.
    pub fn enc(&self) -> JweResult<Option<&str>> {
        self.get_str(params::ENC)
    }

    /// The `zip` parameter.
    pub fn zip(&self) -> JweResult<Option<&str>> {
        self.get_str(params::ZIP)
    }

    /// The `kid` parameter.
    pub fn kid(&self) -> JweResult<Option<&str>> {
        self.get_str(params::KID)
    }

    /// The `epk` parameter as a raw JWK object.
    #[must_use]
    pub fn epk(&self) -> Option<&Value> {
        self.fields.get(params::EPK)
    }

    /// The decoded `apu` parameter.
    pub fn apu(&self) -> JweResult<Option<Vec<u8>>> {
        self.get_b64(params::APU)
    }

    /// The decoded `apv` parameter.
    pub fn apv(&self) -> JweResult<Option<Vec<u8>>> {
        self.get_b64(params::APV)
    }

    /// The decoded `p2s` parameter.
    pub fn p2s(&self) -> JweResult<Option<Vec<u8>>> {
        self.get_b64(params::P2S)
    }

    /// The `p2c` parameter.
    pub fn p2c(&self) -> JweResult<Option<u32>> {
        match self.fields.get(params::P2C) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| JweError::InvalidHeader("p2c must be a positive integer".into())),
        }
    }

    /// The decoded `iv` parameter (AES-GCM key wrap).
    pub fn iv(&self) -> JweResult<Option<Vec<u8>>> {
        self.get_b64(params::IV)
    }

    /// The decoded `tag` parameter (AES-GCM key wrap).
    pub fn tag(&self) -> JweResult<Option<Vec<u8>>> {
        self.get_b64(params::TAG)
    }

    /// The `crit` parameter. An empty list or non-string entries are invalid.
    pub fn crit(&self) -> JweResult<Option<Vec<String>>> {
        let Some(value) = self.fields.get(params::CRIT) else {
            return Ok(None);
        };
        let invalid = || JweError::InvalidHeader("crit must be a non-empty array of strings".into());
        let entries = value.as_array().ok_or_else(invalid)?;
        if entries.is_empty() {
            return Err(invalid());
        }
        entries
            .iter()
            .map(|entry| entry.as_str().map(str::to_string).ok_or_else(invalid))
            .collect::<JweResult<Vec<_>>>()
            .map(Some)
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Serializes the header to compact JSON bytes.
    pub fn to_json(&self) -> JweResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.fields)?)
    }

    /// Base64url encoding of the JSON serialization.
    pub fn encode_b64(&self) -> JweResult<String> {
        Ok(BASE64_URL_SAFE_NO_PAD.encode(self.to_json()?))
    }

    /// Parses a header from JSON bytes. The value must be an object.
    pub fn from_json(bytes: &[u8]) -> JweResult<Self> {
        match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(JweError::InvalidHeader("header must be a JSON object".into())),
        }
    }

    /// Parses a header from its base64url encoding.
    pub fn decode_b64(encoded: &str) -> JweResult<Self> {
        Self::from_json(&BASE64_URL_SAFE_NO_PAD.decode(encoded)?)
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    /// Merges the protected, shared unprotected and per-recipient headers.
    ///
    /// # Errors
    ///
    /// Returns [`JweError::InvalidHeader`] if a member name appears in more
    /// than one scope.
    pub fn merge(
        protected: Option<&Self>,
        shared: Option<&Self>,
        recipient: Option<&Self>,
    ) -> JweResult<Self> {
        let mut merged = Self::new();
        for scope in [protected, shared, recipient].into_iter().flatten() {
            for (name, value) in &scope.fields {
                if merged.fields.contains_key(name) {
                    return Err(JweError::InvalidHeader(format!(
                        "duplicate header parameter: {name}"
                    )));
                }
                merged.fields.insert(name.clone(), value.clone());
            }
        }
        Ok(merged)
    }

    /// Copies every member of `other` into `self`.
    ///
    /// # Errors
    ///
    /// Returns [`JweError::InvalidHeader`] if a member is already present.
    pub fn absorb(&mut self, other: &Self) -> JweResult<()> {
        for (name, value) in &other.fields {
            if self.fields.contains_key(name) {
                return Err(JweError::InvalidHeader(format!(
                    "duplicate header parameter: {name}"
                )));
            }
            self.fields.insert(name.clone(), value.clone());
        }
        Ok(())
    }

    /// Validates `crit` against the registry.
    ///
    /// `crit` may only appear in the protected header; every listed name
    /// must be an extension the registry understands and must be present in
    /// the effective header.
    pub fn check_critical(
        protected: Option<&Self>,
        effective: &Self,
        registry: &Registry,
    ) -> JweResult<()> {
        let in_protected = protected.is_some_and(|p| p.contains(params::CRIT));
        if effective.contains(params::CRIT) && !in_protected {
            return Err(JweError::InvalidHeader(
                "crit must be integrity protected".into(),
            ));
        }
        let Some(names) = effective.crit()? else {
            return Ok(());
        };
        for name in names {
            if REGISTERED.contains(&name.as_str()) {
                return Err(JweError::InvalidHeader(format!(
                    "crit lists registered parameter {name}"
                )));
            }
            if !registry.understands_critical(&name) {
                return Err(JweError::UnsupportedCritical(name));
            }
            if !effective.contains(&name) {
                return Err(JweError::InvalidHeader(format!(
                    "critical parameter {name} is missing"
                )));
            }
        }
        Ok(())
    }
}

impl From<Map<String, Value>> for JoseHeader {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_order_is_preserved() -> JweResult<()> {
        let header = JoseHeader::with_algorithms("RSA-OAEP", "A256GCM");
        assert_eq!(
            header.encode_b64()?,
            "eyJhbGciOiJSU0EtT0FFUCIsImVuYyI6IkEyNTZHQ00ifQ"
        );
        Ok(())
    }

    #[test]
    fn test_decode_b64_roundtrip() -> JweResult<()> {
        let mut header = JoseHeader::with_algorithms("A128KW", "A128CBC-HS256");
        header.set(params::KID, "key-1").set(params::P2C, 4096);
        let decoded = JoseHeader::decode_b64(&header.encode_b64()?)?;
        assert_eq!(decoded, header);
        assert_eq!(decoded.kid()?, Some("key-1"));
        assert_eq!(decoded.p2c()?, Some(4096));
        Ok(())
    }

    #[test]
    fn test_non_object_header_rejected() {
        let result = JoseHeader::from_json(b"[1,2,3]");
        assert!(matches!(result, Err(JweError::InvalidHeader(_))));

        let result = JoseHeader::from_json(b"{not json");
        assert!(matches!(result, Err(JweError::Json(_))));
    }

    #[test]
    fn test_typed_accessors_reject_wrong_types() {
        let mut header = JoseHeader::new();
        header.set(params::ALG, 5).set(params::P2C, -1);
        assert!(matches!(header.alg(), Err(JweError::InvalidHeader(_))));
        assert!(matches!(header.p2c(), Err(JweError::InvalidHeader(_))));

        let mut header = JoseHeader::new();
        header.set(params::APU, "not base64!");
        assert!(matches!(header.apu(), Err(JweError::Base64Decode(_))));
    }

    #[test]
    fn test_merge_disjoint() -> JweResult<()> {
        let protected = JoseHeader::from_json(br#"{"enc":"A128GCM"}"#)?;
        let shared = JoseHeader::from_json(br#"{"jku":"https://example.com/keys"}"#)?;
        let recipient = JoseHeader::from_json(br#"{"alg":"A128KW","kid":"k1"}"#)?;

        let merged = JoseHeader::merge(Some(&protected), Some(&shared), Some(&recipient))?;
        assert_eq!(merged.alg()?, Some("A128KW"));
        assert_eq!(merged.enc()?, Some("A128GCM"));
        assert_eq!(merged.names().count(), 4);
        Ok(())
    }

    #[test]
    fn test_merge_rejects_duplicates() -> JweResult<()> {
        let protected = JoseHeader::with_algorithms("A128KW", "A128GCM");
        let recipient = JoseHeader::from_json(br#"{"alg":"A256KW"}"#)?;
        let result = JoseHeader::merge(Some(&protected), None, Some(&recipient));
        assert!(matches!(result, Err(JweError::InvalidHeader(_))));
        Ok(())
    }

    #[test]
    fn test_crit_must_be_understood() -> JweResult<()> {
        let registry = Registry::with_defaults();
        let protected =
            JoseHeader::from_json(br#"{"alg":"dir","enc":"A128GCM","crit":["exp"],"exp":1}"#)?;

        let result = JoseHeader::check_critical(Some(&protected), &protected, &registry);
        assert!(matches!(result, Err(JweError::UnsupportedCritical(name)) if name == "exp"));

        registry.register_critical_header("exp");
        JoseHeader::check_critical(Some(&protected), &protected, &registry)?;
        Ok(())
    }

    #[test]
    fn test_crit_structure() -> JweResult<()> {
        let registry = Registry::with_defaults();
        registry.register_critical_header("exp");

        // Listed but absent.
        let header = JoseHeader::from_json(br#"{"alg":"dir","crit":["exp"]}"#)?;
        let result = JoseHeader::check_critical(Some(&header), &header, &registry);
        assert!(matches!(result, Err(JweError::InvalidHeader(_))));

        // Registered names may not be critical.
        let header = JoseHeader::from_json(br#"{"alg":"dir","crit":["alg"]}"#)?;
        let result = JoseHeader::check_critical(Some(&header), &header, &registry);
        assert!(matches!(result, Err(JweError::InvalidHeader(_))));

        // Empty list.
        let header = JoseHeader::from_json(br#"{"crit":[]}"#)?;
        let result = JoseHeader::check_critical(Some(&header), &header, &registry);
        assert!(matches!(result, Err(JweError::InvalidHeader(_))));

        // Not protected.
        let shared = JoseHeader::from_json(br#"{"crit":["exp"],"exp":1}"#)?;
        let result = JoseHeader::check_critical(None, &shared, &registry);
        assert!(matches!(result, Err(JweError::InvalidHeader(_))));
        Ok(())
    }
}
