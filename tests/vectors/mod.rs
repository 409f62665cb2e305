//! Test vector types for the JWE vector suites.
//!
//! `content.json` exercises the `enc` algorithms directly. `jwe.json` holds
//! complete serialized envelopes together with the recipient key, taken
//! from RFC 7516 Appendix A, RFC 7518 Appendix C, or produced with an
//! independent implementation.

// Many fields are required for deserialization but not directly used in tests
#![allow(dead_code)]

use base64::prelude::{Engine as _, BASE64_URL_SAFE_NO_PAD};
use jwekit::core::types::Key;
use serde::Deserialize;

/// A test vector suite (top-level JSON structure).
#[derive(Debug, Deserialize)]
pub struct TestVectorSuite<T> {
    pub name: String,
    pub tests: Vec<T>,
}

/// Test vector for a content encryption algorithm.
#[derive(Debug, Deserialize)]
pub struct ContentTestVector {
    pub name: String,
    #[serde(rename = "expect-fail")]
    pub expect_fail: bool,
    #[serde(default)]
    pub comment: Option<String>,
    /// `enc` identifier
    pub enc: String,
    /// Hex-encoded CEK
    pub cek: String,
    /// Base64url IV
    pub iv: String,
    /// Additional authenticated data, used verbatim as ASCII
    pub aad: String,
    pub plaintext: String,
    /// Base64url ciphertext
    pub ciphertext: String,
    /// Base64url authentication tag
    pub tag: String,
}

/// Recipient key in a JWK-like shape.
#[derive(Debug, Deserialize)]
pub struct VectorKey {
    pub kty: String,
    #[serde(default)]
    pub k: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub crv: Option<String>,
    #[serde(default)]
    pub d: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
    #[serde(default)]
    pub p: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

/// Deterministic inputs that reproduce the envelope exactly.
#[derive(Debug, Deserialize)]
pub struct Reproduce {
    /// Hex-encoded CEK
    pub cek: String,
    /// Base64url IV
    pub iv: String,
}

/// Test vector for a complete serialized envelope.
#[derive(Debug, Deserialize)]
pub struct JweTestVector {
    pub name: String,
    #[serde(rename = "expect-fail")]
    pub expect_fail: bool,
    #[serde(default)]
    pub comment: Option<String>,
    pub key: VectorKey,
    /// `compact` or `json`
    pub serialization: String,
    pub jwe: String,
    /// Expected plaintext (null for fail tests)
    pub plaintext: Option<String>,
    /// Expected error variant name (null for success tests)
    pub error: Option<String>,
    #[serde(default)]
    pub reproduce: Option<Reproduce>,
    /// Expected protected header members
    #[serde(default)]
    pub protected: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Decode hex string to bytes.
pub fn hex_decode(s: &str) -> Option<Vec<u8>> {
    hex::decode(s).ok()
}

/// Decode base64url (no padding) to bytes.
pub fn b64_decode(s: &str) -> Option<Vec<u8>> {
    BASE64_URL_SAFE_NO_PAD.decode(s).ok()
}

/// Load test vectors from a JSON file.
pub fn load_vectors<T: serde::de::DeserializeOwned>(path: &str) -> TestVectorSuite<T> {
    let content = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read test vector file {path}: {e}"));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse test vector file {path}: {e}"))
}

fn member<'a>(value: &'a Option<String>, name: &str, kty: &str) -> &'a str {
    value
        .as_deref()
        .unwrap_or_else(|| panic!("{kty} key requires {name}"))
}

impl VectorKey {
    /// Builds the recipient key described by this vector.
    pub fn to_key(&self) -> Key {
        match self.kty.as_str() {
            "oct" => Key::symmetric(
                b64_decode(member(&self.k, "k", "oct")).expect("valid base64url"),
            ),
            "password" => Key::password(member(&self.password, "password", "password").as_bytes()),
            #[cfg(feature = "ecdh")]
            "EC" | "OKP" => {
                use jwekit::core::types::{Curve, EcPrivateKey};

                let curve = Curve::from_name(member(&self.crv, "crv", &self.kty))
                    .expect("supported curve");
                let d = b64_decode(member(&self.d, "d", &self.kty)).expect("valid base64url");
                Key::EcPrivate(EcPrivateKey::from_bytes(curve, &d).expect("valid scalar"))
            }
            #[cfg(feature = "rsa")]
            "RSA" => {
                use rsa::{BigUint, RsaPrivateKey};

                let int = |value: &Option<String>, name: &str| {
                    BigUint::from_bytes_be(
                        &b64_decode(member(value, name, "RSA")).expect("valid base64url"),
                    )
                };
                let key = RsaPrivateKey::from_components(
                    int(&self.n, "n"),
                    int(&self.e, "e"),
                    int(&self.d, "d"),
                    vec![int(&self.p, "p"), int(&self.q, "q")],
                )
                .expect("valid RSA components");
                Key::RsaPrivate(Box::new(key))
            }
            other => panic!("unsupported key type {other}"),
        }
    }

    /// Whether the enabled features can build this key.
    pub fn is_available(&self) -> bool {
        match self.kty.as_str() {
            "EC" | "OKP" => cfg!(feature = "ecdh"),
            "RSA" => cfg!(feature = "rsa"),
            _ => true,
        }
    }
}
