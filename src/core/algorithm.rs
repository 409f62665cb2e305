//! JWA algorithm identifiers.
//!
//! This module provides the closed sets of key management (`alg`) and
//! content encryption (`enc`) algorithms. Each variant carries the data
//! its strategy needs, so dispatch is a `match` rather than a runtime
//! lookup of capabilities.

use std::fmt::{self, Display};
use std::str::FromStr;

use crate::core::error::JweError;

// =============================================================================
// Shared parameters
// =============================================================================

/// AES key size used by key wrap and content encryption variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AesKeySize {
    /// 128-bit AES.
    A128,
    /// 192-bit AES.
    A192,
    /// 256-bit AES.
    A256,
}

impl AesKeySize {
    /// Key length in bytes.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::A128 => 16,
            Self::A192 => 24,
            Self::A256 => 32,
        }
    }

    /// Key length in bits.
    #[must_use]
    pub const fn bits(self) -> usize {
        self.bytes() * 8
    }
}

/// RSA encryption scheme for the `RSA*` key management family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RsaPadding {
    /// RSAES-PKCS1-v1_5.
    ///
    /// # Security Warning
    ///
    /// Exposed to Bleichenbacher-style padding oracles and to
    /// [RUSTSEC-2023-0071] (Marvin Attack). Only available with the
    /// `rsa1_5` feature.
    ///
    /// [RUSTSEC-2023-0071]: https://rustsec.org/advisories/RUSTSEC-2023-0071
    Pkcs1v15,
    /// RSAES-OAEP with SHA-1 and MGF1-SHA-1.
    Oaep,
    /// RSAES-OAEP with SHA-256 and MGF1-SHA-256.
    Oaep256,
    /// RSAES-OAEP with SHA-384 and MGF1-SHA-384.
    Oaep384,
    /// RSAES-OAEP with SHA-512 and MGF1-SHA-512.
    Oaep512,
}

// =============================================================================
// Key management algorithms
// =============================================================================

/// Key management algorithm (the `alg` header parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAlgorithm {
    /// `dir`: the shared symmetric key is the CEK.
    Direct,
    /// `A128KW` / `A192KW` / `A256KW`: RFC 3394 AES key wrap.
    AesKeyWrap(AesKeySize),
    /// `RSA1_5` / `RSA-OAEP` / `RSA-OAEP-256` / `-384` / `-512`.
    Rsa(RsaPadding),
    /// `A128GCMKW` / `A192GCMKW` / `A256GCMKW`: AES-GCM key wrap.
    AesGcmKeyWrap(AesKeySize),
    /// `PBES2-HS256+A128KW` / `PBES2-HS384+A192KW` / `PBES2-HS512+A256KW`.
    ///
    /// The HMAC digest is fixed by the wrap size.
    Pbes2(AesKeySize),
    /// `ECDH-ES`: the agreed key is the CEK.
    EcdhEs,
    /// `ECDH-ES+A128KW` / `+A192KW` / `+A256KW`: the agreed key wraps the CEK.
    EcdhEsKeyWrap(AesKeySize),
}

impl KeyAlgorithm {
    /// Every built-in key management algorithm.
    pub const ALL: [Self; 19] = [
        Self::Direct,
        Self::AesKeyWrap(AesKeySize::A128),
        Self::AesKeyWrap(AesKeySize::A192),
        Self::AesKeyWrap(AesKeySize::A256),
        Self::Rsa(RsaPadding::Pkcs1v15),
        Self::Rsa(RsaPadding::Oaep),
        Self::Rsa(RsaPadding::Oaep256),
        Self::Rsa(RsaPadding::Oaep384),
        Self::Rsa(RsaPadding::Oaep512),
        Self::AesGcmKeyWrap(AesKeySize::A128),
        Self::AesGcmKeyWrap(AesKeySize::A192),
        Self::AesGcmKeyWrap(AesKeySize::A256),
        Self::Pbes2(AesKeySize::A128),
        Self::Pbes2(AesKeySize::A192),
        Self::Pbes2(AesKeySize::A256),
        Self::EcdhEs,
        Self::EcdhEsKeyWrap(AesKeySize::A128),
        Self::EcdhEsKeyWrap(AesKeySize::A192),
        Self::EcdhEsKeyWrap(AesKeySize::A256),
    ];

    /// The registered `alg` identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Direct => "dir",
            Self::AesKeyWrap(AesKeySize::A128) => "A128KW",
            Self::AesKeyWrap(AesKeySize::A192) => "A192KW",
            Self::AesKeyWrap(AesKeySize::A256) => "A256KW",
            Self::Rsa(RsaPadding::Pkcs1v15) => "RSA1_5",
            Self::Rsa(RsaPadding::Oaep) => "RSA-OAEP",
            Self::Rsa(RsaPadding::Oaep256) => "RSA-OAEP-256",
            Self::Rsa(RsaPadding::Oaep384) => "RSA-OAEP-384",
            Self::Rsa(RsaPadding::Oaep512) => "RSA-OAEP-512",
            Self::AesGcmKeyWrap(AesKeySize::A128) => "A128GCMKW",
            Self::AesGcmKeyWrap(AesKeySize::A192) => "A192GCMKW",
            Self::AesGcmKeyWrap(AesKeySize::A256) => "A256GCMKW",
            Self::Pbes2(AesKeySize::A128) => "PBES2-HS256+A128KW",
            Self::Pbes2(AesKeySize::A192) => "PBES2-HS384+A192KW",
            Self::Pbes2(AesKeySize::A256) => "PBES2-HS512+A256KW",
            Self::EcdhEs => "ECDH-ES",
            Self::EcdhEsKeyWrap(AesKeySize::A128) => "ECDH-ES+A128KW",
            Self::EcdhEsKeyWrap(AesKeySize::A192) => "ECDH-ES+A192KW",
            Self::EcdhEsKeyWrap(AesKeySize::A256) => "ECDH-ES+A256KW",
        }
    }

    /// Returns `true` when the algorithm determines the CEK itself
    /// (`dir` and `ECDH-ES`). Such algorithms carry an empty encrypted key
    /// and allow a single recipient only.
    #[must_use]
    pub const fn determines_cek(self) -> bool {
        matches!(self, Self::Direct | Self::EcdhEs)
    }
}

impl Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyAlgorithm {
    type Err = JweError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|alg| alg.name() == s)
            .ok_or_else(|| JweError::UnsupportedAlgorithm(s.to_string()))
    }
}

// =============================================================================
// Content encryption algorithms
// =============================================================================

/// Content encryption algorithm (the `enc` header parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentAlgorithm {
    /// `A128GCM` / `A192GCM` / `A256GCM`.
    Gcm(AesKeySize),
    /// `A128CBC-HS256` / `A192CBC-HS384` / `A256CBC-HS512`.
    ///
    /// The size names the AES half of the composite key; the CEK is twice
    /// as long.
    CbcHmac(AesKeySize),
}

impl ContentAlgorithm {
    /// Every built-in content encryption algorithm.
    pub const ALL: [Self; 6] = [
        Self::CbcHmac(AesKeySize::A128),
        Self::CbcHmac(AesKeySize::A192),
        Self::CbcHmac(AesKeySize::A256),
        Self::Gcm(AesKeySize::A128),
        Self::Gcm(AesKeySize::A192),
        Self::Gcm(AesKeySize::A256),
    ];

    /// The registered `enc` identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gcm(AesKeySize::A128) => "A128GCM",
            Self::Gcm(AesKeySize::A192) => "A192GCM",
            Self::Gcm(AesKeySize::A256) => "A256GCM",
            Self::CbcHmac(AesKeySize::A128) => "A128CBC-HS256",
            Self::CbcHmac(AesKeySize::A192) => "A192CBC-HS384",
            Self::CbcHmac(AesKeySize::A256) => "A256CBC-HS512",
        }
    }

    /// CEK length in bytes.
    #[must_use]
    pub const fn key_len(self) -> usize {
        match self {
            Self::Gcm(size) => size.bytes(),
            Self::CbcHmac(size) => size.bytes() * 2,
        }
    }

    /// IV length in bytes.
    #[must_use]
    pub const fn iv_len(self) -> usize {
        match self {
            Self::Gcm(_) => 12,
            Self::CbcHmac(_) => 16,
        }
    }

    /// Authentication tag length in bytes.
    #[must_use]
    pub const fn tag_len(self) -> usize {
        match self {
            Self::Gcm(_) => 16,
            Self::CbcHmac(size) => size.bytes(),
        }
    }
}

impl Display for ContentAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContentAlgorithm {
    type Err = JweError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|enc| enc.name() == s)
            .ok_or_else(|| JweError::UnsupportedAlgorithm(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::JweResult;

    #[test]
    fn test_key_algorithm_names_roundtrip() -> JweResult<()> {
        for alg in KeyAlgorithm::ALL {
            assert_eq!(alg.name().parse::<KeyAlgorithm>()?, alg);
        }
        Ok(())
    }

    #[test]
    fn test_content_algorithm_names_roundtrip() -> JweResult<()> {
        for enc in ContentAlgorithm::ALL {
            assert_eq!(enc.to_string().parse::<ContentAlgorithm>()?, enc);
        }
        Ok(())
    }

    #[test]
    fn test_unknown_identifiers_rejected() {
        assert!(matches!(
            "A512KW".parse::<KeyAlgorithm>(),
            Err(JweError::UnsupportedAlgorithm(name)) if name == "A512KW"
        ));
        assert!(matches!(
            "a128gcm".parse::<ContentAlgorithm>(),
            Err(JweError::UnsupportedAlgorithm(_))
        ));
        assert!("".parse::<KeyAlgorithm>().is_err());
    }

    #[test]
    fn test_content_sizes() {
        let gcm = ContentAlgorithm::Gcm(AesKeySize::A192);
        assert_eq!((gcm.key_len(), gcm.iv_len(), gcm.tag_len()), (24, 12, 16));

        let cbc = ContentAlgorithm::CbcHmac(AesKeySize::A128);
        assert_eq!((cbc.key_len(), cbc.iv_len(), cbc.tag_len()), (32, 16, 16));

        let cbc = ContentAlgorithm::CbcHmac(AesKeySize::A256);
        assert_eq!((cbc.key_len(), cbc.iv_len(), cbc.tag_len()), (64, 16, 32));
    }

    #[test]
    fn test_determines_cek() {
        assert!(KeyAlgorithm::Direct.determines_cek());
        assert!(KeyAlgorithm::EcdhEs.determines_cek());
        assert!(!KeyAlgorithm::EcdhEsKeyWrap(AesKeySize::A128).determines_cek());
        assert!(!KeyAlgorithm::Rsa(RsaPadding::Oaep).determines_cek());
    }
}
