//! Key capability model.
//!
//! A [`Key`] is the caller-supplied key material for one recipient. It is a
//! closed set of variants; each declares its [`KeyKind`] so an algorithm
//! that cannot use it is rejected before any cryptographic call, and each
//! implements the subset of `encrypt`/`decrypt`/`seal`/`open` its
//! algorithms need.

use std::fmt::{self, Debug};

use zeroize::{Zeroize, Zeroizing};

use crate::core::algorithm::KeyAlgorithm;
use crate::core::error::{JweError, JweResult};
use crate::core::operations::wrap;

// =============================================================================
// Symmetric and password keys
// =============================================================================

/// Raw symmetric key bytes (`dir`, AES-KW, AES-GCM-KW).
///
/// # Security
///
/// - Key material is zeroized on drop
/// - Debug output redacts the key
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SymmetricKey {
    key: Vec<u8>,
}

impl SymmetricKey {
    /// Wraps raw key bytes.
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }
}

impl Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("len", &self.key.len())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// A password for the PBES2 family.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Password {
    password: Vec<u8>,
}

impl Password {
    /// Wraps password bytes.
    #[must_use]
    pub fn new(password: impl Into<Vec<u8>>) -> Self {
        Self {
            password: password.into(),
        }
    }

    /// Returns the password bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.password
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

// =============================================================================
// Elliptic curve keys
// =============================================================================

/// Curves usable with ECDH-ES.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    /// NIST P-256.
    P256,
    /// NIST P-384.
    P384,
    /// Curve25519 in Montgomery form.
    X25519,
}

impl Curve {
    /// The JWK `crv` name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::X25519 => "X25519",
        }
    }

    /// Parses a JWK `crv` name.
    ///
    /// # Errors
    ///
    /// Returns [`JweError::UnsupportedCurve`] for anything but `P-256`,
    /// `P-384` and `X25519`.
    pub fn from_name(name: &str) -> JweResult<Self> {
        match name {
            "P-256" => Ok(Self::P256),
            "P-384" => Ok(Self::P384),
            "X25519" => Ok(Self::X25519),
            other => Err(JweError::UnsupportedCurve(other.to_string())),
        }
    }
}

/// A recipient's public key for ECDH-ES.
#[cfg(feature = "ecdh")]
#[derive(Debug, Clone)]
pub enum EcPublicKey {
    /// P-256 point.
    P256(p256::PublicKey),
    /// P-384 point.
    P384(p384::PublicKey),
    /// X25519 public key.
    X25519(x25519_dalek::PublicKey),
}

#[cfg(feature = "ecdh")]
impl EcPublicKey {
    /// Parses a SEC1-encoded point (compressed or uncompressed).
    ///
    /// # Errors
    ///
    /// Returns [`JweError::InvalidKey`] for points not on the curve, and
    /// [`JweError::UnsupportedCurve`] for `X25519` (use [`Self::x25519`]).
    pub fn from_sec1(curve: Curve, bytes: &[u8]) -> JweResult<Self> {
        match curve {
            Curve::P256 => p256::PublicKey::from_sec1_bytes(bytes)
                .map(Self::P256)
                .map_err(|_| JweError::InvalidKey),
            Curve::P384 => p384::PublicKey::from_sec1_bytes(bytes)
                .map(Self::P384)
                .map_err(|_| JweError::InvalidKey),
            Curve::X25519 => Err(JweError::UnsupportedCurve(
                "X25519 keys have no SEC1 encoding".into(),
            )),
        }
    }

    /// Creates an X25519 public key from its 32-byte encoding.
    #[must_use]
    pub fn x25519(bytes: [u8; 32]) -> Self {
        Self::X25519(x25519_dalek::PublicKey::from(bytes))
    }

    /// The curve this key lives on.
    #[must_use]
    pub const fn curve(&self) -> Curve {
        match self {
            Self::P256(_) => Curve::P256,
            Self::P384(_) => Curve::P384,
            Self::X25519(_) => Curve::X25519,
        }
    }
}

/// A recipient's private key for ECDH-ES.
#[cfg(feature = "ecdh")]
#[derive(Clone)]
pub enum EcPrivateKey {
    /// P-256 scalar.
    P256(p256::SecretKey),
    /// P-384 scalar.
    P384(p384::SecretKey),
    /// X25519 static secret.
    X25519(x25519_dalek::StaticSecret),
}

#[cfg(feature = "ecdh")]
impl EcPrivateKey {
    /// Generates a fresh private key on `curve`.
    #[must_use]
    pub fn generate(curve: Curve) -> Self {
        use rand_core::OsRng;

        match curve {
            Curve::P256 => Self::P256(p256::SecretKey::random(&mut OsRng)),
            Curve::P384 => Self::P384(p384::SecretKey::random(&mut OsRng)),
            Curve::X25519 => Self::X25519(x25519_dalek::StaticSecret::random_from_rng(OsRng)),
        }
    }

    /// Parses a big-endian scalar (P-256/P-384) or a 32-byte X25519 secret.
    ///
    /// # Errors
    ///
    /// Returns [`JweError::InvalidKey`] for out-of-range or wrongly sized
    /// scalars.
    pub fn from_bytes(curve: Curve, bytes: &[u8]) -> JweResult<Self> {
        match curve {
            Curve::P256 => p256::SecretKey::from_slice(bytes)
                .map(Self::P256)
                .map_err(|_| JweError::InvalidKey),
            Curve::P384 => p384::SecretKey::from_slice(bytes)
                .map(Self::P384)
                .map_err(|_| JweError::InvalidKey),
            Curve::X25519 => {
                let mut secret: [u8; 32] = bytes.try_into().map_err(|_| JweError::InvalidKey)?;
                let key = Self::X25519(x25519_dalek::StaticSecret::from(secret));
                secret.zeroize();
                Ok(key)
            }
        }
    }

    /// The matching public key.
    #[must_use]
    pub fn public_key(&self) -> EcPublicKey {
        match self {
            Self::P256(sk) => EcPublicKey::P256(sk.public_key()),
            Self::P384(sk) => EcPublicKey::P384(sk.public_key()),
            Self::X25519(sk) => EcPublicKey::X25519(x25519_dalek::PublicKey::from(sk)),
        }
    }

    /// The curve this key lives on.
    #[must_use]
    pub const fn curve(&self) -> Curve {
        match self {
            Self::P256(_) => Curve::P256,
            Self::P384(_) => Curve::P384,
            Self::X25519(_) => Curve::X25519,
        }
    }
}

#[cfg(feature = "ecdh")]
impl Debug for EcPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcPrivateKey")
            .field("curve", &self.curve())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

// =============================================================================
// Key
// =============================================================================

/// Declared type of a [`Key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Symmetric key of the given length in bytes.
    Symmetric(usize),
    /// Password.
    Password,
    /// RSA public key.
    RsaPublic,
    /// RSA private key.
    RsaPrivate,
    /// Elliptic curve public key.
    EcPublic(Curve),
    /// Elliptic curve private key.
    EcPrivate(Curve),
}

impl KeyKind {
    /// Short label used in error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Symmetric(_) => "symmetric",
            Self::Password => "password",
            Self::RsaPublic => "RSA public",
            Self::RsaPrivate => "RSA private",
            Self::EcPublic(_) => "EC public",
            Self::EcPrivate(_) => "EC private",
        }
    }
}

/// Direction a key is used in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyUse {
    /// Producing a JWE.
    Encrypt,
    /// Opening a JWE.
    Decrypt,
}

/// Output of [`Key::seal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedKey {
    /// IV used for the seal.
    pub iv: Vec<u8>,
    /// Encrypted key bytes.
    pub ciphertext: Vec<u8>,
    /// Authentication tag.
    pub tag: Vec<u8>,
}

/// Key material for one recipient.
///
/// # Example
///
/// ```rust
/// use jwekit::core::types::{Key, KeyKind};
///
/// let key = Key::symmetric([0u8; 16]);
/// assert_eq!(key.kind(), KeyKind::Symmetric(16));
/// ```
#[derive(Clone)]
pub enum Key {
    /// Shared symmetric key.
    Symmetric(SymmetricKey),
    /// Password (PBES2).
    Password(Password),
    /// RSA public key (encrypt only).
    #[cfg(feature = "rsa")]
    RsaPublic(Box<rsa::RsaPublicKey>),
    /// RSA private key (encrypt with its public half, or decrypt).
    #[cfg(feature = "rsa")]
    RsaPrivate(Box<rsa::RsaPrivateKey>),
    /// Elliptic curve public key (encrypt only).
    #[cfg(feature = "ecdh")]
    EcPublic(EcPublicKey),
    /// Elliptic curve private key (encrypt with its public half, or decrypt).
    #[cfg(feature = "ecdh")]
    EcPrivate(EcPrivateKey),
}

impl Key {
    /// Creates a symmetric key.
    #[must_use]
    pub fn symmetric(key: impl Into<Vec<u8>>) -> Self {
        Self::Symmetric(SymmetricKey::new(key))
    }

    /// Creates a password key.
    #[must_use]
    pub fn password(password: impl Into<Vec<u8>>) -> Self {
        Self::Password(Password::new(password))
    }

    /// Declared type of this key.
    #[must_use]
    pub fn kind(&self) -> KeyKind {
        match self {
            Self::Symmetric(k) => KeyKind::Symmetric(k.as_bytes().len()),
            Self::Password(_) => KeyKind::Password,
            #[cfg(feature = "rsa")]
            Self::RsaPublic(_) => KeyKind::RsaPublic,
            #[cfg(feature = "rsa")]
            Self::RsaPrivate(_) => KeyKind::RsaPrivate,
            #[cfg(feature = "ecdh")]
            Self::EcPublic(k) => KeyKind::EcPublic(k.curve()),
            #[cfg(feature = "ecdh")]
            Self::EcPrivate(k) => KeyKind::EcPrivate(k.curve()),
        }
    }

    /// Returns `true` if this key can serve `alg` in the given direction.
    #[must_use]
    pub fn supports(&self, alg: KeyAlgorithm, usage: KeyUse) -> bool {
        let kind = self.kind();
        match alg {
            KeyAlgorithm::Direct
            | KeyAlgorithm::AesKeyWrap(_)
            | KeyAlgorithm::AesGcmKeyWrap(_) => matches!(kind, KeyKind::Symmetric(_)),
            KeyAlgorithm::Pbes2(_) => kind == KeyKind::Password,
            KeyAlgorithm::Rsa(_) => match usage {
                KeyUse::Encrypt => matches!(kind, KeyKind::RsaPublic | KeyKind::RsaPrivate),
                KeyUse::Decrypt => kind == KeyKind::RsaPrivate,
            },
            KeyAlgorithm::EcdhEs | KeyAlgorithm::EcdhEsKeyWrap(_) => match usage {
                KeyUse::Encrypt => matches!(kind, KeyKind::EcPublic(_) | KeyKind::EcPrivate(_)),
                KeyUse::Decrypt => matches!(kind, KeyKind::EcPrivate(_)),
            },
        }
    }

    /// Fails with [`JweError::KeyMismatch`] unless [`Self::supports`] holds.
    pub fn ensure_supports(&self, alg: KeyAlgorithm, usage: KeyUse) -> JweResult<()> {
        if self.supports(alg, usage) {
            Ok(())
        } else {
            Err(self.mismatch(alg))
        }
    }

    pub(crate) fn mismatch(&self, alg: KeyAlgorithm) -> JweError {
        JweError::KeyMismatch {
            algorithm: alg.name().to_string(),
            key: self.kind().label(),
        }
    }

    // =========================================================================
    // Capabilities
    // =========================================================================

    /// Encrypts key material (AES key wrap, RSA).
    pub fn encrypt(&self, plaintext: &[u8], alg: KeyAlgorithm) -> JweResult<Vec<u8>> {
        self.ensure_supports(alg, KeyUse::Encrypt)?;
        match (self, alg) {
            (Self::Symmetric(kek), KeyAlgorithm::AesKeyWrap(size)) => {
                wrap::aes_key_wrap(size, kek.as_bytes(), plaintext)
            }
            #[cfg(feature = "rsa")]
            (Self::RsaPublic(pk), KeyAlgorithm::Rsa(padding)) => {
                crate::core::operations::rsa_kem::encrypt(pk, padding, plaintext)
            }
            #[cfg(feature = "rsa")]
            (Self::RsaPrivate(sk), KeyAlgorithm::Rsa(padding)) => {
                crate::core::operations::rsa_kem::encrypt(&sk.to_public_key(), padding, plaintext)
            }
            _ => Err(self.mismatch(alg)),
        }
    }

    /// Decrypts key material (AES key wrap, RSA).
    pub fn decrypt(&self, ciphertext: &[u8], alg: KeyAlgorithm) -> JweResult<Zeroizing<Vec<u8>>> {
        self.ensure_supports(alg, KeyUse::Decrypt)?;
        match (self, alg) {
            (Self::Symmetric(kek), KeyAlgorithm::AesKeyWrap(size)) => {
                wrap::aes_key_unwrap(size, kek.as_bytes(), ciphertext)
            }
            #[cfg(feature = "rsa")]
            (Self::RsaPrivate(sk), KeyAlgorithm::Rsa(padding)) => {
                crate::core::operations::rsa_kem::decrypt(sk, padding, ciphertext)
            }
            _ => Err(self.mismatch(alg)),
        }
    }

    /// Authenticated encryption of key material (AES-GCM key wrap).
    ///
    /// A fresh IV is drawn when `iv` is `None`.
    pub fn seal(
        &self,
        plaintext: &[u8],
        iv: Option<&[u8]>,
        aad: Option<&[u8]>,
        alg: KeyAlgorithm,
    ) -> JweResult<SealedKey> {
        self.ensure_supports(alg, KeyUse::Encrypt)?;
        match (self, alg) {
            (Self::Symmetric(kek), KeyAlgorithm::AesGcmKeyWrap(size)) => {
                wrap::aes_gcm_wrap(size, kek.as_bytes(), plaintext, iv, aad.unwrap_or_default())
            }
            _ => Err(self.mismatch(alg)),
        }
    }

    /// Authenticated decryption of key material (AES-GCM key wrap).
    pub fn open(
        &self,
        iv: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
        aad: Option<&[u8]>,
        alg: KeyAlgorithm,
    ) -> JweResult<Zeroizing<Vec<u8>>> {
        self.ensure_supports(alg, KeyUse::Decrypt)?;
        match (self, alg) {
            (Self::Symmetric(kek), KeyAlgorithm::AesGcmKeyWrap(size)) => {
                wrap::aes_gcm_unwrap(size, kek.as_bytes(), iv, ciphertext, tag, aad.unwrap_or_default())
            }
            _ => Err(self.mismatch(alg)),
        }
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symmetric(k) => Debug::fmt(k, f),
            Self::Password(k) => Debug::fmt(k, f),
            #[cfg(feature = "rsa")]
            Self::RsaPublic(_) => f.write_str("RsaPublic"),
            #[cfg(feature = "rsa")]
            Self::RsaPrivate(_) => f.write_str("RsaPrivate([REDACTED])"),
            #[cfg(feature = "ecdh")]
            Self::EcPublic(k) => f.debug_tuple("EcPublic").field(&k.curve()).finish(),
            #[cfg(feature = "ecdh")]
            Self::EcPrivate(k) => Debug::fmt(k, f),
        }
    }
}

impl From<SymmetricKey> for Key {
    fn from(key: SymmetricKey) -> Self {
        Self::Symmetric(key)
    }
}

impl From<Password> for Key {
    fn from(password: Password) -> Self {
        Self::Password(password)
    }
}

#[cfg(feature = "rsa")]
impl From<rsa::RsaPublicKey> for Key {
    fn from(key: rsa::RsaPublicKey) -> Self {
        Self::RsaPublic(Box::new(key))
    }
}

#[cfg(feature = "rsa")]
impl From<rsa::RsaPrivateKey> for Key {
    fn from(key: rsa::RsaPrivateKey) -> Self {
        Self::RsaPrivate(Box::new(key))
    }
}

#[cfg(feature = "ecdh")]
impl From<EcPublicKey> for Key {
    fn from(key: EcPublicKey) -> Self {
        Self::EcPublic(key)
    }
}

#[cfg(feature = "ecdh")]
impl From<EcPrivateKey> for Key {
    fn from(key: EcPrivateKey) -> Self {
        Self::EcPrivate(key)
    }
}
