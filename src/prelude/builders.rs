//! Builder patterns for JWE operations.
//!
//! [`JweBuilder`] collects recipients and options for
//! [`encrypt_with`](crate::core::jwe::encrypt_with).
//! [`Pbes2Builder`] covers password-based encryption with preset profiles.
//!
//! # PBES2 Profiles
//!
//! | Profile | Iterations | Use Case |
//! |---------|------------|----------|
//! | `interactive()` | 100,000 | Fast, interactive logins |
//! | `moderate()` | 310,000 | Balanced security (default) |
//! | `sensitive()` | 600,000 | High-security, long-term storage |
//!
//! # Example
//!
//! ```rust
//! use jwekit::prelude::*;
//!
//! let registry = Registry::with_defaults();
//! let alice = Key::symmetric([0x42u8; 16]);
//! let bob = Key::symmetric([0x24u8; 32]);
//!
//! let envelope = JweBuilder::new(ContentAlgorithm::Gcm(AesKeySize::A256))
//!     .recipient_with_kid(KeyAlgorithm::AesKeyWrap(AesKeySize::A128), &alice, "alice")
//!     .recipient_with_kid(KeyAlgorithm::AesGcmKeyWrap(AesKeySize::A256), &bob, "bob")
//!     .try_encrypt(&registry, b"for both of you")
//!     .expect("encrypt should succeed");
//!
//! let json = envelope.to_json_general().expect("general JSON");
//! let parsed = SealedEnvelope::parse_any(&json).expect("parse should succeed");
//! let plaintext = decrypt(&registry, &parsed, &bob).expect("decrypt should succeed");
//! assert_eq!(plaintext, b"for both of you");
//! ```

use crate::core::algorithm::{AesKeySize, ContentAlgorithm, KeyAlgorithm};
use crate::core::error::JweResult;
use crate::core::header::JoseHeader;
use crate::core::jwe::{self, DecryptOptions, EncryptOptions, RecipientSpec};
use crate::core::operations::pbes2::{Pbes2Params, Pbes2Policy};
use crate::core::registry::Registry;
use crate::core::types::{ContentEncryptionKey, Key, SealedEnvelope};

/// Builder for multi-recipient encryption.
#[derive(Debug, Clone)]
pub struct JweBuilder<'a> {
    content_alg: ContentAlgorithm,
    recipients: Vec<RecipientSpec<'a>>,
    options: EncryptOptions,
}

impl<'a> JweBuilder<'a> {
    /// Creates a builder for the given content algorithm.
    #[must_use]
    pub fn new(content_alg: ContentAlgorithm) -> Self {
        Self {
            content_alg,
            recipients: Vec::new(),
            options: EncryptOptions::default(),
        }
    }

    /// `A256GCM` content encryption.
    #[must_use]
    pub fn a256gcm() -> Self {
        Self::new(ContentAlgorithm::Gcm(AesKeySize::A256))
    }

    /// `A256CBC-HS512` content encryption.
    #[must_use]
    pub fn a256cbc_hs512() -> Self {
        Self::new(ContentAlgorithm::CbcHmac(AesKeySize::A256))
    }

    /// Adds a recipient.
    #[must_use]
    pub fn recipient(mut self, alg: KeyAlgorithm, key: &'a Key) -> Self {
        self.recipients.push(RecipientSpec::new(alg, key));
        self
    }

    /// Adds a recipient with a `kid`.
    #[must_use]
    pub fn recipient_with_kid(
        mut self,
        alg: KeyAlgorithm,
        key: &'a Key,
        kid: impl Into<String>,
    ) -> Self {
        self.recipients.push(RecipientSpec::new(alg, key).with_kid(kid));
        self
    }

    /// Compresses the plaintext with the given `zip` id.
    #[must_use]
    pub fn zip(mut self, id: impl Into<String>) -> Self {
        self.options.zip = Some(id.into());
        self
    }

    /// Sets the protected `kid`.
    #[must_use]
    pub fn kid(mut self, kid: impl Into<String>) -> Self {
        self.options.kid = Some(kid.into());
        self
    }

    /// Sets caller AAD. The result can then only be written as JSON.
    #[must_use]
    pub fn aad(mut self, aad: impl Into<Vec<u8>>) -> Self {
        self.options.aad = Some(aad.into());
        self
    }

    /// Sets the ECDH-ES `apu` and `apv` values.
    #[must_use]
    pub fn agreement_info(mut self, apu: impl Into<Vec<u8>>, apv: impl Into<Vec<u8>>) -> Self {
        self.options.apu = Some(apu.into());
        self.options.apv = Some(apv.into());
        self
    }

    /// Uses a fixed CEK instead of a random one.
    #[must_use]
    pub fn cek(mut self, cek: ContentEncryptionKey) -> Self {
        self.options.cek = Some(cek);
        self
    }

    /// Uses a fixed content IV instead of a random one.
    #[must_use]
    pub fn iv(mut self, iv: impl Into<Vec<u8>>) -> Self {
        self.options.iv = Some(iv.into());
        self
    }

    /// Sets the PBES2 parameters used by password recipients.
    #[must_use]
    pub fn pbes2(mut self, params: Pbes2Params) -> Self {
        self.options.pbes2 = params;
        self
    }

    /// Adds a member to the protected header.
    #[must_use]
    pub fn protected(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.options
            .protected_extra
            .get_or_insert_with(JoseHeader::new)
            .set(name, value);
        self
    }

    /// Returns the content algorithm.
    #[must_use]
    pub const fn get_content_alg(&self) -> ContentAlgorithm {
        self.content_alg
    }

    /// Returns the number of recipients added so far.
    #[must_use]
    pub fn recipient_count(&self) -> usize {
        self.recipients.len()
    }

    /// Encrypts `plaintext` for every recipient.
    pub fn try_encrypt(&self, registry: &Registry, plaintext: &[u8]) -> JweResult<SealedEnvelope> {
        jwe::encrypt_with(
            registry,
            plaintext,
            self.content_alg,
            &self.recipients,
            &self.options,
        )
    }
}

/// Builder for password-based encryption (PBES2).
///
/// # Example
///
/// ```rust
/// use jwekit::prelude::*;
///
/// let registry = Registry::with_defaults();
///
/// let builder = Pbes2Builder::interactive().iterations(10_000);
/// let envelope = builder
///     .try_encrypt(&registry, b"secret", "password")
///     .expect("encrypt should succeed");
///
/// let compact = envelope.to_compact().expect("compact");
/// let parsed: SealedEnvelope = compact.parse().expect("parse should succeed");
/// let plaintext = builder
///     .try_decrypt(&registry, &parsed, "password")
///     .expect("decrypt should succeed");
/// assert_eq!(plaintext, b"secret");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Pbes2Builder {
    size: AesKeySize,
    content_alg: ContentAlgorithm,
    params: Pbes2Params,
    policy: Pbes2Policy,
}

impl Default for Pbes2Builder {
    fn default() -> Self {
        Self::moderate()
    }
}

impl Pbes2Builder {
    /// Creates a new builder with default (moderate) parameters.
    #[must_use]
    pub const fn new() -> Self {
        Self::moderate()
    }

    /// Interactive profile: 100,000 iterations.
    #[must_use]
    pub const fn interactive() -> Self {
        Self::with_params(Pbes2Params::interactive())
    }

    /// Moderate profile: 310,000 iterations.
    ///
    /// This is the recommended default for most applications.
    #[must_use]
    pub const fn moderate() -> Self {
        Self::with_params(Pbes2Params::moderate())
    }

    /// Sensitive profile: 600,000 iterations.
    #[must_use]
    pub const fn sensitive() -> Self {
        Self::with_params(Pbes2Params::sensitive())
    }

    const fn with_params(params: Pbes2Params) -> Self {
        Self {
            size: AesKeySize::A256,
            content_alg: ContentAlgorithm::Gcm(AesKeySize::A256),
            params,
            policy: Pbes2Policy {
                min_iterations: 1_000,
                max_iterations: 1_000_000,
            },
        }
    }

    /// Selects the PBES2 variant (`PBES2-HS256+A128KW`, ...).
    #[must_use]
    pub const fn key_size(mut self, size: AesKeySize) -> Self {
        self.size = size;
        self
    }

    /// Sets the content encryption algorithm.
    #[must_use]
    pub const fn content_alg(mut self, content_alg: ContentAlgorithm) -> Self {
        self.content_alg = content_alg;
        self
    }

    /// Sets the iteration count (`p2c`).
    #[must_use]
    pub const fn iterations(mut self, iterations: u32) -> Self {
        self.params.iterations = iterations;
        self
    }

    /// Sets the salt input length (`p2s`).
    #[must_use]
    pub const fn salt_len(mut self, salt_len: usize) -> Self {
        self.params.salt_len = salt_len;
        self
    }

    /// Sets the iteration bounds accepted on decryption.
    #[must_use]
    pub const fn policy(mut self, policy: Pbes2Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the configured number of iterations.
    #[must_use]
    pub const fn get_iterations(&self) -> u32 {
        self.params.iterations
    }

    /// Returns the key management algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> KeyAlgorithm {
        KeyAlgorithm::Pbes2(self.size)
    }

    /// Encrypts `plaintext` under `password`.
    pub fn try_encrypt(
        &self,
        registry: &Registry,
        plaintext: &[u8],
        password: impl Into<Vec<u8>>,
    ) -> JweResult<SealedEnvelope> {
        let key = Key::password(password);
        JweBuilder::new(self.content_alg)
            .recipient(self.algorithm(), &key)
            .pbes2(self.params)
            .try_encrypt(registry, plaintext)
    }

    /// Decrypts `envelope` with `password`, enforcing the iteration policy.
    pub fn try_decrypt(
        &self,
        registry: &Registry,
        envelope: &SealedEnvelope,
        password: impl Into<Vec<u8>>,
    ) -> JweResult<Vec<u8>> {
        let options = DecryptOptions {
            pbes2_policy: self.policy,
        };
        jwe::decrypt_with(registry, envelope, &Key::password(password), &options)
    }
}
