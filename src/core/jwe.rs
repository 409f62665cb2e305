//! Encrypt/decrypt facade.
//!
//! Encryption runs compression, key management, content encryption and
//! envelope assembly. Decryption resolves every identifier in the header
//! against the [`Registry`] before any key is touched, then tries each
//! recipient in order.
//!
//! # Example
//!
//! ```rust
//! use jwekit::core::algorithm::{AesKeySize, ContentAlgorithm, KeyAlgorithm};
//! use jwekit::core::jwe;
//! use jwekit::core::registry::Registry;
//! use jwekit::core::types::{Key, SealedEnvelope};
//!
//! let registry = Registry::with_defaults();
//! let key = Key::symmetric([0x42u8; 16]);
//!
//! let envelope = jwe::encrypt(
//!     &registry,
//!     b"hello",
//!     KeyAlgorithm::AesKeyWrap(AesKeySize::A128),
//!     &key,
//!     ContentAlgorithm::Gcm(AesKeySize::A256),
//! )
//! .expect("encrypt");
//!
//! let compact = envelope.to_compact().expect("compact");
//! let parsed: SealedEnvelope = compact.parse().expect("parse");
//! assert_eq!(jwe::decrypt(&registry, &parsed, &key).expect("decrypt"), b"hello");
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::core::algorithm::{ContentAlgorithm, KeyAlgorithm};
use crate::core::error::{JweError, JweResult};
use crate::core::header::{params, JoseHeader};
use crate::core::operations::compress::Compressor;
use crate::core::operations::content::{decrypt_content, encrypt_content};
use crate::core::operations::dispatch::{self, WrapParams};
use crate::core::operations::pbes2::{Pbes2Params, Pbes2Policy};
use crate::core::registry::Registry;
use crate::core::serialization::content_aad;
use crate::core::types::{ContentEncryptionKey, Key, KeyUse, Recipient, SealedEnvelope};

/// One recipient of [`encrypt_with`].
#[derive(Debug, Clone)]
pub struct RecipientSpec<'a> {
    /// Key management algorithm.
    pub alg: KeyAlgorithm,
    /// Recipient key.
    pub key: &'a Key,
    /// Optional `kid` for this recipient.
    pub kid: Option<String>,
}

impl<'a> RecipientSpec<'a> {
    /// Creates a recipient without a `kid`.
    #[must_use]
    pub const fn new(alg: KeyAlgorithm, key: &'a Key) -> Self {
        Self {
            alg,
            key,
            kid: None,
        }
    }

    /// Sets the recipient's `kid`.
    #[must_use]
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }
}

/// Optional inputs for [`encrypt_with`].
#[derive(Debug, Clone, Default)]
pub struct EncryptOptions {
    /// Compression id (`zip`), e.g. `"DEF"`.
    pub zip: Option<String>,
    /// `kid` placed in the protected header.
    pub kid: Option<String>,
    /// Caller AAD (JSON serializations only).
    pub aad: Option<Vec<u8>>,
    /// Use this CEK instead of a random one. Not allowed with `dir` or
    /// `ECDH-ES`.
    pub cek: Option<ContentEncryptionKey>,
    /// Use this content IV instead of a random one.
    pub iv: Option<Vec<u8>>,
    /// ECDH-ES `apu`.
    pub apu: Option<Vec<u8>>,
    /// ECDH-ES `apv`.
    pub apv: Option<Vec<u8>>,
    /// PBES2 iteration count and salt length.
    pub pbes2: Pbes2Params,
    /// PBES2 salt input; random when absent.
    pub p2s: Option<Vec<u8>>,
    /// Extra protected header members (`typ`, `cty`, `crit`, extensions).
    pub protected_extra: Option<JoseHeader>,
}

/// Optional inputs for [`decrypt_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DecryptOptions {
    /// Accepted PBES2 iteration counts.
    pub pbes2_policy: Pbes2Policy,
}

/// Encrypts `plaintext` for a single recipient.
///
/// The resulting envelope has all header members protected, so it can be
/// written in any serialization.
pub fn encrypt(
    registry: &Registry,
    plaintext: &[u8],
    key_alg: KeyAlgorithm,
    key: &Key,
    content_alg: ContentAlgorithm,
) -> JweResult<SealedEnvelope> {
    encrypt_with(
        registry,
        plaintext,
        content_alg,
        &[RecipientSpec::new(key_alg, key)],
        &EncryptOptions::default(),
    )
}

/// Encrypts `plaintext` for one or more recipients.
///
/// With a single recipient, `alg` and the key management parameters go in
/// the protected header. With several, each recipient gets them in its own
/// header and one CEK is wrapped per recipient.
///
/// # Errors
///
/// - [`JweError::InvalidFormat`] for no recipients, or `dir`/`ECDH-ES`
///   among several recipients
/// - [`JweError::UnsupportedAlgorithm`] / [`JweError::UnsupportedCompression`]
///   for identifiers the registry does not know
/// - [`JweError::KeyMismatch`] if a key cannot serve its algorithm
/// - [`JweError::InvalidHeader`] if `protected_extra` collides with a
///   member the facade sets, or carries an invalid `crit`
pub fn encrypt_with(
    registry: &Registry,
    plaintext: &[u8],
    content_alg: ContentAlgorithm,
    recipients: &[RecipientSpec<'_>],
    options: &EncryptOptions,
) -> JweResult<SealedEnvelope> {
    if recipients.is_empty() {
        return Err(JweError::InvalidFormat(
            "a JWE needs at least one recipient".into(),
        ));
    }
    let single = recipients.len() == 1;
    if !single && recipients.iter().any(|r| r.alg.determines_cek()) {
        return Err(JweError::InvalidFormat(
            "dir and ECDH-ES allow only a single recipient".into(),
        ));
    }

    registry.content_algorithm(content_alg.name())?;
    for recipient in recipients {
        registry.key_algorithm(recipient.alg.name())?;
        recipient.key.ensure_supports(recipient.alg, KeyUse::Encrypt)?;
    }
    let compressor = options
        .zip
        .as_deref()
        .map(|zip| registry.compressor(zip))
        .transpose()?;

    debug!(
        enc = %content_alg,
        recipients = recipients.len(),
        zip = options.zip.as_deref().unwrap_or("none"),
        "encrypting JWE"
    );

    // The CEK shared by all recipients. `dir`/`ECDH-ES` (single recipient
    // only) produce their own.
    let shared_cek = match &options.cek {
        Some(cek) => Some(cek.clone()),
        None if recipients[0].alg.determines_cek() => None,
        None => Some(ContentEncryptionKey::generate(content_alg)?),
    };
    let wrap_params = WrapParams {
        apu: options.apu.clone(),
        apv: options.apv.clone(),
        p2s: options.p2s.clone(),
        pbes2: options.pbes2,
    };

    let mut protected = JoseHeader::new();
    let mut sealed_recipients = Vec::with_capacity(recipients.len());
    let mut cek = None;

    for (index, recipient) in recipients.iter().enumerate() {
        let output = dispatch::wrap_cek(
            recipient.alg,
            recipient.key,
            content_alg,
            shared_cek.as_ref(),
            &wrap_params,
        )?;

        let mut header = JoseHeader::new();
        header.set(params::ALG, recipient.alg.name());
        header.absorb(&output.header)?;
        if let Some(kid) = &recipient.kid {
            header.set(params::KID, kid.as_str());
        }

        if single {
            protected = header;
            sealed_recipients.push(Recipient::new(output.encrypted_key, None));
        } else {
            debug!(index, alg = %recipient.alg, "wrapped CEK for recipient");
            sealed_recipients.push(Recipient::new(output.encrypted_key, Some(header)));
        }
        cek.get_or_insert(output.cek);
    }
    let cek = cek.ok_or(JweError::CryptoError)?;

    protected.set(params::ENC, content_alg.name());
    if let Some(compressor) = &compressor {
        protected.set(params::ZIP, compressor.id());
    }
    if let Some(kid) = &options.kid {
        let mut kid_header = JoseHeader::new();
        kid_header.set(params::KID, kid.as_str());
        protected.absorb(&kid_header)?;
    }
    if let Some(extra) = &options.protected_extra {
        protected.absorb(extra)?;
    }
    for recipient in &sealed_recipients {
        let effective = JoseHeader::merge(Some(&protected), None, recipient.header())?;
        JoseHeader::check_critical(Some(&protected), &effective, registry)?;
    }

    let protected_b64 = protected.encode_b64()?;
    let aad = content_aad(&protected_b64, options.aad.as_deref());

    let compressed;
    let payload = match &compressor {
        Some(compressor) => {
            compressed = compressor.compress(plaintext)?;
            compressed.as_slice()
        }
        None => plaintext,
    };
    let content = encrypt_content(
        content_alg,
        cek.as_bytes(),
        options.iv.as_deref(),
        &aad,
        payload,
    )?;

    let envelope = SealedEnvelope {
        protected,
        protected_b64,
        unprotected: None,
        recipients: sealed_recipients,
        iv: content.iv,
        ciphertext: content.ciphertext,
        tag: content.tag,
        aad: options.aad.clone(),
    };
    envelope.validate()?;
    Ok(envelope)
}

/// Decrypts `envelope` with `key`.
pub fn decrypt(registry: &Registry, envelope: &SealedEnvelope, key: &Key) -> JweResult<Vec<u8>> {
    decrypt_with(registry, envelope, key, &DecryptOptions::default())
}

/// A recipient whose identifiers have been resolved.
struct ResolvedRecipient<'e> {
    alg: KeyAlgorithm,
    header: JoseHeader,
    recipient: &'e Recipient,
}

/// Decrypts `envelope` with `key`, honouring `options`.
///
/// Recipients whose `alg` cannot use `key` are skipped, as are recipients
/// whose key or content decryption fails.
///
/// # Errors
///
/// Raised before any key is touched:
/// - [`JweError::MissingHeader`] for an absent `alg` or `enc`
/// - [`JweError::InvalidHeader`] for `enc`/`zip` outside the shared scopes,
///   or an invalid `crit`
/// - [`JweError::UnsupportedAlgorithm`], [`JweError::UnsupportedCompression`],
///   [`JweError::UnsupportedCritical`]
///
/// After trying every recipient:
/// - [`JweError::InvalidKeySize`] if every recipient was rejected only on
///   the length of `key`
/// - [`JweError::KeyMismatch`] if no recipient could use `key`
/// - [`JweError::DecryptionFailed`] if some could, but none decrypted
pub fn decrypt_with(
    registry: &Registry,
    envelope: &SealedEnvelope,
    key: &Key,
    options: &DecryptOptions,
) -> JweResult<Vec<u8>> {
    let protected = envelope.protected();
    let shared = envelope.unprotected();

    let enc = shared_member(protected, shared, params::ENC)?
        .ok_or(JweError::MissingHeader(params::ENC))?;
    let content_alg = registry.content_algorithm(&enc)?;
    if shared.is_some_and(|h| h.contains(params::ZIP)) {
        return Err(JweError::InvalidHeader("zip must be integrity protected".into()));
    }
    let compressor: Option<Arc<dyn Compressor>> =
        protected.zip()?.map(|zip| registry.compressor(zip)).transpose()?;

    let resolved = envelope
        .recipients()
        .iter()
        .map(|recipient| {
            if recipient
                .header()
                .is_some_and(|h| h.contains(params::ENC) || h.contains(params::ZIP))
            {
                return Err(JweError::InvalidHeader(
                    "enc and zip may not appear in a per-recipient header".into(),
                ));
            }
            let header = JoseHeader::merge(Some(protected), shared, recipient.header())?;
            JoseHeader::check_critical(Some(protected), &header, registry)?;
            let alg = header.alg()?.ok_or(JweError::MissingHeader(params::ALG))?;
            let alg = registry.key_algorithm(alg)?;
            Ok(ResolvedRecipient {
                alg,
                header,
                recipient,
            })
        })
        .collect::<JweResult<Vec<_>>>()?;

    debug!(
        enc = %content_alg,
        recipients = resolved.len(),
        zip = compressor.as_ref().map_or("none", |c| c.id()),
        "decrypting JWE"
    );

    let aad = envelope.authenticated_data();
    let mut usable = false;
    let mut size_failures = 0usize;
    let mut size_error = None;

    for (index, candidate) in resolved.iter().enumerate() {
        if !key.supports(candidate.alg, KeyUse::Decrypt) {
            debug!(index, alg = %candidate.alg, "skipping recipient: key kind does not match");
            continue;
        }

        let cek = match dispatch::unwrap_cek(
            candidate.alg,
            key,
            content_alg,
            candidate.recipient.encrypted_key(),
            &candidate.header,
            &options.pbes2_policy,
        ) {
            Ok(cek) => cek,
            Err(JweError::KeyMismatch { .. }) => {
                debug!(index, alg = %candidate.alg, "skipping recipient: key does not fit");
                continue;
            }
            Err(e @ JweError::InvalidKeySize { .. }) => {
                debug!(index, alg = %candidate.alg, "skipping recipient: key has the wrong length");
                size_failures += 1;
                size_error = Some(e);
                continue;
            }
            Err(e) if e.is_cryptographic() => {
                usable = true;
                debug!(index, alg = %candidate.alg, "skipping recipient: key unwrap failed");
                continue;
            }
            Err(e) => return Err(e),
        };
        usable = true;

        let plaintext = match decrypt_content(
            content_alg,
            cek.as_bytes(),
            envelope.iv(),
            &aad,
            envelope.ciphertext(),
            envelope.tag(),
        ) {
            Ok(plaintext) => plaintext,
            Err(JweError::DecryptionFailed) => {
                debug!(index, "skipping recipient: content decryption failed");
                continue;
            }
            Err(e) => return Err(e),
        };

        return match &compressor {
            Some(compressor) => compressor.decompress(&plaintext),
            None => Ok(plaintext),
        };
    }

    if usable {
        return Err(JweError::DecryptionFailed);
    }
    match size_error {
        Some(e) if size_failures == resolved.len() => Err(e),
        _ => {
            let algorithms: Vec<&str> = resolved.iter().map(|r| r.alg.name()).collect();
            Err(JweError::KeyMismatch {
                algorithm: algorithms.join(", "),
                key: key.kind().label(),
            })
        }
    }
}

/// Reads a member that may only live in the protected or shared header.
fn shared_member(
    protected: &JoseHeader,
    shared: Option<&JoseHeader>,
    name: &'static str,
) -> JweResult<Option<String>> {
    let value = match protected.get_str(name)? {
        Some(value) => Some(value),
        None => shared.map(|h| h.get_str(name)).transpose()?.flatten(),
    };
    Ok(value.map(str::to_string))
}
