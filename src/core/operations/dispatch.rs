//! Key management dispatch.
//!
//! Maps a [`KeyAlgorithm`] and a [`Key`] to the strategy that produces (on
//! encryption) or recovers (on decryption) the content encryption key.
//!
//! | Strategy | CEK | Encrypted key | Header parameters |
//! |----------|-----|---------------|-------------------|
//! | `dir` | the key itself | empty | |
//! | `A*KW` | random | AES-KW(key, CEK) | |
//! | `RSA*` | random | RSA(key, CEK) | |
//! | `A*GCMKW` | random | AES-GCM(key, CEK) | `iv`, `tag` |
//! | `PBES2-*` | random | AES-KW(PBKDF2(password), CEK) | `p2s`, `p2c` |
//! | `ECDH-ES` | Concat KDF(Z) | empty | `epk`, `apu`, `apv` |
//! | `ECDH-ES+A*KW` | random | AES-KW(Concat KDF(Z), CEK) | `epk`, `apu`, `apv` |

use tracing::debug;

use crate::core::algorithm::{ContentAlgorithm, KeyAlgorithm};
use crate::core::error::{JweError, JweResult};
use crate::core::header::{params, JoseHeader};
use crate::core::operations::content::random_bytes;
use crate::core::operations::pbes2::{self, Pbes2Params, Pbes2Policy};
use crate::core::operations::wrap;
use crate::core::types::{ContentEncryptionKey, Key, KeyUse};

/// Sender-side inputs for the header-carrying strategies.
#[derive(Debug, Clone, Default)]
pub struct WrapParams {
    /// ECDH-ES `apu` (agreement PartyUInfo).
    pub apu: Option<Vec<u8>>,
    /// ECDH-ES `apv` (agreement PartyVInfo).
    pub apv: Option<Vec<u8>>,
    /// PBES2 salt input; random when absent.
    pub p2s: Option<Vec<u8>>,
    /// PBES2 iteration count and salt length.
    pub pbes2: Pbes2Params,
}

/// Result of [`wrap_cek`].
#[derive(Debug)]
pub struct KeyManagementOutput {
    /// The content encryption key to use.
    pub cek: ContentEncryptionKey,
    /// Encrypted key bytes for the recipient (empty for `dir`/`ECDH-ES`).
    pub encrypted_key: Vec<u8>,
    /// Header parameters the recipient needs (`epk`, `iv`, `p2s`, ...).
    pub header: JoseHeader,
}

/// Produces or wraps the CEK for one recipient.
///
/// `cek` is the CEK shared by all recipients. It must be `None` for the
/// algorithms that determine the CEK themselves (`dir`, `ECDH-ES`), and a
/// fresh one is generated when it is `None` for the others.
///
/// # Errors
///
/// - [`JweError::KeyMismatch`] if `key` cannot serve `alg`
/// - [`JweError::InvalidKeySize`] for a `dir` key of the wrong length
/// - [`JweError::InvalidFormat`] if a CEK is supplied to `dir`/`ECDH-ES`
pub fn wrap_cek(
    alg: KeyAlgorithm,
    key: &Key,
    enc: ContentAlgorithm,
    cek: Option<&ContentEncryptionKey>,
    params: &WrapParams,
) -> JweResult<KeyManagementOutput> {
    key.ensure_supports(alg, KeyUse::Encrypt)?;
    if alg.determines_cek() && cek.is_some() {
        return Err(JweError::InvalidFormat(format!(
            "{alg} determines the content encryption key; none may be supplied"
        )));
    }
    debug!(alg = %alg, enc = %enc, "wrapping content encryption key");

    let mut header = JoseHeader::new();
    let shared_cek = || match cek {
        Some(cek) if cek.len() == enc.key_len() => Ok(cek.clone()),
        Some(cek) => Err(JweError::InvalidKeySize {
            expected: enc.key_len(),
            actual: cek.len(),
        }),
        None => ContentEncryptionKey::generate(enc),
    };

    let (cek, encrypted_key) = match (alg, key) {
        (KeyAlgorithm::Direct, Key::Symmetric(k)) => {
            check_direct_key(enc, k.as_bytes())?;
            (ContentEncryptionKey::from(k.as_bytes()), Vec::new())
        }
        (KeyAlgorithm::AesKeyWrap(_) | KeyAlgorithm::Rsa(_), _) => {
            let cek = shared_cek()?;
            let encrypted = key.encrypt(cek.as_bytes(), alg)?;
            (cek, encrypted)
        }
        (KeyAlgorithm::AesGcmKeyWrap(_), _) => {
            let cek = shared_cek()?;
            let sealed = key.seal(cek.as_bytes(), None, None, alg)?;
            header.set_b64(params::IV, &sealed.iv);
            header.set_b64(params::TAG, &sealed.tag);
            (cek, sealed.ciphertext)
        }
        (KeyAlgorithm::Pbes2(size), Key::Password(password)) => {
            let cek = shared_cek()?;
            let p2s = match &params.p2s {
                Some(p2s) => p2s.clone(),
                None => random_bytes(params.pbes2.salt_len)?,
            };
            let p2c = params.pbes2.iterations;
            let kek = pbes2::derive_kek(size, password.as_bytes(), &p2s, p2c)?;
            let encrypted = wrap::aes_key_wrap(size, &kek, cek.as_bytes())?;
            header.set_b64(params::P2S, &p2s);
            header.set(params::P2C, p2c);
            (cek, encrypted)
        }
        #[cfg(feature = "ecdh")]
        (KeyAlgorithm::EcdhEs | KeyAlgorithm::EcdhEsKeyWrap(_), _) => {
            ecdh_es::wrap(alg, key, enc, &shared_cek, params, &mut header)?
        }
        _ => return Err(key.mismatch(alg)),
    };

    Ok(KeyManagementOutput {
        cek,
        encrypted_key,
        header,
    })
}

/// Recovers the CEK for one recipient.
///
/// `header` is the effective (merged) header for the recipient.
///
/// For the RSA family, a failed decryption does not return early: a random
/// CEK is substituted so the failure surfaces as
/// [`JweError::DecryptionFailed`] from content decryption, indistinguishable
/// from a tampered ciphertext.
///
/// # Errors
///
/// - [`JweError::KeyMismatch`] if `key` cannot serve `alg`
/// - [`JweError::MissingHeader`] when `iv`/`tag`/`p2s`/`p2c`/`epk` is absent
/// - [`JweError::IterationCountOutOfRange`] if `p2c` violates `policy`
/// - [`JweError::DecryptionFailed`] on any unwrap failure
pub fn unwrap_cek(
    alg: KeyAlgorithm,
    key: &Key,
    enc: ContentAlgorithm,
    encrypted_key: &[u8],
    header: &JoseHeader,
    policy: &Pbes2Policy,
) -> JweResult<ContentEncryptionKey> {
    key.ensure_supports(alg, KeyUse::Decrypt)?;

    let cek = match (alg, key) {
        (KeyAlgorithm::Direct, Key::Symmetric(k)) => {
            if !encrypted_key.is_empty() {
                return Err(JweError::InvalidFormat(
                    "encrypted key must be empty for dir".into(),
                ));
            }
            check_direct_key(enc, k.as_bytes())?;
            ContentEncryptionKey::from(k.as_bytes())
        }
        (KeyAlgorithm::AesKeyWrap(_), _) => {
            ContentEncryptionKey::from(key.decrypt(encrypted_key, alg)?.as_slice())
        }
        (KeyAlgorithm::Rsa(_), _) => match key.decrypt(encrypted_key, alg) {
            Ok(cek) if cek.len() == enc.key_len() => ContentEncryptionKey::from(cek.as_slice()),
            Ok(_) | Err(JweError::DecryptionFailed) => {
                debug!(alg = %alg, "key decryption failed; continuing with a random CEK");
                ContentEncryptionKey::generate(enc)?
            }
            Err(e) => return Err(e),
        },
        (KeyAlgorithm::AesGcmKeyWrap(_), _) => {
            let iv = header.iv()?.ok_or(JweError::MissingHeader(params::IV))?;
            let tag = header.tag()?.ok_or(JweError::MissingHeader(params::TAG))?;
            ContentEncryptionKey::from(key.open(&iv, encrypted_key, &tag, None, alg)?.as_slice())
        }
        (KeyAlgorithm::Pbes2(size), Key::Password(password)) => {
            let p2s = header.p2s()?.ok_or(JweError::MissingHeader(params::P2S))?;
            let p2c = header.p2c()?.ok_or(JweError::MissingHeader(params::P2C))?;
            policy.check(p2c)?;
            let kek = pbes2::derive_kek(size, password.as_bytes(), &p2s, p2c)?;
            ContentEncryptionKey::from(wrap::aes_key_unwrap(size, &kek, encrypted_key)?.as_slice())
        }
        #[cfg(feature = "ecdh")]
        (KeyAlgorithm::EcdhEs | KeyAlgorithm::EcdhEsKeyWrap(_), _) => {
            ecdh_es::unwrap(alg, key, enc, encrypted_key, header)?
        }
        _ => return Err(key.mismatch(alg)),
    };

    if cek.len() != enc.key_len() {
        return Err(JweError::DecryptionFailed);
    }
    Ok(cek)
}

fn check_direct_key(enc: ContentAlgorithm, key: &[u8]) -> JweResult<()> {
    if key.len() == enc.key_len() {
        Ok(())
    } else {
        Err(JweError::InvalidKeySize {
            expected: enc.key_len(),
            actual: key.len(),
        })
    }
}

#[cfg(feature = "ecdh")]
mod ecdh_es {
    use super::*;
    use crate::core::operations::ecdh;
    use crate::core::operations::kdf::concat_kdf;
    use crate::core::types::EcPublicKey;

    pub(super) fn wrap(
        alg: KeyAlgorithm,
        key: &Key,
        enc: ContentAlgorithm,
        shared_cek: &dyn Fn() -> JweResult<ContentEncryptionKey>,
        params: &WrapParams,
        header: &mut JoseHeader,
    ) -> JweResult<(ContentEncryptionKey, Vec<u8>)> {
        let recipient = match key {
            Key::EcPublic(pk) => pk.clone(),
            Key::EcPrivate(sk) => sk.public_key(),
            _ => return Err(key.mismatch(alg)),
        };

        let (epk, z) = ecdh::agree_ephemeral(&recipient)?;
        header.set(params::EPK, epk.to_jwk()?);
        let apu = params.apu.as_deref().unwrap_or_default();
        let apv = params.apv.as_deref().unwrap_or_default();
        if let Some(apu) = &params.apu {
            header.set_b64(params::APU, apu);
        }
        if let Some(apv) = &params.apv {
            header.set_b64(params::APV, apv);
        }

        match alg {
            KeyAlgorithm::EcdhEsKeyWrap(size) => {
                let kek = concat_kdf(&z, alg.name(), apu, apv, size.bytes())?;
                let cek = shared_cek()?;
                let encrypted = wrap::aes_key_wrap(size, &kek, cek.as_bytes())?;
                Ok((cek, encrypted))
            }
            _ => {
                let derived = concat_kdf(&z, enc.name(), apu, apv, enc.key_len())?;
                Ok((ContentEncryptionKey::from(derived.as_slice()), Vec::new()))
            }
        }
    }

    pub(super) fn unwrap(
        alg: KeyAlgorithm,
        key: &Key,
        enc: ContentAlgorithm,
        encrypted_key: &[u8],
        header: &JoseHeader,
    ) -> JweResult<ContentEncryptionKey> {
        let Key::EcPrivate(private) = key else {
            return Err(key.mismatch(alg));
        };
        let epk = header.epk().ok_or(JweError::MissingHeader(params::EPK))?;
        let epk = EcPublicKey::from_jwk(epk)?;
        if epk.curve() != private.curve() {
            return Err(JweError::KeyMismatch {
                algorithm: format!("{alg} over {}", epk.curve().name()),
                key: key.kind().label(),
            });
        }

        let z = ecdh::agree_static(private, &epk)?;
        let apu = header.apu()?.unwrap_or_default();
        let apv = header.apv()?.unwrap_or_default();

        // AlgorithmID is the identifier as written, which may be a registered alias.
        match alg {
            KeyAlgorithm::EcdhEsKeyWrap(size) => {
                let id = header.alg()?.unwrap_or(alg.name());
                let kek = concat_kdf(&z, id, &apu, &apv, size.bytes())?;
                let cek = wrap::aes_key_unwrap(size, &kek, encrypted_key)?;
                Ok(ContentEncryptionKey::from(cek.as_slice()))
            }
            _ => {
                if !encrypted_key.is_empty() {
                    return Err(JweError::InvalidFormat(
                        "encrypted key must be empty for ECDH-ES".into(),
                    ));
                }
                let id = header.enc()?.unwrap_or(enc.name());
                let derived = concat_kdf(&z, id, &apu, &apv, enc.key_len())?;
                Ok(ContentEncryptionKey::from(derived.as_slice()))
            }
        }
    }
}
