//! End-to-end encrypt and decrypt through every serialization.

// Test code legitimately uses panic patterns for test failure reporting
#![allow(clippy::expect_used, clippy::panic, clippy::unwrap_used)]

use std::sync::Arc;

use base64::prelude::{Engine as _, BASE64_URL_SAFE_NO_PAD};
use jwekit::core::jwe::{self, DecryptOptions, EncryptOptions, RecipientSpec};
use jwekit::core::operations::compress::Compressor;
use jwekit::core::operations::pbes2::{Pbes2Params, Pbes2Policy};
use jwekit::core::types::{Key, SealedEnvelope};
use jwekit::{
    AesKeySize, ContentAlgorithm, JoseHeader, JweError, JweResult, KeyAlgorithm, Registry,
};

const PLAINTEXT: &[u8] = b"Live long and prosper.";

fn fast_options() -> EncryptOptions {
    EncryptOptions {
        pbes2: Pbes2Params {
            iterations: 1_000,
            ..Pbes2Params::default()
        },
        ..EncryptOptions::default()
    }
}

#[cfg(feature = "rsa")]
fn rsa_key() -> Key {
    use std::sync::OnceLock;

    static KEY: OnceLock<rsa::RsaPrivateKey> = OnceLock::new();
    let sk = KEY.get_or_init(|| {
        rsa::RsaPrivateKey::new(&mut rand_core::OsRng, 2048).expect("RSA keygen")
    });
    Key::RsaPrivate(Box::new(sk.clone()))
}

/// A key that can serve `alg` with `enc`, or `None` when its feature is off.
fn key_for(alg: KeyAlgorithm, enc: ContentAlgorithm) -> Option<Key> {
    match alg {
        KeyAlgorithm::Direct => Some(Key::symmetric(vec![0x11; enc.key_len()])),
        KeyAlgorithm::AesKeyWrap(size) | KeyAlgorithm::AesGcmKeyWrap(size) => {
            Some(Key::symmetric(vec![0x22; size.bytes()]))
        }
        KeyAlgorithm::Pbes2(_) => Some(Key::password("correct horse battery staple")),
        #[cfg(feature = "rsa")]
        KeyAlgorithm::Rsa(_) => Some(rsa_key()),
        #[cfg(feature = "ecdh")]
        KeyAlgorithm::EcdhEs | KeyAlgorithm::EcdhEsKeyWrap(_) => {
            use jwekit::core::types::{Curve, EcPrivateKey};
            Some(Key::EcPrivate(EcPrivateKey::generate(Curve::P256)))
        }
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

fn roundtrip_compact(
    registry: &Registry,
    alg: KeyAlgorithm,
    enc: ContentAlgorithm,
    key: &Key,
    plaintext: &[u8],
) -> JweResult<Vec<u8>> {
    let envelope = jwe::encrypt_with(
        registry,
        plaintext,
        enc,
        &[RecipientSpec::new(alg, key)],
        &fast_options(),
    )?;
    let compact = envelope.to_compact()?;
    let parsed: SealedEnvelope = compact.parse()?;
    jwe::decrypt(registry, &parsed, key)
}

// =============================================================================
// Algorithm coverage
// =============================================================================

#[test]
fn test_every_algorithm_pair() {
    let registry = Registry::with_defaults();
    for alg in KeyAlgorithm::ALL {
        if registry.key_algorithm(alg.name()).is_err() {
            continue;
        }
        for enc in ContentAlgorithm::ALL {
            let Some(key) = key_for(alg, enc) else {
                continue;
            };
            for plaintext in [&b""[..], PLAINTEXT] {
                let opened = roundtrip_compact(&registry, alg, enc, &key, plaintext)
                    .unwrap_or_else(|e| panic!("{alg} / {enc} failed: {e}"));
                assert_eq!(opened, plaintext, "{alg} / {enc} plaintext mismatch");
            }
        }
    }
}

#[test]
fn test_large_plaintext() -> JweResult<()> {
    let registry = Registry::with_defaults();
    let plaintext: Vec<u8> = (0..3 * 1024 * 1024).map(|i: u32| (i * 31 % 251) as u8).collect();

    for (alg, enc) in [
        (KeyAlgorithm::Direct, ContentAlgorithm::Gcm(AesKeySize::A256)),
        (
            KeyAlgorithm::AesKeyWrap(AesKeySize::A128),
            ContentAlgorithm::CbcHmac(AesKeySize::A128),
        ),
    ] {
        let key = key_for(alg, enc).expect("symmetric keys are always available");
        assert_eq!(roundtrip_compact(&registry, alg, enc, &key, &plaintext)?, plaintext);
    }
    Ok(())
}

#[test]
fn test_pbes2_iteration_policy() -> JweResult<()> {
    let registry = Registry::with_defaults();
    let key = Key::password("hunter2");
    let options = EncryptOptions {
        pbes2: Pbes2Params {
            iterations: 2_000,
            salt_len: 8,
        },
        ..EncryptOptions::default()
    };
    let envelope = jwe::encrypt_with(
        &registry,
        PLAINTEXT,
        ContentAlgorithm::Gcm(AesKeySize::A128),
        &[RecipientSpec::new(KeyAlgorithm::Pbes2(AesKeySize::A128), &key)],
        &options,
    )?;
    assert_eq!(envelope.protected().p2c()?, Some(2_000));
    assert_eq!(envelope.protected().p2s()?.map(|s| s.len()), Some(8));

    let strict = DecryptOptions {
        pbes2_policy: Pbes2Policy {
            min_iterations: 5_000,
            max_iterations: 10_000,
        },
    };
    let result = jwe::decrypt_with(&registry, &envelope, &key, &strict);
    assert!(matches!(result, Err(JweError::IterationCountOutOfRange(2_000))));

    assert_eq!(jwe::decrypt(&registry, &envelope, &key)?, PLAINTEXT);
    Ok(())
}

// =============================================================================
// Tampering
// =============================================================================

#[test]
fn test_tampering_is_opaque() -> JweResult<()> {
    const SEGMENTS: [&str; 5] = ["protected", "encrypted_key", "iv", "ciphertext", "tag"];

    let registry = Registry::with_defaults();
    for alg in KeyAlgorithm::ALL {
        if registry.key_algorithm(alg.name()).is_err() {
            continue;
        }
        for enc in ContentAlgorithm::ALL {
            let Some(key) = key_for(alg, enc) else {
                continue;
            };
            let envelope = jwe::encrypt_with(
                &registry,
                PLAINTEXT,
                enc,
                &[RecipientSpec::new(alg, &key)],
                &fast_options(),
            )?;
            let compact = envelope.to_compact()?;

            // Flip the low bit of the first byte in each binary segment.
            for segment in 1..5 {
                let mut parts: Vec<String> = compact.split('.').map(str::to_string).collect();
                let mut bytes = BASE64_URL_SAFE_NO_PAD
                    .decode(&parts[segment])
                    .expect("valid base64url");
                if bytes.is_empty() {
                    continue;
                }
                bytes[0] ^= 0x01;
                parts[segment] = BASE64_URL_SAFE_NO_PAD.encode(&bytes);
                let tampered: SealedEnvelope = parts.join(".").parse()?;

                let result = jwe::decrypt(&registry, &tampered, &key);
                assert!(
                    matches!(result, Err(JweError::DecryptionFailed)),
                    "{alg} / {enc}: tampered {} gave {result:?}",
                    SEGMENTS[segment]
                );
            }
        }
    }
    Ok(())
}

#[test]
fn test_protected_header_is_authenticated() -> JweResult<()> {
    let registry = Registry::with_defaults();
    let key = Key::symmetric([9u8; 16]);
    let envelope = jwe::encrypt(
        &registry,
        PLAINTEXT,
        KeyAlgorithm::Direct,
        &key,
        ContentAlgorithm::Gcm(AesKeySize::A128),
    )?;
    let compact = envelope.to_compact()?;

    let mut header = envelope.protected().clone();
    header.set("typ", "JWE");
    let mut parts: Vec<String> = compact.split('.').map(str::to_string).collect();
    parts[0] = header.encode_b64()?;
    let altered: SealedEnvelope = parts.join(".").parse()?;

    assert!(matches!(
        jwe::decrypt(&registry, &altered, &key),
        Err(JweError::DecryptionFailed)
    ));
    Ok(())
}

// =============================================================================
// JSON serializations
// =============================================================================

#[test]
fn test_general_json_multiple_recipients() -> JweResult<()> {
    let registry = Registry::with_defaults();
    let shared = Key::symmetric([3u8; 16]);
    let password = Key::password("correct horse battery staple");
    let gcm = Key::symmetric([4u8; 24]);

    #[cfg(feature = "rsa")]
    let rsa = rsa_key();
    #[cfg(feature = "ecdh")]
    let ec = {
        use jwekit::core::types::{Curve, EcPrivateKey};
        Key::EcPrivate(EcPrivateKey::generate(Curve::X25519))
    };

    #[allow(unused_mut)]
    let mut recipients = vec![
        RecipientSpec::new(KeyAlgorithm::AesKeyWrap(AesKeySize::A128), &shared).with_kid("kw"),
        RecipientSpec::new(KeyAlgorithm::Pbes2(AesKeySize::A256), &password).with_kid("pw"),
        RecipientSpec::new(KeyAlgorithm::AesGcmKeyWrap(AesKeySize::A192), &gcm).with_kid("gcm"),
    ];
    #[cfg(feature = "rsa")]
    recipients.push(
        RecipientSpec::new(KeyAlgorithm::Rsa(jwekit::RsaPadding::Oaep256), &rsa).with_kid("rsa"),
    );
    #[cfg(feature = "ecdh")]
    recipients.push(
        RecipientSpec::new(KeyAlgorithm::EcdhEsKeyWrap(AesKeySize::A256), &ec).with_kid("ec"),
    );

    let options = EncryptOptions {
        aad: Some(b"shared context".to_vec()),
        ..fast_options()
    };
    let envelope = jwe::encrypt_with(
        &registry,
        PLAINTEXT,
        ContentAlgorithm::CbcHmac(AesKeySize::A256),
        &recipients,
        &options,
    )?;
    assert!(envelope.protected().alg()?.is_none());
    assert!(matches!(envelope.to_compact(), Err(JweError::InvalidFormat(_))));
    assert!(matches!(envelope.to_json_flattened(), Err(JweError::InvalidFormat(_))));

    let json = envelope.to_json_general()?;
    let parsed = SealedEnvelope::parse_any(&json)?;
    assert_eq!(parsed.recipients().len(), recipients.len());

    for (index, recipient) in recipients.iter().enumerate() {
        let header = parsed.recipients()[index]
            .header()
            .ok_or(JweError::MissingHeader("header"))?;
        assert_eq!(header.kid()?, recipient.kid.as_deref());
        assert_eq!(header.alg()?, Some(recipient.alg.name()));
        assert_eq!(jwe::decrypt(&registry, &parsed, recipient.key)?, PLAINTEXT);
    }

    // A key of the right kind that opens nothing.
    let stranger = Key::symmetric([5u8; 16]);
    assert!(matches!(
        jwe::decrypt(&registry, &parsed, &stranger),
        Err(JweError::DecryptionFailed)
    ));
    Ok(())
}

#[test]
fn test_no_usable_recipient_is_key_mismatch() -> JweResult<()> {
    let registry = Registry::with_defaults();
    let shared = Key::symmetric([3u8; 16]);
    let password = Key::password("pw");
    let envelope = jwe::encrypt_with(
        &registry,
        PLAINTEXT,
        ContentAlgorithm::Gcm(AesKeySize::A128),
        &[
            RecipientSpec::new(KeyAlgorithm::AesKeyWrap(AesKeySize::A128), &shared),
            RecipientSpec::new(KeyAlgorithm::Pbes2(AesKeySize::A128), &password),
        ],
        &fast_options(),
    )?;

    // Wrong length for A128KW, wrong kind for PBES2.
    let result = jwe::decrypt(&registry, &envelope, &Key::symmetric([3u8; 32]));
    match result {
        Err(JweError::KeyMismatch { algorithm, key }) => {
            assert_eq!(algorithm, "A128KW, PBES2-HS256+A128KW");
            assert_eq!(key, "symmetric");
        }
        other => panic!("expected KeyMismatch, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_flattened_json_with_aad() -> JweResult<()> {
    let registry = Registry::with_defaults();
    let key = Key::symmetric([1u8; 32]);
    let options = EncryptOptions {
        aad: Some(b"The Fellowship of the Ring".to_vec()),
        kid: Some("2011-04-29".into()),
        ..EncryptOptions::default()
    };
    let envelope = jwe::encrypt_with(
        &registry,
        PLAINTEXT,
        ContentAlgorithm::Gcm(AesKeySize::A256),
        &[RecipientSpec::new(KeyAlgorithm::Direct, &key)],
        &options,
    )?;
    assert_eq!(envelope.protected().kid()?, Some("2011-04-29"));
    assert!(matches!(envelope.to_compact(), Err(JweError::InvalidFormat(_))));

    let json = envelope.to_json_flattened()?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    assert!(value.get("encrypted_key").is_none());
    assert!(value.get("recipients").is_none());

    let parsed = SealedEnvelope::parse_any(&json)?;
    assert_eq!(parsed.aad(), Some(&b"The Fellowship of the Ring"[..]));
    assert_eq!(jwe::decrypt(&registry, &parsed, &key)?, PLAINTEXT);
    Ok(())
}

// =============================================================================
// Compression
// =============================================================================

#[cfg(feature = "deflate")]
#[test]
fn test_deflate_roundtrip() -> JweResult<()> {
    let registry = Registry::with_defaults();
    let key = Key::symmetric([2u8; 16]);
    let plaintext = b"You can trust us to stick with you through thick and thin. ".repeat(64);
    let options = EncryptOptions {
        zip: Some("DEF".into()),
        ..EncryptOptions::default()
    };
    let envelope = jwe::encrypt_with(
        &registry,
        &plaintext,
        ContentAlgorithm::CbcHmac(AesKeySize::A128),
        &[RecipientSpec::new(KeyAlgorithm::AesKeyWrap(AesKeySize::A128), &key)],
        &options,
    )?;
    assert_eq!(envelope.protected().zip()?, Some("DEF"));
    assert!(envelope.ciphertext().len() < plaintext.len() / 4);

    let parsed: SealedEnvelope = envelope.to_compact()?.parse()?;
    assert_eq!(jwe::decrypt(&registry, &parsed, &key)?, plaintext);
    Ok(())
}

#[test]
fn test_unknown_zip_on_encrypt() {
    let registry = Registry::with_defaults();
    let key = Key::symmetric([2u8; 16]);
    let options = EncryptOptions {
        zip: Some("GZ".into()),
        ..EncryptOptions::default()
    };
    let result = jwe::encrypt_with(
        &registry,
        PLAINTEXT,
        ContentAlgorithm::Gcm(AesKeySize::A128),
        &[RecipientSpec::new(KeyAlgorithm::Direct, &key)],
        &options,
    );
    assert!(matches!(result, Err(JweError::UnsupportedCompression(_))));
}

// =============================================================================
// Registry
// =============================================================================

/// Byte-reversing codec, registered under a private identifier.
struct Reverse;

impl Compressor for Reverse {
    fn id(&self) -> &str {
        "REV"
    }

    fn compress(&self, data: &[u8]) -> JweResult<Vec<u8>> {
        Ok(data.iter().rev().copied().collect())
    }

    fn decompress(&self, data: &[u8]) -> JweResult<Vec<u8>> {
        Ok(data.iter().rev().copied().collect())
    }
}

#[test]
fn test_empty_registry_rejects_everything() {
    let registry = Registry::new();
    let key = Key::symmetric([0u8; 16]);
    let result = jwe::encrypt(
        &registry,
        PLAINTEXT,
        KeyAlgorithm::Direct,
        &key,
        ContentAlgorithm::Gcm(AesKeySize::A128),
    );
    assert!(matches!(result, Err(JweError::UnsupportedAlgorithm(_))));
}

#[test]
fn test_custom_compressor() -> JweResult<()> {
    let registry = Registry::with_defaults();
    registry.register_compressor(Arc::new(Reverse));
    let key = Key::symmetric([6u8; 16]);
    let options = EncryptOptions {
        zip: Some("REV".into()),
        ..EncryptOptions::default()
    };
    let envelope = jwe::encrypt_with(
        &registry,
        PLAINTEXT,
        ContentAlgorithm::Gcm(AesKeySize::A128),
        &[RecipientSpec::new(KeyAlgorithm::Direct, &key)],
        &options,
    )?;
    assert_eq!(jwe::decrypt(&registry, &envelope, &key)?, PLAINTEXT);

    let stock = Registry::with_defaults();
    assert!(matches!(
        jwe::decrypt(&stock, &envelope, &key),
        Err(JweError::UnsupportedCompression(_))
    ));
    Ok(())
}

#[test]
fn test_algorithm_alias() -> JweResult<()> {
    let registry = Registry::with_defaults();
    registry.register_key_algorithm("local-kw", KeyAlgorithm::AesKeyWrap(AesKeySize::A128));
    let key = Key::symmetric([8u8; 16]);

    let envelope = jwe::encrypt(
        &registry,
        PLAINTEXT,
        KeyAlgorithm::AesKeyWrap(AesKeySize::A128),
        &key,
        ContentAlgorithm::Gcm(AesKeySize::A128),
    )?;
    let compact = envelope.to_compact()?;
    assert!(compact.starts_with(&JoseHeader::with_algorithms("A128KW", "A128GCM").encode_b64()?));
    assert_eq!(jwe::decrypt(&registry, &envelope, &key)?, PLAINTEXT);
    assert_eq!(registry.key_algorithm("local-kw")?, KeyAlgorithm::AesKeyWrap(AesKeySize::A128));
    Ok(())
}

#[test]
fn test_critical_extension() -> JweResult<()> {
    let registry = Registry::with_defaults();
    let key = Key::symmetric([4u8; 32]);
    let mut extra = JoseHeader::new();
    extra.set("crit", serde_json::json!(["exp"])).set("exp", 1_363_284_000);
    let options = EncryptOptions {
        protected_extra: Some(extra),
        ..EncryptOptions::default()
    };
    let encrypt = |registry: &Registry| {
        jwe::encrypt_with(
            registry,
            PLAINTEXT,
            ContentAlgorithm::Gcm(AesKeySize::A256),
            &[RecipientSpec::new(KeyAlgorithm::Direct, &key)],
            &options,
        )
    };

    assert!(matches!(encrypt(&registry), Err(JweError::UnsupportedCritical(_))));

    let aware = Registry::with_defaults();
    aware.register_critical_header("exp");
    let envelope = encrypt(&aware)?;
    assert_eq!(jwe::decrypt(&aware, &envelope, &key)?, PLAINTEXT);
    assert!(matches!(
        jwe::decrypt(&registry, &envelope, &key),
        Err(JweError::UnsupportedCritical(_))
    ));
    Ok(())
}

#[test]
fn test_concurrent_use() {
    let registry = Registry::with_defaults();
    let key = Key::symmetric([5u8; 16]);

    std::thread::scope(|scope| {
        for worker in 0..4u8 {
            let registry = &registry;
            let key = &key;
            scope.spawn(move || {
                for round in 0..25u8 {
                    let plaintext = [worker, round];
                    let envelope = jwe::encrypt(
                        registry,
                        &plaintext,
                        KeyAlgorithm::AesKeyWrap(AesKeySize::A128),
                        key,
                        ContentAlgorithm::Gcm(AesKeySize::A128),
                    )
                    .expect("encrypt");
                    assert_eq!(jwe::decrypt(registry, &envelope, key).expect("decrypt"), plaintext);
                }
            });
        }
        scope.spawn(|| {
            for i in 0..100 {
                registry.register_critical_header(format!("ext-{i}"));
            }
        });
    });

    assert!(registry.understands_critical("ext-99"));
}
