//! ECDH-ES key agreement and `epk` handling.
//!
//! The sender generates an ephemeral key pair on the recipient's curve,
//! computes the shared secret `Z` and publishes the ephemeral public key
//! in the `epk` header as a JWK. The recipient recomputes `Z` from its
//! static private key and `epk`. Both sides then run the Concat KDF.
//!
//! Supported curves: P-256, P-384 and X25519.

use base64::prelude::*;
use rand_core::OsRng;
use serde_json::{json, Value};
use zeroize::Zeroizing;

use crate::core::error::{JweError, JweResult};
use crate::core::types::{Curve, EcPrivateKey, EcPublicKey};

/// Coordinate length in bytes for the NIST curves.
const fn coordinate_len(curve: Curve) -> usize {
    match curve {
        Curve::P256 | Curve::X25519 => 32,
        Curve::P384 => 48,
    }
}

/// Sender side: generates an ephemeral key on the recipient's curve.
///
/// Returns the ephemeral public key and the shared secret `Z`. The
/// ephemeral private key is dropped before returning.
pub fn agree_ephemeral(recipient: &EcPublicKey) -> JweResult<(EcPublicKey, Zeroizing<Vec<u8>>)> {
    match recipient {
        EcPublicKey::P256(pk) => {
            let secret = p256::ecdh::EphemeralSecret::random(&mut OsRng);
            let shared = secret.diffie_hellman(pk);
            Ok((
                EcPublicKey::P256(secret.public_key()),
                Zeroizing::new(shared.raw_secret_bytes().to_vec()),
            ))
        }
        EcPublicKey::P384(pk) => {
            let secret = p384::ecdh::EphemeralSecret::random(&mut OsRng);
            let shared = secret.diffie_hellman(pk);
            Ok((
                EcPublicKey::P384(secret.public_key()),
                Zeroizing::new(shared.raw_secret_bytes().to_vec()),
            ))
        }
        EcPublicKey::X25519(pk) => {
            let secret = x25519_dalek::EphemeralSecret::random_from_rng(OsRng);
            let public = x25519_dalek::PublicKey::from(&secret);
            let shared = secret.diffie_hellman(pk);
            if !shared.was_contributory() {
                return Err(JweError::InvalidKey);
            }
            Ok((
                EcPublicKey::X25519(public),
                Zeroizing::new(shared.as_bytes().to_vec()),
            ))
        }
    }
}

/// Recipient side: recomputes `Z` from the static key and `epk`.
///
/// # Errors
///
/// - [`JweError::KeyMismatch`] if `epk` is on a different curve
/// - [`JweError::InvalidKey`] for a non-contributory X25519 exchange
pub fn agree_static(private: &EcPrivateKey, epk: &EcPublicKey) -> JweResult<Zeroizing<Vec<u8>>> {
    match (private, epk) {
        (EcPrivateKey::P256(sk), EcPublicKey::P256(pk)) => {
            let shared = p256::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine());
            Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
        }
        (EcPrivateKey::P384(sk), EcPublicKey::P384(pk)) => {
            let shared = p384::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine());
            Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
        }
        (EcPrivateKey::X25519(sk), EcPublicKey::X25519(pk)) => {
            let shared = sk.diffie_hellman(pk);
            if !shared.was_contributory() {
                return Err(JweError::InvalidKey);
            }
            Ok(Zeroizing::new(shared.as_bytes().to_vec()))
        }
        _ => Err(JweError::KeyMismatch {
            algorithm: format!("ECDH-ES with {} epk", epk.curve().name()),
            key: "EC private",
        }),
    }
}

// =============================================================================
// JWK encoding of the ephemeral public key
// =============================================================================

impl EcPublicKey {
    /// Encodes the key as a public JWK (`kty`, `crv`, `x`[, `y`]).
    pub fn to_jwk(&self) -> JweResult<Value> {
        use p256::elliptic_curve::sec1::ToEncodedPoint;

        let (x, y) = match self {
            Self::P256(pk) => {
                let point = pk.to_encoded_point(false);
                (point.x().map(|x| x.to_vec()), point.y().map(|y| y.to_vec()))
            }
            Self::P384(pk) => {
                let point = pk.to_encoded_point(false);
                (point.x().map(|x| x.to_vec()), point.y().map(|y| y.to_vec()))
            }
            Self::X25519(pk) => {
                return Ok(json!({
                    "kty": "OKP",
                    "crv": Curve::X25519.name(),
                    "x": BASE64_URL_SAFE_NO_PAD.encode(pk.as_bytes()),
                }));
            }
        };
        let (x, y) = x.zip(y).ok_or(JweError::InvalidKey)?;
        Ok(json!({
            "kty": "EC",
            "crv": self.curve().name(),
            "x": BASE64_URL_SAFE_NO_PAD.encode(x),
            "y": BASE64_URL_SAFE_NO_PAD.encode(y),
        }))
    }

    /// Decodes a public JWK.
    ///
    /// Short coordinates are left-padded with zeros.
    ///
    /// # Errors
    ///
    /// - [`JweError::InvalidHeader`] for a malformed JWK
    /// - [`JweError::UnsupportedCurve`] for unknown curves
    /// - [`JweError::InvalidKey`] for points not on the curve
    pub fn from_jwk(jwk: &Value) -> JweResult<Self> {
        let object = jwk
            .as_object()
            .ok_or_else(|| JweError::InvalidHeader("epk must be a JSON object".into()))?;
        let member = |name: &str| {
            object
                .get(name)
                .and_then(Value::as_str)
                .ok_or_else(|| JweError::InvalidHeader(format!("epk is missing {name}")))
        };

        let kty = member("kty")?;
        let curve = Curve::from_name(member("crv")?)?;
        let x = BASE64_URL_SAFE_NO_PAD.decode(member("x")?)?;

        match (kty, curve) {
            ("OKP", Curve::X25519) => {
                let bytes: [u8; 32] = x.as_slice().try_into().map_err(|_| JweError::InvalidKey)?;
                Ok(Self::x25519(bytes))
            }
            ("EC", Curve::P256 | Curve::P384) => {
                let y = BASE64_URL_SAFE_NO_PAD.decode(member("y")?)?;
                let len = coordinate_len(curve);
                if x.len() > len || y.len() > len {
                    return Err(JweError::InvalidKey);
                }
                let mut sec1 = vec![0u8; 1 + 2 * len];
                sec1[0] = 0x04;
                sec1[1 + len - x.len()..1 + len].copy_from_slice(&x);
                sec1[1 + 2 * len - y.len()..].copy_from_slice(&y);
                Self::from_sec1(curve, &sec1)
            }
            (kty, curve) => Err(JweError::InvalidHeader(format!(
                "epk key type {kty} does not match curve {}",
                curve.name()
            ))),
        }
    }
}
