//! PBES2 password-based key wrapping.
//!
//! The KEK is derived with PBKDF2-HMAC-SHA2 over the password, using
//! `UTF8(alg) || 0x00 || p2s` as the salt and `p2c` iterations. The CEK is
//! then wrapped with AES key wrap:
//!
//! | `alg` | PRF | KEK |
//! |-------|-----|-----|
//! | `PBES2-HS256+A128KW` | HMAC-SHA-256 | 16 bytes |
//! | `PBES2-HS384+A192KW` | HMAC-SHA-384 | 24 bytes |
//! | `PBES2-HS512+A256KW` | HMAC-SHA-512 | 32 bytes |

use hmac::Hmac;
use sha2::{Sha256, Sha384, Sha512};
use tracing::warn;
use zeroize::Zeroizing;

use crate::core::algorithm::{AesKeySize, KeyAlgorithm};
use crate::core::error::{JweError, JweResult};

/// Minimum `p2s` length in bytes.
pub const MIN_SALT_SIZE: usize = 8;

/// Default `p2s` length in bytes.
pub const DEFAULT_SALT_SIZE: usize = 16;

/// Parameters used when producing a PBES2 recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pbes2Params {
    /// Number of iterations (`p2c`).
    pub iterations: u32,
    /// Length of the random salt input (`p2s`).
    pub salt_len: usize,
}

impl Default for Pbes2Params {
    fn default() -> Self {
        Self::moderate()
    }
}

impl Pbes2Params {
    /// Interactive profile: Fast, suitable for interactive logins.
    /// - Iterations: 100,000
    #[must_use]
    pub const fn interactive() -> Self {
        Self {
            iterations: 100_000,
            salt_len: DEFAULT_SALT_SIZE,
        }
    }

    /// Moderate profile: Balanced security and performance.
    /// - Iterations: 310,000 (OWASP 2023 recommendation for HMAC-SHA-256)
    #[must_use]
    pub const fn moderate() -> Self {
        Self {
            iterations: 310_000,
            salt_len: DEFAULT_SALT_SIZE,
        }
    }

    /// Sensitive profile: High security, slower computation.
    /// - Iterations: 600,000
    #[must_use]
    pub const fn sensitive() -> Self {
        Self {
            iterations: 600_000,
            salt_len: DEFAULT_SALT_SIZE,
        }
    }
}

/// Bounds on `p2c` accepted when opening a PBES2 recipient.
///
/// The floor rejects weak derivations; the ceiling stops a crafted header
/// from pinning the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pbes2Policy {
    /// Smallest accepted iteration count.
    pub min_iterations: u32,
    /// Largest accepted iteration count.
    pub max_iterations: u32,
}

impl Default for Pbes2Policy {
    fn default() -> Self {
        Self {
            min_iterations: 1_000,
            max_iterations: 1_000_000,
        }
    }
}

impl Pbes2Policy {
    /// Fails with [`JweError::IterationCountOutOfRange`] outside the bounds.
    pub fn check(&self, iterations: u32) -> JweResult<()> {
        if (self.min_iterations..=self.max_iterations).contains(&iterations) {
            Ok(())
        } else {
            warn!(
                iterations,
                min = self.min_iterations,
                max = self.max_iterations,
                "rejecting PBES2 iteration count"
            );
            Err(JweError::IterationCountOutOfRange(iterations))
        }
    }
}

/// Derives the PBES2 key encryption key.
///
/// # Errors
///
/// - [`JweError::InvalidHeader`] if `p2s` is shorter than [`MIN_SALT_SIZE`]
/// - [`JweError::IterationCountOutOfRange`] for a zero iteration count
pub fn derive_kek(
    size: AesKeySize,
    password: &[u8],
    p2s: &[u8],
    iterations: u32,
) -> JweResult<Zeroizing<Vec<u8>>> {
    if p2s.len() < MIN_SALT_SIZE {
        return Err(JweError::InvalidHeader(format!(
            "p2s must be at least {MIN_SALT_SIZE} bytes"
        )));
    }
    if iterations == 0 {
        return Err(JweError::IterationCountOutOfRange(0));
    }

    let alg = KeyAlgorithm::Pbes2(size).name();
    let mut salt = Vec::with_capacity(alg.len() + 1 + p2s.len());
    salt.extend_from_slice(alg.as_bytes());
    salt.push(0);
    salt.extend_from_slice(p2s);

    let mut kek = Zeroizing::new(vec![0u8; size.bytes()]);
    let result = match size {
        AesKeySize::A128 => pbkdf2::pbkdf2::<Hmac<Sha256>>(password, &salt, iterations, &mut kek),
        AesKeySize::A192 => pbkdf2::pbkdf2::<Hmac<Sha384>>(password, &salt, iterations, &mut kek),
        AesKeySize::A256 => pbkdf2::pbkdf2::<Hmac<Sha512>>(password, &salt, iterations, &mut kek),
    };
    result.map_err(|_| JweError::CryptoError)?;
    Ok(kek)
}
