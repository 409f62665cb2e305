//! `ContentEncryptionKey` - the per-message symmetric key.

use std::fmt::{self, Debug};

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::core::algorithm::ContentAlgorithm;
use crate::core::error::JweResult;
use crate::core::operations::content::random_bytes;

/// The content encryption key (CEK).
///
/// # Security
///
/// - Key material is zeroized on drop
/// - Debug output redacts the key
/// - Equality comparison uses constant-time comparison
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct ContentEncryptionKey {
    key: Vec<u8>,
}

impl ContentEncryptionKey {
    /// Wraps existing key bytes.
    #[must_use]
    pub fn new(key: Vec<u8>) -> Self {
        Self { key }
    }

    /// Generates a fresh random CEK sized for `enc`.
    pub fn generate(enc: ContentAlgorithm) -> JweResult<Self> {
        random_bytes(enc.key_len()).map(Self::new)
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Key length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.key.len()
    }

    /// Returns `true` for a zero-length key.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl From<&[u8]> for ContentEncryptionKey {
    fn from(key: &[u8]) -> Self {
        Self::new(key.to_vec())
    }
}

impl AsRef<[u8]> for ContentEncryptionKey {
    fn as_ref(&self) -> &[u8] {
        &self.key
    }
}

impl Debug for ContentEncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentEncryptionKey")
            .field("len", &self.key.len())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for ContentEncryptionKey {
    fn eq(&self, other: &Self) -> bool {
        self.key.ct_eq(&other.key).into()
    }
}

impl Eq for ContentEncryptionKey {}
