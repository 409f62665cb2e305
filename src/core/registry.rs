//! Algorithm and compressor registry.
//!
//! The [`Registry`] maps wire identifiers (`alg`, `enc`, `zip`) to their
//! capabilities and records which `crit` extensions are understood. It is
//! an explicit value passed by reference to the encrypt and decrypt
//! operations; there is no process-wide instance.
//!
//! Each table sits behind its own reader-writer lock. Lookups take the
//! shared lock and may run concurrently; registration takes the exclusive
//! lock.
//!
//! # Example
//!
//! ```rust
//! use jwekit::core::algorithm::{AesKeySize, KeyAlgorithm};
//! use jwekit::Registry;
//!
//! let registry = Registry::with_defaults();
//! assert!(registry.key_algorithm("A128KW").is_ok());
//!
//! // Accept a legacy alias.
//! registry.register_key_algorithm("AES128KW", KeyAlgorithm::AesKeyWrap(AesKeySize::A128));
//! assert!(registry.key_algorithm("AES128KW").is_ok());
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::algorithm::{ContentAlgorithm, KeyAlgorithm, RsaPadding};
use crate::core::error::{JweError, JweResult};
use crate::core::operations::compress::Compressor;

/// Registry of supported algorithms and compressors.
///
/// [`Default`] is [`Registry::with_defaults`]; use [`Registry::new`] for an
/// empty one.
pub struct Registry {
    key_algorithms: RwLock<HashMap<String, KeyAlgorithm>>,
    content_algorithms: RwLock<HashMap<String, ContentAlgorithm>>,
    compressors: RwLock<HashMap<String, Arc<dyn Compressor>>>,
    critical: RwLock<HashSet<String>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            key_algorithms: RwLock::new(HashMap::new()),
            content_algorithms: RwLock::new(HashMap::new()),
            compressors: RwLock::new(HashMap::new()),
            critical: RwLock::new(HashSet::new()),
        }
    }

    /// Creates a registry holding every algorithm enabled by the crate
    /// features, plus the `DEF` compressor when `deflate` is enabled.
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        for alg in KeyAlgorithm::ALL {
            if Self::builtin_enabled(alg) {
                registry.register_key_algorithm(alg.name(), alg);
            }
        }
        for enc in ContentAlgorithm::ALL {
            registry.register_content_algorithm(enc.name(), enc);
        }
        #[cfg(feature = "deflate")]
        registry.register_compressor(Arc::new(crate::core::operations::compress::Deflate::new()));
        registry
    }

    fn builtin_enabled(alg: KeyAlgorithm) -> bool {
        match alg {
            KeyAlgorithm::Rsa(RsaPadding::Pkcs1v15) => cfg!(feature = "rsa1_5"),
            KeyAlgorithm::Rsa(_) => cfg!(feature = "rsa"),
            KeyAlgorithm::EcdhEs | KeyAlgorithm::EcdhEsKeyWrap(_) => cfg!(feature = "ecdh"),
            _ => true,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Registers (or replaces) a key management algorithm under `id`.
    pub fn register_key_algorithm(&self, id: impl Into<String>, alg: KeyAlgorithm) {
        self.key_algorithms.write().insert(id.into(), alg);
    }

    /// Registers (or replaces) a content encryption algorithm under `id`.
    pub fn register_content_algorithm(&self, id: impl Into<String>, enc: ContentAlgorithm) {
        self.content_algorithms.write().insert(id.into(), enc);
    }

    /// Registers (or replaces) a compressor under its own identifier.
    pub fn register_compressor(&self, compressor: Arc<dyn Compressor>) {
        let id = compressor.id().to_string();
        self.compressors.write().insert(id, compressor);
    }

    /// Marks a `crit` extension parameter as understood.
    pub fn register_critical_header(&self, name: impl Into<String>) {
        self.critical.write().insert(name.into());
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Resolves an `alg` identifier.
    ///
    /// # Errors
    ///
    /// Returns [`JweError::UnsupportedAlgorithm`] for unknown identifiers.
    pub fn key_algorithm(&self, id: &str) -> JweResult<KeyAlgorithm> {
        self.key_algorithms
            .read()
            .get(id)
            .copied()
            .ok_or_else(|| JweError::UnsupportedAlgorithm(id.to_string()))
    }

    /// Resolves an `enc` identifier.
    ///
    /// # Errors
    ///
    /// Returns [`JweError::UnsupportedAlgorithm`] for unknown identifiers.
    pub fn content_algorithm(&self, id: &str) -> JweResult<ContentAlgorithm> {
        self.content_algorithms
            .read()
            .get(id)
            .copied()
            .ok_or_else(|| JweError::UnsupportedAlgorithm(id.to_string()))
    }

    /// Resolves a `zip` identifier.
    ///
    /// # Errors
    ///
    /// Returns [`JweError::UnsupportedCompression`] for unknown identifiers.
    pub fn compressor(&self, id: &str) -> JweResult<Arc<dyn Compressor>> {
        self.compressors
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| JweError::UnsupportedCompression(id.to_string()))
    }

    /// Returns `true` if `name` may appear in `crit`.
    #[must_use]
    pub fn understands_critical(&self, name: &str) -> bool {
        self.critical.read().contains(name)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut key_algorithms: Vec<String> = self.key_algorithms.read().keys().cloned().collect();
        key_algorithms.sort();
        let mut content_algorithms: Vec<String> =
            self.content_algorithms.read().keys().cloned().collect();
        content_algorithms.sort();
        let mut compressors: Vec<String> = self.compressors.read().keys().cloned().collect();
        compressors.sort();
        f.debug_struct("Registry")
            .field("key_algorithms", &key_algorithms)
            .field("content_algorithms", &content_algorithms)
            .field("compressors", &compressors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithm::AesKeySize;

    #[test]
    fn test_empty_registry_rejects_everything() {
        let registry = Registry::new();
        assert!(matches!(
            registry.key_algorithm("dir"),
            Err(JweError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            registry.content_algorithm("A128GCM"),
            Err(JweError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            registry.compressor("DEF"),
            Err(JweError::UnsupportedCompression(_))
        ));
        assert!(!registry.understands_critical("exp"));
    }

    #[test]
    fn test_defaults() -> JweResult<()> {
        let registry = Registry::default();
        assert_eq!(registry.key_algorithm("dir")?, KeyAlgorithm::Direct);
        assert_eq!(
            registry.key_algorithm("PBES2-HS512+A256KW")?,
            KeyAlgorithm::Pbes2(AesKeySize::A256)
        );
        assert_eq!(
            registry.content_algorithm("A256CBC-HS512")?,
            ContentAlgorithm::CbcHmac(AesKeySize::A256)
        );
        #[cfg(feature = "deflate")]
        assert_eq!(registry.compressor("DEF")?.id(), "DEF");
        Ok(())
    }

    #[cfg(not(feature = "rsa1_5"))]
    #[test]
    fn test_rsa1_5_not_registered_by_default() {
        let registry = Registry::with_defaults();
        assert!(registry.key_algorithm("RSA1_5").is_err());
    }

    #[test]
    fn test_register_alias() -> JweResult<()> {
        let registry = Registry::new();
        registry.register_content_algorithm("GCM-128", ContentAlgorithm::Gcm(AesKeySize::A128));
        assert_eq!(
            registry.content_algorithm("GCM-128")?,
            ContentAlgorithm::Gcm(AesKeySize::A128)
        );
        Ok(())
    }

    #[test]
    fn test_concurrent_lookup_and_registration() {
        let registry = Registry::with_defaults();
        std::thread::scope(|scope| {
            for i in 0..4 {
                let registry = &registry;
                scope.spawn(move || {
                    for _ in 0..100 {
                        assert!(registry.key_algorithm("A256KW").is_ok());
                    }
                    registry.register_critical_header(format!("ext{i}"));
                });
            }
        });
        for i in 0..4 {
            assert!(registry.understands_critical(&format!("ext{i}")));
        }
    }

    #[test]
    fn test_registry_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
