//! Payload compression (`zip` header parameter).
//!
//! Compression is applied to the plaintext before content encryption and
//! reversed after successful decryption. The only registered algorithm is
//! `DEF`, raw DEFLATE (RFC 1951) without zlib or gzip framing.

#[cfg(feature = "deflate")]
use std::io::{Read, Write};

#[cfg(feature = "deflate")]
use flate2::{read::DeflateDecoder, write::DeflateEncoder, Compression};

#[cfg(feature = "deflate")]
use crate::core::error::JweError;
use crate::core::error::JweResult;

/// A compression algorithm usable as a `zip` value.
pub trait Compressor: Send + Sync {
    /// The `zip` identifier.
    fn id(&self) -> &str;

    /// Compresses a plaintext.
    fn compress(&self, data: &[u8]) -> JweResult<Vec<u8>>;

    /// Decompresses a decrypted payload.
    fn decompress(&self, data: &[u8]) -> JweResult<Vec<u8>>;
}

/// Raw DEFLATE (`"zip": "DEF"`).
///
/// Decompression output is capped to guard against compression bombs.
#[cfg(feature = "deflate")]
#[derive(Debug, Clone, Copy)]
pub struct Deflate {
    limit: usize,
}

#[cfg(feature = "deflate")]
impl Deflate {
    /// The `zip` identifier for DEFLATE.
    pub const ID: &'static str = "DEF";

    /// Default decompression ceiling (64 MiB).
    pub const DEFAULT_LIMIT: usize = 64 * 1024 * 1024;

    /// Creates a DEFLATE codec with the default decompression ceiling.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_limit(Self::DEFAULT_LIMIT)
    }

    /// Creates a DEFLATE codec with a custom decompression ceiling in bytes.
    #[must_use]
    pub const fn with_limit(limit: usize) -> Self {
        Self { limit }
    }
}

#[cfg(feature = "deflate")]
impl Default for Deflate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "deflate")]
impl Compressor for Deflate {
    fn id(&self) -> &str {
        Self::ID
    }

    fn compress(&self, data: &[u8]) -> JweResult<Vec<u8>> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(data)
            .map_err(|e| JweError::Compression(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| JweError::Compression(e.to_string()))
    }

    fn decompress(&self, data: &[u8]) -> JweResult<Vec<u8>> {
        let mut out = Vec::new();
        let ceiling = u64::try_from(self.limit)
            .unwrap_or(u64::MAX)
            .saturating_add(1);
        DeflateDecoder::new(data)
            .take(ceiling)
            .read_to_end(&mut out)
            .map_err(|e| JweError::Compression(e.to_string()))?;
        if out.len() > self.limit {
            return Err(JweError::Compression(format!(
                "decompressed payload exceeds {} bytes",
                self.limit
            )));
        }
        Ok(out)
    }
}

#[cfg(all(test, feature = "deflate"))]
mod tests {
    use super::*;

    #[test]
    fn test_deflate_roundtrip() -> JweResult<()> {
        let deflate = Deflate::new();
        let data = b"You can trust us to stick with you through thick and thin".repeat(20);
        let compressed = deflate.compress(&data)?;
        assert!(compressed.len() < data.len());
        assert_eq!(deflate.decompress(&compressed)?, data);
        Ok(())
    }

    #[test]
    fn test_deflate_empty() -> JweResult<()> {
        let deflate = Deflate::new();
        let compressed = deflate.compress(b"")?;
        assert!(deflate.decompress(&compressed)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_deflate_is_raw() -> JweResult<()> {
        // A zlib stream starts with 0x78; raw DEFLATE never carries that header.
        let compressed = Deflate::new().compress(&[0u8; 64])?;
        assert_ne!(compressed.first(), Some(&0x78));
        Ok(())
    }

    #[test]
    fn test_deflate_limit() -> JweResult<()> {
        let compressed = Deflate::new().compress(&[0u8; 4096])?;
        let result = Deflate::with_limit(1024).decompress(&compressed);
        assert!(matches!(result, Err(JweError::Compression(_))));
        assert_eq!(Deflate::with_limit(4096).decompress(&compressed)?.len(), 4096);
        Ok(())
    }

    #[test]
    fn test_deflate_as_compressor() -> JweResult<()> {
        let data = b"one ring to rule them all, one ring to find them".repeat(8);
        let codec: &dyn Compressor = &Deflate::with_limit(data.len());
        assert_eq!(codec.id(), "DEF");
        let compressed = codec.compress(&data)?;
        assert_eq!(codec.decompress(&compressed)?, data);
        Ok(())
    }

    #[test]
    fn test_deflate_garbage() {
        let result = Deflate::new().decompress(&[0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(JweError::Compression(_))));
    }
}
