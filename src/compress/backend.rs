// One-shot codec backends.
//
// Provides a `CodecBackend` trait with one implementation per algorithm:
//   - LZ4 frame (via lz4_flex, feature-gated `lz4`)
//   - bzip2 (via bzip2, feature-gated `bz2`)
//   - xz/LZMA (via xz2, feature-gated `lzma`)
//   - zlib (via flate2, feature-gated `zlib`)
//   - gzip (via flate2, feature-gated `gzip`)
//
// A backend for a compiled-out codec is never constructed; `backend_for`
// reports `UnavailableDependency` instead. Decoding goes through the same
// path as `DecompressingSource`, so one-shot and streaming reads agree on
// truncation and empty input.

#[cfg(any(
    feature = "lz4",
    feature = "bz2",
    feature = "lzma",
    feature = "zlib",
    feature = "gzip"
))]
use std::io::Write;

use std::io;

use super::algorithm::Algorithm;
use super::error::CodecError;
#[cfg(any(
    feature = "lz4",
    feature = "bz2",
    feature = "lzma",
    feature = "zlib",
    feature = "gzip"
))]
use super::stream::decode_slice;

// ---------------------------------------------------------------------------
// CodecBackend trait
// ---------------------------------------------------------------------------

/// One-shot compressor/decompressor for a single algorithm.
///
/// Output is the algorithm's standard container format, so buffers produced
/// here can be read by any other implementation of the same format.
pub trait CodecBackend: Send + Sync {
    /// The algorithm this backend implements.
    fn algorithm(&self) -> Algorithm;

    /// Compress a whole buffer.
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>>;

    /// Decompress a whole buffer previously produced by this format.
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;
}

// ---------------------------------------------------------------------------
// LZ4 backend
// ---------------------------------------------------------------------------

/// LZ4 frame format compressor.
#[cfg(feature = "lz4")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Backend;

#[cfg(feature = "lz4")]
impl CodecBackend for Lz4Backend {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Lz4
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::with_capacity(data.len() / 2));
        encoder.write_all(data)?;
        encoder.finish().map_err(io::Error::other)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        decode_slice(Algorithm::Lz4, data)
    }
}

// ---------------------------------------------------------------------------
// bzip2 backend
// ---------------------------------------------------------------------------

/// bzip2 compressor. Decompression accepts concatenated streams.
#[cfg(feature = "bz2")]
#[derive(Debug, Clone, Copy)]
pub struct Bz2Backend {
    level: bzip2::Compression,
}

#[cfg(feature = "bz2")]
impl Bz2Backend {
    /// Create a bzip2 backend with the given block size level (1-9).
    pub fn new(level: u32) -> Self {
        Self {
            level: bzip2::Compression::new(level.clamp(1, 9)),
        }
    }
}

#[cfg(feature = "bz2")]
impl Default for Bz2Backend {
    fn default() -> Self {
        Self::new(9)
    }
}

#[cfg(feature = "bz2")]
impl CodecBackend for Bz2Backend {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Bz2
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), self.level);
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        decode_slice(Algorithm::Bz2, data)
    }
}

// ---------------------------------------------------------------------------
// LZMA backend
// ---------------------------------------------------------------------------

/// LZMA compressor producing the xz container.
#[cfg(feature = "lzma")]
#[derive(Debug, Clone, Copy)]
pub struct LzmaBackend {
    preset: u32,
}

#[cfg(feature = "lzma")]
impl LzmaBackend {
    /// Create an xz backend with the given preset (0-9).
    pub fn new(preset: u32) -> Self {
        Self {
            preset: preset.min(9),
        }
    }
}

#[cfg(feature = "lzma")]
impl Default for LzmaBackend {
    fn default() -> Self {
        Self::new(6)
    }
}

#[cfg(feature = "lzma")]
impl CodecBackend for LzmaBackend {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Lzma
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = xz2::write::XzEncoder::new(Vec::new(), self.preset);
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        decode_slice(Algorithm::Lzma, data)
    }
}

// ---------------------------------------------------------------------------
// Zlib backend
// ---------------------------------------------------------------------------

/// Zlib compressor (deflate with zlib header and adler32 trailer).
#[cfg(feature = "zlib")]
#[derive(Debug, Clone, Copy)]
pub struct ZlibBackend {
    level: flate2::Compression,
}

#[cfg(feature = "zlib")]
impl ZlibBackend {
    /// Create a Zlib backend with the given compression level (0-9).
    pub fn new(level: u32) -> Self {
        Self {
            level: flate2::Compression::new(level.min(9)),
        }
    }
}

#[cfg(feature = "zlib")]
impl Default for ZlibBackend {
    fn default() -> Self {
        Self::new(6)
    }
}

#[cfg(feature = "zlib")]
impl CodecBackend for ZlibBackend {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Zlib
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), self.level);
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        decode_slice(Algorithm::Zlib, data)
    }
}

// ---------------------------------------------------------------------------
// Gzip backend
// ---------------------------------------------------------------------------

/// Gzip compressor. Decompression accepts multi-member files.
#[cfg(feature = "gzip")]
#[derive(Debug, Clone, Copy)]
pub struct GzipBackend {
    level: flate2::Compression,
}

#[cfg(feature = "gzip")]
impl GzipBackend {
    /// Create a gzip backend with the given compression level (0-9).
    pub fn new(level: u32) -> Self {
        Self {
            level: flate2::Compression::new(level.min(9)),
        }
    }
}

#[cfg(feature = "gzip")]
impl Default for GzipBackend {
    fn default() -> Self {
        Self::new(9)
    }
}

#[cfg(feature = "gzip")]
impl CodecBackend for GzipBackend {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Gzip
    }

    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), self.level);
        encoder.write_all(data)?;
        encoder.finish()
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        decode_slice(Algorithm::Gzip, data)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Build the backend for `algorithm`.
///
/// `level` is clamped to the codec's range; `None` selects the codec default.
/// Codecs without levels ignore it.
pub fn backend_for(
    algorithm: Algorithm,
    level: Option<u32>,
) -> Result<Box<dyn CodecBackend>, CodecError> {
    #[cfg_attr(
        not(any(
            feature = "bz2",
            feature = "lzma",
            feature = "zlib",
            feature = "gzip"
        )),
        allow(unused_variables)
    )]
    let level = algorithm.effective_level(level).unwrap_or(0);

    match algorithm {
        #[cfg(feature = "lz4")]
        Algorithm::Lz4 => Ok(Box::new(Lz4Backend)),
        #[cfg(feature = "bz2")]
        Algorithm::Bz2 => Ok(Box::new(Bz2Backend::new(level))),
        #[cfg(feature = "lzma")]
        Algorithm::Lzma => Ok(Box::new(LzmaBackend::new(level))),
        #[cfg(feature = "zlib")]
        Algorithm::Zlib => Ok(Box::new(ZlibBackend::new(level))),
        #[cfg(feature = "gzip")]
        Algorithm::Gzip => Ok(Box::new(GzipBackend::new(level))),

        #[allow(unreachable_patterns)]
        other => Err(CodecError::unavailable(other)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        b"Hello, world! This is test data. "
            .iter()
            .copied()
            .cycle()
            .take(4096)
            .collect()
    }

    fn roundtrip(backend: &dyn CodecBackend) -> Vec<u8> {
        let data = sample();
        let compressed = backend.compress(&data).unwrap();
        assert!(
            compressed.len() < data.len(),
            "{} did not shrink repetitive data",
            backend.algorithm()
        );
        assert_eq!(backend.decompress(&compressed).unwrap(), data);
        compressed
    }

    #[cfg(feature = "lz4")]
    #[test]
    fn lz4_frame_roundtrip() {
        let compressed = roundtrip(&Lz4Backend);
        // LZ4 frame magic, little endian 0x184D2204.
        assert_eq!(&compressed[..4], &[0x04, 0x22, 0x4D, 0x18]);
    }

    #[cfg(feature = "bz2")]
    #[test]
    fn bz2_roundtrip() {
        let compressed = roundtrip(&Bz2Backend::default());
        assert_eq!(&compressed[..4], b"BZh9");
        let fast = Bz2Backend::new(1).compress(&sample()).unwrap();
        assert_eq!(&fast[..4], b"BZh1");
    }

    #[cfg(feature = "bz2")]
    #[test]
    fn bz2_concatenated_streams() {
        let backend = Bz2Backend::default();
        let mut joined = backend.compress(b"first ").unwrap();
        joined.extend(backend.compress(b"second").unwrap());
        assert_eq!(backend.decompress(&joined).unwrap(), b"first second");
    }

    #[cfg(feature = "lzma")]
    #[test]
    fn lzma_xz_roundtrip() {
        let compressed = roundtrip(&LzmaBackend::default());
        assert_eq!(&compressed[..6], &[0xFD, b'7', b'z', b'X', b'Z', 0x00]);
        // Far below the input: real LZMA matches, not stored chunks.
        assert!(compressed.len() < sample().len() / 8, "{} bytes", compressed.len());
    }

    #[cfg(feature = "lzma")]
    #[test]
    fn lzma_preset_changes_output() {
        let data: Vec<u8> = (0..200_000u32)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8 % 23)
            .collect();
        let fastest = LzmaBackend::new(0).compress(&data).unwrap();
        let default = LzmaBackend::default().compress(&data).unwrap();
        assert_ne!(fastest, default);
        for compressed in [&fastest, &default] {
            assert_eq!(LzmaBackend::default().decompress(compressed).unwrap(), data);
        }
    }

    #[cfg(feature = "zlib")]
    #[test]
    fn zlib_roundtrip() {
        let compressed = roundtrip(&ZlibBackend::default());
        assert_eq!(compressed[0], 0x78);
        let header = u16::from_be_bytes([compressed[0], compressed[1]]);
        assert_eq!(header % 31, 0);
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn gzip_roundtrip() {
        let compressed = roundtrip(&GzipBackend::default());
        assert_eq!(&compressed[..3], &[0x1f, 0x8b, 0x08]);
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn gzip_multi_member() {
        let backend = GzipBackend::default();
        let mut joined = backend.compress(b"abc").unwrap();
        joined.extend(backend.compress(b"def").unwrap());
        assert_eq!(backend.decompress(&joined).unwrap(), b"abcdef");
    }

    #[test]
    fn every_backend_rejects_garbage() {
        let garbage = b"this buffer is not in any compressed format at all";
        for algorithm in Algorithm::ALL {
            let Ok(backend) = backend_for(algorithm, None) else {
                continue;
            };
            let err = backend.decompress(garbage).unwrap_err();
            assert!(err.is_corrupt(), "{algorithm}: {err}");
        }
    }

    #[test]
    fn every_backend_rejects_truncation() {
        let data = sample();
        for algorithm in Algorithm::ALL {
            let Ok(backend) = backend_for(algorithm, None) else {
                continue;
            };
            let compressed = backend.compress(&data).unwrap();
            for cut in [compressed.len() / 2, compressed.len() - 1] {
                let err = backend.decompress(&compressed[..cut]).unwrap_err();
                assert!(err.is_corrupt(), "{algorithm} cut at {cut}: {err}");
            }
        }
    }

    #[test]
    fn empty_input() {
        for algorithm in Algorithm::ALL {
            let Ok(backend) = backend_for(algorithm, None) else {
                continue;
            };
            match algorithm {
                Algorithm::Bz2 | Algorithm::Gzip => {
                    assert_eq!(backend.decompress(b"").unwrap(), b"", "{algorithm}");
                }
                _ => assert!(backend.decompress(b"").unwrap_err().is_corrupt(), "{algorithm}"),
            }
        }
    }

    #[test]
    fn backend_for_dispatch() {
        for algorithm in Algorithm::ALL {
            match backend_for(algorithm, None) {
                Ok(b) => {
                    assert!(algorithm.is_available());
                    assert_eq!(b.algorithm(), algorithm);
                }
                Err(e) => {
                    assert!(!algorithm.is_available());
                    assert!(e.is_unavailable());
                }
            }
        }
    }

    #[cfg(all(feature = "zlib", feature = "gzip"))]
    #[test]
    fn level_changes_output() {
        let data = sample();
        let stored = backend_for(Algorithm::Zlib, Some(0))
            .unwrap()
            .compress(&data)
            .unwrap();
        let best = backend_for(Algorithm::Zlib, Some(9))
            .unwrap()
            .compress(&data)
            .unwrap();
        assert!(best.len() < stored.len());
        // Out-of-range levels clamp rather than fail.
        assert!(backend_for(Algorithm::Gzip, Some(99)).is_ok());
    }
}
