// Identifier-keyed dispatch.
//
// Callers name an algorithm with an optional string. Resolution:
//   - absent or ""            -> no compression
//   - one of the table's ids  -> that codec (UnavailableDependency if compiled out)
//   - anything else           -> no compression, or UnsupportedAlgorithm when
//                                the dispatcher rejects unknown identifiers
//
// Passing unknown identifiers through is the default so that payloads written
// with a codec name this build does not know are returned as-is rather than
// failing the whole document load.

use super::algorithm::{Algorithm, ensure_available};
use super::backend::{self, CodecBackend};
use super::error::CodecError;
use super::stream::{SinkFactory, SourceFactory};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// What to do with an identifier that is not in the algorithm table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownAlgorithm {
    /// Treat it as "no compression" and return data unchanged.
    #[default]
    Passthrough,
    /// Fail with [`CodecError::UnsupportedAlgorithm`].
    Reject,
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Policy for identifiers outside the table.
    pub unknown: UnknownAlgorithm,
    /// Compression level; `None` uses each codec's default.
    pub level: Option<u32>,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Maps algorithm identifiers to codecs.
///
/// Stateless apart from its options; safe to share across threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher {
    opts: DispatchOptions,
}

impl Dispatcher {
    pub fn new(opts: DispatchOptions) -> Self {
        Self { opts }
    }

    /// A dispatcher that rejects unknown identifiers.
    pub fn strict() -> Self {
        Self::new(DispatchOptions {
            unknown: UnknownAlgorithm::Reject,
            ..Default::default()
        })
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.opts
    }

    /// Resolve an identifier to an algorithm, or `None` for no compression.
    ///
    /// Does not check codec availability.
    pub fn resolve(&self, algorithm: Option<&str>) -> Result<Option<Algorithm>, CodecError> {
        let Some(id) = algorithm.filter(|id| !id.is_empty()) else {
            return Ok(None);
        };
        match Algorithm::parse(id) {
            Some(a) => Ok(Some(a)),
            None => match self.opts.unknown {
                UnknownAlgorithm::Passthrough => {
                    log::debug!("unknown compression algorithm {id:?}, passing data through");
                    Ok(None)
                }
                UnknownAlgorithm::Reject => Err(CodecError::UnsupportedAlgorithm(id.to_string())),
            },
        }
    }

    fn backend(&self, algorithm: Option<&str>) -> Result<Option<Box<dyn CodecBackend>>, CodecError> {
        match self.resolve(algorithm)? {
            Some(a) => backend::backend_for(a, self.opts.level).map(Some),
            None => Ok(None),
        }
    }

    /// Compress `data` with the named algorithm.
    ///
    /// Returns an unchanged copy when no algorithm is selected.
    pub fn compress(&self, data: &[u8], algorithm: Option<&str>) -> Result<Vec<u8>, CodecError> {
        let Some(backend) = self.backend(algorithm)? else {
            return Ok(data.to_vec());
        };
        let out = backend.compress(data)?;
        log::trace!(
            "{}: compressed {} -> {} bytes",
            backend.algorithm(),
            data.len(),
            out.len()
        );
        Ok(out)
    }

    /// Decompress `data` with the named algorithm.
    ///
    /// Returns an unchanged copy when no algorithm is selected.
    pub fn decompress(&self, data: &[u8], algorithm: Option<&str>) -> Result<Vec<u8>, CodecError> {
        let Some(backend) = self.backend(algorithm)? else {
            return Ok(data.to_vec());
        };
        let out = backend.decompress(data)?;
        log::trace!(
            "{}: decompressed {} -> {} bytes",
            backend.algorithm(),
            data.len(),
            out.len()
        );
        Ok(out)
    }

    /// Factory for streaming compression, or `None` when no algorithm is selected.
    pub fn compress_ctx(&self, algorithm: Option<&str>) -> Result<Option<SinkFactory>, CodecError> {
        match self.resolve(algorithm)? {
            Some(a) => SinkFactory::new(a, self.opts.level).map(Some),
            None => Ok(None),
        }
    }

    /// Factory for streaming decompression, or `None` when no algorithm is selected.
    pub fn decompress_ctx(
        &self,
        algorithm: Option<&str>,
    ) -> Result<Option<SourceFactory>, CodecError> {
        match self.resolve(algorithm)? {
            Some(a) => SourceFactory::new(a).map(Some),
            None => Ok(None),
        }
    }

    /// Compress independent buffers, preserving order.
    ///
    /// Runs on the rayon pool with the `parallel` feature.
    pub fn compress_batch(
        &self,
        items: &[&[u8]],
        algorithm: Option<&str>,
    ) -> Result<Vec<Vec<u8>>, CodecError> {
        let Some(backend) = self.backend(algorithm)? else {
            return Ok(items.iter().map(|d| d.to_vec()).collect());
        };

        #[cfg(feature = "parallel")]
        let out: Result<Vec<Vec<u8>>, std::io::Error> =
            items.par_iter().map(|d| backend.compress(d)).collect();
        #[cfg(not(feature = "parallel"))]
        let out: Result<Vec<Vec<u8>>, std::io::Error> =
            items.iter().map(|d| backend.compress(d)).collect();

        Ok(out?)
    }
}

/// Whether `algorithm` resolves to a codec that can run in this build.
pub fn is_supported(algorithm: Option<&str>) -> bool {
    match algorithm.and_then(Algorithm::parse) {
        Some(a) => ensure_available(a).is_ok(),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Free functions (default dispatcher)
// ---------------------------------------------------------------------------

/// Compress `data` with the named algorithm; unknown or absent names pass through.
pub fn compress_bytes(data: &[u8], algorithm: Option<&str>) -> Result<Vec<u8>, CodecError> {
    Dispatcher::default().compress(data, algorithm)
}

/// Decompress `data` with the named algorithm; unknown or absent names pass through.
pub fn decompress_bytes(data: &[u8], algorithm: Option<&str>) -> Result<Vec<u8>, CodecError> {
    Dispatcher::default().decompress(data, algorithm)
}

/// Streaming compression factory for the named algorithm.
pub fn compress_ctx(algorithm: Option<&str>) -> Result<Option<SinkFactory>, CodecError> {
    Dispatcher::default().compress_ctx(algorithm)
}

/// Streaming decompression factory for the named algorithm.
pub fn decompress_ctx(algorithm: Option<&str>) -> Result<Option<SourceFactory>, CodecError> {
    Dispatcher::default().decompress_ctx(algorithm)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
