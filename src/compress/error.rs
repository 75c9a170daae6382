// Error type shared by the dispatcher, backends and streaming wrappers.

use std::io;

use super::algorithm::Algorithm;

/// Errors raised while compressing or decompressing a buffer or stream.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The codec for `algorithm` was not compiled into this build.
    ///
    /// Raised before any data is touched.
    #[error("{algorithm} support is not available: rebuild with the `{feature}` feature")]
    UnavailableDependency {
        algorithm: Algorithm,
        feature: &'static str,
    },

    /// The input is not a valid `algorithm` stream.
    #[error("corrupt {algorithm} data: {source}")]
    CorruptData {
        algorithm: Algorithm,
        #[source]
        source: io::Error,
    },

    /// An identifier outside the algorithm table, rejected in strict mode.
    #[error("unsupported compression algorithm: {0:?}")]
    UnsupportedAlgorithm(String),

    /// Reading from a source or writing to a sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CodecError {
    pub(crate) fn corrupt(algorithm: Algorithm, source: io::Error) -> Self {
        Self::CorruptData { algorithm, source }
    }

    pub(crate) fn unavailable(algorithm: Algorithm) -> Self {
        Self::UnavailableDependency {
            algorithm,
            feature: algorithm.feature(),
        }
    }

    /// Recover the error behind a failed read from a `DecompressingSource`.
    ///
    /// Decoder rejections come back as `CorruptData`, failures of the
    /// underlying source as `Io`.
    pub fn from_read(err: io::Error) -> Self {
        match err.downcast::<CodecError>() {
            Ok(codec) => codec,
            Err(err) => Self::Io(err),
        }
    }

    /// True for [`CodecError::CorruptData`].
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptData { .. })
    }

    /// True for [`CodecError::UnavailableDependency`].
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::UnavailableDependency { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_message_names_feature() {
        let err = CodecError::unavailable(Algorithm::Lz4);
        assert!(err.is_unavailable());
        assert_eq!(
            err.to_string(),
            "lz4 support is not available: rebuild with the `lz4` feature"
        );
    }

    #[test]
    fn corrupt_keeps_source() {
        use std::error::Error;

        let err = CodecError::corrupt(
            Algorithm::Gzip,
            io::Error::new(io::ErrorKind::InvalidData, "invalid gzip header"),
        );
        assert!(err.is_corrupt());
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("corrupt gzip data"));
    }

    #[test]
    fn from_read_separates_decoder_and_source_failures() {
        let wrapped = io::Error::new(
            io::ErrorKind::InvalidData,
            CodecError::corrupt(
                Algorithm::Zlib,
                io::Error::new(io::ErrorKind::InvalidInput, "corrupt deflate stream"),
            ),
        );
        assert!(CodecError::from_read(wrapped).is_corrupt());

        let plain = io::Error::new(io::ErrorKind::ConnectionReset, "peer went away");
        match CodecError::from_read(plain) {
            CodecError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("expected Io, got {other}"),
        }
    }
}
