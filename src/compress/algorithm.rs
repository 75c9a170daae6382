// Algorithm table.
//
// Identifiers are the exact, case-sensitive strings used by the document
// library when it serializes compressed payloads:
//
//   "lz4"  -> LZ4 frame format
//   "bz2"  -> bzip2 stream
//   "lzma" -> xz container
//   "zlib" -> zlib (deflate + adler32) stream
//   "gzip" -> gzip member
//
// No identifier (or an identifier not in this table) means "no compression".

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use super::error::CodecError;

/// A supported compression algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Lz4,
    Bz2,
    Lzma,
    Zlib,
    Gzip,
}

impl Algorithm {
    /// Every algorithm, in table order.
    pub const ALL: [Algorithm; 5] = [
        Algorithm::Lz4,
        Algorithm::Bz2,
        Algorithm::Lzma,
        Algorithm::Zlib,
        Algorithm::Gzip,
    ];

    /// Look up an identifier. Returns `None` for anything outside the table,
    /// including the empty string.
    pub fn parse(id: &str) -> Option<Self> {
        match id {
            "lz4" => Some(Self::Lz4),
            "bz2" => Some(Self::Bz2),
            "lzma" => Some(Self::Lzma),
            "zlib" => Some(Self::Zlib),
            "gzip" => Some(Self::Gzip),
            _ => None,
        }
    }

    /// The identifier string for this algorithm.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lz4 => "lz4",
            Self::Bz2 => "bz2",
            Self::Lzma => "lzma",
            Self::Zlib => "zlib",
            Self::Gzip => "gzip",
        }
    }

    /// Name of the cargo feature that compiles this codec in.
    pub fn feature(self) -> &'static str {
        // Features are named after the identifiers.
        self.as_str()
    }

    /// Whether this codec was compiled into the current build.
    pub fn is_available(self) -> bool {
        available().contains(self.into())
    }

    /// Default level used when the caller does not pick one.
    ///
    /// Matches the defaults of the reference codecs; `None` for codecs
    /// without levels.
    pub fn default_level(self) -> Option<u32> {
        match self {
            Self::Zlib | Self::Lzma => Some(6),
            Self::Gzip | Self::Bz2 => Some(9),
            Self::Lz4 => None,
        }
    }

    /// Clamp a requested level into the range this codec accepts.
    pub fn clamp_level(self, level: u32) -> Option<u32> {
        match self {
            Self::Zlib | Self::Gzip | Self::Lzma => Some(level.min(9)),
            Self::Bz2 => Some(level.clamp(1, 9)),
            Self::Lz4 => None,
        }
    }

    /// Resolve an optional caller level against this codec's default.
    pub fn effective_level(self, level: Option<u32>) -> Option<u32> {
        match level {
            Some(l) => self.clamp_level(l),
            None => self.default_level(),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| CodecError::UnsupportedAlgorithm(s.to_string()))
    }
}

bitflags! {
    /// A set of algorithms.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AlgorithmSet: u8 {
        const LZ4 = 1 << 0;
        const BZ2 = 1 << 1;
        const LZMA = 1 << 2;
        const ZLIB = 1 << 3;
        const GZIP = 1 << 4;
    }
}

impl From<Algorithm> for AlgorithmSet {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Lz4 => Self::LZ4,
            Algorithm::Bz2 => Self::BZ2,
            Algorithm::Lzma => Self::LZMA,
            Algorithm::Zlib => Self::ZLIB,
            Algorithm::Gzip => Self::GZIP,
        }
    }
}

impl AlgorithmSet {
    /// Iterate the algorithms in this set, in table order.
    pub fn algorithms(self) -> impl Iterator<Item = Algorithm> {
        Algorithm::ALL
            .into_iter()
            .filter(move |a| self.contains((*a).into()))
    }
}

/// Codecs compiled into this build.
pub const fn available() -> AlgorithmSet {
    let mut bits = 0u8;
    if cfg!(feature = "lz4") {
        bits |= AlgorithmSet::LZ4.bits();
    }
    if cfg!(feature = "bz2") {
        bits |= AlgorithmSet::BZ2.bits();
    }
    if cfg!(feature = "lzma") {
        bits |= AlgorithmSet::LZMA.bits();
    }
    if cfg!(feature = "zlib") {
        bits |= AlgorithmSet::ZLIB.bits();
    }
    if cfg!(feature = "gzip") {
        bits |= AlgorithmSet::GZIP.bits();
    }
    AlgorithmSet::from_bits_truncate(bits)
}

/// Fail with [`CodecError::UnavailableDependency`] if `algorithm` was compiled out.
pub fn ensure_available(algorithm: Algorithm) -> Result<(), CodecError> {
    if algorithm.is_available() {
        Ok(())
    } else {
        Err(CodecError::unavailable(algorithm))
    }
}
