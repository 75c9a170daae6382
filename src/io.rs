// File-level helpers.
//
// Provides `compress_file()` and `decompress_file()` convenience functions
// that stream through the compression wrappers with buffered I/O. Optionally
// computes a SHA-256 of the uncompressed payload (feature-gated behind
// `file-io`).

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::compress::algorithm::Algorithm;
use crate::compress::dispatch::{DispatchOptions, Dispatcher};
use crate::compress::error::CodecError;
use crate::compress::stream::SourceFactory;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `compress_file()`.
#[derive(Debug, Clone)]
pub struct CompressStats {
    /// Algorithm applied, `None` when the data was copied through.
    pub algorithm: Option<Algorithm>,
    /// Uncompressed input size in bytes.
    pub input_size: u64,
    /// Output file size in bytes.
    pub output_size: u64,
    /// SHA-256 of the uncompressed input (if `file-io` feature is enabled).
    pub input_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `decompress_file()`.
#[derive(Debug, Clone)]
pub struct DecompressStats {
    /// Algorithm applied, `None` when the data was copied through.
    pub algorithm: Option<Algorithm>,
    /// Compressed input file size in bytes.
    pub input_size: u64,
    /// Decompressed output size in bytes.
    pub output_size: u64,
    /// SHA-256 of the decompressed output (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// I/O error (file open, read, write).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Codec error (unavailable codec, corrupt input, rejected identifier).
    #[error(transparent)]
    Codec(#[from] CodecError),
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

/// Running SHA-256, a no-op without the `file-io` feature.
#[derive(Default)]
struct Checksum {
    #[cfg(feature = "file-io")]
    hasher: sha2::Sha256,
}

impl Checksum {
    #[cfg_attr(not(feature = "file-io"), allow(unused_variables))]
    fn update(&mut self, bytes: &[u8]) {
        #[cfg(feature = "file-io")]
        self.hasher.update(bytes);
    }

    fn finish(self) -> Option<[u8; 32]> {
        #[cfg(feature = "file-io")]
        return Some(self.hasher.finalize().into());
        #[cfg(not(feature = "file-io"))]
        None
    }
}

/// Copy `reader` into `writer`, feeding every byte to `checksum`.
fn pump<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    checksum: &mut Checksum,
    read_err: impl Fn(io::Error) -> IoError,
) -> Result<u64, IoError> {
    let mut buf = vec![0u8; BUF_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(read_err(e)),
        };
        checksum.update(&buf[..n]);
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}

/// Split a failed decompressing read into a codec or source error.
fn classify_read(err: io::Error) -> IoError {
    match CodecError::from_read(err) {
        CodecError::Io(e) => IoError::Io(e),
        other => IoError::Codec(other),
    }
}

/// Decode `reader` into `writer`, or copy it when there is no codec.
fn decompress_stream<R: Read, W: Write>(
    factory: Option<SourceFactory>,
    reader: R,
    writer: &mut W,
    checksum: &mut Checksum,
) -> Result<u64, IoError> {
    match factory {
        Some(factory) => pump(&mut factory.open(reader), writer, checksum, classify_read),
        None => {
            let mut reader = reader;
            pump(&mut reader, writer, checksum, IoError::Io)
        }
    }
}

fn finish_file(writer: BufWriter<File>) -> Result<u64, IoError> {
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(file.metadata()?.len())
}

// ---------------------------------------------------------------------------
// compress_file
// ---------------------------------------------------------------------------

/// Compress `input_path` into `output_path` with the named algorithm.
///
/// The identifier is resolved before any file is touched, so a compiled-out
/// codec or a rejected identifier leaves the filesystem unchanged.
pub fn compress_file(
    input_path: &Path,
    output_path: &Path,
    algorithm: Option<&str>,
    opts: DispatchOptions,
) -> Result<CompressStats, IoError> {
    let factory = Dispatcher::new(opts).compress_ctx(algorithm)?;

    let input = File::open(input_path)?;
    let mut reader = BufReader::with_capacity(BUF_SIZE, input);
    let writer = BufWriter::with_capacity(BUF_SIZE, File::create(output_path)?);

    let mut checksum = Checksum::default();
    let (input_size, writer) = match factory {
        Some(factory) => {
            let mut sink = factory.open(writer);
            let n = pump(&mut reader, &mut sink, &mut checksum, IoError::Io)?;
            (n, sink.finish()?)
        }
        None => {
            let mut writer = writer;
            let n = pump(&mut reader, &mut writer, &mut checksum, IoError::Io)?;
            (n, writer)
        }
    };
    let output_size = finish_file(writer)?;

    Ok(CompressStats {
        algorithm: factory.map(|f| f.algorithm()),
        input_size,
        output_size,
        input_sha256: checksum.finish(),
    })
}

// ---------------------------------------------------------------------------
// decompress_file
// ---------------------------------------------------------------------------

/// Decompress `input_path` into `output_path` with the named algorithm.
pub fn decompress_file(
    input_path: &Path,
    output_path: &Path,
    algorithm: Option<&str>,
    opts: DispatchOptions,
) -> Result<DecompressStats, IoError> {
    let factory = Dispatcher::new(opts).decompress_ctx(algorithm)?;

    let input = File::open(input_path)?;
    let input_size = input.metadata()?.len();
    let reader = BufReader::with_capacity(BUF_SIZE, input);
    let mut writer = BufWriter::with_capacity(BUF_SIZE, File::create(output_path)?);

    let mut checksum = Checksum::default();
    let output_size = decompress_stream(factory, reader, &mut writer, &mut checksum)?;
    writer.flush()?;

    Ok(DecompressStats {
        algorithm: factory.map(|f| f.algorithm()),
        input_size,
        output_size,
        output_sha256: checksum.finish(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
