// Streaming wrappers.
//
// `CompressingSink<W>` wraps a caller-supplied `Write` and emits the chosen
// algorithm's container as data is written. It owns the codec framing but not
// the sink's lifecycle: `finish()` writes the trailer, flushes, and hands the
// sink back. Passing `&mut W` keeps the sink with the caller.
//
// `DecompressingSource<R>` is the read-side counterpart. Its read errors carry
// a `CodecError::CorruptData` when the decoder rejected the data and the
// source's own error, unchanged, when the source failed.
//
// Caller handles are wrapped before they reach a codec crate:
//   - `SinkGuard` parks sink errors and gives the encoder a bare error kind
//     (lz4_flex panics converting an io::Error that carries a payload)
//   - `SourceTap` parks source errors and records how much was read and
//     whether EOF was seen, which is how truncated lz4 frames and empty
//     inputs are told apart from clean ends

use std::io::{self, Read, Write};

#[cfg(not(any(
    feature = "lz4",
    feature = "bz2",
    feature = "lzma",
    feature = "zlib",
    feature = "gzip"
)))]
use std::{convert::Infallible, marker::PhantomData};

use super::algorithm::{Algorithm, ensure_available};
use super::error::CodecError;

// ---------------------------------------------------------------------------
// Factories
// ---------------------------------------------------------------------------

/// Opens compressing wrappers for one algorithm.
///
/// Only constructed for codecs compiled into the build, so `open` cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkFactory {
    algorithm: Algorithm,
    level: Option<u32>,
}

impl SinkFactory {
    /// Factory for `algorithm`, failing eagerly if its codec is compiled out.
    pub fn new(algorithm: Algorithm, level: Option<u32>) -> Result<Self, CodecError> {
        ensure_available(algorithm)?;
        Ok(Self {
            algorithm,
            level: algorithm.effective_level(level),
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Wrap `sink`. Bytes written to the wrapper reach `sink` compressed.
    pub fn open<W: Write>(&self, sink: W) -> CompressingSink<W> {
        CompressingSink {
            algorithm: self.algorithm,
            inner: Some(Encoder::new(self.algorithm, self.level, sink)),
            bytes_in: 0,
        }
    }
}

/// Opens decompressing wrappers for one algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFactory {
    algorithm: Algorithm,
}

impl SourceFactory {
    /// Factory for `algorithm`, failing eagerly if its codec is compiled out.
    pub fn new(algorithm: Algorithm) -> Result<Self, CodecError> {
        ensure_available(algorithm)?;
        Ok(Self { algorithm })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Wrap `source`. Reads from the wrapper yield decompressed bytes.
    pub fn open<R: Read>(&self, source: R) -> DecompressingSource<R> {
        DecompressingSource {
            algorithm: self.algorithm,
            inner: Decoder::new(self.algorithm, source),
        }
    }
}

// ---------------------------------------------------------------------------
// CompressingSink
// ---------------------------------------------------------------------------

/// A `Write` adapter that compresses into an underlying sink.
///
/// Call [`finish`](Self::finish) to write the trailer and recover the sink.
/// A wrapper dropped without `finish` is finalized on drop; failures there
/// can only be logged.
///
/// Errors returned by the sink reach the caller unchanged.
pub struct CompressingSink<W: Write> {
    algorithm: Algorithm,
    inner: Option<Encoder<W>>,
    bytes_in: u64,
}

impl<W: Write> CompressingSink<W> {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Uncompressed bytes accepted so far.
    pub fn bytes_in(&self) -> u64 {
        self.bytes_in
    }

    /// Write the trailer, flush the sink and return it.
    pub fn finish(mut self) -> Result<W, CodecError> {
        let encoder = self.inner.take().ok_or_else(finished)?;
        let mut sink = encoder.finish()?;
        sink.flush()?;
        log::trace!(
            "{} sink finished after {} input bytes",
            self.algorithm,
            self.bytes_in
        );
        Ok(sink)
    }
}

fn finished() -> io::Error {
    io::Error::other("compressing sink already finished")
}

impl<W: Write> Write for CompressingSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.as_mut().ok_or_else(finished)?.write(buf)?;
        self.bytes_in += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.as_mut().ok_or_else(finished)?.flush()
    }
}

impl<W: Write> Drop for CompressingSink<W> {
    fn drop(&mut self) {
        if let Some(encoder) = self.inner.take() {
            match encoder.finish() {
                Ok(mut sink) => {
                    if let Err(e) = sink.flush() {
                        log::warn!("{} sink: flush on drop failed: {e}", self.algorithm);
                    }
                }
                Err(e) => log::warn!("{} sink: finalize on drop failed: {e}", self.algorithm),
            }
        }
    }
}

impl<W: Write> std::fmt::Debug for CompressingSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressingSink")
            .field("algorithm", &self.algorithm)
            .field("bytes_in", &self.bytes_in)
            .field("finished", &self.inner.is_none())
            .finish()
    }
}

/// Run `body` against a wrapper over `sink`, then finalize it.
///
/// The trailer is written whether or not `body` succeeds; `body`'s error takes
/// precedence over a finalize error.
pub fn with_compressing_sink<W, T, F>(
    factory: &SinkFactory,
    sink: W,
    body: F,
) -> Result<(T, W), CodecError>
where
    W: Write,
    F: FnOnce(&mut CompressingSink<W>) -> Result<T, CodecError>,
{
    let mut wrapper = factory.open(sink);
    match body(&mut wrapper) {
        Ok(value) => {
            let sink = wrapper.finish()?;
            Ok((value, sink))
        }
        Err(e) => {
            if let Err(fin) = wrapper.finish() {
                log::debug!("{}: finalize after error also failed: {fin}", factory.algorithm);
            }
            Err(e)
        }
    }
}

// ---------------------------------------------------------------------------
// Encoder variants
// ---------------------------------------------------------------------------

enum Encoder<W: Write> {
    #[cfg(feature = "lz4")]
    Lz4(lz4_flex::frame::FrameEncoder<SinkGuard<W>>),
    #[cfg(feature = "bz2")]
    Bz2(bzip2::write::BzEncoder<SinkGuard<W>>),
    #[cfg(feature = "lzma")]
    Lzma(xz2::write::XzEncoder<SinkGuard<W>>),
    #[cfg(feature = "zlib")]
    Zlib(flate2::write::ZlibEncoder<SinkGuard<W>>),
    #[cfg(feature = "gzip")]
    Gzip(flate2::write::GzEncoder<SinkGuard<W>>),
    #[cfg(not(any(
        feature = "lz4",
        feature = "bz2",
        feature = "lzma",
        feature = "zlib",
        feature = "gzip"
    )))]
    Never(Infallible, PhantomData<W>),
}

impl<W: Write> Encoder<W> {
    // Callers go through `SinkFactory::new`, which has already checked
    // availability.
    #[cfg_attr(
        not(any(
            feature = "bz2",
            feature = "lzma",
            feature = "zlib",
            feature = "gzip"
        )),
        allow(unused_variables)
    )]
    fn new(algorithm: Algorithm, level: Option<u32>, sink: W) -> Self {
        let level = level.unwrap_or(0);
        let sink = SinkGuard::new(sink);
        match algorithm {
            #[cfg(feature = "lz4")]
            Algorithm::Lz4 => Self::Lz4(lz4_flex::frame::FrameEncoder::new(sink)),
            #[cfg(feature = "bz2")]
            Algorithm::Bz2 => Self::Bz2(bzip2::write::BzEncoder::new(
                sink,
                bzip2::Compression::new(level.clamp(1, 9)),
            )),
            #[cfg(feature = "lzma")]
            Algorithm::Lzma => Self::Lzma(xz2::write::XzEncoder::new(sink, level.min(9))),
            #[cfg(feature = "zlib")]
            Algorithm::Zlib => Self::Zlib(flate2::write::ZlibEncoder::new(
                sink,
                flate2::Compression::new(level.min(9)),
            )),
            #[cfg(feature = "gzip")]
            Algorithm::Gzip => Self::Gzip(flate2::write::GzEncoder::new(
                sink,
                flate2::Compression::new(level.min(9)),
            )),
            #[allow(unreachable_patterns)]
            other => unreachable!("{other} sink requested without codec support"),
        }
    }

    fn guard_mut(&mut self) -> &mut SinkGuard<W> {
        match self {
            #[cfg(feature = "lz4")]
            Self::Lz4(e) => e.get_mut(),
            #[cfg(feature = "bz2")]
            Self::Bz2(e) => e.get_mut(),
            #[cfg(feature = "lzma")]
            Self::Lzma(e) => e.get_mut(),
            #[cfg(feature = "zlib")]
            Self::Zlib(e) => e.get_mut(),
            #[cfg(feature = "gzip")]
            Self::Gzip(e) => e.get_mut(),
            #[cfg(not(any(
                feature = "lz4",
                feature = "bz2",
                feature = "lzma",
                feature = "zlib",
                feature = "gzip"
            )))]
            Self::Never(never, _) => match *never {},
        }
    }

    /// Write the trailer without giving up the encoder.
    fn try_finish(&mut self) -> io::Result<()> {
        match self {
            #[cfg(feature = "lz4")]
            Self::Lz4(e) => e.try_finish().map_err(io::Error::from),
            #[cfg(feature = "bz2")]
            Self::Bz2(e) => e.try_finish(),
            #[cfg(feature = "lzma")]
            Self::Lzma(e) => e.try_finish(),
            #[cfg(feature = "zlib")]
            Self::Zlib(e) => e.try_finish(),
            #[cfg(feature = "gzip")]
            Self::Gzip(e) => e.try_finish(),
            #[cfg(not(any(
                feature = "lz4",
                feature = "bz2",
                feature = "lzma",
                feature = "zlib",
                feature = "gzip"
            )))]
            Self::Never(never, _) => match *never {},
        }
    }

    fn finish(mut self) -> io::Result<W> {
        if let Err(e) = self.try_finish() {
            return Err(self.guard_mut().reclaim(e));
        }
        // The trailer is already written, so these only hand back the sink.
        let guard = match self {
            #[cfg(feature = "lz4")]
            Self::Lz4(e) => e.into_inner(),
            #[cfg(feature = "bz2")]
            Self::Bz2(e) => e.finish()?,
            #[cfg(feature = "lzma")]
            Self::Lzma(e) => e.finish()?,
            #[cfg(feature = "zlib")]
            Self::Zlib(e) => e.finish()?,
            #[cfg(feature = "gzip")]
            Self::Gzip(e) => e.finish()?,
            #[cfg(not(any(
                feature = "lz4",
                feature = "bz2",
                feature = "lzma",
                feature = "zlib",
                feature = "gzip"
            )))]
            Self::Never(never, _) => match never {},
        };
        Ok(guard.into_inner())
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = match self {
            #[cfg(feature = "lz4")]
            Self::Lz4(e) => e.write(buf),
            #[cfg(feature = "bz2")]
            Self::Bz2(e) => e.write(buf),
            #[cfg(feature = "lzma")]
            Self::Lzma(e) => e.write(buf),
            #[cfg(feature = "zlib")]
            Self::Zlib(e) => e.write(buf),
            #[cfg(feature = "gzip")]
            Self::Gzip(e) => e.write(buf),
            #[cfg(not(any(
                feature = "lz4",
                feature = "bz2",
                feature = "lzma",
                feature = "zlib",
                feature = "gzip"
            )))]
            Self::Never(never, _) => match *never {},
        };
        result.map_err(|e| self.guard_mut().reclaim(e))
    }

    fn flush(&mut self) -> io::Result<()> {
        let result = match self {
            #[cfg(feature = "lz4")]
            Self::Lz4(e) => e.flush(),
            #[cfg(feature = "bz2")]
            Self::Bz2(e) => e.flush(),
            #[cfg(feature = "lzma")]
            Self::Lzma(e) => e.flush(),
            #[cfg(feature = "zlib")]
            Self::Zlib(e) => e.flush(),
            #[cfg(feature = "gzip")]
            Self::Gzip(e) => e.flush(),
            #[cfg(not(any(
                feature = "lz4",
                feature = "bz2",
                feature = "lzma",
                feature = "zlib",
                feature = "gzip"
            )))]
            Self::Never(never, _) => match *never {},
        };
        result.map_err(|e| self.guard_mut().reclaim(e))
    }
}

/// Sits between an encoder and the caller's sink.
struct SinkGuard<W: Write> {
    inner: W,
    failure: Option<io::Error>,
}

impl<W: Write> SinkGuard<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            failure: None,
        }
    }

    /// The sink's own error if it caused `err`, else `err`.
    fn reclaim(&mut self, err: io::Error) -> io::Error {
        self.failure.take().unwrap_or(err)
    }

    fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for SinkGuard<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).map_err(|e| park(&mut self.failure, e))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().map_err(|e| park(&mut self.failure, e))
    }
}

/// Keep `err` in `slot` and return a payload-free error of the same kind.
fn park(slot: &mut Option<io::Error>, err: io::Error) -> io::Error {
    let kind = err.kind();
    if kind != io::ErrorKind::Interrupted {
        *slot = Some(err);
    }
    io::Error::from(kind)
}

// ---------------------------------------------------------------------------
// DecompressingSource
// ---------------------------------------------------------------------------

/// A `Read` adapter that decompresses from an underlying source.
///
/// A read error either wraps a [`CodecError::CorruptData`] (the decoder
/// rejected the data) or is the source's own error. [`CodecError::from_read`]
/// and [`read_all`](Self::read_all) recover the distinction.
///
/// Empty input decodes to nothing for bz2 and gzip (zero streams or members)
/// and is corrupt for lz4, lzma and zlib.
pub struct DecompressingSource<R: Read> {
    algorithm: Algorithm,
    inner: Decoder<R>,
}

impl<R: Read> DecompressingSource<R> {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Read the whole stream into a buffer.
    pub fn read_all(mut self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        self.read_to_end(&mut out).map_err(CodecError::from_read)?;
        Ok(out)
    }

    fn corrupt(&self, err: io::Error) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            CodecError::corrupt(self.algorithm, err),
        )
    }
}

/// Codecs whose reference decoders return nothing for empty input.
fn empty_input_is_empty(algorithm: Algorithm) -> bool {
    matches!(algorithm, Algorithm::Bz2 | Algorithm::Gzip)
}

impl<R: Read> Read for DecompressingSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let result = self.inner.read(buf);
        if let Some(failure) = self.inner.tap_mut().failure.take() {
            return Err(failure);
        }
        let empty_input = self.inner.tap().saw_empty_input();
        match result {
            Ok(0) if !buf.is_empty() && empty_input => {
                if empty_input_is_empty(self.algorithm) {
                    Ok(0)
                } else {
                    Err(self.corrupt(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "empty input",
                    )))
                }
            }
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(e),
            Err(_) if empty_input && empty_input_is_empty(self.algorithm) => Ok(0),
            Err(e) => Err(self.corrupt(e)),
        }
    }
}

impl<R: Read> std::fmt::Debug for DecompressingSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecompressingSource")
            .field("algorithm", &self.algorithm)
            .field("consumed", &self.inner.tap().consumed)
            .finish_non_exhaustive()
    }
}

/// Decode a whole buffer.
#[cfg_attr(
    not(any(
        feature = "lz4",
        feature = "bz2",
        feature = "lzma",
        feature = "zlib",
        feature = "gzip"
    )),
    allow(dead_code)
)]
pub(crate) fn decode_slice(algorithm: Algorithm, data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut source = DecompressingSource {
        algorithm,
        inner: Decoder::new(algorithm, data),
    };
    let mut out = Vec::with_capacity(data.len().saturating_mul(2));
    source
        .read_to_end(&mut out)
        .map_err(CodecError::from_read)?;
    Ok(out)
}

enum Decoder<R: Read> {
    #[cfg(feature = "lz4")]
    Lz4 {
        frame: lz4_flex::frame::FrameDecoder<SourceTap<R>>,
        done: bool,
    },
    #[cfg(feature = "bz2")]
    Bz2(bzip2::read::MultiBzDecoder<SourceTap<R>>),
    #[cfg(feature = "lzma")]
    Lzma(xz2::read::XzDecoder<SourceTap<R>>),
    #[cfg(feature = "zlib")]
    Zlib(flate2::read::ZlibDecoder<SourceTap<R>>),
    #[cfg(feature = "gzip")]
    Gzip(flate2::read::MultiGzDecoder<SourceTap<R>>),
    #[cfg(not(any(
        feature = "lz4",
        feature = "bz2",
        feature = "lzma",
        feature = "zlib",
        feature = "gzip"
    )))]
    Never(Infallible, PhantomData<R>),
}

impl<R: Read> Decoder<R> {
    #[cfg_attr(
        not(any(
            feature = "lz4",
            feature = "bz2",
            feature = "lzma",
            feature = "zlib",
            feature = "gzip"
        )),
        allow(unused_variables)
    )]
    fn new(algorithm: Algorithm, source: R) -> Self {
        let source = SourceTap::new(source);
        match algorithm {
            #[cfg(feature = "lz4")]
            Algorithm::Lz4 => Self::Lz4 {
                frame: lz4_flex::frame::FrameDecoder::new(source),
                done: false,
            },
            #[cfg(feature = "bz2")]
            Algorithm::Bz2 => Self::Bz2(bzip2::read::MultiBzDecoder::new(source)),
            #[cfg(feature = "lzma")]
            Algorithm::Lzma => Self::Lzma(xz2::read::XzDecoder::new_multi_decoder(source)),
            #[cfg(feature = "zlib")]
            Algorithm::Zlib => Self::Zlib(flate2::read::ZlibDecoder::new(source)),
            #[cfg(feature = "gzip")]
            Algorithm::Gzip => Self::Gzip(flate2::read::MultiGzDecoder::new(source)),
            #[allow(unreachable_patterns)]
            other => unreachable!("{other} source requested without codec support"),
        }
    }

    fn tap(&self) -> &SourceTap<R> {
        match self {
            #[cfg(feature = "lz4")]
            Self::Lz4 { frame, .. } => frame.get_ref(),
            #[cfg(feature = "bz2")]
            Self::Bz2(d) => d.get_ref(),
            #[cfg(feature = "lzma")]
            Self::Lzma(d) => d.get_ref(),
            #[cfg(feature = "zlib")]
            Self::Zlib(d) => d.get_ref(),
            #[cfg(feature = "gzip")]
            Self::Gzip(d) => d.get_ref(),
            #[cfg(not(any(
                feature = "lz4",
                feature = "bz2",
                feature = "lzma",
                feature = "zlib",
                feature = "gzip"
            )))]
            Self::Never(never, _) => match *never {},
        }
    }

    fn tap_mut(&mut self) -> &mut SourceTap<R> {
        match self {
            #[cfg(feature = "lz4")]
            Self::Lz4 { frame, .. } => frame.get_mut(),
            #[cfg(feature = "bz2")]
            Self::Bz2(d) => d.get_mut(),
            #[cfg(feature = "lzma")]
            Self::Lzma(d) => d.get_mut(),
            #[cfg(feature = "zlib")]
            Self::Zlib(d) => d.get_mut(),
            #[cfg(feature = "gzip")]
            Self::Gzip(d) => d.get_mut(),
            #[cfg(not(any(
                feature = "lz4",
                feature = "bz2",
                feature = "lzma",
                feature = "zlib",
                feature = "gzip"
            )))]
            Self::Never(never, _) => match *never {},
        }
    }
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            #[cfg(feature = "lz4")]
            Self::Lz4 { frame, done } => {
                if *done {
                    return Ok(0);
                }
                let n = frame.read(buf)?;
                if n == 0 && !buf.is_empty() {
                    // FrameDecoder reports a missing end mark as a clean end.
                    // A complete frame is read exactly, so hitting EOF here
                    // means the frame was cut short.
                    if frame.get_ref().eof {
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "lz4 frame ends before its end mark",
                        ));
                    }
                    *done = true;
                }
                Ok(n)
            }
            #[cfg(feature = "bz2")]
            Self::Bz2(d) => d.read(buf),
            #[cfg(feature = "lzma")]
            Self::Lzma(d) => d.read(buf),
            #[cfg(feature = "zlib")]
            Self::Zlib(d) => d.read(buf),
            #[cfg(feature = "gzip")]
            Self::Gzip(d) => d.read(buf),
            #[cfg(not(any(
                feature = "lz4",
                feature = "bz2",
                feature = "lzma",
                feature = "zlib",
                feature = "gzip"
            )))]
            Self::Never(never, _) => match *never {},
        }
    }
}

/// Sits between a decoder and the caller's source.
struct SourceTap<R: Read> {
    inner: R,
    consumed: u64,
    eof: bool,
    failure: Option<io::Error>,
}

impl<R: Read> SourceTap<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            consumed: 0,
            eof: false,
            failure: None,
        }
    }

    fn saw_empty_input(&self) -> bool {
        self.eof && self.consumed == 0
    }
}

impl<R: Read> Read for SourceTap<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Ok(0) if !buf.is_empty() => {
                self.eof = true;
                Ok(0)
            }
            Ok(n) => {
                self.consumed += n as u64;
                Ok(n)
            }
            Err(e) => Err(park(&mut self.failure, e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
