// Streaming wrappers: sink output must decode with the one-shot decoder,
// wrappers must finalize on every exit path, and the caller keeps the sink.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

use doccodec::compress::{
    Algorithm, CodecError, available, compress_bytes, compress_ctx, decompress_bytes,
    decompress_ctx, with_compressing_sink,
};

fn repetitive_data(pattern: &[u8], total: usize) -> Vec<u8> {
    pattern.iter().copied().cycle().take(total).collect()
}

#[test]
fn streaming_equivalence_in_memory() {
    let data = repetitive_data(b"points and colors, ", 200_000);
    for a in available().algorithms() {
        let factory = compress_ctx(Some(a.as_str())).unwrap().unwrap();
        let mut sink = factory.open(Vec::new());
        // Uneven chunking exercises the codecs' internal buffering.
        for chunk in data.chunks(4093) {
            sink.write_all(chunk).unwrap();
        }
        let compressed = sink.finish().unwrap();
        assert_eq!(
            decompress_bytes(&compressed, Some(a.as_str())).unwrap(),
            data,
            "{a}"
        );
    }
}

#[test]
fn streaming_into_caller_owned_file() {
    let data = repetitive_data(b"0123456789abcdef", 300_000);
    for a in available().algorithms() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(b"HDR:").unwrap();

        let factory = compress_ctx(Some(a.as_str())).unwrap().unwrap();
        let mut sink = factory.open(&mut file);
        sink.write_all(&data).unwrap();
        sink.finish().unwrap();

        // The handle is still open and usable by the caller.
        file.write_all(b":END").unwrap();
        file.seek(SeekFrom::Start(0)).unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();

        assert_eq!(&contents[..4], b"HDR:");
        assert_eq!(&contents[contents.len() - 4..], b":END");
        let body = &contents[4..contents.len() - 4];
        assert_eq!(decompress_bytes(body, Some(a.as_str())).unwrap(), data, "{a}");
    }
}

#[test]
fn decompressing_source_reads_one_shot_output() {
    let data = repetitive_data(b"mesh url ", 100_000);
    for a in available().algorithms() {
        let compressed = compress_bytes(&data, Some(a.as_str())).unwrap();
        let factory = decompress_ctx(Some(a.as_str())).unwrap().unwrap();
        let mut source = factory.open(&compressed[..]);
        let mut out = Vec::new();
        let mut buf = [0u8; 777];
        loop {
            let n = source.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, data, "{a}");
    }
}

#[test]
fn no_factory_without_algorithm() {
    assert!(compress_ctx(None).unwrap().is_none());
    assert!(compress_ctx(Some("")).unwrap().is_none());
    assert!(compress_ctx(Some("bogus")).unwrap().is_none());
    assert!(decompress_ctx(None).unwrap().is_none());
}

/// A sink that fails after accepting `limit` bytes.
struct FlakySink {
    data: Vec<u8>,
    limit: usize,
}

impl Write for FlakySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.data.len() >= self.limit {
            return Err(io::Error::other("disk full"));
        }
        let n = buf.len().min(self.limit - self.data.len());
        self.data.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn sink_errors_surface_as_io() {
    let data: Vec<u8> = (0..2_000_000u32).map(|i| (i.wrapping_mul(2654435761) >> 24) as u8).collect();
    for a in available().algorithms() {
        let factory = compress_ctx(Some(a.as_str())).unwrap().unwrap();
        let mut sink = factory.open(FlakySink {
            data: Vec::new(),
            limit: 64,
        });
        let wrote = sink.write_all(&data);
        let finished = match wrote {
            Ok(()) => sink.finish().map(|_| ()),
            Err(e) => Err(CodecError::Io(e)),
        };
        match finished {
            Err(CodecError::Io(e)) => assert_eq!(e.to_string(), "disk full", "{a}"),
            other => panic!("{a}: expected the sink's own error, got {other:?}"),
        }
    }
}

/// A source that hands out `data` and then fails instead of reporting EOF.
struct SeveredSource<'a> {
    data: &'a [u8],
}

impl Read for SeveredSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.data.is_empty() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "upstream closed"));
        }
        let n = buf.len().min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

#[test]
fn source_errors_surface_as_io() {
    let data = repetitive_data(b"tensor doc ", 120_000);
    for a in available().algorithms() {
        let compressed = compress_bytes(&data, Some(a.as_str())).unwrap();
        let factory = decompress_ctx(Some(a.as_str())).unwrap().unwrap();
        let source = factory.open(SeveredSource {
            data: &compressed[..compressed.len() / 2],
        });
        match source.read_all() {
            Err(CodecError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe, "{a}"),
            other => panic!("{a}: expected Io, got {other:?}"),
        }
    }
}

#[test]
fn truncated_source_is_corrupt() {
    let data = repetitive_data(b"colors points ", 120_000);
    for a in available().algorithms() {
        let compressed = compress_bytes(&data, Some(a.as_str())).unwrap();
        let factory = decompress_ctx(Some(a.as_str())).unwrap().unwrap();
        let err = factory
            .open(&compressed[..compressed.len() - 1])
            .read_all()
            .unwrap_err();
        assert!(err.is_corrupt(), "{a}: {err}");
    }
}

#[test]
fn scoped_helper_returns_value_and_sink() {
    for a in available().algorithms() {
        let factory = compress_ctx(Some(a.as_str())).unwrap().unwrap();
        let (written, out) = with_compressing_sink(&factory, Vec::new(), |w| {
            w.write_all(b"scoped payload")?;
            Ok(w.bytes_in())
        })
        .unwrap();
        assert_eq!(written, 14);
        assert_eq!(
            decompress_bytes(&out, Some(a.as_str())).unwrap(),
            b"scoped payload"
        );
    }
}

#[test]
fn dropped_sink_still_writes_trailer() {
    for a in available().algorithms() {
        let mut out = Vec::new();
        {
            let factory = compress_ctx(Some(a.as_str())).unwrap().unwrap();
            let mut sink = factory.open(&mut out);
            sink.write_all(b"early return").unwrap();
            assert_eq!(sink.algorithm(), a);
        }
        assert_eq!(decompress_bytes(&out, Some(a.as_str())).unwrap(), b"early return");
    }
}

#[cfg(feature = "gzip")]
#[test]
fn gzip_source_rejects_garbage() {
    let factory = decompress_ctx(Some("gzip")).unwrap().unwrap();
    let err = factory.open(&b"\x00\x01\x02\x03 garbage"[..]).read_all().unwrap_err();
    assert!(matches!(
        err,
        CodecError::CorruptData {
            algorithm: Algorithm::Gzip,
            ..
        }
    ));
}
