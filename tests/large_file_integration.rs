use doccodec::compress::{DispatchOptions, available};
use doccodec::io::{compress_file, decompress_file};
use std::io::{Read, Seek, Write};
use tempfile::NamedTempFile;

/// Sparse file with a few deterministic marker blocks.
fn sparse_input(len: u64) -> NamedTempFile {
    let mut input = NamedTempFile::new().unwrap();
    let file = input.as_file_mut();
    file.set_len(len).unwrap();
    for (offset, marker) in [
        (64 * 1024, &b"baseline-block"[..]),
        (len / 2, b"middle-chunk"),
        (len - 16, b"tail-marker!"),
    ] {
        file.seek(std::io::SeekFrom::Start(offset)).unwrap();
        file.write_all(marker).unwrap();
    }
    file.flush().unwrap();
    input
}

fn assert_same_contents(a: &std::path::Path, b: &std::path::Path) {
    let mut fa = std::fs::File::open(a).unwrap();
    let mut fb = std::fs::File::open(b).unwrap();
    assert_eq!(fa.metadata().unwrap().len(), fb.metadata().unwrap().len());
    let mut ba = vec![0u8; 1 << 20];
    let mut bb = vec![0u8; 1 << 20];
    loop {
        let na = fa.read(&mut ba).unwrap();
        if na == 0 {
            break;
        }
        fb.read_exact(&mut bb[..na]).unwrap();
        assert!(ba[..na] == bb[..na], "file contents differ");
    }
}

#[test]
fn sixteen_mib_sparse_file_roundtrip() {
    let input = sparse_input(16 * 1024 * 1024);
    for a in available().algorithms() {
        let packed = NamedTempFile::new().unwrap();
        let output = NamedTempFile::new().unwrap();

        let c = compress_file(
            input.path(),
            packed.path(),
            Some(a.as_str()),
            DispatchOptions::default(),
        )
        .unwrap();
        assert_eq!(c.input_size, 16 * 1024 * 1024);
        assert!(c.output_size < c.input_size / 10, "{a}: {}", c.output_size);

        let d = decompress_file(
            packed.path(),
            output.path(),
            Some(a.as_str()),
            DispatchOptions::default(),
        )
        .unwrap();
        assert_eq!(d.output_size, c.input_size);
        assert_same_contents(input.path(), output.path());
    }
}

#[test]
#[ignore = "multi-GB test is opt-in due runtime and disk requirements"]
fn multi_gb_sparse_file_roundtrip() {
    let input = sparse_input(2 * 1024 * 1024 * 1024);
    for a in available().algorithms() {
        let packed = NamedTempFile::new().unwrap();
        let output = NamedTempFile::new().unwrap();
        compress_file(
            input.path(),
            packed.path(),
            Some(a.as_str()),
            DispatchOptions::default(),
        )
        .unwrap();
        let d = decompress_file(
            packed.path(),
            output.path(),
            Some(a.as_str()),
            DispatchOptions::default(),
        )
        .unwrap();
        assert_eq!(d.output_size, 2 * 1024 * 1024 * 1024);
        assert_same_contents(input.path(), output.path());
    }
}
