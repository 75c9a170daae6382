//! One-shot compression of a serialized document with every compiled codec.
//!
//! Run: cargo run --example basic_roundtrip

use doccodec::compress::{available, compress_bytes, decompress_bytes};

fn main() {
    let document = br#"{"id": "pc-0001", "url": "scan.ply", "tensor": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]}"#
        .repeat(200);

    println!("input: {} bytes", document.len());
    for algorithm in available().algorithms() {
        let id = Some(algorithm.as_str());
        let packed = compress_bytes(&document, id).expect("compress");
        let unpacked = decompress_bytes(&packed, id).expect("decompress");
        assert_eq!(unpacked, document);
        println!(
            "{algorithm:>5}: {:>6} bytes ({:.1}%)",
            packed.len(),
            100.0 * packed.len() as f64 / document.len() as f64
        );
    }

    // Unknown identifiers are not an error: the bytes come back unchanged.
    let same = compress_bytes(&document, Some("brotli")).expect("passthrough");
    assert_eq!(same, document);
    println!("brotli: passthrough ({} bytes)", same.len());
}
