#![no_main]
use std::io::Write;

use doccodec::compress::{available, compress_bytes, compress_ctx, decompress_bytes};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte picks the streaming chunk size.
    let chunk = data[0] as usize + 1;
    let payload = &data[1..];

    for a in available().algorithms() {
        let id = Some(a.as_str());

        let packed = compress_bytes(payload, id).unwrap();
        assert_eq!(decompress_bytes(&packed, id).unwrap(), payload);

        let factory = compress_ctx(id).unwrap().unwrap();
        let mut sink = factory.open(Vec::new());
        for piece in payload.chunks(chunk) {
            sink.write_all(piece).unwrap();
        }
        let streamed = sink.finish().unwrap();
        assert_eq!(decompress_bytes(&streamed, id).unwrap(), payload);
    }
});
