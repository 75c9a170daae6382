#![no_main]
use doccodec::compress::{Algorithm, decompress_bytes};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoders must reject malformed input with an error, never a panic.
    for a in Algorithm::ALL {
        let _ = decompress_bytes(data, Some(a.as_str()));
    }
});
