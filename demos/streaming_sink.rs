//! Stream documents into a caller-owned file through a compressing wrapper.
//!
//! Run: cargo run --example streaming_sink -- gzip

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use doccodec::compress::{compress_ctx, decompress_ctx, with_compressing_sink};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let algorithm = std::env::args().nth(1).unwrap_or_else(|| "gzip".to_string());
    let path = std::env::temp_dir().join(format!("doccodec_demo.{algorithm}"));

    let Some(factory) = compress_ctx(Some(algorithm.as_str()))? else {
        println!("{algorithm:?} selects no compression; nothing to stream");
        return Ok(());
    };

    let mut file = File::create(&path)?;
    let (count, _) = with_compressing_sink(&factory, &mut file, |sink| {
        let mut count = 0;
        for i in 0..10_000 {
            writeln!(sink, "{{\"id\": {i}, \"url\": \"mesh_{}.obj\"}}", i % 50)?;
            count += 1;
        }
        Ok(count)
    })?;
    // The wrapper is finalized; the file handle is still ours.
    file.flush()?;
    let packed_size = file.seek(SeekFrom::End(0))?;
    drop(file);

    let source = decompress_ctx(Some(algorithm.as_str()))?.expect("same algorithm resolves on read");
    let mut text = String::new();
    source.open(File::open(&path)?).read_to_string(&mut text)?;

    println!(
        "{algorithm}: {count} documents, {} bytes plain, {packed_size} bytes on disk ({})",
        text.len(),
        path.display()
    );
    std::fs::remove_file(&path)?;
    Ok(())
}
