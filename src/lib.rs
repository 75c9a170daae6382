//! doccodec: byte compression dispatch for serialized documents.
//!
//! The crate provides:
//! - Identifier-keyed one-shot compression (`compress`)
//! - Streaming wrappers over caller-owned sinks and sources (`compress::stream`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! Supported identifiers are `"lz4"`, `"bz2"`, `"lzma"`, `"zlib"` and `"gzip"`.
//! Anything else, including no identifier, means "no compression" and data is
//! returned unchanged.
//!
//! # Quick Start
//!
//! ```no_run
//! use doccodec::compress::{compress_bytes, decompress_bytes};
//!
//! let packed = compress_bytes(b"aaaaaaaaaa", Some("zlib")).unwrap();
//! let unpacked = decompress_bytes(&packed, Some("zlib")).unwrap();
//! assert_eq!(unpacked, b"aaaaaaaaaa");
//! ```

pub mod compress;
pub mod io;

#[cfg(feature = "cli")]
pub mod cli;
