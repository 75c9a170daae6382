// Compression dispatch.
//
// - `algorithm` : Algorithm table, identifier parsing, compiled-codec set
// - `backend`   : One-shot codec backends (lz4, bz2, lzma, zlib, gzip)
// - `dispatch`  : Identifier-keyed dispatcher and free-function entry points
// - `stream`    : Streaming compress/decompress wrappers over Write/Read
// - `error`     : CodecError

pub mod algorithm;
pub mod backend;
pub mod dispatch;
pub mod error;
pub mod stream;

pub use algorithm::{Algorithm, AlgorithmSet, available};
pub use backend::{CodecBackend, backend_for};
pub use dispatch::{
    DispatchOptions, Dispatcher, UnknownAlgorithm, compress_bytes, compress_ctx, decompress_bytes,
    decompress_ctx,
};
pub use error::CodecError;
pub use stream::{
    CompressingSink, DecompressingSource, SinkFactory, SourceFactory, with_compressing_sink,
};
