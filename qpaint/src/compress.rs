//! Compression of packed pixel streams.
//!
//! Two strategies are available: [`chunked`] splits a stream into fixed-size chunks that are
//! LZ4-compressed independently and indexed by a chunk table, so a device can decode any
//! chunk into a buffer of `chunk_size` bytes; [`rle`] produces a single run-length stream
//! that is decoded front to back.

pub mod chunked;
pub mod rle;

pub use chunked::{compress_chunked, ChunkEntry, CompressError, CompressedAsset};
pub use rle::{MarkerRle, RleDecodeContext, RleError};

/// Default number of uncompressed bytes per chunk.
pub const DEFAULT_CHUNK_SIZE: u32 = 128;

/// A monolithic byte-stream compressor.
///
/// Implementations must satisfy `decode(&encode(data)) == data` for every input.
pub trait StreamCodec {
    type Error;

    fn encode(&self, data: &[u8]) -> Vec<u8>;
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, Self::Error>;
}
