use lz4_flex::block::{self, DecompressError};
use snafu::{ensure, ResultExt, Snafu};

#[derive(Debug, Snafu)]
#[snafu(module)]
pub enum CompressError {
    #[snafu(display("chunk size must be greater than zero"))]
    ZeroChunkSize,
    #[snafu(display("{len} bytes exceed the 32-bit range of the chunk table"))]
    TooLarge { len: usize },
    #[snafu(display("chunk table has {actual} entries, {expected} expected for the data size"))]
    ChunkCount { expected: usize, actual: usize },
    #[snafu(display("chunk {index} is not inside the compressed buffer or overlaps its predecessor"))]
    ChunkBounds { index: usize },
    #[snafu(display("chunk {index} out of range, the asset has {count} chunks"))]
    ChunkOutOfRange { index: usize, count: usize },
    #[snafu(display("buffer holds {capacity} bytes, chunk {index} needs {needed}"))]
    BufferTooSmall {
        index: usize,
        capacity: usize,
        needed: usize,
    },
    #[snafu(display("chunk {index} is corrupt"))]
    Decompress {
        index: usize,
        source: DecompressError,
    },
    #[snafu(display("chunk {index} decompressed to {actual} bytes, {expected} expected"))]
    ChunkLength {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

/// Location of one compressed chunk inside [`CompressedAsset::data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkEntry {
    pub offset: u32,
    pub size: u32,
}

/// A byte stream compressed in independently decodable chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedAsset {
    chunk_size: u32,
    uncompressed_len: usize,
    chunks: Vec<ChunkEntry>,
    data: Vec<u8>,
}

/// Splits `data` into `chunk_size` chunks and LZ4-compresses each one on its own.
///
/// Chunks never reference each other, so any chunk can be decompressed without the others.
/// A chunk whose compressed form is larger than its raw form is stored compressed anyway.
pub fn compress_chunked(data: &[u8], chunk_size: u32) -> Result<CompressedAsset, CompressError> {
    ensure!(chunk_size > 0, compress_error::ZeroChunkSizeSnafu);
    ensure!(
        u32::try_from(data.len()).is_ok(),
        compress_error::TooLargeSnafu { len: data.len() }
    );

    let mut chunks = Vec::with_capacity(data.len().div_ceil(chunk_size as usize));
    let mut compressed = Vec::new();

    for chunk in data.chunks(chunk_size as usize) {
        let block = block::compress(chunk);
        let offset = compressed.len();
        ensure!(
            u32::try_from(offset + block.len()).is_ok(),
            compress_error::TooLargeSnafu {
                len: offset + block.len()
            }
        );

        chunks.push(ChunkEntry {
            offset: offset as u32,
            size: block.len() as u32,
        });
        compressed.extend_from_slice(&block);
    }

    tracing::debug!(
        chunk_size,
        chunks = chunks.len(),
        raw = data.len(),
        compressed = compressed.len(),
        "compressed chunked stream"
    );

    Ok(CompressedAsset {
        chunk_size,
        uncompressed_len: data.len(),
        chunks,
        data: compressed,
    })
}

impl CompressedAsset {
    /// Reassembles an asset from a stored chunk table.
    ///
    /// Chunk sizes are implied by consecutive offsets, the last chunk running to the end of
    /// `data`.
    pub fn from_offsets(
        chunk_size: u32,
        uncompressed_len: usize,
        offsets: &[u32],
        data: Vec<u8>,
    ) -> Result<Self, CompressError> {
        ensure!(chunk_size > 0, compress_error::ZeroChunkSizeSnafu);

        let expected = uncompressed_len.div_ceil(chunk_size as usize);
        ensure!(
            offsets.len() == expected,
            compress_error::ChunkCountSnafu {
                expected,
                actual: offsets.len()
            }
        );

        let ends = offsets
            .iter()
            .skip(1)
            .copied()
            .chain(u32::try_from(data.len()).ok());
        let mut chunks = Vec::with_capacity(offsets.len());
        for (index, (&offset, end)) in offsets.iter().zip(ends).enumerate() {
            ensure!(
                offset < end && end as usize <= data.len(),
                compress_error::ChunkBoundsSnafu { index }
            );
            chunks.push(ChunkEntry {
                offset,
                size: end - offset,
            });
        }
        ensure!(
            chunks.len() == offsets.len(),
            compress_error::TooLargeSnafu { len: data.len() }
        );

        Ok(Self {
            chunk_size,
            uncompressed_len,
            chunks,
            data,
        })
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    pub fn uncompressed_len(&self) -> usize {
        self.uncompressed_len
    }

    pub fn chunks(&self) -> &[ChunkEntry] {
        &self.chunks
    }

    /// The concatenated compressed chunks.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of bytes chunk `index` decompresses to.
    pub fn chunk_len(&self, index: usize) -> usize {
        let start = index * self.chunk_size as usize;
        (self.uncompressed_len - start).min(self.chunk_size as usize)
    }

    /// Decompresses chunk `index` into the front of `buf`, returning the number of bytes
    /// written. A buffer of `chunk_size` bytes always suffices.
    pub fn decompress_chunk(&self, index: usize, buf: &mut [u8]) -> Result<usize, CompressError> {
        let &ChunkEntry { offset, size } = self.chunks.get(index).ok_or(
            CompressError::ChunkOutOfRange {
                index,
                count: self.chunks.len(),
            },
        )?;

        let needed = self.chunk_len(index);
        ensure!(
            buf.len() >= needed,
            compress_error::BufferTooSmallSnafu {
                index,
                capacity: buf.len(),
                needed
            }
        );

        let input = &self.data[offset as usize..(offset + size) as usize];
        let written = block::decompress_into(input, &mut buf[..needed])
            .context(compress_error::DecompressSnafu { index })?;
        ensure!(
            written == needed,
            compress_error::ChunkLengthSnafu {
                index,
                expected: needed,
                actual: written
            }
        );

        Ok(written)
    }

    /// Decompresses every chunk in table order.
    pub fn decompress_all(&self) -> Result<Vec<u8>, CompressError> {
        let mut out = Vec::with_capacity(self.uncompressed_len);
        let mut buf = vec![0; self.chunk_size as usize];

        for index in 0..self.chunks.len() {
            let written = self.decompress_chunk(index, &mut buf)?;
            out.extend_from_slice(&buf[..written]);
        }

        Ok(out)
    }
}
