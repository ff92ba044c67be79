use crate::error::PersistError;
use crate::format::CHUNK_DATA_SIZE;

/// Compress a raw chunk grid with LZ4. The uncompressed length is prepended.
pub fn compress_chunk(data: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(data)
}

/// Decompress a chunk block, requiring exactly `CHUNK_DATA_SIZE` bytes of output.
pub fn decompress_chunk(compressed: &[u8]) -> Result<Vec<u8>, PersistError> {
    if compressed.len() < 4 {
        return Err(PersistError::TruncatedBlock(compressed.len()));
    }
    let declared = u32::from_le_bytes([compressed[0], compressed[1], compressed[2], compressed[3]])
        as usize;
    if declared != CHUNK_DATA_SIZE {
        return Err(PersistError::SizeMismatch {
            expected: CHUNK_DATA_SIZE,
            actual: declared,
        });
    }

    let decompressed = lz4_flex::decompress(&compressed[4..], declared)
        .map_err(|e| PersistError::DecompressError(e.to_string()))?;

    if decompressed.len() != CHUNK_DATA_SIZE {
        return Err(PersistError::SizeMismatch {
            expected: CHUNK_DATA_SIZE,
            actual: decompressed.len(),
        });
    }

    Ok(decompressed)
}
