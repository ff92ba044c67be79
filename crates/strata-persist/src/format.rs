use strata_core::constants::VOXELS_PER_CHUNK;
use strata_core::types::Voxel;

use crate::error::PersistError;

/// Bytes per voxel record.
pub const VOXEL_RECORD_SIZE: usize = std::mem::size_of::<Voxel>();

/// Uncompressed size of one chunk grid.
pub const CHUNK_DATA_SIZE: usize = VOXELS_PER_CHUNK * VOXEL_RECORD_SIZE;

/// View a voxel grid as raw bytes.
pub fn voxels_as_bytes(voxels: &[Voxel]) -> &[u8] {
    bytemuck::cast_slice(voxels)
}

/// Rebuild a full chunk grid from raw bytes. The length must match exactly.
pub fn voxels_from_bytes(bytes: &[u8]) -> Result<Vec<Voxel>, PersistError> {
    if bytes.len() != CHUNK_DATA_SIZE {
        return Err(PersistError::SizeMismatch {
            expected: CHUNK_DATA_SIZE,
            actual: bytes.len(),
        });
    }
    // Copy into a typed buffer; the byte vector carries no alignment guarantee.
    let mut voxels = vec![Voxel::default(); VOXELS_PER_CHUNK];
    bytemuck::cast_slice_mut::<Voxel, u8>(&mut voxels).copy_from_slice(bytes);
    Ok(voxels)
}
