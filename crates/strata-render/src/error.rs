use strata_core::{CoreError, Side};

/// Errors raised while maintaining a chunk's face buffers.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("face {side:?} of voxel {voxel} already exists")]
    FaceExists { voxel: u32, side: Side },

    #[error("face {side:?} of voxel {voxel} points at unoccupied slot {slot}")]
    DanglingOffset { voxel: u32, side: Side, slot: u32 },

    #[error("chunk face buffer full ({0} faces)")]
    RegionFull(u32),

    #[error("GPU slot arena exhausted ({capacity} slots)")]
    ArenaExhausted { capacity: u32 },

    /// Unknown material or unresolved texture coordinates.
    #[error(transparent)]
    Core(#[from] CoreError),
}
