use glam::{IVec3, Vec3};

use crate::constants::{CHUNK_SIZE_X, CHUNK_SIZE_Z};

/// One voxel: a material id plus an orientation frame.
///
/// The frame decides which of the material's six texture sets lands on each
/// geometric side (see [`crate::material::resolve_texture_side`]). The record is
/// 40 bytes, `repr(C)` and `Pod`, so a chunk grid can be written to disk as raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Voxel {
    pub material: u32,
    pub direction: [i32; 3],
    pub right: [i32; 3],
    pub up: [i32; 3],
}

impl Default for Voxel {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Voxel {
    /// An unrotated voxel of the given material.
    pub const fn new(material: u32) -> Self {
        Self {
            material,
            direction: [1, 0, 0],
            right: [0, 0, 1],
            up: [0, 1, 0],
        }
    }

    /// A voxel with an explicit orientation frame.
    pub fn oriented(material: u32, direction: IVec3, right: IVec3, up: IVec3) -> Self {
        Self {
            material,
            direction: direction.to_array(),
            right: right.to_array(),
            up: up.to_array(),
        }
    }

    pub fn direction(&self) -> IVec3 {
        IVec3::from_array(self.direction)
    }

    pub fn right(&self) -> IVec3 {
        IVec3::from_array(self.right)
    }

    pub fn up(&self) -> IVec3 {
        IVec3::from_array(self.up)
    }
}

/// Chunk coordinate on the horizontal grid. One unit spans 16 voxels on x and z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing a world-space point (floor division on x and z).
    pub fn containing(world: Vec3) -> Self {
        Self {
            x: (world.x / CHUNK_SIZE_X as f32).floor() as i32,
            z: (world.z / CHUNK_SIZE_Z as f32).floor() as i32,
        }
    }

    /// World-space voxel coordinate of this chunk's (0, 0, 0) cell.
    pub fn origin(self) -> IVec3 {
        IVec3::new(self.x * CHUNK_SIZE_X as i32, 0, self.z * CHUNK_SIZE_Z as i32)
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.z.saturating_add(dz))
    }

    /// Chebyshev distance in chunk units.
    pub fn distance(self, other: ChunkPos) -> i32 {
        (self.x - other.x).abs().max((self.z - other.z).abs())
    }
}

impl std::fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}
