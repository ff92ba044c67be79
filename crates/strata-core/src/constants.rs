//! Shared constants for the voxel grid, the per-chunk face buffers and streaming.

/// Chunk extent along x, in voxels.
pub const CHUNK_SIZE_X: u32 = 16;

/// Chunk extent along y, in voxels.
pub const CHUNK_SIZE_Y: u32 = 256;

/// Chunk extent along z, in voxels.
pub const CHUNK_SIZE_Z: u32 = 16;

/// Total voxels per chunk (16 * 256 * 16).
pub const VOXELS_PER_CHUNK: usize = (CHUNK_SIZE_X * CHUNK_SIZE_Y * CHUNK_SIZE_Z) as usize;

/// Opacity tolerance. Below this a material is air, above `1 - OPACITY_EPSILON` it is opaque.
pub const OPACITY_EPSILON: f32 = f32::EPSILON;

/// Face slots available to one chunk, shared by the opaque and transparent regions.
/// Boundary faces are always emitted, so a generated terrain chunk uses about 8k.
pub const MAX_FACES: u32 = (VOXELS_PER_CHUNK as u32) * 3 / 16;

/// Vertices per quad.
pub const VERTICES_PER_FACE: u32 = 4;

/// Indices per quad (two triangles).
pub const INDICES_PER_FACE: u32 = 6;

/// Vertex capacity of one chunk slot.
pub const MAX_VERTICES: u32 = MAX_FACES * VERTICES_PER_FACE;

/// Index capacity of one chunk slot.
pub const MAX_INDICES: u32 = MAX_FACES * INDICES_PER_FACE;

/// Distance threshold used to decide which cell face a selection ray struck.
pub const SELECTION_FACE_EPSILON: f32 = 1e-5;

/// Widening factor applied to the exit distance of a ray/box test.
pub const SLAB_FAR_SCALE: f32 = 1.000_000_24;

/// Default window radius in chunks.
pub const DEFAULT_RENDER_DISTANCE: i32 = 5;

/// Default window controller polling period.
pub const DEFAULT_CONTROLLER_INTERVAL_MS: u64 = 200;

/// Default reach of voxel selection, in voxels.
pub const DEFAULT_MAX_SELECTION_DISTANCE: i32 = 5;

/// Default terrain noise seed.
pub const DEFAULT_SEED: u64 = 1337;

/// Name of the per-world catalog of persisted chunk coordinates.
pub const CATALOG_FILE_NAME: &str = "saved.txt";

/// Extension of per-chunk save files.
pub const CHUNK_FILE_EXTENSION: &str = "chunk";
