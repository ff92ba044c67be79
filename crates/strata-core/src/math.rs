use glam::{IVec3, Vec3};

use crate::constants::{CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, SLAB_FAR_SCALE};
use crate::types::ChunkPos;

/// Linear index of a local cell: x fastest, then y, then z.
pub fn voxel_index(local: IVec3) -> usize {
    (local.z as usize * CHUNK_SIZE_Y as usize + local.y as usize) * CHUNK_SIZE_X as usize
        + local.x as usize
}

/// Inverse of [`voxel_index`].
pub fn local_from_index(index: usize) -> IVec3 {
    let sx = CHUNK_SIZE_X as usize;
    let sy = CHUNK_SIZE_Y as usize;
    IVec3::new(
        (index % sx) as i32,
        ((index / sx) % sy) as i32,
        (index / (sx * sy)) as i32,
    )
}

/// Whether a local cell lies inside the chunk grid.
pub fn in_chunk(local: IVec3) -> bool {
    local.x >= 0
        && local.x < CHUNK_SIZE_X as i32
        && local.y >= 0
        && local.y < CHUNK_SIZE_Y as i32
        && local.z >= 0
        && local.z < CHUNK_SIZE_Z as i32
}

/// Split a world-space voxel coordinate into its owning chunk and local cell.
/// x and z use floor division; y passes through unchanged.
pub fn world_to_chunk_local(world: IVec3) -> (ChunkPos, IVec3) {
    let sx = CHUNK_SIZE_X as i32;
    let sz = CHUNK_SIZE_Z as i32;
    let chunk = ChunkPos::new(world.x.div_euclid(sx), world.z.div_euclid(sz));
    let local = IVec3::new(world.x.rem_euclid(sx), world.y, world.z.rem_euclid(sz));
    (chunk, local)
}

/// A ray with a cached reciprocal direction for slab tests.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub inv_direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
        }
    }

    /// Point at parameter `t`.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Unit box of a grid cell.
    pub fn cell(cell: IVec3) -> Self {
        let min = cell.as_vec3();
        Self::new(min, min + Vec3::ONE)
    }

    /// Slab intersection. Returns the entry parameter when the ray's line crosses the box.
    ///
    /// The entry parameter may be negative when the origin is inside or past the box;
    /// callers filter on `t > 0`. The exit parameter is widened by [`SLAB_FAR_SCALE`]
    /// so rays grazing an edge still register.
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        let mut near = f32::NEG_INFINITY;
        let mut far = f32::INFINITY;
        for axis in 0..3 {
            let t0 = (self.min[axis] - ray.origin[axis]) * ray.inv_direction[axis];
            let t1 = (self.max[axis] - ray.origin[axis]) * ray.inv_direction[axis];
            near = near.max(t0.min(t1));
            far = far.min(t0.max(t1));
        }
        far *= SLAB_FAR_SCALE;
        (far >= near).then_some(near)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::VOXELS_PER_CHUNK;

    #[test]
    fn test_index_roundtrip_corners() {
        for local in [
            IVec3::ZERO,
            IVec3::new(15, 0, 0),
            IVec3::new(0, 255, 0),
            IVec3::new(0, 0, 15),
            IVec3::new(15, 255, 15),
            IVec3::new(3, 10, 3),
        ] {
            assert_eq!(local_from_index(voxel_index(local)), local);
        }
        assert_eq!(voxel_index(IVec3::new(15, 255, 15)), VOXELS_PER_CHUNK - 1);
        assert_eq!(voxel_index(IVec3::new(1, 0, 0)), 1);
        assert_eq!(voxel_index(IVec3::new(0, 1, 0)), 16);
        assert_eq!(voxel_index(IVec3::new(0, 0, 1)), 16 * 256);
    }

    #[test]
    fn test_in_chunk_bounds() {
        assert!(in_chunk(IVec3::new(0, 0, 0)));
        assert!(in_chunk(IVec3::new(15, 255, 15)));
        assert!(!in_chunk(IVec3::new(-1, 0, 0)));
        assert!(!in_chunk(IVec3::new(0, 256, 0)));
        assert!(!in_chunk(IVec3::new(0, 0, 16)));
    }

    #[test]
    fn test_world_to_chunk_local_negative() {
        let (chunk, local) = world_to_chunk_local(IVec3::new(-1, 70, 16));
        assert_eq!(chunk, ChunkPos::new(-1, 1));
        assert_eq!(local, IVec3::new(15, 70, 0));

        let (chunk, local) = world_to_chunk_local(IVec3::new(-16, 0, -17));
        assert_eq!(chunk, ChunkPos::new(-1, -2));
        assert_eq!(local, IVec3::new(0, 0, 15));
    }

    #[test]
    fn test_ray_hits_cell_front_face() {
        let ray = Ray::new(Vec3::new(3.5, 10.5, 0.0), Vec3::Z);
        let t = Aabb::cell(IVec3::new(3, 10, 3)).intersect(&ray).expect("hit");
        assert!((t - 3.0).abs() < 1e-6, "t = {t}");
    }

    #[test]
    fn test_ray_misses_offset_cell() {
        let ray = Ray::new(Vec3::new(3.5, 10.5, 0.0), Vec3::Z);
        assert!(Aabb::cell(IVec3::new(5, 10, 3)).intersect(&ray).is_none());
    }

    #[test]
    fn test_ray_behind_origin_has_negative_entry() {
        let ray = Ray::new(Vec3::new(0.5, 0.5, 5.0), Vec3::Z);
        let t = Aabb::cell(IVec3::ZERO).intersect(&ray);
        // The line crosses the box but behind the origin: both slabs are negative.
        assert!(t.is_none() || t.is_some_and(|t| t < 0.0));
    }
}
