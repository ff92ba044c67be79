use glam::{IVec3, Vec3};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use strata_core::constants::{
    CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, SELECTION_FACE_EPSILON, VOXELS_PER_CHUNK,
};
use strata_core::material::AIR;
use strata_core::math::{in_chunk, voxel_index, Aabb, Ray};
use strata_core::{ChunkPos, MaterialTable, Side, Voxel};
use strata_render::{ChunkRenderer, FaceAllocator, MeshError};

use crate::error::WorldError;

/// A voxel struck by a selection ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub chunk: ChunkPos,
    /// Cell inside `chunk`.
    pub local: IVec3,
    /// Outward normal of the struck cell face.
    pub normal: IVec3,
    /// Ray parameter of the hit.
    pub distance: f32,
}

impl Selection {
    pub fn world(&self) -> IVec3 {
        self.chunk.origin() + self.local
    }
}

/// A 16x256x16 voxel grid and its face buffers.
///
/// Lock order: `faces`, then `voxels`, then the renderer. Edits take the
/// `voxels` write lock alone and release it before any face update.
pub struct Chunk {
    pos: ChunkPos,
    voxels: RwLock<Vec<Voxel>>,
    faces: Mutex<Option<FaceAllocator>>,
}

impl Chunk {
    pub fn new(pos: ChunkPos, voxels: Vec<Voxel>) -> Self {
        debug_assert_eq!(voxels.len(), VOXELS_PER_CHUNK);
        Self {
            pos,
            voxels: RwLock::new(voxels),
            faces: Mutex::new(None),
        }
    }

    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    pub fn voxel(&self, local: IVec3) -> Option<Voxel> {
        in_chunk(local).then(|| self.voxels.read()[voxel_index(local)])
    }

    /// Overwrite one cell. Faces are not touched; follow with an update.
    pub fn set_voxel(&self, local: IVec3, voxel: Voxel) -> Result<Voxel, WorldError> {
        if !in_chunk(local) {
            return Err(WorldError::OutOfChunk(local));
        }
        let mut voxels = self.voxels.write();
        Ok(std::mem::replace(&mut voxels[voxel_index(local)], voxel))
    }

    /// Read access to the whole grid.
    pub fn voxels(&self) -> RwLockReadGuard<'_, Vec<Voxel>> {
        self.voxels.read()
    }

    /// Acquire a buffer slot and emit every visible face.
    pub fn build_mesh(
        &self,
        materials: &MaterialTable,
        renderer: &Mutex<ChunkRenderer>,
    ) -> Result<(), WorldError> {
        let mut faces = self.faces.lock();
        let voxels = self.voxels.read();
        let mut renderer = renderer.lock();
        let mut allocator = FaceAllocator::new(self.pos, &mut renderer)?;
        if let Err(e) = allocator.build(&voxels, materials, &mut renderer) {
            allocator.release(&mut renderer);
            return Err(e.into());
        }
        if let Some(old) = faces.replace(allocator) {
            old.release(&mut renderer);
        }
        Ok(())
    }

    /// Drop the face buffers and give the slot back.
    pub fn release_mesh(&self, renderer: &Mutex<ChunkRenderer>) {
        if let Some(allocator) = self.faces.lock().take() {
            allocator.release(&mut renderer.lock());
        }
    }

    pub fn has_mesh(&self) -> bool {
        self.faces.lock().is_some()
    }

    /// Run `f` against the face allocator, if built.
    pub fn with_faces<R>(&self, f: impl FnOnce(&FaceAllocator) -> R) -> Option<R> {
        self.faces.lock().as_ref().map(f)
    }

    /// Re-evaluate all six sides of one cell.
    pub fn update_voxel(
        &self,
        local: IVec3,
        materials: &MaterialTable,
        renderer: &Mutex<ChunkRenderer>,
    ) -> Result<bool, WorldError> {
        self.with_allocator(local, renderer, |faces, voxels, renderer| {
            faces.update_voxel(local, voxels, materials, renderer)
        })
    }

    /// Re-evaluate one side of one cell.
    pub fn update_side(
        &self,
        local: IVec3,
        side: Side,
        materials: &MaterialTable,
        renderer: &Mutex<ChunkRenderer>,
    ) -> Result<bool, WorldError> {
        self.with_allocator(local, renderer, |faces, voxels, renderer| {
            faces.update_side(local, side, voxels, materials, renderer)
        })
    }

    pub fn update_side_up(
        &self,
        local: IVec3,
        materials: &MaterialTable,
        renderer: &Mutex<ChunkRenderer>,
    ) -> Result<bool, WorldError> {
        self.update_side(local, Side::Up, materials, renderer)
    }

    pub fn update_side_down(
        &self,
        local: IVec3,
        materials: &MaterialTable,
        renderer: &Mutex<ChunkRenderer>,
    ) -> Result<bool, WorldError> {
        self.update_side(local, Side::Down, materials, renderer)
    }

    pub fn update_side_left(
        &self,
        local: IVec3,
        materials: &MaterialTable,
        renderer: &Mutex<ChunkRenderer>,
    ) -> Result<bool, WorldError> {
        self.update_side(local, Side::Left, materials, renderer)
    }

    pub fn update_side_right(
        &self,
        local: IVec3,
        materials: &MaterialTable,
        renderer: &Mutex<ChunkRenderer>,
    ) -> Result<bool, WorldError> {
        self.update_side(local, Side::Right, materials, renderer)
    }

    pub fn update_side_front(
        &self,
        local: IVec3,
        materials: &MaterialTable,
        renderer: &Mutex<ChunkRenderer>,
    ) -> Result<bool, WorldError> {
        self.update_side(local, Side::Front, materials, renderer)
    }

    pub fn update_side_back(
        &self,
        local: IVec3,
        materials: &MaterialTable,
        renderer: &Mutex<ChunkRenderer>,
    ) -> Result<bool, WorldError> {
        self.update_side(local, Side::Back, materials, renderer)
    }

    fn with_allocator<F>(
        &self,
        local: IVec3,
        renderer: &Mutex<ChunkRenderer>,
        update: F,
    ) -> Result<bool, WorldError>
    where
        F: FnOnce(
            &mut FaceAllocator,
            &[Voxel],
            &mut ChunkRenderer,
        ) -> Result<bool, MeshError>,
    {
        if !in_chunk(local) {
            return Err(WorldError::OutOfChunk(local));
        }
        let mut faces = self.faces.lock();
        let Some(faces) = faces.as_mut() else {
            return Ok(false);
        };
        let voxels = self.voxels.read();
        let mut renderer = renderer.lock();
        let changed = update(faces, voxels.as_slice(), &mut *renderer)?;
        if changed {
            faces.rebuild_draw_descriptors(&mut renderer);
        }
        Ok(changed)
    }

    /// Nearest non-air cell of this chunk hit by a ray, within `max_distance`
    /// cells of the origin. `origin` is in world space.
    pub fn get_selected_block(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: i32,
    ) -> Option<Selection> {
        let chunk_origin = self.pos.origin().as_vec3();
        let relative = Vec3::new(origin.x - chunk_origin.x, origin.y, origin.z - chunk_origin.z);
        let ray = Ray::new(relative, direction);

        let size = IVec3::new(
            CHUNK_SIZE_X as i32,
            CHUNK_SIZE_Y as i32,
            CHUNK_SIZE_Z as i32,
        );
        // Float to int casts saturate, so keep the reach arithmetic saturating too.
        let center = relative.floor().as_ivec3();
        let reach = max_distance.max(0);
        let mut min = center.map(|c| c.saturating_sub(reach)).max(IVec3::ZERO);
        let mut max = center.map(|c| c.saturating_add(reach)).min(size - IVec3::ONE);
        for axis in 0..3 {
            if direction[axis] > 0.0 {
                min[axis] = center[axis].max(0);
            } else {
                max[axis] = center[axis].min(size[axis] - 1);
            }
        }

        let voxels = self.voxels.read();
        let mut best: Option<(IVec3, f32)> = None;
        for z in min.z..=max.z {
            for y in min.y..=max.y {
                for x in min.x..=max.x {
                    let cell = IVec3::new(x, y, z);
                    if voxels[voxel_index(cell)].material == AIR {
                        continue;
                    }
                    let Some(t) = Aabb::cell(cell).intersect(&ray) else {
                        continue;
                    };
                    if t > 0.0 && best.map_or(true, |(_, b)| t < b) {
                        best = Some((cell, t));
                    }
                }
            }
        }

        best.map(|(cell, t)| Selection {
            chunk: self.pos,
            local: cell,
            normal: hit_normal(ray.at(t), cell),
            distance: t,
        })
    }
}

/// Normal of the cell face containing `point`. Faces are tested in the order
/// -X, -Y, -Z, +X, +Y; anything else is +Z.
fn hit_normal(point: Vec3, cell: IVec3) -> IVec3 {
    let c = cell.as_vec3();
    let near = |a: f32, b: f32| (a - b).abs() < SELECTION_FACE_EPSILON;
    if near(point.x, c.x) {
        IVec3::NEG_X
    } else if near(point.y, c.y) {
        IVec3::NEG_Y
    } else if near(point.z, c.z) {
        IVec3::NEG_Z
    } else if near(point.x, c.x + 1.0) {
        IVec3::X
    } else if near(point.y, c.y + 1.0) {
        IVec3::Y
    } else {
        IVec3::Z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::material::{GLASS, STONE};
    use strata_render::{MemoryBackend, Region};

    fn empty_chunk(pos: ChunkPos) -> Chunk {
        Chunk::new(pos, vec![Voxel::default(); VOXELS_PER_CHUNK])
    }

    fn renderer() -> Mutex<ChunkRenderer> {
        Mutex::new(ChunkRenderer::new(Box::new(MemoryBackend::new()), 4))
    }

    #[test]
    fn test_ray_hits_single_voxel() {
        let chunk = empty_chunk(ChunkPos::new(0, 0));
        chunk.set_voxel(IVec3::new(3, 10, 3), Voxel::new(STONE)).unwrap();

        let origin = Vec3::new(0.5, 10.5, 3.5);
        let hit = chunk
            .get_selected_block(origin, Vec3::X, 5)
            .expect("hit");
        assert_eq!(hit.local, IVec3::new(3, 10, 3));
        assert_eq!(hit.normal, IVec3::NEG_X);
        assert!((hit.distance - 2.5).abs() < 1e-5);
    }

    #[test]
    fn test_ray_in_neighbor_chunk_frame() {
        let chunk = empty_chunk(ChunkPos::new(-1, 2));
        chunk.set_voxel(IVec3::new(3, 10, 3), Voxel::new(GLASS)).unwrap();

        // World cell of (3, 10, 3) is (-13, 10, 35); look down onto its top.
        let origin = Vec3::new(-12.5, 13.0, 35.5);
        let hit = chunk
            .get_selected_block(origin, Vec3::NEG_Y, 5)
            .expect("hit");
        assert_eq!(hit.world(), IVec3::new(-13, 10, 35));
        assert_eq!(hit.normal, IVec3::Y);
        assert!((hit.distance - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_ray_picks_nearest_and_respects_reach() {
        let chunk = empty_chunk(ChunkPos::new(0, 0));
        chunk.set_voxel(IVec3::new(5, 10, 3), Voxel::new(STONE)).unwrap();
        chunk.set_voxel(IVec3::new(3, 10, 3), Voxel::new(STONE)).unwrap();
        let origin = Vec3::new(0.5, 10.5, 3.5);

        let hit = chunk.get_selected_block(origin, Vec3::X, 5).expect("hit");
        assert_eq!(hit.local, IVec3::new(3, 10, 3));
        assert!(chunk.get_selected_block(origin, Vec3::X, 2).is_none());
        assert!(chunk.get_selected_block(origin, Vec3::NEG_X, 5).is_none());
    }

    #[test]
    fn test_ray_from_far_origin_finds_nothing() {
        let chunk = empty_chunk(ChunkPos::new(0, 0));
        chunk.set_voxel(IVec3::new(3, 10, 3), Voxel::new(STONE)).unwrap();

        for origin in [
            Vec3::new(f32::MAX, 10.5, 3.5),
            Vec3::new(-3.0e9, 10.5, 3.5),
            Vec3::new(0.5, 10.5, f32::MIN),
        ] {
            for direction in [Vec3::X, Vec3::NEG_X, Vec3::Z, Vec3::NEG_Z] {
                assert!(chunk.get_selected_block(origin, direction, 5).is_none());
            }
        }
    }

    #[test]
    fn test_updates_after_edit() {
        let renderer = renderer();
        let materials = MaterialTable::builtin();
        let chunk = empty_chunk(ChunkPos::new(0, 0));
        chunk.set_voxel(IVec3::new(3, 10, 3), Voxel::new(STONE)).unwrap();
        chunk.build_mesh(&materials, &renderer).unwrap();
        assert_eq!(chunk.with_faces(|f| f.opaque_count()), Some(6));

        chunk.set_voxel(IVec3::new(3, 11, 3), Voxel::new(STONE)).unwrap();
        assert!(chunk
            .update_voxel(IVec3::new(3, 11, 3), &materials, &renderer)
            .unwrap());
        assert!(chunk
            .update_side_up(IVec3::new(3, 10, 3), &materials, &renderer)
            .unwrap());
        assert!(!chunk
            .update_side_up(IVec3::new(3, 10, 3), &materials, &renderer)
            .unwrap());

        assert_eq!(chunk.with_faces(|f| f.opaque_count()), Some(10));
        assert_eq!(
            renderer
                .lock()
                .chunk_draws(ChunkPos::new(0, 0))
                .map(|d| d.opaque.index_count),
            Some(60)
        );
        assert_eq!(
            chunk.with_faces(|f| f.records(Region::Transparent).len()),
            Some(0)
        );
    }

    #[test]
    fn test_release_mesh_frees_slot() {
        let renderer = renderer();
        let materials = MaterialTable::builtin();
        let chunk = empty_chunk(ChunkPos::new(2, 2));
        chunk.build_mesh(&materials, &renderer).unwrap();
        assert!(chunk.has_mesh());
        assert_eq!(renderer.lock().arena().in_use(), 1);

        chunk.release_mesh(&renderer);
        assert!(!chunk.has_mesh());
        assert_eq!(renderer.lock().arena().in_use(), 0);
        assert!(!chunk
            .update_voxel(IVec3::new(0, 0, 0), &materials, &renderer)
            .unwrap());
    }

    #[test]
    fn test_out_of_chunk_edit_rejected() {
        let chunk = empty_chunk(ChunkPos::new(0, 0));
        assert!(matches!(
            chunk.set_voxel(IVec3::new(16, 0, 0), Voxel::new(STONE)),
            Err(WorldError::OutOfChunk(_))
        ));
        assert_eq!(chunk.voxel(IVec3::new(0, 256, 0)), None);
    }
}
