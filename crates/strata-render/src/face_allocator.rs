//! Incremental face buffers for one chunk.
//!
//! A chunk owns one slot of the shared vertex/index buffers. The slot holds
//! `MAX_FACES` quads split into two dense regions: opaque faces grow up from
//! face 0, transparent faces grow down from face `MAX_FACES - 1`. Faces are
//! added at the end of their region and removed by moving the region's last
//! quad into the hole, so every edit costs at most one quad copy.
//!
//! Each region keeps a reverse list (face slot -> owning voxel and side) and a
//! CPU copy of its quads; the copy supplies the moved quad's vertices on
//! swap-removal without reading back from the GPU.

use std::collections::HashMap;

use glam::IVec3;
use strata_core::constants::{
    CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, INDICES_PER_FACE, MAX_FACES, VERTICES_PER_FACE,
};
use strata_core::math::{in_chunk, local_from_index, voxel_index};
use strata_core::{ChunkPos, MaterialTable, OpacityClass, Side, Voxel, ALL_SIDES};

use crate::draw::{ChunkDraws, ChunkRenderer, DrawDescriptor};
use crate::error::MeshError;
use crate::vertex::{face_quad, Vertex};

/// Owner of one occupied face slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceRecord {
    pub voxel: u32,
    pub side: Side,
}

/// Which half of the chunk's face buffer a face lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Opaque,
    Transparent,
}

impl Region {
    fn for_alpha(alpha: f32) -> Self {
        if OpacityClass::of(alpha) == OpacityClass::Opaque {
            Region::Opaque
        } else {
            Region::Transparent
        }
    }

    /// Face slot of the `index`-th entry of this region.
    fn slot(self, index: usize) -> u32 {
        match self {
            Region::Opaque => index as u32,
            Region::Transparent => MAX_FACES - 1 - index as u32,
        }
    }
}

#[derive(Debug, Default)]
struct RegionStore {
    records: Vec<FaceRecord>,
    quads: Vec<[Vertex; 4]>,
    vertex_count: u32,
    index_count: u32,
}

impl RegionStore {
    fn len(&self) -> u32 {
        self.records.len() as u32
    }
}

pub struct FaceAllocator {
    chunk: ChunkPos,
    slot: u32,
    offsets: HashMap<FaceRecord, u32>,
    opaque: RegionStore,
    transparent: RegionStore,
}

impl FaceAllocator {
    /// Take a buffer slot for `chunk`. No faces yet.
    pub fn new(chunk: ChunkPos, renderer: &mut ChunkRenderer) -> Result<Self, MeshError> {
        let slot = renderer.acquire_slot()?;
        Ok(Self {
            chunk,
            slot,
            offsets: HashMap::new(),
            opaque: RegionStore::default(),
            transparent: RegionStore::default(),
        })
    }

    /// Emit every visible face of `voxels` and publish the chunk's draws.
    ///
    /// Scans z, then y, then x. A side is visible when its neighbor is outside
    /// the chunk or not opaque. Faces are collected on the CPU first and each
    /// region is uploaded with one vertex write and one index write.
    pub fn build(
        &mut self,
        voxels: &[Voxel],
        materials: &MaterialTable,
        renderer: &mut ChunkRenderer,
    ) -> Result<(), MeshError> {
        for z in 0..CHUNK_SIZE_Z as i32 {
            for y in 0..CHUNK_SIZE_Y as i32 {
                for x in 0..CHUNK_SIZE_X as i32 {
                    let local = IVec3::new(x, y, z);
                    let index = voxel_index(local);
                    let voxel = &voxels[index];
                    let alpha = materials.opacity(voxel.material)?;
                    if OpacityClass::of(alpha) == OpacityClass::Air {
                        continue;
                    }
                    for side in ALL_SIDES {
                        if covered(local, side, voxels, materials)? {
                            continue;
                        }
                        let tex_coords = materials.tex_coords(voxel, side)?;
                        self.push_face(index as u32, side, tex_coords, alpha)?;
                    }
                }
            }
        }
        log::trace!(
            "built chunk {}: {} opaque, {} transparent faces",
            self.chunk,
            self.opaque.len(),
            self.transparent.len()
        );
        self.upload_regions(renderer);
        self.rebuild_draw_descriptors(renderer);
        Ok(())
    }

    /// Append one face at the end of the region matching `alpha`.
    pub fn add_face(
        &mut self,
        voxel: u32,
        side: Side,
        tex_coords: [[f32; 2]; 4],
        alpha: f32,
        renderer: &mut ChunkRenderer,
    ) -> Result<u32, MeshError> {
        let (face, quad) = self.push_face(voxel, side, tex_coords, alpha)?;
        renderer.write_quad(self.slot, face, &quad);
        Ok(face)
    }

    /// Record a face without writing it to the backend.
    fn push_face(
        &mut self,
        voxel: u32,
        side: Side,
        tex_coords: [[f32; 2]; 4],
        alpha: f32,
    ) -> Result<(u32, [Vertex; 4]), MeshError> {
        let key = FaceRecord { voxel, side };
        if self.offsets.contains_key(&key) {
            return Err(MeshError::FaceExists { voxel, side });
        }
        if self.opaque.len() + self.transparent.len() >= MAX_FACES {
            return Err(MeshError::RegionFull(MAX_FACES));
        }

        let region = Region::for_alpha(alpha);
        let cell = self.chunk.origin() + local_from_index(voxel as usize);
        let quad = face_quad(cell, side, tex_coords, alpha);

        let store = self.store_mut(region);
        let face = region.slot(store.records.len());
        store.records.push(key);
        store.quads.push(quad);
        store.vertex_count += VERTICES_PER_FACE;
        store.index_count += INDICES_PER_FACE;

        self.offsets.insert(key, face);
        debug_assert!(self.opaque.len() + self.transparent.len() <= MAX_FACES);
        Ok((face, quad))
    }

    /// Write both regions in full. The transparent region is stored back to
    /// front, so its quads are reversed into buffer order.
    fn upload_regions(&self, renderer: &mut ChunkRenderer) {
        if !self.opaque.quads.is_empty() {
            renderer.write_quads(self.slot, 0, &self.opaque.quads);
        }
        if !self.transparent.quads.is_empty() {
            let ordered: Vec<[Vertex; 4]> = self.transparent.quads.iter().rev().copied().collect();
            renderer.write_quads(self.slot, MAX_FACES - self.transparent.len(), &ordered);
        }
    }

    /// Remove one face, moving its region's last face into the hole.
    /// Returns false if the face was not present.
    pub fn remove_face(
        &mut self,
        voxel: u32,
        side: Side,
        renderer: &mut ChunkRenderer,
    ) -> Result<bool, MeshError> {
        let key = FaceRecord { voxel, side };
        let Some(face) = self.offsets.remove(&key) else {
            return Ok(false);
        };
        let dangling = MeshError::DanglingOffset { voxel, side, slot: face };
        let (region, index) = self.locate(face).ok_or(dangling)?;

        let store = self.store_mut(region);
        if store.records[index] != key {
            return Err(MeshError::DanglingOffset { voxel, side, slot: face });
        }
        let last = store.records.len() - 1;
        store.records.swap_remove(index);
        store.quads.swap_remove(index);
        store.vertex_count -= VERTICES_PER_FACE;
        store.index_count -= INDICES_PER_FACE;

        if index != last {
            let moved = store.records[index];
            let quad = store.quads[index];
            renderer.write_quad(self.slot, face, &quad);
            self.offsets.insert(moved, face);
        }
        Ok(true)
    }

    /// Bring one side of one voxel in line with the current grid.
    ///
    /// Removes the face if the voxel is air or its neighbor across `side` is
    /// opaque. Otherwise adds it when absent, or replaces it when its alpha or
    /// texture no longer match the voxel. Returns whether anything changed.
    pub fn update_side(
        &mut self,
        local: IVec3,
        side: Side,
        voxels: &[Voxel],
        materials: &MaterialTable,
        renderer: &mut ChunkRenderer,
    ) -> Result<bool, MeshError> {
        let index = voxel_index(local) as u32;
        let voxel = &voxels[index as usize];
        let alpha = materials.opacity(voxel.material)?;

        if OpacityClass::of(alpha) == OpacityClass::Air
            || covered(local, side, voxels, materials)?
        {
            return self.remove_face(index, side, renderer);
        }

        let tex_coords = materials.tex_coords(voxel, side)?;
        let stale = match self.quad(index, side) {
            None => false,
            Some(quad) => {
                let fresh = quad
                    .iter()
                    .zip(tex_coords.iter())
                    .all(|(v, tc)| v.alpha == alpha && v.tex_coord == *tc);
                if fresh {
                    return Ok(false);
                }
                true
            }
        };
        if stale {
            self.remove_face(index, side, renderer)?;
        }
        self.add_face(index, side, tex_coords, alpha, renderer)?;
        Ok(true)
    }

    /// All six sides of one voxel.
    pub fn update_voxel(
        &mut self,
        local: IVec3,
        voxels: &[Voxel],
        materials: &MaterialTable,
        renderer: &mut ChunkRenderer,
    ) -> Result<bool, MeshError> {
        let mut changed = false;
        for side in ALL_SIDES {
            changed |= self.update_side(local, side, voxels, materials, renderer)?;
        }
        Ok(changed)
    }

    /// Publish this chunk's opaque and transparent draws.
    pub fn rebuild_draw_descriptors(&self, renderer: &mut ChunkRenderer) {
        renderer.publish(self.chunk, self.draws());
    }

    pub fn draws(&self) -> ChunkDraws {
        ChunkDraws {
            opaque: DrawDescriptor::opaque(self.slot, self.opaque.len()),
            transparent: DrawDescriptor::transparent(self.slot, self.transparent.len()),
        }
    }

    /// Withdraw the chunk's draws and return its buffer slot.
    pub fn release(self, renderer: &mut ChunkRenderer) {
        renderer.retire(self.chunk);
        renderer.release_slot(self.slot);
    }

    pub fn chunk(&self) -> ChunkPos {
        self.chunk
    }

    /// Arena slot holding this chunk's buffers.
    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn opaque_count(&self) -> u32 {
        self.opaque.len()
    }

    pub fn transparent_count(&self) -> u32 {
        self.transparent.len()
    }

    pub fn vertex_count(&self, region: Region) -> u32 {
        self.store(region).vertex_count
    }

    pub fn index_count(&self, region: Region) -> u32 {
        self.store(region).index_count
    }

    /// Face slot currently holding `side` of `voxel`.
    pub fn face_offset(&self, voxel: u32, side: Side) -> Option<u32> {
        self.offsets.get(&FaceRecord { voxel, side }).copied()
    }

    /// Owner of a face slot, if occupied.
    pub fn record_at(&self, face: u32) -> Option<FaceRecord> {
        let (region, index) = self.locate(face)?;
        Some(self.store(region).records[index])
    }

    pub fn records(&self, region: Region) -> &[FaceRecord] {
        &self.store(region).records
    }

    /// Vertices last written for a face.
    pub fn quad(&self, voxel: u32, side: Side) -> Option<&[Vertex; 4]> {
        let face = self.face_offset(voxel, side)?;
        let (region, index) = self.locate(face)?;
        self.store(region).quads.get(index)
    }

    /// Counter and reverse-index consistency. Used by tests and debug checks.
    pub fn check_invariants(&self) -> bool {
        let counts_ok = [Region::Opaque, Region::Transparent].iter().all(|&region| {
            let store = self.store(region);
            store.vertex_count == store.len() * VERTICES_PER_FACE
                && store.index_count == store.len() * INDICES_PER_FACE
                && store.quads.len() == store.records.len()
        });
        let capacity_ok = self.opaque.len() + self.transparent.len() <= MAX_FACES;
        let occupied = (self.opaque.len() + self.transparent.len()) as usize;
        let offsets_ok = self.offsets.len() == occupied
            && self
                .offsets
                .iter()
                .all(|(record, &face)| self.record_at(face) == Some(*record));
        counts_ok && capacity_ok && offsets_ok
    }

    fn locate(&self, face: u32) -> Option<(Region, usize)> {
        if face < self.opaque.len() {
            Some((Region::Opaque, face as usize))
        } else if face < MAX_FACES && face >= MAX_FACES - self.transparent.len() {
            Some((Region::Transparent, (MAX_FACES - 1 - face) as usize))
        } else {
            None
        }
    }

    fn store(&self, region: Region) -> &RegionStore {
        match region {
            Region::Opaque => &self.opaque,
            Region::Transparent => &self.transparent,
        }
    }

    fn store_mut(&mut self, region: Region) -> &mut RegionStore {
        match region {
            Region::Opaque => &mut self.opaque,
            Region::Transparent => &mut self.transparent,
        }
    }
}

/// Whether the in-chunk neighbor across `side` is opaque.
fn covered(
    local: IVec3,
    side: Side,
    voxels: &[Voxel],
    materials: &MaterialTable,
) -> Result<bool, MeshError> {
    let neighbor = local + side.offset();
    if !in_chunk(neighbor) {
        return Ok(false);
    }
    let material = voxels[voxel_index(neighbor)].material;
    Ok(materials.class(material)? == OpacityClass::Opaque)
}
