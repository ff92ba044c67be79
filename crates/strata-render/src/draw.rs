use std::collections::BTreeMap;
use std::ops::Range;

use strata_core::constants::{INDICES_PER_FACE, MAX_INDICES, MAX_VERTICES};
use strata_core::ChunkPos;

use crate::arena::SlotArena;
use crate::backend::{index_byte_offset, vertex_byte_offset, RenderBackend};
use crate::error::MeshError;
use crate::vertex::{quad_indices, Vertex};

/// One indexed draw into the shared chunk buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawDescriptor {
    pub first_index: u32,
    pub index_count: u32,
    pub base_vertex: i32,
}

impl DrawDescriptor {
    /// Opaque faces occupy slots `[0, count)` of the chunk region.
    pub fn opaque(slot: u32, count: u32) -> Self {
        Self {
            first_index: slot * MAX_INDICES,
            index_count: count * INDICES_PER_FACE,
            base_vertex: (slot * MAX_VERTICES) as i32,
        }
    }

    /// Transparent faces occupy the last `count` slots of the chunk region.
    pub fn transparent(slot: u32, count: u32) -> Self {
        let index_count = count * INDICES_PER_FACE;
        Self {
            first_index: slot * MAX_INDICES + MAX_INDICES - index_count,
            index_count,
            base_vertex: (slot * MAX_VERTICES) as i32,
        }
    }

    pub fn indices(&self) -> Range<u32> {
        self.first_index..self.first_index + self.index_count
    }

    pub fn is_empty(&self) -> bool {
        self.index_count == 0
    }
}

/// The two secondary draws of one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChunkDraws {
    pub opaque: DrawDescriptor,
    pub transparent: DrawDescriptor,
}

/// Render-side state shared by every chunk: the buffer backend, the slot arena,
/// the per-chunk draws and the frame's primary draw list.
///
/// Callers hold this behind one mutex; every face write and every draw list
/// change happens under it.
pub struct ChunkRenderer {
    backend: Box<dyn RenderBackend>,
    arena: SlotArena,
    draws: BTreeMap<ChunkPos, ChunkDraws>,
    frame: Vec<DrawDescriptor>,
    opaque_in_frame: usize,
    generation: u64,
}

impl ChunkRenderer {
    pub fn new(backend: Box<dyn RenderBackend>, capacity: u32) -> Self {
        log::info!(
            "chunk renderer: {} backend, {} slots",
            backend.name(),
            capacity
        );
        Self {
            backend,
            arena: SlotArena::with_capacity(capacity),
            draws: BTreeMap::new(),
            frame: Vec::new(),
            opaque_in_frame: 0,
            generation: 0,
        }
    }

    pub fn acquire_slot(&mut self) -> Result<u32, MeshError> {
        self.arena.alloc()
    }

    pub fn release_slot(&mut self, slot: u32) {
        self.arena.free(slot);
    }

    pub fn arena(&self) -> &SlotArena {
        &self.arena
    }

    /// Write the vertex and index payload of one face slot.
    pub fn write_quad(&mut self, slot: u32, face: u32, quad: &[Vertex; 4]) {
        self.backend
            .write_vertices(vertex_byte_offset(slot, face), bytemuck::cast_slice(quad));
        self.backend.write_indices(
            index_byte_offset(slot, face),
            bytemuck::cast_slice(&quad_indices(face)),
        );
    }

    /// Write `quads` into consecutive face slots starting at `first_face`,
    /// with one vertex write and one index write.
    pub fn write_quads(&mut self, slot: u32, first_face: u32, quads: &[[Vertex; 4]]) {
        let indices: Vec<u32> = (first_face..first_face + quads.len() as u32)
            .flat_map(quad_indices)
            .collect();
        self.backend.write_vertices(
            vertex_byte_offset(slot, first_face),
            bytemuck::cast_slice(quads),
        );
        self.backend.write_indices(
            index_byte_offset(slot, first_face),
            bytemuck::cast_slice(&indices),
        );
    }

    /// Install or replace a chunk's draws. Takes effect at the next refresh.
    pub fn publish(&mut self, chunk: ChunkPos, draws: ChunkDraws) {
        self.draws.insert(chunk, draws);
    }

    /// Drop a chunk's draws.
    pub fn retire(&mut self, chunk: ChunkPos) -> Option<ChunkDraws> {
        self.draws.remove(&chunk)
    }

    pub fn chunk_draws(&self, chunk: ChunkPos) -> Option<&ChunkDraws> {
        self.draws.get(&chunk)
    }

    pub fn published_chunks(&self) -> impl Iterator<Item = &ChunkPos> {
        self.draws.keys()
    }

    /// Rebuild the primary draw list: every opaque draw, then every transparent draw.
    pub fn refresh_command_lists(&mut self) {
        self.frame.clear();
        self.frame.extend(
            self.draws
                .values()
                .map(|d| d.opaque)
                .filter(|d| !d.is_empty()),
        );
        self.opaque_in_frame = self.frame.len();
        self.frame.extend(
            self.draws
                .values()
                .map(|d| d.transparent)
                .filter(|d| !d.is_empty()),
        );
        self.generation += 1;
    }

    pub fn frame_list(&self) -> &[DrawDescriptor] {
        &self.frame
    }

    pub fn opaque_draws(&self) -> &[DrawDescriptor] {
        &self.frame[..self.opaque_in_frame]
    }

    pub fn transparent_draws(&self) -> &[DrawDescriptor] {
        &self.frame[self.opaque_in_frame..]
    }

    /// Incremented by every refresh.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn backend(&self) -> &dyn RenderBackend {
        self.backend.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    #[test]
    fn test_descriptor_ranges() {
        let opaque = DrawDescriptor::opaque(2, 10);
        assert_eq!(opaque.first_index, 2 * MAX_INDICES);
        assert_eq!(opaque.index_count, 60);
        assert_eq!(opaque.base_vertex, (2 * MAX_VERTICES) as i32);

        let transparent = DrawDescriptor::transparent(2, 3);
        assert_eq!(transparent.indices().end, 3 * MAX_INDICES);
        assert_eq!(transparent.index_count, 18);
        assert!(DrawDescriptor::transparent(0, 0).is_empty());
    }

    #[test]
    fn test_frame_list_orders_opaque_first() {
        let mut renderer = ChunkRenderer::new(Box::new(MemoryBackend::new()), 4);
        renderer.publish(
            ChunkPos::new(0, 0),
            ChunkDraws {
                opaque: DrawDescriptor::opaque(0, 4),
                transparent: DrawDescriptor::transparent(0, 2),
            },
        );
        renderer.publish(
            ChunkPos::new(1, 0),
            ChunkDraws {
                opaque: DrawDescriptor::opaque(1, 7),
                transparent: DrawDescriptor::transparent(1, 0),
            },
        );
        renderer.refresh_command_lists();

        assert_eq!(renderer.generation(), 1);
        assert_eq!(renderer.frame_list().len(), 3);
        assert_eq!(renderer.opaque_draws().len(), 2);
        assert_eq!(renderer.transparent_draws(), &[DrawDescriptor::transparent(0, 2)]);

        renderer.retire(ChunkPos::new(0, 0));
        renderer.refresh_command_lists();
        assert_eq!(
            renderer.published_chunks().copied().collect::<Vec<_>>(),
            vec![ChunkPos::new(1, 0)]
        );
        assert_eq!(renderer.frame_list(), &[DrawDescriptor::opaque(1, 7)]);
        assert_eq!(renderer.generation(), 2);
    }

    #[test]
    fn test_write_quad_writes_slot_relative_indices() {
        let mut renderer = ChunkRenderer::new(Box::new(MemoryBackend::new()), 2);
        let quad = [Vertex::default(); 4];
        renderer.write_quad(1, 7, &quad);

        let memory = renderer
            .backend()
            .as_any()
            .downcast_ref::<MemoryBackend>()
            .expect("memory backend");
        assert_eq!(memory.quad_indices(1, 7), Some([28, 29, 30, 28, 30, 31]));
        assert_eq!(memory.quad(1, 7), Some(quad));
    }

    #[test]
    fn test_write_quads_matches_single_writes() {
        let quads: Vec<[Vertex; 4]> = (0..3)
            .map(|i| {
                let mut quad = [Vertex::default(); 4];
                quad[0].position = [i as f32, 0.0, 0.0];
                quad
            })
            .collect();
        let mut renderer = ChunkRenderer::new(Box::new(MemoryBackend::new()), 2);
        renderer.write_quads(1, 5, &quads);

        let memory = renderer
            .backend()
            .as_any()
            .downcast_ref::<MemoryBackend>()
            .expect("memory backend");
        assert_eq!(memory.writes(), 2);
        for (i, quad) in quads.iter().enumerate() {
            let face = 5 + i as u32;
            assert_eq!(memory.quad(1, face), Some(*quad));
            assert_eq!(
                memory.quad_indices(1, face),
                Some([4 * face, 4 * face + 1, 4 * face + 2, 4 * face, 4 * face + 2, 4 * face + 3])
            );
        }
    }
}
