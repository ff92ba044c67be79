use std::any::Any;

use strata_core::constants::{INDICES_PER_FACE, MAX_INDICES, MAX_VERTICES, VERTICES_PER_FACE};

use crate::vertex::Vertex;

/// Destination of chunk vertex and index bytes.
///
/// Offsets are absolute byte offsets into one vertex buffer and one index
/// buffer shared by every slot of the arena.
pub trait RenderBackend: Send {
    fn write_vertices(&mut self, byte_offset: u64, data: &[u8]);
    fn write_indices(&mut self, byte_offset: u64, data: &[u8]);
    fn name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
}

/// Byte offset of the first vertex of face `face` in arena slot `slot`.
pub fn vertex_byte_offset(slot: u32, face: u32) -> u64 {
    let vertex = slot as u64 * MAX_VERTICES as u64 + (face * VERTICES_PER_FACE) as u64;
    vertex * std::mem::size_of::<Vertex>() as u64
}

/// Byte offset of the first index of face `face` in arena slot `slot`.
pub fn index_byte_offset(slot: u32, face: u32) -> u64 {
    let index = slot as u64 * MAX_INDICES as u64 + (face * INDICES_PER_FACE) as u64;
    index * std::mem::size_of::<u32>() as u64
}

/// CPU-side backend. Keeps every written byte so tests and headless runs can
/// inspect buffer contents.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    vertices: Vec<u8>,
    indices: Vec<u8>,
    writes: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write calls received so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn quad(&self, slot: u32, face: u32) -> Option<[Vertex; 4]> {
        let start = vertex_byte_offset(slot, face) as usize;
        let len = 4 * std::mem::size_of::<Vertex>();
        let bytes = self.vertices.get(start..start + len)?;
        let mut quad = [Vertex::default(); 4];
        bytemuck::cast_slice_mut::<Vertex, u8>(&mut quad).copy_from_slice(bytes);
        Some(quad)
    }

    pub fn quad_indices(&self, slot: u32, face: u32) -> Option<[u32; 6]> {
        let start = index_byte_offset(slot, face) as usize;
        let bytes = self.indices.get(start..start + 24)?;
        let mut out = [0u32; 6];
        bytemuck::cast_slice_mut::<u32, u8>(&mut out).copy_from_slice(bytes);
        Some(out)
    }

    fn write(target: &mut Vec<u8>, byte_offset: u64, data: &[u8]) {
        let start = byte_offset as usize;
        let end = start + data.len();
        if target.len() < end {
            target.resize(end, 0);
        }
        target[start..end].copy_from_slice(data);
    }
}

impl RenderBackend for MemoryBackend {
    fn write_vertices(&mut self, byte_offset: u64, data: &[u8]) {
        Self::write(&mut self.vertices, byte_offset, data);
        self.writes += 1;
    }

    fn write_indices(&mut self, byte_offset: u64, data: &[u8]) {
        Self::write(&mut self.indices, byte_offset, data);
        self.writes += 1;
    }

    fn name(&self) -> &'static str {
        "memory"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets() {
        assert_eq!(vertex_byte_offset(0, 1), 4 * 24);
        assert_eq!(vertex_byte_offset(1, 0), MAX_VERTICES as u64 * 24);
        assert_eq!(index_byte_offset(2, 3), (2 * MAX_INDICES as u64 + 18) * 4);
    }

    #[test]
    fn test_memory_backend_readback() {
        let mut backend = MemoryBackend::new();
        let quad = [Vertex {
            position: [1.0, 2.0, 3.0],
            alpha: 0.5,
            tex_coord: [0.25, 0.75],
        }; 4];
        backend.write_vertices(vertex_byte_offset(1, 2), bytemuck::cast_slice(&quad));
        backend.write_indices(index_byte_offset(1, 2), bytemuck::cast_slice(&[8u32, 9, 10, 8, 10, 11]));

        assert_eq!(backend.writes(), 2);
        assert_eq!(backend.quad(1, 2), Some(quad));
        assert_eq!(backend.quad_indices(1, 2), Some([8, 9, 10, 8, 10, 11]));
        assert_eq!(backend.quad(3, 0), None);
    }
}
