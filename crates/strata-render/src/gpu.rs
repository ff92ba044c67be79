use std::any::Any;
use std::sync::Arc;

use strata_core::constants::{MAX_INDICES, MAX_VERTICES};

use crate::backend::RenderBackend;
use crate::draw::DrawDescriptor;
use crate::vertex::Vertex;

/// Backend writing into one wgpu vertex buffer and one index buffer sized for
/// every arena slot. Buffers are created once, at construction.
pub struct WgpuBackend {
    queue: Arc<wgpu::Queue>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
}

impl WgpuBackend {
    pub fn new(device: &wgpu::Device, queue: Arc<wgpu::Queue>, slots: u32) -> Self {
        let vertex_size =
            slots as u64 * MAX_VERTICES as u64 * std::mem::size_of::<Vertex>() as u64;
        let index_size = slots as u64 * MAX_INDICES as u64 * std::mem::size_of::<u32>() as u64;

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("chunk-vertex-buffer"),
            size: vertex_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("chunk-index-buffer"),
            size: index_size,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        log::debug!(
            "chunk buffers: {} KiB vertices, {} KiB indices",
            vertex_size / 1024,
            index_size / 1024
        );

        Self {
            queue,
            vertex_buffer,
            index_buffer,
        }
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    /// Record `draws` into a pass whose pipeline is already set.
    pub fn encode(&self, pass: &mut wgpu::RenderPass<'_>, draws: &[DrawDescriptor]) {
        if draws.is_empty() {
            return;
        }
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        for draw in draws {
            pass.draw_indexed(draw.indices(), draw.base_vertex, 0..1);
        }
    }
}

impl RenderBackend for WgpuBackend {
    fn write_vertices(&mut self, byte_offset: u64, data: &[u8]) {
        self.queue.write_buffer(&self.vertex_buffer, byte_offset, data);
    }

    fn write_indices(&mut self, byte_offset: u64, data: &[u8]) {
        self.queue.write_buffer(&self.index_buffer, byte_offset, data);
    }

    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
