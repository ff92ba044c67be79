pub mod arena;
pub mod backend;
pub mod draw;
pub mod error;
pub mod face_allocator;
pub mod gpu;
pub mod vertex;

pub use arena::SlotArena;
pub use backend::{MemoryBackend, RenderBackend};
pub use draw::{ChunkDraws, ChunkRenderer, DrawDescriptor};
pub use error::MeshError;
pub use face_allocator::{FaceAllocator, FaceRecord, Region};
pub use gpu::WgpuBackend;
pub use vertex::Vertex;
