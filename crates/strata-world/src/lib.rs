pub mod chunk;
pub mod chunk_map;
pub mod error;
pub mod observer;
pub mod streaming;
pub mod terrain;

pub use chunk::{Chunk, Selection};
pub use chunk_map::{ChunkEntry, ChunkMap, ChunkRequest, ChunkState};
pub use error::WorldError;
pub use observer::{Observer, SharedObserver};
pub use streaming::StreamingManager;
pub use terrain::TerrainGenerator;
