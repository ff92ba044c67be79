pub mod config;
pub mod constants;
pub mod error;
pub mod material;
pub mod math;
pub mod side;
pub mod types;

pub use config::EngineConfig;
pub use error::CoreError;
pub use material::{MaterialDef, MaterialTable, OpacityClass};
pub use side::{Side, ALL_SIDES};
pub use types::{ChunkPos, Voxel};
