pub mod catalog;
pub mod compress;
pub mod error;
pub mod format;
pub mod store;

pub use catalog::Catalog;
pub use error::PersistError;
pub use store::ChunkStore;
