use glam::IVec3;
use strata_core::{ChunkPos, CoreError};
use strata_persist::PersistError;
use strata_render::MeshError;

/// Errors raised by chunk streaming and editing.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error("chunk {0} is not active")]
    NotActive(ChunkPos),

    #[error("cell {0} lies outside the chunk")]
    OutOfChunk(IVec3),

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Report an unrecoverable background error and stop the process.
pub(crate) fn fatal(context: &str, err: WorldError) -> ! {
    log::error!("{context}: {err}");
    std::process::exit(1)
}
