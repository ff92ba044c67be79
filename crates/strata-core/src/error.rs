use thiserror::Error;

use crate::side::Side;

/// Errors raised while loading or querying shared data.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to parse materials RON: {0}")]
    MaterialParse(String),

    #[error("failed to parse engine config RON: {0}")]
    ConfigParse(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("duplicate material id {0}")]
    DuplicateMaterial(u32),

    #[error("unknown material id {0}")]
    UnknownMaterial(u32),

    #[error("material {material} has no texture set for side {side:?}")]
    MissingTextures { material: u32, side: Side },
}
