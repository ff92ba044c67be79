use std::path::PathBuf;

/// Errors that can occur while reading or writing chunk data.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("save directory {0} does not exist")]
    MissingWorldDir(PathBuf),

    #[error("compressed block too small ({0} bytes)")]
    TruncatedBlock(usize),

    #[error("LZ4 decompression failed: {0}")]
    DecompressError(String),

    #[error("decompressed chunk size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("malformed catalog line {line}: {text:?}")]
    MalformedCatalog { line: usize, text: String },
}

impl PersistError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistError::Io {
            path: path.into(),
            source,
        }
    }
}
