use std::path::{Path, PathBuf};

use strata_core::constants::{CATALOG_FILE_NAME, CHUNK_FILE_EXTENSION};
use strata_core::types::{ChunkPos, Voxel};

use crate::catalog::Catalog;
use crate::compress;
use crate::error::PersistError;
use crate::format;

/// On-disk layout of one world: a directory of `"<x>,<z>.chunk"` files plus the catalog.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    dir: PathBuf,
}

impl ChunkStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding one chunk.
    pub fn chunk_path(&self, pos: ChunkPos) -> PathBuf {
        self.dir
            .join(format!("{},{}.{}", pos.x, pos.z, CHUNK_FILE_EXTENSION))
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.dir.join(CATALOG_FILE_NAME)
    }

    pub fn load_catalog(&self) -> Result<Catalog, PersistError> {
        Catalog::load(&self.catalog_path())
    }

    pub fn save_catalog(&self, catalog: &Catalog) -> Result<(), PersistError> {
        catalog.save(&self.catalog_path())
    }

    /// Compress and write one chunk grid, creating the directory on first use.
    pub fn save_chunk(&self, pos: ChunkPos, voxels: &[Voxel]) -> Result<usize, PersistError> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir).map_err(|e| PersistError::io(&self.dir, e))?;
        }
        let blob = compress::compress_chunk(format::voxels_as_bytes(voxels));
        let path = self.chunk_path(pos);
        std::fs::write(&path, &blob).map_err(|e| PersistError::io(&path, e))?;
        log::trace!("wrote chunk {} ({} bytes) to {}", pos, blob.len(), path.display());
        Ok(blob.len())
    }

    /// Read and decompress one chunk grid.
    pub fn load_chunk(&self, pos: ChunkPos) -> Result<Vec<Voxel>, PersistError> {
        if !self.dir.exists() {
            return Err(PersistError::MissingWorldDir(self.dir.clone()));
        }
        let path = self.chunk_path(pos);
        let blob = std::fs::read(&path).map_err(|e| PersistError::io(&path, e))?;
        let bytes = compress::decompress_chunk(&blob)?;
        format::voxels_from_bytes(&bytes)
    }
}
