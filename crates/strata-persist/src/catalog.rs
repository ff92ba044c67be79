use std::collections::BTreeSet;
use std::path::Path;

use strata_core::types::ChunkPos;

use crate::error::PersistError;

/// Set of chunk coordinates known to exist on disk.
///
/// Text form: one `"<x> <z>"` line per chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    positions: BTreeSet<ChunkPos>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse catalog text. Blank lines are ignored.
    pub fn parse(text: &str) -> Result<Self, PersistError> {
        let mut positions = BTreeSet::new();
        for (i, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let malformed = || PersistError::MalformedCatalog {
                line: i + 1,
                text: line.to_string(),
            };
            let mut fields = trimmed.split_whitespace();
            let x = fields.next().and_then(|f| f.parse::<i32>().ok());
            let z = fields.next().and_then(|f| f.parse::<i32>().ok());
            match (x, z, fields.next()) {
                (Some(x), Some(z), None) => {
                    positions.insert(ChunkPos::new(x, z));
                }
                _ => return Err(malformed()),
            }
        }
        Ok(Self { positions })
    }

    /// Read the catalog file. A missing file is an empty catalog.
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(PersistError::io(path, e)),
        }
    }

    /// Rewrite the catalog file in full.
    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PersistError::io(parent, e))?;
        }
        std::fs::write(path, self.to_text()).map_err(|e| PersistError::io(path, e))
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for pos in &self.positions {
            out.push_str(&format!("{} {}\n", pos.x, pos.z));
        }
        out
    }

    /// Record a chunk. Returns true if it was not already listed.
    pub fn insert(&mut self, pos: ChunkPos) -> bool {
        self.positions.insert(pos)
    }

    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.positions.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChunkPos> {
        self.positions.iter()
    }
}
