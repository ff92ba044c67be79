use std::collections::HashMap;
use std::sync::Arc;

use strata_core::ChunkPos;

use crate::chunk::Chunk;

/// Work item for the loader thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkRequest {
    Load(ChunkPos),
    Unload(ChunkPos),
}

impl ChunkRequest {
    pub fn pos(self) -> ChunkPos {
        match self {
            ChunkRequest::Load(pos) | ChunkRequest::Unload(pos) => pos,
        }
    }
}

/// Lifecycle state of a mapped position.
#[derive(Clone)]
pub enum ChunkState {
    /// Load queued or running; no data yet.
    Loading,
    Active(Arc<Chunk>),
}

#[derive(Clone)]
pub struct ChunkEntry {
    pub state: ChunkState,
    /// An unload for this position is queued and has not been cancelled.
    pub unload_pending: bool,
}

/// Positions that are loading or active, plus the current window center.
#[derive(Default)]
pub struct ChunkMap {
    entries: HashMap<ChunkPos, ChunkEntry>,
    center: Option<ChunkPos>,
}

impl ChunkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last window center, if any.
    pub fn center(&self) -> Option<ChunkPos> {
        self.center
    }

    /// Move the window to `center` and return the requests that bring the map
    /// in line with it. Returns nothing when the center is unchanged.
    ///
    /// Positions leaving the window get an unload; positions coming back
    /// before their unload ran have it cancelled; missing positions get a
    /// loading placeholder and a load, scanned z then x.
    pub fn plan_window(&mut self, center: ChunkPos, radius: i32) -> Vec<ChunkRequest> {
        if self.center == Some(center) {
            return Vec::new();
        }
        self.center = Some(center);

        let mut requests = Vec::new();
        let mut leaving: Vec<ChunkPos> = Vec::new();
        for (pos, entry) in self.entries.iter_mut() {
            let inside = pos.distance(center) <= radius;
            if inside {
                entry.unload_pending = false;
            } else if !entry.unload_pending {
                entry.unload_pending = true;
                leaving.push(*pos);
            }
        }
        leaving.sort();
        requests.extend(leaving.into_iter().map(ChunkRequest::Unload));

        for z in center.z - radius..=center.z + radius {
            for x in center.x - radius..=center.x + radius {
                let pos = ChunkPos::new(x, z);
                if !self.entries.contains_key(&pos) {
                    self.entries.insert(
                        pos,
                        ChunkEntry {
                            state: ChunkState::Loading,
                            unload_pending: false,
                        },
                    );
                    requests.push(ChunkRequest::Load(pos));
                }
            }
        }
        requests
    }

    /// Queue an unload for every entry that does not have one yet.
    pub fn plan_flush(&mut self) -> Vec<ChunkRequest> {
        let mut requests: Vec<ChunkRequest> = self
            .entries
            .iter_mut()
            .filter(|(_, entry)| !entry.unload_pending)
            .map(|(pos, entry)| {
                entry.unload_pending = true;
                ChunkRequest::Unload(*pos)
            })
            .collect();
        requests.sort_by_key(|r| r.pos());
        requests
    }

    pub fn entry(&self, pos: ChunkPos) -> Option<&ChunkEntry> {
        self.entries.get(&pos)
    }

    /// The chunk at `pos` if it is active.
    pub fn active(&self, pos: ChunkPos) -> Option<&Arc<Chunk>> {
        match self.entries.get(&pos) {
            Some(ChunkEntry {
                state: ChunkState::Active(chunk),
                ..
            }) => Some(chunk),
            _ => None,
        }
    }

    /// Replace a loading placeholder with its chunk. Keeps any pending unload.
    /// Returns false if the position is no longer mapped.
    pub fn activate(&mut self, chunk: Arc<Chunk>) -> bool {
        match self.entries.get_mut(&chunk.pos()) {
            Some(entry) => {
                entry.state = ChunkState::Active(chunk);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, pos: ChunkPos) -> Option<ChunkEntry> {
        self.entries.remove(&pos)
    }

    /// Sorted positions of active chunks.
    pub fn active_positions(&self) -> Vec<ChunkPos> {
        let mut positions: Vec<ChunkPos> = self
            .entries
            .iter()
            .filter(|(_, e)| matches!(e.state, ChunkState::Active(_)))
            .map(|(pos, _)| *pos)
            .collect();
        positions.sort();
        positions
    }

    pub fn loading_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e.state, ChunkState::Loading))
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
