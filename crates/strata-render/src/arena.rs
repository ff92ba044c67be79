use crate::error::MeshError;

/// Fixed pool of GPU buffer slots, one per active chunk.
///
/// Slots are handed out lowest first from a stack of free indices.
#[derive(Debug, Clone)]
pub struct SlotArena {
    free_slots: Vec<u32>,
    capacity: u32,
}

impl SlotArena {
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            free_slots: (0..capacity).rev().collect(),
            capacity,
        }
    }

    pub fn alloc(&mut self) -> Result<u32, MeshError> {
        self.free_slots.pop().ok_or(MeshError::ArenaExhausted {
            capacity: self.capacity,
        })
    }

    pub fn free(&mut self, slot: u32) {
        debug_assert!(slot < self.capacity, "slot {slot} out of range");
        debug_assert!(!self.free_slots.contains(&slot), "slot {slot} freed twice");
        self.free_slots.push(slot);
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn available(&self) -> u32 {
        self.free_slots.len() as u32
    }

    pub fn in_use(&self) -> u32 {
        self.capacity - self.available()
    }
}
