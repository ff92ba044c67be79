use glam::Vec3;
use parking_lot::Mutex;
use strata_core::ChunkPos;

/// Where the viewer is and where it looks.
pub trait Observer: Send + Sync {
    fn position(&self) -> Vec3;
    fn direction(&self) -> Vec3;

    /// Chunk containing the observer.
    fn current_chunk(&self) -> ChunkPos {
        ChunkPos::containing(self.position())
    }
}

/// Observer whose pose is set from another thread.
#[derive(Debug)]
pub struct SharedObserver {
    pose: Mutex<(Vec3, Vec3)>,
}

impl SharedObserver {
    pub fn new(position: Vec3, direction: Vec3) -> Self {
        Self {
            pose: Mutex::new((position, direction)),
        }
    }

    pub fn set_position(&self, position: Vec3) {
        self.pose.lock().0 = position;
    }

    pub fn set_direction(&self, direction: Vec3) {
        self.pose.lock().1 = direction;
    }

    pub fn set_pose(&self, position: Vec3, direction: Vec3) {
        *self.pose.lock() = (position, direction);
    }
}

impl Observer for SharedObserver {
    fn position(&self) -> Vec3 {
        self.pose.lock().0
    }

    fn direction(&self) -> Vec3 {
        self.pose.lock().1
    }
}
