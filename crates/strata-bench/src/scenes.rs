use glam::{IVec3, Vec3};
use strata_core::material::{GLASS, STONE};
use strata_core::ChunkPos;

/// A scripted observer walk plus an edit burst at the end of it.
pub struct SceneConfig {
    pub name: &'static str,
    pub render_distance: i32,
    /// Chunks the observer visits in order, starting from the origin window.
    pub path: Vec<ChunkPos>,
    /// Voxels written after the walk settles.
    pub edits: u32,
}

/// Standard suite: window fill at two radii, a straight walk, a diagonal
/// walk and an edit-heavy scene.
pub fn standard_scenes() -> Vec<SceneConfig> {
    vec![
        SceneConfig {
            name: "fill-r2",
            render_distance: 2,
            path: Vec::new(),
            edits: 0,
        },
        SceneConfig {
            name: "fill-r3",
            render_distance: 3,
            path: Vec::new(),
            edits: 0,
        },
        SceneConfig {
            name: "walk-x",
            render_distance: 2,
            path: straight_path(IVec3::X, 6),
            edits: 0,
        },
        SceneConfig {
            name: "walk-diagonal",
            render_distance: 2,
            path: straight_path(IVec3::new(1, 0, -1), 4),
            edits: 0,
        },
        SceneConfig {
            name: "edit-burst",
            render_distance: 2,
            path: Vec::new(),
            edits: 256,
        },
    ]
}

/// `steps` chunk positions moving by `step` (x and z components) each time.
pub fn straight_path(step: IVec3, steps: i32) -> Vec<ChunkPos> {
    (1..=steps)
        .map(|i| ChunkPos::new(step.x * i, step.z * i))
        .collect()
}

/// Observer standing in the middle of a chunk, above the terrain.
pub fn observer_position(pos: ChunkPos) -> Vec3 {
    pos.origin().as_vec3() + Vec3::new(8.0, 100.0, 8.0)
}

/// Deterministic edit `i` inside the window centered on `center`: a world cell
/// and its new material. Alternates stone and glass in a floating sheet that
/// crosses chunk borders.
pub fn edit_cell(center: ChunkPos, i: u32) -> (IVec3, u32) {
    let side = 32;
    let x = (i % side) as i32 - 16;
    let z = ((i / side) % side) as i32 - 16;
    let y = 120 + (i / (side * side)) as i32;
    let material = if i % 3 == 0 { GLASS } else { STONE };
    (center.origin() + IVec3::new(x + 8, y, z + 8), material)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_path_steps() {
        let path = straight_path(IVec3::new(1, 0, -1), 3);
        assert_eq!(
            path,
            vec![ChunkPos::new(1, -1), ChunkPos::new(2, -2), ChunkPos::new(3, -3)]
        );
    }

    #[test]
    fn test_edit_cells_stay_in_window() {
        let center = ChunkPos::new(2, -1);
        for i in 0..256 {
            let (cell, _) = edit_cell(center, i);
            let owner = ChunkPos::containing(cell.as_vec3());
            assert!(owner.distance(center) <= 1, "edit {i} at {cell} left the window");
        }
    }
}
