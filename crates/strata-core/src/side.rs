use glam::IVec3;

/// One of the six geometric sides of a voxel.
///
/// Also names the six texture sets of a material, since a side's texture is
/// picked by resolving the voxel's orientation frame to one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    /// +Y
    Up = 0,
    /// -Y
    Down = 1,
    /// -X
    Left = 2,
    /// +X
    Right = 3,
    /// +Z
    Front = 4,
    /// -Z
    Back = 5,
}

/// All six sides in storage order.
pub const ALL_SIDES: [Side; 6] = [
    Side::Up,
    Side::Down,
    Side::Left,
    Side::Right,
    Side::Front,
    Side::Back,
];

impl Side {
    /// Neighbor offset across this side. Y-up convention.
    pub fn offset(self) -> IVec3 {
        match self {
            Side::Up => IVec3::new(0, 1, 0),
            Side::Down => IVec3::new(0, -1, 0),
            Side::Left => IVec3::new(-1, 0, 0),
            Side::Right => IVec3::new(1, 0, 0),
            Side::Front => IVec3::new(0, 0, 1),
            Side::Back => IVec3::new(0, 0, -1),
        }
    }

    /// The side facing back across the shared face.
    pub fn opposite(self) -> Side {
        match self {
            Side::Up => Side::Down,
            Side::Down => Side::Up,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
            Side::Front => Side::Back,
            Side::Back => Side::Front,
        }
    }

    /// Axis index (0 = x, 1 = y, 2 = z) the side is perpendicular to.
    pub fn axis(self) -> usize {
        match self {
            Side::Left | Side::Right => 0,
            Side::Up | Side::Down => 1,
            Side::Front | Side::Back => 2,
        }
    }

    /// +1 for sides facing the positive axis direction, -1 otherwise.
    pub fn sign(self) -> i32 {
        match self {
            Side::Up | Side::Right | Side::Front => 1,
            Side::Down | Side::Left | Side::Back => -1,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_unique_and_unit() {
        for (i, a) in ALL_SIDES.iter().enumerate() {
            assert_eq!(a.offset().abs().element_sum(), 1, "{a:?} is not a unit step");
            for b in &ALL_SIDES[i + 1..] {
                assert_ne!(a.offset(), b.offset(), "{a:?} and {b:?} share an offset");
            }
        }
    }

    #[test]
    fn test_opposite_negates_offset() {
        for side in ALL_SIDES {
            assert_eq!(side.opposite().offset(), -side.offset());
            assert_eq!(side.opposite().opposite(), side);
        }
    }

    #[test]
    fn test_axis_and_sign_match_offset() {
        for side in ALL_SIDES {
            assert_eq!(side.offset()[side.axis()], side.sign());
        }
    }

    #[test]
    fn test_storage_index() {
        for (i, side) in ALL_SIDES.iter().enumerate() {
            assert_eq!(side.index(), i);
        }
    }
}
