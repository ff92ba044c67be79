use glam::IVec3;
use strata_core::Side;

/// Vertex layout of a chunk face. Must match the chunk shader's vertex input.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub alpha: f32,
    pub tex_coord: [f32; 2],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Corner positions of the unit quad covering one side of the cell at `cell`.
pub fn quad_corners(cell: IVec3, side: Side) -> [[f32; 3]; 4] {
    let (x, y, z) = (cell.x as f32, cell.y as f32, cell.z as f32);
    match side {
        Side::Left | Side::Right => {
            let x = if side == Side::Right { x + 1.0 } else { x };
            [
                [x, y, z],
                [x, y + 1.0, z],
                [x, y + 1.0, z + 1.0],
                [x, y, z + 1.0],
            ]
        }
        Side::Down | Side::Up => {
            let y = if side == Side::Up { y + 1.0 } else { y };
            [
                [x, y, z],
                [x + 1.0, y, z],
                [x + 1.0, y, z + 1.0],
                [x, y, z + 1.0],
            ]
        }
        Side::Back | Side::Front => {
            let z = if side == Side::Front { z + 1.0 } else { z };
            [
                [x, y, z],
                [x, y + 1.0, z],
                [x + 1.0, y + 1.0, z],
                [x + 1.0, y, z],
            ]
        }
    }
}

/// The four vertices of one face quad.
pub fn face_quad(cell: IVec3, side: Side, tex_coords: [[f32; 2]; 4], alpha: f32) -> [Vertex; 4] {
    let corners = quad_corners(cell, side);
    std::array::from_fn(|i| Vertex {
        position: corners[i],
        alpha,
        tex_coord: tex_coords[i],
    })
}

/// Slot-relative indices of face slot `face`: two triangles over its four vertices.
pub fn quad_indices(face: u32) -> [u32; 6] {
    let v = face * 4;
    [v, v + 1, v + 2, v, v + 2, v + 3]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_size() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        assert_eq!(Vertex::layout().array_stride, 24);
    }

    #[test]
    fn test_quad_corners_offset_by_side() {
        let cell = IVec3::new(16, 3, -16);
        assert_eq!(quad_corners(cell, Side::Left)[0], [16.0, 3.0, -16.0]);
        assert_eq!(quad_corners(cell, Side::Right)[2], [17.0, 4.0, -15.0]);
        assert_eq!(quad_corners(cell, Side::Up)[1], [17.0, 4.0, -16.0]);
        assert_eq!(quad_corners(cell, Side::Front)[3], [17.0, 3.0, -15.0]);
    }

    #[test]
    fn test_quad_indices() {
        assert_eq!(quad_indices(0), [0, 1, 2, 0, 2, 3]);
        assert_eq!(quad_indices(5), [20, 21, 22, 20, 22, 23]);
    }
}
