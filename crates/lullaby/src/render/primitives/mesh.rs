//! Mesh representation for 3D models
//!
//! Vertices are stored interleaved so deformation can view the whole buffer as
//! a flat `f32` slice with the position in the first three floats of every
//! vertex.

use crate::foundation::math::Aabb;
use bytemuck::{Pod, Zeroable};

/// 3D vertex data structure for rendering
///
/// The `#[repr(C)]` attribute keeps the layout identical to the flat float
/// view used by deformation.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    /// Position in 3D space
    pub position: [f32; 3],

    /// Normal vector
    pub normal: [f32; 3],

    /// Texture coordinates
    pub tex_coord: [f32; 2],

    /// Tangent vector for normal mapping
    pub tangent: [f32; 3],

    /// Padding for alignment (brings total to 48 bytes)
    pub _padding: f32,
}

impl Vertex {
    /// Number of floats per vertex in the flat view
    pub const FLOAT_STRIDE: usize = std::mem::size_of::<Self>() / std::mem::size_of::<f32>();

    /// Create a new vertex
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
            tangent: [0.0, 0.0, 0.0],
            _padding: 0.0,
        }
    }
}

/// 3D mesh containing vertices and indices
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    /// Vertex data
    pub vertices: Vec<Vertex>,

    /// Index data for triangles
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new mesh
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Create a unit cube centered at the origin with vertices at ±1.0 on each axis
    pub fn cube() -> Self {
        let vertices = vec![
            // Front face
            Vertex::new([-1.0, -1.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([1.0, -1.0, 1.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([1.0, 1.0, 1.0], [0.0, 0.0, 1.0], [1.0, 1.0]),
            Vertex::new([-1.0, 1.0, 1.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
            // Back face
            Vertex::new([-1.0, -1.0, -1.0], [0.0, 0.0, -1.0], [1.0, 0.0]),
            Vertex::new([-1.0, 1.0, -1.0], [0.0, 0.0, -1.0], [1.0, 1.0]),
            Vertex::new([1.0, 1.0, -1.0], [0.0, 0.0, -1.0], [0.0, 1.0]),
            Vertex::new([1.0, -1.0, -1.0], [0.0, 0.0, -1.0], [0.0, 0.0]),
        ];

        let indices = vec![
            // Front
            0, 1, 2, 2, 3, 0,
            // Back
            4, 5, 6, 6, 7, 4,
            // Left
            4, 0, 3, 3, 5, 4,
            // Right
            1, 7, 6, 6, 2, 1,
            // Top
            3, 2, 6, 6, 5, 3,
            // Bottom
            4, 7, 1, 1, 0, 4,
        ];

        Self::new(vertices, indices)
    }

    /// Create a flat grid in the XY plane facing +Z.
    ///
    /// The grid spans `width` by `height` centred on the origin with
    /// `columns` by `rows` cells. Long thin strips of cells are what cylinder
    /// deformation bends, so this is the usual panel mesh.
    pub fn plane(width: f32, height: f32, columns: u32, rows: u32) -> Self {
        let columns = columns.max(1);
        let rows = rows.max(1);

        let mut vertices = Vec::with_capacity(((columns + 1) * (rows + 1)) as usize);
        for row in 0..=rows {
            let v = row as f32 / rows as f32;
            for column in 0..=columns {
                let u = column as f32 / columns as f32;
                vertices.push(Vertex::new(
                    [(u - 0.5) * width, (v - 0.5) * height, 0.0],
                    [0.0, 0.0, 1.0],
                    [u, v],
                ));
            }
        }

        let stride = columns + 1;
        let mut indices = Vec::with_capacity((columns * rows * 6) as usize);
        for row in 0..rows {
            for column in 0..columns {
                let i = row * stride + column;
                indices.extend_from_slice(&[i, i + 1, i + stride + 1, i + stride + 1, i + stride, i]);
            }
        }

        Self::new(vertices, indices)
    }

    /// Flat float view of the vertex buffer, [`Vertex::FLOAT_STRIDE`] floats per vertex
    pub fn vertex_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Mutable flat float view of the vertex buffer
    pub fn vertex_floats_mut(&mut self) -> &mut [f32] {
        bytemuck::cast_slice_mut(&mut self.vertices)
    }

    /// Bounding box of the vertex positions
    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_vertices(self.vertex_floats(), Vertex::FLOAT_STRIDE)
    }
}
