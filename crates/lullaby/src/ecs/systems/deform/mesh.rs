//! Vertex buffer deformation

use super::DeformError;
use crate::foundation::math::Vec3;

/// Apply `deform` to the position (first three floats) of every vertex in an
/// interleaved buffer of `stride` floats per vertex
pub fn apply_deformation<F>(vertices: &mut [f32], stride: usize, mut deform: F) -> Result<(), DeformError>
where
    F: FnMut(&Vec3) -> Vec3,
{
    if stride < 3 || vertices.len() % stride != 0 {
        return Err(DeformError::MalformedVertexBuffer { len: vertices.len(), stride });
    }

    for vertex in vertices.chunks_exact_mut(stride) {
        let deformed = deform(&Vec3::new(vertex[0], vertex[1], vertex[2]));
        vertex[..3].copy_from_slice(deformed.as_slice());
    }
    Ok(())
}
