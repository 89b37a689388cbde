//! Math utilities and types
//!
//! Provides the fundamental math types used by the transform hierarchy and the
//! deform system. All coordinates are Y-up right-handed; the deformation
//! cylinder axis is the Y axis.

use serde::{Deserialize, Serialize};

pub use nalgebra::{
    Vector3,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Scale, rotation and translation of an entity relative to its parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sqt {
    /// Translation relative to the parent
    pub translation: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Sqt {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Sqt {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only a translation
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Create a transform from all three parts
    pub const fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Convert to a transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Decompose an affine transformation matrix into translation, rotation
    /// and (positive) scale
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let translation = Vec3::new(matrix.m14, matrix.m24, matrix.m34);

        let scale_x = Vec3::new(matrix.m11, matrix.m21, matrix.m31).magnitude();
        let scale_y = Vec3::new(matrix.m12, matrix.m22, matrix.m32).magnitude();
        let scale_z = Vec3::new(matrix.m13, matrix.m23, matrix.m33).magnitude();
        let scale = Vec3::new(scale_x, scale_y, scale_z);

        // Degenerate axes keep an identity column so the rotation stays valid
        let safe = |s: f32| if s > constants::EPSILON { s } else { 1.0 };
        let (sx, sy, sz) = (safe(scale_x), safe(scale_y), safe(scale_z));
        let rotation_matrix = Mat3::new(
            matrix.m11 / sx, matrix.m12 / sy, matrix.m13 / sz,
            matrix.m21 / sx, matrix.m22 / sy, matrix.m23 / sz,
            matrix.m31 / sx, matrix.m32 / sy, matrix.m33 / sz,
        );
        let rotation = Quat::from_matrix(&rotation_matrix);

        Self {
            translation,
            rotation,
            scale,
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a cube centered at the origin with the given edge length
    pub fn from_size(size: f32) -> Self {
        let half = Vec3::repeat(size * 0.5);
        Self::new(-half, half)
    }

    /// Get the full size along each axis
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Map normalized box coordinates to a point: `(0,0,0)` is the min corner
    /// and `(1,1,1)` the max corner.
    pub fn point_at(&self, anchor: &Vec3) -> Vec3 {
        self.min + anchor.component_mul(&self.size())
    }

    /// Bounding box of the positions stored in an interleaved vertex buffer.
    ///
    /// The first three floats of every `stride`-sized vertex are the position.
    /// Returns the default (empty) box if the buffer holds no full position.
    pub fn from_vertices(vertices: &[f32], stride: usize) -> Self {
        if vertices.len() < 3 || stride < 3 {
            return Self::default();
        }

        let first = Vec3::new(vertices[0], vertices[1], vertices[2]);
        vertices
            .chunks_exact(stride)
            .skip(1)
            .map(|v| Vec3::new(v[0], v[1], v[2]))
            .fold(Self::new(first, first), |aabb, p| Self::new(aabb.min.inf(&p), aabb.max.sup(&p)))
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Tolerance used for "nearly zero" checks in the deformation math
    pub const EPSILON: f32 = 1.0e-5;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Mat4, Quat, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Linear interpolation between two vectors
    pub fn lerp_vec3(a: &Vec3, b: &Vec3, t: f32) -> Vec3 {
        a + (b - a) * t
    }

    /// Rotation from Euler angles in degrees, applied X first, then Y, then Z
    pub fn quat_from_euler_degrees(euler: &Vec3) -> Quat {
        Quat::from_euler_angles(deg_to_rad(euler.x), deg_to_rad(euler.y), deg_to_rad(euler.z))
    }

    /// Translation column of an affine matrix
    pub fn translation_of(matrix: &Mat4) -> Vec3 {
        Vec3::new(matrix.m14, matrix.m24, matrix.m34)
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Distance of the matrix translation from the Y axis
    fn distance_from_y_axis(&self) -> f32;
}

impl Mat4Ext for Mat4 {
    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn distance_from_y_axis(&self) -> f32 {
        self.m14.hypot(self.m34)
    }
}
