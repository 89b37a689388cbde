//! Deformation components
//!
//! [`Deformer`] marks a deformation root; [`Deformed`] marks every entity that
//! takes part in deformation, including the roots themselves.

use crate::ecs::Entity;
use crate::foundation::math::{Aabb, Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// How a deformer maps its subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeformMode {
    /// No deformation
    #[default]
    None,
    /// Wrap translations around a vertical cylinder, composing nested radii
    GlobalCylinder,
    /// Bend the undeformed subtree around the deformer's cylinder
    CylinderBend,
    /// Remap positions along named waypoint paths
    Waypoint,
}

/// Name of a waypoint path. The empty name is the default path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathId(String);

impl PathId {
    /// Create a path id from a name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Path name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PathId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PathId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

/// One control point of a waypoint path
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Waypoint {
    /// Position in undeformed space
    pub original_position: Vec3,
    /// Position the original maps to
    pub remapped_position: Vec3,
    /// Rotation at this waypoint, Euler angles in degrees
    pub remapped_rotation: Vec3,
    /// Normalized box point subtracted from `original_position` when anchored
    pub original_aabb_anchor: Vec3,
    /// Normalized box point subtracted from `remapped_position` when anchored
    pub remapped_aabb_anchor: Vec3,
}

/// Ordered waypoints plus their projection on the path axis
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WaypointPath {
    /// Name of the path
    pub path_id: PathId,
    /// Waypoints, sorted along the parameterization axis
    pub waypoints: Vec<Waypoint>,
    /// Unit vector from the first to the last original position
    pub parameterization_axis: Vec3,
    /// Projection of every original position on the axis
    pub parameterization_values: Vec<f32>,
    /// Offset every waypoint by the deformed entity's bounding box
    pub use_aabb_anchor: bool,
}

/// Deformation root
#[derive(Debug, Clone, PartialEq)]
pub struct Deformer {
    /// Entity owning the deformer
    pub entity: Entity,
    /// Cylinder radius
    pub radius: f32,
    /// Deformation mode
    pub mode: DeformMode,
    /// Maximum bend angle in radians for [`DeformMode::CylinderBend`]; ignored when zero
    pub clamp_angle: f32,
    /// Named waypoint paths for [`DeformMode::Waypoint`]
    pub paths: HashMap<PathId, WaypointPath>,
}

impl Deformer {
    /// Create a deformer without paths
    pub fn new(entity: Entity, mode: DeformMode, radius: f32) -> Self {
        Self {
            entity,
            radius,
            mode,
            clamp_angle: 0.0,
            paths: HashMap::new(),
        }
    }

    /// Builder pattern: Set clamp angle
    pub fn with_clamp_angle(mut self, clamp_angle: f32) -> Self {
        self.clamp_angle = clamp_angle;
        self
    }
}

/// Cached deformer-from-entity matrix in undeformed space.
///
/// Rebuilt top-down every time the entity's world matrix is evaluated and
/// invalidated whenever the governing deformer changes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UndeformedSpace {
    deformer_from_entity: Option<Mat4>,
}

impl UndeformedSpace {
    /// Store a freshly computed matrix
    pub fn store(&mut self, deformer_from_entity: Mat4) {
        self.deformer_from_entity = Some(deformer_from_entity);
    }

    /// Forget the cached matrix
    pub fn invalidate(&mut self) {
        self.deformer_from_entity = None;
    }

    /// Cached matrix, if valid
    pub fn get(&self) -> Option<&Mat4> {
        self.deformer_from_entity.as_ref()
    }
}

/// Participation of an entity in deformation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Deformed {
    /// Entity owning the record
    pub entity: Entity,
    /// Governing deformer, possibly `entity` itself, or [`Entity::NULL`]
    pub deformer: Entity,
    /// Undeformed deformer-from-entity cache
    pub undeformed_space: UndeformedSpace,
    /// Bounding box of the mesh before it was deformed
    pub undeformed_aabb: Aabb,
    /// Waypoint path followed by this entity
    pub path_id: PathId,
    /// Copy of the followed path offset by this entity's bounding box
    pub anchored_path: Option<Box<WaypointPath>>,
}

impl Deformed {
    /// Create a record with no deformer
    pub fn new(entity: Entity, path_id: PathId) -> Self {
        Self {
            entity,
            deformer: Entity::NULL,
            path_id,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deformed_starts_without_deformer() {
        let deformed = Deformed::new(Entity::from_raw(4), PathId::from("rail"));
        assert!(deformed.deformer.is_null());
        assert!(deformed.undeformed_space.get().is_none());
        assert!(deformed.anchored_path.is_none());
        assert_eq!(deformed.path_id.as_str(), "rail");
    }

    #[test]
    fn test_undeformed_space_invalidation() {
        let mut space = UndeformedSpace::default();
        let matrix = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));

        space.store(matrix);
        assert_eq!(space.get(), Some(&matrix));

        space.invalidate();
        assert!(space.get().is_none());
    }

    #[test]
    fn test_default_path_id_is_empty() {
        assert_eq!(PathId::default(), PathId::from(""));
        assert_eq!(PathId::from("a").to_string(), "\"a\"");
    }
}
