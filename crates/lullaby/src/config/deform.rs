//! Deformation definitions

use crate::ecs::components::DeformMode;
use crate::foundation::math::Vec3;
use serde::{Deserialize, Serialize};

/// One waypoint as authored
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointDef {
    /// Position in undeformed space
    pub original_position: Vec3,
    /// Position the original maps to
    pub remapped_position: Vec3,
    /// Rotation at the waypoint, Euler angles in degrees
    pub remapped_rotation: Vec3,
    /// Normalized anchor in the entity box for `original_position`
    pub original_aabb_anchor: Vec3,
    /// Normalized anchor in the entity box for `remapped_position`
    pub remapped_aabb_anchor: Vec3,
}

/// Named sequence of waypoints
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointPathDef {
    /// Path name; empty for the default path
    pub path_id: String,
    /// Waypoints sorted along the path
    pub waypoints: Vec<WaypointDef>,
    /// Offset waypoints by each follower's bounding box
    pub use_aabb_anchor: bool,
}

/// Deformer definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeformerDef {
    /// Deformation mode
    pub deform_mode: DeformMode,
    /// Cylinder radius
    pub horizontal_radius: f32,
    /// Maximum bend angle in radians, zero for no limit
    pub clamp_angle: f32,
    /// Paths for waypoint deformation
    pub waypoint_paths: Vec<WaypointPathDef>,
}

impl Default for DeformerDef {
    fn default() -> Self {
        Self {
            deform_mode: DeformMode::CylinderBend,
            horizontal_radius: 1.0,
            clamp_angle: 0.0,
            waypoint_paths: Vec::new(),
        }
    }
}

impl DeformerDef {
    /// Cylinder bend deformer with the given radius
    pub fn cylinder_bend(horizontal_radius: f32) -> Self {
        Self {
            horizontal_radius,
            ..Default::default()
        }
    }

    /// Waypoint deformer following the given paths
    pub fn waypoint(waypoint_paths: Vec<WaypointPathDef>) -> Self {
        Self {
            deform_mode: DeformMode::Waypoint,
            waypoint_paths,
            ..Default::default()
        }
    }

    /// Builder pattern: Set deform mode
    pub fn with_mode(mut self, deform_mode: DeformMode) -> Self {
        self.deform_mode = deform_mode;
        self
    }

    /// Builder pattern: Set clamp angle
    pub fn with_clamp_angle(mut self, clamp_angle: f32) -> Self {
        self.clamp_angle = clamp_angle;
        self
    }
}

/// Marks an entity as taking part in deformation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeformedDef {
    /// Waypoint path to follow; empty for the default path
    pub waypoint_path_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deformer_def_defaults_to_cylinder_bend() {
        let def = DeformerDef::default();
        assert_eq!(def.deform_mode, DeformMode::CylinderBend);
        assert!(def.waypoint_paths.is_empty());
    }

    #[test]
    fn test_waypoint_path_from_ron() {
        let def: DeformerDef = ron::from_str(
            r#"(
                deform_mode: Waypoint,
                waypoint_paths: [(
                    path_id: "rail",
                    use_aabb_anchor: true,
                    waypoints: [
                        (original_position: (0.0, 0.0, 0.0), remapped_position: (0.0, 1.0, 0.0)),
                        (original_position: (4.0, 0.0, 0.0), remapped_rotation: (0.0, 0.0, 45.0)),
                    ],
                )],
            )"#,
        )
        .unwrap();

        assert_eq!(def.deform_mode, DeformMode::Waypoint);
        let path = &def.waypoint_paths[0];
        assert_eq!(path.path_id, "rail");
        assert!(path.use_aabb_anchor);
        assert_eq!(path.waypoints[0].remapped_position, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(path.waypoints[1].remapped_rotation.z, 45.0);
        assert_eq!(path.waypoints[1].original_aabb_anchor, Vec3::zeros());
    }
}
