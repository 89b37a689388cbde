//! Deformation of transform subtrees and their meshes
//!
//! A deformer entity bends the flat, undeformed layout of its subtree into
//! world space. Each deformed entity is evaluated from a cached undeformed
//! deformer-from-entity matrix, so bending never has to be undone on the
//! already-deformed parent.

pub mod cylinder;
pub mod mesh;
pub mod waypoint;

mod deform_system;

pub use deform_system::DeformSystem;
pub use waypoint::Bracket;

use crate::ecs::components::PathId;
use crate::ecs::Entity;

/// Deformation setup errors
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DeformError {
    /// Waypoint deformers need at least one path
    #[error("waypoint deformer {entity} must have at least one path")]
    MissingWaypointPaths {
        /// Deformer entity
        entity: Entity,
    },

    /// A waypoint path has no waypoints
    #[error("waypoint path {path_id} has no waypoints")]
    EmptyWaypointPath {
        /// Offending path
        path_id: PathId,
    },

    /// Two paths of one deformer share a name
    #[error("waypoint path {path_id} already exists")]
    DuplicateWaypointPath {
        /// Offending path
        path_id: PathId,
    },

    /// Cylinder deformers need a positive radius
    #[error("deformer {entity} has invalid radius {radius}")]
    InvalidRadius {
        /// Deformer entity
        entity: Entity,
        /// Requested radius
        radius: f32,
    },

    /// Vertex buffer length or stride cannot hold positions
    #[error("malformed vertex buffer: {len} floats with stride {stride}")]
    MalformedVertexBuffer {
        /// Buffer length in floats
        len: usize,
        /// Floats per vertex
        stride: usize,
    },
}
