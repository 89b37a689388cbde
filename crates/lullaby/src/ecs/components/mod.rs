//! ECS Components module
//!
//! Plain data attached to entities by the transform and deform systems.

pub mod deform;
pub mod transform;

pub use deform::{DeformMode, Deformed, Deformer, PathId, UndeformedSpace, Waypoint, WaypointPath};
pub use transform::{MatrixHook, TransformComponent};
