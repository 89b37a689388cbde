//! Transform component for the ECS system
//!
//! Pure data component describing one node of the transform hierarchy. The
//! hierarchy logic lives in [`TransformSystem`](crate::ecs::systems::TransformSystem).

use crate::ecs::Entity;
use crate::foundation::math::{Aabb, Mat4, Sqt};

/// Per-entity tag telling the hierarchy to evaluate the world matrix through a
/// [`MatrixHookHandler`](crate::ecs::systems::MatrixHookHandler) instead of
/// plain parent composition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatrixHook {
    /// Wrap the local translation around a vertical cylinder
    GlobalCylinder {
        /// Radius of the governing deformer
        radius: f32,
    },
    /// Bend the undeformed deformer-space transform around the deformer's cylinder
    CylinderBend,
    /// Remap the undeformed position along a waypoint path
    Waypoint,
}

impl MatrixHook {
    /// Whether the hook can map a world matrix back to a local transform
    pub const fn is_invertible(&self) -> bool {
        matches!(self, Self::CylinderBend)
    }
}

/// ECS Transform component
///
/// Local transform relative to the parent plus the cached world matrix the
/// hierarchy derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformComponent {
    /// Parent entity, or [`Entity::NULL`] for roots
    pub parent: Entity,

    /// Children in insertion order
    pub children: Vec<Entity>,

    /// Transform relative to the parent
    pub local_sqt: Sqt,

    /// Cached world-from-entity matrix
    pub world_from_entity: Mat4,

    /// Local-space bounding box
    pub aabb: Aabb,

    /// Custom matrix evaluation, if any
    pub matrix_hook: Option<MatrixHook>,
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self::from_sqt(Sqt::identity())
    }
}

impl TransformComponent {
    /// Create a root node with the given local transform
    pub fn from_sqt(local_sqt: Sqt) -> Self {
        let world_from_entity = local_sqt.to_matrix();
        Self {
            parent: Entity::NULL,
            children: Vec::new(),
            local_sqt,
            world_from_entity,
            aabb: Aabb::default(),
            matrix_hook: None,
        }
    }
}
