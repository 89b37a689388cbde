//! Entity blueprints

use super::{Config, DeformedDef, DeformerDef};
use crate::foundation::math::{utils, Aabb, Sqt, Vec3};
use serde::{Deserialize, Serialize};

/// Transform definition. Rotation is given as Euler angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformDef {
    /// Translation relative to the parent
    pub position: Vec3,
    /// Euler rotation in degrees, applied X first, then Y, then Z
    pub rotation: Vec3,
    /// Scale factors
    pub scale: Vec3,
    /// Local bounding box
    pub aabb: Option<Aabb>,
}

impl Default for TransformDef {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Vec3::zeros(),
            scale: Vec3::repeat(1.0),
            aabb: None,
        }
    }
}

impl TransformDef {
    /// Transform at a position
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Local transform described by this definition
    pub fn to_sqt(&self) -> Sqt {
        Sqt::new(self.position, utils::quat_from_euler_degrees(&self.rotation), self.scale)
    }
}

/// Component definitions of one entity plus its children
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Blueprint {
    /// Transform of the entity
    pub transform: TransformDef,
    /// Makes the entity a deformation root
    pub deformer: Option<DeformerDef>,
    /// Makes the entity take part in deformation
    pub deformed: Option<DeformedDef>,
    /// Child entities
    pub children: Vec<Blueprint>,
}

impl Blueprint {
    /// Blueprint with only a transform
    pub fn new(transform: TransformDef) -> Self {
        Self {
            transform,
            ..Default::default()
        }
    }

    /// Builder pattern: Set deformer
    pub fn with_deformer(mut self, deformer: DeformerDef) -> Self {
        self.deformer = Some(deformer);
        self
    }

    /// Builder pattern: Set deformed
    pub fn with_deformed(mut self, deformed: DeformedDef) -> Self {
        self.deformed = Some(deformed);
        self
    }

    /// Builder pattern: Add child
    pub fn with_child(mut self, child: Blueprint) -> Self {
        self.children.push(child);
        self
    }
}

impl Config for Blueprint {}
