//! Mesh ownership and deferred deformation
//!
//! Meshes handed to [`MeshSystem::set_mesh`] stay pending until the next
//! [`MeshSystem::finalize_meshes`]. Entities registered for deformation have
//! their vertex buffer passed through a [`MeshDeformer`] exactly once per load.

use super::primitives::{Mesh, Vertex};
use crate::ecs::systems::TransformSystem;
use crate::ecs::Entity;
use log::{debug, trace};
use std::collections::{HashMap, HashSet};

/// Deforms the vertices of an entity's mesh in place
pub trait MeshDeformer {
    /// Deform an interleaved vertex buffer of `stride` floats per vertex
    fn deform_mesh(&mut self, transforms: &TransformSystem, entity: Entity, vertices: &mut [f32], stride: usize);
}

/// Owns entity meshes and applies deformation when they are finalized
#[derive(Debug, Default)]
pub struct MeshSystem {
    deformation_registered: HashSet<Entity>,
    pending: HashMap<Entity, Mesh>,
    meshes: HashMap<Entity, Mesh>,
}

impl MeshSystem {
    /// Create an empty mesh system
    pub fn new() -> Self {
        Self::default()
    }

    /// Deform future loads of this entity's mesh. Registering twice has no
    /// further effect.
    pub fn register_deformation(&mut self, entity: Entity) {
        if !self.deformation_registered.insert(entity) {
            trace!("Deformation already registered for {}", entity);
        }
    }

    /// Stop deforming this entity's mesh
    pub fn unregister_deformation(&mut self, entity: Entity) {
        self.deformation_registered.remove(&entity);
    }

    /// Whether loads of this entity's mesh are deformed
    pub fn has_deformation(&self, entity: Entity) -> bool {
        self.deformation_registered.contains(&entity)
    }

    /// Queue a mesh load for an entity, replacing any pending one
    pub fn set_mesh(&mut self, entity: Entity, mesh: Mesh) {
        self.pending.insert(entity, mesh);
    }

    /// Finalize every pending mesh, deforming registered entities once.
    ///
    /// Returns the number of meshes finalized.
    pub fn finalize_meshes(&mut self, transforms: &TransformSystem, deformer: &mut dyn MeshDeformer) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();

        for (entity, mut mesh) in pending {
            if self.deformation_registered.contains(&entity) {
                debug!("Deforming mesh of {} ({} vertices)", entity, mesh.vertices.len());
                deformer.deform_mesh(transforms, entity, mesh.vertex_floats_mut(), Vertex::FLOAT_STRIDE);
            }
            self.meshes.insert(entity, mesh);
        }
        count
    }

    /// Finalized mesh of an entity
    pub fn mesh(&self, entity: Entity) -> Option<&Mesh> {
        self.meshes.get(&entity)
    }

    /// Forget everything about an entity
    pub fn remove(&mut self, entity: Entity) {
        self.deformation_registered.remove(&entity);
        self.pending.remove(&entity);
        self.meshes.remove(&entity);
    }
}
