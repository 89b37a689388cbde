//! ECS World implementation
//!
//! The world owns the transform hierarchy, the deform system and the mesh
//! system and wires them together: every structural change is followed by
//! synchronous delivery of the events it raised, so deformation is up to date
//! when an operation returns.

use super::components::{DeformMode, PathId};
use super::systems::{DeformError, DeformSystem, TransformError, TransformSystem};
use super::Entity;
use crate::config::{Blueprint, DeformerDef};
use crate::events::EntityEvent;
use crate::foundation::math::{Aabb, Mat4, Sqt};
use crate::render::{Mesh, MeshSystem};
use log::{debug, error, trace};

/// Errors raised while building entities from blueprints
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum WorldError {
    /// Transform hierarchy rejected the operation
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// Deformer definition was rejected
    #[error(transparent)]
    Deform(#[from] DeformError),
}

/// ECS World containing all entities and their systems
pub struct World {
    next_entity_id: u32,
    entities: Vec<Entity>,
    transforms: TransformSystem,
    deform: DeformSystem,
    meshes: MeshSystem,
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self {
            next_entity_id: 1,
            entities: Vec::new(),
            transforms: TransformSystem::new(),
            deform: DeformSystem::new(),
            meshes: MeshSystem::new(),
        }
    }

    /// Create a new entity with an identity root transform
    pub fn create_entity(&mut self) -> Entity {
        self.create_entity_with(Sqt::identity())
    }

    /// Create a new entity with the given root transform
    pub fn create_entity_with(&mut self, local_sqt: Sqt) -> Entity {
        let entity = Entity::new(self.next_entity_id);
        self.next_entity_id += 1;
        self.entities.push(entity);
        if let Err(e) = self.transforms.create(entity, local_sqt) {
            error!("Failed to create transform: {}", e);
        }
        entity
    }

    /// Create an entity tree from a blueprint, returning the root.
    ///
    /// Children are attached to the root after their own components are set
    /// up, so they pick up the root's deformer through the usual propagation.
    pub fn create_from_blueprint(&mut self, blueprint: &Blueprint) -> Result<Entity, WorldError> {
        let entity = self.create_entity_with(blueprint.transform.to_sqt());
        if let Some(aabb) = blueprint.transform.aabb {
            self.set_aabb(entity, aabb)?;
        }
        if let Some(def) = &blueprint.deformer {
            self.deform
                .create_deformer(&mut self.transforms, &mut self.meshes, entity, def)
                .inspect_err(|e| error!("Rejected deformer of {}: {}", entity, e))?;
        }
        if let Some(def) = &blueprint.deformed {
            self.set_as_deformed(entity, PathId::new(def.waypoint_path_id.clone()));
        }

        for child_blueprint in &blueprint.children {
            let child = self.create_from_blueprint(child_blueprint)?;
            self.add_child(entity, child)?;
        }
        debug!("Created {} from blueprint", entity);
        Ok(entity)
    }

    /// Make an entity a deformation root
    pub fn create_deformer(&mut self, entity: Entity, def: &DeformerDef) -> Result<(), DeformError> {
        self.deform.create_deformer(&mut self.transforms, &mut self.meshes, entity, def)
    }

    /// Mark an entity as taking part in deformation along `path_id`
    pub fn set_as_deformed(&mut self, entity: Entity, path_id: PathId) {
        self.deform.set_as_deformed(&mut self.transforms, &mut self.meshes, entity, path_id);
    }

    /// Remove the deformation records of one entity, keeping its transform
    pub fn remove_deformation(&mut self, entity: Entity) {
        self.deform.destroy(&mut self.transforms, &mut self.meshes, entity);
    }

    /// Attach `child` under `parent`
    pub fn add_child(&mut self, parent: Entity, child: Entity) -> Result<(), TransformError> {
        self.transforms.add_child(parent, child, &mut self.deform)?;
        self.dispatch_events();
        Ok(())
    }

    /// Detach an entity from its parent
    pub fn remove_parent(&mut self, child: Entity) -> Result<(), TransformError> {
        self.transforms.remove_parent(child, &mut self.deform)?;
        self.dispatch_events();
        Ok(())
    }

    /// Replace an entity's local transform
    pub fn set_local_sqt(&mut self, entity: Entity, local_sqt: Sqt) -> Result<(), TransformError> {
        self.transforms.set_local_sqt(entity, local_sqt, &mut self.deform)
    }

    /// Move an entity so that its world matrix becomes `world_from_entity`
    pub fn set_world_from_entity(&mut self, entity: Entity, world_from_entity: &Mat4) -> Result<(), TransformError> {
        self.transforms.set_world_from_entity(entity, world_from_entity, &mut self.deform)
    }

    /// Replace an entity's local bounding box
    pub fn set_aabb(&mut self, entity: Entity, aabb: Aabb) -> Result<(), TransformError> {
        self.transforms.set_aabb(entity, aabb)?;
        self.dispatch_events();
        Ok(())
    }

    /// Queue a mesh load for an entity
    pub fn set_mesh(&mut self, entity: Entity, mesh: Mesh) {
        self.meshes.set_mesh(entity, mesh);
    }

    /// Finalize pending meshes, deforming registered ones
    pub fn finalize_meshes(&mut self) -> usize {
        self.meshes.finalize_meshes(&self.transforms, &mut self.deform)
    }

    /// Destroy an entity and its whole subtree
    pub fn destroy_entity(&mut self, entity: Entity) {
        let children = self.transforms.children(entity).to_vec();
        for child in children {
            self.destroy_entity(child);
        }

        self.deform.destroy(&mut self.transforms, &mut self.meshes, entity);
        self.meshes.remove(entity);
        self.transforms.destroy(entity, &mut self.deform);
        self.entities.retain(|&e| e != entity);
        self.dispatch_events();
    }

    /// Deliver pending hierarchy events to the deform system
    fn dispatch_events(&mut self) {
        loop {
            let events = self.transforms.drain_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                trace!("Dispatching {:?} for {}", event.event_type(), event.target());
                match event {
                    EntityEvent::ParentChanged { target, new_parent, .. } => {
                        self.deform.on_parent_changed(&mut self.transforms, target, new_parent);
                    }
                    EntityEvent::AabbChanged { target } => {
                        self.deform.on_aabb_changed(&mut self.transforms, target);
                    }
                }
            }
        }
    }

    /// World matrix of an entity
    pub fn world_from_entity(&self, entity: Entity) -> Option<&Mat4> {
        self.transforms.world_from_entity(entity)
    }

    /// Local transform of an entity
    pub fn local_sqt(&self, entity: Entity) -> Option<&Sqt> {
        self.transforms.local_sqt(entity)
    }

    /// Mode of the deformer governing an entity
    pub fn deform_mode(&self, entity: Entity) -> DeformMode {
        self.deform.deform_mode(entity)
    }

    /// Radius of the deformer governing an entity, or 0
    pub fn deform_radius(&self, entity: Entity) -> f32 {
        self.deform.deform_radius(entity)
    }

    /// Whether the entity is governed by a live deformer
    pub fn is_deformed(&self, entity: Entity) -> bool {
        self.deform.is_deformed(entity)
    }

    /// Whether the entity was marked as deformed
    pub fn is_set_as_deformed(&self, entity: Entity) -> bool {
        self.deform.is_set_as_deformed(entity)
    }

    /// Bounding box of the entity's mesh before deformation
    pub fn undeformed_bounding_box(&self, entity: Entity) -> Option<&Aabb> {
        self.deform.undeformed_bounding_box(entity)
    }

    /// Finalized mesh of an entity
    pub fn mesh(&self, entity: Entity) -> Option<&Mesh> {
        self.meshes.mesh(entity)
    }

    /// Transform hierarchy
    pub fn transforms(&self) -> &TransformSystem {
        &self.transforms
    }

    /// Deform system
    pub fn deform(&self) -> &DeformSystem {
        &self.deform
    }

    /// Mesh system
    pub fn meshes(&self) -> &MeshSystem {
        &self.meshes
    }

    /// Get an iterator over all entities
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
