//! Transform hierarchy system
//!
//! Owns the parent/child relations, local transforms and cached world
//! matrices of every entity. World matrices are recomputed eagerly, top-down,
//! whenever a node or one of its ancestors changes.
//!
//! Entities tagged with a [`MatrixHook`] are evaluated through a
//! [`MatrixHookHandler`] supplied by the caller of each mutating operation
//! instead of plain `world_from_parent * local` composition. Passing the handler
//! explicitly keeps the hierarchy free of stored callbacks.

use crate::ecs::components::{MatrixHook, TransformComponent};
use crate::ecs::Entity;
use crate::events::{EntityEvent, EventQueue};
use crate::foundation::collections::ComponentPool;
use crate::foundation::math::{Aabb, Mat4, Sqt};
use log::{debug, error};

/// Evaluates world matrices for entities carrying a [`MatrixHook`].
///
/// Returning `None` from either method means "use undeformed composition".
pub trait MatrixHookHandler {
    /// Compute the world-from-entity matrix of a hooked entity
    fn world_from_entity(
        &mut self,
        transforms: &TransformSystem,
        entity: Entity,
        hook: MatrixHook,
        local_sqt: &Sqt,
        world_from_parent: Option<&Mat4>,
    ) -> Option<Mat4>;

    /// Recover the local transform that would produce `world_from_entity`
    fn local_sqt_from_world(
        &self,
        transforms: &TransformSystem,
        entity: Entity,
        hook: MatrixHook,
        world_from_entity: &Mat4,
        world_from_parent: Option<&Mat4>,
    ) -> Option<Sqt>;
}

/// Handler for hierarchies without any hooks installed
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainComposition;

impl MatrixHookHandler for PlainComposition {
    fn world_from_entity(
        &mut self,
        _transforms: &TransformSystem,
        _entity: Entity,
        _hook: MatrixHook,
        _local_sqt: &Sqt,
        _world_from_parent: Option<&Mat4>,
    ) -> Option<Mat4> {
        None
    }

    fn local_sqt_from_world(
        &self,
        _transforms: &TransformSystem,
        _entity: Entity,
        _hook: MatrixHook,
        _world_from_entity: &Mat4,
        _world_from_parent: Option<&Mat4>,
    ) -> Option<Sqt> {
        None
    }
}

/// Standard world matrix: `world_from_parent * parent_from_local`
pub fn compose_with_parent(local_sqt: &Sqt, world_from_parent: Option<&Mat4>) -> Mat4 {
    let parent_from_local = local_sqt.to_matrix();
    world_from_parent.map_or(parent_from_local, |parent| parent * parent_from_local)
}

/// Standard local transform: decomposition of `parent_from_world * world_from_entity`
pub fn local_sqt_relative_to(world_from_entity: &Mat4, world_from_parent: Option<&Mat4>) -> Sqt {
    match world_from_parent {
        Some(parent) => match parent.try_inverse() {
            Some(parent_from_world) => Sqt::from_matrix(&(parent_from_world * world_from_entity)),
            None => {
                error!("Singular parent matrix, treating world transform as local");
                Sqt::from_matrix(world_from_entity)
            }
        },
        None => Sqt::from_matrix(world_from_entity),
    }
}

/// Transform hierarchy errors
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformError {
    /// The entity has no transform
    #[error("{0} has no transform")]
    UnknownEntity(Entity),

    /// The entity already has a transform
    #[error("{0} already has a transform")]
    AlreadyExists(Entity),

    /// The null entity cannot take part in the hierarchy
    #[error("the null entity cannot be used in the transform hierarchy")]
    NullEntity,

    /// An entity cannot be parented to itself
    #[error("cannot make {0} its own child")]
    SelfParent(Entity),

    /// Parenting would create a cycle
    #[error("cannot make {parent} a parent of its ancestor {child}")]
    WouldCreateCycle {
        /// Requested parent
        parent: Entity,
        /// Requested child, an ancestor of `parent`
        child: Entity,
    },
}

/// Transform hierarchy
pub struct TransformSystem {
    nodes: ComponentPool<TransformComponent>,
    events: EventQueue,
}

impl TransformSystem {
    /// Create an empty hierarchy
    pub fn new() -> Self {
        Self {
            nodes: ComponentPool::with_capacity(16),
            events: EventQueue::new(),
        }
    }

    /// Give an entity a root transform
    pub fn create(&mut self, entity: Entity, local_sqt: Sqt) -> Result<(), TransformError> {
        if entity.is_null() {
            return Err(TransformError::NullEntity);
        }
        self.nodes
            .emplace(entity, TransformComponent::from_sqt(local_sqt))
            .map(|_| ())
            .ok_or(TransformError::AlreadyExists(entity))
    }

    /// Remove an entity's transform.
    ///
    /// The entity is detached from its parent and its children become roots;
    /// both changes are reported as [`EntityEvent::ParentChanged`].
    pub fn destroy(&mut self, entity: Entity, hooks: &mut dyn MatrixHookHandler) {
        let Some(node) = self.nodes.destroy(entity) else {
            return;
        };

        if let Some(parent) = self.nodes.get_mut(node.parent) {
            parent.children.retain(|&c| c != entity);
            self.events.send(EntityEvent::ParentChanged {
                target: entity,
                old_parent: node.parent,
                new_parent: Entity::NULL,
            });
        }

        for child in node.children {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parent = Entity::NULL;
            }
            self.update_transforms(child, hooks);
            self.events.send(EntityEvent::ParentChanged {
                target: child,
                old_parent: entity,
                new_parent: Entity::NULL,
            });
        }
    }

    /// Whether the entity has a transform
    pub fn contains(&self, entity: Entity) -> bool {
        self.nodes.contains(entity)
    }

    /// Parent of an entity, or [`Entity::NULL`]
    pub fn parent(&self, entity: Entity) -> Entity {
        self.nodes.get(entity).map_or(Entity::NULL, |node| node.parent)
    }

    /// Children of an entity (empty for unknown entities)
    pub fn children(&self, entity: Entity) -> &[Entity] {
        self.nodes.get(entity).map_or(&[], |node| node.children.as_slice())
    }

    /// Local transform of an entity
    pub fn local_sqt(&self, entity: Entity) -> Option<&Sqt> {
        self.nodes.get(entity).map(|node| &node.local_sqt)
    }

    /// Cached world-from-entity matrix of an entity
    pub fn world_from_entity(&self, entity: Entity) -> Option<&Mat4> {
        self.nodes.get(entity).map(|node| &node.world_from_entity)
    }

    /// Local-space bounding box of an entity
    pub fn aabb(&self, entity: Entity) -> Option<&Aabb> {
        self.nodes.get(entity).map(|node| &node.aabb)
    }

    /// Matrix hook installed on an entity
    pub fn matrix_hook(&self, entity: Entity) -> Option<MatrixHook> {
        self.nodes.get(entity).and_then(|node| node.matrix_hook)
    }

    /// Whether `ancestor` appears on the parent chain of `entity`
    pub fn is_ancestor_of(&self, ancestor: Entity, entity: Entity) -> bool {
        let mut current = self.parent(entity);
        while !current.is_null() {
            if current == ancestor {
                return true;
            }
            current = self.parent(current);
        }
        false
    }

    /// Replace an entity's local transform and refresh its subtree
    pub fn set_local_sqt(
        &mut self,
        entity: Entity,
        local_sqt: Sqt,
        hooks: &mut dyn MatrixHookHandler,
    ) -> Result<(), TransformError> {
        let node = self.nodes.get_mut(entity).ok_or(TransformError::UnknownEntity(entity))?;
        node.local_sqt = local_sqt;
        self.update_transforms(entity, hooks);
        Ok(())
    }

    /// Place an entity so its world matrix becomes `world_from_entity`.
    ///
    /// Hooked entities whose hook is invertible are mapped back through the
    /// handler; everything else uses the standard parent-relative inverse.
    pub fn set_world_from_entity(
        &mut self,
        entity: Entity,
        world_from_entity: &Mat4,
        hooks: &mut dyn MatrixHookHandler,
    ) -> Result<(), TransformError> {
        let node = self.nodes.get(entity).ok_or(TransformError::UnknownEntity(entity))?;
        let world_from_parent = self.world_from_entity(node.parent);

        let local_sqt = node
            .matrix_hook
            .filter(MatrixHook::is_invertible)
            .and_then(|hook| {
                hooks.local_sqt_from_world(&*self, entity, hook, world_from_entity, world_from_parent)
            })
            .unwrap_or_else(|| local_sqt_relative_to(world_from_entity, world_from_parent));

        self.set_local_sqt(entity, local_sqt, hooks)
    }

    /// Replace an entity's bounding box and report [`EntityEvent::AabbChanged`]
    pub fn set_aabb(&mut self, entity: Entity, aabb: Aabb) -> Result<(), TransformError> {
        let node = self.nodes.get_mut(entity).ok_or(TransformError::UnknownEntity(entity))?;
        node.aabb = aabb;
        self.events.send(EntityEvent::AabbChanged { target: entity });
        Ok(())
    }

    /// Install or clear an entity's matrix hook.
    ///
    /// Takes effect on the next [`update_transforms`](Self::update_transforms)
    /// of the entity or one of its ancestors, so a whole subtree can be
    /// retagged before it is refreshed once.
    pub fn set_matrix_hook(&mut self, entity: Entity, hook: Option<MatrixHook>) {
        if let Some(node) = self.nodes.get_mut(entity) {
            node.matrix_hook = hook;
        }
    }

    /// Attach `child` to `parent`, keeping the child's local transform
    pub fn add_child(
        &mut self,
        parent: Entity,
        child: Entity,
        hooks: &mut dyn MatrixHookHandler,
    ) -> Result<(), TransformError> {
        if parent.is_null() || child.is_null() {
            return Err(TransformError::NullEntity);
        }
        if parent == child {
            return Err(TransformError::SelfParent(child));
        }
        if !self.nodes.contains(parent) {
            return Err(TransformError::UnknownEntity(parent));
        }
        if self.is_ancestor_of(child, parent) {
            return Err(TransformError::WouldCreateCycle { parent, child });
        }
        let old_parent = self.nodes.get(child).ok_or(TransformError::UnknownEntity(child))?.parent;
        if old_parent == parent {
            debug!("{} is already a child of {}", child, parent);
            return Ok(());
        }

        if let Some(old) = self.nodes.get_mut(old_parent) {
            old.children.retain(|&c| c != child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = parent;
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }

        self.update_transforms(child, hooks);
        self.events.send(EntityEvent::ParentChanged {
            target: child,
            old_parent,
            new_parent: parent,
        });
        Ok(())
    }

    /// Detach an entity from its parent, making it a root
    pub fn remove_parent(
        &mut self,
        child: Entity,
        hooks: &mut dyn MatrixHookHandler,
    ) -> Result<(), TransformError> {
        let node = self.nodes.get_mut(child).ok_or(TransformError::UnknownEntity(child))?;
        let old_parent = std::mem::replace(&mut node.parent, Entity::NULL);
        if old_parent.is_null() {
            return Ok(());
        }

        if let Some(parent) = self.nodes.get_mut(old_parent) {
            parent.children.retain(|&c| c != child);
        }
        self.update_transforms(child, hooks);
        self.events.send(EntityEvent::ParentChanged {
            target: child,
            old_parent,
            new_parent: Entity::NULL,
        });
        Ok(())
    }

    /// Recompute the world matrices of `entity` and all its descendants
    pub fn update_transforms(&mut self, entity: Entity, hooks: &mut dyn MatrixHookHandler) {
        let Some(node) = self.nodes.get(entity) else {
            return;
        };
        let local_sqt = node.local_sqt.clone();
        let hook = node.matrix_hook;
        let world_from_parent = self.world_from_entity(node.parent).copied();

        let world_from_entity = hook
            .and_then(|hook| {
                hooks.world_from_entity(&*self, entity, hook, &local_sqt, world_from_parent.as_ref())
            })
            .unwrap_or_else(|| compose_with_parent(&local_sqt, world_from_parent.as_ref()));

        let Some(node) = self.nodes.get_mut(entity) else {
            return;
        };
        node.world_from_entity = world_from_entity;

        let children = node.children.clone();
        for child in children {
            self.update_transforms(child, hooks);
        }
    }

    /// Take every pending structural event, oldest first
    pub fn drain_events(&mut self) -> Vec<EntityEvent> {
        self.events.drain()
    }
}

impl Default for TransformSystem {
    fn default() -> Self {
        Self::new()
    }
}
