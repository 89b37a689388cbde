//! Specialized collection types

use crate::ecs::Entity;
use slotmap::{DefaultKey, SlotMap};
use std::collections::HashMap;

/// Entity-indexed storage for one kind of per-entity record.
///
/// Records live densely in a slot map; a side table maps each entity to its
/// slot. References handed out borrow the pool, so they cannot outlive the next
/// insertion or removal.
pub struct ComponentPool<T> {
    components: SlotMap<DefaultKey, T>,
    entity_map: HashMap<Entity, DefaultKey>,
}

impl<T> ComponentPool<T> {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            components: SlotMap::new(),
            entity_map: HashMap::new(),
        }
    }

    /// Create an empty pool with room for `capacity` records
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            components: SlotMap::with_capacity(capacity),
            entity_map: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a record for `entity`.
    ///
    /// Returns `None` and leaves the pool untouched if the entity already has a
    /// record (or is the null entity).
    pub fn emplace(&mut self, entity: Entity, component: T) -> Option<&mut T> {
        if entity.is_null() || self.entity_map.contains_key(&entity) {
            return None;
        }
        let key = self.components.insert(component);
        self.entity_map.insert(entity, key);
        self.components.get_mut(key)
    }

    /// Get the record for an entity
    pub fn get(&self, entity: Entity) -> Option<&T> {
        let key = self.entity_map.get(&entity)?;
        self.components.get(*key)
    }

    /// Get a mutable reference to the record for an entity
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let key = self.entity_map.get(&entity)?;
        self.components.get_mut(*key)
    }

    /// Whether the entity has a record
    pub fn contains(&self, entity: Entity) -> bool {
        self.entity_map.contains_key(&entity)
    }

    /// Remove and return the record for an entity
    pub fn destroy(&mut self, entity: Entity) -> Option<T> {
        let key = self.entity_map.remove(&entity)?;
        self.components.remove(key)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the pool holds no records
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Iterate over every entity and its record (in no particular order)
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.entity_map
            .iter()
            .filter_map(|(entity, key)| self.components.get(*key).map(|c| (*entity, c)))
    }
}

impl<T> Default for ComponentPool<T> {
    fn default() -> Self {
        Self::new()
    }
}
