//! Entity event queue
//!
//! Structural changes made by the transform hierarchy are recorded here and
//! delivered synchronously by the [`World`](crate::ecs::World) before the
//! operation that produced them returns. Events are delivered in the order they
//! were sent.

use crate::ecs::Entity;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// An entity was attached to, moved between, or detached from parents
    ParentChanged,
    /// An entity's bounding box was replaced
    AabbChanged,
}

/// Structural event raised by the transform hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityEvent {
    /// `target` moved from `old_parent` to `new_parent` (either may be null)
    ParentChanged {
        /// Entity whose parent changed
        target: Entity,
        /// Previous parent, or [`Entity::NULL`]
        old_parent: Entity,
        /// New parent, or [`Entity::NULL`]
        new_parent: Entity,
    },
    /// `target` received a new bounding box
    AabbChanged {
        /// Entity whose bounding box changed
        target: Entity,
    },
}

impl EntityEvent {
    /// Type of this event
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::ParentChanged { .. } => EventType::ParentChanged,
            Self::AabbChanged { .. } => EventType::AabbChanged,
        }
    }

    /// Entity the event is about
    pub const fn target(&self) -> Entity {
        match self {
            Self::ParentChanged { target, .. } | Self::AabbChanged { target } => *target,
        }
    }
}

/// FIFO queue of pending entity events
#[derive(Debug, Default)]
pub struct EventQueue {
    immediate_queue: Vec<EntityEvent>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an event for delivery
    pub fn send(&mut self, event: EntityEvent) {
        self.immediate_queue.push(event);
    }

    /// Take every pending event, oldest first
    pub fn drain(&mut self) -> Vec<EntityEvent> {
        std::mem::take(&mut self.immediate_queue)
    }

    /// Whether no events are pending
    pub fn is_empty(&self) -> bool {
        self.immediate_queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order() {
        let mut queue = EventQueue::new();
        let a = Entity::from_raw(1);
        let b = Entity::from_raw(2);

        queue.send(EntityEvent::AabbChanged { target: a });
        queue.send(EntityEvent::ParentChanged {
            target: b,
            old_parent: Entity::NULL,
            new_parent: a,
        });

        let events = queue.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type(), EventType::AabbChanged);
        assert_eq!(events[1].target(), b);
        assert!(queue.is_empty());
    }
}
