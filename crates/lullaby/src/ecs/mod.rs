//! Entity-Component-System implementation
//!
//! Entities are plain ids. The transform hierarchy and the deform system keep
//! their own component pools and are tied together by the [`World`].

pub mod components;
pub mod entity;
pub mod systems;
pub mod world;

#[cfg(test)]
mod tests;

pub use entity::Entity;
pub use world::{World, WorldError};
