//! # Lullaby Deform
//!
//! Deformation of entity hierarchies: a deformer entity bends the flat layout
//! of its deformed descendants around a cylinder or along authored waypoint
//! paths, and bends their meshes to match.
//!
//! ## Features
//!
//! - **Transform hierarchy**: Parent/child transforms with eagerly cached world matrices
//! - **Deform modes**: Cylinder bend, legacy global cylinder and waypoint paths
//! - **Mesh deformation**: Vertex buffers bent once when a mesh is finalized
//! - **Blueprints**: Entity trees described in RON or TOML
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lullaby::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     lullaby::foundation::logging::init();
//!
//!     let mut world = World::new();
//!     let blueprint = Blueprint::default()
//!         .with_deformer(DeformerDef::cylinder_bend(2.0))
//!         .with_child(
//!             Blueprint::new(TransformDef::at(Vec3::new(1.0, 0.0, 0.0))).with_deformed(DeformedDef::default()),
//!         );
//!     let panel = world.create_from_blueprint(&blueprint)?;
//!
//!     let child = world.transforms().children(panel)[0];
//!     println!("{:?}", world.world_from_entity(child));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod ecs;
pub mod events;
pub mod foundation;
pub mod render;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        config::{Blueprint, Config, DeformedDef, DeformerDef, TransformDef, WaypointDef, WaypointPathDef},
        ecs::{
            components::{DeformMode, PathId},
            systems::{DeformError, TransformError},
            Entity, World, WorldError,
        },
        foundation::math::{Aabb, Mat4, Quat, Sqt, Vec3},
        render::Mesh,
    };
}
