//! # Rendering Collaborator
//!
//! Mesh data and the mesh system that defers loads until deformation is known.
//! The deform core never owns vertex memory; it only receives a flat view of a
//! vertex buffer while a mesh is being finalized.

// Core primitives
pub mod primitives;

// Systems
pub mod mesh_system;

pub use mesh_system::{MeshDeformer, MeshSystem};
pub use primitives::{Mesh, Vertex};
