//! Core primitive types for rendering

pub mod mesh;

pub use mesh::{Mesh, Vertex};
