//! ECS Systems module

pub mod deform;
pub mod transform_system;

pub use deform::{DeformError, DeformSystem};
pub use transform_system::{
    compose_with_parent, local_sqt_relative_to, MatrixHookHandler, PlainComposition, TransformError, TransformSystem,
};
