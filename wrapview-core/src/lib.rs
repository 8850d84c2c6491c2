//! Core data structures and traits for wrapview
//! 
//! This crate provides the value types shared by the staging pipeline and
//! the viewer: points, point clouds, triangle meshes, bounding boxes and the
//! common error type.

pub mod point;
pub mod point_cloud;
pub mod mesh;
pub mod traits;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use mesh::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};
