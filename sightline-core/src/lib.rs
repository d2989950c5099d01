//! Core data structures for sightline
//!
//! This crate provides the mesh record that every optimization stage mutates,
//! the triangle arena backing its index buffer, world transforms, per-vertex
//! attribute types and the shared error type.

pub mod error;
pub mod geometry;
pub mod mesh;
pub mod point;
pub mod transform;
pub mod triangles;

pub use error::*;
pub use geometry::*;
pub use mesh::*;
pub use point::*;
pub use transform::*;
pub use triangles::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Isometry3, Matrix4, Point2, Point3, UnitQuaternion, Vector3};
