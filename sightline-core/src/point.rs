//! Point, vector and per-vertex attribute types

use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 2D point, used for projected screen coordinates
pub type Point2f = Point2<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// Texture coordinates (UV mapping)
pub type UV = [f32; 2];

/// Tangent vector with handedness information
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tangent {
    /// Tangent vector
    pub vector: Vector3f,
    /// Handedness (-1.0 or 1.0)
    pub handedness: f32,
}

impl Tangent {
    /// Create a new tangent with vector and handedness
    pub fn new(vector: Vector3f, handedness: f32) -> Self {
        Self { vector, handedness }
    }

    /// Create a tangent from a vector (handedness = 1.0)
    pub fn from_vector(vector: Vector3f) -> Self {
        Self::new(vector, 1.0)
    }
}

impl Default for Tangent {
    fn default() -> Self {
        Self::from_vector(Vector3f::new(1.0, 0.0, 0.0))
    }
}
