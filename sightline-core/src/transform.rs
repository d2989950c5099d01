//! World transforms that place a mesh record in the scene

use nalgebra::{Matrix4, Point3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Local-to-world transformation of one scene mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldTransform {
    pub matrix: Matrix4<f32>,
}

impl WorldTransform {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3<f32>) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Translation, then rotation, then non-uniform scale, applied to a local point
    /// in the order scale -> rotate -> translate.
    pub fn from_trs(
        translation: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        let matrix = Translation3::from(translation).to_homogeneous()
            * rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&scale);
        Self { matrix }
    }

    /// Like [`WorldTransform::from_trs`] with the rotation given as Euler angles in degrees
    pub fn from_euler_degrees(translation: Vector3<f32>, euler: Vector3<f32>, scale: Vector3<f32>) -> Self {
        let rotation = UnitQuaternion::from_euler_angles(
            euler.x.to_radians(),
            euler.y.to_radians(),
            euler.z.to_radians(),
        );
        Self::from_trs(translation, rotation, scale)
    }

    /// Apply the transformation to a point
    pub fn transform_point(&self, point: &Point3<f32>) -> Point3<f32> {
        let homogeneous = self.matrix * point.to_homogeneous();
        Point3::from_homogeneous(homogeneous).unwrap_or(*point)
    }

    /// `self` applied after `child`, as for a node nested under a parent
    pub fn compose(&self, child: &WorldTransform) -> Self {
        Self {
            matrix: self.matrix * child.matrix,
        }
    }

    /// Get the inverse transformation
    pub fn inverse(self) -> Option<Self> {
        self.matrix.try_inverse().map(|inv_matrix| Self {
            matrix: inv_matrix,
        })
    }

    /// Check if this is approximately the identity transformation
    pub fn is_identity(&self, epsilon: f32) -> bool {
        (self.matrix - Matrix4::identity()).norm() < epsilon
    }
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Matrix4<f32>> for WorldTransform {
    fn from(matrix: Matrix4<f32>) -> Self {
        Self { matrix }
    }
}
