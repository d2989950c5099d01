//! Small geometric helpers shared by the decimator and the visibility probe

use crate::point::{Point3f, Vector3f};

/// Squared length below which a vector has no usable direction
pub const DEGENERATE_LENGTH_SQUARED: f32 = 1e-12;

/// Unsigned angle between two directions in degrees, in `[0, 180]`.
///
/// Returns `None` when either vector is zero-length or not finite, since the
/// angle is undefined there. Uses `atan2(|a x b|, a . b)`, which returns exactly
/// zero for identical inputs.
pub fn angle_between_degrees(a: &Vector3f, b: &Vector3f) -> Option<f32> {
    if !is_usable_direction(a) || !is_usable_direction(b) {
        return None;
    }
    let cross = a.cross(b).norm();
    let dot = a.dot(b);
    Some(cross.atan2(dot).to_degrees())
}

/// Whether `v` is finite and long enough to normalize.
pub fn is_usable_direction(v: &Vector3f) -> bool {
    v.iter().all(|c| c.is_finite()) && v.norm_squared() > DEGENERATE_LENGTH_SQUARED
}

/// Unit normal of the triangle `(v0, v1, v2)` following its winding,
/// or `None` for zero-area triangles.
pub fn face_normal(v0: &Point3f, v1: &Point3f, v2: &Point3f) -> Option<Vector3f> {
    let n = (v1 - v0).cross(&(v2 - v0));
    if !is_usable_direction(&n) {
        return None;
    }
    Some(n.normalize())
}

/// Arithmetic mean of the three corners.
pub fn centroid(vertices: &[Point3f; 3]) -> Point3f {
    Point3f::from((vertices[0].coords + vertices[1].coords + vertices[2].coords) / 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identical_directions_are_exactly_zero() {
        let n = Vector3f::new(0.3, 0.5, 0.8).normalize();
        assert_eq!(angle_between_degrees(&n, &n), Some(0.0));
    }

    #[test]
    fn test_right_and_opposite_angles() {
        let x = Vector3f::x();
        let y = Vector3f::y();
        assert_relative_eq!(angle_between_degrees(&x, &y).unwrap(), 90.0, epsilon = 1e-4);
        assert_relative_eq!(angle_between_degrees(&x, &-x).unwrap(), 180.0, epsilon = 1e-4);
    }

    #[test]
    fn test_zero_vector_has_no_angle() {
        assert!(angle_between_degrees(&Vector3f::zeros(), &Vector3f::x()).is_none());
        assert!(angle_between_degrees(&Vector3f::new(f32::NAN, 0.0, 1.0), &Vector3f::x()).is_none());
    }

    #[test]
    fn test_face_normal_follows_winding() {
        let a = Point3f::new(0.0, 0.0, 0.0);
        let b = Point3f::new(1.0, 0.0, 0.0);
        let c = Point3f::new(0.0, 1.0, 0.0);
        assert_relative_eq!(face_normal(&a, &b, &c).unwrap(), Vector3f::z());
        assert_relative_eq!(face_normal(&a, &c, &b).unwrap(), -Vector3f::z());
        assert!(face_normal(&a, &b, &Point3f::new(2.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_centroid() {
        let c = centroid(&[
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(3.0, 0.0, 0.0),
            Point3f::new(0.0, 3.0, 3.0),
        ]);
        assert_relative_eq!(c, Point3f::new(1.0, 1.0, 1.0));
    }
}
