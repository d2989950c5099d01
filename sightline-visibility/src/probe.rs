//! Probe triangles
//!
//! A probe is a copy of a source triangle lifted a small distance along its
//! face normal so it renders in front of the surface it was taken from. The
//! marker mesh carries the probe in a local frame centered on its centroid
//! and turned to face the viewpoint.

use crate::viewpoint::ViewCamera;
use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use sightline_core::{centroid, face_normal, is_usable_direction, Point2f, Point3f, Vector3f};

/// Default lift along the face normal, in world units
pub const PROBE_LIFT: f32 = 0.001;

/// A lifted copy of one source triangle
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityProbe {
    world: [Point3f; 3],
    normal: Vector3f,
    frame: Isometry3<f32>,
    local: [Point3f; 3],
}

impl VisibilityProbe {
    /// Build a probe for `source` (world space) as seen from `viewpoint`.
    ///
    /// Returns `None` for a degenerate source triangle, which has no face normal.
    pub fn new(source: &[Point3f; 3], viewpoint: &Point3f, lift: f32) -> Option<Self> {
        let normal = face_normal(&source[0], &source[1], &source[2])?;
        let world = source.map(|p| p + normal * lift);
        let center = centroid(&world);
        let frame = Isometry3::from_parts(
            Translation3::from(center.coords),
            facing_rotation(&center, viewpoint),
        );
        let local = world.map(|p| frame.inverse_transform_point(&p));
        Some(Self {
            world,
            normal,
            frame,
            local,
        })
    }

    /// Get the lifted vertices in world space
    pub fn world_vertices(&self) -> &[Point3f; 3] {
        &self.world
    }

    /// Get the lifted vertices relative to [`VisibilityProbe::frame`]
    pub fn local_vertices(&self) -> &[Point3f; 3] {
        &self.local
    }

    /// Get the unit face normal of the source triangle
    pub fn normal(&self) -> &Vector3f {
        &self.normal
    }

    /// Get the centroid of the lifted triangle
    pub fn centroid(&self) -> Point3f {
        Point3f::from(self.frame.translation.vector)
    }

    /// Get the frame at the centroid, facing the viewpoint
    pub fn frame(&self) -> &Isometry3<f32> {
        &self.frame
    }

    /// Create the marker drawn for this probe
    pub fn marker_mesh(&self) -> MarkerMesh {
        MarkerMesh {
            frame: self.frame,
            vertices: self.local,
        }
    }

    /// Pixel positions of the lifted vertices, or `None` if any lies behind
    /// the camera.
    pub fn screen_corners(&self, camera: &ViewCamera, width: u32, height: u32) -> Option<[Point2f; 3]> {
        let [a, b, c] = &self.world;
        Some([
            camera.project_to_screen(a, width, height)?,
            camera.project_to_screen(b, width, height)?,
            camera.project_to_screen(c, width, height)?,
        ])
    }
}

/// Local-space triangle placed in the world by `frame`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerMesh {
    pub frame: Isometry3<f32>,
    pub vertices: [Point3f; 3],
}

impl MarkerMesh {
    /// Marker vertices placed by its frame
    pub fn world_vertices(&self) -> [Point3f; 3] {
        self.vertices.map(|p| self.frame.transform_point(&p))
    }
}

fn facing_rotation(center: &Point3f, viewpoint: &Point3f) -> UnitQuaternion<f32> {
    let direction = viewpoint - center;
    if !is_usable_direction(&direction) {
        return UnitQuaternion::identity();
    }
    let up = if direction.normalize().dot(&Vector3f::y()).abs() > 0.999 {
        Vector3f::z()
    } else {
        Vector3f::y()
    };
    UnitQuaternion::face_towards(&direction, &up)
}
