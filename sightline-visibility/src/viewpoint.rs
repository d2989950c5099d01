//! Fixed viewpoint and the per-probe camera aimed from it

use nalgebra::{Matrix4, Perspective3, Vector4};
use serde::{Deserialize, Serialize};
use sightline_core::{is_usable_direction, Error, Point2f, Point3f, Result, Vector3f};

/// Clip-space `w` below which a point counts as behind the camera
const MIN_CLIP_W: f32 = 1e-6;

/// The position the scene is analyzed from, plus lens settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewpoint {
    pub position: Point3f,
    /// Vertical field of view in degrees
    #[serde(default = "default_fov")]
    pub fov_y_degrees: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
}

fn default_fov() -> f32 {
    60.0
}

fn default_near() -> f32 {
    0.3
}

fn default_far() -> f32 {
    1000.0
}

impl Viewpoint {
    pub fn new(position: Point3f) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_fov(mut self, fov_y_degrees: f32) -> Self {
        self.fov_y_degrees = fov_y_degrees;
        self
    }

    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Check that the viewpoint can produce a projection
    pub fn validate(&self) -> Result<()> {
        if !self.position.iter().all(|c| c.is_finite()) {
            return Err(Error::OracleUnavailable("Viewpoint position is not finite".to_string()));
        }
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            return Err(Error::OracleUnavailable(format!(
                "Field of view must be in (0, 180) degrees, got {}",
                self.fov_y_degrees
            )));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(Error::OracleUnavailable(format!(
                "Clip planes must satisfy 0 < near < far, got near {} far {}",
                self.near, self.far
            )));
        }
        Ok(())
    }

    /// A square-aspect camera at this viewpoint looking at `target`.
    ///
    /// `None` when the target coincides with the viewpoint.
    pub fn camera_looking_at(&self, target: &Point3f) -> Option<ViewCamera> {
        let direction = target - self.position;
        if !is_usable_direction(&direction) {
            return None;
        }
        let up = if direction.normalize().dot(&Vector3f::y()).abs() > 0.999 {
            Vector3f::z()
        } else {
            Vector3f::y()
        };
        let view = Matrix4::look_at_rh(&self.position, target, &up);
        let projection =
            Perspective3::new(1.0, self.fov_y_degrees.to_radians(), self.near, self.far).into_inner();
        Some(ViewCamera {
            position: self.position,
            target: *target,
            view,
            projection,
        })
    }
}

impl Default for Viewpoint {
    fn default() -> Self {
        Self {
            position: Point3f::origin(),
            fov_y_degrees: default_fov(),
            near: default_near(),
            far: default_far(),
        }
    }
}

/// Camera for one probe render
#[derive(Debug, Clone, PartialEq)]
pub struct ViewCamera {
    pub position: Point3f,
    pub target: Point3f,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

impl ViewCamera {
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view
    }

    /// Homogeneous clip-space coordinates of a world point
    pub fn to_clip(&self, point: &Point3f) -> Vector4<f32> {
        self.view_projection() * point.to_homogeneous()
    }

    /// Pixel coordinates of a world point on a `width` x `height` target,
    /// x to the right and y down. `None` for points behind the camera.
    pub fn project_to_screen(&self, point: &Point3f, width: u32, height: u32) -> Option<Point2f> {
        clip_to_screen(&self.to_clip(point), width, height)
    }
}

/// Perspective divide and viewport mapping
pub fn clip_to_screen(clip: &Vector4<f32>, width: u32, height: u32) -> Option<Point2f> {
    if clip.w <= MIN_CLIP_W {
        return None;
    }
    let ndc_x = clip.x / clip.w;
    let ndc_y = clip.y / clip.w;
    Some(Point2f::new(
        (ndc_x + 1.0) * 0.5 * width as f32,
        (1.0 - ndc_y) * 0.5 * height as f32,
    ))
}
