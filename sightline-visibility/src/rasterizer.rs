//! Rendering backends for the visibility oracle
//!
//! The oracle does not care how the marker and the occluding scene reach the
//! sample buffer, only that after [`Rasterizer::render`] every marker pixel
//! not hidden by scene geometry carries the marker color. During a session
//! the scene is drawn in the occluder color so the marker color is unique.

use crate::probe::MarkerMesh;
use crate::viewpoint::{clip_to_screen, ViewCamera};
use image::{Rgb, RgbImage};
use nalgebra::Vector4;
use sightline_core::{Error, MeshRecord, Point2f, Point3f, Result, WorldTransform};

/// Everything needed to draw one probe
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub camera: &'a ViewCamera,
    pub marker: &'a MarkerMesh,
    pub marker_color: Rgb<u8>,
}

/// Draws the marker and the occluding scene into a sample buffer
pub trait Rasterizer {
    /// Switch the scene to the flat occluder appearance
    fn begin_session(&mut self, occluder: Rgb<u8>) -> Result<()>;

    /// Restore the scene's normal appearance
    fn end_session(&mut self) -> Result<()>;

    /// Clear `target` and draw the scene plus the marker into it
    fn render(&mut self, request: &RenderRequest<'_>, target: &mut RgbImage) -> Result<()>;
}

/// World-space triangles that occlude probes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneGeometry {
    pub name: String,
    pub triangles: Vec<[Point3f; 3]>,
}

impl SceneGeometry {
    pub fn new(name: impl Into<String>, triangles: Vec<[Point3f; 3]>) -> Self {
        Self {
            name: name.into(),
            triangles,
        }
    }

    /// Every live triangle of `mesh` placed by `transform`
    pub fn from_mesh(mesh: &MeshRecord, transform: &WorldTransform) -> Self {
        let triangles = mesh
            .triangles
            .iter()
            .filter_map(|(slot, _)| mesh.world_triangle(slot, transform))
            .collect();
        Self::new(mesh.name.clone(), triangles)
    }
}

/// Settings for [`SoftwareRasterizer`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizerConfig {
    /// Clear color of the sample buffer
    pub background: Rgb<u8>,
    /// Scene color outside an analysis session
    pub scene_color: Rgb<u8>,
    /// Skip triangles whose winding is clockwise on screen
    pub cull_back_faces: bool,
}

impl Default for RasterizerConfig {
    fn default() -> Self {
        Self {
            background: Rgb([0, 0, 0]),
            scene_color: Rgb([128, 128, 128]),
            cull_back_faces: true,
        }
    }
}

/// CPU depth-buffered triangle rasterizer.
///
/// Covers pixel centers with barycentric edge tests and keeps the fragment
/// with the largest interpolated `1/w`. Triangles crossing the near plane
/// are clipped in homogeneous space before the divide.
#[derive(Debug, Clone, Default)]
pub struct SoftwareRasterizer {
    config: RasterizerConfig,
    scene: Vec<SceneGeometry>,
    occluder: Option<Rgb<u8>>,
    depth: Vec<f32>,
}

struct ProjectedVertex {
    screen: Point2f,
    inverse_w: f32,
}

impl SoftwareRasterizer {
    /// Create a rasterizer with an empty scene
    pub fn new(config: RasterizerConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replace the occluding scene
    pub fn with_scene(mut self, scene: Vec<SceneGeometry>) -> Self {
        self.scene = scene;
        self
    }

    /// Add one object to the occluding scene
    pub fn add_geometry(&mut self, geometry: SceneGeometry) {
        self.scene.push(geometry);
    }

    pub fn scene(&self) -> &[SceneGeometry] {
        &self.scene
    }

    pub fn config(&self) -> &RasterizerConfig {
        &self.config
    }

    /// Whether an analysis session is currently active
    pub fn in_session(&self) -> bool {
        self.occluder.is_some()
    }

    fn project(clip: &Vector4<f32>, width: u32, height: u32) -> Option<ProjectedVertex> {
        let screen = clip_to_screen(clip, width, height)?;
        Some(ProjectedVertex {
            screen,
            inverse_w: 1.0 / clip.w,
        })
    }

    fn draw_triangle(
        &mut self,
        camera: &ViewCamera,
        triangle: &[Point3f; 3],
        color: Rgb<u8>,
        target: &mut RgbImage,
    ) {
        let view_projection = camera.view_projection();
        let clip = triangle.map(|p| view_projection * p.to_homogeneous());
        for piece in clip_near(&clip) {
            self.fill_clipped(&piece, color, target);
        }
    }

    fn fill_clipped(&mut self, clip: &[Vector4<f32>; 3], color: Rgb<u8>, target: &mut RgbImage) {
        let (width, height) = target.dimensions();
        let [Some(a), Some(b), Some(c)] = clip.map(|v| Self::project(&v, width, height)) else {
            return;
        };

        // Screen y points down, so counter-clockwise in NDC is negative here
        let area = edge(&a.screen, &b.screen, &c.screen);
        if area.abs() <= f32::EPSILON || !area.is_finite() {
            return;
        }
        if self.config.cull_back_faces && area > 0.0 {
            return;
        }

        let min_x = a.screen.x.min(b.screen.x).min(c.screen.x).floor().max(0.0) as u32;
        let min_y = a.screen.y.min(b.screen.y).min(c.screen.y).floor().max(0.0) as u32;
        let max_x = a.screen.x.max(b.screen.x).max(c.screen.x).ceil().min(width as f32) as u32;
        let max_y = a.screen.y.max(b.screen.y).max(c.screen.y).ceil().min(height as f32) as u32;

        for y in min_y..max_y {
            for x in min_x..max_x {
                let p = Point2f::new(x as f32 + 0.5, y as f32 + 0.5);
                let w0 = edge(&b.screen, &c.screen, &p) / area;
                let w1 = edge(&c.screen, &a.screen, &p) / area;
                let w2 = edge(&a.screen, &b.screen, &p) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let inverse_w = w0 * a.inverse_w + w1 * b.inverse_w + w2 * c.inverse_w;
                let index = (y * width + x) as usize;
                if inverse_w > self.depth[index] {
                    self.depth[index] = inverse_w;
                    target.put_pixel(x, y, color);
                }
            }
        }
    }
}

/// Signed distance to the near plane in clip space, `z >= -w` inside
fn near_distance(v: &Vector4<f32>) -> f32 {
    v.z + v.w
}

/// Clip a triangle against the near plane before the perspective divide.
///
/// Returns zero, one or two triangles with the original winding.
fn clip_near(triangle: &[Vector4<f32>; 3]) -> Vec<[Vector4<f32>; 3]> {
    let inside = triangle.map(|v| near_distance(&v) >= 0.0);
    if inside.iter().all(|&i| i) {
        return vec![*triangle];
    }
    if !inside.iter().any(|&i| i) {
        return Vec::new();
    }

    let mut polygon: Vec<Vector4<f32>> = Vec::with_capacity(4);
    for i in 0..3 {
        let current = triangle[i];
        let next = triangle[(i + 1) % 3];
        let (d_current, d_next) = (near_distance(&current), near_distance(&next));
        if d_current >= 0.0 {
            polygon.push(current);
        }
        if (d_current >= 0.0) != (d_next >= 0.0) {
            let t = d_current / (d_current - d_next);
            polygon.push(current + (next - current) * t);
        }
    }

    (1..polygon.len().saturating_sub(1))
        .map(|i| [polygon[0], polygon[i], polygon[i + 1]])
        .collect()
}

fn edge(a: &Point2f, b: &Point2f, p: &Point2f) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

impl Rasterizer for SoftwareRasterizer {
    fn begin_session(&mut self, occluder: Rgb<u8>) -> Result<()> {
        self.occluder = Some(occluder);
        log::debug!(
            "Rasterizer session started with {} scene objects",
            self.scene.len()
        );
        Ok(())
    }

    fn end_session(&mut self) -> Result<()> {
        self.occluder = None;
        Ok(())
    }

    fn render(&mut self, request: &RenderRequest<'_>, target: &mut RgbImage) -> Result<()> {
        let (width, height) = target.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::Rasterizer("Sample buffer has zero size".to_string()));
        }

        for pixel in target.pixels_mut() {
            *pixel = self.config.background;
        }
        self.depth.clear();
        self.depth.resize((width * height) as usize, 0.0);

        let scene_color = self.occluder.unwrap_or(self.config.scene_color);
        let scene = std::mem::take(&mut self.scene);
        for geometry in &scene {
            for triangle in &geometry.triangles {
                self.draw_triangle(request.camera, triangle, scene_color, target);
            }
        }
        self.scene = scene;

        let marker = request.marker.world_vertices();
        self.draw_triangle(request.camera, &marker, request.marker_color, target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{VisibilityProbe, PROBE_LIFT};
    use crate::viewpoint::Viewpoint;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    /// Square in the y = height plane, wound to face +y
    fn floor_square(height: f32, half: f32) -> Vec<[Point3f; 3]> {
        let a = Point3f::new(-half, height, -half);
        let b = Point3f::new(-half, height, half);
        let c = Point3f::new(half, height, half);
        let d = Point3f::new(half, height, -half);
        vec![[a, b, c], [a, c, d]]
    }

    fn render_probe(rasterizer: &mut SoftwareRasterizer, source: &[Point3f; 3], eye: Point3f) -> RgbImage {
        let probe = VisibilityProbe::new(source, &eye, PROBE_LIFT).unwrap();
        let camera = Viewpoint::new(eye).camera_looking_at(&probe.centroid()).unwrap();
        let marker = probe.marker_mesh();
        let mut target = RgbImage::new(64, 64);
        let request = RenderRequest {
            camera: &camera,
            marker: &marker,
            marker_color: WHITE,
        };
        rasterizer.render(&request, &mut target).unwrap();
        target
    }

    fn count(image: &RgbImage, color: Rgb<u8>) -> usize {
        image.pixels().filter(|p| **p == color).count()
    }

    #[test]
    fn test_unoccluded_marker_is_drawn() {
        let mut rasterizer = SoftwareRasterizer::new(RasterizerConfig::default());
        let source = floor_square(0.0, 1.0)[0];
        let image = render_probe(&mut rasterizer, &source, Point3f::new(0.0, 4.0, 0.0));
        assert!(count(&image, WHITE) > 0);
    }

    #[test]
    fn test_marker_behind_occluder_is_hidden() {
        let occluder = SceneGeometry::new("roof", floor_square(2.0, 5.0));
        let mut rasterizer = SoftwareRasterizer::new(RasterizerConfig::default()).with_scene(vec![occluder]);
        rasterizer.begin_session(BLACK).unwrap();
        let source = floor_square(0.0, 1.0)[0];
        let image = render_probe(&mut rasterizer, &source, Point3f::new(0.0, 4.0, 0.0));
        assert_eq!(count(&image, WHITE), 0);
        rasterizer.end_session().unwrap();
        assert!(!rasterizer.in_session());
    }

    #[test]
    fn test_back_facing_marker_is_culled() {
        let mut rasterizer = SoftwareRasterizer::new(RasterizerConfig::default());
        let source = floor_square(0.0, 1.0)[0];
        let image = render_probe(&mut rasterizer, &source, Point3f::new(0.0, -4.0, 0.0));
        assert_eq!(count(&image, WHITE), 0);
    }

    #[test]
    fn test_scene_color_outside_session() {
        let floor = SceneGeometry::new("floor", floor_square(-0.5, 3.0));
        let mut rasterizer = SoftwareRasterizer::new(RasterizerConfig::default()).with_scene(vec![floor]);
        let source = floor_square(0.0, 1.0)[0];
        let image = render_probe(&mut rasterizer, &source, Point3f::new(0.0, 4.0, 0.0));
        assert!(count(&image, rasterizer.config().scene_color) > 0);

        rasterizer.begin_session(BLACK).unwrap();
        let image = render_probe(&mut rasterizer, &source, Point3f::new(0.0, 4.0, 0.0));
        assert_eq!(count(&image, rasterizer.config().scene_color), 0);
    }

    #[test]
    fn test_floor_extending_behind_viewer_occludes() {
        // Room floor passing under and behind the viewer hides what lies below it
        let floor = SceneGeometry::new("floor", floor_square(0.0, 50.0));
        let mut rasterizer = SoftwareRasterizer::new(RasterizerConfig::default()).with_scene(vec![floor]);
        rasterizer.begin_session(BLACK).unwrap();
        let source = [
            Point3f::new(-0.5, -1.0, -5.5),
            Point3f::new(-0.5, -1.0, -4.5),
            Point3f::new(0.5, -1.0, -4.5),
        ];
        let image = render_probe(&mut rasterizer, &source, Point3f::new(0.0, 1.0, 0.0));
        assert_eq!(count(&image, WHITE), 0);
    }

    #[test]
    fn test_clip_near_splits_crossing_triangles() {
        let inside = Vector4::new(0.0, 0.0, 0.0, 1.0);
        let behind = Vector4::new(0.0, 0.0, -2.0, -1.0);
        assert_eq!(clip_near(&[inside, inside, inside]).len(), 1);
        assert!(clip_near(&[behind, behind, behind]).is_empty());

        let one_in = clip_near(&[inside, behind, behind]);
        assert_eq!(one_in.len(), 1);
        let two_in = clip_near(&[inside, inside, behind]);
        assert_eq!(two_in.len(), 2);
        for v in one_in.iter().chain(two_in.iter()).flatten() {
            assert!(near_distance(v) >= -1e-6);
        }
    }

    #[test]
    fn test_zero_sized_target_is_an_error() {
        let mut rasterizer = SoftwareRasterizer::default();
        let source = floor_square(0.0, 1.0)[0];
        let eye = Point3f::new(0.0, 4.0, 0.0);
        let probe = VisibilityProbe::new(&source, &eye, PROBE_LIFT).unwrap();
        let camera = Viewpoint::new(eye).camera_looking_at(&probe.centroid()).unwrap();
        let marker = probe.marker_mesh();
        let request = RenderRequest {
            camera: &camera,
            marker: &marker,
            marker_color: WHITE,
        };
        assert!(rasterizer.render(&request, &mut RgbImage::new(0, 0)).is_err());
    }
}
