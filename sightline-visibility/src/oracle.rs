//! Visibility oracle
//!
//! An [`AnalysisSession`] answers "is any part of this triangle visible from
//! the viewpoint?" by rendering a lifted probe of the triangle in the marker
//! color against the scene drawn in the occluder color, then looking for the
//! marker color inside the probe's projected footprint.

use crate::footprint::{footprint_pixels, sample_footprint};
use crate::probe::{VisibilityProbe, PROBE_LIFT};
use crate::rasterizer::{Rasterizer, RenderRequest};
use crate::resolution::SampleResolution;
use crate::viewpoint::Viewpoint;
use image::{Rgb, RgbImage};
use sightline_core::{Error, Point3f, Result};
use std::path::Path;

/// Colors and offsets used while probing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OracleConfig {
    pub marker_color: Rgb<u8>,
    pub occluder_color: Rgb<u8>,
    /// Distance the probe is moved along its face normal
    pub probe_lift: f32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            marker_color: Rgb([255, 255, 255]),
            occluder_color: Rgb([0, 0, 0]),
            probe_lift: PROBE_LIFT,
        }
    }
}

impl OracleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.marker_color == self.occluder_color {
            return Err(Error::InvalidData(
                "Marker and occluder colors must differ".to_string(),
            ));
        }
        if !self.probe_lift.is_finite() || self.probe_lift < 0.0 {
            return Err(Error::InvalidData(format!(
                "Probe lift must be finite and non-negative, got {}",
                self.probe_lift
            )));
        }
        Ok(())
    }
}

/// Counters for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub probes: usize,
    pub renders: usize,
    pub buffer_allocations: usize,
    /// Probes answered "visible" without rendering (degenerate or behind the camera)
    pub conservative_keeps: usize,
}

/// Owns the rasterizer, the viewpoint and the reusable sample buffer for
/// one analysis run.
#[derive(Debug)]
pub struct AnalysisSession<R> {
    rasterizer: R,
    viewpoint: Viewpoint,
    config: OracleConfig,
    resolution: SampleResolution,
    buffer: Option<RgbImage>,
    active: bool,
    stats: SessionStats,
}

impl<R: Rasterizer> AnalysisSession<R> {
    pub fn new(rasterizer: R, viewpoint: Viewpoint) -> Self {
        Self {
            rasterizer,
            viewpoint,
            config: OracleConfig::default(),
            resolution: SampleResolution::default(),
            buffer: None,
            active: false,
            stats: SessionStats::default(),
        }
    }

    pub fn with_config(mut self, config: OracleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_resolution(mut self, resolution: SampleResolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Validate the setup and switch the scene to occluder appearance
    pub fn begin(&mut self) -> Result<()> {
        if self.active {
            return Ok(());
        }
        self.viewpoint.validate()?;
        self.config.validate()?;
        self.rasterizer.begin_session(self.config.occluder_color)?;
        self.active = true;
        log::debug!(
            "Analysis session started at ({:.3}, {:.3}, {:.3})",
            self.viewpoint.position.x,
            self.viewpoint.position.y,
            self.viewpoint.position.z
        );
        Ok(())
    }

    /// Restore the scene's appearance. Ending an inactive session is a no-op.
    pub fn end(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.rasterizer.end_session()?;
        log::debug!(
            "Analysis session ended: {} probes, {} renders, {} buffer allocations",
            self.stats.probes,
            self.stats.renders,
            self.stats.buffer_allocations
        );
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Resolution for subsequent probes. The buffer is reallocated lazily,
    /// only when the size actually changes.
    pub fn set_resolution(&mut self, resolution: SampleResolution) {
        self.resolution = resolution;
    }

    pub fn resolution(&self) -> SampleResolution {
        self.resolution
    }

    pub fn viewpoint(&self) -> &Viewpoint {
        &self.viewpoint
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn rasterizer_mut(&mut self) -> &mut R {
        &mut self.rasterizer
    }

    /// The most recently rendered sample buffer
    pub fn last_buffer(&self) -> Option<&RgbImage> {
        self.buffer.as_ref()
    }

    /// Write the most recent sample buffer as an image file
    pub fn save_last_buffer<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let buffer = self
            .buffer
            .as_ref()
            .ok_or_else(|| Error::InvalidData("No probe has been rendered yet".to_string()))?;
        buffer
            .save(path.as_ref())
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))
    }

    /// Whether any part of the world-space triangle can be seen from the
    /// viewpoint at the current resolution.
    ///
    /// Triangles that cannot be probed (zero area, or projecting behind the
    /// camera) count as visible so they are kept.
    pub fn is_visible(&mut self, triangle: &[Point3f; 3]) -> Result<bool> {
        if !self.active {
            return Err(Error::OracleUnavailable(
                "Analysis session has not been started".to_string(),
            ));
        }
        self.stats.probes += 1;

        let Some(probe) = VisibilityProbe::new(triangle, &self.viewpoint.position, self.config.probe_lift) else {
            log::debug!("Degenerate triangle kept without probing");
            self.stats.conservative_keeps += 1;
            return Ok(true);
        };
        let Some(camera) = self.viewpoint.camera_looking_at(&probe.centroid()) else {
            self.stats.conservative_keeps += 1;
            return Ok(true);
        };
        let size = self.resolution.pixels();
        let Some(corners) = probe.screen_corners(&camera, size, size) else {
            log::trace!("Probe crosses behind the camera; kept");
            self.stats.conservative_keeps += 1;
            return Ok(true);
        };

        let stale = self
            .buffer
            .as_ref()
            .map_or(true, |b| b.dimensions() != (size, size));
        if stale {
            self.buffer = None;
            self.stats.buffer_allocations += 1;
            log::debug!("Allocating {} sample buffer", self.resolution);
        }
        let buffer = self.buffer.get_or_insert_with(|| RgbImage::new(size, size));

        let marker = probe.marker_mesh();
        let request = RenderRequest {
            camera: &camera,
            marker: &marker,
            marker_color: self.config.marker_color,
        };
        self.rasterizer.render(&request, buffer)?;
        self.stats.renders += 1;

        let pixels = footprint_pixels(&corners, size, size);
        Ok(sample_footprint(buffer, &pixels, self.config.marker_color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::{RasterizerConfig, SceneGeometry, SoftwareRasterizer};

    /// Paints a fixed rectangle of marker color, ignoring the request
    #[derive(Default)]
    struct StampRasterizer {
        rect: Option<(u32, u32, u32, u32)>,
        sessions: usize,
        open: bool,
        fail: bool,
    }

    impl Rasterizer for StampRasterizer {
        fn begin_session(&mut self, _occluder: Rgb<u8>) -> Result<()> {
            self.sessions += 1;
            self.open = true;
            Ok(())
        }

        fn end_session(&mut self) -> Result<()> {
            self.open = false;
            Ok(())
        }

        fn render(&mut self, request: &RenderRequest<'_>, target: &mut RgbImage) -> Result<()> {
            if self.fail {
                return Err(Error::Rasterizer("device lost".to_string()));
            }
            for pixel in target.pixels_mut() {
                *pixel = Rgb([0, 0, 0]);
            }
            if let Some((x0, y0, x1, y1)) = self.rect {
                for y in y0..y1.min(target.height()) {
                    for x in x0..x1.min(target.width()) {
                        target.put_pixel(x, y, request.marker_color);
                    }
                }
            }
            Ok(())
        }
    }

    /// Small triangle far in front of the origin; projects near the center
    fn distant_triangle() -> [Point3f; 3] {
        [
            Point3f::new(-0.1, -0.1, -10.0),
            Point3f::new(0.1, -0.1, -10.0),
            Point3f::new(0.0, 0.1, -10.0),
        ]
    }

    fn stamp_session(rect: Option<(u32, u32, u32, u32)>) -> AnalysisSession<StampRasterizer> {
        let rasterizer = StampRasterizer {
            rect,
            ..Default::default()
        };
        AnalysisSession::new(rasterizer, Viewpoint::default()).with_resolution(SampleResolution::R64)
    }

    #[test]
    fn test_requires_active_session() {
        let mut session = stamp_session(None);
        assert!(matches!(
            session.is_visible(&distant_triangle()),
            Err(Error::OracleUnavailable(_))
        ));
    }

    #[test]
    fn test_fixed_image_decides_visibility() {
        let mut visible = stamp_session(Some((28, 28, 36, 36)));
        visible.begin().unwrap();
        assert!(visible.is_visible(&distant_triangle()).unwrap());
        // Deterministic for the same image
        assert!(visible.is_visible(&distant_triangle()).unwrap());

        let mut hidden = stamp_session(Some((0, 0, 6, 6)));
        hidden.begin().unwrap();
        assert!(!hidden.is_visible(&distant_triangle()).unwrap());
    }

    #[test]
    fn test_buffer_reused_until_resolution_changes() {
        let mut session = stamp_session(None);
        session.begin().unwrap();
        for _ in 0..3 {
            session.is_visible(&distant_triangle()).unwrap();
        }
        assert_eq!(session.stats().buffer_allocations, 1);
        assert_eq!(session.stats().renders, 3);

        session.set_resolution(SampleResolution::R64);
        session.is_visible(&distant_triangle()).unwrap();
        assert_eq!(session.stats().buffer_allocations, 1);

        session.set_resolution(SampleResolution::R128);
        session.is_visible(&distant_triangle()).unwrap();
        assert_eq!(session.stats().buffer_allocations, 2);
        assert_eq!(session.last_buffer().unwrap().dimensions(), (128, 128));
    }

    #[test]
    fn test_degenerate_triangle_is_kept() {
        let mut session = stamp_session(None);
        session.begin().unwrap();
        let p = Point3f::new(0.0, 0.0, -5.0);
        assert!(session.is_visible(&[p, p, p]).unwrap());
        assert_eq!(session.stats().renders, 0);
        assert_eq!(session.stats().conservative_keeps, 1);
    }

    #[test]
    fn test_render_failure_propagates() {
        let mut session = AnalysisSession::new(
            StampRasterizer {
                fail: true,
                ..Default::default()
            },
            Viewpoint::default(),
        );
        session.begin().unwrap();
        assert!(matches!(
            session.is_visible(&distant_triangle()),
            Err(Error::Rasterizer(_))
        ));
    }

    #[test]
    fn test_begin_and_end_toggle_rasterizer() {
        let mut session = stamp_session(None);
        session.begin().unwrap();
        session.begin().unwrap();
        assert_eq!(session.rasterizer().sessions, 1);
        assert!(session.rasterizer().open);
        session.end().unwrap();
        session.end().unwrap();
        assert!(!session.rasterizer().open);
        assert!(!session.is_active());
    }

    #[test]
    fn test_invalid_setup_cannot_begin() {
        let mut session = AnalysisSession::new(StampRasterizer::default(), Viewpoint::default().with_fov(200.0));
        assert!(session.begin().is_err());
        assert!(!session.is_active());

        let config = OracleConfig {
            occluder_color: Rgb([255, 255, 255]),
            ..Default::default()
        };
        let mut session = AnalysisSession::new(StampRasterizer::default(), Viewpoint::default()).with_config(config);
        assert!(session.begin().is_err());
    }

    #[test]
    fn test_software_occlusion() {
        // Wall between the viewpoint and the triangle
        let wall = SceneGeometry::new(
            "wall",
            vec![
                [
                    Point3f::new(-5.0, -5.0, -3.0),
                    Point3f::new(5.0, -5.0, -3.0),
                    Point3f::new(5.0, 5.0, -3.0),
                ],
                [
                    Point3f::new(-5.0, -5.0, -3.0),
                    Point3f::new(5.0, 5.0, -3.0),
                    Point3f::new(-5.0, 5.0, -3.0),
                ],
            ],
        );
        let mut open = AnalysisSession::new(SoftwareRasterizer::new(RasterizerConfig::default()), Viewpoint::default())
            .with_resolution(SampleResolution::R128);
        open.begin().unwrap();
        assert!(open.is_visible(&distant_triangle()).unwrap());

        let rasterizer = SoftwareRasterizer::new(RasterizerConfig::default()).with_scene(vec![wall]);
        let mut blocked = AnalysisSession::new(rasterizer, Viewpoint::default()).with_resolution(SampleResolution::R128);
        blocked.begin().unwrap();
        assert!(!blocked.is_visible(&distant_triangle()).unwrap());
    }

    #[test]
    fn test_room_floor_hides_triangle_below() {
        let eye = Viewpoint::new(Point3f::new(0.0, 1.0, 0.0));
        let below = [
            Point3f::new(-0.5, -1.0, -5.5),
            Point3f::new(-0.5, -1.0, -4.5),
            Point3f::new(0.5, -1.0, -4.5),
        ];
        let floor = |half: f32| {
            SceneGeometry::new(
                "floor",
                vec![
                    [
                        Point3f::new(-half, 0.0, -half),
                        Point3f::new(-half, 0.0, half),
                        Point3f::new(half, 0.0, half),
                    ],
                    [
                        Point3f::new(-half, 0.0, -half),
                        Point3f::new(half, 0.0, half),
                        Point3f::new(half, 0.0, -half),
                    ],
                ],
            )
        };

        for half in [10.0, 50.0] {
            let rasterizer = SoftwareRasterizer::new(RasterizerConfig::default()).with_scene(vec![floor(half)]);
            let mut session = AnalysisSession::new(rasterizer, eye).with_resolution(SampleResolution::R128);
            session.begin().unwrap();
            assert!(!session.is_visible(&below).unwrap(), "floor half-extent {}", half);
        }
    }
}
