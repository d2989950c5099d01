//! Per-mesh settings and reports

use serde::{Deserialize, Serialize};
use sightline_core::{Error, Result};
use sightline_simplification::DEFAULT_THRESHOLD_DEGREES;
use sightline_visibility::SampleResolution;

/// How one mesh is analyzed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSettings {
    /// Size of the square sample buffer used while culling
    pub sample_resolution: SampleResolution,
    /// Decimation tolerance in degrees
    pub threshold_degrees: f32,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            sample_resolution: SampleResolution::default(),
            threshold_degrees: DEFAULT_THRESHOLD_DEGREES,
        }
    }
}

impl MeshSettings {
    pub fn with_resolution(mut self, sample_resolution: SampleResolution) -> Self {
        self.sample_resolution = sample_resolution;
        self
    }

    pub fn with_threshold(mut self, threshold_degrees: f32) -> Self {
        self.threshold_degrees = threshold_degrees;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.threshold_degrees.is_finite() || !(0.0..=180.0).contains(&self.threshold_degrees) {
            return Err(Error::InvalidData(format!(
                "Threshold angle must be between 0 and 180 degrees, got {}",
                self.threshold_degrees
            )));
        }
        Ok(())
    }
}

/// What happened to one mesh
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshReport {
    pub name: String,
    pub triangles_before: usize,
    pub triangles_after: usize,
    pub vertices_before: usize,
    pub vertices_after: usize,
    pub triangles_culled: usize,
    pub decimation_passes: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl MeshReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Fraction of the original triangles that remain, 1.0 for empty meshes
    pub fn triangle_ratio(&self) -> f32 {
        if self.triangles_before == 0 {
            1.0
        } else {
            self.triangles_after as f32 / self.triangles_before as f32
        }
    }
}
