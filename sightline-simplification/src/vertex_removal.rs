//! Angle-threshold vertex decimation
//!
//! A vertex is removable when the normals of every vertex of every adjoining
//! triangle lie within `threshold_degrees` of its own normal. Removing it
//! deletes its adjoining triangles and refills the hole with a fan over the
//! boundary loop, so each removal trades `k` triangles for `k - 2`.

use crate::adjacency::AdjacencyIndex;
use crate::boundary_loop::{build_loop, fan_triangles};
use crate::compaction::compact;
use crate::MeshSimplifier;
use sightline_core::{angle_between_degrees, Error, MeshRecord, Result};

/// Default tolerance, matching the usual tool setting
pub const DEFAULT_THRESHOLD_DEGREES: f32 = 40.0;

/// Summary of a decimation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecimationReport {
    /// Passes executed, including the final pass that removed nothing
    pub passes: usize,
    pub vertices_removed: usize,
    pub triangles_before: usize,
    pub triangles_after: usize,
}

/// Removes vertices whose neighborhood is flat within an angular tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexDecimator {
    /// Largest allowed angle in degrees between a vertex normal and its neighbors'
    pub threshold_degrees: f32,
}

impl Default for VertexDecimator {
    fn default() -> Self {
        Self {
            threshold_degrees: DEFAULT_THRESHOLD_DEGREES,
        }
    }
}

impl VertexDecimator {
    pub fn new(threshold_degrees: f32) -> Self {
        Self { threshold_degrees }
    }

    /// Whether every vertex of every adjoining triangle has a normal within
    /// the threshold of `vertex`'s normal. Undefined angles (zero normals) fail.
    pub fn is_removable(&self, mesh: &MeshRecord, adjoining: &[usize], vertex: usize) -> bool {
        let normal = &mesh.normals[vertex];
        adjoining.iter().all(|&slot| match mesh.triangles.get(slot) {
            Some(tri) => tri.iter().all(|&v| {
                angle_between_degrees(normal, &mesh.normals[v])
                    .is_some_and(|angle| angle <= self.threshold_degrees)
            }),
            None => false,
        })
    }

    /// One pass over every vertex id in ascending order. Returns the number of
    /// vertices removed.
    pub fn decimate_pass(&self, mesh: &mut MeshRecord) -> usize {
        let mut adjacency = AdjacencyIndex::build(&mesh.triangles, mesh.vertex_count());
        let mut removed = 0;

        for vertex in 0..mesh.vertex_count() {
            let adjoining = adjacency.adjoining(vertex);
            if adjoining.is_empty() {
                continue;
            }
            if !self.is_removable(mesh, &adjoining, vertex) {
                continue;
            }
            let Some(boundary) = build_loop(&mesh.triangles, &adjoining, vertex) else {
                log::trace!("Keeping vertex {}: neighborhood is not a closed fan", vertex);
                continue;
            };

            for &slot in &adjoining {
                if let Some(tri) = mesh.triangles.remove(slot) {
                    adjacency.remove(slot, tri);
                }
            }
            for tri in fan_triangles(&boundary) {
                let slot = mesh.triangles.push(tri);
                adjacency.insert(slot, tri);
            }
            log::trace!(
                "Removed vertex {} ({} triangles -> {})",
                vertex,
                adjoining.len(),
                boundary.len() - 2
            );
            removed += 1;
        }

        removed
    }

    /// One pass; true if at least one vertex was removed
    pub fn decimate_once(&self, mesh: &mut MeshRecord) -> bool {
        self.decimate_pass(mesh) > 0
    }

    /// Repeat passes until one removes nothing
    pub fn decimate(&self, mesh: &mut MeshRecord) -> DecimationReport {
        let mut report = DecimationReport {
            triangles_before: mesh.triangle_count(),
            ..Default::default()
        };
        loop {
            let removed = self.decimate_pass(mesh);
            report.passes += 1;
            report.vertices_removed += removed;
            if removed == 0 {
                break;
            }
        }
        report.triangles_after = mesh.triangle_count();
        log::debug!(
            "Decimated '{}' in {} passes: {} vertices removed, {} -> {} triangles",
            mesh.name,
            report.passes,
            report.vertices_removed,
            report.triangles_before,
            report.triangles_after
        );
        report
    }

    fn validate(&self) -> Result<()> {
        if !self.threshold_degrees.is_finite() || !(0.0..=180.0).contains(&self.threshold_degrees) {
            return Err(Error::InvalidData(format!(
                "Threshold angle must be between 0 and 180 degrees, got {}",
                self.threshold_degrees
            )));
        }
        Ok(())
    }
}

/// One decimation pass over `mesh`; true if at least one vertex was removed
pub fn decimate_once(mesh: &mut MeshRecord, threshold_degrees: f32) -> bool {
    VertexDecimator::new(threshold_degrees).decimate_once(mesh)
}

impl MeshSimplifier for VertexDecimator {
    fn simplify(&self, mesh: &MeshRecord) -> Result<MeshRecord> {
        self.validate()?;
        let mut result = mesh.clone();
        self.decimate(&mut result);
        compact(&mut result);
        Ok(result)
    }
}
