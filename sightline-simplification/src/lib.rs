//! Mesh decimation for sightline
//!
//! This crate removes vertices whose neighborhoods are flat within an angular
//! tolerance and refills the holes they leave:
//! - Vertex to triangle adjacency
//! - Boundary loop reconstruction and fan refilling
//! - Angle-threshold vertex decimation
//! - Compaction of unreferenced vertices

pub mod adjacency;
pub mod boundary_loop;
pub mod compaction;
pub mod vertex_removal;

pub use adjacency::*;
pub use boundary_loop::*;
pub use compaction::*;
pub use vertex_removal::*;

use sightline_core::{MeshRecord, Result};

/// Produce a simplified copy of a mesh
pub trait MeshSimplifier {
    /// Simplify `mesh`, returning a compacted result and leaving the input untouched
    fn simplify(&self, mesh: &MeshRecord) -> Result<MeshRecord>;
}
