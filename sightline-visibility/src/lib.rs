//! Visibility analysis for sightline
//!
//! This crate decides whether a triangle can be seen from a fixed viewpoint:
//! - Viewpoint and probe cameras
//! - Lifted probe triangles and their marker meshes
//! - Conservative footprint scanning of the sample buffer
//! - Pluggable rasterizers, with a CPU reference implementation
//! - Analysis sessions that own the sample buffer

pub mod footprint;
pub mod oracle;
pub mod probe;
pub mod rasterizer;
pub mod resolution;
pub mod viewpoint;

pub use footprint::*;
pub use oracle::*;
pub use probe::*;
pub use rasterizer::*;
pub use resolution::*;
pub use viewpoint::*;

// Re-export the image types that appear in the rasterizer interface
pub use image::{Rgb, RgbImage};
