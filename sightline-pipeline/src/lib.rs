//! Visibility-driven mesh optimization for sightline
//!
//! Ties the visibility oracle and the decimator together:
//! - Per-mesh resumable optimizer (cull, decimate, compact)
//! - Batch driver with cooperative cancellation and progress reporting
//! - Scene hierarchy helpers

pub mod optimizer;
pub mod scene;
pub mod settings;
pub mod tree;

pub use optimizer::*;
pub use scene::*;
pub use settings::*;
pub use tree::*;
