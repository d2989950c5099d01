//! # sightline CLI
//!
//! Command-line interface for visibility-driven scene optimization.
//!
//! ## Commands
//! - `optimize` - Cull hidden triangles, decimate and write the result
//! - `inspect` - Print the scene hierarchy and mesh statistics

pub mod scene_file;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sightline_pipeline::{MeshReport, SceneOptimizer, StepOutcome};
use sightline_visibility::{AnalysisSession, RasterizerConfig, SampleResolution, SceneGeometry, SoftwareRasterizer};

pub use scene_file::*;

/// Visibility-driven mesh decimation
#[derive(Parser)]
#[command(name = "sightline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Remove hidden triangles, decimate flat regions and write the scene
    Optimize {
        /// Input scene file (JSON)
        input: PathBuf,

        /// Output scene file
        #[arg(short, long)]
        output: PathBuf,

        /// Decimation threshold in degrees, for every mesh
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Sample buffer size in pixels (32 to 2048), for every mesh
        #[arg(short, long)]
        resolution: Option<u32>,

        /// Write the last rendered probe image to this PNG
        #[arg(long)]
        dump_probe: Option<PathBuf>,
    },

    /// Print the scene hierarchy and mesh statistics
    Inspect {
        /// Input scene file (JSON)
        input: PathBuf,
    },
}

/// Overrides applied to every mesh of a scene
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OptimizeOptions {
    pub threshold: Option<f32>,
    pub resolution: Option<SampleResolution>,
}

/// Execute the CLI command
pub fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match cli.command {
        Commands::Optimize {
            input,
            output,
            threshold,
            resolution,
            dump_probe,
        } => {
            let resolution = resolution
                .map(SampleResolution::try_from)
                .transpose()
                .context("Invalid --resolution")?;
            let options = OptimizeOptions { threshold, resolution };

            log::info!("Loading {}", input.display());
            let scene = SceneFile::load(&input)?;
            let optimized = optimize_scene(&scene, &options, dump_probe.as_ref())?;
            for report in &optimized.reports {
                log_report(report);
            }
            optimized.save(&output)?;
            log::info!("Wrote {}", output.display());
        }

        Commands::Inspect { input } => {
            let scene = SceneFile::load(&input)?;
            let (jobs, tree) = scene.flatten()?;
            println!(
                "Viewpoint: ({}, {}, {}), fov {} degrees",
                scene.viewpoint.position.x,
                scene.viewpoint.position.y,
                scene.viewpoint.position.z,
                scene.viewpoint.fov_y_degrees
            );
            for (depth, node) in tree.walk() {
                let indent = "  ".repeat(depth);
                match node.job.and_then(|i| jobs.get(i)) {
                    Some(job) => println!(
                        "{}{}: {} vertices, {} triangles, {}, threshold {} degrees",
                        indent,
                        node.name,
                        job.mesh.vertex_count(),
                        job.mesh.triangle_count(),
                        job.settings.sample_resolution,
                        job.settings.threshold_degrees
                    ),
                    None => println!("{}{}", indent, node.name),
                }
            }
            println!("{} meshes", jobs.len());
        }
    }

    Ok(())
}

/// Run the whole pipeline over a scene with the CPU rasterizer and return
/// the scene with optimized meshes and per-mesh reports.
pub fn optimize_scene(
    scene: &SceneFile,
    options: &OptimizeOptions,
    dump_probe: Option<&PathBuf>,
) -> Result<SceneFile> {
    let (mut jobs, tree) = scene.flatten()?;
    for job in &mut jobs {
        if let Some(threshold) = options.threshold {
            job.settings.threshold_degrees = threshold;
        }
        if let Some(resolution) = options.resolution {
            job.settings.sample_resolution = resolution;
        }
    }

    let geometry = jobs
        .iter()
        .map(|job| SceneGeometry::from_mesh(&job.mesh, &job.transform))
        .collect();
    let rasterizer = SoftwareRasterizer::new(RasterizerConfig::default()).with_scene(geometry);
    let session = AnalysisSession::new(rasterizer, scene.viewpoint);
    let mut optimizer = SceneOptimizer::new(session, jobs)?;

    let mut finished = 0;
    while optimizer.step()? == StepOutcome::Progressed {
        log::trace!("{}", optimizer.progress());
        let done = optimizer.reports().count();
        if done != finished {
            finished = done;
            log::debug!("{} of {} meshes analyzed", finished, optimizer.jobs().len());
        }
    }

    if let Some(path) = dump_probe {
        optimizer
            .session()
            .save_last_buffer(path)
            .with_context(|| format!("Failed to write probe image {}", path.display()))?;
        log::info!("Wrote last probe image to {}", path.display());
    }

    if tree.all_have_results(&|i| optimizer.has_result(i)) {
        log::info!("Every mesh was optimized");
    } else {
        log::warn!("Some meshes kept their original geometry");
    }

    let reports: Vec<MeshReport> = optimizer.reports().cloned().collect();
    let meshes = optimizer
        .generate()?
        .iter()
        .map(|generated| MeshFile::from_record(&generated.mesh))
        .collect();
    Ok(scene.with_meshes(meshes, reports))
}

fn log_report(report: &MeshReport) {
    match &report.failure {
        Some(failure) => log::warn!("{}: failed ({})", report.name, failure),
        None => log::info!(
            "{}: {} -> {} triangles ({} culled, {} decimation passes), {} -> {} vertices",
            report.name,
            report.triangles_before,
            report.triangles_after,
            report.triangles_culled,
            report.decimation_passes,
            report.vertices_before,
            report.vertices_after
        ),
    }
}
