//! Batch optimization of every mesh in a scene
//!
//! [`SceneOptimizer`] runs a [`MeshOptimizer`] per job, one after another,
//! against a single [`AnalysisSession`]. A failure on one mesh is recorded in
//! its report and the batch moves on.

use crate::optimizer::{MeshOptimizer, StepOutcome};
use crate::settings::{MeshReport, MeshSettings};
use serde::{Deserialize, Serialize};
use sightline_core::{Error, MeshRecord, Result, WorldTransform};
use sightline_visibility::{AnalysisSession, Rasterizer};
use std::fmt;

/// One mesh to optimize and where it sits in the world
#[derive(Debug, Clone, PartialEq)]
pub struct MeshJob {
    pub name: String,
    pub transform: WorldTransform,
    pub mesh: MeshRecord,
    pub settings: MeshSettings,
}

impl MeshJob {
    pub fn new(name: impl Into<String>, mesh: MeshRecord, transform: WorldTransform) -> Self {
        let name = name.into();
        Self {
            mesh: mesh.with_name(name.clone()),
            name,
            transform,
            settings: MeshSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: MeshSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Lifecycle of a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisStatus {
    #[default]
    NotAnalyzed,
    Analyzing,
    Analyzed,
    Generated,
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisStatus::NotAnalyzed => "Not analyzed",
            AnalysisStatus::Analyzing => "Analyzing",
            AnalysisStatus::Analyzed => "Analyzed",
            AnalysisStatus::Generated => "Generated",
        };
        f.write_str(name)
    }
}

/// Output of [`SceneOptimizer::generate`] for one job
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedMesh {
    pub name: String,
    pub transform: WorldTransform,
    pub mesh: MeshRecord,
    /// False when the job failed and `mesh` is the untouched original
    pub optimized: bool,
}

/// Drives every job of a scene through culling, decimation and compaction
#[derive(Debug)]
pub struct SceneOptimizer<R> {
    session: AnalysisSession<R>,
    jobs: Vec<MeshJob>,
    status: AnalysisStatus,
    current: usize,
    optimizer: Option<MeshOptimizer>,
    results: Vec<Option<MeshRecord>>,
    reports: Vec<Option<MeshReport>>,
}

impl<R: Rasterizer> SceneOptimizer<R> {
    pub fn new(session: AnalysisSession<R>, jobs: Vec<MeshJob>) -> Result<Self> {
        for job in &jobs {
            job.settings.validate().map_err(|e| {
                Error::InvalidData(format!("Invalid settings for '{}': {}", job.name, e))
            })?;
        }
        let count = jobs.len();
        Ok(Self {
            session,
            jobs,
            status: AnalysisStatus::NotAnalyzed,
            current: 0,
            optimizer: None,
            results: vec![None; count],
            reports: vec![None; count],
        })
    }

    pub fn status(&self) -> AnalysisStatus {
        self.status
    }

    pub fn jobs(&self) -> &[MeshJob] {
        &self.jobs
    }

    pub fn session(&self) -> &AnalysisSession<R> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut AnalysisSession<R> {
        &mut self.session
    }

    /// The optimized mesh for job `index`, if it finished successfully
    pub fn result(&self, index: usize) -> Option<&MeshRecord> {
        self.results.get(index).and_then(Option::as_ref)
    }

    pub fn has_result(&self, index: usize) -> bool {
        self.result(index).is_some()
    }

    /// Reports of every job that has finished or failed
    pub fn reports(&self) -> impl Iterator<Item = &MeshReport> + '_ {
        self.reports.iter().flatten()
    }

    pub fn report(&self, index: usize) -> Option<&MeshReport> {
        self.reports.get(index).and_then(Option::as_ref)
    }

    /// Begin the analysis session and reset previous results
    pub fn start(&mut self) -> Result<()> {
        if self.status == AnalysisStatus::Analyzing {
            return Ok(());
        }
        self.session.begin()?;
        self.results.iter_mut().for_each(|r| *r = None);
        self.reports.iter_mut().for_each(|r| *r = None);
        self.current = 0;
        self.optimizer = None;
        self.status = AnalysisStatus::Analyzing;
        log::info!("Analyzing {} meshes", self.jobs.len());
        Ok(())
    }

    /// Advance the batch by one unit of work. Starts the analysis when none
    /// is running.
    pub fn step(&mut self) -> Result<StepOutcome> {
        match self.status {
            AnalysisStatus::NotAnalyzed => {
                self.start()?;
                Ok(StepOutcome::Progressed)
            }
            AnalysisStatus::Analyzed | AnalysisStatus::Generated => Ok(StepOutcome::Finished),
            AnalysisStatus::Analyzing => self.step_current(),
        }
    }

    fn step_current(&mut self) -> Result<StepOutcome> {
        let Some(job) = self.jobs.get(self.current) else {
            self.session.end()?;
            self.status = AnalysisStatus::Analyzed;
            log::info!(
                "Analysis finished: {} of {} meshes optimized",
                self.results.iter().filter(|r| r.is_some()).count(),
                self.jobs.len()
            );
            return Ok(StepOutcome::Finished);
        };

        let optimizer = self
            .optimizer
            .get_or_insert_with(|| MeshOptimizer::new(job.mesh.clone(), job.transform, job.settings));
        let finished = match optimizer.step(&mut self.session) {
            Ok(StepOutcome::Progressed) => false,
            Ok(StepOutcome::Finished) => true,
            Err(e) => {
                log::warn!("Skipping '{}': {}", job.name, e);
                true
            }
        };

        if finished {
            if let Some(mut optimizer) = self.optimizer.take() {
                self.reports[self.current] = Some(optimizer.report());
                self.results[self.current] = optimizer.take_result();
            }
            self.current += 1;
        }
        Ok(StepOutcome::Progressed)
    }

    /// Step until the analysis finishes
    pub fn run_to_completion(&mut self) -> Result<()> {
        while self.step()? == StepOutcome::Progressed {}
        Ok(())
    }

    /// Cancel a running analysis between steps. The current mesh's partial
    /// work is discarded; meshes already finished keep their results.
    pub fn stop(&mut self) -> Result<()> {
        if self.status != AnalysisStatus::Analyzing {
            return Ok(());
        }
        if let Some(mut optimizer) = self.optimizer.take() {
            optimizer.cancel();
        }
        self.status = AnalysisStatus::NotAnalyzed;
        log::info!("Analysis stopped at mesh {}/{}", self.current + 1, self.jobs.len());
        self.session.end()
    }

    /// Hand out every optimized mesh; failed jobs get their original mesh
    pub fn generate(&mut self) -> Result<Vec<GeneratedMesh>> {
        if self.status != AnalysisStatus::Analyzed {
            return Err(Error::Unsupported(format!(
                "Cannot generate meshes while the scene is {}",
                self.status
            )));
        }
        let generated = self
            .jobs
            .iter()
            .zip(&self.results)
            .map(|(job, result)| GeneratedMesh {
                name: job.name.clone(),
                transform: job.transform,
                mesh: result.clone().unwrap_or_else(|| job.mesh.clone()),
                optimized: result.is_some(),
            })
            .collect();
        self.status = AnalysisStatus::Generated;
        Ok(generated)
    }

    /// `"Processing mesh: i/total"` plus the current mesh's own progress
    pub fn progress(&self) -> String {
        match (self.status, &self.optimizer) {
            (AnalysisStatus::Analyzing, Some(optimizer)) => format!(
                "Processing mesh: {}/{} ({}) {}",
                self.current + 1,
                self.jobs.len(),
                optimizer.name(),
                optimizer.progress()
            ),
            (AnalysisStatus::Analyzing, None) => format!(
                "Processing mesh: {}/{}",
                (self.current + 1).min(self.jobs.len()),
                self.jobs.len()
            ),
            (status, _) => status.to_string(),
        }
    }
}
