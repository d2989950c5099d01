//! Resumable optimization of a single mesh
//!
//! [`MeshOptimizer`] walks one mesh through culling, decimation and
//! compaction, doing one unit of work per [`MeshOptimizer::step`] so a driver
//! can report progress or stop between steps. All edits go to a private copy
//! of the source mesh.

use crate::settings::{MeshReport, MeshSettings};
use sightline_core::{Error, MeshRecord, Result, WorldTransform};
use sightline_simplification::{compact, VertexDecimator};
use sightline_visibility::{AnalysisSession, Rasterizer};
use std::fmt;

/// Where a [`MeshOptimizer`] is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptimizerStage {
    NotStarted,
    /// Probing triangles and removing the invisible ones
    Culling,
    /// Repeated decimation passes
    Decimating,
    Compacting,
    Done,
    Cancelled,
    Failed,
}

impl OptimizerStage {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OptimizerStage::Done | OptimizerStage::Cancelled | OptimizerStage::Failed
        )
    }
}

impl fmt::Display for OptimizerStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptimizerStage::NotStarted => "Not started",
            OptimizerStage::Culling => "Culling",
            OptimizerStage::Decimating => "Decimating",
            OptimizerStage::Compacting => "Compacting",
            OptimizerStage::Done => "Done",
            OptimizerStage::Cancelled => "Cancelled",
            OptimizerStage::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// Result of one [`MeshOptimizer::step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// More work remains
    Progressed,
    /// Nothing left to do
    Finished,
}

/// Cull, decimate and compact one mesh, one step at a time
#[derive(Debug, Clone)]
pub struct MeshOptimizer {
    name: String,
    source: MeshRecord,
    transform: WorldTransform,
    settings: MeshSettings,
    stage: OptimizerStage,
    last_completed_stage: Option<OptimizerStage>,
    working: Option<MeshRecord>,
    cursor: Option<usize>,
    culling_total: usize,
    probed: usize,
    culled: usize,
    passes: usize,
    result: Option<MeshRecord>,
    failure: Option<String>,
}

impl MeshOptimizer {
    pub fn new(source: MeshRecord, transform: WorldTransform, settings: MeshSettings) -> Self {
        Self {
            name: source.name.clone(),
            source,
            transform,
            settings,
            stage: OptimizerStage::NotStarted,
            last_completed_stage: None,
            working: None,
            cursor: None,
            culling_total: 0,
            probed: 0,
            culled: 0,
            passes: 0,
            result: None,
            failure: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> OptimizerStage {
        self.stage
    }

    /// The most recent stage that ran to completion
    pub fn last_completed_stage(&self) -> Option<OptimizerStage> {
        self.last_completed_stage
    }

    pub fn source(&self) -> &MeshRecord {
        &self.source
    }

    /// The optimized mesh, once [`OptimizerStage::Done`] is reached
    pub fn result(&self) -> Option<&MeshRecord> {
        self.result.as_ref()
    }

    pub fn take_result(&mut self) -> Option<MeshRecord> {
        self.result.take()
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Human-readable position within the current stage
    pub fn progress(&self) -> String {
        match self.stage {
            OptimizerStage::Culling => format!(
                "Triangle: {}/{}",
                (self.probed + 1).min(self.culling_total),
                self.culling_total
            ),
            OptimizerStage::Decimating => format!("Decimation pass: {}", self.passes + 1),
            OptimizerStage::Failed => match &self.failure {
                Some(message) => format!("Failed: {}", message),
                None => "Failed".to_string(),
            },
            stage => stage.to_string(),
        }
    }

    /// Counts so far; final once the optimizer is terminal
    pub fn report(&self) -> MeshReport {
        let current = self.result.as_ref().or(self.working.as_ref()).unwrap_or(&self.source);
        MeshReport {
            name: self.name.clone(),
            triangles_before: self.source.triangle_count(),
            triangles_after: current.triangle_count(),
            vertices_before: self.source.vertex_count(),
            vertices_after: current.vertex_count(),
            triangles_culled: self.culled,
            decimation_passes: self.passes,
            failure: self.failure.clone(),
        }
    }

    /// Drop the working copy. The source mesh is never modified.
    pub fn cancel(&mut self) {
        if self.stage.is_terminal() {
            return;
        }
        log::info!("Cancelled '{}' during {}", self.name, self.stage);
        self.working = None;
        self.cursor = None;
        self.stage = OptimizerStage::Cancelled;
    }

    /// Do one unit of work: start, probe one triangle, run one decimation
    /// pass, or compact.
    ///
    /// An oracle error moves the optimizer to [`OptimizerStage::Failed`] and
    /// is returned.
    pub fn step<R: Rasterizer>(&mut self, session: &mut AnalysisSession<R>) -> Result<StepOutcome> {
        match self.stage {
            OptimizerStage::NotStarted => {
                self.start(session);
                Ok(StepOutcome::Progressed)
            }
            OptimizerStage::Culling => self.cull_next(session),
            OptimizerStage::Decimating => self.decimate_next(),
            OptimizerStage::Compacting => self.compact_working(),
            OptimizerStage::Done | OptimizerStage::Cancelled | OptimizerStage::Failed => {
                Ok(StepOutcome::Finished)
            }
        }
    }

    /// Step until a terminal stage
    pub fn run<R: Rasterizer>(&mut self, session: &mut AnalysisSession<R>) -> Result<()> {
        while self.step(session)? == StepOutcome::Progressed {}
        Ok(())
    }

    fn start<R: Rasterizer>(&mut self, session: &mut AnalysisSession<R>) {
        let working = self.source.clone();
        self.culling_total = working.triangle_count();
        self.cursor = working.triangles.next_live(0);
        self.working = Some(working);
        session.set_resolution(self.settings.sample_resolution);
        self.stage = OptimizerStage::Culling;
        log::info!(
            "Culling '{}': {} triangles at {}",
            self.name,
            self.culling_total,
            self.settings.sample_resolution
        );
    }

    fn cull_next<R: Rasterizer>(&mut self, session: &mut AnalysisSession<R>) -> Result<StepOutcome> {
        let Some(slot) = self.cursor else {
            self.last_completed_stage = Some(OptimizerStage::Culling);
            self.stage = OptimizerStage::Decimating;
            log::info!(
                "Culled {} of {} triangles from '{}'",
                self.culled,
                self.culling_total,
                self.name
            );
            return Ok(StepOutcome::Progressed);
        };

        let transform = self.transform;
        let Some(working) = self.working.as_mut() else {
            return Err(Error::Algorithm("No working mesh while culling".to_string()));
        };
        let Some(triangle) = working.world_triangle(slot, &transform) else {
            self.cursor = working.triangles.next_live(slot + 1);
            return Ok(StepOutcome::Progressed);
        };

        match session.is_visible(&triangle) {
            Ok(true) => {}
            Ok(false) => {
                working.triangles.remove(slot);
                self.culled += 1;
            }
            Err(e) => return Err(self.fail(e)),
        }
        self.cursor = working.triangles.next_live(slot + 1);
        self.probed += 1;
        Ok(StepOutcome::Progressed)
    }

    fn decimate_next(&mut self) -> Result<StepOutcome> {
        let decimator = VertexDecimator::new(self.settings.threshold_degrees);
        let working = self
            .working
            .as_mut()
            .ok_or_else(|| Error::Algorithm("No working mesh while decimating".to_string()))?;
        let removed = decimator.decimate_once(working);
        self.passes += 1;
        if !removed {
            self.last_completed_stage = Some(OptimizerStage::Decimating);
            self.stage = OptimizerStage::Compacting;
            log::info!("Decimated '{}' in {} passes", self.name, self.passes);
        }
        Ok(StepOutcome::Progressed)
    }

    fn compact_working(&mut self) -> Result<StepOutcome> {
        let mut working = self
            .working
            .take()
            .ok_or_else(|| Error::Algorithm("No working mesh while compacting".to_string()))?;
        compact(&mut working);
        log::info!(
            "Optimized '{}': {} -> {} triangles, {} -> {} vertices",
            self.name,
            self.source.triangle_count(),
            working.triangle_count(),
            self.source.vertex_count(),
            working.vertex_count()
        );
        self.result = Some(working);
        self.last_completed_stage = Some(OptimizerStage::Compacting);
        self.stage = OptimizerStage::Done;
        Ok(StepOutcome::Finished)
    }

    fn fail(&mut self, error: Error) -> Error {
        log::warn!("Optimization of '{}' failed during {}: {}", self.name, self.stage, error);
        self.failure = Some(error.to_string());
        self.working = None;
        self.cursor = None;
        self.stage = OptimizerStage::Failed;
        error
    }
}
