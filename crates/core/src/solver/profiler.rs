//! Per-stage timing for the fluid pipeline.
//!
//! Provides an RAII stage timer and the per-tick statistics it feeds.

use std::time::Instant;
use tracing::trace;

/// The six pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Curl,
    Vorticity,
    Divergence,
    Pressure,
    GradientSubtraction,
    Advection,
}

impl PipelineStage {
    /// Every stage in execution order
    pub const ALL: [PipelineStage; 6] = [
        PipelineStage::Curl,
        PipelineStage::Vorticity,
        PipelineStage::Divergence,
        PipelineStage::Pressure,
        PipelineStage::GradientSubtraction,
        PipelineStage::Advection,
    ];

    /// Short name used in logs
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PipelineStage::Curl => "curl",
            PipelineStage::Vorticity => "vorticity",
            PipelineStage::Divergence => "divergence",
            PipelineStage::Pressure => "pressure",
            PipelineStage::GradientSubtraction => "gradient_subtraction",
            PipelineStage::Advection => "advection",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// A stage timer that measures elapsed time using RAII.
///
/// The elapsed time is traced when the timer is dropped.
pub struct StageTimer {
    start: Instant,
    stage: PipelineStage,
}

impl StageTimer {
    /// Starts timing a stage.
    #[must_use]
    pub fn start(stage: PipelineStage) -> Self {
        Self {
            start: Instant::now(),
            stage,
        }
    }

    /// The stage being timed.
    #[must_use]
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Gets elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        trace!("stage {} took {:.3}ms", self.stage.name(), self.elapsed_ms());
    }
}

/// Statistics for one solver tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepStats {
    /// Tick number, starting at 1 for the first completed step
    pub tick: u64,
    /// Impulses written into the velocity field this tick
    pub impulses_applied: usize,
    /// Impulses drained from the queue without being applied
    pub impulses_discarded: usize,
    /// Wall time per stage in milliseconds, indexed in pipeline order
    pub stage_ms: [f64; 6],
}

impl StepStats {
    /// Record the elapsed time of a finished stage.
    pub fn record(&mut self, timer: &StageTimer) {
        self.stage_ms[timer.stage().slot()] = timer.elapsed_ms();
    }

    /// Time spent in one stage.
    #[must_use]
    pub fn stage_time_ms(&self, stage: PipelineStage) -> f64 {
        self.stage_ms[stage.slot()]
    }

    /// Total time across all stages.
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.stage_ms.iter().sum()
    }
}
