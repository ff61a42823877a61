//! Fluid velocity solver
//!
//! Owns every grid of the simulation and advances the velocity field one tick
//! at a time through a fixed pipeline:
//!
//! 1. Curl of the velocity field
//! 2. Vorticity confinement
//! 3. Divergence
//! 4. Jacobi pressure solve
//! 5. Pressure gradient subtraction
//! 6. Semi-Lagrangian self-advection
//!
//! Queued impulses are written into the velocity field before the first stage.

use super::advection::advect_velocity;
use super::impulse::{apply_impulse, Impulse};
use super::params::{ImpulsePolicy, SolverConfig, StepParams};
use super::profiler::{PipelineStage, StageTimer, StepStats};
use super::projection::{
    compute_divergence, divergence_magnitude, solve_pressure, subtract_pressure_gradient,
};
use super::vorticity::{apply_vorticity_confinement, compute_curl};
use crate::error::FluidError;
use crate::grid::stencil::rotation_planes;
use crate::grid::{DoubleGrid, Grid, VectorField};
use tracing::{debug, info, warn};

/// Grid-based incompressible velocity solver on a toroidal grid
///
/// `D` is the number of spatial axes and must be 2 or 3.
#[derive(Debug, Clone)]
pub struct FluidSolver<const D: usize> {
    velocity: VectorField<D>,
    pressure: DoubleGrid<D>,
    divergence: Grid<D>,
    // One grid per rotation plane
    curl: Vec<Grid<D>>,
    impulses: Vec<Impulse<D>>,
    config: SolverConfig,
    tick: u64,
}

/// Solver over a 2D grid
pub type FluidSolver2D = FluidSolver<2>;
/// Solver over a 3D grid
pub type FluidSolver3D = FluidSolver<3>;

fn format_extents<const D: usize>(extents: [usize; D]) -> String {
    extents
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("x")
}

impl<const D: usize> FluidSolver<D> {
    /// Create a solver with every field at rest
    ///
    /// # Arguments
    ///
    /// * `extents` - Number of cells along each axis
    /// * `config` - Construction-time configuration
    ///
    /// # Errors
    ///
    /// - [`FluidError::UnsupportedDimension`] unless `D` is 2 or 3
    /// - [`FluidError::ZeroExtent`] if any axis has no cells
    /// - [`FluidError::InvalidParameter`] if the configuration is invalid
    /// - [`FluidError::ImpulseRadiusTooLarge`] if the impulse radius is not
    ///   smaller than every extent
    pub fn new(extents: [usize; D], config: SolverConfig) -> Result<Self, FluidError> {
        if !(2..=3).contains(&D) {
            return Err(FluidError::UnsupportedDimension(D));
        }
        let velocity = VectorField::new(extents)?;
        config.validate_for_extents(&extents)?;

        let pressure = DoubleGrid::new(extents)?;
        let divergence = Grid::new(extents)?;
        let curl = rotation_planes(D)
            .iter()
            .map(|_| Grid::new(extents))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            "Fluid solver initialized: {} grid, damping={:.3}, impulse_radius={}, policy={:?}",
            format_extents(extents),
            config.damping,
            config.impulse_radius,
            config.impulse_policy
        );

        Ok(Self {
            velocity,
            pressure,
            divergence,
            curl,
            impulses: Vec::new(),
            config,
            tick: 0,
        })
    }

    /// Replace the construction-time configuration
    ///
    /// Fields are kept as they are; the new settings apply from the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`FluidError::InvalidParameter`] or
    /// [`FluidError::ImpulseRadiusTooLarge`] if the configuration is invalid,
    /// in which case the current configuration is kept.
    pub fn reconfigure(&mut self, config: SolverConfig) -> Result<(), FluidError> {
        config.validate_for_extents(&self.extents())?;
        info!(
            "Fluid solver reconfigured: damping={:.3}, impulse_radius={}, policy={:?}",
            config.damping, config.impulse_radius, config.impulse_policy
        );
        self.config = config;
        Ok(())
    }

    /// Return every field to rest and drop queued impulses
    pub fn reset(&mut self) {
        self.velocity.clear(0.0);
        self.pressure.current_mut().clear(0.0);
        self.divergence.clear(0.0);
        for grid in &mut self.curl {
            grid.clear(0.0);
        }
        self.impulses.clear();
        self.tick = 0;
        debug!("Fluid solver reset");
    }

    /// Number of cells along each axis
    #[must_use]
    pub fn extents(&self) -> [usize; D] {
        self.velocity.extents()
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Number of completed ticks since construction or the last reset
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Velocity field
    #[must_use]
    pub fn velocity(&self) -> &VectorField<D> {
        &self.velocity
    }

    /// Mutable velocity field, for seeding initial conditions between ticks
    pub fn velocity_mut(&mut self) -> &mut VectorField<D> {
        &mut self.velocity
    }

    /// Pressure solved during the last tick
    #[must_use]
    pub fn pressure(&self) -> &Grid<D> {
        self.pressure.current()
    }

    /// Divergence of the velocity before the last projection
    #[must_use]
    pub fn divergence(&self) -> &Grid<D> {
        &self.divergence
    }

    /// Curl computed during the last tick, one grid per rotation plane
    ///
    /// 2D has a single grid; 3D has the x, y and z components in that order.
    #[must_use]
    pub fn curl(&self) -> &[Grid<D>] {
        &self.curl
    }

    /// Queue an impulse for the next tick
    pub fn queue_impulse(&mut self, impulse: Impulse<D>) {
        self.impulses.push(impulse);
    }

    /// Impulses waiting for the next tick, oldest first
    #[must_use]
    pub fn pending_impulses(&self) -> &[Impulse<D>] {
        &self.impulses
    }

    /// Sum of squared velocity over all cells
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        self.velocity.kinetic_energy()
    }

    /// Sum of absolute divergence of the current velocity
    #[must_use]
    pub fn divergence_magnitude(&self) -> f32 {
        divergence_magnitude(&self.velocity)
    }

    /// Advance the simulation by one tick
    ///
    /// # Arguments
    ///
    /// * `params` - Timestep and tuning for this tick
    ///
    /// # Returns
    ///
    /// Timings and impulse counts for the tick
    ///
    /// # Errors
    ///
    /// Returns the validation error of `params`. Nothing is modified in that
    /// case and queued impulses stay queued.
    pub fn step(&mut self, params: &StepParams) -> Result<StepStats, FluidError> {
        params.validate()?;

        self.tick += 1;
        let mut stats = StepStats {
            tick: self.tick,
            ..StepStats::default()
        };

        self.apply_queued_impulses(&mut stats);

        {
            let timer = StageTimer::start(PipelineStage::Curl);
            compute_curl(&self.velocity, &mut self.curl);
            stats.record(&timer);
        }
        {
            let timer = StageTimer::start(PipelineStage::Vorticity);
            apply_vorticity_confinement(
                &mut self.velocity,
                &self.curl,
                params.curl_factor,
                params.dt,
            );
            stats.record(&timer);
        }
        {
            let timer = StageTimer::start(PipelineStage::Divergence);
            compute_divergence(&self.velocity, &mut self.divergence);
            stats.record(&timer);
        }
        {
            let timer = StageTimer::start(PipelineStage::Pressure);
            solve_pressure(
                &mut self.pressure,
                &self.divergence,
                params.pressure_baseline,
                params.iteration_count,
            );
            stats.record(&timer);
        }
        {
            let timer = StageTimer::start(PipelineStage::GradientSubtraction);
            subtract_pressure_gradient(&mut self.velocity, self.pressure.current());
            stats.record(&timer);
        }
        {
            let timer = StageTimer::start(PipelineStage::Advection);
            advect_velocity(&mut self.velocity, params.dt, self.config.damping);
            stats.record(&timer);
        }

        debug!(
            "Fluid tick {}: {:.3}ms, impulses={}/{}, energy={:.4}, max_speed={:.3}",
            self.tick,
            stats.total_ms(),
            stats.impulses_applied,
            stats.impulses_applied + stats.impulses_discarded,
            self.velocity.kinetic_energy(),
            self.velocity.max_speed()
        );

        Ok(stats)
    }

    /// Drain the impulse queue into the velocity field according to policy
    fn apply_queued_impulses(&mut self, stats: &mut StepStats) {
        let limit = match self.config.impulse_policy {
            ImpulsePolicy::All => usize::MAX,
            ImpulsePolicy::FirstOnly => 1,
        };
        let radius = self.config.impulse_radius;

        for (order, impulse) in self.impulses.drain(..).enumerate() {
            if order >= limit {
                stats.impulses_discarded += 1;
            } else if impulse.is_finite() {
                apply_impulse(&mut self.velocity, &impulse, radius);
                stats.impulses_applied += 1;
            } else {
                warn!(
                    "Skipping non-finite impulse: position={:?}, velocity={:?}",
                    impulse.position.as_slice(),
                    impulse.velocity.as_slice()
                );
                stats.impulses_discarded += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_creation() {
        let solver = FluidSolver2D::new([16, 8], SolverConfig::default()).unwrap();
        assert_eq!(solver.extents(), [16, 8]);
        assert_eq!(solver.curl().len(), 1);
        assert_eq!(solver.tick(), 0);

        let solver = FluidSolver3D::new([4, 4, 4], SolverConfig::default()).unwrap();
        assert_eq!(solver.curl().len(), 3);
    }

    #[test]
    fn test_invalid_construction_rejected() {
        assert_eq!(
            FluidSolver::<2>::new([0, 4], SolverConfig::default()).unwrap_err(),
            FluidError::ZeroExtent { axis: 0 }
        );
        assert_eq!(
            FluidSolver::<4>::new([2, 2, 2, 2], SolverConfig::default()).unwrap_err(),
            FluidError::UnsupportedDimension(4)
        );
        assert_eq!(
            FluidSolver::<1>::new([8], SolverConfig::default()).unwrap_err(),
            FluidError::UnsupportedDimension(1)
        );

        let config = SolverConfig {
            damping: 2.0,
            ..SolverConfig::default()
        };
        assert!(FluidSolver2D::new([4, 4], config).is_err());
    }

    #[test]
    fn test_invalid_step_leaves_state_untouched() {
        let mut solver = FluidSolver2D::new([8, 8], SolverConfig::default()).unwrap();
        solver.velocity_mut().component_mut(0).clear(1.0);
        solver.queue_impulse(Impulse::new([0.5, 0.5], [3.0, 0.0]));
        let before = solver.velocity().clone();

        let result = solver.step(&StepParams::default().with_iteration_count(0));
        assert_eq!(result.unwrap_err(), FluidError::ZeroIterations);
        assert_eq!(solver.pending_impulses().len(), 1);
        assert_eq!(solver.velocity(), &before);
        assert_eq!(solver.tick(), 0);
    }

    #[test]
    fn test_all_policy_applies_every_impulse() {
        let mut solver = FluidSolver2D::new([16, 16], SolverConfig::default()).unwrap();
        solver.queue_impulse(Impulse::new([0.25, 0.25], [1.0, 0.0]));
        solver.queue_impulse(Impulse::new([0.75, 0.75], [0.0, 1.0]));

        let stats = solver.step(&StepParams::default()).unwrap();
        assert_eq!(stats.tick, 1);
        assert_eq!(stats.impulses_applied, 2);
        assert_eq!(stats.impulses_discarded, 0);
        assert!(solver.pending_impulses().is_empty());
    }

    #[test]
    fn test_first_only_policy_discards_rest() {
        let config = SolverConfig {
            impulse_policy: ImpulsePolicy::FirstOnly,
            ..SolverConfig::default()
        };
        let mut solver = FluidSolver2D::new([16, 16], config).unwrap();
        for _ in 0..3 {
            solver.queue_impulse(Impulse::new([0.5, 0.5], [1.0, 0.0]));
        }

        let stats = solver.step(&StepParams::default()).unwrap();
        assert_eq!(stats.impulses_applied, 1);
        assert_eq!(stats.impulses_discarded, 2);
        assert!(solver.pending_impulses().is_empty());
    }

    #[test]
    fn test_non_finite_impulse_skipped() {
        let mut solver = FluidSolver2D::new([8, 8], SolverConfig::default()).unwrap();
        solver.queue_impulse(Impulse::new([0.5, f32::NAN], [1.0, 0.0]));

        let stats = solver.step(&StepParams::default()).unwrap();
        assert_eq!(stats.impulses_applied, 0);
        assert_eq!(stats.impulses_discarded, 1);
        assert!(solver.velocity().is_finite());
        assert_eq!(solver.kinetic_energy(), 0.0);
    }

    #[test]
    fn test_reset_returns_to_rest() {
        let mut solver = FluidSolver2D::new([8, 8], SolverConfig::default()).unwrap();
        solver.queue_impulse(Impulse::new([0.5, 0.5], [5.0, 0.0]));
        solver.step(&StepParams::default()).unwrap();
        solver.queue_impulse(Impulse::new([0.5, 0.5], [5.0, 0.0]));
        assert!(solver.kinetic_energy() > 0.0);

        solver.reset();
        assert_eq!(solver.kinetic_energy(), 0.0);
        assert_eq!(solver.pressure().abs_sum(), 0.0);
        assert!(solver.pending_impulses().is_empty());
        assert_eq!(solver.tick(), 0);
    }

    #[test]
    fn test_reconfigure() {
        let mut solver = FluidSolver2D::new([8, 8], SolverConfig::default()).unwrap();
        let config = SolverConfig {
            damping: 0.5,
            impulse_radius: 1,
            ..SolverConfig::default()
        };
        solver.reconfigure(config.clone()).unwrap();
        assert_eq!(solver.config(), &config);

        let bad = SolverConfig {
            damping: f32::NAN,
            ..SolverConfig::default()
        };
        assert!(solver.reconfigure(bad).is_err());
        assert_eq!(solver.config(), &config);
    }

    #[test]
    fn test_oversized_impulse_radius_rejected() {
        let config = SolverConfig {
            impulse_radius: usize::MAX / 2,
            ..SolverConfig::default()
        };
        assert!(matches!(
            FluidSolver2D::new([16, 16], config).unwrap_err(),
            FluidError::ImpulseRadiusTooLarge { extent: 16, .. }
        ));

        // The smallest axis bounds the radius
        let config = SolverConfig {
            impulse_radius: 4,
            ..SolverConfig::default()
        };
        assert_eq!(
            FluidSolver3D::new([16, 4, 16], config).unwrap_err(),
            FluidError::ImpulseRadiusTooLarge {
                radius: 4,
                extent: 4
            }
        );

        let mut solver = FluidSolver2D::new([8, 8], SolverConfig::default()).unwrap();
        let too_wide = SolverConfig {
            impulse_radius: 8,
            ..SolverConfig::default()
        };
        assert!(solver.reconfigure(too_wide).is_err());
        assert_eq!(solver.config(), &SolverConfig::default());
    }

    #[test]
    fn test_stats_cover_every_stage() {
        let mut solver = FluidSolver3D::new([8, 8, 8], SolverConfig::default()).unwrap();
        let stats = solver.step(&StepParams::for_dimension(3)).unwrap();
        assert!(stats.stage_ms.iter().all(|&ms| ms >= 0.0));
        assert!(stats.total_ms() >= stats.stage_time_ms(PipelineStage::Pressure));
    }
}
