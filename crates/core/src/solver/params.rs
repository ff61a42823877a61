//! Solver configuration and per-tick parameters
//!
//! Tuning is owned by the caller and passed in explicitly: `SolverConfig` is
//! fixed at construction (and on [`super::FluidSolver::reconfigure`]), while
//! `StepParams` is supplied with every call to [`super::FluidSolver::step`].
//! Both derive `Serialize`/`Deserialize` so a driver can load them from any
//! serde format.

use crate::error::FluidError;
use serde::{Deserialize, Serialize};

/// Default parameter values
pub mod defaults {
    /// Timestep for an interactive driver loop
    pub const DT: f32 = 0.1;

    /// Relaxation passes for the 2D pressure solve
    pub const ITERATIONS_2D: usize = 10;

    /// Relaxation passes for the 3D pressure solve (fewer for speed)
    pub const ITERATIONS_3D: usize = 4;

    /// Velocity kept per advection pass, bleeding off numerical energy
    pub const DAMPING: f32 = 0.99;

    /// Half-width in cells of the block an impulse overwrites
    pub const IMPULSE_RADIUS: usize = 3;
}

/// Which queued impulses are applied at the start of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpulsePolicy {
    /// Apply every queued impulse in queue order; later ones win on overlap
    #[default]
    All,
    /// Apply only the oldest queued impulse and discard the rest
    FirstOnly,
}

/// Construction-time solver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Half-width in cells of the block each impulse overwrites
    /// (a radius of 3 writes a 7x7 block in 2D)
    pub impulse_radius: usize,

    /// Factor applied to advected velocity, in `[0, 1]`
    pub damping: f32,

    /// Queue consumption policy for impulses
    pub impulse_policy: ImpulsePolicy,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            impulse_radius: defaults::IMPULSE_RADIUS,
            damping: defaults::DAMPING,
            impulse_policy: ImpulsePolicy::All,
        }
    }
}

impl SolverConfig {
    /// Check the configuration for degenerate values
    ///
    /// # Errors
    ///
    /// Returns [`FluidError::InvalidParameter`] if `damping` is non-finite or
    /// outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), FluidError> {
        if !(self.damping.is_finite() && (0.0..=1.0).contains(&self.damping)) {
            return Err(FluidError::InvalidParameter {
                name: "damping",
                value: self.damping,
            });
        }
        Ok(())
    }

    /// Check the configuration against the extents of the grid it will drive
    ///
    /// # Errors
    ///
    /// - Any error of [`SolverConfig::validate`]
    /// - [`FluidError::ImpulseRadiusTooLarge`] if `impulse_radius` is not
    ///   smaller than every extent
    pub fn validate_for_extents(&self, extents: &[usize]) -> Result<(), FluidError> {
        self.validate()?;
        let extent = extents.iter().copied().min().unwrap_or(0);
        if self.impulse_radius >= extent {
            return Err(FluidError::ImpulseRadiusTooLarge {
                radius: self.impulse_radius,
                extent,
            });
        }
        Ok(())
    }
}

/// Per-tick solver parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepParams {
    /// Timestep
    pub dt: f32,
    /// Vorticity confinement strength (0 disables confinement)
    pub curl_factor: f32,
    /// Value the pressure field is reset to before each solve
    pub pressure_baseline: f32,
    /// Jacobi relaxation passes in the pressure solve
    pub iteration_count: usize,
}

impl Default for StepParams {
    fn default() -> Self {
        Self::for_dimension(2)
    }
}

impl StepParams {
    /// Default parameters for a grid of the given dimension
    ///
    /// 3D uses fewer pressure iterations purely to keep the tick affordable.
    #[must_use]
    pub fn for_dimension(dimension: usize) -> Self {
        Self {
            dt: defaults::DT,
            curl_factor: 0.0,
            pressure_baseline: 0.0,
            iteration_count: if dimension >= 3 {
                defaults::ITERATIONS_3D
            } else {
                defaults::ITERATIONS_2D
            },
        }
    }

    /// Set the timestep
    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    /// Set the vorticity confinement strength
    pub fn with_curl_factor(mut self, curl_factor: f32) -> Self {
        self.curl_factor = curl_factor;
        self
    }

    /// Set the pressure reset value
    pub fn with_pressure_baseline(mut self, pressure_baseline: f32) -> Self {
        self.pressure_baseline = pressure_baseline;
        self
    }

    /// Set the number of pressure relaxation passes
    pub fn with_iteration_count(mut self, iteration_count: usize) -> Self {
        self.iteration_count = iteration_count;
        self
    }

    /// Check the parameters before a tick touches any field
    ///
    /// # Errors
    ///
    /// - [`FluidError::ZeroIterations`] if `iteration_count` is zero
    /// - [`FluidError::InvalidParameter`] if any float is non-finite
    pub fn validate(&self) -> Result<(), FluidError> {
        if self.iteration_count == 0 {
            return Err(FluidError::ZeroIterations);
        }
        for (name, value) in [
            ("dt", self.dt),
            ("curl_factor", self.curl_factor),
            ("pressure_baseline", self.pressure_baseline),
        ] {
            if !value.is_finite() {
                return Err(FluidError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}
