//! Fluid velocity solver module
//!
//! The solver advances a [`crate::grid::VectorField`] through a fixed
//! six-stage pipeline each tick. Each stage lives in its own module as a plain
//! function over the grids it reads and writes, and [`FluidSolver`] owns the
//! grids and runs the stages in order.
//!
//! # Feature Flags
//!
//! - `parallel` (default): stage sweeps are distributed over rows with Rayon.
//!   Disable with `--no-default-features` for a single-threaded build.
//!
//! # Example
//!
//! ```rust
//! use fluid_sim_core::solver::{FluidSolver2D, Impulse, SolverConfig, StepParams};
//!
//! let mut solver = FluidSolver2D::new([64, 64], SolverConfig::default())?;
//! solver.queue_impulse(Impulse::new([0.5, 0.5], [10.0, 0.0]));
//! let stats = solver.step(&StepParams::default())?;
//! assert_eq!(stats.impulses_applied, 1);
//! # Ok::<(), fluid_sim_core::FluidError>(())
//! ```

pub mod advection;
mod fluid;
pub mod impulse;
mod params;
pub mod profiler;
pub mod projection;
pub mod vorticity;

// Re-exports
pub use fluid::{FluidSolver, FluidSolver2D, FluidSolver3D};
pub use impulse::Impulse;
pub use params::{defaults, ImpulsePolicy, SolverConfig, StepParams};
pub use profiler::{PipelineStage, StageTimer, StepStats};
