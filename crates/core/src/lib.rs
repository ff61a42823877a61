//! Fluid Simulation Core Library
//!
//! A real-time, qualitative incompressible-fluid velocity solver on a toroidal
//! (wrap-around) 2D or 3D grid. Each tick applies vorticity confinement,
//! projects out divergence with a Jacobi pressure solve and advects the
//! velocity field along itself.
//!
//! ## Layout
//!
//! - [`grid`]: scalar grids, ping-pong grids with an explicit stage/commit
//!   discipline, vector fields and the axis-neighbour stencils
//! - [`solver`]: the pipeline stages, their parameters and [`FluidSolver`]
//! - [`error`]: construction and parameter errors
//!
//! The grid dimension is a const generic, so the same code runs 2D and 3D
//! simulations. The library only emits `tracing` events and never installs a
//! subscriber.

pub mod error;
pub mod grid;
pub mod solver;

// Re-export core types
pub use error::FluidError;
pub use grid::{Coord, DoubleGrid, Grid, GridStage, VectorField, VectorStage, VectorView};
pub use solver::{
    FluidSolver, FluidSolver2D, FluidSolver3D, Impulse, ImpulsePolicy, PipelineStage,
    SolverConfig, StepParams, StepStats,
};
