//! Toroidal grid storage: scalar grids, ping-pong grids and vector fields

pub mod double_grid;
pub mod scalar_grid;
pub mod stencil;
pub mod vector_field;

// Re-export main types
pub use double_grid::{DoubleGrid, GridStage};
pub use scalar_grid::{Coord, Grid};
pub use vector_field::{VectorField, VectorStage, VectorView};
