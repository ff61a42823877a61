//! Pressure projection: divergence, Jacobi pressure solve and gradient
//! subtraction
//!
//! Together these stages remove (most of) the compressible part of the velocity
//! field. The pressure is re-solved from a fixed baseline every tick with a
//! fixed number of Jacobi passes, so the cost per tick is bounded and
//! independent of the flow.

use crate::grid::stencil::{central_difference, fill_cells, neighbour_sum};
use crate::grid::{DoubleGrid, Grid, VectorField};

/// Compute the divergence of the current velocity generation
///
/// `div = ½·Σ_a (v_a(+1 along a) − v_a(−1 along a))`, positive for outflow.
pub fn compute_divergence<const D: usize>(velocity: &VectorField<D>, divergence: &mut Grid<D>) {
    fill_cells(divergence, |coord| {
        0.5 * (0..D)
            .map(|axis| central_difference(velocity.component(axis), coord, axis))
            .sum::<f32>()
    });
}

/// Solve `∇²p = div` by fixed-count Jacobi relaxation
///
/// The current pressure surface is reset to `baseline` first; every pass then
/// computes `(Σ neighbours − div) / (2·D)` into the next surface and commits
/// it. After the last pass the current surface holds the final iterate.
///
/// # Arguments
///
/// * `pressure` - Pressure field, re-solved from `baseline`
/// * `divergence` - Divergence of the velocity being projected
/// * `baseline` - Starting value for every pressure cell
/// * `iterations` - Number of relaxation passes (at least one)
pub fn solve_pressure<const D: usize>(
    pressure: &mut DoubleGrid<D>,
    divergence: &Grid<D>,
    baseline: f32,
    iterations: usize,
) {
    debug_assert!(iterations > 0, "pressure solve needs at least one pass");
    let neighbours = (2 * D) as f32;

    pressure.current_mut().clear(baseline);
    for _ in 0..iterations {
        let mut stage = pressure.begin_stage();
        stage.sweep(|current, coord| {
            (neighbour_sum(current, coord) - divergence.get(coord)) / neighbours
        });
        stage.commit();
    }
}

/// Subtract the pressure gradient from the velocity field
///
/// `v_a −= p(+1 along a) − p(−1 along a)` for every axis, staged and committed
/// as one generation.
pub fn subtract_pressure_gradient<const D: usize>(
    velocity: &mut VectorField<D>,
    pressure: &Grid<D>,
) {
    let mut stage = velocity.begin_stage();
    stage.sweep(|current, coord| {
        std::array::from_fn(|axis| {
            current.get(axis, coord) - central_difference(pressure, coord, axis)
        })
    });
    stage.commit();
}

/// Sum of absolute divergence over all cells of the current velocity
#[must_use]
pub fn divergence_magnitude<const D: usize>(velocity: &VectorField<D>) -> f32 {
    let mut divergence = Grid::filled(velocity.extents(), 0.0);
    compute_divergence(velocity, &mut divergence);
    divergence.abs_sum()
}
