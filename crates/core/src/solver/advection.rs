//! Semi-Lagrangian self-advection of the velocity field

use crate::grid::VectorField;

/// Advect the velocity field along itself
///
/// Each cell traces back one timestep along its own velocity and takes the
/// interpolated velocity found there, scaled by `damping`. Departure points
/// are normalized by the axis extents before sampling, so backtracking past an
/// edge wraps like every other access.
///
/// # Arguments
///
/// * `velocity` - Velocity field, staged and committed once
/// * `dt` - Timestep
/// * `damping` - Factor applied to every advected component
pub fn advect_velocity<const D: usize>(velocity: &mut VectorField<D>, dt: f32, damping: f32) {
    let extents = velocity.extents();

    let mut stage = velocity.begin_stage();
    stage.sweep(|current, coord| {
        let departure: [f32; D] = std::array::from_fn(|axis| {
            (coord[axis] as f32 - current.get(axis, coord) * dt) / extents[axis] as f32
        });
        std::array::from_fn(|axis| current.sample(axis, departure) * damping)
    });
    stage.commit();
}
