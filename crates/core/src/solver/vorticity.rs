//! Curl and vorticity confinement stages
//!
//! Rotation is measured per axis plane. A 2D grid has the single (x, y) plane
//! and a scalar curl; a 3D grid has three planes whose values form the curl
//! vector. Confinement pushes velocity along `N x ω`, where `N` is the unit
//! gradient of the curl magnitude, which re-injects the small-scale rotation
//! that the damped advection bleeds off.

use crate::grid::stencil::{central_difference, fill_cells, offset, rotation_planes};
use crate::grid::{Coord, Grid, VectorField};
use nalgebra::SVector;

/// Floor on the curl-gradient magnitude before normalization
pub const NORMALIZATION_EPSILON: f32 = 1e-4;

/// Compute the curl of the current velocity generation
///
/// Plane `(a, b)` receives `½·(∂v_b/∂a − ∂v_a/∂b)` using central differences.
/// `curl` holds one grid per rotation plane, in the order given by
/// [`rotation_planes`].
///
/// # Arguments
///
/// * `velocity` - Velocity field, read from its current surfaces
/// * `curl` - Output grids, fully overwritten
pub fn compute_curl<const D: usize>(velocity: &VectorField<D>, curl: &mut [Grid<D>]) {
    let planes = rotation_planes(D);
    debug_assert_eq!(curl.len(), planes.len(), "one curl grid per rotation plane");

    for (&(a, b), grid) in planes.iter().zip(curl.iter_mut()) {
        let va = velocity.component(a);
        let vb = velocity.component(b);
        fill_cells(grid, |coord| {
            0.5 * (central_difference(vb, coord, a) - central_difference(va, coord, b))
        });
    }
}

/// Curl magnitude at a cell
#[inline]
fn curl_magnitude<const D: usize>(curl: &[Grid<D>], coord: Coord<D>) -> f32 {
    curl.iter()
        .map(|grid| grid.get(coord).powi(2))
        .sum::<f32>()
        .sqrt()
}

/// Unit gradient of the curl magnitude, zero where it cannot be formed
fn confinement_direction<const D: usize>(curl: &[Grid<D>], coord: Coord<D>) -> SVector<f32, D> {
    let gradient = SVector::<f32, D>::from_fn(|axis, _| {
        curl_magnitude(curl, offset(coord, axis, 1)) - curl_magnitude(curl, offset(coord, axis, -1))
    });
    let direction = gradient / gradient.norm().max(NORMALIZATION_EPSILON);

    if direction.iter().all(|v| v.is_finite()) {
        direction
    } else {
        SVector::zeros()
    }
}

/// Add the vorticity confinement force to the velocity field
///
/// Reads the curl computed by [`compute_curl`] for the same generation. The
/// force is `curl_factor · (N x ω)`, which in 2D reduces to
/// `(−curl_factor·ω·N_y, +curl_factor·ω·N_x)`. Non-finite forces are dropped
/// for the affected cell instead of poisoning the field.
///
/// # Arguments
///
/// * `velocity` - Velocity field, staged and committed once
/// * `curl` - Per-plane curl of the current velocity generation
/// * `curl_factor` - Confinement strength
/// * `dt` - Timestep
pub fn apply_vorticity_confinement<const D: usize>(
    velocity: &mut VectorField<D>,
    curl: &[Grid<D>],
    curl_factor: f32,
    dt: f32,
) {
    let planes = rotation_planes(D);

    let mut stage = velocity.begin_stage();
    stage.sweep(|current, coord| {
        let direction = confinement_direction(curl, coord);

        let mut cross = SVector::<f32, D>::zeros();
        for (&(a, b), grid) in planes.iter().zip(curl) {
            let w = grid.get(coord);
            cross[a] += w * direction[b];
            cross[b] -= w * direction[a];
        }

        let mut force = cross * -curl_factor;
        if !force.iter().all(|v| v.is_finite()) {
            force = SVector::zeros();
        }

        std::array::from_fn(|axis| current.get(axis, coord) + force[axis] * dt)
    });
    stage.commit();
}
