//! Interaction impulses injected into the velocity field
//!
//! An impulse overwrites (does not accumulate) the velocity of every cell in a
//! `(2r + 1)^D` block of nearest cells around its position. Impulses are
//! queued by the driver and consumed at the start of the next tick.

use crate::grid::VectorField;
use nalgebra::SVector;
use serde::{Deserialize, Serialize};

/// A velocity impulse at a normalized grid position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Impulse<const D: usize> {
    /// Normalized position, one component per axis, nominally in `[0, 1)`
    pub position: SVector<f32, D>,
    /// Velocity written into every affected cell
    pub velocity: SVector<f32, D>,
}

impl<const D: usize> Impulse<D> {
    /// Create an impulse from plain arrays
    #[must_use]
    pub fn new(position: [f32; D], velocity: [f32; D]) -> Self {
        Self {
            position: SVector::from(position),
            velocity: SVector::from(velocity),
        }
    }

    /// True when position and velocity are free of NaN and infinity
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.velocity.iter()).all(|v| v.is_finite())
    }
}

/// Overwrite the velocity of the block of cells around an impulse
///
/// The block is centred on the cell nearest to the impulse position and
/// extends `radius` whole cells along every axis. Writes go straight to the
/// current surfaces: impulses are applied between ticks, never inside a stage.
///
/// A block wider than an axis covers that axis once, so every cell is written
/// at most once per impulse.
///
/// # Arguments
///
/// * `velocity` - Field to write into
/// * `impulse` - Position and velocity to apply
/// * `radius` - Half-width of the block in cells
///
/// # Returns
///
/// Number of distinct cells written
pub fn apply_impulse<const D: usize>(
    velocity: &mut VectorField<D>,
    impulse: &Impulse<D>,
    radius: usize,
) -> usize {
    let extents = velocity.extents();
    let position: [f32; D] = std::array::from_fn(|axis| impulse.position[axis]);
    let centre = velocity.component(0).nearest_cell(position);

    // First cell and number of cells covered along each axis
    let side = radius.saturating_mul(2).saturating_add(1);
    let spans: [usize; D] = std::array::from_fn(|axis| side.min(extents[axis]));
    let first: [isize; D] =
        std::array::from_fn(|axis| centre[axis] - (radius % extents[axis]) as isize);
    let cells: usize = spans.iter().product();

    for block_index in 0..cells {
        let mut rest = block_index;
        let mut coord = first;
        for axis in 0..D {
            coord[axis] += (rest % spans[axis]) as isize;
            rest /= spans[axis];
        }

        for axis in 0..D {
            velocity
                .component_mut(axis)
                .set(coord, impulse.velocity[axis]);
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_overwrites_block() {
        let mut field = VectorField::new([16, 16]).unwrap();
        field.component_mut(0).clear(1.0);

        apply_impulse(&mut field, &Impulse::new([0.5, 0.5], [10.0, -2.0]), 3);

        // 7x7 block centred on cell (8, 8)
        for y in 0..16 {
            for x in 0..16 {
                let inside = (5..=11).contains(&x) && (5..=11).contains(&y);
                let expected = if inside { (10.0, -2.0) } else { (1.0, 0.0) };
                assert_eq!(
                    (
                        field.component(0).get([x, y]),
                        field.component(1).get([x, y])
                    ),
                    expected,
                    "cell ({x}, {y})"
                );
            }
        }
    }

    #[test]
    fn test_impulse_wraps_around_edges() {
        let mut field = VectorField::new([8, 8]).unwrap();
        apply_impulse(&mut field, &Impulse::new([0.0, 0.0], [0.0, 5.0]), 1);

        for x in [-1, 0, 1] {
            for y in [-1, 0, 1] {
                assert_eq!(field.component(1).get([x, y]), 5.0);
            }
        }
        assert_eq!(field.component(1).get([2, 0]), 0.0);
        assert_eq!(field.component(1).get([6, 0]), 0.0);
    }

    #[test]
    fn test_zero_radius_touches_one_cell_3d() {
        let mut field = VectorField::new([4, 4, 4]).unwrap();
        apply_impulse(&mut field, &Impulse::new([0.25, 0.5, 0.75], [1.0, 2.0, 3.0]), 0);

        assert_eq!(field.vector_at([1, 2, 3]), SVector::from([1.0, 2.0, 3.0]));
        assert_eq!(field.kinetic_energy(), 14.0);
    }

    #[test]
    fn test_block_is_full_on_half_cell_positions() {
        // Positions exactly between two cells must still write a whole block
        for n in 10..=30_usize {
            for k in 0..n {
                let p = (k as f32 + 0.5) / n as f32;
                let mut field = VectorField::new([n, n]).unwrap();
                let written = apply_impulse(&mut field, &Impulse::new([p, p], [1.0, 1.0]), 3);

                let touched = field
                    .component(0)
                    .as_slice()
                    .iter()
                    .filter(|&&v| v == 1.0)
                    .count();
                assert_eq!(written, 49, "n={n} p={p}");
                assert_eq!(touched, 49, "n={n} p={p}: {touched} cells written");
            }
        }
    }

    #[test]
    fn test_block_is_centred_on_nearest_cell() {
        let mut field = VectorField::new([10, 10]).unwrap();
        apply_impulse(&mut field, &Impulse::new([0.72, 0.68], [2.0, 0.0]), 1);

        // 7.2 and 6.8 both round to cell 7
        for x in 0..10 {
            for y in 0..10 {
                let inside = (6..=8).contains(&x) && (6..=8).contains(&y);
                let expected = if inside { 2.0 } else { 0.0 };
                assert_eq!(field.component(0).get([x, y]), expected, "cell ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_block_wider_than_grid_covers_it_once() {
        let mut field = VectorField::new([4, 6]).unwrap();
        let written = apply_impulse(&mut field, &Impulse::new([0.5, 0.5], [1.0, 1.0]), 3);
        assert_eq!(written, 4 * 6);
        assert!(field.component(1).as_slice().iter().all(|&v| v == 1.0));

        // A radius that would overflow the block arithmetic is bounded too
        let mut field = VectorField::new([3, 3, 3]).unwrap();
        let written = apply_impulse(
            &mut field,
            &Impulse::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            usize::MAX,
        );
        assert_eq!(written, 27);
        assert_eq!(field.kinetic_energy(), 27.0);
    }

    #[test]
    fn test_non_finite_impulse_detected() {
        assert!(Impulse::new([0.5, 0.5], [1.0, 0.0]).is_finite());
        assert!(!Impulse::new([f32::NAN, 0.5], [1.0, 0.0]).is_finite());
        assert!(!Impulse::new([0.5, 0.5], [f32::INFINITY, 0.0]).is_finite());
    }
}
