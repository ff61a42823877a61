//! Dense scalar grid over a toroidal index space
//!
//! A `Grid<D>` stores one `f32` per cell in row-major order
//! (`x + y * width + z * width * height`). Every coordinate access is reduced
//! modulo the axis extent first, so there are no boundary cells and no
//! out-of-range coordinates: the grid wraps around like a torus.

use crate::error::FluidError;
use rand::Rng;

/// Integer cell coordinate, one component per axis
///
/// Components may be negative or exceed the extent; they wrap.
pub type Coord<const D: usize> = [isize; D];

/// Dense scalar field over a D-dimensional wrap-around grid
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<const D: usize> {
    /// Cell values in row-major order (x fastest)
    data: Vec<f32>,
    /// Number of cells along each axis
    extents: [usize; D],
}

/// Reduce a possibly out-of-range coordinate component into `[0, extent)`
#[inline]
fn wrap_axis(value: isize, extent: usize) -> usize {
    value.rem_euclid(extent as isize) as usize
}

/// Decompose a flat row-major index into a cell coordinate
#[inline]
pub(crate) fn coord_of<const D: usize>(extents: [usize; D], index: usize) -> Coord<D> {
    let mut coord = [0; D];
    let mut rest = index;
    for axis in 0..D {
        coord[axis] = (rest % extents[axis]) as isize;
        rest /= extents[axis];
    }
    coord
}

/// Check that every axis has at least one cell
pub(crate) fn validate_extents<const D: usize>(extents: [usize; D]) -> Result<(), FluidError> {
    match extents.iter().position(|&extent| extent == 0) {
        Some(axis) => Err(FluidError::ZeroExtent { axis }),
        None => Ok(()),
    }
}

impl<const D: usize> Grid<D> {
    /// Create a new grid with the given extents, initialized to zero
    ///
    /// # Arguments
    ///
    /// * `extents` - Number of cells along each axis (`[width, height]` or
    ///   `[width, height, depth]`)
    ///
    /// # Errors
    ///
    /// Returns [`FluidError::ZeroExtent`] if any axis has no cells.
    pub fn new(extents: [usize; D]) -> Result<Self, FluidError> {
        Self::with_value(extents, 0.0)
    }

    /// Create a new grid with every cell set to `value`
    ///
    /// # Errors
    ///
    /// Returns [`FluidError::ZeroExtent`] if any axis has no cells.
    pub fn with_value(extents: [usize; D], value: f32) -> Result<Self, FluidError> {
        validate_extents(extents)?;
        Ok(Self::filled(extents, value))
    }

    /// Allocate without validating; callers have already checked the extents
    pub(crate) fn filled(extents: [usize; D], value: f32) -> Self {
        Self {
            data: vec![value; extents.iter().product()],
            extents,
        }
    }

    /// Number of cells along each axis
    #[must_use]
    pub fn extents(&self) -> [usize; D] {
        self.extents
    }

    /// Extent of the first axis
    #[must_use]
    pub fn width(&self) -> usize {
        self.extents[0]
    }

    /// Extent of the second axis (1 for a one-dimensional grid)
    #[must_use]
    pub fn height(&self) -> usize {
        self.extents.get(1).copied().unwrap_or(1)
    }

    /// Extent of the third axis, if the grid has one
    #[must_use]
    pub fn depth(&self) -> Option<usize> {
        self.extents.get(2).copied()
    }

    /// Total number of cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// A grid always has at least one cell once constructed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cell values in row-major order
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Flat index of a coordinate after wrapping each axis
    #[inline]
    #[must_use]
    pub fn index(&self, coord: Coord<D>) -> usize {
        let mut index = 0;
        let mut stride = 1;
        for axis in 0..D {
            index += wrap_axis(coord[axis], self.extents[axis]) * stride;
            stride *= self.extents[axis];
        }
        index
    }

    /// Coordinate of a flat index
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[must_use]
    pub fn coord(&self, index: usize) -> Coord<D> {
        assert!(index < self.data.len(), "Cell index out of bounds");
        coord_of(self.extents, index)
    }

    /// Iterate over every cell coordinate in storage order
    pub fn coords(&self) -> impl Iterator<Item = Coord<D>> + '_ {
        (0..self.data.len()).map(|index| coord_of(self.extents, index))
    }

    /// Value at a coordinate, wrapping each axis
    #[inline]
    #[must_use]
    pub fn get(&self, coord: Coord<D>) -> f32 {
        self.data[self.index(coord)]
    }

    /// Write a value at a coordinate, wrapping each axis
    ///
    /// Direct same-surface write, intended for initialization and seeding.
    #[inline]
    pub fn set(&mut self, coord: Coord<D>, value: f32) {
        let index = self.index(coord);
        self.data[index] = value;
    }

    /// D-linear interpolation at a normalized coordinate
    ///
    /// Each component of `u` is scaled by its axis extent, so `[0, 1)` spans the
    /// grid once; values outside that range wrap. The result is a convex
    /// combination of the `2^D` wrapped cells surrounding the sample point
    /// (bilinear in 2D, trilinear in 3D), so it never overshoots them.
    #[must_use]
    pub fn sample(&self, u: [f32; D]) -> f32 {
        let mut base = [0_isize; D];
        let mut frac = [0.0_f32; D];
        for axis in 0..D {
            // Reduce to one period first so huge inputs cannot overflow the
            // integer corner coordinates
            let x = u[axis].rem_euclid(1.0) * self.extents[axis] as f32;
            let floor = x.floor();
            base[axis] = floor as isize;
            frac[axis] = x - floor;
        }

        let mut value = 0.0;
        for corner in 0..(1_usize << D) {
            let mut coord = base;
            let mut weight = 1.0;
            for axis in 0..D {
                if (corner >> axis) & 1 == 1 {
                    coord[axis] += 1;
                    weight *= frac[axis];
                } else {
                    weight *= 1.0 - frac[axis];
                }
            }
            value += weight * self.get(coord);
        }
        value
    }

    /// Nearest cell to a normalized coordinate, wrapped into the grid
    #[must_use]
    pub fn nearest_cell(&self, u: [f32; D]) -> Coord<D> {
        let mut coord = [0; D];
        for axis in 0..D {
            let cell = (u[axis].rem_euclid(1.0) * self.extents[axis] as f32).round() as isize;
            coord[axis] = wrap_axis(cell, self.extents[axis]) as isize;
        }
        coord
    }

    /// Value of the cell nearest to a normalized coordinate
    #[must_use]
    pub fn sample_nearest(&self, u: [f32; D]) -> f32 {
        self.get(self.nearest_cell(u))
    }

    /// Overwrite the cell nearest to a normalized coordinate
    pub fn set_nearest(&mut self, u: [f32; D], value: f32) {
        let coord = self.nearest_cell(u);
        self.set(coord, value);
    }

    /// Fill every cell with `value`
    pub fn clear(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// Fill every cell with uniform noise in `[offset - scale, offset + scale)`
    ///
    /// # Arguments
    ///
    /// * `rng` - Random source (seed it for reproducible fields)
    /// * `scale` - Half-width of the noise band
    /// * `offset` - Centre of the noise band
    pub fn randomize<R: Rng>(&mut self, rng: &mut R, scale: f32, offset: f32) {
        let span = scale * 2.0;
        for cell in &mut self.data {
            *cell = (rng.random::<f32>() - 0.5) * span + offset;
        }
    }

    /// Smallest and largest cell value
    #[must_use]
    pub fn min_max(&self) -> (f32, f32) {
        self.data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Sum of absolute cell values
    #[must_use]
    pub fn abs_sum(&self) -> f32 {
        self.data.iter().map(|v| v.abs()).sum()
    }
}
