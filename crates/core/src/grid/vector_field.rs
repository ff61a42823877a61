//! Velocity field: one double grid per spatial axis
//!
//! All axis components are staged and committed together, so every component
//! visible to a reader always belongs to the same generation.

use super::double_grid::DoubleGrid;
use super::scalar_grid::{validate_extents, Coord, Grid};
use super::stencil;
use crate::error::FluidError;
use nalgebra::SVector;

/// D-component vector field over a toroidal grid
#[derive(Debug, Clone, PartialEq)]
pub struct VectorField<const D: usize> {
    /// One double grid per axis (x, y[, z])
    axes: [DoubleGrid<D>; D],
    extents: [usize; D],
}

impl<const D: usize> VectorField<D> {
    /// Create a zero vector field
    ///
    /// # Errors
    ///
    /// Returns [`FluidError::ZeroExtent`] if any axis has no cells.
    pub fn new(extents: [usize; D]) -> Result<Self, FluidError> {
        validate_extents(extents)?;
        Ok(Self {
            axes: std::array::from_fn(|_| DoubleGrid::zeroed(extents)),
            extents,
        })
    }

    /// Number of cells along each axis
    #[must_use]
    pub fn extents(&self) -> [usize; D] {
        self.extents
    }

    /// Current surface of one axis component
    ///
    /// # Panics
    ///
    /// Panics if `axis >= D`.
    #[must_use]
    pub fn component(&self, axis: usize) -> &Grid<D> {
        self.axes[axis].current()
    }

    /// Mutable current surface of one axis component, for seeding
    pub fn component_mut(&mut self, axis: usize) -> &mut Grid<D> {
        self.axes[axis].current_mut()
    }

    /// Read view over the current surfaces of every component
    #[must_use]
    pub fn view(&self) -> VectorView<'_, D> {
        VectorView {
            axes: self.axes.iter().map(DoubleGrid::current).collect(),
        }
    }

    /// Velocity vector at a cell
    #[must_use]
    pub fn vector_at(&self, coord: Coord<D>) -> SVector<f32, D> {
        SVector::from_fn(|axis, _| self.component(axis).get(coord))
    }

    /// Interpolated velocity vector at a normalized coordinate
    #[must_use]
    pub fn sample(&self, u: [f32; D]) -> SVector<f32, D> {
        SVector::from_fn(|axis, _| self.component(axis).sample(u))
    }

    /// Set every component of every cell to `value`
    pub fn clear(&mut self, value: f32) {
        for axis in &mut self.axes {
            axis.current_mut().clear(value);
        }
    }

    /// Swap the surfaces of every component together
    pub fn swap(&mut self) {
        for axis in &mut self.axes {
            axis.swap();
        }
    }

    /// Open a write stage over all components
    pub fn begin_stage(&mut self) -> VectorStage<'_, D> {
        VectorStage {
            field: self,
            written: false,
            committed: false,
        }
    }

    /// Sum of squared velocity over all cells and components
    #[must_use]
    pub fn kinetic_energy(&self) -> f64 {
        self.axes
            .iter()
            .flat_map(|axis| axis.current().as_slice())
            .map(|&v| f64::from(v) * f64::from(v))
            .sum()
    }

    /// Largest velocity magnitude over all cells
    #[must_use]
    pub fn max_speed(&self) -> f32 {
        let len = self.axes[0].current().len();
        (0..len)
            .map(|index| {
                self.axes
                    .iter()
                    .map(|axis| axis.current().as_slice()[index].powi(2))
                    .sum::<f32>()
                    .sqrt()
            })
            .fold(0.0, f32::max)
    }

    /// True when every component of every cell is finite
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.axes
            .iter()
            .all(|axis| axis.current().as_slice().iter().all(|v| v.is_finite()))
    }
}

/// Read-only view of the current generation of a [`VectorField`]
pub struct VectorView<'a, const D: usize> {
    axes: Vec<&'a Grid<D>>,
}

impl<const D: usize> VectorView<'_, D> {
    /// Component `axis` at a cell
    #[inline]
    #[must_use]
    pub fn get(&self, axis: usize, coord: Coord<D>) -> f32 {
        self.axes[axis].get(coord)
    }

    /// Component `axis` interpolated at a normalized coordinate
    #[inline]
    #[must_use]
    pub fn sample(&self, axis: usize, u: [f32; D]) -> f32 {
        self.axes[axis].sample(u)
    }

    /// Grid of one component
    #[must_use]
    pub fn component(&self, axis: usize) -> &Grid<D> {
        self.axes[axis]
    }
}

/// An open write stage over every component of a [`VectorField`]
///
/// Same discipline as [`super::GridStage`]: reads see the current generation,
/// writes land in the next one, and [`VectorStage::commit`] swaps all
/// components at once.
#[must_use = "a stage publishes nothing until it is committed"]
pub struct VectorStage<'a, const D: usize> {
    field: &'a mut VectorField<D>,
    written: bool,
    committed: bool,
}

impl<const D: usize> VectorStage<'_, D> {
    /// Compute every cell of the next generation of all components
    ///
    /// `f` receives a view of the current generation and the cell being
    /// written, and returns the new value of each component.
    pub fn sweep<F>(&mut self, f: F)
    where
        F: Fn(&VectorView<'_, D>, Coord<D>) -> [f32; D] + Sync,
    {
        let (current, next): (Vec<&Grid<D>>, Vec<&mut Grid<D>>) = self
            .field
            .axes
            .iter_mut()
            .map(DoubleGrid::split_mut)
            .unzip();
        let view = VectorView { axes: current };

        stencil::fill_components(next, |coord| f(&view, coord));
        self.written = true;
    }

    /// Publish the written generation of every component
    pub fn commit(mut self) {
        debug_assert!(self.written, "vector stage committed before a sweep");
        self.field.swap();
        self.committed = true;
    }
}

impl<const D: usize> Drop for VectorStage<'_, D> {
    fn drop(&mut self) {
        debug_assert!(
            self.committed || std::thread::panicking(),
            "vector stage dropped without commit"
        );
    }
}
