//! Ping-pong scalar grid with an explicit stage/commit discipline
//!
//! Stencil stages read neighbours that other cells of the same stage are
//! updating. Writing into a second surface and swapping only after the whole
//! sweep has finished guarantees every cell observes the same generation of
//! its neighbours (Jacobi, not Gauss-Seidel).
//!
//! A stage is opened with [`DoubleGrid::begin_stage`], which splits the grid
//! into a read-only view of the current surface and a write-only view of the
//! next one. [`GridStage::commit`] consumes the stage and swaps the surfaces.
//! While a stage is open it holds the grid mutably, so nothing else can read a
//! half-written generation.

use super::scalar_grid::{validate_extents, Coord, Grid};
use super::stencil;
use crate::error::FluidError;

/// Two equal-shaped grid surfaces, "current" and "next"
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleGrid<const D: usize> {
    current: Grid<D>,
    next: Grid<D>,
}

impl<const D: usize> DoubleGrid<D> {
    /// Create a double grid with both surfaces set to zero
    ///
    /// # Errors
    ///
    /// Returns [`FluidError::ZeroExtent`] if any axis has no cells.
    pub fn new(extents: [usize; D]) -> Result<Self, FluidError> {
        validate_extents(extents)?;
        Ok(Self::zeroed(extents))
    }

    pub(crate) fn zeroed(extents: [usize; D]) -> Self {
        Self {
            current: Grid::filled(extents, 0.0),
            next: Grid::filled(extents, 0.0),
        }
    }

    /// The publicly visible surface
    #[must_use]
    pub fn current(&self) -> &Grid<D> {
        &self.current
    }

    /// Mutable access to the visible surface, for initialization and seeding
    pub fn current_mut(&mut self) -> &mut Grid<D> {
        &mut self.current
    }

    /// Number of cells along each axis
    #[must_use]
    pub fn extents(&self) -> [usize; D] {
        self.current.extents()
    }

    /// Exchange the surfaces in O(1)
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }

    /// Borrow the current surface for reading and the next one for writing
    pub(crate) fn split_mut(&mut self) -> (&Grid<D>, &mut Grid<D>) {
        (&self.current, &mut self.next)
    }

    /// Open a write stage targeting the next surface
    pub fn begin_stage(&mut self) -> GridStage<'_, D> {
        GridStage {
            grid: self,
            written: 0,
            committed: false,
        }
    }
}

/// An open write stage on a [`DoubleGrid`]
///
/// Reads go to the current surface, writes go to the next surface. Dropping a
/// stage without calling [`GridStage::commit`] discards its writes and trips a
/// debug assertion.
#[must_use = "a stage publishes nothing until it is committed"]
pub struct GridStage<'a, const D: usize> {
    grid: &'a mut DoubleGrid<D>,
    written: usize,
    committed: bool,
}

impl<const D: usize> GridStage<'_, D> {
    /// Read-only view of the current generation
    #[must_use]
    pub fn read(&self) -> &Grid<D> {
        &self.grid.current
    }

    /// Write one cell of the next generation
    pub fn out(&mut self, coord: Coord<D>, value: f32) {
        self.grid.next.set(coord, value);
        self.written += 1;
    }

    /// Compute every cell of the next generation from the current one
    ///
    /// `f` receives the current surface and the cell coordinate being written.
    pub fn sweep<F>(&mut self, f: F)
    where
        F: Fn(&Grid<D>, Coord<D>) -> f32 + Sync,
    {
        let (current, next) = self.grid.split_mut();
        stencil::fill_cells(next, |coord| f(current, coord));
        self.written = next.len();
    }

    /// Publish the written generation by swapping the surfaces
    pub fn commit(mut self) {
        debug_assert!(
            self.written >= self.grid.next.len(),
            "stage committed after writing {} of {} cells",
            self.written,
            self.grid.next.len()
        );
        self.grid.swap();
        self.committed = true;
    }
}

impl<const D: usize> Drop for GridStage<'_, D> {
    fn drop(&mut self) {
        debug_assert!(
            self.committed || std::thread::panicking(),
            "grid stage dropped without commit"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_publishes_written_values() {
        let mut grid = DoubleGrid::new([4, 4]).unwrap();
        grid.current_mut().clear(1.0);

        let mut stage = grid.begin_stage();
        stage.sweep(|current, coord| current.get(coord) + (coord[0] + 4 * coord[1]) as f32);
        // Nothing visible before commit
        assert!(stage.read().as_slice().iter().all(|&v| v == 1.0));
        stage.commit();

        for (index, &value) in grid.current().as_slice().iter().enumerate() {
            assert_eq!(value, 1.0 + index as f32);
        }
    }

    #[test]
    fn test_sweep_reads_a_single_generation() {
        // A shift-right stencil: with in-place writes the first value would smear
        let mut grid = DoubleGrid::new([5, 1]).unwrap();
        grid.current_mut().set([0, 0], 1.0);

        let mut stage = grid.begin_stage();
        stage.sweep(|current, coord| current.get([coord[0] - 1, coord[1]]));
        stage.commit();

        assert_eq!(grid.current().as_slice(), &[0.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_out_writes_target_next_surface() {
        let mut grid = DoubleGrid::new([2, 2]).unwrap();
        let mut stage = grid.begin_stage();
        for (index, coord) in [[0, 0], [1, 0], [0, 1], [1, 1]].into_iter().enumerate() {
            stage.out(coord, index as f32 + 10.0);
            assert_eq!(stage.read().get(coord), 0.0);
        }
        stage.commit();
        assert_eq!(grid.current().as_slice(), &[10.0, 11.0, 12.0, 13.0]);
    }

    #[test]
    fn test_swap_exchanges_surfaces() {
        let mut grid = DoubleGrid::new([3, 3]).unwrap();
        grid.current_mut().clear(5.0);
        grid.swap();
        assert!(grid.current().as_slice().iter().all(|&v| v == 0.0));
        grid.swap();
        assert!(grid.current().as_slice().iter().all(|&v| v == 5.0));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "grid stage dropped without commit")]
    fn test_uncommitted_stage_asserts() {
        let mut grid = DoubleGrid::<2>::new([2, 2]).unwrap();
        let mut stage = grid.begin_stage();
        stage.sweep(|_, _| 1.0);
        drop(stage);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "stage committed after writing 1 of 4 cells")]
    fn test_partial_stage_asserts() {
        let mut grid = DoubleGrid::<2>::new([2, 2]).unwrap();
        let mut stage = grid.begin_stage();
        stage.out([0, 0], 1.0);
        stage.commit();
    }
}
