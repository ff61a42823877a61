//! Axis-neighbour stencils and whole-grid sweeps
//!
//! Every pipeline stage is expressed as a sum over the `2·D` axis-neighbour
//! offsets of a cell, so the same code serves 2D and 3D grids. Sweeps write
//! each cell exactly once from values that are only read, which makes them
//! safe to split across threads: with the `parallel` feature rows are
//! distributed with Rayon, otherwise they run in order. Both produce
//! bit-identical results.

use super::scalar_grid::{coord_of, Coord, Grid};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Axis planes carrying a rotation component, in curl-vector order
///
/// 2D has the single (x, y) plane. 3D has (y, z), (z, x), (x, y), which are the
/// x, y and z components of the curl vector.
#[must_use]
pub const fn rotation_planes(dimension: usize) -> &'static [(usize, usize)] {
    match dimension {
        2 => &[(0, 1)],
        3 => &[(1, 2), (2, 0), (0, 1)],
        _ => &[],
    }
}

/// Coordinate displaced by `step` cells along `axis`
#[inline]
#[must_use]
pub fn offset<const D: usize>(mut coord: Coord<D>, axis: usize, step: isize) -> Coord<D> {
    coord[axis] += step;
    coord
}

/// Difference between the +1 and -1 neighbours along `axis`
#[inline]
#[must_use]
pub fn central_difference<const D: usize>(grid: &Grid<D>, coord: Coord<D>, axis: usize) -> f32 {
    grid.get(offset(coord, axis, 1)) - grid.get(offset(coord, axis, -1))
}

/// Sum of the `2·D` axis neighbours of a cell
#[inline]
#[must_use]
pub fn neighbour_sum<const D: usize>(grid: &Grid<D>, coord: Coord<D>) -> f32 {
    (0..D)
        .map(|axis| grid.get(offset(coord, axis, 1)) + grid.get(offset(coord, axis, -1)))
        .sum()
}

/// Overwrite every cell of `grid` with `f(coord)`
pub fn fill_cells<const D: usize, F>(grid: &mut Grid<D>, f: F)
where
    F: Fn(Coord<D>) -> f32 + Sync,
{
    let extents = grid.extents();
    let width = extents[0];
    let fill_row = |(row, cells): (usize, &mut [f32])| {
        let mut coord = coord_of(extents, row * width);
        for (x, cell) in cells.iter_mut().enumerate() {
            coord[0] = x as isize;
            *cell = f(coord);
        }
    };

    #[cfg(feature = "parallel")]
    grid.as_mut_slice()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(fill_row);

    #[cfg(not(feature = "parallel"))]
    grid.as_mut_slice()
        .chunks_mut(width)
        .enumerate()
        .for_each(fill_row);
}

/// Overwrite every cell of each component grid with `f(coord)[axis]`
///
/// `grids` holds one grid per axis, all with the same extents. `f` runs once
/// per cell and its result is scattered across the components row by row.
pub fn fill_components<const D: usize, F>(grids: Vec<&mut Grid<D>>, f: F)
where
    F: Fn(Coord<D>) -> [f32; D] + Sync,
{
    let Some(extents) = grids.first().map(|grid| grid.extents()) else {
        return;
    };
    let width = extents[0];

    // rows[r][axis] is row r of component `axis`
    let mut rows: Vec<Vec<&mut [f32]>> = Vec::new();
    for grid in grids {
        for (row, cells) in grid.as_mut_slice().chunks_mut(width).enumerate() {
            if row == rows.len() {
                rows.push(Vec::with_capacity(D));
            }
            rows[row].push(cells);
        }
    }

    let fill_row = |(row, components): (usize, &mut Vec<&mut [f32]>)| {
        let mut coord = coord_of(extents, row * width);
        for x in 0..width {
            coord[0] = x as isize;
            let value = f(coord);
            for (axis, cells) in components.iter_mut().enumerate() {
                cells[x] = value[axis];
            }
        }
    };

    #[cfg(feature = "parallel")]
    rows.par_iter_mut().enumerate().for_each(fill_row);

    #[cfg(not(feature = "parallel"))]
    rows.iter_mut().enumerate().for_each(fill_row);
}
