//! Bilinear interpolation and finite-difference gradients on cell-centred
//! fields.

use ndarray::ArrayView1;
use visco_types::state::Grid;

/// Bilinear interpolation of a 2D cell-centred field at `(x, y)`.
///
/// Positions outside the cell-centre hull are clamped to it.
pub fn interp2d(field: ArrayView1<'_, f64>, grid: &Grid, x: f64, y: f64) -> f64 {
    // Fractional index relative to the first cell centre
    let fx = (x - grid.origin[0]) / grid.delta - 0.5;
    let fy = (y - grid.origin[1]) / grid.delta - 0.5;

    let ix0 = (fx.floor() as isize).clamp(0, (grid.nx as isize - 2).max(0)) as usize;
    let iy0 = (fy.floor() as isize).clamp(0, (grid.ny as isize - 2).max(0)) as usize;
    let ix1 = (ix0 + 1).min(grid.nx - 1);
    let iy1 = (iy0 + 1).min(grid.ny - 1);

    let tx = (fx - ix0 as f64).clamp(0.0, 1.0);
    let ty = (fy - iy0 as f64).clamp(0.0, 1.0);

    let v00 = field[grid.index(ix0, iy0, 0)];
    let v10 = field[grid.index(ix1, iy0, 0)];
    let v01 = field[grid.index(ix0, iy1, 0)];
    let v11 = field[grid.index(ix1, iy1, 0)];

    (1.0 - ty) * ((1.0 - tx) * v00 + tx * v10) + ty * ((1.0 - tx) * v01 + tx * v11)
}

/// ∂φ/∂x_axis at cell `idx`: central differences inside, one-sided at the
/// block edges, zero along a collapsed axis.
pub fn gradient_at(grid: &Grid, idx: usize, axis: usize, value: impl Fn(usize) -> f64) -> f64 {
    if axis >= grid.dim || grid.extent(axis) < 2 {
        return 0.0;
    }
    let lo_edge = grid.is_edge(idx, axis, -1);
    let hi_edge = grid.is_edge(idx, axis, 1);
    if lo_edge {
        (value(grid.neighbor(idx, axis, 1)) - value(idx)) / grid.delta
    } else if hi_edge {
        (value(idx) - value(grid.neighbor(idx, axis, -1))) / grid.delta
    } else {
        (value(grid.neighbor(idx, axis, 1)) - value(grid.neighbor(idx, axis, -1)))
            / (2.0 * grid.delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn test_interp2d_exact_cell_centre() {
        let grid = Grid::new_2d(5, 5, 1.0, [0.0, 0.0]);
        let field = Array1::from_shape_fn(grid.ncells(), |idx| {
            let [i, j, _] = grid.coords(idx);
            (j * 10 + i) as f64
        });
        let val = interp2d(field.view(), &grid, 2.5, 2.5);
        assert!((val - 22.0).abs() < 1e-10, "val = {val}, expected 22");
    }

    #[test]
    fn test_interp2d_linear() {
        let grid = Grid::new_2d(11, 11, 1.0, [0.0, 0.0]);
        let field = Array1::from_shape_fn(grid.ncells(), |idx| {
            let c = grid.center(idx);
            c[0] + c[1]
        });
        let val = interp2d(field.view(), &grid, 3.7, 6.2);
        assert!((val - 9.9).abs() < 1e-10, "Linear interpolation: {val}");
    }

    #[test]
    fn test_gradient_linear_field() {
        let grid = Grid::new_2d(8, 6, 0.5, [-2.0, 0.0]);
        let field = Array1::from_shape_fn(grid.ncells(), |idx| {
            let c = grid.center(idx);
            2.0 * c[0] - 3.0 * c[1]
        });
        for idx in 0..grid.ncells() {
            let dx = gradient_at(&grid, idx, 0, |n| field[n]);
            let dy = gradient_at(&grid, idx, 1, |n| field[n]);
            assert!((dx - 2.0).abs() < 1e-12, "dx at {idx} = {dx}");
            assert!((dy + 3.0).abs() < 1e-12, "dy at {idx} = {dy}");
            assert_eq!(gradient_at(&grid, idx, 2, |n| field[n]), 0.0);
        }
    }
}
