//! Interface smoothing of the volume fraction.
//!
//! One pass applies the separable 1-2-1 kernel along every axis, which in
//! 2D is the 3x3 vertex-average `(4c + 2Σedges + Σcorners) / 16`. More
//! passes widen the transition zone by about one cell each.

use ndarray::Array1;
use visco_types::state::{Grid, ScalarField};

/// Smooth `f` with `passes` sweeps of the 1-2-1 kernel and clamp to [0, 1].
/// Zero passes only clamps.
pub fn smooth_fraction(f: &ScalarField, grid: &Grid, passes: usize) -> ScalarField {
    let mut current = f.clone();
    for _ in 0..passes {
        for axis in 0..grid.dim {
            if grid.extent(axis) < 2 {
                continue;
            }
            current = Array1::from_shape_fn(grid.ncells(), |idx| {
                let lo = grid.neighbor(idx, axis, -1);
                let hi = grid.neighbor(idx, axis, 1);
                0.25 * (current[lo] + 2.0 * current[idx] + current[hi])
            });
        }
    }
    current.mapv_inplace(|v| v.clamp(0.0, 1.0));
    current
}
