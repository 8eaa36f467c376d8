// ─────────────────────────────────────────────────────────────────────
// Visco Core — Polymeric Stress
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Polymeric stress and its divergence, the source handed to the
//! momentum predictor.

use crate::sweep::map_cells;
use ndarray::Array2;
use visco_math::interp::gradient_at;
use visco_types::error::{ViscoError, ViscoResult};
use visco_types::state::{Grid, Representation, ScalarField, TensorField};

/// `τ_p = G(x)·(A − I)`, component-wise in the field's layout.
pub fn polymeric_stress(conformation: &TensorField, modulus: &ScalarField) -> ViscoResult<TensorField> {
    if modulus.len() != conformation.ncells() {
        return Err(ViscoError::FieldShapeMismatch {
            field: "modulus".to_string(),
            expected: (conformation.ncells(), 1),
            got: (modulus.len(), 1),
        });
    }
    let repr = conformation.repr();
    let identity = repr.identity_components();
    let data = conformation.data();
    Ok(TensorField::from_fn(repr, conformation.ncells(), |idx, c| {
        modulus[idx] * (data[[idx, c]] - identity[c])
    }))
}

/// Divergence of the stress, one row `[f_x, f_y(, f_z)]` per cell.
///
/// Axisymmetric layout (x axial, y radial, cell-centre radius r):
///
/// ```text
/// f_x = ∂τxx/∂x + ∂τxy/∂r + τxy/r
/// f_r = ∂τxy/∂x + ∂τyy/∂r + (τyy − τθθ)/r
/// ```
pub fn stress_divergence(stress: &TensorField, grid: &Grid) -> Array2<f64> {
    let repr = stress.repr();
    let dim = repr.dim();
    let data = stress.data();
    // Component index of τ_ij in the packed layout.
    let slot = |i: usize, j: usize| -> usize {
        let (a, b) = if i <= j { (i, j) } else { (j, i) };
        match (repr, a, b) {
            (Representation::Scalar3D, 0, 0) => 0,
            (Representation::Scalar3D, 0, 1) => 1,
            (Representation::Scalar3D, 0, 2) => 2,
            (Representation::Scalar3D, 1, 1) => 3,
            (Representation::Scalar3D, 1, 2) => 4,
            (Representation::Scalar3D, _, _) => 5,
            (_, 0, 0) => 0,
            (_, 0, 1) => 1,
            (_, _, _) => 2,
        }
    };

    let rows = map_cells(grid.ncells(), |idx| {
        let mut f = [0.0; 3];
        for (i, fi) in f.iter_mut().enumerate().take(dim) {
            for j in 0..dim {
                let c = slot(i, j);
                *fi += gradient_at(grid, idx, j, |cell| data[[cell, c]]);
            }
        }
        if repr.is_axisymmetric() {
            let r = grid.center(idx)[1];
            if r > 0.0 {
                let t_xy = data[[idx, 1]];
                let t_yy = data[[idx, 2]];
                let t_hoop = data[[idx, 3]];
                f[0] += t_xy / r;
                f[1] += (t_yy - t_hoop) / r;
            }
        }
        f
    });
    Array2::from_shape_fn((rows.len(), dim), |(idx, axis)| rows[idx][axis])
}
