// ─────────────────────────────────────────────────────────────────────
// Visco Core — Advection
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Finite-volume transport of tensor components.
//!
//! Each component is a passive scalar carried by the cell-centred
//! velocity. Face velocities are the mean of the two adjacent cells and
//! face values come from a limited MUSCL reconstruction on the upwind
//! side. The update is written in advective form,
//! `φ ← φ − Δt/V · Σ_f A_f u_f (φ_f − φ)`, which leaves a uniform field
//! untouched for any velocity (including a zero log-conformation).

use crate::sweep::map_cells;
use visco_math::limiter::limited_slope;
use visco_types::config::LimiterKind;
use visco_types::state::{Grid, TensorField, VelocityField};

/// Largest `|u|·Δt/Δ` over all cells and axes.
pub fn max_courant(grid: &Grid, velocity: &VelocityField, dt: f64) -> f64 {
    let mut worst = 0.0_f64;
    for idx in 0..velocity.ncells() {
        for axis in 0..grid.dim.min(velocity.dim()) {
            worst = worst.max(velocity.get(idx, axis).abs());
        }
    }
    worst * dt / grid.delta
}

/// Advance every component of `field` by one advection step.
///
/// With `axisymmetric`, axis 1 is the radius: face areas and the cell
/// volume carry the factor r, so the radial flux through a face at
/// `r_c ± Δ/2` is weighted by `(r_c ± Δ/2) / r_c`.
pub fn advect(
    field: &TensorField,
    velocity: &VelocityField,
    grid: &Grid,
    dt: f64,
    limiter: LimiterKind,
    axisymmetric: bool,
) -> TensorField {
    let ncomp = field.repr().n_components();
    let data = field.data();
    let axes: Vec<usize> = (0..grid.dim).filter(|&a| grid.extent(a) > 1).collect();

    let rows = map_cells(grid.ncells(), |idx| {
        let mut row = [0.0; 6];
        let radius = grid.center(idx)[1];
        for (c, slot) in row.iter_mut().enumerate().take(ncomp) {
            let phi = data[[idx, c]];
            let value = |cell: usize| data[[cell, c]];
            let mut acc = 0.0;
            for &axis in &axes {
                for side in [-1isize, 1] {
                    let nb = grid.neighbor(idx, axis, side);
                    if nb == idx {
                        // Zero-gradient ghost: no face difference.
                        continue;
                    }
                    let u_face = 0.5 * (velocity.get(idx, axis) + velocity.get(nb, axis));
                    let outward = side as f64 * u_face;
                    let phi_face = if outward >= 0.0 {
                        phi + 0.5 * side as f64 * slope(grid, idx, axis, limiter, &value)
                    } else {
                        value(nb) - 0.5 * side as f64 * slope(grid, nb, axis, limiter, &value)
                    };
                    let weight = if axisymmetric && axis == 1 && radius > 0.0 {
                        (radius + 0.5 * side as f64 * grid.delta) / radius
                    } else {
                        1.0
                    };
                    acc += weight * outward * (phi_face - phi);
                }
            }
            *slot = phi - dt / grid.delta * acc;
        }
        row
    });

    TensorField::from_fn(field.repr(), rows.len(), |idx, c| rows[idx][c])
}

/// Limited slope (per cell) of `value` at `idx` along `axis`.
fn slope(
    grid: &Grid,
    idx: usize,
    axis: usize,
    limiter: LimiterKind,
    value: &impl Fn(usize) -> f64,
) -> f64 {
    if limiter == LimiterKind::None {
        return 0.0;
    }
    let centre = value(idx);
    let backward = centre - value(grid.neighbor(idx, axis, -1));
    let forward = value(grid.neighbor(idx, axis, 1)) - centre;
    limited_slope(limiter, backward, forward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use visco_types::state::Representation;

    fn shear_velocity(grid: &Grid) -> VelocityField {
        VelocityField::from_fn(grid, |x| [0.3 + x[1], -0.2 * x[0], 0.0])
    }

    #[test]
    fn test_uniform_field_is_preserved_exactly() {
        let grid = Grid::new_2d(10, 8, 0.1, [-0.5, 0.0]);
        let velocity = shear_velocity(&grid);
        for repr in [Representation::Tensor2D, Representation::Scalar2D] {
            let field = TensorField::from_fn(repr, grid.ncells(), |_, c| 0.25 * c as f64 - 0.1);
            for limiter in [LimiterKind::None, LimiterKind::VanLeer, LimiterKind::Superbee] {
                let out = advect(&field, &velocity, &grid, 0.05, limiter, repr.is_axisymmetric());
                assert_eq!(out, field, "{repr:?} {limiter:?}");
            }
        }
    }

    #[test]
    fn test_zero_log_conformation_stays_zero() {
        let grid = Grid::new_3d(5, 4, 3, 0.2, [0.0, 0.0, 0.0]);
        let velocity = VelocityField::from_fn(&grid, |x| [x[1], x[2], -x[0]]);
        let field = TensorField::zeros(Representation::Scalar3D, grid.ncells());
        let out = advect(&field, &velocity, &grid, 0.1, LimiterKind::VanLeer, false);
        assert!(out.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_upwind_moves_step_downstream() {
        let grid = Grid::new_2d(10, 1, 0.1, [0.0, 0.0]);
        let velocity = VelocityField::from_fn(&grid, |_| [1.0, 0.0, 0.0]);
        let field = TensorField::from_fn(Representation::Tensor2D, 10, |idx, _| {
            if idx < 5 {
                1.0
            } else {
                0.0
            }
        });
        let out = advect(&field, &velocity, &grid, 0.05, LimiterKind::None, false);
        // Cell 5 receives half a cell of inflow at CFL 0.5.
        assert!((out.data()[[5, 0]] - 0.5).abs() < 1e-15);
        assert_eq!(out.data()[[4, 0]], 1.0);
        assert_eq!(out.data()[[6, 0]], 0.0);
    }

    #[test]
    fn test_limited_scheme_stays_bounded() {
        let grid = Grid::new_2d(32, 1, 1.0 / 32.0, [0.0, 0.0]);
        let velocity = VelocityField::from_fn(&grid, |_| [1.0, 0.0, 0.0]);
        let mut field = TensorField::from_fn(Representation::Tensor2D, 32, |idx, _| {
            if (8..16).contains(&idx) {
                1.0
            } else {
                0.0
            }
        });
        let dt = 0.4 / 32.0;
        for _ in 0..20 {
            field = advect(&field, &velocity, &grid, dt, LimiterKind::Minmod, false);
        }
        for &v in field.data().iter() {
            assert!((-1e-12..=1.0 + 1e-12).contains(&v), "overshoot {v}");
        }
    }

    #[test]
    fn test_courant_number() {
        let grid = Grid::new_2d(4, 4, 0.5, [0.0, 0.0]);
        let data = Array2::from_shape_fn((16, 2), |(i, a)| if i == 3 && a == 1 { -2.0 } else { 0.5 });
        let velocity = VelocityField::from_array(data).unwrap();
        assert!((max_courant(&grid, &velocity, 0.1) - 0.4).abs() < 1e-15);
    }
}
