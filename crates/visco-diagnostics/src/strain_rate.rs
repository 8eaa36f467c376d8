// ─────────────────────────────────────────────────────────────────────
// Visco Core — Strain-Rate Diagnostics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Derived scalars for visualisation: `log₁₀ D²` and `|u|`.
//!
//! Axisymmetric fields use x as the axial and y as the radial
//! coordinate, so the hoop rate is `D_θθ = u_y / y`.

use visco_math::interp::gradient_at;
use visco_types::error::{ViscoError, ViscoResult};
use visco_types::state::{Grid, ScalarField, VelocityField};

/// Value reported where `D² = 0`.
pub const LOG_FLOOR: f64 = -10.0;

/// Radius below which the hoop term is dropped.
const AXIS_EPS: f64 = 1e-10;

fn check_velocity(grid: &Grid, velocity: &VelocityField) -> ViscoResult<()> {
    if grid.dim != 2 {
        return Err(ViscoError::ConfigError(format!(
            "strain-rate diagnostics need a 2D grid, got {}D",
            grid.dim
        )));
    }
    if velocity.ncells() != grid.ncells() || velocity.dim() != 2 {
        return Err(ViscoError::FieldShapeMismatch {
            field: "velocity".to_string(),
            expected: (grid.ncells(), 2),
            got: velocity.data().dim(),
        });
    }
    Ok(())
}

/// Second invariant `D² = D_xx² + D_yy² + D_θθ² + 2 D_xy²` at one cell.
pub fn strain_rate_squared(grid: &Grid, velocity: &VelocityField, idx: usize, axisymmetric: bool) -> f64 {
    let du = |i: usize, axis: usize| gradient_at(grid, idx, axis, |cell| velocity.get(cell, i));
    let dxx = du(0, 0);
    let dyy = du(1, 1);
    let dxy = 0.5 * (du(1, 0) + du(0, 1));
    let mut d2 = dxx * dxx + dyy * dyy + 2.0 * dxy * dxy;
    if axisymmetric {
        let r = grid.center(idx)[1];
        if r > AXIS_EPS {
            let dtt = velocity.get(idx, 1) / r;
            d2 += dtt * dtt;
        }
    }
    d2
}

/// `log₁₀ D²` per cell, [`LOG_FLOOR`] where the flow is rigid.
pub fn log_strain_rate(grid: &Grid, velocity: &VelocityField, axisymmetric: bool) -> ViscoResult<ScalarField> {
    check_velocity(grid, velocity)?;
    Ok(ScalarField::from_shape_fn(grid.ncells(), |idx| {
        let d2 = strain_rate_squared(grid, velocity, idx, axisymmetric);
        if d2 > 0.0 {
            d2.log10()
        } else {
            LOG_FLOOR
        }
    }))
}

pub fn velocity_magnitude(velocity: &VelocityField) -> ScalarField {
    ScalarField::from_iter(
        velocity
            .data()
            .rows()
            .into_iter()
            .map(|u| u.iter().map(|v| v * v).sum::<f64>().sqrt()),
    )
}
