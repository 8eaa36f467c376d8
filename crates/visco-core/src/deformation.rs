// ─────────────────────────────────────────────────────────────────────
// Visco Core — Deformation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Upper-convected stretching of the log-conformation.
//!
//! For `∂A/∂t = ∇u·A + A·∇uᵀ` the logarithm Ψ = ln A evolves, in the
//! eigenbasis R of A with `M = Rᵀ·∇u·R`, as
//!
//! ```text
//! Ψ̇'ᵢᵢ = 2 Mᵢᵢ
//! Ψ̇'ᵢⱼ = Mᵢⱼ · B(ψᵢ − ψⱼ) + Mⱼᵢ · B(ψⱼ − ψᵢ),   B(x) = x / (eˣ − 1)
//! ```
//!
//! and `Ψ̇ = R·Ψ̇'·Rᵀ`. The off-diagonal rate is the log divided
//! difference written through the log eigenvalues only, so coincident
//! eigenvalues (B(0) = 1) and very large stretches are handled by the
//! same expression. In the axisymmetric layout the hoop direction is an
//! eigen-direction of its own and grows as `Ψ̇_θθ = 2 u_r / r`.

use crate::sweep::{map_cells, unzip_stats, SweepStats};
use crate::tensor::{basis_of, collect_field, CellTensor};
use visco_math::eigen::SymmetricEigen;
use visco_math::interp::gradient_at;
use visco_math::logm::bernoulli;
use visco_types::state::{Grid, TensorField, VelocityField};

/// Upper bound on sub-steps per cell and step.
const MAX_SUBSTEPS: usize = 1024;

/// Velocity gradient `g[i][j] = ∂uᵢ/∂xⱼ` at a cell centre.
pub fn velocity_gradient(grid: &Grid, velocity: &VelocityField, idx: usize) -> [[f64; 3]; 3] {
    let mut g = [[0.0; 3]; 3];
    for (i, row) in g.iter_mut().enumerate().take(velocity.dim()) {
        for (j, slot) in row.iter_mut().enumerate().take(grid.dim) {
            *slot = gradient_at(grid, idx, j, |cell| velocity.get(cell, i));
        }
    }
    g
}

/// Number of sub-steps so that each one strains by at most `max_increment`.
pub fn substep_count(gradient: &[[f64; 3]; 3], dt: f64, max_increment: f64) -> usize {
    let norm = gradient
        .iter()
        .flat_map(|row| row.iter())
        .map(|v| v * v)
        .sum::<f64>()
        .sqrt();
    let n = (norm * dt / max_increment).ceil();
    if n.is_finite() && n >= 1.0 {
        (n as usize).min(MAX_SUBSTEPS)
    } else {
        1
    }
}

/// Stretching rate `Ψ̇` of one symmetric log block under `grad`.
fn stretch_rate<const N: usize>(
    psi: &[[f64; N]; N],
    grad: &[[f64; N]; N],
    stats: &mut SweepStats,
) -> [[f64; N]; N]
where
    [[f64; N]; N]: SymmetricEigen<N>,
{
    let basis = basis_of(psi, stats);
    let m = basis.project(grad);
    let mut rate = [[0.0; N]; N];
    for i in 0..N {
        rate[i][i] = 2.0 * m[i][i];
        for j in (i + 1)..N {
            let gap = basis.values[i] - basis.values[j];
            let r = m[i][j] * bernoulli(gap) + m[j][i] * bernoulli(-gap);
            rate[i][j] = r;
            rate[j][i] = r;
        }
    }
    basis.rotate_back(&rate)
}

fn block2(g: &[[f64; 3]; 3]) -> [[f64; 2]; 2] {
    [[g[0][0], g[0][1]], [g[1][0], g[1][1]]]
}

fn euler<const N: usize>(psi: &[[f64; N]; N], rate: &[[f64; N]; N], h: f64) -> [[f64; N]; N] {
    let mut out = *psi;
    for i in 0..N {
        for j in 0..N {
            out[i][j] += h * rate[i][j];
        }
    }
    out
}

/// Apply the stretching term to one cell's log-conformation over `dt`.
///
/// `hoop_rate` is `u_r / r` and only used by the axisymmetric variant.
pub fn deform_cell(
    psi: CellTensor,
    gradient: &[[f64; 3]; 3],
    hoop_rate: f64,
    dt: f64,
    max_increment: f64,
) -> (CellTensor, SweepStats) {
    let mut stats = SweepStats::default();
    let n = substep_count(gradient, dt, max_increment);
    let h = dt / n as f64;
    stats.deform_substeps = n;

    let mut current = psi;
    for _ in 0..n {
        current = match current {
            CellTensor::Planar(p) => {
                let rate = stretch_rate(&p, &block2(gradient), &mut stats);
                CellTensor::Planar(euler(&p, &rate, h))
            }
            CellTensor::Axisymmetric(p, hoop) => {
                let rate = stretch_rate(&p, &block2(gradient), &mut stats);
                CellTensor::Axisymmetric(euler(&p, &rate, h), hoop + h * 2.0 * hoop_rate)
            }
            CellTensor::Full(p) => {
                let rate = stretch_rate(&p, gradient, &mut stats);
                CellTensor::Full(euler(&p, &rate, h))
            }
        };
    }
    (current, stats)
}

/// Stretch every cell of the log-conformation field.
pub fn deform(
    log_conformation: &TensorField,
    velocity: &VelocityField,
    grid: &Grid,
    dt: f64,
    max_increment: f64,
) -> (TensorField, SweepStats) {
    let repr = log_conformation.repr();
    let axisymmetric = repr.is_axisymmetric();
    let results = map_cells(grid.ncells(), |idx| {
        let psi = CellTensor::from_row(repr, log_conformation.cell(idx));
        let gradient = velocity_gradient(grid, velocity, idx);
        let hoop_rate = if axisymmetric {
            let r = grid.center(idx)[1];
            if r > 0.0 {
                velocity.get(idx, 1) / r
            } else {
                0.0
            }
        } else {
            0.0
        };
        deform_cell(psi, &gradient, hoop_rate, dt, max_increment)
    });
    let (cells, stats) = unzip_stats(results);
    (collect_field(repr, &cells), stats)
}
