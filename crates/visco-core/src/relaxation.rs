// ─────────────────────────────────────────────────────────────────────
// Visco Core — Relaxation
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Relaxation of the conformation toward equilibrium.
//!
//! `∂A/∂t = −g (A − I) / λ` has the exact solution
//! `A(t+Δt) = I + (A − I)·e^{−gΔt/λ}`, which shares A's eigenvectors.
//! Per log eigenvalue: `ψ ← ln(1 + (e^ψ − 1)·d)` with `d = e^{−gΔt/λ}`.
//! `g` is 1 for Oldroyd-B and the Saramito yield gate otherwise.
//! A vanishing relaxation time is an instantaneous return to A = I.

use crate::sweep::{map_cells, unzip_stats, SweepStats};
use crate::tensor::{collect_field, CellTensor};
use visco_types::config::ConstitutiveModel;
use visco_types::error::{ViscoError, ViscoResult};
use visco_types::state::{ScalarField, TensorField};

/// Constitutive parameters of the relaxation term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationLaw {
    pub model: ConstitutiveModel,
    /// τ_y, ignored by Oldroyd-B.
    pub yield_stress: f64,
}

/// Per-cell outcome of [`relax_cell`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxOutcome {
    /// λ was zero and the cell was reset to equilibrium.
    pub reset: bool,
    /// Saramito gate `g ∈ [0, 1]`; 1 for Oldroyd-B, 0 for reset cells.
    pub gate: f64,
}

impl RelaxationLaw {
    /// Fraction of the relaxation that is active for stress `G(A − I)`.
    ///
    /// `g = max(0, 1 − τ_y/|τ_d|)` with `|τ_d| = √(½ τ_d:τ_d)` the von
    /// Mises norm of the deviatoric stress. Below yield the material
    /// behaves as an elastic solid and does not relax.
    pub fn gate(&self, conformation: &CellTensor, modulus: f64) -> f64 {
        match self.model {
            ConstitutiveModel::OldroydB => 1.0,
            ConstitutiveModel::Saramito => {
                if self.yield_stress <= 0.0 {
                    return 1.0;
                }
                let norm = deviatoric_norm(conformation, modulus);
                if norm <= self.yield_stress {
                    0.0
                } else {
                    1.0 - self.yield_stress / norm
                }
            }
        }
    }
}

/// `√(½ τ_d:τ_d)` for `τ = G(A − I)`, taken on the physical 3x3 tensor.
pub fn deviatoric_norm(conformation: &CellTensor, modulus: f64) -> f64 {
    let a = conformation.to_sym3(1.0);
    let mut tau = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            let delta = if i == j { 1.0 } else { 0.0 };
            tau[i][j] = modulus * (a[i][j] - delta);
        }
    }
    let mean = (tau[0][0] + tau[1][1] + tau[2][2]) / 3.0;
    let mut sum = 0.0;
    for (i, row) in tau.iter().enumerate() {
        for (j, &t) in row.iter().enumerate() {
            let d = if i == j { t - mean } else { t };
            sum += d * d;
        }
    }
    (0.5 * sum).sqrt()
}

/// Relax one cell's log-conformation over `dt`.
pub fn relax_cell(
    psi: CellTensor,
    modulus: f64,
    relaxation_time: f64,
    dt: f64,
    law: &RelaxationLaw,
) -> (CellTensor, RelaxOutcome, SweepStats) {
    let mut stats = SweepStats::default();
    if relaxation_time == 0.0 {
        stats.reset_cells = 1;
        return (
            zero_like(&psi),
            RelaxOutcome {
                reset: true,
                gate: 0.0,
            },
            stats,
        );
    }

    let gate = match law.model {
        ConstitutiveModel::OldroydB => 1.0,
        ConstitutiveModel::Saramito => {
            let (a, s) = psi.exp();
            stats += s;
            law.gate(&a, modulus)
        }
    };
    let outcome = RelaxOutcome { reset: false, gate };
    if gate > 0.0 && law.model == ConstitutiveModel::Saramito {
        stats.yielded_cells = 1;
    }

    let decay = (-dt * gate / relaxation_time).exp();
    if decay == 1.0 {
        return (psi, outcome, stats);
    }
    let relaxed = psi.map_spectrum(&mut stats, |x| relax_eigenvalue(x, decay));
    (relaxed, outcome, stats)
}

/// `ln(1 + (eˣ − 1)·d)`, the exact decay of one log-eigenvalue toward 0.
///
/// Large positive `x` is rewritten as `x + ln(1 + (1 − d)(e⁻ˣ − 1))` so
/// that `eˣ` is never formed.
pub fn relax_eigenvalue(x: f64, decay: f64) -> f64 {
    if x > 1.0 {
        x + ((1.0 - decay) * (-x).exp_m1()).ln_1p()
    } else {
        (x.exp_m1() * decay).ln_1p()
    }
}

fn zero_like(psi: &CellTensor) -> CellTensor {
    match psi {
        CellTensor::Planar(_) => CellTensor::Planar([[0.0; 2]; 2]),
        CellTensor::Axisymmetric(..) => CellTensor::Axisymmetric([[0.0; 2]; 2], 0.0),
        CellTensor::Full(_) => CellTensor::Full([[0.0; 3]; 3]),
    }
}

/// Result of relaxing a whole field.
#[derive(Debug, Clone)]
pub struct RelaxedField {
    pub log_conformation: TensorField,
    /// 1 where the material yielded (Saramito only).
    pub yield_indicator: Option<ScalarField>,
    pub stats: SweepStats,
}

/// Relax every cell with its local `G(x)` and `λ(x)`.
pub fn relax(
    log_conformation: &TensorField,
    modulus: &ScalarField,
    relaxation_time: &ScalarField,
    dt: f64,
    law: &RelaxationLaw,
) -> ViscoResult<RelaxedField> {
    let ncells = log_conformation.ncells();
    for (name, field) in [("modulus", modulus), ("relaxation_time", relaxation_time)] {
        if field.len() != ncells {
            return Err(ViscoError::FieldShapeMismatch {
                field: name.to_string(),
                expected: (ncells, 1),
                got: (field.len(), 1),
            });
        }
    }

    let repr = log_conformation.repr();
    let results = map_cells(ncells, |idx| {
        let psi = CellTensor::from_row(repr, log_conformation.cell(idx));
        let (cell, outcome, stats) =
            relax_cell(psi, modulus[idx], relaxation_time[idx], dt, law);
        ((cell, outcome), stats)
    });
    let (cells, stats) = unzip_stats(results);

    let yield_indicator = match law.model {
        ConstitutiveModel::OldroydB => None,
        ConstitutiveModel::Saramito => Some(
            cells
                .iter()
                .map(|(_, o)| if o.gate > 0.0 { 1.0 } else { 0.0 })
                .collect(),
        ),
    };
    let tensors: Vec<CellTensor> = cells.into_iter().map(|(c, _)| c).collect();
    Ok(RelaxedField {
        log_conformation: collect_field(repr, &tensors),
        yield_indicator,
        stats,
    })
}
