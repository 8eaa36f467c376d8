// ─────────────────────────────────────────────────────────────────────
// Visco Core — Refinement Signals
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Fields published to the adaptive-refinement engine.
//!
//! This side only packages inverted, finite conformation components with
//! their tolerances. [`WaveletFlagger`] is the engine-side reading of the
//! signals: a cell is refined where the second-difference detail of any
//! signal exceeds its tolerance and may be coarsened where every detail
//! is below `tolerance / 1.5`.

use crate::sweep::map_cells;
use visco_types::config::RefinementTolerances;
use visco_types::error::{ViscoError, ViscoResult};
use visco_types::state::{Grid, ScalarField, TensorField};

/// Hysteresis between the refine and coarsen thresholds.
const COARSEN_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct RefinementSignal {
    pub name: String,
    pub values: ScalarField,
    pub tolerance: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RefinementSignals {
    pub signals: Vec<RefinementSignal>,
}

impl RefinementSignals {
    /// Package the post-relaxation conformation (and the yield indicator
    /// when present). Any non-finite value is rejected.
    pub fn export(
        conformation: &TensorField,
        yield_indicator: Option<&ScalarField>,
        tolerances: &RefinementTolerances,
    ) -> ViscoResult<Self> {
        let repr = conformation.repr();
        let mut signals = Vec::with_capacity(repr.n_components() + 1);
        for (c, comp) in repr.component_names().iter().enumerate() {
            let name = format!("A_{comp}");
            let values = conformation.component(c).to_owned();
            check_finite(&name, &values)?;
            signals.push(RefinementSignal {
                name,
                values,
                tolerance: tolerances.a_err,
            });
        }
        if let Some(indicator) = yield_indicator {
            if indicator.len() != conformation.ncells() {
                return Err(ViscoError::FieldShapeMismatch {
                    field: "yield".to_string(),
                    expected: (conformation.ncells(), 1),
                    got: (indicator.len(), 1),
                });
            }
            check_finite("yield", indicator)?;
            signals.push(RefinementSignal {
                name: "yield".to_string(),
                values: indicator.clone(),
                tolerance: tolerances.a_err,
            });
        }
        Ok(Self { signals })
    }

    pub fn get(&self, name: &str) -> Option<&RefinementSignal> {
        self.signals.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

fn check_finite(name: &str, values: &ScalarField) -> ViscoResult<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ViscoError::NonFiniteField {
            field: name.to_string(),
            index,
        }),
        None => Ok(()),
    }
}

/// Detail coefficient `max_axis |φ₊ − 2φ + φ₋| / 2`: the error of
/// predicting a cell from linear interpolation of its neighbours.
/// Edges use the zero-gradient ghost.
pub fn estimate_detail(values: &ScalarField, grid: &Grid) -> ScalarField {
    let details = map_cells(grid.ncells(), |idx| {
        let mut worst = 0.0_f64;
        for axis in 0..grid.dim {
            if grid.extent(axis) < 2 {
                continue;
            }
            let lo = values[grid.neighbor(idx, axis, -1)];
            let hi = values[grid.neighbor(idx, axis, 1)];
            worst = worst.max(0.5 * (hi - 2.0 * values[idx] + lo).abs());
        }
        worst
    });
    ScalarField::from(details)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellAction {
    Refine,
    Keep,
    Coarsen,
}

/// Reference refine/coarsen decision used by the uniform engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaveletFlagger;

impl WaveletFlagger {
    pub fn flag(&self, grid: &Grid, signals: &RefinementSignals) -> ViscoResult<Vec<CellAction>> {
        let n = grid.ncells();
        let mut refine = vec![false; n];
        let mut coarsen = vec![true; n];
        for signal in &signals.signals {
            if signal.values.len() != n {
                return Err(ViscoError::FieldShapeMismatch {
                    field: signal.name.clone(),
                    expected: (n, 1),
                    got: (signal.values.len(), 1),
                });
            }
            let detail = estimate_detail(&signal.values, grid);
            for (idx, &d) in detail.iter().enumerate() {
                if d > signal.tolerance {
                    refine[idx] = true;
                }
                if d >= signal.tolerance / COARSEN_FACTOR {
                    coarsen[idx] = false;
                }
            }
        }
        Ok((0..n)
            .map(|idx| {
                if refine[idx] {
                    CellAction::Refine
                } else if coarsen[idx] {
                    CellAction::Coarsen
                } else {
                    CellAction::Keep
                }
            })
            .collect())
    }
}
