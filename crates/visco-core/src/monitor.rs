// ─────────────────────────────────────────────────────────────────────
// Visco Core — Energy Monitor
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Global kinetic-energy guard evaluated by the driver after each
//! iteration. A blow-up or a stalled flow asks the driver to dump the
//! current state and stop; the fields themselves stay consistent.

use std::f64::consts::PI;
use visco_types::config::MonitorConfig;
use visco_types::constants::KE_NEGATIVE_TOLERANCE;
use visco_types::error::{ViscoError, ViscoResult};
use visco_types::state::{Grid, ScalarField, VelocityField};

/// `Σ ½ ρ |u|² V` over all cells; axisymmetric volumes carry `2π r`.
pub fn kinetic_energy(
    grid: &Grid,
    velocity: &VelocityField,
    density: &ScalarField,
    axisymmetric: bool,
) -> ViscoResult<f64> {
    let n = grid.ncells();
    if velocity.ncells() != n {
        return Err(ViscoError::FieldShapeMismatch {
            field: "velocity".to_string(),
            expected: (n, grid.dim),
            got: velocity.data().dim(),
        });
    }
    if density.len() != n {
        return Err(ViscoError::FieldShapeMismatch {
            field: "density".to_string(),
            expected: (n, 1),
            got: (density.len(), 1),
        });
    }
    let cell_volume = grid.delta.powi(grid.dim as i32);
    let mut ke = 0.0;
    for idx in 0..n {
        let u2: f64 = velocity.data().row(idx).iter().map(|u| u * u).sum();
        let volume = if axisymmetric {
            2.0 * PI * grid.center(idx)[1] * cell_volume
        } else {
            cell_volume
        };
        ke += 0.5 * density[idx] * u2 * volume;
    }
    Ok(ke)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MonitorVerdict {
    Continue,
    /// Kinetic energy above the blow-up bound.
    BlowUp { ke: f64 },
    /// Kinetic energy below the stagnation bound.
    Stagnated { ke: f64 },
}

impl MonitorVerdict {
    /// The driver must write a snapshot and terminate.
    pub fn requires_dump(&self) -> bool {
        !matches!(self, MonitorVerdict::Continue)
    }
}

#[derive(Debug, Clone)]
pub struct EnergyMonitor {
    config: MonitorConfig,
}

impl EnergyMonitor {
    pub fn new(config: MonitorConfig) -> ViscoResult<Self> {
        if !config.ke_max.is_finite() || !config.ke_min.is_finite() || config.ke_min >= config.ke_max
        {
            return Err(ViscoError::ConfigError(
                "monitor bounds must be finite with ke_min < ke_max".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Verdicts are only issued once `iteration` exceeds the grace
    /// period. Inside it, energy above `ke_max` is a hard error: there is
    /// no settled state worth dumping yet.
    pub fn check(&self, iteration: usize, ke: f64) -> ViscoResult<MonitorVerdict> {
        if ke.is_nan() {
            return Err(ViscoError::PhysicsViolation(format!(
                "kinetic energy is NaN at iteration {iteration}"
            )));
        }
        if ke < KE_NEGATIVE_TOLERANCE {
            return Err(ViscoError::PhysicsViolation(format!(
                "negative kinetic energy {ke:.3e} at iteration {iteration}"
            )));
        }
        if iteration <= self.config.grace_iterations {
            if ke > self.config.ke_max {
                return Err(ViscoError::PhysicsViolation(format!(
                    "kinetic energy {ke:.3e} exceeds {:.3e} during start-up at iteration {iteration}",
                    self.config.ke_max
                )));
            }
            return Ok(MonitorVerdict::Continue);
        }
        let verdict = if ke > self.config.ke_max {
            MonitorVerdict::BlowUp { ke }
        } else if ke < self.config.ke_min {
            MonitorVerdict::Stagnated { ke }
        } else {
            MonitorVerdict::Continue
        };
        if verdict.requires_dump() {
            tracing::warn!(
                "Energy monitor stop at iteration {}: {:?}",
                iteration,
                verdict
            );
        }
        Ok(verdict)
    }
}
