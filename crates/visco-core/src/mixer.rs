// ─────────────────────────────────────────────────────────────────────
// Visco Core — Phase Mixer
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Phase-dependent material parameters.
//!
//! The VOF fraction is smoothed with the same 1-2-1 filter the two-phase
//! solver applies to density and viscosity, then every property is a
//! linear blend `f·P₁ + (1−f)·P₂`.

use visco_math::filter::smooth_fraction;
use visco_types::config::PhaseConstants;
use visco_types::error::{ViscoError, ViscoResult};
use visco_types::state::{Grid, ScalarField};

/// Per-cell material parameters derived from the phase field.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialFields {
    /// Filtered volume fraction actually used for blending.
    pub fraction: ScalarField,
    /// Elastic modulus G(x).
    pub modulus: ScalarField,
    /// Relaxation time λ(x).
    pub relaxation_time: ScalarField,
    pub density: ScalarField,
    pub viscosity: ScalarField,
}

#[derive(Debug, Clone)]
pub struct PhaseMixer {
    constants: PhaseConstants,
    smoothing_passes: usize,
}

impl PhaseMixer {
    pub fn new(constants: PhaseConstants, smoothing_passes: usize) -> ViscoResult<Self> {
        constants.validate()?;
        Ok(Self {
            constants,
            smoothing_passes,
        })
    }

    pub fn constants(&self) -> &PhaseConstants {
        &self.constants
    }

    /// `(G, λ)` for a single fraction value.
    ///
    /// The pure phases are returned verbatim rather than through the
    /// blend so that f = 1 and f = 0 reproduce the constants bit for bit.
    pub fn blend(&self, f: f64) -> (f64, f64) {
        let c = &self.constants;
        (mix(f, c.g1, c.g2), mix(f, c.lambda1, c.lambda2))
    }

    /// Blend every material parameter over the grid.
    pub fn mix(&self, grid: &Grid, phase: &ScalarField) -> ViscoResult<MaterialFields> {
        if phase.len() != grid.ncells() {
            return Err(ViscoError::FieldShapeMismatch {
                field: "phase".to_string(),
                expected: (grid.ncells(), 1),
                got: (phase.len(), 1),
            });
        }
        if let Some(index) = phase.iter().position(|v| !v.is_finite()) {
            return Err(ViscoError::NonFiniteField {
                field: "phase".to_string(),
                index,
            });
        }

        let fraction = smooth_fraction(phase, grid, self.smoothing_passes);
        let c = &self.constants;
        Ok(MaterialFields {
            modulus: fraction.mapv(|f| mix(f, c.g1, c.g2)),
            relaxation_time: fraction.mapv(|f| mix(f, c.lambda1, c.lambda2)),
            density: fraction.mapv(|f| mix(f, c.rho1, c.rho2)),
            viscosity: fraction.mapv(|f| mix(f, c.mu1, c.mu2)),
            fraction,
        })
    }
}

#[inline]
fn mix(f: f64, p1: f64, p2: f64) -> f64 {
    if f >= 1.0 {
        p1
    } else if f <= 0.0 {
        p2
    } else {
        f * p1 + (1.0 - f) * p2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    fn constants() -> PhaseConstants {
        PhaseConstants {
            g1: 0.3,
            lambda1: 7.0,
            g2: 0.1,
            lambda2: 0.2,
            rho1: 1.0,
            rho2: 1e-3,
            mu1: 0.01,
            mu2: 2e-4,
        }
    }

    #[test]
    fn test_pure_phases_are_exact() {
        let mixer = PhaseMixer::new(constants(), 1).unwrap();
        assert_eq!(mixer.blend(1.0), (0.3, 7.0));
        assert_eq!(mixer.blend(0.0), (0.1, 0.2));
    }

    #[test]
    fn test_half_fraction_is_arithmetic_mean() {
        let mixer = PhaseMixer::new(constants(), 0).unwrap();
        let (g, lambda) = mixer.blend(0.5);
        assert!((g - 0.2).abs() < 1e-15);
        assert!((lambda - 3.6).abs() < 1e-15);
    }

    #[test]
    fn test_uniform_phase_field_is_unchanged_by_filter() {
        let grid = Grid::new_2d(6, 5, 0.2, [0.0, 0.0]);
        let mixer = PhaseMixer::new(constants(), 2).unwrap();
        let fields = mixer.mix(&grid, &Array1::ones(grid.ncells())).unwrap();
        assert!(fields.modulus.iter().all(|&g| g == 0.3));
        assert!(fields.relaxation_time.iter().all(|&l| l == 7.0));
        assert!(fields.density.iter().all(|&r| r == 1.0));

        let fields = mixer.mix(&grid, &Array1::zeros(grid.ncells())).unwrap();
        assert!(fields.relaxation_time.iter().all(|&l| l == 0.2));
        assert!(fields.viscosity.iter().all(|&m| m == 2e-4));
    }

    #[test]
    fn test_interface_is_spread_over_neighbours() {
        let grid = Grid::new_2d(8, 1, 0.25, [0.0, 0.0]);
        let phase = Array1::from_shape_fn(8, |i| if i < 4 { 1.0 } else { 0.0 });
        let sharp = PhaseMixer::new(constants(), 0).unwrap().mix(&grid, &phase).unwrap();
        let smooth = PhaseMixer::new(constants(), 1).unwrap().mix(&grid, &phase).unwrap();
        assert_eq!(sharp.modulus[3], 0.3);
        assert!(smooth.modulus[3] < 0.3 && smooth.modulus[3] > 0.1);
        assert!(smooth.modulus[4] < 0.3 && smooth.modulus[4] > 0.1);
        assert_eq!(smooth.modulus[0], 0.3);
        for w in smooth.modulus.windows(2) {
            assert!(w[0] >= w[1]);
        }
    }

    #[test]
    fn test_rejects_bad_phase_field() {
        let grid = Grid::new_2d(4, 4, 0.25, [0.0, 0.0]);
        let mixer = PhaseMixer::new(constants(), 1).unwrap();
        assert!(matches!(
            mixer.mix(&grid, &Array1::zeros(3)),
            Err(ViscoError::FieldShapeMismatch { .. })
        ));
        let mut phase = Array1::zeros(16);
        phase[5] = f64::NAN;
        match mixer.mix(&grid, &phase) {
            Err(ViscoError::NonFiniteField { field, index }) => {
                assert_eq!(field, "phase");
                assert_eq!(index, 5);
            }
            other => panic!("Unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_negative_constants() {
        let bad = PhaseConstants {
            lambda2: -1.0,
            ..constants()
        };
        assert!(PhaseMixer::new(bad, 1).is_err());
    }
}
