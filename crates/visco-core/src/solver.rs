// ─────────────────────────────────────────────────────────────────────
// Visco Core — Viscoelastic Solver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-timestep orchestration of the log-conformation update.
//!
//! mixer → exchange → Advect → exchange → Deform → Relax → invert →
//! stress and divergence. The solver owns the log-conformation between
//! steps; a step that fails leaves the previously committed fields
//! untouched, so they can always be dumped.

use crate::advection::{advect, max_courant};
use crate::checkpoint::Checkpoint;
use crate::deformation::deform;
use crate::engine::GridEngine;
use crate::mixer::{MaterialFields, PhaseMixer};
use crate::refinement::RefinementSignals;
use crate::relaxation::{relax, RelaxationLaw};
use crate::stress::{polymeric_stress, stress_divergence};
use crate::sweep::{map_cells, unzip_stats, SweepStats};
use crate::tensor::{collect_field, CellTensor};
use ndarray::Array2;
use visco_types::config::{LimiterKind, PhaseConstants, RefinementTolerances, SolverConfig, ViscoConfig};
use visco_types::error::{ViscoError, ViscoResult};
use visco_types::state::{Grid, Representation, ScalarField, TensorField, VelocityField};

/// Courant number above which the limited scheme is no longer TVD.
const COURANT_WARN: f64 = 0.5;

/// Per-step inputs owned by the external solvers.
#[derive(Debug, Clone, Copy)]
pub struct StepInputs<'a> {
    /// VOF fraction (read-only).
    pub phase: &'a ScalarField,
    /// Cell-centred velocity snapshot.
    pub velocity: &'a VelocityField,
    pub dt: f64,
}

#[derive(Debug, Clone)]
pub struct StepOutput {
    pub materials: MaterialFields,
    /// Polymeric stress `G(A − I)` from the post-relaxation conformation.
    pub stress: TensorField,
    /// `∇·τ_p`, one row per cell; additive momentum source.
    pub force: Array2<f64>,
    pub stats: SweepStats,
}

#[derive(Debug, Clone)]
pub struct ViscoelasticSolver {
    grid: Grid,
    repr: Representation,
    law: RelaxationLaw,
    limiter: LimiterKind,
    max_strain_increment: f64,
    eigen_floor: f64,
    mixer: PhaseMixer,
    log_conformation: TensorField,
    conformation: TensorField,
    yield_indicator: Option<ScalarField>,
    step: u64,
    time: f64,
}

impl ViscoelasticSolver {
    pub fn new(config: &ViscoConfig, grid: Grid) -> ViscoResult<Self> {
        config.validate()?;
        Self::from_parts(&config.solver, config.materials(), grid)
    }

    pub fn from_parts(solver: &SolverConfig, phases: PhaseConstants, grid: Grid) -> ViscoResult<Self> {
        solver.validate()?;
        let repr = solver.representation;
        if grid.dim != repr.dim() {
            return Err(ViscoError::ConfigError(format!(
                "representation {repr:?} needs a {}D grid, got {}D",
                repr.dim(),
                grid.dim
            )));
        }
        if repr.is_axisymmetric() && grid.origin[1] < 0.0 {
            return Err(ViscoError::ConfigError(format!(
                "axisymmetric grid must start at r >= 0, got origin r = {}",
                grid.origin[1]
            )));
        }
        if !grid.delta.is_finite() || grid.delta <= 0.0 {
            return Err(ViscoError::ConfigError(
                "grid delta must be finite and > 0".to_string(),
            ));
        }
        let ncells = grid.ncells();
        Ok(Self {
            law: RelaxationLaw {
                model: solver.model,
                yield_stress: solver.yield_stress,
            },
            limiter: solver.limiter,
            max_strain_increment: solver.max_strain_increment,
            eigen_floor: solver.eigen_floor,
            mixer: PhaseMixer::new(phases, solver.smoothing_passes)?,
            log_conformation: TensorField::zeros(repr, ncells),
            conformation: TensorField::identity(repr, ncells),
            yield_indicator: None,
            step: 0,
            time: 0.0,
            grid,
            repr,
        })
    }

    /// Equilibrium start: A = I, Ψ = 0.
    pub fn initialize(&mut self) {
        let n = self.grid.ncells();
        self.log_conformation = TensorField::zeros(self.repr, n);
        self.conformation = TensorField::identity(self.repr, n);
        self.yield_indicator = None;
        self.step = 0;
        self.time = 0.0;
    }

    fn check_tensor(&self, field: &TensorField, name: &str) -> ViscoResult<()> {
        if field.repr() != self.repr || field.ncells() != self.grid.ncells() {
            return Err(ViscoError::FieldShapeMismatch {
                field: name.to_string(),
                expected: (self.grid.ncells(), self.repr.n_components()),
                got: field.data().dim(),
            });
        }
        if let Some(index) = field.first_non_finite() {
            return Err(ViscoError::NonFiniteField {
                field: name.to_string(),
                index,
            });
        }
        Ok(())
    }

    /// Restore both fields verbatim.
    pub fn restore(&mut self, checkpoint: Checkpoint) -> ViscoResult<()> {
        self.check_tensor(&checkpoint.log_conformation, "log_conformation")?;
        self.check_tensor(&checkpoint.conformation, "conformation")?;
        self.log_conformation = checkpoint.log_conformation;
        self.conformation = checkpoint.conformation;
        self.yield_indicator = None;
        self.step = checkpoint.step;
        self.time = checkpoint.time;
        Ok(())
    }

    /// Restore from raw log-conformation components.
    pub fn restore_log_conformation(&mut self, log: TensorField) -> ViscoResult<SweepStats> {
        self.check_tensor(&log, "log_conformation")?;
        let (conformation, stats) = invert(&log);
        self.log_conformation = log;
        self.conformation = conformation;
        self.yield_indicator = None;
        Ok(stats)
    }

    /// Restore from raw conformation components; round-off negative
    /// eigenvalues are clamped to the floor.
    pub fn restore_conformation(&mut self, conformation: TensorField) -> ViscoResult<SweepStats> {
        self.check_tensor(&conformation, "conformation")?;
        let (repr, floor) = (self.repr, self.eigen_floor);
        let results = map_cells(conformation.ncells(), |idx| {
            CellTensor::from_row(repr, conformation.cell(idx)).log(floor)
        });
        let (cells, stats) = unzip_stats(results);
        self.log_conformation = collect_field(repr, &cells);
        self.conformation = conformation;
        self.yield_indicator = None;
        Ok(stats)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            step: self.step,
            time: self.time,
            log_conformation: self.log_conformation.clone(),
            conformation: self.conformation.clone(),
        }
    }

    /// Advance the conformation by one timestep.
    pub fn step<E: GridEngine>(
        &mut self,
        engine: &mut E,
        inputs: &StepInputs<'_>,
    ) -> ViscoResult<StepOutput> {
        let grid = &self.grid;
        let dt = inputs.dt;
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ViscoError::ConfigError(format!(
                "timestep must be finite and > 0, got {dt}"
            )));
        }
        if engine.grid().ncells() != grid.ncells() {
            return Err(ViscoError::FieldShapeMismatch {
                field: "engine grid".to_string(),
                expected: (grid.ncells(), grid.dim),
                got: (engine.grid().ncells(), engine.grid().dim),
            });
        }
        let velocity = inputs.velocity;
        if velocity.ncells() != grid.ncells() || velocity.dim() != grid.dim {
            return Err(ViscoError::FieldShapeMismatch {
                field: "velocity".to_string(),
                expected: (grid.ncells(), grid.dim),
                got: velocity.data().dim(),
            });
        }
        if let Some(index) = velocity.data().iter().position(|v| !v.is_finite()) {
            return Err(ViscoError::NonFiniteField {
                field: "velocity".to_string(),
                index: index / velocity.dim(),
            });
        }

        let materials = self.mixer.mix(grid, inputs.phase)?;

        let courant = max_courant(grid, velocity, dt);
        if courant > COURANT_WARN {
            tracing::warn!(
                "Courant number {:.3} exceeds {} at step {}",
                courant,
                COURANT_WARN,
                self.step
            );
        }

        let axisymmetric = self.repr.is_axisymmetric();
        let mut log = self.log_conformation.clone();
        engine.exchange_ghosts(&mut log)?;
        let mut log = advect(&log, velocity, grid, dt, self.limiter, axisymmetric);

        engine.exchange_ghosts(&mut log)?;
        let (log, mut stats) = deform(&log, velocity, grid, dt, self.max_strain_increment);

        let relaxed = relax(
            &log,
            &materials.modulus,
            &materials.relaxation_time,
            dt,
            &self.law,
        )?;
        stats += relaxed.stats;

        let (conformation, invert_stats) = invert(&relaxed.log_conformation);
        stats += invert_stats;
        if let Some(index) = conformation.first_non_finite() {
            return Err(ViscoError::NonFiniteField {
                field: "conformation".to_string(),
                index,
            });
        }

        let stress = polymeric_stress(&conformation, &materials.modulus)?;
        let force = stress_divergence(&stress, grid);

        self.log_conformation = relaxed.log_conformation;
        self.conformation = conformation;
        self.yield_indicator = relaxed.yield_indicator;
        self.step += 1;
        self.time += dt;

        tracing::debug!(
            "Step {} (t = {:.6}): clamped={} jacobi={} substeps={} reset={} yielded={}",
            self.step,
            self.time,
            stats.clamped_eigenvalues,
            stats.jacobi_fallbacks,
            stats.deform_substeps,
            stats.reset_cells,
            stats.yielded_cells
        );

        Ok(StepOutput {
            materials,
            stress,
            force,
            stats,
        })
    }

    /// Publish the current conformation to the refinement engine.
    pub fn refinement_signals(&self, tolerances: &RefinementTolerances) -> ViscoResult<RefinementSignals> {
        RefinementSignals::export(
            &self.conformation,
            self.yield_indicator.as_ref(),
            tolerances,
        )
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn representation(&self) -> Representation {
        self.repr
    }

    pub fn log_conformation(&self) -> &TensorField {
        &self.log_conformation
    }

    pub fn conformation(&self) -> &TensorField {
        &self.conformation
    }

    pub fn yield_indicator(&self) -> Option<&ScalarField> {
        self.yield_indicator.as_ref()
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn time(&self) -> f64 {
        self.time
    }
}

/// `A = exp(Ψ)` for every cell.
fn invert(log: &TensorField) -> (TensorField, SweepStats) {
    let repr = log.repr();
    let results = map_cells(log.ncells(), |idx| CellTensor::from_row(repr, log.cell(idx)).exp());
    let (cells, stats) = unzip_stats(results);
    (collect_field(repr, &cells), stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::UniformGridEngine;
    use ndarray::Array1;
    use visco_types::config::ConstitutiveModel;

    fn phases() -> PhaseConstants {
        PhaseConstants {
            g1: 0.5,
            lambda1: 1.0,
            g2: 0.0,
            lambda2: 0.0,
            rho1: 1.0,
            rho2: 1e-3,
            mu1: 0.01,
            mu2: 2e-4,
        }
    }

    fn solver(repr: Representation, grid: Grid) -> ViscoelasticSolver {
        let cfg = SolverConfig {
            representation: repr,
            ..SolverConfig::default()
        };
        ViscoelasticSolver::from_parts(&cfg, phases(), grid).unwrap()
    }

    #[test]
    fn test_rejects_mismatched_grid_dimension() {
        let cfg = SolverConfig {
            representation: Representation::Scalar3D,
            ..SolverConfig::default()
        };
        let grid = Grid::new_2d(4, 4, 0.25, [0.0, 0.0]);
        assert!(ViscoelasticSolver::from_parts(&cfg, phases(), grid).is_err());

        let cfg = SolverConfig::default();
        let below_axis = Grid::new_2d(4, 4, 0.25, [0.0, -1.0]);
        assert!(ViscoelasticSolver::from_parts(&cfg, phases(), below_axis).is_err());
    }

    #[test]
    fn test_identity_does_not_drift_without_flow() {
        let grid = Grid::new_2d(8, 8, 0.125, [-0.5, 0.0]);
        let mut s = solver(Representation::Scalar2D, grid.clone());
        let mut engine = UniformGridEngine::new(grid.clone());
        let phase = Array1::from_shape_fn(grid.ncells(), |idx| if idx % 3 == 0 { 1.0 } else { 0.0 });
        let velocity = VelocityField::zeros(grid.ncells(), 2);
        for _ in 0..25 {
            let out = s
                .step(
                    &mut engine,
                    &StepInputs {
                        phase: &phase,
                        velocity: &velocity,
                        dt: 0.01,
                    },
                )
                .unwrap();
            assert!(out.force.iter().all(|&f| f == 0.0));
        }
        assert_eq!(s.conformation(), &TensorField::identity(Representation::Scalar2D, grid.ncells()));
        assert!(s.log_conformation().data().iter().all(|&v| v == 0.0));
        assert_eq!(engine.exchanges(), 50);
        assert_eq!(s.step_count(), 25);
    }

    #[test]
    fn test_failed_step_keeps_committed_state() {
        let grid = Grid::new_2d(4, 4, 0.25, [0.0, 0.0]);
        let mut s = solver(Representation::Tensor2D, grid.clone());
        let mut engine = UniformGridEngine::new(grid.clone());
        let before = s.checkpoint();
        let phase = Array1::ones(grid.ncells());
        let mut velocity = Array2::zeros((grid.ncells(), 2));
        velocity[[3, 1]] = f64::NAN;
        let velocity = VelocityField::from_array(velocity).unwrap();
        let result = s.step(
            &mut engine,
            &StepInputs {
                phase: &phase,
                velocity: &velocity,
                dt: 0.1,
            },
        );
        assert!(matches!(result, Err(ViscoError::NonFiniteField { index: 3, .. })));
        assert_eq!(s.checkpoint(), before);

        let bad_dt = s.step(
            &mut engine,
            &StepInputs {
                phase: &phase,
                velocity: &VelocityField::zeros(grid.ncells(), 2),
                dt: 0.0,
            },
        );
        assert!(bad_dt.is_err());
    }

    #[test]
    fn test_shear_flow_produces_positive_definite_stress() {
        let grid = Grid::new_2d(8, 8, 0.125, [-0.5, -0.5]);
        let mut s = solver(Representation::Tensor2D, grid.clone());
        let mut engine = UniformGridEngine::new(grid.clone());
        let phase = Array1::ones(grid.ncells());
        let velocity = VelocityField::from_fn(&grid, |x| [2.0 * x[1], 0.0, 0.0]);
        let mut last = None;
        for _ in 0..20 {
            last = Some(
                s.step(
                    &mut engine,
                    &StepInputs {
                        phase: &phase,
                        velocity: &velocity,
                        dt: 0.02,
                    },
                )
                .unwrap(),
            );
        }
        let out = last.unwrap();
        for idx in 0..grid.ncells() {
            let a = s.conformation().cell(idx);
            let det = a[0] * a[2] - a[1] * a[1];
            assert!(a[0] > 0.0 && a[2] > 0.0 && det > 0.0);
            // Shear stress follows the shear direction.
            assert!(out.stress.cell(idx)[1] > 0.0);
        }
        assert!(s.refinement_signals(&RefinementTolerances::default()).is_ok());
    }

    #[test]
    fn test_gas_phase_is_reset_every_step() {
        let grid = Grid::new_2d(6, 6, 0.2, [0.0, 0.0]);
        let mut s = solver(Representation::Scalar2D, grid.clone());
        let stretched = TensorField::from_fn(Representation::Scalar2D, grid.ncells(), |_, c| {
            [0.8, 0.3, -0.2, 0.1][c]
        });
        s.restore_log_conformation(stretched).unwrap();
        let mut engine = UniformGridEngine::new(grid.clone());
        let phase = Array1::zeros(grid.ncells());
        let velocity = VelocityField::zeros(grid.ncells(), 2);
        let out = s
            .step(
                &mut engine,
                &StepInputs {
                    phase: &phase,
                    velocity: &velocity,
                    dt: 1e-3,
                },
            )
            .unwrap();
        assert_eq!(out.stats.reset_cells, grid.ncells());
        assert_eq!(s.conformation(), &TensorField::identity(Representation::Scalar2D, grid.ncells()));
    }

    #[test]
    fn test_saramito_step_publishes_yield_signal() {
        let grid = Grid::new_2d(4, 4, 0.25, [0.0, 0.0]);
        let cfg = SolverConfig {
            representation: Representation::Tensor2D,
            model: ConstitutiveModel::Saramito,
            yield_stress: 0.1,
            ..SolverConfig::default()
        };
        let mut s = ViscoelasticSolver::from_parts(&cfg, phases(), grid.clone()).unwrap();
        let mut engine = UniformGridEngine::new(grid.clone());
        let phase = Array1::ones(grid.ncells());
        let velocity = VelocityField::zeros(grid.ncells(), 2);
        s.step(
            &mut engine,
            &StepInputs {
                phase: &phase,
                velocity: &velocity,
                dt: 0.01,
            },
        )
        .unwrap();
        let indicator = s.yield_indicator().unwrap();
        assert!(indicator.iter().all(|&y| y == 0.0));
        let signals = s.refinement_signals(&RefinementTolerances::default()).unwrap();
        assert!(signals.get("yield").is_some());
    }

    #[test]
    fn test_restores_drop_stale_yield_signal() {
        let grid = Grid::new_2d(4, 4, 0.25, [0.0, 0.0]);
        let cfg = SolverConfig {
            representation: Representation::Tensor2D,
            model: ConstitutiveModel::Saramito,
            yield_stress: 0.1,
            ..SolverConfig::default()
        };
        let mut s = ViscoelasticSolver::from_parts(&cfg, phases(), grid.clone()).unwrap();
        let mut engine = UniformGridEngine::new(grid.clone());
        let phase = Array1::ones(grid.ncells());
        let velocity = VelocityField::zeros(grid.ncells(), 2);
        let inputs = StepInputs {
            phase: &phase,
            velocity: &velocity,
            dt: 0.01,
        };
        let stretched = TensorField::from_fn(Representation::Tensor2D, grid.ncells(), |_, c| {
            [0.8, 0.3, -0.2][c]
        });
        let tol = RefinementTolerances::default();

        s.restore_log_conformation(stretched.clone()).unwrap();
        s.step(&mut engine, &inputs).unwrap();
        assert!(s.yield_indicator().unwrap().iter().any(|&y| y > 0.0));
        s.restore_log_conformation(TensorField::zeros(Representation::Tensor2D, grid.ncells()))
            .unwrap();
        assert!(s.yield_indicator().is_none());
        assert!(s.refinement_signals(&tol).unwrap().get("yield").is_none());

        s.restore_log_conformation(stretched).unwrap();
        s.step(&mut engine, &inputs).unwrap();
        assert!(s.yield_indicator().is_some());
        s.restore_conformation(TensorField::identity(Representation::Tensor2D, grid.ncells()))
            .unwrap();
        assert!(s.yield_indicator().is_none());
        assert!(s.refinement_signals(&tol).unwrap().get("yield").is_none());
    }

    #[test]
    fn test_restore_conformation_recovers_log() {
        let grid = Grid::new_2d(3, 3, 1.0, [0.0, 0.0]);
        let mut s = solver(Representation::Tensor2D, grid.clone());
        let a = TensorField::from_fn(Representation::Tensor2D, 9, |_, c| [2.0, 0.0, 1.0][c]);
        let stats = s.restore_conformation(a).unwrap();
        assert_eq!(stats.clamped_eigenvalues, 0);
        let row = s.log_conformation().cell(4);
        assert_eq!(row.to_vec(), vec![2.0_f64.ln(), 0.0, 0.0]);
    }
}
