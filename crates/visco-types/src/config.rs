// ─────────────────────────────────────────────────────────────────────
// Visco Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::constants::{
    A_ERR, DENSITY_RATIO_GAS, DOMAIN_LENGTH, EIGEN_FLOOR, KE_BLOWUP, KE_GRACE_ITERATIONS,
    KE_STAGNATION, OHNESORGE_RATIO_GAS, RHO_LIQUID,
};
use crate::error::{ViscoError, ViscoResult};
use crate::state::{Grid, Representation};
use serde::{Deserialize, Serialize};

/// Top-level run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViscoConfig {
    pub case_name: String,
    pub driver: DriverParams,
    /// Explicit per-phase constants. When absent they are seeded from
    /// the driver numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phases: Option<PhaseConstants>,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub refinement: RefinementTolerances,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Dimensionless numbers handed over by the driver at start-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverParams {
    /// Maximum refinement level (2^level cells across the domain).
    pub max_level: u32,
    /// Deborah number; 1e30 emulates the λ → ∞ limit.
    pub deborah: f64,
    /// Elastocapillary number.
    pub elastocapillary: f64,
    /// Solvent Ohnesorge number.
    pub ohnesorge: f64,
    pub bond: f64,
    pub t_max: f64,
}

/// Material constants of the two phases (1 = polymeric liquid, 2 = gas).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseConstants {
    pub g1: f64,
    pub lambda1: f64,
    pub g2: f64,
    pub lambda2: f64,
    pub rho1: f64,
    pub rho2: f64,
    pub mu1: f64,
    pub mu2: f64,
}

impl PhaseConstants {
    /// λ₁ = De, G₁ = Ec; the gas carries no polymer.
    pub fn from_driver(driver: &DriverParams) -> Self {
        PhaseConstants {
            g1: driver.elastocapillary,
            lambda1: driver.deborah,
            g2: 0.0,
            lambda2: 0.0,
            rho1: RHO_LIQUID,
            rho2: RHO_LIQUID * DENSITY_RATIO_GAS,
            mu1: driver.ohnesorge,
            mu2: OHNESORGE_RATIO_GAS * driver.ohnesorge,
        }
    }

    pub fn validate(&self) -> ViscoResult<()> {
        let named = [
            ("g1", self.g1),
            ("lambda1", self.lambda1),
            ("g2", self.g2),
            ("lambda2", self.lambda2),
            ("rho1", self.rho1),
            ("rho2", self.rho2),
            ("mu1", self.mu1),
            ("mu2", self.mu2),
        ];
        for (name, value) in named {
            if !value.is_finite() || value < 0.0 {
                return Err(ViscoError::ConfigError(format!(
                    "phase constant {name} must be finite and >= 0, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Constitutive closure for the polymer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConstitutiveModel {
    #[default]
    OldroydB,
    /// Elastoviscoplastic: relaxation gated off below the yield stress.
    Saramito,
}

/// Slope limiter used by the advection flux reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LimiterKind {
    /// First-order upwind.
    None,
    Minmod,
    #[default]
    VanLeer,
    Superbee,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default)]
    pub representation: Representation,
    #[serde(default)]
    pub model: ConstitutiveModel,
    #[serde(default)]
    pub limiter: LimiterKind,
    /// Passes of the 1-2-1 interface filter applied to f before blending.
    #[serde(default = "default_smoothing_passes")]
    pub smoothing_passes: usize,
    /// Largest ‖∇u‖·Δt allowed in a single deformation sub-step.
    #[serde(default = "default_max_strain_increment")]
    pub max_strain_increment: f64,
    #[serde(default = "default_eigen_floor")]
    pub eigen_floor: f64,
    /// Yield stress τ_y (Saramito model only).
    #[serde(default)]
    pub yield_stress: f64,
}

fn default_smoothing_passes() -> usize {
    1
}
fn default_max_strain_increment() -> f64 {
    0.1
}
fn default_eigen_floor() -> f64 {
    EIGEN_FLOOR
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            representation: Representation::default(),
            model: ConstitutiveModel::default(),
            limiter: LimiterKind::default(),
            smoothing_passes: default_smoothing_passes(),
            max_strain_increment: default_max_strain_increment(),
            eigen_floor: default_eigen_floor(),
            yield_stress: 0.0,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> ViscoResult<()> {
        if !self.eigen_floor.is_finite() || self.eigen_floor <= 0.0 {
            return Err(ViscoError::ConfigError(
                "eigen_floor must be finite and > 0".to_string(),
            ));
        }
        if !self.max_strain_increment.is_finite() || self.max_strain_increment <= 0.0 {
            return Err(ViscoError::ConfigError(
                "max_strain_increment must be finite and > 0".to_string(),
            ));
        }
        if !self.yield_stress.is_finite() || self.yield_stress < 0.0 {
            return Err(ViscoError::ConfigError(
                "yield_stress must be finite and >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Error tolerance on the conformation components handed to the
/// adaptive-refinement engine. Interface and velocity tolerances belong
/// to the flow solver that owns those fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RefinementTolerances {
    #[serde(default = "default_a_err")]
    pub a_err: f64,
}

fn default_a_err() -> f64 {
    A_ERR
}

impl Default for RefinementTolerances {
    fn default() -> Self {
        RefinementTolerances { a_err: A_ERR }
    }
}

/// Kinetic-energy guard applied by the driver after every iteration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_ke_max")]
    pub ke_max: f64,
    #[serde(default = "default_ke_min")]
    pub ke_min: f64,
    #[serde(default = "default_grace")]
    pub grace_iterations: usize,
}

fn default_ke_max() -> f64 {
    KE_BLOWUP
}
fn default_ke_min() -> f64 {
    KE_STAGNATION
}
fn default_grace() -> usize {
    KE_GRACE_ITERATIONS
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            ke_max: KE_BLOWUP,
            ke_min: KE_STAGNATION,
            grace_iterations: KE_GRACE_ITERATIONS,
        }
    }
}

impl ViscoConfig {
    /// Load from a JSON file and validate.
    pub fn from_file(path: &str) -> ViscoResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> ViscoResult<Self> {
        let config: Self = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ViscoResult<()> {
        if self.driver.max_level == 0 || self.driver.max_level > 16 {
            return Err(ViscoError::ConfigError(format!(
                "max_level must be in 1..=16, got {}",
                self.driver.max_level
            )));
        }
        if !self.driver.deborah.is_finite() || self.driver.deborah < 0.0 {
            return Err(ViscoError::ConfigError(
                "deborah must be finite and >= 0 (use 1e30 for the elastic limit)".to_string(),
            ));
        }
        if !self.driver.elastocapillary.is_finite() || self.driver.elastocapillary < 0.0 {
            return Err(ViscoError::ConfigError(
                "elastocapillary must be finite and >= 0".to_string(),
            ));
        }
        self.materials().validate()?;
        self.solver.validate()?;
        Ok(())
    }

    /// Per-phase constants, explicit or seeded from the driver numbers.
    pub fn materials(&self) -> PhaseConstants {
        self.phases
            .unwrap_or_else(|| PhaseConstants::from_driver(&self.driver))
    }

    /// Uniform grid at the finest level over the standard domain.
    ///
    /// Axisymmetric runs span [-L/2, L/2] axially and [0, L] radially.
    pub fn create_grid(&self) -> Grid {
        let n = 1usize << self.driver.max_level;
        let delta = DOMAIN_LENGTH / n as f64;
        let half = DOMAIN_LENGTH / 2.0;
        match self.solver.representation {
            Representation::Scalar2D => Grid::new_2d(n, n, delta, [-half, 0.0]),
            Representation::Tensor2D => Grid::new_2d(n, n, delta, [-half, -half]),
            Representation::Scalar3D => Grid::new_3d(n, n, n, delta, [-half, -half, -half]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    const MINIMAL: &str = r#"{
        "case_name": "bursting-bubble",
        "driver": {
            "max_level": 6,
            "deborah": 1.0,
            "elastocapillary": 0.1,
            "ohnesorge": 0.01,
            "bond": 0.001,
            "t_max": 2.5
        }
    }"#;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let cfg = ViscoConfig::from_json(MINIMAL).unwrap();
        assert_eq!(cfg.case_name, "bursting-bubble");
        assert_eq!(cfg.solver.representation, Representation::Scalar2D);
        assert_eq!(cfg.solver.model, ConstitutiveModel::OldroydB);
        assert_eq!(cfg.solver.smoothing_passes, 1);
        assert!((cfg.refinement.a_err - 1e-3).abs() < 1e-18);
        assert!((cfg.monitor.ke_max - 1e2).abs() < 1e-12);
        assert_eq!(cfg.monitor.grace_iterations, 10);
    }

    #[test]
    fn test_refinement_section_sets_conformation_tolerance() {
        let json = r#"{
            "case_name": "fine",
            "driver": {"max_level": 9, "deborah": 1.0, "elastocapillary": 0.1,
                       "ohnesorge": 0.01, "bond": 0.0, "t_max": 1.0},
            "refinement": {"a_err": 5e-4}
        }"#;
        let cfg = ViscoConfig::from_json(json).unwrap();
        assert_eq!(cfg.refinement.a_err, 5e-4);
        let round = serde_json::to_value(cfg.refinement).unwrap();
        assert_eq!(round, serde_json::json!({"a_err": 5e-4}));
    }

    #[test]
    fn test_materials_seeded_from_driver() {
        let cfg = ViscoConfig::from_json(MINIMAL).unwrap();
        let m = cfg.materials();
        assert_eq!(m.lambda1, 1.0);
        assert_eq!(m.g1, 0.1);
        assert_eq!(m.lambda2, 0.0);
        assert_eq!(m.g2, 0.0);
        assert!((m.mu2 - 2e-4).abs() < 1e-18);
        assert!((m.rho2 - 1e-3).abs() < 1e-18);
    }

    #[test]
    fn test_explicit_phases_override_driver() {
        let json = r#"{
            "case_name": "evp",
            "driver": {"max_level": 5, "deborah": 1.0, "elastocapillary": 1.0,
                       "ohnesorge": 0.1, "bond": 0.0, "t_max": 1.0},
            "phases": {"g1": 2.0, "lambda1": 3.0, "g2": 0.5, "lambda2": 0.25,
                       "rho1": 1.0, "rho2": 0.001, "mu1": 0.1, "mu2": 0.002},
            "solver": {"representation": "tensor_2d", "model": "saramito",
                       "limiter": "minmod", "yield_stress": 0.3}
        }"#;
        let cfg = ViscoConfig::from_json(json).unwrap();
        assert_eq!(cfg.materials().g2, 0.5);
        assert_eq!(cfg.solver.model, ConstitutiveModel::Saramito);
        assert_eq!(cfg.solver.limiter, LimiterKind::Minmod);
        assert_eq!(cfg.solver.representation, Representation::Tensor2D);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut cfg = ViscoConfig::from_json(MINIMAL).unwrap();
        cfg.driver.deborah = f64::INFINITY;
        assert!(cfg.validate().is_err());

        let mut cfg = ViscoConfig::from_json(MINIMAL).unwrap();
        cfg.solver.eigen_floor = 0.0;
        match cfg.validate() {
            Err(ViscoError::ConfigError(msg)) => assert!(msg.contains("eigen_floor")),
            other => panic!("Unexpected result: {other:?}"),
        }

        let mut cfg = ViscoConfig::from_json(MINIMAL).unwrap();
        cfg.phases = Some(PhaseConstants {
            g2: -1.0,
            ..cfg.materials()
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_create_grid_axisymmetric() {
        let cfg = ViscoConfig::from_json(MINIMAL).unwrap();
        let grid = cfg.create_grid();
        assert_eq!(grid.nx, 64);
        assert_eq!(grid.ny, 64);
        assert_eq!(grid.nz, 1);
        assert!((grid.delta - 0.125).abs() < 1e-15);
        assert_eq!(grid.origin, [-4.0, 0.0, 0.0]);
    }

    #[test]
    fn test_from_file_and_roundtrip() {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!("visco_cfg_{stamp}.json"));
        std::fs::write(&path, MINIMAL).unwrap();
        let cfg = ViscoConfig::from_file(&path.to_string_lossy()).unwrap();
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let cfg2 = ViscoConfig::from_json(&json).unwrap();
        assert_eq!(cfg.case_name, cfg2.case_name);
        assert_eq!(cfg.driver.max_level, cfg2.driver.max_level);
        assert_eq!(cfg.solver.representation, cfg2.solver.representation);
        let _ = std::fs::remove_file(&path);
    }
}
