// ─────────────────────────────────────────────────────────────────────
// Visco Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Smallest eigenvalue admitted when taking the log of a conformation tensor.
pub const EIGEN_FLOOR: f64 = 1e-12;

/// Deborah number used to emulate the purely elastic (λ → ∞) limit.
pub const INFINITE_DEBORAH: f64 = 1e30;

/// Liquid density in the non-dimensionalisation (ρ₁).
pub const RHO_LIQUID: f64 = 1.0;

/// Gas-to-liquid density ratio (ρ₂ / ρ₁).
pub const DENSITY_RATIO_GAS: f64 = 1e-3;

/// Gas-to-liquid Ohnesorge ratio (Oh_a / Oh).
pub const OHNESORGE_RATIO_GAS: f64 = 2e-2;

/// Default refinement tolerance on conformation components.
pub const A_ERR: f64 = 1e-3;

/// Kinetic energy above which a run is considered to have blown up.
pub const KE_BLOWUP: f64 = 1e2;

/// Kinetic energy below which a run is considered to have come to rest.
pub const KE_STAGNATION: f64 = 1e-6;

/// Iterations the energy monitor waits before judging a run.
pub const KE_GRACE_ITERATIONS: usize = 10;

/// Most negative kinetic energy tolerated as round-off.
pub const KE_NEGATIVE_TOLERANCE: f64 = -1e-10;

/// Edge length of the computational box in capillary units.
pub const DOMAIN_LENGTH: f64 = 8.0;
