// ─────────────────────────────────────────────────────────────────────
// Visco Core — Matrix Log/Exp
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Logarithmic change of variables for symmetric positive-definite
//! tensors.
//!
//! `log(A) = V · diag(ln λ) · Vᵀ` and `exp(L) = V · diag(e^λ) · Vᵀ`.
//! The exponential of any finite symmetric matrix is SPD, so a tensor
//! rebuilt through [`exp_sym`] is positive-definite whatever error the
//! time integration has accumulated in its logarithm.

use crate::eigen::{decompose_conformation, SymmetricEigen};

/// Matrix logarithm of an SPD matrix. Eigenvalues below `floor` are
/// clamped first; the clamp count is returned with the result.
pub fn log_spd<const N: usize>(a: &[[f64; N]; N], floor: f64) -> ([[f64; N]; N], usize)
where
    [[f64; N]; N]: SymmetricEigen<N>,
{
    let (basis, clamped) = decompose_conformation(a, floor);
    (basis.reconstruct(f64::ln), clamped)
}

/// Matrix exponential of a symmetric matrix.
pub fn exp_sym<const N: usize>(l: &[[f64; N]; N]) -> [[f64; N]; N]
where
    [[f64; N]; N]: SymmetricEigen<N>,
{
    l.eigen_sym().reconstruct(f64::exp)
}

/// Scalar counterpart used for the axisymmetric hoop component.
pub fn log_positive(x: f64, floor: f64) -> (f64, usize) {
    if x < floor {
        (floor.ln(), 1)
    } else {
        (x.ln(), 0)
    }
}

/// Bernoulli generating function `x / (eˣ − 1)`, equal to 1 at `x = 0`.
///
/// Gives the divided difference of the logarithm between two
/// eigenvalues in terms of their log-space gap only:
/// `λⱼ (ln λⱼ − ln λᵢ) / (λⱼ − λᵢ) = bernoulli(ψᵢ − ψⱼ)`. It therefore
/// never overflows for large log values and stays finite when the
/// eigenvalues coincide.
pub fn bernoulli(x: f64) -> f64 {
    if x.abs() < 1e-8 {
        // Second-order expansion; expm1 loses nothing here but the
        // division by a vanishing argument does.
        return 1.0 - 0.5 * x + x * x / 12.0;
    }
    x / x.exp_m1()
}
