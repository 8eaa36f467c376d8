// ─────────────────────────────────────────────────────────────────────
// Visco Core — Symmetric Eigen-Decomposition
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Eigen-decomposition of small symmetric matrices.
//!
//! 2x2 uses the closed-form rotation angle. 3x3 uses the trigonometric
//! solution of the characteristic cubic and falls back to cyclic Jacobi
//! rotations when eigenvalues are close enough for the closed form to
//! lose orthogonality or when its basis fails to reconstruct the input.
//!
//! Eigenvalues are always returned in descending order; ties keep the
//! lower component index first.

use std::f64::consts::PI;

pub type Sym2 = [[f64; 2]; 2];
pub type Sym3 = [[f64; 3]; 3];

/// Relative spread below which the 3x3 closed form is abandoned.
const DEGENERACY_TOL: f64 = 1e-8;

/// Orthogonality defect tolerated from the closed-form eigenvectors.
const ORTHO_TOL: f64 = 1e-10;

/// Largest entry of `V·diag(λ)·Vᵀ - A`, relative to the largest entry
/// of `A`, accepted from the closed form. Near a repeated root the cubic
/// only resolves eigenvalues to about √ε, which a gap test cannot see.
const RESIDUAL_TOL: f64 = 1e-12;

const JACOBI_MAX_SWEEPS: usize = 64;

/// Eigenvalues and orthonormal eigenvectors of a symmetric matrix.
///
/// `vectors[r][c]` is component `r` of eigenvector `c`, so `vectors` is
/// the rotation `V` in `A = V · diag(values) · Vᵀ`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenBasis<const N: usize> {
    pub values: [f64; N],
    pub vectors: [[f64; N]; N],
    /// True when the Jacobi fallback produced this basis.
    pub jacobi: bool,
}

impl<const N: usize> EigenBasis<N> {
    pub fn eigenvector(&self, c: usize) -> [f64; N] {
        let mut v = [0.0; N];
        for (r, row) in self.vectors.iter().enumerate() {
            v[r] = row[c];
        }
        v
    }

    /// `V · diag(f(λ)) · Vᵀ`, symmetric by construction.
    pub fn reconstruct(&self, f: impl Fn(f64) -> f64) -> [[f64; N]; N] {
        let mut fl = [0.0; N];
        for (k, &lam) in self.values.iter().enumerate() {
            fl[k] = f(lam);
        }
        self.reconstruct_with(&fl)
    }

    /// `V · diag(d) · Vᵀ` for explicit diagonal entries.
    pub fn reconstruct_with(&self, d: &[f64; N]) -> [[f64; N]; N] {
        let v = &self.vectors;
        let mut out = [[0.0; N]; N];
        for i in 0..N {
            for j in i..N {
                let mut sum = 0.0;
                for k in 0..N {
                    sum += v[i][k] * d[k] * v[j][k];
                }
                out[i][j] = sum;
                out[j][i] = sum;
            }
        }
        out
    }

    /// Project a (not necessarily symmetric) matrix onto the basis: `Vᵀ·M·V`.
    pub fn project(&self, m: &[[f64; N]; N]) -> [[f64; N]; N] {
        let v = &self.vectors;
        let mut mv = [[0.0; N]; N];
        for i in 0..N {
            for j in 0..N {
                let mut sum = 0.0;
                for k in 0..N {
                    sum += m[i][k] * v[k][j];
                }
                mv[i][j] = sum;
            }
        }
        let mut out = [[0.0; N]; N];
        for i in 0..N {
            for j in 0..N {
                let mut sum = 0.0;
                for k in 0..N {
                    sum += v[k][i] * mv[k][j];
                }
                out[i][j] = sum;
            }
        }
        out
    }

    /// Rotate a matrix expressed in the eigenbasis back: `V·M·Vᵀ`.
    /// The result is symmetrised.
    pub fn rotate_back(&self, m: &[[f64; N]; N]) -> [[f64; N]; N] {
        let v = &self.vectors;
        let mut out = [[0.0; N]; N];
        for i in 0..N {
            for j in i..N {
                let mut sum = 0.0;
                for k in 0..N {
                    for l in 0..N {
                        sum += v[i][k] * 0.5 * (m[k][l] + m[l][k]) * v[j][l];
                    }
                }
                out[i][j] = sum;
                out[j][i] = sum;
            }
        }
        out
    }

    /// Clamp eigenvalues below `floor`, returning how many were clamped.
    pub fn clamp_below(&mut self, floor: f64) -> usize {
        let mut clamped = 0;
        for lam in self.values.iter_mut() {
            if *lam < floor {
                *lam = floor;
                clamped += 1;
            }
        }
        clamped
    }

    /// Sort descending; a stable sort keeps ties in component order.
    fn sorted(values: [f64; N], vectors: [[f64; N]; N], jacobi: bool) -> Self {
        let mut order: Vec<usize> = (0..N).collect();
        order.sort_by(|&i, &j| {
            values[j]
                .partial_cmp(&values[i])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut out_values = [0.0; N];
        let mut out_vectors = [[0.0; N]; N];
        for (dst, &src) in order.iter().enumerate() {
            out_values[dst] = values[src];
            for r in 0..N {
                out_vectors[r][dst] = vectors[r][src];
            }
        }
        EigenBasis {
            values: out_values,
            vectors: out_vectors,
            jacobi,
        }
    }
}

/// Symmetric matrices of a fixed size that know how to decompose
/// themselves.
pub trait SymmetricEigen<const N: usize> {
    fn eigen_sym(&self) -> EigenBasis<N>;
}

impl SymmetricEigen<2> for Sym2 {
    fn eigen_sym(&self) -> EigenBasis<2> {
        eigen_sym2(self)
    }
}

impl SymmetricEigen<3> for Sym3 {
    fn eigen_sym(&self) -> EigenBasis<3> {
        eigen_sym3(self)
    }
}

/// Decompose a conformation tensor, clamping round-off negatives to
/// `floor`. Returns the basis and the number of clamped eigenvalues.
pub fn decompose_conformation<const N: usize>(a: &[[f64; N]; N], floor: f64) -> (EigenBasis<N>, usize)
where
    [[f64; N]; N]: SymmetricEigen<N>,
{
    let mut basis = a.eigen_sym();
    let clamped = basis.clamp_below(floor);
    (basis, clamped)
}

/// Closed-form 2x2 decomposition.
pub fn eigen_sym2(m: &Sym2) -> EigenBasis<2> {
    let a = m[0][0];
    let b = 0.5 * (m[0][1] + m[1][0]);
    let c = m[1][1];

    if b == 0.0 {
        return EigenBasis::sorted([a, c], [[1.0, 0.0], [0.0, 1.0]], false);
    }

    // tan(2θ) = 2b / (a - c); with atan2 the first column carries the
    // larger eigenvalue.
    let theta = 0.5 * (2.0 * b).atan2(a - c);
    let (s, co) = theta.sin_cos();
    let l1 = a * co * co + 2.0 * b * s * co + c * s * s;
    let l2 = a * s * s - 2.0 * b * s * co + c * co * co;
    EigenBasis {
        values: [l1, l2],
        vectors: [[co, -s], [s, co]],
        jacobi: false,
    }
}

/// Trigonometric 3x3 decomposition with Jacobi fallback.
pub fn eigen_sym3(m: &Sym3) -> EigenBasis<3> {
    let a = symmetrize3(m);
    if a[0][1] == 0.0 && a[0][2] == 0.0 && a[1][2] == 0.0 {
        return EigenBasis::sorted(
            [a[0][0], a[1][1], a[2][2]],
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            false,
        );
    }
    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return jacobi_sym(&a);
    }

    let q = (a[0][0] + a[1][1] + a[2][2]) / 3.0;
    let mut b = a;
    for (i, row) in b.iter_mut().enumerate() {
        row[i] -= q;
    }
    let p2: f64 = b.iter().flat_map(|row| row.iter()).map(|v| v * v).sum();
    let p = (p2 / 6.0).sqrt();
    if p <= DEGENERACY_TOL * scale {
        return jacobi_sym(&a);
    }

    let mut bn = b;
    for row in bn.iter_mut() {
        for v in row.iter_mut() {
            *v /= p;
        }
    }
    let r = (0.5 * det3(&bn)).clamp(-1.0, 1.0);
    let phi = r.acos() / 3.0;
    let l1 = q + 2.0 * p * phi.cos();
    let l3 = q + 2.0 * p * (phi + 2.0 * PI / 3.0).cos();
    let l2 = 3.0 * q - l1 - l3;

    let gap = (l1 - l2).min(l2 - l3);
    if gap <= DEGENERACY_TOL * scale {
        return jacobi_sym(&a);
    }

    let (v1, v3) = match (null_vector3(&a, l1), null_vector3(&a, l3)) {
        (Some(v1), Some(v3)) => (v1, v3),
        _ => return jacobi_sym(&a),
    };
    if dot3(&v1, &v3).abs() > ORTHO_TOL {
        return jacobi_sym(&a);
    }
    let v2 = cross3(&v3, &v1);

    let basis = EigenBasis {
        values: [l1, l2, l3],
        vectors: [
            [v1[0], v2[0], v3[0]],
            [v1[1], v2[1], v3[1]],
            [v1[2], v2[2], v3[2]],
        ],
        jacobi: false,
    };
    if reconstruction_error(&basis, &a) > RESIDUAL_TOL * scale {
        return jacobi_sym(&a);
    }
    basis
}

fn reconstruction_error(basis: &EigenBasis<3>, a: &Sym3) -> f64 {
    let back = basis.reconstruct_with(&basis.values);
    let mut worst = 0.0_f64;
    for (row_b, row_a) in back.iter().zip(a.iter()) {
        for (b, x) in row_b.iter().zip(row_a.iter()) {
            worst = worst.max((b - x).abs());
        }
    }
    // NaN must fail the acceptance test.
    if worst.is_nan() {
        f64::INFINITY
    } else {
        worst
    }
}

/// Cyclic Jacobi rotations for any small symmetric matrix.
pub fn jacobi_sym<const N: usize>(m: &[[f64; N]; N]) -> EigenBasis<N> {
    let mut a = *m;
    for i in 0..N {
        for j in (i + 1)..N {
            let s = 0.5 * (a[i][j] + a[j][i]);
            a[i][j] = s;
            a[j][i] = s;
        }
    }
    let mut v = [[0.0; N]; N];
    for (i, row) in v.iter_mut().enumerate() {
        row[i] = 1.0;
    }

    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, x| acc.max(x.abs()));
    let tiny = 1e-300_f64.max(1e-18 * scale);

    for _ in 0..JACOBI_MAX_SWEEPS {
        let mut off_diag = 0.0;
        for i in 0..N {
            for j in (i + 1)..N {
                off_diag += a[i][j].abs();
            }
        }
        if off_diag <= tiny {
            break;
        }

        for p in 0..N {
            for q in (p + 1)..N {
                let apq = a[p][q];
                if apq.abs() <= tiny {
                    a[p][q] = 0.0;
                    a[q][p] = 0.0;
                    continue;
                }
                let theta = (a[q][q] - a[p][p]) / (2.0 * apq);
                let t = if theta >= 0.0 {
                    1.0 / (theta + (1.0 + theta * theta).sqrt())
                } else {
                    -1.0 / (-theta + (1.0 + theta * theta).sqrt())
                };
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = t * c;

                a[p][p] -= t * apq;
                a[q][q] += t * apq;
                a[p][q] = 0.0;
                a[q][p] = 0.0;

                for r in 0..N {
                    if r == p || r == q {
                        continue;
                    }
                    let arp = a[r][p];
                    let arq = a[r][q];
                    a[r][p] = c * arp - s * arq;
                    a[p][r] = a[r][p];
                    a[r][q] = s * arp + c * arq;
                    a[q][r] = a[r][q];
                }

                for row in v.iter_mut() {
                    let vp = row[p];
                    let vq = row[q];
                    row[p] = c * vp - s * vq;
                    row[q] = s * vp + c * vq;
                }
            }
        }
    }

    let mut values = [0.0; N];
    for (i, val) in values.iter_mut().enumerate() {
        *val = a[i][i];
    }
    EigenBasis::sorted(values, v, true)
}

fn symmetrize3(m: &Sym3) -> Sym3 {
    let mut a = *m;
    for i in 0..3 {
        for j in (i + 1)..3 {
            let s = 0.5 * (m[i][j] + m[j][i]);
            a[i][j] = s;
            a[j][i] = s;
        }
    }
    a
}

fn det3(m: &Sym3) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn dot3(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Unit vector spanning the null space of `A - λI` for a simple λ,
/// taken as the largest cross product of two rows.
fn null_vector3(a: &Sym3, lambda: f64) -> Option<[f64; 3]> {
    let rows = [
        [a[0][0] - lambda, a[0][1], a[0][2]],
        [a[1][0], a[1][1] - lambda, a[1][2]],
        [a[2][0], a[2][1], a[2][2] - lambda],
    ];
    let candidates = [
        cross3(&rows[0], &rows[1]),
        cross3(&rows[0], &rows[2]),
        cross3(&rows[1], &rows[2]),
    ];
    let (best, norm2) = candidates
        .iter()
        .map(|c| (*c, dot3(c, c)))
        .fold(([0.0; 3], 0.0), |acc, cur| if cur.1 > acc.1 { cur } else { acc });
    if norm2 <= 0.0 || !norm2.is_finite() {
        return None;
    }
    let inv = 1.0 / norm2.sqrt();
    Some([best[0] * inv, best[1] * inv, best[2] * inv])
}
