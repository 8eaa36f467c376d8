// ─────────────────────────────────────────────────────────────────────
// Visco Core — Cell Tensor
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-cell unpacked view of a tensor record.
//!
//! A [`TensorField`] stores flat component rows; every per-cell update
//! unpacks its row into a [`CellTensor`], works on the small matrix and
//! packs the result back. The variant is fixed by the field's
//! [`Representation`] and never mixed within a run.

use crate::sweep::SweepStats;
use ndarray::ArrayView1;
use visco_math::eigen::{decompose_conformation, EigenBasis, Sym2, Sym3, SymmetricEigen};
use visco_math::logm::log_positive;
use visco_types::state::{Representation, TensorField};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellTensor {
    /// Planar 2D.
    Planar(Sym2),
    /// Axisymmetric: in-plane (axial, radial) block plus the hoop
    /// component, which is an independent eigen-direction.
    Axisymmetric(Sym2, f64),
    /// Full 3D.
    Full(Sym3),
}

impl CellTensor {
    pub fn zero(repr: Representation) -> Self {
        match repr {
            Representation::Tensor2D => CellTensor::Planar([[0.0; 2]; 2]),
            Representation::Scalar2D => CellTensor::Axisymmetric([[0.0; 2]; 2], 0.0),
            Representation::Scalar3D => CellTensor::Full([[0.0; 3]; 3]),
        }
    }

    pub fn identity(repr: Representation) -> Self {
        match repr {
            Representation::Tensor2D => CellTensor::Planar([[1.0, 0.0], [0.0, 1.0]]),
            Representation::Scalar2D => CellTensor::Axisymmetric([[1.0, 0.0], [0.0, 1.0]], 1.0),
            Representation::Scalar3D => {
                CellTensor::Full([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
            }
        }
    }

    /// Unpack a component row laid out as [`Representation::component_names`].
    pub fn from_row(repr: Representation, row: ArrayView1<'_, f64>) -> Self {
        match repr {
            Representation::Tensor2D => CellTensor::Planar([[row[0], row[1]], [row[1], row[2]]]),
            Representation::Scalar2D => {
                CellTensor::Axisymmetric([[row[0], row[1]], [row[1], row[2]]], row[3])
            }
            Representation::Scalar3D => CellTensor::Full([
                [row[0], row[1], row[2]],
                [row[1], row[3], row[4]],
                [row[2], row[4], row[5]],
            ]),
        }
    }

    /// Packed components; only the first [`Self::n_components`] are used.
    pub fn components(&self) -> [f64; 6] {
        match self {
            CellTensor::Planar(m) => [m[0][0], m[0][1], m[1][1], 0.0, 0.0, 0.0],
            CellTensor::Axisymmetric(m, hoop) => [m[0][0], m[0][1], m[1][1], *hoop, 0.0, 0.0],
            CellTensor::Full(m) => [m[0][0], m[0][1], m[0][2], m[1][1], m[1][2], m[2][2]],
        }
    }

    pub fn n_components(&self) -> usize {
        match self {
            CellTensor::Planar(_) => 3,
            CellTensor::Axisymmetric(..) => 4,
            CellTensor::Full(_) => 6,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.components()[..self.n_components()]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Embed in the physical 3x3 tensor. The out-of-plane diagonal of a
    /// planar tensor is taken as `out_of_plane` (1 for a conformation,
    /// 0 for its log or a stress).
    pub fn to_sym3(&self, out_of_plane: f64) -> Sym3 {
        match *self {
            CellTensor::Planar(m) => [
                [m[0][0], m[0][1], 0.0],
                [m[1][0], m[1][1], 0.0],
                [0.0, 0.0, out_of_plane],
            ],
            CellTensor::Axisymmetric(m, hoop) => [
                [m[0][0], m[0][1], 0.0],
                [m[1][0], m[1][1], 0.0],
                [0.0, 0.0, hoop],
            ],
            CellTensor::Full(m) => m,
        }
    }

    /// `self · s + other · t`, component-wise.
    pub fn combine(&self, s: f64, other: &CellTensor, t: f64) -> CellTensor {
        match (*self, *other) {
            (CellTensor::Planar(a), CellTensor::Planar(b)) => CellTensor::Planar(lin(&a, s, &b, t)),
            (CellTensor::Axisymmetric(a, ha), CellTensor::Axisymmetric(b, hb)) => {
                CellTensor::Axisymmetric(lin(&a, s, &b, t), ha * s + hb * t)
            }
            (CellTensor::Full(a), CellTensor::Full(b)) => CellTensor::Full(lin(&a, s, &b, t)),
            // Mixed variants never occur within one run; keep the receiver.
            (lhs, _) => lhs,
        }
    }

    /// Matrix logarithm of a conformation. Sub-floor eigenvalues are
    /// clamped and counted in the returned stats.
    pub fn log(&self, floor: f64) -> (CellTensor, SweepStats) {
        let mut stats = SweepStats::default();
        let out = match self {
            CellTensor::Planar(a) => CellTensor::Planar(log_with_stats(a, floor, &mut stats)),
            CellTensor::Axisymmetric(a, hoop) => {
                let block = log_with_stats(a, floor, &mut stats);
                let (lh, clamped) = log_positive(*hoop, floor);
                stats.clamped_eigenvalues += clamped;
                CellTensor::Axisymmetric(block, lh)
            }
            CellTensor::Full(a) => CellTensor::Full(log_with_stats(a, floor, &mut stats)),
        };
        (out, stats)
    }

    /// Matrix exponential of a log-conformation; SPD for any finite input.
    pub fn exp(&self) -> (CellTensor, SweepStats) {
        let mut stats = SweepStats::default();
        let out = self.map_spectrum(&mut stats, f64::exp);
        (out, stats)
    }

    /// Apply `f` to every eigenvalue (and to the hoop scalar).
    pub fn map_spectrum(&self, stats: &mut SweepStats, f: impl Fn(f64) -> f64) -> CellTensor {
        match self {
            CellTensor::Planar(m) => CellTensor::Planar(basis_of(m, stats).reconstruct(&f)),
            CellTensor::Axisymmetric(m, hoop) => {
                CellTensor::Axisymmetric(basis_of(m, stats).reconstruct(&f), f(*hoop))
            }
            CellTensor::Full(m) => CellTensor::Full(basis_of(m, stats).reconstruct(&f)),
        }
    }
}

/// Decompose `m`, recording whether the Jacobi fallback was needed.
pub(crate) fn basis_of<const N: usize>(m: &[[f64; N]; N], stats: &mut SweepStats) -> EigenBasis<N>
where
    [[f64; N]; N]: SymmetricEigen<N>,
{
    let basis = m.eigen_sym();
    if basis.jacobi {
        stats.jacobi_fallbacks += 1;
    }
    basis
}

fn log_with_stats<const N: usize>(
    a: &[[f64; N]; N],
    floor: f64,
    stats: &mut SweepStats,
) -> [[f64; N]; N]
where
    [[f64; N]; N]: SymmetricEigen<N>,
{
    let (basis, clamped) = decompose_conformation(a, floor);
    stats.clamped_eigenvalues += clamped;
    if basis.jacobi {
        stats.jacobi_fallbacks += 1;
    }
    basis.reconstruct(f64::ln)
}

fn lin<const N: usize>(a: &[[f64; N]; N], s: f64, b: &[[f64; N]; N], t: f64) -> [[f64; N]; N] {
    let mut out = [[0.0; N]; N];
    for i in 0..N {
        for j in 0..N {
            out[i][j] = a[i][j] * s + b[i][j] * t;
        }
    }
    out
}

/// Pack per-cell results (in cell order) into a field.
pub fn collect_field(repr: Representation, cells: &[CellTensor]) -> TensorField {
    TensorField::from_fn(repr, cells.len(), |idx, c| cells[idx].components()[c])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_row_roundtrip_all_layouts() {
        let rows = [
            (Representation::Tensor2D, vec![1.0, 2.0, 3.0]),
            (Representation::Scalar2D, vec![1.0, 2.0, 3.0, 4.0]),
            (Representation::Scalar3D, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
        ];
        for (repr, row) in rows {
            let cell = CellTensor::from_row(repr, arr1(&row).view());
            assert_eq!(cell.n_components(), repr.n_components());
            assert_eq!(&cell.components()[..row.len()], row.as_slice());
        }
    }

    #[test]
    fn test_identity_log_is_exact_zero() {
        for repr in [
            Representation::Tensor2D,
            Representation::Scalar2D,
            Representation::Scalar3D,
        ] {
            let (log, stats) = CellTensor::identity(repr).log(1e-12);
            assert_eq!(log, CellTensor::zero(repr));
            assert_eq!(stats.clamped_eigenvalues, 0);
            let (back, _) = CellTensor::zero(repr).exp();
            assert_eq!(back, CellTensor::identity(repr));
        }
    }

    #[test]
    fn test_diag_2_1_scenario() {
        let a = CellTensor::Planar([[2.0, 0.0], [0.0, 1.0]]);
        let (log, _) = a.log(1e-12);
        assert_eq!(log, CellTensor::Planar([[2.0_f64.ln(), 0.0], [0.0, 0.0]]));
        let (back, _) = log.exp();
        match back {
            CellTensor::Planar(m) => {
                assert!((m[0][0] - 2.0).abs() < 1e-15);
                assert!((m[1][1] - 1.0).abs() < 1e-15);
                assert_eq!(m[0][1], 0.0);
            }
            other => panic!("Unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_hoop_component_logged_independently() {
        let a = CellTensor::Axisymmetric([[1.5, 0.2], [0.2, 0.9]], 3.0);
        let (log, _) = a.log(1e-12);
        match log {
            CellTensor::Axisymmetric(_, h) => assert!((h - 3.0_f64.ln()).abs() < 1e-15),
            other => panic!("Unexpected variant: {other:?}"),
        }
        let (back, _) = log.exp();
        let diff = back.combine(1.0, &a, -1.0).components();
        assert!(diff.iter().all(|d| d.abs() < 1e-13));
    }

    #[test]
    fn test_negative_roundoff_is_counted() {
        let a = CellTensor::Axisymmetric([[1.0, 0.0], [0.0, -1e-17]], -1e-18);
        let (log, stats) = a.log(1e-12);
        assert_eq!(stats.clamped_eigenvalues, 2);
        assert!(log.is_finite());
    }

    #[test]
    fn test_to_sym3_embedding() {
        let a = CellTensor::Planar([[2.0, 0.5], [0.5, 1.0]]);
        let m = a.to_sym3(1.0);
        assert_eq!(m[2][2], 1.0);
        assert_eq!(m[0][2], 0.0);
        let ax = CellTensor::Axisymmetric([[2.0, 0.5], [0.5, 1.0]], 0.7);
        assert_eq!(ax.to_sym3(1.0)[2][2], 0.7);
    }

    #[test]
    fn test_collect_field_layout() {
        let cells = vec![
            CellTensor::Full([[1.0, 2.0, 3.0], [2.0, 4.0, 5.0], [3.0, 5.0, 6.0]]),
            CellTensor::identity(Representation::Scalar3D),
        ];
        let field = collect_field(Representation::Scalar3D, &cells);
        assert_eq!(field.ncells(), 2);
        assert_eq!(
            field.cell(0).to_vec(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
        assert_eq!(
            field.cell(1).to_vec(),
            Representation::Scalar3D.identity_components().to_vec()
        );
    }
}
