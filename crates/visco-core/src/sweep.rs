// ─────────────────────────────────────────────────────────────────────
// Visco Core — Cell Sweeps
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Data-parallel map over the cell index range.
//!
//! Every stage reads an immutable snapshot and produces a fresh arena, so
//! cells never alias each other's output and no locking is needed.

use rayon::prelude::*;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Counters of locally recovered numeric events during one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Conformation eigenvalues raised to the floor.
    pub clamped_eigenvalues: usize,
    /// Decompositions that fell back to Jacobi rotations.
    pub jacobi_fallbacks: usize,
    /// Deformation sub-steps summed over cells.
    pub deform_substeps: usize,
    /// Cells reset to equilibrium because λ = 0.
    pub reset_cells: usize,
    /// Cells above the yield threshold (Saramito only).
    pub yielded_cells: usize,
}

impl Add for SweepStats {
    type Output = SweepStats;

    fn add(mut self, rhs: SweepStats) -> SweepStats {
        self += rhs;
        self
    }
}

impl AddAssign for SweepStats {
    fn add_assign(&mut self, rhs: SweepStats) {
        self.clamped_eigenvalues += rhs.clamped_eigenvalues;
        self.jacobi_fallbacks += rhs.jacobi_fallbacks;
        self.deform_substeps += rhs.deform_substeps;
        self.reset_cells += rhs.reset_cells;
        self.yielded_cells += rhs.yielded_cells;
    }
}

impl Sum for SweepStats {
    fn sum<I: Iterator<Item = SweepStats>>(iter: I) -> SweepStats {
        iter.fold(SweepStats::default(), |acc, s| acc + s)
    }
}

/// Evaluate `update` for every cell in parallel; results keep cell order.
pub fn map_cells<T, F>(ncells: usize, update: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    (0..ncells).into_par_iter().map(update).collect()
}

/// Split per-cell `(value, stats)` results into values and a total.
pub fn unzip_stats<T>(results: Vec<(T, SweepStats)>) -> (Vec<T>, SweepStats) {
    let mut total = SweepStats::default();
    let values = results
        .into_iter()
        .map(|(v, s)| {
            total += s;
            v
        })
        .collect();
    (values, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_cells_preserves_order() {
        let out = map_cells(1000, |idx| idx * 2);
        assert_eq!(out.len(), 1000);
        assert!(out.iter().enumerate().all(|(i, &v)| v == 2 * i));
    }

    #[test]
    fn test_stats_accumulate() {
        let results = map_cells(10, |idx| {
            let stats = SweepStats {
                reset_cells: usize::from(idx % 2 == 0),
                deform_substeps: 1,
                ..SweepStats::default()
            };
            (idx, stats)
        });
        let (values, total) = unzip_stats(results);
        assert_eq!(values, (0..10).collect::<Vec<_>>());
        assert_eq!(total.reset_cells, 5);
        assert_eq!(total.deform_substeps, 10);

        let summed: SweepStats = vec![total, total].into_iter().sum();
        assert_eq!(summed.deform_substeps, 20);
    }
}
