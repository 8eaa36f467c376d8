// ─────────────────────────────────────────────────────────────────────
// Visco Core — Grid Engine Seam
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Interface to the mesh engine that owns cell topology.
//!
//! The solver only calls the engine at two synchronisation points per
//! step (before Advect and before Deform) and hands it refinement
//! signals. [`UniformGridEngine`] is the single-block reference.

use crate::refinement::{CellAction, RefinementSignals, WaveletFlagger};
use visco_types::error::{ViscoError, ViscoResult};
use visco_types::state::{Grid, TensorField};

/// Outcome of an adaptation request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdaptSummary {
    pub refined: usize,
    pub coarsened: usize,
    pub kept: usize,
}

pub trait GridEngine {
    fn grid(&self) -> &Grid;

    /// Fill ghost values of `field` from neighbouring subdomains.
    fn exchange_ghosts(&mut self, field: &mut TensorField) -> ViscoResult<()>;

    /// Decide refine/coarsen actions from the exported signals.
    fn adapt(&mut self, signals: &RefinementSignals) -> ViscoResult<AdaptSummary>;
}

fn check_field(grid: &Grid, field: &TensorField) -> ViscoResult<()> {
    if field.ncells() != grid.ncells() {
        return Err(ViscoError::FieldShapeMismatch {
            field: "tensor".to_string(),
            expected: (grid.ncells(), field.repr().n_components()),
            got: field.data().dim(),
        });
    }
    if let Some(index) = field.first_non_finite() {
        return Err(ViscoError::NonFiniteField {
            field: "tensor".to_string(),
            index,
        });
    }
    Ok(())
}

fn summarize(actions: &[CellAction]) -> AdaptSummary {
    let mut summary = AdaptSummary::default();
    for action in actions {
        match action {
            CellAction::Refine => summary.refined += 1,
            CellAction::Coarsen => summary.coarsened += 1,
            CellAction::Keep => summary.kept += 1,
        }
    }
    summary
}

/// Single block at a fixed resolution. Ghosts are the clamped edge
/// values, so exchange only validates; adaptation is evaluated but the
/// block is never resized.
#[derive(Debug, Clone)]
pub struct UniformGridEngine {
    grid: Grid,
    exchanges: usize,
    last_actions: Vec<CellAction>,
}

impl UniformGridEngine {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            exchanges: 0,
            last_actions: Vec::new(),
        }
    }

    pub fn exchanges(&self) -> usize {
        self.exchanges
    }

    /// Per-cell actions from the most recent [`GridEngine::adapt`].
    pub fn last_actions(&self) -> &[CellAction] {
        &self.last_actions
    }
}

impl GridEngine for UniformGridEngine {
    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn exchange_ghosts(&mut self, field: &mut TensorField) -> ViscoResult<()> {
        check_field(&self.grid, field)?;
        self.exchanges += 1;
        Ok(())
    }

    fn adapt(&mut self, signals: &RefinementSignals) -> ViscoResult<AdaptSummary> {
        self.last_actions = WaveletFlagger.flag(&self.grid, signals)?;
        Ok(summarize(&self.last_actions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visco_types::config::RefinementTolerances;
    use visco_types::state::Representation;

    fn ramp(grid: &Grid, repr: Representation) -> TensorField {
        TensorField::from_fn(repr, grid.ncells(), |idx, c| (idx * 10 + c) as f64)
    }

    #[test]
    fn test_uniform_exchange_validates_and_counts() {
        let grid = Grid::new_2d(4, 4, 0.25, [0.0, 0.0]);
        let mut engine = UniformGridEngine::new(grid.clone());
        let mut field = ramp(&grid, Representation::Tensor2D);
        engine.exchange_ghosts(&mut field).unwrap();
        assert_eq!(engine.exchanges(), 1);

        field.data_mut()[[5, 0]] = f64::INFINITY;
        assert!(matches!(
            engine.exchange_ghosts(&mut field),
            Err(ViscoError::NonFiniteField { index: 5, .. })
        ));
        let mut short = TensorField::zeros(Representation::Tensor2D, 3);
        assert!(engine.exchange_ghosts(&mut short).is_err());
    }

    #[test]
    fn test_uniform_adapt_summary() {
        let grid = Grid::new_2d(8, 1, 0.1, [0.0, 0.0]);
        let mut engine = UniformGridEngine::new(grid.clone());
        let a = TensorField::identity(Representation::Tensor2D, 8);
        let signals =
            RefinementSignals::export(&a, None, &RefinementTolerances::default()).unwrap();
        let summary = engine.adapt(&signals).unwrap();
        assert_eq!(summary.coarsened, 8);
        assert_eq!(summary.refined, 0);
        assert_eq!(engine.last_actions().len(), 8);
    }
}
