// ─────────────────────────────────────────────────────────────────────
// Visco Core — Regular-Grid Sampling
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Bilinear sampling of cell-centred scalars onto a regular (x, y)
//! lattice, streamed as whitespace-separated rows `x y f0 f1 …`.

use ndarray::{Array2, ArrayView1};
use std::io::Write;
use visco_math::interp::interp2d;
use visco_types::error::{ViscoError, ViscoResult};
use visco_types::state::Grid;

/// Sampling window. `ny` fixes the spacing; `nx` follows from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub ny: usize,
}

/// Resolved lattice: square-ish cells with `dx ≈ dy`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingLattice {
    pub nx: usize,
    pub ny: usize,
    pub dx: f64,
    pub dy: f64,
    pub xmin: f64,
    pub ymin: f64,
}

impl SamplingConfig {
    pub fn lattice(&self) -> ViscoResult<SamplingLattice> {
        let bounds = [self.xmin, self.ymin, self.xmax, self.ymax];
        if bounds.iter().any(|v| !v.is_finite()) {
            return Err(ViscoError::ConfigError(
                "sampling bounds must be finite".to_string(),
            ));
        }
        if self.ny == 0 {
            return Err(ViscoError::ConfigError("ny must be positive".to_string()));
        }
        if self.xmax <= self.xmin || self.ymax <= self.ymin {
            return Err(ViscoError::ConfigError(
                "bounds must satisfy xmax > xmin and ymax > ymin".to_string(),
            ));
        }
        let dy = (self.ymax - self.ymin) / self.ny as f64;
        let nx = ((self.xmax - self.xmin) / dy) as usize;
        if nx == 0 {
            return Err(ViscoError::ConfigError(
                "computed nx is zero, check the sampling bounds".to_string(),
            ));
        }
        Ok(SamplingLattice {
            nx,
            ny: self.ny,
            dx: (self.xmax - self.xmin) / nx as f64,
            dy,
            xmin: self.xmin,
            ymin: self.ymin,
        })
    }
}

impl SamplingLattice {
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Centre of sample `(i, j)`.
    pub fn point(&self, i: usize, j: usize) -> (f64, f64) {
        (
            self.xmin + self.dx * (i as f64 + 0.5),
            self.ymin + self.dy * (j as f64 + 0.5),
        )
    }
}

/// Sample every field at every lattice point. Row `i·ny + j` holds
/// `[x, y, f0(x, y), f1(x, y), …]`.
pub fn sample_fields(
    grid: &Grid,
    fields: &[ArrayView1<'_, f64>],
    config: &SamplingConfig,
) -> ViscoResult<Array2<f64>> {
    if grid.dim != 2 {
        return Err(ViscoError::ConfigError(format!(
            "sampling needs a 2D grid, got {}D",
            grid.dim
        )));
    }
    for (k, field) in fields.iter().enumerate() {
        if field.len() != grid.ncells() {
            return Err(ViscoError::FieldShapeMismatch {
                field: format!("field {k}"),
                expected: (grid.ncells(), 1),
                got: (field.len(), 1),
            });
        }
    }
    let lattice = config.lattice()?;
    let mut rows = Array2::zeros((lattice.len(), 2 + fields.len()));
    for i in 0..lattice.nx {
        for j in 0..lattice.ny {
            let (x, y) = lattice.point(i, j);
            let mut row = rows.row_mut(i * lattice.ny + j);
            row[0] = x;
            row[1] = y;
            for (k, field) in fields.iter().enumerate() {
                row[2 + k] = interp2d(*field, grid, x, y);
            }
        }
    }
    Ok(rows)
}

/// Stream rows as `x y f0 f1 …`, one sample per line.
pub fn write_rows<W: Write>(rows: &Array2<f64>, out: &mut W) -> ViscoResult<()> {
    for row in rows.rows() {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    out.flush()?;
    Ok(())
}
