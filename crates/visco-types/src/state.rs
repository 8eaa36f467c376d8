// ─────────────────────────────────────────────────────────────────────
// Visco Core — State
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{ViscoError, ViscoResult};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Per-cell scalar field (VOF fraction, G(x), λ(x), yield indicator).
pub type ScalarField = Array1<f64>;

/// Uniform Cartesian block of cells as seen through the grid engine.
///
/// Cells are addressed by a flat index `(k * ny + j) * nx + i`; for 2D
/// grids `nz == 1`. Neighbour lookups clamp at the edges, which mirrors a
/// zero-gradient ghost layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub dim: usize,
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    /// Cell size Δ (cells are square/cubic).
    pub delta: f64,
    /// Lower-left(-back) corner of the block.
    pub origin: [f64; 3],
}

impl Grid {
    pub fn new_2d(nx: usize, ny: usize, delta: f64, origin: [f64; 2]) -> Self {
        Grid {
            dim: 2,
            nx,
            ny,
            nz: 1,
            delta,
            origin: [origin[0], origin[1], 0.0],
        }
    }

    pub fn new_3d(nx: usize, ny: usize, nz: usize, delta: f64, origin: [f64; 3]) -> Self {
        Grid {
            dim: 3,
            nx,
            ny,
            nz,
            delta,
            origin,
        }
    }

    pub fn ncells(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Number of cells along `axis` (0 = x, 1 = y, 2 = z).
    pub fn extent(&self, axis: usize) -> usize {
        match axis {
            0 => self.nx,
            1 => self.ny,
            _ => self.nz,
        }
    }

    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.ny + j) * self.nx + i
    }

    pub fn coords(&self, idx: usize) -> [usize; 3] {
        let i = idx % self.nx;
        let j = (idx / self.nx) % self.ny;
        let k = idx / (self.nx * self.ny);
        [i, j, k]
    }

    /// Cell-centre position.
    pub fn center(&self, idx: usize) -> [f64; 3] {
        let c = self.coords(idx);
        let mut x = [0.0; 3];
        for axis in 0..self.dim {
            x[axis] = self.origin[axis] + (c[axis] as f64 + 0.5) * self.delta;
        }
        x
    }

    /// Neighbour of `idx` shifted by `offset` cells along `axis`, clamped
    /// to the block.
    pub fn neighbor(&self, idx: usize, axis: usize, offset: isize) -> usize {
        let mut c = self.coords(idx);
        let n = self.extent(axis) as isize;
        c[axis] = (c[axis] as isize + offset).clamp(0, n - 1) as usize;
        self.index(c[0], c[1], c[2])
    }

    /// True when a step of `offset` along `axis` leaves the block.
    pub fn is_edge(&self, idx: usize, axis: usize, offset: isize) -> bool {
        let c = self.coords(idx)[axis] as isize + offset;
        c < 0 || c >= self.extent(axis) as isize
    }
}

/// How the conformation tensor is stored, fixed once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Representation {
    /// Planar 2D tensor: `[xx, xy, yy]`.
    #[serde(rename = "tensor_2d")]
    Tensor2D,
    /// Axisymmetric 2D (x axial, y radial) plus hoop component:
    /// `[xx, xy, yy, thth]`.
    #[default]
    #[serde(rename = "scalar_2d")]
    Scalar2D,
    /// Full 3D tensor: `[xx, xy, xz, yy, yz, zz]`.
    #[serde(rename = "scalar_3d")]
    Scalar3D,
}

impl Representation {
    pub fn dim(&self) -> usize {
        match self {
            Representation::Tensor2D | Representation::Scalar2D => 2,
            Representation::Scalar3D => 3,
        }
    }

    pub fn n_components(&self) -> usize {
        self.component_names().len()
    }

    pub fn component_names(&self) -> &'static [&'static str] {
        match self {
            Representation::Tensor2D => &["xx", "xy", "yy"],
            Representation::Scalar2D => &["xx", "xy", "yy", "thth"],
            Representation::Scalar3D => &["xx", "xy", "xz", "yy", "yz", "zz"],
        }
    }

    /// Components of the identity tensor in this layout.
    pub fn identity_components(&self) -> &'static [f64] {
        match self {
            Representation::Tensor2D => &[1.0, 0.0, 1.0],
            Representation::Scalar2D => &[1.0, 0.0, 1.0, 1.0],
            Representation::Scalar3D => &[1.0, 0.0, 0.0, 1.0, 0.0, 1.0],
        }
    }

    pub fn is_axisymmetric(&self) -> bool {
        matches!(self, Representation::Scalar2D)
    }

    pub fn tag(&self) -> u8 {
        match self {
            Representation::Tensor2D => 0,
            Representation::Scalar2D => 1,
            Representation::Scalar3D => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Representation::Tensor2D),
            1 => Some(Representation::Scalar2D),
            2 => Some(Representation::Scalar3D),
            _ => None,
        }
    }
}

/// Arena of fixed-size symmetric tensor records, one row per cell.
///
/// Used for the log-conformation, the conformation tensor and the
/// polymeric stress alike.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorField {
    repr: Representation,
    data: Array2<f64>, // [ncells, ncomp]
}

impl TensorField {
    pub fn zeros(repr: Representation, ncells: usize) -> Self {
        TensorField {
            repr,
            data: Array2::zeros((ncells, repr.n_components())),
        }
    }

    pub fn identity(repr: Representation, ncells: usize) -> Self {
        let id = repr.identity_components();
        TensorField {
            repr,
            data: Array2::from_shape_fn((ncells, id.len()), |(_, c)| id[c]),
        }
    }

    /// Fill every `(cell, component)` slot from `f`.
    pub fn from_fn(repr: Representation, ncells: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        TensorField {
            repr,
            data: Array2::from_shape_fn((ncells, repr.n_components()), |(idx, c)| f(idx, c)),
        }
    }

    pub fn from_array(repr: Representation, data: Array2<f64>) -> ViscoResult<Self> {
        if data.ncols() != repr.n_components() {
            return Err(ViscoError::FieldShapeMismatch {
                field: "tensor".to_string(),
                expected: (data.nrows(), repr.n_components()),
                got: data.dim(),
            });
        }
        Ok(TensorField { repr, data })
    }

    pub fn repr(&self) -> Representation {
        self.repr
    }

    pub fn ncells(&self) -> usize {
        self.data.nrows()
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array2<f64> {
        &mut self.data
    }

    pub fn cell(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.data.row(idx)
    }

    pub fn component(&self, comp: usize) -> ArrayView1<'_, f64> {
        self.data.column(comp)
    }

    /// First cell holding a NaN or infinite component.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.data
            .rows()
            .into_iter()
            .position(|row| row.iter().any(|v| !v.is_finite()))
    }
}

/// Cell-centred velocity snapshot handed over by the momentum solver.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityField {
    data: Array2<f64>, // [ncells, dim]
}

impl VelocityField {
    pub fn zeros(ncells: usize, dim: usize) -> Self {
        VelocityField {
            data: Array2::zeros((ncells, dim)),
        }
    }

    pub fn from_array(data: Array2<f64>) -> ViscoResult<Self> {
        if data.ncols() != 2 && data.ncols() != 3 {
            return Err(ViscoError::FieldShapeMismatch {
                field: "velocity".to_string(),
                expected: (data.nrows(), 2),
                got: data.dim(),
            });
        }
        Ok(VelocityField { data })
    }

    /// Build a velocity field by evaluating `f` at every cell centre.
    pub fn from_fn(grid: &Grid, f: impl Fn([f64; 3]) -> [f64; 3]) -> Self {
        let mut data = Array2::zeros((grid.ncells(), grid.dim));
        for idx in 0..grid.ncells() {
            let u = f(grid.center(idx));
            for axis in 0..grid.dim {
                data[[idx, axis]] = u[axis];
            }
        }
        VelocityField { data }
    }

    pub fn dim(&self) -> usize {
        self.data.ncols()
    }

    pub fn ncells(&self) -> usize {
        self.data.nrows()
    }

    pub fn get(&self, idx: usize, axis: usize) -> f64 {
        self.data[[idx, axis]]
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }
}
