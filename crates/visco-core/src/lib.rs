//! Log-conformation viscoelastic core.
//!
//! Per-cell tensor algebra: tensor, sweep
//! Per-step stages: mixer, advection, deformation, relaxation, stress
//! Seams with the surrounding simulation: engine, refinement, monitor, checkpoint, solver

pub mod advection;
pub mod checkpoint;
pub mod deformation;
pub mod engine;
pub mod mixer;
pub mod monitor;
pub mod refinement;
pub mod relaxation;
pub mod solver;
pub mod stress;
pub mod sweep;
pub mod tensor;
