//! Post-processing of viscoelastic snapshots.
//!
//! Strain-rate invariant, velocity magnitude, regular-grid sampling.

pub mod sampling;
pub mod strain_rate;
