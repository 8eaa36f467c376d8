//! Mathematical primitives for the log-conformation core.

pub mod eigen;
pub mod filter;
pub mod interp;
pub mod limiter;
pub mod logm;
