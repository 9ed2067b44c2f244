//! Light-curve model fitting.
//!
//! Responsibilities:
//!
//! - build the `(t0, tfall, trise)` search grid per band
//! - evaluate each candidate with a linear solve for `(A, B)` (parallel)
//! - report per-band parameters or the failure sentinel

pub mod fitter;

pub use fitter::*;
