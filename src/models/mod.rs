//! Parametric light-curve models.
//!
//! Models are implemented as small, pure functions so that fitting and
//! extrapolation code can stay generic.

pub mod model;

pub use model::*;
