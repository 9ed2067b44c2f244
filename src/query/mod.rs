//! Follow-up decisions: magnitude-based queryability and spectroscopic cost.

pub mod exptime;
pub mod magnitude;

pub use exptime::*;
pub use magnitude::*;
