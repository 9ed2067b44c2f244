//! Mathematical utilities: parameter grids, weighted least squares, and
//! simplex refinement.

pub mod grid;
pub mod ols;
pub mod simplex;

pub use grid::*;
pub use ols::*;
pub use simplex::*;
