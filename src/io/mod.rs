//! Input/output helpers.
//!
//! - raw SNPCC light-curve ingest (`snpcc`)
//! - catalog discovery (`catalog`)
//! - snapshot/feature file schema and writers (`snapshot`)
//! - JSON run summaries (`summary`)

pub mod catalog;
pub mod snapshot;
pub mod snpcc;
pub mod summary;

pub use catalog::*;
pub use snapshot::*;
pub use snpcc::*;
pub use summary::*;
