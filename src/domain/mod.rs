//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - run selectors (`Dataset`, `FeatureMethod`, `QueryCriterion`)
//! - light curves and photometric points (`LightCurve`, `PhotoPoint`)
//! - fit outputs (`BazinParams`, `BandFits`) and survey bounds (`Survey`)

pub mod types;

pub use types::*;
