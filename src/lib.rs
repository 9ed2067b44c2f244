//! `td-survey` library crate.
//!
//! The binary (`tds`) is a thin wrapper around this library so that:
//!
//! - the survey workflow is testable without spawning processes
//! - collaborators (loader, fitter, queryability, exposure time) can be swapped
//!   behind their traits

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod query;
pub mod report;
pub mod survey;
