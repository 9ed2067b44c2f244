//! Day-by-day survey simulation.
//!
//! The pipeline for one simulated day:
//! catalog -> load -> truncate to cutoff -> survivorship gate -> fit all bands
//! -> completeness gate -> queryability (+ optional cost) -> append record
//!
//! Every day starts again from the raw files; nothing is carried between
//! days. The external pieces (loader, fitter, queryability, exposure time)
//! sit behind traits so the orchestration can run against stubs.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::domain::{
    BandFits, Dataset, ExtraParams, FeatureMethod, LightCurve, QueryCriterion, QueryDecision, Telescope,
};
use crate::error::AppError;
use crate::fit::{BazinFitter, BazinGrid};
use crate::io::snapshot::{FileNamePattern, SnapshotHeader, cost_column, expected_record_fields};
use crate::io::snpcc::SnpccLoader;
use crate::query::{CcdExposureModel, MagnitudeQueryability};

pub mod daily;
pub mod epochs;
pub mod full;

pub use daily::*;
pub use epochs::*;
pub use full::*;

/// Exposure times at or above this many seconds make a telescope unusable.
pub const MAX_EXPOSURE_SECONDS: f64 = 7200.0;

/// Default survivorship threshold (strictly more points are required).
pub const DEFAULT_MIN_POINTS: usize = 4;

/// Reads one object's raw file into a light curve.
pub trait LightCurveLoader {
    fn load(&self, path: &Path) -> Result<LightCurve, AppError>;
}

/// Fits the brightness model independently per band.
pub trait ModelFitter {
    fn fit_all(&self, lc: &LightCurve) -> BandFits;
}

/// Decides whether an object is worth spectroscopic follow-up at `cutoff`.
pub trait QueryabilityEvaluator {
    fn evaluate(
        &self,
        lc: &LightCurve,
        fits: &BandFits,
        cutoff: f64,
        mag_lim: f64,
        criterion: QueryCriterion,
    ) -> QueryDecision;
}

/// Required spectroscopic exposure time (seconds) for a target.
pub trait ExposureTimeCalculator {
    fn exposure_time(&self, diameter_m: f64, snr: f64, mag: Option<f64>, extra: &ExtraParams) -> f64;
}

/// The concrete collaborators a run uses.
pub struct Collaborators {
    pub loader: Box<dyn LightCurveLoader>,
    pub fitter: Box<dyn ModelFitter>,
    pub queryability: Box<dyn QueryabilityEvaluator>,
    pub exposure: Box<dyn ExposureTimeCalculator>,
}

impl Collaborators {
    /// Wire the implementations matching the dataset and feature method.
    pub fn for_run(dataset: Dataset, method: FeatureMethod) -> Result<Self, AppError> {
        let loader: Box<dyn LightCurveLoader> = match dataset {
            Dataset::Snpcc => Box::new(SnpccLoader),
        };
        let fitter: Box<dyn ModelFitter> = match method {
            FeatureMethod::Bazin => Box::new(BazinFitter::new(BazinGrid::default())?),
        };
        Ok(Self {
            loader,
            fitter,
            queryability: Box::new(MagnitudeQueryability::default()),
            exposure: Box::new(CcdExposureModel::default()),
        })
    }
}

/// Telescope time settings used when cost computation is enabled.
#[derive(Debug, Clone, PartialEq)]
pub struct CostConfig {
    pub telescopes: Vec<Telescope>,
    /// Signal-to-noise the spectrum must reach.
    pub spec_snr: f64,
    /// Forwarded verbatim to the exposure-time calculator.
    pub extra: ExtraParams,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            telescopes: vec![
                Telescope {
                    name: "4m".to_string(),
                    diameter_m: 4.0,
                },
                Telescope {
                    name: "8m".to_string(),
                    diameter_m: 8.0,
                },
            ],
            spec_snr: 10.0,
            extra: ExtraParams::new(),
        }
    }
}

/// Options for building one day's snapshot.
#[derive(Debug, Clone)]
pub struct EpochOptions {
    pub raw_dir: PathBuf,
    pub output_dir: PathBuf,
    pub dataset: Dataset,
    pub feature_method: FeatureMethod,
    /// Objects need strictly more observed points than this.
    pub min_points: usize,
    pub criterion: QueryCriterion,
    /// `Some` enables exposure-time columns and the cost-based queryable flag.
    pub cost: Option<CostConfig>,
    /// Header of the snapshot the records are appended to.
    pub header: SnapshotHeader,
    pub pattern: FileNamePattern,
    /// Report progress counters at info level instead of debug.
    pub screen: bool,
}

impl EpochOptions {
    pub fn new(raw_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            output_dir: output_dir.into(),
            dataset: Dataset::Snpcc,
            feature_method: FeatureMethod::Bazin,
            min_points: DEFAULT_MIN_POINTS,
            criterion: QueryCriterion::LastObserved,
            cost: None,
            header: SnapshotHeader::Bazin { with_cost: false },
            pattern: FileNamePattern::default(),
            screen: false,
        }
    }

    /// Check that records built with these options fit the active header.
    ///
    /// Runs before any file is opened.
    pub fn validate(&self) -> Result<(), AppError> {
        let n_costs = match &self.cost {
            Some(cost) => {
                let mut seen = BTreeSet::new();
                let mut configured = Vec::with_capacity(cost.telescopes.len());
                for tel in &cost.telescopes {
                    if !seen.insert(tel.name.as_str()) {
                        return Err(AppError::config(format!(
                            "Telescope name '{}' is listed more than once.",
                            tel.name
                        )));
                    }
                    let column = cost_column(&tel.name);
                    if !self.header.has_column(&column) {
                        return Err(AppError::config(format!(
                            "Telescope '{}' has no `{column}` column in the snapshot header; \
                             add it to the header before requesting costs.",
                            tel.name
                        )));
                    }
                    configured.push(column);
                }
                let in_header = self.header.cost_columns();
                if in_header != configured {
                    return Err(AppError::config(format!(
                        "Snapshot header lists cost columns [{}] but telescopes are configured as [{}]; \
                         the order must match.",
                        in_header.join(" "),
                        configured.join(" ")
                    )));
                }
                if !(cost.spec_snr.is_finite() && cost.spec_snr > 0.0) {
                    return Err(AppError::config(format!(
                        "Invalid spectroscopic SNR {} (must be finite and > 0).",
                        cost.spec_snr
                    )));
                }
                cost.telescopes.len()
            }
            None => 0,
        };

        let expected = expected_record_fields(n_costs);
        let actual = self.header.field_count();
        if expected != actual {
            return Err(AppError::config(format!(
                "Snapshot header has {actual} columns but records have {expected}."
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn default_options_match_plain_header() {
        EpochOptions::new("raw", "out").validate().unwrap();
    }

    #[test]
    fn cost_requires_named_header_columns() {
        let mut opts = EpochOptions::new("raw", "out");
        opts.cost = Some(CostConfig::default());
        let header_without_8m = SnapshotHeader::Bazin { with_cost: true }.line().replace("cost_8m", "cost_9m");
        opts.header = SnapshotHeader::Custom(header_without_8m);

        let err = opts.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.message().contains("cost_8m"));

        opts.header = SnapshotHeader::Bazin { with_cost: true };
        opts.validate().unwrap();
    }

    #[test]
    fn cost_columns_follow_telescope_order() {
        let mut opts = EpochOptions::new("raw", "out");
        let mut cost = CostConfig::default();
        cost.telescopes.reverse();
        opts.cost = Some(cost);
        opts.header = SnapshotHeader::Bazin { with_cost: true };

        let err = opts.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.message().contains("order"));

        let swapped = SnapshotHeader::Bazin { with_cost: true }
            .line()
            .replace("cost_4m cost_8m", "cost_8m cost_4m");
        opts.header = SnapshotHeader::Custom(swapped);
        opts.validate().unwrap();
    }

    #[test]
    fn duplicate_telescope_names_are_rejected() {
        let mut opts = EpochOptions::new("raw", "out");
        let mut cost = CostConfig::default();
        cost.telescopes[1].name = "4m".to_string();
        opts.cost = Some(cost);
        opts.header = SnapshotHeader::Custom(
            SnapshotHeader::Bazin { with_cost: true }
                .line()
                .replace("cost_8m", "cost_4m"),
        );

        let err = opts.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.message().contains("more than once"));
    }

    #[test]
    fn header_and_record_widths_must_agree() {
        let mut opts = EpochOptions::new("raw", "out");
        opts.header = SnapshotHeader::Bazin { with_cost: true };
        assert_eq!(opts.validate().unwrap_err().kind(), ErrorKind::Config);

        opts.header = SnapshotHeader::Custom("id redshift".to_string());
        assert!(opts.validate().is_err());
    }
}
