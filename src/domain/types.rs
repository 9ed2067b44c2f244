//! Shared domain types.
//!
//! This module defines:
//!
//! - run selectors (`Dataset`, `FeatureMethod`, `QueryCriterion`)
//! - photometry and light curves (`PhotoPoint`, `LightCurve`)
//! - per-band fit outputs (`BazinParams`, `BazinFit`, `BandFits`)
//! - survey-wide bounds (`Survey`, `EpochRange`)

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Survey the raw light curves come from.
///
/// Only SNPCC is supported; the enum keeps the selector closed so an unknown
/// name fails when configuration is built, not inside the per-object loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Snpcc,
}

impl Dataset {
    pub fn display_name(self) -> &'static str {
        match self {
            Dataset::Snpcc => "SNPCC",
        }
    }

    /// Substring a raw file name must contain to belong to the catalog.
    pub fn catalog_marker(self) -> &'static str {
        match self {
            Dataset::Snpcc => "DES_SN",
        }
    }
}

/// Feature extraction method applied to each band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FeatureMethod {
    Bazin,
}

/// How to decide whether an object is worth spectroscopic follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "criterion", rename_all = "snake_case")]
pub enum QueryCriterion {
    /// Criterion 1: magnitude cut on the last observed r-band point.
    LastObserved,
    /// Criterion 2: as criterion 1 while the last r-band observation is recent
    /// enough, otherwise extrapolate the r-band fit to the cutoff.
    Extrapolated { days_since_obs: f64 },
}

impl QueryCriterion {
    /// Build a criterion from its numeric code (1 or 2).
    ///
    /// `days_since_obs` is only used by criterion 2.
    pub fn from_code(code: u8, days_since_obs: f64) -> Result<Self, AppError> {
        match code {
            1 => Ok(QueryCriterion::LastObserved),
            2 => {
                if !(days_since_obs.is_finite() && days_since_obs >= 0.0) {
                    return Err(AppError::config(format!(
                        "Invalid days-since-observation threshold {days_since_obs} (must be finite and >= 0)."
                    )));
                }
                Ok(QueryCriterion::Extrapolated { days_since_obs })
            }
            other => Err(AppError::config(format!(
                "Unsupported queryable criterion {other}: expected 1 or 2."
            ))),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            QueryCriterion::LastObserved => 1,
            QueryCriterion::Extrapolated { .. } => 2,
        }
    }
}

/// Photometric filter band. Declaration order is the feature-column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Band {
    G,
    R,
    I,
    Z,
}

impl Band {
    pub const ALL: [Band; 4] = [Band::G, Band::R, Band::I, Band::Z];

    pub fn as_str(self) -> &'static str {
        match self {
            Band::G => "g",
            Band::R => "r",
            Band::I => "i",
            Band::Z => "z",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Band::G => 0,
            Band::R => 1,
            Band::I => 2,
            Band::Z => 3,
        }
    }

    pub fn from_token(token: &str) -> Option<Band> {
        match token {
            "g" => Some(Band::G),
            "r" => Some(Band::R),
            "i" => Some(Band::I),
            "z" => Some(Band::Z),
            _ => None,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad supernova class derived from the simulation type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnType {
    Ia,
    Ibc,
    II,
}

impl fmt::Display for SnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SnType::Ia => "Ia",
            SnType::Ibc => "Ibc",
            SnType::II => "II",
        })
    }
}

/// Which sample an object originally belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sample {
    Train,
    Test,
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sample::Train => "train",
            Sample::Test => "test",
        })
    }
}

/// One photometric measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoPoint {
    pub mjd: f64,
    pub band: Band,
    pub flux: f64,
    pub flux_err: f64,
    pub snr: Option<f64>,
    pub mag: f64,
    pub mag_err: Option<f64>,
}

/// A single object's light curve plus static metadata.
///
/// Built fresh from raw storage for every (object, day) view; truncation
/// replaces `photometry` in place and is never undone.
#[derive(Debug, Clone)]
pub struct LightCurve {
    pub id: String,
    pub redshift: f64,
    pub sn_type: SnType,
    /// Raw numeric simulation type code, kept as written in the source file.
    pub sn_code: String,
    pub sample: Sample,
    pub photometry: Vec<PhotoPoint>,
}

impl LightCurve {
    /// Minimum and maximum observation epoch, or `None` without photometry.
    pub fn mjd_range(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for p in &self.photometry {
            lo = lo.min(p.mjd);
            hi = hi.max(p.mjd);
        }
        if lo.is_finite() && hi.is_finite() {
            Some((lo, hi))
        } else {
            None
        }
    }

    /// Keep only the points observed at or before `cutoff`; returns how many survived.
    pub fn truncate_to(&mut self, cutoff: f64) -> usize {
        self.photometry.retain(|p| p.mjd <= cutoff);
        self.photometry.len()
    }

    pub fn band_points(&self, band: Band) -> impl Iterator<Item = &PhotoPoint> {
        self.photometry.iter().filter(move |p| p.band == band)
    }

    /// Latest point in `band` at or before `cutoff` (ties keep the later row).
    pub fn last_observed(&self, band: Band, cutoff: f64) -> Option<&PhotoPoint> {
        self.band_points(band)
            .filter(|p| p.mjd <= cutoff)
            .fold(None, |best: Option<&PhotoPoint>, p| match best {
                Some(b) if b.mjd > p.mjd => Some(b),
                _ => Some(p),
            })
    }
}

/// Bazin parameters for one band, in feature-column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BazinParams {
    pub a: f64,
    pub b: f64,
    pub t0: f64,
    pub tfall: f64,
    pub trise: f64,
}

impl BazinParams {
    pub const NAMES: [&'static str; 5] = ["A", "B", "t0", "tfall", "trise"];

    pub fn to_array(self) -> [f64; 5] {
        [self.a, self.b, self.t0, self.tfall, self.trise]
    }
}

/// A successful single-band fit.
///
/// `t_ref` is the epoch the band's time axis was measured from (its first
/// observation), needed to evaluate the model at an absolute MJD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BazinFit {
    pub params: BazinParams,
    pub t_ref: f64,
}

/// Per-band fit outcome. `None` is the failure sentinel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandFits {
    fits: [Option<BazinFit>; 4],
}

impl BandFits {
    pub fn set(&mut self, band: Band, fit: Option<BazinFit>) {
        self.fits[band.index()] = fit;
    }

    pub fn get(&self, band: Band) -> Option<&BazinFit> {
        self.fits[band.index()].as_ref()
    }

    /// Flattened features (5 per band, g r i z), only when every band fitted.
    pub fn features(&self) -> Option<Vec<f64>> {
        let mut out = Vec::with_capacity(Band::ALL.len() * BazinParams::NAMES.len());
        for fit in &self.fits {
            out.extend_from_slice(&fit.as_ref()?.params.to_array());
        }
        Some(out)
    }
}

/// Outcome of a queryability evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryDecision {
    pub queryable: bool,
    /// Last observed magnitude in the cut band, if any point exists.
    pub last_mag: Option<f64>,
    /// Magnitude the decision was based on (observed or extrapolated).
    pub current_mag: Option<f64>,
}

/// A spectroscopic telescope considered for follow-up cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telescope {
    pub name: String,
    /// Primary mirror diameter in meters.
    pub diameter_m: f64,
}

impl Telescope {
    /// Zip parallel size/name lists; unequal lengths are a configuration error.
    pub fn zip_lists(sizes: &[f64], names: &[String]) -> Result<Vec<Telescope>, AppError> {
        if sizes.len() != names.len() {
            return Err(AppError::config(format!(
                "Telescope sizes ({}) and names ({}) must have the same length.",
                sizes.len(),
                names.len()
            )));
        }
        sizes
            .iter()
            .zip(names)
            .map(|(&diameter_m, name)| {
                if !(diameter_m.is_finite() && diameter_m > 0.0) {
                    return Err(AppError::config(format!(
                        "Invalid diameter {diameter_m} for telescope '{name}' (must be finite and > 0)."
                    )));
                }
                Ok(Telescope {
                    name: name.clone(),
                    diameter_m,
                })
            })
            .collect()
    }
}

/// Open-ended parameters forwarded verbatim to the exposure-time calculator.
pub type ExtraParams = BTreeMap<String, f64>;

/// Global minimum/maximum observation epoch of a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochRange {
    pub min: f64,
    pub max: f64,
}

/// Survey-wide configuration shared by every simulated day.
///
/// Bounds must be resolved (or taken from `Survey::snpcc`) before any day
/// is processed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    min_epoch: f64,
    max_epoch: f64,
    /// Faintest r-band magnitude still allowing a query.
    pub mag_lim: f64,
}

impl Survey {
    pub const SNPCC_MIN_EPOCH: f64 = 56171.0;
    pub const SNPCC_MAX_EPOCH: f64 = 56352.0;
    pub const SNPCC_MAG_LIM: f64 = 24.0;

    pub fn new(min_epoch: f64, max_epoch: f64, mag_lim: f64) -> Result<Self, AppError> {
        if !(min_epoch.is_finite() && max_epoch.is_finite() && min_epoch <= max_epoch) {
            return Err(AppError::config(format!(
                "Invalid survey bounds: min={min_epoch}, max={max_epoch} (must be finite and min <= max)."
            )));
        }
        if !mag_lim.is_finite() {
            return Err(AppError::config("Limiting magnitude must be finite."));
        }
        Ok(Self {
            min_epoch,
            max_epoch,
            mag_lim,
        })
    }

    /// Bounds previously characterized for the SNPCC simulation.
    pub fn snpcc() -> Self {
        Self {
            min_epoch: Self::SNPCC_MIN_EPOCH,
            max_epoch: Self::SNPCC_MAX_EPOCH,
            mag_lim: Self::SNPCC_MAG_LIM,
        }
    }

    pub fn min_epoch(&self) -> f64 {
        self.min_epoch
    }

    pub fn max_epoch(&self) -> f64 {
        self.max_epoch
    }

    pub fn set_bounds(&mut self, range: EpochRange) -> Result<(), AppError> {
        let checked = Survey::new(range.min, range.max, self.mag_lim)?;
        *self = checked;
        Ok(())
    }

    /// Absolute cutoff epoch for a simulated day.
    pub fn cutoff(&self, day: u32) -> f64 {
        self.min_epoch + f64::from(day)
    }

    /// Last day index whose cutoff does not pass `max_epoch`.
    pub fn last_day(&self) -> u32 {
        (self.max_epoch - self.min_epoch).floor().max(0.0) as u32
    }
}

/// Counters for one simulated day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub day: u32,
    pub cutoff_mjd: f64,
    pub cutoff_date: Option<NaiveDate>,
    /// Objects loaded from the catalog.
    pub processed: usize,
    /// Objects written to the snapshot.
    pub survived: usize,
    /// Written objects flagged queryable.
    pub queryable: usize,
    pub path: PathBuf,
}

/// A saved multi-day run summary (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub tool: String,
    pub dataset: Dataset,
    pub survey: Survey,
    pub criterion: QueryCriterion,
    pub get_cost: bool,
    pub days: Vec<DaySummary>,
}

/// Calendar date of a Modified Julian Date (MJD 0 = 1858-11-17).
pub fn mjd_to_date(mjd: f64) -> Option<NaiveDate> {
    if !mjd.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1858, 11, 17)?;
    epoch.checked_add_signed(Duration::days(mjd.floor() as i64))
}
