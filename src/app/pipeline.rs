//! Shared multi-day simulation workflow.
//!
//! resolve epochs (optional) -> for each day: initialize snapshot -> build features
//!
//! The CLI only parses arguments and prints; everything that touches the
//! catalog or the output directory goes through here.

use std::ops::RangeInclusive;

use tracing::info;

use crate::domain::{DaySummary, RunSummary, Survey};
use crate::error::AppError;
use crate::survey::{Collaborators, EpochOptions, build_one_epoch, create_daily_snapshot, resolve_survey_epochs};

/// Everything a `tds simulate` run needs.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub epoch: EpochOptions,
    pub survey: Survey,
    /// Scan the catalog for its epoch range instead of using `survey`'s bounds.
    pub resolve_epochs: bool,
    pub first_day: Option<u32>,
    /// Defaults to the last day inside the survey.
    pub last_day: Option<u32>,
}

/// Initialize and build every day in `days`, in increasing order.
///
/// Stops at the first failing day; snapshots of earlier days are complete.
pub fn simulate_days(
    survey: &Survey,
    days: RangeInclusive<u32>,
    opts: &EpochOptions,
    tools: &Collaborators,
) -> Result<Vec<DaySummary>, AppError> {
    let mut out = Vec::new();
    for day in days {
        create_daily_snapshot(day, opts)?;
        out.push(build_one_epoch(survey, day, opts, tools)?);
    }
    Ok(out)
}

/// Execute a full simulation run and return its summary.
pub fn run_simulation(config: &SimulationConfig) -> Result<RunSummary, AppError> {
    let opts = &config.epoch;
    opts.validate()?;
    let tools = Collaborators::for_run(opts.dataset, opts.feature_method)?;

    let mut survey = config.survey;
    if config.resolve_epochs {
        resolve_survey_epochs(&mut survey, &opts.raw_dir, opts.dataset, tools.loader.as_ref())?;
    }

    let first = config.first_day.unwrap_or(0);
    let last = config.last_day.unwrap_or_else(|| survey.last_day());
    if first > last {
        return Err(AppError::config(format!(
            "First day {first} is after last day {last}."
        )));
    }
    info!(first, last, min_epoch = survey.min_epoch(), "simulating survey days");

    let days = simulate_days(&survey, first..=last, opts, &tools)?;

    Ok(RunSummary {
        tool: "tds".to_string(),
        dataset: opts.dataset,
        survey,
        criterion: opts.criterion,
        get_cost: opts.cost.is_some(),
        days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::write_synthetic_catalog;
    use crate::io::catalog::list_catalog;

    #[test]
    fn days_run_in_order_with_one_snapshot_each() {
        let raw = tempfile::tempdir().unwrap();
        write_synthetic_catalog(raw.path(), 2, 3).unwrap();
        let out = tempfile::tempdir().unwrap();

        let config = SimulationConfig {
            epoch: EpochOptions::new(raw.path(), out.path()),
            survey: Survey::snpcc(),
            resolve_epochs: false,
            first_day: Some(60),
            last_day: Some(62),
        };
        let run = run_simulation(&config).unwrap();

        let days: Vec<u32> = run.days.iter().map(|d| d.day).collect();
        assert_eq!(days, vec![60, 61, 62]);
        for d in &run.days {
            assert_eq!(d.processed, 2);
            assert!(d.path.is_file());
            assert_eq!(d.cutoff_mjd, Survey::SNPCC_MIN_EPOCH + f64::from(d.day));
        }
        assert_eq!(list_catalog(raw.path(), crate::domain::Dataset::Snpcc).unwrap().len(), 2);
    }

    #[test]
    fn resolved_epochs_replace_default_bounds() {
        let raw = tempfile::tempdir().unwrap();
        write_synthetic_catalog(raw.path(), 2, 5).unwrap();
        let out = tempfile::tempdir().unwrap();

        let config = SimulationConfig {
            epoch: EpochOptions::new(raw.path(), out.path()),
            survey: Survey::snpcc(),
            resolve_epochs: true,
            first_day: Some(0),
            last_day: Some(0),
        };
        let run = run_simulation(&config).unwrap();
        assert!(run.survey.min_epoch() >= Survey::SNPCC_MIN_EPOCH);
        assert_eq!(run.days[0].cutoff_mjd, run.survey.min_epoch());
    }

    #[test]
    fn inverted_day_range_is_rejected() {
        let config = SimulationConfig {
            epoch: EpochOptions::new("raw", "out"),
            survey: Survey::snpcc(),
            resolve_epochs: false,
            first_day: Some(5),
            last_day: Some(4),
        };
        assert!(run_simulation(&config).is_err());
    }
}
