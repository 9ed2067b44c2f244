//! One simulated day: snapshot initialization and feature building.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::domain::{DaySummary, LightCurve, Survey, mjd_to_date};
use crate::error::AppError;
use crate::io::catalog::list_catalog;
use crate::io::snapshot::{SnapshotRecord, append_record, create_daily_file, meta_fields};
use crate::survey::{Collaborators, EpochOptions, MAX_EXPOSURE_SECONDS};

/// Create (or truncate) the snapshot for `day` with the configured header.
///
/// Validates the options first so a bad telescope/header combination fails
/// before the output directory is touched.
pub fn create_daily_snapshot(day: u32, opts: &EpochOptions) -> Result<PathBuf, AppError> {
    opts.validate()?;
    let path = create_daily_file(&opts.output_dir, day, &opts.header, &opts.pattern)?;
    debug!(day, path = %path.display(), "initialized snapshot");
    Ok(path)
}

/// Append a record for every object that survives to `day` into that day's
/// snapshot, which must already exist.
///
/// Objects are processed in catalog order. Any load or write failure aborts
/// the day; records appended before the failure stay in the file.
pub fn build_one_epoch(
    survey: &Survey,
    day: u32,
    opts: &EpochOptions,
    tools: &Collaborators,
) -> Result<DaySummary, AppError> {
    opts.validate()?;

    let path = opts.pattern.path(&opts.output_dir, day);
    if !path.is_file() {
        return Err(AppError::filesystem(format!(
            "Snapshot '{}' does not exist; initialize day {day} first.",
            path.display()
        )));
    }

    let catalog = list_catalog(&opts.raw_dir, opts.dataset)?;
    let cutoff = survey.cutoff(day);

    let mut summary = DaySummary {
        day,
        cutoff_mjd: cutoff,
        cutoff_date: mjd_to_date(cutoff),
        processed: 0,
        survived: 0,
        queryable: 0,
        path: path.clone(),
    };

    for file in &catalog {
        let mut lc = tools.loader.load(file)?;
        summary.processed += 1;

        if let Some(record) = evaluate_object(&mut lc, survey, cutoff, opts, tools) {
            append_record(&path, &record.fields())?;
            summary.survived += 1;
            if record.queryable {
                summary.queryable += 1;
            }
        }

        if opts.screen {
            info!(day, processed = summary.processed, survived = summary.survived, "progress");
        } else {
            debug!(day, processed = summary.processed, survived = summary.survived, "progress");
        }
    }

    info!(
        day,
        cutoff,
        processed = summary.processed,
        survived = summary.survived,
        queryable = summary.queryable,
        "day complete"
    );
    Ok(summary)
}

/// Run one object through the gates for a cutoff; `None` means it is not
/// written.
///
/// Truncates `lc` in place.
pub fn evaluate_object(
    lc: &mut LightCurve,
    survey: &Survey,
    cutoff: f64,
    opts: &EpochOptions,
    tools: &Collaborators,
) -> Option<SnapshotRecord> {
    let observed = lc.truncate_to(cutoff);
    if observed <= opts.min_points {
        return None;
    }

    let fits = tools.fitter.fit_all(lc);
    let Some(features) = fits.features() else {
        debug!(id = %lc.id, cutoff, "incomplete fit, skipped");
        return None;
    };

    let decision = tools
        .queryability
        .evaluate(lc, &fits, cutoff, survey.mag_lim, opts.criterion);

    let mut queryable = decision.queryable;
    let mut costs = Vec::new();
    if let Some(cost) = &opts.cost {
        costs = cost
            .telescopes
            .iter()
            .map(|tel| {
                tools
                    .exposure
                    .exposure_time(tel.diameter_m, cost.spec_snr, decision.current_mag, &cost.extra)
            })
            .collect();
        queryable = costs.iter().any(|&t| t < MAX_EXPOSURE_SECONDS);
    }

    Some(SnapshotRecord {
        meta: meta_fields(lc),
        queryable,
        last_mag: decision.last_mag,
        costs,
        features,
    })
}
