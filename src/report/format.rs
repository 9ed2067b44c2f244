//! Formatted terminal output for simulation runs.
//!
//! Formatting lives here so the survey code only produces counters.

use crate::domain::{DaySummary, EpochRange, QueryCriterion, RunSummary};
use crate::survey::FeatureFileSummary;

/// Run header plus one table row per simulated day.
pub fn format_run_summary(run: &RunSummary) -> String {
    let mut out = String::new();

    out.push_str("=== tds - time-domain survey simulation ===\n");
    out.push_str(&format!("Dataset: {}\n", run.dataset.display_name()));
    out.push_str(&format!(
        "Epochs: [{:.3}, {:.3}] | mag_lim={:.2}\n",
        run.survey.min_epoch(),
        run.survey.max_epoch(),
        run.survey.mag_lim
    ));
    out.push_str(&format!("Criterion: {}\n", fmt_criterion(run.criterion)));
    out.push_str(&format!("Telescope cost: {}\n", if run.get_cost { "on" } else { "off" }));
    out.push('\n');
    out.push_str(&format_day_table(&run.days));

    let written: usize = run.days.iter().map(|d| d.survived).sum();
    let queryable: usize = run.days.iter().map(|d| d.queryable).sum();
    out.push_str(&format!(
        "\n{} day(s), {written} record(s), {queryable} queryable\n",
        run.days.len()
    ));
    out
}

pub fn format_epoch_range(range: &EpochRange) -> String {
    format!(
        "min_epoch={:.3} max_epoch={:.3} span={:.3}d",
        range.min,
        range.max,
        range.max - range.min
    )
}

pub fn format_feature_summary(summary: &FeatureFileSummary) -> String {
    format!(
        "Processed {} light curve(s); wrote {} feature record(s).",
        summary.processed, summary.written
    )
}

fn format_day_table(days: &[DaySummary]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>5} {:>12} {:<10} {:>9} {:>8} {:>9}\n",
        "day", "cutoff_mjd", "date", "processed", "written", "queryable"
    ));
    out.push_str(&format!(
        "{:->5} {:->12} {:-<10} {:->9} {:->8} {:->9}\n",
        "", "", "", "", "", ""
    ));
    for d in days {
        let date = d.cutoff_date.map(|x| x.to_string()).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:>5} {:>12.3} {:<10} {:>9} {:>8} {:>9}\n",
            d.day, d.cutoff_mjd, date, d.processed, d.survived, d.queryable
        ));
    }
    out
}

fn fmt_criterion(c: QueryCriterion) -> String {
    match c {
        QueryCriterion::LastObserved => format!("{} (last observed r magnitude)", c.code()),
        QueryCriterion::Extrapolated { days_since_obs } => {
            format!("{} (extrapolate after {days_since_obs} day(s) without r data)", c.code())
        }
    }
}
