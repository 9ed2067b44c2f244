//! Run summary JSON output.
//!
//! The summary records, per simulated day, how many objects were processed,
//! written, and flagged queryable, plus the survey bounds and criterion the
//! run used. The schema is defined by `domain::RunSummary`.

use std::fs::File;
use std::path::Path;

use crate::domain::RunSummary;
use crate::error::AppError;

/// Write a run summary JSON file.
pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::filesystem(format!("Failed to create summary JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::filesystem(format!("Failed to write summary JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DaySummary, Dataset, QueryCriterion, Survey, mjd_to_date};

    #[test]
    fn summary_survives_a_file_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let summary = RunSummary {
            tool: "tds".to_string(),
            dataset: Dataset::Snpcc,
            survey: Survey::snpcc(),
            criterion: QueryCriterion::Extrapolated { days_since_obs: 2.0 },
            get_cost: false,
            days: vec![DaySummary {
                day: 20,
                cutoff_mjd: 56191.0,
                cutoff_date: mjd_to_date(56191.0),
                processed: 10,
                survived: 4,
                queryable: 1,
                path: dir.path().join("day_20.dat"),
            }],
        };

        write_summary_json(&path, &summary).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"criterion\": \"extrapolated\""));

        let back: RunSummary = serde_json::from_str(&text).unwrap();
        assert_eq!(back.days, summary.days);
        assert_eq!(back.criterion, summary.criterion);
    }
}
