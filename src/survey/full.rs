//! Feature file built from complete (untruncated) light curves.

use std::path::Path;

use tracing::{debug, info};

use crate::domain::Dataset;
use crate::error::AppError;
use crate::io::catalog::list_catalog;
use crate::io::snapshot::{append_record, fmt_float, full_feature_header, meta_fields, write_header};
use crate::survey::Collaborators;

/// Counters from a full-feature run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFileSummary {
    pub processed: usize,
    pub written: usize,
}

/// Fit every catalog object on its full light curve and write one line per
/// object whose fit succeeded in every band.
///
/// `output_file` is truncated first.
pub fn build_full_features(
    raw_dir: &Path,
    output_file: &Path,
    dataset: Dataset,
    tools: &Collaborators,
) -> Result<FeatureFileSummary, AppError> {
    let catalog = list_catalog(raw_dir, dataset)?;
    if let Some(parent) = output_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::filesystem(format!("Failed to create output dir '{}': {e}", parent.display()))
        })?;
    }
    write_header(output_file, &full_feature_header())?;

    let mut summary = FeatureFileSummary {
        processed: 0,
        written: 0,
    };
    for file in &catalog {
        let lc = tools.loader.load(file)?;
        summary.processed += 1;

        let Some(features) = tools.fitter.fit_all(&lc).features() else {
            debug!(id = %lc.id, "incomplete fit, skipped");
            continue;
        };
        let mut fields = meta_fields(&lc);
        fields.extend(features.into_iter().map(fmt_float));
        append_record(output_file, &fields)?;
        summary.written += 1;
    }

    info!(
        processed = summary.processed,
        written = summary.written,
        path = %output_file.display(),
        "full light-curve features written"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::data::write_synthetic_catalog;

    #[test]
    fn synthetic_catalog_yields_full_width_records() {
        let raw = tempfile::tempdir().unwrap();
        write_synthetic_catalog(raw.path(), 3, 7).unwrap();
        let out = tempfile::tempdir().unwrap();
        let path = out.path().join("features").join("full.dat");

        let tools = Collaborators::for_run(Dataset::Snpcc, crate::domain::FeatureMethod::Bazin).unwrap();
        let summary = build_full_features(raw.path(), &path, Dataset::Snpcc, &tools).unwrap();
        assert_eq!(summary.processed, 3);
        assert_eq!(summary.written, 3);

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), full_feature_header());
        for line in lines {
            assert_eq!(line.split(' ').count(), 25);
        }
        assert_eq!(text.lines().count(), summary.written + 1);
    }
}
