//! Epoch range resolution.
//!
//! Scans every catalog object once and records the earliest and latest
//! observation. Needed before simulating any dataset whose bounds are not
//! already known; SNPCC runs can use `Survey::snpcc()` directly.

use std::path::Path;

use tracing::{debug, info};

use crate::domain::{Dataset, EpochRange, Survey};
use crate::error::AppError;
use crate::io::catalog::list_catalog;
use crate::survey::LightCurveLoader;

/// Global minimum and maximum observation epoch across the catalog.
///
/// Load errors are not suppressed: one bad file aborts the scan.
pub fn resolve_epoch_range(
    raw_dir: &Path,
    dataset: Dataset,
    loader: &dyn LightCurveLoader,
) -> Result<EpochRange, AppError> {
    let catalog = list_catalog(raw_dir, dataset)?;

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for (i, path) in catalog.iter().enumerate() {
        let lc = loader.load(path)?;
        let Some((lo, hi)) = lc.mjd_range() else {
            return Err(AppError::load(format!("{}: no photometry", path.display())));
        };
        min = min.min(lo);
        max = max.max(hi);
        debug!(object = i, id = %lc.id, lo, hi, "scanned epochs");
    }

    if !(min.is_finite() && max.is_finite()) {
        return Err(AppError::load(format!(
            "No {} light curves found in '{}'.",
            dataset.display_name(),
            raw_dir.display()
        )));
    }

    info!(objects = catalog.len(), min, max, "resolved survey epoch range");
    Ok(EpochRange { min, max })
}

/// Resolve the epoch range and store it in `survey`.
pub fn resolve_survey_epochs(
    survey: &mut Survey,
    raw_dir: &Path,
    dataset: Dataset,
    loader: &dyn LightCurveLoader,
) -> Result<EpochRange, AppError> {
    let range = resolve_epoch_range(raw_dir, dataset, loader)?;
    survey.set_bounds(range)?;
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::io::snpcc::SnpccLoader;

    fn write_curve(dir: &Path, id: u32, mjds: &[f64]) {
        let mut text = format!(
            "SNID: {id}\nSNTYPE: 1\nSIM_REDSHIFT: 0.2\nSIM_NON1a: 0\nVARLIST: MJD FLT FIELD FLUXCAL FLUXCALERR SNR MAG MAGERR\n"
        );
        for mjd in mjds {
            text.push_str(&format!("OBS: {mjd} r NULL 10.0 1.0 10.0 25.0 0.1\n"));
        }
        std::fs::write(dir.join(format!("DES_SN{id:06}.DAT")), text).unwrap();
    }

    #[test]
    fn range_spans_all_objects_and_updates_survey() {
        let dir = tempfile::tempdir().unwrap();
        write_curve(dir.path(), 1, &[56180.5, 56200.0]);
        write_curve(dir.path(), 2, &[56175.25, 56190.0, 56260.75]);

        let mut survey = Survey::snpcc();
        let range = resolve_survey_epochs(&mut survey, dir.path(), Dataset::Snpcc, &SnpccLoader).unwrap();

        assert_eq!(range, EpochRange { min: 56175.25, max: 56260.75 });
        assert_eq!(survey.min_epoch(), 56175.25);
        assert_eq!(survey.max_epoch(), 56260.75);
    }

    #[test]
    fn malformed_file_aborts_the_scan() {
        let dir = tempfile::tempdir().unwrap();
        write_curve(dir.path(), 1, &[56180.5]);
        std::fs::write(dir.path().join("DES_SN000002.DAT"), "SNID: 2\nOBS: x\n").unwrap();

        let mut survey = Survey::snpcc();
        let err = resolve_survey_epochs(&mut survey, dir.path(), Dataset::Snpcc, &SnpccLoader).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
        assert_eq!(survey, Survey::snpcc());
    }

    #[test]
    fn empty_catalog_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_epoch_range(dir.path(), Dataset::Snpcc, &SnpccLoader).is_err());
    }
}
