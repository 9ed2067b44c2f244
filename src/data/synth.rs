//! Synthetic SNPCC-format catalog generation.
//!
//! Each object gets a Bazin-shaped light curve in g, r, i and z with a
//! random peak inside the SNPCC epoch range, observed on a jittered cadence
//! and perturbed with Gaussian flux noise. Output files follow the raw
//! `DES_SN*.DAT` layout so they load through the regular loader.

use std::fs;
use std::path::{Path, PathBuf};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Band, BazinParams, Survey};
use crate::error::{AppError, ErrorKind};
use crate::models::bazin;
use crate::query::FLUXCAL_ZERO_POINT;

/// Magnitude written for non-positive fluxes (SNPCC convention).
const NON_DETECTION_MAG: f64 = 99.0;

/// Type codes drawn for each class (first entry of each SNPCC code set).
const TYPE_CODES: [u32; 3] = [0, 1, 2];

/// Fraction of objects in the spectroscopic (train) sample.
const TRAIN_FRACTION: f64 = 0.2;

/// Write `count` synthetic light curves into `out_dir`; returns their paths.
///
/// The same `seed` always produces byte-identical files.
pub fn write_synthetic_catalog(out_dir: &Path, count: usize, seed: u64) -> Result<Vec<PathBuf>, AppError> {
    if count == 0 {
        return Err(AppError::config("Sample count must be > 0."));
    }
    fs::create_dir_all(out_dir)
        .map_err(|e| AppError::filesystem(format!("Failed to create '{}': {e}", out_dir.display())))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(ErrorKind::Numerical, format!("Noise distribution error: {e}")))?;

    let mut paths = Vec::with_capacity(count);
    for i in 0..count {
        let id = 100_000 + i;
        let text = synthetic_object(id, &mut rng, &normal);
        let path = out_dir.join(format!("DES_SN{id:06}.DAT"));
        fs::write(&path, text)
            .map_err(|e| AppError::filesystem(format!("Failed to write '{}': {e}", path.display())))?;
        paths.push(path);
    }
    Ok(paths)
}

fn synthetic_object(id: usize, rng: &mut StdRng, normal: &Normal<f64>) -> String {
    let start = Survey::SNPCC_MIN_EPOCH;
    let end = Survey::SNPCC_MAX_EPOCH;

    let code = TYPE_CODES[rng.gen_range(0..TYPE_CODES.len())];
    let sntype: i32 = if rng.gen_bool(TRAIN_FRACTION) {
        if code == 0 { 1 } else { 20 + code as i32 }
    } else {
        -9
    };
    let redshift: f64 = rng.gen_range(0.05_f64..1.0);
    let peak: f64 = rng.gen_range(start + 10.0..end - 30.0);
    let shape = BazinParams {
        a: 0.0,
        b: 0.0,
        t0: 0.0,
        tfall: rng.gen_range(10.0_f64..50.0),
        trise: rng.gen_range(1.0_f64..6.0),
    };
    // Fainter with distance.
    let amplitude = rng.gen_range(200.0_f64..2000.0) * (0.3 / redshift.max(0.1)).powi(2);

    let mut obs = Vec::new();
    let mut night = start + rng.gen_range(0.0_f64..4.0);
    while night <= end {
        for (k, band) in Band::ALL.into_iter().enumerate() {
            let mjd = night + 0.01 * k as f64;
            let color = 1.0 - 0.15 * (k as f64 - 1.0).abs();
            let params = BazinParams {
                a: amplitude * color,
                ..shape
            };
            let truth = bazin(mjd - peak, &params);
            let err = 3.0 + 0.05 * truth.abs();
            let flux = truth + err * normal.sample(rng);
            obs.push((mjd, band, flux, err));
        }
        night += rng.gen_range(3.0_f64..7.0);
    }

    let mut text = String::new();
    text.push_str("SURVEY: DES\n");
    text.push_str(&format!("SNID: {id}\n"));
    text.push_str(&format!("SNTYPE: {sntype}\n"));
    text.push_str("FILTERS: griz\n");
    text.push_str(&format!("SIM_REDSHIFT: {redshift:.4}\n"));
    text.push_str(&format!("SIM_NON1a: {code}\n"));
    text.push('\n');
    text.push_str(&format!("NOBS: {}\n", obs.len()));
    text.push_str("VARLIST: MJD FLT FIELD FLUXCAL FLUXCALERR SNR MAG MAGERR\n");
    for (mjd, band, flux, err) in obs {
        let (mag, mag_err) = if flux > 0.0 {
            (FLUXCAL_ZERO_POINT - 2.5 * flux.log10(), 1.0857 * err / flux)
        } else {
            (NON_DETECTION_MAG, 5.0)
        };
        text.push_str(&format!(
            "OBS: {mjd:.3} {band} NULL {flux:.3e} {err:.3e} {:.2} {mag:.3} {mag_err:.3}\n",
            flux / err
        ));
    }
    text.push_str("END:\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dataset, SnType};
    use crate::io::catalog::list_catalog;
    use crate::io::snpcc::SnpccLoader;
    use crate::survey::LightCurveLoader;

    #[test]
    fn generated_files_load_through_the_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_synthetic_catalog(dir.path(), 5, 42).unwrap();
        assert_eq!(paths.len(), 5);
        assert_eq!(list_catalog(dir.path(), Dataset::Snpcc).unwrap(), paths);

        for path in &paths {
            let lc = SnpccLoader.load(path).unwrap();
            let (lo, hi) = lc.mjd_range().unwrap();
            assert!(lo >= Survey::SNPCC_MIN_EPOCH && hi <= Survey::SNPCC_MAX_EPOCH + 0.1);
            for band in Band::ALL {
                assert!(lc.band_points(band).count() > 10);
            }
            assert!(matches!(lc.sn_type, SnType::Ia | SnType::Ibc | SnType::II));
        }
    }

    #[test]
    fn same_seed_same_bytes() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        write_synthetic_catalog(a.path(), 3, 9).unwrap();
        write_synthetic_catalog(b.path(), 3, 9).unwrap();
        let name = "DES_SN100002.DAT";
        assert_eq!(
            fs::read_to_string(a.path().join(name)).unwrap(),
            fs::read_to_string(b.path().join(name)).unwrap()
        );
    }

    #[test]
    fn file_layout_has_header_block_and_terminator() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_synthetic_catalog(dir.path(), 1, 4).unwrap();
        let text = fs::read_to_string(&paths[0]).unwrap();

        assert!(text.starts_with("SURVEY: DES\nSNID: 100000\nSNTYPE: "));
        assert!(text.contains("\n\nNOBS: "));
        assert!(text.ends_with("\nEND:\n"));
        let nobs: usize = text
            .lines()
            .find_map(|l| l.strip_prefix("NOBS: "))
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("OBS: ")).count(), nobs);
    }

    #[test]
    fn zero_count_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_synthetic_catalog(dir.path(), 0, 1).is_err());
    }
}
