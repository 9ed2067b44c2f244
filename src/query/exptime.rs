//! Spectroscopic exposure-time estimate.
//!
//! CCD signal-to-noise equation solved for the exposure time `t`:
//!
//! `SNR² (S t + B t + n_pix σ²) = (S t)²`
//!
//! with source rate `S` and sky rate `B` in photons/s collected by a
//! circular aperture of diameter `D`. The positive root is returned.

use std::f64::consts::PI;

use tracing::debug;

use crate::domain::ExtraParams;
use crate::survey::ExposureTimeCalculator;

/// Instrument and site parameters of the CCD model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CcdExposureModel {
    /// End-to-end efficiency (atmosphere, optics, detector).
    pub throughput: f64,
    /// Photons/s/m² from a magnitude-zero source.
    pub zero_point_rate: f64,
    /// Sky surface brightness (mag/arcsec²).
    pub sky_mag: f64,
    /// Sky area in the extraction aperture (arcsec²).
    pub sky_area: f64,
    /// Read noise per pixel (electrons).
    pub read_noise: f64,
    pub n_pixels: f64,
}

impl Default for CcdExposureModel {
    fn default() -> Self {
        Self {
            throughput: 0.3,
            zero_point_rate: 1e9,
            sky_mag: 21.0,
            sky_area: 1.0,
            read_noise: 5.0,
            n_pixels: 10.0,
        }
    }
}

impl CcdExposureModel {
    /// Copy of `self` with any recognized keys from `extra` applied.
    pub fn with_overrides(&self, extra: &ExtraParams) -> Self {
        let mut out = *self;
        for (key, &value) in extra {
            match key.as_str() {
                "throughput" => out.throughput = value,
                "zero_point_rate" => out.zero_point_rate = value,
                "sky_mag" => out.sky_mag = value,
                "sky_area" => out.sky_area = value,
                "read_noise" => out.read_noise = value,
                "n_pixels" => out.n_pixels = value,
                other => debug!(key = other, value, "ignoring unknown exposure-time parameter"),
            }
        }
        out
    }

    /// Seconds needed to reach `snr` on a source of magnitude `mag`.
    pub fn seconds(&self, diameter_m: f64, snr: f64, mag: f64) -> f64 {
        let area = PI * (diameter_m / 2.0).powi(2);
        let collect = area * self.throughput * self.zero_point_rate;
        let source = collect * 10f64.powf(-0.4 * mag);
        let sky = collect * 10f64.powf(-0.4 * self.sky_mag) * self.sky_area;
        let read = self.n_pixels * self.read_noise * self.read_noise;

        if !(source.is_finite() && source > 0.0) {
            return f64::INFINITY;
        }

        // S² t² - SNR² (S + B) t - SNR² n σ² = 0
        let snr2 = snr * snr;
        let b = snr2 * (source + sky);
        let disc = b * b + 4.0 * source * source * snr2 * read;
        let t = (b + disc.sqrt()) / (2.0 * source * source);
        if t.is_finite() { t } else { f64::INFINITY }
    }
}

impl ExposureTimeCalculator for CcdExposureModel {
    fn exposure_time(&self, diameter_m: f64, snr: f64, mag: Option<f64>, extra: &ExtraParams) -> f64 {
        match mag {
            Some(m) if m.is_finite() => self.with_overrides(extra).seconds(diameter_m, snr, m),
            _ => f64::INFINITY,
        }
    }
}
