//! Magnitude-cut queryability.
//!
//! Criterion 1 looks only at the last observed point in the cut band.
//! Criterion 2 does the same while that point is recent; once it is older
//! than `days_since_obs`, the band's Bazin fit is evaluated at the cutoff
//! and converted to a magnitude instead.

use crate::domain::{Band, BandFits, LightCurve, QueryCriterion, QueryDecision};
use crate::models::bazin;
use crate::survey::QueryabilityEvaluator;

/// Zero point of the SNPCC `FLUXCAL` scale.
pub const FLUXCAL_ZERO_POINT: f64 = 27.5;

#[derive(Debug, Clone, Copy)]
pub struct MagnitudeQueryability {
    pub band: Band,
    pub zero_point: f64,
}

impl Default for MagnitudeQueryability {
    fn default() -> Self {
        Self {
            band: Band::R,
            zero_point: FLUXCAL_ZERO_POINT,
        }
    }
}

impl MagnitudeQueryability {
    /// Magnitude of the band's fitted model at `mjd`, if the flux is positive.
    pub fn extrapolated_mag(&self, fits: &BandFits, mjd: f64) -> Option<f64> {
        let fit = fits.get(self.band)?;
        let flux = bazin(mjd - fit.t_ref, &fit.params);
        if flux.is_finite() && flux > 0.0 {
            Some(self.zero_point - 2.5 * flux.log10())
        } else {
            None
        }
    }
}

impl QueryabilityEvaluator for MagnitudeQueryability {
    fn evaluate(
        &self,
        lc: &LightCurve,
        fits: &BandFits,
        cutoff: f64,
        mag_lim: f64,
        criterion: QueryCriterion,
    ) -> QueryDecision {
        let last = lc.last_observed(self.band, cutoff);
        let last_mag = last.map(|p| p.mag);

        let current_mag = match criterion {
            QueryCriterion::LastObserved => last_mag,
            QueryCriterion::Extrapolated { days_since_obs } => match last {
                Some(p) if cutoff - p.mjd <= days_since_obs => last_mag,
                _ => self.extrapolated_mag(fits, cutoff),
            },
        };

        QueryDecision {
            queryable: passes_cut(current_mag, mag_lim),
            last_mag,
            current_mag,
        }
    }
}

fn passes_cut(mag: Option<f64>, mag_lim: f64) -> bool {
    matches!(mag, Some(m) if m.is_finite() && m > 0.0 && m <= mag_lim)
}
