//! SNPCC raw light-curve ingest.
//!
//! Each object lives in its own whitespace-delimited text file made of
//! `KEY: value ...` lines. The keys we read:
//!
//! - `SNID:` object identifier
//! - `SNTYPE:` `-9` marks the photometric (test) sample, anything else is train
//! - `SIM_REDSHIFT:` simulated redshift
//! - `SIM_NON1a:` simulation type code (0 = Ia, otherwise an Ibc or II template)
//! - `VARLIST:` column names of the `OBS:` rows
//! - `OBS:` one photometric measurement
//!
//! Everything else is ignored. Any malformed value is a load error naming the
//! file and line; there is no row-level skipping.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::domain::{Band, LightCurve, PhotoPoint, Sample, SnType};
use crate::error::AppError;
use crate::survey::LightCurveLoader;

const IBC_CODES: [u32; 17] = [1, 5, 6, 7, 8, 9, 10, 11, 13, 14, 16, 18, 22, 23, 28, 29, 45];
const II_CODES: [u32; 28] = [
    2, 3, 4, 12, 15, 17, 19, 20, 21, 24, 25, 26, 27, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43,
    44,
];

/// Loader for SNPCC `DES_SN*.DAT` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnpccLoader;

impl LightCurveLoader for SnpccLoader {
    fn load(&self, path: &Path) -> Result<LightCurve, AppError> {
        let text = fs::read_to_string(path)
            .map_err(|e| AppError::load(format!("Failed to read light curve '{}': {e}", path.display())))?;
        parse_snpcc(&text, &path.display().to_string())
    }
}

/// Column positions of the `OBS:` fields we use.
struct Columns {
    mjd: usize,
    band: usize,
    flux: usize,
    flux_err: usize,
    mag: usize,
    snr: Option<usize>,
    mag_err: Option<usize>,
}

impl Columns {
    fn from_varlist(names: &[&str], source: &str, line: usize) -> Result<Self, AppError> {
        let index: HashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        let required = |name: &str| {
            index.get(name).copied().ok_or_else(|| {
                AppError::load(format!("{source}:{line}: VARLIST is missing required column `{name}`"))
            })
        };
        Ok(Self {
            mjd: required("MJD")?,
            band: required("FLT")?,
            flux: required("FLUXCAL")?,
            flux_err: required("FLUXCALERR")?,
            mag: required("MAG")?,
            snr: index.get("SNR").copied(),
            mag_err: index.get("MAGERR").copied(),
        })
    }
}

/// Parse the contents of one SNPCC file. `source` is only used in messages.
pub fn parse_snpcc(text: &str, source: &str) -> Result<LightCurve, AppError> {
    let mut id = None;
    let mut sample = Sample::Train;
    let mut redshift = None;
    let mut type_info = None;
    let mut columns: Option<Columns> = None;
    let mut photometry = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.len() < 2 {
            continue;
        }

        match tokens[0] {
            "SNID:" => id = Some(tokens[1].to_string()),
            "SNTYPE:" => {
                sample = if tokens[1] == "-9" { Sample::Test } else { Sample::Train };
            }
            "SIM_REDSHIFT:" => redshift = Some(parse_f64(tokens[1], "SIM_REDSHIFT", source, line)?),
            "SIM_NON1a:" => type_info = Some((classify_code(tokens[1], source, line)?, tokens[1].to_string())),
            "VARLIST:" => columns = Some(Columns::from_varlist(&tokens[1..], source, line)?),
            "OBS:" => {
                let cols = columns.as_ref().ok_or_else(|| {
                    AppError::load(format!("{source}:{line}: OBS row found before VARLIST"))
                })?;
                photometry.push(parse_obs(&tokens[1..], cols, source, line)?);
            }
            _ => {}
        }
    }

    let id = id.ok_or_else(|| AppError::load(format!("{source}: missing SNID")))?;
    let redshift = redshift.ok_or_else(|| AppError::load(format!("{source}: missing SIM_REDSHIFT")))?;
    let (sn_type, sn_code) = type_info.ok_or_else(|| AppError::load(format!("{source}: missing SIM_NON1a")))?;
    if photometry.is_empty() {
        return Err(AppError::load(format!("{source}: no OBS rows")));
    }

    Ok(LightCurve {
        id,
        redshift,
        sn_type,
        sn_code,
        sample,
        photometry,
    })
}

fn parse_obs(fields: &[&str], cols: &Columns, source: &str, line: usize) -> Result<PhotoPoint, AppError> {
    let get = |i: usize, name: &str| {
        fields
            .get(i)
            .copied()
            .ok_or_else(|| AppError::load(format!("{source}:{line}: OBS row has no `{name}` field")))
    };

    let band_token = get(cols.band, "FLT")?;
    let band = Band::from_token(band_token)
        .ok_or_else(|| AppError::load(format!("{source}:{line}: unknown filter '{band_token}'")))?;

    let snr = match cols.snr {
        Some(i) => Some(parse_f64(get(i, "SNR")?, "SNR", source, line)?),
        None => None,
    };
    let mag_err = match cols.mag_err {
        Some(i) => Some(parse_f64(get(i, "MAGERR")?, "MAGERR", source, line)?),
        None => None,
    };

    Ok(PhotoPoint {
        mjd: parse_f64(get(cols.mjd, "MJD")?, "MJD", source, line)?,
        band,
        flux: parse_f64(get(cols.flux, "FLUXCAL")?, "FLUXCAL", source, line)?,
        flux_err: parse_f64(get(cols.flux_err, "FLUXCALERR")?, "FLUXCALERR", source, line)?,
        snr,
        mag: parse_f64(get(cols.mag, "MAG")?, "MAG", source, line)?,
        mag_err,
    })
}

fn classify_code(token: &str, source: &str, line: usize) -> Result<SnType, AppError> {
    let code: u32 = token
        .parse()
        .map_err(|_| AppError::load(format!("{source}:{line}: invalid SIM_NON1a code '{token}'")))?;
    if code == 0 {
        Ok(SnType::Ia)
    } else if IBC_CODES.contains(&code) {
        Ok(SnType::Ibc)
    } else if II_CODES.contains(&code) {
        Ok(SnType::II)
    } else {
        Err(AppError::load(format!("{source}:{line}: unknown supernova type code {code}")))
    }
}

fn parse_f64(token: &str, name: &str, source: &str, line: usize) -> Result<f64, AppError> {
    token
        .parse::<f64>()
        .map_err(|_| AppError::load(format!("{source}:{line}: invalid `{name}` value '{token}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const SAMPLE: &str = "\
SURVEY: DES
SNID: 848233
SNTYPE: -9
FILTERS: griz
SIM_REDSHIFT: 0.3512
SIM_NON1a: 21

# ============================
NOBS: 3
VARLIST: MJD FLT FIELD FLUXCAL FLUXCALERR SNR MAG MAGERR
OBS: 56194.145 g NULL 7.600e+00 3.875e+00 1.96 25.298 0.554
OBS: 56194.156 r NULL 3.021e+01 4.012e+00 7.53 23.799 0.144
OBS: 56194.167 i NULL -1.5e+00 5.0e+00 -0.30 99.000 5.000
END:
";

    #[test]
    fn parses_header_and_photometry() {
        let lc = parse_snpcc(SAMPLE, "DES_SN848233.DAT").unwrap();
        assert_eq!(lc.id, "848233");
        assert_eq!(lc.sample, Sample::Test);
        assert_eq!(lc.sn_type, SnType::II);
        assert_eq!(lc.sn_code, "21");
        assert!((lc.redshift - 0.3512).abs() < 1e-12);
        assert_eq!(lc.photometry.len(), 3);

        let r = &lc.photometry[1];
        assert_eq!(r.band, Band::R);
        assert!((r.flux - 30.21).abs() < 1e-9);
        assert!((r.mag - 23.799).abs() < 1e-12);
        assert_eq!(r.snr, Some(7.53));
    }

    #[test]
    fn type_codes_map_to_classes() {
        assert_eq!(classify_code("0", "x", 1).unwrap(), SnType::Ia);
        assert_eq!(classify_code("28", "x", 1).unwrap(), SnType::Ibc);
        assert_eq!(classify_code("44", "x", 1).unwrap(), SnType::II);
        assert!(classify_code("46", "x", 1).is_err());
    }

    #[test]
    fn obs_before_varlist_is_rejected() {
        let text = "SNID: 1\nSIM_REDSHIFT: 0.1\nSIM_NON1a: 0\nOBS: 56194.1 g NULL 1 1 1 25 1\n";
        let err = parse_snpcc(text, "bad.DAT").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
        assert!(err.message().contains("before VARLIST"));
    }

    #[test]
    fn malformed_number_names_file_and_line() {
        let text = SAMPLE.replace("3.021e+01", "thirty");
        let err = parse_snpcc(&text, "DES_SN848233.DAT").unwrap_err();
        assert!(err.message().starts_with("DES_SN848233.DAT:12:"), "{}", err.message());
    }

    #[test]
    fn file_without_observations_is_malformed() {
        let text = "SNID: 1\nSIM_REDSHIFT: 0.1\nSIM_NON1a: 0\nVARLIST: MJD FLT FLUXCAL FLUXCALERR MAG\n";
        assert!(parse_snpcc(text, "empty.DAT").is_err());
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = SnpccLoader.load(Path::new("/nonexistent/DES_SN000001.DAT")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
    }
}
