//! Daily snapshot files: schema, header initialization, and record output.
//!
//! A snapshot is a space-delimited text file: one header line followed by
//! one line per surviving object. The column layout extends the
//! full-light-curve feature file (`id redshift type code orig_sample` + 20
//! Bazin columns) with `queryable last_rmag` and optional `cost_<telescope>`
//! columns.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::{Band, BazinParams, LightCurve};
use crate::error::AppError;

/// Object metadata columns shared by every feature file.
pub const META_COLUMNS: [&str; 5] = ["id", "redshift", "type", "code", "orig_sample"];

/// Columns the daily snapshots add after the metadata.
pub const QUERY_COLUMNS: [&str; 2] = ["queryable", "last_rmag"];

/// Telescopes named in the built-in cost header.
pub const DEFAULT_COST_TELESCOPES: [&str; 2] = ["4m", "8m"];

/// Prefix of the per-telescope exposure-time columns.
pub const COST_PREFIX: &str = "cost_";

/// Header column holding the exposure time for telescope `name`.
pub fn cost_column(name: &str) -> String {
    format!("{COST_PREFIX}{name}")
}

/// Header written at the top of a daily snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotHeader {
    /// Built-in Bazin layout, optionally with `cost_4m cost_8m` after `last_rmag`.
    Bazin { with_cost: bool },
    /// Caller-supplied header line, written verbatim (a trailing newline is
    /// not doubled).
    Custom(String),
}

impl SnapshotHeader {
    /// Header line without the trailing newline.
    pub fn line(&self) -> String {
        match self {
            SnapshotHeader::Bazin { with_cost } => {
                let mut cols: Vec<String> = META_COLUMNS.iter().map(|c| c.to_string()).collect();
                cols.extend(QUERY_COLUMNS.iter().map(|c| c.to_string()));
                if *with_cost {
                    cols.extend(DEFAULT_COST_TELESCOPES.iter().map(|t| cost_column(t)));
                }
                cols.extend(bazin_feature_columns());
                cols.join(" ")
            }
            SnapshotHeader::Custom(raw) => raw.trim_end_matches(['\r', '\n']).to_string(),
        }
    }

    pub fn field_count(&self) -> usize {
        self.line().split_whitespace().count()
    }

    /// True when `token` appears as a whole header column.
    pub fn has_column(&self, token: &str) -> bool {
        self.line().split_whitespace().any(|c| c == token)
    }

    /// `cost_*` columns in header order.
    pub fn cost_columns(&self) -> Vec<String> {
        self.line()
            .split_whitespace()
            .filter(|c| c.starts_with(COST_PREFIX))
            .map(str::to_string)
            .collect()
    }
}

/// `gA gB gt0 gtfall gtrise rA ... ztrise`.
pub fn bazin_feature_columns() -> Vec<String> {
    let mut cols = Vec::with_capacity(Band::ALL.len() * BazinParams::NAMES.len());
    for band in Band::ALL {
        for name in BazinParams::NAMES {
            cols.push(format!("{band}{name}"));
        }
    }
    cols
}

/// Header of the full-light-curve feature file.
pub fn full_feature_header() -> String {
    let mut cols: Vec<String> = META_COLUMNS.iter().map(|c| c.to_string()).collect();
    cols.extend(bazin_feature_columns());
    cols.join(" ")
}

/// How snapshot files are named inside the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNamePattern {
    pub prefix: String,
    pub suffix: String,
}

impl Default for FileNamePattern {
    fn default() -> Self {
        Self {
            prefix: "day_".to_string(),
            suffix: ".dat".to_string(),
        }
    }
}

impl FileNamePattern {
    pub fn path(&self, output_dir: &Path, day: u32) -> PathBuf {
        output_dir.join(format!("{}{day}{}", self.prefix, self.suffix))
    }
}

/// Create (or truncate) the snapshot for `day` and write only its header.
///
/// Existing content for the same day is erased: calling this twice leaves a
/// single header line. Returns the snapshot path.
pub fn create_daily_file(
    output_dir: &Path,
    day: u32,
    header: &SnapshotHeader,
    pattern: &FileNamePattern,
) -> Result<PathBuf, AppError> {
    fs::create_dir_all(output_dir).map_err(|e| {
        AppError::filesystem(format!("Failed to create output dir '{}': {e}", output_dir.display()))
    })?;

    let path = pattern.path(output_dir, day);
    write_header(&path, &header.line())?;
    Ok(path)
}

/// Truncate `path` and write `header` as its only line.
pub fn write_header(path: &Path, header: &str) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::filesystem(format!("Failed to create '{}': {e}", path.display())))?;
    writeln!(file, "{header}")
        .map_err(|e| AppError::filesystem(format!("Failed to write header to '{}': {e}", path.display())))?;
    Ok(())
}

/// Append one record line to an existing feature file.
///
/// The file is opened and closed per record so that everything written
/// before a later failure stays on disk. The file must already exist.
pub fn append_record(path: &Path, fields: &[String]) -> Result<(), AppError> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| AppError::filesystem(format!("Failed to open '{}' for append: {e}", path.display())))?;
    writeln!(file, "{}", fields.join(" "))
        .map_err(|e| AppError::filesystem(format!("Failed to append to '{}': {e}", path.display())))?;
    Ok(())
}

/// One snapshot line for a surviving object.
#[derive(Debug, Clone)]
pub struct SnapshotRecord {
    pub meta: Vec<String>,
    pub queryable: bool,
    pub last_mag: Option<f64>,
    /// Exposure times in configured telescope order (empty without cost).
    pub costs: Vec<f64>,
    pub features: Vec<f64>,
}

impl SnapshotRecord {
    pub fn fields(&self) -> Vec<String> {
        let mut out = self.meta.clone();
        out.push(fmt_bool(self.queryable));
        out.push(fmt_opt(self.last_mag));
        out.extend(self.costs.iter().map(|&c| fmt_float(c)));
        out.extend(self.features.iter().map(|&f| fmt_float(f)));
        out
    }
}

/// `id redshift type code orig_sample` for one object.
pub fn meta_fields(lc: &LightCurve) -> Vec<String> {
    vec![
        lc.id.clone(),
        fmt_float(lc.redshift),
        lc.sn_type.to_string(),
        lc.sn_code.clone(),
        lc.sample.to_string(),
    ]
}

/// Record field count a snapshot holds for `n_costs` telescopes.
pub fn expected_record_fields(n_costs: usize) -> usize {
    META_COLUMNS.len() + QUERY_COLUMNS.len() + n_costs + Band::ALL.len() * BazinParams::NAMES.len()
}

/// Shortest round-trip form; integral values keep a trailing `.0`.
pub fn fmt_float(v: f64) -> String {
    format!("{v:?}")
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(fmt_float).unwrap_or_else(|| "None".to_string())
}

fn fmt_bool(v: bool) -> String {
    let s = if v { "True" } else { "False" };
    s.to_string()
}
