//! Command-line parsing for the time-domain survey simulator.
//!
//! Parsing and dispatch stay separate from the survey code: this module
//! only declares arguments; `app` turns them into typed options.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Dataset, FeatureMethod, Survey};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "tds", version, about = "Day-by-day time-domain survey simulation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan a raw catalog and print its first and last observation epoch.
    Epochs(EpochsArgs),
    /// Write one feature snapshot per simulated day.
    Simulate(SimulateArgs),
    /// Fit full light curves and write a single feature file.
    Features(FeaturesArgs),
    /// Generate a synthetic SNPCC-format catalog.
    Synth(SynthArgs),
}

/// Raw catalog selection shared by every command that reads light curves.
#[derive(Debug, Args, Clone)]
pub struct CatalogArgs {
    /// Directory holding the raw light-curve files.
    #[arg(long, value_name = "DIR")]
    pub raw_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = Dataset::Snpcc)]
    pub dataset: Dataset,

    #[arg(long, value_enum, default_value_t = FeatureMethod::Bazin)]
    pub features_method: FeatureMethod,
}

#[derive(Debug, Args, Clone)]
pub struct EpochsArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,
}

#[derive(Debug, Args, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Directory receiving the daily snapshots.
    #[arg(long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// First simulated day (offset from the minimum epoch).
    #[arg(long)]
    pub first_day: Option<u32>,

    /// Last simulated day; defaults to the end of the survey.
    #[arg(long)]
    pub last_day: Option<u32>,

    /// Scan the catalog for its epoch range instead of using the SNPCC bounds.
    #[arg(long)]
    pub resolve_epochs: bool,

    /// Objects need strictly more observed points than this.
    #[arg(long, default_value_t = 4)]
    pub min_points: usize,

    /// Queryability criterion: 1 = last observed magnitude, 2 = extrapolate stale data.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(1..=2))]
    pub criterion: u8,

    /// Days without r-band data before criterion 2 extrapolates.
    #[arg(long, default_value_t = 2.0)]
    pub days_since_obs: f64,

    /// Faintest r magnitude still queryable.
    #[arg(long, default_value_t = Survey::SNPCC_MAG_LIM)]
    pub mag_lim: f64,

    /// Compute spectroscopic exposure time per telescope.
    #[arg(long)]
    pub get_cost: bool,

    /// Telescope primary mirror diameters (meters).
    #[arg(long, value_delimiter = ',', default_values_t = [4.0, 8.0])]
    pub tel_sizes: Vec<f64>,

    /// Telescope names, matching `--tel-sizes` one to one.
    #[arg(long, value_delimiter = ',', default_values_t = ["4m".to_string(), "8m".to_string()])]
    pub tel_names: Vec<String>,

    /// Target spectroscopic signal-to-noise.
    #[arg(long, default_value_t = 10.0)]
    pub spec_snr: f64,

    /// Extra exposure-time parameter (repeatable), e.g. `--etc throughput=0.25`.
    #[arg(long = "etc", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub etc: Vec<(String, f64)>,

    /// Report per-object progress at info level.
    #[arg(long)]
    pub screen: bool,

    #[arg(long, default_value = "day_")]
    pub prefix: String,

    #[arg(long, default_value = ".dat")]
    pub suffix: String,

    /// Replace the built-in snapshot header with this line.
    #[arg(long, value_name = "RAW")]
    pub header: Option<String>,

    /// Write a JSON summary of the run.
    #[arg(long, value_name = "PATH")]
    pub summary_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct FeaturesArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Feature file to write.
    #[arg(long, value_name = "FILE")]
    pub output: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Output directory for the generated `DES_SN*.DAT` files.
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    #[arg(short = 'n', long, default_value_t = 50)]
    pub count: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Parse `KEY=VALUE` with a numeric value.
fn parse_key_val(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("value for '{key}' is not a number: '{value}'"))?;
    Ok((key.to_string(), value))
}
