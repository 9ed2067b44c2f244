//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs the log subscriber
//! - parses CLI arguments into typed options
//! - dispatches to the survey workflow
//! - prints reports and writes the optional JSON summary

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, EpochsArgs, FeaturesArgs, SimulateArgs, SynthArgs};
use crate::domain::{ExtraParams, QueryCriterion, Survey, Telescope};
use crate::error::AppError;
use crate::io::snapshot::{FileNamePattern, SnapshotHeader};
use crate::survey::{Collaborators, CostConfig, EpochOptions};

pub mod pipeline;

/// Entry point for the `tds` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Epochs(args) => handle_epochs(args),
        Command::Simulate(args) => handle_simulate(args),
        Command::Features(args) => handle_features(args),
        Command::Synth(args) => handle_synth(args),
    }
}

/// `RUST_LOG` wins; otherwise info-level output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Ignore an already-installed subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_epochs(args: EpochsArgs) -> Result<(), AppError> {
    let tools = Collaborators::for_run(args.catalog.dataset, args.catalog.features_method)?;
    let range =
        crate::survey::resolve_epoch_range(&args.catalog.raw_dir, args.catalog.dataset, tools.loader.as_ref())?;
    println!("{}", crate::report::format_epoch_range(&range));
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let config = simulation_config_from_args(&args)?;
    let run = pipeline::run_simulation(&config)?;

    println!("{}", crate::report::format_run_summary(&run));

    if let Some(path) = &args.summary_json {
        crate::io::summary::write_summary_json(path, &run)?;
    }
    Ok(())
}

fn handle_features(args: FeaturesArgs) -> Result<(), AppError> {
    let tools = Collaborators::for_run(args.catalog.dataset, args.catalog.features_method)?;
    let summary =
        crate::survey::build_full_features(&args.catalog.raw_dir, &args.output, args.catalog.dataset, &tools)?;
    println!("{}", crate::report::format_feature_summary(&summary));
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let paths = crate::data::write_synthetic_catalog(&args.out, args.count, args.seed)?;
    println!("Wrote {} light curve(s) to {}", paths.len(), args.out.display());
    Ok(())
}

/// Build validated per-day options from CLI arguments.
///
/// Every selector and list pairing is checked here, before any file is read.
pub fn epoch_options_from_args(args: &SimulateArgs) -> Result<EpochOptions, AppError> {
    let criterion = QueryCriterion::from_code(args.criterion, args.days_since_obs)?;

    let cost = if args.get_cost {
        let telescopes = Telescope::zip_lists(&args.tel_sizes, &args.tel_names)?;
        let extra: ExtraParams = args.etc.iter().cloned().collect();
        Some(CostConfig {
            telescopes,
            spec_snr: args.spec_snr,
            extra,
        })
    } else {
        None
    };

    let header = match &args.header {
        Some(raw) => SnapshotHeader::Custom(raw.clone()),
        None => SnapshotHeader::Bazin {
            with_cost: cost.is_some(),
        },
    };

    let opts = EpochOptions {
        raw_dir: args.catalog.raw_dir.clone(),
        output_dir: args.output_dir.clone(),
        dataset: args.catalog.dataset,
        feature_method: args.catalog.features_method,
        min_points: args.min_points,
        criterion,
        cost,
        header,
        pattern: FileNamePattern {
            prefix: args.prefix.clone(),
            suffix: args.suffix.clone(),
        },
        screen: args.screen,
    };
    opts.validate()?;
    Ok(opts)
}

pub fn simulation_config_from_args(args: &SimulateArgs) -> Result<pipeline::SimulationConfig, AppError> {
    let mut survey = Survey::snpcc();
    if !args.mag_lim.is_finite() {
        return Err(AppError::config("Limiting magnitude must be finite."));
    }
    survey.mag_lim = args.mag_lim;

    Ok(pipeline::SimulationConfig {
        epoch: epoch_options_from_args(args)?,
        survey,
        resolve_epochs: args.resolve_epochs,
        first_day: args.first_day,
        last_day: args.last_day,
    })
}
