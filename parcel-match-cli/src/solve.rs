//! Solve command implementation for the `parcel-match` CLI.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use parcel_match_core::{Instance, MatchReport, Matcher};
use parcel_match_engine::{GreedyMatcher, GreedyMatcherConfig};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Write};

use crate::fs::{create_utf8_file, file_is_file, open_utf8_file};
use crate::{
    ARG_SOLVE_CONSTRAINED_RESTARTS, ARG_SOLVE_FULL_RESTARTS, ARG_SOLVE_INSTANCE, ARG_SOLVE_OUTPUT,
    ARG_SOLVE_SEED, CliError, ENV_SOLVE_INSTANCE,
};

/// CLI arguments for the `solve` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Match the parcels of a JSON instance (station network, \
                 driver trips and parcels) to driver offers. The report is \
                 printed as JSON unless an output path is given.",
    about = "Match parcels to driver trips"
)]
#[ortho_config(prefix = "PARCEL_MATCH")]
pub(crate) struct SolveArgs {
    /// Path to a JSON file containing the instance.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) instance_path: Option<Utf8PathBuf>,
    /// Write the report to this file instead of stdout.
    #[arg(long = ARG_SOLVE_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Restarts that keep the departures of drivers that carried parcels.
    #[arg(long = ARG_SOLVE_CONSTRAINED_RESTARTS, value_name = "count")]
    #[serde(default)]
    pub(crate) constrained_restarts: Option<usize>,
    /// Restarts that redraw every driver's departure.
    #[arg(long = ARG_SOLVE_FULL_RESTARTS, value_name = "count")]
    #[serde(default)]
    pub(crate) full_restarts: Option<usize>,
    /// Seed for departure redraws.
    #[arg(long = ARG_SOLVE_SEED, value_name = "seed")]
    #[serde(default)]
    pub(crate) seed: Option<u64>,
}

impl SolveArgs {
    pub(crate) fn into_config(self) -> Result<SolveConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SolveConfig::try_from(merged)
    }
}

/// Resolved `solve` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SolveConfig {
    /// Path to the JSON instance file.
    pub(crate) instance_path: Utf8PathBuf,
    /// Report destination; stdout when absent.
    pub(crate) output: Option<Utf8PathBuf>,
    /// Restart settings for the matcher.
    pub(crate) matcher: GreedyMatcherConfig,
}

impl SolveConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        Self::require_existing(&self.instance_path, ARG_SOLVE_INSTANCE)
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field,
                    path: path.to_path_buf(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl TryFrom<SolveArgs> for SolveConfig {
    type Error = CliError;

    fn try_from(args: SolveArgs) -> Result<Self, Self::Error> {
        let instance_path = args.instance_path.ok_or(CliError::MissingArgument {
            field: ARG_SOLVE_INSTANCE,
            env: ENV_SOLVE_INSTANCE,
        })?;

        let defaults = GreedyMatcherConfig::default();
        let matcher = GreedyMatcherConfig {
            constrained_restarts: args
                .constrained_restarts
                .unwrap_or(defaults.constrained_restarts),
            full_restarts: args.full_restarts.unwrap_or(defaults.full_restarts),
            seed: args.seed.unwrap_or(defaults.seed),
        };

        Ok(Self {
            instance_path,
            output: args.output,
            matcher,
        })
    }
}

/// Builds a matcher for the current solve invocation.
pub(super) trait SolveMatcherBuilder {
    fn build(&self, config: &SolveConfig) -> Box<dyn Matcher>;
}

pub(super) struct DefaultSolveMatcherBuilder;

impl SolveMatcherBuilder for DefaultSolveMatcherBuilder {
    fn build(&self, config: &SolveConfig) -> Box<dyn Matcher> {
        Box::new(GreedyMatcher::with_config(config.matcher))
    }
}

pub(super) fn run_solve(args: SolveArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_solve_with(args, &DefaultSolveMatcherBuilder, &mut stdout)
}

pub(super) fn run_solve_with(
    args: SolveArgs,
    builder: &dyn SolveMatcherBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = resolve_solve_config(args)?;
    let report = execute_solve(&config, builder)?;
    match &config.output {
        Some(path) => {
            let mut file = create_utf8_file(path).map_err(|source| CliError::CreateOutput {
                path: path.clone(),
                source,
            })?;
            write_report(&mut file, &report)?;
            log::info!("wrote match report to {path}");
            Ok(())
        }
        None => write_report(writer, &report),
    }
}

fn execute_solve(
    config: &SolveConfig,
    builder: &dyn SolveMatcherBuilder,
) -> Result<MatchReport, CliError> {
    let instance = load_instance(&config.instance_path)?;
    instance
        .validate()
        .map_err(|source| CliError::InvalidInstance {
            path: config.instance_path.clone(),
            source,
        })?;
    log::debug!(
        "loaded {} drivers and {} parcels from {}",
        instance.drivers.len(),
        instance.parcels.len(),
        config.instance_path
    );
    let matcher = builder.build(config);
    let report = matcher
        .solve(&instance)
        .map_err(|source| CliError::Solve { source })?;
    log::info!(
        "assigned {} of {} parcels; objective {:.3}",
        report.assigned_count(),
        report.parcels.len(),
        report.objective
    );
    Ok(report)
}

fn resolve_solve_config(args: SolveArgs) -> Result<SolveConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

/// Loads a JSON-encoded [`Instance`] from disk.
pub(super) fn load_instance(path: &Utf8Path) -> Result<Instance, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenInstance {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::ParseInstance {
        path: path.to_path_buf(),
        source,
    })
}

fn write_report(writer: &mut dyn Write, report: &MatchReport) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(report).map_err(CliError::SerializeReport)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteReport)?;
    writer.write_all(b"\n").map_err(CliError::WriteReport)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SolveConfig, CliError> {
    let merged = SolveArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SolveConfig::try_from(merged)
}
