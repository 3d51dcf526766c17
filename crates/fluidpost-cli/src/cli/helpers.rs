use super::CliError;
use anyhow::Context;
use fluidpost_core::domain::{AnalysisKind, AnalysisRequest, OutputArtifact, PostError};
use fluidpost_core::numerics::temperature_grid;
use fluidpost_core::plot::FigureSize;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub(super) const DEFAULT_CONFIG_FILE: &str = "fluidpost.json";
pub(super) const DEFAULT_DATA_ROOT: &str = ".";
pub(super) const DEFAULT_OUTPUT_ROOT: &str = "figs";

/// Inclusive temperature grid.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct TemperatureRange {
    pub(super) min: f64,
    pub(super) max: f64,
    pub(super) step: f64,
}

impl TemperatureRange {
    pub(super) fn grid(&self) -> Vec<f64> {
        temperature_grid(self.min, self.max, self.step)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(super) struct CliConfig {
    pub(super) data_root: Option<PathBuf>,
    pub(super) output_root: Option<PathBuf>,
    pub(super) temperatures: Option<TemperatureRange>,
    pub(super) figure: Option<FigureSize>,
}

/// Resolved settings shared by every subcommand.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct RunContext {
    pub(super) data_root: PathBuf,
    pub(super) output_root: PathBuf,
    pub(super) temperatures: Option<TemperatureRange>,
    pub(super) figure_size: FigureSize,
}

impl RunContext {
    pub(super) fn request(&self, label: &str, analysis: AnalysisKind) -> AnalysisRequest {
        AnalysisRequest::new(label, analysis, &self.data_root, &self.output_root)
    }
}

/// An explicit `--config` must exist; the default file is optional.
pub(super) fn load_config(explicit: Option<&Path>) -> Result<CliConfig, CliError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !path.is_file() {
                return Ok(CliConfig::default());
            }
            path
        }
    };
    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config '{}'", path.display()))?;
    let config = serde_json::from_str::<CliConfig>(&content)
        .with_context(|| format!("failed to parse config '{}'", path.display()))?;
    debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

pub(super) fn resolve_context(
    config: CliConfig,
    data_root: Option<PathBuf>,
    output_root: Option<PathBuf>,
) -> RunContext {
    RunContext {
        data_root: data_root
            .or(config.data_root)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_ROOT)),
        output_root: output_root
            .or(config.output_root)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_ROOT)),
        temperatures: config.temperatures,
        figure_size: config.figure.unwrap_or_default(),
    }
}

/// `RUST_LOG` wins; otherwise `-v` raises the level from `warn`.
pub(super) fn setup_logging(verbosity: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("off")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(match verbosity {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            })
        })
    };
    // A second initialisation in the same process keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

pub(super) fn print_artifacts(request: &AnalysisRequest, artifacts: &[OutputArtifact]) {
    for artifact in artifacts {
        println!("{}", request.output_path(artifact).display());
    }
}

pub(super) fn require_positive(value: usize, flag: &str) -> Result<usize, CliError> {
    if value == 0 {
        return Err(CliError::Usage(format!(
            "Invalid value '0' for '{flag}'; expected a positive integer."
        )));
    }
    Ok(value)
}

pub(super) fn compute<T>(result: Result<T, PostError>) -> Result<T, CliError> {
    result.map_err(CliError::Compute)
}
