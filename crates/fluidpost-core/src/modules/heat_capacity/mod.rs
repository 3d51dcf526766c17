//! Heat-capacity convergence of Lennard-Jones cluster runs.
//!
//! Each run writes `<base>.time`, `<base>.energy` and `<base>.entropy`, the
//! latter holding one entropy estimate per saved time. The first run is the
//! benchmark every other run is scored against.

use super::AnalysisExecutor;
use super::helpers::{ArtifactSink, load_table};
use super::serialization::ColumnFormat;
use crate::domain::{AnalysisKind, AnalysisRequest, OutputArtifact, PostError, PostResult};
use crate::numerics::{heat_capacity, temperature_grid};
use crate::plot::{Figure, FigureSize, Series, SeriesStyle};
use crate::style::palette;
use crate::table::NumericTable;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_ATOMS: usize = 31;
pub const DEFAULT_MIN_TIME: f64 = 1.0e7;
pub const DEFAULT_SAVE_TIME: f64 = 1.0e12;

pub fn default_temperatures() -> Vec<f64> {
    temperature_grid(0.01, 0.06, 0.0005)
}

/// Saved entropy history of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct EntropyRun {
    pub name: String,
    pub times: Vec<f64>,
    pub energies: Vec<f64>,
    /// One row per saved time, one column per energy.
    pub entropy: NumericTable,
}

fn flattened(table: &NumericTable) -> Vec<f64> {
    table.rows().flat_map(|row| row.iter().copied()).collect()
}

impl EntropyRun {
    pub fn load(base: &Path) -> PostResult<Self> {
        let with_extension = |extension: &str| {
            let mut path = base.as_os_str().to_owned();
            path.push(".");
            path.push(extension);
            PathBuf::from(path)
        };
        let times = flattened(&load_table(&with_extension("time"), 1)?);
        let energies = flattened(&load_table(&with_extension("energy"), 1)?);
        let entropy = load_table(&with_extension("entropy"), 1)?;
        if times.len() < entropy.row_count() {
            return Err(PostError::input_validation(
                "INPUT.LJ_TIME_ROWS",
                format!(
                    "{}: {} saved times for {} entropy rows",
                    base.display(),
                    times.len(),
                    entropy.row_count()
                ),
            ));
        }
        let name = base
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| base.display().to_string());
        Ok(Self {
            name,
            times,
            energies,
            entropy,
        })
    }

    pub fn final_entropy(&self) -> PostResult<&[f64]> {
        self.entropy.last_row().ok_or_else(|| {
            PostError::input_validation(
                "INPUT.TABLE_EMPTY",
                format!("run '{}' saved no entropy", self.name),
            )
        })
    }
}

/// Error of a heat-capacity curve against the benchmark, skipping the
/// lowest temperature in the mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveError {
    pub mean: f64,
    pub max: f64,
}

pub fn curve_error(benchmark: &[f64], estimate: &[f64]) -> CurveError {
    let deviations: Vec<f64> = benchmark
        .iter()
        .zip(estimate)
        .map(|(bench, value)| (bench - value).abs())
        .collect();
    let tail = deviations.get(1..).unwrap_or(&[]);
    CurveError {
        mean: if tail.is_empty() {
            f64::NAN
        } else {
            tail.iter().sum::<f64>() / tail.len() as f64
        },
        max: deviations.iter().copied().fold(0.0, f64::max),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeatCapacityAnalysis {
    /// Run bases relative to the data root; the first is the benchmark.
    pub runs: Vec<PathBuf>,
    pub temperatures: Vec<f64>,
    pub atoms: usize,
    pub min_time: f64,
    pub save_time: f64,
    pub figure_size: FigureSize,
}

impl HeatCapacityAnalysis {
    pub fn new(runs: Vec<PathBuf>) -> Self {
        Self {
            runs,
            temperatures: default_temperatures(),
            atoms: DEFAULT_ATOMS,
            min_time: DEFAULT_MIN_TIME,
            save_time: DEFAULT_SAVE_TIME,
            figure_size: FigureSize::default(),
        }
    }

    /// Equipartition contribution of the kinetic energy.
    pub fn kinetic_offset(&self) -> f64 {
        1.5 * self.atoms as f64
    }

    fn heat_capacity(&self, run: &EntropyRun, entropy: &[f64]) -> PostResult<Vec<f64>> {
        heat_capacity(
            &self.temperatures,
            &run.energies,
            entropy,
            self.kinetic_offset(),
        )
        .map_err(|error| {
            PostError::new(
                error.category(),
                error.placeholder(),
                format!("run '{}': {}", run.name, error.message()),
            )
        })
    }
}

impl AnalysisExecutor for HeatCapacityAnalysis {
    fn execute(&self, request: &AnalysisRequest) -> PostResult<Vec<OutputArtifact>> {
        request.expect_kind(AnalysisKind::HeatCapacity, "INPUT.HEAT_CAPACITY_KIND")?;
        let Some(benchmark_base) = self.runs.first() else {
            return Err(PostError::input_validation(
                "INPUT.HEAT_CAPACITY_RUNS",
                "at least one run (the benchmark) is required",
            ));
        };
        let mut sink = ArtifactSink::new(request, self.figure_size);
        let curve_format = ColumnFormat::with_precision(4).header("T CV");

        let benchmark_run = EntropyRun::load(&request.data_path(benchmark_base))?;
        let benchmark = self.heat_capacity(&benchmark_run, benchmark_run.final_entropy()?)?;
        sink.columns("bench-cv.txt", &[&self.temperatures, &benchmark], &curve_format)?;

        let mut figure = Figure::new("Heat capacity error", "log10 time", "log10 CV error");
        for (index, base) in self.runs.iter().enumerate() {
            let run = if index == 0 {
                benchmark_run.clone()
            } else {
                EntropyRun::load(&request.data_path(base))?
            };

            let mut times = Vec::new();
            let mut mean_errors = Vec::new();
            let mut max_errors = Vec::new();
            for (row, entropy) in run.entropy.rows().enumerate() {
                let time = run.times[row];
                if time < self.min_time {
                    continue;
                }
                let estimate = self.heat_capacity(&run, entropy)?;
                let error = curve_error(&benchmark, &estimate);
                debug!(run = %run.name, time, mean = error.mean, max = error.max, "scored entropy");
                times.push(time);
                mean_errors.push(error.mean);
                max_errors.push(error.max);
                if time == self.save_time {
                    sink.columns(
                        format!("{}-cv.txt", run.name),
                        &[&self.temperatures, &estimate],
                        &curve_format,
                    )?;
                }
            }
            info!(run = %run.name, scored = times.len(), "scored run against benchmark");
            sink.columns(
                format!("{}-cv-error.txt", run.name),
                &[&times, &mean_errors, &max_errors],
                &ColumnFormat::with_precision(3).header("time mean max"),
            )?;

            let log_times: Vec<f64> = times.iter().map(|t| t.log10()).collect();
            let log_errors: Vec<f64> = mean_errors.iter().map(|e| e.log10()).collect();
            figure.push(Series::from_columns(
                run.name.clone(),
                &log_times,
                &log_errors,
                SeriesStyle::line(palette(index)),
            ));
        }
        sink.figure("cv-error.svg", &figure)?;
        Ok(sink.finish())
    }
}
