mod model;

pub use model::{DensityOfStates, SampleRate, SquareWellSystem, WeightedLnDos};

use super::AnalysisExecutor;
use super::helpers::{ArtifactSink, distinct_methods, load_table, load_table_source, require_methods};
use super::serialization::ColumnFormat;
use crate::domain::{AnalysisKind, AnalysisRequest, OutputArtifact, PostResult};
use crate::plot::{Figure, FigureSize, Series, SeriesStyle};
use crate::style::legend_label;
use std::path::PathBuf;
use tracing::warn;

/// Which view of the flat-histogram runs to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistogramPlot {
    EnergyHistogram,
    /// Runs live under `s{seed:03}/`.
    DensityOfStates { seed: u32 },
    SampleRate,
}

impl HistogramPlot {
    pub const fn kind(self) -> AnalysisKind {
        match self {
            Self::EnergyHistogram => AnalysisKind::EnergyHistogram,
            Self::DensityOfStates { .. } => AnalysisKind::DensityOfStates,
            Self::SampleRate => AnalysisKind::SampleRate,
        }
    }

    const fn kind_placeholder(self) -> &'static str {
        match self {
            Self::EnergyHistogram => "INPUT.HISTOGRAM_KIND",
            Self::DensityOfStates { .. } => "INPUT.DOS_KIND",
            Self::SampleRate => "INPUT.SAMPLES_KIND",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramAnalysis {
    pub plot: HistogramPlot,
    pub system: SquareWellSystem,
    pub methods: Vec<String>,
    pub figure_size: FigureSize,
}

impl HistogramAnalysis {
    pub fn new(plot: HistogramPlot, system: SquareWellSystem, methods: Vec<String>) -> Self {
        Self {
            plot,
            system,
            methods,
            figure_size: FigureSize::default(),
        }
    }

    fn run_file(&self, method: &str, suffix: &str) -> PathBuf {
        let name = format!("{}-{}.dat", self.system.stem(method), suffix);
        match self.plot {
            HistogramPlot::DensityOfStates { seed } => PathBuf::from(format!("s{seed:03}")).join(name),
            _ => PathBuf::from(name),
        }
    }

    fn energy_histograms(
        &self,
        request: &AnalysisRequest,
        sink: &mut ArtifactSink<'_>,
    ) -> PostResult<()> {
        let mut figure = Figure::new(
            format!("Energy histogram for {}", self.system.describe()),
            "E/N",
            "log10 D",
        );
        for method in distinct_methods(&self.methods) {
            let table = load_table(&request.data_path(self.run_file(&method, "E")), 2)?;
            let energy = self.system.energy_per_particle(&table.column(0)?);
            let counts = table.column(1)?;
            sink.columns(
                format!("energy-histogram-{method}.dat"),
                &[&energy, &counts],
                &ColumnFormat::default().header("E/N count"),
            )?;
            let log_counts: Vec<f64> = counts.iter().map(|count| count.log10()).collect();
            figure.push(Series::from_columns(
                legend_label(&method),
                &energy,
                &log_counts,
                SeriesStyle::for_method(&method),
            ));
        }
        sink.figure("energy-histogram.svg", &figure)
    }

    fn densities_of_states(
        &self,
        request: &AnalysisRequest,
        sink: &mut ArtifactSink<'_>,
    ) -> PostResult<()> {
        let mut curves = Vec::new();
        for method in distinct_methods(&self.methods) {
            let histogram = load_table(&request.data_path(self.run_file(&method, "E")), 2)?;
            let weights = load_table(&request.data_path(self.run_file(&method, "lnw")), 2)?;
            let weighted = WeightedLnDos::from_tables(&histogram, &weights)?;
            let dos = DensityOfStates::new(&self.system, &weighted);
            sink.columns(
                format!("dos-{method}.dat"),
                &[
                    &dos.energy_per_particle,
                    &dos.log10_dos,
                    &dos.log10_inverse_weight,
                ],
                &ColumnFormat::default().header("E/N log10(DoS) log10(1/w)"),
            )?;
            curves.push((method, dos));
        }

        let min_log = curves
            .iter()
            .map(|(_, dos)| dos.min_log())
            .fold(0.0, f64::min);
        let floor = if min_log < 0.0 { min_log } else { -1.0 };

        let mut dos_figure = Figure::new(
            format!("Density of states for {}", self.system.describe()),
            "E/N",
            "log10 DoS",
        )
        .with_y_range(floor, 0.0);
        let mut weight_figure = Figure::new(
            format!("Weighting functions for {}", self.system.describe()),
            "E/N",
            "log10 1/w",
        )
        .with_y_range(floor, 0.0);
        for (method, dos) in &curves {
            let style = SeriesStyle::for_method(method);
            dos_figure.push(Series::from_columns(
                legend_label(method),
                &dos.energy_per_particle,
                &dos.log10_dos,
                style,
            ));
            weight_figure.push(Series::from_columns(
                legend_label(method),
                &dos.energy_per_particle,
                &dos.log10_inverse_weight,
                style,
            ));
        }
        sink.figure("dos.svg", &dos_figure)?;
        sink.figure("weights.svg", &weight_figure)
    }

    fn sample_rates(
        &self,
        request: &AnalysisRequest,
        sink: &mut ArtifactSink<'_>,
    ) -> PostResult<()> {
        let mut figure = Figure::new(
            format!("Iterations per sample for {}", self.system.describe()),
            "U/N",
            "log10 iterations per sample",
        );
        for method in distinct_methods(&self.methods) {
            let path = request.data_path(self.run_file(&method, "s"));
            let (source, table) = load_table_source(&path, 2)?;
            let rate = SampleRate::from_source(&self.system, &source, &table)?;
            if !rate.has_samples() {
                warn!(method = %method, "no round trips recorded, skipping method");
                continue;
            }
            sink.columns(
                format!("sample-rate-{method}.dat"),
                &[&rate.energy_per_particle, &rate.iterations_per_sample],
                &ColumnFormat::default().header(format!(
                    "iterations: {}\nE/N iterations/sample",
                    rate.iterations
                )),
            )?;
            let log_rate: Vec<f64> = rate
                .iterations_per_sample
                .iter()
                .map(|value| value.log10())
                .collect();
            figure.push(Series::from_columns(
                legend_label(&method),
                &rate.energy_per_particle,
                &log_rate,
                SeriesStyle::for_method(&method),
            ));
        }
        sink.figure("sample-rate.svg", &figure)
    }
}

impl AnalysisExecutor for HistogramAnalysis {
    fn execute(&self, request: &AnalysisRequest) -> PostResult<Vec<OutputArtifact>> {
        request.expect_kind(self.plot.kind(), self.plot.kind_placeholder())?;
        require_methods(&self.methods, "INPUT.HISTOGRAM_METHODS")?;
        let mut sink = ArtifactSink::new(request, self.figure_size);
        match self.plot {
            HistogramPlot::EnergyHistogram => self.energy_histograms(request, &mut sink)?,
            HistogramPlot::DensityOfStates { .. } => self.densities_of_states(request, &mut sink)?,
            HistogramPlot::SampleRate => self.sample_rates(request, &mut sink)?,
        }
        Ok(sink.finish())
    }
}
