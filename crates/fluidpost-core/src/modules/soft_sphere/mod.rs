//! Soft-sphere Monte Carlo sweeps over reduced density and temperature.

mod model;

pub use model::{EnergyDistribution, PDF_POINTS, SoftSphereGrid, diffusion, pressure};

use super::AnalysisExecutor;
use super::helpers::{ArtifactSink, load_table};
use super::serialization::{ColumnFormat, float_label};
use crate::domain::{AnalysisKind, AnalysisRequest, OutputArtifact, PostError, PostResult};
use crate::plot::{Figure, FigureSize, Series, SeriesStyle};
use crate::style::palette;
use crate::table::NumericTable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SoftSpherePlot {
    Pressure,
    EnergyPdf,
    Diffusion,
    Radial,
}

impl SoftSpherePlot {
    pub const ALL: [Self; 4] = [Self::Pressure, Self::EnergyPdf, Self::Diffusion, Self::Radial];

    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Pressure => "press",
            Self::EnergyPdf => "energy",
            Self::Diffusion => "dif",
            Self::Radial => "radial",
        }
    }

    pub const fn stem(self) -> &'static str {
        match self {
            Self::Pressure => "soft-pressure",
            Self::EnergyPdf => "soft-energy-pdf",
            Self::Diffusion => "soft-diffusion",
            Self::Radial => "soft-radial",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoftSphereAnalysis {
    pub plots: Vec<SoftSpherePlot>,
    pub grid: SoftSphereGrid,
    pub figure_size: FigureSize,
}

impl Default for SoftSphereAnalysis {
    fn default() -> Self {
        Self::new(SoftSpherePlot::ALL.to_vec())
    }
}

/// Long-format rows `density T ...` shared by every plot kind.
#[derive(Default)]
struct LongTable {
    columns: Vec<Vec<f64>>,
}

impl LongTable {
    fn push(&mut self, row: &[f64]) {
        if self.columns.is_empty() {
            self.columns = vec![Vec::new(); row.len()];
        }
        for (column, value) in self.columns.iter_mut().zip(row) {
            column.push(*value);
        }
    }

    fn write(&self, sink: &mut ArtifactSink<'_>, name: String, header: &str) -> PostResult<()> {
        let columns: Vec<&[f64]> = self.columns.iter().map(Vec::as_slice).collect();
        sink.columns(name, &columns, &ColumnFormat::default().header(header))
    }
}

impl SoftSphereAnalysis {
    pub fn new(plots: Vec<SoftSpherePlot>) -> Self {
        Self {
            plots,
            grid: SoftSphereGrid::default(),
            figure_size: FigureSize::default(),
        }
    }

    fn data_file(
        &self,
        request: &AnalysisRequest,
        density: f64,
        temperature: f64,
        plot: SoftSpherePlot,
    ) -> PathBuf {
        request.data_path(format!(
            "{}-{}.dat",
            SoftSphereGrid::prefix(density, temperature),
            plot.suffix()
        ))
    }

    fn pressure(&self, request: &AnalysisRequest, sink: &mut ArtifactSink<'_>) -> PostResult<()> {
        let temperatures = self.grid.temperatures();
        let mut table = LongTable::default();
        let mut figure = Figure::new("Pressure", "T", "log10 p");
        for (index, density) in self.grid.densities().into_iter().enumerate() {
            let mut points = Vec::with_capacity(temperatures.len());
            for &temperature in &temperatures {
                let path = self.data_file(request, density, temperature, SoftSpherePlot::Pressure);
                let value = pressure(&load_table(&path, 1)?)?;
                table.push(&[density, temperature, value]);
                points.push((temperature, value.log10()));
            }
            figure.push(Series::new(
                format!("n*={}", float_label(density)),
                points,
                SeriesStyle::line(palette(index)),
            ));
        }
        table.write(sink, format!("{}.dat", SoftSpherePlot::Pressure.stem()), "n T p")?;
        sink.figure(format!("{}.svg", SoftSpherePlot::Pressure.stem()), &figure)
    }

    fn energy_pdf(&self, request: &AnalysisRequest, sink: &mut ArtifactSink<'_>) -> PostResult<()> {
        let temperatures = self.grid.temperatures();
        let mut table = LongTable::default();
        let mut panels = Vec::new();
        for density in self.grid.densities() {
            let mut figure = Figure::new(
                format!("Energy distribution at n*={}", float_label(density)),
                "E",
                "P(E)",
            );
            for (index, &temperature) in temperatures.iter().enumerate() {
                let path = self.data_file(request, density, temperature, SoftSpherePlot::EnergyPdf);
                let distribution = EnergyDistribution::from_moments(&load_table(&path, 1)?)
                    .map_err(|error| {
                        PostError::new(
                            error.category(),
                            error.placeholder(),
                            format!("{}: {}", path.display(), error.message()),
                        )
                    })?;
                table.push(&[density, temperature, distribution.mean, distribution.sigma]);
                let (energies, density_values) = distribution.curve();
                figure.push(Series::from_columns(
                    format!("T={}", float_label(temperature)),
                    &energies,
                    &density_values,
                    SeriesStyle::line(palette(index)),
                ));
            }
            panels.push(figure);
        }
        table.write(sink, format!("{}.dat", SoftSpherePlot::EnergyPdf.stem()), "n T mean sigma")?;
        sink.panels(format!("{}.svg", SoftSpherePlot::EnergyPdf.stem()), &panels)
    }

    /// One panel per density with a curve per temperature; used by both
    /// the diffusion and radial plots.
    fn curves<F>(
        &self,
        request: &AnalysisRequest,
        sink: &mut ArtifactSink<'_>,
        plot: SoftSpherePlot,
        axes: (&str, &str),
        header: &str,
        extract: F,
    ) -> PostResult<()>
    where
        F: Fn(&NumericTable) -> PostResult<(Vec<f64>, Vec<f64>)>,
    {
        let temperatures = self.grid.temperatures();
        let mut table = LongTable::default();
        let mut panels = Vec::new();
        for density in self.grid.densities() {
            let mut figure = Figure::new(
                format!("n*={}", float_label(density)),
                axes.0,
                axes.1,
            );
            for (index, &temperature) in temperatures.iter().enumerate() {
                let path = self.data_file(request, density, temperature, plot);
                let (x, y) = extract(&load_table(&path, 2)?)?;
                for (x, y) in x.iter().zip(&y) {
                    table.push(&[density, temperature, *x, *y]);
                }
                figure.push(Series::from_columns(
                    format!("T={}", float_label(temperature)),
                    &x,
                    &y,
                    SeriesStyle::line(palette(index)),
                ));
            }
            panels.push(figure);
        }
        table.write(sink, format!("{}.dat", plot.stem()), header)?;
        sink.panels(format!("{}.svg", plot.stem()), &panels)
    }
}

impl AnalysisExecutor for SoftSphereAnalysis {
    fn execute(&self, request: &AnalysisRequest) -> PostResult<Vec<OutputArtifact>> {
        request.expect_kind(AnalysisKind::SoftSphere, "INPUT.SOFT_KIND")?;
        if self.grid.densities().is_empty() || self.grid.temperatures().is_empty() {
            return Err(PostError::input_validation(
                "INPUT.SOFT_GRID",
                "the density or temperature grid is empty",
            ));
        }
        let mut sink = ArtifactSink::new(request, self.figure_size);
        let mut seen = Vec::new();
        for &plot in &self.plots {
            if seen.contains(&plot) {
                continue;
            }
            seen.push(plot);
            match plot {
                SoftSpherePlot::Pressure => self.pressure(request, &mut sink)?,
                SoftSpherePlot::EnergyPdf => self.energy_pdf(request, &mut sink)?,
                SoftSpherePlot::Diffusion => self.curves(
                    request,
                    &mut sink,
                    plot,
                    ("log10 iterations", "D"),
                    "n T log10(iterations) D",
                    diffusion,
                )?,
                SoftSpherePlot::Radial => self.curves(
                    request,
                    &mut sink,
                    plot,
                    ("r", "count"),
                    "n T r count",
                    |table| Ok((table.column(0)?, table.column(1)?)),
                )?,
            }
            info!(plot = plot.stem(), "rendered soft-sphere plot");
        }
        Ok(sink.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::{SoftSphereAnalysis, SoftSphereGrid, SoftSpherePlot};
    use crate::domain::{AnalysisKind, AnalysisRequest};
    use crate::modules::AnalysisExecutor;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn small_grid() -> SoftSphereGrid {
        SoftSphereGrid {
            density_min: 0.1,
            density_max: 2.0,
            density_step: 1.0,
            temperature_min: 0.5,
            temperature_max: 0.6,
            temperature_step: 0.1,
        }
    }

    fn write(dir: &Path, density: &str, suffix: &str, content: &str) {
        fs::write(dir.join(format!("ff-{density}_temp-0.5-{suffix}.dat")), content)
            .expect("fixture");
    }

    #[test]
    fn pressure_and_radial_tables_are_long_format() {
        let temp = TempDir::new().expect("tempdir should be created");
        for (density, value) in [("0.1", "2.0"), ("1.1", "4.0")] {
            write(temp.path(), density, "press", &format!("{value}\n"));
            write(temp.path(), density, "radial", "0.5 1\n1.0 3\n");
        }
        let mut analysis =
            SoftSphereAnalysis::new(vec![SoftSpherePlot::Pressure, SoftSpherePlot::Radial]);
        analysis.grid = small_grid();
        let request = AnalysisRequest::new(
            "soft",
            AnalysisKind::SoftSphere,
            temp.path(),
            temp.path().join("figs"),
        );
        let artifacts = analysis.execute(&request).expect("soft spheres");
        assert_eq!(artifacts.len(), 4);

        let pressure = fs::read_to_string(request.output_path(&artifacts[0])).expect("pressure");
        assert_eq!(pressure, "# n T p\n0.1 0.5 2\n1.1 0.5 4\n");
        let radial = fs::read_to_string(request.output_path(&artifacts[2])).expect("radial");
        assert_eq!(radial.lines().count(), 1 + 4);
    }

    #[test]
    fn negative_variance_names_the_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        write(temp.path(), "0.1", "energy", "3.0 1.0\n");
        let mut analysis = SoftSphereAnalysis::new(vec![SoftSpherePlot::EnergyPdf]);
        analysis.grid = SoftSphereGrid {
            density_max: 1.0,
            ..small_grid()
        };
        let request = AnalysisRequest::new("soft", AnalysisKind::SoftSphere, temp.path(), temp.path());
        let error = analysis.execute(&request).expect_err("variance");
        assert_eq!(error.placeholder(), "RUN.SOFT_VARIANCE");
        assert!(error.message().contains("ff-0.1_temp-0.5-energy.dat"));
    }
}
