mod model;

pub use model::{
    ConstrainedCoefficients, DEFAULT_PARAMETERS, MeasuredGhs, PARAMETER_COUNT, SIGMA,
    chi_squared, constrained_coefficients, contact_excess, evaluate, residuals,
};

use super::AnalysisExecutor;
use super::helpers::{ArtifactSink, load_table};
use super::serialization::{ColumnFormat, format_general};
use crate::domain::{AnalysisKind, AnalysisRequest, OutputArtifact, PostError, PostResult};
use crate::numerics::{FitOptions, fit};
use crate::plot::{Figure, FigureSize, Series, SeriesStyle};
use crate::style::palette;
use tracing::{info, warn};

pub const DEFAULT_FILLING_FRACTIONS: [f64; 4] = [0.1, 0.2, 0.3, 0.4];

#[derive(Debug, Clone, PartialEq)]
pub struct PairCorrelationAnalysis {
    pub file_base: String,
    pub filling_fractions: Vec<f64>,
    pub parameters: [f64; PARAMETER_COUNT],
    pub fit: bool,
    pub figure_size: FigureSize,
}

impl Default for PairCorrelationAnalysis {
    fn default() -> Self {
        Self {
            file_base: "gr".to_string(),
            filling_fractions: DEFAULT_FILLING_FRACTIONS.to_vec(),
            parameters: DEFAULT_PARAMETERS,
            fit: false,
            figure_size: FigureSize::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GhsFit {
    pub parameters: [f64; PARAMETER_COUNT],
    pub chi_squared: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl PairCorrelationAnalysis {
    pub fn data_file(&self, filling_fraction: f64) -> String {
        format!("{}-{:4.2}.dat", self.file_base, filling_fraction)
    }

    /// Loads every available `g(r)` table; absent filling fractions are
    /// skipped.
    pub fn load(&self, request: &AnalysisRequest) -> PostResult<Vec<MeasuredGhs>> {
        let mut data = Vec::new();
        for &filling_fraction in &self.filling_fractions {
            let path = request.data_path(self.data_file(filling_fraction));
            if !path.is_file() {
                warn!(path = %path.display(), "g(r) table missing, skipping filling fraction");
                continue;
            }
            let table = load_table(&path, 2)?;
            data.push(MeasuredGhs::from_density(
                filling_fraction,
                table.column(0)?,
                &table.column(1)?,
            ));
        }
        if data.is_empty() {
            return Err(PostError::io_system(
                "IO.GHS_NO_DATA",
                format!(
                    "no {}-*.dat tables found under '{}'",
                    self.file_base,
                    request.data_root.display()
                ),
            ));
        }
        Ok(data)
    }

    pub fn solve(&self, data: &[MeasuredGhs]) -> PostResult<GhsFit> {
        if !self.fit {
            return Ok(GhsFit {
                parameters: self.parameters,
                chi_squared: chi_squared(&self.parameters, data),
                iterations: 0,
                converged: false,
            });
        }

        let report = fit(
            |x: &[f64]| residuals(&as_parameters(x), data),
            &self.parameters,
            FitOptions::default(),
        )?;
        if !report.converged {
            warn!(
                iterations = report.iterations,
                chi_squared = report.chi_squared,
                "g(r) fit stopped before converging"
            );
        }
        info!(chi_squared = report.chi_squared, "fitted g(r) parameters");
        Ok(GhsFit {
            parameters: as_parameters(&report.parameters),
            chi_squared: report.chi_squared,
            iterations: report.iterations,
            converged: report.converged,
        })
    }
}

fn as_parameters(values: &[f64]) -> [f64; PARAMETER_COUNT] {
    let mut parameters = [0.0; PARAMETER_COUNT];
    for (slot, value) in parameters.iter_mut().zip(values) {
        *slot = *value;
    }
    parameters
}

fn parameter_header(result: &GhsFit) -> String {
    let values = result
        .parameters
        .iter()
        .map(|value| format_general(*value, 8))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "parameters: {}\nchi_squared: {}\niterations: {}\neta a1 a4 a1/a4",
        values,
        format_general(result.chi_squared, 8),
        result.iterations
    )
}

impl AnalysisExecutor for PairCorrelationAnalysis {
    fn execute(&self, request: &AnalysisRequest) -> PostResult<Vec<OutputArtifact>> {
        request.expect_kind(AnalysisKind::PairCorrelation, "INPUT.GHS_KIND")?;
        let data = self.load(request)?;
        let result = self.solve(&data)?;
        let mut sink = ArtifactSink::new(request, self.figure_size);

        let mut etas = Vec::new();
        let mut a1s = Vec::new();
        let mut a4s = Vec::new();
        for set in &data {
            let coefficients = constrained_coefficients(&result.parameters, set.filling_fraction);
            etas.push(set.filling_fraction);
            a1s.push(coefficients.a1);
            a4s.push(coefficients.a4);
        }
        let ratios: Vec<f64> = a1s.iter().zip(&a4s).map(|(a1, a4)| a1 / a4).collect();
        sink.columns(
            "ghs-parameters.dat",
            &[&etas, &a1s, &a4s, &ratios],
            &ColumnFormat::default().header(parameter_header(&result)),
        )?;

        let mut figure = Figure::new(
            format!("g_HS(r), chi^2 {:.2}", result.chi_squared),
            "r/R",
            "g(r)",
        )
        .with_x_range(2.0, 6.5)
        .with_y_range(0.0, 3.5)
        .with_vertical_line(SIGMA)
        .with_horizontal_line(1.0);

        for (index, set) in data.iter().enumerate() {
            let model = set.model(&result.parameters);
            sink.columns(
                format!("ghs-{:4.2}.dat", set.filling_fraction),
                &[&set.r, &set.g, &model],
                &ColumnFormat::default().header("r g_mc g_model"),
            )?;

            let color = palette(index);
            figure.push(Series::from_columns(
                format!("MC eta = {:.2}", set.filling_fraction),
                &set.r,
                &set.g,
                SeriesStyle::points(color),
            ));
            figure.push(Series::from_columns(
                format!("model eta = {:.2}", set.filling_fraction),
                &set.r,
                &model,
                SeriesStyle::line(color),
            ));
        }
        sink.figure("ghs.svg", &figure)?;
        Ok(sink.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_PARAMETERS, MeasuredGhs, PairCorrelationAnalysis, evaluate};
    use crate::domain::{AnalysisKind, AnalysisRequest};
    use crate::modules::AnalysisExecutor;
    use std::fs;
    use tempfile::TempDir;

    fn write_model_table(dir: &std::path::Path, eta: f64, x: &[f64; 5]) {
        let content: String = (0..60)
            .map(|i| {
                let r = 2.0 + i as f64 * 0.075;
                format!("{} {}\n", r, evaluate(x, eta, r) * eta)
            })
            .collect();
        fs::write(dir.join(format!("gr-{eta:4.2}.dat")), content).expect("fixture");
    }

    #[test]
    fn missing_tables_are_skipped_but_none_is_an_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let request = AnalysisRequest::new(
            "ghs",
            AnalysisKind::PairCorrelation,
            temp.path(),
            temp.path(),
        );
        let analysis = PairCorrelationAnalysis::default();
        let error = analysis.load(&request).expect_err("no data");
        assert_eq!(error.placeholder(), "IO.GHS_NO_DATA");

        write_model_table(temp.path(), 0.2, &DEFAULT_PARAMETERS);
        let data = analysis.load(&request).expect("one table");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].filling_fraction, 0.2);
    }

    #[test]
    fn fit_recovers_parameters_of_model_data() {
        let truth = [1.75, 1.4, 1.5, 0.7, 0.5];
        let data: Vec<MeasuredGhs> = [0.2, 0.3]
            .iter()
            .map(|&eta| {
                let r: Vec<f64> = (0..80).map(|i| 2.0 + i as f64 * 0.05).collect();
                let g = r.iter().map(|&r| evaluate(&truth, eta, r)).collect();
                MeasuredGhs {
                    filling_fraction: eta,
                    r,
                    g,
                }
            })
            .collect();

        let analysis = PairCorrelationAnalysis {
            fit: true,
            ..PairCorrelationAnalysis::default()
        };
        let result = analysis.solve(&data).expect("fit should run");
        let start = PairCorrelationAnalysis::default()
            .solve(&data)
            .expect("evaluation");
        assert!(result.chi_squared < start.chi_squared * 1e-3);
    }

    #[test]
    fn run_writes_parameter_and_curve_tables() {
        let temp = TempDir::new().expect("tempdir should be created");
        write_model_table(temp.path(), 0.1, &DEFAULT_PARAMETERS);
        write_model_table(temp.path(), 0.3, &DEFAULT_PARAMETERS);
        let request = AnalysisRequest::new(
            "ghs",
            AnalysisKind::PairCorrelation,
            temp.path(),
            temp.path().join("out"),
        );

        let artifacts = PairCorrelationAnalysis::default()
            .execute(&request)
            .expect("analysis should run");
        let names: Vec<String> = artifacts
            .iter()
            .map(|artifact| artifact.relative_path.display().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["ghs-parameters.dat", "ghs-0.10.dat", "ghs-0.30.dat", "ghs.svg"]
        );

        let parameters =
            fs::read_to_string(request.output_path(&artifacts[0])).expect("parameters");
        assert!(parameters.starts_with("# parameters: 1.706 1.358 1.567 0.675 0.463\n"));
        assert_eq!(parameters.lines().filter(|line| !line.starts_with('#')).count(), 2);
    }
}
