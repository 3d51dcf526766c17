//! Canonical thermodynamics of square-well runs from their flat-histogram
//! density of states.

use super::AnalysisExecutor;
use super::helpers::{ArtifactSink, distinct_methods, load_table, require_methods};
use super::histogram::{SquareWellSystem, WeightedLnDos};
use super::serialization::ColumnFormat;
use crate::domain::{AnalysisKind, AnalysisRequest, OutputArtifact, PostError, PostResult};
use crate::numerics::{
    CanonicalProperties, DEFAULT_MIN_T_THRESHOLD, canonical_properties, minimum_temperature,
    temperature_grid,
};
use crate::plot::{Figure, FigureSize, Series, SeriesStyle};
use crate::style::legend_label;
use tracing::info;

/// Per-particle canonical curves of one method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodThermodynamics {
    pub method: String,
    pub temperatures: Vec<f64>,
    pub internal_energy: Vec<f64>,
    pub heat_capacity: Vec<f64>,
    pub entropy: Vec<f64>,
    pub min_temperature: f64,
}

impl MethodThermodynamics {
    pub fn from_properties(
        method: &str,
        particles: usize,
        properties: CanonicalProperties,
        min_temperature: f64,
    ) -> Self {
        let n = particles as f64;
        let per_particle = |values: Vec<f64>| values.into_iter().map(|v| v / n).collect();
        Self {
            method: method.to_string(),
            temperatures: properties.temperatures,
            internal_energy: per_particle(properties.internal_energy),
            heat_capacity: per_particle(properties.heat_capacity),
            entropy: per_particle(properties.entropy),
            min_temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThermodynamicsAnalysis {
    pub system: SquareWellSystem,
    pub methods: Vec<String>,
    pub temperatures: Vec<f64>,
    pub min_t_threshold: f64,
    pub figure_size: FigureSize,
}

impl ThermodynamicsAnalysis {
    pub fn new(system: SquareWellSystem, methods: Vec<String>) -> Self {
        Self {
            system,
            methods,
            temperatures: temperature_grid(0.05, 2.0, 0.005),
            min_t_threshold: DEFAULT_MIN_T_THRESHOLD,
            figure_size: FigureSize::default(),
        }
    }

    pub fn method(&self, request: &AnalysisRequest, method: &str) -> PostResult<MethodThermodynamics> {
        let stem = self.system.stem(method);
        let histogram = load_table(&request.data_path(format!("{stem}-E.dat")), 2)?;
        let weights = load_table(&request.data_path(format!("{stem}-lnw.dat")), 2)?;
        let weighted = WeightedLnDos::from_tables(&histogram, &weights)?;
        if weighted.is_empty() {
            return Err(PostError::input_validation(
                "INPUT.THERMO_EMPTY",
                format!("'{stem}-E.dat' has no visited energies"),
            ));
        }

        let energies: Vec<f64> = weighted.energies.iter().map(|energy| -energy).collect();
        let properties = canonical_properties(&self.temperatures, &energies, &weighted.ln_dos)?;
        let min_temperature = minimum_temperature(
            &self.temperatures,
            &energies,
            &weighted.ln_dos,
            self.min_t_threshold,
        )?;
        info!(method, min_temperature, "computed canonical properties");
        Ok(MethodThermodynamics::from_properties(
            method,
            self.system.particles,
            properties,
            min_temperature,
        ))
    }
}

fn figure<F>(title: String, y_label: &str, curves: &[MethodThermodynamics], value: F) -> Figure
where
    F: Fn(&MethodThermodynamics) -> &[f64],
{
    let mut figure = Figure::new(title, "kT", y_label);
    for curve in curves {
        figure.push(Series::from_columns(
            legend_label(&curve.method),
            &curve.temperatures,
            value(curve),
            SeriesStyle::for_method(&curve.method),
        ));
        figure = figure.with_vertical_line(curve.min_temperature);
    }
    figure
}

impl AnalysisExecutor for ThermodynamicsAnalysis {
    fn execute(&self, request: &AnalysisRequest) -> PostResult<Vec<OutputArtifact>> {
        request.expect_kind(AnalysisKind::Thermodynamics, "INPUT.THERMO_KIND")?;
        require_methods(&self.methods, "INPUT.THERMO_METHODS")?;
        if self.temperatures.is_empty() {
            return Err(PostError::input_validation(
                "INPUT.THERMO_TEMPERATURES",
                "the temperature grid is empty",
            ));
        }
        let mut sink = ArtifactSink::new(request, self.figure_size);

        let mut curves = Vec::new();
        for method in distinct_methods(&self.methods) {
            let curve = self.method(request, &method)?;
            sink.columns(
                format!("thermo-{method}.dat"),
                &[
                    &curve.temperatures,
                    &curve.internal_energy,
                    &curve.heat_capacity,
                    &curve.entropy,
                ],
                &ColumnFormat::default().header(format!(
                    "min_T: {}\nT U/N CV/N S/N",
                    curve.min_temperature
                )),
            )?;
            curves.push(curve);
        }

        let describe = self.system.describe();
        sink.figure(
            "thermo-u.svg",
            &figure(
                format!("Specific internal energy for {describe}"),
                "U/N",
                &curves,
                |curve| curve.internal_energy.as_slice(),
            ),
        )?;
        let mut heat_capacity = figure(
            format!("Specific heat capacity for {describe}"),
            "CV/Nk",
            &curves,
            |curve| curve.heat_capacity.as_slice(),
        );
        let (_, (_, top)) = heat_capacity.resolved_ranges();
        heat_capacity = heat_capacity.with_y_range(0.0, top.max(1.0));
        sink.figure("thermo-cv.svg", &heat_capacity)?;
        sink.figure(
            "thermo-s.svg",
            &figure(
                format!("Configurational entropy for {describe}"),
                "S/Nk",
                &curves,
                |curve| curve.entropy.as_slice(),
            ),
        )?;
        Ok(sink.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::ThermodynamicsAnalysis;
    use crate::domain::{AnalysisKind, AnalysisRequest};
    use crate::modules::AnalysisExecutor;
    use crate::modules::histogram::SquareWellSystem;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn two_level_system_has_expected_limits() {
        let temp = TempDir::new().expect("tempdir should be created");
        // Energies 0 and 2 wells, equally degenerate once weights are removed.
        fs::write(temp.path().join("periodic-ww1.30-ff0.30-N2-tmmc-E.dat"), "0 10\n2 10\n")
            .expect("histogram");
        fs::write(
            temp.path().join("periodic-ww1.30-ff0.30-N2-tmmc-lnw.dat"),
            "0 0\n1 0\n2 0\n",
        )
        .expect("weights");

        let mut analysis = ThermodynamicsAnalysis::new(
            SquareWellSystem::new(1.3, 0.3, 2),
            vec!["tmmc".to_string()],
        );
        analysis.temperatures = vec![0.01, 1000.0];
        let request = AnalysisRequest::new(
            "thermo",
            AnalysisKind::Thermodynamics,
            temp.path(),
            temp.path().join("figs"),
        );
        let curve = analysis.method(&request, "tmmc").expect("thermodynamics");

        // Cold: ground state at E = -2, U/N = -1, S/N = ln(1/2)/2.
        assert!((curve.internal_energy[0] + 1.0).abs() < 1e-9);
        assert!((curve.entropy[0] - 0.5f64.ln() / 2.0).abs() < 1e-9);
        // Hot: both states equally likely.
        assert!((curve.internal_energy[1] + 0.5).abs() < 1e-3);
        assert!(curve.entropy[1].abs() < 1e-3);
        assert_eq!(curve.min_temperature, 1000.0);

        let artifacts = analysis.execute(&request).expect("thermo run");
        assert_eq!(artifacts.len(), 4);
        let table = fs::read_to_string(request.output_path(&artifacts[0])).expect("table");
        assert!(table.starts_with("# min_T: 1000\n# T U/N CV/N S/N\n"));
    }
}
