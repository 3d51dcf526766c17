use super::AnalysisExecutor;
use super::helpers::{ArtifactSink, load_table};
use super::serialization::{ColumnFormat, format_general};
use crate::domain::{AnalysisKind, AnalysisRequest, OutputArtifact, PostError, PostResult};
use crate::numerics::arange;
use crate::plot::{Figure, FigureSize, Series, SeriesStyle};
use crate::style::palette;
use std::path::PathBuf;

/// Homogeneous square-well free energy against filling fraction, one
/// curve family per temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeEnergyAnalysis {
    pub well_width: f64,
    pub temperatures: Vec<f64>,
    pub figure_size: FigureSize,
}

impl Default for FreeEnergyAnalysis {
    fn default() -> Self {
        Self {
            well_width: 1.3,
            temperatures: arange(1.0, 11.0, 1.0),
            figure_size: FigureSize::default(),
        }
    }
}

impl FreeEnergyAnalysis {
    pub fn data_file(&self, temperature: f64) -> PathBuf {
        PathBuf::from("homogeneous").join(format!(
            "ww{}-kT{}.dat",
            format_general(self.well_width, 6),
            format_general(temperature, 6)
        ))
    }
}

impl AnalysisExecutor for FreeEnergyAnalysis {
    fn execute(&self, request: &AnalysisRequest) -> PostResult<Vec<OutputArtifact>> {
        request.expect_kind(AnalysisKind::FreeEnergy, "INPUT.FREE_ENERGY_KIND")?;
        if self.temperatures.is_empty() {
            return Err(PostError::input_validation(
                "INPUT.FREE_ENERGY_TEMPERATURES",
                "no temperatures requested",
            ));
        }
        let mut sink = ArtifactSink::new(request, self.figure_size);

        let mut long = [Vec::new(), Vec::new(), Vec::new(), Vec::new(), Vec::new()];
        let mut figure = Figure::new(
            format!("Free energy, lambda={}", format_general(self.well_width, 6)),
            "eta",
            "A",
        )
        .with_y_range(-20.0, 50.0);

        for (index, &temperature) in self.temperatures.iter().enumerate() {
            let table = load_table(&request.data_path(self.data_file(temperature)), 5)?;
            let eta = table.column(0)?;
            let estimates = [table.column(2)?, table.column(3)?, table.column(4)?];

            long[0].extend(std::iter::repeat_n(temperature, eta.len()));
            long[1].extend_from_slice(&eta);
            for (column, estimate) in long[2..].iter_mut().zip(&estimates) {
                column.extend_from_slice(estimate);
            }

            let color = palette(index);
            figure.push(Series::from_columns(
                format!("T={}", format_general(temperature, 6)),
                &eta,
                &estimates[0],
                SeriesStyle::line(color),
            ));
            figure.push(Series::from_columns("", &eta, &estimates[1], SeriesStyle::line(color)));
            figure.push(Series::from_columns("", &eta, &estimates[2], SeriesStyle::points(color)));
        }

        let columns: Vec<&[f64]> = long.iter().map(Vec::as_slice).collect();
        sink.columns(
            "free-energy.dat",
            &columns,
            &ColumnFormat::default().header("kT eta A2 A3 A4"),
        )?;
        sink.figure("free-energy-vs-eta.svg", &figure)?;
        Ok(sink.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::FreeEnergyAnalysis;
    use crate::domain::{AnalysisKind, AnalysisRequest};
    use crate::modules::AnalysisExecutor;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn file_names_use_general_formatting() {
        let analysis = FreeEnergyAnalysis::default();
        assert_eq!(analysis.temperatures.len(), 10);
        assert_eq!(
            analysis.data_file(1.0),
            PathBuf::from("homogeneous/ww1.3-kT1.dat")
        );
        assert_eq!(
            analysis.data_file(2.5),
            PathBuf::from("homogeneous/ww1.3-kT2.5.dat")
        );
    }

    #[test]
    fn tables_are_stacked_by_temperature() {
        let temp = TempDir::new().expect("tempdir should be created");
        let dir = temp.path().join("homogeneous");
        fs::create_dir_all(&dir).expect("dir");
        fs::write(dir.join("ww1.3-kT1.dat"), "0.1 9 1 2 3\n0.2 9 4 5 6\n").expect("kT1");
        fs::write(dir.join("ww1.3-kT2.dat"), "0.1 9 7 8 9\n").expect("kT2");

        let analysis = FreeEnergyAnalysis {
            temperatures: vec![1.0, 2.0],
            ..FreeEnergyAnalysis::default()
        };
        let request = AnalysisRequest::new(
            "free",
            AnalysisKind::FreeEnergy,
            temp.path(),
            temp.path().join("figs"),
        );
        let artifacts = analysis.execute(&request).expect("free energy");
        let table = fs::read_to_string(request.output_path(&artifacts[0])).expect("table");
        assert_eq!(
            table,
            "# kT eta A2 A3 A4\n1 0.1 1 2 3\n1 0.2 4 5 6\n2 0.1 7 8 9\n"
        );
    }

    #[test]
    fn missing_temperature_file_is_an_io_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let request = AnalysisRequest::new("free", AnalysisKind::FreeEnergy, temp.path(), temp.path());
        let error = FreeEnergyAnalysis::default()
            .execute(&request)
            .expect_err("no data");
        assert_eq!(error.placeholder(), "IO.TABLE_READ");
    }
}
