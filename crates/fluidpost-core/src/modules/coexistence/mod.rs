//! Liquid-vapour coexistence of the square-well fluid: renormalisation-group
//! output next to curves digitised from published figures.

use super::AnalysisExecutor;
use super::helpers::{ArtifactSink, load_table};
use super::serialization::format_general;
use crate::domain::{AnalysisKind, AnalysisRequest, OutputArtifact, PostResult};
use crate::numerics::LinearCalibration;
use crate::plot::{Figure, FigureSize, Series, SeriesStyle};
use crate::style::Rgb;
use crate::table::NumericTable;
use std::f64::consts::PI;

/// Hard-sphere diameter used by the renormalisation-group runs.
pub const RG_SIGMA: f64 = 2.0;

/// Pixel-to-data maps for one scanned figure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FigureCalibration {
    pub density: LinearCalibration,
    pub temperature: LinearCalibration,
}

impl FigureCalibration {
    pub fn forte() -> Self {
        Self {
            density: LinearCalibration::from_points((94.0, 0.0), (504.0, 0.8)),
            temperature: LinearCalibration::from_points((52.0, 1.85), (345.0, 0.65)),
        }
    }

    pub fn white() -> Self {
        Self {
            density: LinearCalibration::from_points((73.0, 0.0), (345.0, 0.7)),
            temperature: LinearCalibration::from_points((400.0, 0.8), (76.0, 1.2)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoexistenceCurve {
    pub source: &'static str,
    pub filling_fraction: Vec<f64>,
    pub temperature: Vec<f64>,
}

impl CoexistenceCurve {
    /// Pixel pairs `(x, y)` read off a plot of reduced density `rho*`.
    pub fn digitised(
        source: &'static str,
        table: &NumericTable,
        calibration: FigureCalibration,
    ) -> PostResult<Self> {
        Ok(Self {
            source,
            filling_fraction: table
                .column(0)?
                .iter()
                .map(|&pixel| calibration.density.apply(pixel) * PI / 6.0)
                .collect(),
            temperature: table
                .column(1)?
                .iter()
                .map(|&pixel| calibration.temperature.apply(pixel))
                .collect(),
        })
    }

    /// `T n_vapor n_liquid` rows become a vapour and a liquid branch.
    pub fn renormalization_group(table: &NumericTable) -> PostResult<[Self; 2]> {
        let temperature = table.column(0)?;
        let eta = |column: usize| -> PostResult<Vec<f64>> {
            Ok(table
                .column(column)?
                .iter()
                .map(|n| n * PI * RG_SIGMA.powi(3) / 6.0)
                .collect())
        };
        Ok([
            Self {
                source: "rg-vapor",
                filling_fraction: eta(1)?,
                temperature: temperature.clone(),
            },
            Self {
                source: "rg-liquid",
                filling_fraction: eta(2)?,
                temperature,
            },
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoexistenceAnalysis {
    pub figure_size: FigureSize,
}

impl CoexistenceAnalysis {
    pub fn curves(&self, request: &AnalysisRequest) -> PostResult<Vec<CoexistenceCurve>> {
        let table = |name: &str| load_table(&request.data_path(name), 2);
        let rg = load_table(&request.data_path("npart_RG-i0-out.dat"), 3)?;
        let [vapor, liquid] = CoexistenceCurve::renormalization_group(&rg)?;
        Ok(vec![
            vapor,
            liquid,
            CoexistenceCurve::digitised("forte", &table("forte_data.dat")?, FigureCalibration::forte())?,
            CoexistenceCurve::digitised(
                "forte-converged",
                &table("forte_data_conv.dat")?,
                FigureCalibration::forte(),
            )?,
            CoexistenceCurve::digitised("white-md", &table("white_MD.dat")?, FigureCalibration::white())?,
        ])
    }
}

fn curve_style(source: &str) -> (&'static str, SeriesStyle) {
    match source {
        "rg-vapor" => ("RG i=0", SeriesStyle::line(Rgb::BLUE)),
        "rg-liquid" => ("", SeriesStyle::line(Rgb::BLUE)),
        "forte" => ("Forte 2011, non-converged RGT", SeriesStyle::line(Rgb::GREEN)),
        "white-md" => ("White 2000", SeriesStyle::points(Rgb::RED)),
        _ => ("Forte 2011, converged RGT", SeriesStyle::line(Rgb::CYAN)),
    }
}

impl AnalysisExecutor for CoexistenceAnalysis {
    fn execute(&self, request: &AnalysisRequest) -> PostResult<Vec<OutputArtifact>> {
        request.expect_kind(AnalysisKind::Coexistence, "INPUT.COEXISTENCE_KIND")?;
        let curves = self.curves(request)?;
        let mut sink = ArtifactSink::new(request, self.figure_size);

        let mut text = String::from("# source eta T\n");
        let mut figure = Figure::new("l-v coexistence, lambda_SW=1.5", "eta", "T");
        for curve in &curves {
            for (eta, temperature) in curve.filling_fraction.iter().zip(&curve.temperature) {
                text.push_str(&format!(
                    "{} {} {}\n",
                    curve.source,
                    format_general(*eta, 6),
                    format_general(*temperature, 6)
                ));
            }
            let (label, style) = curve_style(curve.source);
            figure.push(Series::from_columns(
                label,
                &curve.filling_fraction,
                &curve.temperature,
                style,
            ));
        }
        sink.text("coexistence.dat", &text)?;
        sink.figure("coexistence.svg", &figure)?;
        Ok(sink.finish())
    }
}
