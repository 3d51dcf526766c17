mod model;

pub use model::{
    ContactComparison, ContactProfile, FILLING_PER_DENSITY, Quantity, WallTables,
    outer_sphere_radius,
};

use super::AnalysisExecutor;
use super::helpers::{ArtifactSink, load_table};
use super::serialization::{ColumnFormat, format_general};
use crate::domain::{AnalysisKind, AnalysisRequest, OutputArtifact, PostResult};
use crate::plot::FigureSize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum ContactGeometry {
    /// Hard-sphere solute of `radius` in a fluid at filling fraction
    /// `0.<ff_digit>`.
    InnerSphere { radius: f64, ff_digit: u32 },
    /// Fluid inside a spherical cavity.
    OuterSphere { radius: f64, ff_digit: u32 },
    Walls {
        mc: PathBuf,
        white_bear: PathBuf,
        white_bear_tensorial: PathBuf,
        mark_two: PathBuf,
    },
}

impl ContactGeometry {
    pub fn tag(&self) -> String {
        match self {
            Self::InnerSphere { radius, ff_digit } => {
                format!("inner-{}-0.{}", format_general(*radius, 6), ff_digit)
            }
            Self::OuterSphere { radius, ff_digit } => {
                format!("outer-{}-0.{}", format_general(*radius, 6), ff_digit)
            }
            Self::Walls { .. } => "walls".to_string(),
        }
    }

    /// Input files relative to the data root, DFT first.
    pub fn input_files(&self) -> Vec<PathBuf> {
        match self {
            Self::InnerSphere { radius, ff_digit } => vec![
                PathBuf::from(format!(
                    "inner-sphereWB-{:04.1}-0.{}0-mean.dat",
                    2.0 * radius,
                    ff_digit
                )),
                PathBuf::from(format!(
                    "mc-inner-sphere-{}-0.{}.dat",
                    format_general(*radius, 6),
                    ff_digit
                )),
            ],
            Self::OuterSphere { radius, ff_digit } => {
                let radius = format_general(*radius, 6);
                vec![
                    PathBuf::from(format!("outer-sphereWB-{radius}-00.{ff_digit}.dat")),
                    PathBuf::from(format!("mc-outer-sphere-{radius}-0.{ff_digit}.dat")),
                ]
            }
            Self::Walls {
                mc,
                white_bear,
                white_bear_tensorial,
                mark_two,
            } => vec![
                white_bear.clone(),
                mc.clone(),
                white_bear_tensorial.clone(),
                mark_two.clone(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactAnalysis {
    pub geometry: ContactGeometry,
    pub figure_size: FigureSize,
}

impl ContactAnalysis {
    pub fn new(geometry: ContactGeometry) -> Self {
        Self {
            geometry,
            figure_size: FigureSize::default(),
        }
    }

    pub fn compare(&self, request: &AnalysisRequest) -> PostResult<ContactComparison> {
        let files = self.geometry.input_files();
        let path = |index: usize| request.data_path(&files[index]);
        match &self.geometry {
            ContactGeometry::InnerSphere { radius, .. } => {
                let dft = load_table(&path(0), 8)?;
                let mc = load_table(&path(1), 12)?;
                model::inner_sphere(self.geometry.tag(), *radius, &dft, &mc)
            }
            ContactGeometry::OuterSphere { .. } => {
                let dft = load_table(&path(0), 8)?;
                let mc = load_table(&path(1), 12)?;
                model::outer_sphere(self.geometry.tag(), &dft, &mc)
            }
            ContactGeometry::Walls { .. } => {
                let white_bear = load_table(&path(0), 9)?;
                let mc = load_table(&path(1), 12)?;
                let white_bear_tensorial = load_table(&path(2), 2)?;
                let mark_two = load_table(&path(3), 6)?;
                model::walls(WallTables {
                    mc: &mc,
                    white_bear: &white_bear,
                    white_bear_tensorial: &white_bear_tensorial,
                    mark_two: &mark_two,
                })
            }
        }
    }
}

impl AnalysisExecutor for ContactAnalysis {
    fn execute(&self, request: &AnalysisRequest) -> PostResult<Vec<OutputArtifact>> {
        request.expect_kind(AnalysisKind::Contact, "INPUT.CONTACT_KIND")?;
        let comparison = self.compare(request)?;
        let mut sink = ArtifactSink::new(request, self.figure_size);

        for profile in &comparison.profiles {
            let mut columns: Vec<&[f64]> = vec![profile.position.as_slice()];
            columns.extend(profile.columns.iter().map(|(_, values)| values.as_slice()));
            sink.columns(
                format!("contact-{}-{}.dat", comparison.tag, profile.slug),
                &columns,
                &ColumnFormat::default().header(profile.header()),
            )?;
        }

        let x_label = match self.geometry {
            ContactGeometry::Walls { .. } => "position",
            _ => "r/sigma",
        };
        sink.panels(
            format!("contact-{}.svg", comparison.tag),
            &comparison.figures(&format!("contact values ({})", comparison.tag), x_label),
        )?;
        Ok(sink.finish())
    }
}
