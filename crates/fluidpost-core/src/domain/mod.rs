pub mod errors;

pub use errors::{ExitStatus, ParserResult, PostError, PostErrorCategory, PostResult};

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    Contact,
    PairCorrelation,
    EnergyHistogram,
    DensityOfStates,
    SampleRate,
    Scaling,
    DosComparison,
    HeatCapacity,
    Thermodynamics,
    FreeEnergy,
    Coexistence,
    SoftSphere,
}

impl AnalysisKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Contact => "CONTACT",
            Self::PairCorrelation => "GHS",
            Self::EnergyHistogram => "HISTOGRAM",
            Self::DensityOfStates => "DOS",
            Self::SampleRate => "SAMPLES",
            Self::Scaling => "SCALING",
            Self::DosComparison => "COMPARISON",
            Self::HeatCapacity => "HEAT_CAPACITY",
            Self::Thermodynamics => "THERMO",
            Self::FreeEnergy => "FREE_ENERGY",
            Self::Coexistence => "COEXISTENCE",
            Self::SoftSphere => "SOFT",
        }
    }
}

impl Display for AnalysisKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub label: String,
    pub analysis: AnalysisKind,
    pub data_root: PathBuf,
    pub output_dir: PathBuf,
}

impl AnalysisRequest {
    pub fn new(
        label: impl Into<String>,
        analysis: AnalysisKind,
        data_root: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            label: label.into(),
            analysis,
            data_root: data_root.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn data_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.data_root.join(relative)
    }

    pub fn output_path(&self, artifact: &OutputArtifact) -> PathBuf {
        self.output_dir.join(&artifact.relative_path)
    }

    /// Fails unless the request was built for `expected`.
    pub fn expect_kind(&self, expected: AnalysisKind, placeholder: &'static str) -> PostResult<()> {
        if self.analysis != expected {
            return Err(PostError::input_validation(
                placeholder,
                format!(
                    "{} analysis cannot run a {} request ('{}')",
                    expected, self.analysis, self.label
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct OutputArtifact {
    pub relative_path: PathBuf,
}

impl OutputArtifact {
    pub fn new(relative_path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnalysisKind, AnalysisRequest, OutputArtifact};
    use crate::domain::PostErrorCategory;

    #[test]
    fn request_resolves_data_and_output_paths() {
        let request = AnalysisRequest::new("lj31", AnalysisKind::HeatCapacity, "data", "figs");
        assert_eq!(request.analysis.to_string(), "HEAT_CAPACITY");
        assert_eq!(
            request.data_path("lj31/bench.time"),
            std::path::Path::new("data/lj31/bench.time")
        );
        assert_eq!(
            request.output_path(&OutputArtifact::new("bench-cv.txt")),
            std::path::Path::new("figs/bench-cv.txt")
        );
    }

    #[test]
    fn mismatched_kind_is_an_input_error() {
        let request = AnalysisRequest::new("dos", AnalysisKind::DensityOfStates, "data", "figs");
        let error = request
            .expect_kind(AnalysisKind::Scaling, "INPUT.SCALING_KIND")
            .expect_err("kind mismatch should fail");
        assert_eq!(error.category(), PostErrorCategory::InputValidationError);
        assert_eq!(error.placeholder(), "INPUT.SCALING_KIND");
    }
}
