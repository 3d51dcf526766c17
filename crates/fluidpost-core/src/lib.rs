//! Post-processing of fluid simulation output: parsing data tables,
//! deriving thermodynamic quantities and rendering figures.

pub mod domain;
pub mod launch;
pub mod modules;
pub mod numerics;
pub mod plot;
pub mod style;
pub mod table;

pub use domain::{AnalysisKind, AnalysisRequest, OutputArtifact, PostError, PostResult};
pub use modules::AnalysisExecutor;
