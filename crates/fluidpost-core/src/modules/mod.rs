pub mod coexistence;
pub mod comparison;
pub mod contact;
pub mod free_energy;
pub mod heat_capacity;
pub mod histogram;
pub mod pair_correlation;
pub mod scaling;
pub mod serialization;
pub mod soft_sphere;
pub mod thermodynamics;

mod helpers;
mod traits;

pub use traits::AnalysisExecutor;
