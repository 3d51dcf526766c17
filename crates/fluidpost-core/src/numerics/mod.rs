pub mod linalg;
pub mod lsq;
pub mod root;
pub mod stats;
pub mod thermo;

pub use linalg::{DenseMatrix, LuDecomposition, LuError, lu_factorize, lu_solve};
pub use lsq::{FitError, FitOptions, FitReport, fit};
pub use root::{
    Bisection, bisect, carnahan_starling_excess_free_energy, filling_fraction_for_free_energy,
};
pub use stats::{
    LinearCalibration, arange, gaussian_pdf, max, mean, min, running_mean, temperature_grid,
};
pub use thermo::{
    CanonicalProperties, DEFAULT_MIN_T_THRESHOLD, canonical_properties, heat_capacity,
    minimum_temperature,
};
