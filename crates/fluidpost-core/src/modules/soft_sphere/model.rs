use crate::domain::{PostError, PostResult};
use crate::modules::serialization::float_label;
use crate::numerics::{arange, gaussian_pdf};
use crate::table::NumericTable;
use serde::{Deserialize, Serialize};

pub const PDF_POINTS: usize = 1000;

/// Reduced densities and temperatures of a soft-sphere sweep, both as
/// half-open ranges.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct SoftSphereGrid {
    pub density_min: f64,
    pub density_max: f64,
    pub density_step: f64,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub temperature_step: f64,
}

impl Default for SoftSphereGrid {
    fn default() -> Self {
        Self {
            density_min: 0.1,
            density_max: 10.1,
            density_step: 1.0,
            temperature_min: 0.51,
            temperature_max: 1.0,
            temperature_step: 0.1,
        }
    }
}

impl SoftSphereGrid {
    pub fn densities(&self) -> Vec<f64> {
        arange(self.density_min, self.density_max, self.density_step)
    }

    pub fn temperatures(&self) -> Vec<f64> {
        arange(
            self.temperature_min,
            self.temperature_max,
            self.temperature_step,
        )
    }

    /// `ff-1.1_temp-0.51`
    pub fn prefix(density: f64, temperature: f64) -> String {
        format!(
            "ff-{}_temp-{}",
            float_label(density),
            float_label(temperature)
        )
    }
}

fn flattened(table: &NumericTable) -> Vec<f64> {
    table.rows().flat_map(|row| row.iter().copied()).collect()
}

pub fn pressure(table: &NumericTable) -> PostResult<f64> {
    flattened(table).first().copied().ok_or_else(|| {
        PostError::input_validation("INPUT.SOFT_PRESSURE", "pressure file holds no value")
    })
}

/// Gaussian fit to the sampled energy distribution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyDistribution {
    pub mean: f64,
    pub sigma: f64,
}

impl EnergyDistribution {
    /// The file holds `<E>` and `<E^2>`.
    pub fn from_moments(table: &NumericTable) -> PostResult<Self> {
        let values = flattened(table);
        let [mean, second, ..] = values[..] else {
            return Err(PostError::input_validation(
                "INPUT.SOFT_ENERGY",
                format!("energy file needs <E> and <E^2>, found {} values", values.len()),
            ));
        };
        let variance = second - mean * mean;
        if variance < 0.0 || !variance.is_finite() {
            return Err(PostError::computation(
                "RUN.SOFT_VARIANCE",
                format!("energy variance {variance} is negative"),
            ));
        }
        Ok(Self {
            mean,
            sigma: variance.sqrt(),
        })
    }

    /// Normal density on `PDF_POINTS` points spanning four sigma each side.
    pub fn curve(&self) -> (Vec<f64>, Vec<f64>) {
        let low = self.mean - 4.0 * self.sigma;
        let step = 8.0 * self.sigma / (PDF_POINTS - 1) as f64;
        (0..PDF_POINTS)
            .map(|index| {
                let x = low + index as f64 * step;
                (x, gaussian_pdf(x, self.mean, self.sigma))
            })
            .unzip()
    }
}

/// Diffusion coefficient history, first sample dropped.
pub fn diffusion(table: &NumericTable) -> PostResult<(Vec<f64>, Vec<f64>)> {
    let iterations = table.column(0)?;
    let coefficients = table.column(1)?;
    Ok(iterations
        .iter()
        .zip(&coefficients)
        .skip(1)
        .map(|(iterations, coefficient)| (iterations.log10(), *coefficient))
        .unzip())
}
