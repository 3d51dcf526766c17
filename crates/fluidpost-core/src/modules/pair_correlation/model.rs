//! Analytic hard-sphere radial distribution function.
//!
//! `g(r) = 1 + h_sigma e^{-a0 z} + a1 sin(a2 z) e^{-a3 z} + a4 sin(a5 z) e^{-a6 z}`
//! with `z = r - sigma`. Of the seven coefficients only five are free:
//! `a1` fixes the compressibility sum rule and `a4` the slope at contact.

use std::f64::consts::PI;

pub const SIGMA: f64 = 2.0;
pub const PARAMETER_COUNT: usize = 5;
pub const DEFAULT_PARAMETERS: [f64; PARAMETER_COUNT] = [1.706, 1.358, 1.567, 0.675, 0.463];

/// Integral of `r^2 sin(p z) e^{-q z}` over the fluid side, times `4 pi`.
fn oscillatory_integral(p: f64, q: f64) -> f64 {
    4.0 * PI
        * p
        * (SIGMA * SIGMA * p.powi(4)
            + 2.0 * p * p * (-1.0 + SIGMA * q * (2.0 + SIGMA * q))
            + q * q * (6.0 + SIGMA * q * (4.0 + SIGMA * q)))
        / (p * p + q * q).powi(3)
}

/// Carnahan-Starling contact value minus one.
pub fn contact_excess(eta: f64) -> f64 {
    (1.0 - 0.5 * eta) / (1.0 - eta).powi(3) - 1.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstrainedCoefficients {
    pub a1: f64,
    pub a4: f64,
}

pub fn constrained_coefficients(x: &[f64; PARAMETER_COUNT], eta: f64) -> ConstrainedCoefficients {
    let [a0, a2, a3, a5, a6] = *x;
    let h_sigma = contact_excess(eta);
    let density = 3.0 / (4.0 * PI) * eta;
    let reduced_compressibility = (1.0 - eta).powi(4)
        / (1.0 + 4.0 * eta + 4.0 * eta * eta - 4.0 * eta.powi(3) + eta.powi(4))
        / 3.0;

    let integral_h0 = 4.0 * PI * h_sigma * (2.0 + SIGMA * a0 * (2.0 + SIGMA * a0)) / a0.powi(3);
    let a = (reduced_compressibility - 1.0) / density - integral_h0;
    let b = oscillatory_integral(a5, a6);
    let c = oscillatory_integral(a2, a3);

    let a1 = (a / c - b * h_sigma / c / a5 * (-1.0 - h_sigma + a0)) / (1.0 - b * a2 / c / a5);
    let a4 = h_sigma / a5 * (-1.0 - h_sigma + a0 - a1 * a2 / h_sigma);
    ConstrainedCoefficients { a1, a4 }
}

pub fn evaluate(x: &[f64; PARAMETER_COUNT], eta: f64, r: f64) -> f64 {
    let [a0, a2, a3, a5, a6] = *x;
    let ConstrainedCoefficients { a1, a4 } = constrained_coefficients(x, eta);
    let z = r - SIGMA;
    1.0 + contact_excess(eta) * (-a0 * z).exp()
        + a1 * (a2 * z).sin() * (-a3 * z).exp()
        + a4 * (a5 * z).sin() * (-a6 * z).exp()
}

/// Monte Carlo `g(r)` at one filling fraction.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredGhs {
    pub filling_fraction: f64,
    pub r: Vec<f64>,
    pub g: Vec<f64>,
}

impl MeasuredGhs {
    /// `n / eta` turns the sampled density into `g(r)`.
    pub fn from_density(filling_fraction: f64, r: Vec<f64>, density: &[f64]) -> Self {
        Self {
            filling_fraction,
            g: density.iter().map(|n| n / filling_fraction).collect(),
            r,
        }
    }

    pub fn model(&self, x: &[f64; PARAMETER_COUNT]) -> Vec<f64> {
        self.r
            .iter()
            .map(|&r| evaluate(x, self.filling_fraction, r))
            .collect()
    }
}

/// Residuals over every measured point, concatenated in input order.
pub fn residuals(x: &[f64; PARAMETER_COUNT], data: &[MeasuredGhs]) -> Vec<f64> {
    data.iter()
        .flat_map(|set| {
            set.r
                .iter()
                .zip(&set.g)
                .map(|(&r, &g)| evaluate(x, set.filling_fraction, r) - g)
        })
        .collect()
}

pub fn chi_squared(x: &[f64; PARAMETER_COUNT], data: &[MeasuredGhs]) -> f64 {
    residuals(x, data).iter().map(|r| r * r).sum()
}

#[cfg(test)]
mod tests {
    use super::{
        DEFAULT_PARAMETERS, MeasuredGhs, SIGMA, chi_squared, constrained_coefficients,
        contact_excess, evaluate,
    };

    #[test]
    fn contact_value_is_carnahan_starling() {
        let eta = 0.3;
        let g = evaluate(&DEFAULT_PARAMETERS, eta, SIGMA);
        let expected = (1.0 - 0.5 * eta) / (1.0 - eta).powi(3);
        assert!((g - expected).abs() < 1e-12);
        assert!((contact_excess(eta) + 1.0 - expected).abs() < 1e-12);
    }

    #[test]
    fn constraint_matches_contact_slope() {
        let eta = 0.2;
        let x = DEFAULT_PARAMETERS;
        let coefficients = constrained_coefficients(&x, eta);
        let h_sigma = contact_excess(eta);
        // d/dz at z = 0 of the model.
        let slope = -x[0] * h_sigma + coefficients.a1 * x[1] + coefficients.a4 * x[3];
        let expected = h_sigma * (-1.0 - h_sigma);
        assert!((slope - expected).abs() < 1e-10);
    }

    #[test]
    fn model_decays_to_one() {
        let g = evaluate(&DEFAULT_PARAMETERS, 0.4, 60.0);
        assert!((g - 1.0).abs() < 1e-8);
    }

    #[test]
    fn chi_squared_vanishes_for_model_data() {
        let r: Vec<f64> = (0..40).map(|i| 2.0 + i as f64 * 0.1).collect();
        let mut set = MeasuredGhs {
            filling_fraction: 0.3,
            r,
            g: Vec::new(),
        };
        set.g = set.model(&DEFAULT_PARAMETERS);
        assert!(chi_squared(&DEFAULT_PARAMETERS, &[set.clone()]) < 1e-24);

        let shifted = [1.8, 1.358, 1.567, 0.675, 0.463];
        assert!(chi_squared(&shifted, &[set]) > 0.0);
    }

    #[test]
    fn density_is_divided_by_filling_fraction() {
        let set = MeasuredGhs::from_density(0.2, vec![2.0, 2.1], &[0.5, 0.2]);
        assert_eq!(set.g, vec![2.5, 1.0]);
    }
}
