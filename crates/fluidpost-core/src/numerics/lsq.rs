use super::linalg::{DenseMatrix, lu_solve};
use crate::domain::PostError;
use tracing::debug;

const MAX_DAMPING: f64 = 1.0e16;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("least-squares fit needs at least one parameter")]
    NoParameters,
    #[error("residual function returned no values")]
    EmptyResiduals,
    #[error("residuals are not finite at the starting parameters")]
    NonFiniteStart,
    #[error("residual count changed from {expected} to {actual}")]
    ResidualCountChanged { expected: usize, actual: usize },
}

impl From<FitError> for PostError {
    fn from(error: FitError) -> Self {
        let message = error.to_string();
        match error {
            FitError::NoParameters | FitError::EmptyResiduals => {
                PostError::input_validation("INPUT.FIT_SHAPE", message)
            }
            FitError::NonFiniteStart => PostError::computation("RUN.FIT_START", message),
            FitError::ResidualCountChanged { .. } => {
                PostError::computation("RUN.FIT_RESIDUALS", message)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub initial_damping: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            initial_damping: 1.0e-3,
            tolerance: 1.0e-12,
            max_iterations: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub parameters: Vec<f64>,
    pub chi_squared: f64,
    pub iterations: usize,
    pub converged: bool,
}

fn chi_squared(residuals: &[f64]) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

fn evaluate<F>(residuals: &F, parameters: &[f64], expected: usize) -> Result<Vec<f64>, FitError>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let values = residuals(parameters);
    if values.len() != expected {
        return Err(FitError::ResidualCountChanged {
            expected,
            actual: values.len(),
        });
    }
    Ok(values)
}

/// Central-difference Jacobian, `rows = residuals`, `cols = parameters`.
fn jacobian<F>(residuals: &F, parameters: &[f64], rows: usize) -> Result<DenseMatrix, FitError>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let mut jacobian = DenseMatrix::zeros(rows, parameters.len());
    let mut probe = parameters.to_vec();
    for col in 0..parameters.len() {
        let step = 1.0e-6 * parameters[col].abs().max(1.0);
        probe[col] = parameters[col] + step;
        let forward = evaluate(residuals, &probe, rows)?;
        probe[col] = parameters[col] - step;
        let backward = evaluate(residuals, &probe, rows)?;
        probe[col] = parameters[col];
        for row in 0..rows {
            jacobian[(row, col)] = (forward[row] - backward[row]) / (2.0 * step);
        }
    }
    Ok(jacobian)
}

/// Levenberg-Marquardt minimisation of `sum residuals(x)^2`.
pub fn fit<F>(residuals: F, initial: &[f64], options: FitOptions) -> Result<FitReport, FitError>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    if initial.is_empty() {
        return Err(FitError::NoParameters);
    }
    let mut parameters = initial.to_vec();
    let mut current = residuals(&parameters);
    let rows = current.len();
    if rows == 0 {
        return Err(FitError::EmptyResiduals);
    }
    let mut chi2 = chi_squared(&current);
    if !chi2.is_finite() {
        return Err(FitError::NonFiniteStart);
    }

    let unknowns = parameters.len();
    let mut damping = options.initial_damping;
    let mut iterations = 0;
    let mut converged = chi2 == 0.0;

    while !converged && iterations < options.max_iterations {
        iterations += 1;
        let jac = jacobian(&residuals, &parameters, rows)?;

        let mut normal = DenseMatrix::zeros(unknowns, unknowns);
        let mut gradient = vec![0.0; unknowns];
        for i in 0..unknowns {
            for row in 0..rows {
                gradient[i] += jac[(row, i)] * current[row];
            }
            for j in 0..unknowns {
                let mut sum = 0.0;
                for row in 0..rows {
                    sum += jac[(row, i)] * jac[(row, j)];
                }
                normal[(i, j)] = sum;
            }
        }

        let mut accepted = false;
        while damping < MAX_DAMPING {
            let mut damped = normal.clone();
            for i in 0..unknowns {
                let diagonal = normal[(i, i)];
                damped[(i, i)] = diagonal + damping * diagonal.max(1.0e-12);
            }
            let rhs: Vec<f64> = gradient.iter().map(|g| -g).collect();

            let Ok(step) = lu_solve(&damped, &rhs) else {
                damping *= 10.0;
                continue;
            };
            let trial: Vec<f64> = parameters.iter().zip(&step).map(|(x, dx)| x + dx).collect();
            let trial_residuals = evaluate(&residuals, &trial, rows)?;
            let trial_chi2 = chi_squared(&trial_residuals);

            if trial_chi2.is_finite() && trial_chi2 <= chi2 {
                let relative_change = (chi2 - trial_chi2) / chi2.max(f64::MIN_POSITIVE);
                parameters = trial;
                current = trial_residuals;
                chi2 = trial_chi2;
                damping = (damping / 10.0).max(f64::MIN_POSITIVE);
                accepted = true;
                converged = relative_change < options.tolerance || chi2 == 0.0;
                break;
            }
            damping *= 10.0;
        }

        debug!(iterations, chi2, damping, "levenberg-marquardt step");
        if !accepted {
            // No damped step lowers chi-squared any more.
            converged = true;
        }
    }

    Ok(FitReport {
        parameters,
        chi_squared: chi2,
        iterations,
        converged,
    })
}

#[cfg(test)]
mod tests {
    use super::{FitError, FitOptions, fit};
    use crate::domain::{PostError, PostErrorCategory};

    #[test]
    fn recovers_exponential_decay_parameters() {
        let times: Vec<f64> = (0..20).map(|i| i as f64 * 0.25).collect();
        let observed: Vec<f64> = times.iter().map(|t| 2.5 * (-0.8 * t).exp()).collect();

        let report = fit(
            |x: &[f64]| {
                times
                    .iter()
                    .zip(&observed)
                    .map(|(t, y)| x[0] * (-x[1] * t).exp() - y)
                    .collect()
            },
            &[1.0, 0.3],
            FitOptions::default(),
        )
        .expect("fit should run");

        assert!(report.converged);
        assert!((report.parameters[0] - 2.5).abs() < 1e-6);
        assert!((report.parameters[1] - 0.8).abs() < 1e-6);
        assert!(report.chi_squared < 1e-12);
    }

    #[test]
    fn linear_least_squares_matches_normal_equations() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 2.9, 5.1, 7.0];
        let report = fit(
            |p: &[f64]| xs.iter().zip(&ys).map(|(x, y)| p[0] + p[1] * x - y).collect(),
            &[0.0, 0.0],
            FitOptions::default(),
        )
        .expect("fit should run");

        // Closed form for the same data.
        assert!((report.parameters[0] - 0.97).abs() < 1e-6);
        assert!((report.parameters[1] - 2.02).abs() < 1e-6);
    }

    #[test]
    fn invalid_starting_points_are_errors() {
        let error = fit(|_: &[f64]| vec![f64::NAN], &[1.0], FitOptions::default())
            .expect_err("nan residuals");
        assert_eq!(error, FitError::NonFiniteStart);

        let error = fit(|_: &[f64]| vec![1.0], &[], FitOptions::default())
            .expect_err("no parameters");
        let error = PostError::from(error);
        assert_eq!(error.category(), PostErrorCategory::InputValidationError);
        assert_eq!(error.placeholder(), "INPUT.FIT_SHAPE");
    }
}
