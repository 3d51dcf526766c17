use tracing::warn;

pub const FILLING_FRACTION_RESOLUTION: f64 = 1.0e-8;
pub const FILLING_FRACTION_MAX_ITERATIONS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bisection {
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Bisects an increasing `function` on `[low, high]` until it is within
/// `resolution` of `target`. Without convergence the last midpoint is
/// returned with `converged == false`.
pub fn bisect<F>(
    function: F,
    target: f64,
    mut low: f64,
    mut high: f64,
    resolution: f64,
    max_iterations: usize,
) -> Bisection
where
    F: Fn(f64) -> f64,
{
    let mut guess = 0.5 * (low + high);
    for iteration in 0..max_iterations {
        guess = 0.5 * (low + high);
        let value = function(guess);
        if (value - target).abs() < resolution {
            return Bisection {
                value: guess,
                iterations: iteration + 1,
                converged: true,
            };
        }
        if value > target {
            high = guess;
        } else {
            low = guess;
        }
    }
    Bisection {
        value: guess,
        iterations: max_iterations,
        converged: false,
    }
}

/// Carnahan-Starling excess free energy per particle over kT.
pub fn carnahan_starling_excess_free_energy(eta: f64) -> f64 {
    (4.0 * eta - 3.0 * eta * eta) / ((1.0 - eta) * (1.0 - eta))
}

pub fn filling_fraction_for_free_energy(free_energy: f64) -> f64 {
    let result = bisect(
        carnahan_starling_excess_free_energy,
        free_energy,
        0.0,
        1.0,
        FILLING_FRACTION_RESOLUTION,
        FILLING_FRACTION_MAX_ITERATIONS,
    );
    if !result.converged {
        warn!(
            free_energy,
            filling_fraction = result.value,
            "bisection did not reach the requested resolution"
        );
    }
    result.value
}
