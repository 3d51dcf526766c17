use std::f64::consts::PI;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Half-open `[start, stop)` grid with `ceil((stop - start) / step)` points.
pub fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step == 0.0 || !step.is_finite() {
        return Vec::new();
    }
    let count = ((stop - start) / step).ceil();
    if !count.is_finite() || count <= 0.0 {
        return Vec::new();
    }
    (0..count as usize)
        .map(|index| start + index as f64 * step)
        .collect()
}

/// Closed `[min, max]` grid; `max` is kept when it lies on the grid.
pub fn temperature_grid(min: f64, max: f64, step: f64) -> Vec<f64> {
    arange(min, max + step * 1.0e-6, step)
}

/// Trailing moving average. The first `window - 1` entries are the raw
/// values, so the output has the same length as the input.
pub fn running_mean(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 || values.len() < window {
        return values.to_vec();
    }
    let mut output = values[..window - 1].to_vec();
    let mut sum: f64 = values[..window].iter().sum();
    output.push(sum / window as f64);
    for index in window..values.len() {
        sum += values[index] - values[index - window];
        output.push(sum / window as f64);
    }
    output
}

pub fn gaussian_pdf(x: f64, mu: f64, sigma: f64) -> f64 {
    let z = (x - mu) / sigma;
    (-0.5 * z * z).exp() / (sigma * (2.0 * PI).sqrt())
}

/// Maps a pixel coordinate read off a scanned figure onto data units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearCalibration {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearCalibration {
    pub fn from_points(first: (f64, f64), second: (f64, f64)) -> Self {
        let slope = (second.1 - first.1) / (second.0 - first.0);
        Self {
            slope,
            intercept: first.1 - slope * first.0,
        }
    }

    pub fn apply(&self, pixel: f64) -> f64 {
        self.slope * pixel + self.intercept
    }
}
