use crate::domain::{PostError, PostResult};
use crate::numerics::max;
use crate::table::{NumericTable, token_after};
use std::f64::consts::LOG10_E;

/// Periodic square-well system a histogram run was made for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareWellSystem {
    pub well_width: f64,
    pub filling_fraction: f64,
    pub particles: usize,
}

impl SquareWellSystem {
    pub fn new(well_width: f64, filling_fraction: f64, particles: usize) -> Self {
        Self {
            well_width,
            filling_fraction,
            particles,
        }
    }

    /// `periodic-ww1.30-ff0.30-N20-tmmc`
    pub fn stem(&self, method: &str) -> String {
        format!(
            "periodic-ww{:04.2}-ff{:04.2}-N{}-{}",
            self.well_width, self.filling_fraction, self.particles, method
        )
    }

    pub fn describe(&self) -> String {
        format!(
            "lambda={}, eta={}, N={}",
            self.well_width, self.filling_fraction, self.particles
        )
    }

    /// Simulation energies are stored as positive well counts.
    pub fn energy_per_particle(&self, energies: &[f64]) -> Vec<f64> {
        let n = self.particles as f64;
        energies.iter().map(|energy| -energy / n).collect()
    }
}

/// `ln g(E)` recovered from a flat-histogram run: `ln H(E) - ln w(E)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedLnDos {
    /// Raw histogram energies of the bins that were visited.
    pub energies: Vec<f64>,
    pub ln_dos: Vec<f64>,
    pub ln_weight: Vec<f64>,
}

impl WeightedLnDos {
    /// Unvisited bins carry no information and are dropped.
    pub fn from_tables(histogram: &NumericTable, weights: &NumericTable) -> PostResult<Self> {
        let energies = histogram.column(0)?;
        let counts = histogram.column(1)?;
        let ln_w = weights.column(1)?;

        let mut result = Self {
            energies: Vec::new(),
            ln_dos: Vec::new(),
            ln_weight: Vec::new(),
        };
        for (&energy, &count) in energies.iter().zip(&counts) {
            if count <= 0.0 {
                continue;
            }
            let index = weight_index(energy, ln_w.len())?;
            result.energies.push(energy);
            result.ln_dos.push(count.ln() - ln_w[index]);
            result.ln_weight.push(ln_w[index]);
        }
        Ok(result)
    }

    pub fn len(&self) -> usize {
        self.energies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }
}

fn weight_index(energy: f64, rows: usize) -> PostResult<usize> {
    let index = energy.trunc();
    if !index.is_finite() || index < 0.0 || index as usize >= rows {
        return Err(PostError::input_validation(
            "INPUT.DOS_WEIGHT_INDEX",
            format!("energy {energy} has no row in a weight table of {rows} rows"),
        ));
    }
    Ok(index as usize)
}

/// Density of states and inverse weights in decades, both peaking at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityOfStates {
    pub energy_per_particle: Vec<f64>,
    pub log10_dos: Vec<f64>,
    pub log10_inverse_weight: Vec<f64>,
}

impl DensityOfStates {
    pub fn new(system: &SquareWellSystem, weighted: &WeightedLnDos) -> Self {
        let log10_dos = shift_to_zero_max(weighted.ln_dos.iter().map(|v| v * LOG10_E).collect());
        let log10_inverse_weight =
            shift_to_zero_max(weighted.ln_weight.iter().map(|v| -v * LOG10_E).collect());
        Self {
            energy_per_particle: system.energy_per_particle(&weighted.energies),
            log10_dos,
            log10_inverse_weight,
        }
    }

    /// Lowest value of either curve, never above zero.
    pub fn min_log(&self) -> f64 {
        self.log10_dos
            .iter()
            .chain(&self.log10_inverse_weight)
            .copied()
            .fold(0.0, f64::min)
    }
}

fn shift_to_zero_max(mut values: Vec<f64>) -> Vec<f64> {
    let peak = max(&values);
    if peak.is_finite() {
        for value in &mut values {
            *value -= peak;
        }
    }
    values
}

/// Iterations needed per round trip, binned by energy.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRate {
    pub iterations: f64,
    pub energy_per_particle: Vec<f64>,
    pub iterations_per_sample: Vec<f64>,
}

impl SampleRate {
    pub fn from_source(
        system: &SquareWellSystem,
        source: &str,
        table: &NumericTable,
    ) -> PostResult<Self> {
        let iterations = token_after(source, "iterations:")
            .and_then(|token| token.parse::<f64>().ok())
            .ok_or_else(|| {
                PostError::input_validation(
                    "INPUT.SAMPLE_ITERATIONS",
                    "sample table has no 'iterations:' entry",
                )
            })?;

        let energies = table.column(0)?;
        let round_trips = table.column(1)?;
        let (visited, trips): (Vec<f64>, Vec<f64>) = energies
            .iter()
            .zip(&round_trips)
            .filter(|(_, trips)| **trips != 0.0)
            .map(|(energy, trips)| (*energy, *trips))
            .unzip();

        Ok(Self {
            iterations,
            energy_per_particle: system.energy_per_particle(&visited),
            iterations_per_sample: trips.iter().map(|trips| iterations / trips).collect(),
        })
    }

    pub fn has_samples(&self) -> bool {
        !self.iterations_per_sample.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{DensityOfStates, SampleRate, SquareWellSystem, WeightedLnDos};
    use crate::table::NumericTable;

    fn table(source: &str) -> NumericTable {
        NumericTable::parse(source).expect("fixture table")
    }

    #[test]
    fn stem_pads_parameters() {
        let system = SquareWellSystem::new(1.3, 0.3, 20);
        assert_eq!(system.stem("tmmc"), "periodic-ww1.30-ff0.30-N20-tmmc");
        assert_eq!(system.energy_per_particle(&[40.0, 0.0])[0], -2.0);
    }

    #[test]
    fn weights_are_looked_up_by_energy_and_empty_bins_dropped() {
        let histogram = table("0 10\n1 0\n2 100\n");
        let weights = table("0 0.0\n1 5.0\n2 1.0\n");
        let weighted = WeightedLnDos::from_tables(&histogram, &weights).expect("dos");
        assert_eq!(weighted.energies, vec![0.0, 2.0]);
        assert!((weighted.ln_dos[0] - 10f64.ln()).abs() < 1e-12);
        assert!((weighted.ln_dos[1] - (100f64.ln() - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn energy_outside_weight_table_is_rejected() {
        let error = WeightedLnDos::from_tables(&table("5 1\n"), &table("0 0\n1 0\n"))
            .expect_err("index out of range");
        assert_eq!(error.placeholder(), "INPUT.DOS_WEIGHT_INDEX");
    }

    #[test]
    fn density_of_states_peaks_at_zero() {
        let system = SquareWellSystem::new(1.5, 0.2, 2);
        let weighted = WeightedLnDos::from_tables(&table("0 1\n2 100\n"), &table("0 0\n1 0\n2 0\n"))
            .expect("dos");
        let dos = DensityOfStates::new(&system, &weighted);
        assert_eq!(dos.energy_per_particle, vec![-0.0, -1.0]);
        assert!((dos.log10_dos[0] + 2.0).abs() < 1e-12);
        assert_eq!(dos.log10_dos[1], 0.0);
        assert_eq!(dos.log10_inverse_weight, vec![0.0, 0.0]);
        assert!((dos.min_log() + 2.0).abs() < 1e-12);
    }

    #[test]
    fn sample_rate_reads_iterations_with_separators() {
        let system = SquareWellSystem::new(1.3, 0.3, 10);
        let source = "# iterations: 1,000\n10 4\n20 0\n";
        let rate = SampleRate::from_source(&system, source, &table(source)).expect("rate");
        assert_eq!(rate.iterations, 1000.0);
        assert_eq!(rate.energy_per_particle, vec![-1.0]);
        assert_eq!(rate.iterations_per_sample, vec![250.0]);

        let missing = SampleRate::from_source(&system, "1 1\n", &table("1 1\n"))
            .expect_err("no iterations");
        assert_eq!(missing.placeholder(), "INPUT.SAMPLE_ITERATIONS");
    }
}
