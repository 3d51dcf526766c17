//! Canonical averages from a tabulated (log) density of states.
//!
//! Every temperature is handled by shifting the Boltzmann exponents by their
//! maximum before exponentiating, so sharply peaked entropies stay finite.

use crate::domain::{PostError, PostResult};

pub const DEFAULT_MIN_T_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanonicalProperties {
    pub temperatures: Vec<f64>,
    pub internal_energy: Vec<f64>,
    pub heat_capacity: Vec<f64>,
    pub entropy: Vec<f64>,
}

struct BoltzmannWeights {
    probabilities: Vec<f64>,
    ln_partition: f64,
}

fn boltzmann_weights(temperature: f64, energies: &[f64], ln_dos: &[f64]) -> BoltzmannWeights {
    let exponents: Vec<f64> = ln_dos
        .iter()
        .zip(energies)
        .map(|(ln_g, energy)| ln_g - energy / temperature)
        .collect();
    let shift = exponents
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let mut probabilities: Vec<f64> = exponents.iter().map(|a| (a - shift).exp()).collect();
    let total: f64 = probabilities.iter().sum();
    for probability in &mut probabilities {
        *probability /= total;
    }
    BoltzmannWeights {
        probabilities,
        ln_partition: shift + total.ln(),
    }
}

fn check_lengths(energies: &[f64], ln_dos: &[f64]) -> PostResult<()> {
    if energies.len() != ln_dos.len() {
        return Err(PostError::input_validation(
            "INPUT.THERMO_LENGTH",
            format!(
                "{} energies but {} entropy values",
                energies.len(),
                ln_dos.len()
            ),
        ));
    }
    if energies.is_empty() {
        return Err(PostError::input_validation(
            "INPUT.THERMO_LENGTH",
            "no energy levels to average over",
        ));
    }
    Ok(())
}

fn moments(probabilities: &[f64], energies: &[f64]) -> (f64, f64) {
    let mean: f64 = energies.iter().zip(probabilities).map(|(e, p)| e * p).sum();
    let variance: f64 = energies
        .iter()
        .zip(probabilities)
        .map(|(e, p)| (e - mean).powi(2) * p)
        .sum();
    (mean, variance)
}

/// Heat capacity `C(T) = var(E) / T^2 + offset` with weights
/// `exp(S_i - E_i / T)`. The offset carries the kinetic contribution.
pub fn heat_capacity(
    temperatures: &[f64],
    energies: &[f64],
    entropy: &[f64],
    offset: f64,
) -> PostResult<Vec<f64>> {
    check_lengths(energies, entropy)?;
    Ok(temperatures
        .iter()
        .map(|&temperature| {
            let weights = boltzmann_weights(temperature, energies, entropy);
            let (_, variance) = moments(&weights.probabilities, energies);
            variance / (temperature * temperature) + offset
        })
        .collect())
}

pub fn canonical_properties(
    temperatures: &[f64],
    energies: &[f64],
    ln_dos: &[f64],
) -> PostResult<CanonicalProperties> {
    check_lengths(energies, ln_dos)?;
    let normalized = normalize_ln_dos(ln_dos);

    let mut properties = CanonicalProperties {
        temperatures: temperatures.to_vec(),
        ..CanonicalProperties::default()
    };
    for &temperature in temperatures {
        let weights = boltzmann_weights(temperature, energies, &normalized);
        let (internal_energy, variance) = moments(&weights.probabilities, energies);
        let free_energy = -temperature * weights.ln_partition;
        properties.internal_energy.push(internal_energy);
        properties
            .heat_capacity
            .push(variance / (temperature * temperature));
        properties
            .entropy
            .push((internal_energy - free_energy) / temperature);
    }
    Ok(properties)
}

/// Lowest temperature at which the ground state (lowest sampled energy) is
/// no longer the majority of the canonical ensemble. Below it the density
/// of states is too poorly resolved to trust.
pub fn minimum_temperature(
    temperatures: &[f64],
    energies: &[f64],
    ln_dos: &[f64],
    threshold: f64,
) -> PostResult<f64> {
    check_lengths(energies, ln_dos)?;
    let ground = energies
        .iter()
        .enumerate()
        .min_by(|lhs, rhs| lhs.1.total_cmp(rhs.1))
        .map(|(index, _)| index)
        .unwrap_or(0);

    let mut sorted = temperatures.to_vec();
    sorted.sort_by(f64::total_cmp);
    for &temperature in &sorted {
        let weights = boltzmann_weights(temperature, energies, ln_dos);
        if weights.probabilities[ground] < threshold {
            return Ok(temperature);
        }
    }
    sorted.last().copied().ok_or_else(|| {
        PostError::input_validation("INPUT.THERMO_TEMPERATURES", "temperature grid is empty")
    })
}

fn normalize_ln_dos(ln_dos: &[f64]) -> Vec<f64> {
    let shift = ln_dos.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let total: f64 = ln_dos.iter().map(|value| (value - shift).exp()).sum();
    let ln_total = shift + total.ln();
    ln_dos.iter().map(|value| value - ln_total).collect()
}
