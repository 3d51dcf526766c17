use crate::domain::{PostError, PostResult};
use crate::numerics::{max, mean, min, running_mean};
use crate::table::{NumericTable, header_integer, header_number};
use std::ops::RangeInclusive;

fn required_header(source: &str, key: &str, placeholder: &'static str) -> PostResult<f64> {
    header_number(source, key).ok_or_else(|| {
        PostError::input_validation(placeholder, format!("missing '# {key}:' header"))
    })
}

/// Converged `ln g(E)` every run is measured against.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDos {
    pub energies: Vec<f64>,
    pub ln_dos: Vec<f64>,
    pub max_entropy_state: i64,
    pub min_important_energy: i64,
}

impl ReferenceDos {
    pub fn from_source(source: &str, table: &NumericTable) -> PostResult<Self> {
        let max_entropy_state =
            required_header(source, "max_entropy_state", "INPUT.COMPARISON_HEADER")?;
        let min_important_energy =
            required_header(source, "min_important_energy", "INPUT.COMPARISON_HEADER")?;
        Ok(Self {
            energies: table.column(0)?,
            ln_dos: table.column(1)?,
            max_entropy_state: max_entropy_state as i64,
            min_important_energy: min_important_energy as i64,
        })
    }

    /// Rows from the maximum-entropy state down to the lowest important
    /// energy, inclusive.
    pub fn important_rows(&self) -> PostResult<RangeInclusive<usize>> {
        important_rows(
            &self.energies,
            self.max_entropy_state,
            self.min_important_energy,
        )
    }
}

/// Energies are stored negated, so state `E` lives in the row holding `-E`.
pub fn energy_row(energies: &[f64], state: i64) -> PostResult<usize> {
    let target = -(state as f64);
    energies
        .iter()
        .position(|energy| *energy == target)
        .ok_or_else(|| {
            PostError::input_validation(
                "INPUT.COMPARISON_ENERGY",
                format!("energy {state} is not present in the table"),
            )
        })
}

pub fn important_rows(
    energies: &[f64],
    max_entropy_state: i64,
    min_important_energy: i64,
) -> PostResult<RangeInclusive<usize>> {
    let start = energy_row(energies, max_entropy_state)?;
    let end = energy_row(energies, min_important_energy)?;
    if end < start {
        return Err(PostError::computation(
            "RUN.COMPARISON_SLICE",
            format!("energy {min_important_energy} precedes {max_entropy_state} in the table"),
        ));
    }
    Ok(start..=end)
}

/// One snapshot of a running simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct DosFrame {
    pub iterations: f64,
    pub energies: Vec<f64>,
    pub ln_dos: Vec<f64>,
    pub round_trips: Vec<f64>,
    /// Transition-matrix estimate, when the run wrote one.
    pub ln_dos_tm: Option<Vec<f64>>,
}

impl DosFrame {
    pub fn from_source(source: &str, table: &NumericTable) -> PostResult<Self> {
        let iterations = header_integer(source, "iterations").ok_or_else(|| {
            PostError::input_validation("INPUT.COMPARISON_ITERATIONS", "missing '# iterations:' header")
        })?;
        let ln_dos_tm = if table.column_count() > 3 {
            Some(table.column(3)?)
        } else {
            None
        };
        Ok(Self {
            iterations: iterations as f64,
            energies: table.column(0)?,
            ln_dos: table.column(1)?,
            round_trips: table.column(2)?,
            ln_dos_tm,
        })
    }

    pub fn round_trips_at(&self, energy: i64) -> PostResult<f64> {
        Ok(self.round_trips[energy_row(&self.energies, energy)?])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameErrors {
    /// Mean absolute entropy error over the important energies.
    pub error_in_entropy: f64,
    pub error_at_energy: f64,
    /// Spread of the error, independent of the normalisation.
    pub max_error: f64,
}

/// Errors of `ln_dos` against the reference after matching their means
/// over the important energies.
pub fn frame_errors(
    ln_dos: &[f64],
    reference: &[f64],
    energy_offset: usize,
) -> PostResult<FrameErrors> {
    if ln_dos.len() != reference.len() || ln_dos.is_empty() {
        return Err(PostError::computation(
            "RUN.COMPARISON_SLICE",
            format!(
                "run covers {} important energies but the reference covers {}",
                ln_dos.len(),
                reference.len()
            ),
        ));
    }
    let norm = mean(ln_dos) - mean(reference);
    let errors: Vec<f64> = ln_dos
        .iter()
        .zip(reference)
        .map(|(value, reference)| value - reference - norm)
        .collect();
    let error_at_energy = *errors.get(energy_offset).ok_or_else(|| {
        PostError::input_validation(
            "INPUT.COMPARISON_ENERGY",
            format!(
                "energy offset {} lies outside the {} important energies",
                energy_offset,
                errors.len()
            ),
        )
    })?;
    Ok(FrameErrors {
        error_in_entropy: errors.iter().map(|error| error.abs()).sum::<f64>() / errors.len() as f64,
        error_at_energy,
        max_error: max(&errors) - min(&errors),
    })
}

/// Length of the longest prefix with non-decreasing iteration counts.
pub fn monotone_prefix(iterations: &[f64]) -> usize {
    if iterations.is_empty() {
        return 0;
    }
    iterations
        .windows(2)
        .position(|pair| pair[1] < pair[0])
        .map_or(iterations.len(), |index| index + 1)
}

/// Error history of one method, one entry per counted frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorHistory {
    pub iterations: Vec<f64>,
    pub round_trips: Vec<f64>,
    pub error_at_energy: Vec<f64>,
    pub error_in_entropy: Vec<f64>,
    pub max_error: Vec<f64>,
}

impl ErrorHistory {
    pub fn push(&mut self, iterations: f64, round_trips: f64, errors: FrameErrors) {
        self.iterations.push(iterations);
        self.round_trips.push(round_trips);
        self.error_at_energy.push(errors.error_at_energy);
        self.error_in_entropy.push(errors.error_in_entropy);
        self.max_error.push(errors.max_error);
    }

    pub fn truncate(&mut self, frames: usize) {
        self.iterations.truncate(frames);
        self.round_trips.truncate(frames);
        self.error_at_energy.truncate(frames);
        self.error_in_entropy.truncate(frames);
        self.max_error.truncate(frames);
    }

    pub fn smooth_max_error(&mut self, window: usize) {
        self.max_error = running_mean(&self.max_error, window);
    }

    pub fn len(&self) -> usize {
        self.iterations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{DosFrame, ReferenceDos, energy_row, frame_errors, monotone_prefix};
    use crate::table::NumericTable;

    #[test]
    fn reference_reads_header_and_negated_energies() {
        let source = "# max_entropy_state: 2\n# min_important_energy: 4\n-1 0\n-2 1\n-3 2\n-4 3\n-5 4\n";
        let table = NumericTable::parse(source).expect("table");
        let reference = ReferenceDos::from_source(source, &table).expect("reference");
        assert_eq!(reference.important_rows().expect("rows"), 1..=3);
        assert_eq!(energy_row(&reference.energies, 5).expect("row"), 4);

        let missing = ReferenceDos::from_source("-1 0\n", &NumericTable::parse("-1 0\n").expect("t"))
            .expect_err("no header");
        assert_eq!(missing.placeholder(), "INPUT.COMPARISON_HEADER");
        assert_eq!(
            energy_row(&reference.energies, 9)
                .expect_err("absent")
                .placeholder(),
            "INPUT.COMPARISON_ENERGY"
        );
    }

    #[test]
    fn errors_are_relative_to_matched_means() {
        let reference = [1.0, 2.0, 3.0];
        let run = [11.0, 12.5, 12.5];
        let errors = frame_errors(&run, &reference, 1).expect("errors");
        // norm = 12 - 2 = 10, residuals [0, 0.5, -0.5].
        assert!((errors.error_at_energy - 0.5).abs() < 1e-12);
        assert!((errors.error_in_entropy - 1.0 / 3.0).abs() < 1e-12);
        assert!((errors.max_error - 1.0).abs() < 1e-12);

        let mismatch = frame_errors(&run[..2], &reference, 0).expect_err("lengths differ");
        assert_eq!(mismatch.placeholder(), "RUN.COMPARISON_SLICE");
    }

    #[test]
    fn frames_stop_at_first_decrease() {
        assert_eq!(monotone_prefix(&[10.0, 20.0, 20.0, 5.0, 30.0]), 3);
        assert_eq!(monotone_prefix(&[10.0]), 1);
        assert_eq!(monotone_prefix(&[1.0, 2.0]), 2);
        assert_eq!(monotone_prefix(&[]), 0);
    }

    #[test]
    fn frame_reads_optional_transition_matrix_column() {
        let source = "# iterations: 1,000\n-1 0.5 3 0.4\n-2 0.7 4 0.6\n";
        let frame = DosFrame::from_source(source, &NumericTable::parse(source).expect("t"))
            .expect("frame");
        assert_eq!(frame.iterations, 1000.0);
        assert_eq!(frame.ln_dos_tm, Some(vec![0.4, 0.6]));
        assert_eq!(frame.round_trips_at(2).expect("row"), 4.0);
    }
}
