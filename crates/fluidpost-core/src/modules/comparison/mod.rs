//! Convergence of running density-of-states estimates against a reference.

mod model;

pub use model::{
    DosFrame, ErrorHistory, FrameErrors, ReferenceDos, energy_row, frame_errors, important_rows,
    monotone_prefix,
};

use super::AnalysisExecutor;
use super::helpers::{ArtifactSink, distinct_methods, load_table_source, matching_entries};
use super::serialization::ColumnFormat;
use crate::domain::{AnalysisKind, AnalysisRequest, OutputArtifact, PostResult};
use crate::plot::FigureSize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonAnalysis {
    /// Energy whose error and round trips are tracked per frame.
    pub energy: i64,
    /// Reference table, relative to the data root.
    pub reference: PathBuf,
    pub file_base: String,
    /// Empty means every `{file_base}-*-movie` directory.
    pub methods: Vec<String>,
    pub running_mean_window: Option<usize>,
    pub figure_size: FigureSize,
}

/// Errors of one method, plus the transition-matrix variant when every
/// counted frame carries it.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodComparison {
    pub method: String,
    pub direct: ErrorHistory,
    pub transition_matrix: Option<ErrorHistory>,
}

impl ComparisonAnalysis {
    pub fn new(energy: i64, reference: impl Into<PathBuf>, file_base: impl Into<String>) -> Self {
        Self {
            energy,
            reference: reference.into(),
            file_base: file_base.into(),
            methods: Vec::new(),
            running_mean_window: None,
            figure_size: FigureSize::default(),
        }
    }

    fn movie_dir(&self, data_root: &Path, method: &str) -> PathBuf {
        data_root.join(format!("{}-{}-movie", self.file_base, method))
    }

    pub fn methods(&self, data_root: &Path) -> PostResult<Vec<String>> {
        if !self.methods.is_empty() {
            return Ok(distinct_methods(&self.methods));
        }
        let prefix = format!("{}-", self.file_base);
        let discovered = matching_entries(data_root, &format!("{}-*-movie", self.file_base))?
            .iter()
            .filter(|path| path.is_dir())
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?;
                let method = name.strip_prefix(&prefix)?.strip_suffix("-movie")?;
                Some(method.to_string())
            })
            .collect();
        Ok(discovered)
    }

    pub fn compare_method(
        &self,
        data_root: &Path,
        reference: &ReferenceDos,
        method: &str,
    ) -> PostResult<Option<MethodComparison>> {
        let movie = self.movie_dir(data_root, method);
        let frames = if movie.is_dir() {
            matching_entries(&movie, "*lndos.dat")?
        } else {
            Vec::new()
        };
        if frames.is_empty() {
            warn!(method, directory = %movie.display(), "no lndos frames, skipping method");
            return Ok(None);
        }

        let reference_rows = reference.important_rows()?;
        let reference_slice = &reference.ln_dos[reference_rows];
        let offset = usize::try_from(self.energy - reference.max_entropy_state).unwrap_or(usize::MAX);

        let mut direct = ErrorHistory::default();
        let mut transition_matrix = Some(ErrorHistory::default());
        for path in &frames {
            let (source, table) = load_table_source(path, 3)?;
            let frame = DosFrame::from_source(&source, &table)?;
            let rows = important_rows(
                &frame.energies,
                reference.max_entropy_state,
                reference.min_important_energy,
            )?;
            let round_trips = frame.round_trips_at(self.energy)?;

            let errors = frame_errors(&frame.ln_dos[rows.clone()], reference_slice, offset)?;
            direct.push(frame.iterations, round_trips, errors);

            transition_matrix = match (transition_matrix, &frame.ln_dos_tm) {
                (Some(mut history), Some(ln_dos_tm)) => {
                    let errors = frame_errors(&ln_dos_tm[rows], reference_slice, offset)?;
                    history.push(frame.iterations, round_trips, errors);
                    Some(history)
                }
                _ => None,
            };
        }

        let counted = monotone_prefix(&direct.iterations);
        if counted < frames.len() {
            info!(
                method,
                counted,
                frames = frames.len(),
                "iteration count decreased, ignoring later frames"
            );
        }
        direct.truncate(counted);
        if let Some(window) = self.running_mean_window {
            direct.smooth_max_error(window);
        }
        if let Some(history) = transition_matrix.as_mut() {
            history.truncate(counted);
            if let Some(window) = self.running_mean_window {
                history.smooth_max_error(window);
            }
        }

        Ok(Some(MethodComparison {
            method: method.to_string(),
            direct,
            transition_matrix,
        }))
    }

    fn write_history(
        &self,
        sink: &mut ArtifactSink<'_>,
        directory: &Path,
        history: &ErrorHistory,
    ) -> PostResult<()> {
        let format = ColumnFormat::with_precision(4).tab_separated();
        sink.columns(
            directory.join(format!("energy-{}.txt", self.energy)),
            &[&history.round_trips, &history.error_at_energy],
            &format.clone().header("round trips\tdoserror"),
        )?;
        sink.columns(
            directory.join("errors.txt"),
            &[
                &history.iterations,
                &history.error_in_entropy,
                &history.max_error,
            ],
            &format.header("iterations\terrorinentropy\tmaxerror"),
        )
    }
}

impl AnalysisExecutor for ComparisonAnalysis {
    fn execute(&self, request: &AnalysisRequest) -> PostResult<Vec<OutputArtifact>> {
        request.expect_kind(AnalysisKind::DosComparison, "INPUT.COMPARISON_KIND")?;
        let (source, table) = load_table_source(&request.data_path(&self.reference), 2)?;
        let reference = ReferenceDos::from_source(&source, &table)?;
        info!(
            max_entropy_state = reference.max_entropy_state,
            min_important_energy = reference.min_important_energy,
            "loaded reference density of states"
        );

        let mut sink = ArtifactSink::new(request, self.figure_size);
        for method in self.methods(&request.data_root)? {
            let Some(comparison) = self.compare_method(&request.data_root, &reference, &method)?
            else {
                continue;
            };
            let directory = PathBuf::from("comparison").join(format!("{}-{}", self.file_base, method));
            self.write_history(&mut sink, &directory, &comparison.direct)?;
            if let Some(history) = &comparison.transition_matrix {
                let directory =
                    PathBuf::from("comparison").join(format!("{}-{}-tm", self.file_base, method));
                self.write_history(&mut sink, &directory, history)?;
            }
        }
        Ok(sink.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::ComparisonAnalysis;
    use crate::domain::{AnalysisKind, AnalysisRequest};
    use crate::modules::AnalysisExecutor;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const REFERENCE: &str =
        "# max_entropy_state: 1\n# min_important_energy: 3\n-0 0\n-1 1\n-2 2\n-3 3\n";

    fn write_frame(dir: &Path, name: &str, iterations: u64, ln_dos: [f64; 4], tm: bool) {
        let mut content = format!("# iterations: {iterations}\n");
        for (index, value) in ln_dos.iter().enumerate() {
            if tm {
                content.push_str(&format!("-{index} {value} {} {value}\n", index + 10));
            } else {
                content.push_str(&format!("-{index} {value} {}\n", index + 10));
            }
        }
        fs::write(dir.join(name), content).expect("frame");
    }

    #[test]
    fn methods_are_discovered_from_movie_directories() {
        let temp = TempDir::new().expect("tempdir should be created");
        for dir in ["s000-sad3-movie", "s000-tmmc-movie", "other-tmmc-movie"] {
            fs::create_dir_all(temp.path().join(dir)).expect("dir");
        }
        let analysis = ComparisonAnalysis::new(2, "ref.dat", "s000");
        assert_eq!(
            analysis.methods(temp.path()).expect("methods"),
            vec!["sad3", "tmmc"]
        );
    }

    #[test]
    fn run_writes_direct_and_transition_matrix_errors() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::write(temp.path().join("ref.dat"), REFERENCE).expect("reference");
        let movie = temp.path().join("s000-tmmc-movie");
        fs::create_dir_all(&movie).expect("movie");
        write_frame(&movie, "000001-lndos.dat", 100, [5.0, 1.0, 2.0, 3.0], true);
        write_frame(&movie, "000002-lndos.dat", 200, [5.0, 1.0, 2.5, 3.0], true);
        write_frame(&movie, "000003-lndos.dat", 50, [5.0, 1.0, 2.0, 3.0], true);

        let request = AnalysisRequest::new(
            "compare",
            AnalysisKind::DosComparison,
            temp.path(),
            temp.path().join("out"),
        );
        let artifacts = ComparisonAnalysis::new(2, "ref.dat", "s000")
            .execute(&request)
            .expect("comparison");
        let names: Vec<String> = artifacts
            .iter()
            .map(|artifact| artifact.relative_path.display().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "comparison/s000-tmmc/energy-2.txt",
                "comparison/s000-tmmc/errors.txt",
                "comparison/s000-tmmc-tm/energy-2.txt",
                "comparison/s000-tmmc-tm/errors.txt",
            ]
        );

        let errors = fs::read_to_string(request.output_path(&artifacts[1])).expect("errors");
        // Third frame has fewer iterations than the second and is dropped.
        assert_eq!(
            errors,
            "# iterations\terrorinentropy\tmaxerror\n100\t0\t0\n200\t0.2222\t0.5\n"
        );
        let energy = fs::read_to_string(request.output_path(&artifacts[0])).expect("energy");
        assert_eq!(energy, "# round trips\tdoserror\n12\t0\n12\t0.3333\n");
    }

    #[test]
    fn methods_without_frames_are_skipped() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::write(temp.path().join("ref.dat"), REFERENCE).expect("reference");
        let request = AnalysisRequest::new(
            "compare",
            AnalysisKind::DosComparison,
            temp.path(),
            temp.path().join("out"),
        );
        let mut analysis = ComparisonAnalysis::new(2, "ref.dat", "s000");
        analysis.methods = vec!["sad".to_string()];
        let artifacts = analysis.execute(&request).expect("comparison");
        assert!(artifacts.is_empty());
    }
}
