use super::serialization::{ColumnFormat, write_columns, write_text_artifact};
use crate::domain::{AnalysisRequest, OutputArtifact, PostError, PostResult};
use crate::plot::{Figure, FigureSize, render_panels};
use crate::table::{NumericTable, read_table_source};
use globset::Glob;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Collects the artifacts an analysis writes under its output directory.
pub(crate) struct ArtifactSink<'a> {
    request: &'a AnalysisRequest,
    figure_size: FigureSize,
    artifacts: Vec<OutputArtifact>,
}

impl<'a> ArtifactSink<'a> {
    pub(crate) fn new(request: &'a AnalysisRequest, figure_size: FigureSize) -> Self {
        Self {
            request,
            figure_size,
            artifacts: Vec::new(),
        }
    }

    fn record(&mut self, relative: PathBuf) -> PathBuf {
        let artifact = OutputArtifact::new(relative);
        let path = self.request.output_path(&artifact);
        self.artifacts.push(artifact);
        path
    }

    pub(crate) fn columns(
        &mut self,
        relative: impl Into<PathBuf>,
        columns: &[&[f64]],
        format: &ColumnFormat,
    ) -> PostResult<()> {
        let path = self.record(relative.into());
        write_columns(&path, columns, format)?;
        info!(analysis = %self.request.analysis, path = %path.display(), "wrote table");
        Ok(())
    }

    pub(crate) fn text(&mut self, relative: impl Into<PathBuf>, content: &str) -> PostResult<()> {
        let path = self.record(relative.into());
        write_text_artifact(&path, content)?;
        info!(analysis = %self.request.analysis, path = %path.display(), "wrote text");
        Ok(())
    }

    pub(crate) fn figure(&mut self, relative: impl Into<PathBuf>, figure: &Figure) -> PostResult<()> {
        self.panels(relative, std::slice::from_ref(figure))
    }

    pub(crate) fn panels(
        &mut self,
        relative: impl Into<PathBuf>,
        figures: &[Figure],
    ) -> PostResult<()> {
        let path = self.record(relative.into());
        render_panels(&path, self.figure_size, figures)?;
        info!(analysis = %self.request.analysis, path = %path.display(), "wrote figure");
        Ok(())
    }

    pub(crate) fn finish(self) -> Vec<OutputArtifact> {
        self.artifacts
    }
}

/// Reads a data table and checks its width, naming the file on failure.
pub(crate) fn load_table(path: &Path, columns: usize) -> PostResult<NumericTable> {
    load_table_source(path, columns).map(|(_, table)| table)
}

pub(crate) fn load_table_source(path: &Path, columns: usize) -> PostResult<(String, NumericTable)> {
    let (source, table) = read_table_source(path)?;
    table.require_columns(columns, &path.display().to_string())?;
    debug!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "loaded table"
    );
    Ok((source, table))
}

pub(crate) fn require_methods(methods: &[String], placeholder: &'static str) -> PostResult<()> {
    if methods.is_empty() {
        return Err(PostError::input_validation(
            placeholder,
            "at least one method is required",
        ));
    }
    Ok(())
}

/// Entries of `directory` whose file name matches `pattern`, sorted by name.
pub(crate) fn matching_entries(directory: &Path, pattern: &str) -> PostResult<Vec<PathBuf>> {
    let matcher = Glob::new(pattern)
        .map_err(|source| {
            PostError::internal(
                "INTERNAL.GLOB_PATTERN",
                format!("invalid discovery pattern '{pattern}': {source}"),
            )
        })?
        .compile_matcher();
    let entries = fs::read_dir(directory).map_err(|source| {
        PostError::io_system(
            "IO.DATA_DIRECTORY",
            format!("failed to list '{}': {}", directory.display(), source),
        )
    })?;

    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| {
            PostError::io_system(
                "IO.DATA_DIRECTORY",
                format!("failed to list '{}': {}", directory.display(), source),
            )
        })?;
        if matcher.is_match(entry.file_name()) {
            matches.push(entry.path());
        }
    }
    matches.sort();
    debug!(directory = %directory.display(), pattern, found = matches.len(), "discovered inputs");
    Ok(matches)
}

/// Distinct methods in first-seen order.
pub(crate) fn distinct_methods(methods: &[String]) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::with_capacity(methods.len());
    for method in methods {
        if !distinct.contains(method) {
            distinct.push(method.clone());
        }
    }
    distinct
}
