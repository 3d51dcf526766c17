//! How flat-histogram methods scale with system size.

mod model;

pub use model::{
    ErrorRow, ErrorScaling, ErrorTable, MethodScaling, ScalingPoint, latex_table, particle_count,
};

use super::AnalysisExecutor;
use super::helpers::{
    ArtifactSink, distinct_methods, load_table, load_table_source, matching_entries,
    require_methods,
};
use super::histogram::SquareWellSystem;
use crate::domain::{AnalysisKind, AnalysisRequest, OutputArtifact, PostError, PostResult};
use crate::numerics::max;
use crate::plot::{Figure, FigureSize, Series, SeriesStyle};
use crate::style::{legend_label, method_color};
use crate::table::header_integer;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ScalingAnalysis {
    pub well_width: f64,
    pub filling_fraction: f64,
    /// Sizes reported in the LaTeX table and searched for error tables.
    pub particle_counts: Vec<usize>,
    pub methods: Vec<String>,
    pub figure_size: FigureSize,
}

impl ScalingAnalysis {
    pub fn new(
        well_width: f64,
        filling_fraction: f64,
        particle_counts: Vec<usize>,
        methods: Vec<String>,
    ) -> Self {
        Self {
            well_width,
            filling_fraction,
            particle_counts,
            methods,
            figure_size: FigureSize::default(),
        }
    }

    /// `ww130-ff30`
    pub fn tag(&self) -> String {
        format!(
            "ww{:02.0}-ff{:02.0}",
            self.well_width * 100.0,
            self.filling_fraction * 100.0
        )
    }

    fn system(&self, particles: usize) -> SquareWellSystem {
        SquareWellSystem::new(self.well_width, self.filling_fraction, particles)
    }

    pub fn discover(&self, request: &AnalysisRequest, method: &str) -> PostResult<MethodScaling> {
        let pattern = format!(
            "periodic-ww{:04.2}-ff{:04.2}-N*-{}-lnw.dat",
            self.well_width, self.filling_fraction, method
        );
        let mut sizes: Vec<usize> = matching_entries(&request.data_root, &pattern)?
            .iter()
            .filter_map(|path| {
                let particles = particle_count(path)?;
                let expected = format!("{}-lnw.dat", self.system(particles).stem(method));
                (path.file_name()? == expected.as_str()).then_some(particles)
            })
            .collect();
        sizes.sort_unstable();
        if sizes.is_empty() {
            warn!(method, pattern = %pattern, "no weight files found for method");
        }

        let mut points = Vec::with_capacity(sizes.len());
        for particles in sizes {
            points.push(self.point(request, method, particles)?);
        }
        Ok(MethodScaling {
            method: method.to_string(),
            points,
        })
    }

    fn point(
        &self,
        request: &AnalysisRequest,
        method: &str,
        particles: usize,
    ) -> PostResult<ScalingPoint> {
        let stem = self.system(particles).stem(method);
        let lnw_path = request.data_path(format!("{stem}-lnw.dat"));
        let (source, _) = load_table_source(&lnw_path, 2)?;
        let initialization_iterations = header_integer(&source, "iterations").ok_or_else(|| {
            PostError::input_validation(
                "INPUT.SCALING_ITERATIONS",
                format!("'{}' has no '# iterations:' header", lnw_path.display()),
            )
        })?;

        let energies = load_table(&request.data_path(format!("{stem}-E.dat")), 2)?;
        let samples = load_table(&request.data_path(format!("{stem}-ps.dat")), 2)?;
        Ok(ScalingPoint {
            particles,
            initialization_iterations,
            min_energy: max(&energies.column(0)?),
            samples: samples.last_row().map(|row| row[1]).unwrap_or(f64::NAN),
        })
    }

    fn error_tables(&self, data_root: &Path) -> PostResult<Vec<(usize, ErrorTable)>> {
        let mut tables = Vec::new();
        for &particles in &self.particle_counts {
            let path = data_root.join(format!("error-table-{}-{}.dat", self.tag(), particles));
            if !path.is_file() {
                warn!(path = %path.display(), "error table missing, skipping size");
                continue;
            }
            let source = fs::read_to_string(&path).map_err(|source| {
                PostError::io_system(
                    "IO.TABLE_READ",
                    format!("failed to read table '{}': {}", path.display(), source),
                )
            })?;
            tables.push((particles, ErrorTable::parse(&source)?));
        }
        Ok(tables)
    }
}

fn scaling_figure<F>(title: String, y_label: &str, methods: &[MethodScaling], value: F) -> Figure
where
    F: Fn(&ScalingPoint) -> f64,
{
    let mut figure = Figure::new(title, "N", y_label);
    for scaling in methods {
        let (n, y) = scaling.column(&value);
        figure.push(Series::from_columns(
            legend_label(&scaling.method),
            &n,
            &y,
            SeriesStyle::line(method_color(&scaling.method)),
        ));
    }
    figure
}

fn error_figure<F>(title: &str, y_label: &str, errors: &ErrorScaling, value: F) -> Figure
where
    F: Fn(&ErrorRow) -> f64,
{
    let mut figure = Figure::new(title, "N", y_label);
    for method in &errors.methods {
        let (n, y) = errors.series(method, &value);
        figure.push(Series::from_columns(
            legend_label(method),
            &n,
            &y,
            SeriesStyle::for_method(method),
        ));
    }
    figure
}

impl AnalysisExecutor for ScalingAnalysis {
    fn execute(&self, request: &AnalysisRequest) -> PostResult<Vec<OutputArtifact>> {
        request.expect_kind(AnalysisKind::Scaling, "INPUT.SCALING_KIND")?;
        require_methods(&self.methods, "INPUT.SCALING_METHODS")?;
        let mut sink = ArtifactSink::new(request, self.figure_size);

        let mut methods = Vec::new();
        for method in distinct_methods(&self.methods) {
            methods.push(self.discover(request, &method)?);
        }
        sink.text(
            format!("scaling-table-{}.tex", self.tag()),
            &latex_table(&methods, &self.particle_counts),
        )?;

        let subtitle = format!("lambda={}, eta={}", self.well_width, self.filling_fraction);
        sink.figure(
            "scaling-iterations.svg",
            &scaling_figure(
                format!("Scaling for {subtitle}"),
                "log10 initialization iterations",
                &methods,
                |point| (point.initialization_iterations as f64).log10(),
            ),
        )?;
        sink.figure(
            "scaling-emin.svg",
            &scaling_figure(format!("Scaling for {subtitle}"), "Emin", &methods, |point| {
                point.min_energy
            }),
        )?;

        let tables = self.error_tables(&request.data_root)?;
        if tables.is_empty() {
            info!("no error tables found, skipping error scaling");
            return Ok(sink.finish());
        }
        let errors = ErrorScaling::collect(tables);
        sink.text("error-scaling.dat", &errors.render())?;

        let title = match errors.min_temperature {
            Some(min_t) => format!("Maximum error with {subtitle}, T_min={min_t}"),
            None => format!("Maximum error with {subtitle}"),
        };
        sink.figure(
            "u-errors.svg",
            &error_figure(&title, "dU/N", &errors, |row| row.u_error),
        )?;
        sink.figure(
            "cv-errors.svg",
            &error_figure(&title, "dCv/N", &errors, |row| row.cv_error),
        )?;
        sink.figure(
            "s-errors.svg",
            &error_figure(&title, "dS/Nk", &errors, |row| row.s_error),
        )?;
        Ok(sink.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::ScalingAnalysis;
    use crate::domain::{AnalysisKind, AnalysisRequest};
    use crate::modules::AnalysisExecutor;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_run(dir: &Path, particles: usize, method: &str, iterations: u64) {
        let stem = format!("periodic-ww1.30-ff0.30-N{particles}-{method}");
        fs::write(
            dir.join(format!("{stem}-lnw.dat")),
            format!("# iterations: {iterations}\n0 0\n1 0.5\n"),
        )
        .expect("lnw");
        fs::write(dir.join(format!("{stem}-E.dat")), "0 10\n7 3\n").expect("E");
        fs::write(dir.join(format!("{stem}-ps.dat")), "0 1\n1 12\n").expect("ps");
    }

    #[test]
    fn discovery_sorts_sizes_and_ignores_other_methods() {
        let temp = TempDir::new().expect("tempdir should be created");
        write_run(temp.path(), 20, "tmmc", 500);
        write_run(temp.path(), 5, "tmmc", 100);
        write_run(temp.path(), 10, "wl-tmmc", 100);

        let analysis = ScalingAnalysis::new(1.3, 0.3, vec![5, 20], vec!["tmmc".to_string()]);
        let request = AnalysisRequest::new("scaling", AnalysisKind::Scaling, temp.path(), temp.path());
        let scaling = analysis.discover(&request, "tmmc").expect("discovery");
        let sizes: Vec<usize> = scaling.points.iter().map(|point| point.particles).collect();
        assert_eq!(sizes, vec![5, 20]);
        assert_eq!(scaling.points[1].initialization_iterations, 500);
        assert_eq!(scaling.points[0].min_energy, 7.0);
        assert_eq!(scaling.points[0].samples, 12.0);
    }

    #[test]
    fn missing_iterations_header_is_an_input_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        write_run(temp.path(), 5, "sad", 1);
        fs::write(
            temp.path().join("periodic-ww1.30-ff0.30-N5-sad-lnw.dat"),
            "0 0\n",
        )
        .expect("lnw");
        let analysis = ScalingAnalysis::new(1.3, 0.3, vec![5], vec!["sad".to_string()]);
        let request = AnalysisRequest::new("scaling", AnalysisKind::Scaling, temp.path(), temp.path());
        let error = analysis.discover(&request, "sad").expect_err("no header");
        assert_eq!(error.placeholder(), "INPUT.SCALING_ITERATIONS");
    }

    #[test]
    fn run_writes_table_and_error_scaling() {
        let temp = TempDir::new().expect("tempdir should be created");
        write_run(temp.path(), 5, "tmmc", 100);
        fs::write(
            temp.path().join("error-table-ww130-ff30-5.dat"),
            "# min_T 0.25\ntmmc 0.1 0 0.2 0 0.3\n",
        )
        .expect("error table");

        let analysis = ScalingAnalysis::new(1.3, 0.3, vec![5, 10], vec!["tmmc".to_string()]);
        let request = AnalysisRequest::new(
            "scaling",
            AnalysisKind::Scaling,
            temp.path(),
            temp.path().join("figs"),
        );
        let artifacts = analysis.execute(&request).expect("scaling");
        let names: Vec<String> = artifacts
            .iter()
            .map(|artifact| artifact.relative_path.display().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "scaling-table-ww130-ff30.tex",
                "scaling-iterations.svg",
                "scaling-emin.svg",
                "error-scaling.dat",
                "u-errors.svg",
                "cv-errors.svg",
                "s-errors.svg",
            ]
        );
        let tex = fs::read_to_string(request.output_path(&artifacts[0])).expect("tex");
        assert!(tex.contains(" N = 10 \\\\\n  initialization & -- \\\\\n"));
    }
}
