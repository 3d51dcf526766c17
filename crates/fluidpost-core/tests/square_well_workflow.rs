use fluidpost_core::domain::{AnalysisKind, AnalysisRequest, PostErrorCategory};
use fluidpost_core::modules::AnalysisExecutor;
use fluidpost_core::modules::histogram::{HistogramAnalysis, HistogramPlot, SquareWellSystem};
use fluidpost_core::modules::thermodynamics::ThermodynamicsAnalysis;
use fluidpost_core::table::read_table;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const STEM: &str = "periodic-ww1.30-ff0.30-N4";

fn write_run(dir: &Path, method: &str) {
    fs::create_dir_all(dir).expect("run directory should be created");
    // Four well counts with a flat weight, so ln DoS is ln(count).
    fs::write(
        dir.join(format!("{STEM}-{method}-E.dat")),
        "0 1\n1 4\n2 6\n3 4\n4 1\n",
    )
    .expect("histogram");
    fs::write(
        dir.join(format!("{STEM}-{method}-lnw.dat")),
        "# iterations: 1,000\n0 0\n1 0\n2 0\n3 0\n4 0\n",
    )
    .expect("weights");
}

fn methods() -> Vec<String> {
    vec!["tmmc".to_string(), "wl".to_string()]
}

#[test]
fn histogram_dos_and_thermodynamics_agree_on_one_dataset() {
    let temp = TempDir::new().expect("tempdir should be created");
    for method in ["tmmc", "wl"] {
        write_run(temp.path(), method);
        write_run(&temp.path().join("s000"), method);
    }
    let system = SquareWellSystem::new(1.3, 0.3, 4);
    let output = temp.path().join("figs");

    let histogram = HistogramAnalysis::new(HistogramPlot::EnergyHistogram, system, methods());
    let request = AnalysisRequest::new("histogram", AnalysisKind::EnergyHistogram, temp.path(), &output);
    let artifacts = histogram.execute(&request).expect("energy histogram");
    assert_eq!(artifacts.len(), 3);

    let dos = HistogramAnalysis::new(
        HistogramPlot::DensityOfStates { seed: 0 },
        system,
        methods(),
    );
    let request = AnalysisRequest::new("dos", AnalysisKind::DensityOfStates, temp.path(), &output);
    let artifacts = dos.execute(&request).expect("density of states");
    let table = read_table(&request.output_path(&artifacts[0])).expect("dos table");
    assert_eq!(table.row_count(), 5);
    let log_dos = table.column(1).expect("log10 dos");
    assert_eq!(log_dos.iter().copied().fold(f64::NEG_INFINITY, f64::max), 0.0);
    assert!((log_dos[0] - (1.0f64 / 6.0).log10()).abs() < 1e-5);

    let mut thermo = ThermodynamicsAnalysis::new(system, methods());
    thermo.temperatures = vec![0.1, 1.0, 100.0];
    let request = AnalysisRequest::new("thermo", AnalysisKind::Thermodynamics, temp.path(), &output);
    let artifacts = thermo.execute(&request).expect("thermodynamics");
    assert_eq!(artifacts.len(), 2 + 3);

    let curve = thermo.method(&request, "tmmc").expect("tmmc curve");
    // Binomial degeneracy: at high T the mean well count approaches 2 of 4.
    assert!((curve.internal_energy[2] + 0.5).abs() < 0.01);
    // Cold limit sits in the single deepest state.
    assert!((curve.internal_energy[0] + 1.0).abs() < 1e-3);
    assert!(curve.heat_capacity.iter().all(|cv| *cv >= 0.0));
}

#[test]
fn every_analysis_rejects_a_foreign_request() {
    let request = AnalysisRequest::new("mixed", AnalysisKind::Coexistence, "data", "figs");
    let thermo = ThermodynamicsAnalysis::new(SquareWellSystem::new(1.3, 0.3, 4), methods());
    let error = thermo.execute(&request).expect_err("wrong kind");
    assert_eq!(error.category(), PostErrorCategory::InputValidationError);
    assert_eq!(error.placeholder(), "INPUT.THERMO_KIND");

    let histogram = HistogramAnalysis::new(
        HistogramPlot::SampleRate,
        SquareWellSystem::new(1.3, 0.3, 4),
        methods(),
    );
    let error = histogram.execute(&request).expect_err("wrong kind");
    assert_eq!(error.placeholder(), "INPUT.SAMPLES_KIND");
}
