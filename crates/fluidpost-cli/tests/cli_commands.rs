use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_fluidpost(working_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_fluidpost"))
        .current_dir(working_dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("fluidpost should run")
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent directory should be created");
    }
    fs::write(path, content).expect("fixture should be written");
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn free_energy_prints_written_artifacts() {
    let temp = TempDir::new().expect("tempdir should be created");
    write_file(
        &temp.path().join("data/homogeneous/ww1.3-kT1.dat"),
        "0.1 0 1 2 3\n0.2 0 4 5 6\n",
    );
    write_file(
        &temp.path().join("data/homogeneous/ww1.3-kT2.dat"),
        "0.1 0 1.5 2.5 3.5\n",
    );

    let output = run_fluidpost(
        temp.path(),
        &[
            "--data-root",
            "data",
            "--output-root",
            "figs",
            "-q",
            "free-energy",
            "--temperatures",
            "1,2",
        ],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let lines = stdout_lines(&output);
    assert_eq!(
        lines,
        vec!["figs/free-energy.dat", "figs/free-energy-vs-eta.svg"]
    );
    let table = fs::read_to_string(temp.path().join("figs/free-energy.dat")).expect("table");
    assert_eq!(table.lines().count(), 4);
    let figure = fs::read_to_string(temp.path().join("figs/free-energy-vs-eta.svg")).expect("svg");
    assert!(figure.contains("<svg"));
}

#[test]
fn missing_input_reports_placeholder_and_exit_code() {
    let temp = TempDir::new().expect("tempdir should be created");
    let output = run_fluidpost(temp.path(), &["coexistence"]);

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [IO.TABLE_READ]"), "stderr: {stderr}");
    assert!(stderr.contains("npart_RG-i0-out.dat"));
    assert!(stderr.contains("FATAL EXIT CODE: 3"));
}

#[test]
fn usage_errors_exit_with_input_code() {
    let temp = TempDir::new().expect("tempdir should be created");
    let output = run_fluidpost(temp.path(), &["histogram", "--ww", "1.3"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[INPUT.CLI_USAGE]"));
    assert!(stderr.contains("FATAL EXIT CODE: 2"));
}

#[test]
fn config_file_supplies_roots_and_temperatures() {
    let temp = TempDir::new().expect("tempdir should be created");
    write_file(
        &temp.path().join("fluidpost.json"),
        r#"{
          "dataRoot": "runs",
          "outputRoot": "plots",
          "temperatures": { "min": 0.5, "max": 1.0, "step": 0.25 },
          "figure": { "width": 640, "height": 480 }
        }"#,
    );
    write_file(
        &temp.path().join("runs/periodic-ww1.30-ff0.30-N2-tmmc-E.dat"),
        "0 10\n2 10\n",
    );
    write_file(
        &temp.path().join("runs/periodic-ww1.30-ff0.30-N2-tmmc-lnw.dat"),
        "0 0\n1 0\n2 0\n",
    );

    let output = run_fluidpost(
        temp.path(),
        &["thermo", "--ww", "1.3", "--ff", "0.3", "-N", "2", "--methods", "tmmc"],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(stdout_lines(&output).len(), 4);

    let table = fs::read_to_string(temp.path().join("plots/thermo-tmmc.dat")).expect("table");
    // Header lines plus T = 0.5, 0.75, 1.0.
    assert_eq!(table.lines().count(), 2 + 3);
    let figure = fs::read_to_string(temp.path().join("plots/thermo-u.svg")).expect("svg");
    assert!(figure.contains("width=\"640\""));
}

#[test]
fn malformed_config_is_reported() {
    let temp = TempDir::new().expect("tempdir should be created");
    write_file(&temp.path().join("fluidpost.json"), r#"{ "dataRoot": 3 }"#);
    let output = run_fluidpost(temp.path(), &["coexistence"]);

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[IO.CLI] failed to parse config 'fluidpost.json'"));
}

#[test]
fn launch_dry_run_prints_srun_lines() {
    let temp = TempDir::new().expect("tempdir should be created");
    let output = run_fluidpost(
        temp.path(),
        &[
            "--data-root",
            ".",
            "launch",
            "absolute",
            "--ww",
            "1.3",
            "--length",
            "5",
            "--sizes",
            "2",
            "--srun-mem",
            "60",
            "--dry-run",
        ],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let lines = stdout_lines(&output);
    assert!(!lines.is_empty());
    assert!(lines[0].starts_with("srun --mem=60 -J N002-00000 free-energy-monte-carlo --ff "));
    assert!(lines[0].contains("--sc_period 10 --iterations 1000000 --filename 00000"));
    assert!(lines[0].ends_with("N002/absolute/00000.out 2>&1 &"));
    assert!(!temp.path().join("scrunched-ww1.30-L5.00").exists());
}

#[test]
fn soft_sphere_launch_uses_density_in_names() {
    let temp = TempDir::new().expect("tempdir should be created");
    let output = run_fluidpost(
        temp.path(),
        &[
            "launch",
            "soft",
            "--kind",
            "fcc",
            "--density",
            "0.76",
            "--temperature",
            "2.5",
            "--potential",
            "wca",
            "--program",
            "./soft-monte-carlo",
            "--dry-run",
        ],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_lines(&output),
        vec![
            "./soft-monte-carlo 3627 0.01 0.001 figs/mcwca-0.7600-2.5000.dat periodxyz 30 kT 2.5 \
             potential wca fcc 21.6956 > figs/mcwca-0.7600-2.5000.out 2>&1 &"
        ]
    );
}
