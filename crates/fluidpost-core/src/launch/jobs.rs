use super::JobSpec;
use crate::modules::serialization::format_general;
use crate::numerics::{arange, filling_fraction_for_free_energy};
use std::f64::consts::{LN_2, PI};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_LADDER_ITERATIONS: u64 = 1_000_000;

/// Filling fractions whose Carnahan-Starling excess free energy steps by
/// `ln 2` up to `20 kT`.
pub fn ladder_filling_fractions() -> Vec<f64> {
    arange(LN_2, 20.0, LN_2)
        .into_iter()
        .map(filling_fraction_for_free_energy)
        .collect()
}

/// Absolute free-energy runs that compress N spheres of radius `radius`
/// into a cube of side `box_length`, one rung of the ladder at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsoluteLadder {
    pub recursion: u32,
    pub well_width: f64,
    pub box_length: f64,
    pub particle_counts: Vec<usize>,
    pub program: PathBuf,
    pub radius: f64,
    pub iterations: u64,
    pub overwrite: bool,
}

impl AbsoluteLadder {
    pub fn new(
        recursion: u32,
        well_width: f64,
        box_length: f64,
        particle_counts: Vec<usize>,
        program: impl Into<PathBuf>,
    ) -> Self {
        Self {
            recursion,
            well_width,
            box_length,
            particle_counts,
            program: program.into(),
            radius: 1.0,
            iterations: DEFAULT_LADDER_ITERATIONS,
            overwrite: false,
        }
    }

    pub fn directory(&self, particles: usize) -> PathBuf {
        PathBuf::from(format!(
            "scrunched-ww{:4.2}-L{:04.2}/i{}/N{:03}/absolute",
            self.well_width, self.box_length, self.recursion, particles
        ))
    }

    pub fn goal_filling_fraction(&self, particles: usize) -> f64 {
        4.0 * PI / 3.0 * self.radius.powi(3) * particles as f64 / self.box_length.powi(3)
    }

    pub fn sc_period(particles: usize) -> usize {
        (particles * particles / 10).max(10)
    }

    /// Jobs for every particle count, rooted at `root`.
    pub fn jobs(&self, root: &Path) -> Vec<JobSpec> {
        let ladder = ladder_filling_fractions();
        let mut jobs = Vec::new();
        for &particles in &self.particle_counts {
            jobs.extend(self.jobs_for(root, particles, &ladder));
        }
        jobs
    }

    fn jobs_for(&self, root: &Path, particles: usize, ladder: &[f64]) -> Vec<JobSpec> {
        let directory = root.join(self.directory(particles));
        let goal = self.goal_filling_fraction(particles);
        let sc_period = Self::sc_period(particles);
        let mut jobs = Vec::new();

        for step in 0..ladder.len().saturating_sub(2) {
            let filename = format!("{step:05}");
            let done = ladder[step + 2] > goal;
            let ff_next = if done { goal } else { ladder[step + 1] };

            if !self.overwrite && directory.join(format!("{filename}.dat")).is_file() {
                warn!(
                    directory = %directory.display(),
                    filename,
                    "output exists; pass overwrite to rerun it"
                );
            } else {
                jobs.push(JobSpec {
                    name: format!("N{particles:03}-{filename}"),
                    program: self.program.clone(),
                    args: vec![
                        "--ff".to_string(),
                        format_general(ff_next, 6),
                        "--sc_period".to_string(),
                        sc_period.to_string(),
                        "--iterations".to_string(),
                        self.iterations.to_string(),
                        "--filename".to_string(),
                        filename.clone(),
                        "--data_dir".to_string(),
                        directory.display().to_string(),
                        "--ff_small".to_string(),
                        format_general(ladder[step], 6),
                        "--N".to_string(),
                        particles.to_string(),
                    ],
                    stdout_path: directory.join(format!("{filename}.out")),
                });
            }
            if done {
                break;
            }
        }
        debug!(particles, goal, jobs = jobs.len(), "planned absolute ladder");
        jobs
    }
}

/// Spheres in a periodic box of side 30 at reduced density `n_reduced`.
pub fn sphere_count(n_reduced: f64) -> u64 {
    (n_reduced * 2f64.powf(-2.5) * 30f64.powi(3)).round() as u64
}

#[derive(Debug, Clone, PartialEq)]
pub enum SoftSphereJob {
    Homogeneous {
        n_reduced: f64,
        temperature: f64,
        potential: String,
    },
    /// `spheres == 0` picks a count that fills a 30x30x32 slab.
    Walls {
        n_reduced: f64,
        temperature: f64,
        spheres: u64,
    },
    TestParticle {
        n_reduced: f64,
        temperature: f64,
        sigma: f64,
        epsilon: f64,
        potential: String,
    },
    Fcc {
        n_reduced: f64,
        temperature: f64,
        potential: String,
    },
}

/// Where soft-sphere Monte Carlo binaries live and where their data goes.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftSphereRunner {
    pub program: PathBuf,
    pub figs_dir: PathBuf,
}

impl SoftSphereRunner {
    pub fn new(program: impl Into<PathBuf>, figs_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            figs_dir: figs_dir.into(),
        }
    }

    fn job(&self, name: String, base: String, mut tail: Vec<String>, spheres: u64) -> JobSpec {
        let base = self.figs_dir.join(base);
        let mut args = vec![
            spheres.to_string(),
            "0.01".to_string(),
            "0.001".to_string(),
            format!("{}.dat", base.display()),
        ];
        args.append(&mut tail);
        let mut stdout_path = base.into_os_string();
        stdout_path.push(".out");
        JobSpec {
            name,
            program: self.program.clone(),
            args,
            stdout_path: PathBuf::from(stdout_path),
        }
    }

    pub fn plan(&self, job: &SoftSphereJob) -> JobSpec {
        let strings = |words: &[&str]| words.iter().map(|w| w.to_string()).collect::<Vec<_>>();
        match job {
            SoftSphereJob::Homogeneous {
                n_reduced,
                temperature,
                potential,
            } => {
                let mut tail = strings(&["periodxyz", "30", "kT"]);
                tail.extend([format_general(*temperature, 6), "potential".into(), potential.clone()]);
                self.job(
                    format!("soft-{n_reduced:.4}-{temperature:.4}"),
                    format!("mc{potential}-{n_reduced:.4}-{temperature:.4}"),
                    tail,
                    sphere_count(*n_reduced),
                )
            }
            SoftSphereJob::Walls {
                n_reduced,
                temperature,
                spheres,
            } => {
                let spheres = if *spheres == 0 {
                    (n_reduced * 2f64.powf(-2.5) * 30f64.powi(2) * 32.0).round() as u64
                } else {
                    *spheres
                };
                let mut tail = strings(&["periodxy", "30", "wallz", "30", "kT"]);
                tail.push(format_general(*temperature, 6));
                self.job(
                    format!("softwalls-{n_reduced:.4}-{temperature:.4}"),
                    format!("mcwalls-{n_reduced:.4}-{temperature:.4}-{spheres}"),
                    tail,
                    spheres,
                )
            }
            SoftSphereJob::TestParticle {
                n_reduced,
                temperature,
                sigma,
                epsilon,
                potential,
            } => {
                let mut tail = strings(&["periodxyz", "30", "kT"]);
                tail.extend([
                    format_general(*temperature, 6),
                    "TestP".into(),
                    format!("{sigma:.6}"),
                    "testp_eps".into(),
                    format!("{epsilon:.6}"),
                    "potential".into(),
                    potential.clone(),
                ]);
                self.job(
                    format!("soft-testp-{n_reduced:.4}-{temperature:.4}"),
                    format!("mc_testp_{potential}-{n_reduced:.4}-{temperature:.4}"),
                    tail,
                    sphere_count(*n_reduced),
                )
            }
            SoftSphereJob::Fcc {
                n_reduced,
                temperature,
                potential,
            } => {
                let length = (1372.0 / (n_reduced * 2f64.powf(-2.5))).cbrt();
                let mut tail = strings(&["periodxyz", "30", "kT"]);
                tail.extend([
                    format_general(*temperature, 6),
                    "potential".into(),
                    potential.clone(),
                    "fcc".into(),
                    format!("{length:.4}"),
                ]);
                self.job(
                    format!("soft-{n_reduced:.4}-{temperature:.4}"),
                    format!("mc{potential}-{n_reduced:.4}-{temperature:.4}"),
                    tail,
                    sphere_count(*n_reduced),
                )
            }
        }
    }
}

/// Radial distribution of the WCA fluid from the `radial-wca.mkdat` tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WcaRadialJob {
    pub n_reduced: f64,
    pub temperature: f64,
}

impl WcaRadialJob {
    pub fn plan(&self, figs_dir: &Path, log_dir: &Path) -> JobSpec {
        let tag = format!("{:.4}-{:.4}", self.n_reduced, self.temperature);
        JobSpec {
            name: format!("wca-{tag}"),
            program: figs_dir.join("radial-wca.mkdat"),
            args: vec![
                format_general(self.n_reduced, 6),
                format_general(self.temperature, 6),
            ],
            stdout_path: log_dir.join(format!("wca-{tag}.out")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AbsoluteLadder, SoftSphereJob, SoftSphereRunner, WcaRadialJob, ladder_filling_fractions,
        sphere_count,
    };
    use crate::numerics::carnahan_starling_excess_free_energy;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    #[test]
    fn ladder_steps_by_ln_two() {
        let ladder = ladder_filling_fractions();
        assert_eq!(ladder.len(), 28);
        assert!((carnahan_starling_excess_free_energy(ladder[0]) - 2f64.ln()).abs() < 1e-7);
        assert!(ladder.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn ladder_stops_at_goal_density() {
        let temp = TempDir::new().expect("tempdir should be created");
        let ladder = AbsoluteLadder::new(0, 1.3, 5.0, vec![6], "free-energy-monte-carlo");
        assert_eq!(
            ladder.directory(6),
            PathBuf::from("scrunched-ww1.30-L5.00/i0/N006/absolute")
        );
        let goal = ladder.goal_filling_fraction(6);
        let fractions = ladder_filling_fractions();
        let last = fractions
            .iter()
            .skip(2)
            .position(|&ff| ff > goal)
            .expect("goal is below close packing");

        let jobs = ladder.jobs(temp.path());
        assert_eq!(jobs.len(), last + 1);
        let final_job = &jobs[last];
        assert_eq!(final_job.args[1], crate::modules::serialization::format_general(goal, 6));
        assert_eq!(final_job.args[3], "10");
        assert_eq!(final_job.args[7], format!("{last:05}"));
        assert!(final_job.stdout_path.ends_with(format!("N006/absolute/{last:05}.out")));
    }

    #[test]
    fn existing_outputs_are_skipped_without_overwrite() {
        let temp = TempDir::new().expect("tempdir should be created");
        let mut ladder = AbsoluteLadder::new(1, 1.5, 5.0, vec![20], "fe");
        let dir = temp.path().join(ladder.directory(20));
        fs::create_dir_all(&dir).expect("dir");
        fs::write(dir.join("00000.dat"), "").expect("done");

        let kept = ladder.jobs(temp.path());
        assert!(kept.iter().all(|job| job.args[7] != "00000"));
        assert_eq!(AbsoluteLadder::sc_period(20), 40);

        ladder.overwrite = true;
        assert_eq!(ladder.jobs(temp.path()).len(), kept.len() + 1);
    }

    #[test]
    fn soft_sphere_jobs_follow_density() {
        assert_eq!(sphere_count(0.76), 3627);
        let runner = SoftSphereRunner::new("./soft-monte-carlo", "figs");
        let job = runner.plan(&SoftSphereJob::Fcc {
            n_reduced: 0.76,
            temperature: 2.5,
            potential: "wca".to_string(),
        });
        assert_eq!(job.name, "soft-0.7600-2.5000");
        assert_eq!(job.args[..4], ["3627", "0.01", "0.001", "figs/mcwca-0.7600-2.5000.dat"]);
        assert_eq!(job.args.last().map(String::as_str), Some("21.6956"));
        assert_eq!(job.stdout_path, Path::new("figs/mcwca-0.7600-2.5000.out"));

        let walls = runner.plan(&SoftSphereJob::Walls {
            n_reduced: 1.0,
            temperature: 0.5,
            spheres: 0,
        });
        assert_eq!(walls.args[0], "5091");
        assert!(walls.stdout_path.ends_with("mcwalls-1.0000-0.5000-5091.out"));
    }

    #[test]
    fn wca_job_passes_density_and_temperature() {
        let job = WcaRadialJob {
            n_reduced: 0.8389,
            temperature: 0.71,
        }
        .plan(Path::new("figs"), Path::new("."));
        assert_eq!(job.program, Path::new("figs/radial-wca.mkdat"));
        assert_eq!(job.args, vec!["0.8389", "0.71"]);
        assert_eq!(job.name, "wca-0.8389-0.7100");
    }
}
