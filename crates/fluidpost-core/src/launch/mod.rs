//! Detached simulation launches.
//!
//! A [`LaunchPlan`] is a list of jobs plus the scheduler that runs them.
//! Plans can be printed as shell lines or spawned directly; spawned jobs
//! are never waited on and their output only lands in the per-job log.

mod jobs;

pub use jobs::{
    AbsoluteLadder, DEFAULT_LADDER_ITERATIONS, SoftSphereJob, SoftSphereRunner, WcaRadialJob,
    ladder_filling_fractions, sphere_count,
};

use crate::domain::{PostError, PostResult};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Receives both stdout and stderr.
    pub stdout_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Scheduler {
    #[default]
    Local,
    Srun { mem_mb: u32 },
}

impl Scheduler {
    fn prefix(&self, job: &JobSpec) -> Vec<String> {
        match self {
            Self::Local => Vec::new(),
            Self::Srun { mem_mb } => vec![
                "srun".to_string(),
                format!("--mem={mem_mb}"),
                "-J".to_string(),
                job.name.clone(),
            ],
        }
    }

    /// Program and arguments actually executed for `job`.
    pub fn command_line(&self, job: &JobSpec) -> Vec<String> {
        let mut line = self.prefix(job);
        line.push(job.program.display().to_string());
        line.extend(job.args.iter().cloned());
        line
    }
}

fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=+:,%".contains(c));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LaunchPlan {
    pub scheduler: Scheduler,
    pub jobs: Vec<JobSpec>,
}

impl LaunchPlan {
    pub fn new(scheduler: Scheduler, jobs: Vec<JobSpec>) -> Self {
        Self { scheduler, jobs }
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Backgrounded shell lines, one per job.
    pub fn shell_lines(&self) -> Vec<String> {
        self.jobs
            .iter()
            .map(|job| {
                let words: Vec<String> = self
                    .scheduler
                    .command_line(job)
                    .iter()
                    .map(|word| shell_quote(word))
                    .collect();
                format!(
                    "{} > {} 2>&1 &",
                    words.join(" "),
                    shell_quote(&job.stdout_path.display().to_string())
                )
            })
            .collect()
    }

    /// Spawns every job without waiting and returns their process ids.
    pub fn execute(&self) -> PostResult<Vec<u32>> {
        let mut pids = Vec::with_capacity(self.jobs.len());
        for job in &self.jobs {
            let child = spawn_detached(&self.scheduler.command_line(job), &job.stdout_path)?;
            info!(job = %job.name, pid = child, log = %job.stdout_path.display(), "launched job");
            pids.push(child);
        }
        Ok(pids)
    }
}

fn spawn_detached(command_line: &[String], log: &Path) -> PostResult<u32> {
    let Some((program, args)) = command_line.split_first() else {
        return Err(PostError::internal(
            "INTERNAL.LAUNCH_EMPTY",
            "cannot launch an empty command line",
        ));
    };
    if let Some(parent) = log.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| {
            PostError::io_system(
                "IO.LAUNCH_DIRECTORY",
                format!("failed to create '{}': {}", parent.display(), source),
            )
        })?;
    }
    let log_error = |source: std::io::Error| {
        PostError::io_system(
            "IO.LAUNCH_LOG",
            format!("failed to open '{}': {}", log.display(), source),
        )
    };
    let stdout = File::create(log).map_err(log_error)?;
    let stderr = stdout.try_clone().map_err(log_error)?;

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .spawn()
        .map_err(|source| {
            PostError::io_system(
                "IO.LAUNCH_SPAWN",
                format!("failed to start '{}': {}", program, source),
            )
        })?;
    Ok(child.id())
}
