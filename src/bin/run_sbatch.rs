//! Submit an experiment run through the batch queue.
//!
//! Same target contract as `run-experiment`, but the target is handed to
//! `sbatch` instead of being executed here, with the job's working
//! directory kept separate from the script's source directory.

use clap::Parser;
use codes_replay_rs::error::{Result, RunnerError};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(
    name = "run-sbatch",
    about = "Submit an experiment script to the batch queue"
)]
struct Args {
    /// Experiment script submitted to sbatch
    target: PathBuf,

    /// Working directory for the submitted job
    #[arg(long, default_value = ".")]
    workdir: PathBuf,

    /// Arguments passed through to the submitted script unchanged
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    passthrough: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    match submit(&args) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            error!(%err, "submission failed");
            eprintln!("run-sbatch: {err}");
            ExitCode::FAILURE
        }
    }
}

fn submit(args: &Args) -> Result<i32> {
    // refuse before submission rather than letting the job fail in-queue
    if !args.target.exists() {
        return Err(RunnerError::TargetNotFound(args.target.clone()));
    }
    let target = args.target.canonicalize()?;

    let mut cmd = Command::new("sbatch");
    cmd.arg(format!("--chdir={}", args.workdir.display()))
        .arg(&target)
        .args(&args.passthrough);
    if std::env::var_os("PATH_TO_SCRIPT_DIR").is_none() {
        if let Some(dir) = script_dir(&target) {
            cmd.env("PATH_TO_SCRIPT_DIR", dir);
        }
    }

    info!(target = %target.display(), workdir = %args.workdir.display(), "submitting job");
    let status = cmd.status().map_err(|source| RunnerError::Spawn {
        program: "sbatch".to_string(),
        source,
    })?;
    Ok(status.code().unwrap_or(1))
}

fn script_dir(target: &Path) -> Option<&Path> {
    target.parent().filter(|d| !d.as_os_str().is_empty())
}
