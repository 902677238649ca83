//! Run one simulation experiment into a fresh `exp-NNN` results slot.
//!
//! The target is either an experiment spec (`.json`), which drives the full
//! allocate → materialize → launch → collect pipeline, or an executable
//! configuration script, which is dispatched directly. Either way the
//! passthrough arguments are forwarded unchanged and this process exits
//! with the dispatched child's exit code.

use clap::Parser;
use codes_replay_rs::env::Paths;
use codes_replay_rs::error::{Result, RunnerError};
use codes_replay_rs::run;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};
use tracing::error;

#[derive(Debug, Parser)]
#[command(
    name = "run-experiment",
    about = "Allocate a results slot and run model-net-mpi-replay in it"
)]
struct Args {
    /// Experiment spec (.json) or executable configuration script
    target: PathBuf,

    /// Arguments passed through to the dispatched target unchanged
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
    match dispatch(&args) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            error!(%err, "run failed");
            eprintln!("run-experiment: {err}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(args: &Args) -> Result<i32> {
    let is_spec = args
        .target
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_spec {
        let paths = Paths::from_env()?;
        run::run_spec_file(&paths, &args.target, &args.passthrough)
    } else {
        run_script(&args.target, &args.passthrough)
    }
}

/// Direct dispatch for configuration scripts: execute the target itself
/// with the passthrough arguments, exporting `PATH_TO_SCRIPT_DIR` for it
/// when the caller has not set one.
fn run_script(target: &Path, passthrough: &[String]) -> Result<i32> {
    if !target.exists() {
        return Err(RunnerError::TargetNotFound(target.to_path_buf()));
    }

    // a separator-free name would go through PATH lookup instead of
    // running the script sitting in the current directory
    let program = if target.parent().is_none_or(|p| p.as_os_str().is_empty()) {
        Path::new(".").join(target)
    } else {
        target.to_path_buf()
    };

    let mut cmd = Command::new(&program);
    cmd.args(passthrough);
    if std::env::var_os("PATH_TO_SCRIPT_DIR").is_none() {
        if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
            cmd.env("PATH_TO_SCRIPT_DIR", dir);
        }
    }

    let status = cmd.status().map_err(|source| RunnerError::Spawn {
        program: target.display().to_string(),
        source,
    })?;
    Ok(status.code().unwrap_or(1))
}
