//! Subprocess launcher and memory monitor.
//!
//! One run launches the simulator as a blocking child process with its
//! stdout and stderr captured into the working directory, while a sampler
//! thread appends memory readings to `memory-log.txt` on a fixed interval.
//! The sampler is stopped exactly once when the child exits, on every exit
//! path (`Drop` is the backstop for early returns).

use crate::error::{Result, RunnerError};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

pub const MEMORY_LOG_FILE: &str = "memory-log.txt";
pub const STDOUT_FILE: &str = "model-result.txt";
pub const STDERR_FILE: &str = "model-result.stderr.txt";
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// One simulator invocation: full argument vector (launcher prefix
/// included) and the slot directory it runs in.
#[derive(Debug, Clone)]
pub struct RunInvocation {
    pub argv: Vec<String>,
    pub workdir: PathBuf,
    pub sample_interval: Duration,
}

/// Background memory sampler writing to `memory-log.txt`.
pub struct MemoryLogger {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MemoryLogger {
    /// Start sampling into `dir/memory-log.txt`. The log file is created
    /// immediately, so it exists even if the run fails right after.
    pub fn start(dir: &Path, interval: Duration) -> Result<MemoryLogger> {
        let mut file = File::create(dir.join(MEMORY_LOG_FILE))?;
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);

        let handle = thread::spawn(move || {
            while !flag.load(Ordering::Relaxed) {
                match read_meminfo() {
                    Ok(sample) => {
                        let ts = SystemTime::now()
                            .duration_since(UNIX_EPOCH)
                            .map(|d| d.as_secs())
                            .unwrap_or(0);
                        if writeln!(
                            file,
                            "{ts} {} {} {}",
                            sample.total_kb, sample.free_kb, sample.available_kb
                        )
                        .is_err()
                        {
                            break;
                        }
                        let _ = file.flush();
                    }
                    Err(err) => {
                        warn!(%err, "memory sampling stopped");
                        break;
                    }
                }
                // sleep in short slices so stop() stays prompt
                let mut slept = Duration::ZERO;
                while slept < interval && !flag.load(Ordering::Relaxed) {
                    let step = Duration::from_millis(50).min(interval - slept);
                    thread::sleep(step);
                    slept += step;
                }
            }
        });

        Ok(MemoryLogger {
            stop,
            handle: Some(handle),
        })
    }

    /// Signal the sampler and wait for it to finish. Idempotent.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MemoryLogger {
    fn drop(&mut self) {
        self.stop();
    }
}

struct MemSample {
    total_kb: u64,
    free_kb: u64,
    available_kb: u64,
}

fn read_meminfo() -> std::io::Result<MemSample> {
    let raw = std::fs::read_to_string("/proc/meminfo")?;
    let mut sample = MemSample {
        total_kb: 0,
        free_kb: 0,
        available_kb: 0,
    };
    for line in raw.lines() {
        let mut fields = line.split_whitespace();
        let (Some(key), Some(value)) = (fields.next(), fields.next()) else {
            continue;
        };
        let value: u64 = value.parse().unwrap_or(0);
        match key {
            "MemTotal:" => sample.total_kb = value,
            "MemFree:" => sample.free_kb = value,
            "MemAvailable:" => sample.available_kb = value,
            _ => {}
        }
    }
    Ok(sample)
}

/// Run the invocation to completion and return the child's exit code.
///
/// stdout goes to `model-result.txt`, stderr to `model-result.stderr.txt`.
/// A non-zero exit code is the run's outcome, not an `Err`; only a child
/// that cannot be started at all is an error.
pub fn execute(invocation: &RunInvocation) -> Result<i32> {
    let (program, args) = invocation
        .argv
        .split_first()
        .ok_or(RunnerError::EmptyCommand)?;

    let stdout = File::create(invocation.workdir.join(STDOUT_FILE))?;
    let stderr = File::create(invocation.workdir.join(STDERR_FILE))?;
    let mut logger = MemoryLogger::start(&invocation.workdir, invocation.sample_interval)?;

    info!(
        command = %invocation.argv.join(" "),
        workdir = %invocation.workdir.display(),
        "launching simulator"
    );
    let status = Command::new(program)
        .args(args)
        .current_dir(&invocation.workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .status();

    // the monitor must die with the simulator, success or failure
    logger.stop();

    let status = status.map_err(|source| RunnerError::Spawn {
        program: program.clone(),
        source,
    })?;
    let code = status.code().unwrap_or(1);
    if code == 0 {
        debug!("simulator exited cleanly");
    } else {
        warn!(code, "simulator exited with failure");
    }
    Ok(code)
}
