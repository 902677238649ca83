//! Experiment spec file.
//!
//! One JSON file describes one simulator run: which config templates to
//! materialize, the placeholder values, and how to invoke the simulator.
//! Relative template paths resolve against the spec file's own directory.

use crate::error::{Result, RunnerError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

fn default_np() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentSpec {
    #[serde(default)]
    pub name: Option<String>,

    /// Degree of process parallelism handed to the launcher (`mpirun -np`).
    #[serde(default = "default_np")]
    pub np: u32,

    /// Template for the network config passed positionally after `--`.
    pub network_config: PathBuf,

    /// Template for the file passed as `--args-file=<path>`.
    #[serde(default)]
    pub args_file: Option<PathBuf>,

    /// Additional templates materialized into the slot (workload configs,
    /// allocation files, ...).
    #[serde(default)]
    pub configs: Vec<ConfigFileSpec>,

    /// Placeholder bindings applied to every template of this run.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,

    /// Extra simulator flags (`--extramem=...`), before any passthrough
    /// arguments from the command line.
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Fast-storage directory the simulator writes through `--lp-io-dir`;
    /// its contents are moved into the slot after the run.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,

    /// Results root holding the `exp-NNN` slots; defaults to `results`
    /// under the current directory.
    #[serde(default)]
    pub results_dir: Option<PathBuf>,

    /// Override for the process-parallel launcher prefix; `null` means
    /// `mpirun -np <np>`, an empty list runs the simulator directly.
    #[serde(default)]
    pub launcher: Option<Vec<String>>,

    /// Override for the simulator executable; `null` means
    /// `$PATH_TO_CODES_BUILD/src/model-net-mpi-replay`.
    #[serde(default)]
    pub simulator: Option<PathBuf>,

    /// Memory sampling interval in milliseconds (default 1000).
    #[serde(default)]
    pub mem_sample_millis: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFileSpec {
    pub template: PathBuf,
    /// Output file name inside the slot; defaults to the template's name.
    #[serde(default)]
    pub output: Option<String>,
}

impl ExperimentSpec {
    pub fn load(path: &Path) -> Result<ExperimentSpec> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RunnerError::TargetNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw).map_err(|source| RunnerError::SpecParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
