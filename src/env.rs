//! Resolved install locations.
//!
//! The runner is configured through a fixed set of path variables
//! (`PATH_TO_CODES_BUILD`, `SCRIPTS_ROOT_DIR`, ...). They are resolved once
//! at startup into a [`Paths`] value instead of being read ad hoc from the
//! environment by every component.

use crate::error::{Result, RunnerError};
use std::path::PathBuf;

/// Location of the simulator inside a CODES build tree.
pub const SIMULATOR_RELATIVE_PATH: &str = "src/model-net-mpi-replay";

/// Install locations of the simulator build and its companion packages.
#[derive(Debug, Clone)]
pub struct Paths {
    /// `PATH_TO_CODES_BUILD`: root of the CODES build tree.
    pub codes_build: PathBuf,
    /// `SCRIPTS_ROOT_DIR`: root of the experiment scripts checkout.
    pub scripts_root: PathBuf,
    /// `PATH_TO_SCRIPT_DIR`: directory holding per-experiment config
    /// templates; defaults to the experiment spec's own directory.
    pub script_dir: Option<PathBuf>,
    /// `PATH_TO_UNION_INSTALL`: Union workload generator install prefix.
    pub union_install: Option<PathBuf>,
    /// `PATH_TO_SWM_INSTALL`: SWM workload generator install prefix.
    pub swm_install: Option<PathBuf>,
}

impl Paths {
    /// Resolve all path variables from the process environment.
    pub fn from_env() -> Result<Paths> {
        Paths::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve path variables through an arbitrary lookup function.
    /// An unset or empty value counts as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Paths>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<PathBuf> {
            lookup(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .ok_or(RunnerError::MissingEnv(name))
        };
        let optional =
            |name: &str| lookup(name).filter(|v| !v.is_empty()).map(PathBuf::from);

        Ok(Paths {
            codes_build: required("PATH_TO_CODES_BUILD")?,
            scripts_root: required("SCRIPTS_ROOT_DIR")?,
            script_dir: optional("PATH_TO_SCRIPT_DIR"),
            union_install: optional("PATH_TO_UNION_INSTALL"),
            swm_install: optional("PATH_TO_SWM_INSTALL"),
        })
    }

    /// Default simulator executable for this build tree.
    pub fn simulator(&self) -> PathBuf {
        self.codes_build.join(SIMULATOR_RELATIVE_PATH)
    }
}
