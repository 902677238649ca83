//! Error taxonomy for the experiment runner.
//!
//! Every fatal condition stops the whole run; nothing is swallowed or
//! retried besides the slot-allocation rescan in [`crate::slot`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    /// A required path variable is missing from the process environment.
    #[error("required environment variable {0} not set")]
    MissingEnv(&'static str),

    /// A config template (or an experiment target) could not be found.
    #[error("config template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    /// The experiment spec or configuration script passed on the command
    /// line does not exist.
    #[error("experiment target not found: {}", .0.display())]
    TargetNotFound(PathBuf),

    /// The experiment spec file exists but is not valid JSON for
    /// [`crate::spec::ExperimentSpec`].
    #[error("invalid experiment spec {}: {source}", .path.display())]
    SpecParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A fresh `exp-NNN` slot directory could not be created.
    #[error("could not allocate experiment slot under {}: {source}", .root.display())]
    SlotCreate {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The simulator (or a dispatched script) could not be started at all.
    /// A started simulator that exits non-zero is not an error; its exit
    /// code is surfaced as the run's outcome instead.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Two config templates of one run materialize to the same file in
    /// the slot; the second would silently clobber the first.
    #[error("duplicate config destination: {}", .0.display())]
    DuplicateConfig(PathBuf),

    /// A run invocation with no program to execute.
    #[error("empty run invocation")]
    EmptyCommand,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
