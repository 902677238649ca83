//! The run pipeline: allocate slot, materialize configs, launch, collect.
//!
//! Steps never reorder and no step is skipped: slot allocation happens
//! before any template is written, all configs exist before the simulator
//! starts, and scratch output is collected only after the child has exited.

use crate::collect;
use crate::env::Paths;
use crate::error::{Result, RunnerError};
use crate::launch::{self, DEFAULT_SAMPLE_INTERVAL, RunInvocation};
use crate::slot;
use crate::spec::ExperimentSpec;
use crate::template::{self, Bindings};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_RESULTS_DIR: &str = "results";

/// Run the experiment described by the spec file at `spec_path`,
/// returning the simulator's exit code.
pub fn run_spec_file(paths: &Paths, spec_path: &Path, passthrough: &[String]) -> Result<i32> {
    let spec = ExperimentSpec::load(spec_path)?;
    let spec_dir = spec_path.parent().unwrap_or(Path::new(".")).to_path_buf();
    run_spec(paths, &spec, &spec_dir, passthrough)
}

/// Run one already-parsed experiment spec. Template paths resolve against
/// `spec_dir` (or `PATH_TO_SCRIPT_DIR` when set); passthrough arguments are
/// appended to the simulator invocation unchanged.
pub fn run_spec(
    paths: &Paths,
    spec: &ExperimentSpec,
    spec_dir: &Path,
    passthrough: &[String],
) -> Result<i32> {
    let template_dir = paths.script_dir.as_deref().unwrap_or(spec_dir);
    let results_root = spec
        .results_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR));

    let slot = slot::allocate(&results_root)?;
    let slot = slot.canonicalize()?;
    if let Some(name) = &spec.name {
        info!(experiment = %name, slot = %slot.display(), "starting run");
    }

    let scratch = match &spec.scratch_dir {
        Some(dir) if dir.is_relative() => Some(std::env::current_dir()?.join(dir)),
        Some(dir) => Some(dir.clone()),
        None => None,
    };

    let mut bindings: Bindings = spec.vars.clone();
    bindings.insert("CURRENT_EXP_DIR".to_string(), slot.display().to_string());

    // every config must exist before the simulator is launched
    let mut written: Vec<PathBuf> = Vec::new();
    let conf_path = materialize_into_slot(
        template_dir,
        &slot,
        &spec.network_config,
        None,
        &bindings,
        &mut written,
    )?;
    let args_file = match &spec.args_file {
        Some(tpl) => Some(materialize_into_slot(
            template_dir,
            &slot,
            tpl,
            None,
            &bindings,
            &mut written,
        )?),
        None => None,
    };
    for extra in &spec.configs {
        materialize_into_slot(
            template_dir,
            &slot,
            &extra.template,
            extra.output.as_deref(),
            &bindings,
            &mut written,
        )?;
    }

    let invocation = RunInvocation {
        argv: build_argv(
            paths,
            spec,
            &conf_path,
            args_file.as_deref(),
            scratch.as_deref(),
            passthrough,
        ),
        workdir: slot.clone(),
        sample_interval: spec
            .mem_sample_millis
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_SAMPLE_INTERVAL),
    };
    let code = launch::execute(&invocation)?;

    if let Some(scratch) = &scratch {
        collect::collect_scratch(scratch, &slot)?;
    }
    Ok(code)
}

fn materialize_into_slot(
    template_dir: &Path,
    slot: &Path,
    template: &Path,
    output: Option<&str>,
    bindings: &Bindings,
    written: &mut Vec<PathBuf>,
) -> Result<PathBuf> {
    let src = if template.is_absolute() {
        template.to_path_buf()
    } else {
        template_dir.join(template)
    };
    let name = match output {
        Some(name) => name.to_string(),
        None => src
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| RunnerError::TemplateNotFound(src.clone()))?,
    };
    let dst = slot.join(name);
    // one destination, one template: a clash would silently clobber
    if written.contains(&dst) {
        return Err(RunnerError::DuplicateConfig(dst));
    }
    template::materialize(&src, &dst, bindings)?;
    written.push(dst.clone());
    Ok(dst)
}

fn build_argv(
    paths: &Paths,
    spec: &ExperimentSpec,
    conf_path: &Path,
    args_file: Option<&Path>,
    scratch: Option<&Path>,
    passthrough: &[String],
) -> Vec<String> {
    let mut argv: Vec<String> = match &spec.launcher {
        Some(prefix) => prefix.clone(),
        None => vec!["mpirun".to_string(), "-np".to_string(), spec.np.to_string()],
    };
    let simulator = spec
        .simulator
        .clone()
        .unwrap_or_else(|| paths.simulator());
    argv.push(simulator.display().to_string());
    if let Some(args_file) = args_file {
        argv.push(format!("--args-file={}", args_file.display()));
    }
    argv.extend(spec.extra_args.iter().cloned());
    argv.extend(passthrough.iter().cloned());
    if let Some(scratch) = scratch {
        argv.push(format!("--lp-io-dir={}", scratch.display()));
    }
    argv.push("--".to_string());
    argv.push(conf_path.display().to_string());
    argv
}
