#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "codes-replay-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_script(dir: &PathBuf, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write script");
    let mut perms = fs::metadata(&path).expect("stat script").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod script");
    path
}

#[test]
fn missing_target_fails_before_submission() {
    let dir = unique_temp_dir("sbatch-missing");
    let output = Command::new(env!("CARGO_BIN_EXE_run_sbatch"))
        .arg(dir.join("no-such-script.sh"))
        .output()
        .expect("run run_sbatch");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"), "stderr={stderr}");
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn submits_target_through_sbatch_with_workdir() {
    let dir = unique_temp_dir("sbatch-submit");
    let bin_dir = dir.join("bin");
    fs::create_dir(&bin_dir).unwrap();
    let recorded = dir.join("sbatch-args.txt");
    write_script(
        &bin_dir,
        "sbatch",
        &format!(
            "#!/bin/sh\necho \"$@\" > {}\necho \"Submitted batch job 42\"\nexit 0\n",
            recorded.display()
        ),
    );
    let target = write_script(&dir, "experiment.sh", "#!/bin/sh\nexit 0\n");
    let workdir = dir.join("scratch-workdir");
    fs::create_dir(&workdir).unwrap();

    let path_var = format!(
        "{}:{}",
        bin_dir.display(),
        std::env::var("PATH").expect("PATH set")
    );
    let output = Command::new(env!("CARGO_BIN_EXE_run_sbatch"))
        .args([
            "--workdir",
            workdir.to_str().unwrap(),
            target.to_str().unwrap(),
            "--end=1000",
        ])
        .env("PATH", path_var)
        .output()
        .expect("run run_sbatch");
    assert!(
        output.status.success(),
        "stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let argv = fs::read_to_string(&recorded).expect("recorded sbatch args");
    assert!(argv.contains(&format!("--chdir={}", workdir.display())));
    assert!(argv.contains("experiment.sh"));
    assert!(argv.contains("--end=1000"));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn sbatch_exit_code_is_surfaced() {
    let dir = unique_temp_dir("sbatch-reject");
    let bin_dir = dir.join("bin");
    fs::create_dir(&bin_dir).unwrap();
    write_script(
        &bin_dir,
        "sbatch",
        "#!/bin/sh\necho \"sbatch: error: Invalid partition\" >&2\nexit 1\n",
    );
    let target = write_script(&dir, "experiment.sh", "#!/bin/sh\nexit 0\n");

    let path_var = format!(
        "{}:{}",
        bin_dir.display(),
        std::env::var("PATH").expect("PATH set")
    );
    let output = Command::new(env!("CARGO_BIN_EXE_run_sbatch"))
        .arg(target.to_str().unwrap())
        .env("PATH", path_var)
        .output()
        .expect("run run_sbatch");
    assert_eq!(output.status.code(), Some(1));
    let _ = fs::remove_dir_all(&dir);
}
