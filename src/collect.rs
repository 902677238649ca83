//! Result collection.
//!
//! Runs strictly after the simulator has exited: anything it wrote to the
//! scratch (fast-storage) location is moved into the slot so one directory
//! holds the whole run.

use crate::error::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

/// Move every entry of `scratch` into `workdir`; returns how many entries
/// moved. A missing or empty scratch directory is a no-op, not an error.
pub fn collect_scratch(scratch: &Path, workdir: &Path) -> Result<usize> {
    if scratch == workdir {
        return Ok(0);
    }
    let entries = match fs::read_dir(scratch) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(scratch = %scratch.display(), "no scratch output to collect");
            return Ok(0);
        }
        Err(e) => return Err(e.into()),
    };

    let mut moved = 0;
    for entry in entries {
        let entry = entry?;
        move_entry(&entry.path(), &workdir.join(entry.file_name()))?;
        moved += 1;
    }
    if moved > 0 {
        info!(moved, from = %scratch.display(), to = %workdir.display(), "collected scratch artifacts");
    }
    Ok(moved)
}

/// Rename where possible; scratch is typically a separate mount (tmpfs,
/// node-local SSD), where rename fails with EXDEV and the entry has to be
/// copied over and deleted instead.
fn move_entry(src: &Path, dst: &Path) -> Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            debug!(src = %src.display(), "scratch is on another filesystem, copying");
            copy_recursive(src, dst)?;
            if src.is_dir() {
                fs::remove_dir_all(src)?;
            } else {
                fs::remove_file(src)?;
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn copy_recursive(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        fs::create_dir_all(dst)?;
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &dst.join(entry.file_name()))?;
        }
    } else {
        fs::copy(src, dst)?;
    }
    Ok(())
}
