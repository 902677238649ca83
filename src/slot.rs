//! Experiment slot allocation.
//!
//! Each run gets its own `exp-NNN` directory under the results root, with a
//! zero-padded, strictly increasing sequence number. Allocation scans the
//! existing slots, picks max + 1 and creates the directory exclusively;
//! losing the scan-then-create race to a concurrent run triggers a rescan.

use crate::error::{Result, RunnerError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SLOT_PREFIX: &str = "exp-";
const CREATE_RETRIES: usize = 8;

/// Parse the slot number out of a directory name.
///
/// A slot name is `exp-` followed by exactly three digits; anything after
/// the digits (`exp-225-ghc-iter=2`) is ignored and the name still counts
/// by its numeric prefix.
pub fn slot_number(name: &str) -> Option<u32> {
    let digits = name.strip_prefix(SLOT_PREFIX)?;
    // byte-level check first: a multibyte char straddling index 3 must be
    // rejected like any other non-digit, not slice-panicked on
    let bytes = digits.as_bytes();
    if bytes.len() < 3 || !bytes[..3].iter().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits[..3].parse().ok()
}

/// Highest slot number currently visible under `root` (0 if the root does
/// not exist or holds no slots).
pub fn scan_max(root: &Path) -> Result<u32> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut max = 0;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(n) = slot_number(&entry.file_name().to_string_lossy()) {
            max = max.max(n);
        }
    }
    Ok(max)
}

/// Allocate a fresh `exp-NNN` slot under `root`, creating `root` first if
/// needed. Fails loudly on anything other than losing the creation race.
pub fn allocate(root: &Path) -> Result<PathBuf> {
    fs::create_dir_all(root).map_err(|source| RunnerError::SlotCreate {
        root: root.to_path_buf(),
        source,
    })?;

    for _ in 0..CREATE_RETRIES {
        let next = scan_max(root)? + 1;
        let slot = root.join(format!("{SLOT_PREFIX}{next:03}"));
        match fs::create_dir(&slot) {
            Ok(()) => {
                info!(slot = %slot.display(), "allocated experiment slot");
                return Ok(slot);
            }
            // lost the race to a concurrent invocation; rescan
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(slot = %slot.display(), "slot already taken, rescanning");
            }
            Err(source) => {
                return Err(RunnerError::SlotCreate {
                    root: root.to_path_buf(),
                    source,
                });
            }
        }
    }

    Err(RunnerError::SlotCreate {
        root: root.to_path_buf(),
        source: std::io::Error::new(
            ErrorKind::AlreadyExists,
            "slot creation retries exhausted",
        ),
    })
}
