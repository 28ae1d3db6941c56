//! Pre-flight checks for procsym
//!
//! Validates that the target can be inspected before any query runs, so
//! failures come with an actionable message instead of a bare "not found".

use crate::domain::Pid;
use crate::resolution::memory_maps::maps_path;
use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

/// Check if the target process exists
pub fn check_process_exists(proc_root: &Path, pid: Pid) -> Result<()> {
    let proc_path = proc_root.join(pid.0.to_string());
    if !proc_path.exists() {
        bail!(
            "Process {} not found.\n\n\
             Is the process still running? Check with: ps -p {}",
            pid.0,
            pid.0
        );
    }
    Ok(())
}

/// Check if we can read the process's memory maps
pub fn check_proc_access(proc_root: &Path, pid: Pid) -> Result<()> {
    let maps_path = maps_path(proc_root, pid);
    std::fs::File::open(&maps_path).with_context(|| {
        format!(
            "Cannot read {}\n\n\
             This usually means:\n\
             - The process doesn't exist (check: ps -p {})\n\
             - Permission denied (run as the process owner or with sudo)\n\
             - /proc is not mounted",
            maps_path.display(),
            pid.0
        )
    })?;
    Ok(())
}

/// Check that the objdump program can be run at all
pub fn check_objdump(program: &Path) -> Result<()> {
    let output = Command::new(program).arg("--version").output().with_context(|| {
        format!(
            "Cannot run {}\n\n\
             Install binutils, pass --objdump <PATH>, or use --provider elf.",
            program.display()
        )
    })?;
    if !output.status.success() {
        bail!("{} --version exited with {}", program.display(), output.status);
    }
    Ok(())
}
