//! binutils `objdump` as a metadata provider.

use super::{DumpMode, MetadataProvider, ProviderError};
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Default program name, looked up on `PATH`.
pub const DEFAULT_OBJDUMP: &str = "objdump";

/// Spawns `objdump` once per dump and captures its full output.
#[derive(Debug, Clone)]
pub struct ObjdumpProvider {
    program: PathBuf,
}

impl Default for ObjdumpProvider {
    fn default() -> Self {
        Self::new(DEFAULT_OBJDUMP)
    }
}

impl ObjdumpProvider {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

fn objdump_flag(mode: DumpMode) -> &'static str {
    match mode {
        DumpMode::ProgramHeaders => "-p",
        DumpMode::SymbolTables => "-tT",
        DumpMode::Relocations => "-rR",
    }
}

impl MetadataProvider for ObjdumpProvider {
    fn dump(&self, image: &Path, mode: DumpMode) -> Result<String, ProviderError> {
        let program = self.program.display().to_string();
        let flag = objdump_flag(mode);
        debug!("Running {program} {flag} {}", image.display());

        let output = Command::new(&self.program)
            .arg(flag)
            .arg(image)
            .output()
            .map_err(|source| ProviderError::Spawn { program: program.clone(), source })?;

        if !output.status.success() {
            return Err(ProviderError::Exit {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
