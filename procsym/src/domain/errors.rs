//! Structured error types for procsym
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::Pid;
use crate::metadata::{DumpMode, ProviderError};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by every resolver operation. None of them are retried.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Cannot open {}: {source}", path.display())]
    NotAccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Metadata provider failed ({mode}) for {}: {source}", image.display())]
    ProviderFailure {
        image: PathBuf,
        mode: DumpMode,
        #[source]
        source: ProviderError,
    },

    #[error("{0} not found")]
    NotFound(Lookup),
}

impl ResolveError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound(_))
    }
}

/// What a failed lookup was searching for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Image { pid: Pid, name: String },
    Address { pid: Pid, address: u64 },
    Symbol { image: PathBuf, name: String },
    Relocation { image: PathBuf, name: String },
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Image { pid, name } => write!(f, "Executable mapping of '{name}' in {pid}"),
            Lookup::Address { pid, address } => write!(f, "Mapping containing 0x{address:x} in {pid}"),
            Lookup::Symbol { image, name } => {
                write!(f, "Symbol '{name}' in {}", image.display())
            }
            Lookup::Relocation { image, name } => {
                write!(f, "Relocation '{name}' in {}", image.display())
            }
        }
    }
}
