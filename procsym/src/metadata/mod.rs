//! # Binary Metadata Providers
//!
//! The resolver never parses binaries itself. It asks a [`MetadataProvider`]
//! for one of three textual dumps of an on-disk image and scans the text:
//!
//! | Mode                          | objdump flag | Consumed by              |
//! |-------------------------------|--------------|--------------------------|
//! | [`DumpMode::ProgramHeaders`]  | `-p`         | load bias calculation    |
//! | [`DumpMode::SymbolTables`]    | `-tT`        | symbol resolution        |
//! | [`DumpMode::Relocations`]     | `-rR`        | relocation resolution    |
//!
//! ## Providers
//!
//! - [`ObjdumpProvider`]: spawns binutils `objdump` once per request and
//!   captures its whole stdout.
//! - [`ElfProvider`]: parses the file in-process with the `object` crate and
//!   renders the same layouts objdump prints, so no external tool is needed.
//! - [`StaticProvider`]: hands back canned text, e.g. dumps captured on
//!   another machine.
//!
//! Every request is independent. Providers keep no state between calls, and
//! the returned `String` is owned by the caller, so parsing never shares a
//! buffer with another query.

pub mod elf;
pub mod objdump;

pub use elf::ElfProvider;
pub use objdump::ObjdumpProvider;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use thiserror::Error;

/// Which table to dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DumpMode {
    ProgramHeaders,
    SymbolTables,
    Relocations,
}

impl fmt::Display for DumpMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DumpMode::ProgramHeaders => "program headers",
            DumpMode::SymbolTables => "symbol tables",
            DumpMode::Relocations => "relocations",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Exit { program: String, status: ExitStatus, stderr: String },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse object file: {0}")]
    Object(#[from] object::Error),

    #[error("No {mode} dump available for {}", path.display())]
    Unavailable { path: PathBuf, mode: DumpMode },
}

/// Produces the textual dump of one table of an on-disk binary.
pub trait MetadataProvider {
    /// Dump `mode` for the image at `image`.
    ///
    /// # Errors
    /// Returns an error when the dump cannot be produced at all.
    fn dump(&self, image: &Path, mode: DumpMode) -> Result<String, ProviderError>;
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for &P {
    fn dump(&self, image: &Path, mode: DumpMode) -> Result<String, ProviderError> {
        (**self).dump(image, mode)
    }
}

impl<P: MetadataProvider + ?Sized> MetadataProvider for Box<P> {
    fn dump(&self, image: &Path, mode: DumpMode) -> Result<String, ProviderError> {
        (**self).dump(image, mode)
    }
}

/// Provider backed by pre-recorded dumps.
#[derive(Debug, Default, Clone)]
pub struct StaticProvider {
    dumps: HashMap<(PathBuf, DumpMode), String>,
}

impl StaticProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the dump returned for `image` in `mode`.
    #[must_use]
    pub fn with_dump(
        mut self,
        image: impl Into<PathBuf>,
        mode: DumpMode,
        text: impl Into<String>,
    ) -> Self {
        self.insert(image, mode, text);
        self
    }

    pub fn insert(&mut self, image: impl Into<PathBuf>, mode: DumpMode, text: impl Into<String>) {
        self.dumps.insert((image.into(), mode), text.into());
    }
}

impl MetadataProvider for StaticProvider {
    fn dump(&self, image: &Path, mode: DumpMode) -> Result<String, ProviderError> {
        self.dumps
            .get(&(image.to_path_buf(), mode))
            .cloned()
            .ok_or_else(|| ProviderError::Unavailable { path: image.to_path_buf(), mode })
    }
}

/// Parse a hex token, with or without a `0x` prefix.
pub(crate) fn parse_hex(token: &str) -> Option<u64> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u64::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_provider_returns_registered_dump() {
        let provider = StaticProvider::new().with_dump(
            "/lib/libc.so.6",
            DumpMode::SymbolTables,
            "0000000000050000 g DF .text 00000000000001e9 puts",
        );

        let text = provider.dump(Path::new("/lib/libc.so.6"), DumpMode::SymbolTables).unwrap();
        assert!(text.ends_with("puts"));

        let missing = provider.dump(Path::new("/lib/libc.so.6"), DumpMode::Relocations);
        assert!(matches!(missing, Err(ProviderError::Unavailable { .. })));
    }

    #[test]
    fn test_provider_through_box() {
        let boxed: Box<dyn MetadataProvider> = Box::new(StaticProvider::new().with_dump(
            "/a",
            DumpMode::Relocations,
            "x",
        ));
        assert_eq!(boxed.dump(Path::new("/a"), DumpMode::Relocations).unwrap(), "x");
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("0x1000"), Some(0x1000));
        assert_eq!(parse_hex("00000000000001e9"), Some(0x1e9));
        assert_eq!(parse_hex("7f0000000000"), Some(0x7f00_0000_0000));
        assert_eq!(parse_hex("puts"), None);
        assert_eq!(parse_hex("(GLIBC_2.2.5)"), None);
        assert_eq!(parse_hex(""), None);
    }

    #[test]
    fn test_dump_mode_display() {
        assert_eq!(DumpMode::ProgramHeaders.to_string(), "program headers");
        assert_eq!(DumpMode::Relocations.to_string(), "relocations");
    }
}
