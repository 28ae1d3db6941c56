//! Relocation lookup in `objdump -rR` style dumps.
//!
//! Used when a function is only reachable through its PLT/GOT slot, e.g. a
//! lazily bound import:
//!
//! ```text
//! DYNAMIC RELOCATION RECORDS
//! OFFSET           TYPE              VALUE
//! 0000000000003fd0 R_X86_64_JUMP_SLOT  puts@GLIBC_2.2.5
//! ```
//!
//! Names are compared verbatim, symbol version suffix included.

use crate::domain::{Lookup, ResolveError};
use crate::metadata::{parse_hex, DumpMode, MetadataProvider};
use log::debug;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationRecord {
    pub address: u64,
    pub name: String,
}

/// `<addr> <type> <name>`; anything after the name is ignored.
#[must_use]
pub fn parse_relocation_line(line: &str) -> Option<RelocationRecord> {
    let mut tokens = line.split_whitespace();
    let address = parse_hex(tokens.next()?)?;
    let _kind = tokens.next()?;
    let name = tokens.next()?;
    Some(RelocationRecord { address, name: name.to_string() })
}

pub fn relocation_records(dump: &str) -> impl Iterator<Item = RelocationRecord> + '_ {
    dump.lines().filter_map(parse_relocation_line)
}

/// Slot address of the last relocation named exactly `name`; zero counts as
/// no match.
#[must_use]
pub fn find_relocation(dump: &str, name: &str) -> Option<u64> {
    relocation_records(dump)
        .filter(|record| record.name == name)
        .last()
        .map(|record| record.address)
        .filter(|&address| address != 0)
}

/// File-relative address of the relocation slot for `name` in `image`.
///
/// # Errors
/// [`ResolveError::ProviderFailure`] if the relocations cannot be dumped,
/// [`ResolveError::NotFound`] if no entry matches.
pub fn resolve_relocation<P: MetadataProvider + ?Sized>(
    provider: &P,
    image: &Path,
    name: &str,
) -> Result<u64, ResolveError> {
    let dump = provider.dump(image, DumpMode::Relocations).map_err(|source| {
        ResolveError::ProviderFailure {
            image: image.to_path_buf(),
            mode: DumpMode::Relocations,
            source,
        }
    })?;

    let address = find_relocation(&dump, name).ok_or_else(|| {
        ResolveError::NotFound(Lookup::Relocation {
            image: image.to_path_buf(),
            name: name.to_string(),
        })
    })?;
    debug!("Relocation {name} at {address:#x} in {}", image.display());
    Ok(address)
}
