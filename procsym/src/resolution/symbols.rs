//! Symbol lookup in `objdump -tT` style dumps.
//!
//! Two line layouts occur, depending on whether a version column is printed:
//!
//! ```text
//! 0000000000080e50 g    DF .text  00000000000001e9  GLIBC_2.2.5 puts
//! 0000000000001139 g     F .text  0000000000000016              main
//! ```

use crate::domain::{Lookup, ResolveError};
use crate::metadata::{parse_hex, DumpMode, MetadataProvider};
use log::debug;
use std::path::Path;

/// One entry of a static or dynamic symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRecord {
    pub address: u64,
    pub name: String,
}

/// Parse one dump line, trying the versioned layout before the plain one.
#[must_use]
pub fn parse_symbol_line(line: &str) -> Option<SymbolRecord> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    parse_versioned(&tokens).or_else(|| parse_plain(&tokens))
}

/// `<addr> <flag> <flag> <section> <size> <version> <name>`
fn parse_versioned(tokens: &[&str]) -> Option<SymbolRecord> {
    match tokens {
        [address, _, _, _section, size, _version, name, ..] => record(address, size, name),
        _ => None,
    }
}

/// `<addr> <flag> <flag> <section> <size> <name>`
fn parse_plain(tokens: &[&str]) -> Option<SymbolRecord> {
    match tokens {
        [address, _, _, _section, size, name, ..] => record(address, size, name),
        _ => None,
    }
}

fn record(address: &str, size: &str, name: &str) -> Option<SymbolRecord> {
    parse_hex(size)?;
    Some(SymbolRecord { address: parse_hex(address)?, name: name.to_string() })
}

/// All parseable symbol lines, in dump order.
pub fn symbol_records(dump: &str) -> impl Iterator<Item = SymbolRecord> + '_ {
    dump.lines().filter_map(parse_symbol_line)
}

/// Address of the last entry named exactly `name`.
///
/// A final match at address zero is an undefined (imported) entry and
/// counts as no match.
#[must_use]
pub fn find_symbol(dump: &str, name: &str) -> Option<u64> {
    symbol_records(dump)
        .filter(|record| record.name == name)
        .last()
        .map(|record| record.address)
        .filter(|&address| address != 0)
}

/// File-relative address of `name` in `image`.
///
/// # Errors
/// [`ResolveError::ProviderFailure`] if the symbol tables cannot be dumped,
/// [`ResolveError::NotFound`] if no entry matches.
pub fn resolve_symbol<P: MetadataProvider + ?Sized>(
    provider: &P,
    image: &Path,
    name: &str,
) -> Result<u64, ResolveError> {
    let dump = provider.dump(image, DumpMode::SymbolTables).map_err(|source| {
        ResolveError::ProviderFailure {
            image: image.to_path_buf(),
            mode: DumpMode::SymbolTables,
            source,
        }
    })?;

    let address = find_symbol(&dump, name).ok_or_else(|| {
        ResolveError::NotFound(Lookup::Symbol { image: image.to_path_buf(), name: name.to_string() })
    })?;
    debug!("Symbol {name} at {address:#x} in {}", image.display());
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::StaticProvider;

    const LIBC_SYMBOLS: &str = "
/lib/x86_64-linux-gnu/libc.so.6:     file format elf64-x86-64

SYMBOL TABLE:
no symbols


DYNAMIC SYMBOL TABLE:
0000000000000000      DF *UND*\t0000000000000000 (GLIBC_PRIVATE) _dl_find_object
0000000000000000  w   D  *UND*\t0000000000000000  Base        _ITM_addUserCommitAction
0000000000080e50 g    DF .text\t00000000000001e9  GLIBC_2.2.5 puts
0000000000060100 g    DF .text\t00000000000000c1  GLIBC_2.2.5 printf
0000000000080e50  w   DF .text\t00000000000001e9  GLIBC_2.2.5 _IO_puts
";

    #[test]
    fn test_versioned_layout() {
        let record =
            parse_symbol_line("0000000000080e50 g    DF .text\t00000000000001e9  GLIBC_2.2.5 puts")
                .unwrap();
        assert_eq!(record, SymbolRecord { address: 0x80e50, name: "puts".to_string() });
    }

    #[test]
    fn test_plain_layout() {
        let record =
            parse_symbol_line("0000000000001139 g     F .text\t0000000000000016              main")
                .unwrap();
        assert_eq!(record, SymbolRecord { address: 0x1139, name: "main".to_string() });
    }

    #[test]
    fn test_unparseable_lines() {
        assert!(parse_symbol_line("SYMBOL TABLE:").is_none());
        assert!(parse_symbol_line("DYNAMIC SYMBOL TABLE:").is_none());
        assert!(parse_symbol_line("no symbols").is_none());
        // undefined entry: the fifth column is not a hex size
        assert!(parse_symbol_line(
            "0000000000000000      DF *UND*\t0000000000000000 (GLIBC_PRIVATE) _dl_find_object"
        )
        .is_none());
        // too few columns
        assert!(parse_symbol_line("0000000000004010 g       .data\t0000000000000000 _edata").is_none());
    }

    #[test]
    fn test_find_symbol_exact_name() {
        assert_eq!(find_symbol(LIBC_SYMBOLS, "puts"), Some(0x80e50));
        assert_eq!(find_symbol(LIBC_SYMBOLS, "printf"), Some(0x60100));
        assert_eq!(find_symbol(LIBC_SYMBOLS, "put"), None);
        assert_eq!(find_symbol(LIBC_SYMBOLS, "_IO_put"), None);
    }

    #[test]
    fn test_last_match_wins() {
        let dump = "
0000000000001000 g     F .text\t0000000000000010              dup
0000000000002000 g    DF .text\t0000000000000010  Base        dup
";
        assert_eq!(find_symbol(dump, "dup"), Some(0x2000));
    }

    #[test]
    fn test_undefined_last_match_is_not_found() {
        assert_eq!(find_symbol(LIBC_SYMBOLS, "_ITM_addUserCommitAction"), None);
    }

    #[test]
    fn test_resolve_symbol_errors() {
        let image = Path::new("/lib/libc.so.6");
        let provider =
            StaticProvider::new().with_dump(image, DumpMode::SymbolTables, LIBC_SYMBOLS);

        assert_eq!(resolve_symbol(&provider, image, "puts").unwrap(), 0x80e50);

        let missing = resolve_symbol(&provider, image, "nonexistent").unwrap_err();
        assert!(missing.is_not_found());

        let failed = resolve_symbol(&provider, Path::new("/other.so"), "puts").unwrap_err();
        assert!(matches!(failed, ResolveError::ProviderFailure { .. }));
    }
}
