//! Load bias from program headers.
//!
//! The start of a mapping in `/proc/<pid>/maps` is where a *segment* landed,
//! not necessarily where virtual address 0 of the image landed. Symbol and
//! relocation values in the file are relative to virtual address 0, so the
//! mapping start is shifted back by
//!
//! ```text
//! bias = p_vaddr - p_offset
//! ```
//!
//! of the first readable+executable LOAD segment. The program-header dump
//! describes each segment on two consecutive lines:
//!
//! ```text
//!     LOAD off    0x0000000000000000 vaddr 0x0000000000000000 paddr 0x0000000000000000 align 2**12
//!          filesz 0x00000000000005f8 memsz 0x00000000000005f8 flags r-x
//! ```

use crate::metadata::{parse_hex, DumpMode, MetadataProvider};
use log::{debug, warn};
use std::path::Path;

/// One LOAD segment, paired with the flags line that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramHeaderSegment {
    pub file_offset: u64,
    pub virtual_address: u64,
    pub flags: String,
}

impl ProgramHeaderSegment {
    #[must_use]
    pub fn is_readable_executable(&self) -> bool {
        let flags = self.flags.as_bytes();
        flags.first() == Some(&b'r') && flags.get(2) == Some(&b'x')
    }

    /// `virtual_address - file_offset`, as signed pointer-width arithmetic.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn bias(&self) -> i64 {
        self.virtual_address.wrapping_sub(self.file_offset) as i64
    }
}

/// LOAD segments in dump order.
///
/// A LOAD line only counts when the very next line is its flags line;
/// otherwise it is dropped and scanning resumes at that next line.
pub fn load_segments(dump: &str) -> impl Iterator<Item = ProgramHeaderSegment> + '_ {
    let mut lines = dump.lines().peekable();
    std::iter::from_fn(move || {
        while let Some(line) = lines.next() {
            let Some((file_offset, virtual_address)) = parse_load_line(line) else {
                continue;
            };
            if let Some(flags) = lines.peek().and_then(|next| parse_flags_line(next)) {
                lines.next();
                return Some(ProgramHeaderSegment { file_offset, virtual_address, flags });
            }
        }
        None
    })
}

fn parse_load_line(line: &str) -> Option<(u64, u64)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["LOAD", "off", off, "vaddr", vaddr, "paddr", paddr, "align", _align, ..] => {
            parse_hex(paddr)?;
            Some((parse_hex(off)?, parse_hex(vaddr)?))
        }
        _ => None,
    }
}

fn parse_flags_line(line: &str) -> Option<String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["filesz", filesz, "memsz", memsz, "flags", flags, ..] => {
            parse_hex(filesz)?;
            parse_hex(memsz)?;
            Some((*flags).to_string())
        }
        _ => None,
    }
}

/// Bias of the first readable+executable LOAD segment in a dump.
#[must_use]
pub fn bias_from_dump(dump: &str) -> Option<i64> {
    load_segments(dump)
        .find(ProgramHeaderSegment::is_readable_executable)
        .map(|segment| segment.bias())
}

/// Ask `provider` for the program headers of `image` and compute its bias.
///
/// `None` means "apply no correction": either no qualifying segment exists
/// or the provider failed. Neither is fatal for the caller.
pub fn compute_bias<P: MetadataProvider + ?Sized>(provider: &P, image: &Path) -> Option<i64> {
    let dump = match provider.dump(image, DumpMode::ProgramHeaders) {
        Ok(dump) => dump,
        Err(e) => {
            warn!("No load bias for {}: {e}", image.display());
            return None;
        }
    };

    let bias = bias_from_dump(&dump);
    match bias {
        Some(bias) => debug!("Load bias for {}: {bias:#x}", image.display()),
        None => debug!("No executable LOAD segment in {}", image.display()),
    }
    bias
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::StaticProvider;

    const LIBC_HEADERS: &str = "
/lib/x86_64-linux-gnu/libc.so.6:     file format elf64-x86-64

Program Header:
    PHDR off    0x0000000000000040 vaddr 0x0000000000000040 paddr 0x0000000000000040 align 2**3
         filesz 0x0000000000000310 memsz 0x0000000000000310 flags r--
    LOAD off    0x0000000000000000 vaddr 0x0000000000000000 paddr 0x0000000000000000 align 2**12
         filesz 0x0000000000028000 memsz 0x0000000000028000 flags r--
    LOAD off    0x0000000000028000 vaddr 0x0000000000029000 paddr 0x0000000000029000 align 2**12
         filesz 0x0000000000195000 memsz 0x0000000000195000 flags r-x
    LOAD off    0x00000000001bd000 vaddr 0x00000000001bf000 paddr 0x00000000001bf000 align 2**12
         filesz 0x000000000004f000 memsz 0x000000000004f000 flags r-x
";

    #[test]
    fn test_segments_are_paired() {
        let segments: Vec<ProgramHeaderSegment> = load_segments(LIBC_HEADERS).collect();
        assert_eq!(segments.len(), 3);
        assert_eq!(
            segments[1],
            ProgramHeaderSegment {
                file_offset: 0x28000,
                virtual_address: 0x29000,
                flags: "r-x".to_string()
            }
        );
    }

    #[test]
    fn test_first_executable_segment_wins() {
        assert_eq!(bias_from_dump(LIBC_HEADERS), Some(0x1000));
    }

    #[test]
    fn test_zero_bias() {
        let dump = "    LOAD off    0x0000000000000000 vaddr 0x0000000000000000 paddr 0x0000000000000000 align 2**21
         filesz 0x00000000000f0000 memsz 0x00000000000f0000 flags r-x";
        assert_eq!(bias_from_dump(dump), Some(0));
    }

    #[test]
    fn test_negative_bias_is_allowed() {
        let dump = "LOAD off 0x2000 vaddr 0x1000 paddr 0x1000 align 2**12
filesz 0x10 memsz 0x10 flags rwx";
        assert_eq!(bias_from_dump(dump), Some(-0x1000));
    }

    #[test]
    fn test_no_executable_segment() {
        let dump = "LOAD off 0x0 vaddr 0x0 paddr 0x0 align 2**12
filesz 0x10 memsz 0x10 flags r--
LOAD off 0x1000 vaddr 0x1000 paddr 0x1000 align 2**12
filesz 0x10 memsz 0x10 flags rw-";
        assert_eq!(bias_from_dump(dump), None);
        assert_eq!(bias_from_dump(""), None);
    }

    #[test]
    fn test_load_without_flags_line_is_ignored() {
        // Dump ends right after a LOAD line
        let truncated = "LOAD off 0x0 vaddr 0x4000 paddr 0x4000 align 2**12";
        assert_eq!(bias_from_dump(truncated), None);

        // A LOAD line whose successor is another LOAD pairs with nothing,
        // but the successor is still considered
        let dump = "LOAD off 0x0 vaddr 0x4000 paddr 0x4000 align 2**12
LOAD off 0x1000 vaddr 0x3000 paddr 0x3000 align 2**12
filesz 0x10 memsz 0x10 flags r-x";
        assert_eq!(bias_from_dump(dump), Some(0x2000));
    }

    #[test]
    fn test_flags_checked_positionally() {
        let dump = "LOAD off 0x0 vaddr 0x1000 paddr 0x1000 align 2**12
filesz 0x10 memsz 0x10 flags x-r";
        assert_eq!(bias_from_dump(dump), None);
    }

    #[test]
    fn test_compute_bias_provider_failure_is_none() {
        let provider = StaticProvider::new();
        assert_eq!(compute_bias(&provider, Path::new("/lib/libc.so.6")), None);
    }

    #[test]
    fn test_compute_bias_uses_program_headers() {
        let provider = StaticProvider::new().with_dump(
            "/lib/libc.so.6",
            DumpMode::ProgramHeaders,
            LIBC_HEADERS,
        );
        assert_eq!(compute_bias(&provider, Path::new("/lib/libc.so.6")), Some(0x1000));
    }
}
