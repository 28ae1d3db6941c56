//! Memory mapping utilities for process address space analysis
//!
//! This module parses `/proc/<pid>/maps` into [`MappingRecord`]s. Lines look
//! like:
//!
//! ```text
//! 7f0000000000-7f0000200000 r-xp 00000000 08:01 1234    /lib/x86_64-linux-gnu/libc.so.6
//! ```
//!
//! Anonymous mappings (no path column) and any line that does not have the
//! `start-end perms offset dev inode path` shape are skipped, not reported.
//! Paths are bytes on Linux; a path that is not UTF-8 is decoded lossily so
//! the line keeps its place in the table.

use crate::domain::{Pid, ResolveError};
use log::warn;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// One line of a process's mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRecord {
    pub start: u64,
    pub end: u64,
    pub permissions: String,
    pub offset: u64,
    pub inode: u64,
    pub path: String,
}

impl MappingRecord {
    /// `r?x?` permissions, checked positionally like the kernel prints them.
    #[must_use]
    pub fn is_readable_executable(&self) -> bool {
        let perms = self.permissions.as_bytes();
        perms.first() == Some(&b'r') && perms.get(2) == Some(&b'x')
    }

    /// Check if an address falls within this mapping.
    ///
    /// The upper bound is inclusive: an address equal to `end` (one past the
    /// last mapped byte) still counts as inside.
    #[must_use]
    pub fn covers(&self, addr: u64) -> bool {
        self.start <= addr && addr <= self.end
    }
}

/// Lazy, single-pass iterator over a mapping table.
///
/// An I/O error ends the sequence; it is logged, not returned.
pub struct Mappings<R> {
    reader: R,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> Mappings<R> {
    pub fn from_reader(reader: R) -> Self {
        Self { reader, buf: Vec::new(), done: false }
    }
}

impl<R: BufRead> Iterator for Mappings<R> {
    type Item = MappingRecord;

    fn next(&mut self) -> Option<MappingRecord> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    if let Some(record) = parse_map_line(&String::from_utf8_lossy(&self.buf)) {
                        return Some(record);
                    }
                }
                Err(e) => {
                    warn!("Stopped reading mapping table early: {e}");
                    self.done = true;
                }
            }
        }
        None
    }
}

/// Path of the mapping table for `pid` under `proc_root`.
#[must_use]
pub fn maps_path(proc_root: &Path, pid: Pid) -> PathBuf {
    proc_root.join(pid.0.to_string()).join("maps")
}

/// Open the mapping table of `pid`.
///
/// # Errors
/// Returns [`ResolveError::NotAccessible`] if the process does not exist or
/// its table cannot be opened.
pub fn read_mappings(proc_root: &Path, pid: Pid) -> Result<Mappings<BufReader<File>>, ResolveError> {
    let path = maps_path(proc_root, pid);
    let file = File::open(&path).map_err(|source| ResolveError::NotAccessible { path, source })?;
    Ok(Mappings::from_reader(BufReader::new(file)))
}

/// Parse a single maps line, or `None` if it does not have the full shape.
#[must_use]
pub fn parse_map_line(line: &str) -> Option<MappingRecord> {
    let (range, rest) = split_field(line)?;
    let (permissions, rest) = split_field(rest)?;
    let (offset, rest) = split_field(rest)?;
    let (_device, rest) = split_field(rest)?;
    let (inode, rest) = split_field(rest)?;

    let path = rest.trim();
    if path.is_empty() {
        return None;
    }

    let (start, end) = range.split_once('-')?;

    Some(MappingRecord {
        start: u64::from_str_radix(start, 16).ok()?,
        end: u64::from_str_radix(end, 16).ok()?,
        permissions: permissions.to_string(),
        offset: u64::from_str_radix(offset, 16).ok()?,
        inode: inode.parse().ok()?,
        path: path.to_string(),
    })
}

/// Split off the next whitespace-delimited field, returning it and the rest.
fn split_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some(s.split_at(end))
}
