//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep process ids and runtime addresses from being
//! mixed up with file-relative offsets in function signatures.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Process ID
///
/// Identifies the target process. Validity is the caller's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

impl From<u32> for Pid {
    fn from(pid: u32) -> Self {
        Pid(pid)
    }
}

/// Where an image sits in a process: its mapped path and corrected base.
///
/// The base is signed: bias correction may legitimately move it below zero
/// for degenerate program headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageBase {
    pub image_path: PathBuf,
    pub base_address: i64,
}

/// Final output of a function lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAddress {
    pub image_path: PathBuf,
    pub base_address: i64,
    pub absolute_address: i64,
}

impl ResolvedAddress {
    /// Combine an image base with a file-relative offset.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn from_offset(image: ImageBase, offset: u64) -> Self {
        Self {
            absolute_address: image.base_address.wrapping_add(offset as i64),
            image_path: image.image_path,
            base_address: image.base_address,
        }
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x} {}", self.absolute_address, self.image_path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_display() {
        assert_eq!(Pid(1234).to_string(), "PID:1234");
        assert_eq!(Pid::from(7u32), Pid(7));
    }

    #[test]
    fn test_resolved_address_from_offset() {
        let image = ImageBase {
            image_path: PathBuf::from("/lib/x86_64-linux-gnu/libc.so.6"),
            base_address: 0x7f00_0000_0000,
        };
        let resolved = ResolvedAddress::from_offset(image, 0x5_0000);
        assert_eq!(resolved.absolute_address, 0x7f00_0005_0000);
        assert_eq!(resolved.base_address, 0x7f00_0000_0000);
        assert_eq!(resolved.to_string(), "0x7f0000050000 /lib/x86_64-linux-gnu/libc.so.6");
    }

    #[test]
    fn test_negative_base_wraps() {
        let image = ImageBase { image_path: PathBuf::from("/weird"), base_address: -0x1000 };
        let resolved = ResolvedAddress::from_offset(image, 0x3000);
        assert_eq!(resolved.absolute_address, 0x2000);
    }

    #[test]
    fn test_resolved_address_serializes() {
        let resolved = ResolvedAddress {
            image_path: PathBuf::from("/usr/lib/libc.so.6"),
            base_address: 16,
            absolute_address: 32,
        };
        let json = serde_json::to_string(&resolved).unwrap();
        assert_eq!(
            json,
            r#"{"image_path":"/usr/lib/libc.so.6","base_address":16,"absolute_address":32}"#
        );
    }
}
