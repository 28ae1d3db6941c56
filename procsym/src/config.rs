//! Resolver configuration

use std::path::{Path, PathBuf};

/// Default root of the per-process introspection tree.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Path fragment identifying the C runtime library image.
pub const DEFAULT_LIBC_FRAGMENT: &str = "/libc";

/// Settings shared by every resolver query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    proc_root: PathBuf,
    libc_fragment: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            libc_fragment: DEFAULT_LIBC_FRAGMENT.to_string(),
        }
    }
}

impl ResolverConfig {
    #[must_use]
    pub fn with_proc_root(mut self, proc_root: impl Into<PathBuf>) -> Self {
        self.proc_root = proc_root.into();
        self
    }

    #[must_use]
    pub fn with_libc_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.libc_fragment = fragment.into();
        self
    }

    #[must_use]
    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    #[must_use]
    pub fn libc_fragment(&self) -> &str {
        &self.libc_fragment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.proc_root(), Path::new("/proc"));
        assert_eq!(config.libc_fragment(), "/libc");
    }

    #[test]
    fn test_overrides() {
        let config =
            ResolverConfig::default().with_proc_root("/tmp/fakeproc").with_libc_fragment("musl");
        assert_eq!(config.proc_root(), Path::new("/tmp/fakeproc"));
        assert_eq!(config.libc_fragment(), "musl");
    }
}
