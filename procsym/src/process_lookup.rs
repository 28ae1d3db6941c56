//! Find a target process by name.

use crate::domain::Pid;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Longest command name the kernel keeps in `stat` (`TASK_COMM_LEN - 1`).
const COMM_MAX: usize = 15;

/// A process selected by `--name`.
#[derive(Debug)]
pub struct ProcessInfo {
    pub pid: Pid,
    pub exe_path: PathBuf,
    pub command: String,
}

/// What a `--name` argument is compared against.
///
/// Containing a `/` it names an executable by full path; otherwise it is a
/// program name checked against the exe basename and the (possibly
/// truncated) command name. Never a substring match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameQuery<'a> {
    Path(&'a Path),
    Program(&'a str),
}

impl<'a> NameQuery<'a> {
    fn new(name: &'a str) -> Self {
        if name.contains('/') {
            Self::Path(Path::new(name))
        } else {
            Self::Program(name)
        }
    }

    fn matches(self, command: &str, exe_path: &Path) -> bool {
        match self {
            Self::Path(path) => exe_path == path,
            Self::Program(program) => {
                exe_path.file_name().is_some_and(|base| base == program)
                    || command == truncate_comm(program)
            }
        }
    }
}

/// Find the one process under `proc_root` that `name` selects.
///
/// The calling process is never a candidate.
///
/// # Errors
/// Fails when `proc_root` cannot be listed, or when zero or several
/// processes match.
pub fn find_process_by_name(proc_root: &Path, name: &str) -> Result<ProcessInfo> {
    let query = NameQuery::new(name);
    let own_pid = std::process::id();
    let entries =
        fs::read_dir(proc_root).with_context(|| format!("Failed to read {}", proc_root.display()))?;

    let mut candidates: Vec<ProcessInfo> = entries
        .flatten()
        .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
        .filter(|&pid| pid != own_pid)
        .filter_map(|pid| {
            let dir = proc_root.join(pid.to_string());
            // kernel threads have no exe link
            let exe_path = fs::read_link(dir.join("exe")).ok()?;
            let command = extract_comm(&fs::read_to_string(dir.join("stat")).ok()?)?;
            query.matches(&command, &exe_path).then_some(ProcessInfo {
                pid: Pid(pid),
                exe_path,
                command,
            })
        })
        .collect();
    candidates.sort_by_key(|info| info.pid.0);

    match candidates.len() {
        0 => bail!("'{name}' does not name a running process visible under {}", proc_root.display()),
        1 => Ok(candidates.remove(0)),
        count => {
            let listing: String = candidates
                .iter()
                .map(|info| format!("\n  {:>7}  {}", info.pid.0, info.exe_path.display()))
                .collect();
            bail!("'{name}' is ambiguous, {count} processes match:{listing}\nRetry with --pid")
        }
    }
}

/// Command name from a stat line: "pid (comm) state ...".
fn extract_comm(stat_line: &str) -> Option<String> {
    let open = stat_line.find('(')?;
    let close = stat_line.rfind(')')?;
    (open < close).then(|| stat_line[open + 1..close].to_string())
}

/// `program` cut to what the kernel would store as its command name.
fn truncate_comm(program: &str) -> &str {
    if program.len() <= COMM_MAX {
        return program;
    }
    let mut cut = COMM_MAX;
    while !program.is_char_boundary(cut) {
        cut -= 1;
    }
    &program[..cut]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    fn fake_process(root: &Path, pid: u32, comm: &str, exe: &str) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stat"), format!("{pid} ({comm}) S 1 {pid} {pid} 0 -1")).unwrap();
        symlink(exe, dir.join("exe")).unwrap();
    }

    #[test]
    fn test_extract_comm() {
        let stat = "1234 (my-app) S 1 1234 1234 0 -1 4194304";
        assert_eq!(extract_comm(stat).unwrap(), "my-app");
    }

    #[test]
    fn test_extract_comm_with_parens() {
        let stat = "1234 (app (v2)) S 1 1234";
        assert_eq!(extract_comm(stat).unwrap(), "app (v2)");
        assert!(extract_comm("1234 )broken( S").is_none());
    }

    #[test]
    fn test_program_name_matches_exactly() {
        let exe = Path::new("/usr/bin/my-server");
        assert!(NameQuery::new("my-server").matches("my-server", exe));
        // exe basename alone is enough (comm may have been renamed)
        assert!(NameQuery::new("my-server").matches("worker-3", exe));
        assert!(!NameQuery::new("server").matches("my-server", exe));
        assert!(!NameQuery::new("my-server-2").matches("my-server", exe));
    }

    #[test]
    fn test_path_query_matches_full_exe_path() {
        let exe = Path::new("/usr/bin/my-server");
        assert_eq!(NameQuery::new("/usr/bin/my-server"), NameQuery::Path(exe));
        assert!(NameQuery::new("/usr/bin/my-server").matches("my-server", exe));
        assert!(!NameQuery::new("/opt/bin/my-server").matches("my-server", exe));
    }

    #[test]
    fn test_long_names_match_truncated_comm() {
        let exe = Path::new("/usr/lib/jvm/bin/java");
        assert_eq!(truncate_comm("thread-pool-executor"), "thread-pool-exe");
        assert_eq!(truncate_comm("short"), "short");
        assert!(NameQuery::new("thread-pool-executor").matches("thread-pool-exe", exe));
        assert!(!NameQuery::new("thread-pool").matches("thread-pool-exe", exe));
    }

    #[test]
    fn test_single_match() {
        let root = TempDir::new().unwrap();
        fake_process(root.path(), 100, "victim", "/usr/bin/victim");
        fake_process(root.path(), 200, "bystander", "/usr/bin/bystander");
        fs::create_dir_all(root.path().join("self")).unwrap();

        let info = find_process_by_name(root.path(), "victim").unwrap();
        assert_eq!(info.pid, Pid(100));
        assert_eq!(info.command, "victim");
        assert_eq!(info.exe_path, PathBuf::from("/usr/bin/victim"));
    }

    #[test]
    fn test_ambiguous_and_missing() {
        let root = TempDir::new().unwrap();
        fake_process(root.path(), 100, "worker", "/usr/bin/worker");
        fake_process(root.path(), 101, "worker", "/usr/bin/worker");

        fake_process(root.path(), 102, "worker-helper", "/usr/bin/worker-helper");

        let err = find_process_by_name(root.path(), "worker").unwrap_err().to_string();
        assert!(err.contains("ambiguous, 2 processes"), "{err}");
        assert!(err.contains("100") && err.contains("101"));

        // substrings no longer select a process
        let info = find_process_by_name(root.path(), "worker-helper").unwrap();
        assert_eq!(info.pid, Pid(102));
        let err = find_process_by_name(root.path(), "help").unwrap_err().to_string();
        assert!(err.contains("does not name a running process"), "{err}");
    }

    #[test]
    fn test_lookup_by_exe_path() {
        let root = TempDir::new().unwrap();
        fake_process(root.path(), 100, "app", "/opt/a/app");
        fake_process(root.path(), 200, "app", "/opt/b/app");

        assert!(find_process_by_name(root.path(), "app").is_err());
        assert_eq!(find_process_by_name(root.path(), "/opt/b/app").unwrap().pid, Pid(200));
    }
}
