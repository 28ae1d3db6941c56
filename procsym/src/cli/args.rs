//! CLI argument definitions

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "procsym",
    version,
    about = "Resolve function and relocation addresses inside a running process",
    group(ArgGroup::new("target").required(true).args(["name", "pid"])),
    after_help = "\
EXAMPLES:
    procsym --pid 1234 libc puts                    Address of puts in the target's libc
    procsym --name my-app function my-app main      Address of main in the executable
    procsym --pid 1234 relocation my-app free@GLIBC_2.2.5
                                                    Address of free's GOT slot
    procsym --pid 1234 owner 0x7f0000050000         Which image contains an address"
)]
pub struct Args {
    /// Program name or executable path of the process to inspect
    #[arg(short, long, value_name = "PROCESS")]
    pub name: Option<String>,

    /// Process ID to inspect
    #[arg(short, long)]
    pub pid: Option<u32>,

    /// Where symbol, relocation and program header tables come from
    #[arg(long, value_enum, default_value_t = ProviderKind::Objdump)]
    pub provider: ProviderKind,

    /// objdump program used by the objdump provider
    #[arg(long, value_name = "PATH", default_value = "objdump")]
    pub objdump: PathBuf,

    /// Root of the per-process introspection tree
    #[arg(long, value_name = "DIR", default_value = "/proc")]
    pub proc_root: PathBuf,

    /// Path fragment identifying the C runtime library
    #[arg(long, value_name = "TEXT", default_value = "/libc")]
    pub libc_fragment: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Log resolution steps (same as RUST_LOG=debug)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub query: Query,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// Run binutils objdump
    Objdump,
    /// Parse the image in-process
    Elf,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Query {
    /// Runtime address of a function defined in an image
    Function {
        /// Substring of the image path
        image: String,
        symbol: String,
    },
    /// Runtime address of a relocation slot in an image
    Relocation {
        /// Substring of the image path
        image: String,
        /// Slot name as objdump prints it, e.g. `free@GLIBC_2.2.5`
        symbol: String,
    },
    /// Runtime address of a function in the C runtime library
    Libc { symbol: String },
    /// Path and base address of an image
    Image {
        /// Substring of the image path
        image: String,
    },
    /// Image that contains an address
    Owner {
        /// Address, hex with 0x prefix or decimal
        #[arg(value_parser = parse_address)]
        address: u64,
    },
}

impl Query {
    /// Whether answering needs the metadata provider.
    #[must_use]
    pub fn needs_metadata(&self) -> bool {
        !matches!(self, Query::Owner { .. })
    }
}

/// Parse `0x`-prefixed hex or plain decimal.
///
/// # Errors
/// Returns a message clap shows next to the offending argument.
pub fn parse_address(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{s}': {e}"))
}
