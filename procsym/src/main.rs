//! # procsym - Main Entry Point
//!
//! Resolves one query against one process and prints the answer as text
//! (`0x<address> <image>`) or JSON (`--json`).

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;
use serde_json::json;
use std::io::ErrorKind;

use procsym::cli::{Args, ProviderKind, Query};
use procsym::config::ResolverConfig;
use procsym::domain::{Pid, ResolveError};
use procsym::metadata::{ElfProvider, MetadataProvider, ObjdumpProvider};
use procsym::preflight::{check_objdump, check_proc_access, check_process_exists};
use procsym::process_lookup::find_process_by_name;
use procsym::resolution::Resolver;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_NOT_FOUND: i32 = 3;
const EXIT_NOPERM: i32 = 77;

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    std::process::exit(match run(&args) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            exit_code_for(&e)
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let permission_denied = err.chain().any(|cause| {
        cause.downcast_ref::<std::io::Error>().is_some_and(|io| io.kind() == ErrorKind::PermissionDenied)
    });
    if permission_denied {
        return EXIT_NOPERM;
    }

    match err.downcast_ref::<ResolveError>() {
        Some(ResolveError::NotFound(_)) => EXIT_NOT_FOUND,
        _ => EXIT_ERROR,
    }
}

/// Resolve the PID from `--pid` or `--name`.
fn resolve_pid(args: &Args, config: &ResolverConfig) -> Result<Pid> {
    if let Some(pid) = args.pid {
        return Ok(Pid(pid));
    }
    // clap guarantees exactly one of --pid / --name
    let name = args.name.as_deref().context("Missing required argument: --name or --pid")?;
    let info = find_process_by_name(config.proc_root(), name)?;
    debug!("'{name}' is {} ({})", info.pid, info.exe_path.display());
    Ok(info.pid)
}

fn build_provider(args: &Args) -> Result<Box<dyn MetadataProvider>> {
    Ok(match args.provider {
        ProviderKind::Objdump => {
            if args.query.needs_metadata() {
                check_objdump(&args.objdump)?;
            }
            Box::new(ObjdumpProvider::new(&args.objdump))
        }
        ProviderKind::Elf => Box::new(ElfProvider::new()),
    })
}

fn run(args: &Args) -> Result<()> {
    let config = ResolverConfig::default()
        .with_proc_root(&args.proc_root)
        .with_libc_fragment(&args.libc_fragment);

    let pid = resolve_pid(args, &config)?;
    check_process_exists(config.proc_root(), pid)?;
    check_proc_access(config.proc_root(), pid)?;

    let resolver = Resolver::with_config(config, build_provider(args)?);

    let (text, value) = match &args.query {
        Query::Function { image, symbol } => {
            let resolved = resolver.resolve_function_address(pid, image, symbol)?;
            (resolved.to_string(), serde_json::to_value(&resolved)?)
        }
        Query::Libc { symbol } => {
            let resolved = resolver.resolve_libc_function_address(pid, symbol)?;
            (resolved.to_string(), serde_json::to_value(&resolved)?)
        }
        Query::Relocation { image, symbol } => {
            let address = resolver.resolve_relocation_address(pid, image, symbol)?;
            (
                format!("0x{address:x}"),
                json!({ "image": image, "symbol": symbol, "absolute_address": address }),
            )
        }
        Query::Image { image } => {
            let base = resolver.find_image_base(pid, image)?;
            (
                format!("0x{:x} {}", base.base_address, base.image_path.display()),
                serde_json::to_value(&base)?,
            )
        }
        Query::Owner { address } => {
            let path = resolver.find_image_for_address(pid, *address)?;
            (
                path.display().to_string(),
                json!({ "address": address, "image_path": path }),
            )
        }
    };

    if args.json {
        println!("{value}");
    } else {
        println!("{text}");
    }
    Ok(())
}
