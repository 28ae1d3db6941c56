//! # procsym - Remote Symbol & Address Resolver
//!
//! procsym computes where a named function, or the relocation slot of a
//! named import, lives inside a *running* process. It never attaches to the
//! target: everything is derived from the process's mapping table and from
//! static metadata of the mapped image on disk. Code-injection tooling uses
//! the resulting addresses to redirect execution or patch memory.
//!
//! ## Architecture Overview
//!
//! ```text
//!   (pid, image, name)
//!          │
//!          ▼
//! ┌──────────────────┐   /proc/<pid>/maps   ┌──────────────────┐
//! │  Image Locator   │◀─────────────────────│ Process Map Reader│
//! │ first r?x? match │                      └──────────────────┘
//! └────────┬─────────┘
//!          │ image path                     ┌──────────────────┐
//!          ├───────────────────────────────▶│ Load Bias (LOAD)  │
//!          │ base = start - bias            └────────┬─────────┘
//!          ▼                                         │ program headers
//! ┌──────────────────┐  symbols / relocations ┌──────┴───────────┐
//! │ Symbol/Relocation│◀───────────────────────│ MetadataProvider │
//! │    Resolvers     │                        │ objdump | object │
//! └────────┬─────────┘                        └──────────────────┘
//!          ▼
//!   absolute = base + offset
//! ```
//!
//! ## Module Structure
//!
//! - [`resolution`]: map parsing, load bias, image location, symbol and
//!   relocation lookup, and the composed [`resolution::Resolver`] queries
//! - [`metadata`]: the [`metadata::MetadataProvider`] seam and its objdump,
//!   in-process ELF and canned-text implementations
//! - [`domain`]: `Pid`, result types and [`domain::ResolveError`]
//! - [`config`]: resolver settings
//! - [`cli`], [`process_lookup`], [`preflight`]: the `procsym` binary's front end
//!
//! ## Typical Usage
//!
//! ```rust,no_run
//! use procsym::domain::Pid;
//! use procsym::metadata::ObjdumpProvider;
//! use procsym::resolution::Resolver;
//!
//! let resolver = Resolver::new(ObjdumpProvider::default());
//! let puts = resolver.resolve_libc_function_address(Pid(1234), "puts")?;
//! println!("puts is at 0x{:x} in {}", puts.absolute_address, puts.image_path.display());
//! # Ok::<(), procsym::domain::ResolveError>(())
//! ```
//!
//! ## Key Concepts
//!
//! - **Mapping**: an address range a process has bound to a file, with permissions
//! - **Load bias**: offset between on-disk virtual addresses and where they landed
//! - **LOAD segment**: program header entry describing a region mapped at start-up
//! - **Relocation**: a slot the dynamic linker patches with a named value

pub mod cli;
pub mod config;
pub mod domain;
pub mod metadata;
pub mod preflight;
pub mod process_lookup;
pub mod resolution;
