//! # Remote Symbol & Address Resolution
//!
//! This module turns a `(process, image, name)` triple into an absolute
//! address in the target's address space, without attaching to it.
//!
//! ## Address Translation Flow
//!
//! ```text
//! 1. Read /proc/<pid>/maps, take the first r?x? mapping whose path
//!    contains the image name
//!    7f0000000000-7f0000200000 r-xp 00000000 08:01 1234 /lib/.../libc.so.6
//!
//! 2. Correct the mapping start by the load bias of that file
//!    bias = p_vaddr - p_offset of its first r?x LOAD segment
//!    base = 0x7f0000000000 - bias
//!
//! 3. Look the name up in the symbol (or relocation) dump of the file
//!    0000000000050000 g    DF .text  ... puts   ->  0x50000
//!
//! 4. absolute = base + 0x50000 = 0x7f0000050000
//! ```
//!
//! ## Module Structure
//!
//! - **`memory_maps`**: lazy parser for the mapping table
//! - **`load_bias`**: LOAD segment pairing and bias calculation
//! - **`image_locator`**: image base lookup and reverse address lookup
//! - **`symbols`** / **`relocations`**: name lookup in provider dumps
//! - **`resolver`**: the composed queries behind [`Resolver`]
//!
//! ## Matching Rules
//!
//! - Image names match as unanchored substrings; the first qualifying mapping
//!   in table order wins.
//! - Symbol and relocation names match exactly; the *last* matching line of a
//!   dump wins.
//! - Reverse lookups treat a mapping's end address as inside the mapping.
//!
//! Nothing is cached between calls.

pub mod image_locator;
pub mod load_bias;
pub mod memory_maps;
pub mod relocations;
pub mod resolver;
pub mod symbols;

pub use image_locator::{find_image_base, find_image_for_address};
pub use load_bias::{compute_bias, ProgramHeaderSegment};
pub use memory_maps::{read_mappings, MappingRecord, Mappings};
pub use relocations::{resolve_relocation, RelocationRecord};
pub use resolver::Resolver;
pub use symbols::{resolve_symbol, SymbolRecord};
