//! In-process metadata provider built on the `object` crate.
//!
//! Renders the three dumps in the column layouts binutils `objdump` prints,
//! so the line scanners in [`crate::resolution`] work unchanged whichever
//! provider is plugged in.

// String formatting intentionally uses format! for clarity
#![allow(clippy::format_push_string)]

use super::{DumpMode, MetadataProvider, ProviderError};
use log::debug;
use object::elf::{PF_R, PF_W, PF_X};
use object::read::elf::{ElfFile, FileHeader, Sym};
use object::{
    Architecture, Object, ObjectSection, ObjectSegment, ObjectSymbol, ObjectSymbolTable,
    RelocationFlags, RelocationTarget, SegmentFlags, SymbolKind, SymbolSection,
};
use std::fs;
use std::path::Path;

/// Parses the image with `object` on every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElfProvider;

impl ElfProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MetadataProvider for ElfProvider {
    fn dump(&self, image: &Path, mode: DumpMode) -> Result<String, ProviderError> {
        debug!("Rendering {mode} of {} in-process", image.display());

        let data = fs::read(image)
            .map_err(|source| ProviderError::Read { path: image.to_path_buf(), source })?;
        let obj = object::File::parse(&*data)?;

        let mut out = format!("\n{}:     file format {}\n\n", image.display(), file_format(&obj));
        match mode {
            DumpMode::ProgramHeaders => render_program_headers(&obj, &mut out),
            DumpMode::SymbolTables => render_symbols(&obj, &mut out),
            DumpMode::Relocations => render_relocations(&obj, &mut out),
        }
        Ok(out)
    }
}

fn file_format(obj: &object::File<'_>) -> String {
    let bits = if obj.is_64() { 64 } else { 32 };
    format!("elf{bits}-{:?}", obj.architecture()).to_lowercase()
}

fn render_program_headers(obj: &object::File<'_>, out: &mut String) {
    out.push_str("Program Header:\n");
    for segment in obj.segments() {
        let (file_offset, file_size) = segment.file_range();
        let align = segment.align();
        let align_log2 = if align <= 1 { 0 } else { align.trailing_zeros() };
        // object does not expose p_paddr; objdump shows it equal to vaddr for
        // ordinary userspace images
        out.push_str(&format!(
            "    LOAD off    0x{file_offset:016x} vaddr 0x{vaddr:016x} paddr 0x{vaddr:016x} align 2**{align_log2}\n",
            vaddr = segment.address(),
        ));
        out.push_str(&format!(
            "         filesz 0x{file_size:016x} memsz 0x{:016x} flags {}\n",
            segment.size(),
            segment_flags(segment.flags()),
        ));
    }
}

fn segment_flags(flags: SegmentFlags) -> String {
    let SegmentFlags::Elf { p_flags } = flags else {
        return "---".to_string();
    };
    [(PF_R, 'r'), (PF_W, 'w'), (PF_X, 'x')]
        .iter()
        .map(|&(bit, c)| if p_flags & bit != 0 { c } else { '-' })
        .collect()
}

fn render_symbols(obj: &object::File<'_>, out: &mut String) {
    out.push_str("SYMBOL TABLE:\n");
    for symbol in obj.symbols() {
        render_symbol(obj, &symbol, false, out);
    }

    if obj.dynamic_symbol_table().is_some() {
        out.push_str("\nDYNAMIC SYMBOL TABLE:\n");
        for symbol in obj.dynamic_symbols() {
            render_symbol(obj, &symbol, true, out);
        }
    }
}

/// One line in objdump's `-t` shape: address, seven flag columns, section,
/// size, name.
fn render_symbol<'data>(
    obj: &object::File<'data>,
    symbol: &impl ObjectSymbol<'data>,
    dynamic: bool,
    out: &mut String,
) {
    let section = symbol_section_name(obj, symbol.section());
    let name = match symbol.name() {
        Ok("") if symbol.kind() == SymbolKind::Section => section.clone(),
        Ok(name) => name.to_string(),
        Err(_) => return,
    };

    let undefined = symbol.is_undefined();
    let bind = if symbol.is_weak() || undefined {
        ' '
    } else if symbol.is_global() {
        'g'
    } else if symbol.is_local() {
        'l'
    } else {
        ' '
    };
    let weak = if symbol.is_weak() { 'w' } else { ' ' };
    let debugging = match symbol.kind() {
        _ if dynamic => 'D',
        SymbolKind::Section | SymbolKind::File => 'd',
        _ => ' ',
    };
    let kind = match symbol.kind() {
        SymbolKind::Text => 'F',
        SymbolKind::File => 'f',
        SymbolKind::Data | SymbolKind::Tls => 'O',
        _ => ' ',
    };

    out.push_str(&format!(
        "{:016x} {bind}{weak}   {debugging}{kind} {section}\t{:016x} {name}\n",
        symbol.address(),
        symbol.size(),
    ));
}

fn symbol_section_name(obj: &object::File<'_>, section: SymbolSection) -> String {
    match section {
        SymbolSection::Section(index) => obj
            .section_by_index(index)
            .ok()
            .and_then(|s| s.name().ok().map(str::to_string))
            .unwrap_or_else(|| "*UNK*".to_string()),
        SymbolSection::Undefined => "*UND*".to_string(),
        SymbolSection::Absolute => "*ABS*".to_string(),
        SymbolSection::Common => "*COM*".to_string(),
        _ => "*UNK*".to_string(),
    }
}

fn render_relocations(obj: &object::File<'_>, out: &mut String) {
    for section in obj.sections() {
        let mut relocations = section.relocations().peekable();
        if relocations.peek().is_none() {
            continue;
        }
        out.push_str(&format!(
            "RELOCATION RECORDS FOR [{}]:\nOFFSET           TYPE              VALUE\n",
            section.name().unwrap_or("*UNK*")
        ));
        for (offset, relocation) in relocations {
            let target = match relocation.target() {
                RelocationTarget::Symbol(index) => {
                    obj.symbol_by_index(index).ok().and_then(|s| s.name().ok().map(str::to_string))
                }
                _ => None,
            };
            render_relocation(obj, offset, &relocation, target, out);
        }
        out.push('\n');
    }

    let Some(relocations) = obj.dynamic_relocations() else {
        return;
    };
    let dynamic_symbols = obj.dynamic_symbol_table();
    let versions = match obj {
        object::File::Elf32(elf) => version_suffixes(elf),
        object::File::Elf64(elf) => version_suffixes(elf),
        _ => Vec::new(),
    };
    out.push_str("DYNAMIC RELOCATION RECORDS\nOFFSET           TYPE              VALUE\n");
    for (offset, relocation) in relocations {
        let target = match (relocation.target(), &dynamic_symbols) {
            (RelocationTarget::Symbol(index), Some(table)) => {
                table.symbol_by_index(index).ok().and_then(|s| s.name().ok()).map(|name| {
                    let version = versions.get(index.0).map_or("", String::as_str);
                    format!("{name}{version}")
                })
            }
            _ => None,
        };
        render_relocation(obj, offset, &relocation, target, out);
    }
}

/// `@VERSION` / `@@VERSION` per dynamic symbol index, as binutils appends
/// them to relocation targets. Empty for unversioned symbols.
///
/// A defined symbol whose version is not hidden is the default version and
/// gets `@@`; imports and hidden versions get `@`.
fn version_suffixes<Elf: FileHeader>(elf: &ElfFile<'_, Elf>) -> Vec<String> {
    let endian = elf.endian();
    let versions = match elf.elf_section_table().versions(endian, elf.data()) {
        Ok(Some(versions)) => versions,
        Ok(None) => return Vec::new(),
        Err(e) => {
            debug!("Ignoring unreadable symbol versions: {e}");
            return Vec::new();
        }
    };

    elf.elf_dynamic_symbol_table()
        .enumerate()
        .map(|(index, symbol)| {
            let version_index = versions.version_index(endian, index);
            let Ok(Some(version)) = versions.version(version_index) else {
                return String::new();
            };
            let separator =
                if symbol.is_undefined(endian) || version_index.is_hidden() { "@" } else { "@@" };
            format!("{separator}{}", String::from_utf8_lossy(version.name()))
        })
        .collect()
}

fn render_relocation(
    obj: &object::File<'_>,
    offset: u64,
    relocation: &object::Relocation,
    target: Option<String>,
    out: &mut String,
) {
    let width: usize = if obj.is_64() { 16 } else { 8 };
    let base = target.filter(|name| !name.is_empty()).unwrap_or_else(|| "*ABS*".to_string());
    let value = match relocation.addend() {
        0 => base,
        a if a > 0 => format!("{base}+0x{a:0width$x}"),
        a => format!("{base}-0x{:0width$x}", a.unsigned_abs()),
    };
    out.push_str(&format!(
        "{offset:0width$x} {:<17} {value}\n",
        relocation_type_name(obj.architecture(), relocation.flags())
    ));
}

fn relocation_type_name(arch: Architecture, flags: RelocationFlags) -> String {
    let RelocationFlags::Elf { r_type } = flags else {
        return "UNKNOWN".to_string();
    };
    if arch == Architecture::X86_64 {
        let name = match r_type {
            object::elf::R_X86_64_64 => Some("R_X86_64_64"),
            object::elf::R_X86_64_PC32 => Some("R_X86_64_PC32"),
            object::elf::R_X86_64_PLT32 => Some("R_X86_64_PLT32"),
            object::elf::R_X86_64_COPY => Some("R_X86_64_COPY"),
            object::elf::R_X86_64_GLOB_DAT => Some("R_X86_64_GLOB_DAT"),
            object::elf::R_X86_64_JUMP_SLOT => Some("R_X86_64_JUMP_SLOT"),
            object::elf::R_X86_64_RELATIVE => Some("R_X86_64_RELATIVE"),
            object::elf::R_X86_64_DTPMOD64 => Some("R_X86_64_DTPMOD64"),
            object::elf::R_X86_64_TPOFF64 => Some("R_X86_64_TPOFF64"),
            object::elf::R_X86_64_IRELATIVE => Some("R_X86_64_IRELATIVE"),
            _ => None,
        };
        if let Some(name) = name {
            return name.to_string();
        }
    }
    format!("R_TYPE_{r_type}")
}
