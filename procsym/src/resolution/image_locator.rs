//! Where is an image loaded, and which image owns an address.

use super::load_bias::compute_bias;
use super::memory_maps::read_mappings;
use crate::domain::{ImageBase, Lookup, Pid, ResolveError};
use crate::metadata::MetadataProvider;
use log::debug;
use std::path::{Path, PathBuf};

/// Find the base address of the first readable+executable mapping whose
/// path contains `image_name`.
///
/// "First" is table order, not lowest address. The raw mapping start is
/// corrected by the load bias of the mapped file when one can be computed,
/// and used as-is otherwise. The provider is only consulted after a mapping
/// has been found.
///
/// # Errors
/// [`ResolveError::NotAccessible`] if the mapping table cannot be opened,
/// [`ResolveError::NotFound`] if no mapping qualifies.
#[allow(clippy::cast_possible_wrap)]
pub fn find_image_base<P: MetadataProvider + ?Sized>(
    proc_root: &Path,
    provider: &P,
    pid: Pid,
    image_name: &str,
) -> Result<ImageBase, ResolveError> {
    let mapping = read_mappings(proc_root, pid)?
        .find(|mapping| mapping.is_readable_executable() && mapping.path.contains(image_name))
        .ok_or_else(|| ResolveError::NotFound(Lookup::Image { pid, name: image_name.to_string() }))?;

    debug!(
        "Matched '{image_name}' in {pid}: 0x{:x}-0x{:x} {} {}",
        mapping.start, mapping.end, mapping.permissions, mapping.path
    );

    let image_path = PathBuf::from(mapping.path);
    let start = mapping.start as i64;
    let base_address = match compute_bias(provider, &image_path) {
        Some(bias) => start.wrapping_sub(bias),
        None => start,
    };

    Ok(ImageBase { image_path, base_address })
}

/// Path of the first mapping covering `address` (inclusive of the end).
///
/// # Errors
/// [`ResolveError::NotFound`] if no mapping covers the address, including
/// when the mapping table cannot be opened at all.
pub fn find_image_for_address(
    proc_root: &Path,
    pid: Pid,
    address: u64,
) -> Result<PathBuf, ResolveError> {
    let not_found = || ResolveError::NotFound(Lookup::Address { pid, address });

    read_mappings(proc_root, pid)
        .map_err(|e| {
            debug!("{e}");
            not_found()
        })?
        .find(|mapping| mapping.covers(address))
        .map(|mapping| PathBuf::from(mapping.path))
        .ok_or_else(not_found)
}
