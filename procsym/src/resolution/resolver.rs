//! Top-level resolution queries.

use super::image_locator::{find_image_base, find_image_for_address};
use super::relocations::resolve_relocation;
use super::symbols::resolve_symbol;
use crate::config::ResolverConfig;
use crate::domain::{ImageBase, Pid, ResolveError, ResolvedAddress};
use crate::metadata::MetadataProvider;
use log::info;
use std::path::PathBuf;

/// Resolves names to runtime addresses in live processes.
///
/// Holds only configuration and the provider; every call re-reads the
/// mapping table and re-dumps the image, so results always reflect the
/// process at call time.
#[derive(Debug, Clone)]
pub struct Resolver<P> {
    config: ResolverConfig,
    provider: P,
}

impl<P: MetadataProvider> Resolver<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(ResolverConfig::default(), provider)
    }

    pub fn with_config(config: ResolverConfig, provider: P) -> Self {
        Self { config, provider }
    }

    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Mapped path and bias-corrected base of the first executable mapping
    /// whose path contains `image_name`.
    ///
    /// # Errors
    /// See [`find_image_base`].
    pub fn find_image_base(&self, pid: Pid, image_name: &str) -> Result<ImageBase, ResolveError> {
        find_image_base(self.config.proc_root(), &self.provider, pid, image_name)
    }

    /// Path of the image whose mapping covers `address`.
    ///
    /// # Errors
    /// See [`find_image_for_address`].
    pub fn find_image_for_address(&self, pid: Pid, address: u64) -> Result<PathBuf, ResolveError> {
        find_image_for_address(self.config.proc_root(), pid, address)
    }

    /// Runtime address of the function `symbol` in the image matching
    /// `image_name`: image base plus the symbol's file-relative address.
    ///
    /// # Errors
    /// Fails if the image is not mapped or the symbol is not defined in it.
    pub fn resolve_function_address(
        &self,
        pid: Pid,
        image_name: &str,
        symbol: &str,
    ) -> Result<ResolvedAddress, ResolveError> {
        let image = self.find_image_base(pid, image_name)?;
        let offset = resolve_symbol(&self.provider, &image.image_path, symbol)?;
        let resolved = ResolvedAddress::from_offset(image, offset);
        info!("{symbol} in {pid} at {resolved}");
        Ok(resolved)
    }

    /// Runtime address of the relocation slot for `symbol` in the image
    /// matching `image_name`.
    ///
    /// # Errors
    /// Fails if the image is not mapped or has no relocation for `symbol`.
    pub fn resolve_relocation_address(
        &self,
        pid: Pid,
        image_name: &str,
        symbol: &str,
    ) -> Result<i64, ResolveError> {
        let image = self.find_image_base(pid, image_name)?;
        let offset = resolve_relocation(&self.provider, &image.image_path, symbol)?;
        let address = ResolvedAddress::from_offset(image, offset).absolute_address;
        info!("Relocation {symbol} in {pid} at 0x{address:x}");
        Ok(address)
    }

    /// [`Self::resolve_function_address`] against the C runtime library.
    ///
    /// # Errors
    /// Fails if libc is not mapped or does not define `symbol`.
    pub fn resolve_libc_function_address(
        &self,
        pid: Pid,
        symbol: &str,
    ) -> Result<ResolvedAddress, ResolveError> {
        self.resolve_function_address(pid, self.config.libc_fragment(), symbol)
    }
}
