//! Module loading and strictly ordered teardown.

use std::ffi::CStr;
use std::path::{Path, PathBuf};

use interpose_abi::SnapshotEntryV1;
use libloading::os::unix::{Library, RTLD_GLOBAL, RTLD_LOCAL, RTLD_NOW};
use tracing::{info, warn};

use crate::error::{HarnessError, Result};
use crate::module::{ModuleId, Visibility};

/// Opens module libraries.
pub trait ModuleLoader {
	type Module: LoadedModule;

	fn load(&mut self, path: &Path, visibility: Visibility) -> Result<Self::Module>;
}

/// A module that stays mapped until [`LoadedModule::unload`] consumes it.
pub trait LoadedModule {
	fn path(&self) -> &Path;

	/// Resolves `symbol` against this module's handle only.
	///
	/// # Safety
	/// `symbol` must name a function with the [`SnapshotEntryV1`] signature,
	/// and the returned pointer must not be called after unload.
	unsafe fn snapshot_entry(&self, symbol: &CStr) -> Result<SnapshotEntryV1>;

	fn unload(self) -> Result<()>;
}

/// Loads modules through the platform dynamic loader.
#[derive(Debug, Default)]
pub struct DlLoader;

impl ModuleLoader for DlLoader {
	type Module = DlModule;

	fn load(&mut self, path: &Path, visibility: Visibility) -> Result<DlModule> {
		let flags = RTLD_NOW
			| match visibility {
				Visibility::Global => RTLD_GLOBAL,
				Visibility::Local => RTLD_LOCAL,
			};
		// SAFETY: module initializers only seed their own statics.
		let library = unsafe { Library::open(Some(path), flags) }.map_err(|e| HarnessError::Load {
			path: path.to_path_buf(),
			detail: e.to_string(),
		})?;
		Ok(DlModule {
			library,
			path: path.to_path_buf(),
		})
	}
}

#[derive(Debug)]
pub struct DlModule {
	library: Library,
	path: PathBuf,
}

impl LoadedModule for DlModule {
	fn path(&self) -> &Path {
		&self.path
	}

	unsafe fn snapshot_entry(&self, symbol: &CStr) -> Result<SnapshotEntryV1> {
		// SAFETY: the caller vouches for the symbol's signature.
		let entry = unsafe { self.library.get::<SnapshotEntryV1>(symbol.to_bytes_with_nul()) }.map_err(|e| {
			HarnessError::ResolveEntry {
				symbol: symbol.to_string_lossy().into_owned(),
				path: self.path.clone(),
				detail: e.to_string(),
			}
		})?;
		Ok(*entry)
	}

	fn unload(self) -> Result<()> {
		let path = self.path;
		self.library.close().map_err(|e| HarnessError::Unload {
			path,
			detail: e.to_string(),
		})
	}
}

/// Owns loaded modules and releases them last-in, first-out.
///
/// Teardown order is enforced here rather than by callers: the only ways
/// out are [`ModuleStack::unload_all`] and `Drop`, and both pop.
pub struct ModuleStack<M: LoadedModule> {
	entries: Vec<(ModuleId, M)>,
}

impl<M: LoadedModule> ModuleStack<M> {
	pub fn new() -> Self {
		Self { entries: Vec::new() }
	}

	pub fn push(&mut self, id: ModuleId, module: M) {
		info!(module = %id, path = %module.path().display(), "loaded");
		self.entries.push((id, module));
	}

	pub fn get(&self, id: ModuleId) -> Option<&M> {
		self.entries.iter().find(|(held, _)| *held == id).map(|(_, module)| module)
	}

	/// Modules in acquisition order.
	#[cfg(test)]
	pub(crate) fn ids(&self) -> Vec<ModuleId> {
		self.entries.iter().map(|(id, _)| *id).collect()
	}

	#[cfg(test)]
	pub(crate) fn len(&self) -> usize {
		self.entries.len()
	}

	#[cfg(test)]
	pub(crate) fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Pops and unloads one module.
	pub fn unload_last(&mut self) -> Option<Result<ModuleId>> {
		let (id, module) = self.entries.pop()?;
		let path = module.path().to_path_buf();
		Some(module.unload().map(|()| {
			info!(module = %id, path = %path.display(), "unloaded");
			id
		}))
	}

	/// Unloads everything in reverse acquisition order.
	///
	/// Keeps going after a failure so earlier modules are still released;
	/// returns the first error.
	pub fn unload_all(mut self) -> Result<()> {
		let mut first_err = None;
		while let Some(result) = self.unload_last() {
			if let Err(err) = result {
				warn!(%err, "unload failed");
				first_err.get_or_insert(err);
			}
		}
		first_err.map_or(Ok(()), Err)
	}
}

impl<M: LoadedModule> Default for ModuleStack<M> {
	fn default() -> Self {
		Self::new()
	}
}

impl<M: LoadedModule> Drop for ModuleStack<M> {
	fn drop(&mut self) {
		while let Some(result) = self.unload_last() {
			if let Err(err) = result {
				warn!(%err, "unload failed during teardown");
			}
		}
	}
}
