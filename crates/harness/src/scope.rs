//! The process-wide default symbol scope as an injectable capability.
//!
//! The harness never calls `dlsym(RTLD_DEFAULT, ..)` directly. It holds a
//! [`SymbolScope`] and lends the same scope to each module through a
//! [`HostV1`], so tests can replace the global symbol table with a fake.

use std::ffi::{CStr, c_char, c_void};

use interpose_abi::{ABI_VERSION, HostV1};

use crate::addr::SymbolAddr;
use crate::error::LookupError;

/// Read-only view of whatever is currently bound to a name process-wide.
pub trait SymbolScope {
	fn lookup(&self, name: &CStr) -> Result<SymbolAddr, LookupError>;
}

impl<S: SymbolScope + ?Sized> SymbolScope for &S {
	fn lookup(&self, name: &CStr) -> Result<SymbolAddr, LookupError> {
		(**self).lookup(name)
	}
}

/// The dynamic linker's global scope (`RTLD_DEFAULT`).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultScope;

impl SymbolScope for DefaultScope {
	fn lookup(&self, name: &CStr) -> Result<SymbolAddr, LookupError> {
		// SAFETY: `dlerror` and `dlsym` are called with a valid nul-terminated
		// name; the error string is copied before any further dl* call.
		unsafe {
			libc::dlerror();
			let ptr = libc::dlsym(libc::RTLD_DEFAULT, name.as_ptr());
			let err = libc::dlerror();
			if !err.is_null() {
				return Err(LookupError(CStr::from_ptr(err).to_string_lossy().into_owned()));
			}
			SymbolAddr::from_ptr(ptr).ok_or_else(|| LookupError(format!("{} resolved to null", name.to_string_lossy())))
		}
	}
}

/// Lends a [`SymbolScope`] to module code for the lifetime of the borrow.
pub struct HostBridge<'a> {
	scope: &'a dyn SymbolScope,
}

impl<'a> HostBridge<'a> {
	pub fn new(scope: &'a dyn SymbolScope) -> Self {
		Self { scope }
	}

	/// Builds the C host table pointing back at this bridge.
	///
	/// The table is valid only while `self` is borrowed.
	pub fn host(&self) -> HostV1 {
		HostV1 {
			abi_version: ABI_VERSION,
			ctx: self as *const Self as *mut c_void,
			lookup_default: Some(lookup_trampoline),
		}
	}
}

unsafe extern "C" fn lookup_trampoline(ctx: *mut c_void, name: *const c_char) -> *mut c_void {
	if ctx.is_null() || name.is_null() {
		return std::ptr::null_mut();
	}
	// SAFETY: `ctx` was produced by `HostBridge::host` and the bridge outlives the call.
	let bridge = unsafe { &*ctx.cast::<HostBridge<'_>>() };
	let name = unsafe { CStr::from_ptr(name) };
	match bridge.scope.lookup(name) {
		Ok(addr) => addr.as_ptr(),
		Err(err) => {
			tracing::trace!(symbol = %name.to_string_lossy(), %err, "module lookup unresolved");
			std::ptr::null_mut()
		}
	}
}
