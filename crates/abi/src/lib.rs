//! C ABI contract between the colliding modules and the resolution harness.
//!
//! Both modules export the same three names ([`SHARED_VALUE`],
//! [`SHARED_COMPUTE`], [`SHARED_TOUCH`]) plus one uniquely named snapshot
//! entry point each. The harness never calls a colliding name to pick an
//! entry point; it resolves [`MODULE_A_SNAPSHOT`] / [`MODULE_B_SNAPSHOT`]
//! against the module handle and hands the module a [`HostV1`] carrying the
//! default-scope lookup it should use.
//!
//! # Layout
//!
//! * [`SnapshotV1`] is written by the module into caller-provided storage.
//! * Every reading is a `(value, addr)` pair; an address of zero means the
//!   name did not resolve and the value is [`SENTINEL`].
//! * State cells are `AtomicI32`, layout-compatible with `c_int`.

use core::ffi::{CStr, c_char, c_int, c_void};

pub mod access;
pub mod guest;

/// Current ABI version. Bumped on any layout change.
pub const ABI_VERSION: u32 = 1;

/// Value recorded when a default-scope lookup fails.
pub const SENTINEL: c_int = -1;

/// Colliding mutable state cell.
pub const SHARED_VALUE: &CStr = c"shared_value";
/// Colliding pure accessor `fn(c_int) -> c_int`.
pub const SHARED_COMPUTE: &CStr = c"shared_compute";
/// Colliding mutator `fn() -> c_int`.
pub const SHARED_TOUCH: &CStr = c"shared_touch";

/// Module A snapshot entry point.
pub const MODULE_A_SNAPSHOT: &CStr = c"module_a_snapshot";
/// Module B snapshot entry point.
pub const MODULE_B_SNAPSHOT: &CStr = c"module_b_snapshot";

/// Signature of a colliding or unique accessor.
pub type ComputeFn = extern "C" fn(x: c_int) -> c_int;

/// Signature of the colliding mutator.
pub type TouchFn = extern "C" fn() -> c_int;

/// Default-scope lookup provided by the host.
///
/// Returns null when `name` has no process-wide binding.
pub type LookupFn = unsafe extern "C" fn(ctx: *mut c_void, name: *const c_char) -> *mut c_void;

/// Snapshot entry point exported by each module.
///
/// # Safety
/// `out` must be valid for writes. `host` must be null or point to a [`HostV1`]
/// that stays alive for the duration of the call.
pub type SnapshotEntryV1 = unsafe extern "C" fn(host: *const HostV1, x: c_int, out: *mut SnapshotV1) -> Status;

/// Result of a snapshot call.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
	Ok = 0,
	Failed = 1,
	Incompatible = 2,
}

/// Capabilities the harness lends to a module for one call.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HostV1 {
	pub abi_version: u32,
	/// Opaque context passed back to `lookup_default`.
	pub ctx: *mut c_void,
	pub lookup_default: Option<LookupFn>,
}

impl HostV1 {
	/// Resolves `name` through the host's default scope.
	///
	/// Returns `None` when the host has no lookup or the name is unbound.
	pub fn resolve(&self, name: &CStr) -> Option<*mut c_void> {
		let lookup = self.lookup_default?;
		// SAFETY: the host guarantees `ctx` matches `lookup` for the call's duration.
		let ptr = unsafe { lookup(self.ctx, name.as_ptr()) };
		(!ptr.is_null()).then_some(ptr)
	}
}

/// One observed `(value, address)` pair.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingV1 {
	pub value: c_int,
	/// Zero when unresolved.
	pub addr: usize,
}

impl ReadingV1 {
	pub const UNRESOLVED: Self = Self {
		value: SENTINEL,
		addr: 0,
	};

	pub const fn new(value: c_int, addr: usize) -> Self {
		Self { value, addr }
	}

	pub const fn is_resolved(&self) -> bool {
		self.addr != 0
	}
}

/// Per-module snapshot in the field order of the textual report.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct SnapshotV1 {
	pub abi_version: u32,
	/// Static, nul-terminated module label.
	pub label: *const c_char,

	pub own_value: ReadingV1,
	pub own_compute: ReadingV1,
	pub own_touch: ReadingV1,

	pub default_value: ReadingV1,
	pub default_compute: ReadingV1,
	pub default_touch: ReadingV1,

	pub unique_value: ReadingV1,
	pub unique_compute: ReadingV1,
}
