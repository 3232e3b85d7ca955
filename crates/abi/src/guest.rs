//! Module-side snapshot capture.
//!
//! Each module describes its own symbols with a [`GuestModule`] and forwards
//! its exported entry point to [`GuestModule::write_snapshot`]. The "own"
//! readings go through the references and function pointers the module
//! supplies; the "default" readings go through whatever the host's lookup
//! currently returns for the colliding names.

use core::ffi::{CStr, c_int};
use core::sync::atomic::AtomicI32;

use crate::access::{call_compute, call_compute_at, call_touch, call_touch_at, read_cell, read_cell_at};
use crate::{ABI_VERSION, ComputeFn, HostV1, SHARED_COMPUTE, SHARED_TOUCH, SHARED_VALUE, SnapshotV1, Status, TouchFn};

/// The colliding names as seen from inside one module.
#[derive(Debug)]
pub struct CollidingSet {
	pub value: &'static AtomicI32,
	pub compute: ComputeFn,
	pub touch: TouchFn,
}

/// Names only this module defines.
#[derive(Debug)]
pub struct UniqueSet {
	pub value: &'static AtomicI32,
	pub compute: ComputeFn,
}

/// Static description of a loaded module.
#[derive(Debug)]
pub struct GuestModule {
	pub label: &'static CStr,
	pub colliding: CollidingSet,
	pub unique: UniqueSet,
}

impl GuestModule {
	/// Captures a snapshot and writes it to `out`.
	///
	/// Lookup failures never surface here; they become sentinel readings.
	///
	/// # Safety
	/// `out` must be valid for writes. `host` must be null or point to a live
	/// [`HostV1`] whose lookup returns addresses matching the colliding
	/// signatures.
	pub unsafe fn write_snapshot(&self, host: *const HostV1, x: c_int, out: *mut SnapshotV1) -> Status {
		if out.is_null() {
			return Status::Failed;
		}

		// SAFETY: caller guarantees `host` is null or valid.
		let host = unsafe { host.as_ref() };
		if let Some(host) = host
			&& host.abi_version != ABI_VERSION
		{
			return Status::Incompatible;
		}

		let snapshot = unsafe { self.capture(host, x) };
		// SAFETY: checked non-null above; caller guarantees writability.
		unsafe { out.write(snapshot) };
		Status::Ok
	}

	/// # Safety
	/// See [`GuestModule::write_snapshot`].
	unsafe fn capture(&self, host: Option<&HostV1>, x: c_int) -> SnapshotV1 {
		let own_value = read_cell(self.colliding.value);
		let own_compute = call_compute(self.colliding.compute, x);
		let own_touch = call_touch(self.colliding.touch);

		let resolve = |name: &CStr| host.and_then(|h| h.resolve(name));
		let value_ptr = resolve(SHARED_VALUE);
		let compute_ptr = resolve(SHARED_COMPUTE);
		let touch_ptr = resolve(SHARED_TOUCH);

		// SAFETY: the host resolves the colliding names to definitions with
		// the colliding signatures.
		let (default_value, default_compute, default_touch) =
			unsafe { (read_cell_at(value_ptr), call_compute_at(compute_ptr, x), call_touch_at(touch_ptr)) };

		SnapshotV1 {
			abi_version: ABI_VERSION,
			label: self.label.as_ptr(),
			own_value,
			own_compute,
			own_touch,
			default_value,
			default_compute,
			default_touch,
			unique_value: read_cell(self.unique.value),
			unique_compute: call_compute(self.unique.compute, x),
		}
	}
}
