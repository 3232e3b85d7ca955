//! Module A of the colliding pair.
//!
//! Exports `shared_value` (111), `shared_compute` (`value + x + 1`) and
//! `shared_touch` (counter from 1000), all of which module B defines too,
//! plus the uniquely named `module_a_unique_value` / `module_a_unique_compute`
//! pair and the `module_a_snapshot` entry point.

use core::ffi::c_int;
use core::sync::atomic::{AtomicI32, Ordering};

use interpose_abi::guest::{CollidingSet, GuestModule, UniqueSet};
use interpose_abi::{HostV1, SnapshotV1, Status};

#[unsafe(export_name = "shared_value")]
pub static SHARED_VALUE: AtomicI32 = AtomicI32::new(111);

#[unsafe(export_name = "module_a_unique_value")]
pub static UNIQUE_VALUE: AtomicI32 = AtomicI32::new(10001);

static TOUCH_COUNTER: AtomicI32 = AtomicI32::new(1000);

#[unsafe(no_mangle)]
pub extern "C" fn shared_compute(x: c_int) -> c_int {
	SHARED_VALUE.load(Ordering::SeqCst).wrapping_add(x).wrapping_add(1)
}

/// Advances this module's counter and returns the new value.
#[unsafe(no_mangle)]
pub extern "C" fn shared_touch() -> c_int {
	TOUCH_COUNTER.fetch_add(1, Ordering::SeqCst).wrapping_add(1)
}

#[unsafe(no_mangle)]
pub extern "C" fn module_a_unique_compute(x: c_int) -> c_int {
	UNIQUE_VALUE.load(Ordering::SeqCst).wrapping_sub(x)
}

static MODULE: GuestModule = GuestModule {
	label: c"module_a",
	colliding: CollidingSet {
		value: &SHARED_VALUE,
		compute: shared_compute,
		touch: shared_touch,
	},
	unique: UniqueSet {
		value: &UNIQUE_VALUE,
		compute: module_a_unique_compute,
	},
};

/// Snapshot entry point.
///
/// # Safety
/// `out` must be valid for writes; `host` must be null or point to a live
/// [`HostV1`] for the duration of this call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn module_a_snapshot(host: *const HostV1, x: c_int, out: *mut SnapshotV1) -> Status {
	unsafe { MODULE.write_snapshot(host, x, out) }
}
