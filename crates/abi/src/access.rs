//! Reads and calls through raw resolved addresses.
//!
//! Used both by module guest code (for default-scope readings) and by the
//! harness (for its own default-scope query).

use core::ffi::{c_int, c_void};
use core::sync::atomic::{AtomicI32, Ordering};

use crate::{ComputeFn, ReadingV1, TouchFn};

/// Reads an exported state cell.
pub fn read_cell(cell: &AtomicI32) -> ReadingV1 {
	ReadingV1::new(cell.load(Ordering::SeqCst), cell as *const AtomicI32 as usize)
}

/// Calls an accessor and records its result next to its address.
pub fn call_compute(f: ComputeFn, x: c_int) -> ReadingV1 {
	ReadingV1::new(f(x), f as usize)
}

/// Calls a mutator and records its result next to its address.
pub fn call_touch(f: TouchFn) -> ReadingV1 {
	ReadingV1::new(f(), f as usize)
}

/// Reads the state cell at `ptr`, or the sentinel when unresolved.
///
/// # Safety
/// A non-null `ptr` must point to a live `AtomicI32` (or `c_int`) cell.
pub unsafe fn read_cell_at(ptr: Option<*mut c_void>) -> ReadingV1 {
	match ptr {
		// SAFETY: caller guarantees the pointee is a live 32-bit cell.
		Some(ptr) => read_cell(unsafe { &*ptr.cast::<AtomicI32>() }),
		None => ReadingV1::UNRESOLVED,
	}
}

/// Calls the accessor at `ptr` once, or records the sentinel when unresolved.
///
/// # Safety
/// A non-null `ptr` must be the address of a function with the [`ComputeFn`] signature.
pub unsafe fn call_compute_at(ptr: Option<*mut c_void>, x: c_int) -> ReadingV1 {
	match ptr {
		Some(ptr) => {
			// SAFETY: caller guarantees the signature.
			let f = unsafe { core::mem::transmute::<*mut c_void, ComputeFn>(ptr) };
			call_compute(f, x)
		}
		None => ReadingV1::UNRESOLVED,
	}
}

/// Calls the mutator at `ptr` once, or records the sentinel when unresolved.
///
/// # Safety
/// A non-null `ptr` must be the address of a function with the [`TouchFn`] signature.
pub unsafe fn call_touch_at(ptr: Option<*mut c_void>) -> ReadingV1 {
	match ptr {
		Some(ptr) => {
			// SAFETY: caller guarantees the signature.
			let f = unsafe { core::mem::transmute::<*mut c_void, TouchFn>(ptr) };
			call_touch(f)
		}
		None => ReadingV1::UNRESOLVED,
	}
}
