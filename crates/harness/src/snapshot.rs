//! Owned snapshot data and the two ways of capturing it.

use std::ffi::{CStr, c_int};
use std::mem::MaybeUninit;

use interpose_abi::access::{call_compute_at, call_touch_at, read_cell_at};
use interpose_abi::{ABI_VERSION, ReadingV1, SHARED_COMPUTE, SHARED_TOUCH, SHARED_VALUE, SnapshotEntryV1, SnapshotV1, Status};
use serde::{Deserialize, Serialize};

use crate::addr::SymbolAddr;
use crate::error::{HarnessError, Result};
use crate::module::ModuleId;
use crate::scope::{HostBridge, SymbolScope};

/// A value observed together with the identity of the symbol it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
	pub value: i32,
	/// `None` when the symbol did not resolve; `value` is then the sentinel.
	pub addr: Option<SymbolAddr>,
}

impl Reading {
	pub fn is_resolved(&self) -> bool {
		self.addr.is_some()
	}
}

impl From<ReadingV1> for Reading {
	fn from(raw: ReadingV1) -> Self {
		Self {
			value: raw.value,
			addr: SymbolAddr::from_raw(raw.addr),
		}
	}
}

/// The three colliding names, as seen through one lookup path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollidingView {
	pub value: Reading,
	pub compute: Reading,
	pub touch: Reading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueView {
	pub value: Reading,
	pub compute: Reading,
}

/// One module's report, captured by a single call into that module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
	pub label: String,
	/// What the module reaches through its own definitions.
	pub own: CollidingView,
	/// What the default scope currently resolves the colliding names to.
	pub default: CollidingView,
	pub unique: UniqueView,
}

impl Snapshot {
	/// Copies a raw snapshot out of module memory.
	///
	/// # Safety
	/// `raw.label` must be null or a valid nul-terminated string.
	pub unsafe fn from_raw(raw: &SnapshotV1) -> Self {
		let label = if raw.label.is_null() {
			String::new()
		} else {
			// SAFETY: guaranteed by the caller.
			unsafe { CStr::from_ptr(raw.label) }.to_string_lossy().into_owned()
		};
		Self {
			label,
			own: CollidingView {
				value: raw.own_value.into(),
				compute: raw.own_compute.into(),
				touch: raw.own_touch.into(),
			},
			default: CollidingView {
				value: raw.default_value.into(),
				compute: raw.default_compute.into(),
				touch: raw.default_touch.into(),
			},
			unique: UniqueView {
				value: raw.unique_value.into(),
				compute: raw.unique_compute.into(),
			},
		}
	}
}

/// Calls a module's snapshot entry point once with `x`.
///
/// The module's default-scope lookups go through `scope`.
///
/// # Safety
/// `entry` must be a live [`SnapshotEntryV1`] belonging to `module`, and the
/// addresses `scope` returns for the colliding names must have the colliding
/// signatures.
pub unsafe fn invoke_snapshot(module: ModuleId, entry: SnapshotEntryV1, scope: &dyn SymbolScope, x: c_int) -> Result<Snapshot> {
	let bridge = HostBridge::new(scope);
	let host = bridge.host();
	let mut out = MaybeUninit::<SnapshotV1>::uninit();

	// SAFETY: `host` and `out` outlive the call; the caller vouches for `entry`.
	let status = unsafe { entry(&host, x, out.as_mut_ptr()) };
	if status != Status::Ok {
		return Err(HarnessError::Snapshot { module, status });
	}

	// SAFETY: `Status::Ok` means the module wrote the whole struct.
	let raw = unsafe { out.assume_init() };
	if raw.abi_version != ABI_VERSION {
		return Err(HarnessError::Snapshot {
			module,
			status: Status::Incompatible,
		});
	}
	Ok(unsafe { Snapshot::from_raw(&raw) })
}

/// Looks up the colliding names through `scope` and touches each once.
///
/// Unlike the module-side lookups this is strict: any unbound name is fatal.
///
/// # Safety
/// The addresses `scope` returns must have the colliding signatures.
pub unsafe fn query_default_scope(scope: &dyn SymbolScope, x: c_int) -> Result<CollidingView> {
	let resolve = |name: &CStr| {
		scope.lookup(name).map_err(|source| HarnessError::ResolveDefault {
			symbol: name.to_string_lossy().into_owned(),
			source,
		})
	};
	let value = resolve(SHARED_VALUE)?;
	let compute = resolve(SHARED_COMPUTE)?;
	let touch = resolve(SHARED_TOUCH)?;

	// SAFETY: guaranteed by the caller.
	let (value, compute, touch) = unsafe {
		(
			read_cell_at(Some(value.as_ptr())),
			call_compute_at(Some(compute.as_ptr()), x),
			call_touch_at(Some(touch.as_ptr())),
		)
	};
	Ok(CollidingView {
		value: value.into(),
		compute: compute.into(),
		touch: touch.into(),
	})
}
