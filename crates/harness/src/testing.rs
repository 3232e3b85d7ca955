//! In-process stand-ins for the dynamic loader.
//!
//! [`FakeLinker`] models the global scope: the first module loaded with
//! global visibility owns every colliding name until it is unloaded. The
//! fake modules are real `extern "C"` code built from the same guest
//! routine the cdylibs use, so snapshots exercise the full ABI path.

use std::cell::RefCell;
use std::collections::HashSet;
use std::ffi::{CStr, c_int};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicI32, Ordering};

use interpose_abi::guest::{CollidingSet, GuestModule, UniqueSet};
use interpose_abi::{HostV1, SHARED_COMPUTE, SHARED_TOUCH, SHARED_VALUE, SnapshotEntryV1, SnapshotV1, Status};

use crate::addr::SymbolAddr;
use crate::error::{HarnessError, LookupError, Result};
use crate::loader::{LoadedModule, ModuleLoader};
use crate::module::{ModuleId, Visibility};
use crate::scope::SymbolScope;

static A_VALUE: AtomicI32 = AtomicI32::new(111);
static A_COUNTER: AtomicI32 = AtomicI32::new(1000);
static A_UNIQUE: AtomicI32 = AtomicI32::new(10001);
static B_VALUE: AtomicI32 = AtomicI32::new(222);
static B_COUNTER: AtomicI32 = AtomicI32::new(2000);
static B_UNIQUE: AtomicI32 = AtomicI32::new(20002);

extern "C" fn a_compute(x: c_int) -> c_int {
	A_VALUE.load(Ordering::SeqCst).wrapping_add(x).wrapping_add(1)
}

extern "C" fn a_touch() -> c_int {
	A_COUNTER.fetch_add(1, Ordering::SeqCst).wrapping_add(1)
}

extern "C" fn a_unique(x: c_int) -> c_int {
	A_UNIQUE.load(Ordering::SeqCst).wrapping_sub(x)
}

extern "C" fn b_compute(x: c_int) -> c_int {
	B_VALUE.load(Ordering::SeqCst).wrapping_add(x).wrapping_add(2)
}

extern "C" fn b_touch() -> c_int {
	B_COUNTER.fetch_add(1, Ordering::SeqCst).wrapping_add(1)
}

extern "C" fn b_unique(x: c_int) -> c_int {
	B_UNIQUE.load(Ordering::SeqCst).wrapping_add(x)
}

static GUEST_A: GuestModule = GuestModule {
	label: c"module_a",
	colliding: CollidingSet {
		value: &A_VALUE,
		compute: a_compute,
		touch: a_touch,
	},
	unique: UniqueSet {
		value: &A_UNIQUE,
		compute: a_unique,
	},
};

static GUEST_B: GuestModule = GuestModule {
	label: c"module_b",
	colliding: CollidingSet {
		value: &B_VALUE,
		compute: b_compute,
		touch: b_touch,
	},
	unique: UniqueSet {
		value: &B_UNIQUE,
		compute: b_unique,
	},
};

unsafe extern "C" fn a_snapshot(host: *const HostV1, x: c_int, out: *mut SnapshotV1) -> Status {
	unsafe { GUEST_A.write_snapshot(host, x, out) }
}

unsafe extern "C" fn b_snapshot(host: *const HostV1, x: c_int, out: *mut SnapshotV1) -> Status {
	unsafe { GUEST_B.write_snapshot(host, x, out) }
}

fn guest(id: ModuleId) -> &'static GuestModule {
	match id {
		ModuleId::A => &GUEST_A,
		ModuleId::B => &GUEST_B,
	}
}

/// Address of `id`'s own definition of a colliding name.
pub fn own_addr(id: ModuleId, name: &CStr) -> Option<SymbolAddr> {
	let set = &guest(id).colliding;
	let raw = if name == SHARED_VALUE {
		set.value as *const AtomicI32 as usize
	} else if name == SHARED_COMPUTE {
		set.compute as usize
	} else if name == SHARED_TOUCH {
		set.touch as usize
	} else {
		0
	};
	SymbolAddr::from_raw(raw)
}

/// Current counter value behind `id`'s own `shared_touch`.
pub fn counter(id: ModuleId) -> i32 {
	match id {
		ModuleId::A => A_COUNTER.load(Ordering::SeqCst),
		ModuleId::B => B_COUNTER.load(Ordering::SeqCst),
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
	Loaded(ModuleId),
	Unloaded(ModuleId),
}

/// Shared loader state: event journal plus the global scope's search list.
#[derive(Debug, Default)]
pub struct FakeLinker {
	pub events: Vec<Event>,
	global: Vec<ModuleId>,
}

impl FakeLinker {
	pub fn shared() -> Rc<RefCell<Self>> {
		Rc::new(RefCell::new(Self::default()))
	}

	pub fn loads(&self) -> Vec<ModuleId> {
		self.events
			.iter()
			.filter_map(|e| match e {
				Event::Loaded(id) => Some(*id),
				Event::Unloaded(_) => None,
			})
			.collect()
	}

	pub fn unloads(&self) -> Vec<ModuleId> {
		self.events
			.iter()
			.filter_map(|e| match e {
				Event::Unloaded(id) => Some(*id),
				Event::Loaded(_) => None,
			})
			.collect()
	}
}

/// Default scope backed by a [`FakeLinker`].
pub struct FakeScope(pub Rc<RefCell<FakeLinker>>);

impl SymbolScope for FakeScope {
	fn lookup(&self, name: &CStr) -> std::result::Result<SymbolAddr, LookupError> {
		let linker = self.0.borrow();
		linker
			.global
			.iter()
			.find_map(|id| own_addr(*id, name))
			.ok_or_else(|| LookupError(format!("undefined symbol: {}", name.to_string_lossy())))
	}
}

#[derive(Default)]
pub struct FakeLoader {
	pub linker: Rc<RefCell<FakeLinker>>,
	pub fail_load: HashSet<ModuleId>,
	pub missing_entry: HashSet<ModuleId>,
	pub fail_unload: HashSet<ModuleId>,
}

impl FakeLoader {
	pub fn new(linker: Rc<RefCell<FakeLinker>>) -> Self {
		Self {
			linker,
			..Self::default()
		}
	}
}

fn module_for(path: &Path) -> Option<ModuleId> {
	let file = path.file_name()?.to_str()?;
	[ModuleId::A, ModuleId::B].into_iter().find(|id| id.file_name() == file)
}

impl ModuleLoader for FakeLoader {
	type Module = FakeModule;

	fn load(&mut self, path: &Path, visibility: Visibility) -> Result<FakeModule> {
		let id = module_for(path)
			.filter(|id| !self.fail_load.contains(id))
			.ok_or_else(|| HarnessError::Load {
				path: path.to_path_buf(),
				detail: "cannot open shared object file".to_string(),
			})?;

		let mut linker = self.linker.borrow_mut();
		linker.events.push(Event::Loaded(id));
		if visibility == Visibility::Global {
			linker.global.push(id);
		}
		Ok(FakeModule {
			id,
			path: path.to_path_buf(),
			linker: Rc::clone(&self.linker),
			missing_entry: self.missing_entry.contains(&id),
			fail_unload: self.fail_unload.contains(&id),
		})
	}
}

pub struct FakeModule {
	id: ModuleId,
	path: PathBuf,
	linker: Rc<RefCell<FakeLinker>>,
	missing_entry: bool,
	fail_unload: bool,
}

impl LoadedModule for FakeModule {
	fn path(&self) -> &Path {
		&self.path
	}

	unsafe fn snapshot_entry(&self, symbol: &CStr) -> Result<SnapshotEntryV1> {
		if self.missing_entry || symbol != self.id.entry_symbol() {
			return Err(HarnessError::ResolveEntry {
				symbol: symbol.to_string_lossy().into_owned(),
				path: self.path.clone(),
				detail: "undefined symbol".to_string(),
			});
		}
		let entry: SnapshotEntryV1 = match self.id {
			ModuleId::A => a_snapshot,
			ModuleId::B => b_snapshot,
		};
		Ok(entry)
	}

	fn unload(self) -> Result<()> {
		let mut linker = self.linker.borrow_mut();
		linker.events.push(Event::Unloaded(self.id));
		linker.global.retain(|id| *id != self.id);
		if self.fail_unload {
			return Err(HarnessError::Unload {
				path: self.path.clone(),
				detail: "still referenced".to_string(),
			});
		}
		Ok(())
	}
}
