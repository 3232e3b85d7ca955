#![allow(unused_crate_dependencies)]

//! Loads the real modules into this test process through the library API.
//!
//! Kept to a single test: the global scope is process-wide state.

mod common;

use interpose_harness::{DefaultScope, DlLoader, LoadedModule, ModuleId, ModuleLoader, ModuleStack, Visibility, invoke_snapshot, query_default_scope};
use pretty_assertions::assert_eq;

#[test]
fn repeated_snapshots_keep_addresses_and_advance_counters() {
	let dir = common::module_dir();
	let mut loader = DlLoader;
	let mut stack = ModuleStack::new();
	for id in [ModuleId::A, ModuleId::B] {
		stack.push(id, loader.load(&id.path_in(dir), Visibility::Global).unwrap());
	}

	let entry = |id: ModuleId| unsafe { stack.get(id).unwrap().snapshot_entry(id.entry_symbol()) }.unwrap();
	let (entry_a, entry_b) = (entry(ModuleId::A), entry(ModuleId::B));

	let first = unsafe { invoke_snapshot(ModuleId::A, entry_a, &DefaultScope, 7) }.unwrap();
	let second = unsafe { invoke_snapshot(ModuleId::A, entry_a, &DefaultScope, 7) }.unwrap();
	assert_eq!(first.own.value.addr, second.own.value.addr);
	assert_eq!(first.default.compute.addr, second.default.compute.addr);
	assert_eq!(second.own.touch.value, first.own.touch.value + 2);

	let b = unsafe { invoke_snapshot(ModuleId::B, entry_b, &DefaultScope, 7) }.unwrap();
	assert_eq!(b.own.touch.value, 2001);
	assert_eq!(b.default.value.addr, first.own.value.addr);
	assert_eq!(b.default.touch.value, second.default.touch.value + 1);

	let scope = unsafe { query_default_scope(&DefaultScope, 7) }.unwrap();
	assert_eq!(scope.value.addr, first.own.value.addr);
	assert_eq!(scope.compute.value, 119);

	stack.unload_all().unwrap();
}
