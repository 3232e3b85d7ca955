//! The resolution run: load, resolve, invoke, query, report, unload.

use std::ffi::c_int;
use std::io::Write;
use std::path::PathBuf;

use interpose_abi::SnapshotEntryV1;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, warn};

use crate::error::{HarnessError, Result};
use crate::loader::{LoadedModule, ModuleLoader, ModuleStack};
use crate::module::{LoadOrder, ModuleId, Visibility};
use crate::report::{OutputFormat, render};
use crate::scope::SymbolScope;
use crate::snapshot::{CollidingView, Snapshot, invoke_snapshot, query_default_scope};

/// Argument passed to every accessor unless configured otherwise.
pub const DEFAULT_ARG: c_int = 7;

/// Steps of a run, in the only order they can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	LoadFirst,
	LoadSecond,
	ResolveEntrypoints,
	Invoke,
	QueryDefaultScope,
	Report,
	UnloadSecond,
	UnloadFirst,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
	pub order: LoadOrder,
	pub visibility: Visibility,
	pub module_dir: PathBuf,
	pub arg: c_int,
	pub format: OutputFormat,
}

impl RunConfig {
	pub fn new(module_dir: impl Into<PathBuf>) -> Self {
		Self {
			order: LoadOrder::default(),
			visibility: Visibility::default(),
			module_dir: module_dir.into(),
			arg: DEFAULT_ARG,
			format: OutputFormat::default(),
		}
	}
}

/// One loaded module and what its snapshot reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRun {
	pub module: ModuleId,
	pub path: PathBuf,
	pub snapshot: Snapshot,
}

/// Everything a run observed. Pure data; rendering lives in [`crate::report`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
	pub order: LoadOrder,
	pub visibility: Visibility,
	pub arg: i32,
	/// First-loaded module, then second-loaded.
	pub modules: Vec<ModuleRun>,
	/// The harness's own default-scope view of the colliding names.
	pub default_scope: CollidingView,
}

impl RunReport {
	pub fn module(&self, id: ModuleId) -> Option<&ModuleRun> {
		self.modules.iter().find(|run| run.module == id)
	}

	/// The module whose own `shared_value` the default scope is bound to.
	pub fn winner(&self) -> Option<ModuleId> {
		let bound = self.default_scope.value.addr?;
		self.modules.iter().find(|run| run.snapshot.own.value.addr == Some(bound)).map(|run| run.module)
	}
}

/// Drives one run over an injected loader and symbol scope.
pub struct Harness<L, S> {
	loader: L,
	scope: S,
	config: RunConfig,
	phases: Vec<Phase>,
}

impl<L: ModuleLoader, S: SymbolScope> Harness<L, S> {
	pub fn new(loader: L, scope: S, config: RunConfig) -> Self {
		Self {
			loader,
			scope,
			config,
			phases: Vec::new(),
		}
	}

	pub fn config(&self) -> &RunConfig {
		&self.config
	}

	/// Phases walked by the last [`Harness::run`], including a partial run.
	pub fn phases(&self) -> &[Phase] {
		&self.phases
	}

	/// Performs a full run and renders the report to `out`.
	///
	/// Any failure aborts immediately; modules already loaded are released
	/// in reverse order on the way out.
	pub fn run<W: Write>(&mut self, out: &mut W) -> Result<RunReport> {
		self.phases.clear();
		let order = self.config.order;
		let [first, second] = order.sequence();
		let _span = debug_span!("run", %order, visibility = %self.config.visibility).entered();

		let mut stack = ModuleStack::new();
		self.enter(Phase::LoadFirst);
		self.load(&mut stack, first)?;
		self.enter(Phase::LoadSecond);
		self.load(&mut stack, second)?;

		self.enter(Phase::ResolveEntrypoints);
		let entries = [(first, resolve_entry(&stack, first)?), (second, resolve_entry(&stack, second)?)];

		self.enter(Phase::Invoke);
		let x = self.config.arg;
		let mut modules = Vec::with_capacity(entries.len());
		for (id, entry) in entries {
			// SAFETY: `entry` was resolved from `id`'s handle, which `stack` keeps loaded.
			let snapshot = unsafe { invoke_snapshot(id, entry, &self.scope, x) }?;
			if ModuleId::from_label(&snapshot.label) != Some(id) {
				warn!(module = %id, label = %snapshot.label, "snapshot label does not match module");
			}
			let path = stack.get(id).map(|m| m.path().to_path_buf()).unwrap_or_default();
			modules.push(ModuleRun { module: id, path, snapshot });
		}

		self.enter(Phase::QueryDefaultScope);
		// SAFETY: the colliding names are only defined by the modules we loaded.
		let default_scope = unsafe { query_default_scope(&self.scope, x) }?;

		let report = RunReport {
			order,
			visibility: self.config.visibility,
			arg: x,
			modules,
			default_scope,
		};

		self.enter(Phase::Report);
		render(&report, self.config.format, out)?;

		self.enter(Phase::UnloadSecond);
		if let Some(result) = stack.unload_last() {
			result?;
		}
		self.enter(Phase::UnloadFirst);
		stack.unload_all()?;

		Ok(report)
	}

	fn enter(&mut self, phase: Phase) {
		debug!(?phase, "entering phase");
		self.phases.push(phase);
	}

	fn load(&mut self, stack: &mut ModuleStack<L::Module>, id: ModuleId) -> Result<()> {
		let path = id.path_in(&self.config.module_dir);
		let module = self.loader.load(&path, self.config.visibility)?;
		stack.push(id, module);
		Ok(())
	}
}

fn resolve_entry<M: LoadedModule>(stack: &ModuleStack<M>, id: ModuleId) -> Result<SnapshotEntryV1> {
	let module = stack.get(id).ok_or_else(|| HarnessError::ResolveEntry {
		symbol: id.entry_symbol().to_string_lossy().into_owned(),
		path: PathBuf::new(),
		detail: format!("{id} is not loaded"),
	})?;
	// SAFETY: every module exports its entry point with the snapshot signature.
	unsafe { module.snapshot_entry(id.entry_symbol()) }
}
