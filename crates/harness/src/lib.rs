#![cfg_attr(test, allow(unused_crate_dependencies))]

//! Dynamic symbol resolution harness.
//!
//! Loads two modules that define the same names, asks each module what its
//! own definitions and the process-wide default scope say, asks the default
//! scope directly, and reports the difference.
//!
//! # Architecture
//!
//! * [`module`]: module identities, [`LoadOrder`] and [`Visibility`]
//! * [`scope`]: the default symbol scope as an injectable [`SymbolScope`]
//! * [`loader`]: [`ModuleLoader`] implementations and the LIFO [`ModuleStack`]
//! * [`snapshot`]: owned snapshot data and capture routines
//! * [`harness`]: the run state machine producing a [`RunReport`]
//! * [`report`]: text and JSON rendering
//! * [`cli`]: command line and logging setup for the `interpose` binary

#[cfg(not(unix))]
compile_error!("interpose-harness needs a unix dynamic loader with a global default scope");

pub mod addr;
pub mod cli;
pub mod error;
pub mod harness;
pub mod loader;
pub mod module;
pub mod report;
pub mod scope;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testing;

pub use addr::SymbolAddr;
pub use error::{HarnessError, LookupError, Result};
pub use harness::{DEFAULT_ARG, Harness, ModuleRun, Phase, RunConfig, RunReport};
pub use loader::{DlLoader, DlModule, LoadedModule, ModuleLoader, ModuleStack};
pub use module::{LoadOrder, ModuleId, Visibility};
pub use report::{OutputFormat, render};
pub use scope::{DefaultScope, HostBridge, SymbolScope};
pub use snapshot::{CollidingView, Reading, Snapshot, UniqueView, invoke_snapshot, query_default_scope};
