//! Error types for a harness run.

use std::error::Error as StdError;
use std::path::PathBuf;

use interpose_abi::Status;
use thiserror::Error;

use crate::module::ModuleId;

/// Fatal conditions that end a run. None of them is retried.
#[derive(Debug, Error)]
pub enum HarnessError {
	/// The loader refused a module (missing file, bad format, wrong architecture).
	#[error("failed to load {path}: {detail}")]
	Load { path: PathBuf, detail: String },

	/// A snapshot entry point is missing from its module.
	#[error("failed to resolve entry point '{symbol}' in {path}: {detail}")]
	ResolveEntry { symbol: String, path: PathBuf, detail: String },

	/// A colliding name has no process-wide binding.
	#[error("failed to resolve '{symbol}' in the default scope")]
	ResolveDefault {
		symbol: String,
		#[source]
		source: LookupError,
	},

	#[error("{module} snapshot returned {status:?}")]
	Snapshot { module: ModuleId, status: Status },

	#[error("failed to unload {path}: {detail}")]
	Unload { path: PathBuf, detail: String },

	#[error("cannot determine module directory")]
	ModuleDir(#[source] std::io::Error),

	#[error("failed to write report")]
	Io(#[from] std::io::Error),

	#[error("failed to encode report")]
	Json(#[from] serde_json::Error),
}

/// A default-scope lookup that found nothing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct LookupError(pub String);

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Renders `err` and then each underlying cause on its own `caused by:` line.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
	let mut text = err.to_string();
	let mut source = err.source();
	while let Some(cause) = source {
		text.push_str("\n  caused by: ");
		text.push_str(&cause.to_string());
		source = cause.source();
	}
	text
}
