//! Module identities, load order and load visibility.

use std::ffi::CStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use interpose_abi::{MODULE_A_SNAPSHOT, MODULE_B_SNAPSHOT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the two colliding modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleId {
	#[serde(rename = "module_a")]
	A,
	#[serde(rename = "module_b")]
	B,
}

impl ModuleId {
	/// Label the module reports in its own snapshots.
	pub const fn label(self) -> &'static str {
		match self {
			Self::A => "module_a",
			Self::B => "module_b",
		}
	}

	/// Library name without platform prefix or suffix.
	pub const fn library_stem(self) -> &'static str {
		match self {
			Self::A => "interpose_module_a",
			Self::B => "interpose_module_b",
		}
	}

	/// Platform file name, e.g. `libinterpose_module_a.so`.
	pub fn file_name(self) -> String {
		format!("{}{}{}", std::env::consts::DLL_PREFIX, self.library_stem(), std::env::consts::DLL_SUFFIX)
	}

	/// Full path of the module's library inside `dir`.
	pub fn path_in(self, dir: &Path) -> PathBuf {
		dir.join(self.file_name())
	}

	/// The module's uniquely named snapshot entry point.
	pub const fn entry_symbol(self) -> &'static CStr {
		match self {
			Self::A => MODULE_A_SNAPSHOT,
			Self::B => MODULE_B_SNAPSHOT,
		}
	}

	/// Maps a snapshot label back to its module.
	pub fn from_label(label: &str) -> Option<Self> {
		[Self::A, Self::B].into_iter().find(|id| id.label() == label)
	}
}

impl fmt::Display for ModuleId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// Order in which the two modules are loaded. Fixed for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadOrder {
	#[default]
	#[serde(rename = "AB")]
	AThenB,
	#[serde(rename = "BA")]
	BThenA,
}

impl LoadOrder {
	/// Modules in load order.
	pub const fn sequence(self) -> [ModuleId; 2] {
		match self {
			Self::AThenB => [ModuleId::A, ModuleId::B],
			Self::BThenA => [ModuleId::B, ModuleId::A],
		}
	}

	pub const fn first(self) -> ModuleId {
		self.sequence()[0]
	}

	pub const fn second(self) -> ModuleId {
		self.sequence()[1]
	}
}

impl fmt::Display for LoadOrder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::AThenB => "AB",
			Self::BThenA => "BA",
		})
	}
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid load order '{0}' (expected AB or BA)")]
pub struct ParseOrderError(String);

impl FromStr for LoadOrder {
	type Err = ParseOrderError;

	/// Accepts `AB`/`BA` and the numeric aliases `12`/`21`.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"AB" | "12" => Ok(Self::AThenB),
			"BA" | "21" => Ok(Self::BThenA),
			other => Err(ParseOrderError(other.to_string())),
		}
	}
}

/// Whether a loaded module's exports join the process-wide default scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
	/// `RTLD_GLOBAL`: exports become default-scope candidates.
	#[default]
	Global,
	/// `RTLD_LOCAL`: exports are reachable only through the module handle.
	Local,
}

impl fmt::Display for Visibility {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Global => "global",
			Self::Local => "local",
		})
	}
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid visibility '{0}' (expected global or local)")]
pub struct ParseVisibilityError(String);

impl FromStr for Visibility {
	type Err = ParseVisibilityError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"global" => Ok(Self::Global),
			"local" => Ok(Self::Local),
			other => Err(ParseVisibilityError(other.to_string())),
		}
	}
}
