//! Command line for the `interpose` binary.

use std::ffi::c_int;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgAction, CommandFactory, Parser};
use tracing::Level;

use crate::error::{HarnessError, Result};
use crate::harness::{DEFAULT_ARG, RunConfig};
use crate::module::{LoadOrder, Visibility};
use crate::report::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "interpose")]
#[command(about = "Show how the dynamic linker arbitrates between colliding module symbols")]
#[command(version)]
pub struct Cli {
	/// Load order: AB or BA (12 and 21 are accepted as aliases)
	#[arg(default_value = "AB", value_parser = LoadOrder::from_str)]
	pub order: LoadOrder,

	/// Directory holding both module libraries (defaults to the executable's directory)
	#[arg(long, value_name = "DIR")]
	pub module_dir: Option<PathBuf>,

	/// Argument passed to every accessor call
	#[arg(long = "arg", value_name = "X", default_value_t = DEFAULT_ARG, allow_negative_numbers = true)]
	pub arg: c_int,

	/// Load visibility: global or local
	#[arg(long, default_value = "global", value_parser = Visibility::from_str)]
	pub visibility: Visibility,

	/// Report format: text or json
	#[arg(long, default_value = "text", value_parser = OutputFormat::from_str)]
	pub format: OutputFormat,

	/// Increase log verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, action = ArgAction::Count)]
	pub verbose: u8,
}

impl Cli {
	/// Resolves defaults that depend on the environment.
	pub fn run_config(&self) -> Result<RunConfig> {
		let module_dir = match &self.module_dir {
			Some(dir) => dir.clone(),
			None => executable_dir()?,
		};
		Ok(RunConfig {
			order: self.order,
			visibility: self.visibility,
			module_dir,
			arg: self.arg,
			format: self.format,
		})
	}

	pub fn log_level(&self) -> Level {
		match self.verbose {
			0 => Level::WARN,
			1 => Level::INFO,
			2 => Level::DEBUG,
			_ => Level::TRACE,
		}
	}
}

/// Stderr text for a parse failure, with the usage line appended when the
/// error kind does not carry one.
pub fn usage_error_text(err: &clap::Error) -> String {
	let mut text = err.to_string();
	if !text.contains("Usage:") {
		text.push('\n');
		text.push_str(&Cli::command().render_usage().to_string());
		text.push('\n');
	}
	text
}

/// Directory of the running executable; cargo puts the module libraries there.
pub fn executable_dir() -> Result<PathBuf> {
	let exe = std::env::current_exe().and_then(|p| p.canonicalize()).map_err(HarnessError::ModuleDir)?;
	exe.parent().map(PathBuf::from).ok_or_else(|| {
		HarnessError::ModuleDir(std::io::Error::new(std::io::ErrorKind::NotFound, "executable has no parent directory"))
	})
}

/// Installs a stderr subscriber so stdout carries only the report.
pub fn init_tracing(level: Level) -> std::result::Result<(), tracing::subscriber::SetGlobalDefaultError> {
	let subscriber = tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).finish();
	tracing::subscriber::set_global_default(subscriber)
}
