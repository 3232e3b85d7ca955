//! Text and JSON rendering of a [`RunReport`].

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use thiserror::Error;

use crate::error::Result;
use crate::harness::RunReport;
use crate::snapshot::{Reading, Snapshot};

/// Report encoding on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
	#[default]
	Text,
	Json,
}

impl fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Text => "text",
			Self::Json => "json",
		})
	}
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid format '{0}' (expected text or json)")]
pub struct ParseFormatError(String);

impl FromStr for OutputFormat {
	type Err = ParseFormatError;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"text" => Ok(Self::Text),
			"json" => Ok(Self::Json),
			other => Err(ParseFormatError(other.to_string())),
		}
	}
}

pub fn render<W: Write>(report: &RunReport, format: OutputFormat, out: &mut W) -> Result<()> {
	match format {
		OutputFormat::Text => write_text(report, out)?,
		OutputFormat::Json => {
			serde_json::to_writer_pretty(&mut *out, report)?;
			writeln!(out)?;
		}
	}
	Ok(())
}

/// Formats an address token, or `none` when unresolved.
struct Addr<'a>(&'a Reading);

impl fmt::Display for Addr<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.0.addr {
			Some(addr) => write!(f, "{addr}"),
			None => f.write_str("none"),
		}
	}
}

fn write_text<W: Write>(report: &RunReport, out: &mut W) -> std::io::Result<()> {
	let files: Vec<String> = report.modules.iter().map(|run| run.module.file_name()).collect();
	writeln!(out, "Load order: {} ({} visibility)", files.join(" -> "), report.visibility)?;
	writeln!(out)?;

	for run in &report.modules {
		write_snapshot(&run.snapshot, out)?;
		writeln!(out)?;
	}

	let x = report.arg;
	let view = &report.default_scope;
	writeln!(out, "[default scope]")?;
	writeln!(out, "  shared_value={}, addr={}", view.value.value, Addr(&view.value))?;
	writeln!(out, "  shared_compute({x})={}, addr={}", view.compute.value, Addr(&view.compute))?;
	writeln!(out, "  shared_touch()={}, addr={}", view.touch.value, Addr(&view.touch))?;
	match report.winner() {
		Some(winner) => writeln!(out, "  bound to {winner}"),
		None => writeln!(out, "  bound to neither module"),
	}
}

fn write_snapshot<W: Write>(snap: &Snapshot, out: &mut W) -> std::io::Result<()> {
	let rows: [(&str, &str, &Reading); 8] = [
		("own value", "value", &snap.own.value),
		("own compute", "ret", &snap.own.compute),
		("own touch", "ret", &snap.own.touch),
		("default value", "value", &snap.default.value),
		("default compute", "ret", &snap.default.compute),
		("default touch", "ret", &snap.default.touch),
		("unique value", "value", &snap.unique.value),
		("unique compute", "ret", &snap.unique.compute),
	];

	writeln!(out, "[{}]", snap.label)?;
	for (name, kind, reading) in rows {
		writeln!(out, "  {name:<16}{kind}={}, addr={}", reading.value, Addr(reading))?;
	}
	Ok(())
}
