#![allow(unused_crate_dependencies)]

//! `interpose` binary.

use std::process::ExitCode;

use clap::Parser;
use interpose_harness::cli::{Cli, init_tracing, usage_error_text};
use interpose_harness::error::error_chain;
use interpose_harness::{DefaultScope, DlLoader, Harness};

fn main() -> ExitCode {
	let cli = match Cli::try_parse() {
		Ok(cli) => cli,
		Err(err) if err.use_stderr() => {
			eprint!("{}", usage_error_text(&err));
			return ExitCode::FAILURE;
		}
		Err(err) => {
			let _ = err.print();
			return ExitCode::SUCCESS;
		}
	};

	if let Err(err) = init_tracing(cli.log_level()) {
		eprintln!("interpose: failed to initialise logging: {err}");
	}

	let config = match cli.run_config() {
		Ok(config) => config,
		Err(err) => return fail(&err),
	};
	tracing::info!(order = %config.order, dir = %config.module_dir.display(), "starting run");

	let mut harness = Harness::new(DlLoader, DefaultScope, config);
	let mut stdout = std::io::stdout().lock();
	match harness.run(&mut stdout) {
		Ok(report) => {
			tracing::info!(winner = ?report.winner(), "run complete");
			ExitCode::SUCCESS
		}
		Err(err) => fail(&err),
	}
}

fn fail(err: &interpose_harness::HarnessError) -> ExitCode {
	tracing::debug!(?err, "run aborted");
	eprintln!("interpose: {}", error_chain(err));
	ExitCode::FAILURE
}
