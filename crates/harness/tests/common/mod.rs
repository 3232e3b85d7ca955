//! Builds the real module libraries for integration tests.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::OnceLock;

use interpose_harness::RunReport;

/// Directory holding freshly built `interpose_module_a` / `interpose_module_b`.
///
/// Built once per test binary into a private target dir so the outer cargo
/// lock is never contended.
pub fn module_dir() -> &'static Path {
	static DIR: OnceLock<PathBuf> = OnceLock::new();
	DIR.get_or_init(|| {
		let target_dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("modules");
		let workspace = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
		let status = Command::new(env!("CARGO"))
			.current_dir(&workspace)
			.args(["build", "--quiet", "-p", "interpose-module-a", "-p", "interpose-module-b", "--target-dir"])
			.arg(&target_dir)
			.status()
			.expect("failed to spawn cargo");
		assert!(status.success(), "building module libraries failed");
		target_dir.join("debug")
	})
}

/// Runs the `interpose` binary with `args`.
#[allow(dead_code, reason = "test helper used by individual test files")]
pub fn interpose(args: &[&str]) -> Output {
	Command::new(env!("CARGO_BIN_EXE_interpose")).args(args).output().expect("failed to spawn interpose")
}

/// Runs a full JSON report for `order` against the built modules.
#[allow(dead_code, reason = "test helper used by individual test files")]
pub fn json_report(order: &str) -> RunReport {
	let dir = module_dir().to_string_lossy().into_owned();
	let output = interpose(&[order, "--module-dir", &dir, "--format", "json"]);
	assert!(
		output.status.success(),
		"interpose {order} failed: {}",
		String::from_utf8_lossy(&output.stderr)
	);
	serde_json::from_slice(&output.stdout).expect("report is valid JSON")
}
