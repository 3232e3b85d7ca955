use std::env;

fn main() {
	// Bind intra-module references to this module's own definitions so the
	// first-loaded module cannot interpose on them. Mach-O's two-level
	// namespace already does this.
	let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
	let target_family = env::var("CARGO_CFG_TARGET_FAMILY").unwrap_or_default();
	if target_family == "unix" && !matches!(target_os.as_str(), "macos" | "ios") {
		println!("cargo:rustc-cdylib-link-arg=-Wl,-Bsymbolic");
	}
	println!("cargo:rerun-if-changed=build.rs");
}
