use std::ffi::c_void;
use std::fmt;
use std::num::ParseIntError;

use serde::{Deserialize, Serialize};

/// Identity of a resolved symbol.
///
/// Only equality is meaningful. Two tokens are equal exactly when they name
/// the same definition in the running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SymbolAddr(usize);

impl SymbolAddr {
	/// Wraps a raw address; zero means "unresolved" and yields `None`.
	pub fn from_raw(addr: usize) -> Option<Self> {
		(addr != 0).then_some(Self(addr))
	}

	pub fn from_ptr<T>(ptr: *const T) -> Option<Self> {
		Self::from_raw(ptr as usize)
	}

	pub(crate) fn as_ptr(self) -> *mut c_void {
		self.0 as *mut c_void
	}
}

impl fmt::Display for SymbolAddr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:#x}", self.0)
	}
}

impl From<SymbolAddr> for String {
	fn from(addr: SymbolAddr) -> Self {
		addr.to_string()
	}
}

impl TryFrom<String> for SymbolAddr {
	type Error = ParseIntError;

	fn try_from(s: String) -> Result<Self, Self::Error> {
		let digits = s.strip_prefix("0x").unwrap_or(&s);
		usize::from_str_radix(digits, 16).map(Self)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn zero_is_unresolved() {
		assert_eq!(SymbolAddr::from_raw(0), None);
		assert_eq!(SymbolAddr::from_ptr(std::ptr::null::<u8>()), None);
	}

	#[test]
	fn displays_as_hex_and_parses_back() {
		let addr = SymbolAddr::from_raw(0x7f00_1234).unwrap();
		assert_eq!(addr.to_string(), "0x7f001234");
		assert_eq!(SymbolAddr::try_from(addr.to_string()), Ok(addr));
	}

	#[test]
	fn tokens_compare_by_identity() {
		let value = 5_u32;
		let other = 6_u32;
		assert_eq!(SymbolAddr::from_ptr(&value), SymbolAddr::from_ptr(&value));
		assert_ne!(SymbolAddr::from_ptr(&value), SymbolAddr::from_ptr(&other));
	}
}
