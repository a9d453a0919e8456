//! Reserved fault-code space.
//!
//! Application faults occupy `APPLICATION_FLOOR..=APPLICATION_CEILING`; each
//! capability reports its business failures as a small offset into that range.
//! Invalid parameters and internal faults use the two fixed JSON-RPC codes.
//! The numeric values are kept stable for wire compatibility.

use std::fmt;

/// Lowest application fault code (`offset == 0`).
pub const APPLICATION_FLOOR: i32 = -32016;
/// Highest application fault code (`offset == MAX_APPLICATION_OFFSET`).
pub const APPLICATION_CEILING: i32 = -32000;
pub const MAX_APPLICATION_OFFSET: u8 = 16;

pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Service-level fault for an unknown execution context id.
pub const CONTEXT_NOT_FOUND: i32 = 106;

/// Offset of an application fault within the reserved range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AppErrorCode(u8);

impl AppErrorCode {
	/// Panics when `offset` exceeds [`MAX_APPLICATION_OFFSET`]; an out-of-range
	/// code is a programming error, never a runtime fault.
	pub const fn new(offset: u8) -> Self {
		assert!(offset <= MAX_APPLICATION_OFFSET, "application error offset out of range");
		Self(offset)
	}

	pub const fn offset(self) -> u8 {
		self.0
	}

	pub const fn wire_code(self) -> i32 {
		APPLICATION_FLOOR + self.0 as i32
	}

	/// Recovers the offset from a wire code, if it lies in the application range.
	pub fn from_wire(code: i32) -> Option<Self> {
		(APPLICATION_FLOOR..=APPLICATION_CEILING)
			.contains(&code)
			.then(|| Self((code - APPLICATION_FLOOR) as u8))
	}
}

impl fmt::Display for AppErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.wire_code())
	}
}

/// Application codes used by the built-in capabilities.
pub mod codes {
	use super::AppErrorCode;

	pub const ELEMENT_NOT_FOUND: AppErrorCode = AppErrorCode::new(0);
	pub const NOT_TEXT_INPUT: AppErrorCode = AppErrorCode::new(1);
	pub const SCROLL_EXHAUSTED: AppErrorCode = AppErrorCode::new(2);
	pub const NO_SCROLLABLE: AppErrorCode = AppErrorCode::new(3);
	pub const CAPTURE_FAILED: AppErrorCode = AppErrorCode::new(4);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn offsets_map_onto_reserved_range() {
		assert_eq!(AppErrorCode::new(0).wire_code(), APPLICATION_FLOOR);
		assert_eq!(AppErrorCode::new(16).wire_code(), APPLICATION_CEILING);
		assert_eq!(AppErrorCode::from_wire(-32014), Some(AppErrorCode::new(2)));
		assert_eq!(AppErrorCode::from_wire(INVALID_PARAMS), None);
		assert_eq!(AppErrorCode::from_wire(INTERNAL_ERROR), None);
	}

	#[test]
	#[should_panic(expected = "out of range")]
	fn out_of_range_offset_is_asserted() {
		let _ = AppErrorCode::new(17);
	}
}
