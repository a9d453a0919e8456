//! Capability names.
//!
//! A capability is addressed on the wire as `ext.<name>`, where `<name>` is a
//! dot-namespaced display name such as `nav.get`. The prefix is reserved: a
//! display name must never carry it itself.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scheme prefix every capability carries on the wire.
pub const WIRE_PREFIX: &str = "ext.";

/// Display names of the capabilities every agent registers.
pub mod builtin {
	/// Liveness marker used to pick the execution context on connect.
	pub const PING: &str = "uibridge.ping";
	pub const LIST_ELEMENTS: &str = "uibridge.listElements";
	pub const TAP: &str = "uibridge.tap";
	pub const ENTER_TEXT: &str = "uibridge.enterText";
	pub const SCROLL_TO: &str = "uibridge.scrollTo";
	pub const GET_LOGS: &str = "uibridge.getLogs";
	pub const SCREENSHOTS: &str = "uibridge.screenshots";
	pub const LIST_CAPABILITIES: &str = "uibridge.listCapabilities";
	/// Optional alternate reload implementation a host may register at runtime.
	pub const HOT_RELOAD: &str = "uibridge.hotReload";
}

/// Why a capability name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityNameError {
	#[error("capability name must not be empty")]
	Empty,

	#[error("capability name '{0}' must not start with the reserved prefix '{WIRE_PREFIX}'")]
	ReservedPrefix(String),
}

/// Validated display name of a capability (without the wire prefix).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CapabilityName(String);

impl CapabilityName {
	/// Validates a display name.
	pub fn parse(name: &str) -> Result<Self, CapabilityNameError> {
		if name.trim().is_empty() {
			return Err(CapabilityNameError::Empty);
		}
		if name.starts_with(WIRE_PREFIX) {
			return Err(CapabilityNameError::ReservedPrefix(name.to_string()));
		}
		Ok(Self(name.to_string()))
	}

	/// Strips the wire prefix. Returns `None` for non-capability methods.
	pub fn from_wire(wire: &str) -> Option<Self> {
		let display = wire.strip_prefix(WIRE_PREFIX)?;
		if display.is_empty() {
			return None;
		}
		Some(Self(display.to_string()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Name as it travels on the wire.
	pub fn wire_name(&self) -> String {
		format!("{WIRE_PREFIX}{}", self.0)
	}
}

impl fmt::Display for CapabilityName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for CapabilityName {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

/// Introspection entry for a user-registered capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityInfo {
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
}
