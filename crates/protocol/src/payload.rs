//! Result shapes of the built-in capabilities.
//!
//! A successful capability response is a JSON object tagged with
//! [`RESPONSE_TYPE`], the originating capability's display name and
//! [`STATUS_SUCCESS`]. The remaining fields are capability-specific and
//! described here.

use serde::{Deserialize, Serialize};

use crate::capability::CapabilityInfo;
use crate::element::ElementRecord;

pub const TYPE_FIELD: &str = "type";
pub const METHOD_FIELD: &str = "method";
pub const STATUS_FIELD: &str = "status";

/// Response-type marker of a capability success payload.
pub const RESPONSE_TYPE: &str = "_extensionType";
pub const STATUS_SUCCESS: &str = "success";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementList {
	pub elements: Vec<ElementRecord>,
}

/// Result of tap, scroll and text entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
	pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
	pub sequence: u64,
	pub timestamp_ms: i64,
	pub level: String,
	pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogList {
	pub logs: Vec<LogEntry>,
}

/// Base64-encoded PNG images, one per view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotList {
	pub images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityList {
	pub capabilities: Vec<CapabilityInfo>,
}
