//! Service-level methods and stream events.
//!
//! These are the non-capability methods a target answers: context discovery,
//! stream subscription and the built-in reload primitive. Capability calls
//! use their wire name (`ext.…`) as the method.

use serde::{Deserialize, Serialize};

/// Method names.
pub mod method {
	pub const LIST_CONTEXTS: &str = "listContexts";
	pub const GET_CONTEXT: &str = "getContext";
	pub const STREAM_LISTEN: &str = "streamListen";
	pub const STREAM_CANCEL: &str = "streamCancel";
	pub const RELOAD_SOURCES: &str = "reloadSources";
	/// Notification carrying a [`StreamNotification`](super::StreamNotification).
	pub const STREAM_NOTIFY: &str = "streamNotify";
}

/// Stream announcing capability registrations.
pub const EXTENSION_STREAM: &str = "Extension";

/// Parameter every capability call carries to address its context.
pub const CONTEXT_ID_PARAM: &str = "contextId";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextSummary {
	pub id: String,
	#[serde(default)]
	pub name: String,
}

/// Result of [`method::LIST_CONTEXTS`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContextList {
	#[serde(default)]
	pub contexts: Vec<ContextSummary>,
}

/// Result of [`method::GET_CONTEXT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextInfo {
	pub id: String,
	#[serde(default)]
	pub name: String,
	/// Wire names of every capability registered in this context.
	#[serde(default)]
	pub capabilities: Vec<String>,
}

impl ContextInfo {
	pub fn exposes(&self, wire_name: &str) -> bool {
		self.capabilities.iter().any(|c| c == wire_name)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamNotification {
	pub stream_id: String,
	pub event: StreamEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StreamEvent {
	#[serde(rename_all = "camelCase")]
	CapabilityRegistered {
		context_id: String,
		/// Wire name of the new capability.
		capability: String,
	},
	#[serde(other)]
	Other,
}

/// Result of [`method::RELOAD_SOURCES`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "ReloadReport")]
pub struct ReloadReport {
	pub success: bool,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub notices: Vec<String>,
}
