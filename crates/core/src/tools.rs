//! Typed wrappers over the built-in capabilities.
//!
//! Each wrapper invokes one `uibridge.*` capability and decodes its success
//! payload. Matcher fields are forwarded as a flat [`Criteria`] map
//! (`{"key": "submit"}`, `{"x": 10, "y": 20}`, ...) and resolved by the target.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uibridge_protocol::capability::builtin;
use uibridge_protocol::payload::{ActionOutcome, CapabilityList, ElementList, LogEntry, LogList, ScreenshotList};
use uibridge_protocol::{CapabilityInfo, Criteria, ElementRecord};

use crate::connector::Connector;
use crate::error::{Error, Result};

impl Connector {
	/// Interactive elements currently on screen, in pre-order.
	pub async fn list_elements(&self) -> Result<Vec<ElementRecord>> {
		let list: ElementList = self.call(builtin::LIST_ELEMENTS, Map::new()).await?;
		Ok(list.elements)
	}

	pub async fn tap(&self, criteria: Criteria) -> Result<ActionOutcome> {
		self.call(builtin::TAP, criteria).await
	}

	/// Replaces the text of the input matched by `criteria`.
	pub async fn enter_text(&self, criteria: Criteria, input: &str) -> Result<ActionOutcome> {
		let mut params = criteria;
		params.insert("input".to_string(), Value::String(input.to_string()));
		self.call(builtin::ENTER_TEXT, params).await
	}

	/// Scrolls until the element matched by `criteria` is visible.
	pub async fn scroll_to(&self, criteria: Criteria) -> Result<ActionOutcome> {
		self.call(builtin::SCROLL_TO, criteria).await
	}

	/// Captured log entries, oldest first. `clear` empties the target's buffer.
	pub async fn get_logs(&self, clear: bool) -> Result<Vec<LogEntry>> {
		let mut params = Map::new();
		if clear {
			params.insert("clear".to_string(), Value::Bool(true));
		}
		let list: LogList = self.call(builtin::GET_LOGS, params).await?;
		Ok(list.logs)
	}

	/// Base64-encoded PNG images, one per view.
	pub async fn take_screenshots(&self) -> Result<Vec<String>> {
		let list: ScreenshotList = self.call(builtin::SCREENSHOTS, Map::new()).await?;
		Ok(list.images)
	}

	/// Capabilities registered by the application, without the built-ins.
	pub async fn list_custom_capabilities(&self) -> Result<Vec<CapabilityInfo>> {
		let list: CapabilityList = self.call(builtin::LIST_CAPABILITIES, Map::new()).await?;
		Ok(list.capabilities)
	}

	/// Invokes `name` and decodes its payload as `T`.
	pub async fn call<T: DeserializeOwned>(&self, name: &str, params: Map<String, Value>) -> Result<T> {
		let reply = self.invoke(name, params).await?;
		decode(name, reply)
	}
}

fn decode<T: DeserializeOwned>(name: &str, reply: Value) -> Result<T> {
	serde_json::from_value(reply).map_err(|err| Error::UnexpectedResponse(format!("{name}: {err}")))
}
