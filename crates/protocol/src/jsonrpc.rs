//! JSON-RPC 2.0 envelopes.
//!
//! Every frame on the transport is one of three shapes: a request (has `id`
//! and `method`), a response (has `id` and one of `result`/`error`), or a
//! notification (has `method`, no `id`). [`Message`] discriminates them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version tag carried by every envelope.
pub const VERSION: &str = "2.0";

/// Request correlation ID. Sequential per connection.
pub type RequestId = u64;

fn version() -> String {
	VERSION.to_string()
}

/// Request sent from the controller to the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
	#[serde(default = "version")]
	pub jsonrpc: String,
	pub id: RequestId,
	pub method: String,
	#[serde(default)]
	pub params: Value,
}

impl Request {
	pub fn new(id: RequestId, method: impl Into<String>, params: Value) -> Self {
		Self {
			jsonrpc: version(),
			id,
			method: method.into(),
			params,
		}
	}
}

/// Response correlating to a [`Request`] by `id`.
///
/// `result` and `error` are mutually exclusive on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
	#[serde(default = "version")]
	pub jsonrpc: String,
	pub id: RequestId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<RpcError>,
}

impl Response {
	pub fn success(id: RequestId, result: Value) -> Self {
		Self {
			jsonrpc: version(),
			id,
			result: Some(result),
			error: None,
		}
	}

	pub fn failure(id: RequestId, error: RpcError) -> Self {
		Self {
			jsonrpc: version(),
			id,
			result: None,
			error: Some(error),
		}
	}
}

/// Fault payload of a failed [`Response`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
	pub code: i32,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

impl RpcError {
	pub fn new(code: i32, message: impl Into<String>) -> Self {
		Self {
			code,
			message: message.into(),
			data: None,
		}
	}

	pub fn with_data(mut self, data: Value) -> Self {
		self.data = Some(data);
		self
	}
}

/// One-way message, used for stream events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
	#[serde(default = "version")]
	pub jsonrpc: String,
	pub method: String,
	#[serde(default)]
	pub params: Value,
}

impl Notification {
	pub fn new(method: impl Into<String>, params: Value) -> Self {
		Self {
			jsonrpc: version(),
			method: method.into(),
			params,
		}
	}
}

/// Discriminated union of protocol frames.
///
/// Variant order matters for untagged deserialization: a request is tried
/// before a response since both carry `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	Request(Request),
	Response(Response),
	Notification(Notification),
	/// Forward-compatible catch-all.
	Unknown(Value),
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn request_is_not_mistaken_for_response() {
		let message: Message = serde_json::from_value(json!({
			"jsonrpc": "2.0", "id": 7, "method": "listContexts", "params": {}
		}))
		.unwrap();
		match message {
			Message::Request(request) => {
				assert_eq!(request.id, 7);
				assert_eq!(request.method, "listContexts");
			}
			other => panic!("expected request, got {other:?}"),
		}
	}

	#[test]
	fn error_response_deserializes() {
		let message: Message = serde_json::from_value(json!({
			"jsonrpc": "2.0", "id": 3, "error": {"code": -32602, "message": "bad"}
		}))
		.unwrap();
		match message {
			Message::Response(response) => {
				assert!(response.result.is_none());
				let error = response.error.unwrap();
				assert_eq!(error.code, -32602);
				assert_eq!(error.message, "bad");
			}
			other => panic!("expected response, got {other:?}"),
		}
	}

	#[test]
	fn notification_has_no_id() {
		let message: Message = serde_json::from_value(json!({
			"jsonrpc": "2.0", "method": "streamNotify", "params": {"streamId": "Extension"}
		}))
		.unwrap();
		assert!(matches!(message, Message::Notification(n) if n.method == "streamNotify"));
	}

	#[test]
	fn result_is_omitted_on_failure() {
		let value = serde_json::to_value(Response::failure(1, RpcError::new(-32603, "x"))).unwrap();
		assert!(value.get("result").is_none());
		assert_eq!(value["error"]["code"], -32603);
	}
}
