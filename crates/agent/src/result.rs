//! Capability results and parameter validation.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uibridge_protocol::AppErrorCode;

/// String-keyed parameters a capability handler receives.
pub type Params = Map<String, Value>;

/// Outcome of one capability invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityResult {
	/// Ordered key/value data, tagged by the dispatcher before transmission.
	Success(Map<String, Value>),
	/// Business failure at an offset into the application fault range.
	Error { code: AppErrorCode, message: String },
	InvalidParams(String),
}

impl CapabilityResult {
	pub fn success(data: Map<String, Value>) -> Self {
		CapabilityResult::Success(data)
	}

	/// Serializes `payload` into success data. Non-object payloads are
	/// wrapped as `{"result": payload}`.
	pub fn from_payload<T: Serialize>(payload: &T) -> serde_json::Result<Self> {
		let data = match serde_json::to_value(payload)? {
			Value::Object(map) => map,
			other => {
				let mut map = Map::new();
				map.insert("result".to_string(), other);
				map
			}
		};
		Ok(CapabilityResult::Success(data))
	}

	pub fn error(code: AppErrorCode, message: impl Into<String>) -> Self {
		CapabilityResult::Error {
			code,
			message: message.into(),
		}
	}

	pub fn invalid_params(message: impl Into<String>) -> Self {
		CapabilityResult::InvalidParams(message.into())
	}
}

/// Parameter-validation fault raised from inside a handler.
///
/// Returning this through `?` makes the dispatcher answer with an
/// invalid-params fault instead of treating the error as uncaught.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParamError(pub String);

impl ParamError {
	pub fn missing(name: &str) -> Self {
		ParamError(format!("missing required parameter '{name}'"))
	}

	pub fn invalid(name: &str, expected: &str) -> Self {
		ParamError(format!("parameter '{name}' must be {expected}"))
	}
}

impl From<uibridge_protocol::MatcherError> for ParamError {
	fn from(err: uibridge_protocol::MatcherError) -> Self {
		ParamError(err.to_string())
	}
}

/// Reads a required string parameter.
pub fn required_str<'a>(params: &'a Params, name: &str) -> Result<&'a str, ParamError> {
	match params.get(name) {
		None | Some(Value::Null) => Err(ParamError::missing(name)),
		Some(Value::String(s)) => Ok(s),
		Some(_) => Err(ParamError::invalid(name, "a string")),
	}
}

/// Reads an optional boolean parameter; string forms `"true"`/`"false"` are accepted.
pub fn optional_bool(params: &Params, name: &str) -> Result<Option<bool>, ParamError> {
	match params.get(name) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Bool(b)) => Ok(Some(*b)),
		Some(Value::String(s)) if s == "true" => Ok(Some(true)),
		Some(Value::String(s)) if s == "false" => Ok(Some(false)),
		Some(_) => Err(ParamError::invalid(name, "a boolean")),
	}
}
