//! Error types for the uibridge connector.

use serde_json::Value;
use thiserror::Error;
use uibridge_protocol::fault::{INTERNAL_ERROR, INVALID_PARAMS};
use uibridge_protocol::{AppErrorCode, CapabilityNameError};

/// Result type alias for connector operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error taxonomy used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
	/// No connection, transport open failure, or no qualifying context.
	Connectivity,
	/// Missing or malformed parameters or names.
	Validation,
	/// A capability's own business failure.
	Application,
	/// An uncaught fault inside the target, or a response that made no sense.
	Unexpected,
	/// The transport failed mid-call.
	Transport,
}

#[derive(Debug, Error)]
pub enum Error {
	#[error("Not connected")]
	NotConnected,

	#[error("Invalid capability name: {0}")]
	InvalidCapabilityName(#[from] CapabilityNameError),

	#[error("Failed to connect to {endpoint}: {reason}")]
	ConnectFailed { endpoint: String, reason: String },

	/// No execution context exposes the liveness capability.
	#[error("No execution context exposes '{0}'")]
	NoContext(String),

	#[error("Invalid params: {0}")]
	InvalidParams(String),

	/// Application fault raised by the capability.
	#[error("{message}")]
	Application { code: AppErrorCode, message: String },

	/// Uncaught fault inside the capability handler.
	#[error("Capability fault: {message}")]
	Internal { message: String, data: Option<Value> },

	/// Any other fault code returned by the target.
	#[error("Remote fault {code}: {message}")]
	Remote { code: i32, message: String },

	#[error("Unexpected response: {0}")]
	UnexpectedResponse(String),

	#[error(transparent)]
	Transport(uibridge_runtime::Error),
}

impl Error {
	pub fn class(&self) -> ErrorClass {
		match self {
			Error::NotConnected | Error::ConnectFailed { .. } | Error::NoContext(_) => ErrorClass::Connectivity,
			Error::InvalidCapabilityName(_) | Error::InvalidParams(_) => ErrorClass::Validation,
			Error::Application { .. } => ErrorClass::Application,
			Error::Internal { .. } | Error::Remote { .. } | Error::UnexpectedResponse(_) => ErrorClass::Unexpected,
			Error::Transport(_) => ErrorClass::Transport,
		}
	}

	/// Stable machine-readable code.
	pub fn code(&self) -> &'static str {
		match self {
			Error::NotConnected => "NOT_CONNECTED",
			Error::ConnectFailed { .. } => "CONNECT_FAILED",
			Error::NoContext(_) => "NO_CONTEXT",
			Error::InvalidCapabilityName(_) | Error::InvalidParams(_) => "INVALID_PARAMS",
			Error::Application { .. } => "APPLICATION_ERROR",
			Error::Internal { .. } | Error::UnexpectedResponse(_) => "INTERNAL_ERROR",
			Error::Remote { .. } => "REMOTE_ERROR",
			Error::Transport(_) => "TRANSPORT_ERROR",
		}
	}

	/// Wire fault code, when the target answered with one.
	pub fn fault_code(&self) -> Option<i32> {
		match self {
			Error::InvalidParams(_) => Some(INVALID_PARAMS),
			Error::Application { code, .. } => Some(code.wire_code()),
			Error::Internal { .. } => Some(INTERNAL_ERROR),
			Error::Remote { code, .. } => Some(*code),
			_ => None,
		}
	}
}

impl From<uibridge_runtime::Error> for Error {
	fn from(err: uibridge_runtime::Error) -> Self {
		match err {
			uibridge_runtime::Error::Remote { code, message, data } => match code {
				INVALID_PARAMS => Error::InvalidParams(message),
				INTERNAL_ERROR => Error::Internal { message, data },
				_ => match AppErrorCode::from_wire(code) {
					Some(code) => Error::Application { code, message },
					None => Error::Remote { code, message },
				},
			},
			uibridge_runtime::Error::ConnectionFailed { endpoint, reason } => Error::ConnectFailed { endpoint, reason },
			uibridge_runtime::Error::Json(e) => Error::UnexpectedResponse(e.to_string()),
			other => Error::Transport(other),
		}
	}
}
