//! Error types for the uibridge runtime.

use serde_json::Value;
use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the runtime.
#[derive(Debug, Error)]
pub enum Error {
	/// Failed to open the transport to the target.
	#[error("Failed to connect to {endpoint}: {reason}")]
	ConnectionFailed { endpoint: String, reason: String },

	/// Endpoint URI could not be turned into a transport address.
	#[error("Invalid endpoint '{0}'")]
	InvalidEndpoint(String),

	/// Transport-level error (socket read/write).
	#[error("Transport error: {0}")]
	TransportError(String),

	/// Protocol-level error (malformed or uncorrelated frames).
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// Fault returned by the target for a request.
	#[error("Remote fault {code}: {message}")]
	Remote {
		code: i32,
		message: String,
		data: Option<Value>,
	},

	/// Connection closed while a request was in flight, or before it was sent.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns the fault code if this is a remote fault.
	pub fn remote_code(&self) -> Option<i32> {
		match self {
			Error::Remote { code, .. } => Some(*code),
			_ => None,
		}
	}

	/// True for failures of the transport itself rather than the remote call.
	pub fn is_transport(&self) -> bool {
		matches!(
			self,
			Error::ConnectionFailed { .. } | Error::TransportError(_) | Error::ChannelClosed | Error::Io(_)
		)
	}
}
