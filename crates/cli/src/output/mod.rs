//! Structured output envelope for every CLI command.
//!
//! ## Output Contract
//!
//! Every command prints one envelope on stdout:
//!
//! ```json
//! {
//!   "ok": true,
//!   "command": "tap",
//!   "data": { "message": "Tapped Key(\"submit\")" },
//!   "timings": { "durationMs": 12 }
//! }
//! ```
//!
//! On failure:
//!
//! ```json
//! {
//!   "ok": false,
//!   "command": "tap",
//!   "error": {
//!     "code": "APPLICATION_ERROR",
//!     "message": "No element matches Key(\"submit\")",
//!     "details": { "faultCode": -32016 }
//!   }
//! }
//! ```

#[cfg(test)]
mod tests;

use std::fmt;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
	/// Pretty-printed JSON envelope
	#[default]
	Json,
	/// Human-readable text
	Text,
}

/// The result envelope returned by all commands.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	pub ok: bool,

	/// Command name (e.g., "tap", "elements")
	pub command: String,

	/// Only present on success
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,

	/// Only present on failure
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<CommandError>,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub timings: Option<Timings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
	pub code: ErrorCode,

	/// Human-readable error message
	pub message: String,

	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Standardized error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
	/// No active connection to a target
	NotConnected,
	/// Transport to the target could not be opened
	ConnectFailed,
	/// No execution context exposes the liveness capability
	NoContext,
	/// Missing or malformed parameters or capability names
	InvalidParams,
	/// The capability reported a business failure
	ApplicationError,
	/// The target answered with an unrecognized fault
	RemoteError,
	/// The transport failed mid-call
	TransportError,
	/// File I/O error
	IoError,
	/// Uncaught fault or nonsensical response
	InternalError,
}

impl ErrorCode {
	pub fn as_str(self) -> &'static str {
		match self {
			ErrorCode::NotConnected => "NOT_CONNECTED",
			ErrorCode::ConnectFailed => "CONNECT_FAILED",
			ErrorCode::NoContext => "NO_CONTEXT",
			ErrorCode::InvalidParams => "INVALID_PARAMS",
			ErrorCode::ApplicationError => "APPLICATION_ERROR",
			ErrorCode::RemoteError => "REMOTE_ERROR",
			ErrorCode::TransportError => "TRANSPORT_ERROR",
			ErrorCode::IoError => "IO_ERROR",
			ErrorCode::InternalError => "INTERNAL_ERROR",
		}
	}
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl From<&uibridge::Error> for ErrorCode {
	fn from(err: &uibridge::Error) -> Self {
		use uibridge::Error;
		match err {
			Error::NotConnected => ErrorCode::NotConnected,
			Error::ConnectFailed { .. } => ErrorCode::ConnectFailed,
			Error::NoContext(_) => ErrorCode::NoContext,
			Error::InvalidCapabilityName(_) | Error::InvalidParams(_) => ErrorCode::InvalidParams,
			Error::Application { .. } => ErrorCode::ApplicationError,
			Error::Remote { .. } => ErrorCode::RemoteError,
			Error::Transport(_) => ErrorCode::TransportError,
			Error::Internal { .. } | Error::UnexpectedResponse(_) => ErrorCode::InternalError,
		}
	}
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timings {
	pub duration_ms: u64,
}

impl From<Duration> for Timings {
	fn from(duration: Duration) -> Self {
		Timings {
			duration_ms: duration.as_millis() as u64,
		}
	}
}

/// Builder for constructing command results
pub struct ResultBuilder<T: Serialize> {
	command: String,
	data: Option<T>,
	error: Option<CommandError>,
	start_time: Instant,
}

impl<T: Serialize> ResultBuilder<T> {
	pub fn new(command: impl Into<String>) -> Self {
		Self {
			command: command.into(),
			data: None,
			error: None,
			start_time: Instant::now(),
		}
	}

	pub fn data(mut self, data: T) -> Self {
		self.data = Some(data);
		self
	}

	pub fn error(self, code: ErrorCode, message: impl Into<String>) -> Self {
		self.failure(CommandError {
			code,
			message: message.into(),
			details: None,
		})
	}

	pub fn failure(mut self, error: CommandError) -> Self {
		self.error = Some(error);
		self
	}

	pub fn build(self) -> CommandResult<T> {
		let ok = self.error.is_none() && self.data.is_some();
		CommandResult {
			ok,
			command: self.command,
			data: self.data,
			error: self.error,
			timings: Some(Timings::from(self.start_time.elapsed())),
		}
	}
}

/// Print a command result to stdout in the specified format
pub fn print_result<T: Serialize>(result: &CommandResult<T>, format: OutputFormat) {
	match format {
		OutputFormat::Json => {
			if let Ok(json) = serde_json::to_string_pretty(result) {
				println!("{json}");
			}
		}
		OutputFormat::Text => print_result_text(result),
	}
}

fn print_result_text<T: Serialize>(result: &CommandResult<T>) {
	let mut stdout = io::stdout().lock();

	if result.ok {
		if let Some(ref data) = result.data {
			match serde_json::to_value(data) {
				Ok(serde_json::Value::String(text)) => {
					let _ = writeln!(stdout, "{text}");
				}
				Ok(value) => {
					if let Ok(json) = serde_json::to_string_pretty(&value) {
						let _ = writeln!(stdout, "{json}");
					}
				}
				Err(_) => {}
			}
		}
	} else if let Some(ref error) = result.error {
		let _ = writeln!(stdout, "Error [{}]: {}", error.code, error.message);
		if let Some(ref details) = error.details {
			if let Ok(json) = serde_json::to_string_pretty(details) {
				let _ = writeln!(stdout, "Details: {json}");
			}
		}
	}
}

/// Print an error to stderr in human-readable format
pub fn print_error_stderr(error: &CommandError) {
	eprintln!("Error [{}]: {}", error.code, error.message);
}
