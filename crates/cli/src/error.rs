use serde_json::json;
use thiserror::Error;

use crate::output::{CommandError, ErrorCode};

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("no target endpoint: pass --uri or set UIBRIDGE_URI")]
	MissingUri,

	#[error("invalid input: {0}")]
	InvalidInput(String),

	#[error(transparent)]
	Bridge(#[from] uibridge::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}

impl CliError {
	/// Convert this error to a CommandError for structured output
	pub fn to_command_error(&self) -> CommandError {
		let (code, details) = match self {
			CliError::MissingUri | CliError::InvalidInput(_) => (ErrorCode::InvalidParams, None),
			CliError::Bridge(err) => (ErrorCode::from(err), bridge_details(err)),
			CliError::Io(_) => (ErrorCode::IoError, None),
			CliError::Json(_) | CliError::Anyhow(_) => (ErrorCode::InternalError, None),
		};

		CommandError {
			code,
			message: self.to_string(),
			details,
		}
	}
}

fn bridge_details(err: &uibridge::Error) -> Option<serde_json::Value> {
	match err {
		uibridge::Error::Internal { data: Some(data), .. } => Some(data.clone()),
		_ => err.fault_code().map(|code| json!({ "faultCode": code })),
	}
}

#[cfg(test)]
mod tests {
	use uibridge_protocol::fault::codes;

	use super::*;

	#[test]
	fn application_fault_carries_wire_code() {
		let err = CliError::from(uibridge::Error::Application {
			code: codes::ELEMENT_NOT_FOUND,
			message: "No element matches Key(\"x\")".into(),
		});
		let command_error = err.to_command_error();
		assert_eq!(command_error.code, ErrorCode::ApplicationError);
		assert_eq!(command_error.message, "No element matches Key(\"x\")");
		assert_eq!(command_error.details, Some(json!({"faultCode": -32016})));
	}

	#[test]
	fn internal_fault_passes_detail_through() {
		let detail = json!({"exception": "boom", "context": "", "method": "orders.submit"});
		let err = CliError::from(uibridge::Error::Internal {
			message: detail.to_string(),
			data: Some(detail.clone()),
		});
		let command_error = err.to_command_error();
		assert_eq!(command_error.code, ErrorCode::InternalError);
		assert_eq!(command_error.details, Some(detail));
	}

	#[test]
	fn missing_uri_is_invalid_params() {
		let command_error = CliError::MissingUri.to_command_error();
		assert_eq!(command_error.code, ErrorCode::InvalidParams);
		assert!(command_error.message.contains("UIBRIDGE_URI"));
	}
}
