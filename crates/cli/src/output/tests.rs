use serde_json::json;

use super::*;

#[test]
fn result_builder_success() {
	let result: CommandResult<serde_json::Value> = ResultBuilder::new("tap")
		.data(json!({"message": "Tapped Key(\"ok\")"}))
		.build();

	assert!(result.ok);
	assert_eq!(result.command, "tap");
	assert!(result.data.is_some());
	assert!(result.error.is_none());
	assert!(result.timings.is_some());
}

#[test]
fn result_builder_error() {
	let result: CommandResult<()> = ResultBuilder::new("tap")
		.error(ErrorCode::NotConnected, "Not connected")
		.build();

	assert!(!result.ok);
	assert!(result.data.is_none());
	assert_eq!(result.error.as_ref().unwrap().code, ErrorCode::NotConnected);
}

#[test]
fn error_code_display_matches_serde() {
	for code in [
		ErrorCode::NotConnected,
		ErrorCode::ApplicationError,
		ErrorCode::InvalidParams,
		ErrorCode::IoError,
	] {
		assert_eq!(serde_json::to_value(code).unwrap(), json!(code.to_string()));
	}
	assert_eq!(ErrorCode::ConnectFailed.to_string(), "CONNECT_FAILED");
}

#[test]
fn connector_errors_map_to_codes() {
	assert_eq!(ErrorCode::from(&uibridge::Error::NotConnected), ErrorCode::NotConnected);
	assert_eq!(
		ErrorCode::from(&uibridge::Error::InvalidParams("missing input".into())),
		ErrorCode::InvalidParams
	);
	assert_eq!(
		ErrorCode::from(&uibridge::Error::UnexpectedResponse("not json".into())),
		ErrorCode::InternalError
	);
}

#[test]
fn output_format_parse() {
	use clap::ValueEnum;

	assert_eq!(OutputFormat::from_str("json", false).unwrap(), OutputFormat::Json);
	assert_eq!(OutputFormat::from_str("TEXT", true).unwrap(), OutputFormat::Text);
	assert!(OutputFormat::from_str("toon", true).is_err());
}

#[test]
fn serialize_envelope() {
	let result: CommandResult<()> = ResultBuilder::new("elements")
		.error(ErrorCode::ApplicationError, "No element matches Key(\"x\")")
		.build();

	let value = serde_json::to_value(&result).unwrap();
	assert_eq!(value["ok"], false);
	assert_eq!(value["command"], "elements");
	assert_eq!(value["error"]["code"], "APPLICATION_ERROR");
	assert!(value.get("data").is_none());
	assert!(value["timings"]["durationMs"].is_u64());
}
