//! One-shot commands: connect, run one tool, disconnect.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value, json};
use uibridge::{CapabilityName, Connector, ConnectorConfig};

use crate::cli::{CallArgs, Commands, ScreenshotArgs, ServeArgs, WaitArgs};
use crate::error::{CliError, Result};
use crate::server;

/// Envelope name of a command.
pub fn command_name(command: &Commands) -> &'static str {
	match command {
		Commands::Elements => "elements",
		Commands::Tap(_) => "tap",
		Commands::Type(_) => "type",
		Commands::Scroll(_) => "scroll",
		Commands::Logs(_) => "logs",
		Commands::Screenshot(_) => "screenshot",
		Commands::Reload => "reload",
		Commands::Capabilities => "capabilities",
		Commands::Wait(_) => "wait",
		Commands::Call(_) => "call",
		Commands::Serve(_) => "serve",
	}
}

/// Runs `command` against a fresh session on `uri`.
pub async fn run(command: Commands, uri: Option<String>) -> Result<Value> {
	if let Commands::Serve(args) = command {
		return serve(args, uri).await;
	}

	let uri = uri.ok_or(CliError::MissingUri)?;
	let connector = Connector::new(ConnectorConfig::default());
	connector.connect(&uri).await?;
	let result = execute(&connector, command).await;
	connector.disconnect().await;
	result
}

/// Runs a tool command on an already connected connector.
pub async fn execute(connector: &Connector, command: Commands) -> Result<Value> {
	let data = match command {
		Commands::Elements => json!({ "elements": connector.list_elements().await? }),
		Commands::Tap(args) => serde_json::to_value(connector.tap(args.criteria()).await?)?,
		Commands::Type(args) => serde_json::to_value(connector.enter_text(args.matcher.criteria(), &args.input).await?)?,
		Commands::Scroll(args) => serde_json::to_value(connector.scroll_to(args.criteria()).await?)?,
		Commands::Logs(args) => json!({ "logs": connector.get_logs(args.clear).await? }),
		Commands::Screenshot(args) => screenshot(connector, args).await?,
		Commands::Reload => serde_json::to_value(connector.hot_reload().await?)?,
		Commands::Capabilities => json!({ "capabilities": connector.list_custom_capabilities().await? }),
		Commands::Wait(args) => wait(connector, args).await?,
		Commands::Call(args) => call(connector, args).await?,
		Commands::Serve(_) => return Err(CliError::InvalidInput("serve cannot run inside a session".into())),
	};
	Ok(data)
}

async fn screenshot(connector: &Connector, args: ScreenshotArgs) -> Result<Value> {
	let images = connector.take_screenshots().await?;
	let Some(dir) = args.output else {
		return Ok(json!({ "images": images }));
	};
	Ok(json!({ "files": write_images(&dir, &images)? }))
}

/// Decodes base64 PNGs into `dir` as `screen-<n>.png`.
pub fn write_images(dir: &Path, images: &[String]) -> Result<Vec<String>> {
	std::fs::create_dir_all(dir)?;
	let mut files = Vec::with_capacity(images.len());
	for (index, image) in images.iter().enumerate() {
		let bytes = STANDARD
			.decode(image)
			.map_err(|err| CliError::InvalidInput(format!("screenshot {index} is not base64: {err}")))?;
		let path = dir.join(format!("screen-{index}.png"));
		std::fs::write(&path, bytes)?;
		files.push(path.display().to_string());
	}
	Ok(files)
}

async fn wait(connector: &Connector, args: WaitArgs) -> Result<Value> {
	let name = CapabilityName::parse(&args.name).map_err(uibridge::Error::from)?;
	let found = connector
		.wait_for(&name, Some(Duration::from_millis(args.timeout_ms)))
		.await
		.is_some();
	Ok(json!({ "capability": name.to_string(), "found": found }))
}

async fn call(connector: &Connector, args: CallArgs) -> Result<Value> {
	Ok(connector.invoke(&args.name, parse_params(args.params.as_deref())?).await?)
}

/// Parses `--params`; absent means no parameters.
pub fn parse_params(raw: Option<&str>) -> Result<Map<String, Value>> {
	match raw {
		None => Ok(Map::new()),
		Some(raw) => match serde_json::from_str::<Value>(raw)? {
			Value::Object(params) => Ok(params),
			other => Err(CliError::InvalidInput(format!("--params must be a JSON object, got {other}"))),
		},
	}
}

async fn serve(args: ServeArgs, uri: Option<String>) -> Result<Value> {
	let connector = Arc::new(Connector::new(ConnectorConfig::default()));
	if let Some(uri) = uri {
		connector.connect(&uri).await?;
	}

	let (addr, handle) = server::start(SocketAddr::new(args.host, args.port), Arc::clone(&connector)).await?;
	eprintln!("uibridge tool server listening on http://{addr}");

	tokio::signal::ctrl_c().await?;
	tracing::info!("shutting down");
	let _ = handle.stop();
	handle.stopped().await;
	connector.disconnect().await;
	Ok(json!({ "address": addr.to_string(), "stopped": true }))
}
