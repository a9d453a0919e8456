
use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use uibridge::Criteria;

use crate::output::OutputFormat;

/// Default port of the tool server.
pub const DEFAULT_SERVE_PORT: u16 = 8765;

/// Drive a running app through its uibridge agent.
#[derive(Parser, Debug)]
#[command(name = "uibridge")]
#[command(about = "Inspect and drive live UIs over the uibridge protocol")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short = 'f', long, global = true, value_enum, default_value = "json")]
	pub format: OutputFormat,

	/// Target endpoint (ws://, wss:// or the http:// URI the app prints)
	#[arg(long, global = true, env = "UIBRIDGE_URI", value_name = "URI")]
	pub uri: Option<String>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// List interactive elements on screen.
	Elements,
	/// Tap an element or a screen point.
	Tap(MatcherArgs),
	/// Enter text into an input.
	Type(TypeArgs),
	/// Scroll until an element is visible.
	Scroll(MatcherArgs),
	/// Show captured log entries.
	Logs(LogsArgs),
	/// Capture screenshots of every view.
	Screenshot(ScreenshotArgs),
	/// Hot reload the app's sources.
	Reload,
	/// List capabilities registered by the app.
	Capabilities,
	/// Wait for the app to register a capability.
	Wait(WaitArgs),
	/// Invoke any capability by name.
	Call(CallArgs),
	/// Serve the tool surface over JSON-RPC.
	Serve(ServeArgs),
}

/// Element match criteria. Precedence: `--x/--y`, `--key`, `--text`, `--type`.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct MatcherArgs {
	/// Element key
	#[arg(long)]
	pub key: Option<String>,

	/// Displayed text
	#[arg(long)]
	pub text: Option<String>,

	/// Runtime type name
	#[arg(long = "type", value_name = "TYPE")]
	pub type_name: Option<String>,

	/// Screen x coordinate
	#[arg(long, requires = "y", allow_negative_numbers = true)]
	pub x: Option<f64>,

	/// Screen y coordinate
	#[arg(long, requires = "x", allow_negative_numbers = true)]
	pub y: Option<f64>,
}

impl MatcherArgs {
	/// Flat criteria map, with only the given fields present.
	pub fn criteria(&self) -> Criteria {
		let mut criteria = Map::new();
		if let (Some(x), Some(y)) = (self.x, self.y) {
			criteria.insert("x".into(), Value::from(x));
			criteria.insert("y".into(), Value::from(y));
		}
		let strings = [("key", &self.key), ("text", &self.text), ("type", &self.type_name)];
		for (field, value) in strings {
			if let Some(value) = value {
				criteria.insert(field.into(), Value::String(value.clone()));
			}
		}
		criteria
	}
}

#[derive(Args, Debug, Clone)]
pub struct TypeArgs {
	#[command(flatten)]
	pub matcher: MatcherArgs,

	/// Text to enter
	#[arg(value_name = "INPUT")]
	pub input: String,
}

#[derive(Args, Debug, Clone)]
pub struct LogsArgs {
	/// Empty the app's log buffer after reading
	#[arg(long)]
	pub clear: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ScreenshotArgs {
	/// Write decoded PNGs into this directory instead of printing base64
	#[arg(short, long, value_name = "DIR")]
	pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
	/// Capability display name, e.g. `cart.clear`
	#[arg(value_name = "NAME")]
	pub name: String,

	/// Give up after this many milliseconds
	#[arg(long, value_name = "MS", default_value_t = 1000)]
	pub timeout_ms: u64,
}

#[derive(Args, Debug, Clone)]
pub struct CallArgs {
	/// Capability display name, e.g. `nav.get`
	#[arg(value_name = "NAME")]
	pub name: String,

	/// JSON object of parameters
	#[arg(long, value_name = "JSON")]
	pub params: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
	/// Address to bind
	#[arg(long, default_value = "127.0.0.1")]
	pub host: IpAddr,

	/// Port to bind
	#[arg(short, long, env = "UIBRIDGE_PORT", default_value_t = DEFAULT_SERVE_PORT)]
	pub port: u16,
}
