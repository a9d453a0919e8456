//! Bidirectional JSON frame transports.
//!
//! A transport is split into three parts (see [`TransportParts`]):
//! - a [`TransportSender`] that writes frames,
//! - a [`TransportReceiver`] whose `run` loop reads frames and forwards them,
//! - the receiving end of that forwarding channel.
//!
//! The connection owns all three and drives the sender and receiver from
//! separate tasks so that reading never blocks writing.

mod channel;
mod websocket;

#[cfg(test)]
mod tests;

use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::sync::mpsc;

pub use channel::ChannelTransport;
pub use websocket::WebSocketTransport;

use crate::error::{Error, Result};

/// Write half of a transport.
pub trait TransportSender: Send {
	/// Writes one JSON frame.
	fn send(&mut self, message: Value) -> BoxFuture<'_, Result<()>>;

	/// Closes the write half. Further sends fail.
	fn close(&mut self) -> BoxFuture<'_, Result<()>>;
}

/// Read half of a transport.
pub trait TransportReceiver: Send {
	/// Reads frames until the peer closes or the forwarding channel is dropped.
	fn run(self: Box<Self>) -> BoxFuture<'static, Result<()>>;
}

/// The three parts a [`Connection`](crate::Connection) is built from.
pub struct TransportParts {
	pub sender: Box<dyn TransportSender>,
	pub receiver: Box<dyn TransportReceiver>,
	pub message_rx: mpsc::UnboundedReceiver<Value>,
}

/// Turns a user-supplied endpoint into a WebSocket URL.
///
/// `ws://` and `wss://` URLs pass through unchanged. `http(s)://host:port/token/`
/// URLs, as printed by targets on startup, map to `ws(s)://host:port/token/ws`.
pub fn normalize_endpoint(uri: &str) -> Result<String> {
	let mut url = url::Url::parse(uri.trim()).map_err(|e| Error::InvalidEndpoint(format!("{uri}: {e}")))?;

	let scheme = match url.scheme() {
		"ws" | "wss" => return Ok(url.to_string()),
		"http" => "ws",
		"https" => "wss",
		other => return Err(Error::InvalidEndpoint(format!("{uri}: unsupported scheme '{other}'"))),
	};

	url.set_scheme(scheme)
		.map_err(|_| Error::InvalidEndpoint(format!("{uri}: cannot switch scheme to {scheme}")))?;

	let path = url.path().trim_end_matches('/').to_string();
	if !path.ends_with("/ws") {
		url.set_path(&format!("{path}/ws"));
	}
	Ok(url.to_string())
}
