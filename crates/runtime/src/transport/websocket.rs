//! WebSocket transport (text frames carrying one JSON document each).

use futures_util::future::BoxFuture;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use super::{TransportParts, TransportReceiver, TransportSender, normalize_endpoint};
use crate::error::{Error, Result};

pub struct WebSocketTransport;

impl WebSocketTransport {
	/// Opens a client connection to `endpoint`.
	pub async fn connect(endpoint: &str) -> Result<TransportParts> {
		let url = normalize_endpoint(endpoint)?;
		tracing::debug!(url = %url, "opening websocket");

		let (stream, _response) = tokio_tungstenite::connect_async(url.as_str())
			.await
			.map_err(|e| Error::ConnectionFailed {
				endpoint: url.clone(),
				reason: e.to_string(),
			})?;

		Ok(Self::from_stream(stream))
	}

	/// Wraps an established WebSocket (client or server side).
	pub fn from_stream<S>(stream: WebSocketStream<S>) -> TransportParts
	where
		S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
	{
		let (sink, stream) = stream.split();
		let (message_tx, message_rx) = mpsc::unbounded_channel();

		TransportParts {
			sender: Box::new(WebSocketSender { sink }),
			receiver: Box::new(WebSocketReceiver { stream, message_tx }),
			message_rx,
		}
	}
}

struct WebSocketSender<S> {
	sink: SplitSink<WebSocketStream<S>, WsMessage>,
}

impl<S> TransportSender for WebSocketSender<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	fn send(&mut self, message: Value) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move {
			let text = serde_json::to_string(&message)?;
			self.sink
				.send(WsMessage::Text(text))
				.await
				.map_err(|e| Error::TransportError(e.to_string()))
		})
	}

	fn close(&mut self) -> BoxFuture<'_, Result<()>> {
		Box::pin(async move { self.sink.close().await.map_err(|e| Error::TransportError(e.to_string())) })
	}
}

struct WebSocketReceiver<S> {
	stream: SplitStream<WebSocketStream<S>>,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl<S> TransportReceiver for WebSocketReceiver<S>
where
	S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
	fn run(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
		Box::pin(async move {
			let WebSocketReceiver {
				mut stream,
				message_tx,
			} = *self;

			while let Some(frame) = stream.next().await {
				let frame = frame.map_err(|e| Error::TransportError(e.to_string()))?;
				let parsed = match frame {
					WsMessage::Text(text) => serde_json::from_str::<Value>(&text),
					WsMessage::Binary(bytes) => serde_json::from_slice::<Value>(&bytes),
					WsMessage::Close(_) => return Ok(()),
					_ => continue,
				};

				match parsed {
					Ok(value) => {
						if message_tx.send(value).is_err() {
							// Connection dropped its receiver; nothing left to deliver to.
							return Ok(());
						}
					}
					Err(e) => tracing::warn!(error = %e, "dropping malformed frame"),
				}
			}

			Ok(())
		})
	}
}
