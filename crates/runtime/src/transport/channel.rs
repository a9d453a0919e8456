//! In-memory transport connecting two endpoints in the same process.

use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{TransportParts, TransportReceiver, TransportSender};
use crate::error::{Error, Result};

pub struct ChannelTransport;

impl ChannelTransport {
	/// Creates two connected endpoints; frames sent on one arrive on the other.
	pub fn pair() -> (TransportParts, TransportParts) {
		let (left_tx, left_rx) = mpsc::unbounded_channel();
		let (right_tx, right_rx) = mpsc::unbounded_channel();
		(Self::parts(left_tx, right_rx), Self::parts(right_tx, left_rx))
	}

	fn parts(outbound: mpsc::UnboundedSender<Value>, inbound: mpsc::UnboundedReceiver<Value>) -> TransportParts {
		let (message_tx, message_rx) = mpsc::unbounded_channel();
		TransportParts {
			sender: Box::new(ChannelSender { tx: Some(outbound) }),
			receiver: Box::new(ChannelReceiver { inbound, message_tx }),
			message_rx,
		}
	}
}

struct ChannelSender {
	tx: Option<mpsc::UnboundedSender<Value>>,
}

impl TransportSender for ChannelSender {
	fn send(&mut self, message: Value) -> BoxFuture<'_, Result<()>> {
		let result = match &self.tx {
			Some(tx) => tx.send(message).map_err(|_| Error::TransportError("peer closed".to_string())),
			None => Err(Error::TransportError("transport closed".to_string())),
		};
		Box::pin(async move { result })
	}

	fn close(&mut self) -> BoxFuture<'_, Result<()>> {
		self.tx = None;
		Box::pin(async { Ok(()) })
	}
}

struct ChannelReceiver {
	inbound: mpsc::UnboundedReceiver<Value>,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl TransportReceiver for ChannelReceiver {
	fn run(self: Box<Self>) -> BoxFuture<'static, Result<()>> {
		Box::pin(async move {
			let ChannelReceiver {
				mut inbound,
				message_tx,
			} = *self;
			while let Some(value) = inbound.recv().await {
				if message_tx.send(value).is_err() {
					break;
				}
			}
			Ok(())
		})
	}
}
