use std::sync::Arc;

use async_trait::async_trait;
use uibridge_runtime::{ChannelTransport, TransportParts, WebSocketTransport, normalize_endpoint};

use crate::error::{Error, Result};

/// Opens the transport for [`Connector::connect`](super::Connector::connect).
#[async_trait]
pub trait Dialer: Send + Sync {
	async fn dial(&self, endpoint: &str) -> Result<TransportParts>;
}

/// Dials `ws://`, `wss://` and `http(s)://` endpoints over WebSocket.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketDialer;

#[async_trait]
impl Dialer for WebSocketDialer {
	async fn dial(&self, endpoint: &str) -> Result<TransportParts> {
		let url = normalize_endpoint(endpoint).map_err(|e| Error::ConnectFailed {
			endpoint: endpoint.to_string(),
			reason: e.to_string(),
		})?;
		tracing::debug!(%url, "dialing");
		WebSocketTransport::connect(&url).await.map_err(|e| Error::ConnectFailed {
			endpoint: endpoint.to_string(),
			reason: e.to_string(),
		})
	}
}

type Accept = Arc<dyn Fn(&str, TransportParts) -> std::result::Result<(), String> + Send + Sync>;

/// Pairs the connector with an in-process peer.
///
/// Every dial creates a fresh in-memory transport and hands the far end to
/// `accept` along with the endpoint; an `Err` from `accept` refuses the
/// connection.
#[derive(Clone)]
pub struct ChannelDialer {
	accept: Accept,
}

impl ChannelDialer {
	pub fn new(accept: impl Fn(&str, TransportParts) -> std::result::Result<(), String> + Send + Sync + 'static) -> Self {
		Self {
			accept: Arc::new(accept),
		}
	}
}

#[async_trait]
impl Dialer for ChannelDialer {
	async fn dial(&self, endpoint: &str) -> Result<TransportParts> {
		let (local, remote) = ChannelTransport::pair();
		(self.accept)(endpoint, remote).map_err(|reason| Error::ConnectFailed {
			endpoint: endpoint.to_string(),
			reason,
		})?;
		Ok(local)
	}
}
