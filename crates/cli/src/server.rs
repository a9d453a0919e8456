//! JSON-RPC tool server wrapping one shared connector.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use jsonrpsee::core::{RpcResult, async_trait};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::types::error::CALL_EXECUTION_FAILED_CODE;
use serde_json::{Map, Value, json};
use uibridge::{
	ActionOutcome, CapabilityInfo, CapabilityName, Connector, Criteria, ElementRecord, HotReloadOutcome, LogEntry,
};

use crate::rpc::{BridgeRpcServer, ConnectInfo, WaitOutcome};

pub struct BridgeServer {
	connector: Arc<Connector>,
}

impl BridgeServer {
	pub fn new(connector: Arc<Connector>) -> Self {
		Self { connector }
	}
}

/// Binds `addr` and serves the tool surface until the handle is stopped.
pub async fn start(addr: SocketAddr, connector: Arc<Connector>) -> anyhow::Result<(SocketAddr, ServerHandle)> {
	let server = Server::builder().build(addr).await?;
	let local_addr = server.local_addr()?;
	let handle = server.start(BridgeServer::new(connector).into_rpc());
	tracing::info!(%local_addr, "tool server listening");
	Ok((local_addr, handle))
}

/// Connector faults keep their wire code where they had one.
pub fn rpc_error(err: uibridge::Error) -> ErrorObjectOwned {
	let code = err.fault_code().unwrap_or(CALL_EXECUTION_FAILED_CODE);
	let mut data = json!({
		"code": err.code(),
		"class": format!("{:?}", err.class()),
	});
	if let uibridge::Error::Internal { data: Some(detail), .. } = &err {
		data["detail"] = detail.clone();
	}
	ErrorObjectOwned::owned(code, err.to_string(), Some(data))
}

#[async_trait]
impl BridgeRpcServer for BridgeServer {
	async fn connect(&self, uri: String) -> RpcResult<ConnectInfo> {
		self.connector.connect(&uri).await.map_err(rpc_error)?;
		let context_id = self.connector.context_id().ok_or_else(|| rpc_error(uibridge::Error::NotConnected))?;
		Ok(ConnectInfo {
			context_id,
			capabilities: self
				.connector
				.known_capabilities()
				.iter()
				.map(ToString::to_string)
				.collect(),
		})
	}

	async fn disconnect(&self) -> RpcResult<()> {
		self.connector.disconnect().await;
		Ok(())
	}

	async fn list_elements(&self) -> RpcResult<Vec<ElementRecord>> {
		self.connector.list_elements().await.map_err(rpc_error)
	}

	async fn tap(&self, criteria: Criteria) -> RpcResult<ActionOutcome> {
		self.connector.tap(criteria).await.map_err(rpc_error)
	}

	async fn enter_text(&self, criteria: Criteria, input: String) -> RpcResult<ActionOutcome> {
		self.connector.enter_text(criteria, &input).await.map_err(rpc_error)
	}

	async fn scroll_to(&self, criteria: Criteria) -> RpcResult<ActionOutcome> {
		self.connector.scroll_to(criteria).await.map_err(rpc_error)
	}

	async fn get_logs(&self, clear: Option<bool>) -> RpcResult<Vec<LogEntry>> {
		self.connector.get_logs(clear.unwrap_or(false)).await.map_err(rpc_error)
	}

	async fn take_screenshots(&self) -> RpcResult<Vec<String>> {
		self.connector.take_screenshots().await.map_err(rpc_error)
	}

	async fn hot_reload(&self) -> RpcResult<HotReloadOutcome> {
		self.connector.hot_reload().await.map_err(rpc_error)
	}

	async fn list_custom_capabilities(&self) -> RpcResult<Vec<CapabilityInfo>> {
		self.connector.list_custom_capabilities().await.map_err(rpc_error)
	}

	async fn wait_for(&self, name: String, timeout_ms: Option<u64>) -> RpcResult<WaitOutcome> {
		let name = CapabilityName::parse(&name)
			.map_err(uibridge::Error::from)
			.map_err(rpc_error)?;
		let found = self
			.connector
			.wait_for(&name, timeout_ms.map(Duration::from_millis))
			.await
			.is_some();
		Ok(WaitOutcome {
			capability: name.to_string(),
			found,
		})
	}

	async fn call(&self, name: String, params: Option<Criteria>) -> RpcResult<Value> {
		self.connector
			.invoke(&name, params.unwrap_or_else(Map::new))
			.await
			.map_err(rpc_error)
	}
}
