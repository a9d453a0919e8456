use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uibridge::{ActionOutcome, CapabilityInfo, Criteria, ElementRecord, HotReloadOutcome, LogEntry};

/// Session details returned by `bridge_connect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectInfo {
	pub context_id: String,
	/// Display names of the capabilities the target exposes.
	pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOutcome {
	pub capability: String,
	pub found: bool,
}

/// Tool surface over a single [`Connector`](uibridge::Connector).
#[rpc(client, server)]
pub trait BridgeRpc {
	#[method(name = "bridge_connect")]
	async fn connect(&self, uri: String) -> RpcResult<ConnectInfo>;

	#[method(name = "bridge_disconnect")]
	async fn disconnect(&self) -> RpcResult<()>;

	#[method(name = "bridge_list_elements")]
	async fn list_elements(&self) -> RpcResult<Vec<ElementRecord>>;

	#[method(name = "bridge_tap")]
	async fn tap(&self, criteria: Criteria) -> RpcResult<ActionOutcome>;

	#[method(name = "bridge_enter_text")]
	async fn enter_text(&self, criteria: Criteria, input: String) -> RpcResult<ActionOutcome>;

	#[method(name = "bridge_scroll_to")]
	async fn scroll_to(&self, criteria: Criteria) -> RpcResult<ActionOutcome>;

	#[method(name = "bridge_get_logs")]
	async fn get_logs(&self, clear: Option<bool>) -> RpcResult<Vec<LogEntry>>;

	#[method(name = "bridge_take_screenshots")]
	async fn take_screenshots(&self) -> RpcResult<Vec<String>>;

	#[method(name = "bridge_hot_reload")]
	async fn hot_reload(&self) -> RpcResult<HotReloadOutcome>;

	#[method(name = "bridge_list_custom_capabilities")]
	async fn list_custom_capabilities(&self) -> RpcResult<Vec<CapabilityInfo>>;

	#[method(name = "bridge_wait_for")]
	async fn wait_for(&self, name: String, timeout_ms: Option<u64>) -> RpcResult<WaitOutcome>;

	#[method(name = "bridge_call")]
	async fn call(&self, name: String, params: Option<Criteria>) -> RpcResult<Value>;
}
