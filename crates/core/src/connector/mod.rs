//! Controller-side connection to a running target.
//!
//! A [`Connector`] owns at most one session at a time:
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──▶ DiscoveringContext ──▶ Connected
//!      ▲                                                             │
//!      └──────────────────────────── disconnect ◀────────────────────┘
//! ```
//!
//! While connected, a listener task follows the target's registration stream
//! and keeps the table of known capabilities current, so callers can
//! [`wait_for`](Connector::wait_for) capabilities the target registers late.

mod dialer;
pub(crate) mod waiter;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use uibridge_protocol::service::{
	CONTEXT_ID_PARAM, ContextInfo, ContextList, EXTENSION_STREAM, ReloadReport, StreamEvent, StreamNotification,
	method,
};
use uibridge_protocol::{CapabilityName, Notification};
use uibridge_runtime::Connection;

pub use self::dialer::{ChannelDialer, Dialer, WebSocketDialer};
use self::waiter::CapabilityTable;
use crate::config::ConnectorConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
	Disconnected,
	Connecting,
	DiscoveringContext,
	Connected,
}

impl fmt::Display for ConnectionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			ConnectionState::Disconnected => "disconnected",
			ConnectionState::Connecting => "connecting",
			ConnectionState::DiscoveringContext => "discovering context",
			ConnectionState::Connected => "connected",
		})
	}
}

/// How a hot reload was carried out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "via", rename_all = "camelCase")]
pub enum HotReloadOutcome {
	/// The target registered an alternate reload capability; its result is
	/// passed through untouched.
	Capability { capability: String, result: Value },
	/// Fell back to the service's own source reload.
	ReloadSources {
		success: bool,
		#[serde(default, skip_serializing_if = "Vec::is_empty")]
		notices: Vec<String>,
	},
}

impl HotReloadOutcome {
	pub fn succeeded(&self) -> bool {
		match self {
			HotReloadOutcome::Capability { .. } => true,
			HotReloadOutcome::ReloadSources { success, .. } => *success,
		}
	}
}

struct Session {
	connection: Arc<Connection>,
	context_id: String,
	runner: JoinHandle<()>,
	listener: JoinHandle<()>,
}

/// Connection to one execution context of a target.
///
/// `connect`, `disconnect` and `invoke` take `&self`, but callers are expected
/// not to race `connect` against `disconnect` on the same instance. Invocations
/// and [`wait_for`](Self::wait_for) may run concurrently with each other.
pub struct Connector {
	config: ConnectorConfig,
	dialer: Arc<dyn Dialer>,
	state: Mutex<ConnectionState>,
	session: Mutex<Option<Session>>,
	capabilities: Arc<CapabilityTable>,
}

impl Connector {
	/// Creates a connector that dials over WebSocket.
	pub fn new(config: ConnectorConfig) -> Self {
		Self::with_dialer(config, WebSocketDialer)
	}

	pub fn with_dialer(config: ConnectorConfig, dialer: impl Dialer + 'static) -> Self {
		Self {
			config,
			dialer: Arc::new(dialer),
			state: Mutex::new(ConnectionState::Disconnected),
			session: Mutex::new(None),
			capabilities: Arc::new(CapabilityTable::new()),
		}
	}

	pub fn config(&self) -> &ConnectorConfig {
		&self.config
	}

	pub fn state(&self) -> ConnectionState {
		*self.state.lock()
	}

	pub fn is_connected(&self) -> bool {
		self.state() == ConnectionState::Connected
	}

	/// Id of the selected execution context, while connected.
	pub fn context_id(&self) -> Option<String> {
		self.session.lock().as_ref().map(|session| session.context_id.clone())
	}

	/// Capabilities known to be registered in the selected context.
	pub fn known_capabilities(&self) -> Vec<CapabilityName> {
		self.capabilities.names()
	}

	/// Opens a session to `endpoint` and selects the first execution context
	/// exposing the liveness capability.
	///
	/// An existing session is fully torn down first. On failure every partial
	/// step is rolled back and the connector is left disconnected.
	pub async fn connect(&self, endpoint: &str) -> Result<()> {
		let liveness = CapabilityName::parse(&self.config.liveness_capability)?;

		if self.session.lock().is_some() {
			tracing::info!("reconnecting, closing current session first");
			self.disconnect().await;
		}

		self.set_state(ConnectionState::Connecting);
		let parts = match self.dialer.dial(endpoint).await {
			Ok(parts) => parts,
			Err(err) => {
				self.set_state(ConnectionState::Disconnected);
				return Err(err);
			}
		};

		let connection = Arc::new(Connection::new(parts));
		// Subscribe before listening so no registration slips past.
		let notifications = connection.subscribe();
		let runner = {
			let connection = Arc::clone(&connection);
			tokio::spawn(async move { connection.run().await })
		};

		self.set_state(ConnectionState::DiscoveringContext);
		let context = match discover_context(&connection, &liveness).await {
			Ok(context) => context,
			Err(err) => {
				tracing::info!(endpoint, error = %err, "connect failed, rolling back");
				connection.close();
				let _ = runner.await;
				self.capabilities.clear();
				self.set_state(ConnectionState::Disconnected);
				return Err(err);
			}
		};

		for wire in &context.capabilities {
			if let Some(name) = CapabilityName::from_wire(wire) {
				self.capabilities.insert(name);
			}
		}

		let listener = tokio::spawn(follow_registrations(
			notifications,
			context.id.clone(),
			Arc::clone(&self.capabilities),
		));

		tracing::info!(endpoint, context = %context.id, capabilities = context.capabilities.len(), "connected");
		*self.session.lock() = Some(Session {
			connection,
			context_id: context.id,
			runner,
			listener,
		});
		self.set_state(ConnectionState::Connected);
		Ok(())
	}

	/// Closes the session and forgets everything learned from it.
	///
	/// Pending [`wait_for`](Self::wait_for) calls resolve as not found.
	/// Calling this while disconnected is a no-op.
	pub async fn disconnect(&self) {
		let session = self.session.lock().take();
		if let Some(session) = session {
			session.listener.abort();
			session.connection.close();
			if let Err(err) = session.runner.await {
				tracing::debug!(error = %err, "connection task ended abnormally");
			}
			tracing::info!(context = %session.context_id, "disconnected");
		}
		self.capabilities.clear();
		self.set_state(ConnectionState::Disconnected);
	}

	/// Calls capability `name` in the selected context.
	///
	/// The name is validated before the connection is checked. Returns the
	/// capability's success payload as sent by the target.
	pub async fn invoke(&self, name: &str, params: Map<String, Value>) -> Result<Value> {
		let name = CapabilityName::parse(name)?;
		let (connection, context_id) = self.active()?;

		let mut params = params;
		params.insert(CONTEXT_ID_PARAM.to_string(), Value::String(context_id));

		tracing::debug!(capability = %name, "invoking");
		let reply = connection.send_message(&name.wire_name(), Value::Object(params)).await?;
		Ok(reply)
	}

	/// Waits until the target has registered `name`.
	///
	/// Resolves immediately for a known name. Returns `None` when `timeout`
	/// (or the configured default) elapses first, or when the session ends.
	pub async fn wait_for(&self, name: &CapabilityName, timeout: Option<Duration>) -> Option<CapabilityName> {
		let timeout = timeout.unwrap_or(self.config.waiter_timeout);
		self.capabilities.wait_for(name, timeout).await
	}

	/// Reloads the target's sources.
	///
	/// Prefers the alternate reload capability when the target registers it
	/// within the probe timeout, and falls back to the service's own reload.
	pub async fn hot_reload(&self) -> Result<HotReloadOutcome> {
		let alternate = CapabilityName::parse(&self.config.hot_reload_capability)?;
		let (connection, context_id) = self.active()?;

		if let Some(capability) = self
			.wait_for(&alternate, Some(self.config.hot_reload_probe_timeout))
			.await
		{
			tracing::info!(%capability, "hot reload via capability");
			let result = self.invoke(capability.as_str(), Map::new()).await?;
			return Ok(HotReloadOutcome::Capability {
				capability: capability.to_string(),
				result,
			});
		}

		tracing::info!("hot reload via reloadSources");
		let reply = connection
			.send_message(method::RELOAD_SOURCES, json!({ CONTEXT_ID_PARAM: context_id }))
			.await?;
		let report: ReloadReport =
			serde_json::from_value(reply).map_err(|err| Error::UnexpectedResponse(err.to_string()))?;
		Ok(HotReloadOutcome::ReloadSources {
			success: report.success,
			notices: report.notices,
		})
	}

	fn active(&self) -> Result<(Arc<Connection>, String)> {
		self.session
			.lock()
			.as_ref()
			.map(|session| (Arc::clone(&session.connection), session.context_id.clone()))
			.ok_or(Error::NotConnected)
	}

	fn set_state(&self, state: ConnectionState) {
		let previous = std::mem::replace(&mut *self.state.lock(), state);
		if previous != state {
			tracing::debug!(from = %previous, to = %state, "connection state");
		}
	}
}

impl fmt::Debug for Connector {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Connector")
			.field("state", &self.state())
			.field("context_id", &self.context_id())
			.finish_non_exhaustive()
	}
}

async fn discover_context(connection: &Connection, liveness: &CapabilityName) -> Result<ContextInfo> {
	connection
		.send_message(method::STREAM_LISTEN, json!({ "streamId": EXTENSION_STREAM }))
		.await?;

	let list: ContextList = decode(connection.send_message(method::LIST_CONTEXTS, json!({})).await?)?;
	let marker = liveness.wire_name();
	for summary in list.contexts {
		let info: ContextInfo = decode(
			connection
				.send_message(method::GET_CONTEXT, json!({ CONTEXT_ID_PARAM: summary.id }))
				.await?,
		)?;
		if info.exposes(&marker) {
			return Ok(info);
		}
		tracing::debug!(context = %info.id, "context lacks liveness capability");
	}
	Err(Error::NoContext(liveness.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
	serde_json::from_value(value).map_err(|err| Error::UnexpectedResponse(err.to_string()))
}

/// Records registrations announced for `context_id` until the stream ends.
async fn follow_registrations(
	mut notifications: broadcast::Receiver<Notification>,
	context_id: String,
	capabilities: Arc<CapabilityTable>,
) {
	loop {
		let notification = match notifications.recv().await {
			Ok(notification) => notification,
			Err(RecvError::Lagged(skipped)) => {
				tracing::warn!(skipped, "registration listener lagged, notifications dropped");
				continue;
			}
			Err(RecvError::Closed) => break,
		};
		if notification.method != method::STREAM_NOTIFY {
			continue;
		}
		let event = match serde_json::from_value::<StreamNotification>(notification.params) {
			Ok(notification) if notification.stream_id == EXTENSION_STREAM => notification.event,
			Ok(_) => continue,
			Err(err) => {
				tracing::warn!(error = %err, "malformed stream notification");
				continue;
			}
		};
		if let StreamEvent::CapabilityRegistered {
			context_id: origin,
			capability,
		} = event
		{
			if origin != context_id {
				continue;
			}
			match CapabilityName::from_wire(&capability) {
				Some(name) => capabilities.insert(name),
				None => tracing::warn!(%capability, "ignoring registration without wire prefix"),
			}
		}
	}
}
