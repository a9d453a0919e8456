use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use uibridge_protocol::{CapabilityInfo, CapabilityName};

use crate::builtins::{self, BuiltinConfig};
use crate::dispatcher::{Dispatcher, HostErrorSink, PendingReply, Reply};
use crate::host::UiHost;
use crate::logs::{DEFAULT_LOG_CAPACITY, LogBuffer};
use crate::registry::{Registry, RegistryError};
use crate::result::{CapabilityResult, Params};
use crate::tree::NodeClassifier;

pub const DEFAULT_SCROLL_MAX_STEPS: usize = 50;

const REGISTRATION_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct AgentConfig {
	/// Upper bound on scroll steps per `scrollTo` call.
	pub scroll_max_steps: usize,
	pub log_capacity: usize,
	pub classifier: NodeClassifier,
}

impl Default for AgentConfig {
	fn default() -> Self {
		Self {
			scroll_max_steps: DEFAULT_SCROLL_MAX_STEPS,
			log_capacity: DEFAULT_LOG_CAPACITY,
			classifier: NodeClassifier::default(),
		}
	}
}

/// Target-side entry point: owns the capability registry for the lifetime
/// of the process and dispatches calls against the host's UI.
#[derive(Clone)]
pub struct Agent {
	host: Arc<dyn UiHost>,
	registry: Arc<RwLock<Registry>>,
	dispatcher: Dispatcher,
	logs: LogBuffer,
	registrations: broadcast::Sender<CapabilityName>,
}

impl Agent {
	/// Creates an agent with the built-in capabilities installed.
	pub fn new(host: Arc<dyn UiHost>, config: AgentConfig) -> Result<Self, RegistryError> {
		let registry = Arc::new(RwLock::new(Registry::new()));
		let logs = LogBuffer::new(config.log_capacity);
		builtins::install(
			&registry,
			Arc::clone(&host),
			BuiltinConfig {
				classifier: config.classifier,
				scroll_max_steps: config.scroll_max_steps,
				logs: logs.clone(),
			},
		)?;

		let (registrations, _) = broadcast::channel(REGISTRATION_CAPACITY);
		Ok(Self {
			host,
			dispatcher: Dispatcher::new(Arc::clone(&registry)),
			registry,
			logs,
			registrations,
		})
	}

	/// Routes uncaught handler faults to `sink` instead of the log.
	pub fn with_error_sink(mut self, sink: Arc<dyn HostErrorSink>) -> Self {
		self.dispatcher = self.dispatcher.with_error_sink(sink);
		self
	}

	/// Registers a capability under its display name, e.g. `nav.get`.
	///
	/// Subscribed controllers are told about it straight away.
	pub fn register<F, Fut>(
		&self,
		name: &str,
		description: Option<&str>,
		handler: F,
	) -> Result<CapabilityName, RegistryError>
	where
		F: Fn(Params) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = anyhow::Result<CapabilityResult>> + Send + 'static,
	{
		let name = self.registry.write().register(name, description, handler)?;
		tracing::info!(capability = %name, "capability registered");
		// No receivers just means no controller is listening yet.
		let _ = self.registrations.send(name.clone());
		Ok(name)
	}

	/// User-registered capabilities with their descriptions.
	pub fn list_registered(&self) -> Vec<CapabilityInfo> {
		self.registry.read().list_registered()
	}

	/// Wire names of every capability, built-ins included.
	pub fn wire_names(&self) -> Vec<String> {
		self.registry.read().wire_names()
	}

	/// Queues a call on the agent's dispatch loop; see [`Dispatcher::dispatch`].
	pub fn dispatch(&self, wire_method: &str, params: Params) -> PendingReply {
		self.dispatcher.dispatch(wire_method, params)
	}

	/// Queues host work behind every call issued so far.
	pub fn schedule<F>(&self, work: F) -> PendingReply
	where
		F: Future<Output = Reply> + Send + 'static,
	{
		self.dispatcher.schedule(work)
	}

	pub fn host(&self) -> &Arc<dyn UiHost> {
		&self.host
	}

	pub fn logs(&self) -> &LogBuffer {
		&self.logs
	}

	/// Names registered after this call.
	pub fn subscribe_registrations(&self) -> broadcast::Receiver<CapabilityName> {
		self.registrations.subscribe()
	}
}
