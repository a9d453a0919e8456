use std::time::Duration;

use uibridge_protocol::capability::builtin;

/// Default wait for a dynamically registered capability.
pub const DEFAULT_WAITER_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
	/// Upper bound for [`Connector::wait_for`](crate::Connector::wait_for) when
	/// no explicit timeout is given.
	pub waiter_timeout: Duration,
	/// How long hot reload waits for the alternate capability before falling
	/// back to the built-in reload.
	pub hot_reload_probe_timeout: Duration,
	/// Capability whose presence marks the execution context to use.
	pub liveness_capability: String,
	pub hot_reload_capability: String,
}

impl Default for ConnectorConfig {
	fn default() -> Self {
		Self {
			waiter_timeout: DEFAULT_WAITER_TIMEOUT,
			hot_reload_probe_timeout: DEFAULT_WAITER_TIMEOUT,
			liveness_capability: builtin::PING.to_string(),
			hot_reload_capability: builtin::HOT_RELOAD.to_string(),
		}
	}
}
