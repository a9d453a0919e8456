//! uibridge agent: the target side of a bridge.
//!
//! Runs inside the process under automation. The embedding toolkit implements
//! [`UiHost`] and [`UiNode`]; the agent then serves:
//!
//! - a capability [`Registry`] and [`Dispatcher`] for named async handlers
//! - the built-in capabilities: element listing, tap, text entry,
//!   scroll-to, log capture, screenshots and introspection
//! - a [`ServiceHost`] speaking the wire protocol over any runtime transport
//!
//! ```ignore
//! let agent = Agent::new(host, AgentConfig::default())?;
//! agent.register("nav.get", Some("Current route"), |_| async {
//!     Ok(CapabilityResult::from_payload(&json!({ "route": "/home" }))?)
//! })?;
//! // Capability calls run on the LocalSet that drives the host's UI work.
//! LocalSet::new()
//!     .run_until(ServiceHost::new(agent).serve_websocket(listener))
//!     .await?;
//! ```

mod agent;
mod builtins;
pub mod dispatcher;
mod host;
mod logs;
pub mod registry;
mod result;
pub mod service;
pub mod simulate;
pub mod tree;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use agent::{Agent, AgentConfig, DEFAULT_SCROLL_MAX_STEPS};
pub use dispatcher::{Dispatcher, HostErrorReport, HostErrorSink, PendingReply, TracingErrorSink};
pub use host::UiHost;
pub use logs::{DEFAULT_LOG_CAPACITY, LogBuffer};
pub use registry::{CapabilityHandler, Registry, RegistryError};
pub use result::{CapabilityResult, ParamError, Params, optional_bool, required_str};
pub use service::ServiceHost;
pub use tree::{NodeClassifier, NodeKey, NodeProperty, NodeRef, Scrollable, TextInput, UiNode};
