//! uibridge: drive a live UI from the outside.
//!
//! A [`Connector`] attaches to a target running the uibridge agent, picks the
//! execution context that answers the liveness capability and invokes
//! capabilities in it, built-in or registered by the application.
//!
//! ```no_run
//! use serde_json::{Map, json};
//! use uibridge::{Connector, ConnectorConfig};
//!
//! # async fn run() -> uibridge::Result<()> {
//! let connector = Connector::new(ConnectorConfig::default());
//! connector.connect("ws://127.0.0.1:8181/ws").await?;
//!
//! let elements = connector.list_elements().await?;
//! println!("{} interactive elements", elements.len());
//!
//! let mut criteria = Map::new();
//! criteria.insert("key".into(), json!("submit"));
//! connector.tap(criteria).await?;
//!
//! connector.disconnect().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connector;
pub mod error;
mod tools;

pub use config::{ConnectorConfig, DEFAULT_WAITER_TIMEOUT};
pub use connector::{ChannelDialer, ConnectionState, Connector, Dialer, HotReloadOutcome, WebSocketDialer};
pub use error::{Error, ErrorClass, Result};
pub use uibridge_protocol::payload::{ActionOutcome, LogEntry};
pub use uibridge_protocol::{CapabilityInfo, CapabilityName, Criteria, ElementRecord, Rect};
