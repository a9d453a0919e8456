//! uibridge runtime: transports and JSON-RPC connection.
//!
//! This crate provides the low-level plumbing shared by the controller-side
//! connector and the target-side service host:
//!
//! - **Transport**: bidirectional JSON frames over WebSocket or an in-memory channel
//! - **Connection**: request/response correlation and notification fan-out
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │   uibridge   │  Connector, waiter, typed tool wrappers
//! └──────┬───────┘
//! ┌──────▼───────┐
//! │   runtime    │  This crate
//! │  ┌────────┐  │
//! │  │ Conn   │  │  JSON-RPC correlation, stream notifications
//! │  └────────┘  │
//! │  ┌────────┐  │
//! │  │ Trans  │  │  WebSocket / channel transport
//! │  └────────┘  │
//! └──────────────┘
//! ```

pub mod connection;
pub mod error;
pub mod transport;

pub use connection::Connection;
pub use error::{Error, Result};
pub use transport::{
	ChannelTransport, TransportParts, TransportReceiver, TransportSender, WebSocketTransport, normalize_endpoint,
};
