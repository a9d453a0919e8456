//! Wire types for the uibridge service protocol.
//!
//! Shared by both ends of a bridge: the controller-side connector
//! (`uibridge`) and the target-side agent (`uibridge-agent`).
//!
//! - [`jsonrpc`]: JSON-RPC 2.0 envelopes exchanged over the transport
//! - [`service`]: service-level methods, stream events and their payloads
//! - [`capability`]: capability names and the reserved wire prefix
//! - [`fault`]: the reserved fault-code space
//! - [`matcher`]: match criteria and their typed resolution
//! - [`element`]: geometry and element records
//! - [`payload`]: result shapes of the built-in capabilities

pub mod capability;
pub mod element;
pub mod fault;
pub mod jsonrpc;
pub mod matcher;
pub mod payload;
pub mod service;

pub use capability::{CapabilityInfo, CapabilityName, CapabilityNameError, WIRE_PREFIX};
pub use element::{ElementRecord, Point, Rect};
pub use fault::AppErrorCode;
pub use jsonrpc::{Message, Notification, Request, RequestId, Response, RpcError};
pub use matcher::{Criteria, Matcher, MatcherError};
