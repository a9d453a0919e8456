//! Serves the wire protocol for one execution context.
//!
//! A [`ServiceHost`] answers context discovery, stream subscription and
//! `reloadSources` itself, and hands every `ext.…` call to the agent's
//! dispatcher. Capability calls and reloads share the agent's dispatch loop,
//! so they start in the order they arrive and never overlap; replies are
//! written as they complete.
//!
//! [`ServiceHost::serve`] and [`ServiceHost::serve_websocket`] must run inside
//! a [`LocalSet`](tokio::task::LocalSet), the same one the host's UI work runs
//! on.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use uibridge_protocol::fault::{CONTEXT_NOT_FOUND, INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND};
use uibridge_protocol::service::{
	CONTEXT_ID_PARAM, ContextInfo, ContextList, ContextSummary, EXTENSION_STREAM, StreamEvent, StreamNotification, method,
};
use uibridge_protocol::{CapabilityName, Message, Notification, Request, RequestId, Response, RpcError, WIRE_PREFIX};
use uibridge_runtime::{TransportParts, WebSocketTransport};

use crate::agent::Agent;
use crate::dispatcher::PendingReply;

pub const DEFAULT_CONTEXT_ID: &str = "context/1";
pub const DEFAULT_CONTEXT_NAME: &str = "main";

type Outbound = mpsc::UnboundedSender<Value>;

#[derive(Clone)]
pub struct ServiceHost {
	agent: Agent,
	context: ContextSummary,
}

/// Per-connection subscription state.
#[derive(Default)]
struct Session {
	listening: bool,
}

impl ServiceHost {
	pub fn new(agent: Agent) -> Self {
		Self {
			agent,
			context: ContextSummary {
				id: DEFAULT_CONTEXT_ID.to_string(),
				name: DEFAULT_CONTEXT_NAME.to_string(),
			},
		}
	}

	pub fn with_context(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
		self.context = ContextSummary {
			id: id.into(),
			name: name.into(),
		};
		self
	}

	pub fn context_id(&self) -> &str {
		&self.context.id
	}

	pub fn agent(&self) -> &Agent {
		&self.agent
	}

	/// Serves one peer until its transport closes.
	pub async fn serve(&self, parts: TransportParts) -> uibridge_runtime::Result<()> {
		let TransportParts {
			mut sender,
			receiver,
			mut message_rx,
		} = parts;

		let reader = tokio::spawn(receiver.run());
		let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Value>();
		let writer = tokio::spawn(async move {
			while let Some(frame) = out_rx.recv().await {
				if let Err(e) = sender.send(frame).await {
					tracing::warn!("Transport write error: {}", e);
					break;
				}
			}
			let _ = sender.close().await;
		});

		let mut registrations = self.agent.subscribe_registrations();
		let mut registrations_open = true;
		let mut session = Session::default();
		tracing::info!(context = %self.context.id, "peer attached");

		loop {
			tokio::select! {
				// Registration events drain before the next request is read.
				biased;

				registered = registrations.recv(), if registrations_open => match registered {
					Ok(name) if session.listening => self.announce(&name, &out_tx),
					Ok(_) => {}
					Err(broadcast::error::RecvError::Lagged(missed)) => {
						tracing::warn!(missed, "dropped capability registration events");
					}
					Err(broadcast::error::RecvError::Closed) => registrations_open = false,
				},
				frame = message_rx.recv() => {
					let Some(frame) = frame else { break };
					match serde_json::from_value::<Message>(frame) {
						Ok(Message::Request(request)) => self.handle_request(request, &mut session, &out_tx),
						Ok(other) => tracing::debug!(?other, "ignoring non-request frame"),
						Err(e) => tracing::warn!("Failed to parse frame: {}", e),
					}
				}
			}
		}

		tracing::info!(context = %self.context.id, "peer detached");
		drop(out_tx);
		writer.abort();
		match reader.await {
			Ok(result) => result,
			Err(_) => Ok(()),
		}
	}

	/// Accepts WebSocket peers on `listener` and serves each on its own local task.
	pub async fn serve_websocket(&self, listener: TcpListener) -> std::io::Result<()> {
		loop {
			let (stream, peer) = listener.accept().await?;
			let host = self.clone();
			tokio::task::spawn_local(async move {
				match tokio_tungstenite::accept_async(stream).await {
					Ok(socket) => {
						if let Err(e) = host.serve(WebSocketTransport::from_stream(socket)).await {
							tracing::warn!(%peer, "peer session ended with error: {}", e);
						}
					}
					Err(e) => tracing::warn!(%peer, "WebSocket handshake failed: {}", e),
				}
			});
		}
	}

	fn handle_request(&self, request: Request, session: &mut Session, out: &Outbound) {
		let Request {
			id,
			method: name,
			params,
			..
		} = request;
		tracing::debug!(id, method = %name, "received request");

		let mut params = match params {
			Value::Object(map) => map,
			Value::Null => Map::new(),
			_ => {
				reply(out, id, Err(RpcError::new(INVALID_PARAMS, "params must be an object")));
				return;
			}
		};

		let result = match name.as_str() {
			method::LIST_CONTEXTS => encode(&ContextList {
				contexts: vec![self.context.clone()],
			}),
			method::GET_CONTEXT => self.check_context(&params).and_then(|()| {
				encode(&ContextInfo {
					id: self.context.id.clone(),
					name: self.context.name.clone(),
					capabilities: self.agent.wire_names(),
				})
			}),
			method::STREAM_LISTEN => check_stream(&params).map(|()| {
				session.listening = true;
				json!({ "type": "Success" })
			}),
			method::STREAM_CANCEL => check_stream(&params).map(|()| {
				session.listening = false;
				json!({ "type": "Success" })
			}),
			method::RELOAD_SOURCES => {
				if let Err(err) = self.check_context(&params) {
					reply(out, id, Err(err));
					return;
				}
				let host = Arc::clone(self.agent.host());
				let pending = self.agent.schedule(async move {
					match host.reload_sources().await {
						Ok(report) => encode(&report),
						Err(err) => Err(RpcError::new(INTERNAL_ERROR, format!("reload failed: {err}"))),
					}
				});
				forward(out, id, pending);
				return;
			}
			wire if wire.starts_with(WIRE_PREFIX) => {
				if let Err(err) = self.check_context(&params) {
					reply(out, id, Err(err));
					return;
				}
				params.remove(CONTEXT_ID_PARAM);
				forward(out, id, self.agent.dispatch(wire, params));
				return;
			}
			other => Err(RpcError::new(METHOD_NOT_FOUND, format!("unknown method '{other}'"))),
		};
		reply(out, id, result);
	}

	fn announce(&self, name: &CapabilityName, out: &Outbound) {
		let event = StreamNotification {
			stream_id: EXTENSION_STREAM.to_string(),
			event: StreamEvent::CapabilityRegistered {
				context_id: self.context.id.clone(),
				capability: name.wire_name(),
			},
		};
		match serde_json::to_value(&event) {
			Ok(params) => send(out, &Notification::new(method::STREAM_NOTIFY, params)),
			Err(e) => tracing::warn!("Failed to encode stream event: {}", e),
		}
	}

	fn check_context(&self, params: &Map<String, Value>) -> Result<(), RpcError> {
		match params.get(CONTEXT_ID_PARAM).and_then(Value::as_str) {
			Some(id) if id == self.context.id => Ok(()),
			Some(id) => Err(RpcError::new(CONTEXT_NOT_FOUND, format!("unknown context '{id}'"))),
			None => Err(RpcError::new(INVALID_PARAMS, format!("missing '{CONTEXT_ID_PARAM}'"))),
		}
	}
}

fn check_stream(params: &Map<String, Value>) -> Result<(), RpcError> {
	match params.get("streamId").and_then(Value::as_str) {
		Some(EXTENSION_STREAM) => Ok(()),
		Some(other) => Err(RpcError::new(INVALID_PARAMS, format!("unknown stream '{other}'"))),
		None => Err(RpcError::new(INVALID_PARAMS, "missing 'streamId'")),
	}
}

fn encode<T: Serialize>(value: &T) -> Result<Value, RpcError> {
	serde_json::to_value(value).map_err(|e| RpcError::new(INTERNAL_ERROR, format!("failed to encode result: {e}")))
}

/// Writes the reply once the dispatch loop has produced it.
fn forward(out: &Outbound, id: RequestId, pending: PendingReply) {
	let out = out.clone();
	tokio::spawn(async move {
		reply(&out, id, pending.await);
	});
}

fn reply(out: &Outbound, id: RequestId, result: Result<Value, RpcError>) {
	let response = match result {
		Ok(value) => Response::success(id, value),
		Err(error) => Response::failure(id, error),
	};
	send(out, &response);
}

fn send<T: Serialize>(out: &Outbound, frame: &T) {
	match serde_json::to_value(frame) {
		Ok(value) => {
			// The writer is gone once the peer detached.
			let _ = out.send(value);
		}
		Err(e) => tracing::warn!("Failed to encode frame: {}", e),
	}
}
