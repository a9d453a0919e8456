//! JSON-RPC connection layer.
//!
//! Implements request/response correlation on top of a transport:
//! - Generating sequential request IDs
//! - Correlating responses with pending requests
//! - Fanning out notifications (stream events) to subscribers
//! - Failing every pending request when the transport goes away
//!
//! # Message Flow
//!
//! 1. Caller invokes [`Connection::send_message`] with a method and params
//! 2. Connection assigns an ID and parks a oneshot sender in the callback map
//! 3. The request is queued for the writer task
//! 4. The run loop receives the response from the transport
//! 5. The response is correlated by ID and delivered through the oneshot
//!
//! Reading and writing run on separate tasks, so a subscriber consuming
//! notifications never blocks an in-flight request.


use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::task::{Context, Poll};

use serde_json::Value;
use tokio::sync::Mutex as TokioMutex;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use uibridge_protocol::jsonrpc::{Message, Notification, Request, RequestId, RpcError};

use crate::error::{Error, Result};
use crate::transport::{TransportParts, TransportReceiver, TransportSender};

/// Notifications buffered per subscriber before it starts lagging.
const NOTIFICATION_CAPACITY: usize = 256;

/// Pending request callbacks keyed by request ID.
type CallbackMap = Arc<TokioMutex<HashMap<RequestId, oneshot::Sender<Result<Value>>>>>;

/// RAII guard ensuring callback cleanup when a request future is dropped.
struct CancelGuard {
	id: RequestId,
	callbacks: CallbackMap,
	completed: bool,
}

impl CancelGuard {
	fn new(id: RequestId, callbacks: CallbackMap) -> Self {
		Self {
			id,
			callbacks,
			completed: false,
		}
	}

	fn complete(&mut self) {
		self.completed = true;
	}
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if self.completed {
			return;
		}

		let id = self.id;
		let callbacks = Arc::clone(&self.callbacks);

		if let Ok(handle) = tokio::runtime::Handle::try_current() {
			handle.spawn(async move {
				if callbacks.lock().await.remove(&id).is_some() {
					tracing::debug!(id, "CancelGuard: removed orphaned callback");
				}
			});
		}
	}
}

/// Future returned by [`Connection::send_message`] with automatic cancellation cleanup.
struct ResponseFuture {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Value>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.complete();
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// JSON-RPC connection to a target.
///
/// Create with [`Connection::new`], spawn [`Connection::run`], then issue
/// requests with [`Connection::send_message`] from any task.
pub struct Connection {
	/// Sequential request ID counter
	last_id: AtomicU64,
	/// Pending request callbacks keyed by request ID
	callbacks: CallbackMap,
	/// Channel for sending outbound messages to the writer task
	outbound_tx: mpsc::UnboundedSender<Value>,
	/// Transport parts, taken once by run()
	transport_sender: TokioMutex<Option<Box<dyn TransportSender>>>,
	transport_receiver: TokioMutex<Option<Box<dyn TransportReceiver>>>,
	message_rx: TokioMutex<Option<mpsc::UnboundedReceiver<Value>>>,
	outbound_rx: TokioMutex<Option<mpsc::UnboundedReceiver<Value>>>,
	/// Fan-out of stream notifications
	notifications: broadcast::Sender<Notification>,
	/// Flipped once by close() or when the transport ends
	shutdown: watch::Sender<bool>,
	closed: AtomicBool,
}

impl Connection {
	/// Create a new Connection over the given transport.
	pub fn new(parts: TransportParts) -> Self {
		let TransportParts {
			sender,
			receiver,
			message_rx,
		} = parts;

		let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
		let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
		let (shutdown, _) = watch::channel(false);

		Self {
			last_id: AtomicU64::new(0),
			callbacks: Arc::new(TokioMutex::new(HashMap::new())),
			outbound_tx,
			transport_sender: TokioMutex::new(Some(sender)),
			transport_receiver: TokioMutex::new(Some(receiver)),
			message_rx: TokioMutex::new(Some(message_rx)),
			outbound_rx: TokioMutex::new(Some(outbound_rx)),
			notifications,
			shutdown,
			closed: AtomicBool::new(false),
		}
	}

	/// Subscribe to stream notifications.
	///
	/// Only notifications received after this call are delivered.
	pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
		self.notifications.subscribe()
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}

	/// Sends a request and awaits the correlated response.
	///
	/// A fault returned by the target becomes [`Error::Remote`]. If the
	/// transport goes away first, the call fails with [`Error::ChannelClosed`].
	pub async fn send_message(&self, method: &str, params: Value) -> Result<Value> {
		if self.is_closed() {
			return Err(Error::ChannelClosed);
		}

		let id = self.last_id.fetch_add(1, Ordering::SeqCst);
		tracing::debug!(id, method, "sending request");

		let (tx, rx) = oneshot::channel();
		self.callbacks.lock().await.insert(id, tx);
		let guard = CancelGuard::new(id, Arc::clone(&self.callbacks));

		// run() may have drained the callback map between the check above and
		// the insert; never leave a request parked on a dead connection.
		if self.is_closed() {
			return Err(Error::ChannelClosed);
		}

		let request_value = serde_json::to_value(Request::new(id, method, params))?;
		if self.outbound_tx.send(request_value).is_err() {
			tracing::error!("Failed to queue message: outbound channel closed");
			return Err(Error::ChannelClosed);
		}

		ResponseFuture { rx, guard }.await
	}

	/// Closes the transport and fails every pending request. Idempotent.
	pub fn close(&self) {
		self.closed.store(true, Ordering::SeqCst);
		self.shutdown.send_replace(true);
	}

	/// Run the message dispatch loop until the transport ends or [`close`](Self::close) is called.
	pub async fn run(self: &Arc<Self>) {
		let (Some(transport_receiver), Some(mut transport_sender), Some(mut outbound_rx), Some(mut message_rx)) = (
			self.transport_receiver.lock().await.take(),
			self.transport_sender.lock().await.take(),
			self.outbound_rx.lock().await.take(),
			self.message_rx.lock().await.take(),
		) else {
			tracing::error!("run() can only be called once");
			return;
		};

		let reader_handle = tokio::spawn(async move {
			if let Err(e) = transport_receiver.run().await {
				tracing::error!("Transport read error: {}", e);
			}
		});

		let mut writer_shutdown = self.shutdown.subscribe();
		let writer_handle = tokio::spawn(async move {
			loop {
				tokio::select! {
					message = outbound_rx.recv() => {
						let Some(message) = message else { break };
						if let Err(e) = transport_sender.send(message).await {
							tracing::error!("Transport write error: {}", e);
							break;
						}
					}
					// The watch::Ref is not Send; drop it inside the branch.
					_ = async { let _ = writer_shutdown.wait_for(|closed| *closed).await; } => break,
				}
			}
			if let Err(e) = transport_sender.close().await {
				tracing::debug!("Transport close error: {}", e);
			}
		});

		let mut shutdown = self.shutdown.subscribe();
		loop {
			tokio::select! {
				message = message_rx.recv() => {
					let Some(message_value) = message else {
						tracing::debug!("transport ended");
						break;
					};
					match serde_json::from_value::<Message>(message_value) {
						Ok(message) => {
							if let Err(e) = self.dispatch_internal(message).await {
								tracing::error!("Error dispatching message: {}", e);
							}
						}
						Err(e) => tracing::error!("Failed to parse message: {}", e),
					}
				}
				_ = async { let _ = shutdown.wait_for(|closed| *closed).await; } => break,
			}
		}

		self.closed.store(true, Ordering::SeqCst);
		self.shutdown.send_replace(true);
		let _ = writer_handle.await;
		reader_handle.abort();
		self.fail_pending().await;
	}

	async fn fail_pending(&self) {
		let pending: Vec<_> = self.callbacks.lock().await.drain().collect();
		if !pending.is_empty() {
			tracing::debug!(count = pending.len(), "failing pending requests on closed connection");
		}
		for (_, callback) in pending {
			let _ = callback.send(Err(Error::ChannelClosed));
		}
	}

	/// Dispatch an incoming message (test-only public version)
	#[cfg(test)]
	pub async fn dispatch(self: &Arc<Self>, message: Message) -> Result<()> {
		self.dispatch_internal(message).await
	}

	async fn dispatch_internal(&self, message: Message) -> Result<()> {
		match message {
			Message::Response(response) => {
				tracing::debug!(id = response.id, "received response");
				let callback = self.callbacks.lock().await.remove(&response.id).ok_or_else(|| {
					Error::ProtocolError(format!("Cannot find request to respond: id={}", response.id))
				})?;

				let result = match response.error {
					Some(error) => Err(parse_remote_error(error)),
					None => Ok(response.result.unwrap_or(Value::Null)),
				};

				let _ = callback.send(result);
				Ok(())
			}
			Message::Notification(notification) => {
				tracing::debug!(method = %notification.method, "received notification");
				// No subscribers is not an error.
				let _ = self.notifications.send(notification);
				Ok(())
			}
			Message::Request(request) => {
				tracing::debug!(method = %request.method, "ignoring request from target");
				Ok(())
			}
			Message::Unknown(value) => {
				tracing::debug!(
					"Unknown message type (forward-compatible, ignored): {}",
					serde_json::to_string(&value).unwrap_or_else(|_| "<serialization failed>".to_string())
				);
				Ok(())
			}
		}
	}
}

/// Converts a wire fault into [`Error::Remote`].
fn parse_remote_error(error: RpcError) -> Error {
	Error::Remote {
		code: error.code,
		message: error.message,
		data: error.data,
	}
}
