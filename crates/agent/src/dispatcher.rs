//! Capability dispatch.
//!
//! [`Dispatcher::dispatch`] never runs a handler inside the caller's unit of
//! work. Calls are queued to a single drain task living on the caller's
//! [`LocalSet`](tokio::task::LocalSet), so a handler starts only once the
//! caller's thread yields, calls start in the order they were issued, and no
//! two handlers ever run at the same time. The returned [`PendingReply`]
//! resolves to the wire reply, already normalized:
//!
//! | handler outcome | reply |
//! |---|---|
//! | `Success(data)` | `data` tagged with type, method and status markers |
//! | `Error { code, .. }` | fault at `code.wire_code()` |
//! | `InvalidParams` / `Err(ParamError)` | fault `INVALID_PARAMS` |
//! | any other `Err`, or a panic | fault `INTERNAL_ERROR`, also reported to the host error channel |

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value, json};
use tokio::sync::{mpsc, oneshot};
use uibridge_protocol::fault::{INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND};
use uibridge_protocol::payload::{METHOD_FIELD, RESPONSE_TYPE, STATUS_FIELD, STATUS_SUCCESS, TYPE_FIELD};
use uibridge_protocol::{CapabilityName, RpcError};

use crate::registry::Registry;
use crate::result::{CapabilityResult, ParamError, Params};

/// Wire reply of one dispatch.
pub type Reply = Result<Value, RpcError>;

/// An uncaught handler fault, as delivered to the host error channel.
#[derive(Debug, Clone)]
pub struct HostErrorReport {
	pub method: String,
	pub exception: String,
	pub context: String,
}

/// Host-level error channel receiving every uncaught handler fault.
pub trait HostErrorSink: Send + Sync {
	fn report(&self, report: &HostErrorReport);
}

impl<F> HostErrorSink for F
where
	F: Fn(&HostErrorReport) + Send + Sync,
{
	fn report(&self, report: &HostErrorReport) {
		self(report)
	}
}

/// Default sink: logs the report.
pub struct TracingErrorSink;

impl HostErrorSink for TracingErrorSink {
	fn report(&self, report: &HostErrorReport) {
		tracing::error!(
			method = %report.method,
			exception = %report.exception,
			context = %report.context,
			"uncaught capability fault"
		);
	}
}

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Future of a dispatched capability call.
pub struct PendingReply {
	reply: oneshot::Receiver<Reply>,
}

impl Future for PendingReply {
	type Output = Reply;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.reply).poll(cx) {
			Poll::Ready(Ok(reply)) => Poll::Ready(reply),
			// The drain task went away with its LocalSet.
			Poll::Ready(Err(_)) => Poll::Ready(Err(RpcError::new(INTERNAL_ERROR, "capability dispatch loop stopped"))),
			Poll::Pending => Poll::Pending,
		}
	}
}

#[derive(Clone)]
pub struct Dispatcher {
	registry: Arc<RwLock<Registry>>,
	error_sink: Arc<dyn HostErrorSink>,
	queue: Arc<Mutex<Option<mpsc::UnboundedSender<Job>>>>,
}

impl Dispatcher {
	pub fn new(registry: Arc<RwLock<Registry>>) -> Self {
		Self {
			registry,
			error_sink: Arc::new(TracingErrorSink),
			queue: Arc::new(Mutex::new(None)),
		}
	}

	pub fn with_error_sink(mut self, sink: Arc<dyn HostErrorSink>) -> Self {
		self.error_sink = sink;
		self
	}

	/// Queues `work` behind every call issued before it.
	///
	/// # Panics
	///
	/// Panics when called outside a [`LocalSet`](tokio::task::LocalSet) and no
	/// drain task is running yet.
	pub fn schedule<F>(&self, work: F) -> PendingReply
	where
		F: Future<Output = Reply> + Send + 'static,
	{
		let (tx, reply) = oneshot::channel();
		self.enqueue(Box::pin(async move {
			// The caller may have stopped waiting.
			let _ = tx.send(work.await);
		}));
		PendingReply { reply }
	}

	fn enqueue(&self, job: Job) {
		let mut slot = self.queue.lock();
		let job = match slot.as_ref() {
			Some(queue) => match queue.send(job) {
				Ok(()) => return,
				Err(mpsc::error::SendError(job)) => job,
			},
			None => job,
		};

		let (queue, jobs) = mpsc::unbounded_channel();
		tokio::task::spawn_local(drain(jobs));
		let _ = queue.send(job);
		*slot = Some(queue);
	}

	/// Schedules the capability addressed by `wire_method`.
	///
	/// # Panics
	///
	/// See [`schedule`](Self::schedule).
	pub fn dispatch(&self, wire_method: &str, params: Params) -> PendingReply {
		let target = CapabilityName::from_wire(wire_method)
			.and_then(|name| self.registry.read().get(&name).map(|entry| (name, Arc::clone(&entry.handler))));
		let error_sink = Arc::clone(&self.error_sink);
		let wire_method = wire_method.to_string();

		self.schedule(async move {
			let Some((name, handler)) = target else {
				return Err(RpcError::new(METHOD_NOT_FOUND, format!("unknown capability '{wire_method}'")));
			};

			tracing::debug!(capability = %name, "invoking capability");
			let outcome = AssertUnwindSafe(async move { handler(params).await })
				.catch_unwind()
				.await;

			match outcome {
				Ok(Ok(result)) => encode_result(&name, result),
				Ok(Err(err)) => match err.downcast_ref::<ParamError>() {
					Some(param_error) => Err(RpcError::new(INVALID_PARAMS, param_error.to_string())),
					None => Err(uncaught(&*error_sink, &name, err.to_string(), format!("{err:?}"))),
				},
				Err(panic) => Err(uncaught(
					&*error_sink,
					&name,
					panic_message(panic.as_ref()),
					"panic in capability handler".to_string(),
				)),
			}
		})
	}
}

/// Runs queued jobs one at a time, in queue order.
async fn drain(mut jobs: mpsc::UnboundedReceiver<Job>) {
	while let Some(job) = jobs.recv().await {
		job.await;
	}
}

fn encode_result(name: &CapabilityName, result: CapabilityResult) -> Reply {
	match result {
		CapabilityResult::Success(data) => Ok(Value::Object(tag_success(name, data))),
		CapabilityResult::Error { code, message } => Err(RpcError::new(code.wire_code(), message)),
		CapabilityResult::InvalidParams(message) => Err(RpcError::new(INVALID_PARAMS, message)),
	}
}

fn tag_success(name: &CapabilityName, data: Map<String, Value>) -> Map<String, Value> {
	let mut payload = Map::with_capacity(data.len() + 3);
	payload.insert(TYPE_FIELD.to_string(), Value::from(RESPONSE_TYPE));
	payload.insert(METHOD_FIELD.to_string(), Value::from(name.as_str()));
	payload.insert(STATUS_FIELD.to_string(), Value::from(STATUS_SUCCESS));
	for (key, value) in data {
		if payload.contains_key(&key) {
			tracing::warn!(capability = %name, field = %key, "dropping result field that shadows a response marker");
			continue;
		}
		payload.insert(key, value);
	}
	payload
}

fn uncaught(sink: &dyn HostErrorSink, name: &CapabilityName, exception: String, context: String) -> RpcError {
	let report = HostErrorReport {
		method: name.to_string(),
		exception,
		context,
	};
	sink.report(&report);

	let detail = json!({
		"exception": report.exception,
		"context": report.context,
		"method": report.method,
	});
	RpcError::new(INTERNAL_ERROR, detail.to_string()).with_data(detail)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
	if let Some(message) = panic.downcast_ref::<&str>() {
		message.to_string()
	} else if let Some(message) = panic.downcast_ref::<String>() {
		message.clone()
	} else {
		"unknown panic payload".to_string()
	}
}
