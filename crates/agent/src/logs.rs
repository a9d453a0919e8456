//! Bounded in-process log capture.
//!
//! Logging adapters append lines; the `getLogs` capability hands out a copy.
//! Once full, the oldest entries are dropped.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use uibridge_protocol::payload::LogEntry;

pub const DEFAULT_LOG_CAPACITY: usize = 500;

#[derive(Clone)]
pub struct LogBuffer {
	inner: Arc<Mutex<LogRing>>,
}

struct LogRing {
	entries: VecDeque<LogEntry>,
	capacity: usize,
	next_sequence: u64,
}

impl Default for LogBuffer {
	fn default() -> Self {
		Self::new(DEFAULT_LOG_CAPACITY)
	}
}

impl LogBuffer {
	pub fn new(capacity: usize) -> Self {
		let capacity = capacity.max(1);
		Self {
			inner: Arc::new(Mutex::new(LogRing {
				entries: VecDeque::with_capacity(capacity),
				capacity,
				next_sequence: 0,
			})),
		}
	}

	pub fn append(&self, level: impl Into<String>, message: impl Into<String>) {
		let mut ring = self.inner.lock();
		if ring.entries.len() == ring.capacity {
			ring.entries.pop_front();
		}
		let sequence = ring.next_sequence;
		ring.next_sequence += 1;
		ring.entries.push_back(LogEntry {
			sequence,
			timestamp_ms: now_ms(),
			level: level.into(),
			message: message.into(),
		});
	}

	/// Retained entries, oldest first.
	pub fn snapshot(&self) -> Vec<LogEntry> {
		self.inner.lock().entries.iter().cloned().collect()
	}

	/// Returns the retained entries and empties the buffer. Sequence numbers
	/// keep counting.
	pub fn drain(&self) -> Vec<LogEntry> {
		self.inner.lock().entries.drain(..).collect()
	}

	pub fn len(&self) -> usize {
		self.inner.lock().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

fn now_ms() -> i64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|elapsed| elapsed.as_millis() as i64)
		.unwrap_or_default()
}
