//! Known dynamically-registered capabilities, with per-name waiters.
//!
//! Uses [`DashMap`] so the event listener and callers of
//! [`CapabilityTable::wait_for`] never block each other. A waiter registers
//! its [`Notify`] before checking the known set, so a registration landing in
//! between is never missed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Notify;
use uibridge_protocol::CapabilityName;

#[derive(Default)]
pub(crate) struct CapabilityTable {
	known: DashMap<CapabilityName, ()>,
	waiters: DashMap<CapabilityName, Arc<Notify>>,
	/// Bumped by [`clear`](Self::clear) to release every pending waiter.
	generation: AtomicU64,
}

impl CapabilityTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records a capability and wakes anyone waiting for it.
	pub fn insert(&self, name: CapabilityName) {
		tracing::debug!(capability = %name, "capability known");
		self.known.insert(name.clone(), ());
		if let Some((_, notify)) = self.waiters.remove(&name) {
			notify.notify_waiters();
		}
	}

	#[cfg(test)]
	pub fn contains(&self, name: &CapabilityName) -> bool {
		self.known.contains_key(name)
	}

	pub fn names(&self) -> Vec<CapabilityName> {
		let mut names: Vec<_> = self.known.iter().map(|entry| entry.key().clone()).collect();
		names.sort();
		names
	}

	/// Number of names with at least one pending waiter.
	#[cfg(test)]
	pub fn pending(&self) -> usize {
		self.waiters.len()
	}

	/// Forgets every known capability and resolves pending waiters as not found.
	pub fn clear(&self) {
		self.generation.fetch_add(1, Ordering::SeqCst);
		self.known.clear();
		let waiters: Vec<_> = self.waiters.iter().map(|entry| Arc::clone(entry.value())).collect();
		self.waiters.clear();
		for notify in waiters {
			notify.notify_waiters();
		}
	}

	/// Waits until `name` is known, for at most `timeout`.
	///
	/// Resolves immediately when the name is already known. Returns `None` on
	/// timeout or when the table is cleared, and removes its waiter either way.
	pub async fn wait_for(&self, name: &CapabilityName, timeout: Duration) -> Option<CapabilityName> {
		let generation = self.generation.load(Ordering::SeqCst);
		let deadline = tokio::time::Instant::now() + timeout;

		loop {
			let notify = self
				.waiters
				.entry(name.clone())
				.or_insert_with(|| Arc::new(Notify::new()))
				.clone();
			let notified = notify.notified();

			if self.known.contains_key(name) {
				self.release(name, &notify);
				return Some(name.clone());
			}
			if self.generation.load(Ordering::SeqCst) != generation {
				self.release(name, &notify);
				return None;
			}

			let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
			if remaining.is_zero() {
				self.release(name, &notify);
				return None;
			}

			tokio::select! {
				biased;
				_ = notified => {}
				_ = tokio::time::sleep(remaining) => {
					self.release(name, &notify);
					tracing::debug!(capability = %name, "capability did not register in time");
					return None;
				}
			}
		}
	}

	/// Drops the shared waiter entry once no other caller holds it.
	fn release(&self, name: &CapabilityName, notify: &Arc<Notify>) {
		// One reference is ours, one is the map's.
		self.waiters
			.remove_if(name, |_, entry| Arc::ptr_eq(entry, notify) && Arc::strong_count(entry) <= 2);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn name(value: &str) -> CapabilityName {
		CapabilityName::parse(value).unwrap()
	}

	#[tokio::test]
	async fn known_name_resolves_immediately() {
		let table = CapabilityTable::new();
		table.insert(name("nav.get"));
		assert_eq!(table.wait_for(&name("nav.get"), Duration::ZERO).await, Some(name("nav.get")));
		assert_eq!(table.pending(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn times_out_and_removes_waiter() {
		let table = CapabilityTable::new();
		let started = tokio::time::Instant::now();
		assert_eq!(table.wait_for(&name("x"), Duration::from_millis(100)).await, None);
		let elapsed = started.elapsed();
		assert!(elapsed >= Duration::from_millis(100) && elapsed < Duration::from_millis(110), "{elapsed:?}");
		assert_eq!(table.pending(), 0);

		// A late registration has nobody left to wake.
		table.insert(name("x"));
		assert!(table.contains(&name("x")));
		assert_eq!(table.pending(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn registration_wakes_waiter() {
		let table = Arc::new(CapabilityTable::new());
		let waiter = {
			let table = Arc::clone(&table);
			tokio::spawn(async move { table.wait_for(&name("cart.clear"), Duration::from_secs(1)).await })
		};
		tokio::task::yield_now().await;
		assert_eq!(table.pending(), 1);

		table.insert(name("cart.clear"));
		assert_eq!(waiter.await.unwrap(), Some(name("cart.clear")));
		assert_eq!(table.pending(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn unrelated_registration_does_not_resolve() {
		let table = Arc::new(CapabilityTable::new());
		let waiter = {
			let table = Arc::clone(&table);
			tokio::spawn(async move { table.wait_for(&name("a"), Duration::from_millis(50)).await })
		};
		tokio::task::yield_now().await;
		table.insert(name("b"));
		assert_eq!(waiter.await.unwrap(), None);
	}

	#[tokio::test(start_paused = true)]
	async fn clear_releases_waiters_as_not_found() {
		let table = Arc::new(CapabilityTable::new());
		table.insert(name("a"));
		let waiter = {
			let table = Arc::clone(&table);
			tokio::spawn(async move { table.wait_for(&name("b"), Duration::from_secs(60)).await })
		};
		tokio::task::yield_now().await;

		table.clear();
		assert_eq!(waiter.await.unwrap(), None);
		assert!(!table.contains(&name("a")));
		assert_eq!(table.pending(), 0);
	}
}
