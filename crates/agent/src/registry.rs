//! Append-only capability registry.
//!
//! Maps display names (`nav.get`) to async handlers. Entries are never
//! removed; registration order is preserved for introspection.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use thiserror::Error;
use uibridge_protocol::{CapabilityInfo, CapabilityName, CapabilityNameError};

use crate::result::{CapabilityResult, Params};

/// Boxed handler future.
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<CapabilityResult>>;

/// Handler function: params → async result.
pub type CapabilityHandler = Arc<dyn Fn(Params) -> HandlerFuture + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
	#[error(transparent)]
	InvalidName(#[from] CapabilityNameError),

	#[error("capability '{0}' is already registered")]
	AlreadyRegistered(String),
}

#[derive(Clone)]
pub struct CapabilityEntry {
	pub name: CapabilityName,
	pub description: Option<String>,
	pub handler: CapabilityHandler,
	/// Built-ins are callable but hidden from [`Registry::list_registered`].
	pub builtin: bool,
}

#[derive(Default)]
pub struct Registry {
	entries: IndexMap<CapabilityName, CapabilityEntry>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a user capability.
	pub fn register<F, Fut>(&mut self, name: &str, description: Option<&str>, handler: F) -> Result<CapabilityName, RegistryError>
	where
		F: Fn(Params) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = anyhow::Result<CapabilityResult>> + Send + 'static,
	{
		self.insert(name, description, box_handler(handler), false)
	}

	/// Registers a built-in capability, bypassing the introspectable list.
	pub fn register_builtin<F, Fut>(&mut self, name: &str, handler: F) -> Result<CapabilityName, RegistryError>
	where
		F: Fn(Params) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = anyhow::Result<CapabilityResult>> + Send + 'static,
	{
		self.insert(name, None, box_handler(handler), true)
	}

	fn insert(
		&mut self,
		name: &str,
		description: Option<&str>,
		handler: CapabilityHandler,
		builtin: bool,
	) -> Result<CapabilityName, RegistryError> {
		let name = CapabilityName::parse(name)?;
		if self.entries.contains_key(&name) {
			return Err(RegistryError::AlreadyRegistered(name.to_string()));
		}

		tracing::debug!(capability = %name, builtin, "registered capability");
		self.entries.insert(
			name.clone(),
			CapabilityEntry {
				name: name.clone(),
				description: description.map(str::to_string),
				handler,
				builtin,
			},
		);
		Ok(name)
	}

	pub fn get(&self, name: &CapabilityName) -> Option<&CapabilityEntry> {
		self.entries.get(name)
	}

	/// User-registered capabilities, in registration order.
	pub fn list_registered(&self) -> Vec<CapabilityInfo> {
		self.entries
			.values()
			.filter(|entry| !entry.builtin)
			.map(|entry| CapabilityInfo {
				name: entry.name.to_string(),
				description: entry.description.clone(),
			})
			.collect()
	}

	/// Wire names of every capability, built-ins included.
	pub fn wire_names(&self) -> Vec<String> {
		self.entries.keys().map(CapabilityName::wire_name).collect()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

fn box_handler<F, Fut>(handler: F) -> CapabilityHandler
where
	F: Fn(Params) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = anyhow::Result<CapabilityResult>> + Send + 'static,
{
	Arc::new(move |params| Box::pin(handler(params)))
}

#[cfg(test)]
mod tests {
	use serde_json::Map;

	use super::*;

	async fn noop(_: Params) -> anyhow::Result<CapabilityResult> {
		Ok(CapabilityResult::success(Map::new()))
	}

	#[test]
	fn rejects_malformed_and_duplicate_names() {
		let mut registry = Registry::new();
		assert_eq!(
			registry.register("", None, noop).unwrap_err(),
			RegistryError::InvalidName(CapabilityNameError::Empty)
		);
		assert!(matches!(
			registry.register("ext.nav.get", None, noop),
			Err(RegistryError::InvalidName(CapabilityNameError::ReservedPrefix(_)))
		));

		registry.register("nav.get", None, noop).unwrap();
		assert_eq!(
			registry.register("nav.get", None, noop).unwrap_err(),
			RegistryError::AlreadyRegistered("nav.get".into())
		);
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn builtins_are_hidden_from_introspection() {
		let mut registry = Registry::new();
		registry.register_builtin("uibridge.ping", noop).unwrap();
		registry.register("nav.get", Some("Current route"), noop).unwrap();
		registry.register("cart.clear", None, noop).unwrap();

		assert_eq!(
			registry.list_registered(),
			vec![
				CapabilityInfo {
					name: "nav.get".into(),
					description: Some("Current route".into()),
				},
				CapabilityInfo {
					name: "cart.clear".into(),
					description: None,
				},
			]
		);
		assert_eq!(
			registry.wire_names(),
			vec!["ext.uibridge.ping", "ext.nav.get", "ext.cart.clear"]
		);
	}
}
