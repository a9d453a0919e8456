//! Built-in capabilities every agent serves.
//!
//! They are registered as built-ins, so they answer calls but stay out of
//! `listCapabilities`.

use std::future::Future;
use std::sync::{Arc, Weak};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use uibridge_protocol::capability::builtin;
use uibridge_protocol::fault::codes;
use uibridge_protocol::Matcher;
use uibridge_protocol::payload::{CapabilityList, ElementList, LogList, ScreenshotList};

use crate::host::UiHost;
use crate::logs::LogBuffer;
use crate::registry::{Registry, RegistryError};
use crate::result::{CapabilityResult, ParamError, Params, optional_bool, required_str};
use crate::simulate::{self, into_capability_result};
use crate::tree::{NodeClassifier, enumerate_interactive};

struct Builtins {
	host: Arc<dyn UiHost>,
	classifier: NodeClassifier,
	scroll_max_steps: usize,
	logs: LogBuffer,
	registry: Weak<RwLock<Registry>>,
}

pub(crate) struct BuiltinConfig {
	pub classifier: NodeClassifier,
	pub scroll_max_steps: usize,
	pub logs: LogBuffer,
}

pub(crate) fn install(
	registry: &Arc<RwLock<Registry>>,
	host: Arc<dyn UiHost>,
	config: BuiltinConfig,
) -> Result<(), RegistryError> {
	let builtins = Arc::new(Builtins {
		host,
		classifier: config.classifier,
		scroll_max_steps: config.scroll_max_steps,
		logs: config.logs,
		registry: Arc::downgrade(registry),
	});

	let mut table = registry.write();
	table.register_builtin(builtin::PING, |_| async {
		let mut data = Map::new();
		data.insert("alive".to_string(), Value::Bool(true));
		Ok(CapabilityResult::success(data))
	})?;
	add(&mut table, builtin::LIST_ELEMENTS, &builtins, Builtins::list_elements)?;
	add(&mut table, builtin::TAP, &builtins, Builtins::tap)?;
	add(&mut table, builtin::ENTER_TEXT, &builtins, Builtins::enter_text)?;
	add(&mut table, builtin::SCROLL_TO, &builtins, Builtins::scroll_to)?;
	add(&mut table, builtin::GET_LOGS, &builtins, Builtins::get_logs)?;
	add(&mut table, builtin::SCREENSHOTS, &builtins, Builtins::screenshots)?;
	add(&mut table, builtin::LIST_CAPABILITIES, &builtins, Builtins::list_capabilities)?;
	Ok(())
}

fn add<F, Fut>(registry: &mut Registry, name: &str, builtins: &Arc<Builtins>, handler: F) -> Result<(), RegistryError>
where
	F: Fn(Arc<Builtins>, Params) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = anyhow::Result<CapabilityResult>> + Send + 'static,
{
	let builtins = Arc::clone(builtins);
	registry
		.register_builtin(name, move |params| handler(Arc::clone(&builtins), params))
		.map(|_| ())
}

impl Builtins {
	async fn list_elements(self: Arc<Self>, _params: Params) -> anyhow::Result<CapabilityResult> {
		let elements = match self.host.root() {
			Some(root) => enumerate_interactive(&root, &self.classifier, self.host.viewport()),
			None => Vec::new(),
		};
		Ok(CapabilityResult::from_payload(&ElementList { elements })?)
	}

	async fn tap(self: Arc<Self>, params: Params) -> anyhow::Result<CapabilityResult> {
		let matcher = Matcher::from_criteria(&params).map_err(ParamError::from)?;
		into_capability_result(simulate::tap(self.host.as_ref(), &self.classifier, &matcher).await)
	}

	async fn enter_text(self: Arc<Self>, params: Params) -> anyhow::Result<CapabilityResult> {
		let matcher = Matcher::from_criteria(&params).map_err(ParamError::from)?;
		let text = required_str(&params, "input");
		into_capability_result(simulate::enter_text(self.host.as_ref(), &self.classifier, &matcher, text).await)
	}

	async fn scroll_to(self: Arc<Self>, params: Params) -> anyhow::Result<CapabilityResult> {
		let matcher = Matcher::from_criteria(&params).map_err(ParamError::from)?;
		into_capability_result(
			simulate::scroll_until_visible(self.host.as_ref(), &self.classifier, &matcher, self.scroll_max_steps).await,
		)
	}

	async fn get_logs(self: Arc<Self>, params: Params) -> anyhow::Result<CapabilityResult> {
		let logs = if optional_bool(&params, "clear")?.unwrap_or(false) {
			self.logs.drain()
		} else {
			self.logs.snapshot()
		};
		Ok(CapabilityResult::from_payload(&LogList { logs })?)
	}

	async fn screenshots(self: Arc<Self>, _params: Params) -> anyhow::Result<CapabilityResult> {
		match self.host.capture_screens().await {
			Ok(screens) => {
				let images = screens.iter().map(|png| STANDARD.encode(png)).collect();
				Ok(CapabilityResult::from_payload(&ScreenshotList { images })?)
			}
			Err(err) => Ok(CapabilityResult::error(codes::CAPTURE_FAILED, format!("screen capture failed: {err}"))),
		}
	}

	async fn list_capabilities(self: Arc<Self>, _params: Params) -> anyhow::Result<CapabilityResult> {
		let registry = self
			.registry
			.upgrade()
			.ok_or_else(|| anyhow::anyhow!("capability registry is gone"))?;
		let capabilities = registry.read().list_registered();
		Ok(CapabilityResult::from_payload(&CapabilityList { capabilities })?)
	}
}
