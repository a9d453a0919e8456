use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::UiNode;

pub type NodePredicate = Arc<dyn Fn(&dyn UiNode) -> bool + Send + Sync>;
pub type TextExtractor = Arc<dyn Fn(&dyn UiNode) -> Option<String> + Send + Sync>;

const INTERACTIVE_TYPES: &[&str] = &[
	"ElevatedButton",
	"FilledButton",
	"TextButton",
	"OutlinedButton",
	"IconButton",
	"FloatingActionButton",
	"TextField",
	"TextFormField",
	"Checkbox",
	"CheckboxListTile",
	"Radio",
	"RadioListTile",
	"Switch",
	"SwitchListTile",
	"Slider",
	"DropdownButton",
	"PopupMenuButton",
	"ListTile",
	"GestureDetector",
	"InkWell",
];

const PASS_THROUGH_TYPES: &[&str] = &["GestureDetector", "InkWell", "Semantics"];

const EXCLUDED_PROPERTIES: &[&str] = &[
	"key",
	"child",
	"children",
	"depth",
	"dependencies",
	"renderObject",
	"hashCode",
	"runtimeType",
	"debugLabel",
	"state",
];

/// Pluggable predicates steering tree matching and enumeration.
///
/// Defaults:
/// - interactive: a fixed set of button, input and toggle type names
/// - text: the node's own [`UiNode::text`], no fallback
/// - stop: interactive nodes end the descent
/// - pass-through: `GestureDetector`, `InkWell` and `Semantics` are always
///   descended into, even when they satisfy the stop predicate
#[derive(Clone)]
pub struct NodeClassifier {
	interactive: NodePredicate,
	text_fallback: Option<TextExtractor>,
	stop: Option<NodePredicate>,
	pass_through: NodePredicate,
	excluded_properties: HashSet<String>,
}

impl Default for NodeClassifier {
	fn default() -> Self {
		Self {
			interactive: type_name_set(INTERACTIVE_TYPES),
			text_fallback: None,
			stop: None,
			pass_through: type_name_set(PASS_THROUGH_TYPES),
			excluded_properties: EXCLUDED_PROPERTIES.iter().map(|name| name.to_string()).collect(),
		}
	}
}

impl fmt::Debug for NodeClassifier {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NodeClassifier")
			.field("text_fallback", &self.text_fallback.is_some())
			.field("custom_stop", &self.stop.is_some())
			.field("excluded_properties", &self.excluded_properties.len())
			.finish_non_exhaustive()
	}
}

impl NodeClassifier {
	pub fn with_interactive(mut self, predicate: impl Fn(&dyn UiNode) -> bool + Send + Sync + 'static) -> Self {
		self.interactive = Arc::new(predicate);
		self
	}

	/// Adds extra interactive type names on top of the current predicate.
	pub fn with_interactive_types<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let extra: HashSet<String> = names.into_iter().map(Into::into).collect();
		let base = Arc::clone(&self.interactive);
		self.interactive = Arc::new(move |node: &dyn UiNode| extra.contains(node.type_name()) || base(node));
		self
	}

	/// Consulted when a node's own text extraction yields nothing.
	pub fn with_text_fallback(
		mut self,
		extractor: impl Fn(&dyn UiNode) -> Option<String> + Send + Sync + 'static,
	) -> Self {
		self.text_fallback = Some(Arc::new(extractor));
		self
	}

	pub fn with_stop(mut self, predicate: impl Fn(&dyn UiNode) -> bool + Send + Sync + 'static) -> Self {
		self.stop = Some(Arc::new(predicate));
		self
	}

	pub fn with_pass_through(mut self, predicate: impl Fn(&dyn UiNode) -> bool + Send + Sync + 'static) -> Self {
		self.pass_through = Arc::new(predicate);
		self
	}

	pub fn exclude_property(mut self, name: impl Into<String>) -> Self {
		self.excluded_properties.insert(name.into());
		self
	}

	pub fn is_interactive(&self, node: &dyn UiNode) -> bool {
		(self.interactive)(node)
	}

	pub fn extract_text(&self, node: &dyn UiNode) -> Option<String> {
		node.text()
			.or_else(|| self.text_fallback.as_ref().and_then(|fallback| fallback(node)))
	}

	/// Interactive type, extracted text or a key makes a node a candidate
	/// for enumeration.
	pub fn is_candidate(&self, node: &dyn UiNode) -> bool {
		self.is_interactive(node) || self.extract_text(node).is_some() || node.key().is_some()
	}

	pub fn should_descend(&self, node: &dyn UiNode) -> bool {
		let stops = match &self.stop {
			Some(stop) => stop(node),
			None => self.is_interactive(node),
		};
		!stops || (self.pass_through)(node)
	}

	/// Declared properties with a value, minus the excluded names.
	pub fn properties(&self, node: &dyn UiNode) -> Map<String, Value> {
		node.properties()
			.into_iter()
			.filter(|property| !self.excluded_properties.contains(&property.name))
			.filter_map(|property| match property.value {
				None | Some(Value::Null) => None,
				Some(value) => Some((property.name, value)),
			})
			.collect()
	}
}

fn type_name_set(names: &'static [&'static str]) -> NodePredicate {
	Arc::new(move |node: &dyn UiNode| names.iter().any(|name| *name == node.type_name()))
}
