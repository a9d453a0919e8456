//! Live UI-tree abstraction.
//!
//! The host toolkit supplies the tree by implementing [`UiNode`]. Nodes are
//! handed out as [`NodeRef`]s for a single traversal and must not be kept
//! across frames: every capability call starts again from
//! [`UiHost::root`](crate::UiHost::root).

mod classify;
mod walker;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use uibridge_protocol::{Point, Rect};

pub use classify::{NodeClassifier, NodePredicate, TextExtractor};
pub use walker::{FoundNode, enumerate_interactive, find_first, first_scrollable, is_visible, matches, measure};

/// Shared handle to a live node.
pub type NodeRef = Arc<dyn UiNode>;

/// Identifying key of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKey {
	/// String-valued key. Only these take part in key matching.
	Value(String),
	/// Any other key kind, carried by its description.
	Other(String),
}

impl NodeKey {
	pub fn as_value(&self) -> Option<&str> {
		match self {
			NodeKey::Value(value) => Some(value),
			NodeKey::Other(_) => None,
		}
	}
}

impl fmt::Display for NodeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			NodeKey::Value(value) | NodeKey::Other(value) => f.write_str(value),
		}
	}
}

/// A declared diagnostic property of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeProperty {
	pub name: String,
	pub value: Option<Value>,
}

impl NodeProperty {
	pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
		Self {
			name: name.into(),
			value: Some(value.into()),
		}
	}
}

/// Measuring a node's bounds failed (detached render object, layout in progress).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("bounds unavailable: {0}")]
pub struct BoundsError(pub String);

/// One node of the live UI tree.
pub trait UiNode: Send + Sync {
	fn key(&self) -> Option<NodeKey>;

	/// Runtime type name, e.g. `ElevatedButton`.
	fn type_name(&self) -> &str;

	/// Text carried by built-in widget kinds. Hosts with custom text-bearing
	/// nodes can instead supply a fallback on the [`NodeClassifier`].
	fn text(&self) -> Option<String>;

	fn properties(&self) -> Vec<NodeProperty> {
		Vec::new()
	}

	/// Global bounds in logical pixels. `Ok(None)` when the node has no
	/// render box.
	fn bounds(&self) -> Result<Option<Rect>, BoundsError>;

	/// Whether the node is still mounted in the live tree.
	fn is_attached(&self) -> bool;

	/// Whether a hit test at `point` resolves to this exact node rather than
	/// an ancestor or an occluding sibling.
	fn is_hit_target_at(&self, point: Point) -> bool;

	fn children(&self) -> Vec<NodeRef>;

	fn as_scrollable(&self) -> Option<&dyn Scrollable> {
		None
	}

	fn as_text_input(&self) -> Option<&dyn TextInput> {
		None
	}
}

/// A node that scrolls its content.
pub trait Scrollable: Send + Sync {
	/// Scrolls forward by one step. Returns `false` once the end is reached.
	fn scroll_step(&self) -> anyhow::Result<bool>;
}

/// A node exposing an editable text surface.
pub trait TextInput: Send + Sync {
	/// Replaces the current text.
	fn set_text(&self, text: &str) -> anyhow::Result<()>;
}
