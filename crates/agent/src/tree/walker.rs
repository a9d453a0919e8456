//! Depth-first, pre-order traversal.
//!
//! Both walks use an explicit stack so deep trees cannot overflow the call
//! stack. Children are pushed in reverse so they pop in declaration order.

use uibridge_protocol::{ElementRecord, Matcher, Rect};

use super::{NodeClassifier, NodeRef, UiNode};

/// A find-first match together with its ancestor chain, root first.
#[derive(Clone)]
pub struct FoundNode {
	pub node: NodeRef,
	pub ancestors: Vec<NodeRef>,
}

impl FoundNode {
	/// Closest enclosing node that scrolls.
	pub fn nearest_scrollable(&self) -> Option<NodeRef> {
		self.ancestors
			.iter()
			.rev()
			.find(|ancestor| ancestor.as_scrollable().is_some())
			.cloned()
	}
}

/// Whether `node` satisfies `matcher`. Coordinates never match a node.
pub fn matches(node: &dyn UiNode, matcher: &Matcher, classifier: &NodeClassifier) -> bool {
	match matcher {
		Matcher::Coordinate(_) => false,
		Matcher::Key(key) => node
			.key()
			.is_some_and(|node_key| node_key.as_value() == Some(key.as_str())),
		Matcher::Text(text) => classifier.extract_text(node).as_deref() == Some(text.as_str()),
		Matcher::TypeName(type_name) => node.type_name() == type_name,
	}
}

/// Returns the pre-order-first node satisfying `matcher`.
///
/// A matched node's children are never visited. Returns `None` straight away
/// when there is no start node.
pub fn find_first(start: Option<&NodeRef>, matcher: &Matcher, classifier: &NodeClassifier) -> Option<FoundNode> {
	let start = start?;
	if matcher.is_coordinate() {
		return None;
	}

	let mut path: Vec<NodeRef> = Vec::new();
	let mut stack = vec![(start.clone(), 0usize)];
	while let Some((node, depth)) = stack.pop() {
		path.truncate(depth);
		if matches(node.as_ref(), matcher, classifier) {
			return Some(FoundNode { node, ancestors: path });
		}

		let children = node.children();
		path.push(node);
		stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
	}
	None
}

/// Lists every hit-testable candidate reachable from `root`, in pre-order.
pub fn enumerate_interactive(root: &NodeRef, classifier: &NodeClassifier, viewport: Rect) -> Vec<ElementRecord> {
	let mut records = Vec::new();
	let mut stack = vec![root.clone()];
	while let Some(node) = stack.pop() {
		let node = node.as_ref();
		if classifier.is_candidate(node) {
			if let Some(record) = interactive_record(node, classifier, viewport) {
				records.push(record);
			}
		}
		if classifier.should_descend(node) {
			stack.extend(node.children().into_iter().rev());
		}
	}
	records
}

fn interactive_record(node: &dyn UiNode, classifier: &NodeClassifier, viewport: Rect) -> Option<ElementRecord> {
	let bounds = measure(node)?;
	let attached = node.is_attached();
	if !bounds.has_positive_size() || !attached || !node.is_hit_target_at(bounds.center()) {
		return None;
	}

	Some(ElementRecord {
		type_name: node.type_name().to_string(),
		properties: classifier.properties(node),
		key: node.key().map(|key| key.to_string()),
		bounds: Some(bounds),
		visible: bounds.intersects(&viewport),
	})
}

/// Best-effort bounds. Failures are logged and treated as unmeasurable.
pub fn measure(node: &dyn UiNode) -> Option<Rect> {
	match node.bounds() {
		Ok(bounds) => bounds,
		Err(err) => {
			tracing::warn!(node = node.type_name(), error = %err, "skipping bounds");
			None
		}
	}
}

/// Attached, positively sized and intersecting `viewport`.
pub fn is_visible(node: &dyn UiNode, viewport: Rect) -> bool {
	node.is_attached() && measure(node).is_some_and(|bounds| bounds.has_positive_size() && bounds.intersects(&viewport))
}

/// The first node in pre-order that scrolls.
pub fn first_scrollable(root: &NodeRef) -> Option<NodeRef> {
	let mut stack = vec![root.clone()];
	while let Some(node) = stack.pop() {
		if node.as_scrollable().is_some() {
			return Some(node);
		}
		stack.extend(node.children().into_iter().rev());
	}
	None
}
