//! In-memory UI tree and host for tests, plus [`run_local`] for driving a
//! target on the executor its capability calls are queued to.
//!
//! ```ignore
//! let list = FakeNode::new("ListView").bounds(Rect::new(0.0, 0.0, 400.0, 800.0)).scrollable(200.0, 2000.0);
//! let root = FakeNode::new("Scaffold").child(list.child(FakeNode::new("Text").text("Row 30")));
//! let host = FakeHost::new(root.build(), Rect::new(0.0, 0.0, 400.0, 800.0));
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::task::LocalSet;
use uibridge_protocol::service::ReloadReport;
use uibridge_protocol::{Point, Rect};

use crate::host::UiHost;
use crate::tree::{BoundsError, NodeKey, NodeProperty, NodeRef, Scrollable, TextInput, UiNode};

/// Drives `future` on a fresh [`LocalSet`].
///
/// Anything that dispatches capability calls or serves a peer has to run
/// inside one.
pub async fn run_local<F: Future>(future: F) -> F::Output {
	LocalSet::new().run_until(future).await
}

/// Scroll position of a fake scroll view, shared with its descendants.
#[derive(Debug)]
pub struct ScrollState {
	offset: Mutex<f64>,
	step: f64,
	max_offset: f64,
	steps: AtomicUsize,
}

impl ScrollState {
	pub fn offset(&self) -> f64 {
		*self.offset.lock()
	}

	/// Number of successful scroll steps so far.
	pub fn steps(&self) -> usize {
		self.steps.load(Ordering::SeqCst)
	}
}

impl Scrollable for ScrollState {
	fn scroll_step(&self) -> anyhow::Result<bool> {
		let mut offset = self.offset.lock();
		if *offset >= self.max_offset {
			return Ok(false);
		}
		*offset = (*offset + self.step).min(self.max_offset);
		self.steps.fetch_add(1, Ordering::SeqCst);
		Ok(true)
	}
}

/// A fake node, built bottom-up with consuming setters.
pub struct FakeNode {
	type_name: String,
	key: Option<NodeKey>,
	text: Option<String>,
	properties: Vec<NodeProperty>,
	bounds: Result<Option<Rect>, BoundsError>,
	attached: AtomicBool,
	occluded: AtomicBool,
	children: Vec<Arc<FakeNode>>,
	scroll: Option<Arc<ScrollState>>,
	/// Scroll views this node sits inside, outermost first.
	scrolled_by: Mutex<Vec<Arc<ScrollState>>>,
	accepts_text: bool,
	entered_text: Mutex<Option<String>>,
}

impl FakeNode {
	pub fn new(type_name: impl Into<String>) -> Self {
		Self {
			type_name: type_name.into(),
			key: None,
			text: None,
			properties: Vec::new(),
			bounds: Ok(None),
			attached: AtomicBool::new(true),
			occluded: AtomicBool::new(false),
			children: Vec::new(),
			scroll: None,
			scrolled_by: Mutex::new(Vec::new()),
			accepts_text: false,
			entered_text: Mutex::new(None),
		}
	}

	pub fn key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(NodeKey::Value(key.into()));
		self
	}

	/// A key that is not string-valued, e.g. an object key.
	pub fn opaque_key(mut self, description: impl Into<String>) -> Self {
		self.key = Some(NodeKey::Other(description.into()));
		self
	}

	pub fn text(mut self, text: impl Into<String>) -> Self {
		self.text = Some(text.into());
		self
	}

	pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.properties.push(NodeProperty::new(name, value));
		self
	}

	pub fn null_property(mut self, name: impl Into<String>) -> Self {
		self.properties.push(NodeProperty {
			name: name.into(),
			value: None,
		});
		self
	}

	pub fn bounds(mut self, bounds: Rect) -> Self {
		self.bounds = Ok(Some(bounds));
		self
	}

	pub fn bounds_error(mut self, reason: impl Into<String>) -> Self {
		self.bounds = Err(BoundsError(reason.into()));
		self
	}

	pub fn detached(self) -> Self {
		self.attached.store(false, Ordering::SeqCst);
		self
	}

	/// Hit tests at this node resolve to something else.
	pub fn occluded(self) -> Self {
		self.occluded.store(true, Ordering::SeqCst);
		self
	}

	/// Turns the node into a vertical scroll view.
	pub fn scrollable(mut self, step: f64, max_offset: f64) -> Self {
		self.scroll = Some(Arc::new(ScrollState {
			offset: Mutex::new(0.0),
			step,
			max_offset,
			steps: AtomicUsize::new(0),
		}));
		self
	}

	pub fn text_input(mut self) -> Self {
		self.accepts_text = true;
		self
	}

	pub fn child(mut self, child: FakeNode) -> Self {
		self.children.push(Arc::new(child));
		self
	}

	pub fn children(mut self, children: impl IntoIterator<Item = FakeNode>) -> Self {
		self.children.extend(children.into_iter().map(Arc::new));
		self
	}

	/// Finishes the tree rooted at this node.
	pub fn build(self) -> Arc<FakeNode> {
		let node = Arc::new(self);
		node.propagate_scroll(&[]);
		node
	}

	fn propagate_scroll(&self, outer: &[Arc<ScrollState>]) {
		*self.scrolled_by.lock() = outer.to_vec();
		let mut inner = outer.to_vec();
		if let Some(scroll) = &self.scroll {
			inner.push(Arc::clone(scroll));
		}
		for child in &self.children {
			child.propagate_scroll(&inner);
		}
	}

	pub fn scroll_state(&self) -> Option<Arc<ScrollState>> {
		self.scroll.clone()
	}

	pub fn entered_text(&self) -> Option<String> {
		self.entered_text.lock().clone()
	}

	pub fn set_attached(&self, attached: bool) {
		self.attached.store(attached, Ordering::SeqCst);
	}

	/// Depth-first search by string key, for test assertions.
	pub fn find(self: &Arc<Self>, key: &str) -> Option<Arc<FakeNode>> {
		if self.key.as_ref().and_then(NodeKey::as_value) == Some(key) {
			return Some(Arc::clone(self));
		}
		self.children.iter().find_map(|child| child.find(key))
	}
}

impl UiNode for FakeNode {
	fn key(&self) -> Option<NodeKey> {
		self.key.clone()
	}

	fn type_name(&self) -> &str {
		&self.type_name
	}

	fn text(&self) -> Option<String> {
		self.text.clone()
	}

	fn properties(&self) -> Vec<NodeProperty> {
		self.properties.clone()
	}

	fn bounds(&self) -> Result<Option<Rect>, BoundsError> {
		let scrolled: f64 = self.scrolled_by.lock().iter().map(|scroll| scroll.offset()).sum();
		self.bounds.clone().map(|bounds| {
			bounds.map(|rect| Rect::new(rect.left, rect.top - scrolled, rect.width, rect.height))
		})
	}

	fn is_attached(&self) -> bool {
		self.attached.load(Ordering::SeqCst)
	}

	fn is_hit_target_at(&self, point: Point) -> bool {
		!self.occluded.load(Ordering::SeqCst)
			&& self.is_attached()
			&& matches!(self.bounds(), Ok(Some(rect)) if rect.contains(point))
	}

	fn children(&self) -> Vec<NodeRef> {
		self.children.iter().map(|child| Arc::clone(child) as NodeRef).collect()
	}

	fn as_scrollable(&self) -> Option<&dyn Scrollable> {
		self.scroll.as_deref().map(|scroll| scroll as &dyn Scrollable)
	}

	fn as_text_input(&self) -> Option<&dyn TextInput> {
		self.accepts_text.then_some(self as &dyn TextInput)
	}
}

impl TextInput for FakeNode {
	fn set_text(&self, text: &str) -> anyhow::Result<()> {
		*self.entered_text.lock() = Some(text.to_string());
		Ok(())
	}
}

/// Fake host recording gestures.
pub struct FakeHost {
	root: Mutex<Option<NodeRef>>,
	viewport: Rect,
	taps: Mutex<Vec<Point>>,
	settles: AtomicUsize,
	screens: Mutex<Result<Vec<Vec<u8>>, String>>,
	reload: Mutex<Result<ReloadReport, String>>,
}

impl FakeHost {
	pub fn new(root: Arc<FakeNode>, viewport: Rect) -> Self {
		Self::with_root(Some(root as NodeRef), viewport)
	}

	/// A host with nothing mounted yet.
	pub fn empty(viewport: Rect) -> Self {
		Self::with_root(None, viewport)
	}

	fn with_root(root: Option<NodeRef>, viewport: Rect) -> Self {
		Self {
			root: Mutex::new(root),
			viewport,
			taps: Mutex::new(Vec::new()),
			settles: AtomicUsize::new(0),
			screens: Mutex::new(Ok(Vec::new())),
			reload: Mutex::new(Ok(ReloadReport {
				success: true,
				notices: Vec::new(),
			})),
		}
	}

	pub fn set_root(&self, root: Arc<FakeNode>) {
		*self.root.lock() = Some(root as NodeRef);
	}

	pub fn set_screens(&self, screens: Result<Vec<Vec<u8>>, String>) {
		*self.screens.lock() = screens;
	}

	pub fn set_reload(&self, reload: Result<ReloadReport, String>) {
		*self.reload.lock() = reload;
	}

	pub fn taps(&self) -> Vec<Point> {
		self.taps.lock().clone()
	}

	pub fn settles(&self) -> usize {
		self.settles.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl UiHost for FakeHost {
	fn root(&self) -> Option<NodeRef> {
		self.root.lock().clone()
	}

	fn viewport(&self) -> Rect {
		self.viewport
	}

	async fn tap_at(&self, point: Point) -> anyhow::Result<()> {
		self.taps.lock().push(point);
		Ok(())
	}

	async fn settle(&self) {
		self.settles.fetch_add(1, Ordering::SeqCst);
		tokio::task::yield_now().await;
	}

	async fn capture_screens(&self) -> anyhow::Result<Vec<Vec<u8>>> {
		self.screens.lock().clone().map_err(anyhow::Error::msg)
	}

	async fn reload_sources(&self) -> anyhow::Result<ReloadReport> {
		self.reload.lock().clone().map_err(anyhow::Error::msg)
	}
}
