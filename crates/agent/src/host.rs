//! Hooks the embedding toolkit provides.

use async_trait::async_trait;
use uibridge_protocol::service::ReloadReport;
use uibridge_protocol::{Point, Rect};

use crate::tree::NodeRef;

/// The running UI the agent inspects and drives.
#[async_trait]
pub trait UiHost: Send + Sync {
	/// Root of the current tree, or `None` before the first frame.
	fn root(&self) -> Option<NodeRef>;

	/// Visible screen area in logical pixels.
	fn viewport(&self) -> Rect;

	/// Dispatches a tap gesture at `point`.
	async fn tap_at(&self, point: Point) -> anyhow::Result<()>;

	/// Waits until the next frame has been laid out.
	async fn settle(&self) {}

	/// PNG-encoded images, one per view.
	async fn capture_screens(&self) -> anyhow::Result<Vec<Vec<u8>>> {
		anyhow::bail!("screen capture is not supported by this host")
	}

	async fn reload_sources(&self) -> anyhow::Result<ReloadReport> {
		Ok(ReloadReport {
			success: false,
			notices: vec!["source reload is not supported by this host".to_string()],
		})
	}
}
