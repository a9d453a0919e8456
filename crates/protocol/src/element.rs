//! Geometry and element records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A point in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Axis-aligned rectangle in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
	pub left: f64,
	pub top: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
		Self {
			left,
			top,
			width,
			height,
		}
	}

	pub fn right(&self) -> f64 {
		self.left + self.width
	}

	pub fn bottom(&self) -> f64 {
		self.top + self.height
	}

	pub fn center(&self) -> Point {
		Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
	}

	pub fn has_positive_size(&self) -> bool {
		self.width > 0.0 && self.height > 0.0
	}

	pub fn contains(&self, point: Point) -> bool {
		point.x >= self.left && point.x < self.right() && point.y >= self.top && point.y < self.bottom()
	}

	/// True when the two rectangles share a region of positive area.
	pub fn intersects(&self, other: &Rect) -> bool {
		self.left < other.right() && other.left < self.right() && self.top < other.bottom() && other.top < self.bottom()
	}
}

/// One entry of an interactive-element enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementRecord {
	#[serde(rename = "type")]
	pub type_name: String,
	#[serde(default, skip_serializing_if = "Map::is_empty")]
	pub properties: Map<String, Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub key: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub bounds: Option<Rect>,
	pub visible: bool,
}
