//! Match criteria and their typed resolution.
//!
//! Callers send a flat criteria map (`{"key": "submit"}`, `{"x": 10, "y": 20}`,
//! ...). [`Matcher::from_criteria`] turns it into exactly one [`Matcher`] by
//! fixed precedence: coordinates, then key, then text, then type name.

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::element::Point;

/// Flat, string-keyed match criteria as received from a caller.
pub type Criteria = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatcherError {
	#[error("no recognized criteria: expected x and y, key, text, or type")]
	NoCriteria,

	#[error("criterion '{field}' must be {expected}")]
	InvalidField { field: &'static str, expected: &'static str },
}

/// A resolved criterion for locating one element.
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
	/// Screen point; never matches tree nodes, consumed directly by tap.
	Coordinate(Point),
	/// Exact match on a string-valued node key.
	Key(String),
	/// Exact match on the node's extracted text.
	Text(String),
	/// Match on the node's runtime type name.
	TypeName(String),
}

impl Matcher {
	pub fn from_criteria(criteria: &Criteria) -> Result<Self, MatcherError> {
		if let (Some(x), Some(y)) = (present(criteria, "x"), present(criteria, "y")) {
			return Ok(Matcher::Coordinate(Point::new(number(x, "x")?, number(y, "y")?)));
		}
		if let Some(key) = present(criteria, "key") {
			return string(key, "key").map(Matcher::Key);
		}
		if let Some(text) = present(criteria, "text") {
			return string(text, "text").map(Matcher::Text);
		}
		if let Some(type_name) = present(criteria, "type") {
			return string(type_name, "type").map(Matcher::TypeName);
		}
		Err(MatcherError::NoCriteria)
	}

	pub fn is_coordinate(&self) -> bool {
		matches!(self, Matcher::Coordinate(_))
	}
}

impl fmt::Display for Matcher {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Matcher::Coordinate(point) => write!(f, "Coordinate({}, {})", point.x, point.y),
			Matcher::Key(key) => write!(f, "Key({key:?})"),
			Matcher::Text(text) => write!(f, "Text({text:?})"),
			Matcher::TypeName(name) => write!(f, "TypeName({name:?})"),
		}
	}
}

/// `null` counts as absent so optional tool arguments can be forwarded as-is.
fn present<'a>(criteria: &'a Criteria, field: &str) -> Option<&'a Value> {
	criteria.get(field).filter(|value| !value.is_null())
}

fn number(value: &Value, field: &'static str) -> Result<f64, MatcherError> {
	let parsed = match value {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse::<f64>().ok(),
		_ => None,
	};
	parsed.filter(|n| n.is_finite()).ok_or(MatcherError::InvalidField {
		field,
		expected: "a finite number",
	})
}

fn string(value: &Value, field: &'static str) -> Result<String, MatcherError> {
	value.as_str().map(str::to_string).ok_or(MatcherError::InvalidField {
		field,
		expected: "a string",
	})
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn criteria(value: Value) -> Criteria {
		value.as_object().cloned().unwrap()
	}

	#[test]
	fn coordinates_win_over_every_other_criterion() {
		let samples = [
			json!({"x": 1, "y": 2}),
			json!({"x": 1.5, "y": 2, "key": "k"}),
			json!({"text": "t", "x": 0, "y": 0, "type": "Button"}),
			json!({"key": "k", "text": "t", "type": "T", "x": "3", "y": "4"}),
		];
		for sample in samples {
			let matcher = Matcher::from_criteria(&criteria(sample.clone())).unwrap();
			assert!(matcher.is_coordinate(), "{sample} resolved to {matcher:?}");
		}
	}

	#[test]
	fn precedence_falls_through_key_text_type() {
		let m = |v| Matcher::from_criteria(&criteria(v)).unwrap();
		assert_eq!(m(json!({"key": "k", "text": "t", "type": "T"})), Matcher::Key("k".into()));
		assert_eq!(m(json!({"text": "t", "type": "T"})), Matcher::Text("t".into()));
		assert_eq!(m(json!({"type": "T", "x": 4})), Matcher::TypeName("T".into()));
		assert_eq!(m(json!({"key": null, "text": "t"})), Matcher::Text("t".into()));
	}

	#[test]
	fn empty_criteria_is_rejected() {
		assert_eq!(Matcher::from_criteria(&Criteria::new()), Err(MatcherError::NoCriteria));
		assert_eq!(Matcher::from_criteria(&criteria(json!({"x": 5}))), Err(MatcherError::NoCriteria));
	}

	#[test]
	fn malformed_fields_are_reported() {
		let err = Matcher::from_criteria(&criteria(json!({"key": 42}))).unwrap_err();
		assert_eq!(
			err,
			MatcherError::InvalidField {
				field: "key",
				expected: "a string"
			}
		);
		let err = Matcher::from_criteria(&criteria(json!({"x": "left", "y": 1}))).unwrap_err();
		assert!(err.to_string().contains("'x'"));
	}

	#[test]
	fn canonical_descriptions() {
		assert_eq!(Matcher::Key("submit".into()).to_string(), r#"Key("submit")"#);
		assert_eq!(Matcher::Coordinate(Point::new(10.0, 20.5)).to_string(), "Coordinate(10, 20.5)");
		assert_eq!(Matcher::TypeName("Switch".into()).to_string(), r#"TypeName("Switch")"#);
	}
}
