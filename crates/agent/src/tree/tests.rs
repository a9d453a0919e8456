use std::sync::Arc;

use serde_json::json;
use uibridge_protocol::{Matcher, Point, Rect};

use super::*;
use crate::testing::FakeNode;

const SCREEN: Rect = Rect::new(0.0, 0.0, 400.0, 800.0);

fn key_of(found: &FoundNode) -> Option<String> {
	found.node.key().map(|key| key.to_string())
}

fn sample_tree() -> NodeRef {
	FakeNode::new("Scaffold")
		.bounds(SCREEN)
		.child(
			FakeNode::new("Column")
				.bounds(SCREEN)
				.child(
					FakeNode::new("ElevatedButton")
						.key("save")
						.bounds(Rect::new(10.0, 10.0, 100.0, 40.0))
						.property("enabled", true)
						.null_property("tooltip")
						.property("debugLabel", "internal")
						.child(FakeNode::new("Text").text("Save").bounds(Rect::new(20.0, 20.0, 80.0, 20.0))),
				)
				.child(
					FakeNode::new("Text")
						.key("first-label")
						.text("Total")
						.bounds(Rect::new(10.0, 60.0, 100.0, 20.0)),
				)
				.child(
					FakeNode::new("Text")
						.key("second-label")
						.text("Total")
						.bounds(Rect::new(10.0, 90.0, 100.0, 20.0)),
				),
		)
		.build()
}

#[test]
fn find_first_without_start_is_none() {
	let classifier = NodeClassifier::default();
	assert!(find_first(None, &Matcher::Key("save".into()), &classifier).is_none());
}

#[test]
fn find_first_by_key_text_and_type() {
	let tree = sample_tree();
	let classifier = NodeClassifier::default();

	let found = find_first(Some(&tree), &Matcher::Key("save".into()), &classifier).unwrap();
	assert_eq!(found.node.type_name(), "ElevatedButton");
	let ancestors: Vec<_> = found.ancestors.iter().map(|node| node.type_name().to_string()).collect();
	assert_eq!(ancestors, ["Scaffold", "Column"]);

	let found = find_first(Some(&tree), &Matcher::TypeName("Column".into()), &classifier).unwrap();
	assert_eq!(found.ancestors.len(), 1);

	assert!(find_first(Some(&tree), &Matcher::Key("missing".into()), &classifier).is_none());
}

#[test]
fn find_first_returns_pre_order_first_match_every_time() {
	let tree = sample_tree();
	let classifier = NodeClassifier::default();
	for _ in 0..5 {
		let found = find_first(Some(&tree), &Matcher::Text("Total".into()), &classifier).unwrap();
		assert_eq!(key_of(&found).as_deref(), Some("first-label"));
	}
}

#[test]
fn find_first_does_not_descend_into_a_match() {
	let tree: NodeRef = FakeNode::new("Card")
		.key("outer")
		.child(FakeNode::new("Card").key("inner"))
		.build();
	let classifier = NodeClassifier::default();

	let found = find_first(Some(&tree), &Matcher::TypeName("Card".into()), &classifier).unwrap();
	assert_eq!(key_of(&found).as_deref(), Some("outer"));
	assert!(found.ancestors.is_empty());
}

#[test]
fn coordinates_never_match_nodes() {
	let tree = sample_tree();
	let matcher = Matcher::Coordinate(Point::new(20.0, 20.0));
	assert!(find_first(Some(&tree), &matcher, &NodeClassifier::default()).is_none());
}

#[test]
fn key_matching_ignores_non_string_keys() {
	let tree: NodeRef = FakeNode::new("Root")
		.child(FakeNode::new("Box").opaque_key("save"))
		.child(FakeNode::new("Box").key("save"))
		.build();
	let found = find_first(Some(&tree), &Matcher::Key("save".into()), &NodeClassifier::default()).unwrap();
	assert_eq!(found.node.key(), Some(NodeKey::Value("save".into())));
}

#[test]
fn text_fallback_is_consulted_after_builtin_extraction() {
	let tree: NodeRef = FakeNode::new("Root")
		.child(FakeNode::new("Badge").property("label", "3 new"))
		.build();
	let classifier = NodeClassifier::default().with_text_fallback(|node| {
		(node.type_name() == "Badge").then(|| "3 new".to_string())
	});

	let found = find_first(Some(&tree), &Matcher::Text("3 new".into()), &classifier).unwrap();
	assert_eq!(found.node.type_name(), "Badge");
	assert!(find_first(Some(&tree), &Matcher::Text("3 new".into()), &NodeClassifier::default()).is_none());
}

#[test]
fn enumerate_lists_candidates_in_pre_order() {
	let tree = sample_tree();
	let records = enumerate_interactive(&tree, &NodeClassifier::default(), SCREEN);

	let keys: Vec<_> = records.iter().map(|record| record.key.clone()).collect();
	// The button stops the descent, so its label is not listed separately.
	assert_eq!(
		keys,
		[Some("save".to_string()), Some("first-label".to_string()), Some("second-label".to_string())]
	);

	let button = &records[0];
	assert_eq!(button.type_name, "ElevatedButton");
	assert_eq!(serde_json::Value::Object(button.properties.clone()), json!({"enabled": true}));
	assert_eq!(button.bounds, Some(Rect::new(10.0, 10.0, 100.0, 40.0)));
	assert!(button.visible);
}

#[test]
fn enumerate_is_stable_across_runs() {
	let tree = sample_tree();
	let classifier = NodeClassifier::default();
	let first = enumerate_interactive(&tree, &classifier, SCREEN);
	let second = enumerate_interactive(&tree, &classifier, SCREEN);
	assert_eq!(first, second);
}

#[test]
fn enumerate_excludes_nodes_failing_hit_test() {
	let tree: NodeRef = FakeNode::new("Stack")
		.bounds(SCREEN)
		.child(
			FakeNode::new("ElevatedButton")
				.key("covered")
				.bounds(Rect::new(0.0, 0.0, 50.0, 50.0))
				.occluded(),
		)
		.child(FakeNode::new("ElevatedButton").key("zero").bounds(Rect::new(0.0, 0.0, 0.0, 50.0)))
		.child(
			FakeNode::new("ElevatedButton")
				.key("gone")
				.bounds(Rect::new(0.0, 0.0, 50.0, 50.0))
				.detached(),
		)
		.child(FakeNode::new("ElevatedButton").key("unmeasured"))
		.child(FakeNode::new("ElevatedButton").key("broken").bounds_error("layout in progress"))
		.child(FakeNode::new("ElevatedButton").key("ok").bounds(Rect::new(100.0, 0.0, 50.0, 50.0)))
		.build();

	let records = enumerate_interactive(&tree, &NodeClassifier::default(), SCREEN);
	let keys: Vec<_> = records.iter().filter_map(|record| record.key.as_deref()).collect();
	assert_eq!(keys, ["ok"]);
}

#[test]
fn enumerate_marks_offscreen_elements_invisible() {
	let tree: NodeRef = FakeNode::new("Column")
		.child(FakeNode::new("TextButton").key("below").bounds(Rect::new(0.0, 900.0, 50.0, 50.0)))
		.build();
	let records = enumerate_interactive(&tree, &NodeClassifier::default(), SCREEN);
	assert_eq!(records.len(), 1);
	assert!(!records[0].visible);
}

#[test]
fn pass_through_kinds_are_descended_into() {
	let tree: NodeRef = FakeNode::new("GestureDetector")
		.bounds(SCREEN)
		.child(FakeNode::new("Switch").key("wifi").bounds(Rect::new(0.0, 0.0, 40.0, 20.0)))
		.build();

	let records = enumerate_interactive(&tree, &NodeClassifier::default(), SCREEN);
	let types: Vec<_> = records.iter().map(|record| record.type_name.as_str()).collect();
	assert_eq!(types, ["GestureDetector", "Switch"]);

	let strict = NodeClassifier::default().with_pass_through(|_| false);
	let records = enumerate_interactive(&tree, &strict, SCREEN);
	assert_eq!(records.len(), 1);
}

#[test]
fn custom_interactive_types_and_stop_predicate() {
	let tree: NodeRef = FakeNode::new("Root")
		.bounds(SCREEN)
		.child(
			FakeNode::new("ColorSwatch")
				.bounds(Rect::new(0.0, 0.0, 20.0, 20.0))
				.child(FakeNode::new("Text").text("red").bounds(Rect::new(0.0, 0.0, 20.0, 10.0))),
		)
		.build();

	let classifier = NodeClassifier::default().with_interactive_types(["ColorSwatch"]);
	let types: Vec<_> = enumerate_interactive(&tree, &classifier, SCREEN)
		.into_iter()
		.map(|record| record.type_name)
		.collect();
	assert_eq!(types, ["ColorSwatch"]);

	let keep_going = classifier.with_stop(|_| false);
	assert_eq!(enumerate_interactive(&tree, &keep_going, SCREEN).len(), 2);
}

#[test]
fn first_scrollable_and_nearest_ancestor() {
	let root = FakeNode::new("Root")
		.child(FakeNode::new("ListView").key("outer").scrollable(10.0, 100.0).child(
			FakeNode::new("ListView")
				.key("inner")
				.scrollable(10.0, 100.0)
				.child(FakeNode::new("Text").key("leaf")),
		))
		.build();
	let tree: NodeRef = Arc::clone(&root) as NodeRef;

	let first = first_scrollable(&tree).unwrap();
	assert_eq!(first.key(), Some(NodeKey::Value("outer".into())));

	let found = find_first(Some(&tree), &Matcher::Key("leaf".into()), &NodeClassifier::default()).unwrap();
	let nearest = found.nearest_scrollable().unwrap();
	assert_eq!(nearest.key(), Some(NodeKey::Value("inner".into())));
}

#[test]
fn visibility_follows_scroll_offset() {
	let root = FakeNode::new("ListView")
		.bounds(Rect::new(0.0, 0.0, 100.0, 100.0))
		.scrollable(100.0, 200.0)
		.child(FakeNode::new("Text").key("late").bounds(Rect::new(0.0, 150.0, 100.0, 20.0)))
		.build();
	let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);
	let late = root.find("late").unwrap();

	assert!(!is_visible(late.as_ref(), viewport));
	root.scroll_state().unwrap().scroll_step().unwrap();
	assert!(is_visible(late.as_ref(), viewport));
}
