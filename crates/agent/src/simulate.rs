//! Simulated interactions: tap, scroll-until-visible and text entry.
//!
//! Each simulator resolves its target against a fresh tree from the host and
//! reports success with a message naming the matcher.

use thiserror::Error;
use uibridge_protocol::fault::codes;
use uibridge_protocol::payload::ActionOutcome;
use uibridge_protocol::{AppErrorCode, Matcher};

use crate::host::UiHost;
use crate::result::{CapabilityResult, ParamError};
use crate::tree::{NodeClassifier, find_first, first_scrollable, is_visible, measure};

#[derive(Debug, Error)]
pub enum SimulationError {
	#[error("no element matches {0}")]
	NotFound(String),

	#[error("element matching {0} does not accept text input")]
	NotTextInput(String),

	#[error("{matcher} is still not visible after {steps} scroll steps")]
	ScrollExhausted { matcher: String, steps: usize },

	#[error("no scrollable found while looking for {0}")]
	NoScrollable(String),

	#[error(transparent)]
	InvalidParams(#[from] ParamError),

	/// Raised by a host hook; surfaces as an uncaught fault.
	#[error(transparent)]
	Host(#[from] anyhow::Error),
}

impl SimulationError {
	pub fn code(&self) -> Option<AppErrorCode> {
		match self {
			SimulationError::NotFound(_) => Some(codes::ELEMENT_NOT_FOUND),
			SimulationError::NotTextInput(_) => Some(codes::NOT_TEXT_INPUT),
			SimulationError::ScrollExhausted { .. } => Some(codes::SCROLL_EXHAUSTED),
			SimulationError::NoScrollable(_) => Some(codes::NO_SCROLLABLE),
			SimulationError::InvalidParams(_) | SimulationError::Host(_) => None,
		}
	}
}

/// Converts a simulator outcome into a handler result.
pub fn into_capability_result(outcome: Result<ActionOutcome, SimulationError>) -> anyhow::Result<CapabilityResult> {
	match outcome {
		Ok(outcome) => Ok(CapabilityResult::from_payload(&outcome)?),
		Err(SimulationError::InvalidParams(err)) => Ok(CapabilityResult::invalid_params(err.0)),
		Err(SimulationError::Host(err)) => Err(err),
		Err(err) => {
			let message = err.to_string();
			match err.code() {
				Some(code) => Ok(CapabilityResult::error(code, message)),
				None => Err(anyhow::Error::new(err)),
			}
		}
	}
}

pub async fn tap(
	host: &dyn UiHost,
	classifier: &NodeClassifier,
	matcher: &Matcher,
) -> Result<ActionOutcome, SimulationError> {
	let point = match matcher {
		Matcher::Coordinate(point) => *point,
		_ => {
			let root = host.root();
			let found = find_first(root.as_ref(), matcher, classifier)
				.ok_or_else(|| SimulationError::NotFound(matcher.to_string()))?;
			measure(found.node.as_ref())
				.filter(|bounds| bounds.has_positive_size())
				.map(|bounds| bounds.center())
				.ok_or_else(|| SimulationError::NotFound(matcher.to_string()))?
		}
	};

	tracing::debug!(%matcher, x = point.x, y = point.y, "tap");
	host.tap_at(point).await?;
	host.settle().await;
	Ok(ActionOutcome {
		message: format!("Tapped {matcher}"),
	})
}

/// Steps the nearest enclosing scrollable until the target is visible.
///
/// When the target is not in the tree yet, the first scrollable in pre-order
/// is stepped instead. Gives up after `max_steps` steps, or as soon as the
/// scrollable reports it reached its end and the target is still hidden.
pub async fn scroll_until_visible(
	host: &dyn UiHost,
	classifier: &NodeClassifier,
	matcher: &Matcher,
	max_steps: usize,
) -> Result<ActionOutcome, SimulationError> {
	if matcher.is_coordinate() {
		return Err(ParamError("scrolling requires key, text or type criteria".to_string()).into());
	}

	let mut steps = 0;
	let mut at_end = false;
	loop {
		let root = host.root();
		let found = find_first(root.as_ref(), matcher, classifier);
		if let Some(found) = &found {
			if is_visible(found.node.as_ref(), host.viewport()) {
				return Ok(ActionOutcome {
					message: format!("Scrolled to {matcher}"),
				});
			}
		}
		if steps >= max_steps || at_end {
			return Err(SimulationError::ScrollExhausted {
				matcher: matcher.to_string(),
				steps,
			});
		}

		let target = found
			.as_ref()
			.and_then(|found| found.nearest_scrollable())
			.or_else(|| root.as_ref().and_then(first_scrollable))
			.ok_or_else(|| SimulationError::NoScrollable(matcher.to_string()))?;
		let advanced = match target.as_scrollable() {
			Some(scrollable) => scrollable.scroll_step()?,
			None => return Err(SimulationError::NoScrollable(matcher.to_string())),
		};

		steps += 1;
		at_end = !advanced;
		tracing::debug!(%matcher, steps, advanced, "scroll step");
		host.settle().await;
	}
}

/// Writes `text` into the first node matching `matcher`.
///
/// `text` is only checked once the target resolves, so a missing element is
/// reported ahead of a missing value.
pub async fn enter_text(
	host: &dyn UiHost,
	classifier: &NodeClassifier,
	matcher: &Matcher,
	text: Result<&str, ParamError>,
) -> Result<ActionOutcome, SimulationError> {
	{
		let root = host.root();
		let found = find_first(root.as_ref(), matcher, classifier)
			.ok_or_else(|| SimulationError::NotFound(matcher.to_string()))?;
		let input = found
			.node
			.as_text_input()
			.ok_or_else(|| SimulationError::NotTextInput(matcher.to_string()))?;
		input.set_text(text?)?;
	}

	host.settle().await;
	Ok(ActionOutcome {
		message: format!("Entered text into {matcher}"),
	})
}
