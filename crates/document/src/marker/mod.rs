//! Self-adjusting ranges anchored into a document.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use sluice_primitives::{Bias, CharIdx, TextChange, TextRange};

use crate::document::DocumentId;


#[derive(Debug, Clone, Copy)]
struct MarkerState {
	start: CharIdx,
	end: CharIdx,
	valid: bool,
	greedy_to_left: bool,
	greedy_to_right: bool,
}

/// Shared marker storage. The document holds these weakly.
#[derive(Debug)]
pub(crate) struct MarkerCell {
	state: Mutex<MarkerState>,
}

impl MarkerCell {
	/// Adjusts the marker for an edit. Returns false once the marker is invalid.
	pub(crate) fn apply_change(&self, change: &TextChange) -> bool {
		let mut state = self.state.lock();
		if !state.valid {
			return false;
		}
		let range = TextRange::new(state.start, state.end);
		match apply_change(range, change, state.greedy_to_left, state.greedy_to_right) {
			Some(next) => {
				state.start = next.start();
				state.end = next.end();
				true
			}
			None => {
				state.valid = false;
				tracing::trace!(start = state.start, end = state.end, offset = change.offset, "marker.invalidated");
				false
			}
		}
	}
}

/// An interval anchored into one document that follows edits.
///
/// Greedy edges absorb insertions made exactly at that edge; non-greedy edges
/// let them fall outside. A marker whose text is removed together with text on
/// both sides of it becomes invalid and never recovers.
#[derive(Debug, Clone)]
pub struct RangeMarker {
	document: DocumentId,
	cell: Arc<MarkerCell>,
}

impl RangeMarker {
	pub(crate) fn new(document: DocumentId, range: TextRange, greedy_to_left: bool, greedy_to_right: bool) -> Self {
		Self {
			document,
			cell: Arc::new(MarkerCell {
				state: Mutex::new(MarkerState {
					start: range.start(),
					end: range.end(),
					valid: true,
					greedy_to_left,
					greedy_to_right,
				}),
			}),
		}
	}

	pub(crate) fn downgrade(&self) -> Weak<MarkerCell> {
		Arc::downgrade(&self.cell)
	}

	/// The document this marker is anchored into.
	pub fn document_id(&self) -> DocumentId {
		self.document
	}

	/// Current start offset. Meaningless once the marker is invalid.
	pub fn start(&self) -> CharIdx {
		self.cell.state.lock().start
	}

	/// Current end offset. Meaningless once the marker is invalid.
	pub fn end(&self) -> CharIdx {
		self.cell.state.lock().end
	}

	/// Returns the current range, or `None` if the marker is invalid.
	pub fn range(&self) -> Option<TextRange> {
		let state = self.cell.state.lock();
		state.valid.then(|| TextRange::new(state.start, state.end))
	}

	pub fn is_valid(&self) -> bool {
		self.cell.state.lock().valid
	}

	pub fn is_greedy_to_left(&self) -> bool {
		self.cell.state.lock().greedy_to_left
	}

	pub fn is_greedy_to_right(&self) -> bool {
		self.cell.state.lock().greedy_to_right
	}

	pub fn set_greedy_to_left(&self, greedy: bool) {
		self.cell.state.lock().greedy_to_left = greedy;
	}

	pub fn set_greedy_to_right(&self, greedy: bool) {
		self.cell.state.lock().greedy_to_right = greedy;
	}

	/// Invalidates the marker. The document drops it on its next edit.
	pub fn dispose(&self) {
		self.cell.state.lock().valid = false;
	}
}

/// Maps `range` through `change`, returning `None` when the marker must be invalidated.
pub(crate) fn apply_change(range: TextRange, change: &TextChange, greedy_to_left: bool, greedy_to_right: bool) -> Option<TextRange> {
	if range.is_empty() {
		return apply_change_to_point(range.start(), change, greedy_to_left || greedy_to_right);
	}

	let (start, end) = (range.start(), range.end());
	let offset = change.offset;
	let old_end = change.end_old();
	let start_bias = if greedy_to_left { Bias::Left } else { Bias::Right };

	// Edit after the marker.
	if end < offset || (end == offset && !(greedy_to_right && change.is_insert())) {
		return Some(range);
	}

	// Edit before the marker.
	if old_end < start || (old_end == start && !(greedy_to_left && change.is_insert())) {
		return Some(TextRange::new(change.map_pos(start, start_bias), change.map_pos(end, Bias::Right)));
	}

	// Marked text deleted, alone or together with its surroundings.
	if change.is_delete() && change.old_range().contains_range(&range) {
		return None;
	}

	// Edit within the marker, edges included.
	if start <= offset && old_end <= end {
		return Some(TextRange::new(start, change.map_pos(end, Bias::Right)));
	}

	// Edit replaces a prefix of the marker.
	if offset <= start && old_end < end {
		return Some(TextRange::new(change.map_pos(start, Bias::Right), change.map_pos(end, Bias::Right)));
	}

	// Edit replaces a suffix of the marker.
	if start < offset && end <= old_end {
		return Some(TextRange::new(start, offset));
	}

	None
}

fn apply_change_to_point(pos: CharIdx, change: &TextChange, greedy: bool) -> Option<TextRange> {
	let offset = change.offset;
	let old_end = change.end_old();

	if offset > pos || (offset == pos && change.old_len > 0) {
		return Some(TextRange::empty(pos));
	}
	if change.is_insert() && offset == pos {
		return Some(if greedy {
			TextRange::from_len(pos, change.new_len)
		} else {
			TextRange::empty(pos)
		});
	}
	if old_end <= pos {
		return Some(TextRange::empty(change.map_pos(pos, Bias::Right)));
	}
	None
}
