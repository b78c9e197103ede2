//! Shared, listenable text document.
//!
//! A [`Document`] is a cheap-clone handle over a rope, a read-only flag, the
//! range markers anchored into it and its change listeners. Every effective
//! edit runs in two phases:
//!
//! 1. Under the document lock the rope is edited, the modification stamp is
//!    bumped and every live marker is adjusted.
//! 2. The lock is released and listeners are notified in registration order.
//!
//! Because the lock is dropped before notification, listeners may read or edit
//! any document, including the one that notified them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use sluice_primitives::{CharIdx, Rope, TextChange, TextRange};

use crate::error::{EditError, check_range};
use crate::event::{DocumentEvent, DocumentListener, ListenerId};
use crate::marker::{MarkerCell, RangeMarker};

#[cfg(test)]
mod tests;

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique document identifier, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

impl std::fmt::Display for DocumentId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "doc#{}", self.0)
	}
}

struct DocumentState {
	text: Rope,
	read_only: bool,
	stamp: u64,
	markers: Vec<Weak<MarkerCell>>,
	listeners: Vec<(ListenerId, DocumentListener)>,
	next_listener: u64,
}

struct DocumentInner {
	id: DocumentId,
	state: Mutex<DocumentState>,
}

/// Mutable text buffer with char-indexed addressing.
#[derive(Clone)]
pub struct Document {
	inner: Arc<DocumentInner>,
}

impl std::fmt::Debug for Document {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.inner.state.lock();
		f.debug_struct("Document")
			.field("id", &self.inner.id)
			.field("len_chars", &state.text.len_chars())
			.field("read_only", &state.read_only)
			.field("stamp", &state.stamp)
			.field("markers", &state.markers.len())
			.field("listeners", &state.listeners.len())
			.finish()
	}
}

impl Default for Document {
	fn default() -> Self {
		Self::new("")
	}
}

impl Document {
	/// Creates a writable document holding `text`.
	pub fn new(text: &str) -> Self {
		Self {
			inner: Arc::new(DocumentInner {
				id: DocumentId(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed)),
				state: Mutex::new(DocumentState {
					text: Rope::from(text),
					read_only: false,
					stamp: 0,
					markers: Vec::new(),
					listeners: Vec::new(),
					next_listener: 0,
				}),
			}),
		}
	}

	pub fn id(&self) -> DocumentId {
		self.inner.id
	}

	/// Returns true if both handles point at the same document.
	pub fn ptr_eq(&self, other: &Document) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}

	/// Returns the full text.
	pub fn text(&self) -> String {
		self.inner.state.lock().text.to_string()
	}

	/// Returns a snapshot of the text. Ropes clone in O(1).
	pub fn chars_sequence(&self) -> Rope {
		self.inner.state.lock().text.clone()
	}

	/// Returns the text covered by `range`.
	pub fn slice(&self, range: TextRange) -> Result<String, EditError> {
		let state = self.inner.state.lock();
		check_range(range.start(), range.end(), state.text.len_chars())?;
		Ok(state.text.slice(range.start()..range.end()).to_string())
	}

	/// Returns the document length in chars.
	pub fn text_len(&self) -> usize {
		self.inner.state.lock().text.len_chars()
	}

	/// Returns the number of lines, counting the empty line after a trailing newline.
	pub fn line_count(&self) -> usize {
		sluice_primitives::visible_line_count(self.inner.state.lock().text.slice(..))
	}

	/// Returns the offset of the first char on `line`.
	pub fn line_start_offset(&self, line: usize) -> CharIdx {
		sluice_primitives::line_start(self.inner.state.lock().text.slice(..), line)
	}

	/// Returns the offset just past the last char on `line`, excluding the line break.
	pub fn line_end_offset(&self, line: usize) -> CharIdx {
		sluice_primitives::line_end(self.inner.state.lock().text.slice(..), line)
	}

	/// Returns the zero-based line containing `offset`.
	pub fn line_number(&self, offset: CharIdx) -> usize {
		sluice_primitives::line_of(self.inner.state.lock().text.slice(..), offset)
	}

	pub fn is_writable(&self) -> bool {
		!self.inner.state.lock().read_only
	}

	pub fn set_read_only(&self, read_only: bool) {
		self.inner.state.lock().read_only = read_only;
	}

	/// Returns a counter bumped by every effective edit.
	pub fn modification_stamp(&self) -> u64 {
		self.inner.state.lock().stamp
	}

	/// Replaces `start..end` with `text`.
	///
	/// Empty edits and replacements with identical text are accepted without
	/// producing an event.
	pub fn replace_string(&self, start: CharIdx, end: CharIdx, text: &str) -> Result<(), EditError> {
		let Some((event, listeners)) = self.apply_edit(start, end, text)? else {
			return Ok(());
		};

		tracing::trace!(
			doc = %self.inner.id,
			offset = event.offset,
			old_len = event.old_len,
			new_len = event.new_len(),
			listeners = listeners.len(),
			"document.changed"
		);
		for listener in listeners {
			listener(&event);
		}
		Ok(())
	}

	/// Inserts `text` at `offset`.
	pub fn insert_string(&self, offset: CharIdx, text: &str) -> Result<(), EditError> {
		self.replace_string(offset, offset, text)
	}

	/// Deletes `start..end`.
	pub fn delete_string(&self, start: CharIdx, end: CharIdx) -> Result<(), EditError> {
		self.replace_string(start, end, "")
	}

	/// Replaces the entire content with `text`.
	pub fn set_text(&self, text: &str) -> Result<(), EditError> {
		let len = self.text_len();
		self.replace_string(0, len, text)
	}

	/// Creates a non-greedy marker over `range`.
	pub fn create_range_marker(&self, range: TextRange) -> Result<RangeMarker, EditError> {
		self.create_range_marker_with(range, false, false)
	}

	/// Creates a marker over `range` with explicit edge greediness.
	pub fn create_range_marker_with(&self, range: TextRange, greedy_to_left: bool, greedy_to_right: bool) -> Result<RangeMarker, EditError> {
		let mut state = self.inner.state.lock();
		check_range(range.start(), range.end(), state.text.len_chars())?;
		let marker = RangeMarker::new(self.inner.id, range, greedy_to_left, greedy_to_right);
		state.markers.retain(|weak| weak.strong_count() > 0);
		state.markers.push(marker.downgrade());
		Ok(marker)
	}

	/// Registers a change listener. Listeners run after markers are updated.
	pub fn add_listener(&self, listener: impl Fn(&DocumentEvent) + Send + Sync + 'static) -> ListenerId {
		let mut state = self.inner.state.lock();
		let id = ListenerId(state.next_listener);
		state.next_listener += 1;
		state.listeners.push((id, Arc::new(listener)));
		id
	}

	/// Unregisters a listener. Returns false if it was not registered.
	pub fn remove_listener(&self, id: ListenerId) -> bool {
		let mut state = self.inner.state.lock();
		let before = state.listeners.len();
		state.listeners.retain(|(listener_id, _)| *listener_id != id);
		before != state.listeners.len()
	}

	/// Returns the number of registered listeners.
	pub fn listener_count(&self) -> usize {
		self.inner.state.lock().listeners.len()
	}

	/// Edits the rope and adjusts markers under the lock, returning the event
	/// and a snapshot of the listeners to notify once the lock is released.
	fn apply_edit(&self, start: CharIdx, end: CharIdx, text: &str) -> Result<Option<(DocumentEvent, Vec<DocumentListener>)>, EditError> {
		let mut state = self.inner.state.lock();
		if state.read_only {
			return Err(EditError::ReadOnly);
		}
		check_range(start, end, state.text.len_chars())?;

		let new_len = text.chars().count();
		if start == end && new_len == 0 {
			return Ok(None);
		}

		let old_fragment = state.text.slice(start..end).to_string();
		if old_fragment == text {
			return Ok(None);
		}

		let change = TextChange::replace(start, end - start, new_len);
		change.apply(&mut state.text, text);
		state.stamp += 1;

		state.markers.retain(|weak| match weak.upgrade() {
			Some(marker) => marker.apply_change(&change),
			None => false,
		});

		let event = DocumentEvent {
			offset: start,
			old_len: end - start,
			old_fragment,
			new_fragment: text.to_owned(),
			stamp: state.stamp,
		};
		let listeners = state.listeners.iter().map(|(_, listener)| Arc::clone(listener)).collect();
		Ok(Some((event, listeners)))
	}
}
