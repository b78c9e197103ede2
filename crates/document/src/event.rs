use std::sync::Arc;

use sluice_primitives::{CharIdx, CharLen, TextChange, TextRange};

/// Change notification delivered to document listeners after an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEvent {
	/// Char offset where the edit starts.
	pub offset: CharIdx,
	/// Number of chars removed.
	pub old_len: CharLen,
	/// Text that was removed.
	pub old_fragment: String,
	/// Text that was inserted.
	pub new_fragment: String,
	/// Modification stamp of the document after the edit.
	pub stamp: u64,
}

impl DocumentEvent {
	/// Number of chars inserted.
	pub fn new_len(&self) -> CharLen {
		self.new_fragment.chars().count()
	}

	/// The edit as a length-only change.
	pub fn change(&self) -> TextChange {
		TextChange::replace(self.offset, self.old_len, self.new_len())
	}

	/// The replaced span in pre-edit coordinates.
	pub fn old_range(&self) -> TextRange {
		TextRange::from_len(self.offset, self.old_len)
	}
}

/// Handle returned by [`Document::add_listener`](crate::Document::add_listener).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Callback invoked after every effective edit of a document.
pub type DocumentListener = Arc<dyn Fn(&DocumentEvent) + Send + Sync>;
