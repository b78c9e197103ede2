//! Single-edit change descriptions and position mapping.

use ropey::Rope;

use crate::range::{CharIdx, CharLen, TextRange};


/// Bias determines how positions at change boundaries are mapped.
///
/// When mapping a position through a change, bias determines whether the position
/// moves with insertions or stays before them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
	/// Position stays before insertions at the same location.
	Left,
	/// Position moves after insertions at the same location.
	Right,
}

/// One replace edit: `old_len` characters at `offset` become `new_len` characters.
///
/// Pure insertions have `old_len == 0`, pure deletions `new_len == 0`. The
/// change carries no text; callers that need it keep the fragments alongside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextChange {
	/// Character offset where the edit starts.
	pub offset: CharIdx,
	/// Number of characters removed.
	pub old_len: CharLen,
	/// Number of characters inserted.
	pub new_len: CharLen,
}

impl TextChange {
	/// Creates a change replacing `old_len` characters with `new_len` characters.
	pub const fn replace(offset: CharIdx, old_len: CharLen, new_len: CharLen) -> Self {
		Self { offset, old_len, new_len }
	}

	/// Creates a pure insertion.
	pub const fn insert(offset: CharIdx, new_len: CharLen) -> Self {
		Self::replace(offset, 0, new_len)
	}

	/// Creates a pure deletion.
	pub const fn delete(offset: CharIdx, old_len: CharLen) -> Self {
		Self::replace(offset, old_len, 0)
	}

	/// End of the replaced span in the old document (exclusive).
	#[inline]
	pub const fn end_old(&self) -> CharIdx {
		self.offset + self.old_len
	}

	/// End of the inserted span in the new document (exclusive).
	#[inline]
	pub const fn end_new(&self) -> CharIdx {
		self.offset + self.new_len
	}

	/// The replaced span in old-document coordinates.
	#[inline]
	pub fn old_range(&self) -> TextRange {
		TextRange::from_len(self.offset, self.old_len)
	}

	/// Signed length difference introduced by the change.
	#[inline]
	pub fn delta(&self) -> isize {
		self.new_len as isize - self.old_len as isize
	}

	#[inline]
	pub const fn is_insert(&self) -> bool {
		self.old_len == 0 && self.new_len > 0
	}

	#[inline]
	pub const fn is_delete(&self) -> bool {
		self.new_len == 0 && self.old_len > 0
	}

	/// Maps a position through this change using the specified bias.
	///
	/// Positions before the edit are untouched and positions after it shift by
	/// [`delta`](Self::delta). A position exactly at the edit offset stays there
	/// with [`Bias::Left`] and moves past the inserted text with [`Bias::Right`].
	/// Positions inside the replaced span collapse to the end of the new text.
	pub fn map_pos(&self, pos: CharIdx, bias: Bias) -> CharIdx {
		if pos < self.offset {
			return pos;
		}
		if pos == self.offset {
			return match bias {
				Bias::Left => pos,
				Bias::Right => self.end_new(),
			};
		}
		if pos <= self.end_old() {
			return self.end_new();
		}
		pos - self.old_len + self.new_len
	}

	/// Applies this change to a rope, inserting `text` in place of the removed span.
	///
	/// # Parameters
	/// - `doc`: The rope to modify
	/// - `text`: The replacement text, which must be `new_len` characters long
	pub fn apply(&self, doc: &mut Rope, text: &str) {
		debug_assert_eq!(text.chars().count(), self.new_len);
		if self.old_len > 0 {
			doc.remove(self.offset..self.end_old());
		}
		if !text.is_empty() {
			doc.insert(self.offset, text);
		}
	}
}
