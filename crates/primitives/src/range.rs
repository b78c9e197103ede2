/// A position in the text, measured in characters (not bytes).
///
/// This is the canonical coordinate space for documents and markers.
pub type CharIdx = usize;

/// A length or count in the text, measured in characters (not bytes).
///
/// This is distinct from CharIdx to avoid accidentally passing an index
/// where a length is expected or vice versa.
pub type CharLen = usize;

/// A half-open text range `[start, end)`.
///
/// Unlike a selection there is no direction: `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
	start: CharIdx,
	end: CharIdx,
}

impl TextRange {
	/// Creates a range from `start` to `end`.
	///
	/// # Panics
	/// In debug builds, panics when `start > end`.
	#[inline]
	pub fn new(start: CharIdx, end: CharIdx) -> Self {
		debug_assert!(start <= end, "inverted text range {start}..{end}");
		Self { start, end: end.max(start) }
	}

	/// Creates an empty range at `pos`.
	#[inline]
	pub fn empty(pos: CharIdx) -> Self {
		Self { start: pos, end: pos }
	}

	/// Creates a range starting at `start` spanning `len` characters.
	#[inline]
	pub fn from_len(start: CharIdx, len: CharLen) -> Self {
		Self { start, end: start + len }
	}

	#[inline]
	pub const fn start(&self) -> CharIdx {
		self.start
	}

	#[inline]
	pub const fn end(&self) -> CharIdx {
		self.end
	}

	/// Returns the length of the range in characters.
	#[inline]
	pub const fn len(&self) -> CharLen {
		self.end - self.start
	}

	/// Returns true if the range spans no characters.
	#[inline]
	pub const fn is_empty(&self) -> bool {
		self.start == self.end
	}

	/// Returns true if `other` lies entirely within this range.
	#[inline]
	pub fn contains_range(&self, other: &TextRange) -> bool {
		self.start <= other.start && other.end <= self.end
	}
}

impl From<std::ops::Range<CharIdx>> for TextRange {
	fn from(range: std::ops::Range<CharIdx>) -> Self {
		Self::new(range.start, range.end)
	}
}

impl From<TextRange> for std::ops::Range<CharIdx> {
	fn from(range: TextRange) -> Self {
		range.start..range.end
	}
}

impl std::fmt::Display for TextRange {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "[{}, {})", self.start, self.end)
	}
}
