//! Rope utilities and extensions.

use ropey::RopeSlice;

use crate::range::CharIdx;

/// Returns the number of lines, including the empty line after a trailing newline.
#[inline]
pub fn visible_line_count(text: RopeSlice) -> usize {
	text.len_lines()
}

/// Returns the char offset of the first character on `line`.
///
/// Lines past the end clamp to the document length.
pub fn line_start(text: RopeSlice, line: usize) -> CharIdx {
	if line >= text.len_lines() {
		return text.len_chars();
	}
	text.line_to_char(line)
}

/// Returns the char offset just past the last character of `line`, excluding
/// its line break.
pub fn line_end(text: RopeSlice, line: usize) -> CharIdx {
	if line >= text.len_lines() {
		return text.len_chars();
	}
	let start = text.line_to_char(line);
	let line_text = text.line(line);
	let mut len = line_text.len_chars();
	if len > 0 && line_text.char(len - 1) == '\n' {
		len -= 1;
		if len > 0 && line_text.char(len - 1) == '\r' {
			len -= 1;
		}
	}
	start + len
}

/// Returns the zero-based line containing `pos`, clamping past-the-end offsets
/// to the last line.
pub fn line_of(text: RopeSlice, pos: CharIdx) -> usize {
	text.char_to_line(pos.min(text.len_chars()))
}
