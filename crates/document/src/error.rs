//! Error types for document edits.

use sluice_primitives::CharIdx;
use thiserror::Error;

/// Errors returned when an edit or range query is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
	/// The document is read-only.
	#[error("document is read-only")]
	ReadOnly,

	/// The range end lies before its start.
	#[error("inverted range {start}..{end}")]
	InvalidRange {
		/// Requested start offset.
		start: CharIdx,
		/// Requested end offset.
		end: CharIdx,
	},

	/// The range extends past the end of the document.
	#[error("range {start}..{end} exceeds document length {len}")]
	OutOfBounds {
		/// Requested start offset.
		start: CharIdx,
		/// Requested end offset.
		end: CharIdx,
		/// Document length in chars at the time of the request.
		len: usize,
	},
}

/// Checks that `start..end` is a valid range in a document of `len` chars.
pub(crate) fn check_range(start: CharIdx, end: CharIdx, len: usize) -> Result<(), EditError> {
	if start > end {
		return Err(EditError::InvalidRange { start, end });
	}
	if end > len {
		return Err(EditError::OutOfBounds { start, end, len });
	}
	Ok(())
}
