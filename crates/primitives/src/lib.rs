//! Core text types shared by documents and markers: ranges, single edits and rope helpers.

/// Single-edit change descriptions and position mapping.
pub mod change;
/// Text range types and char index aliases.
pub mod range;
/// Rope utilities and extensions.
pub mod rope;

pub use change::{Bias, TextChange};
pub use range::{CharIdx, CharLen, TextRange};
pub use rope::{line_end, line_of, line_start, visible_line_count};
pub use ropey::{Rope, RopeSlice};
