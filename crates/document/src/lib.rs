//! Listenable text documents, self-adjusting range markers and the
//! synchronizer that mirrors a document region into a standalone document.

mod document;
mod error;
mod event;
mod fragment;
mod marker;
mod sync;

pub use document::{Document, DocumentId};
pub use error::EditError;
pub use event::{DocumentEvent, DocumentListener, ListenerId};
pub use fragment::FragmentContent;
pub use marker::RangeMarker;
pub use sync::{DocumentsSynchronizer, INVALID_SELECTION_TEXT};
