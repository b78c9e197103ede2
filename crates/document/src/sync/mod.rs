//! Two-way synchronization between a document region and a standalone document.
//!
//! A [`DocumentsSynchronizer`] mirrors the text under a range marker in the
//! source document (`document1`) into a derived document (`document2`):
//!
//! - Source edits resync the whole derived text from the marker's current
//!   range. Once the marker is invalid the derived document is frozen into a
//!   read-only placeholder.
//! - Derived edits are translated by the marker start and replayed into the
//!   source, unless the marker is invalid or the source is read-only.
//!
//! The synchronizer's own writes raise a per-instance guard that both
//! listeners honour, so a write-through never echoes back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use sluice_primitives::{CharIdx, TextRange};

use crate::document::Document;
use crate::error::EditError;
use crate::event::{DocumentEvent, ListenerId};
use crate::marker::RangeMarker;


/// Derived-document content shown once the mapped region is gone.
pub const INVALID_SELECTION_TEXT: &str = "Invalid selection range";

struct SyncInner {
	source: Document,
	derived: Document,
	marker: RangeMarker,
	during_modification: AtomicBool,
	listeners: Mutex<Option<(ListenerId, ListenerId)>>,
}

/// Keeps a derived document equal to a marked region of a source document.
pub struct DocumentsSynchronizer {
	inner: Arc<SyncInner>,
}

impl std::fmt::Debug for DocumentsSynchronizer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DocumentsSynchronizer")
			.field("source", &self.inner.source.id())
			.field("derived", &self.inner.derived.id())
			.field("range", &self.inner.marker.range())
			.field("listening", &self.is_listening())
			.finish()
	}
}

impl DocumentsSynchronizer {
	/// Creates a synchronizer mapping `range` of `source` onto `derived`.
	///
	/// The marker is greedy on both edges so text typed at either end of the
	/// derived document stays inside the mapped region. Nothing is copied until
	/// [`start_listen`](Self::start_listen).
	pub fn new(source: Document, derived: Document, range: TextRange) -> Result<Self, EditError> {
		let marker = source.create_range_marker_with(range, true, true)?;
		Ok(Self {
			inner: Arc::new(SyncInner {
				source,
				derived,
				marker,
				during_modification: AtomicBool::new(false),
				listeners: Mutex::new(None),
			}),
		})
	}

	/// The source document.
	pub fn document1(&self) -> &Document {
		&self.inner.source
	}

	/// The derived document.
	pub fn document2(&self) -> &Document {
		&self.inner.derived
	}

	/// The marker delimiting the mapped region of the source.
	pub fn marker(&self) -> &RangeMarker {
		&self.inner.marker
	}

	pub fn is_listening(&self) -> bool {
		self.inner.listeners.lock().is_some()
	}

	/// Copies the mapped region into the derived document and subscribes to
	/// both documents. Calling it while already listening does nothing.
	pub fn start_listen(&self) {
		let mut listeners = self.inner.listeners.lock();
		if listeners.is_some() {
			return;
		}

		self.inner.refresh_derived(!self.inner.source.is_writable());

		let weak = Arc::downgrade(&self.inner);
		let source_id = self.inner.source.add_listener(listener(&weak, SyncInner::on_document_changed1));
		let derived_id = self.inner.derived.add_listener(listener(&weak, SyncInner::on_document_changed2));
		*listeners = Some((source_id, derived_id));

		tracing::debug!(
			source = %self.inner.source.id(),
			derived = %self.inner.derived.id(),
			valid = self.inner.marker.is_valid(),
			"sync.start_listen"
		);
	}

	/// Unsubscribes from both documents. Calling it while not listening does nothing.
	pub fn stop_listen(&self) {
		let Some((source_id, derived_id)) = self.inner.listeners.lock().take() else {
			return;
		};
		self.inner.source.remove_listener(source_id);
		self.inner.derived.remove_listener(derived_id);
		tracing::debug!(source = %self.inner.source.id(), derived = %self.inner.derived.id(), "sync.stop_listen");
	}
}

impl Drop for DocumentsSynchronizer {
	fn drop(&mut self) {
		self.stop_listen();
	}
}

fn listener(weak: &Weak<SyncInner>, handler: fn(&SyncInner, &DocumentEvent)) -> impl Fn(&DocumentEvent) + Send + Sync + 'static {
	let weak = Weak::clone(weak);
	move |event| {
		if let Some(inner) = weak.upgrade()
			&& !inner.during_modification.load(Ordering::Acquire)
		{
			handler(&inner, event);
		}
	}
}

impl SyncInner {
	/// Source changed: resync the derived document from the marker.
	fn on_document_changed1(&self, _event: &DocumentEvent) {
		self.refresh_derived(!self.derived.is_writable());
	}

	/// Derived changed: replay the edit into the source.
	fn on_document_changed2(&self, event: &DocumentEvent) {
		let Some(range) = self.marker.range() else {
			return;
		};
		if !self.source.is_writable() {
			return;
		}

		let start = range.start() + event.offset;
		self.replace_string(&self.source, start, start + event.old_len, &event.new_fragment);
	}

	/// Replaces the derived text with the marked source text, or with the
	/// placeholder once the marker is invalid. `read_only` is the derived
	/// document's writability to restore while the marker is valid.
	fn refresh_derived(&self, read_only: bool) {
		match self.marker.range().and_then(|range| self.source.slice(range).ok()) {
			Some(text) => self.overwrite_derived(&text, read_only),
			None => self.overwrite_derived(INVALID_SELECTION_TEXT, true),
		}
	}

	fn overwrite_derived(&self, text: &str, read_only: bool) {
		self.derived.set_read_only(false);
		let len = self.derived.text_len();
		self.replace_string(&self.derived, 0, len, text);
		self.derived.set_read_only(read_only);
	}

	fn replace_string(&self, document: &Document, start: CharIdx, end: CharIdx, text: &str) {
		if self.during_modification.swap(true, Ordering::AcqRel) {
			tracing::warn!(doc = %document.id(), start, end, "sync.reentrant_write");
			return;
		}
		let _guard = ModificationGuard(&self.during_modification);

		if let Err(err) = document.replace_string(start, end, text) {
			tracing::warn!(doc = %document.id(), start, end, error = %err, "sync.replace_failed");
		}
	}
}

struct ModificationGuard<'a>(&'a AtomicBool);

impl Drop for ModificationGuard<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}
