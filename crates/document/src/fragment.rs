//! A standalone document view over a region of another document.

use parking_lot::Mutex;
use sluice_primitives::TextRange;

use crate::document::Document;
use crate::error::EditError;
use crate::sync::DocumentsSynchronizer;

/// Derived document for a source region, synchronized while assigned.
///
/// Viewers call [`on_assigned`](Self::on_assigned) when they start and stop
/// showing the fragment. Synchronization runs only while at least one viewer
/// is assigned.
#[derive(Debug)]
pub struct FragmentContent {
	synchronizer: DocumentsSynchronizer,
	assignments: Mutex<usize>,
}

impl FragmentContent {
	/// Creates the derived document for `range` of `original`.
	pub fn new(original: &Document, range: TextRange) -> Result<Self, EditError> {
		let derived = Document::new(&original.slice(range)?);
		derived.set_read_only(!original.is_writable());
		let synchronizer = DocumentsSynchronizer::new(original.clone(), derived, range)?;
		Ok(Self {
			synchronizer,
			assignments: Mutex::new(0),
		})
	}

	/// The derived document holding the fragment text.
	pub fn document(&self) -> &Document {
		self.synchronizer.document2()
	}

	/// The source document the fragment was cut from.
	pub fn original_document(&self) -> &Document {
		self.synchronizer.document1()
	}

	pub fn synchronizer(&self) -> &DocumentsSynchronizer {
		&self.synchronizer
	}

	/// Current number of assigned viewers.
	pub fn assignments(&self) -> usize {
		*self.assignments.lock()
	}

	/// Records a viewer being assigned (`true`) or released (`false`).
	pub fn on_assigned(&self, assigned: bool) {
		let mut assignments = self.assignments.lock();
		if assigned {
			if *assignments == 0 {
				self.synchronizer.start_listen();
			}
			*assignments += 1;
			return;
		}

		match *assignments {
			0 => tracing::warn!(doc = %self.document().id(), "fragment.unbalanced_release"),
			1 => {
				*assignments = 0;
				self.synchronizer.stop_listen();
			}
			n => *assignments = n - 1,
		}
	}
}
