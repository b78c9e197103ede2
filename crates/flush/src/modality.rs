//! Modality: which blocking UI context is active, and what may run under it.
//!
//! Every queued item records the modality it was scheduled for. While the
//! current modality dominates an item's modality, the item must wait: work
//! scheduled outside a dialog does not run while that dialog is open.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// A modality tag with a dominance relation.
pub trait ModalityState: Clone + std::fmt::Debug + Send + Sync + 'static {
	/// Returns true if work scheduled under `other` must not run while `self`
	/// is current.
	fn dominates(&self, other: &Self) -> bool;
}

/// Source of the current modality consulted by a queue on every scan.
pub trait CurrentModality<M>: Send + Sync {
	fn current(&self) -> M;
}

impl<M, F> CurrentModality<M> for F
where
	F: Fn() -> M + Send + Sync,
{
	fn current(&self) -> M {
		self()
	}
}

static NEXT_ENTITY: AtomicU64 = AtomicU64::new(1);

/// Identifier of one modal context, such as an open dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModalEntity(u64);

impl ModalEntity {
	/// Allocates a process-unique entity.
	pub fn next() -> Self {
		Self(NEXT_ENTITY.fetch_add(1, Ordering::Relaxed))
	}

	pub const fn id(self) -> u64 {
		self.0
	}
}

/// Modality built from the set of modal entities active when work was scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modality {
	/// Runs under any modality.
	Any,
	/// Runs unless a modal entity outside this list is active.
	Entities(Arc<[ModalEntity]>),
}

impl Modality {
	/// The modality with no modal entities.
	pub fn non_modal() -> Self {
		Self::Entities(Arc::from(Vec::new()))
	}

	pub fn from_entities(entities: impl IntoIterator<Item = ModalEntity>) -> Self {
		Self::Entities(entities.into_iter().collect())
	}

	/// Returns the modal entities, empty for [`Modality::Any`].
	pub fn entities(&self) -> &[ModalEntity] {
		match self {
			Self::Any => &[],
			Self::Entities(entities) => entities,
		}
	}

	/// Returns a modality nested one level deeper inside `entity`.
	pub fn with_entity(&self, entity: ModalEntity) -> Self {
		let mut entities = self.entities().to_vec();
		entities.push(entity);
		Self::Entities(entities.into())
	}

	pub fn is_non_modal(&self) -> bool {
		matches!(self, Self::Entities(entities) if entities.is_empty())
	}
}

impl Default for Modality {
	fn default() -> Self {
		Self::non_modal()
	}
}

impl ModalityState for Modality {
	fn dominates(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Any, _) | (_, Self::Any) => false,
			(Self::Entities(mine), Self::Entities(theirs)) => mine.iter().any(|entity| !theirs.contains(entity)),
		}
	}
}

/// Stack of currently open modal entities.
#[derive(Debug, Default)]
pub struct ModalityStack {
	entities: Mutex<Vec<ModalEntity>>,
}

impl ModalityStack {
	pub fn new() -> Self {
		Self::default()
	}

	/// Opens `entity` on top of the stack and returns the new current modality.
	pub fn enter_modal(&self, entity: ModalEntity) -> Modality {
		let mut entities = self.entities.lock();
		entities.push(entity);
		tracing::debug!(entity = entity.id(), depth = entities.len(), "modality.enter");
		Modality::from_entities(entities.iter().copied())
	}

	/// Closes `entity` wherever it sits. Returns false if it was not open.
	pub fn leave_modal(&self, entity: ModalEntity) -> bool {
		let mut entities = self.entities.lock();
		let Some(pos) = entities.iter().rposition(|open| *open == entity) else {
			tracing::warn!(entity = entity.id(), "modality.leave_unknown");
			return false;
		};
		entities.remove(pos);
		tracing::debug!(entity = entity.id(), depth = entities.len(), "modality.leave");
		true
	}

	pub fn current(&self) -> Modality {
		Modality::from_entities(self.entities.lock().iter().copied())
	}

	pub fn depth(&self) -> usize {
		self.entities.lock().len()
	}

	pub fn is_modal(&self) -> bool {
		!self.entities.lock().is_empty()
	}
}

impl CurrentModality<Modality> for ModalityStack {
	fn current(&self) -> Modality {
		ModalityStack::current(self)
	}
}
