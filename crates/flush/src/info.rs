//! Queued work items.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::TaskError;
use crate::expiry::Expiry;
use crate::modality::ModalityState;

/// Deferred callback body.
pub type Task = Box<dyn FnOnce() -> Result<(), TaskError> + Send + 'static>;

/// Called once with the outcome when an item leaves the queue.
pub type CompletionCallback = Box<dyn FnOnce(Completion) + Send + 'static>;

/// How a queued item left the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
	/// The task ran to completion.
	Ran,
	/// The task reported cancellation.
	Cancelled,
	/// The task failed or panicked; carries the rendered error.
	Failed(String),
	/// The item expired before it could run.
	Expired,
}

static NEXT_SEQ: AtomicU64 = AtomicU64::new(1);

/// One queued callback with its scheduling context.
pub struct RunnableInfo<M> {
	seq: u64,
	task: Task,
	modality: M,
	expiry: Expiry,
	on_done: Option<CompletionCallback>,
}

impl<M: ModalityState> RunnableInfo<M> {
	pub fn new(task: impl FnOnce() -> Result<(), TaskError> + Send + 'static, modality: M) -> Self {
		Self {
			seq: NEXT_SEQ.fetch_add(1, Ordering::Relaxed),
			task: Box::new(task),
			modality,
			expiry: Expiry::never(),
			on_done: None,
		}
	}

	/// Wraps an infallible closure.
	pub fn from_fn(f: impl FnOnce() + Send + 'static, modality: M) -> Self {
		Self::new(
			move || {
				f();
				Ok(())
			},
			modality,
		)
	}

	pub fn with_expiry(mut self, expiry: Expiry) -> Self {
		self.expiry = expiry;
		self
	}

	pub fn on_done(mut self, callback: impl FnOnce(Completion) + Send + 'static) -> Self {
		self.on_done = Some(Box::new(callback));
		self
	}

	pub fn seq(&self) -> u64 {
		self.seq
	}

	pub fn modality(&self) -> &M {
		&self.modality
	}

	pub fn expiry(&self) -> &Expiry {
		&self.expiry
	}

	pub fn is_expired(&self) -> bool {
		self.expiry.is_expired()
	}

	pub fn descriptor(&self) -> ItemDescriptor<M> {
		ItemDescriptor {
			seq: self.seq,
			modality: self.modality.clone(),
		}
	}

	/// Splits the item into its task and a completion signal.
	pub(crate) fn into_parts(self) -> (Task, Done) {
		(self.task, Done(self.on_done))
	}

	/// Signals [`Completion::Expired`] without running the task.
	pub(crate) fn expire(self) {
		Done(self.on_done).signal(Completion::Expired);
	}
}

impl<M: std::fmt::Debug> std::fmt::Debug for RunnableInfo<M> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RunnableInfo")
			.field("seq", &self.seq)
			.field("modality", &self.modality)
			.field("expiry", &self.expiry)
			.finish_non_exhaustive()
	}
}

/// Pending completion signal of an item that left the queue.
pub(crate) struct Done(Option<CompletionCallback>);

impl Done {
	pub(crate) fn signal(mut self, completion: Completion) {
		if let Some(callback) = self.0.take() {
			callback(completion);
		}
	}
}

/// Cloneable summary of a queued item for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDescriptor<M> {
	pub seq: u64,
	pub modality: M,
}
