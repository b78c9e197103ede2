//! Modality-aware deferred callback queue.
//!
//! Items are drained on the executor in FIFO order, a budget's worth at a
//! time. Items whose modality is dominated by the current one are parked in
//! a skipped buffer and put back at the head, in order, when the queue is
//! asked to reinclude them. Expired items are completed without running.
//!
//! All queue bookkeeping shares one mutex. Tasks, completion callbacks and
//! executor submission always run with it released, so any of them may push
//! or flush again.

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::{Mutex, MutexGuard};

use crate::config::FlushConfig;
use crate::error::{FlushError, TaskError, panic_message};
use crate::executor::Executor;
use crate::info::{Completion, ItemDescriptor, RunnableInfo};
use crate::modality::{CurrentModality, ModalityState};


struct QueueState<M> {
	queue: VecDeque<RunnableInfo<M>>,
	skipped: VecDeque<RunnableInfo<M>>,
	may_have_items: bool,
	flush_scheduled: bool,
}

/// Outcome of one [`FlushQueue::flush_now`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
	/// Items that ran, whatever their outcome.
	pub executed: usize,
	/// The pass stopped on the time budget and requested a follow-up flush.
	pub budget_exhausted: bool,
}

/// Deferred callback queue drained on an [`Executor`].
pub struct FlushQueue<M: ModalityState> {
	state: Mutex<QueueState<M>>,
	last_info: Mutex<Option<ItemDescriptor<M>>>,
	executor: Arc<dyn Executor>,
	modality: Arc<dyn CurrentModality<M>>,
	config: FlushConfig,
	weak_self: Weak<Self>,
}

impl<M: ModalityState> FlushQueue<M> {
	/// Creates a queue flushing on `executor` and reading the current
	/// modality from `modality` on every scan.
	pub fn new(executor: Arc<dyn Executor>, modality: Arc<dyn CurrentModality<M>>, config: FlushConfig) -> Arc<Self> {
		Arc::new_cyclic(|weak_self| Self {
			state: Mutex::new(QueueState {
				queue: VecDeque::new(),
				skipped: VecDeque::new(),
				may_have_items: false,
				flush_scheduled: false,
			}),
			last_info: Mutex::new(None),
			executor,
			modality,
			config,
			weak_self: Weak::clone(weak_self),
		})
	}

	pub fn config(&self) -> &FlushConfig {
		&self.config
	}

	/// Appends `info` to the tail. Does not schedule a flush.
	pub fn push(&self, info: RunnableInfo<M>) {
		let mut state = self.state.lock();
		tracing::trace!(seq = info.seq(), queued = state.queue.len() + 1, "flush.push");
		state.queue.push_back(info);
		state.may_have_items = true;
	}

	/// Submits one flush pass to the executor.
	pub fn schedule_flush(&self) {
		self.state.lock().flush_scheduled = true;
		self.submit_flush();
	}

	/// Submits a flush pass unless one is already pending or the queue is
	/// known to be empty. Returns true if a pass was submitted.
	pub fn request_flush(&self) -> bool {
		{
			let mut state = self.state.lock();
			if state.flush_scheduled || !state.may_have_items {
				return false;
			}
			state.flush_scheduled = true;
		}
		self.submit_flush();
		true
	}

	fn submit_flush(&self) {
		let weak = Weak::clone(&self.weak_self);
		self.executor.accept(Box::new(move || {
			let Some(queue) = weak.upgrade() else {
				return;
			};
			if let Err(err) = queue.flush_now() {
				std::panic::panic_any(err);
			}
		}));
	}

	/// Runs eligible items until none is left or the time budget is spent.
	///
	/// Once the budget is exceeded the remaining items stay queued and a
	/// follow-up flush is requested. With `rethrow_errors` set, the first
	/// failing task ends the pass with its error; the rest of the queue is
	/// still flushed later. Scheduled passes resume that error as a panic.
	pub fn flush_now(&self) -> Result<FlushReport, FlushError> {
		self.state.lock().flush_scheduled = false;
		let started = Instant::now();
		let mut report = FlushReport::default();

		loop {
			match self.run_next_event() {
				Ok(true) => report.executed += 1,
				Ok(false) => break,
				Err(err) => {
					self.request_flush();
					return Err(err);
				}
			}

			let elapsed = started.elapsed();
			if elapsed > self.config.budget {
				report.budget_exhausted = true;
				tracing::debug!(
					executed = report.executed,
					elapsed_us = elapsed.as_micros() as u64,
					budget_us = self.config.budget.as_micros() as u64,
					remaining = self.state.lock().queue.len(),
					"flush.budget_exhausted"
				);
				self.request_flush();
				break;
			}
		}

		Ok(report)
	}

	/// Removes and returns the first eligible item.
	///
	/// Expired items met on the way are dropped and completed with
	/// [`Completion::Expired`]; dominated items move to the skipped buffer.
	pub fn take_next_event(&self) -> Option<RunnableInfo<M>> {
		self.next_event(|queue| queue.pop_front())
	}

	/// Like [`take_next_event`](Self::take_next_event) but leaves the eligible
	/// item at the head and returns its descriptor.
	pub fn peek_next_event(&self) -> Option<ItemDescriptor<M>> {
		self.next_event(|queue| queue.front().map(RunnableInfo::descriptor))
	}

	fn next_event<T>(&self, take: impl FnOnce(&mut VecDeque<RunnableInfo<M>>) -> Option<T>) -> Option<T> {
		let mut expired = Vec::new();
		let found = {
			let mut state = self.state.lock();
			if self.scan_to_eligible(&mut state, &mut expired) {
				take(&mut state.queue)
			} else {
				None
			}
		};
		complete_expired(expired);
		found
	}

	/// Advances until the head is eligible. Returns false when the main queue
	/// runs out.
	fn scan_to_eligible(&self, state: &mut QueueState<M>, expired: &mut Vec<RunnableInfo<M>>) -> bool {
		let current = self.modality.current();
		while let Some(head) = state.queue.front() {
			let expire = head.is_expired();
			let skip = !expire && current.dominates(head.modality());
			if !expire && !skip {
				return true;
			}
			let Some(item) = state.queue.pop_front() else {
				break;
			};
			if expire {
				expired.push(item);
			} else {
				tracing::trace!(seq = item.seq(), current = ?current, "flush.skip");
				state.skipped.push_back(item);
			}
		}
		state.may_have_items = false;
		false
	}

	/// Puts skipped items back at the head of the queue in their original order.
	pub fn reinclude_skipped_items(&self) {
		let mut state = self.state.lock();
		Self::reinclude(&mut state);
	}

	fn reinclude(state: &mut QueueState<M>) {
		if state.skipped.is_empty() {
			return;
		}
		tracing::trace!(count = state.skipped.len(), "flush.reinclude");
		while let Some(item) = state.skipped.pop_back() {
			state.queue.push_front(item);
		}
		state.may_have_items = true;
	}

	/// Reincludes skipped items, then drops every expired item. Survivors keep
	/// their order. Returns how many items were dropped.
	pub fn purge_expired_items(&self) -> usize {
		let expired = {
			let mut state = self.state.lock();
			Self::reinclude(&mut state);
			let (expired, alive): (VecDeque<_>, VecDeque<_>) = std::mem::take(&mut state.queue).into_iter().partition(RunnableInfo::is_expired);
			state.queue = alive;
			state.may_have_items = !state.queue.is_empty();
			expired
		};
		let purged = expired.len();
		if purged > 0 {
			tracing::debug!(purged, "flush.purge");
		}
		complete_expired(expired);
		purged
	}

	/// Takes the next eligible item and runs it. Returns false when there was
	/// nothing to run.
	///
	/// Cancellation is not an error. Other failures, panics included, are
	/// logged, or returned when the queue rethrows errors. The item's
	/// completion is signalled on every path.
	pub fn run_next_event(&self) -> Result<bool, FlushError> {
		let Some(info) = self.take_next_event() else {
			return Ok(false);
		};
		let seq = info.seq();
		let running = RunningGuard::enter(&self.last_info, info.descriptor());
		let (task, done) = info.into_parts();

		tracing::trace!(seq, "flush.run");
		let (completion, failure) = match std::panic::catch_unwind(AssertUnwindSafe(task)) {
			Ok(Ok(())) => (Completion::Ran, None),
			Ok(Err(TaskError::Cancelled)) => (Completion::Cancelled, None),
			Ok(Err(source)) => (Completion::Failed(source.to_string()), Some(FlushError::Task { seq, source })),
			Err(payload) => {
				let message = panic_message(payload);
				(Completion::Failed(message.clone()), Some(FlushError::Panicked { seq, message }))
			}
		};
		drop(running);
		done.signal(completion);

		match failure {
			None => Ok(true),
			Some(err) if self.config.rethrow_errors => Err(err),
			Some(err) => {
				tracing::error!(seq, error = %err, "flush.task_failed");
				Ok(true)
			}
		}
	}

	/// Live read-only view of the main queue. Holds the queue lock until
	/// dropped, so do not push or flush while holding it.
	pub fn queue(&self) -> QueueView<'_, M> {
		QueueView { state: self.state.lock() }
	}

	/// Returns true if the queue may hold items, skipped ones included.
	pub fn has_pending_items(&self) -> bool {
		let state = self.state.lock();
		!state.queue.is_empty() || !state.skipped.is_empty()
	}

	pub fn is_flush_scheduled(&self) -> bool {
		self.state.lock().flush_scheduled
	}

	/// Descriptor of the item currently running, if any.
	pub fn current_item(&self) -> Option<ItemDescriptor<M>> {
		self.last_info.lock().clone()
	}
}

impl<M: ModalityState> std::fmt::Debug for FlushQueue<M> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.lock();
		f.debug_struct("FlushQueue")
			.field("queued", &state.queue.len())
			.field("skipped", &state.skipped.len())
			.field("may_have_items", &state.may_have_items)
			.field("flush_scheduled", &state.flush_scheduled)
			.field("budget", &self.config.budget)
			.finish_non_exhaustive()
	}
}

fn complete_expired<M: ModalityState>(items: impl IntoIterator<Item = RunnableInfo<M>>) {
	for item in items {
		tracing::trace!(seq = item.seq(), "flush.expired");
		item.expire();
	}
}

/// Publishes the running item's descriptor and restores the previous one on
/// drop, so nested flushes report correctly.
struct RunningGuard<'a, M> {
	slot: &'a Mutex<Option<ItemDescriptor<M>>>,
	previous: Option<ItemDescriptor<M>>,
}

impl<'a, M> RunningGuard<'a, M> {
	fn enter(slot: &'a Mutex<Option<ItemDescriptor<M>>>, descriptor: ItemDescriptor<M>) -> Self {
		let previous = slot.lock().replace(descriptor);
		Self { slot, previous }
	}
}

impl<M> Drop for RunningGuard<'_, M> {
	fn drop(&mut self) {
		*self.slot.lock() = self.previous.take();
	}
}

/// Read-only view of the queued items, in order.
pub struct QueueView<'a, M> {
	state: MutexGuard<'a, QueueState<M>>,
}

impl<M: ModalityState> QueueView<'_, M> {
	pub fn len(&self) -> usize {
		self.state.queue.len()
	}

	pub fn is_empty(&self) -> bool {
		self.state.queue.is_empty()
	}

	/// Items parked by the last scans, waiting for reinclusion.
	pub fn skipped_len(&self) -> usize {
		self.state.skipped.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = ItemDescriptor<M>> + '_ {
		self.state.queue.iter().map(RunnableInfo::descriptor)
	}

	pub fn seqs(&self) -> Vec<u64> {
		self.state.queue.iter().map(RunnableInfo::seq).collect()
	}
}
