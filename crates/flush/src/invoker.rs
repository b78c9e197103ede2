//! Owner of the UI queue: tracks modal contexts and schedules deferred work.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::config::FlushConfig;
use crate::error::TaskError;
use crate::executor::{EventLoop, Executor};
use crate::expiry::Expiry;
use crate::info::{Completion, RunnableInfo};
use crate::modality::{ModalEntity, Modality, ModalityStack};
use crate::queue::FlushQueue;

/// Schedules callbacks onto one execution context, honouring modal dialogs.
///
/// Built either over an existing [`Executor`] or over its own [`EventLoop`].
/// Work scheduled with [`invoke_later`](Self::invoke_later) is tagged with
/// the modality current at that moment, so it waits while a dialog opened
/// afterwards is still up.
pub struct LaterInvoker {
	event_loop: Option<EventLoop>,
	modality: Arc<ModalityStack>,
	queue: Arc<FlushQueue<Modality>>,
}

impl LaterInvoker {
	pub fn new(executor: Arc<dyn Executor>, config: FlushConfig) -> Self {
		let modality = Arc::new(ModalityStack::new());
		let queue = FlushQueue::new(executor, modality.clone(), config);
		Self {
			event_loop: None,
			modality,
			queue,
		}
	}

	/// Spawns a dedicated event loop thread named after `config.thread_name`.
	pub fn spawn(config: FlushConfig) -> std::io::Result<Self> {
		let event_loop = EventLoop::spawn(config.thread_name.clone())?;
		let mut invoker = Self::new(Arc::new(event_loop.handle()), config);
		invoker.event_loop = Some(event_loop);
		Ok(invoker)
	}

	/// Runs `f` later under the current modality. Returns the item's sequence number.
	pub fn invoke_later(&self, f: impl FnOnce() + Send + 'static) -> u64 {
		self.submit(RunnableInfo::from_fn(f, self.current_modality()))
	}

	/// Runs `task` later under `modality`, unless `expiry` fires first.
	pub fn invoke_later_with(&self, task: impl FnOnce() -> Result<(), TaskError> + Send + 'static, modality: Modality, expiry: Expiry) -> u64 {
		self.submit(RunnableInfo::new(task, modality).with_expiry(expiry))
	}

	/// Like [`invoke_later`](Self::invoke_later), resolving the receiver with
	/// the item's [`Completion`] once it leaves the queue.
	pub fn invoke_with_completion(&self, f: impl FnOnce() + Send + 'static, expiry: Expiry) -> oneshot::Receiver<Completion> {
		let (tx, rx) = oneshot::channel();
		let info = RunnableInfo::from_fn(f, self.current_modality()).with_expiry(expiry).on_done(move |completion| {
			let _ = tx.send(completion);
		});
		self.submit(info);
		rx
	}

	/// Queues a fully built item and requests a flush.
	pub fn submit(&self, info: RunnableInfo<Modality>) -> u64 {
		let seq = info.seq();
		self.queue.push(info);
		self.queue.request_flush();
		seq
	}

	/// Opens a modal context. Work queued before it waits until it closes.
	pub fn enter_modal(&self, entity: ModalEntity) -> Modality {
		self.modality.enter_modal(entity)
	}

	/// Closes a modal context and lets work it held back run again.
	pub fn leave_modal(&self, entity: ModalEntity) -> bool {
		if !self.modality.leave_modal(entity) {
			return false;
		}
		self.queue.reinclude_skipped_items();
		self.queue.request_flush();
		true
	}

	pub fn current_modality(&self) -> Modality {
		self.modality.current()
	}

	pub fn queue(&self) -> &Arc<FlushQueue<Modality>> {
		&self.queue
	}

	pub fn event_loop(&self) -> Option<&EventLoop> {
		self.event_loop.as_ref()
	}
}

impl Drop for LaterInvoker {
	/// Stops the owned loop while the queue is alive, so every pass already
	/// scheduled, and each follow-up it requests, still runs.
	fn drop(&mut self) {
		if let Some(event_loop) = self.event_loop.take() {
			event_loop.shutdown();
		}
		let queued = self.queue.queue();
		if !queued.is_empty() || queued.skipped_len() > 0 {
			tracing::warn!(queued = queued.len(), skipped = queued.skipped_len(), "invoker.dropped_pending");
		}
	}
}

impl std::fmt::Debug for LaterInvoker {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LaterInvoker")
			.field("modality", &self.modality.current())
			.field("queue", &self.queue)
			.field("event_loop", &self.event_loop)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use parking_lot::Mutex;
	use tokio_util::sync::CancellationToken;

	use super::*;
	use crate::ManualExecutor;

	fn manual() -> (LaterInvoker, Arc<ManualExecutor>) {
		let executor = Arc::new(ManualExecutor::new());
		(LaterInvoker::new(executor.clone(), FlushConfig::default()), executor)
	}

	fn logger(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> impl FnOnce() + Send + 'static {
		let log = Arc::clone(log);
		move || log.lock().push(name)
	}

	#[test]
	fn invoke_later_runs_on_next_pump() {
		let (invoker, executor) = manual();
		let log = Arc::new(Mutex::new(Vec::new()));
		invoker.invoke_later(logger(&log, "a"));
		invoker.invoke_later(logger(&log, "b"));

		assert!(log.lock().is_empty());
		assert_eq!(executor.pending(), 1);
		executor.run_until_idle();
		assert_eq!(*log.lock(), vec!["a", "b"]);
	}

	#[test]
	fn leave_modal_releases_held_work_in_order() {
		let (invoker, executor) = manual();
		let log = Arc::new(Mutex::new(Vec::new()));
		invoker.invoke_later(logger(&log, "first"));
		invoker.invoke_later(logger(&log, "second"));

		let dialog = ModalEntity::next();
		invoker.enter_modal(dialog);
		invoker.invoke_later(logger(&log, "in dialog"));
		executor.run_until_idle();
		assert_eq!(*log.lock(), vec!["in dialog"]);

		assert!(invoker.leave_modal(dialog));
		executor.run_until_idle();
		assert_eq!(*log.lock(), vec!["in dialog", "first", "second"]);
		assert!(!invoker.leave_modal(dialog));
	}

	#[test]
	fn cancelled_work_is_reported_expired() {
		let (invoker, executor) = manual();
		let token = CancellationToken::new();
		let mut done = invoker.invoke_with_completion(|| unreachable!(), Expiry::on_cancel(token.clone()));
		token.cancel();

		executor.run_until_idle();
		assert_eq!(done.try_recv(), Ok(Completion::Expired));
	}

	#[test]
	fn fallible_work_reports_failure() {
		let (invoker, executor) = manual();
		invoker.invoke_later_with(|| Err(TaskError::failed("nope")), Modality::Any, Expiry::never());
		executor.run_until_idle();
		assert!(!invoker.queue().has_pending_items());
	}
}
