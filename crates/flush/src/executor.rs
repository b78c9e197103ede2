//! Execution contexts that run flush passes.
//!
//! [`EventLoop`] owns a dedicated named thread standing in for the UI thread.
//! [`ManualExecutor`] only collects jobs; whoever owns the real event loop
//! pumps it with [`ManualExecutor::run_pending`].

use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::thread::{self, JoinHandle, ThreadId};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::panic_message;

/// Unit of work submitted to an execution context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// An execution context accepting jobs to run later, in submission order.
pub trait Executor: Send + Sync {
	fn accept(&self, job: Job);
}

impl<F> Executor for F
where
	F: Fn(Job) + Send + Sync,
{
	fn accept(&self, job: Job) {
		self(job)
	}
}

/// Collects jobs until the owner runs them.
#[derive(Default)]
pub struct ManualExecutor {
	jobs: Mutex<VecDeque<Job>>,
}

impl ManualExecutor {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn pending(&self) -> usize {
		self.jobs.lock().len()
	}

	/// Runs the jobs queued at the time of the call. Jobs they submit wait
	/// for the next call. Returns how many ran.
	pub fn run_pending(&self) -> usize {
		let batch = std::mem::take(&mut *self.jobs.lock());
		let ran = batch.len();
		for job in batch {
			job();
		}
		ran
	}

	/// Runs jobs until none are left, including ones submitted along the way.
	pub fn run_until_idle(&self) -> usize {
		let mut total = 0;
		loop {
			match self.run_pending() {
				0 => return total,
				ran => total += ran,
			}
		}
	}
}

impl Executor for ManualExecutor {
	fn accept(&self, job: Job) {
		self.jobs.lock().push_back(job);
	}
}

impl std::fmt::Debug for ManualExecutor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ManualExecutor").field("pending", &self.pending()).finish()
	}
}

enum Message {
	Run(Job),
	Shutdown,
}

/// Cloneable submitter for an [`EventLoop`].
#[derive(Clone)]
pub struct EventLoopHandle {
	tx: mpsc::UnboundedSender<Message>,
	thread: ThreadId,
}

impl EventLoopHandle {
	/// Returns true when called from the loop thread.
	pub fn is_loop_thread(&self) -> bool {
		thread::current().id() == self.thread
	}

	pub fn is_closed(&self) -> bool {
		self.tx.is_closed()
	}
}

impl Executor for EventLoopHandle {
	fn accept(&self, job: Job) {
		if self.tx.send(Message::Run(job)).is_err() {
			tracing::warn!("event_loop.job_dropped");
		}
	}
}

impl std::fmt::Debug for EventLoopHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventLoopHandle").field("thread", &self.thread).field("closed", &self.is_closed()).finish()
	}
}

/// Dedicated thread running submitted jobs one at a time.
///
/// A job that panics is logged and the loop keeps going. Dropping the loop
/// stops it once its channel is empty, including jobs submitted while it
/// drains, and joins the thread unless the drop happens on the loop thread
/// itself.
pub struct EventLoop {
	handle: EventLoopHandle,
	thread: Option<JoinHandle<()>>,
}

impl EventLoop {
	/// Spawns the loop thread under `name`.
	pub fn spawn(name: impl Into<String>) -> std::io::Result<Self> {
		let name = name.into();
		let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

		let thread = thread::Builder::new().name(name.clone()).spawn(move || {
			tracing::debug!(thread = %name, "event_loop.started");
			let run = |job: Job| {
				if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(job)) {
					tracing::error!(thread = %name, panic = %panic_message(payload), "event_loop.job_panicked");
				}
			};

			let mut ran = 0u64;
			while let Some(message) = rx.blocking_recv() {
				match message {
					Message::Run(job) => {
						ran += 1;
						run(job);
					}
					Message::Shutdown => {
						// Follow-up jobs submitted while draining still run.
						while let Ok(Message::Run(job)) = rx.try_recv() {
							ran += 1;
							run(job);
						}
						break;
					}
				}
			}
			tracing::debug!(thread = %name, ran, "event_loop.stopped");
		})?;

		Ok(Self {
			handle: EventLoopHandle {
				tx,
				thread: thread.thread().id(),
			},
			thread: Some(thread),
		})
	}

	pub fn handle(&self) -> EventLoopHandle {
		self.handle.clone()
	}

	pub fn is_loop_thread(&self) -> bool {
		self.handle.is_loop_thread()
	}

	/// Stops the loop once its channel is empty and waits for the thread.
	pub fn shutdown(mut self) {
		self.stop();
	}

	fn stop(&mut self) {
		let Some(thread) = self.thread.take() else {
			return;
		};
		let _ = self.handle.tx.send(Message::Shutdown);
		if self.handle.is_loop_thread() {
			return;
		}
		if thread.join().is_err() {
			tracing::error!("event_loop.join_failed");
		}
	}
}

impl Executor for EventLoop {
	fn accept(&self, job: Job) {
		self.handle.accept(job);
	}
}

impl Drop for EventLoop {
	fn drop(&mut self) {
		self.stop();
	}
}

impl std::fmt::Debug for EventLoop {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventLoop").field("handle", &self.handle).field("running", &self.thread.is_some()).finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;

	#[test]
	fn manual_executor_defers_nested_jobs() {
		let executor = Arc::new(ManualExecutor::new());
		let log = Arc::new(Mutex::new(Vec::new()));

		let (inner_exec, inner_log) = (Arc::clone(&executor), Arc::clone(&log));
		executor.accept(Box::new(move || {
			inner_log.lock().push("outer");
			let log = Arc::clone(&inner_log);
			inner_exec.accept(Box::new(move || log.lock().push("nested")));
		}));

		assert_eq!(executor.run_pending(), 1);
		assert_eq!(*log.lock(), vec!["outer"]);
		assert_eq!(executor.pending(), 1);
		assert_eq!(executor.run_until_idle(), 1);
		assert_eq!(*log.lock(), vec!["outer", "nested"]);
	}

	#[test]
	fn closures_are_executors() {
		let ran = Arc::new(Mutex::new(0));
		let executor = |job: Job| job();
		let sink = Arc::clone(&ran);
		executor.accept(Box::new(move || *sink.lock() += 1));
		assert_eq!(*ran.lock(), 1);
	}

	#[test]
	fn event_loop_runs_in_order_and_survives_panics() {
		let event_loop = EventLoop::spawn("sluice-test-loop").unwrap();
		let (tx, rx) = std::sync::mpsc::channel();

		for i in 0..3 {
			let tx = tx.clone();
			event_loop.accept(Box::new(move || {
				tx.send((i, thread::current().name().map(str::to_owned))).unwrap();
			}));
			if i == 1 {
				event_loop.accept(Box::new(|| panic!("boom")));
			}
		}
		event_loop.shutdown();

		let seen: Vec<_> = rx.try_iter().collect();
		assert_eq!(seen.len(), 3);
		for (expected, (i, name)) in seen.into_iter().enumerate() {
			assert_eq!(i, expected);
			assert_eq!(name.as_deref(), Some("sluice-test-loop"));
		}
	}

	#[test]
	fn shutdown_runs_jobs_submitted_while_draining() {
		let event_loop = EventLoop::spawn("sluice-test-drain").unwrap();
		let handle = event_loop.handle();
		let (tx, rx) = std::sync::mpsc::channel();

		let first = tx.clone();
		event_loop.accept(Box::new(move || {
			first.send("first").unwrap();
			// Queued behind the shutdown request.
			std::thread::sleep(std::time::Duration::from_millis(20));
			handle.accept(Box::new(move || tx.send("follow-up").unwrap()));
		}));
		event_loop.shutdown();

		assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec!["first", "follow-up"]);
	}

	#[test]
	fn handle_reports_closed_after_shutdown() {
		let event_loop = EventLoop::spawn("sluice-test-closed").unwrap();
		let handle = event_loop.handle();
		assert!(!handle.is_loop_thread());
		drop(event_loop);
		assert!(handle.is_closed());
		handle.accept(Box::new(|| unreachable!()));
	}
}
