//! Error types for queued tasks, flushing and configuration.

use thiserror::Error;

/// Outcome reported by a queued task that did not complete normally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
	/// The task observed a user or process cancellation. Not a failure.
	#[error("task cancelled")]
	Cancelled,

	/// The task failed.
	#[error("{0}")]
	Failed(String),
}

impl TaskError {
	/// Wraps any displayable error as a failure.
	pub fn failed(err: impl std::fmt::Display) -> Self {
		Self::Failed(err.to_string())
	}
}

/// Task failure surfaced by the queue when errors are rethrown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlushError {
	/// The task returned an error other than cancellation.
	#[error("queued task #{seq} failed: {source}")]
	Task {
		/// Sequence number of the failed item.
		seq: u64,
		/// The error the task returned.
		#[source]
		source: TaskError,
	},

	/// The task panicked.
	#[error("queued task #{seq} panicked: {message}")]
	Panicked {
		/// Sequence number of the failed item.
		seq: u64,
		/// Panic payload rendered as text.
		message: String,
	},
}

/// Errors that can occur when loading flush configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or field types.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// The flush budget must allow at least one millisecond.
	#[error("invalid flush budget: {0} ms (expected > 0)")]
	InvalidBudget(u64),

	/// The event loop thread name is empty.
	#[error("event loop thread name must not be empty")]
	EmptyThreadName,
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
	if let Some(s) = payload.downcast_ref::<&'static str>() {
		return (*s).to_owned();
	}
	match payload.downcast::<String>() {
		Ok(s) => *s,
		Err(_) => "non-string panic payload".to_owned(),
	}
}
