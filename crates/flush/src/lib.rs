//! Deferred callback queue for a single UI execution context.
//!
//! Callbacks are pushed from any thread into a [`FlushQueue`] and drained on
//! an [`Executor`] in short, time-budgeted passes. Each callback carries the
//! [`Modality`] it was scheduled under and an [`Expiry`]; callbacks
//! dominated by the current modality wait, expired ones are dropped.
//! [`LaterInvoker`] ties a queue to a [`ModalityStack`] and an event loop.

pub mod config;
pub mod error;
pub mod executor;
pub mod expiry;
pub mod info;
pub mod invoker;
pub mod modality;
pub mod queue;

pub use config::{DEFAULT_FLUSH_BUDGET, DEFAULT_THREAD_NAME, FlushConfig};
pub use error::{ConfigError, FlushError, TaskError};
pub use executor::{EventLoop, EventLoopHandle, Executor, Job, ManualExecutor};
pub use expiry::{Expiry, ExpiryFlag};
pub use info::{Completion, CompletionCallback, ItemDescriptor, RunnableInfo, Task};
pub use invoker::LaterInvoker;
pub use modality::{CurrentModality, ModalEntity, Modality, ModalityStack, ModalityState};
pub use queue::{FlushQueue, FlushReport, QueueView};
