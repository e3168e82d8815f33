//! # Task abstraction.
//!
//! A [`Task`] is a named worker bound to one or more message kinds. The
//! orchestrator runs one dispatch per (task, message) pair:
//!
//! ```text
//! CREATED ──► RUNNING: process_message(msg)
//!               ├─ Ok  ──► on_success(msg) ──► SUCCESS
//!               │                └─ Err ──► DispatchError::SuccessHook
//!               └─ Err ──► on_error(msg, &err) ──► FAILED
//!                                └─ Err ──► logged, original error kept
//! ```
//!
//! Both outcomes are terminal. Retrying is left to the task itself.
//!
//! The common handle type is [`TaskRef`], an `Arc<dyn Task<M>>` shared between
//! the registry and every dispatch.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::tasks::{Mailbox, Message};

/// Shared handle to a task.
pub type TaskRef<M> = Arc<dyn Task<M>>;

/// # Asynchronous message worker.
///
/// Only [`process_message`](Task::process_message) is required. Hooks default
/// to no-ops; [`mailbox`](Task::mailbox) defaults to `None` for tasks that never
/// emit follow-up messages.
///
/// Dispatches of the same task run concurrently with each other, so task state
/// must be behind `&self`-friendly synchronization.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use async_trait::async_trait;
/// use busvisor::{Message, Task, TaskError};
///
/// #[derive(Debug)]
/// struct Ping(String);
///
/// impl Message for Ping {
///     type Kind = ();
///     fn id(&self) -> &str { &self.0 }
///     fn kind(&self) -> Self::Kind {}
/// }
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// #[async_trait]
/// impl Task<Ping> for Counter {
///     fn name(&self) -> &str { "counter" }
///
///     async fn process_message(&self, _message: Arc<Ping>) -> Result<(), TaskError> {
///         self.0.fetch_add(1, Ordering::Relaxed);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task<M: Message>: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Performs the actual work.
    async fn process_message(&self, message: Arc<M>) -> Result<(), TaskError>;

    /// Runs after `process_message` succeeded.
    ///
    /// A failure here surfaces as [`DispatchError::SuccessHook`](crate::DispatchError::SuccessHook);
    /// it does not turn the processing itself into a failure and `on_error` is not called.
    async fn on_success(&self, _message: Arc<M>) -> Result<(), TaskError> {
        Ok(())
    }

    /// Runs after `process_message` failed, with the error it returned.
    ///
    /// A failure here is logged only; the original error is the one reported.
    async fn on_error(&self, _message: Arc<M>, _error: &TaskError) -> Result<(), TaskError> {
        Ok(())
    }

    /// Back-reference used to submit follow-up messages.
    ///
    /// Bound by [`register_task`](crate::EventBusOrchestrator::register_task).
    fn mailbox(&self) -> Option<&Mailbox<M>> {
        None
    }
}
