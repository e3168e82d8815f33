//! Error types used by the orchestrator and by tasks.
//!
//! This module defines three error enums:
//!
//! - [`TaskError`]: returned by task code and orchestrator hooks.
//! - [`DispatchError`]: the outcome of one failed dispatch (one task, one message).
//! - [`BusError`]: errors raised by the orchestrator itself or by bus misuse.
//!
//! All of them provide `as_label` for logs and events. Dispatch errors never
//! leave the scheduling loop: they are logged and published as events only.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::tasks::Message;

/// # Errors produced by task code.
///
/// Returned from [`Task::process_message`](crate::Task::process_message), the task
/// hooks, and the orchestrator [`Hooks`](crate::Hooks).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The work failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable failure.
    ///
    /// Returned from [`Hooks::on_message_received`](crate::Hooks::on_message_received)
    /// it stops the scheduling loop; anywhere else it is handled like [`TaskError::Fail`].
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// The task panicked; the panic payload is rendered into `info`.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload, when it was a string.
        info: String,
    },
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl ToString) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Shorthand for [`TaskError::Fatal`].
    pub fn fatal(error: impl ToString) -> Self {
        TaskError::Fatal {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use busvisor::TaskError;
    ///
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Whether this error should stop the scheduling loop when raised by the
    /// message-received hook.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TaskError::Fatal { .. })
    }
}

/// # Failure of a single dispatch.
///
/// Carries the task name, the offending message and the original cause.
#[derive(Error, Debug)]
pub enum DispatchError<M: Message> {
    /// `process_message` failed. `on_error` has already run.
    #[error("task {task} failed to process message {}: {source}", .message.id())]
    Processing {
        /// Name of the task that failed.
        task: String,
        /// The message being processed.
        message: Arc<M>,
        /// Error returned by `process_message`.
        source: TaskError,
    },

    /// `process_message` succeeded but `on_success` failed.
    ///
    /// A refinement of [`DispatchError::Processing`]: the dispatch still counts
    /// as failed, but the work itself completed and `on_error` was not called.
    #[error("task {task} processed message {} but its success hook failed: {source}", .message.id())]
    SuccessHook {
        /// Name of the task whose hook failed.
        task: String,
        /// The message that was processed.
        message: Arc<M>,
        /// Error returned by `on_success`.
        source: TaskError,
    },
}

impl<M: Message> DispatchError<M> {
    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::Processing { .. } => "dispatch_processing_failed",
            DispatchError::SuccessHook { .. } => "dispatch_success_hook_failed",
        }
    }

    /// `true` when only the post-success hook failed.
    pub fn is_success_hook(&self) -> bool {
        matches!(self, DispatchError::SuccessHook { .. })
    }

    /// Name of the task this dispatch ran.
    pub fn task(&self) -> &str {
        match self {
            DispatchError::Processing { task, .. } | DispatchError::SuccessHook { task, .. } => {
                task
            }
        }
    }

    /// The message this dispatch ran on.
    pub fn message(&self) -> &Arc<M> {
        match self {
            DispatchError::Processing { message, .. }
            | DispatchError::SuccessHook { message, .. } => message,
        }
    }

    /// The underlying task error.
    pub fn cause(&self) -> &TaskError {
        match self {
            DispatchError::Processing { source, .. }
            | DispatchError::SuccessHook { source, .. } => source,
        }
    }
}

/// # Errors produced by the orchestrator.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// Construction parameters violate `max_timeout > 0` or `0 <= grace_period < max_timeout`.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },

    /// A mailbox was used before its task was registered with a live orchestrator.
    #[error("task has not been added to an active event bus")]
    QueueNotBound,

    /// `on_initialize` failed; the loop never started.
    #[error("initialization failed: {source}")]
    Initialize {
        /// Error returned by the hook.
        source: TaskError,
    },

    /// `on_finalize` failed.
    #[error("finalization failed: {source}")]
    Finalize {
        /// Error returned by the hook.
        source: TaskError,
    },

    /// The scheduling loop panicked.
    #[error("scheduling loop panicked: {info}")]
    LoopPanicked {
        /// Panic payload, when it was a string.
        info: String,
    },

    /// [`run`](crate::EventBusOrchestrator::run) was called from inside a tokio
    /// runtime; use [`run_async`](crate::EventBusOrchestrator::run_async) there.
    #[error("run() cannot block inside a tokio runtime; await run_async() instead")]
    InsideRuntime,

    /// The private runtime could not be built.
    #[error("failed to build runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl BusError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        BusError::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use busvisor::BusError;
    ///
    /// let err = BusError::QueueNotBound;
    /// assert_eq!(err.as_label(), "bus_queue_not_bound");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::InvalidConfig { .. } => "bus_invalid_config",
            BusError::QueueNotBound => "bus_queue_not_bound",
            BusError::Initialize { .. } => "bus_initialize_failed",
            BusError::Finalize { .. } => "bus_finalize_failed",
            BusError::LoopPanicked { .. } => "bus_loop_panicked",
            BusError::InsideRuntime => "bus_inside_runtime",
            BusError::Runtime(_) => "bus_runtime_failed",
        }
    }
}

/// Renders a panic payload the way the scheduler reports it.
pub(crate) fn panic_info(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Formats a duration for log fields.
pub(crate) fn secs(d: Duration) -> f64 {
    d.as_secs_f64()
}
