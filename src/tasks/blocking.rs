//! # Blocking tasks.
//!
//! [`BlockingTask`] is the synchronous flavour of [`Task`] for CPU-bound or
//! blocking work. Wrap it in [`Blocking`] to register it: `process_message`
//! then runs on tokio's blocking thread pool and never stalls the scheduler
//! thread. Hooks run inline on the scheduler and should stay cheap.
//!
//! ```text
//! dispatch ──► Blocking::process_message
//!                 └─► spawn_blocking(inner.process_message(&msg)) ──► await join
//! ```
//!
//! A panic inside the blocking closure comes back as a join error and is
//! reported as [`TaskError::Panicked`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{TaskError, panic_info};
use crate::tasks::{Mailbox, Message, Task};

/// Synchronous message worker.
pub trait BlockingTask<M: Message>: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Performs the work on a blocking-pool thread.
    fn process_message(&self, message: &M) -> Result<(), TaskError>;

    /// Runs after `process_message` succeeded.
    fn on_success(&self, _message: &M) -> Result<(), TaskError> {
        Ok(())
    }

    /// Runs after `process_message` failed.
    fn on_error(&self, _message: &M, _error: &TaskError) -> Result<(), TaskError> {
        Ok(())
    }

    /// Back-reference used to submit follow-up messages.
    fn mailbox(&self) -> Option<&Mailbox<M>> {
        None
    }
}

/// Adapter that registers a [`BlockingTask`] as a [`Task`].
pub struct Blocking<T> {
    inner: Arc<T>,
}

impl<T> Blocking<T> {
    /// Wraps a blocking task.
    pub fn new(inner: T) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Wraps and returns it as a shared handle.
    pub fn arc(inner: T) -> Arc<Self> {
        Arc::new(Self::new(inner))
    }

    /// The wrapped task.
    pub fn inner(&self) -> &Arc<T> {
        &self.inner
    }
}

#[async_trait]
impl<M, T> Task<M> for Blocking<T>
where
    M: Message,
    T: BlockingTask<M>,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn process_message(&self, message: Arc<M>) -> Result<(), TaskError> {
        let inner = Arc::clone(&self.inner);
        match tokio::task::spawn_blocking(move || inner.process_message(&message)).await {
            Ok(res) => res,
            Err(join) if join.is_panic() => Err(TaskError::Panicked {
                info: panic_info(&*join.into_panic()),
            }),
            Err(join) => Err(TaskError::fail(join)),
        }
    }

    async fn on_success(&self, message: Arc<M>) -> Result<(), TaskError> {
        self.inner.on_success(&message)
    }

    async fn on_error(&self, message: Arc<M>, error: &TaskError) -> Result<(), TaskError> {
        self.inner.on_error(&message, error)
    }

    fn mailbox(&self) -> Option<&Mailbox<M>> {
        self.inner.mailbox()
    }
}
