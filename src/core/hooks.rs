//! # Orchestrator lifecycle hooks.
//!
//! A concrete orchestrator is an [`EventBusOrchestrator`](crate::EventBusOrchestrator)
//! plus a [`Hooks`] implementation. The hooks seed the initial work, observe each
//! dequeued message, and persist final state:
//!
//! ```text
//! run()
//!  ├─► initialize()         ──► on_initialize(&submitter)
//!  ├─► process_messages()
//!  │     └─ per message     ──► on_message_received(&msg)  (then fan-out)
//!  └─► finalize(error)      ──► on_finalize(error)         (always)
//! ```
//!
//! Hooks run on the scheduling loop itself and take `&mut self`: their state
//! needs no synchronization, and is readable after the run through
//! [`EventBusOrchestrator::hooks`](crate::EventBusOrchestrator::hooks).

use async_trait::async_trait;

use crate::error::{BusError, TaskError};
use crate::tasks::{Message, Submitter};

/// Lifecycle hooks of a concrete orchestrator.
#[async_trait]
pub trait Hooks<M: Message>: Send + 'static {
    /// Initial setup, typically submitting the seed messages.
    ///
    /// A failure aborts the run before the loop starts; `on_finalize` still runs
    /// and the error is returned from `run` as [`BusError::Initialize`].
    async fn on_initialize(&mut self, submitter: &Submitter<M>) -> Result<(), TaskError>;

    /// Final cleanup. Receives the error the run is about to return, if any.
    async fn on_finalize(&mut self, error: Option<&BusError>) -> Result<(), TaskError>;

    /// Called once per dequeued message, before fan-out. Cannot veto delivery.
    ///
    /// [`TaskError::Fatal`] stops the scheduling loop without dispatching the
    /// message; any other error is logged and delivery continues.
    async fn on_message_received(&mut self, message: &M) -> Result<(), TaskError>;
}
