//! # busvisor
//!
//! **Busvisor** is an in-process event-bus orchestrator for Rust.
//!
//! Producers submit typed messages to one queue. Tasks subscribe to message
//! kinds; every dequeued message is fanned out to all of its subscribers,
//! concurrently and independently. A run ends after an idle grace period or
//! on a hard timeout, whichever comes first.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   Hooks::on_initialize      Task mailboxes        Submitter handles
//!          │                        │                       │
//!          └──────────── submit(msg) ───────────────────────┘
//!                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventBusOrchestrator (scheduling loop)                           │
//! │  - Queue (unbounded FIFO)                                         │
//! │  - Registry (kind → tasks, registration order)                    │
//! │  - In-flight set (one entry per running dispatch)                 │
//! │  - EventStream (broadcast runtime events)                         │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │   dispatch   │   │   dispatch   │   │   dispatch   │   │
//!     │ (task A, m1) │   │ (task B, m1) │   │ (task A, m2) │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ Publishes:       │                  │                 │
//!      │ - DispatchSucc.  │ - DispatchFailed │ - ...           │
//!      │ - ErrorHookFail. │                  │                 │
//!      ▼                  ▼                  ▼                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                 EventStream (broadcast channel)                   │
//! │                (capacity: BusConfig::event_capacity)              │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! run() ──► initialize() ──► process_messages() ──► finalize(error)
//!
//! loop {
//!   ├─► remaining = max_timeout - elapsed
//!   │       └─ zero ──► publish TimeoutHit, stop
//!   ├─► queue empty && nothing in flight?
//!   │       └─ wait min(grace_period, remaining)
//!   │             └─ nothing arrived ──► publish IdleShutdown, stop
//!   ├─► otherwise wait (at most poll_interval) for:
//!   │       ├─ message    ──► on_message_received ──► spawn one dispatch per subscriber
//!   │       └─ completion ──► log failure, drop from the in-flight set
//!   └─ exit conditions:
//!        - hard timeout
//!        - idle grace period
//!        - fatal error from on_message_received
//! }
//!
//! On exit: in-flight dispatches are detached (default) or aborted.
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                              |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------------|
//! | **Messages**      | Routable units of work with an id and a kind.                 | [`Message`]                                     |
//! | **Tasks**         | Async or blocking workers with success/error hooks.           | [`Task`], [`TaskRef`], [`BlockingTask`], [`Blocking`] |
//! | **Submission**    | Tasks and producers enqueue follow-up messages.               | [`Mailbox`], [`Submitter`]                      |
//! | **Orchestration** | Fan-out, bounded lifetime, lifecycle hooks.                   | [`EventBusOrchestrator`], [`Hooks`]             |
//! | **Events**        | Broadcast runtime events for observers and tests.             | [`Event`], [`EventKind`], [`EventStream`]       |
//! | **Errors**        | Typed errors for tasks, dispatches and the bus.               | [`TaskError`], [`DispatchError`], [`BusError`]  |
//! | **Configuration** | Timing limits and in-flight handling.                         | [`BusConfig`], [`InFlightPolicy`]               |
//!
//! ## Logging
//! The crate logs through [`tracing`]; install any subscriber to see the
//! output. Each run is wrapped in an `event_bus` span and each dispatch in a
//! `dispatch` span carrying `task` and `message_id`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use busvisor::{BusConfig, BusError, EventBusOrchestrator, Hooks, Message, Submitter, Task, TaskError};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
//! enum Kind { Memo }
//!
//! #[derive(Debug)]
//! struct Memo { id: String, content: String }
//!
//! impl Message for Memo {
//!     type Kind = Kind;
//!     fn id(&self) -> &str { &self.id }
//!     fn kind(&self) -> Kind { Kind::Memo }
//! }
//!
//! struct Office { seen: usize }
//!
//! #[async_trait]
//! impl Hooks<Memo> for Office {
//!     async fn on_initialize(&mut self, bus: &Submitter<Memo>) -> Result<(), TaskError> {
//!         bus.submit(Memo { id: "m1".into(), content: "hello".into() })
//!             .map_err(TaskError::fail)
//!     }
//!     async fn on_finalize(&mut self, _error: Option<&BusError>) -> Result<(), TaskError> {
//!         Ok(())
//!     }
//!     async fn on_message_received(&mut self, _message: &Memo) -> Result<(), TaskError> {
//!         self.seen += 1;
//!         Ok(())
//!     }
//! }
//!
//! struct Secretary;
//!
//! #[async_trait]
//! impl Task<Memo> for Secretary {
//!     fn name(&self) -> &str { "secretary" }
//!     async fn process_message(&self, memo: Arc<Memo>) -> Result<(), TaskError> {
//!         println!("filing {}: {}", memo.id, memo.content);
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), BusError> {
//!     let cfg = BusConfig::new(Duration::from_secs(5), Duration::from_millis(50));
//!     let mut bus = EventBusOrchestrator::<Memo, _>::new(cfg, Office { seen: 0 })?;
//!     bus.register_task(Arc::new(Secretary), [Kind::Memo]);
//!     bus.run()?;
//!
//!     assert_eq!(bus.hooks().seen, 1);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod tasks;

// ---- Public re-exports ----

pub use core::{BusConfig, EventBusOrchestrator, Hooks, InFlightPolicy, OrchestratorBuilder};
pub use error::{BusError, DispatchError, TaskError};
pub use events::{Event, EventKind, EventStream};
pub use tasks::{Blocking, BlockingTask, Mailbox, Message, Submitter, Task, TaskRef};
