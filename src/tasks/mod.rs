//! # Messages, tasks and the handles tasks use to talk back to the bus.
//!
//! This module provides:
//! - [`Message`] - trait for routable units of work
//! - [`Task`] - trait for asynchronous message workers
//! - [`TaskRef`] - shared reference to a task (`Arc<dyn Task<M>>`)
//! - [`BlockingTask`], [`Blocking`] - synchronous workers run on the blocking pool
//! - [`Mailbox`], [`Submitter`] - handles for submitting messages

mod blocking;
mod mailbox;
mod message;
mod task;

pub use blocking::{Blocking, BlockingTask};
pub use mailbox::{Mailbox, Submitter};
pub use message::Message;
pub use task::{Task, TaskRef};
