//! Runtime events: types and broadcast stream.
//!
//! This module groups the event **data model** and the **stream** used to
//! publish/subscribe to runtime events emitted by the orchestrator loop and
//! by each dispatch.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`EventStream`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `EventBusOrchestrator` (lifecycle, message and stop events),
//!   `core::dispatch` (per-dispatch outcome events).
//! - **Consumers**: anything holding a receiver from
//!   [`EventBusOrchestrator::subscribe_events`](crate::EventBusOrchestrator::subscribe_events).

mod event;
mod stream;

pub use event::{Event, EventKind};
pub use stream::EventStream;
