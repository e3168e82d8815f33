//! # Runtime events emitted by the orchestrator and its dispatches.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Lifecycle events**: the orchestrator run (initialized, stopped, finalized)
//! - **Message events**: queue retrieval and per-message hooks
//! - **Dispatch events**: one (task, message) unit of work
//!
//! The [`Event`] struct carries the metadata: timestamp, task name, message id,
//! reason and counters.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use busvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::DispatchFailed)
//!     .with_task("secretary")
//!     .with_message_id("memo-7")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::DispatchFailed);
//! assert_eq!(ev.task.as_deref(), Some("secretary"));
//! assert_eq!(ev.message_id.as_deref(), Some("memo-7"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Lifecycle events ===
    /// `on_initialize` completed and the loop is about to start.
    Initialized,

    /// Hard timeout reached.
    ///
    /// Sets:
    /// - `timeout_ms`: configured `max_timeout`
    /// - `in_flight`: dispatches still running
    TimeoutHit,

    /// Queue stayed empty with nothing in flight for the whole grace period.
    ///
    /// Sets:
    /// - `timeout_ms`: the grace window actually waited
    IdleShutdown,

    /// Loop stopped because `on_message_received` returned a fatal error.
    ///
    /// Sets:
    /// - `message_id`, `reason`
    FatalStop,

    /// In-flight dispatches were detached or aborted when the loop stopped.
    ///
    /// Sets:
    /// - `in_flight`: how many
    /// - `reason`: `"detached"` or `"aborted"`
    InFlightReleased,

    /// `on_finalize` ran.
    Finalized,

    // === Message events ===
    /// A message was dequeued.
    ///
    /// Sets:
    /// - `message_id`
    /// - `in_flight`: number of dispatches created for it
    MessageReceived,

    /// `on_message_received` failed with a non-fatal error; delivery continued.
    ///
    /// Sets:
    /// - `message_id`, `reason`
    MessageHookFailed,

    /// The queue could not be read; polling continues after a short pause.
    ///
    /// Sets:
    /// - `reason`
    RetrievalFailed,

    // === Dispatch events ===
    /// Processing and success hook both completed.
    ///
    /// Sets:
    /// - `task`, `message_id`
    DispatchSucceeded,

    /// Processing or success hook failed.
    ///
    /// Sets:
    /// - `task`, `message_id`
    /// - `reason`: error message
    /// - `label`: `dispatch_processing_failed` or `dispatch_success_hook_failed`
    DispatchFailed,

    /// `on_error` itself failed; the original error is still the one reported.
    ///
    /// Sets:
    /// - `task`, `message_id`, `reason`
    ErrorHookFailed,

    /// The dispatch panicked outside `process_message`.
    ///
    /// Sets:
    /// - `reason`: panic info
    DispatchPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the task, if applicable.
    pub task: Option<Arc<str>>,
    /// Id of the message, if applicable.
    pub message_id: Option<Arc<str>>,
    /// Human-readable reason (errors, stop causes, etc.).
    pub reason: Option<Arc<str>>,
    /// Stable error label, if applicable.
    pub label: Option<&'static str>,
    /// Timeout or wait window in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Dispatch counter, if applicable.
    pub in_flight: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            message_id: None,
            reason: None,
            label: None,
            timeout_ms: None,
            in_flight: None,
        }
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a message id.
    #[inline]
    pub fn with_message_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a stable error label.
    #[inline]
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    /// Attaches a duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches a dispatch count.
    #[inline]
    pub fn with_in_flight(mut self, n: usize) -> Self {
        self.in_flight = Some(n.min(u32::MAX as usize) as u32);
        self
    }

    /// `true` for the events that end a run.
    #[inline]
    pub fn is_stop(&self) -> bool {
        matches!(
            self.kind,
            EventKind::TimeoutHit | EventKind::IdleShutdown | EventKind::FatalStop
        )
    }
}
