//! # EventBusOrchestrator: message queue, fan-out and bounded-lifetime scheduling.
//!
//! The [`EventBusOrchestrator`] owns the message queue, the kind → tasks
//! registry, the event stream and the [`Hooks`] of a concrete orchestrator.
//! It dequeues messages in FIFO order, spawns one dispatch per subscribed task
//! and stops on a hard timeout or after an idle grace period.
//!
//! ## High-level architecture
//! ```text
//! Producers:
//!   Hooks::on_initialize ─┐
//!   external seed logic  ─┼── submit(msg) ──► [unbounded queue]
//!   Task mailboxes       ─┘                          │
//!                                                    ▼
//! Scheduling loop (single writer of queue/registry/in-flight set):
//!   recv() ──► on_message_received(&msg)
//!          └─► registry.subscribers(msg.kind())
//!                 ├──► spawn dispatch(task A, msg) ─┐
//!                 ├──► spawn dispatch(task B, msg) ─┼─► in-flight set
//!                 └──► ...                          ┘
//!   dispatch completes ──► remove from set, log failure (never escalates)
//!
//! Termination, checked before every wait:
//!   elapsed >= max_timeout                      ──► stop (timeout)
//!   queue empty && in-flight empty
//!      └─► wait min(grace_period, remaining)
//!            ├─ message arrives                 ──► continue
//!            └─ nothing                         ──► stop (idle)
//! ```
//!
//! ## Rules
//! - Every wait is bounded by `poll_interval`, so the timeout is re-evaluated
//!   even while every dispatch is blocked.
//! - Only the pending queue read is cancelled on stop; it is cancel-safe, so no
//!   message is lost from the queue.
//! - Dispatches still running on stop follow [`InFlightPolicy`]: detached by
//!   default (not awaited), or aborted and joined.
//! - `finalize` runs on every exit path of [`run`](EventBusOrchestrator::run).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use async_trait::async_trait;
//! use busvisor::{BusConfig, BusError, EventBusOrchestrator, Hooks, Message, Submitter, Task, TaskError};
//!
//! #[derive(Debug)]
//! struct Ping(String);
//!
//! impl Message for Ping {
//!     type Kind = ();
//!     fn id(&self) -> &str { &self.0 }
//!     fn kind(&self) -> Self::Kind {}
//! }
//!
//! struct Seed;
//!
//! #[async_trait]
//! impl Hooks<Ping> for Seed {
//!     async fn on_initialize(&mut self, bus: &Submitter<Ping>) -> Result<(), TaskError> {
//!         bus.submit(Ping("1".into())).map_err(TaskError::fail)
//!     }
//!     async fn on_finalize(&mut self, _error: Option<&BusError>) -> Result<(), TaskError> { Ok(()) }
//!     async fn on_message_received(&mut self, _message: &Ping) -> Result<(), TaskError> { Ok(()) }
//! }
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl Task<Ping> for Printer {
//!     fn name(&self) -> &str { "printer" }
//!     async fn process_message(&self, message: Arc<Ping>) -> Result<(), TaskError> {
//!         println!("got {}", message.id());
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), BusError> {
//!     let cfg = BusConfig::new(Duration::from_secs(5), Duration::from_millis(50));
//!     let mut bus = EventBusOrchestrator::<Ping, _>::new(cfg, Seed)?;
//!     bus.register_task(Arc::new(Printer), [()]);
//!     bus.run()
//! }
//! ```

use std::ops::ControlFlow;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, StreamExt, stream::FuturesUnordered};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant};
use tracing::{Instrument, Span};

use super::builder::OrchestratorBuilder;
use super::config::{BusConfig, InFlightPolicy};
use super::dispatch::dispatch;
use super::hooks::Hooks;
use super::registry::Registry;
use crate::{
    error::{BusError, DispatchError, panic_info, secs},
    events::{Event, EventKind, EventStream},
    tasks::{Message, Submitter, TaskRef},
};

type DispatchResult<M> = Result<Result<(), DispatchError<M>>, JoinError>;
type InFlight<M> = FuturesUnordered<JoinHandle<Result<(), DispatchError<M>>>>;

/// What woke the scheduling loop.
enum Wake<M: Message> {
    /// The queue read completed (`None` = queue closed).
    Received(Option<Arc<M>>),
    /// A dispatch finished.
    Finished(DispatchResult<M>),
    /// The poll interval elapsed.
    Tick,
}

/// Why the scheduling loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Timeout,
    Idle,
    Fatal,
}

/// In-process event-bus orchestrator.
///
/// Generic over the application's message type `M` and the concrete
/// orchestrator's lifecycle hooks `H`.
pub struct EventBusOrchestrator<M: Message, H> {
    cfg: BusConfig,
    hooks: H,
    registry: Registry<M>,
    tx: mpsc::UnboundedSender<Arc<M>>,
    rx: mpsc::UnboundedReceiver<Arc<M>>,
    events: EventStream,
    span: Span,
    runtime: Option<Handle>,
    running: bool,
}

impl<M: Message, H: Hooks<M>> EventBusOrchestrator<M, H> {
    /// Creates an orchestrator, validating `cfg`.
    ///
    /// Fails with [`BusError::InvalidConfig`] if `max_timeout` is zero or
    /// `grace_period >= max_timeout`.
    pub fn new(cfg: BusConfig, hooks: H) -> Result<Self, BusError> {
        Self::builder(hooks).config(cfg).build()
    }

    /// Returns a builder for optional settings (span, external runtime).
    pub fn builder(hooks: H) -> OrchestratorBuilder<M, H> {
        OrchestratorBuilder::new(hooks)
    }

    pub(crate) fn from_parts(
        cfg: BusConfig,
        hooks: H,
        span: Span,
        runtime: Option<Handle>,
    ) -> Result<Self, BusError> {
        cfg.validate()?;
        let (tx, rx) = mpsc::unbounded_channel();
        let events = EventStream::new(cfg.event_capacity_clamped());
        Ok(Self {
            cfg,
            hooks,
            registry: Registry::new(),
            tx,
            rx,
            events,
            span,
            runtime,
            running: false,
        })
    }

    /// Subscribes `task` to every kind in `kinds` and binds its mailbox.
    ///
    /// Calling this twice for the same task and kind appends twice: the task
    /// then receives each message of that kind once per registration.
    pub fn register_task(&mut self, task: TaskRef<M>, kinds: impl IntoIterator<Item = M::Kind>) {
        if let Some(mailbox) = task.mailbox() {
            mailbox.bind(self.submitter());
        }
        tracing::debug!(parent: &self.span, task = task.name(), "task registered");
        self.registry.register(task, kinds);
    }

    /// Enqueues a message. Never blocks and never fails.
    pub fn submit(&self, message: M) {
        // The receiver lives as long as `self`, so the send cannot fail.
        let _ = self.tx.send(Arc::new(message));
    }

    /// A cloneable handle that submits to this orchestrator's queue.
    pub fn submitter(&self) -> Submitter<M> {
        Submitter::new(self.tx.clone())
    }

    /// Creates a receiver for runtime events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// The validated configuration.
    pub fn config(&self) -> &BusConfig {
        &self.cfg
    }

    /// The concrete orchestrator's hooks.
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Mutable access to the hooks between runs.
    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    /// Consumes the orchestrator and returns its hooks.
    pub fn into_hooks(self) -> H {
        self.hooks
    }

    /// `true` between `initialize` and `finalize`.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of messages waiting in the queue.
    pub fn queued(&self) -> usize {
        self.rx.len()
    }

    /// Sorted names of the registered tasks.
    pub fn task_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Runs the whole lifecycle and blocks until it ends.
    ///
    /// Uses the multi-thread runtime handle given to the builder when there is
    /// one. Otherwise a private current-thread runtime is built and shut down in
    /// the background afterwards; detached dispatches die with it.
    ///
    /// Returns an error only when called from inside a tokio runtime
    /// ([`BusError::InsideRuntime`], nothing runs and no hook is called), when the
    /// runtime cannot be built, `on_initialize` fails, the loop panics, or
    /// `on_finalize` fails. Task failures never propagate here.
    pub fn run(&mut self) -> Result<(), BusError> {
        if Handle::try_current().is_ok() {
            return Err(BusError::InsideRuntime);
        }
        match self.runtime.clone() {
            Some(handle) => handle.block_on(self.run_async()),
            None => {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()?;
                let res = runtime.block_on(self.run_async());
                runtime.shutdown_background();
                res
            }
        }
    }

    /// Runs `initialize` → `process_messages` → `finalize` on the current runtime.
    ///
    /// `finalize` is always awaited, with the error the run is about to return.
    pub async fn run_async(&mut self) -> Result<(), BusError> {
        let span = self.span.clone();
        self.run_lifecycle().instrument(span).await
    }

    async fn run_lifecycle(&mut self) -> Result<(), BusError> {
        let outcome = match self.initialize().await {
            Ok(()) => AssertUnwindSafe(self.process_messages())
                .catch_unwind()
                .await
                .map_err(|payload| BusError::LoopPanicked {
                    info: panic_info(&*payload),
                }),
            Err(err) => Err(err),
        };

        if let Err(err) = &outcome {
            tracing::error!(error = %err, label = err.as_label(), "orchestrator run failed");
        }

        let finalized = self.finalize(outcome.as_ref().err()).await;
        match (outcome, finalized) {
            (Err(err), Err(fin)) => {
                tracing::error!(error = %fin, "finalize failed after a failed run");
                Err(err)
            }
            (Err(err), Ok(())) => Err(err),
            (Ok(()), finalized) => finalized,
        }
    }

    /// Marks the orchestrator as running and calls [`Hooks::on_initialize`].
    pub async fn initialize(&mut self) -> Result<(), BusError> {
        self.running = true;
        let submitter = self.submitter();
        self.hooks
            .on_initialize(&submitter)
            .await
            .map_err(|source| BusError::Initialize { source })?;

        tracing::info!(
            tasks = self.registry.names().len(),
            subscriptions = self.registry.subscription_count(),
            queued = self.queued(),
            max_timeout_secs = secs(self.cfg.max_timeout),
            grace_period_secs = secs(self.cfg.grace_period),
            "orchestrator initialized"
        );
        self.events.publish(Event::new(EventKind::Initialized));
        Ok(())
    }

    /// Clears the running flag and calls [`Hooks::on_finalize`].
    pub async fn finalize(&mut self, error: Option<&BusError>) -> Result<(), BusError> {
        self.running = false;
        let res = self
            .hooks
            .on_finalize(error)
            .await
            .map_err(|source| BusError::Finalize { source });
        self.events.publish(Event::new(EventKind::Finalized));
        res
    }

    /// The scheduling loop.
    ///
    /// Returns immediately when no task is registered. Otherwise runs until the
    /// hard timeout, the idle grace period, or a fatal message-hook error.
    pub async fn process_messages(&mut self) {
        if self.registry.is_empty() {
            tracing::debug!("no tasks registered; nothing to process");
            return;
        }

        let started = Instant::now();
        let mut in_flight: InFlight<M> = FuturesUnordered::new();

        let stop = loop {
            let remaining = self.cfg.max_timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                tracing::error!(
                    max_timeout_secs = secs(self.cfg.max_timeout),
                    in_flight = in_flight.len(),
                    "orchestrator timed out after {:?}; {} dispatches were running",
                    self.cfg.max_timeout,
                    in_flight.len()
                );
                self.events.publish(
                    Event::new(EventKind::TimeoutHit)
                        .with_timeout(self.cfg.max_timeout)
                        .with_in_flight(in_flight.len()),
                );
                break Stop::Timeout;
            }

            let wake = if in_flight.is_empty() && self.rx.is_empty() {
                let window = self.cfg.grace_period.min(remaining);
                match time::timeout(window, self.rx.recv()).await {
                    Ok(next) => Wake::Received(next),
                    Err(_elapsed) => {
                        tracing::info!(
                            grace_period_secs = secs(window),
                            "queue idle for the grace period; shutting down"
                        );
                        self.events
                            .publish(Event::new(EventKind::IdleShutdown).with_timeout(window));
                        break Stop::Idle;
                    }
                }
            } else {
                let tick = self.cfg.poll_interval.min(remaining);
                tokio::select! {
                    next = self.rx.recv() => Wake::Received(next),
                    Some(joined) = in_flight.next(), if !in_flight.is_empty() => Wake::Finished(joined),
                    _ = time::sleep(tick) => Wake::Tick,
                }
            };

            match wake {
                Wake::Received(Some(message)) => {
                    if self.handle_message(message, &mut in_flight).await.is_break() {
                        break Stop::Fatal;
                    }
                }
                // Unreachable while `self` is alive: the orchestrator keeps its own
                // sender, so the queue never closes under the loop.
                Wake::Received(None) => {
                    tracing::error!("error retrieving message from queue: queue closed");
                    self.events.publish(
                        Event::new(EventKind::RetrievalFailed).with_reason("queue closed"),
                    );
                    time::sleep(self.cfg.retrieval_backoff.min(remaining)).await;
                }
                Wake::Finished(joined) => self.on_dispatch_finished(joined),
                Wake::Tick => {}
            }
        };

        tracing::debug!(?stop, in_flight = in_flight.len(), "scheduling loop stopped");
        self.release_in_flight(in_flight).await;
    }

    /// Observes the message, then fans it out to every subscriber of its kind.
    async fn handle_message(
        &mut self,
        message: Arc<M>,
        in_flight: &mut InFlight<M>,
    ) -> ControlFlow<()> {
        match self.hooks.on_message_received(&message).await {
            Ok(()) => {}
            Err(err) if err.is_fatal() => {
                tracing::error!(
                    message_id = message.id(),
                    error = %err,
                    "fatal error in on_message_received; stopping"
                );
                self.events.publish(
                    Event::new(EventKind::FatalStop)
                        .with_message_id(message.id())
                        .with_reason(err.to_string()),
                );
                return ControlFlow::Break(());
            }
            Err(err) => {
                tracing::warn!(message_id = message.id(), error = %err, "error in on_message_received");
                self.events.publish(
                    Event::new(EventKind::MessageHookFailed)
                        .with_message_id(message.id())
                        .with_reason(err.to_string()),
                );
            }
        }

        let mut fanned = 0usize;
        for task in self.registry.subscribers(message.kind()) {
            let span = tracing::info_span!(
                parent: &self.span,
                "dispatch",
                task = task.name(),
                message_id = message.id()
            );
            let fut = dispatch(Arc::clone(task), Arc::clone(&message), self.events.clone());
            in_flight.push(tokio::spawn(fut.instrument(span)));
            fanned += 1;
        }

        tracing::debug!(
            message_id = message.id(),
            kind = ?message.kind(),
            dispatches = fanned,
            "message received"
        );
        self.events.publish(
            Event::new(EventKind::MessageReceived)
                .with_message_id(message.id())
                .with_in_flight(fanned),
        );
        ControlFlow::Continue(())
    }

    /// Logs a finished dispatch. Failures never touch the loop or sibling dispatches.
    fn on_dispatch_finished(&self, joined: DispatchResult<M>) {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::error!(
                    task = err.task(),
                    message_id = err.message().id(),
                    label = err.as_label(),
                    "task failed: {err}"
                );
            }
            Err(join) if join.is_panic() => {
                let info = panic_info(&*join.into_panic());
                tracing::error!(panic = %info, "dispatch panicked");
                self.events
                    .publish(Event::new(EventKind::DispatchPanicked).with_reason(info));
            }
            Err(_cancelled) => {}
        }
    }

    /// Applies [`InFlightPolicy`] to whatever is still running.
    async fn release_in_flight(&self, mut in_flight: InFlight<M>) {
        let remaining = in_flight.len();
        if remaining == 0 {
            return;
        }

        match self.cfg.on_stop {
            InFlightPolicy::Detach => {
                tracing::info!(
                    in_flight = remaining,
                    "detaching {remaining} in-flight dispatches; they are not awaited"
                );
                self.events.publish(
                    Event::new(EventKind::InFlightReleased)
                        .with_in_flight(remaining)
                        .with_reason("detached"),
                );
                // Dropping a JoinHandle detaches its task.
                drop(in_flight);
            }
            InFlightPolicy::Abort => {
                tracing::info!(in_flight = remaining, "cancelling {remaining} remaining dispatches");
                for handle in in_flight.iter() {
                    handle.abort();
                }
                while let Some(joined) = in_flight.next().await {
                    self.on_dispatch_finished(joined);
                }
                self.events.publish(
                    Event::new(EventKind::InFlightReleased)
                        .with_in_flight(remaining)
                        .with_reason("aborted"),
                );
            }
        }
    }
}

impl<M: Message, H> std::fmt::Debug for EventBusOrchestrator<M, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBusOrchestrator")
            .field("cfg", &self.cfg)
            .field("tasks", &self.registry.names())
            .field("queued", &self.rx.len())
            .field("running", &self.running)
            .finish()
    }
}
