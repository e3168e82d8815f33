use std::time::Duration;

use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::Span;

use super::{config::BusConfig, hooks::Hooks, orchestrator::EventBusOrchestrator};
use crate::{error::BusError, tasks::Message};

/// Builder for constructing an [`EventBusOrchestrator`] with optional features.
pub struct OrchestratorBuilder<M: Message, H> {
    cfg: BusConfig,
    hooks: H,
    span: Option<Span>,
    runtime: Option<Handle>,
    _message: std::marker::PhantomData<fn() -> M>,
}

impl<M: Message, H: Hooks<M>> OrchestratorBuilder<M, H> {
    /// Creates a new builder with default configuration.
    pub fn new(hooks: H) -> Self {
        Self {
            cfg: BusConfig::default(),
            hooks,
            span: None,
            runtime: None,
            _message: std::marker::PhantomData,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, cfg: BusConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the hard upper bound on the loop's run time.
    pub fn max_timeout(mut self, max_timeout: Duration) -> Self {
        self.cfg.max_timeout = max_timeout;
        self
    }

    /// Sets the idle window before natural shutdown.
    pub fn grace_period(mut self, grace_period: Duration) -> Self {
        self.cfg.grace_period = grace_period;
        self
    }

    /// Sets the parent span of the run and of every dispatch.
    ///
    /// Defaults to an `info`-level span named `event_bus`.
    pub fn span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Makes [`run`](EventBusOrchestrator::run) block on this runtime instead
    /// of a private current-thread one.
    ///
    /// The handle must belong to a multi-thread runtime: a current-thread
    /// runtime cannot drive timers from `Handle::block_on`, so [`build`](Self::build)
    /// rejects it.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Validates the configuration and builds the orchestrator.
    ///
    /// Initializes the message queue and the event stream. Nothing runs until
    /// [`run`](EventBusOrchestrator::run) or
    /// [`run_async`](EventBusOrchestrator::run_async).
    ///
    /// Fails with [`BusError::InvalidConfig`] for an invalid [`BusConfig`] or a
    /// current-thread runtime handle.
    pub fn build(self) -> Result<EventBusOrchestrator<M, H>, BusError> {
        if let Some(handle) = &self.runtime {
            if handle.runtime_flavor() == RuntimeFlavor::CurrentThread {
                return Err(BusError::invalid_config(
                    "runtime handle must belong to a multi-thread runtime",
                ));
            }
        }
        let span = self
            .span
            .unwrap_or_else(|| tracing::info_span!("event_bus"));
        EventBusOrchestrator::from_parts(self.cfg, self.hooks, span, self.runtime)
    }
}
