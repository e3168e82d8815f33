//! # Orchestrator configuration.
//!
//! Provides [`BusConfig`], the settings for one orchestrator run, and
//! [`InFlightPolicy`], what happens to running dispatches when the loop stops.
//!
//! ## Validation
//! - `max_timeout > 0`
//! - `grace_period < max_timeout` (`grace_period >= 0` holds for any `Duration`;
//!   negative seconds are rejected by [`BusConfig::from_secs_f64`])
//! - `poll_interval > 0`
//!
//! Validation runs when the orchestrator is built; an invalid config never
//! reaches the scheduling loop.

use std::time::Duration;

use crate::error::BusError;

/// What the loop does with dispatches that are still running when it stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InFlightPolicy {
    /// Stop waiting for them. They are neither cancelled nor awaited.
    ///
    /// Under [`run_async`](crate::EventBusOrchestrator::run_async) they keep
    /// running on the ambient runtime. Under [`run`](crate::EventBusOrchestrator::run)
    /// with a private runtime they are dropped when that runtime shuts down.
    #[default]
    Detach,
    /// Abort them and wait for the aborts to land before `finalize` runs.
    Abort,
}

/// Settings for one orchestrator.
///
/// ## Field semantics
/// - `max_timeout`: hard upper bound on the scheduling loop's run time
/// - `grace_period`: idle window before natural shutdown
/// - `poll_interval`: how often the loop re-checks `max_timeout` while blocked
/// - `retrieval_backoff`: pause after a failed queue read
/// - `event_capacity`: ring buffer size of the event stream (min 1)
/// - `on_stop`: what to do with in-flight dispatches on stop
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Hard upper bound on total loop time.
    pub max_timeout: Duration,
    /// How long to wait for a new message once the queue is empty and nothing is in flight.
    pub grace_period: Duration,
    /// Upper bound of a single wait in the loop.
    pub poll_interval: Duration,
    /// Pause after a failed queue read before polling again.
    pub retrieval_backoff: Duration,
    /// Capacity of the event stream ring buffer.
    pub event_capacity: usize,
    /// In-flight handling on stop.
    pub on_stop: InFlightPolicy,
}

impl BusConfig {
    /// Creates a config with the given limits and defaults for the rest.
    pub fn new(max_timeout: Duration, grace_period: Duration) -> Self {
        Self {
            max_timeout,
            grace_period,
            ..Self::default()
        }
    }

    /// Creates a config from seconds, rejecting negative or non-finite values.
    ///
    /// # Example
    /// ```
    /// use busvisor::BusConfig;
    ///
    /// assert!(BusConfig::from_secs_f64(10.0, 0.5).is_ok());
    /// assert!(BusConfig::from_secs_f64(5.0, -1.0).is_err());
    /// assert!(BusConfig::from_secs_f64(5.0, 5.0).is_err());
    /// assert!(BusConfig::from_secs_f64(0.0, 0.0).is_err());
    /// ```
    pub fn from_secs_f64(max_timeout: f64, grace_period: f64) -> Result<Self, BusError> {
        let max_timeout = Duration::try_from_secs_f64(max_timeout).map_err(|_| {
            BusError::invalid_config(format!(
                "max_timeout must be a finite, non-negative number of seconds (got {max_timeout})"
            ))
        })?;
        let grace_period = Duration::try_from_secs_f64(grace_period).map_err(|_| {
            BusError::invalid_config(format!(
                "grace_period must be greater than or equal to 0 (got {grace_period})"
            ))
        })?;

        let cfg = Self::new(max_timeout, grace_period);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks the timing invariants.
    pub fn validate(&self) -> Result<(), BusError> {
        if self.max_timeout.is_zero() {
            return Err(BusError::invalid_config(
                "max_timeout must be greater than 0",
            ));
        }
        if self.max_timeout <= self.grace_period {
            return Err(BusError::invalid_config(format!(
                "max_timeout ({:?}) must be greater than grace_period ({:?})",
                self.max_timeout, self.grace_period
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(BusError::invalid_config(
                "poll_interval must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Returns an event capacity clamped to a minimum of 1.
    #[inline]
    pub fn event_capacity_clamped(&self) -> usize {
        self.event_capacity.max(1)
    }
}

impl Default for BusConfig {
    /// Default configuration:
    ///
    /// - `max_timeout = 300s`
    /// - `grace_period = 10s`
    /// - `poll_interval = 1s`
    /// - `retrieval_backoff = 1s`
    /// - `event_capacity = 1024`
    /// - `on_stop = InFlightPolicy::Detach`
    fn default() -> Self {
        Self {
            max_timeout: Duration::from_secs(300),
            grace_period: Duration::from_secs(10),
            poll_interval: Duration::from_secs(1),
            retrieval_backoff: Duration::from_secs(1),
            event_capacity: 1024,
            on_stop: InFlightPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(max_timeout: f64, grace_period: f64) -> Result<BusConfig, BusError> {
        BusConfig::from_secs_f64(max_timeout, grace_period)
    }

    #[test]
    fn test_accepts_valid_limits() {
        assert!(secs(10.0, 5.0).is_ok());
        assert!(secs(10.0, 0.0).is_ok());
        assert!(BusConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_or_negative_timeout() {
        for (max_timeout, grace_period) in [(0.0, 0.0), (0.0, 5.0), (-1.0, 5.0)] {
            let err = secs(max_timeout, grace_period).unwrap_err();
            assert_eq!(
                err.as_label(),
                "bus_invalid_config",
                "max_timeout={max_timeout} grace_period={grace_period}"
            );
        }
    }

    #[test]
    fn test_rejects_negative_grace_period() {
        assert!(matches!(
            secs(5.0, -1.0),
            Err(BusError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_grace_period_must_be_strictly_less_than_timeout() {
        assert!(secs(5.0, 5.0).is_err());
        assert!(secs(5.0, 10.0).is_err());
    }

    #[test]
    fn test_rejects_non_finite_values() {
        assert!(secs(f64::NAN, 1.0).is_err());
        assert!(secs(f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn test_rejects_zero_poll_interval() {
        let cfg = BusConfig {
            poll_interval: Duration::ZERO,
            ..BusConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
