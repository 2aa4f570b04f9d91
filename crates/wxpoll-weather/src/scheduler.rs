//! Poll scheduling state machine.
//!
//! A heartbeat calls [`PollScheduler::tick`] every [`HEARTBEAT_INTERVAL`];
//! manual refreshes call [`PollScheduler::request_poll`]. Either way a poll is
//! never dispatched less than [`MIN_POLL_INTERVAL`] after the previous one.

use std::time::{Duration, Instant};

/// Hard floor between two weather requests, independent of configuration
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// How often the heartbeat re-evaluates the refresh interval
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    #[default]
    Idle,
    /// A request has been dispatched and not completed
    Polling,
    /// Idle, but inside the minimum interval
    Cooldown,
    /// Last request failed; polling suppressed until cleared
    Error,
}

/// Result of a poll trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// Send a request now; `last_polled_at` has been stamped
    Dispatch,
    /// Configured interval has not elapsed yet
    NotDue,
    /// Under the minimum interval
    TooSoon,
    /// Error latch is set
    Latched,
}

#[derive(Debug, Clone)]
pub struct PollScheduler {
    phase: PollPhase,
    last_polled_at: Option<Instant>,
    interval: Duration,
    error_latched: bool,
}

impl PollScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            phase: PollPhase::Idle,
            last_polled_at: None,
            interval,
            error_latched: false,
        }
    }

    /// Current phase, with the cooldown window derived from `now`
    pub fn phase(&self, now: Instant) -> PollPhase {
        match self.phase {
            PollPhase::Idle if self.within_floor(now) => PollPhase::Cooldown,
            phase => phase,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_polled_at(&self) -> Option<Instant> {
        self.last_polled_at
    }

    pub fn is_latched(&self) -> bool {
        self.error_latched
    }

    /// Heartbeat: poll once the configured interval has elapsed.
    pub fn tick(&mut self, now: Instant) -> PollDecision {
        let due = match self.last_polled_at {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        };
        if !due {
            return PollDecision::NotDue;
        }
        self.request_poll(now)
    }

    /// Any poll trigger. Exactly [`MIN_POLL_INTERVAL`] after the previous
    /// poll is allowed.
    pub fn request_poll(&mut self, now: Instant) -> PollDecision {
        if self.error_latched {
            tracing::debug!("Poll suppressed: error latch set");
            return PollDecision::Latched;
        }
        if self.within_floor(now) {
            tracing::debug!("Poll dropped: under minimum interval");
            return PollDecision::TooSoon;
        }

        self.last_polled_at = Some(now);
        self.phase = PollPhase::Polling;
        PollDecision::Dispatch
    }

    /// Clear the error latch and request a poll, still honoring the floor.
    pub fn force(&mut self, now: Instant) -> PollDecision {
        if self.error_latched {
            tracing::info!("Error latch cleared by forced refresh");
        }
        self.error_latched = false;
        if self.phase == PollPhase::Error {
            self.phase = PollPhase::Idle;
        }
        self.request_poll(now)
    }

    pub fn on_success(&mut self) {
        self.phase = PollPhase::Idle;
        self.error_latched = false;
    }

    pub fn on_failure(&mut self) {
        self.phase = PollPhase::Error;
        self.error_latched = true;
    }

    /// Forget all poll history, e.g. after reconfiguration
    pub fn reset(&mut self, interval: Duration) {
        *self = Self::new(interval);
    }

    fn within_floor(&self, now: Instant) -> bool {
        self.last_polled_at
            .is_some_and(|last| now.saturating_duration_since(last) < MIN_POLL_INTERVAL)
    }
}
