use std::time::Duration;

/// How the supervisor schedules recovery attempts after a failure.
///
/// All delays are plain [`Duration`]s; convert from whatever unit your
/// configuration uses at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffConfig {
    /// Never heal automatically. A single failure leaves the supervisor
    /// `Failed` until the process is restarted.
    Off,
    /// `initial_delay` once, then a constant `interval` between attempts.
    FixedInterval {
        initial_delay: Duration,
        interval: Duration,
    },
    /// Delay grows by `increment` on every attempt, capped at `max_interval`.
    IncrementalBackoff {
        initial_delay: Duration,
        increment: Duration,
        max_interval: Duration,
    },
    /// Delay doubles on every attempt, capped at `max_interval`.
    ExponentialBackoff {
        initial_delay: Duration,
        max_interval: Duration,
    },
}

impl Default for BackoffConfig {
    /// Exponential backoff, 1 second initial delay, 1 minute cap.
    fn default() -> Self {
        Self::ExponentialBackoff {
            initial_delay: Duration::from_secs(1),
            max_interval: Duration::from_secs(60),
        }
    }
}

/// Where the strategy is in the current failure episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackoffPhase {
    /// No attempt scheduled yet; the next interval is the initial delay.
    Inactive,
    /// Exactly one interval handed out.
    Initial,
    /// Two or more intervals handed out.
    Active,
}

/// Runtime progression of a [`BackoffConfig`].
///
/// Owned exclusively by the supervisor's scheduler loop; never shared.
/// Within one unbroken failure episode the returned intervals never
/// decrease (except when `max_interval < initial_delay`, which clamps
/// from the second call onward). Only [`reset`](Self::reset) restarts
/// the progression, and the supervisor calls it exactly when it returns
/// to `Ready`.
#[derive(Debug)]
pub(crate) struct BackoffStrategy {
    config: BackoffConfig,
    phase: BackoffPhase,
    last_interval: Option<Duration>,
}

impl BackoffStrategy {
    pub(crate) fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            phase: BackoffPhase::Inactive,
            last_interval: None,
        }
    }

    /// Advances the progression one step and returns the delay before the
    /// next heal attempt. `None` means "never schedule" (`Off`).
    ///
    /// Calling this is the caller's commitment that an attempt is about to
    /// be scheduled.
    pub(crate) fn next_interval(&mut self) -> Option<Duration> {
        let next = match self.config {
            BackoffConfig::Off => return None,
            BackoffConfig::FixedInterval {
                initial_delay,
                interval,
            } => match self.phase {
                BackoffPhase::Inactive => initial_delay,
                _ => interval,
            },
            BackoffConfig::IncrementalBackoff {
                initial_delay,
                increment,
                max_interval,
            } => match self.phase {
                BackoffPhase::Inactive => initial_delay,
                _ => self
                    .last_interval
                    .unwrap_or(initial_delay)
                    .saturating_add(increment)
                    .min(max_interval),
            },
            BackoffConfig::ExponentialBackoff {
                initial_delay,
                max_interval,
            } => match self.phase {
                BackoffPhase::Inactive => initial_delay,
                _ => self
                    .last_interval
                    .unwrap_or(initial_delay)
                    .saturating_mul(2)
                    .min(max_interval),
            },
        };
        self.phase = match self.phase {
            BackoffPhase::Inactive => BackoffPhase::Initial,
            _ => BackoffPhase::Active,
        };
        self.last_interval = Some(next);
        Some(next)
    }

    /// Returns the progression to its starting point. Idempotent.
    pub(crate) fn reset(&mut self) {
        self.phase = BackoffPhase::Inactive;
        self.last_interval = None;
    }
}
