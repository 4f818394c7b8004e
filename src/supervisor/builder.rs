use std::time::Duration;

use tokio::sync::mpsc;

use crate::{
    backoff::{BackoffConfig, BackoffStrategy},
    resource::ManagedResource,
    Supervisor, SupervisorState,
};

/// Builds a [`Supervisor`] with configurable lifecycle parameters.
///
/// Defaults: exponential backoff (1 s initial, 60 s cap), a 30 s health-check
/// interval, no per-call timeout, auto-init on.
pub struct SupervisorBuilder<R: ManagedResource> {
    name: String,
    resource: R,
    heal: BackoffConfig,
    health_check_interval: Duration,
    call_timeout: Option<Duration>,
    auto_init: bool,
}

impl<R: ManagedResource> SupervisorBuilder<R> {
    /// Creates a builder for the named resource. The name only identifies
    /// the supervisor in logs and errors.
    pub fn new(name: impl Into<String>, resource: R) -> Self {
        Self {
            name: name.into(),
            resource,
            heal: BackoffConfig::default(),
            health_check_interval: Duration::from_secs(30),
            call_timeout: None,
            auto_init: true,
        }
    }

    /// Sets the backoff strategy used to schedule heal attempts.
    pub fn with_heal(mut self, heal: BackoffConfig) -> Self {
        self.heal = heal;
        self
    }

    /// Sets the interval between liveness probes while the resource is ready.
    pub fn with_health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    /// Bounds every `initialize`/`check`/`teardown` invocation. Without it a
    /// hung callback stalls the supervisor's loop indefinitely.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// When disabled, the supervisor idles in `Uninitialized` until
    /// [`start`](crate::SupervisorHandle::start) is called.
    pub fn with_auto_init(mut self, auto_init: bool) -> Self {
        self.auto_init = auto_init;
        self
    }

    /// Constructs the `Supervisor` with the configured settings.
    pub fn build(self) -> Supervisor<R> {
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        Supervisor {
            name: self.name,
            resource: self.resource,
            state: SupervisorState::Uninitialized,
            value: None,
            last_error: None,
            backoff: BackoffStrategy::new(self.heal),
            health_check_interval: self.health_check_interval,
            call_timeout: self.call_timeout,
            auto_init: self.auto_init,
            timer_token: None,
            internal_tx,
            internal_rx,
        }
    }
}
