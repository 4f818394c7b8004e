pub(crate) mod builder;
pub(crate) mod handle;

use std::{future::Future, time::Duration};

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    backoff::BackoffStrategy,
    error::{BoxError, ResourceError, SupervisorError},
    resource::ManagedResource,
    supervisor::handle::SupervisorHandle,
};

/// Lifecycle state of a [`Supervisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
    Healing,
    /// Terminal. Reached once, stays forever.
    Destroyed,
}

impl SupervisorState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SupervisorState::Ready)
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self, SupervisorState::Destroyed)
    }

    /// True while the supervisor may still reach `Ready` on its own.
    pub fn is_recovering(&self) -> bool {
        matches!(
            self,
            SupervisorState::Initializing | SupervisorState::Failed | SupervisorState::Healing
        )
    }
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initializing => write!(f, "initializing"),
            Self::Ready => write!(f, "ready"),
            Self::Failed => write!(f, "failed"),
            Self::Healing => write!(f, "healing"),
            Self::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// Commands sent from a `SupervisorHandle` to the scheduler loop.
#[derive(Debug)]
pub(crate) enum SupervisorMessage<T> {
    Get(oneshot::Sender<Result<T, SupervisorError>>),
    State(oneshot::Sender<SupervisorState>),
    LastError(oneshot::Sender<Option<String>>),
    Start,
    Teardown(oneshot::Sender<()>),
}

/// Sent by spawned timer tasks back to the scheduler loop.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ScheduledMessage {
    /// A heal delay elapsed; attempt re-initialization.
    HealDue,
    /// The health-check interval ticked; probe the live value.
    HealthCheckDue,
}

/// Manages the life, failure, and recovery of one fallible external
/// dependency.
///
/// The supervisor drives `initialize` on start, probes the live value with
/// `check` on a fixed interval while `Ready`, and on any failure discards
/// the value and retries `initialize` on the schedule computed by its
/// backoff strategy. Every callback failure is caught, wrapped as a
/// [`ResourceError`] and logged; nothing escapes the loop.
///
/// All state lives in a single spawned task. Checks and heals run inline in
/// that task, so no two callbacks of the same supervisor ever overlap.
pub struct Supervisor<R: ManagedResource> {
    name: String,
    resource: R,
    state: SupervisorState,
    value: Option<R::Value>,
    last_error: Option<ResourceError>,
    backoff: BackoffStrategy,
    health_check_interval: Duration,
    call_timeout: Option<Duration>,
    auto_init: bool,
    /// Guards whichever timer (health tick or heal sleep) is pending.
    timer_token: Option<CancellationToken>,
    internal_tx: mpsc::UnboundedSender<ScheduledMessage>,
    internal_rx: mpsc::UnboundedReceiver<ScheduledMessage>,
}

impl<R: ManagedResource> Supervisor<R> {
    /// Consumes the supervisor, spawns its scheduler loop, and returns a
    /// handle for external control.
    pub fn run(self) -> SupervisorHandle<R::Value> {
        let (external_tx, external_rx) = mpsc::unbounded_channel();
        let name = self.name.clone();
        let join_handle = tokio::spawn(async move {
            self.run_loop(external_rx).await;
        });
        SupervisorHandle::new(name, external_tx, join_handle)
    }

    async fn run_loop(
        mut self,
        mut external_rx: mpsc::UnboundedReceiver<SupervisorMessage<R::Value>>,
    ) {
        if self.auto_init {
            self.initialize_resource().await;
        }
        loop {
            // Elapsed timers outrank queries: a caller polling `state()`
            // must not read `Ready` while a due check or heal sits queued.
            tokio::select! {
                biased;
                Some(due) = self.internal_rx.recv() => match due {
                    ScheduledMessage::HealDue => self.run_heal().await,
                    ScheduledMessage::HealthCheckDue => self.run_health_check().await,
                },
                msg = external_rx.recv() => match msg {
                    Some(SupervisorMessage::Get(reply)) => {
                        let _ = reply.send(self.current_value());
                    }
                    Some(SupervisorMessage::State(reply)) => {
                        let _ = reply.send(self.state);
                    }
                    Some(SupervisorMessage::LastError(reply)) => {
                        let rendered = self
                            .last_error
                            .as_ref()
                            .map(|err| format!("{err}: {}", err.cause));
                        let _ = reply.send(rendered);
                    }
                    Some(SupervisorMessage::Start) => {
                        if self.state == SupervisorState::Uninitialized {
                            self.initialize_resource().await;
                        }
                    }
                    Some(SupervisorMessage::Teardown(ack)) => {
                        self.destroy().await;
                        let _ = ack.send(());
                        break;
                    }
                    // Last handle dropped; nobody can reach us anymore.
                    None => {
                        self.destroy().await;
                        break;
                    }
                },
            }
        }
    }

    fn current_value(&self) -> Result<R::Value, SupervisorError> {
        match (&self.state, &self.value) {
            (SupervisorState::Ready, Some(value)) => Ok(value.clone()),
            _ => Err(SupervisorError::NotReady {
                name: self.name.clone(),
                state: self.state,
            }),
        }
    }

    /// Drives `Uninitialized`/`Initializing → Ready | Failed`.
    async fn initialize_resource(&mut self) {
        self.state = SupervisorState::Initializing;
        debug!(supervisor = %self.name, "initializing resource");
        let attempt =
            bounded(self.call_timeout, "initialize", self.resource.initialize()).await;
        match attempt {
            Ok(value) => self.become_ready(value),
            Err(cause) => self.record_failure("initialize failed", cause),
        }
    }

    fn become_ready(&mut self, value: R::Value) {
        self.value = Some(value);
        self.state = SupervisorState::Ready;
        self.last_error = None;
        // New failure episodes start from the initial delay again.
        self.backoff.reset();
        self.arm_health_checks();
        info!(supervisor = %self.name, "resource ready");
    }

    /// Spawns the periodic health tick for the current ready period.
    fn arm_health_checks(&mut self) {
        self.cancel_timers();
        let token = CancellationToken::new();
        self.timer_token = Some(token.clone());
        let tx = self.internal_tx.clone();
        let period = self.health_check_interval;
        // Anchor the schedule here, not at the timer task's first poll.
        let first_tick = tokio::time::Instant::now() + period;
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval_at(first_tick, period);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticks.tick() => {
                        if tx.send(ScheduledMessage::HealthCheckDue).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }

    /// Probes the live value. Only meaningful while `Ready`; stale tick
    /// messages from a previous ready period are dropped here.
    async fn run_health_check(&mut self) {
        if self.state != SupervisorState::Ready {
            return;
        }
        let Some(value) = self.value.clone() else {
            return;
        };
        let outcome = bounded(
            self.call_timeout,
            "health check",
            self.resource.check(&value),
        )
        .await;
        match outcome {
            Ok(true) => debug!(supervisor = %self.name, "health check passed"),
            Ok(false) => self.record_failure(
                "health check failed",
                "check reported the resource unhealthy".into(),
            ),
            Err(cause) => self.record_failure("health check failed", cause),
        }
    }

    /// Wraps and logs a callback failure, drops the value reference, and
    /// schedules the next heal attempt.
    ///
    /// The old value is only forgotten, not torn down: a dead handle's
    /// cleanup, if any, is the next `initialize`'s business.
    fn record_failure(&mut self, message: &str, cause: BoxError) {
        self.cancel_timers();
        self.value = None;
        self.state = SupervisorState::Failed;
        let err = ResourceError::new(&self.name, message, cause);
        error!(supervisor = %self.name, error = %err, cause = %err.cause, "resource failed");
        self.last_error = Some(err);
        self.schedule_heal();
    }

    /// Arms the one-shot heal timer using the backoff strategy, or leaves
    /// the supervisor `Failed` forever when the strategy is `Off`.
    fn schedule_heal(&mut self) {
        let Some(delay) = self.backoff.next_interval() else {
            warn!(
                supervisor = %self.name,
                "healing is disabled; supervisor stays failed until external intervention"
            );
            return;
        };
        info!(supervisor = %self.name, delay = ?delay, "scheduling heal attempt");
        let token = CancellationToken::new();
        self.timer_token = Some(token.clone());
        let tx = self.internal_tx.clone();
        // The delay counts from the failure, not from the timer task's
        // first poll.
        let deadline = tokio::time::Instant::now() + delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    let _ = tx.send(ScheduledMessage::HealDue);
                }
            }
        });
    }

    /// Drives `Failed → Healing → Ready | Failed`.
    async fn run_heal(&mut self) {
        if self.state != SupervisorState::Failed {
            return;
        }
        self.state = SupervisorState::Healing;
        info!(supervisor = %self.name, "attempting heal");
        let attempt =
            bounded(self.call_timeout, "initialize", self.resource.initialize()).await;
        match attempt {
            Ok(value) => self.become_ready(value),
            Err(cause) => self.record_failure("heal attempt failed", cause),
        }
    }

    /// Terminal teardown: cancels pending timers before releasing the value
    /// so no check or heal can fire afterwards. Teardown errors are logged
    /// and swallowed.
    async fn destroy(&mut self) {
        if self.state == SupervisorState::Destroyed {
            return;
        }
        self.cancel_timers();
        if let Some(value) = self.value.take() {
            let outcome =
                bounded(self.call_timeout, "teardown", self.resource.teardown(value)).await;
            if let Err(cause) = outcome {
                let err = ResourceError::new(&self.name, "teardown failed", cause);
                warn!(supervisor = %self.name, error = %err, cause = %err.cause, "teardown failed");
                self.last_error = Some(err);
            }
        }
        self.state = SupervisorState::Destroyed;
        info!(supervisor = %self.name, "supervisor destroyed");
    }

    fn cancel_timers(&mut self) {
        if let Some(token) = self.timer_token.take() {
            token.cancel();
        }
    }
}

/// Runs a resource callback under the optional per-call timeout; elapsing
/// counts as a failure of that call.
async fn bounded<T>(
    limit: Option<Duration>,
    what: &str,
    fut: impl Future<Output = Result<T, BoxError>>,
) -> Result<T, BoxError> {
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(format!("{what} timed out after {limit:?}").into()),
        },
        None => fut.await,
    }
}
