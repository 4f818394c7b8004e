use crate::error::BoxError;

/// The trait users implement for dependencies managed by a supervisor.
///
/// # Value hand-out semantics
///
/// The supervisor owns the single live [`Value`](Self::Value) and hands out
/// **clones** through [`SupervisorHandle::get`](crate::SupervisorHandle::get).
/// This assumes cloning is cheap, which holds for the intended targets:
/// connection pools and network clients are refcounted handles. A clone is
/// only valid for one logical operation; after observing "not ready" a caller
/// must fetch again, since a heal cycle replaces the instance.
///
/// # Failure contract
///
/// Every method is invoked inside the supervisor's scheduler loop and may
/// fail freely; errors never escape the loop. They are wrapped as
/// [`ResourceError`](crate::ResourceError), logged, and drive the
/// `Ready`/`Failed` state machine.
///
/// When a health check fails, the supervisor discards its *reference* to the
/// old value. It does not call [`teardown`](Self::teardown) on it: the next
/// [`initialize`](Self::initialize) decides whether the old handle needs
/// cleanup before building a fresh one.
#[async_trait::async_trait]
pub trait ManagedResource: Send + 'static {
    /// The wrapped dependency, e.g. a pool handle.
    type Value: Clone + Send + Sync + 'static;

    /// Builds a fresh instance of the dependency. Called on start and on
    /// every heal attempt.
    async fn initialize(&mut self) -> Result<Self::Value, BoxError>;

    /// Liveness probe, run periodically while `Ready`. `Ok(false)` and
    /// `Err(_)` both count as a health failure.
    async fn check(&mut self, value: &Self::Value) -> Result<bool, BoxError> {
        let _ = value;
        Ok(true)
    }

    /// Releases the dependency during supervisor teardown. Best effort:
    /// errors are logged by the supervisor and never propagated.
    async fn teardown(&mut self, value: Self::Value) -> Result<(), BoxError> {
        drop(value);
        Ok(())
    }
}
