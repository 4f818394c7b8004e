use std::time::Duration;

use crate::{
    backoff::BackoffConfig, error::BoxError, resource::ManagedResource,
    supervisor::builder::SupervisorBuilder, Supervisor,
};

/// Driver-agnostic seam over a SQL connection pool.
///
/// Implement this for your driver's pool handle (which is expected to be a
/// cheap refcounted clone, as `sqlx`-style pools are) and feed it to
/// [`supervised_pool`]. No driver dependency lives in this crate.
#[async_trait::async_trait]
pub trait SqlPool: Clone + Send + Sync + Sized + 'static {
    /// Opens the pool with the given sizing and timeouts.
    async fn connect(options: &PoolOptions) -> Result<Self, BoxError>;

    /// Runs the liveness query, discarding its result.
    async fn ping(&self, query: &str) -> Result<(), BoxError>;

    /// Closes the pool. Failures are logged by the supervisor, never raised.
    async fn close(&self) -> Result<(), BoxError>;
}

/// Platform-wide defaults for supervised SQL pools.
///
/// Every consumer goes through [`PoolOptions::DEFAULT`], so retuning the
/// fleet is a one-line edit here rather than one per call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    /// Trivial query used as the liveness probe.
    pub liveness_query: &'static str,
    pub health_check_interval: Duration,
    pub heal: BackoffConfig,
}

impl PoolOptions {
    pub const DEFAULT: PoolOptions = PoolOptions {
        max_connections: 10,
        min_connections: 1,
        acquire_timeout: Duration::from_secs(5),
        liveness_query: "SELECT 1",
        health_check_interval: Duration::from_secs(30),
        heal: BackoffConfig::ExponentialBackoff {
            initial_delay: Duration::from_secs(1),
            max_interval: Duration::from_secs(60),
        },
    };
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// [`ManagedResource`] adapter wiring a [`SqlPool`] into a supervisor:
/// connect on initialize, ping on check, close on teardown.
pub struct PoolResource<P: SqlPool> {
    options: PoolOptions,
    _pool: std::marker::PhantomData<fn() -> P>,
}

impl<P: SqlPool> PoolResource<P> {
    pub fn new(options: PoolOptions) -> Self {
        Self {
            options,
            _pool: std::marker::PhantomData,
        }
    }

    pub fn options(&self) -> &PoolOptions {
        &self.options
    }
}

#[async_trait::async_trait]
impl<P: SqlPool> ManagedResource for PoolResource<P> {
    type Value = P;

    async fn initialize(&mut self) -> Result<P, BoxError> {
        P::connect(&self.options).await
    }

    async fn check(&mut self, pool: &P) -> Result<bool, BoxError> {
        pool.ping(self.options.liveness_query).await?;
        Ok(true)
    }

    async fn teardown(&mut self, pool: P) -> Result<(), BoxError> {
        pool.close().await
    }
}

/// Builds a supervisor for a SQL pool with the platform defaults pre-filled.
///
/// This is a configuration factory, not a new state machine: everything it
/// does is reachable through [`SupervisorBuilder`] by hand.
pub fn supervised_pool<P: SqlPool>(
    name: impl Into<String>,
    options: PoolOptions,
) -> Supervisor<PoolResource<P>> {
    let heal = options.heal;
    let health_check_interval = options.health_check_interval;
    SupervisorBuilder::new(name, PoolResource::new(options))
        .with_heal(heal)
        .with_health_check_interval(health_check_interval)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pin_the_platform_policy() {
        let options = PoolOptions::default();
        assert_eq!(options.liveness_query, "SELECT 1");
        assert_eq!(options.max_connections, 10);
        assert_eq!(
            options.heal,
            BackoffConfig::ExponentialBackoff {
                initial_delay: Duration::from_secs(1),
                max_interval: Duration::from_secs(60),
            }
        );
        assert_eq!(options.health_check_interval, Duration::from_secs(30));
    }
}
