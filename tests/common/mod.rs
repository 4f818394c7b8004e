use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use resource_supervisor::{BoxError, ManagedResource, SupervisorBuilder};

/// Shared observation point for a [`ScriptedResource`].
#[derive(Clone, Default)]
pub struct Probe {
    pub initialize_calls: Arc<AtomicUsize>,
    pub check_calls: Arc<AtomicUsize>,
    pub teardown_calls: Arc<AtomicUsize>,
    pub healthy: Arc<AtomicBool>,
}

impl Probe {
    #[allow(unused)]
    pub fn new() -> Self {
        let probe = Probe::default();
        probe.healthy.store(true, Ordering::SeqCst);
        probe
    }

    #[allow(unused)]
    pub fn initialize_calls(&self) -> usize {
        self.initialize_calls.load(Ordering::SeqCst)
    }

    #[allow(unused)]
    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    #[allow(unused)]
    pub fn teardown_calls(&self) -> usize {
        self.teardown_calls.load(Ordering::SeqCst)
    }

    #[allow(unused)]
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

/// Test resource whose first `fail_first` initializations fail and whose
/// health follows `probe.healthy`. The value is the 1-based initialization
/// attempt number, so tests can see instance replacement after a heal.
pub struct ScriptedResource {
    pub probe: Probe,
    pub fail_first: usize,
}

impl ScriptedResource {
    #[allow(unused)]
    pub fn reliable(probe: &Probe) -> Self {
        Self {
            probe: probe.clone(),
            fail_first: 0,
        }
    }

    #[allow(unused)]
    pub fn failing_first(probe: &Probe, fail_first: usize) -> Self {
        Self {
            probe: probe.clone(),
            fail_first,
        }
    }

    /// Never initializes successfully.
    #[allow(unused)]
    pub fn broken(probe: &Probe) -> Self {
        Self {
            probe: probe.clone(),
            fail_first: usize::MAX,
        }
    }
}

#[async_trait]
impl ManagedResource for ScriptedResource {
    type Value = usize;

    async fn initialize(&mut self) -> Result<usize, BoxError> {
        let attempt = self.probe.initialize_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.fail_first {
            return Err(anyhow::anyhow!("connection refused (attempt {attempt})").into());
        }
        Ok(attempt)
    }

    async fn check(&mut self, _value: &usize) -> Result<bool, BoxError> {
        self.probe.check_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.probe.healthy.load(Ordering::SeqCst))
    }

    async fn teardown(&mut self, _value: usize) -> Result<(), BoxError> {
        self.probe.teardown_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Lets a fired timer travel timer task → channel → scheduler loop before
/// the test asserts on counters or state.
#[allow(unused)]
pub async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// Resource whose `initialize` never completes, for call-timeout tests.
#[allow(unused)]
pub struct HangingResource;

#[async_trait]
impl ManagedResource for HangingResource {
    type Value = usize;

    async fn initialize(&mut self) -> Result<usize, BoxError> {
        std::future::pending().await
    }
}

/// Builder with test-friendly timings: 100 ms health checks and fixed
/// 50 ms / 200 ms healing unless a test overrides them.
#[allow(unused)]
pub fn test_builder(probe: &Probe, fail_first: usize) -> SupervisorBuilder<ScriptedResource> {
    SupervisorBuilder::new("test", ScriptedResource::failing_first(probe, fail_first))
        .with_health_check_interval(Duration::from_millis(100))
        .with_heal(resource_supervisor::BackoffConfig::FixedInterval {
            initial_delay: Duration::from_millis(50),
            interval: Duration::from_millis(200),
        })
}
