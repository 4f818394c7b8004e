//! # resource-supervisor
//!
//! `resource-supervisor` keeps one fallible external dependency alive: a
//! database connection pool, a network client, anything that can be built,
//! probed, and rebuilt. The supervisor initializes it, health-checks it on a
//! fixed interval while ready, and after any failure heals it automatically
//! on a configurable backoff schedule.
//!
//! ## Quick example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use resource_supervisor::{BoxError, ManagedResource, SupervisorBuilder};
//!
//! struct ApiClient;
//!
//! #[async_trait]
//! impl ManagedResource for ApiClient {
//!     type Value = std::sync::Arc<String>; // stand-in for a real client handle
//!
//!     async fn initialize(&mut self) -> Result<Self::Value, BoxError> {
//!         Ok(std::sync::Arc::new("connected".to_string()))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let handle = SupervisorBuilder::new("api", ApiClient).build().run();
//!
//!     match handle.get().await {
//!         Ok(client) => println!("using {client}"),
//!         Err(err) if err.is_not_ready() => println!("degraded: {err}"),
//!         Err(err) => println!("unexpected: {err}"),
//!     }
//!
//!     handle.teardown().await;
//! }
//! ```
//!
//! ## What you get
//!
//! * **Self-healing** – failed resources are rebuilt on an `Off` / fixed /
//!   incremental / exponential backoff schedule, reset on every recovery.
//! * **One owner** – a single scheduler loop owns the value, the timers, and
//!   the state machine; handles are cheap clones that read state and hand
//!   out the value.
//! * **Contained failures** – every callback error is caught, wrapped with
//!   the supervisor's name, and logged via `tracing`; callers of
//!   [`SupervisorHandle::get`] only ever see a distinguishable "not ready".
//! * **Pool adapter** – [`supervised_pool`] pre-fills platform-wide defaults
//!   for SQL connection pools behind the driver-agnostic [`SqlPool`] seam.
//!
//! With `BackoffConfig::Off` a single failure is permanent: the supervisor
//! stays `Failed` until the process restarts. The other three strategies
//! recover unattended.
//!
//! Supervisors are independent; run as many as you have dependencies.

pub use backoff::BackoffConfig;
pub use error::{BoxError, ResourceError, SupervisorError};
pub use pool::{supervised_pool, PoolOptions, PoolResource, SqlPool};
pub use resource::ManagedResource;
pub use supervisor::{
    builder::SupervisorBuilder, handle::SupervisorHandle, Supervisor, SupervisorState,
};

mod backoff;
mod error;
mod pool;
mod resource;
mod supervisor;
