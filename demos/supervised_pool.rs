use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use resource_supervisor::{BackoffConfig, BoxError, ManagedResource, SupervisorBuilder};

/// A pretend database that refuses the first two connection attempts and
/// drops the connection after a few pings.
struct FlakyDatabase {
    attempts: usize,
    pings: Arc<AtomicUsize>,
}

#[derive(Clone)]
struct Connection {
    generation: usize,
    pings: Arc<AtomicUsize>,
}

#[async_trait]
impl ManagedResource for FlakyDatabase {
    type Value = Connection;

    async fn initialize(&mut self) -> Result<Connection, BoxError> {
        self.attempts += 1;
        if self.attempts <= 2 {
            return Err(format!("connection refused (attempt {})", self.attempts).into());
        }
        println!("🔌 connected (generation {})", self.attempts);
        self.pings.store(0, Ordering::SeqCst);
        Ok(Connection {
            generation: self.attempts,
            pings: self.pings.clone(),
        })
    }

    async fn check(&mut self, conn: &Connection) -> Result<bool, BoxError> {
        let pings = conn.pings.fetch_add(1, Ordering::SeqCst) + 1;
        println!("🩺 ping #{pings} on generation {}", conn.generation);
        Ok(pings < 4)
    }

    async fn teardown(&mut self, conn: Connection) -> Result<(), BoxError> {
        println!("👋 closing generation {}", conn.generation);
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let handle = SupervisorBuilder::new(
        "flaky-db",
        FlakyDatabase {
            attempts: 0,
            pings: Arc::new(AtomicUsize::new(0)),
        },
    )
    .with_heal(BackoffConfig::ExponentialBackoff {
        initial_delay: Duration::from_millis(500),
        max_interval: Duration::from_secs(4),
    })
    .with_health_check_interval(Duration::from_secs(1))
    .build()
    .run();

    for _ in 0..12 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        match handle.get().await {
            Ok(conn) => println!("✅ using generation {}", conn.generation),
            Err(err) => println!("⏳ {err}"),
        }
    }

    handle.teardown().await;
    println!("done 🫡");
}
