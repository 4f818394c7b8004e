mod common;

use std::time::Duration;

use tokio::time::{advance, pause};

use resource_supervisor::{BackoffConfig, SupervisorBuilder, SupervisorError, SupervisorState};

use common::{settle, test_builder, HangingResource, Probe, ScriptedResource};

#[tokio::test]
async fn auto_init_reaches_ready_and_hands_out_the_value() {
    pause();
    let probe = Probe::new();
    let handle = test_builder(&probe, 0).build().run();

    assert_eq!(handle.state().await, SupervisorState::Ready);
    assert_eq!(handle.get().await.unwrap(), 1);
    assert_eq!(probe.initialize_calls(), 1);
}

#[tokio::test]
async fn get_while_failed_is_a_distinguishable_not_ready() {
    pause();
    let probe = Probe::new();
    let handle = test_builder(&probe, usize::MAX).build().run();

    assert_eq!(handle.state().await, SupervisorState::Failed);
    let err = handle.get().await.unwrap_err();
    assert!(err.is_not_ready());
    assert_eq!(
        err,
        SupervisorError::NotReady {
            name: "test".to_string(),
            state: SupervisorState::Failed,
        }
    );
}

#[tokio::test]
async fn manual_start_waits_for_the_start_call() {
    pause();
    let probe = Probe::new();
    let handle = test_builder(&probe, 0).with_auto_init(false).build().run();

    assert_eq!(handle.state().await, SupervisorState::Uninitialized);
    assert!(handle.get().await.unwrap_err().is_not_ready());
    assert_eq!(probe.initialize_calls(), 0);

    handle.start();
    assert_eq!(handle.state().await, SupervisorState::Ready);
    assert_eq!(probe.initialize_calls(), 1);
}

#[tokio::test]
async fn health_checks_run_only_while_ready() {
    pause();
    let probe = Probe::new();
    // A far-off heal keeps recovery out of this test's window.
    let handle = SupervisorBuilder::new("test", ScriptedResource::reliable(&probe))
        .with_health_check_interval(Duration::from_millis(100))
        .with_heal(BackoffConfig::FixedInterval {
            initial_delay: Duration::from_secs(600),
            interval: Duration::from_secs(600),
        })
        .build()
        .run();
    assert_eq!(handle.state().await, SupervisorState::Ready);

    // 100 ms interval: ticks at 100..500 over 550 ms.
    advance(Duration::from_millis(550)).await;
    settle().await;
    let while_ready = probe.check_calls();
    assert!((4..=6).contains(&while_ready), "got {while_ready}");

    // Failure stops the probing; only heal attempts may run from here on.
    probe.set_healthy(false);
    advance(Duration::from_millis(110)).await;
    settle().await;
    assert_eq!(handle.state().await, SupervisorState::Failed);
    let at_failure = probe.check_calls();

    probe.set_healthy(true); // would pass again, but nothing may probe now
    advance(Duration::from_millis(200)).await;
    settle().await;
    assert_eq!(probe.check_calls(), at_failure);
    assert_eq!(handle.state().await, SupervisorState::Failed);
}

#[tokio::test]
async fn failed_health_check_discards_the_value_and_heals_at_initial_delay() {
    pause();
    let probe = Probe::new();
    let handle = test_builder(&probe, 0).build().run();
    assert_eq!(handle.get().await.unwrap(), 1);

    // First tick is due at 100 ms; overshoot it.
    probe.set_healthy(false);
    advance(Duration::from_millis(110)).await;
    settle().await;
    assert_eq!(handle.state().await, SupervisorState::Failed);
    assert!(handle.get().await.unwrap_err().is_not_ready());
    assert!(handle.last_error().await.unwrap().contains("health check"));

    // Heal is due 50 ms (the strategy's initial delay) after the failure
    // at 100 ms, and yields a fresh instance.
    probe.set_healthy(true);
    advance(Duration::from_millis(60)).await;
    settle().await;
    assert_eq!(handle.state().await, SupervisorState::Ready);
    assert_eq!(handle.get().await.unwrap(), 2);
}

#[tokio::test]
async fn hung_initialize_fails_via_the_call_timeout() {
    pause();
    let handle = SupervisorBuilder::new("hung", HangingResource)
        .with_call_timeout(Duration::from_millis(100))
        .with_heal(BackoffConfig::Off)
        .build()
        .run();

    advance(Duration::from_millis(150)).await;
    settle().await;
    assert_eq!(handle.state().await, SupervisorState::Failed);
    assert!(handle.last_error().await.unwrap().contains("timed out"));
}

#[tokio::test]
async fn get_during_an_in_flight_initialize_resolves_with_its_outcome() {
    pause();
    let handle = SupervisorBuilder::new("hung", HangingResource)
        .with_call_timeout(Duration::from_millis(100))
        .with_heal(BackoffConfig::Off)
        .build()
        .run();

    // Queued behind the hung initialize; must not resolve to a stale state.
    let reader = handle.clone();
    let pending_get = tokio::spawn(async move { reader.get().await });
    tokio::task::yield_now().await;
    assert!(!pending_get.is_finished());

    advance(Duration::from_millis(150)).await;
    settle().await;
    let err = pending_get.await.unwrap().unwrap_err();
    assert_eq!(
        err,
        SupervisorError::NotReady {
            name: "hung".to_string(),
            state: SupervisorState::Failed,
        }
    );
}
