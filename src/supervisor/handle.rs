use std::sync::Arc;

use tokio::{
    sync::{mpsc, oneshot, Mutex},
    task::JoinHandle,
};

use crate::{
    error::SupervisorError,
    supervisor::{SupervisorMessage, SupervisorState},
};

/// Cloneable handle to a running supervisor's scheduler loop.
///
/// Handles are pure readers plus the three explicit commands (`start`,
/// `teardown`, `wait`); they never own timers and never trigger checks.
/// When the last handle is dropped the supervisor tears itself down.
#[derive(Debug)]
pub struct SupervisorHandle<T> {
    name: String,
    tx: mpsc::UnboundedSender<SupervisorMessage<T>>,
    join_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<T> Clone for SupervisorHandle<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            tx: self.tx.clone(),
            join_handle: Arc::clone(&self.join_handle),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> SupervisorHandle<T> {
    pub(crate) fn new(
        name: String,
        tx: mpsc::UnboundedSender<SupervisorMessage<T>>,
        join_handle: JoinHandle<()>,
    ) -> Self {
        Self {
            name,
            tx,
            join_handle: Arc::new(Mutex::new(Some(join_handle))),
        }
    }

    /// The supervisor's diagnostic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a clone of the wrapped value, only while the supervisor is
    /// `Ready`. Any other state yields [`SupervisorError::NotReady`], which
    /// callers should treat as "retry later", not as fatal.
    ///
    /// A `get` issued while the scheduler loop is inside `initialize`,
    /// `check`, or `teardown` queues behind that callback and resolves with
    /// the post-callback state: it waits out an in-flight initialization
    /// instead of spuriously failing. Builders can bound that wait with
    /// [`with_call_timeout`](crate::SupervisorBuilder::with_call_timeout).
    ///
    /// Do not cache the returned value across a not-ready observation; a
    /// heal cycle replaces the underlying instance.
    pub async fn get(&self) -> Result<T, SupervisorError> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(SupervisorMessage::Get(reply)).is_err() {
            return Err(self.destroyed());
        }
        rx.await.unwrap_or_else(|_| Err(self.destroyed()))
    }

    /// Current lifecycle state. `Destroyed` once the loop has exited.
    pub async fn state(&self) -> SupervisorState {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(SupervisorMessage::State(reply)).is_err() {
            return SupervisorState::Destroyed;
        }
        rx.await.unwrap_or(SupervisorState::Destroyed)
    }

    /// Rendered form of the most recent failure, if the current episode
    /// recorded one.
    pub async fn last_error(&self) -> Option<String> {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(SupervisorMessage::LastError(reply)).is_err() {
            return None;
        }
        rx.await.ok().flatten()
    }

    /// Triggers the first initialization for supervisors built with
    /// `with_auto_init(false)`. A no-op in every other state.
    pub fn start(&self) {
        let _ = self.tx.send(SupervisorMessage::Start);
    }

    /// Destroys the supervisor: cancels pending timers, releases the wrapped
    /// value, and stops the loop. Idempotent; repeat calls (and calls racing
    /// with another handle's teardown) return once the loop is gone.
    pub async fn teardown(&self) {
        let (ack, rx) = oneshot::channel();
        if self.tx.send(SupervisorMessage::Teardown(ack)).is_ok() {
            let _ = rx.await;
        }
        self.wait().await;
    }

    /// Waits for the scheduler loop to exit.
    pub async fn wait(&self) {
        let handle = self.join_handle.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    fn destroyed(&self) -> SupervisorError {
        SupervisorError::NotReady {
            name: self.name.clone(),
            state: SupervisorState::Destroyed,
        }
    }
}
