//! Launch barrier between request handlers and retrieval workers
//!
//! A handler never waits for a retrieval to finish — only for proof that
//! the spawned task has actually begun executing. The spawned task fires a
//! one-shot [`StartSignal`] as its very first action; the launcher awaits
//! that signal with a deadline and reports [`LaunchOutcome`].
//!
//! A task that signals just after the deadline is not cancelled: it keeps
//! running detached, and its terminal transition may later overwrite the
//! FAILED verdict the launcher recorded. That overwrite is intentional.

use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;

/// Result of waiting for a spawned task's start signal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The task signalled start within the deadline
    Started,
    /// The deadline elapsed first (the task was not cancelled)
    TimedOut,
}

/// One-shot handle a spawned task fires to acknowledge it is running
pub struct StartSignal(Option<oneshot::Sender<()>>);

impl StartSignal {
    /// Acknowledge that execution has begun
    ///
    /// Must be called before any potentially slow work. Firing after the
    /// launcher gave up is harmless.
    pub fn begun(mut self) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(());
        }
    }
}

/// Spawn `work` as a detached task and wait for its start signal
///
/// The closure receives the [`StartSignal`] to fire. Whatever the spawned
/// task does afterwards is invisible here; its outcome is observed through
/// the status store only.
pub(crate) async fn launch_detached<F, Fut>(start_timeout: Duration, work: F) -> LaunchOutcome
where
    F: FnOnce(StartSignal) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    tokio::spawn(work(StartSignal(Some(tx))));

    match tokio::time::timeout(start_timeout, rx).await {
        Ok(Ok(())) => LaunchOutcome::Started,
        Ok(Err(_)) => {
            // The task dropped its signal without firing it (it died before
            // doing any work); to the caller that is indistinguishable from
            // never starting.
            tracing::warn!("Spawned task dropped its start signal without firing it");
            LaunchOutcome::TimedOut
        }
        Err(_) => LaunchOutcome::TimedOut,
    }
}
