//! Idle-time scheduling with a fallback timer

use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Host signal that the main thread has entered an idle period
#[async_trait::async_trait]
pub trait IdleSignal: Send + Sync {
    /// Resolve at the next idle period
    async fn idle(&self);
}

/// Signal that never reports idleness; only the fallback timer fires
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverIdle;

#[async_trait::async_trait]
impl IdleSignal for NeverIdle {
    async fn idle(&self) {
        std::future::pending::<()>().await
    }
}

/// Idle signal raised by the host (e.g. from a requestIdleCallback bridge)
#[derive(Debug, Default)]
pub struct ManualIdle {
    notify: Notify,
}

impl ManualIdle {
    /// Create a new signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Report an idle period. Stored if nobody is waiting yet.
    pub fn signal_idle(&self) {
        self.notify.notify_one();
    }
}

#[async_trait::async_trait]
impl IdleSignal for ManualIdle {
    async fn idle(&self) {
        self.notify.notified().await
    }
}

/// What woke an idle schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleWake {
    /// The host reported an idle period
    Idle,
    /// The fallback timer elapsed first
    Timeout,
}

/// Cancellation handle for a scheduled idle job
#[derive(Debug)]
pub struct IdleHandle {
    task: Option<JoinHandle<()>>,
}

impl IdleHandle {
    /// Cancel the job if it has not fired yet
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Check if the job has fired or been cancelled
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the job. Returns true if it ran, false if it was cancelled.
    pub async fn join(mut self) -> bool {
        match self.task.take() {
            Some(task) => task.await.is_ok(),
            None => false,
        }
    }
}

/// Run `job` once, at the first idle period or after `timeout`,
/// whichever comes first. Dropping the handle does not cancel the job.
pub(crate) fn schedule_idle<F>(
    runtime: &Handle,
    idle: Arc<dyn IdleSignal>,
    timeout: Duration,
    job: F,
) -> IdleHandle
where
    F: FnOnce(IdleWake) + Send + 'static,
{
    let task = runtime.spawn(async move {
        let wake = tokio::select! {
            _ = idle.idle() => IdleWake::Idle,
            _ = tokio::time::sleep(timeout) => IdleWake::Timeout,
        };
        job(wake);
    });

    IdleHandle { task: Some(task) }
}
