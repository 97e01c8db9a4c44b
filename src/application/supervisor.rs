use std::any::Any;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Pause between a supervised task ending and its restart.
pub const DEFAULT_RESTART_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Running,
    Stopped,
}

/// How a supervised run ended, other than cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// The task returned an error.
    Failed(String),
    /// The task panicked.
    Panicked(String),
    /// The task was aborted before completing.
    Aborted,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(e) => write!(f, "failed: {e}"),
            Self::Panicked(msg) => write!(f, "panicked: {msg}"),
            Self::Aborted => f.write_str("aborted"),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Runs `task` on its own tokio task so that a panic anywhere inside it comes
/// back as a `Fault` instead of unwinding through the caller.
pub async fn run_guarded<Fut, E>(task: Fut) -> Result<(), Fault>
where
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    match tokio::spawn(task).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Fault::Failed(e.to_string())),
        Err(join) if join.is_panic() => Err(Fault::Panicked(panic_message(join.into_panic()))),
        Err(_) => Err(Fault::Aborted),
    }
}

/// Keeps a task running indefinitely, restarting it after a fixed backoff
/// whenever it ends, however it ends.
///
/// The only way out is the shutdown token, checked before every restart. The
/// backoff sleep is cut short by cancellation.
pub struct Supervisor {
    name: String,
    backoff: Duration,
    shutdown: CancellationToken,
    state: SupervisorState,
    restarts: u64,
}

impl Supervisor {
    pub fn new(name: impl Into<String>, shutdown: CancellationToken) -> Self {
        Self {
            name: name.into(),
            backoff: DEFAULT_RESTART_BACKOFF,
            shutdown,
            state: SupervisorState::Running,
            restarts: 0,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    /// Supervises runs produced by `make_task` until shutdown. Returns the
    /// number of restarts performed.
    pub async fn run<F, Fut, E>(&mut self, mut make_task: F) -> u64
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        self.state = SupervisorState::Running;
        info!(supervised = %self.name, "supervisor started");

        loop {
            if self.shutdown.is_cancelled() {
                self.state = SupervisorState::Stopped;
                info!(supervised = %self.name, restarts = self.restarts, "supervisor stopped");
                return self.restarts;
            }

            match run_guarded(make_task()).await {
                Ok(()) if self.shutdown.is_cancelled() => continue,
                Ok(()) => warn!(
                    supervised = %self.name,
                    backoff_ms = self.backoff.as_millis() as u64,
                    "supervised task returned, restarting"
                ),
                Err(fault) => error!(
                    supervised = %self.name,
                    %fault,
                    backoff_ms = self.backoff.as_millis() as u64,
                    "supervised task faulted, restarting"
                ),
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => continue,
                _ = tokio::time::sleep(self.backoff) => {}
            }
            self.restarts += 1;
        }
    }
}
