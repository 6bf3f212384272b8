//! A single worker session

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use render_core::error::SessionError;
use render_core::traits::{BoxedStream, SessionJob, Worker};
use render_core::SessionId;

/// One worker task bound to one data stream
pub struct Session {
    /// Session ID
    id: SessionId,
    /// The running worker task
    handle: JoinHandle<i32>,
    /// When the task was spawned
    started_at: Instant,
}

impl Session {
    /// Create a session for `stream` and start it
    ///
    /// Creation and start are one step: on error the stream has already
    /// been dropped and nothing is left to clean up.
    pub fn spawn(
        worker: &dyn Worker,
        id: SessionId,
        stream: BoxedStream,
    ) -> Result<Self, SessionError> {
        let job = worker.create(id, stream)?;
        Ok(Self::start(id, job))
    }

    /// Start an already-built job
    pub fn start(id: SessionId, job: SessionJob) -> Self {
        tracing::debug!("Starting {}", id);
        Self {
            id,
            handle: tokio::spawn(job),
            started_at: Instant::now(),
        }
    }

    /// Session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Whether the worker task has completed
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Time since the session started
    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Collect the exit status of a finished session without waiting
    ///
    /// Returns `None` while the worker is still running.
    pub fn try_exit_status(&mut self) -> Option<Result<i32, SessionError>> {
        if !self.handle.is_finished() {
            return None;
        }
        let id = self.id;
        (&mut self.handle)
            .now_or_never()
            .map(|result| result.map_err(|_| SessionError::Aborted(id)))
    }

    /// Wait for the worker to finish and return its exit status
    pub async fn join(self) -> Result<i32, SessionError> {
        let id = self.id;
        self.handle.await.map_err(|e| {
            if e.is_panic() {
                tracing::error!("{} panicked", id);
            }
            SessionError::Aborted(id)
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("finished", &self.is_finished())
            .finish()
    }
}
