use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::ensure_active;
use crate::transport::Transport;
use crate::{CallbackError, FilesError, FilesResult, OperationStatus, TaskId};

/// Invoked with every fetched status, terminal or not
pub type StatusCallback = Box<dyn FnMut(&OperationStatus) -> Result<(), CallbackError> + Send>;

/// What to poll and for how long. Interval and timeout have no defaults here.
pub struct PollRequest {
    pub task_id: TaskId,
    pub file_task_id: Option<String>,
    pub interval: Duration,
    pub timeout: Duration,
    on_update: Option<StatusCallback>,
    cancel: Option<CancellationToken>,
}

impl std::fmt::Debug for PollRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollRequest")
            .field("task_id", &self.task_id)
            .field("file_task_id", &self.file_task_id)
            .field("interval", &self.interval)
            .field("timeout", &self.timeout)
            .field("on_update", &self.on_update.is_some())
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

impl PollRequest {
    pub fn new<T: Into<TaskId>>(task_id: T, interval: Duration, timeout: Duration) -> Self {
        Self {
            task_id: task_id.into(),
            file_task_id: None,
            interval,
            timeout,
            on_update: None,
            cancel: None,
        }
    }

    /// Narrow polling to a single file task of the operation
    pub fn with_file_task<S: Into<String>>(mut self, file_task_id: S) -> Self {
        self.file_task_id = Some(file_task_id.into());
        self
    }

    /// Register a status callback. Errors it returns stop polling.
    pub fn on_update<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&OperationStatus) -> Result<(), CallbackError> + Send + 'static,
    {
        self.on_update = Some(Box::new(callback));
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Polls an operation until it reaches `completed`/`failed` or the deadline passes
#[derive(Clone)]
pub struct StatusPoller {
    transport: Arc<dyn Transport>,
}

impl StatusPoller {
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self::with_shared(Arc::new(transport))
    }

    pub fn with_shared(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Fetch status every `interval` until a terminal status is seen.
    ///
    /// The deadline is checked before each fetch, so no request is made once
    /// it has passed. A timeout too large to represent as an instant means no
    /// deadline. A failed fetch ends polling with that error.
    #[instrument(skip(self, request), fields(task_id = %request.task_id))]
    pub async fn poll(&self, request: PollRequest) -> FilesResult<OperationStatus> {
        let PollRequest {
            task_id,
            file_task_id,
            interval,
            timeout,
            mut on_update,
            cancel,
        } = request;

        let deadline = Instant::now().checked_add(timeout);
        let mut fetches = 0u32;

        loop {
            if deadline.is_some_and(|d| Instant::now() > d) {
                warn!(fetches, timeout_ms = timeout.as_millis() as u64, "Status polling timed out");
                return Err(FilesError::timeout(task_id.as_str(), timeout));
            }

            ensure_active(&cancel)?;
            let status = self
                .transport
                .get_status(task_id.as_str(), file_task_id.as_deref())
                .await?;
            fetches += 1;
            debug!(fetches, status = %status.operation_status, "Fetched operation status");

            if let Some(callback) = on_update.as_mut() {
                (*callback)(&status).map_err(FilesError::callback)?;
            }

            if status.is_terminal() {
                info!(fetches, status = %status.operation_status, "Operation reached terminal status");
                return Ok(status);
            }

            match &cancel {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => {
                            warn!(fetches, "Status polling cancelled");
                            return Err(FilesError::Cancelled);
                        }
                        _ = tokio::time::sleep(interval) => {}
                    }
                }
                None => tokio::time::sleep(interval).await,
            }
        }
    }
}
