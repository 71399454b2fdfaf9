use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Result type for file-processing client operations
pub type FilesResult<T> = Result<T, FilesError>;

/// Result type returned by transport implementations
pub type TransportResult<T> = Result<T, TransportError>;

/// Error type that caller-supplied callbacks may return
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Protocol stage at which an upload failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Initiate,
    Read,
    Part,
    Complete,
}

impl std::fmt::Display for UploadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UploadStage::Initiate => "initiate",
            UploadStage::Read => "read",
            UploadStage::Part => "part",
            UploadStage::Complete => "complete",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while talking to the file-processing API
#[derive(Error, Debug)]
pub enum FilesError {
    #[error("Invalid request: {message}")]
    Validation { message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Upload failed at {stage}{}: {reason}", part_suffix(.part_number))]
    Upload {
        stage: UploadStage,
        part_number: Option<u32>,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Polling task {task_id} timed out after {}ms", .timeout.as_millis())]
    Timeout { task_id: String, timeout: Duration },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Callback failed: {source}")]
    Callback {
        #[source]
        source: CallbackError,
    },

    #[error("Operation cancelled")]
    Cancelled,
}

fn part_suffix(part_number: &Option<u32>) -> String {
    part_number
        .map(|n| format!(" (part {})", n))
        .unwrap_or_default()
}

impl FilesError {
    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an upload error for a stage that is not tied to a part
    pub fn upload_failed<S: Into<String>>(stage: UploadStage, reason: S) -> Self {
        Self::Upload {
            stage,
            part_number: None,
            reason: reason.into(),
            source: None,
        }
    }

    /// Create an upload error identifying the failing part
    pub fn part_failed<S: Into<String>>(stage: UploadStage, part_number: u32, reason: S) -> Self {
        Self::Upload {
            stage,
            part_number: Some(part_number),
            reason: reason.into(),
            source: None,
        }
    }

    /// Attach an underlying cause to an upload error. Other variants are returned unchanged.
    pub fn with_source<E>(self, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match self {
            Self::Upload {
                stage,
                part_number,
                reason,
                ..
            } => Self::Upload {
                stage,
                part_number,
                reason,
                source: Some(Box::new(error)),
            },
            other => other,
        }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(task_id: S, timeout: Duration) -> Self {
        Self::Timeout {
            task_id: task_id.into(),
            timeout,
        }
    }

    /// Wrap an error returned by a caller-supplied callback
    pub fn callback(source: CallbackError) -> Self {
        Self::Callback { source }
    }

    /// Part number carried by an upload error, if any
    pub fn part_number(&self) -> Option<u32> {
        match self {
            Self::Upload { part_number, .. } => *part_number,
            _ => None,
        }
    }

    /// Upload stage carried by an upload error, if any
    pub fn upload_stage(&self) -> Option<UploadStage> {
        match self {
            Self::Upload { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Failure reported by a [`Transport`](crate::Transport) implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Transport error{}: {message}", status_suffix(.status))]
pub struct TransportError {
    /// HTTP status code, when a response was received
    pub status: Option<u16>,
    /// Machine-readable error code from the API body
    pub code: Option<String>,
    pub message: String,
    /// Raw response body, kept for diagnostics
    pub raw_body: Option<String>,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default()
}

impl TransportError {
    /// Create a transport error without an HTTP response
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            status: None,
            code: None,
            message: message.into(),
            raw_body: None,
        }
    }

    /// Create a transport error for a non-success HTTP response
    pub fn http<S: Into<String>>(status: u16, message: S) -> Self {
        Self {
            status: Some(status),
            ..Self::new(message)
        }
    }

    pub fn with_code<S: Into<String>>(mut self, code: S) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_raw_body<S: Into<String>>(mut self, body: S) -> Self {
        self.raw_body = Some(body.into());
        self
    }
}

/// Fail with [`FilesError::Cancelled`] once the token has fired
pub(crate) fn ensure_active(cancel: &Option<CancellationToken>) -> FilesResult<()> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(FilesError::Cancelled),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_error_names_stage_and_part() {
        let err = FilesError::part_failed(UploadStage::Part, 3, "missing ETag");
        assert_eq!(err.to_string(), "Upload failed at part (part 3): missing ETag");
        assert_eq!(err.part_number(), Some(3));
        assert_eq!(err.upload_stage(), Some(UploadStage::Part));
    }

    #[test]
    fn with_source_keeps_context() {
        let cause = TransportError::http(500, "boom");
        let err = FilesError::upload_failed(UploadStage::Complete, "failed to complete upload: boom")
            .with_source(cause);

        let source = std::error::Error::source(&err).expect("source attached");
        assert_eq!(source.to_string(), "Transport error (HTTP 500): boom");
    }

    #[test]
    fn transport_errors_convert_transparently() {
        let err: FilesError = TransportError::new("connection reset").into();
        assert_eq!(err.to_string(), "Transport error: connection reset");
        assert!(err.part_number().is_none());
    }
}
