//! # dog-files: Typed client for remote file-processing APIs
//!
//! `dog-files` wraps a file-processing REST API (upload, convert, compress,
//! merge, split) behind an async, strongly typed surface. The two pieces with
//! real control flow live here:
//!
//! - **Multipart uploads**: files are planned into at most 100 parts, each part
//!   is pushed to its presigned URL in order, ETags are collected, and the
//!   upload is committed in one call
//! - **Status polling**: an operation is polled at a fixed interval until it
//!   reports `completed` or `failed`, or a deadline passes
//!
//! Nothing is retried. Every failure surfaces to the caller as a [`FilesError`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dog_files::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> FilesResult<()> {
//! let client = FilesClient::new(ClientConfig::new("sk_live_123"))?;
//!
//! let uploaded = client
//!     .upload(UploadRequest::from_path("report.docx").on_progress(|p| {
//!         println!("part {}/{} ({}%)", p.current_part, p.total_parts, p.percentage);
//!         Ok(())
//!     }))
//!     .await?;
//!
//! let receipt = client.convert(uploaded.file_key, "pdf").await?;
//! let status = client.wait_for(&receipt.main_task_id).await?;
//!
//! for link in status.download_links() {
//!     println!("{}", link);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │             FilesClient              │  ← convenience operations
//! ├───────────────────┬──────────────────┤
//! │ UploadOrchestrator│   StatusPoller   │  ← protocol + state machine
//! ├───────────────────┴──────────────────┤
//! │              Transport               │  ← HttpTransport or your own
//! └──────────────────────────────────────┘
//! ```
//!
//! The orchestrator and poller only see the [`Transport`] trait, so they can be
//! driven by an in-memory fake in tests or by a custom HTTP stack.

mod client;
mod config;
mod error;
#[cfg(feature = "http")]
mod http;
pub mod mime;
pub mod plan;
mod poller;
pub mod transport;
mod types;
mod upload;

pub use client::FilesClient;
pub use config::{ClientConfig, UploadRules, DEFAULT_BASE_URL, ENV_API_KEY, ENV_BASE_URL, ENV_TIMEOUT_MS};
pub use error::{CallbackError, FilesError, FilesResult, TransportError, TransportResult, UploadStage};
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use plan::{PartRange, UploadPlan};
pub use poller::{PollRequest, StatusCallback, StatusPoller};
pub use transport::{
    CompleteUploadRequest, CompleteUploadResponse, InitiateUploadRequest, InitiateUploadResponse,
    OperationRequest, PartUploadResponse, Transport,
};
pub use types::{
    Action, CompressionLevel, FileKey, FileStatus, OperationReceipt, OperationStatus, TaskId,
    UploadProgress, UploadResult, UploadTarget, UploadedPart, STATUS_COMPLETED, STATUS_FAILED,
};
pub use upload::{ProgressCallback, UploadOrchestrator, UploadRequest};

/// Re-exported so callers can build cancellation tokens without a direct dependency
pub use tokio_util::sync::CancellationToken;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Action, ClientConfig, CompressionLevel, FileKey, FilesClient, FilesError, FilesResult,
        OperationStatus, PollRequest, TaskId, UploadRequest, UploadResult,
    };
}
