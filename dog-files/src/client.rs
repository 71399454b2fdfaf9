use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::transport::{OperationRequest, Transport};
use crate::{
    Action, ClientConfig, CompressionLevel, FileKey, FilesError, FilesResult, OperationReceipt,
    OperationStatus, PollRequest, StatusPoller, TaskId, UploadOrchestrator, UploadRequest,
    UploadResult,
};

/// High-level client: uploads, operation submission and waiting
#[derive(Clone)]
pub struct FilesClient {
    transport: Arc<dyn Transport>,
    uploads: UploadOrchestrator,
    poller: StatusPoller,
    config: ClientConfig,
}

impl FilesClient {
    /// Create a client talking HTTP to `config.base_url`
    #[cfg(feature = "http")]
    pub fn new(config: ClientConfig) -> FilesResult<Self> {
        let transport = crate::HttpTransport::new(&config)?;
        Self::with_transport(config, transport)
    }

    /// Create an HTTP client from `DOG_FILES_*` environment variables
    #[cfg(feature = "http")]
    pub fn from_env() -> FilesResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a client over any transport
    pub fn with_transport<T: Transport + 'static>(config: ClientConfig, transport: T) -> FilesResult<Self> {
        Self::with_shared_transport(config, Arc::new(transport))
    }

    pub fn with_shared_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> FilesResult<Self> {
        config.validate()?;
        Ok(Self {
            uploads: UploadOrchestrator::with_shared(transport.clone(), config.upload_rules),
            poller: StatusPoller::with_shared(transport.clone()),
            transport,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Multipart-upload a local file
    pub async fn upload(&self, request: UploadRequest) -> FilesResult<UploadResult> {
        self.uploads.upload(request).await
    }

    /// Submit an operation over previously uploaded files
    #[instrument(skip(self, request), fields(action = %request.action, files = request.file_keys.len()))]
    pub async fn create_operation(&self, request: OperationRequest) -> FilesResult<OperationReceipt> {
        if request.action.trim().is_empty() {
            return Err(FilesError::validation("action must not be empty"));
        }
        if request.file_keys.is_empty() {
            return Err(FilesError::validation("at least one file key is required"));
        }
        if request.file_keys.iter().any(|k| k.as_str().trim().is_empty()) {
            return Err(FilesError::validation("file keys must not be empty"));
        }

        let receipt = self.transport.create_operation(request).await?;
        info!(task_id = %receipt.main_task_id, "Operation submitted");
        Ok(receipt)
    }

    /// Submit `action` with optional parameters
    pub async fn run(
        &self,
        action: Action,
        file_keys: Vec<FileKey>,
        parameters: Option<Value>,
    ) -> FilesResult<OperationReceipt> {
        let mut request = OperationRequest::new(action.as_str(), file_keys);
        request.parameters = parameters;
        self.create_operation(request).await
    }

    /// Convert a file to another format (e.g. `"pdf"`, `"docx"`)
    pub async fn convert<K: Into<FileKey>>(&self, file_key: K, target_format: &str) -> FilesResult<OperationReceipt> {
        if target_format.trim().is_empty() {
            return Err(FilesError::validation("target format must not be empty"));
        }
        self.run(
            Action::Convert,
            vec![file_key.into()],
            Some(json!({ "targetFormat": target_format })),
        )
        .await
    }

    pub async fn compress<K: Into<FileKey>>(&self, file_key: K, level: CompressionLevel) -> FilesResult<OperationReceipt> {
        self.run(
            Action::Compress,
            vec![file_key.into()],
            Some(json!({ "compressionLevel": level.as_str() })),
        )
        .await
    }

    /// Merge files in the given order
    pub async fn merge(&self, file_keys: Vec<FileKey>) -> FilesResult<OperationReceipt> {
        if file_keys.len() < 2 {
            return Err(FilesError::validation("merge needs at least two files"));
        }
        self.run(Action::Merge, file_keys, None).await
    }

    /// Split a document by page ranges such as `"1-3,5"`
    pub async fn split<K: Into<FileKey>>(&self, file_key: K, page_ranges: &str) -> FilesResult<OperationReceipt> {
        if page_ranges.trim().is_empty() {
            return Err(FilesError::validation("page ranges must not be empty"));
        }
        self.run(
            Action::Split,
            vec![file_key.into()],
            Some(json!({ "pageRanges": page_ranges })),
        )
        .await
    }

    /// Single status fetch
    pub async fn status(&self, task_id: &TaskId, file_task_id: Option<&str>) -> FilesResult<OperationStatus> {
        Ok(self.transport.get_status(task_id.as_str(), file_task_id).await?)
    }

    /// Poll with the configured interval and timeout
    pub async fn wait_for(&self, task_id: &TaskId) -> FilesResult<OperationStatus> {
        let request = PollRequest::new(task_id.clone(), self.config.poll_interval, self.config.poll_timeout);
        self.poller.poll(request).await
    }

    /// Poll with explicit settings and callbacks
    pub async fn wait_for_with(&self, request: PollRequest) -> FilesResult<OperationStatus> {
        self.poller.poll(request).await
    }

    /// Upload, submit `action` on the new file, and wait for the terminal status
    #[instrument(skip_all, fields(action = %action))]
    pub async fn process(
        &self,
        upload: UploadRequest,
        action: Action,
        parameters: Option<Value>,
    ) -> FilesResult<OperationStatus> {
        let uploaded = self.upload(upload).await?;
        let receipt = self.run(action, vec![uploaded.file_key], parameters).await?;
        self.wait_for(&receipt.main_task_id).await
    }
}
