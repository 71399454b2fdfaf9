use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::error::ensure_active;
use crate::mime::detect_mime_type;
use crate::plan::UploadPlan;
use crate::transport::{normalize_etag, CompleteUploadRequest, InitiateUploadRequest, Transport};
use crate::{
    CallbackError, FilesError, FilesResult, UploadProgress, UploadResult, UploadRules, UploadStage,
    UploadTarget, UploadedPart,
};

/// Invoked after each part is accepted. Returning an error aborts the upload.
pub type ProgressCallback = Box<dyn FnMut(&UploadProgress) -> Result<(), CallbackError> + Send>;

/// Request to upload one local file
pub struct UploadRequest {
    pub file_path: PathBuf,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub part_count: Option<u32>,
    on_progress: Option<ProgressCallback>,
    cancel: Option<CancellationToken>,
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("file_path", &self.file_path)
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("part_count", &self.part_count)
            .field("on_progress", &self.on_progress.is_some())
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

impl UploadRequest {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(file_path: P, file_name: S) -> Self {
        Self {
            file_path: file_path.into(),
            file_name: file_name.into(),
            mime_type: None,
            part_count: None,
            on_progress: None,
            cancel: None,
        }
    }

    /// Upload a path under its own file name
    pub fn from_path<P: Into<PathBuf>>(file_path: P) -> Self {
        let file_path = file_path.into();
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(file_path, file_name)
    }

    pub fn with_mime_type<S: Into<String>>(mut self, mime_type: S) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_part_count(mut self, parts: u32) -> Self {
        self.part_count = Some(parts);
        self
    }

    /// Register a progress callback.
    ///
    /// The callback runs synchronously between parts. Errors it returns are
    /// not swallowed: they abort the remaining parts and surface as
    /// [`FilesError::Callback`].
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&UploadProgress) -> Result<(), CallbackError> + Send + 'static,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Drives the initiate → parts → complete protocol for one file at a time.
///
/// Holds no per-upload state, so one orchestrator can serve concurrent uploads.
#[derive(Clone)]
pub struct UploadOrchestrator {
    transport: Arc<dyn Transport>,
    rules: UploadRules,
}

impl UploadOrchestrator {
    pub fn new<T: Transport + 'static>(transport: T, rules: UploadRules) -> Self {
        Self::with_shared(Arc::new(transport), rules)
    }

    pub fn with_shared(transport: Arc<dyn Transport>, rules: UploadRules) -> Self {
        Self { transport, rules }
    }

    pub fn rules(&self) -> &UploadRules {
        &self.rules
    }

    /// Upload a file in parts and commit it.
    ///
    /// Nothing is retried: any failure after initiate leaves uncommitted parts
    /// on the remote side and the caller must restart the upload.
    #[instrument(skip(self, request), fields(file_name = %request.file_name))]
    pub async fn upload(&self, request: UploadRequest) -> FilesResult<UploadResult> {
        let UploadRequest {
            file_path,
            file_name,
            mime_type,
            part_count,
            mut on_progress,
            cancel,
        } = request;

        let size = validate_source(&file_path, &file_name).await?;
        let mime_type = mime_type
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| detect_mime_type(&file_name));
        let plan = UploadPlan::new(file_path, file_name, mime_type, size, part_count, &self.rules);

        debug!(
            size = plan.total_size_bytes,
            parts = plan.part_count,
            mime_type = %plan.mime_type,
            "Planned upload"
        );

        ensure_active(&cancel)?;
        let initiated = self
            .transport
            .initiate_upload(InitiateUploadRequest {
                file_name: plan.file_name.clone(),
                file_size: plan.total_size_bytes,
                mime_type: plan.mime_type.clone(),
                parts: plan.part_count,
            })
            .await?;

        let upload_id = initiated
            .upload_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                FilesError::upload_failed(UploadStage::Initiate, "initiate response carried no upload id")
            })?;

        if initiated.presigned_urls.len() != plan.part_count as usize {
            return Err(FilesError::upload_failed(
                UploadStage::Initiate,
                format!(
                    "expected {} presigned URLs, received {}",
                    plan.part_count,
                    initiated.presigned_urls.len()
                ),
            ));
        }

        let targets: Vec<UploadTarget> = initiated
            .presigned_urls
            .into_iter()
            .zip(1..)
            .map(|(destination_uri, part_number)| UploadTarget {
                part_number,
                destination_uri,
            })
            .collect();

        let parts = self
            .transfer_parts(&plan, &targets, &mut on_progress, &cancel)
            .await?;

        ensure_active(&cancel)?;
        self.transport
            .complete_upload(CompleteUploadRequest {
                file_key: initiated.file_key.clone(),
                upload_id: upload_id.clone(),
                object_name: initiated.object_name.clone(),
                parts,
            })
            .await
            .map_err(|e| {
                FilesError::upload_failed(
                    UploadStage::Complete,
                    format!("failed to complete upload: {}", e.message),
                )
                .with_source(e)
            })?;

        info!(file_key = %initiated.file_key, parts = plan.part_count, "Upload completed");

        Ok(UploadResult {
            file_key: initiated.file_key,
            upload_id,
            presigned_targets: targets,
            object_name: initiated.object_name,
        })
    }

    /// Send every part in ascending order, stopping at the first failure
    async fn transfer_parts(
        &self,
        plan: &UploadPlan,
        targets: &[UploadTarget],
        on_progress: &mut Option<ProgressCallback>,
        cancel: &Option<CancellationToken>,
    ) -> FilesResult<Vec<UploadedPart>> {
        let mut file = File::open(&plan.file_path).await.map_err(|e| {
            FilesError::upload_failed(
                UploadStage::Read,
                format!("failed to open {}: {}", plan.file_path.display(), e),
            )
            .with_source(e)
        })?;

        let mut parts = Vec::with_capacity(targets.len());
        let mut bytes_uploaded = 0u64;

        for (range, target) in plan.part_ranges().into_iter().zip(targets) {
            let part_number = range.part_number;

            let mut buffer = vec![0u8; range.length as usize];
            file.seek(SeekFrom::Start(range.offset)).await.map_err(|e| {
                FilesError::part_failed(UploadStage::Read, part_number, format!("seek failed: {}", e))
                    .with_source(e)
            })?;
            file.read_exact(&mut buffer).await.map_err(|e| {
                FilesError::part_failed(
                    UploadStage::Read,
                    part_number,
                    format!("failed to read {} bytes at offset {}: {}", range.length, range.offset, e),
                )
                .with_source(e)
            })?;

            ensure_active(cancel)?;
            let response = self
                .transport
                .put_part(&target.destination_uri, Bytes::from(buffer), &plan.mime_type)
                .await
                .map_err(|e| {
                    FilesError::part_failed(
                        UploadStage::Part,
                        part_number,
                        format!("failed to upload part {}: {}", part_number, e.message),
                    )
                    .with_source(e)
                })?;

            if !response.success {
                return Err(FilesError::part_failed(
                    UploadStage::Part,
                    part_number,
                    format!(
                        "storage rejected part {} (status {})",
                        part_number,
                        response.status.map(|s| s.to_string()).unwrap_or_else(|| "unknown".into())
                    ),
                ));
            }

            let etag = response
                .etag
                .as_deref()
                .map(normalize_etag)
                .filter(|tag| !tag.is_empty())
                .ok_or_else(|| {
                    FilesError::part_failed(
                        UploadStage::Part,
                        part_number,
                        format!("storage returned no ETag for part {}", part_number),
                    )
                })?
                .to_string();

            bytes_uploaded += range.length;
            debug!(part_number, bytes = range.length, etag = %etag, "Part uploaded");
            parts.push(UploadedPart { part_number, etag });

            if let Some(callback) = on_progress.as_mut() {
                let progress = UploadProgress::new(
                    part_number,
                    plan.part_count,
                    bytes_uploaded,
                    plan.total_size_bytes,
                );
                (*callback)(&progress).map_err(FilesError::callback)?;
            }
        }

        Ok(parts)
    }
}

/// Check the upload source before anything touches the network
async fn validate_source(file_path: &Path, file_name: &str) -> FilesResult<u64> {
    if file_name.trim().is_empty() {
        return Err(FilesError::validation("file name must not be empty"));
    }

    let metadata = tokio::fs::metadata(file_path).await.map_err(|e| {
        FilesError::validation(format!("file {} is not accessible: {}", file_path.display(), e))
    })?;

    if !metadata.is_file() {
        return Err(FilesError::validation(format!(
            "{} is not a regular file",
            file_path.display()
        )));
    }

    Ok(metadata.len())
}
