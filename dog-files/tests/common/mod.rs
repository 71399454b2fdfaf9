#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::Instant;

use dog_files::{
    CompleteUploadRequest, CompleteUploadResponse, FileKey, InitiateUploadRequest,
    InitiateUploadResponse, OperationReceipt, OperationRequest, OperationStatus,
    PartUploadResponse, TaskId, Transport, TransportError, TransportResult,
};

/// Every call the client made, in order
#[derive(Debug, Clone)]
pub enum Call {
    Initiate(InitiateUploadRequest),
    PutPart {
        target_uri: String,
        body: Vec<u8>,
        content_type: String,
    },
    Complete(CompleteUploadRequest),
    Status {
        task_id: String,
        file_task_id: Option<String>,
        at: Instant,
    },
    Create(OperationRequest),
}

/// In-memory transport with scripted responses.
///
/// Defaults: initiate hands out one presigned URL per requested part, every
/// part is accepted with ETag `"etag-part-N"`, and completion succeeds.
pub struct MockTransport {
    file_key: String,
    upload_id: Option<String>,
    url_count_override: Option<usize>,
    initiate_error: Option<TransportError>,
    part_overrides: HashMap<u32, TransportResult<PartUploadResponse>>,
    complete_error: Option<TransportError>,
    initiate_hook: Option<Box<dyn Fn() + Send + Sync>>,
    statuses: Mutex<VecDeque<TransportResult<OperationStatus>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            file_key: "fk-test".to_string(),
            upload_id: Some("upl-1".to_string()),
            url_count_override: None,
            initiate_error: None,
            part_overrides: HashMap::new(),
            complete_error: None,
            initiate_hook: None,
            statuses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_file_key(mut self, key: &str) -> Self {
        self.file_key = key.to_string();
        self
    }

    pub fn with_upload_id(mut self, upload_id: Option<&str>) -> Self {
        self.upload_id = upload_id.map(str::to_string);
        self
    }

    /// Return this many presigned URLs regardless of the requested part count
    pub fn with_presigned_url_count(mut self, count: usize) -> Self {
        self.url_count_override = Some(count);
        self
    }

    pub fn with_initiate_error(mut self, error: TransportError) -> Self {
        self.initiate_error = Some(error);
        self
    }

    pub fn with_part_response(mut self, part_number: u32, response: TransportResult<PartUploadResponse>) -> Self {
        self.part_overrides.insert(part_number, response);
        self
    }

    pub fn with_complete_error(mut self, error: TransportError) -> Self {
        self.complete_error = Some(error);
        self
    }

    /// Run `hook` while handling initiate, after the request is recorded
    pub fn with_initiate_hook<F: Fn() + Send + Sync + 'static>(mut self, hook: F) -> Self {
        self.initiate_hook = Some(Box::new(hook));
        self
    }

    /// Status responses served in order; the last one repeats forever
    pub fn with_statuses(self, statuses: Vec<TransportResult<OperationStatus>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn initiate_calls(&self) -> Vec<InitiateUploadRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Initiate(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    /// (target URI, body, content type) for each part PUT
    pub fn put_calls(&self) -> Vec<(String, Vec<u8>, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::PutPart {
                    target_uri,
                    body,
                    content_type,
                } => Some((target_uri, body, content_type)),
                _ => None,
            })
            .collect()
    }

    pub fn complete_calls(&self) -> Vec<CompleteUploadRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Complete(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    /// (task id, file task id, time of fetch)
    pub fn status_calls(&self) -> Vec<(String, Option<String>, Instant)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Status {
                    task_id,
                    file_task_id,
                    at,
                } => Some((task_id, file_task_id, at)),
                _ => None,
            })
            .collect()
    }

    pub fn create_calls(&self) -> Vec<OperationRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn presigned_url(part_number: u32) -> String {
    format!("https://storage.test/upl-1/part/{}", part_number)
}

fn part_number_from_url(uri: &str) -> u32 {
    uri.rsplit('/').next().and_then(|n| n.parse().ok()).unwrap_or(0)
}

#[async_trait]
impl Transport for MockTransport {
    async fn initiate_upload(
        &self,
        request: InitiateUploadRequest,
    ) -> TransportResult<InitiateUploadResponse> {
        let parts = request.parts;
        let file_name = request.file_name.clone();
        self.record(Call::Initiate(request));
        if let Some(hook) = &self.initiate_hook {
            hook();
        }

        if let Some(error) = &self.initiate_error {
            return Err(error.clone());
        }

        let count = self.url_count_override.unwrap_or(parts as usize);
        Ok(InitiateUploadResponse {
            file_key: FileKey::from(self.file_key.as_str()),
            upload_id: self.upload_id.clone(),
            presigned_urls: (1..=count as u32).map(presigned_url).collect(),
            object_name: Some(format!("objects/{}", file_name)),
        })
    }

    async fn put_part(
        &self,
        target_uri: &str,
        body: Bytes,
        content_type: &str,
    ) -> TransportResult<PartUploadResponse> {
        self.record(Call::PutPart {
            target_uri: target_uri.to_string(),
            body: body.to_vec(),
            content_type: content_type.to_string(),
        });

        let part_number = part_number_from_url(target_uri);
        match self.part_overrides.get(&part_number) {
            Some(response) => response.clone(),
            None => Ok(PartUploadResponse::accepted(format!("\"etag-part-{}\"", part_number))),
        }
    }

    async fn complete_upload(
        &self,
        request: CompleteUploadRequest,
    ) -> TransportResult<CompleteUploadResponse> {
        let file_key = request.file_key.clone();
        self.record(Call::Complete(request));

        match &self.complete_error {
            Some(error) => Err(error.clone()),
            None => Ok(CompleteUploadResponse {
                file_key: Some(file_key),
                location: None,
            }),
        }
    }

    async fn get_status(
        &self,
        task_id: &str,
        file_task_id: Option<&str>,
    ) -> TransportResult<OperationStatus> {
        self.record(Call::Status {
            task_id: task_id.to_string(),
            file_task_id: file_task_id.map(str::to_string),
            at: Instant::now(),
        });

        let mut statuses = self.statuses.lock().unwrap();
        let next = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        next.unwrap_or_else(|| Err(TransportError::new("no status scripted")))
    }

    async fn create_operation(
        &self,
        request: OperationRequest,
    ) -> TransportResult<OperationReceipt> {
        self.record(Call::Create(request));
        let count = self.create_calls().len();
        Ok(OperationReceipt {
            main_task_id: TaskId::from(format!("task-{}", count)),
        })
    }
}

/// Temp file of `len` bytes with a non-repeating-per-part byte pattern
pub fn temp_file_with_len(len: usize) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    file.write_all(&data).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

pub fn file_bytes(file: &tempfile::NamedTempFile) -> Vec<u8> {
    std::fs::read(file.path()).expect("read temp file")
}
