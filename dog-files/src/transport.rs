use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{FileKey, OperationReceipt, OperationStatus, TransportResult, UploadedPart};

/// Remote calls the client needs. Implemented over HTTP by
/// [`HttpTransport`](crate::HttpTransport); tests plug in in-memory fakes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start a multipart upload and receive one presigned URL per part
    async fn initiate_upload(
        &self,
        request: InitiateUploadRequest,
    ) -> TransportResult<InitiateUploadResponse>;

    /// Push one part's bytes to its presigned destination
    async fn put_part(
        &self,
        target_uri: &str,
        body: Bytes,
        content_type: &str,
    ) -> TransportResult<PartUploadResponse>;

    /// Commit all uploaded parts
    async fn complete_upload(
        &self,
        request: CompleteUploadRequest,
    ) -> TransportResult<CompleteUploadResponse>;

    /// Fetch the current status of an operation, optionally narrowed to one file task
    async fn get_status(
        &self,
        task_id: &str,
        file_task_id: Option<&str>,
    ) -> TransportResult<OperationStatus>;

    /// Submit a processing operation
    async fn create_operation(
        &self,
        request: OperationRequest,
    ) -> TransportResult<OperationReceipt>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateUploadRequest {
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub parts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateUploadResponse {
    pub file_key: FileKey,
    #[serde(default)]
    pub upload_id: Option<String>,
    #[serde(default)]
    pub presigned_urls: Vec<String>,
    #[serde(default)]
    pub object_name: Option<String>,
}

/// What storage said about one part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartUploadResponse {
    pub success: bool,
    pub status: Option<u16>,
    /// Raw ETag header value, quotes included
    pub etag: Option<String>,
}

impl PartUploadResponse {
    pub fn accepted<S: Into<String>>(etag: S) -> Self {
        Self {
            success: true,
            status: Some(200),
            etag: Some(etag.into()),
        }
    }

    pub fn rejected(status: u16) -> Self {
        Self {
            success: false,
            status: Some(status),
            etag: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadRequest {
    pub file_key: FileKey,
    pub upload_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,
    pub parts: Vec<UploadedPart>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadResponse {
    #[serde(default)]
    pub file_key: Option<FileKey>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Request to run an action over uploaded files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    pub action: String,
    pub file_keys: Vec<FileKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl OperationRequest {
    pub fn new<S: Into<String>>(action: S, file_keys: Vec<FileKey>) -> Self {
        Self {
            action: action.into(),
            file_keys,
            parameters: None,
            notes: None,
        }
    }

    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Strip the surrounding quotes storage puts around ETags
pub fn normalize_etag(raw: &str) -> &str {
    raw.trim().trim_matches('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etag_quotes_are_stripped() {
        assert_eq!(normalize_etag("\"etag-part-1\""), "etag-part-1");
        assert_eq!(normalize_etag("etag-part-2"), "etag-part-2");
        assert_eq!(normalize_etag("\"\""), "");
    }

    #[test]
    fn initiate_response_tolerates_missing_fields() {
        let body = r#"{"fileKey":"fk-1","presignedUrls":["https://s3/1"]}"#;
        let response: InitiateUploadResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.file_key.as_str(), "fk-1");
        assert!(response.upload_id.is_none());
        assert_eq!(response.presigned_urls.len(), 1);
    }

    #[test]
    fn operation_request_omits_empty_optionals() {
        let request = OperationRequest::new("compress", vec![FileKey::from("fk-1")]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({"action": "compress", "fileKeys": ["fk-1"]}));
    }
}
