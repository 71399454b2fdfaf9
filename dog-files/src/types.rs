use serde::{Deserialize, Serialize};

/// Status value after which an operation will not change again
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_FAILED: &str = "failed";

/// Durable handle for an uploaded file, used by all later operations
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileKey(pub String);

impl FileKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FileKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for FileKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl std::fmt::Display for FileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a submitted operation (the main task)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Presigned destination for one part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTarget {
    pub part_number: u32,
    pub destination_uri: String,
}

/// A part accepted by storage, with its ETag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedPart {
    pub part_number: u32,
    #[serde(rename = "eTag")]
    pub etag: String,
}

/// Outcome of a finished multipart upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub file_key: FileKey,
    pub upload_id: String,
    pub presigned_targets: Vec<UploadTarget>,
    pub object_name: Option<String>,
}

/// Progress reported after each part is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UploadProgress {
    pub current_part: u32,
    pub total_parts: u32,
    pub bytes_uploaded: u64,
    pub total_bytes: u64,
    pub percentage: u8,
}

impl UploadProgress {
    pub fn new(current_part: u32, total_parts: u32, bytes_uploaded: u64, total_bytes: u64) -> Self {
        let percentage = if total_bytes == 0 {
            100
        } else {
            ((bytes_uploaded as f64 / total_bytes as f64) * 100.0).round() as u8
        };
        Self {
            current_part,
            total_parts,
            bytes_uploaded,
            total_bytes,
            percentage,
        }
    }
}

/// Snapshot of a remote operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStatus {
    /// Open-ended status string (`queued`, `running`, `completed`, `failed`, ...)
    pub operation_status: String,
    #[serde(default)]
    pub files_data: Vec<FileStatus>,
}

impl OperationStatus {
    pub fn new<S: Into<String>>(operation_status: S) -> Self {
        Self {
            operation_status: operation_status.into(),
            files_data: Vec::new(),
        }
    }

    pub fn with_file(mut self, file: FileStatus) -> Self {
        self.files_data.push(file);
        self
    }

    /// True for exactly `completed` and `failed`
    pub fn is_terminal(&self) -> bool {
        self.operation_status == STATUS_COMPLETED || self.operation_status == STATUS_FAILED
    }

    pub fn is_completed(&self) -> bool {
        self.operation_status == STATUS_COMPLETED
    }

    pub fn is_failed(&self) -> bool {
        self.operation_status == STATUS_FAILED
    }

    /// Download links of every file that has one, in response order
    pub fn download_links(&self) -> Vec<&str> {
        self.files_data
            .iter()
            .filter_map(|f| f.download_link.as_deref())
            .collect()
    }
}

/// Per-file status inside an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatus {
    pub file_key: FileKey,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl FileStatus {
    pub fn new<K: Into<FileKey>, S: Into<String>>(file_key: K, status: S) -> Self {
        Self {
            file_key: file_key.into(),
            status: status.into(),
            download_link: None,
            error_code: None,
            error_message: None,
        }
    }

    pub fn with_download_link<S: Into<String>>(mut self, link: S) -> Self {
        self.download_link = Some(link.into());
        self
    }

    pub fn with_error<C: Into<String>, M: Into<String>>(mut self, code: C, message: M) -> Self {
        self.error_code = Some(code.into());
        self.error_message = Some(message.into());
        self
    }
}

/// Handle returned when an operation is submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationReceipt {
    pub main_task_id: TaskId,
}

/// Processing action understood by the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Convert,
    Compress,
    Merge,
    Split,
    /// Any action name not modelled above
    Custom(String),
}

impl Action {
    pub fn as_str(&self) -> &str {
        match self {
            Action::Convert => "convert",
            Action::Compress => "compress",
            Action::Merge => "merge",
            Action::Split => "split",
            Action::Custom(name) => name,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compression strength for the `compress` action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl CompressionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionLevel::Low => "low",
            CompressionLevel::Medium => "medium",
            CompressionLevel::High => "high",
        }
    }
}
