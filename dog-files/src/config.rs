use std::time::Duration;

use crate::{FilesError, FilesResult};

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.dogfiles.dev/v1";

/// Environment variable holding the API key
pub const ENV_API_KEY: &str = "DOG_FILES_API_KEY";
/// Environment variable overriding the API endpoint
pub const ENV_BASE_URL: &str = "DOG_FILES_BASE_URL";
/// Environment variable overriding the per-request timeout (milliseconds)
pub const ENV_TIMEOUT_MS: &str = "DOG_FILES_TIMEOUT_MS";

/// Configuration for the file-processing client
#[derive(Clone)]
pub struct ClientConfig {
    /// Bearer credential attached to every API call
    pub api_key: String,

    /// Base URL of the API, without trailing slash
    pub base_url: String,

    /// Timeout for a single API round trip. Part uploads to presigned URLs
    /// are not bounded by it.
    pub request_timeout: Duration,

    /// Interval between status fetches for convenience waits
    pub poll_interval: Duration,

    /// Deadline for convenience waits
    pub poll_timeout: Duration,

    /// Rules for splitting uploads into parts
    pub upload_rules: UploadRules,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("poll_timeout", &self.poll_timeout)
            .field("upload_rules", &self.upload_rules)
            .finish()
    }
}

/// Rules for multipart uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadRules {
    /// Target part size used when the caller does not pick a part count
    pub chunk_size: u64,

    /// Upper bound on parts per upload, matching the remote API's limit
    pub max_parts: u32,
}

impl Default for UploadRules {
    fn default() -> Self {
        Self {
            chunk_size: 5 * 1024 * 1024, // 5MiB
            max_parts: 100,
        }
    }
}

impl UploadRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk_size(mut self, bytes: u64) -> Self {
        self.chunk_size = bytes;
        self
    }

    pub fn with_max_parts(mut self, max: u32) -> Self {
        self.max_parts = max;
        self
    }
}

impl ClientConfig {
    /// Create a config with the given API key and defaults for everything else
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(2_000),
            poll_timeout: Duration::from_millis(300_000),
            upload_rules: UploadRules::default(),
        }
    }

    /// Load config from `DOG_FILES_*` environment variables
    pub fn from_env() -> FilesResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load config through an arbitrary key lookup (environment, secrets store, tests)
    pub fn from_lookup<F>(lookup: F) -> FilesResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| FilesError::config(format!("{} is not set", ENV_API_KEY)))?;

        let mut config = Self::new(api_key);

        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.trim().is_empty()) {
            config = config.with_base_url(url);
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                FilesError::config(format!("{} must be an integer, got {:?}", ENV_TIMEOUT_MS, raw))
            })?;
            config = config.with_request_timeout(Duration::from_millis(millis));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_base_url<S: Into<String>>(mut self, url: S) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_upload_rules(mut self, rules: UploadRules) -> Self {
        self.upload_rules = rules;
        self
    }

    /// Reject configurations the client cannot operate with
    pub fn validate(&self) -> FilesResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(FilesError::config("API key must not be empty"));
        }
        if self.base_url.trim().is_empty() {
            return Err(FilesError::config("base URL must not be empty"));
        }
        if self.request_timeout.is_zero() {
            return Err(FilesError::config("request timeout must be greater than zero"));
        }
        if self.poll_interval.is_zero() || self.poll_timeout.is_zero() {
            return Err(FilesError::config("poll interval and timeout must be greater than zero"));
        }
        if self.upload_rules.chunk_size == 0 || self.upload_rules.max_parts == 0 {
            return Err(FilesError::config("chunk size and max parts must be greater than zero"));
        }
        Ok(())
    }
}
