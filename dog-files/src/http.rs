use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, ETAG};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::transport::{
    CompleteUploadRequest, CompleteUploadResponse, InitiateUploadRequest, InitiateUploadResponse,
    OperationRequest, PartUploadResponse, Transport,
};
use crate::{
    ClientConfig, FilesError, FilesResult, OperationReceipt, OperationStatus, TransportError,
    TransportResult,
};

/// [`Transport`] over HTTPS with bearer-token authentication
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    request_timeout: Duration,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

/// Error body shape returned by the API
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> FilesResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| FilesError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config))
    }

    /// Reuse an existing `reqwest::Client` (connection pool, proxies, TLS setup).
    ///
    /// `config.request_timeout` bounds API calls only. Part uploads to
    /// presigned URLs run under whatever limits `client` itself carries.
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_timeout: config.request_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Authenticated JSON call against the API
    async fn call<B, R>(&self, method: Method, path: &str, body: Option<&B>) -> TransportResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(%method, %url, "Sending API request");

        let mut request = self
            .client
            .request(method, &url)
            .timeout(self.request_timeout)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(from_reqwest)?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let status = response.status().as_u16();
        let text = response.text().await.map_err(from_reqwest)?;
        let payload = if text.trim().is_empty() { "{}" } else { text.as_str() };

        serde_json::from_str(payload).map_err(|e| TransportError {
            status: Some(status),
            code: None,
            message: format!("invalid response body: {}", e),
            raw_body: Some(text.clone()),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn initiate_upload(
        &self,
        request: InitiateUploadRequest,
    ) -> TransportResult<InitiateUploadResponse> {
        self.call(Method::POST, "upload/initiate", Some(&request)).await
    }

    async fn put_part(
        &self,
        target_uri: &str,
        body: Bytes,
        content_type: &str,
    ) -> TransportResult<PartUploadResponse> {
        // Presigned URLs carry their own authorization.
        let response = self
            .client
            .put(target_uri)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(PartUploadResponse {
            success: status.is_success(),
            status: Some(status.as_u16()),
            etag,
        })
    }

    async fn complete_upload(
        &self,
        request: CompleteUploadRequest,
    ) -> TransportResult<CompleteUploadResponse> {
        self.call(Method::POST, "upload/complete", Some(&request)).await
    }

    async fn get_status(
        &self,
        task_id: &str,
        file_task_id: Option<&str>,
    ) -> TransportResult<OperationStatus> {
        let path = match file_task_id {
            Some(file_task_id) => format!("status/{}/{}", task_id, file_task_id),
            None => format!("status/{}", task_id),
        };
        self.call::<(), _>(Method::GET, &path, None).await
    }

    async fn create_operation(
        &self,
        request: OperationRequest,
    ) -> TransportResult<OperationReceipt> {
        self.call(Method::POST, "task", Some(&request)).await
    }
}

fn from_reqwest(error: reqwest::Error) -> TransportError {
    TransportError {
        status: error.status().map(|s| s.as_u16()),
        code: None,
        message: error.to_string(),
        raw_body: None,
    }
}

async fn error_from_response(response: Response) -> TransportError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let parsed = serde_json::from_str::<ApiErrorBody>(&body).ok();

    let message = parsed
        .as_ref()
        .and_then(|b| b.message.clone().or_else(|| b.error.clone()))
        .or_else(|| (!body.trim().is_empty()).then(|| body.clone()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    let mut error = TransportError::http(status.as_u16(), message);
    if let Some(code) = parsed.and_then(|b| b.code) {
        error = error.with_code(code);
    }
    if !body.is_empty() {
        error = error.with_raw_body(body);
    }
    error
}
