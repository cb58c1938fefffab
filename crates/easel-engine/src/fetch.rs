use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form as MultipartForm, Part as MultipartPart};
use reqwest::Client as HttpClient;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
}

impl FormField {
    pub fn text(name: &str, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.to_string(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Multipart(Vec<FormField>),
}

/// A POST the adapter can replay; only the bearer token changes per attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub bearer: Option<String>,
    pub body: RequestBody,
    pub timeout: Duration,
}

impl FetchRequest {
    pub fn with_bearer(&self, token: &str) -> Self {
        let mut request = self.clone();
        request.bearer = Some(token.to_string());
        request
    }
}

/// Any HTTP response, successful or not. Non-JSON bodies become strings.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: Value,
}

impl RemoteResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request was cancelled")]
    Cancelled,
    #[error("request timed out")]
    Timeout,
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        Self::Transport(error_chain_text(&err, 512))
    }
}

/// Transport for remote calls. Implementations never retry; a cancelled
/// token must abort the call promptly.
#[async_trait]
pub trait RemoteFetch: Send + Sync {
    async fn send(
        &self,
        request: &FetchRequest,
        cancel: CancellationToken,
    ) -> Result<RemoteResponse, FetchError>;

    async fn download(
        &self,
        url: &str,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<DownloadedImage, FetchError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpFetch {
    http: HttpClient,
}

impl HttpFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: HttpClient) -> Self {
        Self { http }
    }

    fn multipart_form(fields: &[FormField]) -> Result<MultipartForm, FetchError> {
        let mut form = MultipartForm::new();
        for field in fields {
            form = match field {
                FormField::Text { name, value } => form.text(name.clone(), value.clone()),
                FormField::File {
                    name,
                    file_name,
                    mime_type,
                    bytes,
                } => {
                    let part = MultipartPart::bytes(bytes.clone())
                        .file_name(file_name.clone())
                        .mime_str(mime_type)
                        .map_err(|err| {
                            FetchError::Transport(format!("invalid mime '{mime_type}': {err}"))
                        })?;
                    form.part(name.clone(), part)
                }
            };
        }
        Ok(form)
    }
}

#[async_trait]
impl RemoteFetch for HttpFetch {
    async fn send(
        &self,
        request: &FetchRequest,
        cancel: CancellationToken,
    ) -> Result<RemoteResponse, FetchError> {
        let mut builder = self.http.post(request.url.as_str()).timeout(request.timeout);
        if let Some(token) = request.bearer.as_deref() {
            builder = builder.bearer_auth(token);
        }
        builder = match &request.body {
            RequestBody::Json(payload) => builder.json(payload),
            RequestBody::Multipart(fields) => builder.multipart(Self::multipart_form(fields)?),
        };

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let text = response.text().await?;
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            Ok::<_, FetchError>(RemoteResponse { status, body })
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = exchange => result,
        }
    }

    async fn download(
        &self,
        url: &str,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<DownloadedImage, FetchError> {
        let exchange = async {
            let response = self.http.get(url).timeout(timeout).send().await?;
            if !response.status().is_success() {
                let code = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(FetchError::Transport(format!(
                    "image download failed ({code}): {}",
                    truncate_text(&body, 512)
                )));
            }
            let mime_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| "image/png".to_string());
            let bytes = response.bytes().await?.to_vec();
            Ok::<_, FetchError>(DownloadedImage { bytes, mime_type })
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = exchange => result,
        }
    }
}

fn error_chain_text(err: &reqwest::Error, max_chars: usize) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        let trimmed = text.trim();
        if !trimmed.is_empty() && parts.last().map(String::as_str) != Some(trimmed) {
            parts.push(trimmed.to_string());
        }
        source = cause.source();
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
