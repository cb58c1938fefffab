use std::sync::Arc;
use std::time::Duration;

use easel_contracts::events::{redact_credential, EventWriter, GenerationEvent};
use easel_contracts::generation::ImageReferences;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::credentials::CredentialPool;
use crate::error::{GenerateError, Result};
use crate::fetch::{truncate_text, FetchError, FetchRequest, RemoteFetch, RemoteResponse};

const ALL_TIMED_OUT: &str = "all credentials timed out";

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(ImageReferences),
    EarlyTimeout,
    RemoteError { status: u16, message: String },
    TransportError(String),
}

impl AttemptOutcome {
    pub fn from_fetch(result: std::result::Result<RemoteResponse, FetchError>) -> Self {
        match result {
            Ok(response) => classify_response(&response),
            Err(err) => Self::TransportError(err.to_string()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::EarlyTimeout => "early_timeout",
            Self::RemoteError { .. } => "remote_error",
            Self::TransportError(_) => "transport_error",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Success(references) => format!("{} image(s) returned", references.count()),
            Self::EarlyTimeout => GenerateError::EarlyTimeout.to_string(),
            Self::RemoteError { message, .. } | Self::TransportError(message) => message.clone(),
        }
    }

    pub fn into_result(self) -> Result<ImageReferences> {
        match self {
            Self::Success(references) => Ok(references),
            Self::EarlyTimeout => Err(GenerateError::EarlyTimeout),
            Self::RemoteError { status, message } => Err(GenerateError::Remote { status, message }),
            Self::TransportError(message) => Err(GenerateError::Transport(message)),
        }
    }
}

/// Maps an OpenAI-compatible image response onto an outcome.
///
/// Non-2xx statuses, a non-zero `code` field and an empty `data` list are
/// all remote errors.
pub fn classify_response(response: &RemoteResponse) -> AttemptOutcome {
    let status = response.status;
    if !response.is_success() {
        let message = remote_error_message(&response.body)
            .unwrap_or_else(|| format!("remote service returned status {status}"));
        return AttemptOutcome::RemoteError { status, message };
    }
    if let Some(code) = response.body.get("code").and_then(Value::as_i64) {
        if code != 0 {
            let message = remote_error_message(&response.body)
                .unwrap_or_else(|| format!("remote service returned error code {code}"));
            return AttemptOutcome::RemoteError { status, message };
        }
    }
    match ImageReferences::from_ordered(extract_image_references(&response.body)) {
        Some(references) => AttemptOutcome::Success(references),
        None => AttemptOutcome::RemoteError {
            status,
            message: "response contained no images".to_string(),
        },
    }
}

fn remote_error_message(body: &Value) -> Option<String> {
    let message = body
        .get("error")
        .and_then(|error| {
            error
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| error.as_str())
        })
        .or_else(|| body.get("message").and_then(Value::as_str))
        .or_else(|| body.get("msg").and_then(Value::as_str))
        .or_else(|| body.as_str())
        .map(str::trim)
        .filter(|value| !value.is_empty())?;
    Some(truncate_text(message, 512))
}

fn extract_image_references(body: &Value) -> Vec<String> {
    let rows = body
        .get("data")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let mut out = Vec::new();
    for row in rows {
        if let Some(url) = row
            .get("url")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            out.push(url.to_string());
            continue;
        }
        if let Some(b64) = row
            .get("b64_json")
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
        {
            out.push(format!("data:image/png;base64,{b64}"));
        }
    }
    out
}

/// Runs one logical request against a pool of shared credentials.
///
/// Attempts are sequential. Each is raced against `early_timeout`; whatever
/// goes wrong, the next credential is tried, up to twice the pool size.
pub struct FailoverController<F: RemoteFetch + ?Sized> {
    fetch: Arc<F>,
    early_timeout: Duration,
    events: Option<EventWriter>,
}

impl<F: RemoteFetch + ?Sized> FailoverController<F> {
    pub fn new(fetch: Arc<F>, early_timeout: Duration) -> Self {
        Self {
            fetch,
            early_timeout,
            events: None,
        }
    }

    pub fn with_events(mut self, events: Option<EventWriter>) -> Self {
        self.events = events;
        self
    }

    pub fn early_timeout(&self) -> Duration {
        self.early_timeout
    }

    pub fn max_attempts(pool: &CredentialPool) -> usize {
        2 * pool.len()
    }

    /// One attempt; the first of the call and the early timer to settle wins.
    pub async fn attempt(&self, request: &FetchRequest) -> AttemptOutcome {
        let cancel = CancellationToken::new();
        tokio::select! {
            biased;
            result = self.fetch.send(request, cancel.clone()) => AttemptOutcome::from_fetch(result),
            _ = tokio::time::sleep(self.early_timeout) => {
                cancel.cancel();
                AttemptOutcome::EarlyTimeout
            }
        }
    }

    pub async fn execute(
        &self,
        pool: &mut CredentialPool,
        request: &FetchRequest,
        request_id: &str,
    ) -> Result<ImageReferences> {
        let max_attempts = Self::max_attempts(pool);
        pool.random();
        let mut last_failure: Option<AttemptOutcome> = None;

        for attempt in 1..=max_attempts {
            let credential = pool.current().to_string();
            let redacted = redact_credential(&credential);
            self.record(
                request_id,
                GenerationEvent::AttemptStarted {
                    attempt,
                    max_attempts,
                    credential: redacted.clone(),
                },
            );
            tracing::debug!(
                request_id,
                attempt,
                max_attempts,
                credential = %redacted,
                "sending pooled request"
            );

            match self.attempt(&request.with_bearer(&credential)).await {
                AttemptOutcome::Success(references) => {
                    self.record(
                        request_id,
                        GenerationEvent::GenerationSucceeded {
                            attempt,
                            images: references.count(),
                        },
                    );
                    return Ok(references);
                }
                failure => {
                    tracing::warn!(
                        request_id,
                        attempt,
                        credential = %redacted,
                        kind = failure.kind(),
                        error = %failure.message(),
                        "attempt failed; rotating credential"
                    );
                    self.record(
                        request_id,
                        GenerationEvent::AttemptFailed {
                            attempt,
                            credential: redacted,
                            kind: failure.kind().to_string(),
                            message: failure.message(),
                        },
                    );
                    pool.next();
                    last_failure = Some(failure);
                }
            }
        }

        let message = match last_failure {
            Some(AttemptOutcome::EarlyTimeout) => ALL_TIMED_OUT.to_string(),
            Some(failure) => failure.message(),
            None => "no attempts were made".to_string(),
        };
        tracing::warn!(request_id, attempts = max_attempts, error = %message, "credential pool exhausted");
        self.record(
            request_id,
            GenerationEvent::CredentialsExhausted {
                attempts: max_attempts,
                message: message.clone(),
            },
        );
        Err(GenerateError::Exhausted {
            attempts: max_attempts,
            message,
        })
    }

    fn record(&self, request_id: &str, event: GenerationEvent) {
        let Some(events) = self.events.as_ref() else {
            return;
        };
        if let Err(err) = events.emit(request_id, &event) {
            tracing::warn!(event = event.name(), error = %err, "failed to record generation event");
        }
    }
}
