use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// One line of `events.jsonl`, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationEvent {
    ModelFallback {
        requested: Option<String>,
        model: String,
        reason: String,
    },
    AttemptStarted {
        attempt: usize,
        max_attempts: usize,
        credential: String,
    },
    AttemptFailed {
        attempt: usize,
        credential: String,
        kind: String,
        message: String,
    },
    GenerationSucceeded {
        attempt: usize,
        images: usize,
    },
    CredentialsExhausted {
        attempts: usize,
        message: String,
    },
}

impl GenerationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ModelFallback { .. } => "model_fallback",
            Self::AttemptStarted { .. } => "attempt_started",
            Self::AttemptFailed { .. } => "attempt_failed",
            Self::GenerationSucceeded { .. } => "generation_succeeded",
            Self::CredentialsExhausted { .. } => "credentials_exhausted",
        }
    }
}

/// Append-only writer for generation events.
///
/// Every line carries `type`, `request_id` and `ts`; the event's own fields
/// are merged after the defaults. Clones share the same file lock.
#[derive(Debug, Clone)]
pub struct EventWriter {
    inner: Arc<EventWriterInner>,
}

#[derive(Debug)]
struct EventWriterInner {
    path: PathBuf,
    lock: Mutex<()>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(EventWriterInner {
                path: path.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn emit(&self, request_id: &str, event: &GenerationEvent) -> anyhow::Result<Value> {
        let mut line = Map::new();
        line.insert(
            "request_id".to_string(),
            Value::String(request_id.to_string()),
        );
        line.insert("ts".to_string(), Value::String(now_utc_iso()));
        if let Value::Object(fields) = serde_json::to_value(event)? {
            for (key, value) in fields {
                line.insert(key, value);
            }
        }

        if let Some(parent) = self.inner.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let encoded = serde_json::to_string(&line)?;
        let _guard = self
            .inner
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("event writer lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)?;
        file.write_all(encoded.as_bytes())?;
        file.write_all(b"\n")?;

        Ok(Value::Object(line))
    }
}

pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Last four characters of a credential, enough to tell tokens apart in logs.
pub fn redact_credential(credential: &str) -> String {
    let count = credential.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = credential.chars().skip(count - 4).collect();
    format!("…{tail}")
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
