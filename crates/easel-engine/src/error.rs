use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenerateError>;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{0}")]
    Validation(String),
    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request exceeded the early timeout")]
    EarlyTimeout,
    #[error("remote service error ({status}): {message}")]
    Remote { status: u16, message: String },
    #[error("{message}")]
    Exhausted { attempts: usize, message: String },
    #[error("configuration error: {0}")]
    Config(String),
}

impl GenerateError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the pooled backend rotates credentials on this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::EarlyTimeout | Self::Remote { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_remote_side_failures_are_retryable() {
        assert!(GenerateError::EarlyTimeout.is_retryable());
        assert!(GenerateError::Transport("reset".to_string()).is_retryable());
        assert!(GenerateError::Remote {
            status: 401,
            message: "unauthorized".to_string()
        }
        .is_retryable());
        assert!(!GenerateError::validation("no image file").is_retryable());
        assert!(!GenerateError::Exhausted {
            attempts: 6,
            message: "x".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn exhausted_displays_bare_message() {
        let err = GenerateError::Exhausted {
            attempts: 4,
            message: "all credentials timed out".to_string(),
        };
        assert_eq!(err.to_string(), "all credentials timed out");
    }
}
