use thiserror::Error;

/// Typed failure surfaced by [`crate::event_client::EventClient`]'s
/// synchronous operations. [`crate::async_logger::AsyncLogger::log`] never
/// returns this — it never throws, falling back to spillover instead.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status_code}: {message}")]
    Server {
        status_code: u16,
        error_code: Option<String>,
        message: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClientError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Server { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            ClientError::Server { error_code, .. } => error_code.as_deref(),
            _ => None,
        }
    }
}
