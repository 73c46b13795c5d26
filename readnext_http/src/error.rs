use thiserror::Error;

/// Failure classes derived from the status code carried by an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The exchange never completed: connectivity, timeout, decode failure.
    Transport,
    /// Unauthorized response that could not be cured by a token refresh.
    Auth,
    /// Caller-side problem (4xx other than 401).
    Client,
    /// Backend failure (5xx).
    Server,
}

/// The single failure shape surfaced to callers of this crate.
#[derive(Debug, Clone, Error)]
#[error("api error (status {status}): {message}")]
pub struct ApiError {
    pub message: String,
    /// HTTP status code, or 0 when no response was obtained at all.
    pub status: u16,
    /// Raw response body, when one was read before the call failed.
    pub body: Option<String>,
}

impl ApiError {
    /// Failure before any response was received (status 0).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: 0,
            body: None,
        }
    }

    /// Failure carrying a concrete HTTP status.
    pub fn http(status: u16, message: impl Into<String>, body: Option<String>) -> Self {
        Self {
            message: message.into(),
            status,
            body,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.status {
            0 => ErrorKind::Transport,
            401 => ErrorKind::Auth,
            400..=499 => ErrorKind::Client,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Transport,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(format!("network exchange failed: {err}"))
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        Self::transport(format!("url parse error: {err}"))
    }
}
