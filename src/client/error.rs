use thiserror::Error;

/// Failures from the hosted assistant service. Propagated to callers as-is.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("File read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid file path: {path}")]
    InvalidPath { path: String },
    #[error("Assistant service returned {status}: {message}")]
    Api { status: u16, message: String },
}

impl RemoteError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Api { status, .. } => Some(*status),
            RemoteError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
