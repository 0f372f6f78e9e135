#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// Network-related errors
    #[error("Network error: {0}")]
    Connection(reqwest::Error),
    /// JSON parsing errors
    #[error("Failed to parse response: {0}")]
    Parse(reqwest::Error),
    /// Non-success HTTP status from the chat endpoints
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
    /// Authentication-specific errors
    #[error("Authentication error: {0}")]
    Authentication(String),
    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),
    /// Server error
    #[error("Server error: {0}")]
    Server(String),
    /// Mid-stream transport failure
    #[error("Stream error: {0}")]
    Stream(String),
    /// The stream closed before the completion sentinel arrived
    #[error("Stream ended before completion")]
    UnterminatedStream,
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        // If the error has a status code, map it to a more specific error
        if let Some(status) = err.status() {
            match status.as_u16() {
                401 | 403 => Self::Authentication(format!("Authentication failed: {err}")),
                404 => Self::NotFound(format!("Resource not found: {err}")),
                429 => Self::Api {
                    status: 429,
                    message: format!("Rate limit exceeded: {err}"),
                },
                500..=599 => Self::Server(format!("Server error: {err}")),
                _ => Self::Connection(err),
            }
        } else {
            // If no status code is available, default to a connection error
            Self::Connection(err)
        }
    }
}
