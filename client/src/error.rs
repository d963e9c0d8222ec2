use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a usable HTTP response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was unreadable or carried GraphQL errors.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ClientError {
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Transport(format!("request timed out: {e}"))
        } else if e.is_connect() {
            ClientError::Transport(format!("connection failed: {e}"))
        } else if e.is_decode() {
            ClientError::Protocol(format!("failed to decode response body: {e}"))
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}
