use thiserror::Error;

/// Failure surfaced by the remote access layer. Every request resolves to a
/// typed payload or one of these; nothing panics past the layer's boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication required. Please log in.")]
    Unauthorized,

    #[error("You don't have permission to perform this action.")]
    Forbidden,

    #[error("Too many requests. Please wait a moment and try again.")]
    RateLimited,

    #[error("{detail}")]
    Server { status: u16, detail: String },

    #[error("{0}")]
    Network(String),

    #[error("Invalid response from server: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status behind this error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Forbidden => Some(403),
            ApiError::RateLimited => Some(429),
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Network(_) | ApiError::Decode(_) => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited)
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}
