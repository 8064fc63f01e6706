use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No session token - log in first")]
    MissingToken,

    #[error("Login rejected ({status}): {body}")]
    LoginRejected {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for rejection bodies carried inside error values
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid dragging whole pages into logs
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..MAX_ERROR_BODY_LENGTH],
                body.len()
            )
        }
    }

    pub fn login_rejected(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::LoginRejected {
            status,
            body: Self::truncate_body(body),
        }
    }
}
