use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// 401 from the server. The gateway has already cleared the credential.
    #[error("Unauthorized: {}", truncate_body(.detail))]
    Unauthorized { detail: String },

    /// Any other non-success status. `body` is the response text as
    /// received; `detail` is the server's message extracted from it.
    #[error("Request failed ({status}): {}", truncate_body(.detail))]
    Status {
        status: StatusCode,
        detail: String,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rejected locally before anything was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Shorten a response body for display and logging
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        body.to_string()
    } else {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }
}

/// FastAPI error envelope; `detail` is a string for HTTPException and a list
/// for request validation failures.
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl ApiError {
    /// Pull the human-readable message out of an error body
    fn extract_detail(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody {
                detail: serde_json::Value::String(s),
            }) => s,
            Ok(ErrorBody { detail }) => detail.to_string(),
            Err(_) => body.to_string(),
        }
    }

    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = Self::extract_detail(body);
        if status == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized { detail }
        } else {
            ApiError::Status {
                status,
                detail,
                body: body.to_string(),
            }
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Network(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Short message suitable for showing next to a form
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized { detail } if !detail.is_empty() => detail.clone(),
            ApiError::Unauthorized { .. } => "Session expired. Please log in again.".to_string(),
            ApiError::Status { status, .. } if status.is_server_error() => {
                "The server ran into a problem. Please try again later.".to_string()
            }
            ApiError::Status { detail, .. } => detail.clone(),
            ApiError::Network(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            ApiError::Network(_) => {
                "Unable to connect to server. Check your connection.".to_string()
            }
            ApiError::InvalidResponse(_) => "Unexpected response from server.".to_string(),
            ApiError::InvalidRequest(msg) => msg.clone(),
        }
    }
}
