use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use panel_layout::LayoutError;
use roof_estimator::EstimateError;
use serde::Serialize;
use tracing::{error, warn};

/// Failure envelope: `{ "result": <message>, "error": <code> }`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub result: String,
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No file received")]
    MissingImage,

    #[error("Uploaded file is not a readable image: {0}")]
    UnreadableImage(String),

    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Uploaded image exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("Invalid {field}: {message}")]
    InvalidField { field: String, message: String },

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Estimate(#[from] EstimateError),
}

impl ApiError {
    /// Name the configured limit when the body was cut off by it.
    pub fn with_upload_limit(self, limit: usize) -> Self {
        match self {
            Self::Multipart(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                Self::TooLarge { limit }
            }
            other => other,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Multipart(e) => e.status(),
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MissingImage
            | Self::UnreadableImage(_)
            | Self::InvalidField { .. }
            | Self::Layout(_) => StatusCode::BAD_REQUEST,
            Self::Estimate(EstimateError::Transport(_) | EstimateError::Upstream { .. }) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Estimate(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::MissingImage => "MISSING_IMAGE",
            Self::UnreadableImage(_) => "INVALID_IMAGE",
            Self::Multipart(_) => "INVALID_MULTIPART",
            Self::TooLarge { .. } => "IMAGE_TOO_LARGE",
            Self::InvalidField { .. } => "INVALID_FIELD",
            Self::Layout(_) => "INVALID_DIMENSIONS",
            Self::Estimate(e) if e.is_malformed_reply() => "INVALID_ESTIMATION_RESPONSE",
            Self::Estimate(_) => "ESTIMATION_FAILED",
        }
    }

    /// Text shown to the user. Estimation failures stay generic; details go to the log.
    fn user_message(&self) -> String {
        match self {
            Self::Estimate(e) if e.is_malformed_reply() => {
                "Estimation response was not valid JSON".to_string()
            }
            Self::Estimate(_) => "Error processing request".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Analyze request failed: {}", self);
        } else {
            warn!("Analyze request rejected: {}", self);
        }

        let body = ErrorResponse {
            result: self.user_message(),
            error: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
