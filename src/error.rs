use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use crate::services::jobs::JobError;

/// Error returned by route handlers.
///
/// The body always carries `retryable` so a client can tell "fix your
/// request" apart from "try again later".
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Job(#[from] JobError),

    /// Upload could not be read. `status` is 400, or 413 past the body limit.
    #[error("malformed multipart request: {message}")]
    Multipart { status: StatusCode, message: String },

    #[error("job {0} does not exist")]
    UnknownJobId(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Job(JobError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Job(JobError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Job(JobError::Persistence(_))
            | ApiError::Job(JobError::Enqueue(_))
            | ApiError::Job(JobError::CorruptRecord { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Multipart { status, .. } => *status,
            ApiError::UnknownJobId(_) => StatusCode::NOT_FOUND,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            ApiError::Job(JobError::Validation(e)) => e.reason(),
            ApiError::Job(JobError::Persistence(_)) => "store_unavailable",
            ApiError::Job(JobError::Enqueue(_)) => "queue_unavailable",
            ApiError::Job(JobError::CorruptRecord { .. }) => "corrupt_record",
            ApiError::Job(JobError::NotFound(_)) | ApiError::UnknownJobId(_) => "not_found",
            ApiError::Multipart { status, .. } if *status == StatusCode::PAYLOAD_TOO_LARGE => {
                "payload_too_large"
            }
            ApiError::Multipart { .. } => "malformed_request",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            ApiError::Job(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::Multipart {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Multipart {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, reason = self.reason(), "Request failed");
        } else {
            warn!(error = %self, reason = self.reason(), "Request rejected");
        }

        let body = json!({
            "error": self.to_string(),
            "reason": self.reason(),
            "retryable": self.retryable(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::queue::QueueError;
    use crate::services::validation::ValidationError;

    #[test]
    fn test_validation_is_client_error() {
        let err = ApiError::from(JobError::from(ValidationError::InvalidImage));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.reason(), "invalid_image");
        assert!(!err.retryable());
    }

    #[test]
    fn test_queue_failure_is_retryable_server_error() {
        let err = ApiError::from(JobError::Enqueue(QueueError::Unavailable("down".into())));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.reason(), "queue_unavailable");
        assert!(err.retryable());
    }

    #[test]
    fn test_oversized_multipart_keeps_413() {
        let err = ApiError::Multipart {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "length limit exceeded".into(),
        };
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.reason(), "payload_too_large");
        assert!(!err.retryable());
    }

    #[test]
    fn test_unknown_job_is_not_found() {
        let err = ApiError::UnknownJobId("abc".into());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.reason(), "not_found");
    }
}
