use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tubescope_core::{AnalysisError, ProviderError, TranscriptError};

/// JSON error envelope: `{ success: false, error, code, details? }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<Value>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn missing_video_id() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "MISSING_VIDEO_ID", "Video ID is required")
    }

    pub fn invalid_video_id() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_VIDEO_ID", "Invalid YouTube video ID")
    }

    pub fn missing_fields() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "MISSING_FIELDS",
            "Missing required fields: transcript and videoId are required",
        )
    }

    pub fn payload_too_large() -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "PAYLOAD_TOO_LARGE",
            "Request body is too large",
        )
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Not Found")
    }

    pub fn rate_limited() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            "Too many requests, please try again later",
        )
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error",
        )
    }

    /// The attempt summary is always returned so clients can tell why.
    pub fn transcript_not_found(err: &TranscriptError) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "TRANSCRIPT_NOT_FOUND",
            "Transcript not found",
        )
        .with_details(err.to_string())
    }

    /// Non-2xx and transport failures are `ANALYSIS_FAILED`. A reply that
    /// arrived but carries no usable analysis is `ANALYSIS_ERROR`. Details
    /// are hidden in production.
    pub fn analysis(err: &AnalysisError, expose_details: bool) -> Self {
        let code = match err {
            AnalysisError::Provider(ProviderError::EmptyResponse { .. })
            | AnalysisError::Decode(_) => "ANALYSIS_ERROR",
            AnalysisError::Provider(_) => "ANALYSIS_FAILED",
        };
        let error = Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            code,
            "Failed to analyze transcript",
        );
        if expose_details {
            error.with_details(err.to_string())
        } else {
            error
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "error": self.message,
            "code": self.code,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }

        (self.status, Json(body)).into_response()
    }
}
