use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tubescope_core::extract_video_id;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRequest {
    pub video_id: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub success: bool,
    pub transcript: String,
    pub language: String,
}

pub async fn fetch_transcript(
    State(state): State<AppState>,
    payload: Result<Json<TranscriptRequest>, JsonRejection>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(ApiError::payload_too_large());
        }
        // An unreadable body is treated like an empty one
        Err(_) => TranscriptRequest::default(),
    };

    let raw_id = request
        .video_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(ApiError::missing_video_id)?;
    let video_id = extract_video_id(&raw_id).ok_or_else(ApiError::invalid_video_id)?;

    let language = request
        .language
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty())
        .unwrap_or_else(|| state.config.transcript.default_language.clone());

    let transcript = state
        .transcripts
        .fetch(&video_id, &language)
        .await
        .map_err(|err| ApiError::transcript_not_found(&err))?;

    Ok(Json(TranscriptResponse {
        success: true,
        transcript: transcript.text(),
        language: transcript.language_used,
    }))
}
