use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tubescope_core::{AnalysisRequest, AnalysisResult};

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub transcript: Option<String>,
    pub video_id: Option<String>,
    pub video_title: Option<String>,
}

/// The analysis fields sit at the top level next to `success`.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
}

/// Envelope keys a provider-supplied extra field must not shadow.
const RESERVED_KEYS: [&str; 2] = ["success", "cached"];

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(ApiError::payload_too_large());
        }
        Err(_) => AnalyzeRequest::default(),
    };

    let (Some(transcript), Some(video_id)) =
        (non_blank(request.transcript), non_blank(request.video_id))
    else {
        return Err(ApiError::missing_fields());
    };
    let video_title = non_blank(request.video_title);

    let analysis = state
        .analysis
        .analyze(AnalysisRequest {
            transcript: &transcript,
            video_id: &video_id,
            video_title: video_title.as_deref(),
        })
        .await
        .map_err(|err| {
            tracing::error!(video_id = %video_id, error = %err, "analysis failed");
            ApiError::analysis(&err, state.expose_details())
        })?;

    let mut result = analysis.result;
    for key in RESERVED_KEYS {
        result.extra.remove(key);
    }

    Ok(Json(AnalyzeResponse {
        success: true,
        analysis: result,
        cached: analysis.cached,
    }))
}
