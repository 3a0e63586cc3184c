mod analyze;
mod health;
mod transcript;

use std::any::Any;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    http::{Request, Response},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

pub use analyze::{AnalyzeRequest, AnalyzeResponse};
pub use transcript::{TranscriptRequest, TranscriptResponse};

use crate::{error::ApiError, rate_limit::limit_by_ip, shutdown::PanicSignal, state::AppState};

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/transcript", post(transcript::fetch_transcript))
        .route("/api/analyze", post(analyze::analyze))
        .route_layer(middleware::from_fn_with_state(state.clone(), limit_by_ip));

    Router::new()
        .merge(api)
        .route("/health", get(health::health))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes))
        .layer(catch_panic_layer(state.panic_signal.clone()))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Answers a handler panic with `500 INTERNAL_ERROR` and raises the
/// panic signal so the process shuts down.
pub fn catch_panic_layer(
    signal: PanicSignal,
) -> CatchPanicLayer<impl Fn(Box<dyn Any + Send + 'static>) -> Response<Body> + Clone> {
    CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
        let message = panic
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| panic.downcast_ref::<&str>().copied())
            .unwrap_or("unknown panic");
        tracing::error!(panic = message, "handler panicked, shutting down");
        signal.trigger();
        ApiError::internal().into_response()
    })
}

async fn not_found() -> ApiError {
    ApiError::not_found()
}
