use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tubescope_core::AppConfig;
use tubescope_server::{AppState, bind_with_fallback, router, shutdown_signal};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before any env::var calls)
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[tubescope-server] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let ports = config.server.ports();
    let host = config.server.host.clone();

    let state = AppState::from_config(config).context("failed to initialise services")?;
    if state.config.llm.api_key.is_none() {
        tracing::warn!(
            env_var = state.config.llm.provider.config().env_var,
            "LLM API key is not set, /api/analyze will fail"
        );
    }
    tracing::info!(
        environment = %state.config.environment,
        provider = state.config.llm.provider.id(),
        sources = ?state.transcripts.source_ids(),
        "services ready"
    );

    let listener = bind_with_fallback(&host, &ports)
        .await
        .with_context(|| format!("failed to bind {host} on any of {ports:?}"))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    let panic_signal = state.panic_signal.clone();
    let (reason_tx, reason_rx) = tokio::sync::oneshot::channel();
    let app = router(state);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let reason = shutdown_signal(panic_signal).await;
        let _ = reason_tx.send(reason);
    })
    .await
    .context("server error")?;

    let code = reason_rx.await.map(|reason| reason.exit_code()).unwrap_or(0);
    tracing::info!(code, "server stopped");
    std::process::exit(code);
}
