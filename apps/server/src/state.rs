use std::sync::Arc;

use tubescope_core::{AnalysisService, AppConfig, ConfigError, TranscriptService};

use crate::{rate_limit::RateLimiter, shutdown::PanicSignal};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub transcripts: Arc<TranscriptService>,
    pub analysis: Arc<AnalysisService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub panic_signal: PanicSignal,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        transcripts: TranscriptService,
        analysis: AnalysisService,
    ) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limit.window, config.rate_limit.max_requests)
            .with_trusted_proxy(config.rate_limit.trust_proxy);

        Self {
            config: Arc::new(config),
            transcripts: Arc::new(transcripts),
            analysis: Arc::new(analysis),
            rate_limiter: Arc::new(rate_limiter),
            panic_signal: PanicSignal::new(),
        }
    }

    pub fn from_config(config: AppConfig) -> Result<Self, ConfigError> {
        let transcripts = TranscriptService::from_config(&config)?;
        let analysis = AnalysisService::from_config(&config)?;
        Ok(Self::new(config, transcripts, analysis))
    }

    /// Error details are only returned outside production.
    pub fn expose_details(&self) -> bool {
        !self.config.is_production()
    }
}
