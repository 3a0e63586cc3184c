use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    cache::TtlCache,
    config::AppConfig,
    decode::decode_analysis,
    error::{AnalysisError, ConfigError},
    key::{KeyBuilder, KeyEncoding},
    prompt::build_analysis_prompt,
    provider::{LlmClient, ProviderError, TextGenerator},
    retry::{RetryPolicy, with_retry_if},
    types::AnalysisResult,
};

#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    pub transcript: &'a str,
    pub video_id: &'a str,
    pub video_title: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub result: AnalysisResult,
    /// True when served from the cache without calling the provider.
    pub cached: bool,
}

#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub retry: RetryPolicy,
    pub key_encoding: KeyEncoding,
    pub prompt_char_limit: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            key_encoding: KeyEncoding::default(),
            prompt_char_limit: 8000,
        }
    }
}

type Gate = Arc<tokio::sync::Mutex<()>>;

/// Cached LLM analysis of transcripts.
///
/// Concurrent misses for the same key are coalesced: the first caller
/// computes while the rest wait on a per-key gate and then read the cache.
pub struct AnalysisService {
    generator: Arc<dyn TextGenerator>,
    cache: TtlCache<AnalysisResult>,
    in_flight: Mutex<HashMap<String, Gate>>,
    settings: AnalysisSettings,
}

impl AnalysisService {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        cache: TtlCache<AnalysisResult>,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            generator,
            cache,
            in_flight: Mutex::new(HashMap::new()),
            settings,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let client = LlmClient::from_settings(&config.llm, config.request_timeout).map_err(
            |err| match err {
                ProviderError::Http(err) => ConfigError::HttpClient(err),
                other => ConfigError::Invalid {
                    var: "LLM_PROVIDER",
                    value: other.to_string(),
                },
            },
        )?;
        let cache = TtlCache::new(config.cache.ttl).with_max_entries(config.cache.max_entries);
        let settings = AnalysisSettings {
            retry: config.retry.clone(),
            key_encoding: config.cache.key_encoding,
            prompt_char_limit: config.prompt_char_limit,
        };

        Ok(Self::new(Arc::new(client), cache, settings))
    }

    pub fn cache(&self) -> &TtlCache<AnalysisResult> {
        &self.cache
    }

    pub fn cache_key(&self, request: &AnalysisRequest<'_>) -> String {
        let mut key = KeyBuilder::new(self.settings.key_encoding)
            .field("transcript", request.transcript)
            .field("videoId", request.video_id);
        if let Some(title) = request.video_title {
            key = key.field("videoTitle", title);
        }
        key.finish("analysis:")
    }

    pub async fn analyze(&self, request: AnalysisRequest<'_>) -> Result<Analysis, AnalysisError> {
        let key = self.cache_key(&request);

        if let Some(result) = self.cache.get(&key) {
            tracing::debug!(video_id = request.video_id, "analysis cache hit");
            return Ok(Analysis {
                result,
                cached: true,
            });
        }

        let gate = self.gate(&key);
        let guard = gate.lock().await;

        // Another caller may have filled the cache while we waited.
        let outcome = match self.cache.get(&key) {
            Some(result) => Ok(Analysis {
                result,
                cached: true,
            }),
            None => self.compute(&key, &request).await.map(|result| Analysis {
                result,
                cached: false,
            }),
        };

        drop(guard);
        self.release(&key, &gate);
        outcome
    }

    async fn compute(
        &self,
        key: &str,
        request: &AnalysisRequest<'_>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let prompt = build_analysis_prompt(
            request.transcript,
            request.video_title,
            self.settings.prompt_char_limit,
        );

        tracing::info!(video_id = request.video_id, "requesting analysis");
        let text = with_retry_if(
            &self.settings.retry,
            || self.generator.generate(&prompt),
            ProviderError::is_transient,
        )
        .await?;

        let result = decode_analysis(&text).inspect_err(|err| {
            tracing::warn!(video_id = request.video_id, error = %err, "discarding invalid analysis");
        })?;

        self.cache.set(key, result.clone());
        Ok(result)
    }

    fn gate(&self, key: &str) -> Gate {
        let mut in_flight = self.in_flight.lock().expect("in-flight map poisoned");
        in_flight.entry(key.to_string()).or_default().clone()
    }

    fn release(&self, key: &str, gate: &Gate) {
        let mut in_flight = self.in_flight.lock().expect("in-flight map poisoned");
        // The map and this caller hold the only references once nobody waits.
        let idle = in_flight
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, gate) && Arc::strong_count(gate) <= 2);
        if idle {
            in_flight.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;

    use super::*;

    const VALID: &str = r#"```json
{"finalVerdict": {"clarityOfContent": 4}, "videoSummary": {"overview": "good"}}
```"#;

    struct StubGenerator {
        calls: AtomicUsize,
        response: Result<&'static str, u16>,
        delay: Duration,
    }

    impl StubGenerator {
        fn replying(response: &'static str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Ok(response),
                delay: Duration::ZERO,
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response: Err(status),
                delay: Duration::ZERO,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            match self.response {
                Ok(text) => Ok(text.to_string()),
                Err(status) => Err(ProviderError::Status {
                    provider: "stub",
                    status,
                    body: "stub failure".into(),
                }),
            }
        }
    }

    fn service(generator: Arc<StubGenerator>) -> AnalysisService {
        let settings = AnalysisSettings {
            retry: RetryPolicy::new(2).without_jitter(),
            ..Default::default()
        };
        AnalysisService::new(generator, TtlCache::from_secs(3600), settings)
    }

    fn request<'a>(transcript: &'a str) -> AnalysisRequest<'a> {
        AnalysisRequest {
            transcript,
            video_id: "dQw4w9WgXcQ",
            video_title: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn second_identical_request_is_served_from_cache() {
        let generator = Arc::new(StubGenerator::replying(VALID));
        let service = service(generator.clone());

        let first = service.analyze(request("hello world")).await.unwrap();
        let second = service.analyze(request("hello world")).await.unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.result, second.result);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn different_fields_miss_the_cache() {
        let generator = Arc::new(StubGenerator::replying(VALID));
        let service = service(generator.clone());

        service.analyze(request("hello world")).await.unwrap();
        service
            .analyze(AnalysisRequest {
                video_title: Some("Greetings"),
                ..request("hello world")
            })
            .await
            .unwrap();

        assert_eq!(generator.calls(), 2);
        assert_eq!(service.cache().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_shape_is_not_cached() {
        let generator = Arc::new(StubGenerator::replying(r#"{"finalVerdict": {}}"#));
        let service = service(generator.clone());

        let err = service.analyze(request("hello")).await.unwrap_err();

        assert!(matches!(err, AnalysisError::Decode(_)));
        assert!(service.cache().is_empty());
        // Decode failures are not retried
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_provider_errors_are_retried() {
        let generator = Arc::new(StubGenerator::failing(503));
        let service = service(generator.clone());

        let err = service.analyze(request("hello")).await.unwrap_err();

        assert!(matches!(err, AnalysisError::Provider(ProviderError::Status { status: 503, .. })));
        assert_eq!(generator.calls(), 3);
        assert!(service.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn client_errors_are_not_retried() {
        let generator = Arc::new(StubGenerator::failing(400));
        let service = service(generator.clone());

        service.analyze(request("hello")).await.unwrap_err();

        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_misses_share_one_provider_call() {
        let generator = Arc::new(StubGenerator {
            delay: Duration::from_millis(500),
            ..StubGenerator::replying(VALID)
        });
        let service = service(generator.clone());

        let (first, second) = tokio::join!(
            service.analyze(request("same transcript")),
            service.analyze(request("same transcript")),
        );

        assert_eq!(generator.calls(), 1);
        let cached = [first.unwrap().cached, second.unwrap().cached];
        assert_eq!(cached.iter().filter(|hit| **hit).count(), 1);
        assert!(service.in_flight.lock().unwrap().is_empty());
    }
}
