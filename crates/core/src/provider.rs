use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::config::LlmSettings;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Missing API key: {env_var} environment variable is not set")]
    MissingApiKey { env_var: &'static str },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} response contained no text: {body}")]
    EmptyResponse { provider: &'static str, body: String },
}

impl ProviderError {
    /// Transport failures, rate limiting and server errors are worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Http(_) => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            ProviderError::MissingApiKey { .. } | ProviderError::EmptyResponse { .. } => false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    Gemini,
    Openai,
    Grok,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta",
                model: "gemini-1.5-pro",
                env_var: "GEMINI_API_KEY",
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1",
                model: "gpt-4o-mini",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Openai => "OpenAI",
            Provider::Grok => "Grok",
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
            Provider::Openai => "openai",
            Provider::Grok => "grok",
        }
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String, ProviderError> {
        let config = self.config();
        std::env::var(config.env_var)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ProviderError::MissingApiKey {
                env_var: config.env_var,
            })
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::Openai),
            "grok" | "xai" => Ok(Provider::Grok),
            other => Err(format!("unknown provider {other:?}")),
        }
    }
}

/// Prompt in, free text out. The analysis service only depends on this.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

static SYSTEM_PROMPT: &str =
    "You are an expert educational video analyst. You answer with strict JSON only.";

/// HTTP client for the supported LLM APIs: Gemini's native
/// `generateContent`, and the chat-completions shape for OpenAI and Grok.
pub struct LlmClient {
    http: reqwest::Client,
    provider: Provider,
    api_url: String,
    model: String,
    api_key: Option<String>,
}

impl LlmClient {
    pub fn new(
        provider: Provider,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let config = provider.config();
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            provider,
            api_url: config.api_url.to_string(),
            model: config.model.to_string(),
            api_key,
        })
    }

    pub fn from_settings(settings: &LlmSettings, timeout: Duration) -> Result<Self, ProviderError> {
        let mut client = Self::new(settings.provider, settings.api_key.clone(), timeout)?;
        if let Some(api_url) = &settings.api_url {
            client = client.with_api_url(api_url);
        }
        if let Some(model) = &settings.model {
            client = client.with_model(model);
        }
        Ok(client)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_key(&self) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ProviderError::MissingApiKey {
                env_var: self.provider.config().env_var,
            })
    }

    async fn generate_gemini(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key()?;
        let url = format!("{}/models/{}:generateContent", self.api_url, self.model);

        let response = self
            .http
            .post(url)
            .query(&[("key", api_key)])
            .json(&json!({
                "contents": [{
                    "parts": [{ "text": prompt }]
                }],
                "generationConfig": { "temperature": 0.3 },
            }))
            .send()
            .await?;

        let body = self.read_body(response).await?;
        body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| self.empty_response(&body))
    }

    async fn generate_chat(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.api_url);

        let response = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "system",
                        "content": SYSTEM_PROMPT,
                    },
                    {
                        "role": "user",
                        "content": prompt,
                    },
                ],
                "temperature": 0.3,
            }))
            .send()
            .await?;

        let body = self.read_body(response).await?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| self.empty_response(&body))
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Value, ProviderError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: self.provider.name(),
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|_| ProviderError::EmptyResponse {
            provider: self.provider.name(),
            body: text,
        })
    }

    fn empty_response(&self, body: &Value) -> ProviderError {
        ProviderError::EmptyResponse {
            provider: self.provider.name(),
            body: body.to_string(),
        }
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        tracing::debug!(provider = self.provider.id(), model = %self.model, "calling LLM");
        match self.provider {
            Provider::Gemini => self.generate_gemini(prompt).await,
            Provider::Openai | Provider::Grok => self.generate_chat(prompt).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(provider: Provider, server: &MockServer) -> LlmClient {
        LlmClient::new(provider, Some("test-key".into()), Duration::from_secs(5))
            .unwrap()
            .with_api_url(server.uri())
    }

    #[tokio::test]
    async fn gemini_returns_candidate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-pro:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "{\"ok\":true}" }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(Provider::Gemini, &server)
            .generate("analyze this")
            .await
            .unwrap();

        assert_eq!(text, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn chat_completions_use_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "hello" } }]
            })))
            .mount(&server)
            .await;

        let text = client(Provider::Grok, &server)
            .with_model("grok-test")
            .generate("hi")
            .await
            .unwrap();

        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let err = client(Provider::Gemini, &server)
            .generate("hi")
            .await
            .unwrap_err();

        match &err {
            ProviderError::Status { status, body, .. } => {
                assert_eq!(*status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn missing_text_is_an_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
            .mount(&server)
            .await;

        let err = client(Provider::Gemini, &server)
            .generate("hi")
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::EmptyResponse { .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn slow_provider_times_out_as_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(json!({ "choices": [{ "message": { "content": "late" } }] })),
            )
            .mount(&server)
            .await;
        let client = LlmClient::new(Provider::Openai, Some("test-key".into()), Duration::from_millis(100))
            .unwrap()
            .with_api_url(server.uri());

        let err = client.generate("hi").await.unwrap_err();

        match &err {
            ProviderError::Http(inner) => assert!(inner.is_timeout(), "{inner}"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = LlmClient::new(Provider::Openai, None, Duration::from_secs(5)).unwrap();

        let err = client.generate("hi").await.unwrap_err();

        assert!(matches!(
            err,
            ProviderError::MissingApiKey {
                env_var: "OPENAI_API_KEY"
            }
        ));
    }

    #[test]
    fn parses_provider_names() {
        assert_eq!("Gemini".parse(), Ok(Provider::Gemini));
        assert_eq!("xai".parse(), Ok(Provider::Grok));
        assert!("claude".parse::<Provider>().is_err());
    }
}
