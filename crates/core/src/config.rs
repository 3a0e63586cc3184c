//! Environment-driven configuration.
//!
//! Binaries load `.env` with `dotenvy` before calling [`AppConfig::from_env`].

use std::{str::FromStr, time::Duration};

use crate::{error::ConfigError, key::KeyEncoding, provider::Provider, retry::RetryPolicy};

pub const DEFAULT_SUPADATA_URL: &str = "https://api.supadata.ai/v1/youtube/transcript";
const DEFAULT_FALLBACK_PORTS: [u16; 3] = [8080, 8090, 8091];

#[derive(Clone, Debug)]
pub struct ServerSettings {
    pub host: String,
    pub preferred_port: Option<u16>,
    pub fallback_ports: Vec<u16>,
    pub max_body_bytes: usize,
}

impl ServerSettings {
    /// Ports to try in order: the preferred one first, then the fallbacks.
    pub fn ports(&self) -> Vec<u16> {
        let mut ports: Vec<u16> = self.preferred_port.into_iter().collect();
        for port in &self.fallback_ports {
            if !ports.contains(port) {
                ports.push(*port);
            }
        }
        ports
    }
}

#[derive(Clone, Debug)]
pub struct LlmSettings {
    pub provider: Provider,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub model: Option<String>,
}

#[derive(Clone, Debug)]
pub struct TranscriptSettings {
    pub default_language: String,
    pub supadata_api_key: Option<String>,
    pub supadata_api_url: String,
    pub proxy_url: Option<String>,
    pub ytdlp_enabled: bool,
}

#[derive(Clone, Debug)]
pub struct CacheSettings {
    pub ttl: Duration,
    /// `0` means unbounded.
    pub max_entries: usize,
    pub key_encoding: KeyEncoding,
}

#[derive(Clone, Debug)]
pub struct RateLimitSettings {
    pub window: Duration,
    pub max_requests: u32,
    /// Take the client IP from `X-Forwarded-For` / `X-Real-IP`. Only safe
    /// behind a reverse proxy that overwrites those headers.
    pub trust_proxy: bool,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub environment: String,
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub transcript: TranscriptSettings,
    pub cache: CacheSettings,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    pub prompt_char_limit: usize,
    pub rate_limit: RateLimitSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let environment = var("APP_ENV")
            .or_else(|| var("NODE_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let fallback_ports = match var("FALLBACK_PORTS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|port| !port.is_empty())
                .map(|port| parse_value("FALLBACK_PORTS", port))
                .collect::<Result<Vec<u16>, _>>()?,
            None => DEFAULT_FALLBACK_PORTS.to_vec(),
        };

        let server = ServerSettings {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            preferred_port: parse_opt(&var, "PORT")?,
            fallback_ports,
            max_body_bytes: parse_or(&var, "MAX_BODY_BYTES", 2 * 1024 * 1024)?,
        };

        let provider: Provider = parse_or(&var, "LLM_PROVIDER", Provider::default())?;
        let llm = LlmSettings {
            provider,
            api_key: var(provider.config().env_var),
            api_url: var("LLM_API_URL"),
            model: var("LLM_MODEL"),
        };

        let transcript = TranscriptSettings {
            default_language: var("DEFAULT_TRANSCRIPT_LANGUAGE").unwrap_or_else(|| "hi".to_string()),
            supadata_api_key: var("SUPADATA_API_KEY"),
            supadata_api_url: var("SUPADATA_API_URL")
                .unwrap_or_else(|| DEFAULT_SUPADATA_URL.to_string()),
            proxy_url: var("TRANSCRIPT_PROXY_URL"),
            ytdlp_enabled: parse_bool(&var, "YTDLP_ENABLED", true)?,
        };

        let cache = CacheSettings {
            ttl: Duration::from_secs(parse_or(&var, "CACHE_TTL", 3600)?),
            max_entries: parse_or(&var, "CACHE_MAX_ENTRIES", 0)?,
            key_encoding: parse_or(&var, "CACHE_KEY_ENCODING", KeyEncoding::default())?,
        };

        let retry = RetryPolicy::new(parse_or(&var, "MAX_RETRIES", 3)?)
            .with_initial_delay(Duration::from_millis(parse_or(
                &var,
                "RETRY_INITIAL_DELAY_MS",
                1000,
            )?))
            .with_max_delay(Duration::from_millis(parse_or(
                &var,
                "RETRY_MAX_DELAY_MS",
                5000,
            )?));

        let rate_limit = RateLimitSettings {
            window: Duration::from_millis(parse_or(&var, "RATE_LIMIT_WINDOW_MS", 900_000)?),
            max_requests: parse_or(&var, "RATE_LIMIT_MAX_REQUESTS", 100)?,
            trust_proxy: parse_bool(&var, "TRUST_PROXY", false)?,
        };

        Ok(Self {
            environment,
            server,
            llm,
            transcript,
            cache,
            retry,
            request_timeout: Duration::from_secs(parse_or(&var, "REQUEST_TIMEOUT_SECS", 30)?),
            prompt_char_limit: parse_or(&var, "PROMPT_CHAR_LIMIT", 8000)?,
            rate_limit,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

fn parse_value<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        var: name,
        value: raw.to_string(),
    })
}

fn parse_opt<T, F>(var: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    var(name).map(|raw| parse_value(name, &raw)).transpose()
}

fn parse_or<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(var, name)?.unwrap_or(default))
}

fn parse_bool<F>(var: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = var(name) else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var: name,
            value: raw,
        }),
    }
}
