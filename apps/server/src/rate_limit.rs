//! Fixed-window request limiting per client IP for the `/api` routes.
//!
//! The client IP is the peer address. With `TRUST_PROXY` on, the first
//! `X-Forwarded-For` entry and then `X-Real-IP` take precedence. Requests
//! whose IP cannot be determined are let through.

use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Mutex,
    time::Duration,
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::time::Instant;

use crate::{error::ApiError, state::AppState};

/// Hard cap on tracked clients. A new client arriving at the cap first
/// drops stale windows, then evicts the oldest one.
const MAX_TRACKED_CLIENTS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

struct Window {
    started: Instant,
    count: u32,
}

pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    trust_proxy: bool,
    max_clients: usize,
    clients: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            trust_proxy: false,
            max_clients: MAX_TRACKED_CLIENTS,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_trusted_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    pub fn with_max_clients(mut self, max_clients: usize) -> Self {
        self.max_clients = max_clients.max(1);
        self
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn trusts_proxy(&self) -> bool {
        self.trust_proxy
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.lock().expect("rate limiter poisoned").len()
    }

    /// Count one request from `ip` and decide whether it may proceed.
    pub fn check(&self, ip: IpAddr) -> Decision {
        let now = Instant::now();
        let mut clients = self.clients.lock().expect("rate limiter poisoned");

        if !clients.contains_key(&ip) && clients.len() >= self.max_clients {
            clients.retain(|_, window| now.duration_since(window.started) < self.window);
            if clients.len() >= self.max_clients {
                let oldest = clients
                    .iter()
                    .min_by_key(|(_, window)| window.started)
                    .map(|(ip, _)| *ip);
                if let Some(oldest) = oldest {
                    clients.remove(&oldest);
                }
            }
        }

        let window = clients.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });
        let elapsed = now.duration_since(window.started);
        if elapsed >= self.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.max_requests {
            return Decision::Limited {
                retry_after: self.window.saturating_sub(now.duration_since(window.started)),
            };
        }

        window.count += 1;
        Decision::Allowed {
            remaining: self.max_requests - window.count,
        }
    }
}

/// Forwarding headers are client-controlled, so they are read only when
/// `trust_proxy` is set.
pub fn client_ip(request: &Request, trust_proxy: bool) -> Option<IpAddr> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    if !trust_proxy {
        return peer;
    }

    let headers = request.headers();
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|ip| ip.trim().parse::<IpAddr>().ok());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
    };

    forwarded.or_else(real_ip).or(peer)
}

pub async fn limit_by_ip(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let limiter = &state.rate_limiter;
    let Some(ip) = client_ip(&request, limiter.trusts_proxy()) else {
        tracing::warn!("cannot determine client IP for rate limiting, allowing request");
        return next.run(request).await;
    };

    match limiter.check(ip) {
        Decision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            add_rate_limit_headers(response.headers_mut(), limiter.max_requests(), remaining);
            response
        }
        Decision::Limited { retry_after } => {
            tracing::warn!(%ip, "rate limit exceeded");
            let mut response = ApiError::rate_limited().into_response();
            let headers = response.headers_mut();
            add_rate_limit_headers(headers, limiter.max_requests(), 0);
            // Round up so clients never retry early
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            headers.insert(header::RETRY_AFTER, HeaderValue::from(secs));
            response
        }
    }
}

fn add_rate_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32) {
    headers.insert(
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderValue::from(limit),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-remaining"),
        HeaderValue::from(remaining),
    );
}
