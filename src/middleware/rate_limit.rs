use std::{
    collections::{HashMap, VecDeque},
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use tokio::sync::Mutex;

use crate::config::RateLimitConfig;

const FALLBACK_CLIENT: &str = "127.0.0.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the oldest request in the window expires.
    pub reset_after: Duration,
}

struct Buckets {
    hits: HashMap<String, VecDeque<Instant>>,
    last_sweep: Instant,
}

impl Buckets {
    /// Drop clients with nothing left in the window, at most once per window.
    fn sweep_idle(&mut self, now: Instant, window: Duration) {
        if now.saturating_duration_since(self.last_sweep) < window {
            return;
        }
        self.hits.retain(|_, hits| {
            hits.back()
                .is_some_and(|last| now.saturating_duration_since(*last) < window)
        });
        self.last_sweep = now;
    }
}

/// Sliding-window limiter: at most `max_requests` per client within any `window`.
#[derive(Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    buckets: Arc<Mutex<Buckets>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests.max(1),
            window: Duration::from_secs(config.window_secs.max(1)),
            buckets: Arc::new(Mutex::new(Buckets {
                hits: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }

    pub async fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now()).await
    }

    pub async fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut buckets = self.buckets.lock().await;
        buckets.sweep_idle(now, self.window);

        let hits = buckets.hits.entry(key.to_string()).or_default();
        while let Some(oldest) = hits.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                hits.pop_front();
            } else {
                break;
            }
        }

        let allowed = (hits.len() as u32) < self.max_requests;
        if allowed {
            hits.push_back(now);
        }

        let reset_after = hits
            .front()
            .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
            .unwrap_or(self.window);

        RateDecision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(hits.len() as u32),
            reset_after,
        }
    }
}

/// Client identity: first hop of `x-forwarded-for`, then `x-real-ip`, then the peer.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| FALLBACK_CLIENT.to_string())
}

fn apply_headers(headers: &mut HeaderMap, decision: &RateDecision) {
    let reset_at = Utc::now().timestamp_millis() + decision.reset_after.as_millis() as i64;
    headers.insert("X-RateLimit-Limit", HeaderValue::from(decision.limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(decision.remaining));
    headers.insert("X-RateLimit-Reset", HeaderValue::from(reset_at));
}

pub async fn limit_by_ip(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let key = client_key(req.headers(), peer);
    let decision = limiter.check(&key).await;

    if !decision.allowed {
        tracing::warn!(client = %key, "rate limit exceeded");
        let mut res = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(serde_json::json!({
                "error": "Too many requests.",
                "message": "The Library is currently busy. Please wait a moment before requesting another scroll.",
            })),
        )
            .into_response();
        apply_headers(res.headers_mut(), &decision);
        return res;
    }

    let mut res = next.run(req).await;
    apply_headers(res.headers_mut(), &decision);
    res
}
