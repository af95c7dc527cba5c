// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fixed-window rate limiting for authentication endpoints.
//!
//! Each client key gets a window of `window` length starting at its first
//! request. Up to `max_requests` requests are allowed per window; later ones
//! are rejected with the time left until the window ends. A request arriving
//! after the window has elapsed starts a fresh window with a count of one.
//!
//! Buckets live in a [`DashMap`]; the read-increment-write for a key runs
//! while holding that key's entry, so concurrent requests from one client
//! cannot undercount.
//!
//! The limiter is applied per route, outermost, so it runs before any token
//! is looked at:
//!
//! ```rust,ignore
//! Router::new()
//!     .route("/v1/auth/login", post(login))
//!     .route_layer(from_fn_with_state(limiter.clone(), rate_limit));
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::AuthError;

/// Default window length (15 minutes).
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Default requests allowed per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 5;

/// Key used when the peer address is unavailable.
const UNKNOWN_CLIENT: &str = "unknown";

/// Configuration for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Length of one window.
    pub window: Duration,
    /// Requests allowed per key per window.
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            max_requests: DEFAULT_MAX_REQUESTS,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Bucket {
    window_start: Instant,
    count: u32,
}

impl Bucket {
    fn fresh(now: Instant) -> Self {
        Self {
            window_start: now,
            count: 1,
        }
    }

    fn elapsed(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.window_start) >= window
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request is allowed; `remaining` more fit in this window.
    Allowed { remaining: u32 },
    /// Request is over the limit.
    Limited { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed { .. })
    }
}

/// Per-key fixed-window request counter.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: DashMap<String, Bucket>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: DashMap::new(),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Count a request from `key` now.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    /// Count a request from `key` at `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let window = self.config.window;
        let max = self.config.max_requests;

        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket {
                window_start: now,
                count: 0,
            });

        if bucket.count == 0 || bucket.elapsed(now, window) {
            *bucket = Bucket::fresh(now);
        } else {
            bucket.count = bucket.count.saturating_add(1);
        }

        if bucket.count <= max {
            RateLimitDecision::Allowed {
                remaining: max - bucket.count,
            }
        } else {
            let used = now.saturating_duration_since(bucket.window_start);
            RateLimitDecision::Limited {
                retry_after: window.saturating_sub(used),
            }
        }
    }

    /// Requests counted for `key` in its current window, if it has one.
    pub fn current_count(&self, key: &str) -> Option<u32> {
        self.buckets.get(key).map(|bucket| bucket.count)
    }

    /// Number of tracked keys.
    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }

    /// Drop buckets whose window has elapsed at `now`. Returns how many
    /// were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let window = self.config.window;
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| !bucket.elapsed(now, window));
        before.saturating_sub(self.buckets.len())
    }

    /// Spawn a background task that purges elapsed buckets every `interval`
    /// until `shutdown` is cancelled.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                interval_secs = interval.as_secs(),
                "Rate limit sweeper started"
            );
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("Rate limit sweeper shutting down");
                        return;
                    }
                    _ = ticker.tick() => {
                        let removed = self.purge_expired(Instant::now());
                        if removed > 0 {
                            debug!(removed, remaining = self.tracked_keys(), "Purged rate limit buckets");
                        }
                    }
                }
            }
        })
    }
}

/// Client key for a request: the peer IP address.
pub fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Rate limiting middleware for authentication routes.
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);

    match limiter.check(&key) {
        RateLimitDecision::Allowed { .. } => next.run(request).await,
        RateLimitDecision::Limited { retry_after } => {
            warn!(
                client = %key,
                path = %request.uri().path(),
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            AuthError::RateLimited { retry_after }.into_response()
        }
    }
}
