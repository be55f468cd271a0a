use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::models::{ApiError, AppState};

/// Counting window length
pub const WINDOW: Duration = Duration::from_secs(15 * 60);
/// Requests allowed per client per window
pub const MAX_REQUESTS: u32 = 100;

/// Evict expired windows once the client map grows past this
const EVICTION_THRESHOLD: usize = 10_000;

/// HTTP header names for rate limiting
pub mod headers {
    pub const X_RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
    pub const X_RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
    pub const X_RATE_LIMIT_RESET: &str = "x-ratelimit-reset";
}

#[derive(Debug)]
struct ClientWindow {
    started: Instant,
    count: u32,
}

/// Outcome of counting one request against a client's window
#[derive(Debug, Clone, Copy)]
pub struct Quota {
    pub limited: bool,
    pub remaining: u32,
    pub reset_after: Duration,
}

/// Process-wide fixed-window request counter keyed by client address.
///
/// The window resets once its age exceeds the window length; counters
/// live for the whole process, there is no background reset task.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    clients: Mutex<HashMap<IpAddr, ClientWindow>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Count one request from `addr` and report the resulting quota
    pub fn check(&self, addr: IpAddr) -> Quota {
        let now = Instant::now();
        let mut clients = match self.clients.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if clients.len() > EVICTION_THRESHOLD {
            let window = self.window;
            clients.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = clients.entry(addr).or_insert(ClientWindow {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }
        entry.count += 1;

        Quota {
            limited: entry.count > self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_after: self
                .window
                .saturating_sub(now.duration_since(entry.started)),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }
}

/// Axum middleware enforcing the per-client request quota.
///
/// Requests without connection info (only seen in tests) fall back to a
/// single shared localhost bucket.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let client_ip = connect_info
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    let quota = state.rate_limiter.check(client_ip);
    if quota.limited {
        warn!(%client_ip, "Rate limit exceeded");
        return ApiError::RateLimited {
            retry_after_secs: quota.reset_after.as_secs(),
        }
        .into_response();
    }

    let mut response = next.run(request).await;
    let limit = state.rate_limiter.max_requests();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&limit.to_string()) {
        headers.insert(headers::X_RATE_LIMIT_LIMIT, value);
    }
    if let Ok(value) = HeaderValue::from_str(&quota.remaining.to_string()) {
        headers.insert(headers::X_RATE_LIMIT_REMAINING, value);
    }
    if let Ok(value) = HeaderValue::from_str(&quota.reset_after.as_secs().to_string()) {
        headers.insert(headers::X_RATE_LIMIT_RESET, value);
    }
    response
}
