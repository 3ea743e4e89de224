use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::AppState;

/// Attempts allowed per client and auth route within one window.
pub const MAX_ATTEMPTS: u32 = 5;
pub const WINDOW: Duration = Duration::from_secs(60);

/// Fixed-window attempt counters keyed by `ip:path`.
///
/// Lives in process memory, so limits are per instance.
#[derive(Clone, Default)]
pub struct RateLimitState {
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

struct Window {
    opened_at: Instant,
    attempts: u32,
}

impl RateLimitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt. `Ok` carries the attempts left in this window,
    /// `Err` the time until the window reopens.
    pub async fn check(&self, key: &str) -> Result<u32, Duration> {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> Result<u32, Duration> {
        let mut windows = self.windows.lock().await;
        let window = windows.entry(key.to_string()).or_insert(Window {
            opened_at: now,
            attempts: 0,
        });

        if now.saturating_duration_since(window.opened_at) > WINDOW {
            window.opened_at = now;
            window.attempts = 0;
        }

        if window.attempts >= MAX_ATTEMPTS {
            return Err(WINDOW.saturating_sub(now.saturating_duration_since(window.opened_at)));
        }

        window.attempts += 1;
        Ok(MAX_ATTEMPTS - window.attempts)
    }

    /// Forget windows that closed more than one window ago.
    pub async fn cleanup(&self) {
        let now = Instant::now();
        self.windows
            .lock()
            .await
            .retain(|_, w| now.saturating_duration_since(w.opened_at) < WINDOW * 2);
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.windows.lock().await.len()
    }
}

pub async fn rate_limit_auth(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = addr.ip();
    let path = req.uri().path().to_string();

    match state.rate_limiter.check(&format!("{}:{}", ip, path)).await {
        Ok(remaining) => {
            tracing::debug!(%ip, %path, remaining, "Auth attempt allowed");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            tracing::warn!(
                %ip,
                %path,
                retry_after_secs = retry_after.as_secs(),
                "Auth attempts exhausted"
            );
            Err(AppError::RateLimited)
        }
    }
}

/// Periodically drop stale windows so the map stays small.
pub fn spawn_cleanup_worker(limiter: RateLimitState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(WINDOW * 5);
        loop {
            ticker.tick().await;
            limiter.cleanup().await;
        }
    });
}
