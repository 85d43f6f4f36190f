//! Fixed-window request limiting keyed by client identity.
//!
//! Two backends share the same policy: at most `max_requests` per key inside
//! a window of `window` length, the window restarting wholesale once it has
//! elapsed. The in-memory backend serves a single process and keeps a bounded
//! number of keys; the Redis backend lets several processes share counters.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::{RateLimitBackend, RateLimitSettings};

const UNKNOWN_CLIENT: &str = "unknown";

pub enum RateLimiter {
    InMemory(InMemoryRateLimiter),
    Redis(RedisRateLimiter),
}

impl RateLimiter {
    pub fn from_settings(
        settings: &RateLimitSettings,
        redis_address: &str,
    ) -> Result<RateLimiter, redis::RedisError> {
        let limiter = match settings.backend {
            RateLimitBackend::Memory => RateLimiter::InMemory(InMemoryRateLimiter::new(
                settings.max_requests,
                settings.get_window(),
                settings.max_tracked_clients,
            )),
            RateLimitBackend::Redis => RateLimiter::Redis(RedisRateLimiter::new(
                redis::Client::open(redis_address)?,
                settings.max_requests,
                settings.get_window(),
            )),
        };

        Ok(limiter)
    }

    #[tracing::instrument(name = "Checking the request rate of a client", skip(self))]
    pub async fn allow(&self, key: &str) -> bool {
        match self {
            RateLimiter::InMemory(limiter) => limiter.allow(key),
            RateLimiter::Redis(limiter) => limiter.allow(key).await,
        }
    }
}

/// Derives the limiter key from the first hop of `X-Forwarded-For`.
pub fn client_key(forwarded_for: Option<&str>) -> String {
    forwarded_for
        .and_then(|header| header.split(',').next())
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

#[derive(Debug, Clone, Copy)]
struct WindowRecord {
    count: u32,
    window_start: Instant,
}

pub struct InMemoryRateLimiter {
    max_requests: u32,
    window: Duration,
    max_tracked_clients: usize,
    records: Mutex<HashMap<String, WindowRecord>>,
}

impl InMemoryRateLimiter {
    pub fn new(max_requests: u32, window: Duration, max_tracked_clients: usize) -> Self {
        InMemoryRateLimiter {
            max_requests,
            window,
            max_tracked_clients: max_tracked_clients.max(1),
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    pub fn tracked_clients(&self) -> usize {
        self.records.lock().len()
    }

    fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut records = self.records.lock();

        if let Some(record) = records.get_mut(key) {
            if now.saturating_duration_since(record.window_start) > self.window {
                *record = WindowRecord {
                    count: 1,
                    window_start: now,
                };
                return true;
            }

            if record.count >= self.max_requests {
                return false;
            }

            record.count += 1;
            return true;
        }

        if records.len() >= self.max_tracked_clients {
            self.evict(&mut records, now);
        }

        records.insert(
            key.to_string(),
            WindowRecord {
                count: 1,
                window_start: now,
            },
        );

        true
    }

    // Drops elapsed windows first; if every window is still live, the oldest one goes.
    fn evict(&self, records: &mut HashMap<String, WindowRecord>, now: Instant) {
        records.retain(|_, record| now.saturating_duration_since(record.window_start) <= self.window);

        if records.len() < self.max_tracked_clients {
            return;
        }

        let oldest = records
            .iter()
            .min_by_key(|(_, record)| record.window_start)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            tracing::warn!(client = %key, "Rate limiter is full, evicting the oldest window");
            records.remove(&key);
        }
    }
}

pub struct RedisRateLimiter {
    client: redis::Client,
    max_requests: u32,
    window: Duration,
}

impl RedisRateLimiter {
    pub fn new(client: redis::Client, max_requests: u32, window: Duration) -> Self {
        RedisRateLimiter {
            client,
            max_requests,
            window,
        }
    }

    pub async fn allow(&self, key: &str) -> bool {
        admits(self.increment(key).await, self.max_requests)
    }

    async fn increment(&self, key: &str) -> Result<u64, redis::RedisError> {
        let mut redis_conn = self.client.get_tokio_connection().await?;
        let redis_key = redis_key(key);

        // The key expires with the window, so the counter restarts on its own
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(&redis_key)
            .arg(0)
            .arg("NX")
            .arg("EX")
            .arg(self.window.as_secs().max(1))
            .ignore()
            .cmd("INCR")
            .arg(&redis_key)
            .query_async(&mut redis_conn)
            .await?;

        Ok(count)
    }
}

// An unreachable backend lets the request through.
fn admits(count: Result<u64, redis::RedisError>, max_requests: u32) -> bool {
    match count {
        Ok(count) => count <= u64::from(max_requests),
        Err(err) => {
            tracing::warn!(error = ?err, "Rate limiter backend is unavailable, allowing request");
            true
        }
    }
}

fn redis_key(key: &str) -> String {
    format!("rate_limit:{}", key)
}
