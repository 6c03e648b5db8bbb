use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// In-memory sliding-window rate limiter with brute-force lockout.
///
/// Two mechanisms share one clock: a per-key request window, and a
/// failed-login counter that blocks a client for an escalating duration
/// after repeated failures. Constructed once at startup and shared through
/// application state.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    requests: HashMap<String, VecDeque<Instant>>,
    blocked: HashMap<String, Instant>,
    failed_attempts: HashMap<String, VecDeque<Instant>>,
}

/// Failed logins per client+username before the client is blocked.
const FAILED_ATTEMPT_LIMIT: usize = 5;

/// Window over which failed logins are counted.
const FAILED_ATTEMPT_WINDOW: Duration = Duration::from_secs(900);

/// Longest block an abusive client can accumulate.
const MAX_BLOCK: Duration = Duration::from_secs(3600);

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests: max_requests as usize,
            window: Duration::from_secs(window_secs),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Whether a request from `client` is allowed right now. Allowed
    /// requests are recorded against the window.
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    /// Record a failed login; blocks the client once the attempt limit is
    /// reached, for `min(300s * excess, 1h)`.
    pub fn record_failed_login(&self, client: &str, username: &str) {
        self.record_failed_login_at(client, username, Instant::now());
    }

    /// Forget failures for a client+username after a successful login.
    pub fn clear_failed_attempts(&self, client: &str, username: &str) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        inner.failed_attempts.remove(&attempt_key(client, username));
    }

    fn check_at(&self, client: &str, now: Instant) -> bool {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(&blocked_until) = inner.blocked.get(client) {
            if now < blocked_until {
                tracing::warn!(client, "blocked client attempted request");
                return false;
            }
            inner.blocked.remove(client);
        }

        let window = self.window;
        let requests = inner.requests.entry(client.to_string()).or_default();
        drain_older_than(requests, now, window);

        if requests.len() >= self.max_requests {
            tracing::warn!(client, "rate limit exceeded");
            return false;
        }

        requests.push_back(now);
        true
    }

    fn record_failed_login_at(&self, client: &str, username: &str, now: Instant) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let attempts = inner
            .failed_attempts
            .entry(attempt_key(client, username))
            .or_default();
        drain_older_than(attempts, now, FAILED_ATTEMPT_WINDOW);
        attempts.push_back(now);

        if attempts.len() >= FAILED_ATTEMPT_LIMIT {
            let excess = (attempts.len() - FAILED_ATTEMPT_LIMIT + 1) as u32;
            let block = Duration::from_secs(300 * u64::from(excess)).min(MAX_BLOCK);
            inner.blocked.insert(client.to_string(), now + block);
            tracing::error!(
                client,
                username,
                block_secs = block.as_secs(),
                "client blocked for repeated failed logins"
            );
        }
    }
}

fn attempt_key(client: &str, username: &str) -> String {
    format!("{}:{}", client, username)
}

fn drain_older_than(entries: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = entries.front() {
        if now.duration_since(front) > window {
            entries.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_rejects() {
        let limiter = RateLimiter::new(3, 60);
        let now = Instant::now();

        assert!(limiter.check_at("1.2.3.4", now));
        assert!(limiter.check_at("1.2.3.4", now));
        assert!(limiter.check_at("1.2.3.4", now));
        assert!(!limiter.check_at("1.2.3.4", now));

        // Other clients are unaffected.
        assert!(limiter.check_at("5.6.7.8", now));
    }

    #[test]
    fn window_slides() {
        let limiter = RateLimiter::new(1, 60);
        let now = Instant::now();

        assert!(limiter.check_at("1.2.3.4", now));
        assert!(!limiter.check_at("1.2.3.4", now + Duration::from_secs(30)));
        assert!(limiter.check_at("1.2.3.4", now + Duration::from_secs(61)));
    }

    #[test]
    fn repeated_failures_block_the_client() {
        let limiter = RateLimiter::new(100, 60);
        let now = Instant::now();

        for _ in 0..FAILED_ATTEMPT_LIMIT {
            limiter.record_failed_login_at("1.2.3.4", "alice", now);
        }

        assert!(!limiter.check_at("1.2.3.4", now + Duration::from_secs(1)));
        // The block has a bounded duration.
        assert!(limiter.check_at("1.2.3.4", now + Duration::from_secs(301)));
    }

    #[test]
    fn successful_login_clears_the_failure_record() {
        let limiter = RateLimiter::new(100, 60);
        let now = Instant::now();

        for _ in 0..FAILED_ATTEMPT_LIMIT - 1 {
            limiter.record_failed_login_at("1.2.3.4", "alice", now);
        }
        limiter.clear_failed_attempts("1.2.3.4", "alice");
        limiter.record_failed_login_at("1.2.3.4", "alice", now);

        assert!(limiter.check_at("1.2.3.4", now));
    }
}
