//! Configuration for the security core.
//!
//! One [`SecurityConfig`] aggregates the tunables of every component. All
//! defaults match the reference deployment: five failed attempts lock an
//! account, five failed attempts within fifteen minutes block an address for
//! fifteen minutes, logins are throttled at five per minute per address, and
//! sessions slide thirty minutes past the last validated request.
//!
//! Instances are plain values constructed once at startup and injected into
//! the services; nothing here reads ambient global state.

use chrono::Duration;

/// Per-account lockout tunables.
#[derive(Debug, Clone)]
pub struct LockoutConfig {
    /// Consecutive failed attempts after which the account locks.
    pub threshold: u32,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self { threshold: 5 }
    }
}

impl LockoutConfig {
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }
}

/// Per-IP blocking tunables.
#[derive(Debug, Clone)]
pub struct IpBlockConfig {
    /// Failed attempts within `attempt_window` after which the address blocks.
    pub threshold: u32,
    /// Width of the failure-counting window.
    pub attempt_window: Duration,
    /// How long a triggered block lasts.
    pub block_duration: Duration,
}

impl Default for IpBlockConfig {
    fn default() -> Self {
        Self {
            threshold: 5,
            attempt_window: Duration::minutes(15),
            block_duration: Duration::minutes(15),
        }
    }
}

impl IpBlockConfig {
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_block_duration(mut self, duration: Duration) -> Self {
        self.block_duration = duration;
        self
    }

    pub fn with_attempt_window(mut self, window: Duration) -> Self {
        self.attempt_window = window;
        self
    }
}

/// Fixed-window rate limiter tunables.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests allowed per window for the login endpoint.
    pub login_limit: u32,
    /// Window width.
    pub interval: std::time::Duration,
    /// Distinct keys tracked before the map is cleared wholesale.
    pub max_keys: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login_limit: 5,
            interval: std::time::Duration::from_secs(60),
            max_keys: 500,
        }
    }
}

impl RateLimitConfig {
    pub fn with_login_limit(mut self, limit: u32) -> Self {
        self.login_limit = limit;
        self
    }

    pub fn with_interval(mut self, interval: std::time::Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Session lifetime tunables.
///
/// The cookie max-age is deliberately longer than the slide window: the
/// session store is the source of truth, the cookie merely carries the token.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Expiry is recomputed to `now + slide_window` on every validation.
    pub slide_window: Duration,
    /// Name of the session cookie.
    pub cookie_name: String,
    /// Max-age advertised on the cookie.
    pub cookie_max_age: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            slide_window: Duration::minutes(30),
            cookie_name: "warden_session".to_string(),
            cookie_max_age: Duration::hours(24),
        }
    }
}

impl SessionConfig {
    pub fn with_slide_window(mut self, window: Duration) -> Self {
        self.slide_window = window;
        self
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }
}

/// Aggregate configuration for the whole engine.
#[derive(Debug, Clone, Default)]
pub struct SecurityConfig {
    pub lockout: LockoutConfig,
    pub ip_block: IpBlockConfig,
    pub rate_limit: RateLimitConfig,
    pub session: SessionConfig,
}

impl SecurityConfig {
    pub fn with_lockout(mut self, lockout: LockoutConfig) -> Self {
        self.lockout = lockout;
        self
    }

    pub fn with_ip_block(mut self, ip_block: IpBlockConfig) -> Self {
        self.ip_block = ip_block;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }
}
