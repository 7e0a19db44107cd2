//! Per-address request caps.
//!
//! Each client address owns a window that opens on its first request and lasts a fixed
//! duration. Requests inside the window are counted; once the cap is reached further
//! requests are refused until the window elapses, at which point the next request opens
//! a fresh one. State is in-memory and per-process.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;
use crate::error::{ContactError, Result};

/// Cap and window for one endpoint family
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    /// Label used in logs and metrics
    pub name: &'static str,
    /// Requests allowed per window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
    /// Message returned when the cap is hit
    pub message: &'static str,
}

impl RateLimitPolicy {
    /// Contact form submissions
    #[must_use]
    pub fn contact(config: &RateLimitConfig) -> Self {
        Self {
            name: "contact",
            max_requests: config.contact_max,
            window: Duration::from_secs(config.window_secs),
            message: "Too many contact form submissions, please try again later",
        }
    }

    /// Admin login attempts
    #[must_use]
    pub fn login(config: &RateLimitConfig) -> Self {
        Self {
            name: "login",
            max_requests: config.login_max,
            window: Duration::from_secs(config.window_secs),
            message: "Too many login attempts, please try again later",
        }
    }

    /// Every route
    #[must_use]
    pub fn global(config: &RateLimitConfig) -> Self {
        Self {
            name: "global",
            max_requests: config.global_max,
            window: Duration::from_secs(config.window_secs),
            message: "Too many requests from this IP, please try again later.",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Fixed-duration request counter keyed by client address
#[derive(Debug)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    /// Empty limiter enforcing `policy`
    #[must_use]
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Policy this limiter enforces
    #[must_use]
    pub const fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Count a request from `addr` now
    pub fn check(&self, addr: IpAddr) -> Result<()> {
        self.check_at(addr, Instant::now())
    }

    /// Count a request from `addr` at `now`, refusing it once the cap is reached
    pub fn check_at(&self, addr: IpAddr, now: Instant) -> Result<()> {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        let window = windows.entry(addr).or_insert(Window { count: 0, started: now });
        if now.saturating_duration_since(window.started) >= self.policy.window {
            *window = Window { count: 0, started: now };
        }

        if window.count >= self.policy.max_requests {
            tracing::warn!(
                policy = self.policy.name,
                client = %addr,
                count = window.count,
                "Rate limit exceeded"
            );
            return Err(ContactError::RateLimited(self.policy.message.to_string()));
        }

        window.count += 1;
        Ok(())
    }

    /// Requests left for `addr` in its current window
    #[must_use]
    pub fn remaining_at(&self, addr: IpAddr, now: Instant) -> u32 {
        let windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        match windows.get(&addr) {
            Some(window) if now.saturating_duration_since(window.started) < self.policy.window => {
                self.policy.max_requests.saturating_sub(window.count)
            },
            _ => self.policy.max_requests,
        }
    }

    /// Drop windows that have elapsed; returns how many were removed
    pub fn sweep(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        let before = windows.len();
        windows.retain(|_, window| now.saturating_duration_since(window.started) < self.policy.window);
        before - windows.len()
    }

    /// Number of addresses currently tracked
    #[must_use]
    pub fn tracked_addresses(&self) -> usize {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
