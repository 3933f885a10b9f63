use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Entries kept before expired windows are swept.
const SWEEP_THRESHOLD: usize = 1024;

pub trait RateLimiter: Send + Sync {
    /// Records one operation for `key`. Returns false if the key is over its
    /// quota, in which case nothing is recorded.
    fn allow(&self, key: &str) -> bool;
}

struct Window {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Per-process fixed window counter. The window starts at the first operation
/// and ends exactly `window` later. State is lost on restart and is not shared
/// between processes.
pub struct FixedWindowLimiter {
    limit: u32,
    window: Duration,
    entries: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(limit: u32, window: std::time::Duration) -> FixedWindowLimiter {
        FixedWindowLimiter {
            limit,
            window: Duration::from_std(window).unwrap_or(Duration::hours(1)),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn allow_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut entries = self.entries.lock();
        if entries.len() >= SWEEP_THRESHOLD {
            entries.retain(|_, w| w.reset_at > now);
        }

        if let Some(window) = entries.get_mut(key) {
            if now < window.reset_at {
                if window.count >= self.limit {
                    return false;
                }
                window.count += 1;
                return true;
            }
        }

        if self.limit == 0 {
            return false;
        }
        entries.insert(
            key.to_owned(),
            Window {
                count: 1,
                reset_at: now + self.window,
            },
        );
        true
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries.lock().len()
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Utc::now())
    }
}

/// Limiter key for a commenter email.
pub fn identity_key(email: &str) -> String {
    email.trim().to_lowercase()
}
