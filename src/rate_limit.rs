use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

pub const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);
pub const CONTACT_WINDOW: Duration = Duration::from_secs(10 * 60);

/// In-memory rate limiter keyed by "<bucket>:<ip_hash>", e.g. "login:ab12..".
pub struct RateLimiter {
    entries: Mutex<HashMap<String, Vec<Instant>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        RateLimiter {
            entries: Mutex::new(HashMap::new()),
        }
    }

    // A poisoned map only holds timestamps; keep using it.
    fn map(&self) -> MutexGuard<'_, HashMap<String, Vec<Instant>>> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Record an attempt and return true if it is still under `max_attempts` within `window`.
    pub fn check_and_record(&self, key: &str, max_attempts: u64, window: Duration) -> bool {
        let mut map = self.map();
        let now = Instant::now();

        let attempts = map.entry(key.to_string()).or_default();
        attempts.retain(|t| now.duration_since(*t) < window);

        if (attempts.len() as u64) < max_attempts {
            attempts.push(now);
            true
        } else {
            false
        }
    }

    /// Remaining attempts without recording a new one.
    pub fn remaining(&self, key: &str, max_attempts: u64, window: Duration) -> u64 {
        let map = self.map();
        let now = Instant::now();
        let used = map
            .get(key)
            .map(|a| a.iter().filter(|t| now.duration_since(**t) < window).count())
            .unwrap_or(0);
        max_attempts.saturating_sub(used as u64)
    }

    /// Forget a key, e.g. after a successful login.
    pub fn reset(&self, key: &str) {
        self.map().remove(key);
    }

    /// Drop attempts older than `max_age` and empty keys. Called from the cleanup task.
    pub fn cleanup(&self, max_age: Duration) {
        let mut map = self.map();
        let now = Instant::now();
        map.retain(|_, attempts| {
            attempts.retain(|t| now.duration_since(*t) < max_age);
            !attempts.is_empty()
        });
    }

    pub fn tracked_keys(&self) -> usize {
        self.map().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit() {
        let rl = RateLimiter::new();
        for _ in 0..3 {
            assert!(rl.check_and_record("contact:x", 3, CONTACT_WINDOW));
        }
        assert!(!rl.check_and_record("contact:x", 3, CONTACT_WINDOW));
        assert_eq!(rl.remaining("contact:x", 3, CONTACT_WINDOW), 0);
        // Other keys are independent.
        assert!(rl.check_and_record("contact:y", 3, CONTACT_WINDOW));
    }

    #[test]
    fn window_expiry_frees_slots() {
        let rl = RateLimiter::new();
        let window = Duration::from_millis(20);
        assert!(rl.check_and_record("login:a", 1, window));
        assert!(!rl.check_and_record("login:a", 1, window));
        std::thread::sleep(Duration::from_millis(30));
        assert!(rl.check_and_record("login:a", 1, window));
    }

    #[test]
    fn reset_and_cleanup() {
        let rl = RateLimiter::new();
        rl.check_and_record("login:a", 5, LOGIN_WINDOW);
        rl.check_and_record("login:b", 5, LOGIN_WINDOW);
        rl.reset("login:a");
        assert_eq!(rl.remaining("login:a", 5, LOGIN_WINDOW), 5);
        assert_eq!(rl.tracked_keys(), 1);
        std::thread::sleep(Duration::from_millis(5));
        rl.cleanup(Duration::from_millis(1));
        assert_eq!(rl.tracked_keys(), 0);
    }
}
