use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

/// Fixed one-minute window of login attempts per client IP
pub struct RateLimiter {
    requests: DashMap<String, (AtomicU32, AtomicI64)>,
    max_requests_per_minute: u32,
}

impl RateLimiter {
    pub fn new(max_requests_per_minute: u32) -> Self {
        Self {
            requests: DashMap::new(),
            max_requests_per_minute,
        }
    }

    /// Count an attempt from `ip` at `current_time` (seconds) and report
    /// whether it is within the limit
    pub fn check_and_increment(&self, ip: &str, current_time: i64) -> bool {
        let entry = self
            .requests
            .entry(ip.to_string())
            .or_insert_with(|| (AtomicU32::new(0), AtomicI64::new(current_time)));

        let (count, window_start) = entry.value();
        let window_start_time = window_start.load(Ordering::Relaxed);

        if current_time - window_start_time >= 60 {
            window_start.store(current_time, Ordering::Relaxed);
            count.store(1, Ordering::Relaxed);
            return true;
        }

        let current_count = count.fetch_add(1, Ordering::Relaxed) + 1;

        current_count <= self.max_requests_per_minute
    }

    pub fn cleanup_old_entries(&self, current_time: i64) {
        self.requests.retain(|_, (_, window_start)| {
            current_time - window_start.load(Ordering::Relaxed) < 60
        });
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
