// form-guard/src/rate_limiter.rs
use chrono::{DateTime, Duration, Utc};
use common::GuardConfig;

/// Sliding window of accepted submission times.
///
/// Lives in memory only, so every page load starts with an empty window.
#[derive(Debug, Clone)]
pub struct RateLimitWindow {
    submissions: Vec<DateTime<Utc>>,
    max_submissions: usize,
    window: Duration,
}

impl RateLimitWindow {
    pub fn new(max_submissions: usize, window: Duration) -> Self {
        Self {
            submissions: Vec::new(),
            max_submissions,
            window,
        }
    }

    pub fn from_config(config: &GuardConfig) -> Self {
        Self::new(
            config.max_submissions,
            Duration::seconds(config.rate_limit_window_secs),
        )
    }

    fn in_window(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(at) < self.window
    }

    /// Record an accepted submission, evicting entries that left the window
    pub fn record(&mut self, now: DateTime<Utc>) {
        let window = self.window;
        self.submissions
            .retain(|time| now.signed_duration_since(*time) < window);
        self.submissions.push(now);
    }

    pub fn count_in_window(&self, now: DateTime<Utc>) -> usize {
        self.submissions
            .iter()
            .filter(|time| self.in_window(**time, now))
            .count()
    }

    pub fn is_rate_limited(&self, now: DateTime<Utc>) -> bool {
        self.count_in_window(now) >= self.max_submissions
    }

    /// Whole minutes, rounded up, until the oldest in-window entry expires
    pub fn wait_minutes(&self, now: DateTime<Utc>) -> i64 {
        let oldest = self
            .submissions
            .iter()
            .filter(|time| self.in_window(**time, now))
            .min();

        match oldest {
            Some(oldest) => {
                let wait_ms = (*oldest + self.window)
                    .signed_duration_since(now)
                    .num_milliseconds();
                ((wait_ms + 59_999) / 60_000).max(0)
            }
            None => 0,
        }
    }
}
