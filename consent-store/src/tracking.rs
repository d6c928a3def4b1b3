// consent-store/src/tracking.rs
//! Page-level inputs to tracking and the deferred writers armed by it.
//!
//! Writers only hold their own measurements. They never keep a copy of the
//! persisted habits; the store hands them a freshly read value at fire time.
use chrono::{DateTime, Utc};
use common::models::analytics::Habits;

/// What the page knows about the current load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageVisit {
    pub path: String,
    pub referrer: Option<String>,
    pub viewport_width: u32,
}

impl PageVisit {
    pub fn new(path: impl Into<String>, viewport_width: u32) -> Self {
        Self {
            path: path.into(),
            referrer: None,
            viewport_width,
        }
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }
}

/// One scroll event's geometry, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    pub scroll_top: f64,
    pub document_height: f64,
    pub viewport_height: f64,
}

impl ScrollSample {
    /// Percent of the scrollable height reached, clamped to 0..=100
    pub fn percent(&self) -> f64 {
        let scrollable = (self.document_height - self.viewport_height).max(1.0);
        (self.scroll_top * 100.0 / scrollable).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Default, Clone)]
pub struct ScrollDepthTracker {
    max_scroll: f64,
}

impl ScrollDepthTracker {
    pub fn observe(&mut self, sample: ScrollSample) {
        self.max_scroll = self.max_scroll.max(sample.percent());
    }

    pub fn max_scroll(&self) -> f64 {
        self.max_scroll
    }

    pub fn apply(&self, habits: &mut Habits) {
        habits.fold_scroll_depth(self.max_scroll);
    }
}

#[derive(Debug, Clone)]
pub struct TimeOnPageTracker {
    started_at: DateTime<Utc>,
}

impl TimeOnPageTracker {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self { started_at }
    }

    /// Whole seconds on the page, rounded to nearest
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        let ms = now.signed_duration_since(self.started_at).num_milliseconds().max(0);
        ((ms + 500) / 1000) as u64
    }

    pub fn apply(&self, habits: &mut Habits, now: DateTime<Utc>) {
        habits.add_time_spent(self.elapsed_secs(now));
    }
}

/// Writers armed by one tracking initialisation. Replaced wholesale on the
/// next initialisation so listeners never accumulate.
#[derive(Debug, Clone)]
pub struct DeferredWriters {
    pub scroll: ScrollDepthTracker,
    pub time_on_page: TimeOnPageTracker,
}

impl DeferredWriters {
    pub fn arm(now: DateTime<Utc>) -> Self {
        Self {
            scroll: ScrollDepthTracker::default(),
            time_on_page: TimeOnPageTracker::new(now),
        }
    }
}
