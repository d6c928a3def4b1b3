// common/src/models/analytics.rs
//! Persisted analytics shapes. Field names follow the JSON already stored in
//! visitors' cookies, so every struct is camelCase and tolerates missing keys.
use serde::{Deserialize, Serialize};

/// One tracked page path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageView {
    pub page: String,
    pub count: u64,
    /// Milliseconds since the unix epoch
    pub first_visit: i64,
    pub last_visit: i64,
}

/// Local-time bucket of a visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSlot {
    Night,
    Morning,
    Afternoon,
    Evening,
}

impl TimeSlot {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => TimeSlot::Night,
            6..=11 => TimeSlot::Morning,
            12..=17 => TimeSlot::Afternoon,
            _ => TimeSlot::Evening,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Mobile,
    Desktop,
}

impl DeviceType {
    pub fn from_viewport_width(width: u32, mobile_max_width: u32) -> Self {
        if width <= mobile_max_width {
            DeviceType::Mobile
        } else {
            DeviceType::Desktop
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeOfDayHistogram {
    pub night: u64,
    pub morning: u64,
    pub afternoon: u64,
    pub evening: u64,
}

impl TimeOfDayHistogram {
    pub fn record(&mut self, slot: TimeSlot) {
        let bucket = match slot {
            TimeSlot::Night => &mut self.night,
            TimeSlot::Morning => &mut self.morning,
            TimeSlot::Afternoon => &mut self.afternoon,
            TimeSlot::Evening => &mut self.evening,
        };
        *bucket += 1;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceHistogram {
    pub mobile: u64,
    pub desktop: u64,
}

impl DeviceHistogram {
    pub fn record(&mut self, device: DeviceType) {
        match device {
            DeviceType::Mobile => self.mobile += 1,
            DeviceType::Desktop => self.desktop += 1,
        }
    }
}

/// Aggregate browsing habits across sessions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Habits {
    pub preferred_time: TimeOfDayHistogram,
    pub device_type: DeviceHistogram,
    /// Percent of the page scrolled, averaged over sessions
    pub avg_scroll_depth: u32,
    pub session_count: u64,
    /// Seconds
    pub total_time_spent: u64,
    /// Seconds
    pub last_session_duration: u64,
}

impl Habits {
    /// Fold one session's maximum scroll depth into the running mean.
    ///
    /// `session_count` already includes the session being folded in.
    pub fn fold_scroll_depth(&mut self, max_scroll_percent: f64) {
        let sessions = self.session_count.max(1) as f64;
        let prev = self.avg_scroll_depth as f64;
        let avg = (prev * (sessions - 1.0) + max_scroll_percent) / sessions;
        self.avg_scroll_depth = avg.round().clamp(0.0, 100.0) as u32;
    }

    pub fn add_time_spent(&mut self, seconds: u64) {
        self.total_time_spent += seconds;
        self.last_session_duration = seconds;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormInteraction {
    pub booking_submissions: u64,
    pub modal_opens: u64,
    pub cta_clicks: u64,
    /// Milliseconds since the unix epoch
    pub last_booking_attempt: Option<i64>,
}

/// Aggregated read of everything tracked for the visitor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserStats {
    pub visits: u64,
    pub last_visit: Option<String>,
    pub referrer: Option<String>,
    pub habits: Habits,
    pub page_views: Vec<PageView>,
    pub form_interactions: FormInteraction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_slot_boundaries() {
        assert_eq!(TimeSlot::from_hour(0), TimeSlot::Night);
        assert_eq!(TimeSlot::from_hour(5), TimeSlot::Night);
        assert_eq!(TimeSlot::from_hour(6), TimeSlot::Morning);
        assert_eq!(TimeSlot::from_hour(12), TimeSlot::Afternoon);
        assert_eq!(TimeSlot::from_hour(18), TimeSlot::Evening);
        assert_eq!(TimeSlot::from_hour(23), TimeSlot::Evening);
    }

    #[test]
    fn test_device_boundary() {
        assert_eq!(DeviceType::from_viewport_width(768, 768), DeviceType::Mobile);
        assert_eq!(DeviceType::from_viewport_width(769, 768), DeviceType::Desktop);
    }

    #[test]
    fn test_scroll_depth_running_mean() {
        let mut habits = Habits {
            session_count: 1,
            ..Default::default()
        };
        habits.fold_scroll_depth(80.0);
        assert_eq!(habits.avg_scroll_depth, 80);

        habits.session_count = 2;
        habits.fold_scroll_depth(40.0);
        assert_eq!(habits.avg_scroll_depth, 60);
    }

    #[test]
    fn test_habits_accept_legacy_partial_json() {
        let habits: Habits =
            serde_json::from_str(r#"{"preferredTime":{"morning":2},"sessionCount":3}"#).unwrap();
        assert_eq!(habits.preferred_time.morning, 2);
        assert_eq!(habits.preferred_time.night, 0);
        assert_eq!(habits.session_count, 3);
        assert_eq!(habits.total_time_spent, 0);
    }

    #[test]
    fn test_page_view_missing_keys_default() {
        let views: Vec<PageView> =
            serde_json::from_str(r#"[{"page":"/","count":2},{"page":"/uk"}]"#).unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].first_visit, 0);
        assert_eq!(views[1].count, 0);
    }
}
