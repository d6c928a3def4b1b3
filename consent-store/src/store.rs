// consent-store/src/store.rs
use actix::Recipient;
use common::models::analytics::{
    DeviceType, FormInteraction, Habits, PageView, TimeSlot, UserStats,
};
use common::models::consent::{ConsentChoice, ConsentType};
use common::{
    fits_in_cookie, generate_session_id, Clock, ConsentConfig, CookieSpec, CookieStore,
    PreferenceSource, StorageError,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use crate::events::{ConsentBroadcaster, ConsentChanged};
use crate::tracking::{DeferredWriters, PageVisit, ScrollSample};

/// Single source of truth for tracking consent, and the only writer of
/// persisted preference and analytics cookies.
///
/// Storage failures never escape: a failed read is an absent value and a
/// failed write is logged and dropped. Every aggregate update reads the
/// currently persisted value first, so writers from other tabs or deferred
/// handlers are extended rather than overwritten.
pub struct ConsentStore {
    config: ConsentConfig,
    cookies: Arc<dyn CookieStore>,
    preferences: Arc<dyn PreferenceSource>,
    clock: Arc<dyn Clock>,
    broadcaster: ConsentBroadcaster,
    deferred: Option<DeferredWriters>,
}

impl ConsentStore {
    pub fn new(
        config: ConsentConfig,
        cookies: Arc<dyn CookieStore>,
        preferences: Arc<dyn PreferenceSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            cookies,
            preferences,
            clock,
            broadcaster: ConsentBroadcaster::default(),
            deferred: None,
        }
    }

    pub fn subscribe(&mut self, recipient: Recipient<ConsentChanged>) {
        self.broadcaster.subscribe(recipient);
    }

    // ---- consent record ----

    pub fn consent_type(&self) -> ConsentType {
        let stored = self.read_raw(&self.config.consent_cookie);
        ConsentType::from(stored.as_deref().and_then(ConsentChoice::from_stored))
    }

    pub fn has_consent(&self) -> bool {
        self.consent_type().is_decided()
    }

    fn tracking_allowed(&self) -> bool {
        self.consent_type() == ConsentType::NecessaryOnly
    }

    pub fn save_consent(&mut self, choice: ConsentChoice) {
        match choice {
            ConsentChoice::NecessaryOnly => {
                self.write_raw(&self.config.consent_cookie, choice.as_str());
                self.provision_necessary_cookies();
            }
            ConsentChoice::Rejected => {
                self.deferred = None;
                self.delete_analytics();
                // Written last so the cleanup above can never remove it
                self.write_raw(&self.config.consent_cookie, choice.as_str());
            }
        }

        tracing::info!("Cookie consent saved: {}", choice);
        self.broadcaster.broadcast(ConsentType::from(Some(choice)));
    }

    /// Forget the decision and everything written under it
    pub fn revoke_consent(&mut self) {
        self.deferred = None;
        self.delete(&self.config.consent_cookie);
        self.delete_analytics();
        self.delete(&self.config.theme_cookie);
        self.delete(&self.config.session_cookie);

        tracing::info!("Cookie consent revoked");
        self.broadcaster.broadcast(ConsentType::Undecided);
    }

    /// Theme and session cookies. The session id is reused until it expires.
    pub fn provision_necessary_cookies(&self) {
        if !self.tracking_allowed() {
            return;
        }

        let theme = self
            .preferences
            .theme()
            .unwrap_or_else(|| self.config.default_theme.clone());
        self.write_raw(&self.config.theme_cookie, &theme);

        if self.read_raw(&self.config.session_cookie).is_none() {
            let session_id = generate_session_id(self.clock.now_millis());
            self.write_raw(&self.config.session_cookie, &session_id);
        }
    }

    pub fn session_id(&self) -> Option<String> {
        self.read_raw(&self.config.session_cookie)
    }

    // ---- tracking ----

    pub fn init_tracking(&mut self, visit: &PageVisit) {
        if !self.tracking_allowed() {
            tracing::debug!("Tracking skipped, consent is {:?}", self.consent_type());
            return;
        }

        let analytics = self.config.analytics.clone();
        let now = self.clock.now();

        let visits = self.read_visit_count() + 1;
        self.write_raw(&analytics.visit_count, &visits.to_string());
        self.write_raw(&analytics.last_visit, &now.to_rfc3339());

        // First touch only
        if let Some(referrer) = visit.referrer.as_deref().filter(|r| !r.is_empty()) {
            if self.read_raw(&analytics.referrer).is_none() {
                self.write_raw(&analytics.referrer, referrer);
            }
        }

        self.track_page_view(&visit.path);

        let slot = TimeSlot::from_hour(self.clock.local_hour());
        let device = DeviceType::from_viewport_width(visit.viewport_width, self.config.mobile_max_width);
        self.update_json(&analytics.habits, |habits: &mut Habits| {
            habits.preferred_time.record(slot);
            habits.device_type.record(device);
            habits.session_count += 1;
        });

        // Any writers from an earlier initialisation are torn down here
        self.deferred = Some(DeferredWriters::arm(now));
    }

    fn track_page_view(&self, path: &str) {
        let now_ms = self.clock.now_millis();
        let max = self.config.max_page_views;
        let name = self.config.analytics.page_views.name.clone();

        self.update_json(&self.config.analytics.page_views, |views: &mut Vec<PageView>| {
            match views.iter_mut().find(|v| v.page == path) {
                Some(view) => {
                    view.count += 1;
                    view.last_visit = now_ms;
                }
                None => views.push(PageView {
                    page: path.to_string(),
                    count: 1,
                    first_visit: now_ms,
                    last_visit: now_ms,
                }),
            }
            if views.len() > max {
                let excess = views.len() - max;
                views.drain(..excess);
            }
            // Long paths can overflow the cookie before the count cap is reached
            while views.len() > 1 && !page_views_fit(&name, views) {
                views.remove(0);
            }
        });
    }

    pub fn has_deferred_writers(&self) -> bool {
        self.deferred.is_some()
    }

    pub fn on_scroll(&mut self, sample: ScrollSample) {
        if let Some(deferred) = self.deferred.as_mut() {
            deferred.scroll.observe(sample);
        }
    }

    /// Fire the deferred writers. Each re-checks consent and re-reads habits.
    pub fn on_page_unload(&mut self) {
        let Some(deferred) = self.deferred.take() else {
            return;
        };
        let habits_cookie = self.config.analytics.habits.clone();

        if self.tracking_allowed() {
            self.update_json(&habits_cookie, |habits: &mut Habits| {
                deferred.scroll.apply(habits);
            });
        }

        if self.tracking_allowed() {
            let now = self.clock.now();
            self.update_json(&habits_cookie, |habits: &mut Habits| {
                deferred.time_on_page.apply(habits, now);
            });
        }
    }

    pub fn record_booking_submission(&self) {
        if !self.tracking_allowed() {
            return;
        }
        let now_ms = self.clock.now_millis();
        self.update_json(&self.config.analytics.form_interaction, |f: &mut FormInteraction| {
            f.booking_submissions += 1;
            f.last_booking_attempt = Some(now_ms);
        });
    }

    pub fn record_modal_open(&self) {
        if !self.tracking_allowed() {
            return;
        }
        self.update_json(&self.config.analytics.form_interaction, |f: &mut FormInteraction| {
            f.modal_opens += 1;
        });
    }

    pub fn record_cta_click(&self) {
        if !self.tracking_allowed() {
            return;
        }
        self.update_json(&self.config.analytics.form_interaction, |f: &mut FormInteraction| {
            f.cta_clicks += 1;
        });
    }

    /// Everything tracked so far; `None` once the visitor rejected tracking
    pub fn user_stats(&self) -> Option<UserStats> {
        if self.consent_type() == ConsentType::Rejected {
            return None;
        }

        let analytics = &self.config.analytics;
        Some(UserStats {
            visits: self.read_visit_count(),
            last_visit: self.read_raw(&analytics.last_visit),
            referrer: self.read_raw(&analytics.referrer),
            habits: self.read_json(&analytics.habits),
            page_views: self.read_json(&analytics.page_views),
            form_interactions: self.read_json(&analytics.form_interaction),
        })
    }

    // ---- persistence helpers ----

    fn read_visit_count(&self) -> u64 {
        self.read_raw(&self.config.analytics.visit_count)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    fn read_raw(&self, spec: &CookieSpec) -> Option<String> {
        match self.cookies.get(&spec.name) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Failed to read cookie {}: {}", spec.name, e);
                None
            }
        }
    }

    fn write_raw(&self, spec: &CookieSpec, value: &str) {
        if let Err(e) = self.cookies.set(&spec.name, value, spec.expiry_days) {
            tracing::warn!("Failed to set cookie {}: {}", spec.name, e);
        }
    }

    fn delete(&self, spec: &CookieSpec) {
        if let Err(e) = self.cookies.delete(&spec.name) {
            tracing::warn!("Failed to delete cookie {}: {}", spec.name, e);
        }
    }

    fn delete_analytics(&self) {
        for spec in self.config.analytics.all() {
            self.delete(spec);
        }
    }

    /// Parse a persisted aggregate, defaulting when absent or malformed
    fn read_json<T: DeserializeOwned + Default>(&self, spec: &CookieSpec) -> T {
        let Some(raw) = self.read_raw(spec) else {
            return T::default();
        };
        parse_json(&spec.name, &raw).unwrap_or_else(|e| {
            tracing::debug!("Discarding cookie: {}", e);
            T::default()
        })
    }

    /// Read, modify and write back one aggregate
    fn update_json<T, F>(&self, spec: &CookieSpec, modify: F)
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T),
    {
        let mut value: T = self.read_json(spec);
        modify(&mut value);
        match serde_json::to_string(&value) {
            Ok(json) => self.write_raw(spec, &json),
            Err(e) => tracing::warn!("Failed to encode cookie {}: {}", spec.name, e),
        }
    }
}

fn parse_json<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Malformed {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn page_views_fit(name: &str, views: &[PageView]) -> bool {
    serde_json::to_string(views)
        .map(|json| fits_in_cookie(name, &json))
        .unwrap_or(false)
}
