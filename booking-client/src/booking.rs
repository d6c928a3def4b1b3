// booking-client/src/booking.rs
use actix::Recipient;
use common::models::booking::BookingFields;
use common::{Clock, CookieStore, PreferenceSource, RelayConfig, SessionStore, SiteConfig};
use consent_store::{BannerAction, BannerState, ConsentBanner, ConsentChanged, ConsentStore, PageVisit, ScrollSample};
use form_guard::{sanitize_form_data, CsrfTokenCache, FormGuard, Outcome, RedirectPolicy, SubmissionContext};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use crate::error::BookingError;
use crate::relay::{submit_with_retry, FormRelay, RetryPolicy};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

/// Storage areas and clock the page runs against
#[derive(Clone)]
pub struct PageStores {
    pub cookies: Arc<dyn CookieStore>,
    pub session: Arc<dyn SessionStore>,
    pub preferences: Arc<dyn PreferenceSource>,
    pub clock: Arc<dyn Clock>,
}

/// One loaded page: consent banner, tracking and the booking form
pub struct BookingPage {
    consent: ConsentStore,
    banner: ConsentBanner,
    guard: FormGuard,
    csrf: CsrfTokenCache,
    redirects: RedirectPolicy,
    relay: Arc<dyn FormRelay>,
    relay_config: RelayConfig,
    honeypot_field: String,
    visit: PageVisit,
}

impl BookingPage {
    pub fn new(
        config: &SiteConfig,
        stores: PageStores,
        relay: Arc<dyn FormRelay>,
        visit: PageVisit,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            consent: ConsentStore::new(
                config.consent.clone(),
                stores.cookies,
                stores.preferences,
                stores.clock.clone(),
            ),
            banner: ConsentBanner::new(),
            guard: FormGuard::new(config.guard.clone(), stores.clock.clone()),
            csrf: CsrfTokenCache::new(stores.session, stores.clock, &config.guard),
            redirects: RedirectPolicy::new(&config.site_origin)?,
            relay,
            relay_config: config.relay.clone(),
            honeypot_field: config.guard.honeypot_field.clone(),
            visit,
        })
    }

    /// Read-only view of consent state and tracked stats
    pub fn consent(&self) -> &ConsentStore {
        &self.consent
    }

    pub fn subscribe(&mut self, recipient: Recipient<ConsentChanged>) {
        self.consent.subscribe(recipient);
    }

    pub fn load(&mut self) -> BannerState {
        self.banner.on_page_load(&mut self.consent, &self.visit)
    }

    pub fn choose(&mut self, action: BannerAction) -> bool {
        self.banner.choose(action, &mut self.consent, &self.visit)
    }

    pub fn banner_state(&self) -> BannerState {
        self.banner.state()
    }

    pub fn revoke_consent(&mut self) {
        self.banner.revoke(&mut self.consent);
    }

    pub fn on_scroll(&mut self, sample: ScrollSample) {
        self.consent.on_scroll(sample);
    }

    pub fn cta_clicked(&self) {
        self.consent.record_cta_click();
    }

    pub fn unload(&mut self) {
        self.consent.on_page_unload();
    }

    pub fn is_safe_redirect(&self, url: &str) -> bool {
        self.redirects.is_safe(url)
    }

    pub fn submissions_in_window(&self) -> usize {
        self.guard.submissions_in_window()
    }

    pub fn open_booking_form(&mut self) {
        self.guard.record_form_open();
        self.consent.record_modal_open();
    }

    /// Run the guard, then relay the booking.
    ///
    /// `Ok` covers both a relayed booking and a dropped bot submission; the
    /// two must look the same to whoever is filling in the form.
    pub async fn submit_booking(&mut self, fields: &BookingFields) -> Result<(), BookingError> {
        let visible = fields.visible_fields();
        let ctx = SubmissionContext {
            fields: &visible,
            honeypot: &fields.honeypot,
        };

        match self.guard.check(&ctx) {
            Outcome::Pass => {}
            Outcome::SilentReject => return Ok(()),
            Outcome::VisibleReject(reason) => return Err(reason.into()),
        }

        let missing = fields.missing_required();
        if !missing.is_empty() {
            return Err(BookingError::MissingField(missing));
        }
        if !EMAIL.is_match(fields.email.trim()) {
            return Err(BookingError::InvalidEmail);
        }

        self.consent.record_booking_submission();

        let form = self.relay_form(&visible);
        let policy = RetryPolicy::from_config(&self.relay_config);

        match submit_with_retry(self.relay.as_ref(), &form, &policy).await {
            Ok(_) => {
                self.guard.record_submission();
                self.csrf.refresh();
                Ok(())
            }
            Err(_) => Err(BookingError::Failed {
                contact_email: self.relay_config.contact_email.clone(),
            }),
        }
    }

    // Sanitized visible fields plus the relay's own fields. The honeypot never leaves the page.
    fn relay_form(&self, visible: &[(String, String)]) -> Vec<(String, String)> {
        let sanitized = sanitize_form_data(visible);
        let name = sanitized
            .iter()
            .find(|(key, _)| key == "name")
            .map(|(_, value)| value.as_str())
            .unwrap_or_default();

        let mut form = vec![
            ("access_key".to_string(), self.relay_config.access_key.clone()),
            ("subject".to_string(), format!("Consultation Booking: {}", name)),
            ("from_name".to_string(), "NexTep Edu Website".to_string()),
        ];
        form.extend(sanitized.iter().cloned());
        form.push(("csrf_token".to_string(), self.csrf.get_token().value));
        form.retain(|(key, _)| *key != self.honeypot_field);
        form
    }
}
