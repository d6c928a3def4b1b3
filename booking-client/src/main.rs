// booking-client/src/main.rs
//! Headless page session: runs the consent banner and tracking for one page
//! load against a `Cookie` header, optionally submits a booking, and prints
//! the resulting `Set-Cookie` headers.
use actix::Actor;
use booking_client::consent_log::{ConsentLogger, Flush};
use booking_client::{BookingPage, HttpRelay, PageStores};
use common::models::booking::BookingFields;
use common::{setup_tracing, Clock, CookieJarStore, MemorySessionStore, SessionStore, SiteConfig, SystemClock};
use consent_store::{BannerAction, BannerState, PageVisit};
use std::collections::BTreeMap;
use std::env;
use std::io;
use std::sync::Arc;

#[actix::main]
async fn main() -> io::Result<()> {
    setup_tracing();

    let config = SiteConfig::from_env();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let cookie_header = env::var("PAGE_COOKIES").unwrap_or_default();
    let cookies = Arc::new(CookieJarStore::from_cookie_header(
        &cookie_header,
        clock.clone(),
        config.consent.secure_cookies,
    ));

    let session = Arc::new(MemorySessionStore::new());
    if let Ok(theme) = env::var("THEME") {
        if let Err(e) = session.set("theme", &theme) {
            tracing::warn!("Could not record theme preference: {}", e);
        }
    }

    let mut visit = PageVisit::new(
        env::var("PAGE_PATH").unwrap_or_else(|_| "/".to_string()),
        env::var("VIEWPORT_WIDTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1280),
    );
    if let Ok(referrer) = env::var("PAGE_REFERRER") {
        visit = visit.with_referrer(referrer);
    }

    let stores = PageStores {
        cookies: cookies.clone(),
        session: session.clone(),
        preferences: session,
        clock,
    };
    let relay = Arc::new(HttpRelay::new(&config.relay));
    let mut page = BookingPage::new(&config, stores, relay, visit)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let logger = ConsentLogger::default().start();
    page.subscribe(logger.clone().recipient());

    if page.load() == BannerState::Shown {
        tracing::info!("Consent banner shown");
        match env::var("CONSENT_CHOICE").as_deref() {
            Ok("necessary") => {
                page.choose(BannerAction::AcceptNecessary);
            }
            Ok("rejected") => {
                page.choose(BannerAction::RejectAll);
            }
            _ => tracing::info!("No consent decision made this session"),
        }
    }

    // Optional booking read from a JSON file
    if let Some(path) = env::args().nth(1) {
        let raw = tokio::fs::read_to_string(&path).await?;
        let posted: BTreeMap<String, String> = serde_json::from_str(&raw)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let fields = BookingFields::from_form(posted, &config.guard.honeypot_field);

        page.open_booking_form();
        // Give the form the time a person would take to review it
        tokio::time::sleep(config.guard.min_fill_time()).await;

        match page.submit_booking(&fields).await {
            Ok(()) => tracing::info!("Booking submitted"),
            Err(e) => tracing::warn!("Booking not sent: {}", e),
        }
    }

    page.unload();

    for header in cookies.set_cookie_headers() {
        println!("Set-Cookie: {}", header);
    }

    // Consent changes queued before this point are logged before exit
    match logger.send(Flush).await {
        Ok(count) => tracing::debug!("{} consent change(s) logged", count),
        Err(e) => tracing::warn!("Consent logger stopped early: {}", e),
    }

    Ok(())
}
