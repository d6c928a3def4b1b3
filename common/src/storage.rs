// common/src/storage.rs
use chrono::Duration;
use cookie::{Cookie, CookieJar, SameSite};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use crate::clock::Clock;
use crate::error::StorageError;

// Browsers refuse cookies whose encoded name and value exceed this many bytes
const MAX_COOKIE_BYTES: usize = 4096;

/// Whether `name=value` fits the browser limit once percent-encoded for `Set-Cookie`
pub fn fits_in_cookie(name: &str, value: &str) -> bool {
    Cookie::new(name, value).encoded().to_string().len() <= MAX_COOKIE_BYTES
}

/// Small, expiring, same-origin key-value entries readable by future page loads
pub trait CookieStore: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, name: &str, value: &str, expiry_days: i64) -> Result<(), StorageError>;
    fn delete(&self, name: &str) -> Result<(), StorageError>;
}

/// Storage that lives for the browser session and is shared across the site's pages
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Where the visitor's display preferences already live before consent is given
pub trait PreferenceSource: Send + Sync {
    fn theme(&self) -> Option<String>;
}

/// Cookie storage backed by a `CookieJar`.
///
/// Expiry is evaluated against the injected clock on every read, so an expired
/// entry reads as absent without needing a cleanup pass.
pub struct CookieJarStore {
    jar: Mutex<CookieJar>,
    clock: Arc<dyn Clock>,
    secure: bool,
}

impl CookieJarStore {
    pub fn new(clock: Arc<dyn Clock>, secure: bool) -> Self {
        Self {
            jar: Mutex::new(CookieJar::new()),
            clock,
            secure,
        }
    }

    /// Seed the jar from an incoming `Cookie` request header
    pub fn from_cookie_header(header: &str, clock: Arc<dyn Clock>, secure: bool) -> Self {
        let mut jar = CookieJar::new();
        for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            match Cookie::parse_encoded(pair.to_string()) {
                Ok(cookie) => jar.add_original(cookie),
                Err(e) => tracing::debug!("Skipping unparsable cookie pair: {}", e),
            }
        }

        Self {
            jar: Mutex::new(jar),
            clock,
            secure,
        }
    }

    /// `Set-Cookie` header values for every change made since the jar was created
    pub fn set_cookie_headers(&self) -> Vec<String> {
        match self.jar.lock() {
            Ok(jar) => jar.delta().map(|c| c.encoded().to_string()).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn is_live(&self, cookie: &Cookie<'_>) -> bool {
        match cookie.expires_datetime() {
            Some(expires) => expires.unix_timestamp() > self.clock.now().timestamp(),
            None => true,
        }
    }
}

impl CookieStore for CookieJarStore {
    fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        let jar = self.jar.lock().map_err(|_| StorageError::Unavailable)?;
        Ok(jar
            .get(name)
            .filter(|c| self.is_live(c))
            .map(|c| c.value().to_string()))
    }

    fn set(&self, name: &str, value: &str, expiry_days: i64) -> Result<(), StorageError> {
        if !fits_in_cookie(name, value) {
            return Err(StorageError::QuotaExceeded(name.to_string()));
        }

        let expires_at = self.clock.now() + Duration::days(expiry_days);
        let expires = OffsetDateTime::from_unix_timestamp(expires_at.timestamp())
            .map_err(|_| StorageError::Unavailable)?;

        let cookie = Cookie::build(name.to_string(), value.to_string())
            .path("/")
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .expires(expires)
            .finish();

        let mut jar = self.jar.lock().map_err(|_| StorageError::Unavailable)?;
        jar.add(cookie);
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        let mut jar = self.jar.lock().map_err(|_| StorageError::Unavailable)?;
        jar.remove(Cookie::build(name.to_string(), "").path("/").finish());
        Ok(())
    }
}

/// Session-scoped storage kept in memory for the life of the process
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: DashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

// Local preferences share the session store's shape; the theme lives under "theme"
impl PreferenceSource for MemorySessionStore {
    fn theme(&self) -> Option<String> {
        self.entries.get("theme").map(|v| v.value().clone())
    }
}
