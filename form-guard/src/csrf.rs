// form-guard/src/csrf.rs
use chrono::{DateTime, Duration, TimeZone, Utc};
use common::{generate_hex_token, Clock, GuardConfig, SessionStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// 256 bits of entropy
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

// Stored shape in session storage; expiry in unix millis
#[derive(Serialize, Deserialize)]
struct StoredToken {
    token: String,
    expiry: i64,
}

/// Session-scoped anti-replay token, regenerated lazily once expired
pub struct CsrfTokenCache {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    key: String,
    ttl: Duration,
}

impl CsrfTokenCache {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>, config: &GuardConfig) -> Self {
        Self {
            store,
            clock,
            key: config.csrf_token_name.clone(),
            ttl: Duration::seconds(config.csrf_token_ttl_secs),
        }
    }

    /// Cached token while it is still valid, otherwise a fresh one
    pub fn get_token(&self) -> CsrfToken {
        match self.cached() {
            Some(token) => token,
            None => self.refresh(),
        }
    }

    /// Unconditionally generate and cache a new token
    pub fn refresh(&self) -> CsrfToken {
        let token = CsrfToken {
            value: generate_hex_token(TOKEN_BYTES),
            expires_at: self.clock.now() + self.ttl,
        };

        let stored = StoredToken {
            token: token.value.clone(),
            expiry: token.expires_at.timestamp_millis(),
        };
        let written = serde_json::to_string(&stored)
            .map_err(|e| e.to_string())
            .and_then(|json| self.store.set(&self.key, &json).map_err(|e| e.to_string()));
        if let Err(e) = written {
            // The token is still usable for this request, it just won't be reused
            tracing::debug!("Could not cache CSRF token: {}", e);
        }

        token
    }

    fn cached(&self) -> Option<CsrfToken> {
        let raw = self.store.get(&self.key).ok().flatten()?;
        let stored: StoredToken = serde_json::from_str(&raw).ok()?;
        if self.clock.now_millis() >= stored.expiry {
            return None;
        }
        let expires_at = Utc.timestamp_millis_opt(stored.expiry).single()?;

        Some(CsrfToken {
            value: stored.token,
            expires_at,
        })
    }
}
