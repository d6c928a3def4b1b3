// common/src/config.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use config::{Config as ConfigFile, File, Environment};

/// Central configuration for the consent store, the form guard and the relay client
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Origin that dynamically computed redirects must stay on
    pub site_origin: String,
    pub consent: ConsentConfig,
    pub guard: GuardConfig,
    pub relay: RelayConfig,
}

/// A single persisted cookie: its name and lifetime in days
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CookieSpec {
    pub name: String,
    pub expiry_days: i64,
}

impl CookieSpec {
    fn new(name: &str, expiry_days: i64) -> Self {
        Self {
            name: name.to_string(),
            expiry_days,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsentConfig {
    pub consent_cookie: CookieSpec,
    pub theme_cookie: CookieSpec,
    pub session_cookie: CookieSpec,
    pub analytics: AnalyticsCookies,
    pub max_page_views: usize,
    /// Viewports at or below this width count as mobile
    pub mobile_max_width: u32,
    pub default_theme: String,
    pub secure_cookies: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyticsCookies {
    pub visit_count: CookieSpec,
    pub last_visit: CookieSpec,
    pub habits: CookieSpec,
    pub page_views: CookieSpec,
    pub referrer: CookieSpec,
    pub form_interaction: CookieSpec,
}

impl AnalyticsCookies {
    /// Every analytics cookie, in the order they are cleared
    pub fn all(&self) -> [&CookieSpec; 6] {
        [
            &self.visit_count,
            &self.last_visit,
            &self.habits,
            &self.page_views,
            &self.referrer,
            &self.form_interaction,
        ]
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    pub max_submissions: usize,
    pub rate_limit_window_secs: i64,
    pub min_fill_time_ms: i64,
    pub honeypot_field: String,
    pub max_input_lengths: HashMap<String, usize>,
    pub default_max_length: usize,
    pub csrf_token_name: String,
    pub csrf_token_ttl_secs: i64,
}

impl GuardConfig {
    /// Maximum accepted length for a field, falling back to the default limit
    pub fn max_length_for(&self, field: &str) -> usize {
        self.max_input_lengths
            .get(field)
            .copied()
            .unwrap_or(self.default_max_length)
    }

    /// Minimum fill time as a duration; a negative setting means no wait
    pub fn min_fill_time(&self) -> std::time::Duration {
        std::time::Duration::from_millis(u64::try_from(self.min_fill_time_ms).unwrap_or(0))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub endpoint: String,
    pub access_key: String,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
    /// Shown to the user when the relay cannot be reached
    pub contact_email: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_origin: "https://nextepedu.com".to_string(),
            consent: ConsentConfig::default(),
            guard: GuardConfig::default(),
            relay: RelayConfig::default(),
        }
    }
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            consent_cookie: CookieSpec::new("nextep_cookie_consent", 365),
            theme_cookie: CookieSpec::new("nextep_theme", 365),
            session_cookie: CookieSpec::new("nextep_session", 1),
            analytics: AnalyticsCookies {
                visit_count: CookieSpec::new("nextep_visits", 365),
                last_visit: CookieSpec::new("nextep_last_visit", 365),
                habits: CookieSpec::new("nextep_habits", 30),
                page_views: CookieSpec::new("nextep_page_views", 30),
                referrer: CookieSpec::new("nextep_referrer", 7),
                form_interaction: CookieSpec::new("nextep_form_interaction", 30),
            },
            max_page_views: 20,
            mobile_max_width: 768,
            default_theme: "light".to_string(),
            secure_cookies: true,
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        let max_input_lengths = [
            ("name", 100),
            ("email", 254),
            ("phone", 20),
            ("message", 2000),
            ("topic", 2000),
        ]
        .into_iter()
        .map(|(field, len)| (field.to_string(), len))
        .collect();

        Self {
            max_submissions: 3,
            rate_limit_window_secs: 5 * 60,
            min_fill_time_ms: 2000,
            honeypot_field: "website_url".to_string(),
            max_input_lengths,
            default_max_length: 500,
            csrf_token_name: "nextep_csrf_token".to_string(),
            csrf_token_ttl_secs: 30 * 60,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.web3forms.com/submit".to_string(),
            access_key: String::new(),
            max_attempts: 2,
            retry_backoff_ms: 2000,
            contact_email: "edunextep@gmail.com".to_string(),
        }
    }
}

impl SiteConfig {
    /// Layer `default`, `{RUN_MODE}` and `local` TOML files, then `APP__` variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| site_config_dir());

        tracing::info!(
            "Loading site configuration from {} ({} mode)",
            config_dir.display(),
            run_mode
        );

        let config = ConfigFile::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load from files, falling back to a handful of plain environment variables
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => {
                tracing::info!("Configuration loaded from files and environment");
                config
            },
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to environment variables only");

                let mut config = Self::default();

                if let Ok(origin) = env::var("SITE_ORIGIN") {
                    config.site_origin = origin;
                }
                if let Ok(endpoint) = env::var("RELAY_ENDPOINT") {
                    config.relay.endpoint = endpoint;
                }
                if let Ok(key) = env::var("RELAY_ACCESS_KEY") {
                    config.relay.access_key = key;
                }
                config.relay.retry_backoff_ms = env::var("RELAY_RETRY_BACKOFF_MS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(config.relay.retry_backoff_ms);
                config.consent.secure_cookies = env::var("SECURE_COOKIES")
                    .map(|v| v.to_lowercase() == "true")
                    .unwrap_or(config.consent.secure_cookies);

                config
            }
        }
    }
}

// `config/` next to the binary's working directory, or one level up when run from a member crate
fn site_config_dir() -> PathBuf {
    ["config", "../config"]
        .iter()
        .map(PathBuf::from)
        .find(|dir| dir.join("default.toml").exists())
        .unwrap_or_else(|| PathBuf::from("config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let guard = GuardConfig::default();
        assert_eq!(guard.max_length_for("name"), 100);
        assert_eq!(guard.max_length_for("email"), 254);
        assert_eq!(guard.max_length_for("phone"), 20);
        assert_eq!(guard.max_length_for("message"), 2000);
        assert_eq!(guard.max_length_for("education_level"), 500);
    }

    #[test]
    fn test_negative_fill_time_means_no_wait() {
        let mut guard = GuardConfig::default();
        assert_eq!(guard.min_fill_time(), std::time::Duration::from_secs(2));

        guard.min_fill_time_ms = -5;
        assert_eq!(guard.min_fill_time(), std::time::Duration::ZERO);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: SiteConfig = ConfigFile::builder()
            .add_source(config::File::from_str(
                "site_origin = \"https://example.org\"\n[relay]\naccess_key = \"abc\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.site_origin, "https://example.org");
        assert_eq!(config.relay.access_key, "abc");
        assert_eq!(config.relay.max_attempts, 2);
        assert_eq!(config.guard.max_submissions, 3);
        assert_eq!(config.consent.analytics.page_views.name, "nextep_page_views");
    }
}
