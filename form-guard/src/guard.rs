// form-guard/src/guard.rs
use chrono::{DateTime, Duration, Utc};
use common::{Clock, GuardConfig};
use std::sync::Arc;
use crate::error::RejectReason;
use crate::rate_limiter::RateLimitWindow;
use crate::sanitize::is_input_safe;

/// What the visitor submitted, as seen by the guard
#[derive(Debug, Clone, Copy)]
pub struct SubmissionContext<'a> {
    /// Visible fields keyed by form name
    pub fields: &'a [(String, String)],
    /// Value of the hidden honeypot field
    pub honeypot: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    /// Bot detected. The caller must behave exactly as if the submission succeeded.
    SilentReject,
    VisibleReject(RejectReason),
}

/// Per-page submission defenses.
///
/// Checks run in a fixed order and the first failure wins: rate limit,
/// honeypot, fill time, content safety, then field lengths. The honeypot must
/// run before every check that fails visibly.
pub struct FormGuard {
    config: GuardConfig,
    clock: Arc<dyn Clock>,
    window: RateLimitWindow,
    form_opened_at: Option<DateTime<Utc>>,
}

impl FormGuard {
    pub fn new(config: GuardConfig, clock: Arc<dyn Clock>) -> Self {
        let window = RateLimitWindow::from_config(&config);
        Self {
            config,
            clock,
            window,
            form_opened_at: None,
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Mark the form as just opened; resets the fill-time measurement
    pub fn record_form_open(&mut self) {
        self.form_opened_at = Some(self.clock.now());
    }

    /// Record a submission the relay confirmed
    pub fn record_submission(&mut self) {
        self.window.record(self.clock.now());
    }

    pub fn submissions_in_window(&self) -> usize {
        self.window.count_in_window(self.clock.now())
    }

    pub fn is_rate_limited(&self) -> bool {
        self.window.is_rate_limited(self.clock.now())
    }

    pub fn is_honeypot_triggered(&self, ctx: &SubmissionContext<'_>) -> bool {
        !ctx.honeypot.is_empty()
    }

    /// True when the form was opened less than the minimum fill time ago.
    /// A form that was never opened has nothing to measure.
    pub fn is_submission_too_fast(&self) -> bool {
        match self.form_opened_at {
            Some(opened) => {
                self.clock.now().signed_duration_since(opened)
                    < Duration::milliseconds(self.config.min_fill_time_ms)
            }
            None => false,
        }
    }

    pub fn check(&self, ctx: &SubmissionContext<'_>) -> Outcome {
        let now = self.clock.now();

        if self.window.is_rate_limited(now) {
            let wait_minutes = self.window.wait_minutes(now);
            tracing::info!("Submission rate limited for {} more minute(s)", wait_minutes);
            return Outcome::VisibleReject(RejectReason::RateLimited { wait_minutes });
        }

        if self.is_honeypot_triggered(ctx) {
            tracing::warn!("Security: Honeypot triggered");
            return Outcome::SilentReject;
        }

        if self.is_submission_too_fast() {
            tracing::warn!("Security: Submission too fast");
            return Outcome::VisibleReject(RejectReason::TooFast);
        }

        if let Some((field, _)) = ctx.fields.iter().find(|(_, value)| !is_input_safe(value)) {
            tracing::warn!("Security: Dangerous input detected in field {}", field);
            return Outcome::VisibleReject(RejectReason::UnsafeContent {
                field: field.clone(),
            });
        }

        let too_long = ctx
            .fields
            .iter()
            .find(|(field, value)| value.chars().count() > self.config.max_length_for(field));
        if let Some((field, _)) = too_long {
            tracing::warn!("Security: Input too long in field {}", field);
            return Outcome::VisibleReject(RejectReason::FieldTooLong {
                field: field.clone(),
            });
        }

        Outcome::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::ManualClock;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn valid_fields() -> Vec<(String, String)> {
        fields(&[
            ("name", "Asha Rao"),
            ("email", "asha@example.com"),
            ("phone", "+91 98765 43210"),
            ("topic", "Masters in Canada"),
        ])
    }

    fn guard() -> (Arc<ManualClock>, FormGuard) {
        let clock = Arc::new(ManualClock::at_epoch());
        let guard = FormGuard::new(GuardConfig::default(), clock.clone());
        (clock, guard)
    }

    fn ctx<'a>(fields: &'a [(String, String)], honeypot: &'a str) -> SubmissionContext<'a> {
        SubmissionContext { fields, honeypot }
    }

    #[test]
    fn test_valid_submission_passes() {
        let (clock, mut guard) = guard();
        guard.record_form_open();
        clock.advance(Duration::seconds(5));

        let fields = valid_fields();
        assert_eq!(guard.check(&ctx(&fields, "")), Outcome::Pass);
    }

    #[test]
    fn test_rate_limit_window() {
        let (clock, mut guard) = guard();
        for t in [0, 60, 120] {
            clock.set(DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(t));
            guard.record_submission();
        }
        let fields = valid_fields();

        clock.set(DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(200));
        assert_eq!(
            guard.check(&ctx(&fields, "")),
            Outcome::VisibleReject(RejectReason::RateLimited { wait_minutes: 2 })
        );

        clock.set(DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(310));
        assert_eq!(guard.check(&ctx(&fields, "")), Outcome::Pass);
    }

    #[test]
    fn test_honeypot_is_silent_whatever_else_is_wrong() {
        let (_clock, mut guard) = guard();
        // Opened this instant, so the fill-time check would fail too
        guard.record_form_open();
        let bad = fields(&[("name", "<script>x</script>"), ("phone", &"9".repeat(50))]);

        assert_eq!(guard.check(&ctx(&bad, "http://spam")), Outcome::SilentReject);
        assert_eq!(guard.check(&ctx(&valid_fields(), " ")), Outcome::SilentReject);
    }

    #[test]
    fn test_too_fast() {
        let (clock, mut guard) = guard();
        guard.record_form_open();
        clock.advance(Duration::milliseconds(1999));
        let fields = valid_fields();
        assert_eq!(
            guard.check(&ctx(&fields, "")),
            Outcome::VisibleReject(RejectReason::TooFast)
        );

        clock.advance(Duration::milliseconds(1));
        assert_eq!(guard.check(&ctx(&fields, "")), Outcome::Pass);

        // Reopening restarts the measurement
        guard.record_form_open();
        assert!(guard.is_submission_too_fast());
    }

    #[test]
    fn test_never_opened_form_skips_fill_time() {
        let (_clock, guard) = guard();
        assert!(!guard.is_submission_too_fast());
    }

    #[test]
    fn test_unsafe_content_names_field() {
        let (_clock, guard) = guard();
        let fields = fields(&[("name", "Asha"), ("topic", "<iframe src=x>")]);
        let outcome = guard.check(&ctx(&fields, ""));
        assert_eq!(
            outcome,
            Outcome::VisibleReject(RejectReason::UnsafeContent {
                field: "topic".to_string()
            })
        );
    }

    #[test]
    fn test_length_limits() {
        let (_clock, guard) = guard();

        let ok = fields(&[("name", &"a".repeat(100)), ("education_level", &"b".repeat(500))]);
        assert_eq!(guard.check(&ctx(&ok, "")), Outcome::Pass);

        let long_name = fields(&[("name", &"a".repeat(101))]);
        assert_eq!(
            guard.check(&ctx(&long_name, "")),
            Outcome::VisibleReject(RejectReason::FieldTooLong {
                field: "name".to_string()
            })
        );

        let long_other = fields(&[("education_level", &"b".repeat(501))]);
        assert!(matches!(
            guard.check(&ctx(&long_other, "")),
            Outcome::VisibleReject(RejectReason::FieldTooLong { .. })
        ));

        // Limits count characters, not bytes
        let unicode = fields(&[("phone", &"९".repeat(20))]);
        assert_eq!(guard.check(&ctx(&unicode, "")), Outcome::Pass);
    }

    #[test]
    fn test_unsafe_content_checked_before_length() {
        let (_clock, guard) = guard();
        let fields = fields(&[("name", &format!("<script>{}", "a".repeat(200)))]);
        assert!(matches!(
            guard.check(&ctx(&fields, "")),
            Outcome::VisibleReject(RejectReason::UnsafeContent { .. })
        ));
    }
}
