pub mod csrf;
pub mod error;
pub mod guard;
pub mod rate_limiter;
pub mod redirect;
pub mod sanitize;

pub use csrf::{CsrfToken, CsrfTokenCache};
pub use error::RejectReason;
pub use guard::{FormGuard, Outcome, SubmissionContext};
pub use rate_limiter::RateLimitWindow;
pub use redirect::{is_safe_redirect, RedirectPolicy};
pub use sanitize::{is_input_safe, sanitize_form_data, sanitize_input};
