// form-guard/src/error.rs
use thiserror::Error;

/// Why a submission was refused. The message is shown to the visitor as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("Too many submissions. Please wait {wait_minutes} minute(s) before trying again.")]
    RateLimited { wait_minutes: i64 },

    #[error("Please take a moment to review your information before submitting.")]
    TooFast,

    #[error("Invalid characters detected. Please remove special characters and try again.")]
    UnsafeContent { field: String },

    #[error("The {field} field is too long. Please shorten your input.")]
    FieldTooLong { field: String },
}
