// booking-client/src/error.rs
use form_guard::RejectReason;
use thiserror::Error;

/// One failed attempt against the form relay
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("relay request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("relay answered with HTTP {0}")]
    Status(u16),

    #[error("relay refused the submission: {message}")]
    Rejected { message: String },

    #[error("relay response was not understood: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Visible outcome of a booking attempt. Display text is shown to the visitor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("{0}")]
    Rejected(#[from] RejectReason),

    #[error("Please fill in all required fields.")]
    MissingField(Vec<&'static str>),

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Sorry, we could not send your booking. Please contact us directly at {contact_email}.")]
    Failed { contact_email: String },
}
