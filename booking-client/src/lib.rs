pub mod booking;
pub mod consent_log;
pub mod error;
pub mod relay;

pub use booking::{BookingPage, PageStores};
pub use error::{BookingError, RelayError};
pub use relay::{classify, submit_with_retry, FormRelay, HttpRelay, RelayResponse, RetryPolicy};
