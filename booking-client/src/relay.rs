// booking-client/src/relay.rs
use async_trait::async_trait;
use common::RelayConfig;
use reqwest::{header, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use crate::error::RelayError;

/// Body returned by the form relay
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RelayResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Outbound target for booking submissions
#[async_trait]
pub trait FormRelay: Send + Sync {
    /// Post one form-encoded submission. Anything but a confirmed success is an error.
    async fn submit(&self, form: &[(String, String)]) -> Result<RelayResponse, RelayError>;
}

/// Form relay reached over HTTP
pub struct HttpRelay {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRelay {
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl FormRelay for HttpRelay {
    async fn submit(&self, form: &[(String, String)]) -> Result<RelayResponse, RelayError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .map_err(RelayError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(RelayError::Transport)?;
        classify(status, &body)
    }
}

/// Map a relay reply to its outcome. Only a 2xx answer with `success: true` counts.
pub fn classify(status: StatusCode, body: &str) -> Result<RelayResponse, RelayError> {
    if !status.is_success() {
        return Err(RelayError::Status(status.as_u16()));
    }

    let reply: RelayResponse = serde_json::from_str(body).map_err(RelayError::Decode)?;
    if !reply.success {
        return Err(RelayError::Rejected {
            message: reply.message.unwrap_or_default(),
        });
    }

    Ok(reply)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

/// Submit with a fixed backoff between attempts. Not cancellable once started.
pub async fn submit_with_retry(
    relay: &dyn FormRelay,
    form: &[(String, String)],
    policy: &RetryPolicy,
) -> Result<RelayResponse, RelayError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match relay.submit(form).await {
            Ok(response) => {
                tracing::info!("Booking relayed on attempt {}", attempt);
                return Ok(response);
            }
            Err(e) if attempt < max_attempts => {
                tracing::warn!(
                    "Relay attempt {}/{} failed: {}. Retrying in {:?}",
                    attempt,
                    max_attempts,
                    e,
                    policy.backoff
                );
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!("Relay failed after {} attempt(s): {}", attempt, e);
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Scripted {
        replies: Mutex<VecDeque<Result<RelayResponse, RelayError>>>,
        calls: Mutex<u32>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<RelayResponse, RelayError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl FormRelay for Scripted {
        async fn submit(&self, _form: &[(String, String)]) -> Result<RelayResponse, RelayError> {
            *self.calls.lock().unwrap() += 1;
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(RelayError::Status(500)))
        }
    }

    fn ok() -> Result<RelayResponse, RelayError> {
        Ok(RelayResponse {
            success: true,
            message: None,
        })
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_first_attempt_success_is_not_retried() {
        let relay = Scripted::new(vec![ok()]);
        assert!(submit_with_retry(&relay, &[], &policy(2)).await.is_ok());
        assert_eq!(relay.calls(), 1);
    }

    #[tokio::test]
    async fn test_retry_once_then_succeed() {
        let relay = Scripted::new(vec![Err(RelayError::Status(502)), ok()]);
        assert!(submit_with_retry(&relay, &[], &policy(2)).await.is_ok());
        assert_eq!(relay.calls(), 2);
    }

    #[tokio::test]
    async fn test_attempts_are_capped() {
        let relay = Scripted::new(vec![
            Err(RelayError::Rejected { message: "bad key".to_string() }),
            Err(RelayError::Status(503)),
            ok(),
        ]);
        let result = submit_with_retry(&relay, &[], &policy(2)).await;
        assert!(matches!(result, Err(RelayError::Status(503))));
        assert_eq!(relay.calls(), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let relay = Scripted::new(vec![ok()]);
        assert!(submit_with_retry(&relay, &[], &policy(0)).await.is_ok());
        assert_eq!(relay.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_is_waited() {
        let relay = Scripted::new(vec![Err(RelayError::Status(500)), ok()]);
        let started = tokio::time::Instant::now();
        let policy = RetryPolicy {
            max_attempts: 2,
            backoff: Duration::from_secs(2),
        };
        submit_with_retry(&relay, &[], &policy).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[test]
    fn test_classify_success() {
        let reply = classify(
            StatusCode::OK,
            r#"{"success":true,"message":"Email sent successfully!"}"#,
        )
        .unwrap();
        assert!(reply.success);
        assert_eq!(reply.message.as_deref(), Some("Email sent successfully!"));
    }

    #[test]
    fn test_classify_refused_submission() {
        let result = classify(StatusCode::OK, r#"{"success":false,"message":"x"}"#);
        assert!(matches!(result, Err(RelayError::Rejected { ref message }) if message == "x"));
    }

    #[test]
    fn test_classify_error_status_ignores_body() {
        let result = classify(StatusCode::BAD_GATEWAY, r#"{"success":true}"#);
        assert!(matches!(result, Err(RelayError::Status(502))));
    }

    #[test]
    fn test_classify_unreadable_body() {
        let result = classify(StatusCode::OK, "<html>maintenance</html>");
        assert!(matches!(result, Err(RelayError::Decode(_))));
    }

    #[test]
    fn test_response_without_message() {
        let body: RelayResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!body.success);
        assert_eq!(body.message, None);
    }
}
