//! Client setup for OpenAI-compatible endpoints.

use crate::error::{Result, VidragError};
use async_openai::{config::OpenAIConfig, error::OpenAIError, Client};
use std::time::Duration;

/// Default timeout for chat and embedding requests (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Create a client for an OpenAI-compatible API with a request timeout.
///
/// `api_base` of `None` keeps the library default (api.openai.com). Failed
/// calls are returned to the caller as-is; the client never retries.
pub fn create_client(
    api_base: Option<&str>,
    api_key: Option<String>,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    let mut config = OpenAIConfig::new();
    if let Some(base) = api_base {
        config = config.with_api_base(base.trim_end_matches('/'));
    }
    if let Some(key) = api_key {
        config = config.with_api_key(key);
    }

    Ok(Client::with_config(config)
        .with_http_client(http_client)
        .with_backoff(no_retry()))
}

/// Backoff policy that gives up after the first attempt.
fn no_retry() -> backoff::ExponentialBackoff {
    backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// Best-effort HTTP status behind an async-openai error.
///
/// API errors carry no status code, so one is inferred from the error type.
pub fn error_status(err: &OpenAIError) -> Option<u16> {
    match err {
        OpenAIError::Reqwest(e) => e.status().map(|s| s.as_u16()),
        OpenAIError::ApiError(api) => match api.r#type.as_deref() {
            Some("rate_limit_exceeded") | Some("rate_limit_error") => Some(429),
            Some("server_error") | Some("overloaded_error") => Some(503),
            _ => Some(400),
        },
        OpenAIError::JSONDeserialize(_) => Some(502),
        _ => Some(400),
    }
}

pub(crate) fn invalid_request(err: OpenAIError) -> VidragError {
    VidragError::Config(format!("Invalid request: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::error::ApiError;

    fn api_error(kind: Option<&str>) -> OpenAIError {
        OpenAIError::ApiError(ApiError {
            message: "nope".to_string(),
            r#type: kind.map(str::to_string),
            param: None,
            code: None,
        })
    }

    #[test]
    fn test_error_status_from_api_error_type() {
        assert_eq!(error_status(&api_error(Some("rate_limit_exceeded"))), Some(429));
        assert_eq!(error_status(&api_error(Some("server_error"))), Some(503));
        assert_eq!(error_status(&api_error(None)), Some(400));
    }

    #[test]
    fn test_backoff_gives_up_immediately() {
        use backoff::backoff::Backoff;

        let mut policy = no_retry();
        assert_eq!(policy.next_backoff(), None);
    }

    #[test]
    fn test_create_client_with_custom_base() {
        let client = create_client(
            Some("https://router.huggingface.co/v1/"),
            Some("hf_test".to_string()),
            Duration::from_secs(5),
        );
        assert!(client.is_ok());
    }
}
