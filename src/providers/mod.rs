//! Backend adapters: one per multimodal classification API.
//!
//! Every adapter implements [`Classifier`], the same four-argument call
//! (`api_key`, `instruction`, `pages`, `model`) returning a trimmed label.
//! What differs per backend (endpoint, auth header, where the system
//! directive goes, how images are wrapped, where the answer text lives) is
//! private to the adapter module, so the [`crate::dispatch::Dispatcher`]
//! never branches on backend.
//!
//! Adapters do not retry, back off, or recover partial responses: transport,
//! auth and rate-limit failures come back as [`BackendError`] unchanged.

pub mod anthropic;
pub mod gemini;
pub mod openai;

pub use anthropic::AnthropicClassifier;
pub use gemini::GeminiClassifier;
pub use openai::OpenAiClassifier;

use crate::error::{BackendError, ClassifyError};
use crate::pipeline::encode::EncodedPage;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Longest slice of an error body kept in a [`BackendError`].
const ERROR_BODY_LIMIT: usize = 300;

/// A backend that can turn page images plus an instruction into a label.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Identifier this adapter is registered under (e.g. `"openai"`).
    fn backend_id(&self) -> &str;

    /// Ask the backend for a label.
    ///
    /// `pages` are attached in order to the same user turn as `instruction`.
    /// Returns the first text the backend produced, trimmed; an empty string
    /// if it produced none.
    async fn classify(
        &self,
        api_key: &str,
        instruction: &str,
        pages: &[EncodedPage],
        model: &str,
    ) -> Result<String, BackendError>;
}

/// HTTP client shared by all adapters of a run.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    timeout_secs: u64,
}

impl HttpClient {
    /// Build a client whose every request is bounded by `timeout_secs`
    /// (0 = no timeout).
    pub fn new(timeout_secs: u64) -> Result<Self, ClassifyError> {
        let mut builder = reqwest::Client::builder();
        if timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let inner = builder
            .build()
            .map_err(|e| ClassifyError::HttpClient(e.to_string()))?;
        Ok(Self {
            inner,
            timeout_secs,
        })
    }

    /// POST `body` as JSON and decode a JSON response.
    ///
    /// Non-2xx statuses are mapped by [`status_error`]; a 2xx body that does
    /// not decode as `R` is a [`BackendError::MalformedResponse`].
    pub(crate) async fn post_json<B, R>(
        &self,
        backend: &str,
        url: &str,
        headers: &[(&str, &str)],
        body: &B,
    ) -> Result<R, BackendError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.inner.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(backend, e))?;

        let status = response.status();
        debug!("{} responded HTTP {}", backend, status.as_u16());

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string);
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(
                backend,
                status.as_u16(),
                retry_after.as_deref(),
                &text,
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(backend, e))?;

        serde_json::from_str(&text).map_err(|e| BackendError::MalformedResponse {
            backend: backend.to_string(),
            detail: e.to_string(),
        })
    }

    fn transport_error(&self, backend: &str, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout {
                backend: backend.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            BackendError::Transport {
                backend: backend.to_string(),
                detail: e.to_string(),
            }
        }
    }
}

/// Map a non-success HTTP status to a [`BackendError`].
pub fn status_error(
    backend: &str,
    status: u16,
    retry_after: Option<&str>,
    body: &str,
) -> BackendError {
    let detail = truncate_body(body);
    match status {
        401 | 403 => BackendError::Auth {
            backend: backend.to_string(),
            detail,
        },
        429 => BackendError::RateLimited {
            backend: backend.to_string(),
            retry_after_secs: retry_after.and_then(|v| v.trim().parse().ok()),
        },
        _ => BackendError::Api {
            backend: backend.to_string(),
            status,
            message: detail,
        },
    }
}

fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => format!("{}\u{2026}", &body[..idx]),
        None => body.to_string(),
    }
}

/// Join a base URL and a path without doubling slashes.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses() {
        for status in [401, 403] {
            let e = status_error("openai", status, None, "invalid key");
            assert!(
                matches!(e, BackendError::Auth { ref detail, .. } if detail == "invalid key"),
                "{status}: {e:?}"
            );
        }
    }

    #[test]
    fn rate_limit_reads_retry_after() {
        let e = status_error("anthropic", 429, Some(" 12 "), "slow down");
        assert!(matches!(
            e,
            BackendError::RateLimited {
                retry_after_secs: Some(12),
                ..
            }
        ));

        let e = status_error("anthropic", 429, Some("Wed, 21 Oct 2015 07:28:00 GMT"), "");
        assert!(matches!(
            e,
            BackendError::RateLimited {
                retry_after_secs: None,
                ..
            }
        ));
    }

    #[test]
    fn other_statuses_are_api_errors_with_truncated_body() {
        let body = "x".repeat(1000);
        let e = status_error("gemini", 500, None, &body);
        match e {
            BackendError::Api {
                status, message, ..
            } => {
                assert_eq!(status, 500);
                assert_eq!(message.chars().count(), ERROR_BODY_LIMIT + 1);
                assert!(message.ends_with('\u{2026}'));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn join_url_normalises_slashes() {
        assert_eq!(
            join_url("https://api.openai.com/v1/", "/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(join_url("http://h:1", "messages"), "http://h:1/messages");
    }

    #[test]
    fn client_builds_with_and_without_timeout() {
        assert!(HttpClient::new(0).is_ok());
        assert!(HttpClient::new(30).is_ok());
    }
}
