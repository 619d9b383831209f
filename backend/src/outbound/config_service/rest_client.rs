//! Shared JSON-over-HTTP client for outbound REST calls.
//!
//! One [`RestClient`] is built at startup and cloned into every adapter; the
//! clones share reqwest's connection pool.

use std::time::{Duration, Instant};

use actix_web::web::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::logging;

/// Upper bound for one outbound call, connect to last body byte.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const IDLE_CONNECTIONS_PER_HOST: usize = 100;
const PREVIEW_CHAR_LIMIT: usize = 160;

/// Failures raised by [`RestClient`].
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// The payload could not be serialized.
    #[error("failed to encode request to {url}: {source}")]
    Encode {
        /// Target URL.
        url: String,
        /// Underlying failure.
        source: serde_json::Error,
    },
    /// No response arrived: connect, timeout or body read failure.
    #[error("rest call to {url} failed: {source}")]
    Transport {
        /// Target URL.
        url: String,
        /// Underlying failure.
        source: reqwest::Error,
    },
    /// The peer answered outside the 2xx range.
    #[error("Invalid http {} when rest {url}: {preview}", status.as_u16())]
    Status {
        /// Target URL.
        url: String,
        /// Received status.
        status: StatusCode,
        /// Whitespace-compacted start of the response body.
        preview: String,
    },
    /// The response body was not the expected JSON.
    #[error("invalid JSON from {url}: {source}")]
    Decode {
        /// Target URL.
        url: String,
        /// Underlying failure.
        source: serde_json::Error,
    },
}

impl RestError {
    /// Whether the failure was the request timeout elapsing.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport { source, .. } if source.is_timeout())
    }
}

/// Cloneable client sharing one connection pool.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
}

impl RestClient {
    /// Client with the default 60 second timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Client with an explicit per-call timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(IDLE_CONNECTIONS_PER_HOST)
            .build()?;
        Ok(Self { client })
    }

    /// POST `body` as JSON to `url` and decode the JSON answer.
    ///
    /// `token` is sent verbatim as the `Authorization` header. Every call is
    /// logged at debug level on the `clients` logger with its cost.
    ///
    /// # Errors
    ///
    /// Returns [`RestError`] for encoding, transport, non-2xx and decoding
    /// failures.
    pub async fn post_json<B, T>(&self, url: Url, token: &str, body: &B) -> Result<T, RestError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body).map_err(|source| RestError::Encode {
            url: url.to_string(),
            source,
        })?;
        let req_body = String::from_utf8_lossy(&payload).into_owned();

        let started = Instant::now();
        let sent = self.send(&url, token, payload).await;
        let cost = started.elapsed().as_secs_f64();
        logging::logger(logging::CLIENTS).in_scope(|| match &sent {
            Ok((status, _)) => debug!(
                url = %url,
                req_body = %req_body,
                cost,
                http_code = status.as_u16(),
                "rest call finished"
            ),
            Err(err) => debug!(
                url = %url,
                req_body = %req_body,
                cost,
                error = %err,
                "rest call failed"
            ),
        });

        let (status, body) = sent?;
        if !status.is_success() {
            return Err(RestError::Status {
                url: url.to_string(),
                status,
                preview: body_preview(&body),
            });
        }
        serde_json::from_slice(&body).map_err(|source| RestError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn send(
        &self,
        url: &Url,
        token: &str,
        payload: Vec<u8>,
    ) -> Result<(StatusCode, Bytes), RestError> {
        let transport = |source| RestError::Transport {
            url: url.to_string(),
            source,
        };
        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, token)
            .body(payload)
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(transport)?;
        Ok((status, body))
    }
}

fn body_preview(body: &[u8]) -> String {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::{Value, json};

    fn client() -> RestClient {
        RestClient::with_timeout(Duration::from_secs(5)).expect("client builds")
    }

    fn url(server: &MockServer, path: &str) -> Url {
        Url::parse(&format!("{}{path}", server.base_url())).expect("mock url")
    }

    #[tokio::test]
    async fn posts_json_with_authorization() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(Method::POST)
                .path("/echo")
                .header("Authorization", "token-1")
                .header("Content-Type", "application/json")
                .json_body(json!({"name": "demo"}));
            then.status(200).json_body(json!({"ok": true}));
        });

        let answer: Value = client()
            .post_json(url(&server, "/echo"), "token-1", &json!({"name": "demo"}))
            .await
            .expect("2xx decodes");

        mock.assert();
        assert_eq!(answer, json!({"ok": true}));
    }

    #[tokio::test]
    async fn non_success_status_carries_body_preview() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(Method::POST).path("/missing");
            then.status(404).body("namespace\n   not found");
        });
        let target = url(&server, "/missing");

        let err = client()
            .post_json::<_, Value>(target.clone(), "t", &json!({}))
            .await
            .expect_err("404 fails");

        assert_eq!(
            err.to_string(),
            format!("Invalid http 404 when rest {target}: namespace not found")
        );
    }

    #[tokio::test]
    async fn malformed_answer_is_a_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(Method::POST).path("/html");
            then.status(200).body("<html></html>");
        });

        let err = client()
            .post_json::<_, Value>(url(&server, "/html"), "t", &json!({}))
            .await
            .expect_err("not JSON");

        assert!(matches!(err, RestError::Decode { .. }));
    }

    #[tokio::test]
    async fn unreachable_peer_is_a_transport_error() {
        let target = Url::parse("http://127.0.0.1:1/").expect("url");

        let err = client()
            .post_json::<_, Value>(target, "t", &json!({}))
            .await
            .expect_err("nothing listens on port 1");

        assert!(matches!(err, RestError::Transport { .. }));
        assert!(!err.is_timeout());
    }

    #[test]
    fn preview_truncates_long_bodies() {
        let body = "x".repeat(PREVIEW_CHAR_LIMIT + 10);
        let preview = body_preview(body.as_bytes());
        assert_eq!(preview.chars().count(), PREVIEW_CHAR_LIMIT + 3);
        assert!(preview.ends_with("..."));
    }
}
