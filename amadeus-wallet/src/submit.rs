//! HTTP submission of packed transactions to an Amadeus node.
//!
//! A packed transaction is produced by the wallet provider and forwarded
//! here unmodified as an opaque binary body. The node's acknowledgment is
//! best-effort JSON: once the write succeeded at the transport level, an
//! unparseable or absent body is tolerated rather than treated as an error.

use reqwest::header::{CONTENT_TYPE, USER_AGENT};

use crate::error::{Error, Result};
use crate::log::{ActivityLog, LogLevel};

/// Default public Amadeus node API endpoint.
pub const DEFAULT_API_URL: &str = "https://nodes.amadeus.bot/api";

const SUBMIT_PATH: &str = "/tx/submit";
const DEMO_USER_AGENT: &str = concat!("amadeus-wallet-rs-demo/", env!("CARGO_PKG_VERSION"));

/// HTTP client for submitting signed transactions.
#[derive(Clone, Default)]
pub struct SubmissionClient {
    http: reqwest::Client,
}

impl std::fmt::Debug for SubmissionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionClient").finish_non_exhaustive()
    }
}

impl SubmissionClient {
    /// Create a client with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client over a preconfigured [`reqwest::Client`].
    #[must_use]
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Submit a packed transaction to `{endpoint}/tx/submit`.
    ///
    /// One trailing slash on the endpoint is stripped; no other
    /// normalization is applied. Returns the node's JSON acknowledgment, or
    /// [`serde_json::Value::Null`] when the 2xx response body was absent or
    /// unparseable.
    ///
    /// Informational log events are emitted before the send and after
    /// success; the caller logs the failure path from the returned error.
    ///
    /// # Errors
    ///
    /// [`Error::Submission`] for a non-2xx response (carrying status and
    /// body), [`Error::Network`] for transport failures.
    pub async fn submit(
        &self,
        packed: &[u8],
        tx_hash: &str,
        endpoint: &str,
        log: &ActivityLog,
    ) -> Result<serde_json::Value> {
        log.add(
            LogLevel::Info,
            format!("Submitting transaction {tx_hash} to Amadeus node..."),
        );

        let endpoint = endpoint.strip_suffix('/').unwrap_or(endpoint);
        let response = self
            .http
            .post(format!("{endpoint}{SUBMIT_PATH}"))
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(USER_AGENT, DEMO_USER_AGENT)
            .body(packed.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Submission {
                status: status.as_u16(),
                body,
            });
        }

        let ack = response
            .json::<serde_json::Value>()
            .await
            .unwrap_or(serde_json::Value::Null);
        log.add(LogLevel::Success, "Transaction submitted successfully.");
        if !ack.is_null() {
            log.add(LogLevel::Info, format!("Node response: {ack}"));
        }
        Ok(ack)
    }
}
