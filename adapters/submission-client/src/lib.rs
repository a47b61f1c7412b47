//! submission-client — SubmissionGateway over HTTP.
//!
//! POSTs the trimmed candidate as a JSON-encoded string to the submission
//! endpoint (`/api/checklink`), optionally with the shared secret header.
//! A 2xx reply is `Accepted` with the JSON-decoded delivery receipt; any other
//! status is `Rejected`. Failing to reach the server is a `TransportError`.
//! One attempt per call, no retries.

use domain::{GatewayReply, SubmissionGateway, TransportError};
use reqwest::header::CACHE_CONTROL;
use reqwest::Url;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpSubmissionGateway {
    client: reqwest::Client,
    endpoint: Url,
    secret: Option<String>,
}

impl HttpSubmissionGateway {
    /// `base` is the server origin, e.g. `http://localhost:3001`.
    pub fn new(base: &str) -> Result<Self, TransportError> {
        let base = Url::parse(base).map_err(|e| TransportError(format!("bad endpoint: {}", e)))?;
        let endpoint = base
            .join(http_common::CHECKLINK_PATH)
            .map_err(|e| TransportError(format!("bad endpoint: {}", e)))?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            secret: None,
        })
    }

    pub fn with_secret(mut self, secret: Option<String>) -> Self {
        self.secret = secret.filter(|s| !s.is_empty());
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

// The server answers with a JSON string; fall back to the raw text otherwise.
fn decode_receipt(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(s)) => s,
        _ => body.trim().to_string(),
    }
}

impl SubmissionGateway for HttpSubmissionGateway {
    async fn send(&self, candidate: &str) -> Result<GatewayReply, TransportError> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(CACHE_CONTROL, "no-cache")
            .json(&candidate);
        if let Some(secret) = &self.secret {
            request = request.header(http_common::SECRET_HEADER, secret);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status();
        debug!(candidate, status = status.as_u16(), "submission answered");
        if !status.is_success() {
            return Ok(GatewayReply::Rejected {
                status: status.as_u16(),
            });
        }
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        Ok(GatewayReply::Accepted {
            receipt: decode_receipt(&body),
        })
    }
}
