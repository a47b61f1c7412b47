//! http-probe — reqwest-backed reachability check for candidate links.
//!
//! Purpose
//! - Perform the live fetch that gates the notifier: GET the candidate and
//!   report the final status after redirects.
//! - Distinguish malformed input (not an http/https URL) from transport
//!   failures so the service can tag its errors.
//!
//! Notes
//! - No timeout is configured; a hung target holds the request
//!   until the transport gives up.
//! - The response body is never read.

use domain::{ProbeError, ProbeReport, ReachabilityProbe};
use reqwest::Url;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new() -> Self {
        Self::default()
    }
}

fn parse_candidate(candidate: &str) -> Result<Url, ProbeError> {
    let url = Url::parse(candidate).map_err(|e| ProbeError::Malformed(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ProbeError::Malformed(format!("unsupported scheme '{}'", other))),
    }
}

impl ReachabilityProbe for HttpProbe {
    async fn probe(&self, candidate: &str) -> Result<ProbeReport, ProbeError> {
        let url = parse_candidate(candidate)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        debug!(candidate, status, final_url = %response.url(), "probe done");
        Ok(ProbeReport { status })
    }
}
