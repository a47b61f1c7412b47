//! lambda-checklink — AWS Lambda entrypoint for the submission endpoint.
//!
//! Purpose
//! - Handle API Gateway HTTP API (v2) events for `POST /api/checklink`.
//! - Verify the submitted link with a live fetch and, if reachable, notify a
//!   reviewer through the mail delivery API.
//! - Return `200` with the delivery response on success and one uniform `500`
//!   for every verification or delivery failure.
//!
//! Notes
//! - Environment: `MAIL_API_URL`, `MAIL_API_TOKEN`, `MAIL_FROM`, `MAIL_TO`
//!   (required), `CHECK_LINK_SECRET` (optional shared secret), and
//!   `CORS_ALLOW_ORIGIN` (default `*`). All are read once at cold start.
//! - It initializes minimal `tracing` logging compatible with Lambda CloudWatch.

use domain::service::VerificationService;
use domain::{Notifier, ReachabilityProbe, VerifyError};
use http_common::lambda::{cors_origin, resp, resp_with_error, with_cors};
use http_probe::HttpProbe;
use lambda_http::http::{HeaderValue, Method};
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use mail_notifier::MailApiNotifier;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    // Build the notifier from env; if it fails, crash early to surface misconfiguration.
    let notifier =
        MailApiNotifier::from_env().map_err(|e| format!("mail notifier config error: {e}"))?;
    let mut svc = VerificationService::new(HttpProbe::new(), notifier);
    match std::env::var("CHECK_LINK_SECRET") {
        Ok(secret) if !secret.is_empty() => svc = svc.with_secret(secret),
        _ => warn!("CHECK_LINK_SECRET not set: the submission endpoint accepts calls from anyone"),
    }
    let origin = cors_origin(std::env::var("CORS_ALLOW_ORIGIN").ok().as_deref())
        .map_err(|e| format!("CORS_ALLOW_ORIGIN: {e}"))?;
    let svc = Arc::new(svc);

    let handler = service_fn(move |req: Request| {
        let svc = svc.clone();
        let origin = origin.clone();
        async move { handle_request(&svc, &origin, req).await }
    });
    run(handler).await?;
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stdout))
        .init();
}

async fn handle_request<P, N>(
    svc: &VerificationService<P, N>,
    origin: &HeaderValue,
    req: Request,
) -> Result<Response<Body>, Error>
where
    P: ReachabilityProbe,
    N: Notifier,
{
    if req.method() == Method::OPTIONS {
        return Ok(with_cors(resp(204, None), origin));
    }
    if req.method() != Method::POST {
        warn!(method = %req.method(), "method not allowed");
        return Ok(with_cors(resp_with_error(405, "method_not_allowed"), origin));
    }

    let Some(candidate) = http_common::decode_candidate_body(req.body().as_ref()) else {
        warn!("submission body is not a JSON string");
        return Ok(with_cors(resp_with_error(400, "bad_request"), origin));
    };
    let token = req
        .headers()
        .get(http_common::SECRET_HEADER)
        .and_then(|v| v.to_str().ok());

    let response = match svc.handle(&candidate, token).await {
        Ok(verified) => {
            info!(candidate = %candidate, receipt = %verified.receipt.as_str(), "suggestion forwarded");
            resp(200, Some(&serde_json::json!(verified.receipt.as_str())))
        }
        Err(VerifyError::Unauthorized) => {
            warn!(kind = "unauthorized", "invalid token");
            resp_with_error(401, "unauthorized")
        }
        Err(e @ VerifyError::Dispatch(_)) => {
            error!(kind = e.kind(), err = %e, candidate = %candidate, "notification failed");
            resp_with_error(500, "error")
        }
        Err(e) => {
            warn!(kind = e.kind(), err = %e, candidate = %candidate, "suggestion rejected");
            resp_with_error(500, "error")
        }
    };
    Ok(with_cors(response, origin))
}
