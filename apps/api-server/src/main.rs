//! api-server — HTTP API for channel gallery suggestions.
//!
//! Provides the submission endpoint and the read-only catalog endpoint, with:
//! - Verification: a live fetch of the submitted link gates the reviewer
//!   notification; failures collapse to one uniform error response.
//! - Notifier: log-only (default, local dev) or an HTTP mail delivery API.
//! - Catalog: in-memory (default) or a REST data store when the
//!   `rest-catalog` feature is enabled.
//! - CORS: Configurable via CORS_ALLOW_ORIGIN (origin string) for the gallery frontend.
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p api-server
//!
//! # real mail delivery and catalog (requires env vars)
//! NOTIFIER_PROVIDER=mail MAIL_API_URL=... MAIL_API_TOKEN=... MAIL_FROM=... MAIL_TO=... \
//! CATALOG_PROVIDER=rest CATALOG_URL=... CATALOG_KEY=... \
//!   cargo run -p api-server
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.
//!

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
#[cfg(test)]
use domain::adapters::doubles::{RecordingNotifier, StaticProbe};
use domain::adapters::memory_catalog::InMemoryCatalog;
use domain::service::VerificationService;
use domain::{
    CatalogItem, CatalogProvider, CoreError, DeliveryReceipt, Notification, Notifier,
    NotifyError, ProbeError, ProbeReport, ReachabilityProbe, VerifyError,
};
use http_probe::HttpProbe;
use mail_notifier::{LogNotifier, MailApiNotifier};
use serde::Serialize;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// Local adapter selections; test doubles only exist in test builds.
enum AnyProbe {
    Http(HttpProbe),
    #[cfg(test)]
    Static(StaticProbe),
}

impl ReachabilityProbe for AnyProbe {
    async fn probe(&self, candidate: &str) -> Result<ProbeReport, ProbeError> {
        match self {
            AnyProbe::Http(p) => p.probe(candidate).await,
            #[cfg(test)]
            AnyProbe::Static(p) => p.probe(candidate).await,
        }
    }
}

enum AnyNotifier {
    Log(LogNotifier),
    Mail(MailApiNotifier),
    #[cfg(test)]
    Recording(RecordingNotifier),
}

impl Notifier for AnyNotifier {
    async fn dispatch(&self, message: &Notification) -> Result<DeliveryReceipt, NotifyError> {
        match self {
            AnyNotifier::Log(n) => n.dispatch(message).await,
            AnyNotifier::Mail(n) => n.dispatch(message).await,
            #[cfg(test)]
            AnyNotifier::Recording(n) => n.dispatch(message).await,
        }
    }
}

enum AnyCatalog {
    Memory(InMemoryCatalog),
    #[cfg(feature = "rest-catalog")]
    Rest(catalog_rest::RestCatalog),
}

impl CatalogProvider for AnyCatalog {
    async fn list_items(&self) -> Result<Vec<CatalogItem>, CoreError> {
        match self {
            AnyCatalog::Memory(c) => c.list_items().await,
            #[cfg(feature = "rest-catalog")]
            AnyCatalog::Rest(c) => c.list_items().await,
        }
    }
}

type Service = VerificationService<AnyProbe, AnyNotifier>;

#[derive(Clone)]
struct AppState {
    svc: Arc<Service>,
    catalog: Arc<AnyCatalog>,
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.warn_if_insecure();

    let state = AppState {
        svc: Arc::new(build_service(&cfg)),
        catalog: Arc::new(build_catalog(&cfg)),
    };

    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    let mut app = routes(state)
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    // CORS - already validated in Config::from_env()
    let cors = if cfg.cors_allow_origin == HeaderValue::from_static("*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list([cfg.cors_allow_origin.clone()]))
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([
                header::CONTENT_TYPE,
                header::CACHE_CONTROL,
                axum::http::HeaderName::from_static(http_common::SECRET_HEADER),
            ])
    };
    app = app.layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    info!(%addr, "api-server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind port");
    axum::serve(listener, app).await.expect("server error");
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

// Wire the probe and notifier chosen by config into the verification service.
fn build_service(cfg: &config::Config) -> Service {
    let notifier = match &cfg.mail {
        Some(settings) => AnyNotifier::Mail(MailApiNotifier::new(settings.clone())),
        None => AnyNotifier::Log(LogNotifier),
    };
    let svc = VerificationService::new(AnyProbe::Http(HttpProbe::new()), notifier);
    match &cfg.check_link_secret {
        Some(secret) => svc.with_secret(secret.clone()),
        None => svc,
    }
}

// The REST catalog was already built (and its URL validated) by Config.
fn build_catalog(cfg: &config::Config) -> AnyCatalog {
    #[cfg(feature = "rest-catalog")]
    if let Some(rest) = &cfg.rest_catalog {
        return AnyCatalog::Rest(rest.clone());
    }
    info!(provider = ?cfg.catalog_provider, "serving an empty in-memory catalog");
    AnyCatalog::Memory(InMemoryCatalog::new())
}

fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            http_common::CHECKLINK_PATH,
            post(check_link).options(preflight),
        )
        .route("/api/catalog", get(list_catalog).options(preflight))
        .route("/healthz", get(healthz))
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogItemOut {
    id: i64,
    href: String,
    image_src: String,
    name: String,
    user_name: String,
    updated_at: Option<String>,
}

fn item_to_out(item: CatalogItem) -> CatalogItemOut {
    CatalogItemOut {
        id: item.id,
        href: item.href,
        image_src: item.image_src,
        name: item.name,
        user_name: item.user_name,
        updated_at: item.updated_at.map(http_common::system_time_to_rfc3339),
    }
}

fn no_store(status: StatusCode, body: serde_json::Value) -> Response {
    (status, [(header::CACHE_CONTROL, "no-store")], Json(body)).into_response()
}

async fn check_link(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let Some(candidate) = http_common::decode_candidate_body(&body) else {
        warn!("submission body is not a JSON string");
        return no_store(StatusCode::BAD_REQUEST, http_common::json_err("bad_request"));
    };
    let token = headers
        .get(http_common::SECRET_HEADER)
        .and_then(|v| v.to_str().ok());

    match state.svc.handle(&candidate, token).await {
        Ok(verified) => {
            info!(candidate = %candidate, receipt = %verified.receipt.as_str(), "suggestion forwarded");
            no_store(
                StatusCode::OK,
                serde_json::Value::String(verified.receipt.as_str().to_string()),
            )
        }
        Err(VerifyError::Unauthorized) => {
            warn!(kind = "unauthorized", "invalid token");
            no_store(StatusCode::UNAUTHORIZED, http_common::json_err("unauthorized"))
        }
        Err(e) => {
            // Same response for every cause; the tag only goes to the log
            match &e {
                VerifyError::Dispatch(_) => {
                    error!(kind = e.kind(), err = %e, candidate = %candidate, "notification failed")
                }
                _ => warn!(kind = e.kind(), err = %e, candidate = %candidate, "suggestion rejected"),
            }
            no_store(
                StatusCode::INTERNAL_SERVER_ERROR,
                http_common::json_err("error"),
            )
        }
    }
}

async fn list_catalog(State(state): State<AppState>) -> Response {
    match state.catalog.list_items().await {
        Ok(items) => {
            let out: Vec<CatalogItemOut> = items.into_iter().map(item_to_out).collect();
            (StatusCode::OK, Json(out)).into_response()
        }
        Err(e) => {
            error!(err = %e, "catalog error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(http_common::json_err("internal")),
            )
                .into_response()
        }
    }
}

async fn preflight() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    const CHANNEL: &str = "https://www.youtube.com/c/ExampleChannel";

    fn state_with(probe: StaticProbe, notifier: RecordingNotifier) -> AppState {
        AppState {
            svc: Arc::new(VerificationService::new(
                AnyProbe::Static(probe),
                AnyNotifier::Recording(notifier),
            )),
            catalog: Arc::new(AnyCatalog::Memory(InMemoryCatalog::new())),
        }
    }

    fn recorder(state: &AppState) -> &RecordingNotifier {
        match state.svc.notifier() {
            AnyNotifier::Recording(r) => r,
            _ => panic!("expected recording notifier"),
        }
    }

    fn probe_calls(state: &AppState) -> usize {
        match state.svc.probe() {
            AnyProbe::Static(p) => p.calls(),
            _ => panic!("expected static probe"),
        }
    }

    fn submit(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/checklink")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn reachable_link_is_forwarded() {
        let state = state_with(StaticProbe::status(200), RecordingNotifier::new());
        let resp = routes(state.clone())
            .oneshot(submit(&format!("\"{}\"", CHANNEL)))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get(header::CACHE_CONTROL).unwrap(), "no-store");
        assert_eq!(json_body(resp).await, serde_json::json!("250 OK"));

        let sent = recorder(&state).sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, CHANNEL);
        assert_eq!(probe_calls(&state), 1);
    }

    #[tokio::test]
    async fn missing_page_is_uniform_failure_without_notification() {
        let state = state_with(StaticProbe::status(404), RecordingNotifier::new());
        let resp = routes(state.clone())
            .oneshot(submit("\"https://www.youtube.com/c/Missing\""))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(resp).await, http_common::json_err("error"));
        assert_eq!(recorder(&state).dispatch_count(), 0);
    }

    #[tokio::test]
    async fn dns_failure_is_uniform_failure() {
        let state = state_with(
            StaticProbe::failing(ProbeError::Transport("dns error".into())),
            RecordingNotifier::new(),
        );
        let resp = routes(state.clone())
            .oneshot(submit(&format!("\"{}\"", CHANNEL)))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(resp).await, http_common::json_err("error"));
        assert_eq!(recorder(&state).dispatch_count(), 0);
    }

    #[tokio::test]
    async fn dispatch_failure_looks_like_unreachable_to_caller() {
        let state = state_with(
            StaticProbe::status(200),
            RecordingNotifier::failing(NotifyError::Transport("smtp down".into())),
        );
        let resp = routes(state.clone())
            .oneshot(submit(&format!("\"{}\"", CHANNEL)))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(resp).await, http_common::json_err("error"));
        assert_eq!(recorder(&state).dispatch_count(), 1);
    }

    #[tokio::test]
    async fn non_string_body_is_bad_request_without_fetch() {
        let state = state_with(StaticProbe::status(200), RecordingNotifier::new());
        let resp = routes(state.clone())
            .oneshot(submit("{\"link\":\"https://www.youtube.com/c/X\"}"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(probe_calls(&state), 0);
    }

    #[tokio::test]
    async fn secret_header_is_enforced_when_configured() {
        let svc = VerificationService::new(
            AnyProbe::Static(StaticProbe::status(200)),
            AnyNotifier::Recording(RecordingNotifier::new()),
        )
        .with_secret("s3cret");
        let state = AppState {
            svc: Arc::new(svc),
            catalog: Arc::new(AnyCatalog::Memory(InMemoryCatalog::new())),
        };

        let resp = routes(state.clone())
            .oneshot(submit(&format!("\"{}\"", CHANNEL)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(probe_calls(&state), 0);

        let mut req = submit(&format!("\"{}\"", CHANNEL));
        req.headers_mut()
            .insert("secret", HeaderValue::from_static("s3cret"));
        let resp = routes(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(probe_calls(&state), 1);
    }

    #[tokio::test]
    async fn catalog_lists_items_in_camel_case() {
        let catalog = InMemoryCatalog::with_items(vec![CatalogItem {
            id: 1,
            href: CHANNEL.into(),
            image_src: "https://yt3.googleusercontent.com/a.jpg".into(),
            name: "Example".into(),
            user_name: "@example".into(),
            updated_at: Some(http_common::parse_rfc3339("2023-01-15T10:30:00Z").unwrap()),
        }]);
        let state = AppState {
            catalog: Arc::new(AnyCatalog::Memory(catalog)),
            ..state_with(StaticProbe::status(200), RecordingNotifier::new())
        };

        let resp = routes(state)
            .oneshot(
                Request::builder()
                    .uri("/api/catalog")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            json_body(resp).await,
            serde_json::json!([{
                "id": 1,
                "href": CHANNEL,
                "imageSrc": "https://yt3.googleusercontent.com/a.jpg",
                "name": "Example",
                "userName": "@example",
                "updatedAt": "2023-01-15T10:30:00Z"
            }])
        );
    }

    #[tokio::test]
    async fn preflight_and_health() {
        let state = state_with(StaticProbe::status(200), RecordingNotifier::new());
        let resp = routes(state.clone())
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/checklink")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = routes(state)
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
