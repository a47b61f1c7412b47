//! Shared HTTP pieces for the channel gallery workspace.
//!
//! The submission endpoint's wire contract (path, secret header, body
//! decoding, error envelope) lives here so api-server, lambda-checklink and
//! the submission client cannot drift apart. Time helpers are used by the
//! catalog listing.

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::SystemTime;

/// Header carrying the caller's shared secret on submission requests.
pub const SECRET_HEADER: &str = "secret";

/// Path of the submission endpoint on every deployment.
pub const CHECKLINK_PATH: &str = "/api/checklink";

// ============================================================================
// Error envelope
// ============================================================================

/// Error body for a known code: `{"error": {"code": "<code>", "message": "<text>"}}`.
///
/// Every verification failure on the submission endpoint uses `"error"`, so
/// callers cannot tell an unreachable link from a failed delivery.
pub fn json_err(code: &str) -> serde_json::Value {
    let message = match code {
        "not_found" => "Resource not found",
        "bad_request" => "Bad request",
        "unauthorized" => "Invalid token",
        "error" => "Error",
        "internal" => "Internal server error",
        other => other,
    };
    serde_json::json!({"error": {"code": code, "message": message}})
}

/// Decode a submission body: a JSON-encoded string such as `"https://..."`.
///
/// Returns `None` for anything else (objects, numbers, invalid JSON).
pub fn decode_candidate_body(body: &[u8]) -> Option<String> {
    match serde_json::from_slice::<serde_json::Value>(body).ok()? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    }
}

// ============================================================================
// Time
// ============================================================================

/// RFC3339, seconds precision, UTC (`2023-01-15T10:30:00Z`).
pub fn system_time_to_rfc3339(t: SystemTime) -> String {
    DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_rfc3339(s: &str) -> Result<SystemTime, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc).into())
}

// ============================================================================
// Lambda responses (feature-gated)
// ============================================================================

#[cfg(feature = "lambda")]
pub mod lambda {
    //! Response builders for `lambda_http` handlers.

    use http::header::{HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS};
    use http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE};
    use http::StatusCode;
    use lambda_http::{Body, Response};

    /// Response with the given status and, when present, a JSON body.
    pub fn resp(status: u16, body_json: Option<&serde_json::Value>) -> Response<Body> {
        let body = match body_json {
            Some(val) => Body::Text(val.to_string()),
            None => Body::Empty,
        };
        let mut r = Response::new(body);
        *r.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if body_json.is_some() {
            r.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        r
    }

    /// Response carrying the error envelope for `code`.
    pub fn resp_with_error(status: u16, code: &str) -> Response<Body> {
        resp(status, Some(&crate::json_err(code)))
    }

    /// Parse the configured allowed origin once at startup; unset or empty means `*`.
    pub fn cors_origin(raw: Option<&str>) -> Result<HeaderValue, http::header::InvalidHeaderValue> {
        match raw {
            Some(o) if !o.is_empty() => HeaderValue::from_str(o),
            _ => Ok(HeaderValue::from_static("*")),
        }
    }

    /// Add CORS headers for the submission endpoint and forbid caching.
    pub fn with_cors(mut resp: Response<Body>, origin: &HeaderValue) -> Response<Body> {
        let headers = resp.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("content-type, secret"),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("OPTIONS, POST"),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        resp
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope() {
        assert_eq!(
            json_err("error"),
            serde_json::json!({"error": {"code": "error", "message": "Error"}})
        );
        assert_eq!(
            json_err("unauthorized")["error"]["message"],
            "Invalid token"
        );
        // Unknown code is its own message
        assert_eq!(json_err("method_not_allowed")["error"]["message"], "method_not_allowed");
    }

    #[test]
    fn candidate_body_must_be_json_string() {
        assert_eq!(
            decode_candidate_body(br#""https://www.youtube.com/c/X""#),
            Some("https://www.youtube.com/c/X".to_string())
        );
        assert_eq!(decode_candidate_body(br#""""#), Some(String::new()));
        assert_eq!(decode_candidate_body(b"https://www.youtube.com/c/X"), None);
        assert_eq!(decode_candidate_body(br#"{"url":"x"}"#), None);
        assert_eq!(decode_candidate_body(b""), None);
    }

    #[test]
    fn rfc3339_seconds_precision() {
        let t = parse_rfc3339("2023-01-15T10:30:00Z").unwrap();
        assert_eq!(system_time_to_rfc3339(t), "2023-01-15T10:30:00Z");
        assert!(parse_rfc3339("yesterday").is_err());
    }
}
