//! Domain library for the channel gallery submission pipeline.
//!
//! This crate is dependency-free (inherits workspace metadata only) and holds
//! the domain types, ports (traits), and error definitions for both halves of
//! the pipeline: the client-side submission form and the server-side link
//! verification service. Keep adapters and IO concerns out of this crate.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::time::SystemTime;

/// Outcome of one verification request. Never stored.
///
/// Fields are private so that `notified` can only be true when `reachable` is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerificationOutcome {
    reachable: bool,
    notified: bool,
}

impl VerificationOutcome {
    /// The candidate could not be fetched (or the call was refused before fetching).
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            notified: false,
        }
    }

    /// The candidate was reachable but the notifier did not deliver.
    pub fn reachable_only() -> Self {
        Self {
            reachable: true,
            notified: false,
        }
    }

    /// The candidate was reachable and a reviewer was notified.
    pub fn notified() -> Self {
        Self {
            reachable: true,
            notified: true,
        }
    }

    pub fn reachable(&self) -> bool {
        self.reachable
    }

    pub fn was_notified(&self) -> bool {
        self.notified
    }
}

/// Message handed to the notifier for a human reviewer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl Notification {
    pub const SUBJECT: &'static str = "channel gallery comment";

    /// Compose the reviewer notification for a candidate link.
    ///
    /// `text` carries the candidate verbatim; `html` carries it escaped.
    pub fn for_candidate(candidate: &str) -> Self {
        Self {
            subject: Self::SUBJECT.to_string(),
            text: candidate.to_string(),
            html: format!(
                "<h1>Channel Gallery new Suggestion</h1><p>{}</p>",
                escape_html(candidate)
            ),
        }
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Response line returned by the notifier on successful delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveryReceipt(String);

impl DeliveryReceipt {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Successful verification: the link was reachable and the reviewer notified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verified {
    pub outcome: VerificationOutcome,
    pub receipt: DeliveryReceipt,
}

/// Result of a live fetch against a candidate link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeReport {
    pub status: u16,
}

impl ProbeReport {
    /// Only a plain 200 counts as reachable.
    pub fn is_reachable(&self) -> bool {
        self.status == 200
    }
}

/// A gallery entry supplied read-only by the catalog provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: i64,
    pub href: String,
    pub image_src: String,
    pub name: String,
    pub user_name: String,
    pub updated_at: Option<SystemTime>,
}

/// Server's answer to a client submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayReply {
    /// Success status; carries the response body (the notifier's delivery line).
    Accepted { receipt: String },
    /// Any non-success status.
    Rejected { status: u16 },
}

// ---- Ports ----

/// Live reachability check against a candidate link.
pub trait ReachabilityProbe: Send + Sync {
    fn probe(
        &self,
        candidate: &str,
    ) -> impl Future<Output = Result<ProbeReport, ProbeError>> + Send;
}

/// Outbound side-effect sink delivering a message to a human reviewer.
pub trait Notifier: Send + Sync {
    fn dispatch(
        &self,
        message: &Notification,
    ) -> impl Future<Output = Result<DeliveryReceipt, NotifyError>> + Send;
}

/// Read-only source of gallery items.
pub trait CatalogProvider: Send + Sync {
    fn list_items(&self) -> impl Future<Output = Result<Vec<CatalogItem>, CoreError>> + Send;
}

/// Client-side transport to the submission endpoint.
pub trait SubmissionGateway: Send + Sync {
    fn send(
        &self,
        candidate: &str,
    ) -> impl Future<Output = Result<GatewayReply, TransportError>> + Send;
}

// ---- Errors ----

/// Why a live fetch of the candidate failed before producing a status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProbeError {
    /// Not a fetchable URL.
    Malformed(String),
    /// DNS, connection or protocol failure.
    Transport(String),
}

impl Display for ProbeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeError::Malformed(msg) => write!(f, "malformed url: {}", msg),
            ProbeError::Transport(msg) => write!(f, "fetch failed: {}", msg),
        }
    }
}

impl Error for ProbeError {}

/// Notifier rejected or failed to deliver the message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotifyError {
    Rejected(String),
    Transport(String),
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::Rejected(msg) => write!(f, "notifier rejected message: {}", msg),
            NotifyError::Transport(msg) => write!(f, "notifier unreachable: {}", msg),
        }
    }
}

impl Error for NotifyError {}

/// Why a candidate failed the reachability gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnreachableCause {
    /// Fetched, but the status was not 200.
    Status(u16),
    Probe(ProbeError),
}

/// Server-side verification failure, tagged by cause.
///
/// Callers outside the server see one uniform failure; the tag is for logs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyError {
    /// Shared secret enabled and the caller token did not match.
    Unauthorized,
    Unreachable(UnreachableCause),
    Dispatch(NotifyError),
}

impl VerifyError {
    /// Stable tag for structured logging.
    pub fn kind(&self) -> &'static str {
        match self {
            VerifyError::Unauthorized => "unauthorized",
            VerifyError::Unreachable(_) => "unreachable",
            VerifyError::Dispatch(_) => "dispatch",
        }
    }

    pub fn outcome(&self) -> VerificationOutcome {
        match self {
            VerifyError::Unauthorized | VerifyError::Unreachable(_) => {
                VerificationOutcome::unreachable()
            }
            VerifyError::Dispatch(_) => VerificationOutcome::reachable_only(),
        }
    }
}

impl Display for VerifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VerifyError::Unauthorized => write!(f, "invalid token"),
            VerifyError::Unreachable(UnreachableCause::Status(code)) => {
                write!(f, "candidate returned status {}", code)
            }
            VerifyError::Unreachable(UnreachableCause::Probe(e)) => write!(f, "{}", e),
            VerifyError::Dispatch(e) => write!(f, "{}", e),
        }
    }
}

impl Error for VerifyError {}

/// Client could not reach the submission endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportError(pub String);

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "transport error: {}", self.0)
    }
}

impl Error for TransportError {}

/// Core domain errors (no external error crates to keep deps at zero).
#[derive(Debug)]
pub enum CoreError {
    /// The catalog provider failed or returned rows that could not be read.
    Catalog(String),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::Catalog(msg) => write!(f, "catalog error: {}", msg),
        }
    }
}

impl Error for CoreError {}

pub mod adapters;
pub mod form;
pub mod service;
pub mod validate;
