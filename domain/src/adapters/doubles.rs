//! Test doubles for the ports. They answer with a fixed result and record
//! every call so tests can assert on call counts and payloads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::{
    DeliveryReceipt, GatewayReply, Notification, Notifier, NotifyError, ProbeError, ProbeReport,
    ReachabilityProbe, SubmissionGateway, TransportError,
};

/// Probe that returns the same report (or error) for every candidate.
pub struct StaticProbe {
    result: Result<ProbeReport, ProbeError>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl StaticProbe {
    pub fn status(status: u16) -> Self {
        Self::from_result(Ok(ProbeReport { status }))
    }

    pub fn failing(err: ProbeError) -> Self {
        Self::from_result(Err(err))
    }

    fn from_result(result: Result<ProbeReport, ProbeError>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl ReachabilityProbe for StaticProbe {
    async fn probe(&self, candidate: &str) -> Result<ProbeReport, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(candidate.to_string());
        }
        self.result.clone()
    }
}

/// Notifier that keeps every dispatched message in memory.
pub struct RecordingNotifier {
    failure: Option<NotifyError>,
    sent: Mutex<Vec<Notification>>,
    dispatches: AtomicUsize,
}

impl RecordingNotifier {
    pub const RECEIPT: &'static str = "250 OK";

    pub fn new() -> Self {
        Self {
            failure: None,
            sent: Mutex::new(Vec::new()),
            dispatches: AtomicUsize::new(0),
        }
    }

    /// Every dispatch is counted, then fails with `err`.
    pub fn failing(err: NotifyError) -> Self {
        Self {
            failure: Some(err),
            ..Self::new()
        }
    }

    pub fn dispatch_count(&self) -> usize {
        self.dispatches.load(Ordering::SeqCst)
    }

    /// Messages that were accepted.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for RecordingNotifier {
    async fn dispatch(&self, message: &Notification) -> Result<DeliveryReceipt, NotifyError> {
        self.dispatches.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.sent
            .lock()
            .map_err(|_| NotifyError::Transport("mutex poisoned".into()))?
            .push(message.clone());
        Ok(DeliveryReceipt::new(Self::RECEIPT))
    }
}

/// Client gateway with a scripted reply.
pub struct ScriptedGateway {
    reply: Result<GatewayReply, TransportError>,
    sent: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn accepting() -> Self {
        Self::replying(Ok(GatewayReply::Accepted {
            receipt: RecordingNotifier::RECEIPT.into(),
        }))
    }

    pub fn rejecting(status: u16) -> Self {
        Self::replying(Ok(GatewayReply::Rejected { status }))
    }

    pub fn unreachable(reason: &str) -> Self {
        Self::replying(Err(TransportError(reason.to_string())))
    }

    fn replying(reply: Result<GatewayReply, TransportError>) -> Self {
        Self {
            reply,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.sent().len()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl SubmissionGateway for ScriptedGateway {
    async fn send(&self, candidate: &str) -> Result<GatewayReply, TransportError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(candidate.to_string());
        }
        self.reply.clone()
    }
}
