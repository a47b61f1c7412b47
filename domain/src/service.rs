use crate::{
    Notification, Notifier, ReachabilityProbe, UnreachableCause, Verified, VerificationOutcome,
    VerifyError,
};

/// Application service gating unauthenticated candidate links in front of the
/// notifier.
///
/// It remains generic over the probe and notifier so both can be swapped for
/// test doubles, and holds no per-request state: concurrent calls share
/// nothing mutable.
pub struct VerificationService<P: ReachabilityProbe, N: Notifier> {
    probe: P,
    notifier: N,
    secret: Option<String>,
}

impl<P: ReachabilityProbe, N: Notifier> VerificationService<P, N> {
    pub fn new(probe: P, notifier: N) -> Self {
        Self {
            probe,
            notifier,
            secret: None,
        }
    }

    /// Require callers to present `secret` before any fetch happens.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn requires_secret(&self) -> bool {
        self.secret.is_some()
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Verify a candidate link and notify a reviewer if it is reachable.
    ///
    /// The candidate is used verbatim; client-side validation is not trusted
    /// and not repeated here. At most one probe and one dispatch per call.
    pub async fn handle(
        &self,
        candidate: &str,
        token: Option<&str>,
    ) -> Result<Verified, VerifyError> {
        if let Some(secret) = &self.secret {
            let presented = token.unwrap_or_default();
            if !constant_time_eq(secret.as_bytes(), presented.as_bytes()) {
                return Err(VerifyError::Unauthorized);
            }
        }

        let report = self
            .probe
            .probe(candidate)
            .await
            .map_err(|e| VerifyError::Unreachable(UnreachableCause::Probe(e)))?;
        if !report.is_reachable() {
            return Err(VerifyError::Unreachable(UnreachableCause::Status(
                report.status,
            )));
        }

        let message = Notification::for_candidate(candidate);
        let receipt = self
            .notifier
            .dispatch(&message)
            .await
            .map_err(VerifyError::Dispatch)?;

        Ok(Verified {
            outcome: VerificationOutcome::notified(),
            receipt,
        })
    }
}

// Length mismatch returns early; equal-length inputs are compared in full.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::doubles::{RecordingNotifier, StaticProbe};
    use crate::{NotifyError, ProbeError};

    const CHANNEL: &str = "https://www.youtube.com/c/ExampleChannel";

    #[tokio::test]
    async fn reachable_link_is_notified_once_with_literal_candidate() {
        let svc = VerificationService::new(StaticProbe::status(200), RecordingNotifier::new());
        let verified = svc.handle(CHANNEL, None).await.expect("verified");

        assert_eq!(verified.outcome, VerificationOutcome::notified());
        assert_eq!(verified.receipt.as_str(), "250 OK");
        assert_eq!(svc.probe().seen(), vec![CHANNEL]);
        let sent = svc.notifier().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, CHANNEL);
        assert!(sent[0].html.contains(CHANNEL));
    }

    #[tokio::test]
    async fn non_200_status_skips_notifier() {
        let svc = VerificationService::new(StaticProbe::status(404), RecordingNotifier::new());
        let err = svc
            .handle("https://www.youtube.com/c/Missing", None)
            .await
            .unwrap_err();

        assert_eq!(err, VerifyError::Unreachable(UnreachableCause::Status(404)));
        assert_eq!(svc.probe().calls(), 1);
        assert_eq!(svc.notifier().dispatch_count(), 0);
    }

    #[tokio::test]
    async fn probe_failure_skips_notifier() {
        let svc = VerificationService::new(
            StaticProbe::failing(ProbeError::Transport("dns error".into())),
            RecordingNotifier::new(),
        );
        let err = svc.handle(CHANNEL, None).await.unwrap_err();

        assert_eq!(err.kind(), "unreachable");
        assert_eq!(svc.notifier().dispatch_count(), 0);
    }

    #[tokio::test]
    async fn dispatch_failure_is_tagged_separately() {
        let svc = VerificationService::new(
            StaticProbe::status(200),
            RecordingNotifier::failing(NotifyError::Rejected("quota".into())),
        );
        let err = svc.handle(CHANNEL, None).await.unwrap_err();

        assert_eq!(err.kind(), "dispatch");
        assert!(err.outcome().reachable());
        assert_eq!(svc.notifier().dispatch_count(), 1);
    }

    #[tokio::test]
    async fn secret_mismatch_short_circuits_before_probe() {
        let svc = VerificationService::new(StaticProbe::status(200), RecordingNotifier::new())
            .with_secret("s3cret");

        assert_eq!(
            svc.handle(CHANNEL, Some("wrong")).await.unwrap_err(),
            VerifyError::Unauthorized
        );
        assert_eq!(
            svc.handle(CHANNEL, None).await.unwrap_err(),
            VerifyError::Unauthorized
        );
        assert_eq!(svc.probe().calls(), 0);
        assert_eq!(svc.notifier().dispatch_count(), 0);

        assert!(svc.handle(CHANNEL, Some("s3cret")).await.is_ok());
        assert_eq!(svc.probe().calls(), 1);
    }

    #[tokio::test]
    async fn secret_is_ignored_when_not_configured() {
        let svc = VerificationService::new(StaticProbe::status(200), RecordingNotifier::new());
        assert!(!svc.requires_secret());
        assert!(svc.handle(CHANNEL, Some("anything")).await.is_ok());
    }

    #[test]
    fn constant_time_eq_basic() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
        assert!(constant_time_eq(b"", b""));
    }
}
