//! Client-side submission form controller.
//!
//! Holds the text the user typed and an explicit status machine:
//!
//! ```text
//! Idle | Failed | Succeeded --submit--> Pending --reply--> Succeeded | Failed
//! ```
//!
//! `begin_submit`/`finish_submit` split the operation for event-loop UIs that
//! dispatch the request themselves; `submit` runs both halves against a
//! [`SubmissionGateway`]. Input value policy: cleared on success and on local
//! rejection, kept on remote rejection or transport failure so the user can
//! correct and resubmit.

use crate::validate::{LinkRules, LocalRejection};
use crate::{GatewayReply, SubmissionGateway, TransportError};

pub const SUCCESS_MESSAGE: &str = "Thanks! Your suggestion was sent for review.";
pub const REMOTE_FAILURE_MESSAGE: &str = "Invalid link";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormError {
    /// Local validation failed; no request was sent.
    Rejected(LocalRejection),
    /// The server refused the link or could not be reached.
    Remote,
}

impl FormError {
    pub fn message(&self) -> &'static str {
        match self {
            FormError::Rejected(r) => r.message(),
            FormError::Remote => REMOTE_FAILURE_MESSAGE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum FormStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed(FormError),
}

/// What the first half of a submit decided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitStep {
    /// A request is already in flight; nothing changed.
    Busy,
    Rejected(LocalRejection),
    /// Send this trimmed payload, then call `finish_submit` with the reply.
    Dispatch(String),
}

#[derive(Clone, Debug, Default)]
pub struct SubmissionForm {
    rules: LinkRules,
    value: String,
    status: FormStatus,
}

impl SubmissionForm {
    pub fn new(rules: LinkRules) -> Self {
        Self {
            rules,
            value: String::new(),
            status: FormStatus::Idle,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn status(&self) -> &FormStatus {
        &self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == FormStatus::Pending
    }

    /// The trigger element must be inert while a request is in flight.
    pub fn can_submit(&self) -> bool {
        !self.is_pending()
    }

    /// Empty unless the most recent attempt failed.
    pub fn error_message(&self) -> &str {
        match &self.status {
            FormStatus::Failed(e) => e.message(),
            _ => "",
        }
    }

    pub fn success_message(&self) -> Option<&'static str> {
        (self.status == FormStatus::Succeeded).then_some(SUCCESS_MESSAGE)
    }

    /// Store a keystroke's worth of input and clear any previous error.
    pub fn update_input(&mut self, raw: impl Into<String>) {
        self.value = raw.into();
        if !self.is_pending() {
            self.status = FormStatus::Idle;
        }
    }

    /// Validate locally and, if acceptable, move to `Pending`.
    pub fn begin_submit(&mut self) -> SubmitStep {
        if self.is_pending() {
            return SubmitStep::Busy;
        }
        match self.rules.check(&self.value).map(str::to_string) {
            Ok(payload) => {
                self.status = FormStatus::Pending;
                SubmitStep::Dispatch(payload)
            }
            Err(rejection) => {
                self.value.clear();
                self.status = FormStatus::Failed(FormError::Rejected(rejection));
                SubmitStep::Rejected(rejection)
            }
        }
    }

    /// Apply the server's reply. Ignored unless a request is pending.
    pub fn finish_submit(&mut self, reply: Result<GatewayReply, TransportError>) {
        if !self.is_pending() {
            return;
        }
        self.status = match reply {
            Ok(GatewayReply::Accepted { .. }) => {
                self.value.clear();
                FormStatus::Succeeded
            }
            Ok(GatewayReply::Rejected { .. }) | Err(_) => FormStatus::Failed(FormError::Remote),
        };
    }

    /// Run a whole submit: local validation, at most one request, state update.
    pub async fn submit<G: SubmissionGateway>(&mut self, gateway: &G) -> &FormStatus {
        if let SubmitStep::Dispatch(payload) = self.begin_submit() {
            let reply = gateway.send(&payload).await;
            self.finish_submit(reply);
        }
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::doubles::ScriptedGateway;

    fn form_with(input: &str) -> SubmissionForm {
        let mut form = SubmissionForm::new(LinkRules::default());
        form.update_input(input);
        form
    }

    #[tokio::test]
    async fn scenario_a_wrong_kind_is_rejected_locally() {
        let gateway = ScriptedGateway::accepting();
        let mut form = form_with("not-a-link");

        let status = form.submit(&gateway).await.clone();

        assert_eq!(
            status,
            FormStatus::Failed(FormError::Rejected(LocalRejection::WrongKind))
        );
        assert_eq!(form.error_message(), LocalRejection::WrongKind.message());
        assert_eq!(form.value(), "");
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn scenario_b_single_video_is_rejected_locally() {
        let gateway = ScriptedGateway::accepting();
        let mut form = form_with("https://www.youtube.com/watch?v=abc123");

        form.submit(&gateway).await;

        assert_eq!(form.error_message(), LocalRejection::WrongShape.message());
        assert_ne!(form.error_message(), LocalRejection::WrongKind.message());
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn scenario_c_accepted_link_resets_form() {
        let gateway = ScriptedGateway::accepting();
        let mut form = form_with("  https://www.youtube.com/c/ExampleChannel ");

        form.submit(&gateway).await;

        assert_eq!(form.status(), &FormStatus::Succeeded);
        assert_eq!(form.value(), "");
        assert_eq!(form.error_message(), "");
        assert!(!form.is_pending());
        assert_eq!(form.success_message(), Some(SUCCESS_MESSAGE));
        assert_eq!(
            gateway.sent(),
            vec!["https://www.youtube.com/c/ExampleChannel".to_string()]
        );
    }

    #[tokio::test]
    async fn scenario_d_remote_rejection_keeps_value() {
        let gateway = ScriptedGateway::rejecting(500);
        let mut form = form_with("https://www.youtube.com/c/Missing");

        form.submit(&gateway).await;

        assert_eq!(form.status(), &FormStatus::Failed(FormError::Remote));
        assert_eq!(form.error_message(), REMOTE_FAILURE_MESSAGE);
        assert_eq!(form.value(), "https://www.youtube.com/c/Missing");
        assert!(!form.is_pending());
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn scenario_e_transport_failure_mirrors_remote_rejection() {
        let gateway = ScriptedGateway::unreachable("connection refused");
        let mut form = form_with("https://www.youtube.com/c/ExampleChannel");

        form.submit(&gateway).await;

        assert_eq!(form.status(), &FormStatus::Failed(FormError::Remote));
        assert!(!form.error_message().is_empty());
        assert!(!form.is_pending());
    }

    #[test]
    fn pending_form_ignores_resubmit() {
        let mut form = form_with("https://www.youtube.com/c/X");
        assert!(matches!(form.begin_submit(), SubmitStep::Dispatch(_)));
        assert!(!form.can_submit());
        assert_eq!(form.begin_submit(), SubmitStep::Busy);
        assert!(form.is_pending());
    }

    #[test]
    fn input_during_pending_keeps_pending() {
        let mut form = form_with("https://www.youtube.com/c/X");
        form.begin_submit();
        form.update_input("typing more");
        assert!(form.is_pending());
        assert_eq!(form.value(), "typing more");
    }

    #[test]
    fn new_input_clears_error() {
        let mut form = form_with("nope");
        form.begin_submit();
        assert!(!form.error_message().is_empty());

        form.update_input("h");
        assert_eq!(form.status(), &FormStatus::Idle);
        assert_eq!(form.error_message(), "");
    }

    #[test]
    fn finish_without_pending_is_ignored() {
        let mut form = form_with("https://www.youtube.com/c/X");
        form.finish_submit(Ok(GatewayReply::Accepted {
            receipt: "250 OK".into(),
        }));
        assert_eq!(form.status(), &FormStatus::Idle);
        assert_eq!(form.value(), "https://www.youtube.com/c/X");
    }

    #[test]
    fn repeated_invalid_submissions_reject_identically() {
        let mut form = SubmissionForm::new(LinkRules::default());
        for _ in 0..3 {
            form.update_input("https://www.youtube.com/watch?v=1");
            assert_eq!(
                form.begin_submit(),
                SubmitStep::Rejected(LocalRejection::WrongShape)
            );
        }
    }

    #[test]
    fn can_resubmit_after_remote_failure() {
        let mut form = form_with("https://www.youtube.com/c/X");
        form.begin_submit();
        form.finish_submit(Ok(GatewayReply::Rejected { status: 500 }));
        assert!(form.can_submit());
        assert_eq!(
            form.begin_submit(),
            SubmitStep::Dispatch("https://www.youtube.com/c/X".into())
        );
    }
}
