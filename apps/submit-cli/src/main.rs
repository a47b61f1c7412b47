//! submit-cli — terminal front end for the submission form.
//!
//! Drives the same form controller a browser page would: local validation
//! first, then at most one request per submit against `/api/checklink`.
//!
//! ```text
//! submit-cli https://www.youtube.com/c/ExampleChannel   # one shot
//! submit-cli                                            # one link per stdin line
//! ```
//!
//! Logs go to stderr; user-facing messages go to stdout.

use clap::Parser;
use domain::form::{FormStatus, SubmissionForm};
use domain::validate::LinkRules;
use domain::SubmissionGateway;
use submission_client::HttpSubmissionGateway;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(author, version, about = "Suggest a channel for the gallery")]
struct Args {
    /// Server origin hosting the submission endpoint
    #[arg(long, env = "SUBMIT_ENDPOINT", default_value = "http://localhost:3001")]
    endpoint: String,

    /// Shared secret sent in the `secret` header
    #[arg(long, env = "CHECK_LINK_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Channel link to submit; reads stdin line by line when omitted
    link: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let gateway = match HttpSubmissionGateway::new(&args.endpoint) {
        Ok(g) => g.with_secret(args.secret),
        Err(e) => {
            error!(endpoint = %args.endpoint, err = %e, "invalid endpoint");
            std::process::exit(2);
        }
    };
    debug!(endpoint = %gateway.endpoint(), "submitting");

    let mut form = SubmissionForm::new(LinkRules::default());

    if let Some(link) = args.link {
        let (ok, message) = submit_line(&mut form, &gateway, &link).await;
        println!("{}", message);
        if !ok {
            std::process::exit(1);
        }
        return;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => {
                let (_, message) = submit_line(&mut form, &gateway, &line).await;
                println!("{}", message);
            }
            Ok(None) => break,
            Err(e) => {
                error!(err = %e, "failed to read stdin");
                std::process::exit(1);
            }
        }
    }
}

/// Type `line` into the form and submit it. Returns whether the attempt
/// succeeded and the message to show.
async fn submit_line<G: SubmissionGateway>(
    form: &mut SubmissionForm,
    gateway: &G,
    line: &str,
) -> (bool, String) {
    form.update_input(line);
    let status = form.submit(gateway).await.clone();
    match status {
        FormStatus::Succeeded => (true, form.success_message().unwrap_or_default().to_string()),
        FormStatus::Failed(_) => (false, form.error_message().to_string()),
        FormStatus::Idle | FormStatus::Pending => (false, String::new()),
    }
}
