//! Send command - Send one message and print the reply.

use anyhow::Result;
use clap::Args;
use tracing::info;

use hihiton_chat::{render_message, SubmitOutcome};

use super::{format_entry, ClientArgs};

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Message text
    #[arg(required = true)]
    text: Vec<String>,
}

pub async fn execute(client: &ClientArgs, args: &SendArgs) -> Result<()> {
    let app = client.build_app()?;
    let text = args.text.join(" ");
    info!("Sending message in session {}", app.controller().session_id());

    match app.controller().submit(&text).await {
        SubmitOutcome::Completed(reply) => {
            println!("{}", format_entry(&render_message(&reply, &app.config().ui)));
            if reply.is_error {
                anyhow::bail!("{}", app.controller().status_text());
            }
            Ok(())
        }
        SubmitOutcome::Rejected(reason) => {
            anyhow::bail!("Invalid argument: message not sent ({:?})", reason)
        }
    }
}
