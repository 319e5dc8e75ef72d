//! Chat command - Interactive conversation.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use hihiton_chat::{render_message, ChatEvent, StatusIndicator, SubmitOutcome};

use super::{format_entry, print_entries, ClientArgs};

const QUIT: &str = "/quit";

pub async fn execute(client: &ClientArgs) -> Result<()> {
    let app = client.build_app()?;
    let controller = app.controller();
    info!("Chatting as session {}", controller.session_id());

    print_entries(&app.render());

    // Status changes are the terminal's equivalent of the page badge
    let ui = app.config().ui.clone();
    let subscription = controller.store().subscribe(Arc::new(move |event| {
        if let ChatEvent::StatusChanged(StatusIndicator::Busy) = event {
            eprintln!("⏳ {}", ui.status_busy);
        }
    }));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        eprint!("> ");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim() == QUIT {
            break;
        }

        match controller.submit(&line).await {
            SubmitOutcome::Completed(reply) => {
                println!("{}", format_entry(&render_message(&reply, &app.config().ui)));
                if reply.is_error {
                    eprintln!("❌ {}", controller.status_text());
                }
            }
            SubmitOutcome::Rejected(_) => continue,
        }
    }

    controller.store().unsubscribe(subscription);
    Ok(())
}
