//! History command - Print the stored conversation.

use anyhow::Result;

use super::{print_entries, ClientArgs};

pub fn execute(client: &ClientArgs) -> Result<()> {
    let app = client.build_app()?;

    if client.state_dir.is_none() {
        eprintln!("⚠️  No --state-dir given, history is empty for a new process");
    }

    print_entries(&app.render());
    Ok(())
}
