//! Session command - Print the session id.

use anyhow::Result;

use super::ClientArgs;

pub fn execute(client: &ClientArgs) -> Result<()> {
    let app = client.build_app()?;
    let session = app.controller().session();

    println!("{}", session.id());
    if session.is_ephemeral() || client.state_dir.is_none() {
        eprintln!("⚠️  Session is not persisted; pass --state-dir to keep it");
    }
    Ok(())
}
