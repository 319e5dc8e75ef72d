//! Download command - Save an attachment link to a file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::ClientArgs;

#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Attachment link (relative links resolve against the API base)
    url: String,

    /// Destination file
    dest: PathBuf,
}

pub async fn execute(client: &ClientArgs, args: &DownloadArgs) -> Result<()> {
    let app = client.build_app()?;
    let controller = app.controller();

    let url = controller.resolver().resolve_url(&args.url);
    info!("Downloading {}", url);

    let bytes = controller
        .transport()
        .download(&url)
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    std::fs::write(&args.dest, &bytes)
        .with_context(|| format!("Failed to write {}", args.dest.display()))?;

    println!("✅ Saved {} bytes to {}", bytes.len(), args.dest.display());
    Ok(())
}
