use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Install a file-backed tracing subscriber when debug mode is on.
///
/// The TUI owns the terminal, so logs go to repo-board.log in the current
/// directory. Without --debug nothing is installed and all spans/events
/// are dropped.
pub fn init(debug: bool) -> Result<()> {
    if !debug {
        return Ok(());
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("repo-board.log")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("repo_board=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init();

    Ok(())
}
