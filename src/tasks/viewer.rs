use std::path::PathBuf;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::events::VisibilityChanged;

/// Presentation stand-in: reports which figure currently carries the marker.
/// Returns the last visible figure when the channel closes or on cancel.
pub async fn run(
    mut changes: Receiver<VisibilityChanged>,
    cancel: CancellationToken,
) -> Result<Option<PathBuf>> {
    let mut current: Option<PathBuf> = None;
    loop {
        select! {
            _ = cancel.cancelled() => break,
            maybe_change = changes.recv() => {
                let Some(VisibilityChanged { path, visible }) = maybe_change else {
                    break;
                };
                if visible {
                    info!(path = %path.display(), "displaying");
                    current = Some(path);
                } else {
                    debug!(path = %path.display(), "hidden");
                    if current.as_ref() == Some(&path) {
                        current = None;
                    }
                }
            }
        }
    }
    Ok(current)
}
