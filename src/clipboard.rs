//! Clipboard access
//!
//! Copies note sections to the system clipboard.

use arboard::Clipboard;
use tracing::{error, info};

/// Copy text to the clipboard
pub(crate) fn copy_to_clipboard(text: &str) -> Result<(), arboard::Error> {
    let mut clipboard = Clipboard::new().map_err(|e| {
        error!("Failed to initialize clipboard: {}", e);
        e
    })?;

    clipboard.set_text(text).map_err(|e| {
        error!("Failed to copy text to clipboard: {}", e);
        e
    })?;

    info!("Copied {} chars to clipboard", text.len());
    Ok(())
}
