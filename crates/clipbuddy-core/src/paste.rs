//! Putting a message where the user was typing.

use crate::error::{BuddyError, Result};
use crate::keyboard::{create_keyboard_controller, send_paste_shortcut};
use arboard::Clipboard;
use std::thread;
use std::time::Duration;

/// Delay between writing the clipboard and sending the paste chord, so the
/// previously focused window is active again.
const SETTLE_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteOutcome {
    /// Text is on the clipboard and the paste chord was sent.
    Pasted,
    /// Text is on the clipboard but the chord could not be simulated; the
    /// user has to paste manually.
    CopiedOnly(String),
}

impl PasteOutcome {
    pub fn message(&self) -> String {
        match self {
            PasteOutcome::Pasted => "Pasted.".to_string(),
            PasteOutcome::CopiedOnly(reason) => format!(
                "Could not simulate the paste shortcut ({}). The message is on the clipboard, paste it manually.",
                reason
            ),
        }
    }
}

/// Set the clipboard content as text, verbatim
fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new().map_err(|e| BuddyError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(text)
        .map_err(|e| BuddyError::Clipboard(e.to_string()))
}

/// Copy `text` verbatim and paste it into the focused window.
///
/// A clipboard failure is an error; a keystroke failure degrades to
/// [`PasteOutcome::CopiedOnly`].
pub fn paste_text(text: &str) -> Result<PasteOutcome> {
    copy_to_clipboard(text)?;
    thread::sleep(SETTLE_DELAY);

    let sent =
        create_keyboard_controller().and_then(|mut keyboard| send_paste_shortcut(&mut keyboard));
    let outcome = match sent {
        Ok(()) => PasteOutcome::Pasted,
        Err(err) => {
            tracing::warn!("paste shortcut failed, text left on the clipboard: {}", err);
            PasteOutcome::CopiedOnly(err.to_string())
        }
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copied_only_tells_the_user_to_paste_manually() {
        let outcome = PasteOutcome::CopiedOnly("no display".to_string());
        let message = outcome.message();
        assert!(message.contains("no display"));
        assert!(message.contains("paste it manually"));
        assert_eq!(PasteOutcome::Pasted.message(), "Pasted.");
    }
}
