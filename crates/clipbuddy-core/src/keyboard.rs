use crate::error::{BuddyError, Result};
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use std::thread;
use std::time::Duration;

/// Create a keyboard controller
pub fn create_keyboard_controller() -> Result<Enigo> {
    let settings = Settings::default();
    match Enigo::new(&settings) {
        Ok(enigo) => Ok(enigo),
        Err(err) => Err(BuddyError::Enigo(format!(
            "Failed to create keyboard controller: {}",
            err
        ))),
    }
}

#[cfg(target_os = "macos")]
const PASTE_MODIFIER: Key = Key::Meta;
#[cfg(not(target_os = "macos"))]
const PASTE_MODIFIER: Key = Key::Control;

/// Send the platform paste chord (Ctrl+V, Cmd+V on macOS)
pub fn send_paste_shortcut(keyboard: &mut impl Keyboard) -> Result<()> {
    keyboard
        .key(PASTE_MODIFIER, Direction::Press)
        .map_err(|err| BuddyError::Enigo(format!("Failed to press modifier: {}", err)))?;

    // Small delay so the target window registers the modifier
    thread::sleep(Duration::from_millis(10));
    let clicked = keyboard.key(Key::Unicode('v'), Direction::Click);

    // Always release the modifier, even if the click failed
    let released = keyboard.key(PASTE_MODIFIER, Direction::Release);

    clicked.map_err(|err| BuddyError::Enigo(format!("Failed to send paste key: {}", err)))?;
    released.map_err(|err| BuddyError::Enigo(format!("Failed to release modifier: {}", err)))?;
    Ok(())
}
