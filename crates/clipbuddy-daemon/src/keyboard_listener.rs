use crate::hotkey::{Hotkey, HotkeyState};
use clipbuddy_core::ViewKind;
use rdev::{self, EventType};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const MAX_RETRIES: u32 = 5;

/// Starts listening for global key events and calls `on_trigger` whenever a
/// bound shortcut is pressed.
///
/// The callback runs on the listener thread; it should only hand the
/// request over to the thread that owns the views.
pub fn start_hotkey_listener<F>(bindings: Vec<(Hotkey, ViewKind)>, on_trigger: F) -> JoinHandle<()>
where
    F: Fn(ViewKind) + Send + Sync + 'static,
{
    let state = Arc::new(Mutex::new(HotkeyState::new()));
    let bindings = Arc::new(bindings);
    let on_trigger = Arc::new(on_trigger);

    thread::spawn(move || {
        // Create a callback function closure
        let callback = move |event: rdev::Event| {
            if !matches!(
                event.event_type,
                EventType::KeyPress(_) | EventType::KeyRelease(_)
            ) {
                return;
            }
            let fired = match state.lock() {
                Ok(mut state) => state.on_event(&event.event_type, &bindings),
                Err(_) => return,
            };
            if let Some(kind) = fired {
                tracing::debug!("shortcut for {} pressed", kind);
                on_trigger(kind);
            }
        };

        // Start a retry loop for the keyboard listener
        let mut retry_count = 0;
        while retry_count < MAX_RETRIES {
            match rdev::listen(callback.clone()) {
                Ok(_) => {
                    // Normally this shouldn't happen since listen() blocks
                    break;
                }
                Err(e) => {
                    retry_count += 1;
                    tracing::warn!(
                        "global shortcut listener failed ({:?}), retrying ({}/{})",
                        e,
                        retry_count,
                        MAX_RETRIES
                    );
                    thread::sleep(Duration::from_secs(1));
                }
            }
        }

        if retry_count >= MAX_RETRIES {
            tracing::error!(
                "global shortcuts unavailable after {} attempts; use the in-app keys instead",
                MAX_RETRIES
            );
        }
    })
}
