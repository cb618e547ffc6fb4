//! Background plumbing for clipbuddy: global shortcuts and the
//! single-instance lock.

pub mod hotkey;
pub mod keyboard_listener;
pub mod process;

pub use hotkey::{Hotkey, HotkeyState, Modifiers};
pub use keyboard_listener::start_hotkey_listener;
pub use process::{read_pid, running_instance, verify_process_running, InstanceLock};
