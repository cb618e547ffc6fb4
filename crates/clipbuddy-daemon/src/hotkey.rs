//! Global shortcut parsing and chord detection over raw key events.

use clipbuddy_core::{BuddyError, Result, ViewKind};
use rdev::{EventType, Key};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

/// A modifier set plus one trigger key, e.g. `ctrl+shift+space`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    pub key: Key,
}

impl Hotkey {
    /// Parse `+`-separated, case-insensitive key names.
    pub fn parse(chord: &str) -> Result<Self> {
        let invalid =
            |reason: &str| BuddyError::InvalidHotkey(format!("'{}': {}", chord, reason));

        let mut modifiers = Modifiers::default();
        let mut key = None;
        for part in chord.split('+').map(|part| part.trim().to_lowercase()) {
            match part.as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "shift" => modifiers.shift = true,
                "alt" | "option" => modifiers.alt = true,
                "meta" | "cmd" | "super" | "win" => modifiers.meta = true,
                "" => return Err(invalid("empty key name")),
                name => {
                    if key.is_some() {
                        return Err(invalid("more than one non-modifier key"));
                    }
                    key = Some(key_from_name(name).ok_or_else(|| invalid("unknown key"))?);
                }
            }
        }

        let key = key.ok_or_else(|| invalid("no key besides the modifiers"))?;
        if modifiers == Modifiers::default() {
            return Err(invalid("at least one modifier is required"));
        }
        Ok(Self { modifiers, key })
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Modifiers {
            ctrl,
            shift,
            alt,
            meta,
        } = self.modifiers;
        for (held, name) in [(ctrl, "ctrl"), (shift, "shift"), (alt, "alt"), (meta, "meta")] {
            if held {
                write!(f, "{}+", name)?;
            }
        }
        write!(f, "{:?}", self.key)
    }
}

fn key_from_name(name: &str) -> Option<Key> {
    let key = match name {
        "space" => Key::Space,
        "enter" | "return" => Key::Return,
        "tab" => Key::Tab,
        "esc" | "escape" => Key::Escape,
        "insert" => Key::Insert,
        "home" => Key::Home,
        "end" => Key::End,
        "pageup" => Key::PageUp,
        "pagedown" => Key::PageDown,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        single if single.chars().count() == 1 => char_key(single.chars().next()?)?,
        _ => return None,
    };
    Some(key)
}

fn char_key(c: char) -> Option<Key> {
    let key = match c {
        'a' => Key::KeyA,
        'b' => Key::KeyB,
        'c' => Key::KeyC,
        'd' => Key::KeyD,
        'e' => Key::KeyE,
        'f' => Key::KeyF,
        'g' => Key::KeyG,
        'h' => Key::KeyH,
        'i' => Key::KeyI,
        'j' => Key::KeyJ,
        'k' => Key::KeyK,
        'l' => Key::KeyL,
        'm' => Key::KeyM,
        'n' => Key::KeyN,
        'o' => Key::KeyO,
        'p' => Key::KeyP,
        'q' => Key::KeyQ,
        'r' => Key::KeyR,
        's' => Key::KeyS,
        't' => Key::KeyT,
        'u' => Key::KeyU,
        'v' => Key::KeyV,
        'w' => Key::KeyW,
        'x' => Key::KeyX,
        'y' => Key::KeyY,
        'z' => Key::KeyZ,
        '0' => Key::Num0,
        '1' => Key::Num1,
        '2' => Key::Num2,
        '3' => Key::Num3,
        '4' => Key::Num4,
        '5' => Key::Num5,
        '6' => Key::Num6,
        '7' => Key::Num7,
        '8' => Key::Num8,
        '9' => Key::Num9,
        _ => return None,
    };
    Some(key)
}

/// Tracks held modifiers across events and reports completed chords.
///
/// A chord fires once per press of its trigger key; auto-repeat while the key
/// stays down does not fire again.
#[derive(Debug, Default)]
pub struct HotkeyState {
    held: Vec<Key>,
    latched: Option<Key>,
}

const CTRL: [Key; 2] = [Key::ControlLeft, Key::ControlRight];
const SHIFT: [Key; 2] = [Key::ShiftLeft, Key::ShiftRight];
const ALT: [Key; 2] = [Key::Alt, Key::AltGr];
const META: [Key; 2] = [Key::MetaLeft, Key::MetaRight];

fn is_modifier(key: Key) -> bool {
    [CTRL, SHIFT, ALT, META].iter().any(|keys| keys.contains(&key))
}

impl HotkeyState {
    pub fn new() -> Self {
        Self::default()
    }

    fn modifiers(&self) -> Modifiers {
        let any = |keys: &[Key]| self.held.iter().any(|key| keys.contains(key));
        Modifiers {
            ctrl: any(&CTRL),
            shift: any(&SHIFT),
            alt: any(&ALT),
            meta: any(&META),
        }
    }

    /// Feed one raw event; returns the view to open when a binding completes.
    pub fn on_event(
        &mut self,
        event: &EventType,
        bindings: &[(Hotkey, ViewKind)],
    ) -> Option<ViewKind> {
        match *event {
            EventType::KeyPress(key) => {
                if is_modifier(key) {
                    if !self.held.contains(&key) {
                        self.held.push(key);
                    }
                    return None;
                }
                if self.latched == Some(key) {
                    return None;
                }
                let held = self.modifiers();
                let hit = bindings
                    .iter()
                    .find(|(hotkey, _)| hotkey.key == key && hotkey.modifiers == held)
                    .map(|(_, kind)| *kind);
                if hit.is_some() {
                    self.latched = Some(key);
                }
                hit
            }
            EventType::KeyRelease(key) => {
                if is_modifier(key) {
                    self.held.retain(|held| *held != key);
                } else if self.latched == Some(key) {
                    self.latched = None;
                }
                None
            }
            _ => None,
        }
    }
}
