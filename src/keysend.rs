//! Synthetic keystroke emission
//!
//! Shortcut actions store a human-readable combo string such as
//! "ctrl+shift+s" or "play/pause media". Key-name matching is
//! case-insensitive. The concrete sender writes through a uinput virtual
//! keyboard; when that device cannot be created the engine keeps running
//! with a sender that fails per call.

use std::sync::Mutex;

use anyhow::{Context, Result, anyhow, bail};
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key};
use tracing::info;

use crate::constants::input::{KEY_PRESS, KEY_RELEASE};

/// Emits a synthetic key sequence for a combo string.
pub trait ShortcutSender {
    fn send(&self, combo: &str) -> Result<()>;
}

/// Multi-word key names, matched against the whole combo string first so
/// "play/pause media" is not split on its slash.
const NAMED_CHORDS: &[(&str, Key)] = &[
    ("play/pause media", Key::KEY_PLAYPAUSE),
    ("stop media", Key::KEY_STOPCD),
    ("next track", Key::KEY_NEXTSONG),
    ("previous track", Key::KEY_PREVIOUSSONG),
    ("volume up", Key::KEY_VOLUMEUP),
    ("volume down", Key::KEY_VOLUMEDOWN),
    ("volume mute", Key::KEY_MUTE),
    ("page up", Key::KEY_PAGEUP),
    ("page down", Key::KEY_PAGEDOWN),
];

const NAMED_TOKENS: &[(&str, Key)] = &[
    ("ctrl", Key::KEY_LEFTCTRL),
    ("control", Key::KEY_LEFTCTRL),
    ("shift", Key::KEY_LEFTSHIFT),
    ("alt", Key::KEY_LEFTALT),
    ("win", Key::KEY_LEFTMETA),
    ("super", Key::KEY_LEFTMETA),
    ("meta", Key::KEY_LEFTMETA),
    ("space", Key::KEY_SPACE),
    ("enter", Key::KEY_ENTER),
    ("return", Key::KEY_ENTER),
    ("tab", Key::KEY_TAB),
    ("esc", Key::KEY_ESC),
    ("escape", Key::KEY_ESC),
    ("backspace", Key::KEY_BACKSPACE),
    ("delete", Key::KEY_DELETE),
    ("insert", Key::KEY_INSERT),
    ("home", Key::KEY_HOME),
    ("end", Key::KEY_END),
    ("up", Key::KEY_UP),
    ("down", Key::KEY_DOWN),
    ("left", Key::KEY_LEFT),
    ("right", Key::KEY_RIGHT),
    ("f1", Key::KEY_F1),
    ("f2", Key::KEY_F2),
    ("f3", Key::KEY_F3),
    ("f4", Key::KEY_F4),
    ("f5", Key::KEY_F5),
    ("f6", Key::KEY_F6),
    ("f7", Key::KEY_F7),
    ("f8", Key::KEY_F8),
    ("f9", Key::KEY_F9),
    ("f10", Key::KEY_F10),
    ("f11", Key::KEY_F11),
    ("f12", Key::KEY_F12),
];

fn letter_or_digit(token: &str) -> Option<Key> {
    let mut chars = token.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    let key = match c {
        'a' => Key::KEY_A,
        'b' => Key::KEY_B,
        'c' => Key::KEY_C,
        'd' => Key::KEY_D,
        'e' => Key::KEY_E,
        'f' => Key::KEY_F,
        'g' => Key::KEY_G,
        'h' => Key::KEY_H,
        'i' => Key::KEY_I,
        'j' => Key::KEY_J,
        'k' => Key::KEY_K,
        'l' => Key::KEY_L,
        'm' => Key::KEY_M,
        'n' => Key::KEY_N,
        'o' => Key::KEY_O,
        'p' => Key::KEY_P,
        'q' => Key::KEY_Q,
        'r' => Key::KEY_R,
        's' => Key::KEY_S,
        't' => Key::KEY_T,
        'u' => Key::KEY_U,
        'v' => Key::KEY_V,
        'w' => Key::KEY_W,
        'x' => Key::KEY_X,
        'y' => Key::KEY_Y,
        'z' => Key::KEY_Z,
        '0' => Key::KEY_0,
        '1' => Key::KEY_1,
        '2' => Key::KEY_2,
        '3' => Key::KEY_3,
        '4' => Key::KEY_4,
        '5' => Key::KEY_5,
        '6' => Key::KEY_6,
        '7' => Key::KEY_7,
        '8' => Key::KEY_8,
        '9' => Key::KEY_9,
        _ => return None,
    };
    Some(key)
}

fn lookup_token(token: &str) -> Option<Key> {
    NAMED_TOKENS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|&(_, key)| key)
        .or_else(|| letter_or_digit(token))
}

/// Parse a combo string into the key chain to press, in order.
/// Key names are matched case-insensitively; unknown names are errors.
pub fn parse_combo(combo: &str) -> Result<Vec<Key>> {
    let combo = combo.trim().to_lowercase();
    if combo.is_empty() {
        bail!("empty key combo");
    }
    if let Some(&(_, key)) = NAMED_CHORDS.iter().find(|(name, _)| *name == combo) {
        return Ok(vec![key]);
    }
    combo
        .split('+')
        .map(str::trim)
        .map(|token| lookup_token(token).ok_or_else(|| anyhow!("unknown key name '{token}'")))
        .collect()
}

/// Every key any combo can produce, for registering the virtual device
fn all_mappable_keys() -> AttributeSet<Key> {
    let mut keys = AttributeSet::new();
    for &(_, key) in NAMED_CHORDS.iter().chain(NAMED_TOKENS) {
        keys.insert(key);
    }
    for c in ('a'..='z').chain('0'..='9') {
        if let Some(key) = letter_or_digit(&c.to_string()) {
            keys.insert(key);
        }
    }
    keys
}

/// Sender backed by a uinput virtual keyboard.
pub struct UinputSender {
    device: Mutex<VirtualDevice>,
}

impl UinputSender {
    pub fn new() -> Result<Self> {
        let device = VirtualDeviceBuilder::new()
            .context("Failed to open /dev/uinput - is the uinput module loaded?")?
            .name("deckpad virtual keyboard")
            .with_keys(&all_mappable_keys())
            .context("Failed to register virtual keyboard keys")?
            .build()
            .context("Failed to create virtual keyboard")?;
        info!("Virtual keyboard ready for shortcut actions");
        Ok(Self {
            device: Mutex::new(device),
        })
    }
}

impl ShortcutSender for UinputSender {
    fn send(&self, combo: &str) -> Result<()> {
        let chain = parse_combo(combo)?;
        let mut device = self
            .device
            .lock()
            .map_err(|_| anyhow!("virtual keyboard mutex poisoned"))?;
        for key in &chain {
            device.emit(&[InputEvent::new(EventType::KEY, key.code(), KEY_PRESS)])?;
        }
        for key in chain.iter().rev() {
            device.emit(&[InputEvent::new(EventType::KEY, key.code(), KEY_RELEASE)])?;
        }
        info!(combo = %combo, keys = chain.len(), "Sent shortcut");
        Ok(())
    }
}

/// Stand-in used when the virtual keyboard could not be created.
/// Shortcut actions fail per-press instead of taking the engine down.
pub struct UnavailableSender;

impl ShortcutSender for UnavailableSender {
    fn send(&self, combo: &str) -> Result<()> {
        bail!("shortcut '{combo}' not sent: virtual keyboard unavailable")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modifier_chain_in_order() {
        let chain = parse_combo("ctrl+shift+s").unwrap();
        assert_eq!(
            chain,
            vec![Key::KEY_LEFTCTRL, Key::KEY_LEFTSHIFT, Key::KEY_S]
        );
    }

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!(
            parse_combo("Ctrl+Alt+Delete").unwrap(),
            parse_combo("ctrl+alt+delete").unwrap()
        );
    }

    #[test]
    fn media_chord_is_not_split_on_slash() {
        assert_eq!(
            parse_combo("play/pause media").unwrap(),
            vec![Key::KEY_PLAYPAUSE]
        );
        assert_eq!(parse_combo("Volume Up").unwrap(), vec![Key::KEY_VOLUMEUP]);
    }

    #[test]
    fn unknown_key_name_is_an_error() {
        assert!(parse_combo("ctrl+bogus").is_err());
        assert!(parse_combo("").is_err());
    }

    #[test]
    fn digits_and_function_keys_parse() {
        assert_eq!(parse_combo("alt+f4").unwrap(), vec![Key::KEY_LEFTALT, Key::KEY_F4]);
        assert_eq!(parse_combo("ctrl+1").unwrap(), vec![Key::KEY_LEFTCTRL, Key::KEY_1]);
    }

    #[test]
    fn unavailable_sender_fails_per_call() {
        assert!(UnavailableSender.send("ctrl+c").is_err());
    }
}
