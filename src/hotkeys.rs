use anyhow::{Context, Result};
use evdev::{Device, EventType, InputEventKind, Key};
use std::sync::mpsc::Sender;
use std::thread;
use tracing::{debug, error, info, warn};

use crate::constants::{deck, input, paths, permissions};

/// Commands a physical hotkey can inject into the engine loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckCommand {
    NextPage,
    PreviousPage,
    /// 1-based button slot on the current page
    PressButton(u8),
}

/// Map a pressed key to a deck command. F13-F24 are the macro keys most
/// external decks emit; PageUp/PageDown flip pages.
fn command_for_key(key: Key) -> Option<DeckCommand> {
    let slot = match key {
        Key::KEY_PAGEDOWN => return Some(DeckCommand::NextPage),
        Key::KEY_PAGEUP => return Some(DeckCommand::PreviousPage),
        Key::KEY_F13 => 1,
        Key::KEY_F14 => 2,
        Key::KEY_F15 => 3,
        Key::KEY_F16 => 4,
        Key::KEY_F17 => 5,
        Key::KEY_F18 => 6,
        Key::KEY_F19 => 7,
        Key::KEY_F20 => 8,
        Key::KEY_F21 => 9,
        Key::KEY_F22 => 10,
        Key::KEY_F23 => 11,
        Key::KEY_F24 => 12,
        _ => return None,
    };
    debug_assert!(u32::from(slot) <= deck::BUTTONS_PER_PAGE);
    Some(DeckCommand::PressButton(slot))
}

/// Find all keyboard devices
fn find_all_keyboard_devices() -> Result<Vec<Device>> {
    info!(path = %paths::DEV_INPUT, "Scanning for keyboard devices...");

    let mut devices = Vec::new();

    for entry in std::fs::read_dir(paths::DEV_INPUT).context(format!(
        "Failed to read {} - are you in the '{}' group?",
        paths::DEV_INPUT,
        permissions::INPUT_GROUP
    ))? {
        let entry = entry?;
        let path = entry.path();

        // Try to open device
        if let Ok(device) = Device::open(&path) {
            // Anything with a Tab key counts as a keyboard
            if let Some(keys) = device.supported_keys() {
                if keys.contains(Key::KEY_TAB) {
                    let key_count = keys.iter().count();
                    info!(device_path = %path.display(), name = ?device.name(), key_count = key_count, "Found keyboard device");
                    devices.push(device);
                }
            }
        }
    }

    if devices.is_empty() {
        anyhow::bail!(
            "No keyboard device found. Ensure you're in '{}' group:\n\
             {}\n\
             Then log out and back in.",
            permissions::INPUT_GROUP,
            permissions::ADD_TO_INPUT_GROUP
        )
    }

    info!(count = devices.len(), "Listening on keyboard device(s)");

    Ok(devices)
}

/// Spawn background threads listening for deck hotkeys on all keyboards
pub fn spawn_listener(sender: Sender<DeckCommand>) -> Result<Vec<thread::JoinHandle<()>>> {
    let devices = find_all_keyboard_devices()?;
    let mut handles = Vec::new();

    for device in devices {
        let sender = sender.clone();
        let handle = thread::spawn(move || {
            info!(device = ?device.name(), "Hotkey listener started");
            if let Err(e) = listen_for_hotkeys(device, sender) {
                error!(error = %e, "Hotkey listener error");
            }
        });
        handles.push(handle);
    }

    Ok(handles)
}

/// Listen for deck hotkey events on a single device
fn listen_for_hotkeys(mut device: Device, sender: Sender<DeckCommand>) -> Result<()> {
    loop {
        // Fetch events (blocks until available)
        let events = device.fetch_events().context("Failed to fetch events")?;

        for event in events {
            if event.event_type() != EventType::KEY {
                continue;
            }

            if let InputEventKind::Key(key) = event.kind() {
                debug!(key = ?key, value = event.value(), "Key event");
                if event.value() != input::KEY_PRESS {
                    continue;
                }
                if let Some(command) = command_for_key(key) {
                    info!(key = ?key, command = ?command, "Deck hotkey pressed, sending command");
                    sender
                        .send(command)
                        .context("Failed to send deck command")?;
                }
            }
        }
    }
}

/// Check if hotkeys are available (user has input group permissions)
pub fn check_permissions() -> bool {
    std::fs::read_dir(paths::DEV_INPUT).is_ok()
}

/// Print helpful error message if permissions missing
pub fn print_permission_error() {
    error!(path = %paths::DEV_INPUT, "Cannot access input devices");
    error!(group = %permissions::INPUT_GROUP, "Hotkeys require group membership");
    error!(command = %permissions::ADD_TO_INPUT_GROUP, "Add user to input group");
    error!("  Then log out and back in");
    warn!(continuing = true, "Continuing without hotkey support...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_keys_map_to_navigation() {
        assert_eq!(command_for_key(Key::KEY_PAGEDOWN), Some(DeckCommand::NextPage));
        assert_eq!(
            command_for_key(Key::KEY_PAGEUP),
            Some(DeckCommand::PreviousPage)
        );
    }

    #[test]
    fn macro_keys_cover_every_button_slot() {
        let macro_keys = [
            Key::KEY_F13,
            Key::KEY_F14,
            Key::KEY_F15,
            Key::KEY_F16,
            Key::KEY_F17,
            Key::KEY_F18,
            Key::KEY_F19,
            Key::KEY_F20,
            Key::KEY_F21,
            Key::KEY_F22,
            Key::KEY_F23,
            Key::KEY_F24,
        ];
        for (i, key) in macro_keys.iter().enumerate() {
            assert_eq!(
                command_for_key(*key),
                Some(DeckCommand::PressButton(i as u8 + 1))
            );
        }
        assert_eq!(command_for_key(Key::KEY_A), None);
    }
}
