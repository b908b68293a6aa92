//! Audio and hardware-monitor settings blobs
//!
//! Typed views over the `audio_settings` and `hwinfo_settings` objects
//! nested in the deck config. The blobs stay opaque: only the known keys
//! are read or written, anything else a user added by hand survives.

use serde_json::{Map, Value};
use tracing::info;

use crate::config::deck::DeckConfig;
use crate::constants::{audio, hwinfo};

/// The five named audio device-ID slots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AudioSettings {
    pub devices: [String; 5],
}

fn section<'a>(config: &'a DeckConfig, key: &str) -> Option<&'a Map<String, Value>> {
    config.extra.get(key)?.as_object()
}

fn section_mut<'a>(config: &'a mut DeckConfig, key: &str) -> &'a mut Map<String, Value> {
    let entry = config
        .extra
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    entry.as_object_mut().expect("section was just made an object")
}

impl AudioSettings {
    /// Read the device slots out of the config; missing keys become empty
    /// strings.
    pub fn from_config(config: &DeckConfig) -> Self {
        let mut settings = Self::default();
        if let Some(blob) = section(config, audio::SECTION) {
            for (slot, key) in settings.devices.iter_mut().zip(audio::DEVICE_SLOT_KEYS) {
                if let Some(value) = blob.get(key).and_then(Value::as_str) {
                    *slot = value.to_string();
                }
            }
        }
        settings
    }

    /// Write the device slots back, leaving unrelated keys in the blob
    /// untouched.
    pub fn write_to(&self, config: &mut DeckConfig) {
        let blob = section_mut(config, audio::SECTION);
        for (slot, key) in self.devices.iter().zip(audio::DEVICE_SLOT_KEYS) {
            blob.insert(key.to_string(), Value::String(slot.clone()));
        }
    }

    /// Fill empty slots, in order, with available devices not yet assigned
    /// anywhere. Devices that are configured but currently unavailable are
    /// kept. Returns whether anything changed so the caller saves only on
    /// real change.
    pub fn backfill(&mut self, available: &[String]) -> bool {
        let mut unassigned: Vec<&String> = available
            .iter()
            .filter(|device| !self.devices.contains(device))
            .collect();
        let mut changed = false;
        for slot in self.devices.iter_mut() {
            if slot.is_empty() {
                if let Some(device) = (!unassigned.is_empty()).then(|| unassigned.remove(0)) {
                    info!(device = %device, "Assigning newly available audio device to empty slot");
                    *slot = device.clone();
                    changed = true;
                }
            }
        }
        changed
    }
}

/// Hardware-monitor selection: which GPU to read and which sensor names to
/// display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HwMonitorSettings {
    pub selected_gpu_name: String,
    pub cpu_sensor_name: String,
    pub gpu_sensor_name: String,
}

impl HwMonitorSettings {
    pub fn from_config(config: &DeckConfig) -> Self {
        let mut settings = Self::default();
        if let Some(blob) = section(config, hwinfo::SECTION) {
            let read = |key: &str| {
                blob.get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            settings.selected_gpu_name = read(hwinfo::SELECTED_GPU);
            settings.cpu_sensor_name = read(hwinfo::CPU_SENSOR);
            settings.gpu_sensor_name = read(hwinfo::GPU_SENSOR);
        }
        settings
    }

    pub fn write_to(&self, config: &mut DeckConfig) {
        let blob = section_mut(config, hwinfo::SECTION);
        blob.insert(
            hwinfo::SELECTED_GPU.to_string(),
            Value::String(self.selected_gpu_name.clone()),
        );
        blob.insert(
            hwinfo::CPU_SENSOR.to_string(),
            Value::String(self.cpu_sensor_name.clone()),
        );
        blob.insert(
            hwinfo::GPU_SENSOR.to_string(),
            Value::String(self.gpu_sensor_name.clone()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_audio(json: &str) -> DeckConfig {
        let mut config = DeckConfig::default_deck();
        config.extra.insert(
            audio::SECTION.to_string(),
            serde_json::from_str(json).unwrap(),
        );
        config
    }

    #[test]
    fn reads_named_slots_with_missing_keys_empty() {
        let config = config_with_audio(r#"{"main_device_id": "Speakers", "third_device_id": "HDMI"}"#);
        let settings = AudioSettings::from_config(&config);
        assert_eq!(settings.devices[0], "Speakers");
        assert_eq!(settings.devices[1], "");
        assert_eq!(settings.devices[2], "HDMI");
    }

    #[test]
    fn backfill_fills_empty_slots_with_unseen_devices() {
        let config = config_with_audio(r#"{"main_device_id": "Speakers"}"#);
        let mut settings = AudioSettings::from_config(&config);
        let available = vec![
            "Speakers".to_string(),
            "Headphones".to_string(),
            "HDMI".to_string(),
        ];

        assert!(settings.backfill(&available));
        assert_eq!(settings.devices[0], "Speakers");
        assert_eq!(settings.devices[1], "Headphones");
        assert_eq!(settings.devices[2], "HDMI");
        assert_eq!(settings.devices[3], "");
    }

    #[test]
    fn backfill_keeps_configured_but_offline_devices() {
        let config = config_with_audio(r#"{"second_device_id": "USB DAC"}"#);
        let mut settings = AudioSettings::from_config(&config);
        // "USB DAC" is offline right now but must not be displaced
        assert!(settings.backfill(&["Speakers".to_string()]));
        assert_eq!(settings.devices[0], "Speakers");
        assert_eq!(settings.devices[1], "USB DAC");
    }

    #[test]
    fn backfill_reports_no_change_when_full_or_nothing_new() {
        let config = config_with_audio(r#"{"main_device_id": "Speakers"}"#);
        let mut settings = AudioSettings::from_config(&config);
        assert!(!settings.backfill(&["Speakers".to_string()]));
        assert!(!settings.backfill(&[]));
    }

    #[test]
    fn write_back_preserves_unknown_blob_keys() {
        let mut config = config_with_audio(r#"{"main_device_id": "Old", "volume_curve": "log"}"#);
        let mut settings = AudioSettings::from_config(&config);
        settings.devices[0] = "New".to_string();
        settings.write_to(&mut config);

        let blob = config.extra[audio::SECTION].as_object().unwrap();
        assert_eq!(blob["main_device_id"], "New");
        assert_eq!(blob["volume_curve"], "log");
        // All five slots are materialized on write
        assert_eq!(blob["fifth_device_id"], "");
    }

    #[test]
    fn hw_monitor_settings_roundtrip() {
        let mut config = DeckConfig::default_deck();
        let settings = HwMonitorSettings {
            selected_gpu_name: "Radeon".to_string(),
            cpu_sensor_name: "CPU Package".to_string(),
            gpu_sensor_name: "GPU Hot Spot".to_string(),
        };
        settings.write_to(&mut config);
        assert_eq!(HwMonitorSettings::from_config(&config), settings);
    }

    #[test]
    fn hw_monitor_defaults_when_section_absent() {
        let config = DeckConfig::default_deck();
        assert_eq!(HwMonitorSettings::from_config(&config), HwMonitorSettings::default());
    }
}
