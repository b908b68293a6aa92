//! Application-wide constants
//!
//! Single source of truth for config file names, key prefixes and the
//! fixed slot counts of the deck layout.

/// Configuration file locations
pub mod config {
    /// Subdirectory under the user config dir holding all deckpad files
    pub const APP_DIR: &str = "deckpad";

    /// Button/page configuration (plus nested settings blobs)
    pub const DECK_FILE: &str = "config.json";

    /// Bar widget layout
    pub const BAR_FILE: &str = "config_bar.json";

    /// Named button presets
    pub const PRESET_FILE: &str = "CustomButtons.json";
}

/// Page and button key conventions
pub mod deck {
    /// Prefix for page keys in the config file ("page_1", "page_2", ...)
    pub const PAGE_PREFIX: &str = "page_";

    /// Prefix for button slot keys within a page ("toolButton_1" ... "toolButton_12")
    pub const BUTTON_PREFIX: &str = "toolButton_";

    /// Fixed number of button slots per page
    pub const BUTTONS_PER_PAGE: u32 = 12;

    /// Maximum number of pages a deck may hold
    pub const MAX_PAGES: usize = 10;
}

/// Bar widget slot conventions
pub mod bar {
    /// Prefix for bar slot identifiers ("Bar_target_1" ... "Bar_target_5")
    pub const SLOT_PREFIX: &str = "Bar_target_";

    /// Fixed number of bar slots
    pub const SLOT_COUNT: u32 = 5;
}

/// Keys inside the audio_settings blob
pub mod audio {
    /// The five named device-ID slots, in display order
    pub const DEVICE_SLOT_KEYS: [&str; 5] = [
        "main_device_id",
        "second_device_id",
        "third_device_id",
        "fourth_device_id",
        "fifth_device_id",
    ];

    /// Top-level key of the audio settings blob in the deck config
    pub const SECTION: &str = "audio_settings";
}

/// Keys inside the hwinfo_settings blob
pub mod hwinfo {
    pub const SECTION: &str = "hwinfo_settings";
    pub const SELECTED_GPU: &str = "selected_gpu_name";
    pub const CPU_SENSOR: &str = "cpu_sensor_name";
    pub const GPU_SENSOR: &str = "gpu_sensor_name";
}

/// Font defaults for button definitions
pub mod fonts {
    /// Default family applied when a button is cleared.
    /// First entry of the safe-font list the editor offers.
    pub const DEFAULT_FAMILY: &str = "Arial";
}

/// Built-in action targets
pub mod programs {
    pub const CALCULATOR: &str = "gnome-calculator";
    pub const TEXT_EDITOR: &str = "gedit";
    pub const HOME_URL: &str = "https://www.google.com";
}

/// Input event constants (from evdev)
pub mod input {
    /// Key press event value
    pub const KEY_PRESS: i32 = 1;

    /// Key release event value
    pub const KEY_RELEASE: i32 = 0;
}

/// Input device access
pub mod paths {
    pub const DEV_INPUT: &str = "/dev/input";
}

pub mod permissions {
    pub const INPUT_GROUP: &str = "input";
    pub const ADD_TO_INPUT_GROUP: &str = "sudo usermod -aG input $USER";
}
