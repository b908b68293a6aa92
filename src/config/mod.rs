//! Configuration stores
//!
//! Three independent file-backed stores plus typed views over the settings
//! blobs nested in the deck config:
//! - **deck**: keyed pages of button definitions (`config.json`)
//! - **presets**: named reusable button definitions (`CustomButtons.json`)
//! - **bar**: widget bindings for the bar slots (`config_bar.json`)

pub mod bar;
pub mod deck;
pub mod presets;
pub mod settings;

pub use bar::BarLayoutStore;
pub use deck::ConfigStore;
pub use presets::PresetRegistry;
pub use settings::{AudioSettings, HwMonitorSettings};
