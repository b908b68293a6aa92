//! Shared configuration data types
//!
//! Wire-format structs for everything the deck persists: button actions,
//! button definitions, named presets and bar widget bindings. The JSON
//! shapes are stable and human-editable, so every field is defaulted and
//! unknown settings keys are carried through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::fonts;

/// Effect triggered by pressing a deck button.
///
/// Stored on disk as `{"type": "method"|"program"|"shortcut"|"", "value": str}`.
/// An empty value means "no action" regardless of the stored kind, and an
/// unrecognized kind collapses to `None` the same way.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    None,
    /// Dispatch to a built-in operation by name
    Method(String),
    /// Launch an external executable
    Program(String),
    /// Emit a synthetic key sequence
    Shortcut(String),
}

#[derive(Serialize, Deserialize, Default)]
struct ActionWire {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    value: String,
}

impl Serialize for Action {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (kind, value) = match self {
            Action::None => ("", ""),
            Action::Method(v) => ("method", v.as_str()),
            Action::Program(v) => ("program", v.as_str()),
            Action::Shortcut(v) => ("shortcut", v.as_str()),
        };
        ActionWire {
            kind: kind.to_string(),
            value: value.to_string(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = ActionWire::deserialize(deserializer)?;
        if wire.value.is_empty() {
            return Ok(Action::None);
        }
        Ok(match wire.kind.as_str() {
            "method" => Action::Method(wire.value),
            "program" => Action::Program(wire.value),
            "shortcut" => Action::Shortcut(wire.value),
            _ => Action::None,
        })
    }
}

impl Action {
    pub fn is_none(&self) -> bool {
        matches!(self, Action::None)
    }
}

/// One button slot's stored definition: icon, caption, font and action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ButtonDef {
    #[serde(default)]
    pub icon_path: String,
    #[serde(default)]
    pub sign: String,
    #[serde(default)]
    pub font: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default)]
    pub action: Action,
}

impl ButtonDef {
    /// True when nothing is assigned to the slot
    pub fn is_empty(&self) -> bool {
        self.icon_path.is_empty() && self.sign.is_empty() && self.action.is_none()
    }

    /// The definition written back when a button is cleared.
    /// Uses the implementation-defined default font family.
    pub fn cleared() -> Self {
        Self {
            icon_path: String::new(),
            sign: String::new(),
            font: fonts::DEFAULT_FAMILY.to_string(),
            font_size: None,
            action: Action::None,
        }
    }
}

/// A named, reusable button definition applicable to any slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(flatten)]
    pub button: ButtonDef,
}

/// Free-form widget settings: a mandatory 2D pixel position plus
/// type-specific keys (font size for a clock, etc.) preserved verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WidgetSettings {
    #[serde(default)]
    pub position: [i32; 2],
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Binding of a bar slot to a widget type plus its settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetBinding {
    pub widget_type: String,
    #[serde(default)]
    pub settings: WidgetSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_roundtrip_method() {
        let action = Action::Method("sound_up".to_string());
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, r#"{"type":"method","value":"sound_up"}"#);
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn action_empty_value_is_absent_regardless_of_kind() {
        let back: Action = serde_json::from_str(r#"{"type":"program","value":""}"#).unwrap();
        assert_eq!(back, Action::None);
    }

    #[test]
    fn action_unknown_kind_collapses_to_none() {
        let back: Action = serde_json::from_str(r#"{"type":"macro","value":"x"}"#).unwrap();
        assert_eq!(back, Action::None);
    }

    #[test]
    fn action_missing_fields_default_to_none() {
        let back: Action = serde_json::from_str("{}").unwrap();
        assert_eq!(back, Action::None);
        assert_eq!(
            serde_json::to_string(&back).unwrap(),
            r#"{"type":"","value":""}"#
        );
    }

    #[test]
    fn button_def_defaults_are_empty() {
        let def: ButtonDef = serde_json::from_str("{}").unwrap();
        assert!(def.is_empty());
        assert_eq!(def.font_size, None);
        assert_eq!(def.action, Action::None);
    }

    #[test]
    fn button_def_skips_absent_font_size() {
        let json = serde_json::to_string(&ButtonDef::default()).unwrap();
        assert!(!json.contains("font_size"));
    }

    #[test]
    fn cleared_button_uses_default_font() {
        let def = ButtonDef::cleared();
        assert!(def.is_empty());
        assert_eq!(def.font, fonts::DEFAULT_FAMILY);
    }

    #[test]
    fn preset_flattens_button_fields() {
        let preset = Preset {
            name: "Open Photoshop".to_string(),
            button: ButtonDef {
                sign: "PS".to_string(),
                action: Action::Program("/opt/ps".to_string()),
                ..ButtonDef::default()
            },
        };
        let value = serde_json::to_value(&preset).unwrap();
        assert_eq!(value["name"], "Open Photoshop");
        assert_eq!(value["sign"], "PS");
        assert_eq!(value["action"]["type"], "program");
    }

    #[test]
    fn widget_settings_preserve_extra_keys() {
        let json = r#"{"widget_type":"ClockWidget","settings":{"position":[10,4],"font_size":20,"alignment":"right"}}"#;
        let binding: WidgetBinding = serde_json::from_str(json).unwrap();
        assert_eq!(binding.settings.position, [10, 4]);
        assert_eq!(binding.settings.extra["font_size"], 20);
        let back = serde_json::to_value(&binding).unwrap();
        assert_eq!(back["settings"]["alignment"], "right");
    }
}
