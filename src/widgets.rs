//! Closed registry of bar widget types
//!
//! The bar layout stores widget type names as strings; this module is the
//! single place that decides which names exist. Unknown names are skipped
//! with a warning, never fatal - a hand-edited layout file must not take
//! the bar down.

use tracing::warn;

use crate::config::bar::BarLayout;
use crate::types::WidgetSettings;

/// The widget types a bar slot can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Clock,
    Volume,
    Music,
    Timer,
    HwMonitor,
}

impl WidgetKind {
    /// Resolve a stored type name against the registry
    pub fn parse(type_name: &str) -> Option<Self> {
        Some(match type_name {
            "ClockWidget" => WidgetKind::Clock,
            "VolumeWidget" => WidgetKind::Volume,
            "MusicWidget" => WidgetKind::Music,
            "TimerWidget" => WidgetKind::Timer,
            "HwMonitorWidget" => WidgetKind::HwMonitor,
            _ => return None,
        })
    }

    pub fn type_name(self) -> &'static str {
        match self {
            WidgetKind::Clock => "ClockWidget",
            WidgetKind::Volume => "VolumeWidget",
            WidgetKind::Music => "MusicWidget",
            WidgetKind::Timer => "TimerWidget",
            WidgetKind::HwMonitor => "HwMonitorWidget",
        }
    }

    pub const ALL: [WidgetKind; 5] = [
        WidgetKind::Clock,
        WidgetKind::Volume,
        WidgetKind::Music,
        WidgetKind::Timer,
        WidgetKind::HwMonitor,
    ];
}

/// A bar slot resolved to a constructible widget kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSlot<'a> {
    pub slot_id: &'a str,
    pub kind: WidgetKind,
    pub settings: &'a WidgetSettings,
}

/// Resolve every binding in a bar layout, warning and skipping slots whose
/// widget type name is not in the registry.
pub fn resolve_bindings(layout: &BarLayout) -> Vec<ResolvedSlot<'_>> {
    let mut resolved = Vec::new();
    for (slot_id, binding) in layout {
        match WidgetKind::parse(&binding.widget_type) {
            Some(kind) => resolved.push(ResolvedSlot {
                slot_id,
                kind,
                settings: &binding.settings,
            }),
            None => {
                warn!(slot = %slot_id, widget_type = %binding.widget_type, "Unknown widget type, skipping slot");
            }
        }
    }
    resolved
}
