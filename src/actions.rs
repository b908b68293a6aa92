//! Button action resolution and dispatch
//!
//! Turns a stored action descriptor into an effect: a built-in method, an
//! external program launch, or a synthetic key sequence. Every invocation
//! path is isolated per button - failures are reduced to a log line and a
//! typed `Outcome`, never allowed to unwind into the event loop.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use tracing::{error, warn};

use crate::keysend::ShortcutSender;
use crate::launcher::ProgramLauncher;
use crate::types::Action;

/// The closed set of built-in operations assignable to a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodId {
    OpenBrowser,
    OpenCalculator,
    OpenNotepad,
    SoundUp,
    SoundDown,
    MediaPlayPause,
    NextPage,
    PreviousPage,
}

impl MethodId {
    /// Resolve a stored method name. Unknown names yield `None`; the
    /// resolver treats that as a soft failure, not a crash.
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "open_browser" => MethodId::OpenBrowser,
            "open_calculator" => MethodId::OpenCalculator,
            "open_notepad" => MethodId::OpenNotepad,
            "sound_up" => MethodId::SoundUp,
            "sound_down" => MethodId::SoundDown,
            "media_play_pause" => MethodId::MediaPlayPause,
            "next_page" => MethodId::NextPage,
            "previous_page" => MethodId::PreviousPage,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            MethodId::OpenBrowser => "open_browser",
            MethodId::OpenCalculator => "open_calculator",
            MethodId::OpenNotepad => "open_notepad",
            MethodId::SoundUp => "sound_up",
            MethodId::SoundDown => "sound_down",
            MethodId::MediaPlayPause => "media_play_pause",
            MethodId::NextPage => "next_page",
            MethodId::PreviousPage => "previous_page",
        }
    }
}

pub type MethodFn<'a> = Box<dyn FnMut() -> Result<()> + 'a>;

/// Zero-argument bindings for the built-in methods, resolved at startup.
///
/// Two scopes are checked in priority order: the action scope (OS-level
/// built-ins) and the host scope (page navigation living on the engine).
/// First match wins.
#[derive(Default)]
pub struct MethodTable<'a> {
    action_scope: HashMap<MethodId, MethodFn<'a>>,
    host_scope: HashMap<MethodId, MethodFn<'a>>,
}

impl<'a> MethodTable<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_action(&mut self, id: MethodId, f: MethodFn<'a>) {
        self.action_scope.insert(id, f);
    }

    pub fn register_host(&mut self, id: MethodId, f: MethodFn<'a>) {
        self.host_scope.insert(id, f);
    }

    fn lookup(&mut self, id: MethodId) -> Option<&mut MethodFn<'a>> {
        if self.action_scope.contains_key(&id) {
            return self.action_scope.get_mut(&id);
        }
        self.host_scope.get_mut(&id)
    }
}

/// Result of a single button invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The bound effect ran successfully
    Ran,
    /// Empty action - nothing to do, not an error
    NoAction,
    /// Method name not in the table (either scope)
    UnknownMethod,
    /// The effect was attempted and failed; already logged
    Failed,
}

/// Dispatch one button action. Never panics and never propagates an error:
/// one misconfigured button must not prevent the others from working.
pub fn resolve_and_invoke(
    action: &Action,
    methods: &mut MethodTable<'_>,
    launcher: &dyn ProgramLauncher,
    sender: &dyn ShortcutSender,
) -> Outcome {
    match action {
        Action::None => Outcome::NoAction,
        Action::Method(name) => {
            let Some(id) = MethodId::parse(name) else {
                warn!(method = %name, "Unknown built-in method, ignoring");
                return Outcome::UnknownMethod;
            };
            let Some(binding) = methods.lookup(id) else {
                warn!(method = %name, "Built-in method has no registered binding");
                return Outcome::UnknownMethod;
            };
            match binding() {
                Ok(()) => Outcome::Ran,
                Err(e) => {
                    error!(method = %name, error = %e, "Built-in method failed");
                    Outcome::Failed
                }
            }
        }
        Action::Program(path) => {
            let path = Path::new(path);
            if path.as_os_str().is_empty() || !path.exists() {
                error!(path = %path.display(), "Program not found");
                return Outcome::Failed;
            }
            match launcher.launch(path) {
                Ok(()) => Outcome::Ran,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Failed to launch program");
                    Outcome::Failed
                }
            }
        }
        Action::Shortcut(combo) => {
            // Key-name matching is case-insensitive
            match sender.send(&combo.to_lowercase()) {
                Ok(()) => Outcome::Ran,
                Err(e) => {
                    error!(combo = %combo, error = %e, "Failed to send shortcut");
                    Outcome::Failed
                }
            }
        }
    }
}
