#![forbid(unsafe_code)]

mod actions;
mod config;
mod constants;
mod hotkeys;
mod keysend;
mod launcher;
mod monitor;
mod remote;
mod sequencer;
mod types;
mod widgets;

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use tracing::{Level as TraceLevel, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use actions::{MethodId, MethodTable, resolve_and_invoke};
use config::{AudioSettings, BarLayoutStore, ConfigStore, HwMonitorSettings, PresetRegistry};
use hotkeys::{DeckCommand, spawn_listener};
use keysend::{ShortcutSender, UinputSender, UnavailableSender};
use launcher::SystemLauncher;
use monitor::{ProcSensorSource, SensorPoller};
use remote::{DownloadPool, HttpFetcher, RemoteState};
use sequencer::PageSequencer;
use widgets::{WidgetKind, resolve_bindings};

/// Best-effort list of audio output device names from ALSA.
/// Used only to backfill unassigned device slots; empty is fine.
fn available_audio_devices() -> Vec<String> {
    let Ok(cards) = std::fs::read_to_string("/proc/asound/cards") else {
        return Vec::new();
    };
    cards
        .lines()
        .filter_map(|line| line.split_once(" - ").map(|(_, name)| name.trim().to_string()))
        .filter(|name| !name.is_empty())
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_dir: PathBuf = dirs::config_dir()
        .ok_or("could not determine user config directory")?
        .join(constants::config::APP_DIR);
    info!(path = %config_dir.display(), "Using config directory");

    // Load all three stores; each self-heals missing or corrupt files
    let store = ConfigStore::new(&config_dir);
    let mut deck = store.load();
    info!(pages = deck.page_count(), "Deck configuration loaded");

    let presets = PresetRegistry::new(&config_dir);
    info!(count = presets.list().len(), "Preset registry loaded");

    let bar_store = BarLayoutStore::new(&config_dir);
    let bar_layout = bar_store.load();
    let bar_slots = resolve_bindings(&bar_layout);
    info!(slots = bar_slots.len(), "Bar layout loaded");

    // Fill unassigned audio device slots from whatever is plugged in now
    let mut audio = AudioSettings::from_config(&deck);
    if audio.backfill(&available_audio_devices()) {
        audio.write_to(&mut deck);
        store.save(&deck);
        info!("Audio device slots backfilled");
    }

    let hw_settings = HwMonitorSettings::from_config(&deck);
    debug!(
        cpu_sensor = %hw_settings.cpu_sensor_name,
        gpu_sensor = %hw_settings.gpu_sensor_name,
        "Hardware monitor selection"
    );

    let sequencer = Rc::new(RefCell::new(PageSequencer::new()));
    sequencer.borrow_mut().set_keys(deck.page_keys());
    info!(label = %sequencer.borrow().label(), "Page sequencer ready");

    // Shortcut actions need a virtual keyboard; degrade per-press without one
    let sender: Rc<dyn ShortcutSender> = match UinputSender::new() {
        Ok(sender) => Rc::new(sender),
        Err(e) => {
            warn!(error = %e, "Virtual keyboard unavailable, shortcut actions will fail");
            Rc::new(UnavailableSender)
        }
    };
    let launcher = SystemLauncher;

    let mut methods = MethodTable::new();
    methods.register_action(
        MethodId::OpenBrowser,
        Box::new(|| launcher::open_browser(constants::programs::HOME_URL)),
    );
    methods.register_action(
        MethodId::OpenCalculator,
        Box::new(|| {
            use launcher::ProgramLauncher;
            SystemLauncher.launch(Path::new(constants::programs::CALCULATOR))
        }),
    );
    methods.register_action(
        MethodId::OpenNotepad,
        Box::new(|| {
            use launcher::ProgramLauncher;
            SystemLauncher.launch(Path::new(constants::programs::TEXT_EDITOR))
        }),
    );
    {
        let sender = Rc::clone(&sender);
        methods.register_action(MethodId::SoundUp, Box::new(move || sender.send("volume up")));
    }
    {
        let sender = Rc::clone(&sender);
        methods.register_action(
            MethodId::SoundDown,
            Box::new(move || sender.send("volume down")),
        );
    }
    {
        let sender = Rc::clone(&sender);
        methods.register_action(
            MethodId::MediaPlayPause,
            Box::new(move || sender.send("play/pause media")),
        );
    }
    {
        let sequencer = Rc::clone(&sequencer);
        methods.register_host(
            MethodId::NextPage,
            Box::new(move || {
                if let Some(page) = sequencer.borrow_mut().next() {
                    info!(page = page, "Page changed");
                }
                Ok(())
            }),
        );
    }
    {
        let sequencer = Rc::clone(&sequencer);
        methods.register_host(
            MethodId::PreviousPage,
            Box::new(move || {
                if let Some(page) = sequencer.borrow_mut().previous() {
                    info!(page = page, "Page changed");
                }
                Ok(())
            }),
        );
    }

    // Create channel for hotkey threads -> main loop
    let (cmd_tx, cmd_rx) = mpsc::channel();

    // Spawn hotkey listener (optional - skip if permissions denied)
    let _hotkey_handles = if hotkeys::check_permissions() {
        match spawn_listener(cmd_tx) {
            Ok(handles) => {
                info!("Hotkey support enabled (PageUp/PageDown, F13-F24)");
                Some(handles)
            }
            Err(e) => {
                error!("Failed to start hotkey listener: {}", e);
                hotkeys::print_permission_error();
                None
            }
        }
    } else {
        hotkeys::print_permission_error();
        None
    };

    // Hardware sensors feed the bar widgets; latest reading wins
    let (sensor_tx, sensor_rx) = mpsc::channel();
    let poller = SensorPoller::spawn(
        ProcSensorSource::new(vec![PathBuf::from("/")]),
        Duration::from_secs(2),
        move |readings| {
            let _ = sensor_tx.send(readings);
        },
    );

    // Artwork downloads only matter when a music widget is on the bar
    let (art_tx, art_rx) = mpsc::channel();
    let pool = bar_slots
        .iter()
        .any(|slot| slot.kind == WidgetKind::Music)
        .then(|| DownloadPool::new(2, Arc::new(HttpFetcher), art_tx));
    let mut remote_state = RemoteState::new();

    let shutdown = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&shutdown))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&shutdown))?;

    info!("Deck engine running");
    while !shutdown.load(Ordering::Relaxed) {
        match cmd_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(command) => {
                info!("Received deck command: {:?}", command);
                match command {
                    DeckCommand::NextPage => {
                        if let Some(page) = sequencer.borrow_mut().next() {
                            info!(page = page, "Page changed");
                        }
                    }
                    DeckCommand::PreviousPage => {
                        if let Some(page) = sequencer.borrow_mut().previous() {
                            info!(page = page, "Page changed");
                        }
                    }
                    DeckCommand::PressButton(slot) => {
                        let page_key = sequencer.borrow().current_key().map(str::to_string);
                        let Some(page_key) = page_key else {
                            warn!("No active page, ignoring button press");
                            continue;
                        };
                        let Some(def) = deck.button(&page_key, u32::from(slot)).cloned() else {
                            debug!(page = %page_key, slot = slot, "Empty button slot");
                            continue;
                        };
                        let outcome =
                            resolve_and_invoke(&def.action, &mut methods, &launcher, &*sender);
                        debug!(page = %page_key, slot = slot, outcome = ?outcome, "Button handled");
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                error!("All hotkey listeners stopped, shutting down");
                break;
            }
        }

        // Only the newest sensor snapshot matters
        if let Some(readings) = sensor_rx.try_iter().last() {
            debug!(
                cpu = readings.cpu_load_percent,
                ram_mb = readings.ram_used_mb,
                "Sensor update"
            );
        }

        for result in art_rx.try_iter() {
            remote_state.apply(result);
        }
    }

    info!("Shutting down");
    poller.stop(Duration::from_secs(2));
    if let Some(pool) = pool {
        pool.shutdown();
    }
    Ok(())
}
