//! Hardware sensor polling
//!
//! A dedicated worker thread samples a `SensorSource` on a fixed interval
//! and pushes readings back to the event loop, fire-and-forget with
//! last-value-wins semantics. Stopping is cooperative: a flag checked
//! between iterations, with a bounded grace period before the thread is
//! written off as a non-fatal leak at shutdown.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Usage of one mounted filesystem
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiskUsage {
    pub mount: String,
    pub used_bytes: u64,
    pub total_bytes: u64,
}

/// One snapshot of the monitored hardware
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SensorReadings {
    pub cpu_load_percent: f32,
    pub cpu_temp_c: Option<f32>,
    pub gpu_load_percent: Option<f32>,
    pub gpu_temp_c: Option<f32>,
    pub ram_used_mb: u64,
    pub ram_total_mb: u64,
    pub disks: Vec<DiskUsage>,
}

/// Supplies hardware readings. Implementations own whatever OS or vendor
/// handles they need; the poller only calls `sample`.
pub trait SensorSource: Send {
    fn sample(&mut self) -> Result<SensorReadings>;
}

/// Handle to the polling worker thread.
pub struct SensorPoller {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl SensorPoller {
    /// Spawn the worker. Each successful sample is handed to `deliver`;
    /// sample errors are logged and the loop keeps going.
    pub fn spawn<S, F>(mut source: S, interval: Duration, mut deliver: F) -> Self
    where
        S: SensorSource + 'static,
        F: FnMut(SensorReadings) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            info!(interval_ms = interval.as_millis() as u64, "Sensor poller started");
            while !stop_flag.load(Ordering::Relaxed) {
                match source.sample() {
                    Ok(readings) => deliver(readings),
                    Err(e) => warn!(error = %e, "Sensor sample failed"),
                }
                // Sleep in short slices so stop requests stay responsive
                let deadline = Instant::now() + interval;
                while Instant::now() < deadline && !stop_flag.load(Ordering::Relaxed) {
                    thread::sleep(Duration::from_millis(20).min(interval));
                }
            }
            info!("Sensor poller stopped");
        });
        Self { stop, handle }
    }

    /// Request a cooperative stop and wait up to `grace` for the thread to
    /// exit. A thread that overstays is reported and leaked, never joined
    /// unboundedly.
    pub fn stop(self, grace: Duration) {
        self.stop.store(true, Ordering::Relaxed);
        let deadline = Instant::now() + grace;
        while !self.handle.is_finished() {
            if Instant::now() >= deadline {
                warn!(
                    grace_ms = grace.as_millis() as u64,
                    "Sensor poller did not stop within grace period, leaking thread"
                );
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        let _ = self.handle.join();
    }
}

/// Linux sensor source over /proc, /sys and statvfs.
pub struct ProcSensorSource {
    mounts: Vec<PathBuf>,
    prev_cpu: Option<(u64, u64)>,
}

impl ProcSensorSource {
    pub fn new(mounts: Vec<PathBuf>) -> Self {
        Self {
            mounts,
            prev_cpu: None,
        }
    }
}

/// Parse the aggregate "cpu ..." line of /proc/stat into (total, idle)
fn parse_cpu_counters(stat: &str) -> Result<(u64, u64)> {
    let line = stat
        .lines()
        .find(|l| l.starts_with("cpu "))
        .context("No aggregate cpu line in /proc/stat")?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|f| f.parse().ok())
        .collect();
    if fields.len() < 5 {
        anyhow::bail!("Short cpu line in /proc/stat");
    }
    let total = fields.iter().sum();
    // idle + iowait
    let idle = fields[3] + fields[4];
    Ok((total, idle))
}

fn meminfo_field(meminfo: &str, key: &str) -> Option<u64> {
    let line = meminfo.lines().find(|l| l.starts_with(key))?;
    line.split_whitespace().nth(1)?.parse().ok()
}

/// Parse MemTotal/MemAvailable (kB) into (used_mb, total_mb)
fn parse_ram(meminfo: &str) -> Result<(u64, u64)> {
    let total_kb = meminfo_field(meminfo, "MemTotal:").context("MemTotal missing")?;
    let avail_kb = meminfo_field(meminfo, "MemAvailable:").context("MemAvailable missing")?;
    let total_mb = total_kb / 1024;
    let used_mb = total_kb.saturating_sub(avail_kb) / 1024;
    Ok((used_mb, total_mb))
}

impl SensorSource for ProcSensorSource {
    fn sample(&mut self) -> Result<SensorReadings> {
        let stat = fs::read_to_string("/proc/stat").context("Failed to read /proc/stat")?;
        let (total, idle) = parse_cpu_counters(&stat)?;
        let cpu_load_percent = match self.prev_cpu {
            Some((prev_total, prev_idle)) if total > prev_total => {
                let d_total = (total - prev_total) as f32;
                let d_idle = idle.saturating_sub(prev_idle) as f32;
                100.0 * (d_total - d_idle) / d_total
            }
            _ => 0.0,
        };
        self.prev_cpu = Some((total, idle));

        let meminfo =
            fs::read_to_string("/proc/meminfo").context("Failed to read /proc/meminfo")?;
        let (ram_used_mb, ram_total_mb) = parse_ram(&meminfo)?;

        // Thermal zone 0 is usually the CPU package; absence is fine
        let cpu_temp_c = fs::read_to_string("/sys/class/thermal/thermal_zone0/temp")
            .ok()
            .and_then(|raw| raw.trim().parse::<f32>().ok())
            .map(|millideg| millideg / 1000.0);

        let mut disks = Vec::new();
        for mount in &self.mounts {
            match nix::sys::statvfs::statvfs(mount.as_path()) {
                Ok(stats) => {
                    let frag = stats.fragment_size() as u64;
                    let total_bytes = stats.blocks() as u64 * frag;
                    let free_bytes = stats.blocks_available() as u64 * frag;
                    disks.push(DiskUsage {
                        mount: mount.display().to_string(),
                        used_bytes: total_bytes.saturating_sub(free_bytes),
                        total_bytes,
                    });
                }
                Err(e) => {
                    warn!(mount = %mount.display(), error = %e, "statvfs failed, skipping mount");
                }
            }
        }

        Ok(SensorReadings {
            cpu_load_percent,
            cpu_temp_c,
            gpu_load_percent: None,
            gpu_temp_c: None,
            ram_used_mb,
            ram_total_mb,
            disks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct CountingSource {
        counter: u64,
    }

    impl SensorSource for CountingSource {
        fn sample(&mut self) -> Result<SensorReadings> {
            self.counter += 1;
            Ok(SensorReadings {
                ram_used_mb: self.counter,
                ..SensorReadings::default()
            })
        }
    }

    struct FailingSource;

    impl SensorSource for FailingSource {
        fn sample(&mut self) -> Result<SensorReadings> {
            anyhow::bail!("sensor unavailable")
        }
    }

    #[test]
    fn poller_delivers_samples_and_stops_within_grace() {
        let (tx, rx) = mpsc::channel();
        let poller = SensorPoller::spawn(
            CountingSource { counter: 0 },
            Duration::from_millis(5),
            move |readings| {
                let _ = tx.send(readings);
            },
        );
        std::thread::sleep(Duration::from_millis(60));
        poller.stop(Duration::from_secs(2));

        // Last-value-wins drain, the way the event loop consumes readings
        let last = rx.try_iter().last().expect("at least one sample");
        assert!(last.ram_used_mb >= 2);
    }

    #[test]
    fn failing_source_does_not_kill_the_poller() {
        let poller = SensorPoller::spawn(FailingSource, Duration::from_millis(5), |_| {
            panic!("failing source must not deliver")
        });
        std::thread::sleep(Duration::from_millis(30));
        poller.stop(Duration::from_secs(2));
    }

    #[test]
    fn cpu_counter_parsing() {
        let stat = "cpu  100 0 50 800 50 0 0 0 0 0\ncpu0 10 0 5 80 5 0 0 0 0 0\n";
        let (total, idle) = parse_cpu_counters(stat).unwrap();
        assert_eq!(total, 1000);
        assert_eq!(idle, 850);

        assert!(parse_cpu_counters("intr 12345\n").is_err());
    }

    #[test]
    fn ram_parsing() {
        let meminfo = "MemTotal:       16384000 kB\nMemFree:         1000000 kB\nMemAvailable:    8192000 kB\n";
        let (used_mb, total_mb) = parse_ram(meminfo).unwrap();
        assert_eq!(total_mb, 16000);
        assert_eq!(used_mb, 8000);
    }
}
