//! Music remote artwork downloads
//!
//! Album art is fetched off the event loop by a small worker pool. Every
//! result carries the track it was requested for, and the remote state
//! refuses to apply a result for any track other than the current one, so
//! a slow download can never paint stale artwork over a newer song.

use std::io::Read;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, warn};

/// Identifies the track an artwork request belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(pub String);

/// Fetches artwork bytes for a URL. Implementations run on pool workers.
pub trait ArtFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetcher backed by a blocking HTTP client.
pub struct HttpFetcher;

// 10 MB is far beyond any album art; caps a misbehaving server
const MAX_ART_BYTES: u64 = 10 * 1024 * 1024;

impl ArtFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = ureq::get(url)
            .call()
            .with_context(|| format!("Artwork request failed for {url}"))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(MAX_ART_BYTES)
            .read_to_end(&mut bytes)
            .context("Failed to read artwork body")?;
        Ok(bytes)
    }
}

/// One finished download, successful or not, tagged with its track.
#[derive(Debug)]
pub struct DownloadResult {
    pub track: TrackId,
    pub artwork: Result<Vec<u8>>,
}

struct Job {
    track: TrackId,
    url: String,
}

/// Fixed-size worker pool for artwork downloads.
///
/// Each submitted job produces exactly one `DownloadResult` on the result
/// channel; there are no retries. Dropping the pool closes the job channel
/// and the workers drain out on their own.
pub struct DownloadPool {
    job_tx: Sender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl DownloadPool {
    pub fn new(
        workers: usize,
        fetcher: Arc<dyn ArtFetcher>,
        result_tx: Sender<DownloadResult>,
    ) -> Self {
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let job_rx = Arc::new(Mutex::new(job_rx));
        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let job_rx = Arc::clone(&job_rx);
            let fetcher = Arc::clone(&fetcher);
            let result_tx = result_tx.clone();
            handles.push(thread::spawn(move || {
                loop {
                    let job = {
                        let rx = match job_rx.lock() {
                            Ok(rx) => rx,
                            Err(_) => break,
                        };
                        rx.recv()
                    };
                    let Ok(job) = job else {
                        // Job channel closed, pool is shutting down
                        break;
                    };
                    debug!(worker = worker_id, track = %job.track.0, url = %job.url, "Downloading artwork");
                    let artwork = fetcher.fetch(&job.url);
                    if let Err(e) = &artwork {
                        warn!(track = %job.track.0, error = %e, "Artwork download failed");
                    }
                    if result_tx
                        .send(DownloadResult {
                            track: job.track,
                            artwork,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
            }));
        }
        info!(workers, "Artwork download pool started");
        Self {
            job_tx,
            workers: handles,
        }
    }

    /// Queue an artwork download. Fails only if the pool has shut down.
    pub fn submit(&self, track: TrackId, url: &str) -> Result<()> {
        self.job_tx
            .send(Job {
                track,
                url: url.to_string(),
            })
            .map_err(|_| anyhow!("download pool is shut down"))
    }

    /// Close the job channel and wait for the workers to drain.
    pub fn shutdown(self) {
        drop(self.job_tx);
        for handle in self.workers {
            let _ = handle.join();
        }
        info!("Artwork download pool stopped");
    }
}

/// What the music remote currently shows.
#[derive(Debug, Default)]
pub struct RemoteState {
    current_track: Option<TrackId>,
    artwork: Option<Vec<u8>>,
}

impl RemoteState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to a new track. Existing artwork stays up until a download
    /// for the new track lands; results for the old track are now stale.
    pub fn set_track(&mut self, track: TrackId) {
        if self.current_track.as_ref() != Some(&track) {
            debug!(track = %track.0, "Track changed");
            self.current_track = Some(track);
        }
    }

    pub fn artwork(&self) -> Option<&[u8]> {
        self.artwork.as_deref()
    }

    /// Apply a finished download. Returns true if the displayed artwork
    /// changed. Results tagged with any track other than the current one
    /// are rejected outright, and failed downloads leave the previous
    /// artwork in place.
    pub fn apply(&mut self, result: DownloadResult) -> bool {
        if self.current_track.as_ref() != Some(&result.track) {
            debug!(track = %result.track.0, "Discarding stale artwork result");
            return false;
        }
        match result.artwork {
            Ok(bytes) => {
                info!(track = %result.track.0, bytes = bytes.len(), "Artwork updated");
                self.artwork = Some(bytes);
                true
            }
            Err(_) => false,
        }
    }
}
