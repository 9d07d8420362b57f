//! Ephemeral letter store with time-to-live sweep.
//!
//! Letters submitted by one page are kept under a short random id so a
//! second page can fetch them. Nothing is persisted: entries expire after
//! the TTL, and a restart starts empty, so "not found" is an ordinary
//! answer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, select, tick, Sender};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::letter::LetterRecord;

/// Default time an entry is kept.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Default time between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Length of generated ids.
const ID_LEN: usize = 8;

/// Store timing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// How long an entry lives
    pub ttl: Duration,
    /// How often the background sweeper runs
    pub sweep_interval: Duration,
}

impl StoreConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time-to-live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// A letter held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredLetter {
    /// The letter fields
    #[serde(flatten)]
    pub letter: LetterRecord,

    /// When the letter was submitted
    pub stored_at: DateTime<Utc>,
}

impl StoredLetter {
    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        // A clock that went backwards gives a negative age: not expired.
        match (now - self.stored_at).to_std() {
            Ok(age) => age > ttl,
            Err(_) => false,
        }
    }
}

/// Shared in-memory letter store. Clones share the same entries.
#[derive(Debug, Clone)]
pub struct LetterStore {
    entries: Arc<Mutex<HashMap<String, StoredLetter>>>,
    config: StoreConfig,
}

impl LetterStore {
    /// Create an empty store with default timing.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty store with the given timing.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Get the timing configuration.
    pub fn config(&self) -> StoreConfig {
        self.config
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StoredLetter>> {
        // The map stays consistent even if a holder panicked.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a letter and return its new id.
    pub fn insert(&self, letter: LetterRecord) -> String {
        self.insert_at(letter, Utc::now())
    }

    /// Store a letter as submitted at `now`.
    pub fn insert_at(&self, letter: LetterRecord, now: DateTime<Utc>) -> String {
        let mut entries = self.lock();
        let id = loop {
            let candidate = new_id();
            if !entries.contains_key(&candidate) {
                break candidate;
            }
        };
        entries.insert(
            id.clone(),
            StoredLetter {
                letter,
                stored_at: now,
            },
        );
        log::debug!("Stored letter {} ({} entries)", id, entries.len());
        id
    }

    /// Fetch a letter by id. Expired entries are treated as absent.
    pub fn get(&self, id: &str) -> Option<LetterRecord> {
        self.get_at(id, Utc::now())
    }

    /// Fetch a letter by id as of `now`.
    pub fn get_at(&self, id: &str, now: DateTime<Utc>) -> Option<LetterRecord> {
        self.lock()
            .get(id)
            .filter(|e| !e.is_expired(now, self.config.ttl))
            .map(|e| e.letter.clone())
    }

    /// Fetch the stored entry with its submission time.
    pub fn entry(&self, id: &str) -> Option<StoredLetter> {
        self.lock().get(id).cloned()
    }

    /// Remove a letter, returning it.
    pub fn remove(&self, id: &str) -> Option<LetterRecord> {
        self.lock().remove(id).map(|e| e.letter)
    }

    /// Number of entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove entries older than the TTL.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now())
    }

    /// Remove entries older than the TTL as of `now`; returns how many.
    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let ttl = self.config.ttl;
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now, ttl));
        before - entries.len()
    }

    /// Run [`sweep_expired`](Self::sweep_expired) on a background thread
    /// every sweep interval until the handle is stopped or dropped.
    pub fn spawn_sweeper(&self) -> Result<SweeperHandle> {
        let store = self.clone();
        let ticker = tick(self.config.sweep_interval);
        let (stop_tx, stop_rx) = bounded::<()>(1);

        let thread = std::thread::Builder::new()
            .name("letter-store-sweeper".to_string())
            .spawn(move || loop {
                select! {
                    recv(ticker) -> _ => {
                        let removed = store.sweep_expired();
                        if removed > 0 {
                            log::info!("Swept {} expired letters", removed);
                        }
                    }
                    recv(stop_rx) -> _ => break,
                }
            })?;

        log::debug!(
            "Started letter store sweeper (interval {:?}, ttl {:?})",
            self.config.sweep_interval,
            self.config.ttl
        );

        Ok(SweeperHandle {
            stop: Some(stop_tx),
            thread: Some(thread),
        })
    }
}

impl Default for LetterStore {
    fn default() -> Self {
        Self::new()
    }
}

fn new_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(ID_LEN);
    id
}

/// Handle to the background sweeper; stops it when dropped.
pub struct SweeperHandle {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender disconnects the stop channel.
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::warn!("Letter store sweeper panicked");
            }
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
