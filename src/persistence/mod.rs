//! Atomic on-disk state for the live position registry, order-id mirror,
//! and launcher control file. All three share one write discipline: write
//! to a sibling temp file, fsync, then rename over the target — POSIX
//! rename is atomic, so a crash mid-write never leaves a half-written file
//! behind. Each keeps a `.bak` of the last good write and restores from it
//! if the primary file is missing or fails to parse.

use std::collections::HashMap;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{error, warn};

use crate::engine::executor::PositionPersistence;
use crate::types::{Position, Symbol, TradingMode};

/// Writes `value` to `path` atomically, skipping the write entirely when
/// the serialized content is unchanged from last time and less than
/// `min_interval` has elapsed — avoids write-amplifying a file every time
/// the truth-verification loop runs against an unchanged registry. Pass
/// `force=true` to bypass the skip guard (e.g. on shutdown).
pub struct AtomicJsonStore<T> {
    path: PathBuf,
    min_interval: chrono::Duration,
    last_hash: std::sync::Mutex<Option<(String, DateTime<Utc>)>>,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> AtomicJsonStore<T> {
    pub fn new(path: impl Into<PathBuf>, min_interval_secs: i64) -> Self {
        Self {
            path: path.into(),
            min_interval: chrono::Duration::seconds(min_interval_secs),
            last_hash: std::sync::Mutex::new(None),
            _marker: std::marker::PhantomData,
        }
    }

    fn backup_path(&self) -> PathBuf {
        let mut p = self.path.clone();
        let name = format!("{}.bak", p.file_name().and_then(|n| n.to_str()).unwrap_or("state"));
        p.set_file_name(name);
        p
    }

    fn tmp_path(&self) -> PathBuf {
        let mut p = self.path.clone();
        let name = format!("{}.tmp", p.file_name().and_then(|n| n.to_str()).unwrap_or("state"));
        p.set_file_name(name);
        p
    }

    /// Loads the current file, falling back to the `.bak` if the primary
    /// is missing or fails to deserialize. Returns `None` if neither exists.
    pub fn load(&self) -> Result<Option<T>> {
        match self.try_load(&self.path) {
            Ok(Some(v)) => return Ok(Some(v)),
            Ok(None) => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "primary state file unreadable, trying backup"),
        }
        self.try_load(&self.backup_path())
    }

    fn try_load(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let value = serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(value))
    }

    /// Atomically persists `value`. Returns `Ok(false)` when the write was
    /// skipped as a no-op (unchanged content within `min_interval`).
    pub fn save(&self, value: &T, force: bool) -> Result<bool> {
        let serialized = serde_json::to_string_pretty(value)?;
        let hash = hex::encode(Sha256::digest(serialized.as_bytes()));
        let now = Utc::now();

        {
            let mut guard = self.last_hash.lock().unwrap();
            if !force {
                if let Some((prev_hash, prev_at)) = guard.as_ref() {
                    if *prev_hash == hash && now - *prev_at < self.min_interval {
                        return Ok(false);
                    }
                }
            }
            *guard = Some((hash, now));
        }

        if self.path.exists() {
            fs::copy(&self.path, self.backup_path()).with_context(|| "backing up previous state file")?;
        }

        let tmp = self.tmp_path();
        let mut file = fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        file.write_all(serialized.as_bytes())?;
        file.sync_all().with_context(|| "fsync of temp state file")?;
        drop(file);

        fs::rename(&tmp, &self.path).with_context(|| format!("renaming into {}", self.path.display()))?;
        Ok(true)
    }
}

impl<T> std::fmt::Debug for AtomicJsonStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomicJsonStore").field("path", &self.path).finish()
    }
}

/// Production `PositionPersistence`: the live position registry atomically
/// mirrored to disk via `AtomicJsonStore`. Used by both trading modes —
/// only the exchange/portfolio plumbing above it differs.
pub struct JsonPositionStore {
    store: AtomicJsonStore<Vec<Position>>,
}

impl JsonPositionStore {
    pub fn new(path: impl Into<PathBuf>, min_interval_secs: i64) -> Self {
        Self { store: AtomicJsonStore::new(path, min_interval_secs) }
    }
}

#[async_trait]
impl PositionPersistence for JsonPositionStore {
    async fn save(&self, positions: &[Position], force: bool) -> Result<()> {
        self.store.save(&positions.to_vec(), force).map(|_| ())
    }

    async fn load(&self) -> Result<Vec<Position>> {
        Ok(self.store.load()?.unwrap_or_default())
    }
}

/// One entry per open position: the exchange order ids for the entry fill
/// and whichever of stop/tp1/tp2 are currently resting, so a restart can
/// re-attach to live orders instead of placing duplicates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLinks {
    pub entry_order_id: Option<String>,
    pub stop_order_id: Option<String>,
    pub tp1_order_id: Option<String>,
    pub tp2_order_id: Option<String>,
}

/// Atomic mirror of `Symbol -> OrderLinks`, written every time the router
/// or exit manager places/cancels a resting order.
pub struct OrderLinkStore {
    store: AtomicJsonStore<HashMap<Symbol, OrderLinks>>,
}

impl OrderLinkStore {
    pub fn new(path: impl Into<PathBuf>, min_interval_secs: i64) -> Self {
        Self { store: AtomicJsonStore::new(path, min_interval_secs) }
    }

    pub fn load(&self) -> Result<HashMap<Symbol, OrderLinks>> {
        Ok(self.store.load()?.unwrap_or_default())
    }

    pub fn save(&self, links: &HashMap<Symbol, OrderLinks>) -> Result<bool> {
        self.store.save(links, true)
    }
}

/// What the launcher asks the bot to do next. Written by the launcher,
/// read by the bot's main loop once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlCommand {
    Run,
    Stop,
    Restart,
    Pause,
}

/// What the bot reports back about itself. Written by the bot, read by the
/// launcher (and the dashboard) to show the process is actually alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlStatus {
    Stopped,
    Starting,
    Running,
    Stopping,
    Paused,
    Error,
}

/// The launcher <-> bot handshake file: one JSON document both sides read
/// and rewrite through the same atomic-rename discipline as the position
/// store, so a launcher restart never races a half-written command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlFile {
    pub command: ControlCommand,
    pub mode: TradingMode,
    pub status: ControlStatus,
    pub pid: Option<u32>,
    pub error: Option<String>,
    pub command_at: DateTime<Utc>,
    pub status_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
}

impl ControlFile {
    pub fn new_run(mode: TradingMode) -> Self {
        let now = Utc::now();
        Self {
            command: ControlCommand::Run,
            mode,
            status: ControlStatus::Starting,
            pid: None,
            error: None,
            command_at: now,
            status_at: now,
            started_at: None,
        }
    }
}

/// Thin wrapper the bot process owns: reads the latest command each loop
/// tick, writes its own status back without disturbing the command field
/// the launcher just set (read-modify-write, never a blind overwrite).
pub struct ControlFileStore {
    store: AtomicJsonStore<ControlFile>,
}

impl ControlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { store: AtomicJsonStore::new(path, 0) }
    }

    pub fn read_command(&self) -> Result<Option<ControlCommand>> {
        Ok(self.store.load()?.map(|f| f.command))
    }

    pub fn write_status(&self, mode: TradingMode, status: ControlStatus, pid: u32, started_at: Option<DateTime<Utc>>, error: Option<String>) -> Result<()> {
        let mut file = self.store.load()?.unwrap_or_else(|| ControlFile::new_run(mode));
        file.status = status;
        file.pid = Some(pid);
        file.error = error;
        file.status_at = Utc::now();
        if file.started_at.is_none() {
            file.started_at = started_at;
        }
        self.store.save(&file, true)?;
        Ok(())
    }
}

/// Recovers a store whose primary write failed midway by logging and
/// falling back to the backup; callers use this on startup when `load`
/// reports an inconsistency they want surfaced loudly rather than silently.
pub fn log_recovery_if_primary_missing(path: &Path) {
    if !path.exists() {
        let mut bak = path.to_path_buf();
        let name = format!("{}.bak", bak.file_name().and_then(|n| n.to_str()).unwrap_or("state"));
        bak.set_file_name(name);
        if bak.exists() {
            error!(path = %path.display(), "primary state file missing, recovered from backup on next load");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        n: u32,
    }

    #[test]
    fn round_trips_through_atomic_rename() {
        let dir = tempdir().unwrap();
        let store = AtomicJsonStore::<Sample>::new(dir.path().join("state.json"), 0);
        store.save(&Sample { n: 7 }, true).unwrap();
        assert_eq!(store.load().unwrap(), Some(Sample { n: 7 }));
    }

    #[test]
    fn unchanged_write_is_skipped_within_min_interval() {
        let dir = tempdir().unwrap();
        let store = AtomicJsonStore::<Sample>::new(dir.path().join("state.json"), 60);
        assert!(store.save(&Sample { n: 1 }, false).unwrap());
        assert!(!store.save(&Sample { n: 1 }, false).unwrap());
        assert!(store.save(&Sample { n: 1 }, true).unwrap());
    }

    #[tokio::test]
    async fn json_position_store_threads_force_through_to_the_write_guard() {
        use rust_decimal_macros::dec;

        let dir = tempdir().unwrap();
        let path = dir.path().join("positions.json");
        let store = JsonPositionStore::new(&path, 60);
        let positions =
            vec![Position::new(Symbol::new("AAA-USD"), dec!(100), dec!(1), dec!(95), dec!(105), dec!(112), 240, "momentum".to_string(), dec!(70))];

        store.save(&positions, true).await.unwrap();
        let mtime_first = fs::metadata(&path).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(10));
        store.save(&positions, false).await.unwrap();
        let mtime_second = fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(mtime_first, mtime_second, "unchanged content within the min interval must not rewrite the file");

        store.save(&positions, true).await.unwrap();
        let mtime_third = fs::metadata(&path).unwrap().modified().unwrap();
        assert!(mtime_third >= mtime_second, "force=true must always rewrite");
    }

    #[test]
    fn falls_back_to_backup_when_primary_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = AtomicJsonStore::<Sample>::new(&path, 0);
        store.save(&Sample { n: 3 }, true).unwrap();
        store.save(&Sample { n: 4 }, true).unwrap();
        fs::write(&path, b"not json").unwrap();
        assert_eq!(store.load().unwrap(), Some(Sample { n: 3 }));
    }
}
