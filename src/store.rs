//! Flat key-value persistence for the last computed plan and the green score.
//!
//! [`KeyValueStore`] abstracts the backend so tests can use [`MemoryStore`]
//! while the CLI persists to a single JSON file via [`JsonFileStore`].
//! [`PlanStore`] layers typed accessors on top.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::StoreError;
use crate::green_score::{MAX_SCORE, score_after};
use crate::sizing::types::InstallationPlan;

/// Key of the most recently computed installation plan (JSON record).
pub const PLAN_KEY: &str = "solar_match.last_plan";
/// Key of the absolute green score (decimal integer).
pub const SCORE_KEY: &str = "solar_match.green_score";

/// String-keyed, string-valued storage with single-record semantics per key.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the backend cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`; removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the backend cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store, used by tests and when no store file is given.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store backed by one JSON object file, rewritten on every mutation.
///
/// A missing file opens as an empty store; it is created on the first write.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Opens the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the file exists but cannot be read or is not
    /// a JSON object of strings.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let entries = match fs::read_to_string(path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        // the store file is only ever replaced whole, by rename
        let tmp = self.temp_path();
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, &self.entries)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        drop(writer);
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("store"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Typed accessors for the persisted plan and green score.
#[derive(Debug)]
pub struct PlanStore<S> {
    inner: S,
    base_score: u32,
}

impl<S: KeyValueStore> PlanStore<S> {
    /// Wraps `inner`; `base_score` is reported when no score was ever stored.
    pub fn new(inner: S, base_score: u32) -> Self {
        Self {
            inner,
            base_score: base_score.min(MAX_SCORE),
        }
    }

    pub fn base_score(&self) -> u32 {
        self.base_score
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Persists `plan` as the single most recent plan.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if encoding or the backend write fails.
    pub fn save_plan(&mut self, plan: &InstallationPlan) -> Result<(), StoreError> {
        let json = serde_json::to_string(plan)?;
        self.inner.set(PLAN_KEY, &json)
    }

    /// Loads the most recent plan. A record that no longer decodes is
    /// treated as absent.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` only if the backend read fails.
    pub fn load_plan(&self) -> Result<Option<InstallationPlan>, StoreError> {
        let Some(raw) = self.inner.get(PLAN_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(plan) => Ok(Some(plan)),
            Err(e) => {
                warn!("ignoring unreadable saved plan: {e}");
                Ok(None)
            }
        }
    }

    /// Current green score; the base score when none is stored or the stored
    /// value does not parse.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` only if the backend read fails.
    pub fn green_score(&self) -> Result<u32, StoreError> {
        let Some(raw) = self.inner.get(SCORE_KEY)? else {
            return Ok(self.base_score);
        };
        match raw.trim().parse::<u32>() {
            Ok(score) => Ok(score.min(MAX_SCORE)),
            Err(_) => {
                warn!(stored = %raw, "unparsable green score, using base");
                Ok(self.base_score)
            }
        }
    }

    /// Overwrites the green score, clamped to 100.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the backend write fails.
    pub fn set_green_score(&mut self, score: u32) -> Result<u32, StoreError> {
        let score = score.min(MAX_SCORE);
        self.inner.set(SCORE_KEY, &score.to_string())?;
        Ok(score)
    }

    /// Persists `plan` and sets the score to `base + plan.green_score_delta`.
    ///
    /// The score is absolute: recomputing never accumulates earlier awards.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if either write fails.
    pub fn record_plan(&mut self, plan: &InstallationPlan) -> Result<u32, StoreError> {
        self.save_plan(plan)?;
        self.set_green_score(score_after(self.base_score, plan.green_score_delta))
    }

    /// Removes both records.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the backend write fails.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.inner.remove(PLAN_KEY)?;
        self.inner.remove(SCORE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::{Region, RoofProfile, RoofType, compute_plan};

    fn sample_plan() -> InstallationPlan {
        compute_plan(&RoofProfile::new(
            40.0,
            300.0,
            RoofType::SouthFacingPitched,
            Region::Lisbon,
        ))
        .expect("valid profile")
    }

    #[test]
    fn memory_store_overwrites_and_removes() {
        let mut s = MemoryStore::new();
        s.set("k", "1").ok();
        s.set("k", "2").ok();
        assert_eq!(s.get("k").ok().flatten().as_deref(), Some("2"));
        assert_eq!(s.len(), 1);
        s.remove("k").ok();
        s.remove("k").ok();
        assert!(s.is_empty());
    }

    fn scratch_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "solar-match-store-{}-{name}",
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn json_store_replaces_file_without_leftovers() {
        let path = scratch_path("atomic.json");
        let mut store = JsonFileStore::open(&path).expect("open");
        store.set("k", "1").expect("set");
        store.set("k", "2").expect("set");
        assert!(!store.temp_path().exists());

        let raw = fs::read_to_string(&path).expect("read back");
        let entries: BTreeMap<String, String> = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(entries.get("k").map(String::as_str), Some("2"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn stale_temp_file_does_not_affect_store() {
        let path = scratch_path("stale.json");
        let mut store = JsonFileStore::open(&path).expect("open");
        store.set("k", "1").expect("set");
        // an interrupted write leaves only the sibling file half-written
        fs::write(store.temp_path(), "{\"k\": \"2").expect("write stale");

        let reopened = JsonFileStore::open(&path).expect("reopen");
        assert_eq!(reopened.get("k").ok().flatten().as_deref(), Some("1"));

        let mut reopened = reopened;
        reopened.set("k", "3").expect("set over stale temp");
        assert!(!reopened.temp_path().exists());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn plan_round_trips_verbatim() {
        let mut store = PlanStore::new(MemoryStore::new(), 73);
        let plan = sample_plan();
        store.save_plan(&plan).expect("save");
        assert_eq!(store.load_plan().expect("load"), Some(plan));
    }

    #[test]
    fn missing_plan_is_none() {
        let store = PlanStore::new(MemoryStore::new(), 73);
        assert_eq!(store.load_plan().expect("load"), None);
    }

    #[test]
    fn corrupt_plan_is_none() {
        let mut kv = MemoryStore::new();
        kv.set(PLAN_KEY, "{not json").ok();
        let store = PlanStore::new(kv, 73);
        assert_eq!(store.load_plan().expect("load"), None);
    }

    #[test]
    fn score_defaults_to_base() {
        let store = PlanStore::new(MemoryStore::new(), 73);
        assert_eq!(store.green_score().ok(), Some(73));
    }

    #[test]
    fn unparsable_score_falls_back_to_base() {
        let mut kv = MemoryStore::new();
        kv.set(SCORE_KEY, "lots").ok();
        let store = PlanStore::new(kv, 60);
        assert_eq!(store.green_score().ok(), Some(60));
    }

    #[test]
    fn set_score_clamps() {
        let mut store = PlanStore::new(MemoryStore::new(), 73);
        assert_eq!(store.set_green_score(140).ok(), Some(100));
        assert_eq!(store.green_score().ok(), Some(100));
    }

    #[test]
    fn record_plan_is_absolute_not_cumulative() {
        let mut store = PlanStore::new(MemoryStore::new(), 73);
        let plan = sample_plan();
        assert_eq!(store.record_plan(&plan).ok(), Some(93));
        assert_eq!(store.record_plan(&plan).ok(), Some(93));
        assert_eq!(store.green_score().ok(), Some(93));
    }

    #[test]
    fn clear_removes_both_records() {
        let mut store = PlanStore::new(MemoryStore::new(), 73);
        store.record_plan(&sample_plan()).ok();
        store.clear().ok();
        assert!(store.inner().is_empty());
        assert_eq!(store.green_score().ok(), Some(73));
    }
}
