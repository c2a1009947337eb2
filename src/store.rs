//! Local history of saved projections plus a single-slot draft cache.
//!
//! Persistence is best effort: when a data file is configured the whole store
//! is rewritten after every change, and a failed write is logged rather than
//! surfaced to the caller. Writes go through a sibling temp file and a rename,
//! and a file that cannot be parsed is moved aside before anything replaces it.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::{PlanDescription, PlanOutcome};

pub const HISTORY_LIMIT: usize = 50;
pub const DRAFT_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub plan: PlanDescription,
    pub result: PlanOutcome,
}

/// Unsubmitted form state. Kept as raw JSON since a draft may be incomplete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub saved_at: DateTime<Utc>,
    pub plan: serde_json::Value,
}

impl DraftRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.saved_at > Duration::hours(DRAFT_TTL_HOURS)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    history: Vec<HistoryRecord>,
    #[serde(default)]
    draft: Option<DraftRecord>,
}

#[derive(Debug, Default)]
pub struct LocalStore {
    path: Option<PathBuf>,
    data: StoreFile,
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a file-backed store. A missing file starts empty. An unreadable
    /// file is renamed aside; if that fails the store stays memory-only so the
    /// original is never overwritten.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match load_file(&path) {
            Ok(Some(mut data)) => {
                data.history.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
                data.history.truncate(HISTORY_LIMIT);
                info!(
                    path = %path.display(),
                    records = data.history.len(),
                    "loaded projection history"
                );
                Self {
                    path: Some(path),
                    data,
                }
            }
            Ok(None) => Self {
                path: Some(path),
                data: StoreFile::default(),
            },
            Err(err) => {
                warn!(path = %path.display(), error = %err, "store file is unreadable");
                let backup = sibling_path(
                    &path,
                    &format!(".unreadable-{}", Utc::now().format("%Y%m%dT%H%M%S")),
                );
                match fs::rename(&path, &backup) {
                    Ok(()) => {
                        warn!(backup = %backup.display(), "moved unreadable store file aside");
                        Self {
                            path: Some(path),
                            data: StoreFile::default(),
                        }
                    }
                    Err(rename_err) => {
                        warn!(
                            error = %rename_err,
                            "could not move unreadable store file; keeping changes in memory only"
                        );
                        Self::in_memory()
                    }
                }
            }
        }
    }

    pub fn save(
        &mut self,
        plan: PlanDescription,
        result: PlanOutcome,
        now: DateTime<Utc>,
    ) -> HistoryRecord {
        let record = HistoryRecord {
            id: Uuid::new_v4(),
            saved_at: now,
            plan,
            result,
        };
        self.data.history.insert(0, record.clone());
        if self.data.history.len() > HISTORY_LIMIT {
            let dropped = self.data.history.len() - HISTORY_LIMIT;
            self.data.history.truncate(HISTORY_LIMIT);
            debug!(dropped, "discarded oldest history records");
        }
        self.persist_best_effort();
        record
    }

    /// Saved records, newest first.
    pub fn list(&self) -> &[HistoryRecord] {
        &self.data.history
    }

    pub fn get(&self, id: Uuid) -> Option<&HistoryRecord> {
        self.data.history.iter().find(|r| r.id == id)
    }

    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.data.history.len();
        self.data.history.retain(|r| r.id != id);
        let removed = self.data.history.len() != before;
        if removed {
            self.persist_best_effort();
        }
        removed
    }

    pub fn put_draft(&mut self, plan: serde_json::Value, now: DateTime<Utc>) {
        self.data.draft = Some(DraftRecord {
            saved_at: now,
            plan,
        });
        self.persist_best_effort();
    }

    /// The current draft, unless it has aged past the TTL, in which case it is
    /// dropped.
    pub fn draft(&mut self, now: DateTime<Utc>) -> Option<&DraftRecord> {
        if self.data.draft.as_ref().is_some_and(|d| d.is_expired(now)) {
            debug!("draft expired");
            self.data.draft = None;
            self.persist_best_effort();
        }
        self.data.draft.as_ref()
    }

    pub fn clear_draft(&mut self) -> bool {
        let had_draft = self.data.draft.take().is_some();
        if had_draft {
            self.persist_best_effort();
        }
        had_draft
    }

    fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        let staging = sibling_path(path, ".tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, path)?;
        Ok(())
    }

    fn persist_best_effort(&self) {
        if let Err(err) = self.persist() {
            warn!(error = %err, "failed to persist store; keeping in-memory state");
        }
    }
}

/// `path` with `suffix` appended to its file name.
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("store"));
    name.push(suffix);
    path.with_file_name(name)
}

fn load_file(path: &Path) -> Result<Option<StoreFile>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&raw)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Category, FixedPlan, MAX_AMOUNT, MAX_PERIODS, project};
    use chrono::TimeZone;

    fn plan(amount: f64) -> PlanDescription {
        PlanDescription::Fixed(FixedPlan {
            amount,
            period_count: 12,
            category: Category::LargeCap,
            inflation_rate: 0.0,
        })
    }

    fn at(hour: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hour)
    }

    fn save(store: &mut LocalStore, amount: f64, hour: i64) -> HistoryRecord {
        let plan = plan(amount);
        let outcome = project(&plan);
        store.save(plan, outcome, at(hour))
    }

    #[test]
    fn list_is_newest_first() {
        let mut store = LocalStore::in_memory();
        let first = save(&mut store, 100.0, 0);
        let second = save(&mut store, 200.0, 1);

        let ids: Vec<_> = store.list().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn history_is_capped_and_drops_oldest() {
        let mut store = LocalStore::in_memory();
        let oldest = save(&mut store, 1.0, 0);
        for i in 1..=HISTORY_LIMIT as i64 {
            save(&mut store, 1.0 + i as f64, i);
        }
        assert_eq!(store.list().len(), HISTORY_LIMIT);
        assert!(store.get(oldest.id).is_none());
    }

    #[test]
    fn get_and_delete_by_id() {
        let mut store = LocalStore::in_memory();
        let record = save(&mut store, 300.0, 0);

        assert_eq!(store.get(record.id), Some(&record));
        assert!(store.delete(record.id));
        assert!(store.get(record.id).is_none());
        assert!(!store.delete(record.id));
    }

    #[test]
    fn draft_expires_after_a_day() {
        let mut store = LocalStore::in_memory();
        store.put_draft(serde_json::json!({ "amount": 5000 }), at(0));

        assert!(store.draft(at(23)).is_some());
        assert!(store.draft(at(DRAFT_TTL_HOURS + 1)).is_none());
        // Expired drafts are evicted, not just hidden.
        assert!(store.draft(at(0)).is_none());
    }

    #[test]
    fn draft_slot_is_overwritten() {
        let mut store = LocalStore::in_memory();
        store.put_draft(serde_json::json!({ "amount": 1 }), at(0));
        store.put_draft(serde_json::json!({ "amount": 2 }), at(1));

        let draft = store.draft(at(2)).expect("draft present");
        assert_eq!(draft.plan["amount"], 2);
        assert!(store.clear_draft());
        assert!(!store.clear_draft());
    }

    #[test]
    fn file_backed_store_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("store.json");

        let mut store = LocalStore::open(&path);
        let record = save(&mut store, 750.0, 0);
        store.put_draft(serde_json::json!({ "kind": "fixed" }), at(0));

        let reopened = LocalStore::open(&path);
        assert_eq!(reopened.list().len(), 1);
        let loaded = reopened.get(record.id).expect("record survives reopen");
        assert_eq!(loaded.saved_at, record.saved_at);
        assert_eq!(loaded.plan, record.plan);
        let (loaded_value, saved_value) = (
            loaded.result.projection().final_value,
            record.result.projection().final_value,
        );
        assert!((loaded_value - saved_value).abs() <= 1e-6);
        assert!(reopened.data.draft.is_some());
    }

    #[test]
    fn unreadable_file_is_moved_aside_before_saving() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").expect("write");

        let mut store = LocalStore::open(&path);
        assert!(store.list().is_empty());
        save(&mut store, 100.0, 0);

        let backups: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("store.json.unreadable-"))
            .collect();
        assert_eq!(backups.len(), 1);
        let original = fs::read_to_string(dir.path().join(&backups[0])).expect("backup");
        assert_eq!(original, "{ not json");
        assert_eq!(LocalStore::open(&path).list().len(), 1);
    }

    #[test]
    fn persisting_leaves_no_staging_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");

        let mut store = LocalStore::open(&path);
        save(&mut store, 100.0, 0);
        save(&mut store, 200.0, 1);

        assert!(path.exists());
        assert!(!dir.path().join("store.json.tmp").exists());
        assert_eq!(LocalStore::open(&path).list().len(), 2);
    }

    #[test]
    fn largest_valid_plan_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("store.json");
        let mut store = LocalStore::open(&path);
        save(&mut store, 100.0, 0);

        let big = PlanDescription::Fixed(FixedPlan {
            amount: MAX_AMOUNT,
            period_count: MAX_PERIODS,
            category: Category::SmallCap,
            inflation_rate: 0.0,
        });
        big.validate().expect("upper bound is valid");
        let outcome = project(&big);
        assert!(outcome.projection().final_value.is_finite());
        store.save(big, outcome, at(1));

        assert_eq!(LocalStore::open(&path).list().len(), 2);
    }
}
