//! # Article Number Store
//!
//! Persistent, sequential allocation of internal article numbers.
//!
//! ## Allocation Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    allocate(count)                                      │
//! │                                                                         │
//! │  1. lock_exclusive(<state>.lock)      ← blocks other allocators        │
//! │  2. read <state>  (missing → start_next)                               │
//! │  3. numbers = next .. next + count                                     │
//! │  4. write <state>.tmp, rename over <state>                             │
//! │  5. unlock (guard dropped)                                             │
//! │                                                                         │
//! │  A crash between 3 and 4 hands out nothing. A crash during 4 leaves    │
//! │  the old file in place. Numbers are never handed out twice.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State File
//! ```json
//! { "next": 1003, "updated_at": "2026-10-18T09:12:44Z" }
//! ```
//! `updated_at` is optional on read.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use offer_core::article::{
    format_article_number, parse_article_number, validate_article_config, ArticleNumberConfig,
};
use offer_core::validation::validate_allocation_count;
use offer_core::OfferRecord;

use crate::error::{StoreError, StoreResult};

// =============================================================================
// State File
// =============================================================================

/// On-disk shape of the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CounterState {
    /// Next number to hand out.
    next: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// Holds the exclusive lock until dropped.
struct CounterLock {
    file: File,
}

impl Drop for CounterLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

// =============================================================================
// Store
// =============================================================================

/// Sequential article number allocator backed by a JSON state file.
///
/// ## Usage
/// ```rust,no_run
/// use offer_core::ArticleNumberConfig;
/// use offer_store::ArticleNumberStore;
///
/// let store = ArticleNumberStore::open("data/article_number.json", ArticleNumberConfig::default())?;
/// let numbers = store.allocate(3)?;
/// assert_eq!(numbers.len(), 3);
/// # Ok::<(), offer_store::StoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ArticleNumberStore {
    state_path: PathBuf,
    lock_path: PathBuf,
    config: ArticleNumberConfig,
}

impl ArticleNumberStore {
    /// Creates a store for the given state file.
    ///
    /// Nothing is created on disk until the first write.
    pub fn open(state_path: impl Into<PathBuf>, config: ArticleNumberConfig) -> StoreResult<Self> {
        validate_article_config(&config)?;

        let state_path = state_path.into();
        let lock_path = lock_path_for(&state_path);

        debug!(path = %state_path.display(), prefix = %config.prefix, "Opened article number store");

        Ok(ArticleNumberStore {
            state_path,
            lock_path,
            config,
        })
    }

    /// Path of the JSON state file.
    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    /// Formatting config in use.
    pub fn config(&self) -> &ArticleNumberConfig {
        &self.config
    }

    /// Reads the next counter value without allocating.
    ///
    /// A missing state file yields `start_next`.
    pub fn load_next(&self) -> StoreResult<u64> {
        let contents = match fs::read_to_string(&self.state_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(start_next = self.config.start_next, "No state file, using start value");
                return Ok(self.config.start_next);
            }
            Err(e) => return Err(StoreError::io(&self.state_path, e)),
        };

        let raw: serde_json::Value =
            serde_json::from_str(&contents).map_err(|e| StoreError::CorruptState {
                path: self.state_path.clone(),
                reason: e.to_string(),
            })?;

        let state: CounterState = serde_json::from_value(raw)
            .map_err(|e| StoreError::invalid_state(&self.state_path, e.to_string()))?;

        Ok(state.next)
    }

    /// The article number the next allocation would return.
    pub fn peek_next(&self) -> StoreResult<String> {
        let next = self.load_next()?;
        Ok(format_article_number(next, &self.config))
    }

    /// Hands out `count` sequential article numbers and persists the
    /// advanced counter.
    ///
    /// ## Errors
    /// - `count == 0` → validation error, state untouched
    /// - unreadable state → `CorruptState` / `InvalidState`, state untouched
    pub fn allocate(&self, count: u64) -> StoreResult<Vec<String>> {
        validate_allocation_count(count)?;

        let _lock = self.lock()?;
        let start = self.load_next()?;
        let end = start.checked_add(count).ok_or_else(|| {
            StoreError::invalid_state(&self.state_path, format!("counter overflow allocating {} from {}", count, start))
        })?;

        self.save(end)?;

        info!(count, first = start, next = end, "Allocated article numbers");

        Ok((start..end)
            .map(|n| format_article_number(n, &self.config))
            .collect())
    }

    /// Overwrites the counter. Meant for tests and migrations.
    pub fn reset(&self, start_value: u64) -> StoreResult<()> {
        let _lock = self.lock()?;
        self.save(start_value)?;
        info!(next = start_value, "Reset article number counter");
        Ok(())
    }

    /// Gives every record without an article number a fresh one.
    ///
    /// Existing article numbers are never replaced, even when they do not
    /// match the configured format (those are logged). Blank strings count
    /// as missing. Numbers are allocated in one call, in record order.
    ///
    /// Returns how many records were assigned.
    pub fn assign(&self, records: &mut [OfferRecord]) -> StoreResult<usize> {
        let mut missing: Vec<&mut OfferRecord> = Vec::new();
        for record in records.iter_mut() {
            if let Some(existing) = record.article_number.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                if let Err(e) = parse_article_number(existing, &self.config) {
                    warn!(article_number = existing, error = %e, "Keeping article number in an unexpected format");
                }
                continue;
            }
            missing.push(record);
        }

        if missing.is_empty() {
            return Ok(0);
        }

        let numbers = self.allocate(missing.len() as u64)?;
        for (record, number) in missing.iter_mut().zip(numbers) {
            record.article_number = Some(number);
        }

        Ok(missing.len())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn ensure_parent_dir(&self) -> StoreResult<()> {
        match self.state_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))
            }
            _ => Ok(()),
        }
    }

    fn lock(&self) -> StoreResult<CounterLock> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| StoreError::io(&self.lock_path, e))?;

        file.lock_exclusive().map_err(|source| StoreError::LockFailed {
            path: self.lock_path.clone(),
            source,
        })?;

        Ok(CounterLock { file })
    }

    fn save(&self, next: u64) -> StoreResult<()> {
        self.ensure_parent_dir()?;

        let state = CounterState {
            next,
            updated_at: Some(Utc::now()),
        };
        let contents = serde_json::to_string_pretty(&state)
            .map_err(|e| StoreError::invalid_state(&self.state_path, e.to_string()))?;

        AtomicFile::new(&self.state_path, OverwriteBehavior::AllowOverwrite)
            .write(|f| {
                f.write_all(contents.as_bytes())?;
                f.flush()
            })
            .map_err(|err| {
                let source = match err {
                    atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => e,
                };
                StoreError::io(&self.state_path, source)
            })?;

        debug!(path = %self.state_path.display(), next, "Saved counter state");
        Ok(())
    }
}

/// `data/article_number.json` → `data/article_number.json.lock`
fn lock_path_for(state_path: &Path) -> PathBuf {
    let mut name = state_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    state_path.with_file_name(name)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use offer_core::CoreError;
    use std::collections::HashSet;
    use std::thread;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> ArticleNumberStore {
        ArticleNumberStore::open(dir.join("data").join("article_number.json"), ArticleNumberConfig::default())
            .unwrap()
    }

    #[test]
    fn test_missing_state_starts_at_start_next() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert_eq!(store.load_next().unwrap(), 1000);
        assert_eq!(store.peek_next().unwrap(), "AC00001000");
        assert!(!store.state_path().exists());
    }

    #[test]
    fn test_allocate_is_sequential_and_persists() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let first = store.allocate(3).unwrap();
        assert_eq!(first, vec!["AC00001000", "AC00001001", "AC00001002"]);

        // a second handle sees the persisted counter
        let again = store_in(dir.path());
        assert_eq!(again.allocate(1).unwrap(), vec!["AC00001003"]);
        assert_eq!(again.peek_next().unwrap(), "AC00001004");
    }

    #[test]
    fn test_peek_does_not_advance() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.allocate(2).unwrap();
        assert_eq!(store.peek_next().unwrap(), "AC00001002");
        assert_eq!(store.peek_next().unwrap(), "AC00001002");
    }

    #[test]
    fn test_allocate_zero_is_rejected() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        let err = store.allocate(0).unwrap_err();
        assert!(matches!(err, StoreError::Core(CoreError::Validation(_))));
        assert!(!store.state_path().exists());
    }

    #[test]
    fn test_reads_plain_next_file() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        fs::create_dir_all(store.state_path().parent().unwrap()).unwrap();
        fs::write(store.state_path(), r#"{"next": 2500}"#).unwrap();

        assert_eq!(store.allocate(1).unwrap(), vec!["AC00002500"]);

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.state_path()).unwrap()).unwrap();
        assert_eq!(saved["next"], 2501);
        assert!(saved["updated_at"].is_string());
    }

    #[test]
    fn test_corrupt_and_invalid_state() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        fs::create_dir_all(store.state_path().parent().unwrap()).unwrap();

        fs::write(store.state_path(), "{not json").unwrap();
        assert!(matches!(store.load_next(), Err(StoreError::CorruptState { .. })));

        fs::write(store.state_path(), r#"{"counter": 5}"#).unwrap();
        assert!(matches!(store.load_next(), Err(StoreError::InvalidState { .. })));

        fs::write(store.state_path(), r#"{"next": -1}"#).unwrap();
        assert!(matches!(store.load_next(), Err(StoreError::InvalidState { .. })));

        // a failed allocation leaves the file alone
        assert!(store.allocate(1).is_err());
        assert_eq!(fs::read_to_string(store.state_path()).unwrap(), r#"{"next": -1}"#);
    }

    #[test]
    fn test_overflow_is_reported() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.reset(u64::MAX).unwrap();
        assert!(matches!(store.allocate(1), Err(StoreError::InvalidState { .. })));
    }

    #[test]
    fn test_reset() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        store.allocate(5).unwrap();
        store.reset(42).unwrap();
        assert_eq!(store.peek_next().unwrap(), "AC00000042");
    }

    #[test]
    fn test_assign_only_fills_missing() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let mut records = vec![
            OfferRecord::default(),
            OfferRecord {
                article_number: Some("AC00000007".to_string()),
                ..Default::default()
            },
            OfferRecord {
                article_number: Some("  ".to_string()),
                ..Default::default()
            },
        ];

        assert_eq!(store.assign(&mut records).unwrap(), 2);
        assert_eq!(records[0].article_number.as_deref(), Some("AC00001000"));
        assert_eq!(records[1].article_number.as_deref(), Some("AC00000007"));
        assert_eq!(records[2].article_number.as_deref(), Some("AC00001001"));

        // second pass has nothing to do and does not touch the counter
        assert_eq!(store.assign(&mut records).unwrap(), 0);
        assert_eq!(store.peek_next().unwrap(), "AC00001002");
    }

    #[test]
    fn test_assign_keeps_numbers_in_a_foreign_format() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let mut records = vec![
            OfferRecord {
                article_number: Some("SUP-4711".to_string()),
                ..Default::default()
            },
            OfferRecord::default(),
        ];

        assert_eq!(store.assign(&mut records).unwrap(), 1);
        assert_eq!(records[0].article_number.as_deref(), Some("SUP-4711"));
        assert_eq!(records[1].article_number.as_deref(), Some("AC00001000"));
    }

    #[test]
    fn test_concurrent_allocators_never_collide() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("article_number.json");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = path.clone();
                thread::spawn(move || {
                    let store = ArticleNumberStore::open(path, ArticleNumberConfig::default()).unwrap();
                    (0..10)
                        .flat_map(|_| store.allocate(2).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for number in handle.join().unwrap() {
                assert!(seen.insert(number), "duplicate article number");
            }
        }
        assert_eq!(seen.len(), 80);

        let store = ArticleNumberStore::open(path, ArticleNumberConfig::default()).unwrap();
        assert_eq!(store.load_next().unwrap(), 1080);
    }

    #[test]
    fn test_open_rejects_bad_config() {
        let config = ArticleNumberConfig {
            prefix: String::new(),
            ..Default::default()
        };
        assert!(ArticleNumberStore::open("unused.json", config).is_err());
    }

    #[test]
    fn test_lock_path() {
        assert_eq!(
            lock_path_for(Path::new("data/article_number.json")),
            PathBuf::from("data/article_number.json.lock")
        );
    }
}
