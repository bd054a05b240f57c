//! Calculation history and favorite tools
//!
//! Executed requests are kept newest first and capped at `max_items`.
//! Persistence uses an embedded redb database under the platform data
//! directory; if it cannot be opened the history lives in memory only.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::catalog::{self, ToolEntry, UsageMetrics};
use crate::shared::error::{AppError, AppResult};
use crate::shared::settings::HistorySettings;
use crate::shared::types::{ToolRequest, ToolResponse};

/// Key: insertion sequence, Value: JSON `HistoryEntry`
const HISTORY_TABLE: TableDefinition<u64, &str> = TableDefinition::new("calculation_history");
/// Key: catalog entry id, Value: time it was starred (ms)
const FAVORITES_TABLE: TableDefinition<&str, i64> = TableDefinition::new("favorites");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub request: ToolRequest,
    pub response: ToolResponse,
}

impl HistoryEntry {
    pub fn new(request: ToolRequest, response: ToolResponse) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            request,
            response,
        }
    }
}

/// Persistence backend for history and favorites
pub trait Storage: Send + Sync {
    fn append(&self, entry: &HistoryEntry) -> AppResult<()>;
    /// Newest first
    fn load(&self, limit: usize) -> AppResult<Vec<HistoryEntry>>;
    /// Drop everything but the newest `keep` entries
    fn trim(&self, keep: usize) -> AppResult<()>;
    fn clear(&self) -> AppResult<()>;
    /// Returns false if the id was already a favorite
    fn add_favorite(&self, entry_id: &str, added_at: i64) -> AppResult<bool>;
    /// Returns false if the id was not a favorite
    fn remove_favorite(&self, entry_id: &str) -> AppResult<bool>;
    /// Most recently starred first
    fn favorites(&self) -> AppResult<Vec<String>>;
}

pub struct RedbStorage {
    db: Database,
}

impl RedbStorage {
    pub fn default_path() -> AppResult<PathBuf> {
        ProjectDirs::from("com", "antigravity", "tool-hub")
            .map(|dirs| dirs.data_dir().join("history.redb"))
            .ok_or_else(|| AppError::Storage("Failed to get project directories".to_string()))
    }

    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(|e| AppError::storage("Failed to create database", e))?;

        // Both tables must exist before the first read transaction
        let write_txn = db.begin_write().map_err(|e| AppError::storage("Failed to begin write", e))?;
        {
            write_txn
                .open_table(HISTORY_TABLE)
                .map_err(|e| AppError::storage("Failed to open table", e))?;
            write_txn
                .open_table(FAVORITES_TABLE)
                .map_err(|e| AppError::storage("Failed to open table", e))?;
        }
        write_txn.commit().map_err(|e| AppError::storage("Failed to commit", e))?;

        tracing::debug!(path = %path.display(), "opened history database");
        Ok(Self { db })
    }
}

impl Storage for RedbStorage {
    fn append(&self, entry: &HistoryEntry) -> AppResult<()> {
        let serialized = serde_json::to_string(entry)?;

        let write_txn = self.db.begin_write().map_err(|e| AppError::storage("Failed to begin write", e))?;
        {
            let mut table = write_txn
                .open_table(HISTORY_TABLE)
                .map_err(|e| AppError::storage("Failed to open table", e))?;

            // Sequence keys keep insertion order even when timestamps collide
            let next = table
                .last()
                .map_err(|e| AppError::storage("Failed to read last entry", e))?
                .map_or(0, |(key, _)| key.value() + 1);

            table
                .insert(next, serialized.as_str())
                .map_err(|e| AppError::storage("Failed to insert", e))?;
        }
        write_txn.commit().map_err(|e| AppError::storage("Failed to commit", e))?;
        Ok(())
    }

    fn load(&self, limit: usize) -> AppResult<Vec<HistoryEntry>> {
        let read_txn = self.db.begin_read().map_err(|e| AppError::storage("Failed to begin read", e))?;
        let table = read_txn
            .open_table(HISTORY_TABLE)
            .map_err(|e| AppError::storage("Failed to open table", e))?;

        let mut entries = Vec::new();
        for row in table
            .iter()
            .map_err(|e| AppError::storage("Failed to create iterator", e))?
            .rev()
            .take(limit)
        {
            let (_, value) = row.map_err(|e| AppError::storage("Failed to read entry", e))?;
            entries.push(serde_json::from_str(value.value())?);
        }
        Ok(entries)
    }

    fn trim(&self, keep: usize) -> AppResult<()> {
        let write_txn = self.db.begin_write().map_err(|e| AppError::storage("Failed to begin write", e))?;
        let removed = {
            let mut table = write_txn
                .open_table(HISTORY_TABLE)
                .map_err(|e| AppError::storage("Failed to open table", e))?;

            let mut stale = Vec::new();
            for row in table
                .iter()
                .map_err(|e| AppError::storage("Failed to iterate", e))?
                .rev()
                .skip(keep)
            {
                let (key, _) = row.map_err(|e| AppError::storage("Failed to read entry", e))?;
                stale.push(key.value());
            }

            for key in &stale {
                table.remove(*key).map_err(|e| AppError::storage("Failed to remove key", e))?;
            }
            stale.len()
        };
        write_txn.commit().map_err(|e| AppError::storage("Failed to commit", e))?;

        if removed > 0 {
            tracing::debug!(removed, keep, "trimmed history");
        }
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        self.trim(0)
    }

    fn add_favorite(&self, entry_id: &str, added_at: i64) -> AppResult<bool> {
        let write_txn = self.db.begin_write().map_err(|e| AppError::storage("Failed to begin write", e))?;
        let inserted = {
            let mut table = write_txn
                .open_table(FAVORITES_TABLE)
                .map_err(|e| AppError::storage("Failed to open table", e))?;
            let exists = table
                .get(entry_id)
                .map_err(|e| AppError::storage("Failed to read favorite", e))?
                .is_some();
            if !exists {
                table
                    .insert(entry_id, added_at)
                    .map_err(|e| AppError::storage("Failed to insert", e))?;
            }
            !exists
        };
        write_txn.commit().map_err(|e| AppError::storage("Failed to commit", e))?;
        Ok(inserted)
    }

    fn remove_favorite(&self, entry_id: &str) -> AppResult<bool> {
        let write_txn = self.db.begin_write().map_err(|e| AppError::storage("Failed to begin write", e))?;
        let removed = {
            let mut table = write_txn
                .open_table(FAVORITES_TABLE)
                .map_err(|e| AppError::storage("Failed to open table", e))?;
            let previous = table
                .remove(entry_id)
                .map_err(|e| AppError::storage("Failed to remove key", e))?;
            previous.is_some()
        };
        write_txn.commit().map_err(|e| AppError::storage("Failed to commit", e))?;
        Ok(removed)
    }

    fn favorites(&self) -> AppResult<Vec<String>> {
        let read_txn = self.db.begin_read().map_err(|e| AppError::storage("Failed to begin read", e))?;
        let table = read_txn
            .open_table(FAVORITES_TABLE)
            .map_err(|e| AppError::storage("Failed to open table", e))?;

        let mut starred: Vec<(String, i64)> = Vec::new();
        for row in table.iter().map_err(|e| AppError::storage("Failed to iterate", e))? {
            let (key, value) = row.map_err(|e| AppError::storage("Failed to read entry", e))?;
            starred.push((key.value().to_string(), value.value()));
        }
        starred.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(starred.into_iter().map(|(id, _)| id).collect())
    }
}

/// In-memory fallback storage (used if the database cannot be opened)
#[derive(Default)]
pub struct InMemoryStorage {
    // Newest first
    entries: Mutex<Vec<HistoryEntry>>,
    favorites: Mutex<Vec<(String, i64)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("history mutex poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

impl Storage for InMemoryStorage {
    fn append(&self, entry: &HistoryEntry) -> AppResult<()> {
        lock(&self.entries).insert(0, entry.clone());
        Ok(())
    }

    fn load(&self, limit: usize) -> AppResult<Vec<HistoryEntry>> {
        Ok(lock(&self.entries).iter().take(limit).cloned().collect())
    }

    fn trim(&self, keep: usize) -> AppResult<()> {
        lock(&self.entries).truncate(keep);
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        lock(&self.entries).clear();
        Ok(())
    }

    fn add_favorite(&self, entry_id: &str, added_at: i64) -> AppResult<bool> {
        let mut favorites = lock(&self.favorites);
        if favorites.iter().any(|(id, _)| id == entry_id) {
            return Ok(false);
        }
        favorites.push((entry_id.to_string(), added_at));
        Ok(true)
    }

    fn remove_favorite(&self, entry_id: &str) -> AppResult<bool> {
        let mut favorites = lock(&self.favorites);
        let before = favorites.len();
        favorites.retain(|(id, _)| id != entry_id);
        Ok(favorites.len() != before)
    }

    fn favorites(&self) -> AppResult<Vec<String>> {
        let mut starred = lock(&self.favorites).clone();
        starred.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Ok(starred.into_iter().map(|(id, _)| id).collect())
    }
}

/// History manager over a pluggable storage backend
#[derive(Clone)]
pub struct CalculationHistory {
    storage: Arc<dyn Storage>,
    max_items: usize,
}

impl CalculationHistory {
    /// Open the on-disk history, falling back to memory
    pub fn open(settings: &HistorySettings) -> Self {
        let storage: Arc<dyn Storage> = match RedbStorage::default_path().and_then(|path| RedbStorage::open(&path)) {
            Ok(storage) => Arc::new(storage),
            Err(e) => {
                tracing::warn!(error = %e, "failed to open history database, using in-memory fallback");
                Arc::new(InMemoryStorage::default())
            }
        };
        Self::with_storage(storage, settings.max_items)
    }

    pub fn open_at(path: &Path, max_items: usize) -> AppResult<Self> {
        Ok(Self::with_storage(Arc::new(RedbStorage::open(path)?), max_items))
    }

    pub fn in_memory(max_items: usize) -> Self {
        Self::with_storage(Arc::new(InMemoryStorage::default()), max_items)
    }

    pub fn with_storage(storage: Arc<dyn Storage>, max_items: usize) -> Self {
        Self { storage, max_items }
    }

    /// Store an executed request and enforce the size cap
    pub fn record(&self, request: &ToolRequest, response: &ToolResponse) -> AppResult<HistoryEntry> {
        let entry = HistoryEntry::new(request.clone(), response.clone());
        self.storage.append(&entry)?;
        self.storage.trim(self.max_items)?;
        tracing::debug!(id = %entry.id, tool = %response.tool_id, "recorded calculation");
        Ok(entry)
    }

    pub fn recent(&self) -> AppResult<Vec<HistoryEntry>> {
        self.storage.load(self.max_items)
    }

    pub fn get(&self, id: &str) -> AppResult<Option<HistoryEntry>> {
        Ok(self.recent()?.into_iter().find(|entry| entry.id == id))
    }

    pub fn clear(&self) -> AppResult<()> {
        self.storage.clear()?;
        tracing::info!("cleared calculation history");
        Ok(())
    }

    /// Usage counts per catalog entry, seeded from the stored history
    pub fn usage_metrics(&self) -> AppResult<UsageMetrics> {
        let mut counts: HashMap<String, u32> = HashMap::new();
        for entry in self.recent()? {
            if let Some(tool) = catalog::entry_for_request(&entry.request) {
                *counts.entry(tool.id.to_string()).or_insert(0) += 1;
            }
        }
        Ok(UsageMetrics::from_counts(counts))
    }

    /// Star a catalog entry. Unknown ids are rejected.
    pub fn add_favorite(&self, entry_id: &str) -> AppResult<bool> {
        if catalog::find(entry_id).is_none() {
            return Err(AppError::Validation(format!("Unknown catalog entry: {}", entry_id)));
        }
        self.storage.add_favorite(entry_id, Utc::now().timestamp_millis())
    }

    pub fn remove_favorite(&self, entry_id: &str) -> AppResult<bool> {
        self.storage.remove_favorite(entry_id)
    }

    /// Starred catalog entries, most recent first. Ids that left the
    /// catalog are skipped.
    pub fn favorites(&self) -> AppResult<Vec<&'static ToolEntry>> {
        Ok(self
            .storage
            .favorites()?
            .iter()
            .filter_map(|id| catalog::find(id))
            .collect())
    }
}
