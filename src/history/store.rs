use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::storage::KeyValueStore;
use crate::analysis::{ChartAnalysis, Timeframe};
use crate::error::StorageError;

pub const HISTORY_STORAGE_KEY: &str = "trading_analysis_history";

/// A completed analysis together with the inputs that produced it. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub analysis: ChartAnalysis,
    pub image_base64: String,
    pub timeframe: Timeframe,
    pub indicators: Vec<String>,
}

/// Past analyses, newest first, persisted as one JSON array under a fixed key.
///
/// `load` and `save` are the lifecycle hooks. Every mutation saves immediately and
/// leaves the in-memory list untouched when the write fails.
pub struct HistoryStore<S: KeyValueStore> {
    storage: S,
    items: Vec<HistoryItem>,
}

impl<S: KeyValueStore> HistoryStore<S> {
    pub fn load(storage: S) -> Result<Self, StorageError> {
        let items = match storage.get(HISTORY_STORAGE_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<HistoryItem>>(&raw) {
                Ok(items) => items,
                Err(e) => {
                    // Start over rather than refuse to run on a damaged file
                    error!("❌ Error loading history, starting empty: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        info!("📚 Loaded {} history items", items.len());
        Ok(Self { storage, items })
    }

    pub fn save(&self) -> Result<(), StorageError> {
        self.persist(&self.items)
    }

    // Mutations write the candidate list first and only adopt it once stored
    fn persist(&self, items: &[HistoryItem]) -> Result<(), StorageError> {
        let raw = serde_json::to_string(items)?;
        self.storage.set(HISTORY_STORAGE_KEY, &raw)
    }

    pub fn append(
        &mut self,
        analysis: ChartAnalysis,
        image_base64: String,
        timeframe: Timeframe,
        indicators: Vec<String>,
    ) -> Result<&HistoryItem, StorageError> {
        let item = HistoryItem {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            analysis,
            image_base64,
            timeframe,
            indicators,
        };

        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.push(item);
        items.extend(self.items.iter().cloned());
        self.persist(&items)?;
        self.items = items;
        info!("📝 History item added: {}", self.items[0].id);
        Ok(&self.items[0])
    }

    /// Returns false when no item has that id.
    pub fn remove(&mut self, id: &str) -> Result<bool, StorageError> {
        let items: Vec<HistoryItem> = self.items.iter().filter(|item| item.id != id).cloned().collect();
        if items.len() == self.items.len() {
            return Ok(false);
        }
        self.persist(&items)?;
        self.items = items;
        info!("🗑️ History item removed: {}", id);
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.persist(&[])?;
        self.items.clear();
        info!("🗑️ History cleared");
        Ok(())
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
