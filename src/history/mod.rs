pub mod storage;
pub mod store;

pub use storage::{FileStore, KeyValueStore};
pub use store::{HistoryItem, HistoryStore, HISTORY_STORAGE_KEY};
