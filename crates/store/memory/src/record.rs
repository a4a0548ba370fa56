use async_trait::async_trait;
use dashmap::DashMap;

use chronicle_store::error::StoreError;
use chronicle_store::record::{ActivityRecord, HistoryPage, HistoryQuery};
use chronicle_store::store::RecordStore;

/// In-memory record store using `DashMap`. Suitable for development and
/// testing.
///
/// Records are stored in a concurrent hash map keyed by record id, with a
/// secondary index from rollback token to record id.
pub struct MemoryRecordStore {
    /// Primary store: record id -> `ActivityRecord`.
    records: DashMap<String, ActivityRecord>,
    /// Secondary index: rollback token -> record id.
    token_index: DashMap<String, String>,
}

impl MemoryRecordStore {
    /// Create a new empty in-memory record store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            token_index: DashMap::new(),
        }
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// `true` if no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: ActivityRecord) -> Result<(), StoreError> {
        if let Some(token) = &record.rollback_token {
            self.token_index.insert(token.clone(), record.id.clone());
        }
        self.records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<ActivityRecord>, StoreError> {
        Ok(self.records.get(id).map(|r| r.value().clone()))
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<ActivityRecord>, StoreError> {
        let Some(id) = self.token_index.get(token) else {
            return Ok(None);
        };
        Ok(self.records.get(id.value()).map(|r| r.value().clone()))
    }

    async fn query(&self, query: &HistoryQuery) -> Result<HistoryPage, StoreError> {
        let limit = query.effective_limit();
        let offset = query.effective_offset();

        // Collect all matching records.
        let mut matching: Vec<ActivityRecord> = self
            .records
            .iter()
            .filter_map(|entry| {
                let rec = entry.value();
                if let Some(ref resource_id) = query.resource_id {
                    let matches = rec
                        .resource
                        .as_ref()
                        .is_some_and(|r| &r.id == resource_id);
                    if !matches {
                        return None;
                    }
                }
                if let Some(ref actor_id) = query.actor_id {
                    if rec.actor.id.as_ref() != Some(actor_id) {
                        return None;
                    }
                }
                if !query.actions.is_empty() && !query.actions.contains(&rec.action) {
                    return None;
                }
                if let Some(status) = query.status {
                    if rec.status != status {
                        return None;
                    }
                }
                if let Some(ref tag) = query.tag {
                    if !rec.tags.iter().any(|t| t == tag) {
                        return None;
                    }
                }
                if let Some(ref before) = query.before {
                    if rec.recorded_at >= *before {
                        return None;
                    }
                }
                Some(rec.clone())
            })
            .collect();

        // Sort newest first.
        matching.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));

        let total = matching.len() as u64;
        let records: Vec<ActivityRecord> = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok(HistoryPage {
            records,
            total,
            limit,
            offset,
        })
    }
}
