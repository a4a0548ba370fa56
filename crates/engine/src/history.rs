//! The read path: ordered activity feeds with pagination.
//!
//! History is informational, so store failures collapse to an empty page
//! (with a warning) instead of surfacing to the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use chronicle_core::ActionKind;
use chronicle_store::record::{HistoryPage, HistoryQuery};
use chronicle_store::store::RecordStore;

/// Pagination and filtering options for a history feed.
#[derive(Debug, Default, Clone)]
pub struct HistoryOptions {
    /// Maximum records per page (clamped by the store, default 50).
    pub limit: Option<u32>,
    /// Records to skip, for offset pagination.
    pub offset: Option<u32>,
    /// Only records written strictly before this time.
    pub before: Option<DateTime<Utc>>,
    /// Restrict to these action tags; empty matches everything.
    pub actions: Vec<ActionKind>,
}

impl HistoryOptions {
    fn into_query(self) -> HistoryQuery {
        HistoryQuery {
            limit: self.limit,
            offset: self.offset,
            before: self.before,
            actions: self.actions,
            ..HistoryQuery::default()
        }
    }
}

/// Read access to recorded activity.
pub struct HistoryFeed {
    records: Arc<dyn RecordStore>,
}

impl HistoryFeed {
    #[must_use]
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Activity for one resource, newest first.
    pub async fn for_resource(&self, resource_id: &str, options: HistoryOptions) -> HistoryPage {
        let mut query = options.into_query();
        query.resource_id = Some(resource_id.to_owned());
        self.run(query, "resource history").await
    }

    /// Activity performed by one actor, newest first.
    pub async fn for_actor(&self, actor_id: &str, options: HistoryOptions) -> HistoryPage {
        let mut query = options.into_query();
        query.actor_id = Some(actor_id.to_owned());
        self.run(query, "actor history").await
    }

    /// The unfiltered global feed. Intended for administrative callers;
    /// the excluded routing layer is responsible for gating access.
    pub async fn global(&self, options: HistoryOptions) -> HistoryPage {
        self.run(options.into_query(), "global history").await
    }

    async fn run(&self, query: HistoryQuery, operation: &'static str) -> HistoryPage {
        match self.records.query(&query).await {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, operation, "history query failed, returning empty page");
                HistoryPage::empty(&query)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use chronicle_core::{ActionKind, ActorSnapshot, EntityKind, EntityRef};
    use chronicle_store::error::StoreError;
    use chronicle_store::record::{ActivityRecord, RecordStatus};
    use chronicle_store_memory::MemoryRecordStore;

    use super::*;

    fn record(resource_id: &str, actor_id: &str, action: &str) -> ActivityRecord {
        ActivityRecord {
            id: Uuid::new_v4().to_string(),
            recorded_at: Utc::now(),
            action: ActionKind::new(action),
            actor: ActorSnapshot {
                id: Some(actor_id.to_owned()),
                email: format!("{actor_id}@example.com"),
                display_name: actor_id.to_owned(),
                role: "member".to_owned(),
            },
            resource: Some(EntityRef::new(EntityKind::PLAN, resource_id)),
            target: None,
            previous_state: None,
            new_state: Some(json!({"id": resource_id})),
            changes: Vec::new(),
            reason: "test".to_owned(),
            metadata: json!({}),
            rollback_token: None,
            status: RecordStatus::Success,
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn feeds_are_scoped() {
        let store = Arc::new(MemoryRecordStore::new());
        store.insert(record("p-1", "u-1", "plan_created")).await.unwrap();
        store.insert(record("p-2", "u-1", "plan_created")).await.unwrap();
        store.insert(record("p-1", "u-2", "plan_updated")).await.unwrap();

        let feed = HistoryFeed::new(store);

        let page = feed.for_resource("p-1", HistoryOptions::default()).await;
        assert_eq!(page.total, 2);

        let page = feed.for_actor("u-1", HistoryOptions::default()).await;
        assert_eq!(page.total, 2);

        let page = feed.global(HistoryOptions::default()).await;
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn action_filter_narrows_the_feed() {
        let store = Arc::new(MemoryRecordStore::new());
        store.insert(record("p-1", "u-1", "plan_created")).await.unwrap();
        store.insert(record("p-1", "u-1", "plan_updated")).await.unwrap();

        let feed = HistoryFeed::new(store);
        let options = HistoryOptions {
            actions: vec![ActionKind::new("plan_updated")],
            ..Default::default()
        };
        let page = feed.for_resource("p-1", options).await;
        assert_eq!(page.total, 1);
        assert_eq!(page.records[0].action.as_str(), "plan_updated");
    }

    /// A store whose reads always fail.
    struct FailingRecordStore;

    #[async_trait]
    impl chronicle_store::store::RecordStore for FailingRecordStore {
        async fn insert(&self, _record: ActivityRecord) -> Result<(), StoreError> {
            Err(StoreError::Storage("down".to_owned()))
        }

        async fn get_by_id(&self, _id: &str) -> Result<Option<ActivityRecord>, StoreError> {
            Err(StoreError::Storage("down".to_owned()))
        }

        async fn get_by_token(&self, _token: &str) -> Result<Option<ActivityRecord>, StoreError> {
            Err(StoreError::Storage("down".to_owned()))
        }

        async fn query(
            &self,
            _query: &chronicle_store::record::HistoryQuery,
        ) -> Result<HistoryPage, StoreError> {
            Err(StoreError::Storage("down".to_owned()))
        }
    }

    #[tokio::test]
    async fn read_failures_collapse_to_an_empty_page() {
        let feed = HistoryFeed::new(Arc::new(FailingRecordStore));
        let page = feed.global(HistoryOptions::default()).await;
        assert_eq!(page.total, 0);
        assert!(page.records.is_empty());
        assert_eq!(page.limit, 50);
    }
}
