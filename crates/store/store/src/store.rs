use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::{ActivityRecord, HistoryPage, HistoryQuery};

/// Trait for activity record storage backends.
///
/// Records are append-only; implementations expose no update or delete
/// operation. Implementations must be `Send + Sync` to be shared across
/// async tasks.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist an activity record.
    async fn insert(&self, record: ActivityRecord) -> Result<(), StoreError>;

    /// Retrieve a record by its unique id.
    async fn get_by_id(&self, id: &str) -> Result<Option<ActivityRecord>, StoreError>;

    /// Retrieve the record addressed by a rollback token.
    ///
    /// Tokens are unique per record, so this returns at most one match.
    async fn get_by_token(&self, token: &str) -> Result<Option<ActivityRecord>, StoreError>;

    /// Query records with filters and pagination, newest first.
    async fn query(&self, query: &HistoryQuery) -> Result<HistoryPage, StoreError>;
}
