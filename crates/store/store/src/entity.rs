use async_trait::async_trait;

use chronicle_core::EntityKind;

use crate::error::StoreError;

/// Trait for the live-entity document store the restoration path writes to.
///
/// Entities are JSON documents grouped into per-kind collections. The
/// store owns identity: `insert` assigns a fresh id and stamps it into the
/// document's `id` field. Fields in a saved document that no longer exist
/// in the current schema are ignored by the backing store rather than
/// rejected.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch an entity document by kind and id.
    async fn get(
        &self,
        kind: &EntityKind,
        id: &str,
    ) -> Result<Option<serde_json::Value>, StoreError>;

    /// Insert a new entity, assigning a fresh identity. Returns the new id.
    async fn insert(
        &self,
        kind: &EntityKind,
        doc: serde_json::Value,
    ) -> Result<String, StoreError>;

    /// Save a document over an existing entity's persisted fields.
    async fn update(
        &self,
        kind: &EntityKind,
        id: &str,
        doc: serde_json::Value,
    ) -> Result<(), StoreError>;

    /// Delete an entity. Returns `true` if it existed.
    async fn delete(&self, kind: &EntityKind, id: &str) -> Result<bool, StoreError>;
}
