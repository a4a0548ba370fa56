use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use chronicle_core::EntityKind;
use chronicle_store::entity::EntityStore;
use chronicle_store::error::StoreError;

/// In-memory entity store using `DashMap`. Suitable for development and
/// testing.
///
/// Documents are keyed by `kind:id`. Identity assignment matches the
/// Postgres backend: `insert` generates a UUID and stamps it into the
/// document's `id` field.
pub struct MemoryEntityStore {
    docs: DashMap<String, serde_json::Value>,
}

impl MemoryEntityStore {
    /// Create a new empty in-memory entity store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            docs: DashMap::new(),
        }
    }

    fn key(kind: &EntityKind, id: &str) -> String {
        format!("{}:{id}", kind.as_str())
    }
}

impl Default for MemoryEntityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    async fn get(
        &self,
        kind: &EntityKind,
        id: &str,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.docs.get(&Self::key(kind, id)).map(|d| d.value().clone()))
    }

    async fn insert(
        &self,
        kind: &EntityKind,
        mut doc: serde_json::Value,
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        match doc.as_object_mut() {
            Some(obj) => {
                obj.insert("id".to_owned(), serde_json::Value::String(id.clone()));
            }
            None => {
                return Err(StoreError::Serialization(
                    "entity document must be a JSON object".to_owned(),
                ));
            }
        }
        self.docs.insert(Self::key(kind, &id), doc);
        Ok(id)
    }

    async fn update(
        &self,
        kind: &EntityKind,
        id: &str,
        doc: serde_json::Value,
    ) -> Result<(), StoreError> {
        if !doc.is_object() {
            return Err(StoreError::Serialization(
                "entity document must be a JSON object".to_owned(),
            ));
        }
        let key = Self::key(kind, id);
        if !self.docs.contains_key(&key) {
            return Err(StoreError::NotFound(format!("{kind} {id}")));
        }
        self.docs.insert(key, doc);
        Ok(())
    }

    async fn delete(&self, kind: &EntityKind, id: &str) -> Result<bool, StoreError> {
        Ok(self.docs.remove(&Self::key(kind, id)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use chronicle_core::EntityKind;
    use chronicle_store::entity::EntityStore;
    use serde_json::json;

    use super::MemoryEntityStore;

    fn plan_kind() -> EntityKind {
        EntityKind::new(EntityKind::PLAN)
    }

    #[tokio::test]
    async fn insert_assigns_fresh_identity() {
        let store = MemoryEntityStore::new();
        let kind = plan_kind();

        let id = store
            .insert(&kind, json!({"name": "Road Trip"}))
            .await
            .unwrap();
        let doc = store.get(&kind, &id).await.unwrap().unwrap();
        assert_eq!(doc["id"], json!(id));
        assert_eq!(doc["name"], json!("Road Trip"));
    }

    #[tokio::test]
    async fn insert_overwrites_caller_supplied_id() {
        let store = MemoryEntityStore::new();
        let kind = plan_kind();

        let id = store
            .insert(&kind, json!({"id": "stale-id", "name": "X"}))
            .await
            .unwrap();
        assert_ne!(id, "stale-id");
        assert!(store.get(&kind, "stale-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_replaces_document() {
        let store = MemoryEntityStore::new();
        let kind = plan_kind();

        let id = store.insert(&kind, json!({"name": "v1"})).await.unwrap();
        store
            .update(&kind, &id, json!({"id": id, "name": "v2"}))
            .await
            .unwrap();

        let doc = store.get(&kind, &id).await.unwrap().unwrap();
        assert_eq!(doc["name"], json!("v2"));
    }

    #[tokio::test]
    async fn update_missing_entity_is_not_found() {
        let store = MemoryEntityStore::new();
        let err = store
            .update(&plan_kind(), "nope", json!({"name": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, chronicle_store::StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn kinds_are_separate_collections() {
        let store = MemoryEntityStore::new();
        let plan = plan_kind();
        let photo = EntityKind::new(EntityKind::PHOTO);

        let id = store.insert(&plan, json!({"name": "p"})).await.unwrap();
        assert!(store.get(&photo, &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let store = MemoryEntityStore::new();
        let kind = plan_kind();

        let id = store.insert(&kind, json!({"name": "p"})).await.unwrap();
        assert!(store.delete(&kind, &id).await.unwrap());
        assert!(!store.delete(&kind, &id).await.unwrap());
        assert!(store.get(&kind, &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_object_documents_are_rejected() {
        let store = MemoryEntityStore::new();
        let err = store.insert(&plan_kind(), json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, chronicle_store::StoreError::Serialization(_)));
    }
}
