//! Point-in-time state restoration.
//!
//! A restoration attempt walks a fixed sequence: token lookup, schema
//! normalization, target resolve, then either an in-place update or a
//! recreation, and finally an audit writeback describing the rollback
//! itself. Steps one through three are fatal on failure and write
//! nothing; a failed writeback is logged and reported as a missing
//! `rollback_token`, but never undoes the applied restoration.
//!
//! Restoring a record whose entity has since been deleted recreates the
//! entity under a fresh identity: rollback restores data, not identity
//! continuity.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::time::timeout;
use tracing::{error, info, instrument};
use uuid::Uuid;

use chronicle_core::{
    ActionKind, ActorSnapshot, CallContext, DisplayNameResolver, EntityKind, EntityRef,
    generate_rollback_token,
};
use chronicle_store::entity::EntityStore;
use chronicle_store::record::{ActivityRecord, RecordStatus};
use chronicle_store::store::RecordStore;

use crate::error::RestoreError;
use crate::normalize::SchemaNormalizer;

/// Default bound on each individual store call within a restoration.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// The outcome of a successful restoration.
#[derive(Debug, Clone)]
pub struct RestoreReport {
    /// Id of the live entity after restoration. Differs from the record's
    /// resource id when the entity was recreated.
    pub entity_id: String,
    /// The applied entity document.
    pub entity: Value,
    /// `true` when the original entity no longer existed and a new one
    /// was created from the snapshot.
    pub was_recreated: bool,
    /// Token of the rollback's own audit record, making the rollback
    /// itself reversible. `None` when the audit writeback failed; the
    /// restoration still stands.
    pub rollback_token: Option<String>,
    /// Human-readable confirmation for administrative tooling.
    pub message: String,
}

/// Restores the state captured by a record addressed via rollback token.
pub struct RestorationEngine {
    records: Arc<dyn RecordStore>,
    entities: Arc<dyn EntityStore>,
    normalizer: Arc<SchemaNormalizer>,
    display: Arc<DisplayNameResolver>,
    step_timeout: Duration,
}

impl RestorationEngine {
    /// Create an engine with the default normalizer, display rules, and
    /// step timeout.
    #[must_use]
    pub fn new(records: Arc<dyn RecordStore>, entities: Arc<dyn EntityStore>) -> Self {
        Self {
            records,
            entities,
            normalizer: Arc::new(SchemaNormalizer::with_defaults()),
            display: Arc::new(DisplayNameResolver::with_defaults()),
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Arc<SchemaNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, display: Arc<DisplayNameResolver>) -> Self {
        self.display = display;
        self
    }

    /// Bound each store call within a restoration attempt.
    #[must_use]
    pub fn with_step_timeout(mut self, step_timeout: Duration) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    /// Restore the state captured by the record the token addresses.
    ///
    /// Retrying with the same token is safe: it re-applies the same
    /// previous state, a no-op when nothing changed in between.
    #[instrument(skip_all)]
    pub async fn restore(
        &self,
        token: &str,
        actor: &ActorSnapshot,
        ctx: &CallContext,
    ) -> Result<RestoreReport, RestoreError> {
        // Token lookup.
        let record = self
            .bounded("token lookup", self.records.get_by_token(token))
            .await?
            .map_err(RestoreError::Lookup)?
            .ok_or(RestoreError::TokenNotFound)?;

        let resource = record
            .resource
            .clone()
            .ok_or_else(|| RestoreError::MissingResource(record.id.clone()))?;
        let snapshot = record
            .previous_state
            .clone()
            .ok_or_else(|| RestoreError::NoPreviousState(record.id.clone()))?;

        // Schema normalization of the (possibly stale) snapshot.
        let normalized = self.normalizer.normalize(&resource.kind, snapshot);

        // Target resolve.
        let live = self
            .bounded(
                "target lookup",
                self.entities.get(&resource.kind, &resource.id),
            )
            .await?
            .map_err(RestoreError::Lookup)?;

        let (entity_id, applied, previous_live, was_recreated) = match live {
            // Update in place, keeping the live identity stable even if
            // the snapshot carries a stale id.
            Some(current) => {
                let mut doc = normalized;
                if let Some(obj) = doc.as_object_mut() {
                    obj.insert("id".to_owned(), Value::String(resource.id.clone()));
                }
                self.bounded(
                    "restore write",
                    self.entities.update(&resource.kind, &resource.id, doc.clone()),
                )
                .await?
                .map_err(RestoreError::Write)?;
                (resource.id.clone(), doc, Some(current), false)
            }
            // The entity was deleted since the record was written:
            // recreate it from the snapshot under a fresh identity.
            None => {
                let mut doc = normalized;
                if let Some(obj) = doc.as_object_mut() {
                    obj.remove("id");
                }
                let new_id = self
                    .bounded(
                        "restore write",
                        self.entities.insert(&resource.kind, doc.clone()),
                    )
                    .await?
                    .map_err(RestoreError::Write)?;
                if let Some(obj) = doc.as_object_mut() {
                    obj.insert("id".to_owned(), Value::String(new_id.clone()));
                }
                (new_id, doc, None, true)
            }
        };

        info!(
            record_id = %record.id,
            entity_id = %entity_id,
            kind = %resource.kind,
            was_recreated,
            "state restored"
        );

        let rollback_token = self
            .write_back(
                &record,
                &resource.kind,
                &entity_id,
                previous_live,
                applied.clone(),
                was_recreated,
                actor,
                ctx,
            )
            .await;

        let message = if was_recreated {
            format!(
                "Restored data as a new {}; the original {} no longer existed",
                resource.kind.tag(),
                resource.id
            )
        } else {
            format!(
                "Restored {} {} to its recorded previous state",
                resource.kind.tag(),
                entity_id
            )
        };

        Ok(RestoreReport {
            entity_id,
            entity: applied,
            was_recreated,
            rollback_token,
            message,
        })
    }

    /// Write the audit record for the rollback itself.
    ///
    /// Returns the new record's token, or `None` when persisting it
    /// failed; the failure is logged at error severity because it breaks
    /// the recursive-undo guarantee for this one operation.
    #[allow(clippy::too_many_arguments)]
    async fn write_back(
        &self,
        source: &ActivityRecord,
        kind: &EntityKind,
        entity_id: &str,
        previous_live: Option<Value>,
        applied: Value,
        was_recreated: bool,
        actor: &ActorSnapshot,
        ctx: &CallContext,
    ) -> Option<String> {
        let mut entity = EntityRef::new(kind.clone(), entity_id);
        if let Some(name) = self.display.resolve(kind, &applied) {
            entity = entity.with_name(name);
        }

        let reason = match (&entity.name, was_recreated) {
            (Some(name), true) => format!("Recreated {} \"{name}\" from a rollback", kind.tag()),
            (Some(name), false) => {
                format!("Rolled back {} \"{name}\" to its previous state", kind.tag())
            }
            (None, true) => format!("Recreated {} from a rollback", kind.tag()),
            (None, false) => format!("Rolled back {} to its previous state", kind.tag()),
        };

        let mut tags = vec!["rollback".to_owned(), "admin".to_owned()];
        if was_recreated {
            tags.push("recreated".to_owned());
        }

        let mut metadata = ctx.metadata_object();
        metadata.insert(
            "source_record_id".to_owned(),
            Value::String(source.id.clone()),
        );

        let token = generate_rollback_token();
        let record = ActivityRecord {
            id: Uuid::new_v4().to_string(),
            recorded_at: Utc::now(),
            action: ActionKind::new(ActionKind::ROLLBACK_PERFORMED),
            actor: actor.clone(),
            resource: Some(entity),
            target: None,
            previous_state: previous_live,
            new_state: Some(applied),
            changes: Vec::new(),
            reason,
            metadata: Value::Object(metadata),
            rollback_token: Some(token.clone()),
            status: RecordStatus::Success,
            tags,
        };

        match timeout(self.step_timeout, self.records.insert(record)).await {
            Ok(Ok(())) => Some(token),
            Ok(Err(e)) => {
                error!(
                    error = %e,
                    source_record_id = %source.id,
                    "rollback audit writeback failed; restoration applied but not re-reversible"
                );
                None
            }
            Err(_) => {
                error!(
                    source_record_id = %source.id,
                    "rollback audit writeback timed out; restoration applied but not re-reversible"
                );
                None
            }
        }
    }

    async fn bounded<T>(
        &self,
        step: &'static str,
        fut: impl Future<Output = T>,
    ) -> Result<T, RestoreError> {
        timeout(self.step_timeout, fut)
            .await
            .map_err(|_| RestoreError::StepTimeout(step))
    }
}
