//! The write path: one immutable record per tracked mutation.
//!
//! Recording is fire-and-forget. Every `record_*` method builds the full
//! record synchronously, then hands the insert to a tracked background
//! task; persistence failures are logged and never reach the business
//! operation that triggered tracking. Call [`ActivityRecorder::shutdown`]
//! during service shutdown to drain in-flight writes.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tokio_util::task::TaskTracker;
use tracing::warn;
use uuid::Uuid;

use chronicle_core::{
    ActionKind, ActorSnapshot, CallContext, DisplayNameResolver, EntityKind, EntityRef,
    compute_changes, generate_rollback_token,
};
use chronicle_store::record::{ActivityRecord, RecordStatus};
use chronicle_store::store::RecordStore;

/// Who, besides the actor, a composite action is addressed to.
///
/// The shared/individual distinction is an explicit tag. It is never
/// inferred from an absent assignee, so a caller that forgets to pass an
/// assignee cannot silently broadcast to every collaborator.
#[derive(Debug, Clone)]
pub enum Audience {
    /// The action concerns a single assignee.
    Individual {
        /// The assigned user; no secondary record when equal to the actor.
        assignee_id: String,
    },
    /// The action concerns the whole collaborator set.
    Shared {
        /// Collaborators on the resource (may include the actor).
        collaborator_ids: Vec<String>,
        /// The resource owner, when distinct from the collaborators.
        owner_id: Option<String>,
    },
}

/// A domain action that may fan out to multiple records.
///
/// One business event produces a first-person record for the actor plus
/// one second-person record per interested party, each an independent
/// write.
#[derive(Debug, Clone)]
pub struct CompositeEvent {
    pub action: ActionKind,
    pub resource: EntityRef,
    pub audience: Audience,
    /// Verb phrase completing "You …" / "<actor> …", e.g.
    /// `added a $40 cost to "Road Trip"`.
    pub summary: String,
    pub target: Option<EntityRef>,
    pub previous_state: Option<Value>,
    pub new_state: Option<Value>,
    /// Action-specific metadata extras merged into every record.
    pub extras: Map<String, Value>,
}

impl CompositeEvent {
    #[must_use]
    pub fn new(
        action: ActionKind,
        resource: EntityRef,
        audience: Audience,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            action,
            resource,
            audience,
            summary: summary.into(),
            target: None,
            previous_state: None,
            new_state: None,
            extras: Map::new(),
        }
    }

    #[must_use]
    pub fn with_target(mut self, target: EntityRef) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn with_states(mut self, previous: Option<Value>, new: Option<Value>) -> Self {
        self.previous_state = previous;
        self.new_state = new;
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }
}

/// The fire-and-forget write path.
pub struct ActivityRecorder {
    records: Arc<dyn RecordStore>,
    display: Arc<DisplayNameResolver>,
    tasks: TaskTracker,
}

impl ActivityRecorder {
    /// Create a recorder over a record store with the default display
    /// name rules.
    #[must_use]
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self::with_resolver(records, Arc::new(DisplayNameResolver::with_defaults()))
    }

    /// Create a recorder with a custom display name resolver.
    #[must_use]
    pub fn with_resolver(records: Arc<dyn RecordStore>, display: Arc<DisplayNameResolver>) -> Self {
        Self {
            records,
            display,
            tasks: TaskTracker::new(),
        }
    }

    /// Record an entity creation.
    pub fn record_create(
        &self,
        kind: &EntityKind,
        resource: &Value,
        actor: &ActorSnapshot,
        ctx: &CallContext,
        reason: Option<String>,
    ) {
        let entity = self.entity_ref(kind, resource);
        let reason = reason.unwrap_or_else(|| describe("Created", kind, entity.name.as_deref()));
        let record = ActivityRecord {
            id: Uuid::new_v4().to_string(),
            recorded_at: Utc::now(),
            action: ActionKind::created(kind),
            actor: actor.clone(),
            resource: Some(entity),
            target: None,
            previous_state: None,
            new_state: Some(resource.clone()),
            changes: Vec::new(),
            reason,
            metadata: metadata_with(ctx, Map::new()),
            rollback_token: Some(generate_rollback_token()),
            status: RecordStatus::Success,
            tags: vec![kind.tag(), "create".to_owned()],
        };
        self.submit(record);
    }

    /// Record an entity update.
    ///
    /// `fields_to_track` is an explicit allow-list for the field-level
    /// diff; when empty, no changes are computed.
    pub fn record_update(
        &self,
        kind: &EntityKind,
        resource: &Value,
        previous: &Value,
        actor: &ActorSnapshot,
        ctx: &CallContext,
        fields_to_track: &[String],
        reason: Option<String>,
    ) {
        let entity = self.entity_ref(kind, resource);
        let reason = reason.unwrap_or_else(|| describe("Updated", kind, entity.name.as_deref()));
        let record = ActivityRecord {
            id: Uuid::new_v4().to_string(),
            recorded_at: Utc::now(),
            action: ActionKind::updated(kind),
            actor: actor.clone(),
            resource: Some(entity),
            target: None,
            previous_state: Some(previous.clone()),
            new_state: Some(resource.clone()),
            changes: compute_changes(previous, resource, fields_to_track),
            reason,
            metadata: metadata_with(ctx, Map::new()),
            rollback_token: Some(generate_rollback_token()),
            status: RecordStatus::Success,
            tags: vec![kind.tag(), "update".to_owned()],
        };
        self.submit(record);
    }

    /// Record an entity deletion. The pre-deletion snapshot makes the
    /// record recoverable: restoring it recreates the entity.
    pub fn record_delete(
        &self,
        kind: &EntityKind,
        resource: &Value,
        actor: &ActorSnapshot,
        ctx: &CallContext,
        reason: Option<String>,
    ) {
        let entity = self.entity_ref(kind, resource);
        let reason = reason.unwrap_or_else(|| describe("Deleted", kind, entity.name.as_deref()));
        let record = ActivityRecord {
            id: Uuid::new_v4().to_string(),
            recorded_at: Utc::now(),
            action: ActionKind::deleted(kind),
            actor: actor.clone(),
            resource: Some(entity),
            target: None,
            previous_state: Some(resource.clone()),
            new_state: None,
            changes: Vec::new(),
            reason,
            metadata: metadata_with(ctx, Map::new()),
            rollback_token: Some(generate_rollback_token()),
            status: RecordStatus::Success,
            tags: vec![kind.tag(), "delete".to_owned()],
        };
        self.submit(record);
    }

    /// Record an authentication event (login, failed login, session
    /// creation). Auth records carry no resource, no snapshots, and no
    /// rollback token.
    pub fn record_auth_event(
        &self,
        action: ActionKind,
        actor: &ActorSnapshot,
        ctx: &CallContext,
        status: RecordStatus,
        reason: impl Into<String>,
    ) {
        let record = ActivityRecord {
            id: Uuid::new_v4().to_string(),
            recorded_at: Utc::now(),
            action,
            actor: actor.clone(),
            resource: None,
            target: None,
            previous_state: None,
            new_state: None,
            changes: Vec::new(),
            reason: reason.into(),
            metadata: metadata_with(ctx, Map::new()),
            rollback_token: None,
            status,
            tags: vec!["auth".to_owned()],
        };
        self.submit(record);
    }

    /// Record a composite domain action, fanning out to every interested
    /// party.
    ///
    /// The actor's record is framed in the first person; each secondary
    /// record names the actor and carries `affected_user_id` metadata
    /// identifying who it is for. Fan-out writes are independent: one
    /// failing does not undo the others.
    pub fn record_composite(
        &self,
        event: CompositeEvent,
        actor: &ActorSnapshot,
        ctx: &CallContext,
    ) {
        let recoverable = event.previous_state.is_some() || event.new_state.is_some();
        let tags = vec![event.resource.kind.tag(), event.action.as_str().to_owned()];

        let primary = ActivityRecord {
            id: Uuid::new_v4().to_string(),
            recorded_at: Utc::now(),
            action: event.action.clone(),
            actor: actor.clone(),
            resource: Some(event.resource.clone()),
            target: event.target.clone(),
            previous_state: event.previous_state.clone(),
            new_state: event.new_state.clone(),
            changes: Vec::new(),
            reason: format!("You {}", event.summary),
            metadata: metadata_with(ctx, event.extras.clone()),
            rollback_token: recoverable.then(generate_rollback_token),
            status: RecordStatus::Success,
            tags: tags.clone(),
        };
        self.submit(primary);

        for affected in notification_recipients(&event.audience, actor) {
            let mut extras = event.extras.clone();
            extras.insert("affected_user_id".to_owned(), Value::String(affected));
            let mut tags = tags.clone();
            tags.push("notification".to_owned());

            let secondary = ActivityRecord {
                id: Uuid::new_v4().to_string(),
                recorded_at: Utc::now(),
                action: event.action.clone(),
                actor: actor.clone(),
                resource: Some(event.resource.clone()),
                target: event.target.clone(),
                previous_state: None,
                new_state: None,
                changes: Vec::new(),
                reason: format!("{} {}", actor.display_name, event.summary),
                metadata: metadata_with(ctx, extras),
                rollback_token: None,
                status: RecordStatus::Success,
                tags,
            };
            self.submit(secondary);
        }
    }

    /// Drain in-flight writes. After this the recorder accepts no new
    /// records; call it once during service shutdown.
    pub async fn shutdown(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }

    fn entity_ref(&self, kind: &EntityKind, resource: &Value) -> EntityRef {
        let id = resource
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let mut entity = EntityRef::new(kind.clone(), id);
        if let Some(name) = self.display.resolve(kind, resource) {
            entity = entity.with_name(name);
        }
        entity
    }

    /// Hand a record to a tracked background write. Failures are logged,
    /// never surfaced: the triggering business transaction is already
    /// complete.
    fn submit(&self, record: ActivityRecord) {
        let store = Arc::clone(&self.records);
        let action = record.action.clone();
        let record_id = record.id.clone();
        self.tasks.spawn(async move {
            if let Err(e) = store.insert(record).await {
                warn!(error = %e, record_id = %record_id, action = %action, "activity recording failed");
            }
        });
    }
}

/// Resolve who, besides the actor, receives a notification record.
fn notification_recipients(audience: &Audience, actor: &ActorSnapshot) -> Vec<String> {
    let actor_id = actor.id.as_deref();
    match audience {
        Audience::Individual { assignee_id } => {
            if Some(assignee_id.as_str()) == actor_id {
                Vec::new()
            } else {
                vec![assignee_id.clone()]
            }
        }
        Audience::Shared {
            collaborator_ids,
            owner_id,
        } => {
            let mut recipients: Vec<String> = collaborator_ids
                .iter()
                .filter(|id| Some(id.as_str()) != actor_id)
                .cloned()
                .collect();
            if let Some(owner) = owner_id {
                if Some(owner.as_str()) != actor_id && !recipients.contains(owner) {
                    recipients.push(owner.clone());
                }
            }
            recipients
        }
    }
}

fn describe(verb: &str, kind: &EntityKind, name: Option<&str>) -> String {
    match name {
        Some(name) => format!("{verb} {} \"{name}\"", kind.tag()),
        None => format!("{verb} {}", kind.tag()),
    }
}

fn metadata_with(ctx: &CallContext, extras: Map<String, Value>) -> Value {
    let mut map = ctx.metadata_object();
    map.extend(extras);
    Value::Object(map)
}
