use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use chronicle_core::{ActionKind, ActorSnapshot, EntityRef, FieldChange};

/// Outcome status of the operation a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Success,
    Failure,
}

impl RecordStatus {
    /// The lowercase tag form, as stored in backend columns.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// A single immutable activity record.
///
/// Records are append-only: restoration reads an old record and writes a
/// new one, it never edits the past.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityRecord {
    /// Unique record identifier (UUID v4).
    pub id: String,

    /// When the record was written. Wall-clock at write time, never
    /// back-dated to when the underlying mutation occurred.
    pub recorded_at: DateTime<Utc>,

    /// Open-vocabulary action tag (e.g. `plan_created`).
    #[schema(value_type = String)]
    pub action: ActionKind,

    /// Snapshot of the acting principal, captured at write time.
    #[schema(value_type = Object)]
    pub actor: ActorSnapshot,

    /// The primary entity affected; `None` only for pure auth events.
    #[schema(value_type = Option<Object>)]
    pub resource: Option<EntityRef>,

    /// Optional secondary entity (e.g. the plan item within a plan).
    #[schema(value_type = Option<Object>)]
    pub target: Option<EntityRef>,

    /// Full snapshot before the change; `None` for creations.
    pub previous_state: Option<serde_json::Value>,

    /// Full snapshot after the change; `None` for deletions.
    pub new_state: Option<serde_json::Value>,

    /// Field-level changes; populated only when an allow-list was given.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schema(value_type = Vec<Object>)]
    pub changes: Vec<FieldChange>,

    /// Human-readable description of what happened. Always populated.
    pub reason: String,

    /// Free-form metadata object: caller context plus action extras.
    pub metadata: serde_json::Value,

    /// Opaque restoration credential; present on recoverable transitions,
    /// absent on notification and auth records.
    #[serde(default)]
    pub rollback_token: Option<String>,

    /// Whether the described operation succeeded.
    pub status: RecordStatus,

    /// Free-text labels for filtering (entity type, operation, qualifiers).
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Query parameters for searching activity records.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryQuery {
    /// Filter by the primary resource's id.
    pub resource_id: Option<String>,
    /// Filter by the acting principal's id.
    pub actor_id: Option<String>,
    /// Filter by action tags; empty matches every action.
    #[serde(default)]
    #[schema(value_type = Vec<String>)]
    pub actions: Vec<ActionKind>,
    /// Filter by record status.
    pub status: Option<RecordStatus>,
    /// Filter by tag membership.
    pub tag: Option<String>,
    /// Only records written strictly before this time.
    pub before: Option<DateTime<Utc>>,
    /// Maximum number of records to return (default 50, max 500).
    pub limit: Option<u32>,
    /// Number of records to skip for pagination.
    pub offset: Option<u32>,
}

impl HistoryQuery {
    /// A query scoped to one resource's history.
    #[must_use]
    pub fn for_resource(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: Some(resource_id.into()),
            ..Self::default()
        }
    }

    /// A query scoped to one actor's history.
    #[must_use]
    pub fn for_actor(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: Some(actor_id.into()),
            ..Self::default()
        }
    }

    /// Return the effective limit, clamped to 1..=500, defaulting to 50.
    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(50).clamp(1, 500)
    }

    /// Return the effective offset, defaulting to 0.
    #[must_use]
    pub fn effective_offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

/// A paginated page of activity records, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryPage {
    /// The records matching the query.
    pub records: Vec<ActivityRecord>,
    /// Total number of matching records before pagination.
    pub total: u64,
    /// The limit used for this page.
    pub limit: u32,
    /// The offset used for this page.
    pub offset: u32,
}

impl HistoryPage {
    /// An empty page echoing the query's pagination values.
    #[must_use]
    pub fn empty(query: &HistoryQuery) -> Self {
        Self {
            records: Vec::new(),
            total: 0,
            limit: query.effective_limit(),
            offset: query.effective_offset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        let query = HistoryQuery::default();
        assert_eq!(query.effective_limit(), 50);

        let query = HistoryQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(query.effective_limit(), 1);

        let query = HistoryQuery {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(query.effective_limit(), 500);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RecordStatus::Success).unwrap(),
            "\"success\""
        );
        assert_eq!(RecordStatus::Failure.as_str(), "failure");
    }

    #[test]
    fn scoped_query_constructors() {
        let query = HistoryQuery::for_resource("e-1");
        assert_eq!(query.resource_id.as_deref(), Some("e-1"));
        assert!(query.actor_id.is_none());

        let query = HistoryQuery::for_actor("u-1");
        assert_eq!(query.actor_id.as_deref(), Some("u-1"));
    }
}
