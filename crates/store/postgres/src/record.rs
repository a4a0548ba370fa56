use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use chronicle_core::{ActionKind, ActorSnapshot, EntityRef, FieldChange};
use chronicle_store::error::StoreError;
use chronicle_store::record::{ActivityRecord, HistoryPage, HistoryQuery, RecordStatus};
use chronicle_store::store::RecordStore;

use crate::config::PostgresStoreConfig;
use crate::migrations;

/// Postgres-backed record store using `sqlx`.
///
/// Filterable fields (`action`, `actor_id`, `resource_id`, `status`) are
/// denormalized into columns; snapshots, refs, and metadata live in JSONB.
pub struct PostgresRecordStore {
    pool: PgPool,
    table: String,
}

impl PostgresRecordStore {
    /// Create a new store, connecting to Postgres and running migrations.
    pub async fn new(config: &PostgresStoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Self::from_pool(pool, &config.prefix).await
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: PgPool, prefix: &str) -> Result<Self, StoreError> {
        migrations::run_migrations(&pool, prefix)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(Self {
            pool,
            table: format!("{prefix}records"),
        })
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn insert(&self, record: ActivityRecord) -> Result<(), StoreError> {
        let sql = format!(
            r"
            INSERT INTO {} (
                id, recorded_at, action,
                actor, actor_id,
                resource, resource_id, resource_kind,
                target, previous_state, new_state, changes,
                reason, metadata, rollback_token, status, tags
            ) VALUES (
                $1, $2, $3,
                $4, $5,
                $6, $7, $8,
                $9, $10, $11, $12,
                $13, $14, $15, $16, $17
            )
            ",
            self.table
        );

        let actor = serde_json::to_value(&record.actor)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let resource = record
            .resource
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let target = record
            .target
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let changes = serde_json::to_value(&record.changes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        sqlx::query(&sql)
            .bind(&record.id)
            .bind(record.recorded_at)
            .bind(record.action.as_str())
            .bind(actor)
            .bind(&record.actor.id)
            .bind(resource)
            .bind(record.resource.as_ref().map(|r| r.id.clone()))
            .bind(record.resource.as_ref().map(|r| r.kind.as_str().to_owned()))
            .bind(target)
            .bind(&record.previous_state)
            .bind(&record.new_state)
            .bind(changes)
            .bind(&record.reason)
            .bind(&record.metadata)
            .bind(&record.rollback_token)
            .bind(record.status.as_str())
            .bind(&record.tags)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<ActivityRecord>, StoreError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", self.table);

        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_token(&self, token: &str) -> Result<Option<ActivityRecord>, StoreError> {
        let sql = format!("SELECT * FROM {} WHERE rollback_token = $1", self.table);

        let row = sqlx::query_as::<_, RecordRow>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        row.map(TryInto::try_into).transpose()
    }

    async fn query(&self, query: &HistoryQuery) -> Result<HistoryPage, StoreError> {
        let limit = query.effective_limit();
        let offset = query.effective_offset();
        let clause = build_where_clause(query);

        // Count query.
        let count_sql = format!("SELECT COUNT(*) FROM {} {}", self.table, clause.sql);
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for b in &clause.string_binds {
            count_q = count_q.bind(b);
        }
        if clause.actions_bound {
            count_q = count_q.bind(action_strings(query));
        }
        if clause.before_bound {
            count_q = count_q.bind(query.before.unwrap());
        }

        let total = count_q
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        // Data query.
        let limit_idx = clause.next_idx;
        let offset_idx = clause.next_idx + 1;
        let data_sql = format!(
            "SELECT * FROM {} {} ORDER BY recorded_at DESC LIMIT ${limit_idx} OFFSET ${offset_idx}",
            self.table, clause.sql
        );

        let mut data_q = sqlx::query_as::<_, RecordRow>(&data_sql);
        for b in &clause.string_binds {
            data_q = data_q.bind(b);
        }
        if clause.actions_bound {
            data_q = data_q.bind(action_strings(query));
        }
        if clause.before_bound {
            data_q = data_q.bind(query.before.unwrap());
        }
        data_q = data_q.bind(i64::from(limit)).bind(i64::from(offset));

        let rows: Vec<RecordRow> = data_q
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let records = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>, _>>()?;

        #[allow(clippy::cast_sign_loss)]
        let total = total.max(0) as u64;

        Ok(HistoryPage {
            records,
            total,
            limit,
            offset,
        })
    }
}

fn action_strings(query: &HistoryQuery) -> Vec<String> {
    query
        .actions
        .iter()
        .map(|a| a.as_str().to_owned())
        .collect()
}

/// The WHERE clause plus bind bookkeeping for a history query.
struct WhereClause {
    sql: String,
    string_binds: Vec<String>,
    actions_bound: bool,
    before_bound: bool,
    next_idx: u32,
}

/// Build the WHERE clause and bind values for the query.
///
/// Bind order is: plain string filters, then the action list, then the
/// `before` timestamp; callers must bind in the same order.
fn build_where_clause(query: &HistoryQuery) -> WhereClause {
    let mut conditions = Vec::new();
    let mut string_binds: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;

    if let Some(ref resource_id) = query.resource_id {
        conditions.push(format!("resource_id = ${bind_idx}"));
        string_binds.push(resource_id.clone());
        bind_idx += 1;
    }
    if let Some(ref actor_id) = query.actor_id {
        conditions.push(format!("actor_id = ${bind_idx}"));
        string_binds.push(actor_id.clone());
        bind_idx += 1;
    }
    if let Some(status) = query.status {
        conditions.push(format!("status = ${bind_idx}"));
        string_binds.push(status.as_str().to_owned());
        bind_idx += 1;
    }
    if let Some(ref tag) = query.tag {
        conditions.push(format!("${bind_idx} = ANY(tags)"));
        string_binds.push(tag.clone());
        bind_idx += 1;
    }

    let actions_bound = if query.actions.is_empty() {
        false
    } else {
        conditions.push(format!("action = ANY(${bind_idx})"));
        bind_idx += 1;
        true
    };

    let before_bound = if query.before.is_some() {
        conditions.push(format!("recorded_at < ${bind_idx}"));
        bind_idx += 1;
        true
    } else {
        false
    };

    let sql = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    WhereClause {
        sql,
        string_binds,
        actions_bound,
        before_bound,
        next_idx: bind_idx,
    }
}

/// Internal row type for mapping database rows to `ActivityRecord`.
#[derive(sqlx::FromRow)]
struct RecordRow {
    id: String,
    recorded_at: chrono::DateTime<chrono::Utc>,
    action: String,
    actor: serde_json::Value,
    resource: Option<serde_json::Value>,
    target: Option<serde_json::Value>,
    previous_state: Option<serde_json::Value>,
    new_state: Option<serde_json::Value>,
    changes: serde_json::Value,
    reason: String,
    metadata: serde_json::Value,
    rollback_token: Option<String>,
    status: String,
    tags: Vec<String>,
}

impl TryFrom<RecordRow> for ActivityRecord {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, StoreError> {
        let actor: ActorSnapshot = serde_json::from_value(row.actor)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let resource: Option<EntityRef> = row
            .resource
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let target: Option<EntityRef> = row
            .target
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let changes: Vec<FieldChange> = serde_json::from_value(row.changes)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let status = match row.status.as_str() {
            "success" => RecordStatus::Success,
            "failure" => RecordStatus::Failure,
            other => {
                return Err(StoreError::Serialization(format!(
                    "unknown record status: {other}"
                )));
            }
        };

        Ok(Self {
            id: row.id,
            recorded_at: row.recorded_at,
            action: ActionKind::new(row.action),
            actor,
            resource,
            target,
            previous_state: row.previous_state,
            new_state: row.new_state,
            changes,
            reason: row.reason,
            metadata: row.metadata,
            rollback_token: row.rollback_token,
            status,
            tags: row.tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use chronicle_store::record::{HistoryQuery, RecordStatus};

    use super::build_where_clause;

    #[test]
    fn empty_query_has_no_where_clause() {
        let clause = build_where_clause(&HistoryQuery::default());
        assert!(clause.sql.is_empty());
        assert!(clause.string_binds.is_empty());
        assert_eq!(clause.next_idx, 1);
    }

    #[test]
    fn bind_indices_are_sequential() {
        let query = HistoryQuery {
            resource_id: Some("e-1".to_owned()),
            actor_id: Some("u-1".to_owned()),
            status: Some(RecordStatus::Success),
            tag: Some("rollback".to_owned()),
            actions: vec![chronicle_core::ActionKind::new("plan_updated")],
            before: Some(chrono::Utc::now()),
            ..Default::default()
        };
        let clause = build_where_clause(&query);
        assert_eq!(
            clause.sql,
            "WHERE resource_id = $1 AND actor_id = $2 AND status = $3 \
             AND $4 = ANY(tags) AND action = ANY($5) AND recorded_at < $6"
        );
        assert_eq!(clause.string_binds.len(), 4);
        assert!(clause.actions_bound);
        assert!(clause.before_bound);
        assert_eq!(clause.next_idx, 7);
    }

    #[test]
    fn skipped_filters_do_not_consume_indices() {
        let query = HistoryQuery {
            actor_id: Some("u-1".to_owned()),
            before: Some(chrono::Utc::now()),
            ..Default::default()
        };
        let clause = build_where_clause(&query);
        assert_eq!(clause.sql, "WHERE actor_id = $1 AND recorded_at < $2");
        assert_eq!(clause.next_idx, 3);
    }
}
