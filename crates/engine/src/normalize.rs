//! Schema normalization for stale snapshots.
//!
//! A snapshot restored years after it was recorded may predate field
//! renames. The normalizer applies a table of known migrations before the
//! snapshot is used; the table is data, not control flow, so new renames
//! are registered without touching the restore path, and tests can
//! enumerate it exhaustively. Legacy fields with no migration rule pass
//! through unchanged; the entity store ignores fields the current schema
//! no longer has.

use serde_json::Value;

use chronicle_core::EntityKind;

/// One field rename in an entity kind's schema history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMigration {
    pub kind: EntityKind,
    pub old_field: String,
    pub new_field: String,
}

impl FieldMigration {
    #[must_use]
    pub fn new(
        kind: impl Into<EntityKind>,
        old_field: impl Into<String>,
        new_field: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            old_field: old_field.into(),
            new_field: new_field.into(),
        }
    }
}

/// Applies known field migrations to snapshots captured under older
/// schema generations.
pub struct SchemaNormalizer {
    migrations: Vec<FieldMigration>,
}

impl SchemaNormalizer {
    /// A normalizer with no migration rules.
    #[must_use]
    pub fn new() -> Self {
        Self {
            migrations: Vec::new(),
        }
    }

    /// The migrations accumulated over this schema's history.
    ///
    /// Extend this table whenever a persisted field is renamed; old
    /// snapshots referencing the previous name stay restorable.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut normalizer = Self::new();
        normalizer.register(FieldMigration::new(
            EntityKind::EXPERIENCE,
            "image_url",
            "cover_image_url",
        ));
        normalizer.register(FieldMigration::new(
            EntityKind::DESTINATION,
            "country_code",
            "country",
        ));
        normalizer.register(FieldMigration::new(
            EntityKind::PLAN,
            "start_day",
            "start_date",
        ));
        normalizer.register(FieldMigration::new(
            EntityKind::USER,
            "username",
            "display_name",
        ));
        normalizer
    }

    /// Register an additional migration rule.
    pub fn register(&mut self, migration: FieldMigration) {
        self.migrations.push(migration);
    }

    /// The registered migration table.
    #[must_use]
    pub fn migrations(&self) -> &[FieldMigration] {
        &self.migrations
    }

    /// Apply every matching migration to a snapshot.
    ///
    /// An old-named value is moved onto the new name and the old key
    /// dropped. When the snapshot already carries the new name, the new
    /// value wins and the old key is still dropped.
    #[must_use]
    pub fn normalize(&self, kind: &EntityKind, mut snapshot: Value) -> Value {
        if let Some(obj) = snapshot.as_object_mut() {
            for migration in self.migrations.iter().filter(|m| &m.kind == kind) {
                if let Some(value) = obj.remove(&migration.old_field) {
                    obj.entry(migration.new_field.clone()).or_insert(value);
                }
            }
        }
        snapshot
    }
}

impl Default for SchemaNormalizer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn old_field_is_moved_to_new_name() {
        let normalizer = SchemaNormalizer::with_defaults();
        let kind = EntityKind::new(EntityKind::PLAN);

        let snapshot = json!({"name": "Road Trip", "start_day": "2019-06-01"});
        let normalized = normalizer.normalize(&kind, snapshot);

        assert_eq!(normalized["start_date"], json!("2019-06-01"));
        assert!(normalized.get("start_day").is_none());
    }

    #[test]
    fn existing_new_field_wins_and_old_key_is_dropped() {
        let normalizer = SchemaNormalizer::with_defaults();
        let kind = EntityKind::new(EntityKind::PLAN);

        let snapshot = json!({"start_day": "2019-06-01", "start_date": "2019-06-02"});
        let normalized = normalizer.normalize(&kind, snapshot);

        assert_eq!(normalized["start_date"], json!("2019-06-02"));
        assert!(normalized.get("start_day").is_none());
    }

    #[test]
    fn unmapped_legacy_fields_pass_through() {
        let normalizer = SchemaNormalizer::with_defaults();
        let kind = EntityKind::new(EntityKind::PLAN);

        let snapshot = json!({"ancient_flag": true, "name": "Road Trip"});
        let normalized = normalizer.normalize(&kind, snapshot);
        assert_eq!(normalized["ancient_flag"], json!(true));
    }

    #[test]
    fn migrations_are_scoped_by_kind() {
        let normalizer = SchemaNormalizer::with_defaults();
        let kind = EntityKind::new(EntityKind::PHOTO);

        // `start_day` only migrates for plans.
        let snapshot = json!({"start_day": "2019-06-01"});
        let normalized = normalizer.normalize(&kind, snapshot);
        assert_eq!(normalized["start_day"], json!("2019-06-01"));
    }

    #[test]
    fn every_default_migration_applies_to_its_kind() {
        let normalizer = SchemaNormalizer::with_defaults();
        for migration in normalizer.migrations() {
            let snapshot = json!({migration.old_field.clone(): "legacy"});
            let normalized = normalizer.normalize(&migration.kind, snapshot);
            assert_eq!(
                normalized[&migration.new_field],
                json!("legacy"),
                "{} -> {}",
                migration.old_field,
                migration.new_field
            );
            assert!(normalized.get(&migration.old_field).is_none());
        }
    }

    #[test]
    fn registered_rules_extend_the_table() {
        let mut normalizer = SchemaNormalizer::new();
        normalizer.register(FieldMigration::new(
            EntityKind::PHOTO,
            "url",
            "storage_url",
        ));

        let kind = EntityKind::new(EntityKind::PHOTO);
        let normalized = normalizer.normalize(&kind, json!({"url": "s3://x"}));
        assert_eq!(normalized["storage_url"], json!("s3://x"));
    }

    #[test]
    fn non_object_snapshots_are_left_alone() {
        let normalizer = SchemaNormalizer::with_defaults();
        let kind = EntityKind::new(EntityKind::PLAN);
        assert_eq!(normalizer.normalize(&kind, json!(null)), json!(null));
    }
}
