//! Field-level diffing between entity snapshots.
//!
//! Comparison is structural on `serde_json::Value`, which is independent
//! of object key order, so two serializations of the same state can never
//! produce a false-positive change. Fields are compared only when named in
//! the caller's allow-list; an empty allow-list always yields an empty
//! diff.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One changed field between two snapshots of the same entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// The field name from the allow-list.
    pub field: String,
    /// Value before the change; JSON `null` when the field was absent.
    pub old_value: Value,
    /// Value after the change; JSON `null` when the field was absent.
    pub new_value: Value,
}

/// Compute the field-level change set between two snapshots.
///
/// Output preserves the allow-list order and omits unchanged fields. A
/// field absent from a snapshot compares as JSON `null`, so adding a field
/// with an explicit `null` value is not reported as a change.
#[must_use]
pub fn compute_changes(old: &Value, new: &Value, fields: &[String]) -> Vec<FieldChange> {
    fields
        .iter()
        .filter_map(|field| {
            let old_value = field_value(old, field);
            let new_value = field_value(new, field);
            if old_value == new_value {
                None
            } else {
                Some(FieldChange {
                    field: field.clone(),
                    old_value,
                    new_value,
                })
            }
        })
        .collect()
}

/// Look up a top-level field, treating non-objects and missing keys as null.
fn field_value(snapshot: &Value, field: &str) -> Value {
    snapshot
        .as_object()
        .and_then(|obj| obj.get(field))
        .cloned()
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identical_snapshots_produce_no_changes() {
        let snapshot = json!({"name": "Sunset Sail", "price": 120, "tags": ["boat", "evening"]});
        let fields = vec!["name".to_owned(), "price".to_owned(), "tags".to_owned()];
        assert!(compute_changes(&snapshot, &snapshot, &fields).is_empty());
    }

    #[test]
    fn reordered_object_keys_are_not_a_change() {
        let old = json!({"detail": {"a": 1, "b": 2}});
        let new = json!({"detail": {"b": 2, "a": 1}});
        let fields = vec!["detail".to_owned()];
        assert!(compute_changes(&old, &new, &fields).is_empty());
    }

    #[test]
    fn empty_allow_list_yields_empty_diff() {
        let old = json!({"name": "A"});
        let new = json!({"name": "B", "price": 10});
        assert!(compute_changes(&old, &new, &[]).is_empty());
    }

    #[test]
    fn only_allow_listed_fields_are_reported() {
        let old = json!({"name": "A", "price": 10});
        let new = json!({"name": "B", "price": 20});
        let fields = vec!["name".to_owned()];

        let changes = compute_changes(&old, &new, &fields);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "name");
        assert_eq!(changes[0].old_value, json!("A"));
        assert_eq!(changes[0].new_value, json!("B"));
    }

    #[test]
    fn output_preserves_allow_list_order() {
        let old = json!({"a": 1, "b": 2, "c": 3});
        let new = json!({"a": 9, "b": 2, "c": 7});
        let fields = vec!["c".to_owned(), "a".to_owned(), "b".to_owned()];

        let changes = compute_changes(&old, &new, &fields);
        let names: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(names, ["c", "a"]);
    }

    #[test]
    fn absent_field_compares_as_null() {
        let old = json!({"name": "A"});
        let new = json!({"name": "A", "notes": null});
        let fields = vec!["notes".to_owned()];
        assert!(compute_changes(&old, &new, &fields).is_empty());

        let new = json!({"name": "A", "notes": "remember sunscreen"});
        let changes = compute_changes(&old, &new, &fields);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_value, Value::Null);
        assert_eq!(changes[0].new_value, json!("remember sunscreen"));
    }

    #[test]
    fn nested_value_changes_are_detected() {
        let old = json!({"schedule": {"day": 1, "slot": "am"}});
        let new = json!({"schedule": {"day": 1, "slot": "pm"}});
        let fields = vec!["schedule".to_owned()];

        let changes = compute_changes(&old, &new, &fields);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_value, json!({"day": 1, "slot": "pm"}));
    }
}
