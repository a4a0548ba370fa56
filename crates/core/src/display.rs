//! Display-name resolution for entity snapshots.
//!
//! Different entity kinds keep their human-readable name in different
//! places (a plan is named after its parent experience, a user after its
//! display name). Resolution is a dispatch table keyed by kind so new
//! entity types register a function instead of growing a conditional
//! chain.

use std::collections::HashMap;

use serde_json::Value;

use crate::entity::EntityKind;

type NameFn = fn(&Value) -> Option<String>;

/// Resolves a display name from an entity document by kind.
pub struct DisplayNameResolver {
    table: HashMap<EntityKind, NameFn>,
}

impl DisplayNameResolver {
    /// An empty resolver with only the generic fallback rule.
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// A resolver preloaded with the rules for the known entity kinds.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut resolver = Self::new();
        resolver.register(EntityKind::new(EntityKind::PLAN), plan_name);
        resolver.register(EntityKind::new(EntityKind::USER), user_name);
        resolver
    }

    /// Register (or replace) the resolution rule for a kind.
    pub fn register(&mut self, kind: EntityKind, f: NameFn) {
        self.table.insert(kind, f);
    }

    /// Resolve the display name for a document of the given kind.
    ///
    /// Kinds without a registered rule fall back to the document's `name`
    /// then `title` field.
    #[must_use]
    pub fn resolve(&self, kind: &EntityKind, doc: &Value) -> Option<String> {
        match self.table.get(kind) {
            Some(f) => f(doc),
            None => generic_name(doc),
        }
    }
}

impl Default for DisplayNameResolver {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn string_field(doc: &Value, field: &str) -> Option<String> {
    doc.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn generic_name(doc: &Value) -> Option<String> {
    string_field(doc, "name").or_else(|| string_field(doc, "title"))
}

/// Plans are named after the experience they belong to when one is nested.
fn plan_name(doc: &Value) -> Option<String> {
    doc.get("experience")
        .and_then(|exp| string_field(exp, "name"))
        .or_else(|| generic_name(doc))
}

fn user_name(doc: &Value) -> Option<String> {
    string_field(doc, "display_name").or_else(|| string_field(doc, "email"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generic_rule_reads_name_then_title() {
        let resolver = DisplayNameResolver::with_defaults();
        let kind = EntityKind::new(EntityKind::EXPERIENCE);

        let doc = json!({"name": "Sunset Sail"});
        assert_eq!(resolver.resolve(&kind, &doc).as_deref(), Some("Sunset Sail"));

        let doc = json!({"title": "Harbor Walk"});
        assert_eq!(resolver.resolve(&kind, &doc).as_deref(), Some("Harbor Walk"));

        let doc = json!({"price": 10});
        assert!(resolver.resolve(&kind, &doc).is_none());
    }

    #[test]
    fn plan_prefers_nested_experience_name() {
        let resolver = DisplayNameResolver::with_defaults();
        let kind = EntityKind::new(EntityKind::PLAN);

        let doc = json!({"name": "fallback", "experience": {"name": "Road Trip"}});
        assert_eq!(resolver.resolve(&kind, &doc).as_deref(), Some("Road Trip"));

        let doc = json!({"name": "Solo Plan"});
        assert_eq!(resolver.resolve(&kind, &doc).as_deref(), Some("Solo Plan"));
    }

    #[test]
    fn user_falls_back_to_email() {
        let resolver = DisplayNameResolver::with_defaults();
        let kind = EntityKind::new(EntityKind::USER);

        let doc = json!({"display_name": "Alice", "email": "alice@example.com"});
        assert_eq!(resolver.resolve(&kind, &doc).as_deref(), Some("Alice"));

        let doc = json!({"email": "bob@example.com"});
        assert_eq!(resolver.resolve(&kind, &doc).as_deref(), Some("bob@example.com"));
    }

    #[test]
    fn registered_rule_overrides_fallback() {
        let mut resolver = DisplayNameResolver::new();
        resolver.register(EntityKind::new(EntityKind::PHOTO), |doc| {
            doc.get("caption")
                .and_then(Value::as_str)
                .map(str::to_owned)
        });

        let kind = EntityKind::new(EntityKind::PHOTO);
        let doc = json!({"caption": "Pier at dusk", "name": "IMG_0042.jpg"});
        assert_eq!(resolver.resolve(&kind, &doc).as_deref(), Some("Pier at dusk"));
    }

    #[test]
    fn empty_name_is_treated_as_missing() {
        let resolver = DisplayNameResolver::with_defaults();
        let kind = EntityKind::new(EntityKind::DESTINATION);
        let doc = json!({"name": "", "title": "Lisbon"});
        assert_eq!(resolver.resolve(&kind, &doc).as_deref(), Some("Lisbon"));
    }
}
