use serde::{Deserialize, Serialize};

use crate::macros::newtype_string;

newtype_string!(
    EntityKind,
    "A tracked entity type tag (e.g. `Experience`, `Plan`)."
);

impl EntityKind {
    pub const EXPERIENCE: &'static str = "Experience";
    pub const DESTINATION: &'static str = "Destination";
    pub const PLAN: &'static str = "Plan";
    pub const PHOTO: &'static str = "Photo";
    pub const USER: &'static str = "User";

    /// Lowercase tag form, used for record tags and action derivation.
    #[must_use]
    pub fn tag(&self) -> String {
        self.as_str().to_lowercase()
    }
}

/// A snapshot reference to an entity affected by a record.
///
/// Like the actor snapshot, this captures identity and name at write time
/// rather than pointing at live data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    /// The entity's id in its backing collection.
    pub id: String,
    /// The entity type tag.
    pub kind: EntityKind,
    /// Display name at the time of recording, when resolvable.
    pub name: Option<String>,
}

impl EntityRef {
    #[must_use]
    pub fn new(kind: impl Into<EntityKind>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            name: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
