//! Action tags for activity records.
//!
//! The action vocabulary is open: new tags are added over time without a
//! schema change, so `ActionKind` is an extensible tagged string rather
//! than a closed enum. The tags the system currently emits are documented
//! as constants and recognized by [`ActionKind::is_documented`].

use crate::entity::EntityKind;
use crate::macros::newtype_string;

newtype_string!(
    ActionKind,
    "The action tag on an activity record (e.g. `plan_created`)."
);

/// Action tags emitted by the engine itself and by the auth callers.
const DOCUMENTED: &[&str] = &[
    "experience_created",
    "experience_updated",
    "experience_deleted",
    "destination_created",
    "destination_updated",
    "destination_deleted",
    "plan_created",
    "plan_updated",
    "plan_deleted",
    "plan_item_completed",
    "photo_created",
    "photo_updated",
    "photo_deleted",
    "user_created",
    "user_updated",
    "user_deleted",
    "cost_added",
    "rollback_performed",
    "user_login",
    "login_failed",
    "oauth_login",
    "session_created",
];

impl ActionKind {
    pub const ROLLBACK_PERFORMED: &'static str = "rollback_performed";
    pub const PLAN_ITEM_COMPLETED: &'static str = "plan_item_completed";
    pub const COST_ADDED: &'static str = "cost_added";
    pub const USER_LOGIN: &'static str = "user_login";
    pub const LOGIN_FAILED: &'static str = "login_failed";
    pub const OAUTH_LOGIN: &'static str = "oauth_login";
    pub const SESSION_CREATED: &'static str = "session_created";

    /// The creation tag for an entity kind, e.g. `plan_created`.
    #[must_use]
    pub fn created(kind: &EntityKind) -> Self {
        Self::new(format!("{}_created", kind.tag()))
    }

    /// The update tag for an entity kind, e.g. `experience_updated`.
    #[must_use]
    pub fn updated(kind: &EntityKind) -> Self {
        Self::new(format!("{}_updated", kind.tag()))
    }

    /// The deletion tag for an entity kind, e.g. `photo_deleted`.
    #[must_use]
    pub fn deleted(kind: &EntityKind) -> Self {
        Self::new(format!("{}_deleted", kind.tag()))
    }

    /// `true` if the tag is part of the documented vocabulary.
    ///
    /// Undocumented tags are still legal; this exists so tooling can flag
    /// tags that should be added to the documented list.
    #[must_use]
    pub fn is_documented(&self) -> bool {
        DOCUMENTED.contains(&self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_tags_use_lowercase_kind() {
        let plan = EntityKind::new(EntityKind::PLAN);
        assert_eq!(ActionKind::created(&plan).as_str(), "plan_created");
        assert_eq!(ActionKind::updated(&plan).as_str(), "plan_updated");
        assert_eq!(ActionKind::deleted(&plan).as_str(), "plan_deleted");
    }

    #[test]
    fn documented_vocabulary_includes_derived_tags() {
        for kind in [
            EntityKind::EXPERIENCE,
            EntityKind::DESTINATION,
            EntityKind::PLAN,
            EntityKind::PHOTO,
            EntityKind::USER,
        ] {
            let kind = EntityKind::new(kind);
            assert!(ActionKind::created(&kind).is_documented(), "{kind}");
            assert!(ActionKind::updated(&kind).is_documented(), "{kind}");
            assert!(ActionKind::deleted(&kind).is_documented(), "{kind}");
        }
        assert!(ActionKind::new(ActionKind::ROLLBACK_PERFORMED).is_documented());
    }

    #[test]
    fn unknown_tags_are_legal_but_undocumented() {
        let custom = ActionKind::new("itinerary_reshuffled");
        assert_eq!(custom.as_str(), "itinerary_reshuffled");
        assert!(!custom.is_documented());
    }
}
