use serde::{Deserialize, Serialize};

/// An authenticated principal as supplied by the calling auth layer.
///
/// This type is deliberately minimal: the engine never performs
/// authentication or authorization itself, it only snapshots who acted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    /// Stable user identifier.
    pub id: String,
    /// The principal's email address.
    pub email: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Role name, if the auth layer assigns one.
    pub role: Option<String>,
}

/// A point-in-time snapshot of the acting principal.
///
/// Captured at write time rather than referenced, so a record stays
/// meaningful after the actor is deleted or renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    /// Actor id; `None` for the system/anonymous sentinel.
    pub id: Option<String>,
    pub email: String,
    pub display_name: String,
    pub role: String,
}

impl ActorSnapshot {
    /// The sentinel used when no authenticated principal is present.
    #[must_use]
    pub fn system() -> Self {
        Self {
            id: None,
            email: "system".to_owned(),
            display_name: "System".to_owned(),
            role: "system".to_owned(),
        }
    }

    /// Snapshot a principal, or fall back to the system sentinel.
    ///
    /// A principal without an assigned role is recorded with the generic
    /// non-privileged `"member"` role.
    #[must_use]
    pub fn from_principal(principal: Option<&Principal>) -> Self {
        match principal {
            None => Self::system(),
            Some(p) => Self {
                id: Some(p.id.clone()),
                email: p.email.clone(),
                display_name: p.display_name.clone(),
                role: p.role.clone().unwrap_or_else(|| "member".to_owned()),
            },
        }
    }

    /// `true` if this snapshot is the system sentinel rather than a user.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_principal_yields_system_sentinel() {
        let actor = ActorSnapshot::from_principal(None);
        assert_eq!(actor, ActorSnapshot::system());
        assert!(actor.is_system());
        assert_eq!(actor.email, "system");
        assert_eq!(actor.display_name, "System");
        assert_eq!(actor.role, "system");
    }

    #[test]
    fn principal_fields_are_snapshotted() {
        let principal = Principal {
            id: "u-42".to_owned(),
            email: "alice@example.com".to_owned(),
            display_name: "Alice".to_owned(),
            role: Some("admin".to_owned()),
        };
        let actor = ActorSnapshot::from_principal(Some(&principal));
        assert_eq!(actor.id.as_deref(), Some("u-42"));
        assert_eq!(actor.email, "alice@example.com");
        assert_eq!(actor.role, "admin");
        assert!(!actor.is_system());
    }

    #[test]
    fn missing_role_defaults_to_member() {
        let principal = Principal {
            id: "u-1".to_owned(),
            email: "bob@example.com".to_owned(),
            display_name: "Bob".to_owned(),
            role: None,
        };
        let actor = ActorSnapshot::from_principal(Some(&principal));
        assert_eq!(actor.role, "member");
    }
}
