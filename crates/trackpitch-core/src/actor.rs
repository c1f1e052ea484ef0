//! Ambient caller identity.

use uuid::Uuid;

/// Role of the current caller. Dispatch on this enum rather than on raw
/// role strings; anything unrecognized collapses into `Unknown`, which
/// read paths treat as "no results" by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    /// An artist pitching tracks.
    Artist,
    /// A curator reviewing submissions for a catalog slot.
    Curator,
    /// Any other role; yields empty results on role-dependent queries.
    Unknown,
}

impl ActorRole {
    /// Parses a role name. Unrecognized names map to `Unknown`.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "Artist" => Self::Artist,
            "Curator" => Self::Curator,
            _ => Self::Unknown,
        }
    }
}

/// Identity and correlation metadata for the current caller, supplied by
/// the authentication layer upstream of every handler.
#[derive(Debug, Clone, Copy)]
pub struct ActorContext {
    /// Identifier of the calling user.
    pub actor_id: Uuid,
    /// Role the caller is acting under.
    pub role: ActorRole,
    /// Correlation id threaded through writes and outbox events.
    pub correlation_id: Uuid,
}

impl ActorContext {
    /// Creates an actor context.
    #[must_use]
    pub fn new(actor_id: Uuid, role: ActorRole, correlation_id: Uuid) -> Self {
        Self {
            actor_id,
            role,
            correlation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_roles() {
        assert_eq!(ActorRole::parse("Artist"), ActorRole::Artist);
        assert_eq!(ActorRole::parse("Curator"), ActorRole::Curator);
    }

    #[test]
    fn test_parse_unknown_role_falls_back() {
        assert_eq!(ActorRole::parse("Admin"), ActorRole::Unknown);
        assert_eq!(ActorRole::parse("artist"), ActorRole::Unknown);
        assert_eq!(ActorRole::parse(""), ActorRole::Unknown);
    }
}
