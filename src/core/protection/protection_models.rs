// Protection domain models - what the gateway reports and what it adds up to.

use std::fmt;

/// Structural changes within this many seconds count as one burst.
pub const STRUCTURE_WINDOW_SECS: i64 = 8;
/// Channel or role deletions in one burst that mark a nuke attempt.
pub const DELETION_LIMIT: usize = 3;
/// Channel or role creations in one burst that mark a raid.
pub const CREATION_LIMIT: usize = 6;
/// Window for the per-user message rate check.
pub const MESSAGE_WINDOW_SECS: i64 = 5;

/// A gateway event that can be part of an attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardEvent {
    MemberJoin,
    ChannelCreate,
    ChannelDelete,
    RoleCreate,
    RoleDelete,
}

/// The counter an event feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Burst {
    Joins,
    Creations,
    Deletions,
}

impl GuardEvent {
    pub fn burst(self) -> Burst {
        match self {
            GuardEvent::MemberJoin => Burst::Joins,
            GuardEvent::ChannelCreate | GuardEvent::RoleCreate => Burst::Creations,
            GuardEvent::ChannelDelete | GuardEvent::RoleDelete => Burst::Deletions,
        }
    }
}

/// A burst that reached its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threat {
    JoinFlood { joins: usize },
    MassCreation { changes: usize },
    MassDeletion { changes: usize },
}

impl Threat {
    pub fn from_burst(burst: Burst, count: usize) -> Self {
        match burst {
            Burst::Joins => Threat::JoinFlood { joins: count },
            Burst::Creations => Threat::MassCreation { changes: count },
            Burst::Deletions => Threat::MassDeletion { changes: count },
        }
    }

    /// Whether the guild should be rolled back to its latest backup.
    pub fn needs_restore(&self) -> bool {
        matches!(self, Threat::MassDeletion { .. })
    }
}

impl fmt::Display for Threat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threat::JoinFlood { joins } => {
                write!(f, "Join flood detected: {} members joined in quick succession", joins)
            }
            Threat::MassCreation { changes } => {
                write!(f, "Mass creation detected: {} channels or roles created", changes)
            }
            Threat::MassDeletion { changes } => {
                write!(f, "Mass deletion detected: {} channels or roles deleted", changes)
            }
        }
    }
}

/// Why a message was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageViolation {
    BadWord(String),
    MassMention { mentions: u32 },
    Flooding { messages: usize },
}

impl fmt::Display for MessageViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageViolation::BadWord(word) => write!(f, "blocked word '{}'", word),
            MessageViolation::MassMention { mentions } => write!(f, "{} mentions", mentions),
            MessageViolation::Flooding { messages } => {
                write!(f, "{} messages in {}s", messages, MESSAGE_WINDOW_SECS)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_deletions_restore() {
        assert!(Threat::from_burst(Burst::Deletions, 3).needs_restore());
        assert!(!Threat::from_burst(Burst::Creations, 6).needs_restore());
        assert!(!Threat::from_burst(Burst::Joins, 5).needs_restore());
    }

    #[test]
    fn test_events_feed_their_burst() {
        assert_eq!(GuardEvent::RoleDelete.burst(), Burst::Deletions);
        assert_eq!(GuardEvent::ChannelCreate.burst(), Burst::Creations);
        assert_eq!(GuardEvent::MemberJoin.burst(), Burst::Joins);
    }
}
