//! Combat arena invariant violations.

use game_core::{ErrorSeverity, GameError, ObjectGuid};

/// Broken arena invariants. These indicate bugs, never bad content.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum CombatError {
    #[error("{first} is in combat with {second} but not the other way around")]
    AsymmetricCombat {
        first: ObjectGuid,
        second: ObjectGuid,
    },

    #[error("duplicate combat reference between {first} and {second}")]
    DuplicateReference {
        first: ObjectGuid,
        second: ObjectGuid,
    },

    #[error("threat reference {owner} -> {victim} is missing from one of its indices")]
    DanglingThreatReference {
        owner: ObjectGuid,
        victim: ObjectGuid,
    },

    #[error("threat reference {owner} -> {victim} has negative threat {amount}")]
    NegativeThreat {
        owner: ObjectGuid,
        victim: ObjectGuid,
        amount: f32,
    },

    #[error("threat reference {owner} -> {victim} exists without combat")]
    ThreatWithoutCombat {
        owner: ObjectGuid,
        victim: ObjectGuid,
    },

    #[error("current victim of {owner} is not on its threat list")]
    VictimNotInList { owner: ObjectGuid },
}

impl GameError for CombatError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::DuplicateReference { .. } => ErrorSeverity::Internal,
            _ => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AsymmetricCombat { .. } => "COMBAT_ASYMMETRIC",
            Self::DuplicateReference { .. } => "COMBAT_DUPLICATE_REFERENCE",
            Self::DanglingThreatReference { .. } => "THREAT_DANGLING_REFERENCE",
            Self::NegativeThreat { .. } => "THREAT_NEGATIVE",
            Self::ThreatWithoutCombat { .. } => "THREAT_WITHOUT_COMBAT",
            Self::VictimNotInList { .. } => "THREAT_VICTIM_NOT_IN_LIST",
        }
    }
}
