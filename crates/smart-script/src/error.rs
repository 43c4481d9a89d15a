//! Rule table and script host errors.

use game_core::{ErrorSeverity, GameError, ObjectGuid};

use crate::holder::RuleKey;

/// Why a rule row or waypoint node was rejected at load time.
///
/// Rejections never fail a load as a whole; the offending row is left out
/// of the table and reported in a [`crate::LoadReport`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("entry {entry_or_guid} rule {id}: unknown script type {value}")]
    UnknownScriptType {
        entry_or_guid: i64,
        id: u32,
        value: u32,
    },

    #[error("{key}: unknown event type {value}")]
    UnknownEvent { key: RuleKey, value: u32 },

    #[error("{key}: unknown action type {value}")]
    UnknownAction { key: RuleKey, value: u32 },

    #[error("{key}: unknown target type {value}")]
    UnknownTarget { key: RuleKey, value: u32 },

    #[error("{key}: event {event} is not allowed for {script_type} scripts")]
    EventNotAllowed {
        key: RuleKey,
        event: &'static str,
        script_type: &'static str,
    },

    #[error("{key}: phase mask {mask:#x} names phases beyond the last one")]
    PhaseMaskOutOfRange { key: RuleKey, mask: u32 },

    #[error("{key}: unknown event flag bits {bits:#x}")]
    UnknownEventFlags { key: RuleKey, bits: u32 },

    #[error("{key}: rule links to itself")]
    SelfLink { key: RuleKey },

    #[error("{key}: {field} minimum {min} exceeds maximum {max}")]
    MinMax {
        key: RuleKey,
        field: &'static str,
        min: u32,
        max: u32,
    },

    #[error("{key}: chance {chance} is above 100")]
    ChanceOutOfRange { key: RuleKey, chance: u32 },

    #[error("{key}: {event} repeats without bound; set a repeat window or the not-repeatable flag")]
    MissingNotRepeatable { key: RuleKey, event: &'static str },

    #[error("{key}: {field} value {value} is out of range")]
    ParamOutOfRange {
        key: RuleKey,
        field: &'static str,
        value: u32,
    },

    #[error("{key}: {reason}")]
    InvalidParams { key: RuleKey, reason: &'static str },

    #[error("path {path}: point {point} does not follow point {previous}")]
    PathOrder { path: u32, point: u32, previous: u32 },
}

impl TableError {
    pub fn key(&self) -> Option<RuleKey> {
        match self {
            Self::UnknownEvent { key, .. }
            | Self::UnknownAction { key, .. }
            | Self::UnknownTarget { key, .. }
            | Self::EventNotAllowed { key, .. }
            | Self::PhaseMaskOutOfRange { key, .. }
            | Self::UnknownEventFlags { key, .. }
            | Self::SelfLink { key }
            | Self::MinMax { key, .. }
            | Self::ChanceOutOfRange { key, .. }
            | Self::MissingNotRepeatable { key, .. }
            | Self::ParamOutOfRange { key, .. }
            | Self::InvalidParams { key, .. } => Some(*key),
            Self::UnknownScriptType { .. } | Self::PathOrder { .. } => None,
        }
    }
}

impl GameError for TableError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownScriptType { .. } => "TABLE_UNKNOWN_SCRIPT_TYPE",
            Self::UnknownEvent { .. } => "TABLE_UNKNOWN_EVENT",
            Self::UnknownAction { .. } => "TABLE_UNKNOWN_ACTION",
            Self::UnknownTarget { .. } => "TABLE_UNKNOWN_TARGET",
            Self::EventNotAllowed { .. } => "TABLE_EVENT_NOT_ALLOWED",
            Self::PhaseMaskOutOfRange { .. } => "TABLE_PHASE_MASK",
            Self::UnknownEventFlags { .. } => "TABLE_EVENT_FLAGS",
            Self::SelfLink { .. } => "TABLE_SELF_LINK",
            Self::MinMax { .. } => "TABLE_MIN_MAX",
            Self::ChanceOutOfRange { .. } => "TABLE_CHANCE",
            Self::MissingNotRepeatable { .. } => "TABLE_MISSING_NOT_REPEATABLE",
            Self::ParamOutOfRange { .. } => "TABLE_PARAM_RANGE",
            Self::InvalidParams { .. } => "TABLE_INVALID_PARAMS",
            Self::PathOrder { .. } => "TABLE_PATH_ORDER",
        }
    }
}

/// Errors raised by script hosts when agents are registered or addressed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("agent {0} is not registered on this map")]
    AgentNotFound(ObjectGuid),

    #[error("agent {0} is already registered on this map")]
    DuplicateAgent(ObjectGuid),

    #[error("agent {agent} cannot {capability}")]
    MissingCapability {
        agent: ObjectGuid,
        capability: &'static str,
    },
}

impl GameError for ScriptError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::AgentNotFound(_) => ErrorSeverity::Recoverable,
            Self::DuplicateAgent(_) => ErrorSeverity::Internal,
            Self::MissingCapability { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AgentNotFound(_) => "SCRIPT_AGENT_NOT_FOUND",
            Self::DuplicateAgent(_) => "SCRIPT_DUPLICATE_AGENT",
            Self::MissingCapability { .. } => "SCRIPT_MISSING_CAPABILITY",
        }
    }
}
