//! Rule identity and the per-agent mutable rule copy.
use std::fmt;
use std::sync::Arc;

use crate::action::Action;
use crate::event::Event;
use crate::target::Target;

/// Script domain a rule belongs to.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::IntoStaticStr,
    strum::FromRepr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
#[repr(u32)]
pub enum ScriptType {
    Creature = 0,
    GameObject = 1,
    AreaTrigger = 2,
    Event = 3,
    Gossip = 4,
    Quest = 5,
    Spell = 6,
    Transport = 7,
    Instance = 8,
    TimedActionList = 9,
    Scene = 10,
}

impl ScriptType {
    pub fn from_u32(value: u32) -> Option<Self> {
        Self::from_repr(value)
    }

    /// Bit used by the per-event allowed-domain masks.
    pub const fn mask(self) -> u32 {
        1 << self as u32
    }
}

/// Identity of one authored rule.
///
/// `entry_or_guid` is a template entry when positive and a negated spawn id
/// when negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleKey {
    pub entry_or_guid: i64,
    pub source_type: ScriptType,
    pub id: u32,
}

impl RuleKey {
    pub const fn new(entry_or_guid: i64, source_type: ScriptType, id: u32) -> Self {
        Self {
            entry_or_guid,
            source_type,
            id,
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entry_or_guid < 0 {
            write!(f, "spawn {}", -self.entry_or_guid)?;
        } else {
            write!(f, "entry {}", self.entry_or_guid)?;
        }
        write!(f, " ({}) rule {}", self.source_type, self.id)
    }
}

/// One validated event/condition/action rule.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub key: RuleKey,
    /// Id of the rule fired right after this one; 0 for none.
    pub link: u32,
    pub event: Event,
    pub action: Action,
    pub target: Target,
    pub comment: String,
}

impl Rule {
    #[inline]
    pub fn id(&self) -> u32 {
        self.key.id
    }
}

/// A rule plus the per-instance state an agent keeps for it.
#[derive(Clone, Debug)]
pub struct ScriptHolder {
    pub rule: Arc<Rule>,
    /// Milliseconds until the rule becomes active again.
    pub timer: u32,
    pub active: bool,
    /// Fired since the last reset.
    pub run_once: bool,
    /// The one entry of a timed action list currently counting down.
    pub enable_timed: bool,
    /// Unique per engine; lets in-flight dispatches detect replaced lists.
    pub(crate) serial: u64,
}

impl ScriptHolder {
    pub(crate) fn new(rule: Arc<Rule>, serial: u64) -> Self {
        Self {
            rule,
            timer: 0,
            active: false,
            run_once: false,
            enable_timed: false,
            serial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_distinguishes_spawns() {
        let template = RuleKey::new(100, ScriptType::Creature, 2);
        let spawn = RuleKey::new(-42, ScriptType::Creature, 0);
        assert_eq!(template.to_string(), "entry 100 (creature) rule 2");
        assert_eq!(spawn.to_string(), "spawn 42 (creature) rule 0");
    }

    #[test]
    fn script_type_numbers() {
        assert_eq!(ScriptType::from_u32(9), Some(ScriptType::TimedActionList));
        assert_eq!(ScriptType::from_u32(11), None);
        assert_eq!(ScriptType::GameObject.mask(), 2);
    }
}
