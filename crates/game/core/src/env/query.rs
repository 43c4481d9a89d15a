//! Value types exchanged with world oracles.
use bitflags::bitflags;

use crate::guid::{ObjectGuid, ObjectKind};
use crate::position::Position;

bitflags! {
    /// Object kinds a spatial search should return.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SearchKind: u8 {
        const PLAYER      = 1 << 0;
        const CREATURE    = 1 << 1;
        const GAME_OBJECT = 1 << 2;

        const UNIT = Self::PLAYER.bits() | Self::CREATURE.bits();
    }
}

impl SearchKind {
    pub fn matches(&self, kind: ObjectKind) -> bool {
        match kind {
            ObjectKind::Player => self.contains(Self::PLAYER),
            ObjectKind::Creature => self.contains(Self::CREATURE),
            ObjectKind::GameObject => self.contains(Self::GAME_OBJECT),
            ObjectKind::AreaTrigger | ObjectKind::Scene => false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AliveFilter {
    #[default]
    Any,
    Alive,
    Dead,
}

impl AliveFilter {
    pub fn accepts(&self, alive: bool) -> bool {
        match self {
            Self::Any => true,
            Self::Alive => alive,
            Self::Dead => !alive,
        }
    }
}

/// Spatial query around an origin object.
///
/// Results come back in the oracle's scan order; the origin itself is
/// included when it matches.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectSearch {
    pub origin: ObjectGuid,
    pub kind: SearchKind,
    pub entry: Option<u32>,
    pub min_range: f32,
    pub max_range: f32,
    pub alive: AliveFilter,
}

impl ObjectSearch {
    pub fn around(origin: ObjectGuid, kind: SearchKind, max_range: f32) -> Self {
        Self {
            origin,
            kind,
            entry: None,
            min_range: 0.0,
            max_range,
            alive: AliveFilter::Any,
        }
    }

    pub fn with_entry(mut self, entry: u32) -> Self {
        self.entry = (entry != 0).then_some(entry);
        self
    }

    pub fn with_min_range(mut self, min_range: f32) -> Self {
        self.min_range = min_range;
        self
    }

    pub fn with_alive(mut self, alive: AliveFilter) -> Self {
        self.alive = alive;
        self
    }
}

/// Identifies the rule whose external conditions are being checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConditionSource {
    pub entry_or_guid: i64,
    pub source_type: u32,
    pub event_id: u32,
}

/// A taunt-family aura applied to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TauntAura {
    pub caster: ObjectGuid,
    /// Monotonic application stamp; later applications rank higher.
    pub applied_at: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SummonKind {
    Creature,
    GameObject,
}

/// Request to spawn a temporary object.
#[derive(Clone, Debug, PartialEq)]
pub struct SummonRequest {
    pub summoner: ObjectGuid,
    pub kind: SummonKind,
    pub entry: u32,
    pub position: Position,
    /// Host-defined despawn behaviour.
    pub summon_type: u32,
    pub duration_ms: u32,
    /// Visible only to this object when set.
    pub private_for: Option<ObjectGuid>,
}
