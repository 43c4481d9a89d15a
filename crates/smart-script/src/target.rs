//! Target half of a rule: which objects an action applies to.
use combat::SelectTargetMethod;
use game_core::{Position, PowerType};

use crate::error::TableError;
use crate::params::ParamReader;

/// Target discriminants, numbered as authored in rule rows.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::IntoStaticStr,
    strum::FromRepr,
)]
#[strum(serialize_all = "snake_case")]
#[repr(u32)]
pub enum TargetKind {
    None = 0,
    #[strum(serialize = "self")]
    Myself = 1,
    Victim = 2,
    HostileSecondAggro = 3,
    HostileLastAggro = 4,
    HostileRandom = 5,
    HostileRandomNotTop = 6,
    ActionInvoker = 7,
    Position = 8,
    CreatureRange = 9,
    CreatureGuid = 10,
    CreatureDistance = 11,
    Stored = 12,
    GameObjectRange = 13,
    GameObjectGuid = 14,
    GameObjectDistance = 15,
    InvokerParty = 16,
    PlayerRange = 17,
    PlayerDistance = 18,
    ClosestCreature = 19,
    ClosestGameObject = 20,
    ClosestPlayer = 21,
    ActionInvokerVehicle = 22,
    OwnerOrSummoner = 23,
    ThreatList = 24,
    ClosestEnemy = 25,
    ClosestFriendly = 26,
    LootRecipients = 27,
    Farthest = 28,
    VehiclePassenger = 29,
    ClosestUnspawnedGameObject = 30,
}

/// Threat list rank a hostile selector picks from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HostileRank {
    /// Second highest threat.
    SecondAggro,
    /// Lowest threat.
    LastAggro,
    Random,
    /// Random, never the top entry.
    RandomNotTop,
}

impl HostileRank {
    /// Ordering and offset handed to threat list selection.
    pub fn method(self) -> (SelectTargetMethod, usize) {
        match self {
            Self::SecondAggro => (SelectTargetMethod::MaxThreat, 1),
            Self::LastAggro => (SelectTargetMethod::MinThreat, 0),
            Self::Random => (SelectTargetMethod::Random, 0),
            Self::RandomNotTop => (SelectTargetMethod::Random, 1),
        }
    }
}

/// Kind-specific selector parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetSelector {
    None,
    Myself,
    Victim,
    Hostile {
        rank: HostileRank,
        max_dist: u32,
        player_only: bool,
        power_type: Option<PowerType>,
    },
    ActionInvoker,
    Position,
    CreatureRange {
        entry: u32,
        min_dist: u32,
        max_dist: u32,
        max_size: u32,
    },
    CreatureGuid { spawn_id: u32, entry: u32 },
    CreatureDistance {
        entry: u32,
        dist: u32,
        max_size: u32,
    },
    Stored { id: u32 },
    GameObjectRange {
        entry: u32,
        min_dist: u32,
        max_dist: u32,
        max_size: u32,
    },
    GameObjectGuid { spawn_id: u32, entry: u32 },
    GameObjectDistance {
        entry: u32,
        dist: u32,
        max_size: u32,
    },
    InvokerParty,
    PlayerRange {
        min_dist: u32,
        max_dist: u32,
        max_count: u32,
    },
    PlayerDistance { dist: u32 },
    ClosestCreature { entry: u32, dist: u32, dead: bool },
    ClosestGameObject { entry: u32, dist: u32 },
    ClosestPlayer { dist: u32 },
    ActionInvokerVehicle,
    OwnerOrSummoner { owner_of_owner: bool },
    ThreatList { max_dist: u32 },
    ClosestEnemy { max_dist: u32, player_only: bool },
    ClosestFriendly { max_dist: u32, player_only: bool },
    LootRecipients,
    Farthest {
        max_dist: u32,
        player_only: bool,
        in_los: bool,
    },
    VehiclePassenger { seat_mask: u32 },
    ClosestUnspawnedGameObject { entry: u32, dist: u32 },
}

impl TargetSelector {
    pub(crate) fn parse(kind: TargetKind, p: &mut ParamReader<'_>) -> Result<Self, TableError> {
        use TargetKind as K;
        let key = p.key();
        let hostile = |rank, p: &mut ParamReader<'_>| -> Result<Self, TableError> {
            let max_dist = p.get(0);
            let player_only = p.flag(1);
            let raw = p.get(2);
            let power_type = match raw {
                0 => None,
                n => Some(PowerType::from_repr(n - 1).ok_or(TableError::ParamOutOfRange {
                    key,
                    field: "power type",
                    value: raw,
                })?),
            };
            Ok(Self::Hostile {
                rank,
                max_dist,
                player_only,
                power_type,
            })
        };
        let selector = match kind {
            K::None => Self::None,
            K::Myself => Self::Myself,
            K::Victim => Self::Victim,
            K::HostileSecondAggro => hostile(HostileRank::SecondAggro, p)?,
            K::HostileLastAggro => hostile(HostileRank::LastAggro, p)?,
            K::HostileRandom => hostile(HostileRank::Random, p)?,
            K::HostileRandomNotTop => hostile(HostileRank::RandomNotTop, p)?,
            K::ActionInvoker => Self::ActionInvoker,
            K::Position => Self::Position,
            K::CreatureRange | K::GameObjectRange => {
                let entry = p.get(0);
                let (min_dist, max_dist) = p.window(1, 2, "range")?;
                let max_size = p.get(3);
                if kind == K::CreatureRange {
                    Self::CreatureRange {
                        entry,
                        min_dist,
                        max_dist,
                        max_size,
                    }
                } else {
                    Self::GameObjectRange {
                        entry,
                        min_dist,
                        max_dist,
                        max_size,
                    }
                }
            }
            K::CreatureGuid | K::GameObjectGuid => {
                let spawn_id = p.get(0);
                if spawn_id == 0 {
                    return Err(TableError::InvalidParams {
                        key,
                        reason: "spawn target without a spawn id",
                    });
                }
                let entry = p.get(1);
                if kind == K::CreatureGuid {
                    Self::CreatureGuid { spawn_id, entry }
                } else {
                    Self::GameObjectGuid { spawn_id, entry }
                }
            }
            K::CreatureDistance => Self::CreatureDistance {
                entry: p.get(0),
                dist: p.get(1),
                max_size: p.get(2),
            },
            K::GameObjectDistance => Self::GameObjectDistance {
                entry: p.get(0),
                dist: p.get(1),
                max_size: p.get(2),
            },
            K::Stored => Self::Stored { id: p.get(0) },
            K::InvokerParty => Self::InvokerParty,
            K::PlayerRange => {
                let (min_dist, max_dist) = p.window(0, 1, "range")?;
                Self::PlayerRange {
                    min_dist,
                    max_dist,
                    max_count: p.get(2),
                }
            }
            K::PlayerDistance => Self::PlayerDistance { dist: p.get(0) },
            K::ClosestCreature => Self::ClosestCreature {
                entry: p.get(0),
                dist: p.get(1),
                dead: p.flag(2),
            },
            K::ClosestGameObject => Self::ClosestGameObject {
                entry: p.get(0),
                dist: p.get(1),
            },
            K::ClosestPlayer => Self::ClosestPlayer { dist: p.get(0) },
            K::ActionInvokerVehicle => Self::ActionInvokerVehicle,
            K::OwnerOrSummoner => Self::OwnerOrSummoner {
                owner_of_owner: p.flag(0),
            },
            K::ThreatList => Self::ThreatList { max_dist: p.get(0) },
            K::ClosestEnemy => Self::ClosestEnemy {
                max_dist: p.get(0),
                player_only: p.flag(1),
            },
            K::ClosestFriendly => Self::ClosestFriendly {
                max_dist: p.get(0),
                player_only: p.flag(1),
            },
            K::LootRecipients => Self::LootRecipients,
            K::Farthest => Self::Farthest {
                max_dist: p.get(0),
                player_only: p.flag(1),
                in_los: p.flag(2),
            },
            K::VehiclePassenger => Self::VehiclePassenger {
                seat_mask: p.get(0),
            },
            K::ClosestUnspawnedGameObject => Self::ClosestUnspawnedGameObject {
                entry: p.get(0),
                dist: p.get(1),
            },
        };
        Ok(selector)
    }
}

/// Target description of a rule: a selector plus the literal position used
/// by position targets and as a summon offset.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Target {
    pub selector: TargetSelector,
    pub position: Position,
}

impl Target {
    pub fn new(selector: TargetSelector) -> Self {
        Self {
            selector,
            position: Position::default(),
        }
    }

    pub fn none() -> Self {
        Self::new(TargetSelector::None)
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn is_position(&self) -> bool {
        matches!(self.selector, TargetSelector::Position)
    }

    pub fn is_none(&self) -> bool {
        matches!(self.selector, TargetSelector::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holder::{RuleKey, ScriptType};

    fn parse(kind: TargetKind, values: &[u32]) -> Result<TargetSelector, TableError> {
        let mut reader =
            ParamReader::new(RuleKey::new(1, ScriptType::Creature, 0), "target", values);
        TargetSelector::parse(kind, &mut reader)
    }

    #[test]
    fn hostile_power_filter_is_offset_by_one() {
        assert_eq!(
            parse(TargetKind::HostileRandom, &[30, 1, 1, 0]),
            Ok(TargetSelector::Hostile {
                rank: HostileRank::Random,
                max_dist: 30,
                player_only: true,
                power_type: Some(PowerType::Mana),
            })
        );
        assert!(parse(TargetKind::HostileRandom, &[0, 0, 40, 0]).is_err());
    }

    #[test]
    fn guid_target_requires_spawn() {
        assert!(parse(TargetKind::CreatureGuid, &[0, 100, 0, 0]).is_err());
        assert_eq!(
            parse(TargetKind::GameObjectGuid, &[12, 0, 0, 0]),
            Ok(TargetSelector::GameObjectGuid {
                spawn_id: 12,
                entry: 0
            })
        );
    }

    #[test]
    fn ranks_map_to_selection() {
        assert_eq!(
            HostileRank::SecondAggro.method(),
            (SelectTargetMethod::MaxThreat, 1)
        );
        assert_eq!(
            HostileRank::LastAggro.method(),
            (SelectTargetMethod::MinThreat, 0)
        );
    }
}
