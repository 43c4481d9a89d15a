//! Event half of a rule: what triggers it and when it may fire again.
use bitflags::bitflags;

use crate::error::TableError;
use crate::holder::ScriptType;
use crate::params::ParamReader;

/// Event discriminants, numbered as authored in rule rows.
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
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
#[repr(u32)]
pub enum EventKind {
    UpdateIc = 0,
    UpdateOoc = 1,
    HealthPct = 2,
    ManaPct = 3,
    Aggro = 4,
    Kill = 5,
    Death = 6,
    Evade = 7,
    SpellHit = 8,
    Range = 9,
    OocLos = 10,
    Respawn = 11,
    TargetHealthPct = 12,
    VictimCasting = 13,
    FriendlyIsCc = 15,
    FriendlyMissingBuff = 16,
    SummonedUnit = 17,
    TargetManaPct = 18,
    AcceptedQuest = 19,
    RewardQuest = 20,
    ReachedHome = 21,
    ReceiveEmote = 22,
    HasAura = 23,
    TargetBuffed = 24,
    Reset = 25,
    IcLos = 26,
    PassengerBoarded = 27,
    PassengerRemoved = 28,
    Charmed = 29,
    SpellHitTarget = 31,
    Damaged = 32,
    DamagedTarget = 33,
    MovementInform = 34,
    SummonDespawned = 35,
    CorpseRemoved = 36,
    AiInit = 37,
    DataSet = 38,
    WaypointReached = 40,
    AreaTriggerOnTrigger = 46,
    QuestAccepted = 47,
    QuestObjCompletion = 48,
    QuestCompletion = 49,
    QuestRewarded = 50,
    QuestFail = 51,
    TextOver = 52,
    ReceiveHeal = 53,
    JustSummoned = 54,
    WaypointPaused = 55,
    WaypointResumed = 56,
    WaypointStopped = 57,
    WaypointEnded = 58,
    TimedEventTriggered = 59,
    Update = 60,
    Link = 61,
    GossipSelect = 62,
    JustCreated = 63,
    GossipHello = 64,
    FollowCompleted = 65,
    EventPhaseChange = 66,
    GameEventStart = 68,
    GameEventEnd = 69,
    GoLootStateChanged = 70,
    GoEventInform = 71,
    ActionDone = 72,
    FriendlyHealthPct = 74,
    DistanceCreature = 75,
    DistanceGameObject = 76,
    CounterSet = 77,
    SceneStart = 78,
    SceneTrigger = 79,
    SceneCancel = 80,
    SceneComplete = 81,
    SummonedUnitDies = 82,
    OnSpellCast = 83,
    OnSpellFailed = 84,
    OnSpellStart = 85,
    OnDespawn = 86,
}

const CREATURE: u32 = ScriptType::Creature.mask();
const GAME_OBJECT: u32 = ScriptType::GameObject.mask();
const AREA_TRIGGER: u32 = ScriptType::AreaTrigger.mask();
const QUEST: u32 = ScriptType::Quest.mask();
const INSTANCE: u32 = ScriptType::Instance.mask();
const TIMED_LIST: u32 = ScriptType::TimedActionList.mask();
const SCENE: u32 = ScriptType::Scene.mask();
const ANY_LINKABLE: u32 = CREATURE
    | GAME_OBJECT
    | AREA_TRIGGER
    | ScriptType::Event.mask()
    | ScriptType::Gossip.mask()
    | QUEST
    | ScriptType::Spell.mask()
    | ScriptType::Transport.mask()
    | INSTANCE
    | SCENE;

impl EventKind {
    pub fn from_u32(value: u32) -> Option<Self> {
        Self::from_repr(value)
    }

    /// Script domains allowed to author this event.
    pub const fn allowed_types(self) -> u32 {
        use EventKind::*;
        match self {
            UpdateIc => CREATURE | TIMED_LIST,
            UpdateOoc => CREATURE | GAME_OBJECT | INSTANCE,
            Update => CREATURE | GAME_OBJECT,
            SpellHit | Respawn | SummonedUnit | AcceptedQuest | RewardQuest | SummonDespawned
            | AiInit | DataSet | TextOver | TimedEventTriggered | GossipSelect | JustCreated
            | GossipHello | EventPhaseChange | GameEventStart | GameEventEnd | CounterSet
            | SummonedUnitDies => CREATURE | GAME_OBJECT,
            GoLootStateChanged | GoEventInform => GAME_OBJECT,
            AreaTriggerOnTrigger => AREA_TRIGGER,
            SceneStart | SceneTrigger | SceneCancel | SceneComplete => SCENE,
            QuestAccepted | QuestObjCompletion | QuestCompletion | QuestRewarded | QuestFail => {
                QUEST
            }
            Link => ANY_LINKABLE,
            _ => CREATURE,
        }
    }

    pub const fn is_allowed_for(self, script_type: ScriptType) -> bool {
        self.allowed_types() & script_type.mask() != 0
    }

    /// Kinds evaluated by the tick scheduler rather than by callbacks.
    pub const fn is_timer_driven(self) -> bool {
        use EventKind::*;
        matches!(
            self,
            Update
                | UpdateIc
                | UpdateOoc
                | HealthPct
                | ManaPct
                | TargetHealthPct
                | TargetManaPct
                | Range
                | VictimCasting
                | FriendlyIsCc
                | FriendlyMissingBuff
                | HasAura
                | TargetBuffed
                | FriendlyHealthPct
                | DistanceCreature
                | DistanceGameObject
        )
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct EventFlags: u32 {
        const NOT_REPEATABLE = 0x001;
        const DIFFICULTY_0   = 0x002;
        const DIFFICULTY_1   = 0x004;
        const DIFFICULTY_2   = 0x008;
        const DIFFICULTY_3   = 0x010;
        const DEBUG_ONLY     = 0x080;
        const DONT_RESET     = 0x100;
        const WHILE_CHARMED  = 0x200;

        const DIFFICULTY_ALL = Self::DIFFICULTY_0.bits()
            | Self::DIFFICULTY_1.bits()
            | Self::DIFFICULTY_2.bits()
            | Self::DIFFICULTY_3.bits();
    }
}

impl EventFlags {
    /// Flag bit gating installation on maps of `difficulty`.
    pub fn for_difficulty(difficulty: u8) -> Self {
        match difficulty {
            0 => Self::DIFFICULTY_0,
            1 => Self::DIFFICULTY_1,
            2 => Self::DIFFICULTY_2,
            3 => Self::DIFFICULTY_3,
            _ => Self::empty(),
        }
    }
}

/// Which units a line-of-sight event reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum LosHostility {
    Hostile = 0,
    NotHostile = 1,
    Any = 2,
}

/// Restriction on where a respawn event fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum RespawnCondition {
    None = 0,
    Map = 1,
    Area = 2,
}

/// Movement inform point id matching every point.
pub const ANY_MOVEMENT_POINT: u32 = u32::MAX;

/// Kind-specific event parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventParams {
    None,
    /// Cooldown window only.
    Cooldown { min: u32, max: u32 },
    /// Threshold window (timer, percent, distance or amount) plus repeat window.
    MinMaxRepeat {
        min: u32,
        max: u32,
        repeat_min: u32,
        repeat_max: u32,
    },
    Kill {
        cooldown_min: u32,
        cooldown_max: u32,
        player_only: bool,
        creature: u32,
    },
    SpellHit {
        spell: u32,
        school: u32,
        cooldown_min: u32,
        cooldown_max: u32,
    },
    Los {
        hostility: LosHostility,
        max_dist: u32,
        cooldown_min: u32,
        cooldown_max: u32,
        player_only: bool,
    },
    Respawn {
        condition: RespawnCondition,
        map: u32,
        area: u32,
    },
    VictimCasting {
        repeat_min: u32,
        repeat_max: u32,
        spell: u32,
    },
    FriendlyIsCc {
        radius: u32,
        repeat_min: u32,
        repeat_max: u32,
    },
    MissingBuff {
        spell: u32,
        radius: u32,
        repeat_min: u32,
        repeat_max: u32,
    },
    Summoned {
        creature: u32,
        cooldown_min: u32,
        cooldown_max: u32,
    },
    Quest {
        quest: u32,
        cooldown_min: u32,
        cooldown_max: u32,
    },
    QuestObjective { id: u32 },
    Emote {
        emote: u32,
        cooldown_min: u32,
        cooldown_max: u32,
    },
    Aura {
        spell: u32,
        count: u32,
        repeat_min: u32,
        repeat_max: u32,
    },
    Charm { on_remove: bool },
    MovementInform { movement_type: u32, point_id: u32 },
    DataSet {
        id: u32,
        value: u32,
        cooldown_min: u32,
        cooldown_max: u32,
    },
    Waypoint { point_id: u32, path_id: u32 },
    AreaTrigger { id: u32 },
    TextOver { text_group: u32, creature_entry: u32 },
    TimedEvent { id: u32 },
    GossipHello { filter: u32 },
    Gossip { sender: u32, action: u32 },
    GameEvent { id: u32 },
    GoLootState { state: u32 },
    EventInform { id: u32 },
    DoAction { id: u32 },
    FriendlyHealthPct {
        min_pct: u32,
        max_pct: u32,
        repeat_min: u32,
        repeat_max: u32,
        radius: u32,
    },
    Distance {
        spawn_id: u32,
        entry: u32,
        dist: u32,
        repeat: u32,
    },
    Counter {
        id: u32,
        value: u32,
        cooldown_min: u32,
        cooldown_max: u32,
    },
    SpellCast {
        spell: u32,
        cooldown_min: u32,
        cooldown_max: u32,
    },
    PhaseChange { phase_mask: u32 },
    SceneTrigger { trigger: String },
}

impl EventParams {
    pub(crate) fn parse(
        kind: EventKind,
        p: &mut ParamReader<'_>,
        param_string: &str,
    ) -> Result<Self, TableError> {
        use EventKind::*;
        let key = p.key();
        let params = match kind {
            Update | UpdateIc | UpdateOoc | Range | Damaged | DamagedTarget | ReceiveHeal => {
                let (min, max) = p.window(0, 1, "min/max")?;
                let (repeat_min, repeat_max) = p.window(2, 3, "repeat")?;
                Self::MinMaxRepeat {
                    min,
                    max,
                    repeat_min,
                    repeat_max,
                }
            }
            HealthPct | ManaPct | TargetHealthPct | TargetManaPct => {
                let (min, max) = p.window(0, 1, "percent")?;
                if max > 100 {
                    return Err(TableError::ParamOutOfRange {
                        key,
                        field: "percent",
                        value: max,
                    });
                }
                let (repeat_min, repeat_max) = p.window(2, 3, "repeat")?;
                Self::MinMaxRepeat {
                    min,
                    max,
                    repeat_min,
                    repeat_max,
                }
            }
            PassengerBoarded | PassengerRemoved => {
                let (min, max) = p.window(0, 1, "cooldown")?;
                Self::Cooldown { min, max }
            }
            Kill => {
                let (cooldown_min, cooldown_max) = p.window(0, 1, "cooldown")?;
                Self::Kill {
                    cooldown_min,
                    cooldown_max,
                    player_only: p.flag(2),
                    creature: p.get(3),
                }
            }
            SpellHit | SpellHitTarget => {
                let spell = p.get(0);
                let school = p.get(1);
                let (cooldown_min, cooldown_max) = p.window(2, 3, "cooldown")?;
                Self::SpellHit {
                    spell,
                    school,
                    cooldown_min,
                    cooldown_max,
                }
            }
            OocLos | IcLos => {
                let raw = p.get(0);
                let hostility = LosHostility::from_repr(raw).ok_or(TableError::ParamOutOfRange {
                    key,
                    field: "hostility mode",
                    value: raw,
                })?;
                let max_dist = p.get(1);
                let (cooldown_min, cooldown_max) = p.window(2, 3, "cooldown")?;
                Self::Los {
                    hostility,
                    max_dist,
                    cooldown_min,
                    cooldown_max,
                    player_only: p.flag(4),
                }
            }
            Respawn => {
                let raw = p.get(0);
                let condition =
                    RespawnCondition::from_repr(raw).ok_or(TableError::ParamOutOfRange {
                        key,
                        field: "respawn condition",
                        value: raw,
                    })?;
                Self::Respawn {
                    condition,
                    map: p.get(1),
                    area: p.get(2),
                }
            }
            VictimCasting => {
                let (repeat_min, repeat_max) = p.window(0, 1, "repeat")?;
                Self::VictimCasting {
                    repeat_min,
                    repeat_max,
                    spell: p.get(2),
                }
            }
            FriendlyIsCc => {
                let radius = p.get(0);
                let (repeat_min, repeat_max) = p.window(1, 2, "repeat")?;
                Self::FriendlyIsCc {
                    radius,
                    repeat_min,
                    repeat_max,
                }
            }
            FriendlyMissingBuff => {
                let spell = p.get(0);
                let radius = p.get(1);
                let (repeat_min, repeat_max) = p.window(2, 3, "repeat")?;
                Self::MissingBuff {
                    spell,
                    radius,
                    repeat_min,
                    repeat_max,
                }
            }
            SummonedUnit | SummonedUnitDies | SummonDespawned => {
                let creature = p.get(0);
                let (cooldown_min, cooldown_max) = p.window(1, 2, "cooldown")?;
                Self::Summoned {
                    creature,
                    cooldown_min,
                    cooldown_max,
                }
            }
            AcceptedQuest | RewardQuest => {
                let quest = p.get(0);
                let (cooldown_min, cooldown_max) = p.window(1, 2, "cooldown")?;
                Self::Quest {
                    quest,
                    cooldown_min,
                    cooldown_max,
                }
            }
            QuestObjCompletion => Self::QuestObjective { id: p.get(0) },
            ReceiveEmote => {
                let emote = p.get(0);
                let (cooldown_min, cooldown_max) = p.window(1, 2, "cooldown")?;
                Self::Emote {
                    emote,
                    cooldown_min,
                    cooldown_max,
                }
            }
            HasAura | TargetBuffed => {
                let spell = p.get(0);
                let count = p.get(1);
                let (repeat_min, repeat_max) = p.window(2, 3, "repeat")?;
                Self::Aura {
                    spell,
                    count,
                    repeat_min,
                    repeat_max,
                }
            }
            Charmed => Self::Charm {
                on_remove: p.at_most(0, 1, "on remove")? == 1,
            },
            MovementInform => Self::MovementInform {
                movement_type: p.get(0),
                point_id: p.get(1),
            },
            DataSet => {
                let id = p.get(0);
                let value = p.get(1);
                let (cooldown_min, cooldown_max) = p.window(2, 3, "cooldown")?;
                Self::DataSet {
                    id,
                    value,
                    cooldown_min,
                    cooldown_max,
                }
            }
            WaypointReached | WaypointPaused | WaypointResumed | WaypointStopped
            | WaypointEnded => Self::Waypoint {
                point_id: p.get(0),
                path_id: p.get(1),
            },
            AreaTriggerOnTrigger => Self::AreaTrigger { id: p.get(0) },
            TextOver => Self::TextOver {
                text_group: p.get(0),
                creature_entry: p.get(1),
            },
            TimedEventTriggered => Self::TimedEvent { id: p.get(0) },
            GossipHello => Self::GossipHello {
                filter: p.at_most(0, 2, "gossip hello filter")?,
            },
            GossipSelect => Self::Gossip {
                sender: p.get(0),
                action: p.get(1),
            },
            GameEventStart | GameEventEnd => Self::GameEvent { id: p.get(0) },
            GoLootStateChanged => Self::GoLootState { state: p.get(0) },
            GoEventInform => Self::EventInform { id: p.get(0) },
            ActionDone => Self::DoAction { id: p.get(0) },
            FriendlyHealthPct => {
                let (min_pct, max_pct) = p.window(0, 1, "percent")?;
                if max_pct > 100 {
                    return Err(TableError::ParamOutOfRange {
                        key,
                        field: "percent",
                        value: max_pct,
                    });
                }
                let (repeat_min, repeat_max) = p.window(2, 3, "repeat")?;
                Self::FriendlyHealthPct {
                    min_pct,
                    max_pct,
                    repeat_min,
                    repeat_max,
                    radius: p.get(4),
                }
            }
            DistanceCreature | DistanceGameObject => {
                let spawn_id = p.get(0);
                let entry = p.get(1);
                if (spawn_id == 0) == (entry == 0) {
                    return Err(TableError::InvalidParams {
                        key,
                        reason: "distance event needs exactly one of spawn id and entry",
                    });
                }
                Self::Distance {
                    spawn_id,
                    entry,
                    dist: p.get(2),
                    repeat: p.get(3),
                }
            }
            CounterSet => {
                let id = p.get(0);
                let value = p.get(1);
                if id == 0 || value == 0 {
                    return Err(TableError::InvalidParams {
                        key,
                        reason: "counter event needs a counter id and a value",
                    });
                }
                let (cooldown_min, cooldown_max) = p.window(2, 3, "cooldown")?;
                Self::Counter {
                    id,
                    value,
                    cooldown_min,
                    cooldown_max,
                }
            }
            OnSpellCast | OnSpellFailed | OnSpellStart => {
                let spell = p.get(0);
                let (cooldown_min, cooldown_max) = p.window(1, 2, "cooldown")?;
                Self::SpellCast {
                    spell,
                    cooldown_min,
                    cooldown_max,
                }
            }
            EventPhaseChange => {
                let phase_mask = p.get(0);
                if !game_core::EngineConfig::is_valid_phase_mask(phase_mask) {
                    return Err(TableError::PhaseMaskOutOfRange {
                        key,
                        mask: phase_mask,
                    });
                }
                Self::PhaseChange { phase_mask }
            }
            SceneTrigger => Self::SceneTrigger {
                trigger: param_string.to_owned(),
            },
            Aggro | Death | Evade | ReachedHome | Reset | CorpseRemoved | AiInit
            | QuestAccepted | QuestCompletion | QuestRewarded | QuestFail | JustSummoned | Link
            | JustCreated | FollowCompleted | SceneStart | SceneCancel | SceneComplete
            | OnDespawn => Self::None,
        };
        Ok(params)
    }

    /// Repeat window of tick-driven kinds.
    pub fn repeat_window(&self) -> Option<(u32, u32)> {
        match *self {
            Self::MinMaxRepeat {
                repeat_min,
                repeat_max,
                ..
            }
            | Self::VictimCasting {
                repeat_min,
                repeat_max,
                ..
            }
            | Self::FriendlyIsCc {
                repeat_min,
                repeat_max,
                ..
            }
            | Self::MissingBuff {
                repeat_min,
                repeat_max,
                ..
            }
            | Self::Aura {
                repeat_min,
                repeat_max,
                ..
            }
            | Self::FriendlyHealthPct {
                repeat_min,
                repeat_max,
                ..
            } => Some((repeat_min, repeat_max)),
            Self::Distance { repeat, .. } => Some((repeat, repeat)),
            _ => None,
        }
    }
}

/// Trigger description of a rule.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub kind: EventKind,
    pub params: EventParams,
    /// Phases the rule may fire in; 0 for all.
    pub phase_mask: u32,
    /// Percent chance to act once triggered; 0 and 100 always act.
    pub chance: u32,
    pub flags: EventFlags,
}

impl Event {
    pub fn new(kind: EventKind, params: EventParams) -> Self {
        Self {
            kind,
            params,
            phase_mask: 0,
            chance: 100,
            flags: EventFlags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: EventFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_repeatable(&self) -> bool {
        !self.flags.contains(EventFlags::NOT_REPEATABLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holder::RuleKey;

    fn parse(kind: EventKind, values: &[u32]) -> Result<EventParams, TableError> {
        let mut reader = ParamReader::new(RuleKey::new(1, ScriptType::Creature, 0), "event", values);
        EventParams::parse(kind, &mut reader, "")
    }

    #[test]
    fn authored_numbers_round_trip() {
        assert_eq!(EventKind::from_u32(4), Some(EventKind::Aggro));
        assert_eq!(EventKind::from_u32(61), Some(EventKind::Link));
        assert_eq!(EventKind::from_u32(14), None);
        assert_eq!(EventKind::TimedEventTriggered as u32, 59);
    }

    #[test]
    fn domain_masks() {
        assert!(EventKind::Aggro.is_allowed_for(ScriptType::Creature));
        assert!(!EventKind::Aggro.is_allowed_for(ScriptType::GameObject));
        assert!(EventKind::UpdateIc.is_allowed_for(ScriptType::TimedActionList));
        assert!(EventKind::Link.is_allowed_for(ScriptType::Scene));
        assert!(!EventKind::Link.is_allowed_for(ScriptType::TimedActionList));
        assert!(EventKind::AreaTriggerOnTrigger.is_allowed_for(ScriptType::AreaTrigger));
    }

    #[test]
    fn health_window_is_bounded() {
        assert!(parse(EventKind::HealthPct, &[0, 30, 1000, 2000]).is_ok());
        assert!(matches!(
            parse(EventKind::HealthPct, &[0, 130, 0, 0]),
            Err(TableError::ParamOutOfRange { value: 130, .. })
        ));
        assert!(matches!(
            parse(EventKind::HealthPct, &[50, 30, 0, 0]),
            Err(TableError::MinMax { .. })
        ));
    }

    #[test]
    fn distance_event_needs_one_selector() {
        assert!(parse(EventKind::DistanceCreature, &[0, 0, 10, 1000]).is_err());
        assert!(parse(EventKind::DistanceCreature, &[5, 7, 10, 1000]).is_err());
        assert_eq!(
            parse(EventKind::DistanceCreature, &[0, 7, 10, 1000])
                .ok()
                .and_then(|p| p.repeat_window()),
            Some((1000, 1000))
        );
    }

    #[test]
    fn difficulty_flags() {
        assert_eq!(EventFlags::for_difficulty(2), EventFlags::DIFFICULTY_2);
        assert!(EventFlags::DIFFICULTY_ALL.contains(EventFlags::DIFFICULTY_3));
        assert!(EventFlags::for_difficulty(9).is_empty());
    }
}
