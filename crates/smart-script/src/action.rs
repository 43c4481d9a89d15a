//! Action half of a rule: the side effect it performs.
use arrayvec::ArrayVec;
use bitflags::bitflags;

use game_core::{
    DynamicFlags, EngineConfig, NpcFlags, ObjectKind, PowerType, ReactState, SheathState,
};

use crate::error::TableError;
use crate::params::ParamReader;
use crate::target::{TargetKind, TargetSelector};

/// Action discriminants, numbered as authored in rule rows.
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
pub enum ActionKind {
    None = 0,
    Talk = 1,
    SetFaction = 2,
    MorphToEntryOrModel = 3,
    Sound = 4,
    PlayEmote = 5,
    FailQuest = 6,
    OfferQuest = 7,
    SetReactState = 8,
    ActivateGobject = 9,
    RandomEmote = 10,
    Cast = 11,
    SummonCreature = 12,
    ThreatSinglePct = 13,
    ThreatAllPct = 14,
    CallAreaExploredOrEventHappens = 15,
    SetEmoteState = 17,
    AutoAttack = 20,
    AllowCombatMovement = 21,
    SetEventPhase = 22,
    IncEventPhase = 23,
    Evade = 24,
    FleeForAssist = 25,
    CallGroupEventHappens = 26,
    CombatStop = 27,
    RemoveAurasFromSpell = 28,
    Follow = 29,
    RandomPhase = 30,
    RandomPhaseRange = 31,
    ResetGobject = 32,
    CallKilledMonster = 33,
    SetInstData = 34,
    SetInstData64 = 35,
    UpdateTemplate = 36,
    Die = 37,
    SetInCombatWithZone = 38,
    CallForHelp = 39,
    SetSheath = 40,
    ForceDespawn = 41,
    SetInvincibilityHpLevel = 42,
    MountToEntryOrModel = 43,
    SetData = 45,
    AttackStop = 46,
    SetVisibility = 47,
    SetActive = 48,
    AttackStart = 49,
    SummonGo = 50,
    KillUnit = 51,
    ActivateTaxi = 52,
    WpStart = 53,
    WpPause = 54,
    WpStop = 55,
    AddItem = 56,
    RemoveItem = 57,
    SetRun = 59,
    SetDisableGravity = 60,
    Teleport = 62,
    SetCounter = 63,
    StoreTargetList = 64,
    WpResume = 65,
    SetOrientation = 66,
    CreateTimedEvent = 67,
    PlayMovie = 68,
    MoveToPos = 69,
    EnableTempGobject = 70,
    CloseGossip = 72,
    TriggerTimedEvent = 73,
    RemoveTimedEvent = 74,
    OverrideScriptBaseObject = 76,
    ResetScriptBaseObject = 77,
    CallScriptReset = 78,
    SetRangedMovement = 79,
    CallTimedActionList = 80,
    SetNpcFlag = 81,
    AddNpcFlag = 82,
    RemoveNpcFlag = 83,
    SimpleTalk = 84,
    SelfCast = 85,
    CrossCast = 86,
    CallRandomTimedActionList = 87,
    CallRandomRangeTimedActionList = 88,
    RandomMove = 89,
    InterruptSpell = 92,
    SetDynamicFlag = 94,
    AddDynamicFlag = 95,
    RemoveDynamicFlag = 96,
    JumpToPos = 97,
    SendGossipMenu = 98,
    GoSetLootState = 99,
    SendTargetToTarget = 100,
    SetHomePos = 101,
    SetHealthRegen = 102,
    SetRoot = 103,
    SummonCreatureGroup = 107,
    SetPower = 108,
    AddPower = 109,
    RemovePower = 110,
    GameEventStop = 111,
    GameEventStart = 112,
    StartClosestWaypoint = 113,
    RandomSound = 115,
    SetCorpseDelay = 116,
    DisableEvade = 117,
    GoSetGoState = 118,
    AddThreat = 123,
    TriggerRandomTimedEvent = 125,
    RemoveAllGameobjects = 126,
    PauseMovement = 127,
    SpawnSpawngroup = 131,
    DespawnSpawngroup = 132,
    RespawnBySpawnId = 133,
    InvokerCast = 134,
    SetMovementSpeed = 136,
    SetHealthPct = 142,
    SetImmunePc = 144,
    SetImmuneNpc = 145,
    SetUninteractible = 146,
    ActivateGameobject = 147,
    AddToStoredTargetList = 148,
    DoAction = 151,
}

bitflags! {
    /// Modifiers of the cast actions.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct CastFlags: u32 {
        const INTERRUPT_PREVIOUS = 0x01;
        const TRIGGERED          = 0x02;
        const AURA_NOT_PRESENT   = 0x20;
        const COMBAT_MOVE        = 0x40;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SummonFlags: u32 {
        /// Visible only to the invoking player.
        const PERSONAL_SPAWN = 0x01;
        /// Summon from the invoking unit instead of the script owner.
        const PREFER_UNIT    = 0x02;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SpawnGroupFlags: u32 {
        const IGNORE_RESPAWN = 0x01;
        const FORCE_SPAWN    = 0x02;
        const NOSAVE_RESPAWN = 0x04;
    }
}

/// Timer kind given to the entries of an installed timed action list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::FromRepr)]
#[repr(u32)]
pub enum ListTimer {
    /// Counts down only out of combat.
    OutOfCombat = 0,
    /// Counts down only in combat.
    InCombat = 1,
    /// Counts down always.
    Always = 2,
}

impl ListTimer {
    fn from_raw(raw: u32) -> Self {
        Self::from_repr(raw).unwrap_or(Self::Always)
    }
}

/// What instance data an instance-data write addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::FromRepr)]
#[repr(u32)]
pub enum InstDataKind {
    Data = 0,
    BossState = 1,
}

/// Credit awarded when a follow reaches its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::FromRepr)]
#[repr(u32)]
pub enum FollowCredit {
    KilledMonster = 0,
    QuestEvent = 1,
}

pub type Choices = ArrayVec<u32, { EngineConfig::MAX_RANDOM_CHOICES }>;

/// Kind-specific action parameters.
#[derive(Clone, Debug, PartialEq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    None,
    Talk {
        group: u32,
        duration_ms: u32,
        use_talk_target: bool,
    },
    SetFaction {
        faction: u32,
    },
    MorphToEntryOrModel {
        creature: u32,
        model: u32,
    },
    Sound {
        sound: u32,
        only_self: bool,
    },
    PlayEmote {
        emote: u32,
    },
    FailQuest {
        quest: u32,
    },
    OfferQuest {
        quest: u32,
        direct_add: bool,
    },
    SetReactState {
        state: ReactState,
    },
    ActivateGobject,
    RandomEmote {
        emotes: Choices,
    },
    Cast {
        spell: u32,
        flags: CastFlags,
        triggered: bool,
        targets_limit: u32,
    },
    SummonCreature {
        creature: u32,
        summon_type: u32,
        duration_ms: u32,
        storage_id: u32,
        attack_invoker: bool,
        flags: SummonFlags,
        count: u32,
    },
    ThreatSinglePct {
        inc: u32,
        dec: u32,
    },
    ThreatAllPct {
        inc: u32,
        dec: u32,
    },
    CallAreaExploredOrEventHappens {
        quest: u32,
    },
    SetEmoteState {
        emote: u32,
    },
    AutoAttack {
        enabled: bool,
    },
    AllowCombatMovement {
        enabled: bool,
    },
    SetEventPhase {
        phase: u32,
    },
    IncEventPhase {
        inc: u32,
        dec: u32,
    },
    Evade {
        to_respawn_position: bool,
    },
    FleeForAssist {
        with_emote: bool,
    },
    CallGroupEventHappens {
        quest: u32,
    },
    CombatStop,
    RemoveAurasFromSpell {
        spell: u32,
        charges: u32,
        only_own: bool,
    },
    Follow {
        dist: u32,
        angle: u32,
        entry: u32,
        credit: u32,
        credit_type: FollowCredit,
    },
    RandomPhase {
        phases: Choices,
    },
    RandomPhaseRange {
        min: u32,
        max: u32,
    },
    ResetGobject,
    CallKilledMonster {
        creature: u32,
    },
    SetInstData {
        field: u32,
        data: u32,
        kind: InstDataKind,
    },
    SetInstData64 {
        field: u32,
    },
    UpdateTemplate {
        entry: u32,
        update_level: bool,
    },
    Die,
    SetInCombatWithZone,
    CallForHelp {
        range: u32,
        with_emote: bool,
    },
    SetSheath {
        sheath: SheathState,
    },
    ForceDespawn {
        delay_ms: u32,
        respawn_s: u32,
    },
    SetInvincibilityHpLevel {
        min_hp: u32,
        percent: u32,
    },
    MountToEntryOrModel {
        creature: u32,
        model: u32,
    },
    SetData {
        field: u32,
        data: u32,
    },
    AttackStop,
    SetVisibility {
        visible: bool,
    },
    SetActive {
        active: bool,
    },
    AttackStart,
    SummonGo {
        entry: u32,
        despawn_s: u32,
        summon_type: u32,
    },
    KillUnit,
    ActivateTaxi {
        path: u32,
    },
    WpStart {
        run: bool,
        path: u32,
        repeat: bool,
        quest: u32,
        despawn_ms: u32,
    },
    WpPause {
        delay_ms: u32,
    },
    WpStop {
        despawn_ms: u32,
        quest: u32,
        fail: bool,
    },
    AddItem {
        item: u32,
        count: u32,
    },
    RemoveItem {
        item: u32,
        count: u32,
    },
    SetRun {
        run: bool,
    },
    SetDisableGravity {
        disable: bool,
    },
    Teleport {
        map: u32,
    },
    SetCounter {
        counter: u32,
        value: u32,
        reset: bool,
    },
    StoreTargetList {
        id: u32,
    },
    WpResume,
    SetOrientation,
    CreateTimedEvent {
        id: u32,
        min: u32,
        max: u32,
        repeat_min: u32,
        repeat_max: u32,
        chance: u32,
    },
    PlayMovie {
        movie: u32,
    },
    MoveToPos {
        point_id: u32,
        disable_pathfinding: bool,
        contact_distance: u32,
    },
    EnableTempGobject {
        duration_s: u32,
    },
    CloseGossip,
    TriggerTimedEvent {
        id: u32,
    },
    RemoveTimedEvent {
        id: u32,
    },
    OverrideScriptBaseObject,
    ResetScriptBaseObject,
    CallScriptReset,
    SetRangedMovement {
        distance: u32,
        angle: u32,
    },
    CallTimedActionList {
        id: u32,
        timer: ListTimer,
        allow_override: bool,
    },
    SetNpcFlag {
        flags: NpcFlags,
    },
    AddNpcFlag {
        flags: NpcFlags,
    },
    RemoveNpcFlag {
        flags: NpcFlags,
    },
    SimpleTalk {
        group: u32,
    },
    SelfCast {
        spell: u32,
        flags: CastFlags,
        triggered: bool,
    },
    CrossCast {
        spell: u32,
        flags: CastFlags,
        casters: TargetSelector,
    },
    CallRandomTimedActionList {
        lists: Choices,
    },
    CallRandomRangeTimedActionList {
        min: u32,
        max: u32,
    },
    RandomMove {
        distance: u32,
    },
    InterruptSpell {
        with_delayed: bool,
        spell: u32,
        with_instant: bool,
    },
    SetDynamicFlag {
        flags: DynamicFlags,
    },
    AddDynamicFlag {
        flags: DynamicFlags,
    },
    RemoveDynamicFlag {
        flags: DynamicFlags,
    },
    JumpToPos {
        speed_xy: u32,
        speed_z: u32,
    },
    SendGossipMenu {
        menu: u32,
        text: u32,
    },
    GoSetLootState {
        state: u32,
    },
    SendTargetToTarget {
        id: u32,
    },
    SetHomePos,
    SetHealthRegen {
        enabled: bool,
    },
    SetRoot {
        root: bool,
    },
    SummonCreatureGroup {
        group: u32,
        attack_invoker: bool,
    },
    SetPower {
        power: PowerType,
        value: u32,
    },
    AddPower {
        power: PowerType,
        value: u32,
    },
    RemovePower {
        power: PowerType,
        value: u32,
    },
    GameEventStop {
        id: u32,
    },
    GameEventStart {
        id: u32,
    },
    StartClosestWaypoint {
        paths: Choices,
    },
    RandomSound {
        sounds: Choices,
        only_self: bool,
    },
    SetCorpseDelay {
        delay_s: u32,
        include_decay_ratio: bool,
    },
    DisableEvade {
        disable: bool,
    },
    GoSetGoState {
        state: u32,
    },
    AddThreat {
        inc: u32,
        dec: u32,
    },
    TriggerRandomTimedEvent {
        min: u32,
        max: u32,
    },
    RemoveAllGameobjects,
    PauseMovement {
        timer_ms: u32,
        force: bool,
    },
    SpawnSpawngroup {
        group: u32,
        min_delay: u32,
        max_delay: u32,
        flags: SpawnGroupFlags,
    },
    DespawnSpawngroup {
        group: u32,
        min_delay: u32,
        max_delay: u32,
        flags: SpawnGroupFlags,
    },
    RespawnBySpawnId {
        kind: ObjectKind,
        spawn_id: u32,
    },
    InvokerCast {
        spell: u32,
        flags: CastFlags,
        triggered: bool,
    },
    SetMovementSpeed {
        movement_type: u32,
        speed: f32,
    },
    SetHealthPct {
        pct: u32,
    },
    SetImmunePc {
        immune: bool,
    },
    SetImmuneNpc {
        immune: bool,
    },
    SetUninteractible {
        enabled: bool,
    },
    ActivateGameobject {
        action: u32,
    },
    AddToStoredTargetList {
        id: u32,
    },
    DoAction {
        action: u32,
    },
}

fn choices(p: &mut ParamReader<'_>, count: usize) -> Choices {
    (0..count).map(|i| p.get(i)).filter(|v| *v != 0).collect()
}

fn cast_flags(p: &mut ParamReader<'_>, index: usize) -> Result<CastFlags, TableError> {
    let raw = p.get(index);
    CastFlags::from_bits(raw).ok_or(TableError::ParamOutOfRange {
        key: p.key(),
        field: "cast flags",
        value: raw,
    })
}

fn power(p: &mut ParamReader<'_>, index: usize) -> Result<PowerType, TableError> {
    let raw = p.get(index);
    PowerType::from_repr(raw).ok_or(TableError::ParamOutOfRange {
        key: p.key(),
        field: "power type",
        value: raw,
    })
}

fn phase(p: &mut ParamReader<'_>, index: usize) -> Result<u32, TableError> {
    p.at_most(index, EngineConfig::MAX_PHASE, "phase")
}

fn spawn_group(
    p: &mut ParamReader<'_>,
) -> Result<(u32, u32, u32, SpawnGroupFlags), TableError> {
    let group = p.get(0);
    let (min_delay, max_delay) = p.window(1, 2, "spawn group delay")?;
    let raw = p.get(3);
    let flags = SpawnGroupFlags::from_bits(raw).ok_or(TableError::ParamOutOfRange {
        key: p.key(),
        field: "spawn group flags",
        value: raw,
    })?;
    Ok((group, min_delay, max_delay, flags))
}

impl Action {
    pub(crate) fn parse(kind: ActionKind, p: &mut ParamReader<'_>) -> Result<Self, TableError> {
        use ActionKind as K;
        let key = p.key();
        let empty = |what: &'static str| TableError::InvalidParams { key, reason: what };
        let action = match kind {
            K::None => Self::None,
            K::Talk => Self::Talk {
                group: p.get(0),
                duration_ms: p.get(1),
                use_talk_target: p.flag(2),
            },
            K::SetFaction => Self::SetFaction { faction: p.get(0) },
            K::MorphToEntryOrModel => Self::MorphToEntryOrModel {
                creature: p.get(0),
                model: p.get(1),
            },
            K::Sound => Self::Sound {
                sound: p.get(0),
                only_self: p.flag(1),
            },
            K::PlayEmote => Self::PlayEmote { emote: p.get(0) },
            K::FailQuest => Self::FailQuest { quest: p.get(0) },
            K::OfferQuest => Self::OfferQuest {
                quest: p.get(0),
                direct_add: p.flag(1),
            },
            K::SetReactState => {
                let raw = p.at_most(0, ReactState::Aggressive as u32, "react state")?;
                Self::SetReactState {
                    state: ReactState::from_repr(raw).unwrap_or_default(),
                }
            }
            K::ActivateGobject => Self::ActivateGobject,
            K::RandomEmote => {
                let emotes = choices(p, EngineConfig::MAX_RANDOM_CHOICES);
                if emotes.is_empty() {
                    return Err(empty("random emote without emotes"));
                }
                Self::RandomEmote { emotes }
            }
            K::Cast => {
                let spell = p.get(0);
                let flags = cast_flags(p, 1)?;
                let triggered = flags.contains(CastFlags::TRIGGERED) || p.flag(2);
                Self::Cast {
                    spell,
                    flags,
                    triggered,
                    targets_limit: p.get(3),
                }
            }
            K::SummonCreature => {
                let creature = p.get(0);
                let summon_type = p.get(1);
                let duration_ms = p.get(2);
                let storage_id = p.get(3);
                let attack_invoker = p.flag(4);
                let raw = p.get(5);
                let flags = SummonFlags::from_bits(raw).ok_or(TableError::ParamOutOfRange {
                    key,
                    field: "summon flags",
                    value: raw,
                })?;
                Self::SummonCreature {
                    creature,
                    summon_type,
                    duration_ms,
                    storage_id,
                    attack_invoker,
                    flags,
                    count: p.get(6).max(1),
                }
            }
            K::ThreatSinglePct => Self::ThreatSinglePct {
                inc: p.get(0),
                dec: p.get(1),
            },
            K::ThreatAllPct => Self::ThreatAllPct {
                inc: p.get(0),
                dec: p.get(1),
            },
            K::CallAreaExploredOrEventHappens => {
                Self::CallAreaExploredOrEventHappens { quest: p.get(0) }
            }
            K::SetEmoteState => Self::SetEmoteState { emote: p.get(0) },
            K::AutoAttack => Self::AutoAttack { enabled: p.flag(0) },
            K::AllowCombatMovement => Self::AllowCombatMovement { enabled: p.flag(0) },
            K::SetEventPhase => Self::SetEventPhase { phase: phase(p, 0)? },
            K::IncEventPhase => {
                let inc = phase(p, 0)?;
                let dec = phase(p, 1)?;
                if inc == 0 && dec == 0 {
                    return Err(empty("phase increment without inc or dec"));
                }
                Self::IncEventPhase { inc, dec }
            }
            K::Evade => Self::Evade {
                to_respawn_position: p.flag(0),
            },
            K::FleeForAssist => Self::FleeForAssist {
                with_emote: p.flag(0),
            },
            K::CallGroupEventHappens => Self::CallGroupEventHappens { quest: p.get(0) },
            K::CombatStop => Self::CombatStop,
            K::RemoveAurasFromSpell => Self::RemoveAurasFromSpell {
                spell: p.get(0),
                charges: p.get(1),
                only_own: p.flag(2),
            },
            K::Follow => {
                let dist = p.get(0);
                let angle = p.get(1);
                let entry = p.get(2);
                let credit = p.get(3);
                let raw = p.at_most(4, FollowCredit::QuestEvent as u32, "follow credit type")?;
                Self::Follow {
                    dist,
                    angle,
                    entry,
                    credit,
                    credit_type: FollowCredit::from_repr(raw).unwrap_or(FollowCredit::KilledMonster),
                }
            }
            K::RandomPhase => {
                for index in 0..EngineConfig::MAX_RANDOM_CHOICES {
                    phase(p, index)?;
                }
                let phases = choices(p, EngineConfig::MAX_RANDOM_CHOICES);
                if phases.is_empty() {
                    return Err(empty("random phase without phases"));
                }
                Self::RandomPhase { phases }
            }
            K::RandomPhaseRange => {
                let (min, max) = p.window(0, 1, "phase range")?;
                phase(p, 1)?;
                Self::RandomPhaseRange { min, max }
            }
            K::ResetGobject => Self::ResetGobject,
            K::CallKilledMonster => Self::CallKilledMonster { creature: p.get(0) },
            K::SetInstData => {
                let field = p.get(0);
                let data = p.get(1);
                let raw = p.at_most(2, InstDataKind::BossState as u32, "instance data type")?;
                Self::SetInstData {
                    field,
                    data,
                    kind: InstDataKind::from_repr(raw).unwrap_or(InstDataKind::Data),
                }
            }
            K::SetInstData64 => Self::SetInstData64 { field: p.get(0) },
            K::UpdateTemplate => Self::UpdateTemplate {
                entry: p.get(0),
                update_level: p.flag(1),
            },
            K::Die => Self::Die,
            K::SetInCombatWithZone => Self::SetInCombatWithZone,
            K::CallForHelp => Self::CallForHelp {
                range: p.get(0),
                with_emote: p.flag(1),
            },
            K::SetSheath => {
                let raw = p.at_most(0, SheathState::Ranged as u32, "sheath state")?;
                Self::SetSheath {
                    sheath: SheathState::from_repr(raw).unwrap_or(SheathState::Unarmed),
                }
            }
            K::ForceDespawn => Self::ForceDespawn {
                delay_ms: p.get(0),
                respawn_s: p.get(1),
            },
            K::SetInvincibilityHpLevel => Self::SetInvincibilityHpLevel {
                min_hp: p.get(0),
                percent: p.at_most(1, 100, "invincibility percent")?,
            },
            K::MountToEntryOrModel => Self::MountToEntryOrModel {
                creature: p.get(0),
                model: p.get(1),
            },
            K::SetData => Self::SetData {
                field: p.get(0),
                data: p.get(1),
            },
            K::AttackStop => Self::AttackStop,
            K::SetVisibility => Self::SetVisibility { visible: p.flag(0) },
            K::SetActive => Self::SetActive { active: p.flag(0) },
            K::AttackStart => Self::AttackStart,
            K::SummonGo => Self::SummonGo {
                entry: p.get(0),
                despawn_s: p.get(1),
                summon_type: p.get(2),
            },
            K::KillUnit => Self::KillUnit,
            K::ActivateTaxi => Self::ActivateTaxi { path: p.get(0) },
            K::WpStart => {
                let run = p.flag(0);
                let path = p.get(1);
                if path == 0 {
                    return Err(empty("waypoint start without a path"));
                }
                Self::WpStart {
                    run,
                    path,
                    repeat: p.flag(2),
                    quest: p.get(3),
                    despawn_ms: p.get(4),
                }
            }
            K::WpPause => Self::WpPause { delay_ms: p.get(0) },
            K::WpStop => Self::WpStop {
                despawn_ms: p.get(0),
                quest: p.get(1),
                fail: p.flag(2),
            },
            K::AddItem => Self::AddItem {
                item: p.get(0),
                count: p.get(1),
            },
            K::RemoveItem => Self::RemoveItem {
                item: p.get(0),
                count: p.get(1),
            },
            K::SetRun => Self::SetRun { run: p.flag(0) },
            K::SetDisableGravity => Self::SetDisableGravity { disable: p.flag(0) },
            K::Teleport => Self::Teleport { map: p.get(0) },
            K::SetCounter => {
                let counter = p.get(0);
                if counter == 0 {
                    return Err(empty("counter action without a counter id"));
                }
                let value = p.get(1);
                let reset = p.at_most(2, 1, "counter reset")? == 1;
                Self::SetCounter {
                    counter,
                    value,
                    reset,
                }
            }
            K::StoreTargetList => Self::StoreTargetList { id: p.get(0) },
            K::WpResume => Self::WpResume,
            K::SetOrientation => Self::SetOrientation,
            K::CreateTimedEvent => {
                let id = p.get(0);
                let (min, max) = p.window(1, 2, "timed event delay")?;
                let (repeat_min, repeat_max) = p.window(3, 4, "timed event repeat")?;
                let chance = p.at_most(5, 100, "timed event chance")?;
                Self::CreateTimedEvent {
                    id,
                    min,
                    max,
                    repeat_min,
                    repeat_max,
                    chance,
                }
            }
            K::PlayMovie => Self::PlayMovie { movie: p.get(0) },
            K::MoveToPos => {
                let point_id = p.get(0);
                if p.get(1) != 0 {
                    return Err(empty("transport-relative movement is not supported"));
                }
                Self::MoveToPos {
                    point_id,
                    disable_pathfinding: p.flag(2),
                    contact_distance: p.get(3),
                }
            }
            K::EnableTempGobject => Self::EnableTempGobject {
                duration_s: p.get(0),
            },
            K::CloseGossip => Self::CloseGossip,
            K::TriggerTimedEvent => Self::TriggerTimedEvent { id: p.get(0) },
            K::RemoveTimedEvent => Self::RemoveTimedEvent { id: p.get(0) },
            K::OverrideScriptBaseObject => Self::OverrideScriptBaseObject,
            K::ResetScriptBaseObject => Self::ResetScriptBaseObject,
            K::CallScriptReset => Self::CallScriptReset,
            K::SetRangedMovement => Self::SetRangedMovement {
                distance: p.get(0),
                angle: p.get(1),
            },
            K::CallTimedActionList => Self::CallTimedActionList {
                id: p.get(0),
                timer: ListTimer::from_raw(p.get(1)),
                allow_override: p.flag(2),
            },
            K::SetNpcFlag => Self::SetNpcFlag {
                flags: NpcFlags::from_bits_retain(p.get(0)),
            },
            K::AddNpcFlag => Self::AddNpcFlag {
                flags: NpcFlags::from_bits_retain(p.get(0)),
            },
            K::RemoveNpcFlag => Self::RemoveNpcFlag {
                flags: NpcFlags::from_bits_retain(p.get(0)),
            },
            K::SimpleTalk => Self::SimpleTalk { group: p.get(0) },
            K::SelfCast | K::InvokerCast => {
                let spell = p.get(0);
                let flags = cast_flags(p, 1)?;
                let triggered = flags.contains(CastFlags::TRIGGERED) || p.flag(2);
                if kind == K::SelfCast {
                    Self::SelfCast {
                        spell,
                        flags,
                        triggered,
                    }
                } else {
                    Self::InvokerCast {
                        spell,
                        flags,
                        triggered,
                    }
                }
            }
            K::CrossCast => {
                let spell = p.get(0);
                let flags = cast_flags(p, 1)?;
                let raw = p.get(2);
                let caster_kind = TargetKind::from_repr(raw).ok_or(TableError::UnknownTarget {
                    key,
                    value: raw,
                })?;
                let caster_params = [p.get(3), p.get(4), p.get(5)];
                let mut caster_reader = ParamReader::new(key, "cross cast caster", &caster_params);
                let casters = TargetSelector::parse(caster_kind, &mut caster_reader)?;
                Self::CrossCast {
                    spell,
                    flags,
                    casters,
                }
            }
            K::CallRandomTimedActionList => {
                let lists = choices(p, EngineConfig::MAX_RANDOM_CHOICES);
                if lists.is_empty() {
                    return Err(empty("random action list call without lists"));
                }
                Self::CallRandomTimedActionList { lists }
            }
            K::CallRandomRangeTimedActionList => {
                let (min, max) = p.window(0, 1, "action list range")?;
                if min == 0 {
                    return Err(empty("action list range starting at zero"));
                }
                Self::CallRandomRangeTimedActionList { min, max }
            }
            K::RandomMove => Self::RandomMove { distance: p.get(0) },
            K::InterruptSpell => Self::InterruptSpell {
                with_delayed: p.flag(0),
                spell: p.get(1),
                with_instant: p.flag(2),
            },
            K::SetDynamicFlag => Self::SetDynamicFlag {
                flags: DynamicFlags::from_bits_retain(p.get(0)),
            },
            K::AddDynamicFlag => Self::AddDynamicFlag {
                flags: DynamicFlags::from_bits_retain(p.get(0)),
            },
            K::RemoveDynamicFlag => Self::RemoveDynamicFlag {
                flags: DynamicFlags::from_bits_retain(p.get(0)),
            },
            K::JumpToPos => Self::JumpToPos {
                speed_xy: p.get(0),
                speed_z: p.get(1),
            },
            K::SendGossipMenu => Self::SendGossipMenu {
                menu: p.get(0),
                text: p.get(1),
            },
            K::GoSetLootState => Self::GoSetLootState { state: p.get(0) },
            K::SendTargetToTarget => Self::SendTargetToTarget { id: p.get(0) },
            K::SetHomePos => Self::SetHomePos,
            K::SetHealthRegen => Self::SetHealthRegen { enabled: p.flag(0) },
            K::SetRoot => Self::SetRoot { root: p.flag(0) },
            K::SummonCreatureGroup => Self::SummonCreatureGroup {
                group: p.get(0),
                attack_invoker: p.flag(1),
            },
            K::SetPower => Self::SetPower {
                power: power(p, 0)?,
                value: p.get(1),
            },
            K::AddPower => Self::AddPower {
                power: power(p, 0)?,
                value: p.get(1),
            },
            K::RemovePower => Self::RemovePower {
                power: power(p, 0)?,
                value: p.get(1),
            },
            K::GameEventStop => Self::GameEventStop { id: p.get(0) },
            K::GameEventStart => Self::GameEventStart { id: p.get(0) },
            K::StartClosestWaypoint => {
                let paths = choices(p, EngineConfig::MAX_RANDOM_CHOICES);
                if paths.is_empty() {
                    return Err(empty("closest waypoint start without paths"));
                }
                Self::StartClosestWaypoint { paths }
            }
            K::RandomSound => {
                let sounds = choices(p, 4);
                if sounds.is_empty() {
                    return Err(empty("random sound without sounds"));
                }
                Self::RandomSound {
                    sounds,
                    only_self: p.flag(4),
                }
            }
            K::SetCorpseDelay => Self::SetCorpseDelay {
                delay_s: p.get(0),
                include_decay_ratio: p.flag(1),
            },
            K::DisableEvade => Self::DisableEvade { disable: p.flag(0) },
            K::GoSetGoState => Self::GoSetGoState { state: p.get(0) },
            K::AddThreat => Self::AddThreat {
                inc: p.get(0),
                dec: p.get(1),
            },
            K::TriggerRandomTimedEvent => {
                let (min, max) = p.window(0, 1, "timed event id range")?;
                Self::TriggerRandomTimedEvent { min, max }
            }
            K::RemoveAllGameobjects => Self::RemoveAllGameobjects,
            K::PauseMovement => {
                // Column 0 names a movement slot; only the active slot exists here.
                p.get(0);
                Self::PauseMovement {
                    timer_ms: p.get(1),
                    force: p.flag(2),
                }
            }
            K::SpawnSpawngroup => {
                let (group, min_delay, max_delay, flags) = spawn_group(p)?;
                Self::SpawnSpawngroup {
                    group,
                    min_delay,
                    max_delay,
                    flags,
                }
            }
            K::DespawnSpawngroup => {
                let (group, min_delay, max_delay, flags) = spawn_group(p)?;
                Self::DespawnSpawngroup {
                    group,
                    min_delay,
                    max_delay,
                    flags,
                }
            }
            K::RespawnBySpawnId => {
                let raw = p.get(0);
                let kind = match raw {
                    0 => ObjectKind::Creature,
                    1 => ObjectKind::GameObject,
                    _ => {
                        return Err(TableError::ParamOutOfRange {
                            key,
                            field: "spawn type",
                            value: raw,
                        });
                    }
                };
                Self::RespawnBySpawnId {
                    kind,
                    spawn_id: p.get(1),
                }
            }
            K::SetMovementSpeed => {
                let movement_type = p.get(0);
                let integer = p.get(1);
                let fraction = p.get(2);
                Self::SetMovementSpeed {
                    movement_type,
                    speed: integer as f32 + fraction as f32 / 10_000.0,
                }
            }
            K::SetHealthPct => Self::SetHealthPct {
                pct: p.at_most(0, 100, "health percent")?,
            },
            K::SetImmunePc => Self::SetImmunePc { immune: p.flag(0) },
            K::SetImmuneNpc => Self::SetImmuneNpc { immune: p.flag(0) },
            K::SetUninteractible => Self::SetUninteractible { enabled: p.flag(0) },
            K::ActivateGameobject => Self::ActivateGameobject { action: p.get(0) },
            K::AddToStoredTargetList => Self::AddToStoredTargetList { id: p.get(0) },
            K::DoAction => Self::DoAction { action: p.get(0) },
        };
        Ok(action)
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Cast actions that must wait for the caster's current cast to finish.
    pub fn waits_for_cast(&self) -> bool {
        matches!(self, Self::Cast { flags, .. } if !flags.contains(CastFlags::INTERRUPT_PREVIOUS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holder::{RuleKey, ScriptType};

    fn parse(kind: ActionKind, values: &[u32]) -> Result<Action, TableError> {
        let mut reader =
            ParamReader::new(RuleKey::new(1, ScriptType::Creature, 0), "action", values);
        Action::parse(kind, &mut reader)
    }

    #[test]
    fn react_and_sheath_are_bounded() {
        assert!(parse(ActionKind::SetReactState, &[3]).is_err());
        assert_eq!(
            parse(ActionKind::SetReactState, &[0]),
            Ok(Action::SetReactState {
                state: ReactState::Passive
            })
        );
        assert!(parse(ActionKind::SetSheath, &[5]).is_err());
    }

    #[test]
    fn phases_are_bounded() {
        assert!(parse(ActionKind::SetEventPhase, &[13]).is_err());
        assert!(parse(ActionKind::RandomPhase, &[1, 2, 14, 0, 0, 0]).is_err());
        let Ok(Action::RandomPhase { phases }) = parse(ActionKind::RandomPhase, &[1, 0, 3]) else {
            panic!("random phase should parse");
        };
        assert_eq!(phases.as_slice(), &[1, 3]);
        assert!(parse(ActionKind::RandomPhase, &[0; 6]).is_err());
    }

    #[test]
    fn instance_data_type() {
        assert_eq!(
            parse(ActionKind::SetInstData, &[4, 3, 1]),
            Ok(Action::SetInstData {
                field: 4,
                data: 3,
                kind: InstDataKind::BossState
            })
        );
        assert!(parse(ActionKind::SetInstData, &[4, 3, 2]).is_err());
    }

    #[test]
    fn cross_cast_parses_caster_selector() {
        let Ok(Action::CrossCast { spell, casters, .. }) =
            parse(ActionKind::CrossCast, &[500, 0, 19, 77, 30, 0])
        else {
            panic!("cross cast should parse");
        };
        assert_eq!(spell, 500);
        assert_eq!(
            casters,
            TargetSelector::ClosestCreature {
                entry: 77,
                dist: 30,
                dead: false
            }
        );
    }

    #[test]
    fn cast_deferral() {
        let plain = parse(ActionKind::Cast, &[1, 0]).ok();
        let interrupting = parse(ActionKind::Cast, &[1, 1]).ok();
        assert!(plain.is_some_and(|a| a.waits_for_cast()));
        assert!(interrupting.is_some_and(|a| !a.waits_for_cast()));
        assert!(parse(ActionKind::Cast, &[1, 0x400]).is_err());
    }

    #[test]
    fn names_are_snake_case() {
        assert_eq!(Action::CombatStop.name(), "combat_stop");
        assert_eq!(ActionKind::from_repr(151), Some(ActionKind::DoAction));
    }
}
