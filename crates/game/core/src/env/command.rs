//! Outbound commands the engines issue to the host world.
//!
//! Commands are fire-and-forget: the world applies them (or ignores them when
//! the subject vanished) and reports consequences back through callbacks.
use crate::guid::{ObjectGuid, ObjectKind};
use crate::position::Position;
use crate::unit::{DynamicFlags, NpcFlags, PowerType, ReactState, SheathState, UnitFlags};

#[derive(Clone, Debug, PartialEq)]
pub enum WorldCommand {
    // ===== speech and presentation =====
    Talk {
        speaker: ObjectGuid,
        group: u32,
        whisper_to: Option<ObjectGuid>,
    },
    PlaySound {
        source: ObjectGuid,
        sound: u32,
        only_to: Option<ObjectGuid>,
    },
    PlayEmote {
        unit: ObjectGuid,
        emote: u32,
    },
    SetEmoteState {
        unit: ObjectGuid,
        emote: u32,
    },
    Morph {
        unit: ObjectGuid,
        /// 0 restores the native display.
        display_id: u32,
    },
    Mount {
        unit: ObjectGuid,
        /// 0 dismounts.
        display_id: u32,
    },
    SetSheath {
        unit: ObjectGuid,
        sheath: SheathState,
    },
    SetVisible {
        object: ObjectGuid,
        visible: bool,
    },
    SetActive {
        object: ObjectGuid,
        active: bool,
    },
    PlayMovie {
        player: ObjectGuid,
        movie: u32,
    },

    // ===== unit state =====
    SetFaction {
        unit: ObjectGuid,
        /// 0 restores the template faction.
        faction: u32,
    },
    SetReactState {
        unit: ObjectGuid,
        state: ReactState,
    },
    SetUnitFlag {
        unit: ObjectGuid,
        flag: UnitFlags,
        enabled: bool,
    },
    SetNpcFlags {
        unit: ObjectGuid,
        flags: NpcFlags,
    },
    SetDynamicFlags {
        unit: ObjectGuid,
        flags: DynamicFlags,
    },
    SetHomePosition {
        unit: ObjectGuid,
        position: Position,
    },
    SetHealthRegen {
        unit: ObjectGuid,
        enabled: bool,
    },
    SetHealthPct {
        unit: ObjectGuid,
        pct: u32,
    },
    SetPower {
        unit: ObjectGuid,
        power: PowerType,
        value: u32,
    },
    ModifyPower {
        unit: ObjectGuid,
        power: PowerType,
        delta: i64,
    },
    SetCorpseDelay {
        unit: ObjectGuid,
        delay_s: u32,
        include_decay_ratio: bool,
    },
    UpdateEntry {
        unit: ObjectGuid,
        entry: u32,
        update_level: bool,
    },
    Kill {
        victim: ObjectGuid,
        killer: Option<ObjectGuid>,
    },
    Despawn {
        object: ObjectGuid,
        delay_ms: u32,
        respawn_ms: u32,
    },

    // ===== spells =====
    CastSpell {
        caster: ObjectGuid,
        target: ObjectGuid,
        spell: u32,
        triggered: bool,
    },
    InterruptSpell {
        unit: ObjectGuid,
        spell: Option<u32>,
        with_delayed: bool,
        instant: bool,
    },
    RemoveAuras {
        unit: ObjectGuid,
        /// `None` removes every aura.
        spell: Option<u32>,
        charges: u32,
        only_own: bool,
    },

    // ===== combat plumbing =====
    StartMeleeAttack {
        attacker: ObjectGuid,
        victim: ObjectGuid,
    },
    StopAttack {
        unit: ObjectGuid,
    },
    CallForHelp {
        unit: ObjectGuid,
        radius: f32,
    },
    FleeForAssist {
        unit: ObjectGuid,
    },

    // ===== movement =====
    MoveChase {
        mover: ObjectGuid,
        target: ObjectGuid,
        distance: f32,
        angle: f32,
    },
    MoveFollow {
        mover: ObjectGuid,
        target: ObjectGuid,
        distance: f32,
        angle: f32,
    },
    MovePoint {
        mover: ObjectGuid,
        point_id: u32,
        position: Position,
        generate_path: bool,
    },
    MoveJump {
        mover: ObjectGuid,
        position: Position,
        speed_xy: f32,
        speed_z: f32,
    },
    MoveRandom {
        mover: ObjectGuid,
        radius: f32,
    },
    MovePath {
        mover: ObjectGuid,
        path_id: u32,
        /// Point id to start from; 0 starts at the first node.
        start_point: u32,
        repeat: bool,
    },
    MoveHome {
        mover: ObjectGuid,
    },
    MoveIdle {
        mover: ObjectGuid,
    },
    PauseMovement {
        mover: ObjectGuid,
        duration_ms: u32,
        forced: bool,
    },
    ResumeMovement {
        mover: ObjectGuid,
    },
    SetRun {
        unit: ObjectGuid,
        run: bool,
    },
    SetDisableGravity {
        unit: ObjectGuid,
        disable: bool,
    },
    SetRoot {
        unit: ObjectGuid,
        rooted: bool,
    },
    SetMovementSpeed {
        unit: ObjectGuid,
        movement_type: u32,
        speed: f32,
    },
    SetOrientation {
        unit: ObjectGuid,
        orientation: f32,
    },
    Teleport {
        unit: ObjectGuid,
        map_id: u32,
        position: Position,
    },
    ActivateTaxi {
        player: ObjectGuid,
        path: u32,
    },

    // ===== quests, items, gossip =====
    FailQuest {
        player: ObjectGuid,
        quest: u32,
    },
    OfferQuest {
        player: ObjectGuid,
        quest: u32,
        direct_add: bool,
    },
    AreaExploredOrEventHappens {
        player: ObjectGuid,
        quest: u32,
    },
    GroupEventHappens {
        player: ObjectGuid,
        quest: u32,
    },
    KilledMonsterCredit {
        player: ObjectGuid,
        entry: u32,
    },
    AddItem {
        player: ObjectGuid,
        item: u32,
        count: u32,
    },
    RemoveItem {
        player: ObjectGuid,
        item: u32,
        count: u32,
    },
    SendGossipMenu {
        player: ObjectGuid,
        source: ObjectGuid,
        menu_id: u32,
        text_id: u32,
    },
    CloseGossip {
        player: ObjectGuid,
    },

    // ===== game objects =====
    ActivateGameObject {
        object: ObjectGuid,
        action: u32,
    },
    UseGameObject {
        object: ObjectGuid,
        user: ObjectGuid,
    },
    ResetGameObject {
        object: ObjectGuid,
    },
    SetLootState {
        object: ObjectGuid,
        state: u32,
    },
    SetGoState {
        object: ObjectGuid,
        state: u32,
    },
    EnableTempGameObject {
        object: ObjectGuid,
        duration_ms: u32,
    },
    RemoveAllGameObjects {
        owner: ObjectGuid,
    },

    // ===== map-wide =====
    SetInstanceData {
        source: ObjectGuid,
        field: u32,
        data: u32,
    },
    SetInstanceGuidData {
        source: ObjectGuid,
        field: u32,
        data: ObjectGuid,
    },
    SetBossState {
        source: ObjectGuid,
        boss_id: u32,
        state: u32,
    },
    StartGameEvent {
        event_id: u32,
    },
    StopGameEvent {
        event_id: u32,
    },
    SpawnGroup {
        source: ObjectGuid,
        group_id: u32,
        force: bool,
        ignore_respawn: bool,
    },
    DespawnGroup {
        source: ObjectGuid,
        group_id: u32,
        delete_respawn_times: bool,
    },
    RespawnBySpawnId {
        source: ObjectGuid,
        kind: ObjectKind,
        spawn_id: u64,
    },
}

impl WorldCommand {
    /// The object a command primarily acts on, when it has one.
    pub fn subject(&self) -> Option<ObjectGuid> {
        use WorldCommand::*;
        match self {
            Talk { speaker, .. } => Some(*speaker),
            PlaySound { source, .. } => Some(*source),
            PlayEmote { unit, .. }
            | SetEmoteState { unit, .. }
            | Morph { unit, .. }
            | Mount { unit, .. }
            | SetSheath { unit, .. }
            | SetFaction { unit, .. }
            | SetReactState { unit, .. }
            | SetUnitFlag { unit, .. }
            | SetNpcFlags { unit, .. }
            | SetDynamicFlags { unit, .. }
            | SetHomePosition { unit, .. }
            | SetHealthRegen { unit, .. }
            | SetHealthPct { unit, .. }
            | SetPower { unit, .. }
            | ModifyPower { unit, .. }
            | SetCorpseDelay { unit, .. }
            | UpdateEntry { unit, .. }
            | InterruptSpell { unit, .. }
            | RemoveAuras { unit, .. }
            | StopAttack { unit }
            | CallForHelp { unit, .. }
            | FleeForAssist { unit }
            | SetRun { unit, .. }
            | SetDisableGravity { unit, .. }
            | SetRoot { unit, .. }
            | SetMovementSpeed { unit, .. }
            | SetOrientation { unit, .. }
            | Teleport { unit, .. } => Some(*unit),
            SetVisible { object, .. }
            | SetActive { object, .. }
            | Despawn { object, .. }
            | ActivateGameObject { object, .. }
            | UseGameObject { object, .. }
            | ResetGameObject { object }
            | SetLootState { object, .. }
            | SetGoState { object, .. }
            | EnableTempGameObject { object, .. } => Some(*object),
            PlayMovie { player, .. }
            | ActivateTaxi { player, .. }
            | FailQuest { player, .. }
            | OfferQuest { player, .. }
            | AreaExploredOrEventHappens { player, .. }
            | GroupEventHappens { player, .. }
            | KilledMonsterCredit { player, .. }
            | AddItem { player, .. }
            | RemoveItem { player, .. }
            | SendGossipMenu { player, .. }
            | CloseGossip { player } => Some(*player),
            Kill { victim, .. } => Some(*victim),
            CastSpell { caster, .. } => Some(*caster),
            StartMeleeAttack { attacker, .. } => Some(*attacker),
            MoveChase { mover, .. }
            | MoveFollow { mover, .. }
            | MovePoint { mover, .. }
            | MoveJump { mover, .. }
            | MoveRandom { mover, .. }
            | MovePath { mover, .. }
            | MoveHome { mover }
            | MoveIdle { mover }
            | PauseMovement { mover, .. }
            | ResumeMovement { mover } => Some(*mover),
            RemoveAllGameObjects { owner } => Some(*owner),
            SetInstanceData { source, .. }
            | SetInstanceGuidData { source, .. }
            | SetBossState { source, .. }
            | SpawnGroup { source, .. }
            | DespawnGroup { source, .. }
            | RespawnBySpawnId { source, .. } => Some(*source),
            StartGameEvent { .. } | StopGameEvent { .. } => None,
        }
    }
}
