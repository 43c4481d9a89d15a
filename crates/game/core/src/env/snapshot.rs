//! In-memory world used by tools and tests.
//!
//! [`WorldSnapshot`] stores one [`ObjectRecord`] per object and answers both
//! oracle traits from them. Issued commands are recorded in order; the ones
//! that change observable state (flags, react state, death, despawn, health)
//! are also applied so follow-up queries see their effect.
use std::collections::{BTreeMap, BTreeSet};

use super::{
    ConditionSource, ObjectSearch, OracleError, SummonKind, SummonRequest, TauntAura,
    UnitOracle, WorldCommand, WorldOracle,
};
use crate::guid::{ObjectGuid, ObjectKind};
use crate::position::Position;
use crate::spell::SpellSchoolMask;
use crate::unit::{DynamicFlags, NpcFlags, PowerType, ReactState, UnitFlags, UnitState};

pub const PLAYER_FACTION: u32 = 1;
pub const MONSTER_FACTION: u32 = 14;

/// Melee reach used by the snapshot's range checks.
const MELEE_RANGE: f32 = 5.0;

/// Everything the snapshot knows about one object.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectRecord {
    pub guid: ObjectGuid,
    pub position: Position,
    pub home: Position,
    pub map_id: u32,
    pub zone_id: u32,
    pub area_id: u32,
    pub difficulty: u8,
    pub phase_mask: u32,
    pub in_world: bool,
    pub spawned: bool,
    pub alive: bool,
    pub health_pct: f32,
    pub power_type: Option<PowerType>,
    pub power_pct: f32,
    pub faction: u32,
    pub unit_flags: UnitFlags,
    pub unit_state: UnitState,
    pub npc_flags: NpcFlags,
    pub dynamic_flags: DynamicFlags,
    pub react_state: ReactState,
    pub game_master: bool,
    pub combat_disallowed: bool,
    pub pet: bool,
    pub trigger: bool,
    pub charmed: bool,
    pub charmer_or_owner: Option<ObjectGuid>,
    pub summoner: Option<ObjectGuid>,
    pub creator: Option<ObjectGuid>,
    pub vehicle_base: Option<ObjectGuid>,
    pub vehicle_accessory: bool,
    pub private_owner: Option<ObjectGuid>,
    pub hidden_from: BTreeSet<ObjectGuid>,
    pub auras: BTreeMap<u32, u32>,
    pub taunts: Vec<TauntAura>,
    pub detaunts: Vec<TauntAura>,
    pub immune_schools: SpellSchoolMask,
    pub breakable_stun: bool,
    pub threat_multiplier: f32,
    pub casting: Option<u32>,
    pub passengers: Vec<(u8, ObjectGuid)>,
    pub loot_recipients: Vec<ObjectGuid>,
    pub group: Option<u32>,
    pub instance_script: bool,
}

impl ObjectRecord {
    pub fn new(guid: ObjectGuid) -> Self {
        let faction = if guid.is_player() {
            PLAYER_FACTION
        } else {
            MONSTER_FACTION
        };
        let unit_flags = if guid.is_player() {
            UnitFlags::PLAYER_CONTROLLED
        } else {
            UnitFlags::empty()
        };
        Self {
            guid,
            position: Position::default(),
            home: Position::default(),
            map_id: 0,
            zone_id: 0,
            area_id: 0,
            difficulty: 0,
            phase_mask: 1,
            in_world: true,
            spawned: true,
            alive: true,
            health_pct: 100.0,
            power_type: guid.is_unit().then_some(PowerType::Mana),
            power_pct: 100.0,
            faction,
            unit_flags,
            unit_state: UnitState::empty(),
            npc_flags: NpcFlags::empty(),
            dynamic_flags: DynamicFlags::empty(),
            react_state: ReactState::Aggressive,
            game_master: false,
            combat_disallowed: false,
            pet: false,
            trigger: false,
            charmed: false,
            charmer_or_owner: None,
            summoner: None,
            creator: None,
            vehicle_base: None,
            vehicle_accessory: false,
            private_owner: None,
            hidden_from: BTreeSet::new(),
            auras: BTreeMap::new(),
            taunts: Vec::new(),
            detaunts: Vec::new(),
            immune_schools: SpellSchoolMask::empty(),
            breakable_stun: false,
            threat_multiplier: 1.0,
            casting: None,
            passengers: Vec::new(),
            loot_recipients: Vec::new(),
            group: None,
            instance_script: false,
        }
    }

    pub fn player(counter: u64) -> Self {
        Self::new(ObjectGuid::player(counter))
    }

    pub fn creature(entry: u32, counter: u64) -> Self {
        Self::new(ObjectGuid::creature(entry, counter))
    }

    pub fn game_object(entry: u32, counter: u64) -> Self {
        Self::new(ObjectGuid::game_object(entry, counter))
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Position::xyz(x, y, z);
        self.home = self.position;
        self
    }

    pub fn with_faction(mut self, faction: u32) -> Self {
        self.faction = faction;
        self
    }

    pub fn with_health_pct(mut self, pct: f32) -> Self {
        self.health_pct = pct;
        self
    }

    pub fn with_unit_flags(mut self, flags: UnitFlags) -> Self {
        self.unit_flags |= flags;
        self
    }

    pub fn with_group(mut self, group: u32) -> Self {
        self.group = Some(group);
        self
    }

    pub fn dead(mut self) -> Self {
        self.alive = false;
        self.health_pct = 0.0;
        self
    }

    pub fn as_pet_of(mut self, owner: ObjectGuid) -> Self {
        self.pet = true;
        self.charmer_or_owner = Some(owner);
        self.unit_flags |= UnitFlags::PLAYER_CONTROLLED;
        self
    }

    pub fn summoned_by(mut self, summoner: ObjectGuid) -> Self {
        self.summoner = Some(summoner);
        self
    }
}

/// In-memory [`WorldOracle`] implementation.
#[derive(Clone, Debug, Default)]
pub struct WorldSnapshot {
    objects: BTreeMap<ObjectGuid, ObjectRecord>,
    hostile_factions: BTreeSet<(u32, u32)>,
    los_blocked: BTreeSet<(ObjectGuid, ObjectGuid)>,
    failing_conditions: BTreeSet<(i64, u32)>,
    text_durations: BTreeMap<(u32, u32), u32>,
    summon_groups: BTreeMap<(u32, u32), Vec<(u32, Position)>>,
    commands: Vec<WorldCommand>,
    next_summon_counter: u64,
}

impl WorldSnapshot {
    /// Creates an empty world where players and monsters are hostile.
    pub fn new() -> Self {
        let mut snapshot = Self {
            next_summon_counter: 1_000_000,
            ..Self::default()
        };
        snapshot.set_hostile(PLAYER_FACTION, MONSTER_FACTION);
        snapshot
    }

    pub fn insert(&mut self, record: ObjectRecord) -> Result<ObjectGuid, OracleError> {
        let guid = record.guid;
        if self.objects.contains_key(&guid) {
            return Err(OracleError::DuplicateObject(guid));
        }
        self.objects.insert(guid, record);
        Ok(guid)
    }

    /// Inserts or replaces a record.
    pub fn with(mut self, record: ObjectRecord) -> Self {
        self.objects.insert(record.guid, record);
        self
    }

    pub fn record(&self, guid: ObjectGuid) -> Result<&ObjectRecord, OracleError> {
        self.objects
            .get(&guid)
            .ok_or(OracleError::ObjectNotFound(guid))
    }

    pub fn record_mut(&mut self, guid: ObjectGuid) -> Result<&mut ObjectRecord, OracleError> {
        self.objects
            .get_mut(&guid)
            .ok_or(OracleError::ObjectNotFound(guid))
    }

    pub fn set_hostile(&mut self, a: u32, b: u32) {
        self.hostile_factions.insert((a.min(b), a.max(b)));
    }

    pub fn block_los(&mut self, a: ObjectGuid, b: ObjectGuid) {
        self.los_blocked.insert((a.min(b), a.max(b)));
    }

    /// Makes the condition check for one rule fail until cleared.
    pub fn fail_conditions(&mut self, entry_or_guid: i64, event_id: u32) {
        self.failing_conditions.insert((entry_or_guid, event_id));
    }

    pub fn clear_conditions(&mut self) {
        self.failing_conditions.clear();
    }

    pub fn set_text_duration(&mut self, entry: u32, group: u32, duration_ms: u32) {
        self.text_durations.insert((entry, group), duration_ms);
    }

    /// Defines the members (entry, offset from the summoner) of a creature summon group.
    pub fn define_summon_group(&mut self, summoner_entry: u32, group: u32, members: Vec<(u32, Position)>) {
        self.summon_groups.insert((summoner_entry, group), members);
    }

    pub fn move_to(&mut self, guid: ObjectGuid, x: f32, y: f32, z: f32) -> Result<(), OracleError> {
        let record = self.record_mut(guid)?;
        record.position = Position::new(x, y, z, record.position.o);
        Ok(())
    }

    /// Commands issued so far, oldest first.
    pub fn commands(&self) -> &[WorldCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<WorldCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn objects(&self) -> impl Iterator<Item = &ObjectRecord> {
        self.objects.values()
    }

    fn get(&self, guid: ObjectGuid) -> Option<&ObjectRecord> {
        self.objects.get(&guid)
    }

    fn apply(&mut self, command: &WorldCommand) {
        use WorldCommand::*;
        let Some(record) = command.subject().and_then(|guid| self.objects.get_mut(&guid)) else {
            return;
        };
        match command {
            SetReactState { state, .. } => record.react_state = *state,
            SetUnitFlag { flag, enabled, .. } => record.unit_flags.set(*flag, *enabled),
            SetNpcFlags { flags, .. } => record.npc_flags = *flags,
            SetDynamicFlags { flags, .. } => record.dynamic_flags = *flags,
            SetFaction { faction, .. } if *faction != 0 => record.faction = *faction,
            SetHomePosition { position, .. } => record.home = *position,
            SetHealthPct { pct, .. } => record.health_pct = *pct as f32,
            SetOrientation { orientation, .. } => record.position.o = *orientation,
            Teleport {
                map_id, position, ..
            } => {
                record.map_id = *map_id;
                record.position = *position;
            }
            Kill { .. } => {
                record.alive = false;
                record.health_pct = 0.0;
            }
            Despawn { delay_ms: 0, .. } => record.in_world = false,
            RemoveAuras { spell: Some(spell), .. } => {
                record.auras.remove(spell);
            }
            RemoveAuras { spell: None, .. } => record.auras.clear(),
            SetRoot { rooted, .. } => record.unit_state.set(UnitState::ROOT, *rooted),
            _ => {}
        }
    }
}

impl UnitOracle for WorldSnapshot {
    fn is_in_world(&self, guid: ObjectGuid) -> bool {
        self.get(guid).is_some_and(|r| r.in_world)
    }

    fn is_alive(&self, guid: ObjectGuid) -> bool {
        self.get(guid).is_some_and(|r| r.in_world && r.alive)
    }

    fn position(&self, guid: ObjectGuid) -> Option<Position> {
        self.get(guid).map(|r| r.position)
    }

    fn map_id(&self, guid: ObjectGuid) -> Option<u32> {
        self.get(guid).map(|r| r.map_id)
    }

    fn in_same_phase(&self, a: ObjectGuid, b: ObjectGuid) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => a.phase_mask & b.phase_mask != 0,
            _ => false,
        }
    }

    fn unit_flags(&self, guid: ObjectGuid) -> UnitFlags {
        self.get(guid).map(|r| r.unit_flags).unwrap_or_default()
    }

    fn unit_state(&self, guid: ObjectGuid) -> UnitState {
        self.get(guid).map(|r| r.unit_state).unwrap_or_default()
    }

    fn is_game_master(&self, guid: ObjectGuid) -> bool {
        self.get(guid).is_some_and(|r| r.game_master)
    }

    fn is_friendly_to(&self, a: ObjectGuid, b: ObjectGuid) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => a.faction == b.faction,
            _ => false,
        }
    }

    fn is_hostile_to(&self, a: ObjectGuid, b: ObjectGuid) -> bool {
        match (self.get(a), self.get(b)) {
            (Some(a), Some(b)) => {
                let key = (a.faction.min(b.faction), a.faction.max(b.faction));
                self.hostile_factions.contains(&key)
            }
            _ => false,
        }
    }

    fn is_combat_disallowed(&self, guid: ObjectGuid) -> bool {
        self.get(guid).is_some_and(|r| r.combat_disallowed)
    }

    fn can_have_threat_list(&self, guid: ObjectGuid) -> bool {
        guid.is_creature() && self.get(guid).is_some_and(|r| !r.pet && !r.trigger)
    }

    fn is_trigger(&self, guid: ObjectGuid) -> bool {
        self.get(guid).is_some_and(|r| r.trigger)
    }

    fn is_pet(&self, guid: ObjectGuid) -> bool {
        self.get(guid).is_some_and(|r| r.pet)
    }

    fn charmer_or_owner_player(&self, guid: ObjectGuid) -> Option<ObjectGuid> {
        if guid.is_player() {
            return Some(guid);
        }
        self.get(guid)
            .and_then(|r| r.charmer_or_owner)
            .filter(ObjectGuid::is_player)
    }

    fn vehicle_base(&self, guid: ObjectGuid) -> Option<ObjectGuid> {
        self.get(guid).and_then(|r| r.vehicle_base)
    }

    fn is_vehicle_accessory(&self, guid: ObjectGuid) -> bool {
        self.get(guid).is_some_and(|r| r.vehicle_accessory)
    }

    fn private_object_owner(&self, guid: ObjectGuid) -> Option<ObjectGuid> {
        self.get(guid).and_then(|r| r.private_owner)
    }

    fn can_see_or_detect(&self, seer: ObjectGuid, target: ObjectGuid) -> bool {
        self.get(target)
            .is_some_and(|r| r.in_world && !r.hidden_from.contains(&seer))
    }

    fn is_valid_attack_target(&self, attacker: ObjectGuid, target: ObjectGuid) -> bool {
        self.is_alive(attacker)
            && self.is_alive(target)
            && !self.is_friendly_to(attacker, target)
            && !self.is_game_master(target)
            && !self
                .unit_flags(target)
                .intersects(UnitFlags::NON_ATTACKABLE | UnitFlags::UNINTERACTIBLE)
    }

    fn is_within_melee_range(&self, attacker: ObjectGuid, target: ObjectGuid) -> bool {
        self.distance(attacker, target)
            .is_some_and(|d| d <= MELEE_RANGE)
    }

    fn melee_school_mask(&self, _guid: ObjectGuid) -> SpellSchoolMask {
        SpellSchoolMask::NORMAL
    }

    fn is_immune_to_damage(&self, guid: ObjectGuid, school: SpellSchoolMask) -> bool {
        self.get(guid)
            .is_some_and(|r| !school.is_empty() && r.immune_schools.contains(school))
    }

    fn has_breakable_stun(&self, guid: ObjectGuid) -> bool {
        self.get(guid).is_some_and(|r| r.breakable_stun)
    }

    fn taunt_auras(&self, guid: ObjectGuid) -> Vec<TauntAura> {
        let mut auras = self.get(guid).map(|r| r.taunts.clone()).unwrap_or_default();
        auras.sort_by_key(|aura| aura.applied_at);
        auras
    }

    fn detaunt_auras(&self, guid: ObjectGuid) -> Vec<TauntAura> {
        let mut auras = self
            .get(guid)
            .map(|r| r.detaunts.clone())
            .unwrap_or_default();
        auras.sort_by_key(|aura| aura.applied_at);
        auras
    }

    fn threat_multiplier(&self, generator: ObjectGuid, _school: SpellSchoolMask) -> f32 {
        self.get(generator).map_or(1.0, |r| r.threat_multiplier)
    }
}

impl WorldOracle for WorldSnapshot {
    fn as_units(&self) -> &dyn UnitOracle {
        self
    }

    fn health_pct(&self, guid: ObjectGuid) -> Option<f32> {
        self.get(guid).filter(|r| r.guid.is_unit()).map(|r| r.health_pct)
    }

    fn power_type(&self, guid: ObjectGuid) -> Option<PowerType> {
        self.get(guid).and_then(|r| r.power_type)
    }

    fn power_pct(&self, guid: ObjectGuid, power: PowerType) -> Option<f32> {
        self.get(guid)
            .filter(|r| r.power_type == Some(power))
            .map(|r| r.power_pct)
    }

    fn zone_id(&self, guid: ObjectGuid) -> Option<u32> {
        self.get(guid).map(|r| r.zone_id)
    }

    fn area_id(&self, guid: ObjectGuid) -> Option<u32> {
        self.get(guid).map(|r| r.area_id)
    }

    fn difficulty(&self, guid: ObjectGuid) -> u8 {
        self.get(guid).map_or(0, |r| r.difficulty)
    }

    fn react_state(&self, guid: ObjectGuid) -> ReactState {
        self.get(guid).map(|r| r.react_state).unwrap_or_default()
    }

    fn npc_flags(&self, guid: ObjectGuid) -> NpcFlags {
        self.get(guid).map(|r| r.npc_flags).unwrap_or_default()
    }

    fn dynamic_flags(&self, guid: ObjectGuid) -> DynamicFlags {
        self.get(guid).map(|r| r.dynamic_flags).unwrap_or_default()
    }

    fn is_charmed(&self, guid: ObjectGuid) -> bool {
        self.get(guid).is_some_and(|r| r.charmed)
    }

    fn charmer_or_owner(&self, guid: ObjectGuid) -> Option<ObjectGuid> {
        self.get(guid).and_then(|r| r.charmer_or_owner)
    }

    fn summoner(&self, guid: ObjectGuid) -> Option<ObjectGuid> {
        self.get(guid).and_then(|r| r.summoner)
    }

    fn creator(&self, guid: ObjectGuid) -> Option<ObjectGuid> {
        self.get(guid).and_then(|r| r.creator)
    }

    fn group_members(&self, player: ObjectGuid) -> Vec<ObjectGuid> {
        let Some(group) = self.get(player).and_then(|r| r.group) else {
            return Vec::new();
        };
        self.objects
            .values()
            .filter(|r| r.guid.is_player() && r.group == Some(group))
            .map(|r| r.guid)
            .collect()
    }

    fn vehicle_passengers(&self, vehicle: ObjectGuid) -> Vec<(u8, ObjectGuid)> {
        self.get(vehicle)
            .map(|r| r.passengers.clone())
            .unwrap_or_default()
    }

    fn loot_recipients(&self, guid: ObjectGuid) -> Vec<ObjectGuid> {
        self.get(guid)
            .map(|r| r.loot_recipients.clone())
            .unwrap_or_default()
    }

    fn aura_count(&self, guid: ObjectGuid, spell: u32) -> u32 {
        self.get(guid)
            .and_then(|r| r.auras.get(&spell).copied())
            .unwrap_or(0)
    }

    fn current_cast(&self, guid: ObjectGuid) -> Option<u32> {
        self.get(guid).and_then(|r| r.casting)
    }

    fn is_within_los(&self, a: ObjectGuid, b: ObjectGuid) -> bool {
        !self.los_blocked.contains(&(a.min(b), a.max(b)))
    }

    fn search(&self, query: &ObjectSearch) -> Vec<ObjectGuid> {
        let Some(origin) = self.get(query.origin) else {
            return Vec::new();
        };
        self.objects
            .values()
            .filter(|r| r.in_world && r.map_id == origin.map_id)
            .filter(|r| query.kind.matches(r.guid.kind()))
            .filter(|r| query.entry.is_none_or(|entry| r.guid.entry() == entry))
            .filter(|r| query.alive.accepts(r.alive))
            .filter(|r| {
                let distance = origin.position.distance(&r.position);
                distance >= query.min_range && distance <= query.max_range
            })
            .map(|r| r.guid)
            .collect()
    }

    fn find_spawn(&self, kind: ObjectKind, spawn_id: u64) -> Option<ObjectGuid> {
        self.objects
            .values()
            .find(|r| r.guid.kind() == kind && r.guid.counter() == spawn_id && r.in_world)
            .map(|r| r.guid)
    }

    fn is_spawned(&self, guid: ObjectGuid) -> bool {
        self.get(guid).is_some_and(|r| r.in_world && r.spawned)
    }

    fn conditions_met(
        &self,
        source: &ConditionSource,
        _invoker: Option<ObjectGuid>,
        _base: Option<ObjectGuid>,
    ) -> bool {
        !self
            .failing_conditions
            .contains(&(source.entry_or_guid, source.event_id))
    }

    fn has_instance_script(&self, guid: ObjectGuid) -> bool {
        self.get(guid).is_some_and(|r| r.instance_script)
    }

    fn home_position(&self, guid: ObjectGuid) -> Option<Position> {
        self.get(guid).map(|r| r.home)
    }

    fn text_duration(&self, speaker: ObjectGuid, group: u32) -> Option<u32> {
        self.text_durations.get(&(speaker.entry(), group)).copied()
    }

    fn summon(&mut self, request: &SummonRequest) -> Option<ObjectGuid> {
        self.next_summon_counter += 1;
        let guid = match request.kind {
            SummonKind::Creature => ObjectGuid::creature(request.entry, self.next_summon_counter),
            SummonKind::GameObject => {
                ObjectGuid::game_object(request.entry, self.next_summon_counter)
            }
        };
        let map_id = self.map_id(request.summoner).unwrap_or(0);
        let mut record = ObjectRecord::new(guid);
        record.position = request.position;
        record.home = request.position;
        record.map_id = map_id;
        record.summoner = Some(request.summoner);
        record.private_owner = request.private_for;
        self.objects.insert(guid, record);
        Some(guid)
    }

    fn summon_creature_group(&mut self, summoner: ObjectGuid, group: u32) -> Vec<ObjectGuid> {
        let Some(origin) = self.position(summoner) else {
            return Vec::new();
        };
        let members = self
            .summon_groups
            .get(&(summoner.entry(), group))
            .cloned()
            .unwrap_or_default();
        members
            .into_iter()
            .filter_map(|(entry, offset)| {
                self.summon(&SummonRequest {
                    summoner,
                    kind: SummonKind::Creature,
                    entry,
                    position: origin.translated(&offset),
                    summon_type: 0,
                    duration_ms: 0,
                    private_for: None,
                })
            })
            .collect()
    }

    fn issue(&mut self, command: WorldCommand) {
        tracing::trace!(?command, "world command");
        self.apply(&command);
        self.commands.push(command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::SearchKind;

    #[test]
    fn players_and_monsters_are_hostile() {
        let player = ObjectGuid::player(1);
        let wolf = ObjectGuid::creature(100, 1);
        let world = WorldSnapshot::new()
            .with(ObjectRecord::player(1))
            .with(ObjectRecord::creature(100, 1));
        assert!(world.is_hostile_to(player, wolf));
        assert!(!world.is_friendly_to(player, wolf));
        assert!(world.is_valid_attack_target(wolf, player));
    }

    #[test]
    fn search_respects_range_and_entry() {
        let origin = ObjectGuid::creature(100, 1);
        let world = WorldSnapshot::new()
            .with(ObjectRecord::creature(100, 1))
            .with(ObjectRecord::creature(200, 2).at(10.0, 0.0, 0.0))
            .with(ObjectRecord::creature(200, 3).at(50.0, 0.0, 0.0))
            .with(ObjectRecord::player(1).at(5.0, 0.0, 0.0));
        let found =
            world.search(&ObjectSearch::around(origin, SearchKind::CREATURE, 20.0).with_entry(200));
        assert_eq!(found, vec![ObjectGuid::creature(200, 2)]);
    }

    #[test]
    fn issued_commands_are_recorded_and_applied() {
        let wolf = ObjectGuid::creature(100, 1);
        let mut world = WorldSnapshot::new().with(ObjectRecord::creature(100, 1));
        world.issue(WorldCommand::Kill {
            victim: wolf,
            killer: None,
        });
        assert!(!world.is_alive(wolf));
        assert_eq!(world.commands().len(), 1);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut world = WorldSnapshot::new();
        assert!(world.insert(ObjectRecord::player(1)).is_ok());
        assert_eq!(
            world.insert(ObjectRecord::player(1)),
            Err(OracleError::DuplicateObject(ObjectGuid::player(1)))
        );
    }
}
