//! Traits describing the host world.
//!
//! The engines never own units. They observe them through [`UnitOracle`]
//! (the narrow surface combat bookkeeping needs) and [`WorldOracle`] (the
//! wider surface scripts need), and they change the world only by issuing
//! [`WorldCommand`]s.
mod command;
mod error;
mod query;
mod rng;
mod snapshot;

pub use command::WorldCommand;
pub use error::OracleError;
pub use query::{
    AliveFilter, ConditionSource, ObjectSearch, SearchKind, SummonKind, SummonRequest, TauntAura,
};
pub use rng::{ScriptRng, compute_seed};
pub use snapshot::{MONSTER_FACTION, ObjectRecord, PLAYER_FACTION, WorldSnapshot};

use crate::guid::ObjectGuid;
use crate::position::Position;
use crate::spell::SpellSchoolMask;
use crate::unit::{DynamicFlags, NpcFlags, PowerType, ReactState, UnitFlags, UnitState};

/// Read-only unit queries used by combat and threat bookkeeping.
pub trait UnitOracle {
    fn is_in_world(&self, guid: ObjectGuid) -> bool;

    fn is_alive(&self, guid: ObjectGuid) -> bool;

    fn position(&self, guid: ObjectGuid) -> Option<Position>;

    fn map_id(&self, guid: ObjectGuid) -> Option<u32>;

    fn in_same_phase(&self, a: ObjectGuid, b: ObjectGuid) -> bool;

    fn unit_flags(&self, guid: ObjectGuid) -> UnitFlags;

    fn unit_state(&self, guid: ObjectGuid) -> UnitState;

    fn is_game_master(&self, guid: ObjectGuid) -> bool;

    fn is_friendly_to(&self, a: ObjectGuid, b: ObjectGuid) -> bool;

    fn is_hostile_to(&self, a: ObjectGuid, b: ObjectGuid) -> bool;

    fn is_combat_disallowed(&self, guid: ObjectGuid) -> bool;

    /// Pets and triggers are creatures but never hold a threat list.
    fn can_have_threat_list(&self, guid: ObjectGuid) -> bool;

    fn is_trigger(&self, guid: ObjectGuid) -> bool;

    fn is_pet(&self, guid: ObjectGuid) -> bool;

    /// Player, or a unit whose charmer or owner is a player.
    fn charmer_or_owner_player(&self, guid: ObjectGuid) -> Option<ObjectGuid>;

    fn vehicle_base(&self, guid: ObjectGuid) -> Option<ObjectGuid>;

    fn is_vehicle_accessory(&self, guid: ObjectGuid) -> bool;

    /// Summoner of a personal (summoner-only visible) spawn.
    fn private_object_owner(&self, guid: ObjectGuid) -> Option<ObjectGuid>;

    fn can_see_or_detect(&self, seer: ObjectGuid, target: ObjectGuid) -> bool;

    /// Whether `attacker` may currently attack `target`.
    fn is_valid_attack_target(&self, attacker: ObjectGuid, target: ObjectGuid) -> bool;

    fn is_within_melee_range(&self, attacker: ObjectGuid, target: ObjectGuid) -> bool;

    fn melee_school_mask(&self, guid: ObjectGuid) -> SpellSchoolMask;

    fn is_immune_to_damage(&self, guid: ObjectGuid, school: SpellSchoolMask) -> bool;

    /// Stun-family effect that breaks on damage.
    fn has_breakable_stun(&self, guid: ObjectGuid) -> bool;

    /// Taunt auras on `guid`, oldest first.
    fn taunt_auras(&self, guid: ObjectGuid) -> Vec<TauntAura>;

    /// Detaunt auras on `guid`, oldest first.
    fn detaunt_auras(&self, guid: ObjectGuid) -> Vec<TauntAura>;

    /// Multiplier applied to threat generated by `generator`.
    fn threat_multiplier(&self, generator: ObjectGuid, school: SpellSchoolMask) -> f32;

    fn distance(&self, a: ObjectGuid, b: ObjectGuid) -> Option<f32> {
        Some(self.position(a)?.distance(&self.position(b)?))
    }

    fn is_in_evade_mode(&self, guid: ObjectGuid) -> bool {
        self.unit_state(guid).contains(UnitState::EVADE)
    }

    fn is_in_flight(&self, guid: ObjectGuid) -> bool {
        self.unit_state(guid).contains(UnitState::IN_FLIGHT)
    }

    fn is_confused(&self, guid: ObjectGuid) -> bool {
        self.unit_state(guid).contains(UnitState::CONFUSED)
    }

    fn is_player_controlled(&self, guid: ObjectGuid) -> bool {
        guid.is_player()
            || self
                .unit_flags(guid)
                .contains(UnitFlags::PLAYER_CONTROLLED)
    }
}

/// The full world surface scripts observe and command.
pub trait WorldOracle: UnitOracle {
    /// Upcast used where only unit queries are needed.
    fn as_units(&self) -> &dyn UnitOracle;

    // ===== queries =====
    fn health_pct(&self, guid: ObjectGuid) -> Option<f32>;

    fn power_type(&self, guid: ObjectGuid) -> Option<PowerType>;

    fn power_pct(&self, guid: ObjectGuid, power: PowerType) -> Option<f32>;

    fn zone_id(&self, guid: ObjectGuid) -> Option<u32>;

    fn area_id(&self, guid: ObjectGuid) -> Option<u32>;

    /// Difficulty index of the object's map.
    fn difficulty(&self, guid: ObjectGuid) -> u8;

    fn react_state(&self, guid: ObjectGuid) -> ReactState;

    fn npc_flags(&self, guid: ObjectGuid) -> NpcFlags;

    fn dynamic_flags(&self, guid: ObjectGuid) -> DynamicFlags;

    fn is_charmed(&self, guid: ObjectGuid) -> bool;

    fn charmer_or_owner(&self, guid: ObjectGuid) -> Option<ObjectGuid>;

    fn summoner(&self, guid: ObjectGuid) -> Option<ObjectGuid>;

    fn creator(&self, guid: ObjectGuid) -> Option<ObjectGuid>;

    /// Members of the player's group, the player included; empty when ungrouped.
    fn group_members(&self, player: ObjectGuid) -> Vec<ObjectGuid>;

    fn vehicle_passengers(&self, vehicle: ObjectGuid) -> Vec<(u8, ObjectGuid)>;

    fn loot_recipients(&self, guid: ObjectGuid) -> Vec<ObjectGuid>;

    fn aura_count(&self, guid: ObjectGuid, spell: u32) -> u32;

    fn has_aura(&self, guid: ObjectGuid, spell: u32) -> bool {
        self.aura_count(guid, spell) > 0
    }

    /// Spell currently being cast (non-melee), if any.
    fn current_cast(&self, guid: ObjectGuid) -> Option<u32>;

    fn is_within_los(&self, a: ObjectGuid, b: ObjectGuid) -> bool;

    fn search(&self, query: &ObjectSearch) -> Vec<ObjectGuid>;

    fn find_spawn(&self, kind: crate::guid::ObjectKind, spawn_id: u64) -> Option<ObjectGuid>;

    /// Game objects can be present but unspawned (waiting for respawn).
    fn is_spawned(&self, guid: ObjectGuid) -> bool;

    /// Evaluates the external condition store for a rule.
    fn conditions_met(
        &self,
        source: &ConditionSource,
        invoker: Option<ObjectGuid>,
        base: Option<ObjectGuid>,
    ) -> bool;

    fn has_instance_script(&self, guid: ObjectGuid) -> bool;

    fn home_position(&self, guid: ObjectGuid) -> Option<Position>;

    /// Duration of a creature text group line, in milliseconds.
    fn text_duration(&self, speaker: ObjectGuid, group: u32) -> Option<u32>;

    // ===== commands =====
    fn summon(&mut self, request: &SummonRequest) -> Option<ObjectGuid>;

    /// Spawns the creature summon group `group` defined for the summoner's entry.
    fn summon_creature_group(&mut self, summoner: ObjectGuid, group: u32) -> Vec<ObjectGuid>;

    fn issue(&mut self, command: WorldCommand);
}
