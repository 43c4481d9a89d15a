//! Pairwise combat relationships.
use std::collections::BTreeMap;

use game_core::{ObjectGuid, UnitFlags, UnitOracle};

use crate::notice::CombatNotice;
use crate::reference::{CombatRefId, CombatReference};
use crate::world::CombatWorld;

/// Per-agent index of the combat references an agent participates in.
#[derive(Clone, Debug)]
pub struct CombatManager {
    owner: ObjectGuid,
    pub(crate) pve_refs: BTreeMap<ObjectGuid, CombatRefId>,
    pub(crate) pvp_refs: BTreeMap<ObjectGuid, CombatRefId>,
    pub(crate) in_combat: bool,
}

impl CombatManager {
    pub(crate) fn new(owner: ObjectGuid) -> Self {
        Self {
            owner,
            pve_refs: BTreeMap::new(),
            pvp_refs: BTreeMap::new(),
            in_combat: false,
        }
    }

    pub fn owner(&self) -> ObjectGuid {
        self.owner
    }

    /// Aggregate combat flag as of the last state update.
    pub fn is_in_combat(&self) -> bool {
        self.in_combat
    }

    pub fn is_in_combat_with(&self, who: ObjectGuid) -> bool {
        self.pve_refs.contains_key(&who) || self.pvp_refs.contains_key(&who)
    }

    pub fn has_pve_combat(&self) -> bool {
        !self.pve_refs.is_empty()
    }

    pub fn reference_to(&self, who: ObjectGuid) -> Option<CombatRefId> {
        self.pve_refs
            .get(&who)
            .or_else(|| self.pvp_refs.get(&who))
            .copied()
    }

    /// Every agent this one holds a reference to, PvE first.
    pub fn opponents(&self) -> impl Iterator<Item = ObjectGuid> + '_ {
        self.pve_refs.keys().chain(self.pvp_refs.keys()).copied()
    }

    pub fn pve_opponents(&self) -> impl Iterator<Item = ObjectGuid> + '_ {
        self.pve_refs.keys().copied()
    }

    pub fn pvp_opponents(&self) -> impl Iterator<Item = ObjectGuid> + '_ {
        self.pvp_refs.keys().copied()
    }
}

/// Whether `a` and `b` may start fighting each other.
pub fn can_begin_combat(units: &dyn UnitOracle, a: ObjectGuid, b: ObjectGuid) -> bool {
    if a == b {
        return false;
    }
    if !units.is_in_world(a) || !units.is_in_world(b) {
        return false;
    }
    if !units.is_alive(a) || !units.is_alive(b) {
        return false;
    }
    if units.map_id(a) != units.map_id(b) || !units.in_same_phase(a, b) {
        return false;
    }
    if units.is_in_evade_mode(a) || units.is_in_evade_mode(b) {
        return false;
    }
    if units.is_in_flight(a) || units.is_in_flight(b) {
        return false;
    }
    if units.is_combat_disallowed(a) || units.is_combat_disallowed(b) {
        return false;
    }
    if units.is_friendly_to(a, b) || units.is_friendly_to(b, a) {
        return false;
    }
    let game_master = |guid| {
        units
            .charmer_or_owner_player(guid)
            .is_some_and(|player| units.is_game_master(player))
    };
    !game_master(a) && !game_master(b)
}

impl CombatWorld {
    pub fn is_in_combat(&self, guid: ObjectGuid) -> bool {
        self.agents.get(&guid).is_some_and(|a| a.combat.in_combat)
    }

    pub fn is_in_combat_with(&self, a: ObjectGuid, b: ObjectGuid) -> bool {
        self.agents
            .get(&a)
            .is_some_and(|agent| agent.combat.is_in_combat_with(b))
    }

    pub fn has_pve_combat(&self, guid: ObjectGuid) -> bool {
        self.agents
            .get(&guid)
            .is_some_and(|agent| agent.combat.has_pve_combat())
    }

    /// PvP combat that is not suppressed on this agent's side.
    pub fn has_pvp_combat(&self, guid: ObjectGuid) -> bool {
        self.agents.get(&guid).is_some_and(|agent| {
            agent.combat.pvp_refs.values().any(|id| {
                self.combat_refs
                    .get(id)
                    .is_some_and(|r| !r.is_suppressed_for(guid))
            })
        })
    }

    pub fn has_combat(&self, guid: ObjectGuid) -> bool {
        self.has_pve_combat(guid) || self.has_pvp_combat(guid)
    }

    /// Some agent `guid` is fighting, PvE preferred.
    pub fn any_target(&self, guid: ObjectGuid) -> Option<ObjectGuid> {
        let agent = self.agents.get(&guid)?;
        agent
            .combat
            .pve_refs
            .keys()
            .next()
            .or_else(|| agent.combat.pvp_refs.keys().next())
            .copied()
    }

    pub fn set_in_combat_with(
        &mut self,
        units: &dyn UnitOracle,
        owner: ObjectGuid,
        who: ObjectGuid,
    ) -> bool {
        self.set_in_combat_with_ext(units, owner, who, false)
    }

    /// Starts or refreshes combat between `owner` and `who`.
    ///
    /// With `add_suppressed`, a newly created PvP reference starts suppressed
    /// on the owner's side.
    pub fn set_in_combat_with_ext(
        &mut self,
        units: &dyn UnitOracle,
        owner: ObjectGuid,
        who: ObjectGuid,
        add_suppressed: bool,
    ) -> bool {
        if let Some(id) = self.agents.get(&owner).and_then(|a| a.combat.pvp_refs.get(&who)) {
            let id = *id;
            let timeout = self.pvp_timeout_ms;
            let mut unsuppressed = false;
            if let Some(reference) = self.combat_refs.get_mut(&id) {
                reference.refresh_timer(timeout);
                if !add_suppressed && reference.is_suppressed_for(owner) {
                    reference.unsuppress_for(owner);
                    unsuppressed = true;
                }
            }
            if unsuppressed && self.refresh_combat_state(owner) == Some(true) {
                self.notices.push(CombatNotice::EnteredCombat {
                    agent: owner,
                    enemy: who,
                });
            }
            return true;
        }
        if self
            .agents
            .get(&owner)
            .is_some_and(|a| a.combat.pve_refs.contains_key(&who))
        {
            return true;
        }

        if !can_begin_combat(units, owner, who) {
            tracing::trace!(%owner, %who, "combat refused");
            return false;
        }

        let pvp = units.is_player_controlled(owner) && units.is_player_controlled(who);
        let mut reference = CombatReference::new(owner, who, pvp, self.pvp_timeout_ms);
        if add_suppressed && pvp {
            reference.suppress_for(owner);
        }
        let id = self.next_combat_id();
        self.combat_refs.insert(id, reference);
        self.put_reference(owner, who, id, pvp);
        self.put_reference(who, owner, id, pvp);
        tracing::debug!(%owner, %who, pvp, "combat reference created");

        let owner_entered = self.refresh_combat_state(owner) == Some(true);
        let other_entered = self.refresh_combat_state(who) == Some(true);
        if owner_entered {
            self.notices.push(CombatNotice::EnteredCombat {
                agent: owner,
                enemy: who,
            });
        }
        if other_entered {
            self.notices.push(CombatNotice::EnteredCombat {
                agent: who,
                enemy: owner,
            });
        }
        self.is_in_combat_with(owner, who)
    }

    fn put_reference(&mut self, owner: ObjectGuid, other: ObjectGuid, id: CombatRefId, pvp: bool) {
        let combat = &mut self.agent_mut(owner).combat;
        let refs = if pvp {
            &mut combat.pvp_refs
        } else {
            &mut combat.pve_refs
        };
        if let Some(previous) = refs.insert(other, id) {
            debug_assert!(false, "duplicate combat reference {owner} -> {other}");
            tracing::error!(%owner, %other, ?previous, "duplicate combat reference replaced");
        }
    }

    /// Recomputes the aggregate combat flag; returns the new value if it flipped.
    fn refresh_combat_state(&mut self, owner: ObjectGuid) -> Option<bool> {
        let state = self.has_combat(owner);
        let agent = self.agents.get_mut(&owner)?;
        if agent.combat.in_combat == state {
            return None;
        }
        agent.combat.in_combat = state;
        tracing::debug!(agent = %owner, in_combat = state, "combat state changed");
        Some(state)
    }

    /// Ends one combat relationship, clearing threat in both directions first.
    pub fn end_combat(&mut self, units: &dyn UnitOracle, id: CombatRefId) {
        let Some((first, second, pvp)) = self
            .combat_refs
            .get(&id)
            .map(|r| (r.first, r.second, r.pvp))
        else {
            return;
        };

        self.clear_threat(units, first, second);
        self.clear_threat(units, second, first);

        self.combat_refs.remove(&id);
        for (owner, other) in [(first, second), (second, first)] {
            if let Some(agent) = self.agents.get_mut(&owner) {
                if pvp {
                    agent.combat.pvp_refs.remove(&other);
                } else {
                    agent.combat.pve_refs.remove(&other);
                }
            }
        }
        tracing::debug!(%first, %second, pvp, "combat reference ended");

        let first_exited = self.refresh_combat_state(first) == Some(false);
        let second_exited = self.refresh_combat_state(second) == Some(false);
        if first_exited {
            self.notices.push(CombatNotice::ExitedCombat { agent: first });
        }
        if second_exited {
            self.notices.push(CombatNotice::ExitedCombat { agent: second });
        }
    }

    pub fn end_combat_between(&mut self, units: &dyn UnitOracle, a: ObjectGuid, b: ObjectGuid) {
        if let Some(id) = self.agents.get(&a).and_then(|agent| agent.combat.reference_to(b)) {
            self.end_combat(units, id);
        }
    }

    pub fn end_all_pve_combat(&mut self, units: &dyn UnitOracle, owner: ObjectGuid) {
        // threat cannot outlive combat
        self.remove_me_from_threat_lists(units, owner);
        self.clear_all_threat(owner);
        while let Some(id) = self.first_reference(owner, false) {
            self.end_combat(units, id);
        }
    }

    pub fn end_all_pvp_combat(&mut self, units: &dyn UnitOracle, owner: ObjectGuid) {
        while let Some(id) = self.first_reference(owner, true) {
            self.end_combat(units, id);
        }
    }

    pub fn end_all_combat(&mut self, units: &dyn UnitOracle, owner: ObjectGuid) {
        self.end_all_pve_combat(units, owner);
        self.end_all_pvp_combat(units, owner);
    }

    fn first_reference(&self, owner: ObjectGuid, pvp: bool) -> Option<CombatRefId> {
        let combat = &self.agents.get(&owner)?.combat;
        let refs = if pvp { &combat.pvp_refs } else { &combat.pve_refs };
        refs.values().next().copied()
    }

    /// Hides the owner's side of every PvP reference without ending them.
    pub fn suppress_pvp_combat(&mut self, owner: ObjectGuid) {
        let ids: Vec<CombatRefId> = match self.agents.get(&owner) {
            Some(agent) => agent.combat.pvp_refs.values().copied().collect(),
            None => return,
        };
        for id in ids {
            if let Some(reference) = self.combat_refs.get_mut(&id) {
                reference.suppress_for(owner);
            }
        }
        if self.refresh_combat_state(owner) == Some(false) {
            self.notices.push(CombatNotice::ExitedCombat { agent: owner });
        }
    }

    /// Ends every relationship that could no longer begin today.
    pub fn revalidate_combat(&mut self, units: &dyn UnitOracle, owner: ObjectGuid) {
        let Some(agent) = self.agents.get(&owner) else {
            return;
        };
        let stale: Vec<CombatRefId> = agent
            .combat
            .pve_refs
            .iter()
            .chain(agent.combat.pvp_refs.iter())
            .filter(|(other, _)| !can_begin_combat(units, owner, **other))
            .map(|(_, id)| *id)
            .collect();
        for id in stale {
            self.end_combat(units, id);
        }
    }

    /// Copies `who`'s combat relationships onto `owner` (charm hand-off).
    pub fn inherit_combat_states_from(
        &mut self,
        units: &dyn UnitOracle,
        owner: ObjectGuid,
        who: ObjectGuid,
    ) {
        let Some(source) = self.agents.get(&who) else {
            return;
        };
        let inherited: Vec<ObjectGuid> = source.combat.opponents().collect();
        let owner_flags = units.unit_flags(owner);
        for target in inherited {
            if self.is_in_combat_with(owner, target) {
                continue;
            }
            let player_controlled = units.is_player_controlled(target);
            if (owner_flags.contains(UnitFlags::IMMUNE_TO_PC) && player_controlled)
                || (owner_flags.contains(UnitFlags::IMMUNE_TO_NPC) && !player_controlled)
            {
                continue;
            }
            self.set_in_combat_with(units, owner, target);
        }
    }

    /// Decays PvP references owned (as first party) by `owner`.
    pub(crate) fn update_combat(&mut self, units: &dyn UnitOracle, owner: ObjectGuid, diff: u32) {
        let Some(agent) = self.agents.get(&owner) else {
            return;
        };
        let ids: Vec<CombatRefId> = agent.combat.pvp_refs.values().copied().collect();
        let mut expired = Vec::new();
        for id in ids {
            if let Some(reference) = self.combat_refs.get_mut(&id) {
                if reference.first == owner && !reference.tick(diff) {
                    expired.push(id);
                }
            }
        }
        for id in expired {
            tracing::debug!(agent = %owner, "pvp combat timed out");
            self.end_combat(units, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{ObjectRecord, UnitState, WorldSnapshot};

    fn wolf() -> ObjectGuid {
        ObjectGuid::creature(100, 1)
    }

    fn hero() -> ObjectGuid {
        ObjectGuid::player(1)
    }

    fn world() -> WorldSnapshot {
        WorldSnapshot::new()
            .with(ObjectRecord::creature(100, 1))
            .with(ObjectRecord::player(1).at(3.0, 0.0, 0.0))
            .with(ObjectRecord::player(2).at(4.0, 0.0, 0.0).with_faction(2))
    }

    #[test]
    fn combat_is_symmetric_and_notifies_both_sides() {
        let units = world();
        let mut combat = CombatWorld::default();
        assert!(combat.set_in_combat_with(&units, wolf(), hero()));
        assert!(combat.is_in_combat(wolf()));
        assert!(combat.is_in_combat(hero()));
        assert!(combat.is_in_combat_with(hero(), wolf()));
        assert_eq!(
            combat.take_notices(),
            vec![
                CombatNotice::EnteredCombat {
                    agent: wolf(),
                    enemy: hero()
                },
                CombatNotice::EnteredCombat {
                    agent: hero(),
                    enemy: wolf()
                },
            ]
        );
        assert!(combat.check_invariants().is_ok());
    }

    #[test]
    fn refreshing_existing_combat_is_silent() {
        let units = world();
        let mut combat = CombatWorld::default();
        combat.set_in_combat_with(&units, wolf(), hero());
        combat.take_notices();
        assert!(combat.set_in_combat_with(&units, hero(), wolf()));
        assert!(combat.take_notices().is_empty());
    }

    #[test]
    fn refuses_evading_dead_or_friendly_units() {
        let mut units = world();
        let mut combat = CombatWorld::default();

        units.record_mut(wolf()).unwrap().unit_state = UnitState::EVADE;
        assert!(!combat.set_in_combat_with(&units, wolf(), hero()));

        units.record_mut(wolf()).unwrap().unit_state = UnitState::empty();
        units.record_mut(hero()).unwrap().faction = game_core::env::MONSTER_FACTION;
        assert!(!combat.set_in_combat_with(&units, wolf(), hero()));

        assert!(!combat.set_in_combat_with(&units, wolf(), wolf()));
        assert!(!combat.is_in_combat(wolf()));
        assert!(combat.take_notices().is_empty());
    }

    #[test]
    fn game_masters_never_enter_combat() {
        let mut units = world();
        units.record_mut(hero()).unwrap().game_master = true;
        let mut combat = CombatWorld::default();
        assert!(!combat.set_in_combat_with(&units, wolf(), hero()));
    }

    #[test]
    fn pvp_reference_decays_from_first_side_only() {
        let units = world();
        let mut combat = CombatWorld::new(&game_core::EngineConfig::new().with_pvp_combat_timeout(100));
        let rival = ObjectGuid::player(2);
        assert!(combat.set_in_combat_with(&units, hero(), rival));
        let id = combat.combat_manager(hero()).and_then(|m| m.reference_to(rival)).unwrap();
        assert!(combat.combat_reference(id).unwrap().is_pvp());

        // the second party ticking does not decrement
        combat.update_agent(&units, rival, 90);
        assert_eq!(combat.combat_reference(id).unwrap().pvp_timer(), 100);

        combat.update_agent(&units, hero(), 60);
        assert!(combat.is_in_combat(hero()));
        combat.update_agent(&units, hero(), 40);
        assert!(!combat.is_in_combat(hero()));
        assert!(!combat.is_in_combat(rival));
        assert!(combat.check_invariants().is_ok());
    }

    #[test]
    fn suppression_leaves_combat_state_but_keeps_reference() {
        let units = world();
        let mut combat = CombatWorld::default();
        let rival = ObjectGuid::player(2);
        combat.set_in_combat_with(&units, hero(), rival);
        combat.take_notices();

        combat.suppress_pvp_combat(hero());
        assert!(!combat.is_in_combat(hero()));
        assert!(combat.is_in_combat(rival));
        assert!(combat.is_in_combat_with(hero(), rival));
        assert_eq!(
            combat.take_notices(),
            vec![CombatNotice::ExitedCombat { agent: hero() }]
        );

        // renewed aggression lifts suppression
        combat.set_in_combat_with(&units, hero(), rival);
        assert!(combat.is_in_combat(hero()));
    }

    #[test]
    fn revalidate_ends_combat_after_death() {
        let mut units = world();
        let mut combat = CombatWorld::default();
        combat.set_in_combat_with(&units, wolf(), hero());
        units.record_mut(hero()).unwrap().alive = false;
        combat.revalidate_combat(&units, wolf());
        assert!(!combat.is_in_combat(wolf()));
        assert!(!combat.is_in_combat(hero()));
    }

    #[test]
    fn inherit_copies_relationships_respecting_immunity() {
        let units = world()
            .with(ObjectRecord::creature(200, 2).with_faction(2))
            .with(ObjectRecord::creature(300, 3).with_faction(2).with_unit_flags(UnitFlags::IMMUNE_TO_PC));
        let mut combat = CombatWorld::default();
        combat.set_in_combat_with(&units, wolf(), hero());

        let ally = ObjectGuid::creature(200, 2);
        combat.inherit_combat_states_from(&units, ally, wolf());
        assert!(combat.is_in_combat_with(ally, hero()));

        let immune = ObjectGuid::creature(300, 3);
        combat.inherit_combat_states_from(&units, immune, wolf());
        assert!(!combat.is_in_combat_with(immune, hero()));
        assert!(combat.check_invariants().is_ok());
    }
}
