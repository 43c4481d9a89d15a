//! Threat lists and victim selection.
use std::collections::BTreeMap;

use game_core::{EngineConfig, ObjectGuid, SpellAttributes, SpellInfo, SpellSchoolMask, UnitOracle};

use crate::notice::{CombatNotice, ThreatUpdate};
use crate::reference::{OnlineState, TauntState, ThreatRefId, ThreatReference, rank, ranks_below};
use crate::world::CombatWorld;

/// Per-agent threat bookkeeping.
///
/// `entries` is this agent's own threat list (who threatens it), and
/// `threatened_by_me` indexes the lists of other agents this one is on.
#[derive(Clone, Debug)]
pub struct ThreatManager {
    owner: ObjectGuid,
    pub(crate) sorted: Vec<ThreatRefId>,
    pub(crate) entries: BTreeMap<ObjectGuid, ThreatRefId>,
    pub(crate) threatened_by_me: BTreeMap<ObjectGuid, ThreatRefId>,
    pub(crate) current_victim: Option<ThreatRefId>,
    pub(crate) fixate: Option<ThreatRefId>,
    pub(crate) update_timer: u32,
    pub(crate) needs_client_update: bool,
    pub(crate) pending_ai: Vec<ObjectGuid>,
    /// spell -> (victim -> percent)
    pub(crate) redirect_registry: BTreeMap<u32, BTreeMap<ObjectGuid, u32>>,
    pub(crate) redirect_info: Vec<(ObjectGuid, u32)>,
}

impl ThreatManager {
    pub(crate) fn new(owner: ObjectGuid) -> Self {
        Self {
            owner,
            sorted: Vec::new(),
            entries: BTreeMap::new(),
            threatened_by_me: BTreeMap::new(),
            current_victim: None,
            fixate: None,
            update_timer: 0,
            needs_client_update: false,
            pending_ai: Vec::new(),
            redirect_registry: BTreeMap::new(),
            redirect_info: Vec::new(),
        }
    }

    pub fn owner(&self) -> ObjectGuid {
        self.owner
    }

    pub fn threat_list_size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_threat_list_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Agents whose threat lists this agent is on.
    pub fn threatened_by_me(&self) -> impl Iterator<Item = ObjectGuid> + '_ {
        self.threatened_by_me.keys().copied()
    }

    /// Effective redirections, capped at 100% in registration order.
    pub fn redirects(&self) -> &[(ObjectGuid, u32)] {
        &self.redirect_info
    }

    fn rebuild_redirects(&mut self) {
        self.redirect_info.clear();
        let mut total = 0;
        for victims in self.redirect_registry.values() {
            for (victim, pct) in victims {
                let share = (*pct).min(EngineConfig::REDIRECT_PCT_CAP - total);
                if share == 0 {
                    continue;
                }
                self.redirect_info.push((*victim, share));
                total += share;
                if total == EngineConfig::REDIRECT_PCT_CAP {
                    return;
                }
            }
        }
    }
}

impl CombatWorld {
    // ===== queries =====

    /// Owners are engaged while they hold threat or are in combat.
    pub fn is_engaged(&self, guid: ObjectGuid) -> bool {
        self.agents
            .get(&guid)
            .is_some_and(|a| !a.threat.entries.is_empty() || a.combat.in_combat)
    }

    pub fn threat(&self, owner: ObjectGuid, victim: ObjectGuid, include_offline: bool) -> f32 {
        self.reference(owner, victim)
            .filter(|r| include_offline || r.is_available())
            .map_or(0.0, ThreatReference::threat)
    }

    pub fn is_threatened_by(&self, owner: ObjectGuid, who: ObjectGuid, include_offline: bool) -> bool {
        self.reference(owner, who)
            .is_some_and(|r| include_offline || r.is_available())
    }

    /// Threat list victims, highest rank first.
    pub fn sorted_threat_list(&self, owner: ObjectGuid) -> Vec<ObjectGuid> {
        self.sorted_references(owner).map(|r| r.victim).collect()
    }

    pub fn threat_entries(&self, owner: ObjectGuid) -> Vec<(ObjectGuid, f32)> {
        self.sorted_references(owner)
            .map(|r| (r.victim, r.threat()))
            .collect()
    }

    pub fn threat_list_size(&self, owner: ObjectGuid) -> usize {
        self.agents
            .get(&owner)
            .map_or(0, |a| a.threat.entries.len())
    }

    /// Victim as last selected, without re-evaluating.
    pub fn last_victim(&self, owner: ObjectGuid) -> Option<ObjectGuid> {
        let id = self.agents.get(&owner)?.threat.current_victim?;
        self.threat_refs.get(&id).map(|r| r.victim)
    }

    pub fn fixate_target_of(&self, owner: ObjectGuid) -> Option<ObjectGuid> {
        let id = self.agents.get(&owner)?.threat.fixate?;
        self.threat_refs.get(&id).map(|r| r.victim)
    }

    /// Current victim, reselecting first if there is none or it went offline.
    pub fn current_victim(&mut self, units: &dyn UnitOracle, owner: ObjectGuid) -> Option<ObjectGuid> {
        if !units.can_have_threat_list(owner) {
            return None;
        }
        let current = self.agents.get(&owner)?.threat.current_victim;
        let stale = match current.and_then(|id| self.threat_refs.get(&id)) {
            Some(reference) => reference.should_be_offline(units),
            None => true,
        };
        if stale {
            self.update_victim(units, owner);
        }
        self.last_victim(owner)
    }

    pub(crate) fn reference(&self, owner: ObjectGuid, victim: ObjectGuid) -> Option<&ThreatReference> {
        let id = self.agents.get(&owner)?.threat.entries.get(&victim)?;
        self.threat_refs.get(id)
    }

    fn sorted_references(&self, owner: ObjectGuid) -> impl Iterator<Item = &ThreatReference> + '_ {
        self.agents
            .get(&owner)
            .into_iter()
            .flat_map(|a| a.threat.sorted.iter())
            .filter_map(|id| self.threat_refs.get(id))
    }

    fn redirect_info(&self, guid: ObjectGuid) -> Vec<(ObjectGuid, u32)> {
        self.agents
            .get(&guid)
            .map(|a| a.threat.redirect_info.clone())
            .unwrap_or_default()
    }

    // ===== threat changes =====

    /// Adds threat from `target` onto `owner`'s list.
    #[allow(clippy::too_many_arguments)]
    pub fn add_threat(
        &mut self,
        units: &dyn UnitOracle,
        owner: ObjectGuid,
        target: ObjectGuid,
        amount: f32,
        spell: Option<&SpellInfo>,
        ignore_modifiers: bool,
        ignore_redirects: bool,
    ) {
        if let Some(spell) = spell {
            if spell.has_attribute(SpellAttributes::NO_THREAT) {
                return;
            }
            if !self.is_engaged(owner) && spell.has_attribute(SpellAttributes::NO_INITIAL_THREAT) {
                return;
            }
        }

        let mut target = target;
        let mut amount = amount;

        // riders hand their threat to the vehicle; accessories are part of it
        if let Some(vehicle) = units.vehicle_base(target) {
            self.add_threat(units, owner, vehicle, amount, spell, ignore_modifiers, ignore_redirects);
            if units.is_vehicle_accessory(target) {
                return;
            }
            amount = 0.0;
        }

        if let Some(private_owner) = units.private_object_owner(target) {
            if units.private_object_owner(owner) != Some(private_owner) {
                target = private_owner;
            }
        }

        if !units.can_have_threat_list(owner) {
            if !self.set_in_combat_with(units, owner, target) {
                return;
            }
            for (redirect, _) in self.redirect_info(target) {
                if !self.is_in_combat_with(owner, redirect) {
                    self.set_in_combat_with(units, owner, redirect);
                }
            }
            return;
        }

        if !ignore_modifiers {
            let school = spell.map_or(SpellSchoolMask::NORMAL, |s| s.school_mask);
            amount *= units.threat_multiplier(target, school);
        }

        if !ignore_redirects && amount > 0.0 {
            let original = amount;
            for (redirect, pct) in self.redirect_info(target) {
                if !units.is_in_world(redirect) {
                    continue;
                }
                let slice = original * pct as f32 / 100.0;
                self.add_threat(units, owner, redirect, slice, spell, true, true);
                amount -= slice;
            }
        }

        if !self.set_in_combat_with(units, owner, target) {
            return;
        }

        let existing = self
            .agents
            .get(&owner)
            .and_then(|a| a.threat.entries.get(&target))
            .copied();
        if let Some(id) = existing {
            let mut changed = false;
            if let Some(reference) = self.threat_refs.get_mut(&id) {
                // suppressed references only come back once they cause threat
                if reference.is_suppressed() && !reference.should_be_suppressed(units) {
                    reference.online = OnlineState::Online;
                    changed = true;
                }
                if reference.is_online() {
                    changed |= reference.add_threat(amount);
                }
            }
            if changed {
                self.list_changed(owner);
            }
            return;
        }

        let id = self.next_threat_id();
        self.threat_refs.insert(id, ThreatReference::new(owner, target));
        {
            let threat = &mut self.agent_mut(owner).threat;
            threat.entries.insert(target, id);
            threat.sorted.push(id);
            threat.needs_client_update = true;
        }
        self.agent_mut(target).threat.threatened_by_me.insert(owner, id);
        tracing::debug!(%owner, victim = %target, amount, "threat reference created");

        self.update_offline(units, id);
        if let Some(reference) = self.threat_refs.get_mut(&id) {
            if reference.is_online() {
                reference.add_threat(amount);
            }
        }
        self.resort(owner);

        if self.agents.get(&owner).is_some_and(|a| a.threat.current_victim.is_none()) {
            self.update_victim(units, owner);
        } else {
            self.process_ai_updates(owner);
        }
    }

    pub fn scale_threat(&mut self, owner: ObjectGuid, target: ObjectGuid, factor: f32) {
        let Some(id) = self.agents.get(&owner).and_then(|a| a.threat.entries.get(&target)).copied()
        else {
            return;
        };
        let changed = self
            .threat_refs
            .get_mut(&id)
            .is_some_and(|r| r.scale_threat(factor.max(0.0)));
        if changed {
            self.list_changed(owner);
        }
    }

    /// Scales threat by `100 + pct` percent; `-100` wipes it.
    pub fn modify_threat_by_percent(&mut self, owner: ObjectGuid, target: ObjectGuid, pct: i32) {
        if pct != 0 {
            self.scale_threat(owner, target, 0.01 * (100 + pct) as f32);
        }
    }

    pub fn modify_all_threat_by_percent(&mut self, owner: ObjectGuid, pct: i32) {
        for victim in self.sorted_threat_list(owner) {
            self.modify_threat_by_percent(owner, victim, pct);
        }
    }

    /// Raises `target` to the highest available threat on the list.
    pub fn match_unit_threat_to_highest(
        &mut self,
        units: &dyn UnitOracle,
        owner: ObjectGuid,
        target: ObjectGuid,
    ) {
        let references: Vec<&ThreatReference> = self.sorted_references(owner).take(2).collect();
        let Some(mut highest) = references.first().copied() else {
            return;
        };
        if !highest.is_available() {
            return;
        }
        // a taunting leader may sit above someone with more raw threat
        if highest.is_taunting() {
            if let Some(next) = references.get(1) {
                if next.is_available() && next.threat() > highest.threat() {
                    highest = next;
                }
            }
        }
        let delta = highest.threat() - self.threat(owner, target, true);
        self.add_threat(units, owner, target, delta, None, true, true);
    }

    pub fn reset_all_threat(&mut self, owner: ObjectGuid) {
        let ids: Vec<ThreatRefId> = match self.agents.get(&owner) {
            Some(agent) => agent.threat.entries.values().copied().collect(),
            None => return,
        };
        let mut changed = false;
        for id in ids {
            if let Some(reference) = self.threat_refs.get_mut(&id) {
                changed |= reference.scale_threat(0.0);
            }
        }
        if changed {
            self.list_changed(owner);
        }
    }

    /// Removes `target` from `owner`'s list. Returns false if it was not on it.
    pub fn clear_threat(&mut self, units: &dyn UnitOracle, owner: ObjectGuid, target: ObjectGuid) -> bool {
        let Some(id) = self.agents.get(&owner).and_then(|a| a.threat.entries.get(&target)).copied()
        else {
            return false;
        };
        self.threat_updates.push(ThreatUpdate::Remove {
            owner,
            victim: target,
        });
        self.purge_reference(id);
        if self.agents.get(&owner).is_some_and(|a| a.threat.current_victim.is_none())
            && units.can_have_threat_list(owner)
        {
            self.update_victim(units, owner);
        }
        true
    }

    pub fn clear_all_threat(&mut self, owner: ObjectGuid) {
        let Some(agent) = self.agents.get(&owner) else {
            return;
        };
        if agent.threat.entries.is_empty() {
            return;
        }
        self.threat_updates.push(ThreatUpdate::Clear { owner });
        while let Some(id) = self
            .agents
            .get(&owner)
            .and_then(|a| a.threat.entries.values().next().copied())
        {
            self.purge_reference(id);
        }
    }

    /// Takes `owner` off every threat list it is on (death, despawn).
    ///
    /// Each iteration detaches exactly one reference and re-reads the index,
    /// so structural changes made while clearing are tolerated.
    pub fn remove_me_from_threat_lists(&mut self, units: &dyn UnitOracle, owner: ObjectGuid) {
        while let Some(list_owner) = self
            .agents
            .get(&owner)
            .and_then(|a| a.threat.threatened_by_me.keys().next().copied())
        {
            if !self.clear_threat(units, list_owner, owner) {
                tracing::error!(%owner, %list_owner, "threatened-by-me index out of sync");
                if let Some(agent) = self.agents.get_mut(&owner) {
                    agent.threat.threatened_by_me.remove(&list_owner);
                }
            }
        }
    }

    /// Spreads threat for helping `assisted` over everyone fighting it.
    ///
    /// Owners that are crowd-controlled receive zero threat but still learn
    /// about the assistant.
    pub fn forward_threat_for_assist_healer(
        &mut self,
        units: &dyn UnitOracle,
        assistant: ObjectGuid,
        assisted: ObjectGuid,
        amount: f32,
        spell: Option<&SpellInfo>,
        ignore_modifiers: bool,
    ) {
        if spell.is_some_and(|s| s.has_attribute(SpellAttributes::NO_THREAT)) {
            return;
        }
        let owners: Vec<ObjectGuid> = match self.agents.get(&assisted) {
            Some(agent) => agent.threat.threatened_by_me.keys().copied().collect(),
            None => return,
        };
        let (free, controlled): (Vec<ObjectGuid>, Vec<ObjectGuid>) = owners
            .into_iter()
            .partition(|owner| !units.unit_state(*owner).intersects(game_core::UnitState::CONTROLLED));
        if !free.is_empty() {
            let share = amount / free.len() as f32;
            for owner in free {
                self.add_threat(units, owner, assistant, share, spell, ignore_modifiers, false);
            }
        }
        for owner in controlled {
            self.add_threat(units, owner, assistant, 0.0, spell, true, false);
        }
    }

    pub fn fixate_target(&mut self, owner: ObjectGuid, target: Option<ObjectGuid>) {
        let id = target.and_then(|target| {
            self.agents
                .get(&owner)
                .and_then(|a| a.threat.entries.get(&target))
                .copied()
        });
        if let Some(agent) = self.agents.get_mut(&owner) {
            agent.threat.fixate = id;
        }
    }

    pub fn clear_fixate(&mut self, owner: ObjectGuid) {
        self.fixate_target(owner, None);
    }

    /// Registers "redirect `pct`% of the threat `owner` generates to `victim`".
    pub fn register_redirect_threat(&mut self, owner: ObjectGuid, spell: u32, victim: ObjectGuid, pct: u32) {
        let threat = &mut self.agent_mut(owner).threat;
        threat.redirect_registry.entry(spell).or_default().insert(victim, pct);
        threat.rebuild_redirects();
    }

    pub fn unregister_redirect_threat(&mut self, owner: ObjectGuid, spell: u32, victim: Option<ObjectGuid>) {
        let Some(agent) = self.agents.get_mut(&owner) else {
            return;
        };
        let threat = &mut agent.threat;
        let removed = match victim {
            None => threat.redirect_registry.remove(&spell).is_some(),
            Some(victim) => {
                let removed = threat
                    .redirect_registry
                    .get_mut(&spell)
                    .is_some_and(|victims| victims.remove(&victim).is_some());
                if threat.redirect_registry.get(&spell).is_some_and(BTreeMap::is_empty) {
                    threat.redirect_registry.remove(&spell);
                }
                removed
            }
        };
        if removed {
            threat.rebuild_redirects();
        }
    }

    // ===== state re-evaluation =====

    /// Recomputes taunt ranks from the owner's taunt auras and detaunts
    /// from each victim, then lets suppression expire where it should.
    pub fn taunt_update(&mut self, units: &dyn UnitOracle, owner: ObjectGuid) {
        let entries: Vec<(ObjectGuid, ThreatRefId)> = match self.agents.get(&owner) {
            Some(agent) => agent.threat.entries.iter().map(|(g, id)| (*g, *id)).collect(),
            None => return,
        };
        let mut states = BTreeMap::new();
        for (index, aura) in units.taunt_auras(owner).into_iter().enumerate() {
            states.insert(aura.caster, TauntState::taunt(index as u32));
        }

        let mut changed = false;
        for (victim, id) in entries {
            let mut state = states.get(&victim).copied().unwrap_or(TauntState::NONE);
            if !state.is_taunting()
                && units
                    .detaunt_auras(victim)
                    .iter()
                    .any(|aura| aura.caster == owner)
            {
                state = TauntState::DETAUNT;
            }
            if let Some(reference) = self.threat_refs.get_mut(&id) {
                if reference.taunt != state {
                    reference.taunt = state;
                    changed = true;
                }
            }
        }
        if changed {
            self.list_changed(owner);
        }
        self.evaluate_suppressed(units, owner, true);
    }

    /// Suppresses references that should be, and with `can_expire` lifts
    /// suppression from references that no longer qualify.
    pub fn evaluate_suppressed(&mut self, units: &dyn UnitOracle, owner: ObjectGuid, can_expire: bool) {
        let ids: Vec<ThreatRefId> = match self.agents.get(&owner) {
            Some(agent) => agent.threat.entries.values().copied().collect(),
            None => return,
        };
        let mut changed = false;
        for id in ids {
            let Some(reference) = self.threat_refs.get_mut(&id) else {
                continue;
            };
            let should = reference.should_be_suppressed(units);
            if reference.is_online() && should {
                reference.online = OnlineState::Suppressed;
                changed = true;
            } else if can_expire && reference.is_suppressed() && !should {
                reference.online = OnlineState::Online;
                changed = true;
            }
        }
        if changed {
            self.list_changed(owner);
        }
    }

    /// Re-derives offline status; returns whether it changed.
    fn update_offline(&mut self, units: &dyn UnitOracle, id: ThreatRefId) -> bool {
        let Some(reference) = self.threat_refs.get_mut(&id) else {
            return false;
        };
        let should = reference.should_be_offline(units);
        if should == reference.is_offline() {
            return false;
        }
        let (owner, victim) = (reference.owner, reference.victim);
        if should {
            reference.online = OnlineState::Offline;
        } else {
            reference.online = if reference.should_be_suppressed(units) {
                OnlineState::Suppressed
            } else {
                OnlineState::Online
            };
            self.agent_mut(owner).threat.pending_ai.push(victim);
        }
        true
    }

    /// Reselects the victim, then pushes client and AI notifications.
    pub fn update_victim(&mut self, units: &dyn UnitOracle, owner: ObjectGuid) {
        let selected = self.reselect_victim(units, owner);
        let Some(agent) = self.agents.get_mut(&owner) else {
            return;
        };
        let previous = agent.threat.current_victim;
        let new_highest = selected.is_some() && selected != previous;
        agent.threat.current_victim = selected;
        let resync = agent.threat.needs_client_update;
        if new_highest || resync {
            self.send_threat_list(owner, new_highest);
            if let Some(agent) = self.agents.get_mut(&owner) {
                agent.threat.needs_client_update = false;
            }
        }
        if selected != previous {
            let victim = selected
                .and_then(|id| self.threat_refs.get(&id))
                .map(|r| r.victim);
            tracing::debug!(%owner, victim = ?victim, "victim changed");
            self.notices.push(CombatNotice::VictimChanged { owner, victim });
        }
        self.process_ai_updates(owner);
    }

    fn reselect_victim(&mut self, units: &dyn UnitOracle, owner: ObjectGuid) -> Option<ThreatRefId> {
        let ids: Vec<ThreatRefId> = self.agents.get(&owner)?.threat.entries.values().copied().collect();
        if ids.is_empty() {
            return None;
        }
        let mut changed = false;
        for id in ids {
            changed |= self.update_offline(units, id);
        }
        if changed {
            self.list_changed(owner);
        }

        let agent = self.agents.get(&owner)?;
        let refs = &self.threat_refs;

        if let Some(fixate) = agent.threat.fixate.and_then(|id| refs.get(&id).map(|r| (id, r))) {
            if fixate.1.is_available() {
                return Some(fixate.0);
            }
        }

        let old = agent
            .threat
            .current_victim
            .and_then(|id| refs.get(&id).map(|r| (id, r)))
            .filter(|(_, r)| !r.is_offline());

        let highest_id = *agent.threat.sorted.first()?;
        let highest = refs.get(&highest_id)?;
        // an unavailable leader means the whole list is unavailable
        if !highest.is_available() {
            return None;
        }
        let Some((old_id, old)) = old else {
            return Some(highest_id);
        };
        if highest_id == old_id {
            return Some(highest_id);
        }
        if !ranks_below(old, highest, EngineConfig::THREAT_SWITCH_MELEE_PCT) {
            return Some(old_id);
        }
        if ranks_below(old, highest, EngineConfig::THREAT_SWITCH_ANY_PCT) {
            return Some(highest_id);
        }
        if units.is_within_melee_range(owner, highest.victim) {
            return Some(highest_id);
        }
        // ranked leader is out of melee reach; look for a melee challenger
        for id in &agent.threat.sorted {
            if *id == old_id {
                return Some(old_id);
            }
            let Some(next) = refs.get(id) else {
                continue;
            };
            if !ranks_below(old, next, EngineConfig::THREAT_SWITCH_MELEE_PCT) {
                return Some(old_id);
            }
            if units.is_within_melee_range(owner, next.victim) {
                return Some(*id);
            }
        }
        debug_assert!(false, "current victim missing from sorted threat list");
        tracing::error!(%owner, "current victim missing from sorted threat list");
        Some(highest_id)
    }

    pub(crate) fn update_threat(&mut self, units: &dyn UnitOracle, owner: ObjectGuid, diff: u32) {
        if !units.can_have_threat_list(owner) {
            return;
        }
        let interval = self.threat_update_interval_ms;
        let Some(agent) = self.agents.get_mut(&owner) else {
            return;
        };
        if agent.threat.entries.is_empty() {
            return;
        }
        if agent.threat.update_timer <= diff {
            agent.threat.update_timer = interval;
            self.update_victim(units, owner);
        } else {
            agent.threat.update_timer -= diff;
        }
    }

    // ===== internals =====

    fn purge_reference(&mut self, id: ThreatRefId) {
        let Some(reference) = self.threat_refs.remove(&id) else {
            return;
        };
        if let Some(agent) = self.agents.get_mut(&reference.owner) {
            let threat = &mut agent.threat;
            threat.entries.remove(&reference.victim);
            threat.sorted.retain(|other| *other != id);
            if threat.current_victim == Some(id) {
                threat.current_victim = None;
            }
            if threat.fixate == Some(id) {
                threat.fixate = None;
            }
        }
        if let Some(agent) = self.agents.get_mut(&reference.victim) {
            agent.threat.threatened_by_me.remove(&reference.owner);
        }
        tracing::trace!(owner = %reference.owner, victim = %reference.victim, "threat reference purged");
    }

    fn list_changed(&mut self, owner: ObjectGuid) {
        self.resort(owner);
        if let Some(agent) = self.agents.get_mut(&owner) {
            agent.threat.needs_client_update = true;
        }
    }

    fn resort(&mut self, owner: ObjectGuid) {
        let refs = &self.threat_refs;
        if let Some(agent) = self.agents.get_mut(&owner) {
            agent.threat.sorted.sort_by(|a, b| match (refs.get(a), refs.get(b)) {
                (Some(a), Some(b)) => rank(b, a),
                _ => core::cmp::Ordering::Equal,
            });
        }
    }

    fn process_ai_updates(&mut self, owner: ObjectGuid) {
        let Some(agent) = self.agents.get_mut(&owner) else {
            return;
        };
        let pending = std::mem::take(&mut agent.threat.pending_ai);
        for victim in pending {
            if self.reference(owner, victim).is_some() {
                self.notices.push(CombatNotice::ThreatStarted { owner, victim });
            }
        }
    }

    fn send_threat_list(&mut self, owner: ObjectGuid, highest_changed: bool) {
        let entries = self.threat_entries(owner);
        let highest = self.last_victim(owner);
        self.threat_updates.push(ThreatUpdate::Full {
            owner,
            highest_changed,
            highest,
            entries,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{ObjectRecord, TauntAura, UnitFlags, WorldSnapshot};

    fn boss() -> ObjectGuid {
        ObjectGuid::creature(500, 1)
    }

    fn p(n: u64) -> ObjectGuid {
        ObjectGuid::player(n)
    }

    fn arena() -> WorldSnapshot {
        WorldSnapshot::new()
            .with(ObjectRecord::creature(500, 1))
            .with(ObjectRecord::player(1).at(2.0, 0.0, 0.0))
            .with(ObjectRecord::player(2).at(30.0, 0.0, 0.0))
            .with(ObjectRecord::player(3).at(3.0, 0.0, 0.0))
    }

    fn add(combat: &mut CombatWorld, units: &WorldSnapshot, victim: ObjectGuid, amount: f32) {
        combat.add_threat(units, boss(), victim, amount, None, false, false);
    }

    #[test]
    fn first_threat_selects_victim_and_notifies() {
        let units = arena();
        let mut combat = CombatWorld::default();
        add(&mut combat, &units, p(1), 50.0);
        assert_eq!(combat.last_victim(boss()), Some(p(1)));
        assert!(combat.is_engaged(boss()));
        let notices = combat.take_notices();
        assert!(notices.contains(&CombatNotice::ThreatStarted {
            owner: boss(),
            victim: p(1)
        }));
        assert!(notices.contains(&CombatNotice::VictimChanged {
            owner: boss(),
            victim: Some(p(1))
        }));
        assert!(combat.check_invariants().is_ok());
    }

    #[test]
    fn no_threat_spells_do_nothing() {
        let units = arena();
        let mut combat = CombatWorld::default();
        let spell = SpellInfo::new(1, SpellSchoolMask::FIRE).with_attributes(SpellAttributes::NO_THREAT);
        combat.add_threat(&units, boss(), p(1), 100.0, Some(&spell), false, false);
        assert!(!combat.is_in_combat(boss()));

        let opener =
            SpellInfo::new(2, SpellSchoolMask::FIRE).with_attributes(SpellAttributes::NO_INITIAL_THREAT);
        combat.add_threat(&units, boss(), p(1), 100.0, Some(&opener), false, false);
        assert!(!combat.is_engaged(boss()));
        add(&mut combat, &units, p(1), 10.0);
        combat.add_threat(&units, boss(), p(1), 100.0, Some(&opener), false, false);
        assert_eq!(combat.threat(boss(), p(1), false), 110.0);
    }

    #[test]
    fn negative_threat_clamps_to_zero() {
        let units = arena();
        let mut combat = CombatWorld::default();
        add(&mut combat, &units, p(1), 10.0);
        add(&mut combat, &units, p(1), -50.0);
        assert_eq!(combat.threat(boss(), p(1), false), 0.0);
        assert!(combat.check_invariants().is_ok());
    }

    #[test]
    fn hysteresis_keeps_victim_below_ten_percent() {
        let units = arena();
        let mut combat = CombatWorld::default();
        add(&mut combat, &units, p(1), 100.0);
        add(&mut combat, &units, p(3), 105.0);
        combat.update_victim(&units, boss());
        assert_eq!(combat.last_victim(boss()), Some(p(1)));

        // p3 is in melee range and now 25% ahead
        add(&mut combat, &units, p(3), 20.0);
        combat.update_victim(&units, boss());
        assert_eq!(combat.last_victim(boss()), Some(p(3)));
    }

    #[test]
    fn ranged_leader_needs_thirty_percent() {
        let units = arena();
        let mut combat = CombatWorld::default();
        add(&mut combat, &units, p(1), 100.0);
        add(&mut combat, &units, p(2), 125.0);
        combat.update_victim(&units, boss());
        assert_eq!(combat.last_victim(boss()), Some(p(1)));

        add(&mut combat, &units, p(2), 10.0);
        combat.update_victim(&units, boss());
        assert_eq!(combat.last_victim(boss()), Some(p(2)));
    }

    #[test]
    fn melee_challenger_below_ranged_leader_wins() {
        let units = arena();
        let mut combat = CombatWorld::default();
        add(&mut combat, &units, p(1), 100.0);
        add(&mut combat, &units, p(2), 125.0);
        add(&mut combat, &units, p(3), 115.0);
        combat.update_victim(&units, boss());
        assert_eq!(combat.last_victim(boss()), Some(p(3)));
    }

    #[test]
    fn fixate_overrides_threat() {
        let units = arena();
        let mut combat = CombatWorld::default();
        add(&mut combat, &units, p(1), 500.0);
        add(&mut combat, &units, p(2), 1.0);
        combat.fixate_target(boss(), Some(p(2)));
        combat.update_victim(&units, boss());
        assert_eq!(combat.last_victim(boss()), Some(p(2)));
        combat.clear_fixate(boss());
        assert_eq!(combat.fixate_target_of(boss()), None);
        combat.update_victim(&units, boss());
        assert_eq!(combat.last_victim(boss()), Some(p(1)));
    }

    #[test]
    fn taunt_outranks_threat() {
        let mut units = arena();
        let mut combat = CombatWorld::default();
        add(&mut combat, &units, p(1), 500.0);
        add(&mut combat, &units, p(3), 10.0);
        units.record_mut(boss()).unwrap().taunts.push(TauntAura {
            caster: p(3),
            applied_at: 1,
        });
        combat.taunt_update(&units, boss());
        combat.update_victim(&units, boss());
        assert_eq!(combat.last_victim(boss()), Some(p(3)));
        assert_eq!(combat.sorted_threat_list(boss()).first(), Some(&p(3)));
    }

    #[test]
    fn confused_victim_is_suppressed_unless_taunting() {
        let mut units = arena();
        let mut combat = CombatWorld::default();
        add(&mut combat, &units, p(1), 100.0);
        units.record_mut(p(1)).unwrap().unit_state = game_core::UnitState::CONFUSED;
        combat.evaluate_suppressed(&units, boss(), false);
        assert!(combat.reference(boss(), p(1)).unwrap().is_suppressed());
        // suppressed refs ignore further threat until they qualify again
        add(&mut combat, &units, p(1), 50.0);
        assert_eq!(combat.threat(boss(), p(1), false), 100.0);

        units.record_mut(p(1)).unwrap().unit_state = game_core::UnitState::empty();
        add(&mut combat, &units, p(1), 50.0);
        assert!(combat.reference(boss(), p(1)).unwrap().is_online());
        assert_eq!(combat.threat(boss(), p(1), false), 150.0);
    }

    #[test]
    fn immune_victim_goes_offline() {
        let mut units = arena();
        let mut combat = CombatWorld::default();
        add(&mut combat, &units, p(1), 100.0);
        add(&mut combat, &units, p(3), 10.0);
        units
            .record_mut(boss())
            .unwrap()
            .unit_flags
            .insert(UnitFlags::IMMUNE_TO_PC);
        combat.update_victim(&units, boss());
        assert_eq!(combat.last_victim(boss()), None);
        assert!(combat.reference(boss(), p(1)).unwrap().is_offline());
    }

    #[test]
    fn redirects_are_capped_at_one_hundred_percent() {
        let units = arena();
        let mut combat = CombatWorld::default();
        combat.register_redirect_threat(p(1), 10, p(2), 60);
        combat.register_redirect_threat(p(1), 11, p(3), 30);
        combat.register_redirect_threat(p(1), 12, p(3), 50);
        let total: u32 = combat
            .threat_manager(p(1))
            .unwrap()
            .redirects()
            .iter()
            .map(|(_, pct)| pct)
            .sum();
        assert_eq!(total, 100);

        add(&mut combat, &units, p(1), 100.0);
        assert_eq!(combat.threat(boss(), p(1), true), 0.0);
        assert_eq!(combat.threat(boss(), p(2), true), 60.0);
        assert_eq!(combat.threat(boss(), p(3), true), 40.0);

        combat.unregister_redirect_threat(p(1), 12, None);
        combat.unregister_redirect_threat(p(1), 11, Some(p(3)));
        assert_eq!(combat.threat_manager(p(1)).unwrap().redirects(), &[(p(2), 60)]);
    }

    #[test]
    fn remove_me_from_threat_lists_drains_every_list() {
        let units = arena().with(ObjectRecord::creature(501, 2));
        let mut combat = CombatWorld::default();
        let add_on = ObjectGuid::creature(501, 2);
        add(&mut combat, &units, p(1), 10.0);
        combat.add_threat(&units, add_on, p(1), 10.0, None, false, false);
        combat.remove_me_from_threat_lists(&units, p(1));
        assert!(!combat.is_threatened_by(boss(), p(1), true));
        assert!(!combat.is_threatened_by(add_on, p(1), true));
        // idempotent
        combat.remove_me_from_threat_lists(&units, p(1));
        assert_eq!(combat.threat_manager(p(1)).unwrap().threatened_by_me().count(), 0);
    }

    #[test]
    fn healing_threat_is_split_across_attackers() {
        let units = arena().with(ObjectRecord::creature(501, 2));
        let mut combat = CombatWorld::default();
        let add_on = ObjectGuid::creature(501, 2);
        add(&mut combat, &units, p(1), 10.0);
        combat.add_threat(&units, add_on, p(1), 10.0, None, false, false);
        combat.forward_threat_for_assist_healer(&units, p(3), p(1), 50.0, None, false);
        assert_eq!(combat.threat(boss(), p(3), true), 25.0);
        assert_eq!(combat.threat(add_on, p(3), true), 25.0);
    }

    #[test]
    fn pets_only_enter_combat() {
        let units = arena().with(ObjectRecord::creature(600, 9).as_pet_of(p(1)).with_faction(1));
        let mut combat = CombatWorld::default();
        let pet = ObjectGuid::creature(600, 9);
        combat.add_threat(&units, pet, boss(), 100.0, None, false, false);
        assert!(combat.is_in_combat_with(pet, boss()));
        assert_eq!(combat.threat_list_size(pet), 0);
    }

    #[test]
    fn modify_threat_by_percent_and_reset() {
        let units = arena();
        let mut combat = CombatWorld::default();
        add(&mut combat, &units, p(1), 100.0);
        combat.modify_threat_by_percent(boss(), p(1), -50);
        assert_eq!(combat.threat(boss(), p(1), false), 50.0);
        combat.modify_threat_by_percent(boss(), p(1), 100);
        assert_eq!(combat.threat(boss(), p(1), false), 100.0);
        combat.reset_all_threat(boss());
        assert_eq!(combat.threat(boss(), p(1), false), 0.0);
        assert!(combat.is_threatened_by(boss(), p(1), false));
    }

    #[test]
    fn match_threat_to_highest() {
        let units = arena();
        let mut combat = CombatWorld::default();
        add(&mut combat, &units, p(1), 300.0);
        add(&mut combat, &units, p(3), 20.0);
        combat.match_unit_threat_to_highest(&units, boss(), p(3));
        assert_eq!(combat.threat(boss(), p(3), false), 300.0);
    }
}
