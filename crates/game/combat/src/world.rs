//! The combat arena.
use std::collections::{BTreeMap, HashMap};

use game_core::{EngineConfig, ObjectGuid, UnitOracle};

use crate::combat_manager::CombatManager;
use crate::error::CombatError;
use crate::notice::{CombatNotice, ThreatUpdate};
use crate::reference::{CombatRefId, CombatReference, ThreatRefId, ThreatReference};
use crate::threat_manager::ThreatManager;

#[derive(Clone, Debug)]
pub(crate) struct Agent {
    pub(crate) combat: CombatManager,
    pub(crate) threat: ThreatManager,
}

impl Agent {
    fn new(owner: ObjectGuid) -> Self {
        Self {
            combat: CombatManager::new(owner),
            threat: ThreatManager::new(owner),
        }
    }
}

/// Owns every combat and threat reference on a map, plus the per-agent
/// managers indexing them.
///
/// Agents are registered lazily the first time any operation touches them.
/// Operations that would notify AI code push [`CombatNotice`]s instead; the
/// host drains them with [`CombatWorld::take_notices`].
#[derive(Clone, Debug)]
pub struct CombatWorld {
    pub(crate) pvp_timeout_ms: u32,
    pub(crate) threat_update_interval_ms: u32,
    pub(crate) agents: BTreeMap<ObjectGuid, Agent>,
    pub(crate) combat_refs: HashMap<CombatRefId, CombatReference>,
    pub(crate) threat_refs: HashMap<ThreatRefId, ThreatReference>,
    next_ref_id: u64,
    pub(crate) notices: Vec<CombatNotice>,
    pub(crate) threat_updates: Vec<ThreatUpdate>,
}

impl Default for CombatWorld {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl CombatWorld {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            pvp_timeout_ms: config.pvp_combat_timeout_ms,
            threat_update_interval_ms: config.threat_update_interval_ms,
            agents: BTreeMap::new(),
            combat_refs: HashMap::new(),
            threat_refs: HashMap::new(),
            next_ref_id: 1,
            notices: Vec::new(),
            threat_updates: Vec::new(),
        }
    }

    pub fn combat_manager(&self, guid: ObjectGuid) -> Option<&CombatManager> {
        self.agents.get(&guid).map(|agent| &agent.combat)
    }

    pub fn threat_manager(&self, guid: ObjectGuid) -> Option<&ThreatManager> {
        self.agents.get(&guid).map(|agent| &agent.threat)
    }

    pub fn combat_reference(&self, id: CombatRefId) -> Option<&CombatReference> {
        self.combat_refs.get(&id)
    }

    pub fn threat_reference(&self, id: ThreatRefId) -> Option<&ThreatReference> {
        self.threat_refs.get(&id)
    }

    pub fn take_notices(&mut self) -> Vec<CombatNotice> {
        std::mem::take(&mut self.notices)
    }

    pub fn has_pending_notices(&self) -> bool {
        !self.notices.is_empty()
    }

    pub fn take_threat_updates(&mut self) -> Vec<ThreatUpdate> {
        std::mem::take(&mut self.threat_updates)
    }

    /// Ticks PvP decay and periodic victim selection for every agent.
    pub fn update(&mut self, units: &dyn UnitOracle, diff: u32) {
        let owners: Vec<ObjectGuid> = self.agents.keys().copied().collect();
        for owner in owners {
            self.update_agent(units, owner, diff);
        }
    }

    pub fn update_agent(&mut self, units: &dyn UnitOracle, owner: ObjectGuid, diff: u32) {
        self.update_combat(units, owner, diff);
        self.update_threat(units, owner, diff);
    }

    /// Detaches an agent from everything (death, despawn, removal from map)
    /// and forgets it.
    pub fn remove_agent(&mut self, units: &dyn UnitOracle, guid: ObjectGuid) {
        if !self.agents.contains_key(&guid) {
            return;
        }
        self.end_all_combat(units, guid);
        self.agents.remove(&guid);
        tracing::trace!(agent = %guid, "removed from combat arena");
    }

    pub(crate) fn agent_mut(&mut self, guid: ObjectGuid) -> &mut Agent {
        self.agents.entry(guid).or_insert_with(|| Agent::new(guid))
    }

    pub(crate) fn next_combat_id(&mut self) -> CombatRefId {
        let id = CombatRefId(self.next_ref_id);
        self.next_ref_id += 1;
        id
    }

    pub(crate) fn next_threat_id(&mut self) -> ThreatRefId {
        let id = ThreatRefId(self.next_ref_id);
        self.next_ref_id += 1;
        id
    }

    /// Verifies the structural invariants of the arena.
    ///
    /// Combat is symmetric, every threat reference is indexed from both ends
    /// and backed by a combat reference, threat is non-negative, and current
    /// victims are on their owner's list.
    pub fn check_invariants(&self) -> Result<(), CombatError> {
        for (guid, agent) in &self.agents {
            for other in agent.combat.opponents() {
                let mirrored = self
                    .agents
                    .get(&other)
                    .is_some_and(|a| a.combat.is_in_combat_with(*guid));
                if !mirrored {
                    return Err(CombatError::AsymmetricCombat {
                        first: *guid,
                        second: other,
                    });
                }
            }

            if let Some(victim) = agent.threat.current_victim {
                if !agent.threat.entries.values().any(|id| *id == victim) {
                    return Err(CombatError::VictimNotInList { owner: *guid });
                }
            }
        }

        for reference in self.threat_refs.values() {
            let (owner, victim) = (reference.owner, reference.victim);
            let indexed = self
                .agents
                .get(&owner)
                .is_some_and(|a| a.threat.entries.contains_key(&victim))
                && self
                    .agents
                    .get(&victim)
                    .is_some_and(|a| a.threat.threatened_by_me.contains_key(&owner));
            if !indexed {
                return Err(CombatError::DanglingThreatReference { owner, victim });
            }
            if reference.base_amount < 0.0 {
                return Err(CombatError::NegativeThreat {
                    owner,
                    victim,
                    amount: reference.base_amount,
                });
            }
            if !self.is_in_combat_with(owner, victim) {
                return Err(CombatError::ThreatWithoutCombat { owner, victim });
            }
        }
        Ok(())
    }
}
