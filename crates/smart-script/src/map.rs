//! One map's worth of scripted agents.
//!
//! [`ScriptMap`] owns the world handle, the combat arena and every agent on
//! the map. Agents never reach each other directly: whatever one produces
//! for another (script requests, AI commands) and whatever combat produces
//! for AI code ([`CombatNotice`]) is queued and routed here once the caller
//! holding the agent has let go of it.
use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use combat::{CombatNotice, CombatWorld};
use game_core::{EngineConfig, ObjectGuid, WorldOracle};

use crate::ai::{ScriptAgent, SmartAi};
use crate::engine::ScriptEnv;
use crate::error::ScriptError;
use crate::request::ScriptRequest;

/// Routing rounds per pump; reactions that keep producing work past this
/// are left for the next call.
const MAX_PUMP_ROUNDS: usize = 16;

pub struct ScriptMap<W> {
    world: W,
    combat: CombatWorld,
    agents: BTreeMap<ObjectGuid, Box<dyn ScriptAgent>>,
}

impl<W: WorldOracle> ScriptMap<W> {
    pub fn new(world: W, config: &EngineConfig) -> Self {
        Self {
            world,
            combat: CombatWorld::new(config),
            agents: BTreeMap::new(),
        }
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn combat(&self) -> &CombatWorld {
        &self.combat
    }

    pub fn agent(&self, guid: ObjectGuid) -> Option<&dyn ScriptAgent> {
        self.agents.get(&guid).map(|agent| agent.as_ref())
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Registers and initializes an agent.
    pub fn add_agent(&mut self, mut agent: Box<dyn ScriptAgent>) -> Result<(), ScriptError> {
        let guid = agent.guid();
        if self.agents.contains_key(&guid) {
            return Err(ScriptError::DuplicateAgent(guid));
        }
        let mut env = ScriptEnv::new(&mut self.world, &mut self.combat);
        agent.initialize(&mut env);
        self.agents.insert(guid, agent);
        debug!(agent = %guid, "agent added");
        self.pump();
        Ok(())
    }

    /// Drops an agent and every combat relation it took part in.
    pub fn remove_agent(&mut self, guid: ObjectGuid) -> Option<Box<dyn ScriptAgent>> {
        let agent = self.agents.remove(&guid)?;
        self.combat.remove_agent(self.world.as_units(), guid);
        self.pump();
        Some(agent)
    }

    /// Runs a host callback against one agent, then routes what it produced.
    pub fn with_agent<R>(
        &mut self,
        guid: ObjectGuid,
        f: impl FnOnce(&mut dyn ScriptAgent, &mut ScriptEnv<'_>) -> R,
    ) -> Result<R, ScriptError> {
        let agent = self
            .agents
            .get_mut(&guid)
            .ok_or(ScriptError::AgentNotFound(guid))?;
        let mut env = ScriptEnv::new(&mut self.world, &mut self.combat);
        let out = f(agent.as_mut(), &mut env);
        self.pump();
        Ok(out)
    }

    /// Like [`with_agent`](Self::with_agent) for creature callbacks.
    pub fn with_creature<R>(
        &mut self,
        guid: ObjectGuid,
        f: impl FnOnce(&mut SmartAi, &mut ScriptEnv<'_>) -> R,
    ) -> Result<R, ScriptError> {
        let agent = self
            .agents
            .get_mut(&guid)
            .ok_or(ScriptError::AgentNotFound(guid))?;
        let ai = agent.creature_ai().ok_or(ScriptError::MissingCapability {
            agent: guid,
            capability: "run creature callbacks",
        })?;
        let mut env = ScriptEnv::new(&mut self.world, &mut self.combat);
        let out = f(ai, &mut env);
        self.pump();
        Ok(out)
    }

    /// Environment for adapters the host keeps outside the map, such as
    /// per-player quest scripts.
    pub fn with_env<R>(&mut self, f: impl FnOnce(&mut ScriptEnv<'_>) -> R) -> R {
        let mut env = ScriptEnv::new(&mut self.world, &mut self.combat);
        let out = f(&mut env);
        self.pump();
        out
    }

    /// Routes requests produced by an adapter the map does not own.
    pub fn deliver_requests(&mut self, requests: Vec<ScriptRequest>) {
        for request in requests {
            self.route(request);
        }
        self.pump();
    }

    /// Damage from `attacker` to `victim`: runs the victim's damage hooks,
    /// puts the attacker on its threat list and tells the attacker. Returns
    /// the damage the host should apply.
    pub fn deal_damage(
        &mut self,
        attacker: ObjectGuid,
        victim: ObjectGuid,
        damage: u32,
        health: u32,
        max_health: u32,
    ) -> u32 {
        let mut applied = damage;
        if let Some(ai) = self
            .agents
            .get_mut(&victim)
            .and_then(|agent| agent.creature_ai())
        {
            let mut env = ScriptEnv::new(&mut self.world, &mut self.combat);
            applied = ai.damage_taken(&mut env, Some(attacker), damage, health, max_health);
        }

        let units = self.world.as_units();
        if units.can_have_threat_list(victim) {
            self.combat
                .add_threat(units, victim, attacker, applied as f32, None, false, false);
        } else {
            self.combat.set_in_combat_with(units, victim, attacker);
        }

        if let Some(ai) = self
            .agents
            .get_mut(&attacker)
            .and_then(|agent| agent.creature_ai())
        {
            let mut env = ScriptEnv::new(&mut self.world, &mut self.combat);
            ai.damage_dealt(&mut env, victim, applied);
        }
        self.pump();
        applied
    }

    /// Advances combat and every agent by `diff` milliseconds.
    pub fn update(&mut self, diff: u32) {
        self.combat.update(self.world.as_units(), diff);
        self.pump();

        let guids: Vec<ObjectGuid> = self.agents.keys().copied().collect();
        for guid in guids {
            let Some(agent) = self.agents.get_mut(&guid) else {
                continue;
            };
            let mut env = ScriptEnv::new(&mut self.world, &mut self.combat);
            agent.update(&mut env, diff);
        }
        self.pump();
    }

    /// Drains combat notices and agent requests until both are quiet.
    fn pump(&mut self) {
        for _ in 0..MAX_PUMP_ROUNDS {
            let notices = self.combat.take_notices();
            let requests: Vec<ScriptRequest> = self
                .agents
                .values_mut()
                .flat_map(|agent| agent.take_requests())
                .collect();
            if notices.is_empty() && requests.is_empty() {
                return;
            }
            for notice in notices {
                self.notify(notice);
            }
            for request in requests {
                self.route(request);
            }
        }
        warn!(
            notices = self.combat.has_pending_notices(),
            "map still busy after {MAX_PUMP_ROUNDS} routing rounds"
        );
    }

    fn notify(&mut self, notice: CombatNotice) {
        trace!(?notice, "combat notice");
        let agent = match notice {
            CombatNotice::EnteredCombat { agent, .. } | CombatNotice::ExitedCombat { agent } => agent,
            CombatNotice::ThreatStarted { owner, .. } | CombatNotice::VictimChanged { owner, .. } => {
                owner
            }
        };
        let Some(ai) = self
            .agents
            .get_mut(&agent)
            .and_then(|agent| agent.creature_ai())
        else {
            return;
        };
        let mut env = ScriptEnv::new(&mut self.world, &mut self.combat);
        match notice {
            CombatNotice::EnteredCombat { enemy, .. } => ai.just_engaged_with(&mut env, enemy),
            CombatNotice::ThreatStarted { victim, .. } => ai.just_engaged_with(&mut env, victim),
            CombatNotice::ExitedCombat { .. } => ai.just_exited_combat(&mut env),
            CombatNotice::VictimChanged {
                victim: Some(victim),
                ..
            } => ai.attack_start(&mut env, victim),
            CombatNotice::VictimChanged { victim: None, .. } => {}
        }
    }

    fn route(&mut self, request: ScriptRequest) {
        let target = request.target();
        let Some(agent) = self.agents.get_mut(&target) else {
            debug!(agent = %target, ?request, "request for an agent not on this map");
            return;
        };
        let mut env = ScriptEnv::new(&mut self.world, &mut self.combat);
        if let Err(error) = agent.deliver(&mut env, request) {
            debug!(%error, "request refused");
        }
    }
}
