use std::sync::Arc;

use game_core::{ObjectGuid, SpellInfo};

use super::{ScriptAgent, apply_to_script};
use crate::catalog::ScriptCatalog;
use crate::engine::{EventArgs, ScriptEnv, SmartScript};
use crate::error::ScriptError;
use crate::event::EventKind;
use crate::holder::ScriptType;
use crate::request::ScriptRequest;

/// AI of a scripted game object.
#[derive(Debug)]
pub struct SmartGameObjectAi {
    script: SmartScript,
}

impl SmartGameObjectAi {
    pub fn new(catalog: Arc<ScriptCatalog>, me: ObjectGuid) -> Self {
        Self::with_seed(catalog, me, 0)
    }

    pub fn with_seed(catalog: Arc<ScriptCatalog>, me: ObjectGuid, world_seed: u64) -> Self {
        Self {
            script: SmartScript::with_seed(catalog, me, ScriptType::GameObject, world_seed),
        }
    }

    pub fn script_mut(&mut self) -> &mut SmartScript {
        &mut self.script
    }

    fn dispatch(&mut self, env: &mut ScriptEnv<'_>, kind: EventKind, args: EventArgs) {
        let args = args.with_object(self.script.owner());
        self.script.process_events_for(env, kind, &args);
    }

    pub fn reset(&mut self, env: &mut ScriptEnv<'_>) {
        self.script.on_reset(env);
    }

    pub fn gossip_hello(&mut self, env: &mut ScriptEnv<'_>, player: ObjectGuid) {
        self.dispatch(env, EventKind::GossipHello, EventArgs::new().with_invoker(player));
    }

    /// Use reported after the object's own use handling ran.
    pub fn report_use(&mut self, env: &mut ScriptEnv<'_>, player: ObjectGuid) {
        let args = EventArgs::new().with_invoker(player).with_flag(true);
        self.dispatch(env, EventKind::GossipHello, args);
    }

    pub fn gossip_select(&mut self, env: &mut ScriptEnv<'_>, player: ObjectGuid, menu: u32, option: u32) {
        let args = EventArgs::new().with_invoker(player).with_vars(menu, option);
        self.dispatch(env, EventKind::GossipSelect, args);
    }

    pub fn quest_accepted(&mut self, env: &mut ScriptEnv<'_>, player: ObjectGuid, quest: u32) {
        let args = EventArgs::new().with_invoker(player).with_vars(quest, 0);
        self.dispatch(env, EventKind::AcceptedQuest, args);
    }

    pub fn quest_rewarded(&mut self, env: &mut ScriptEnv<'_>, player: ObjectGuid, quest: u32, option: u32) {
        let args = EventArgs::new().with_invoker(player).with_vars(quest, option);
        self.dispatch(env, EventKind::RewardQuest, args);
    }

    /// The object was destroyed, by `player` when one did it.
    pub fn destroyed(&mut self, env: &mut ScriptEnv<'_>, player: Option<ObjectGuid>, event_id: u32) {
        let args = EventArgs::invoked_by(player).with_vars(event_id, 0);
        self.dispatch(env, EventKind::Death, args);
    }

    pub fn set_data(&mut self, env: &mut ScriptEnv<'_>, field: u32, value: u32, invoker: Option<ObjectGuid>) {
        self.script.set_data(env, field, value, invoker);
    }

    pub fn do_action(&mut self, env: &mut ScriptEnv<'_>, action: u32) {
        self.script.do_action(env, action);
    }

    pub fn game_event(&mut self, env: &mut ScriptEnv<'_>, start: bool, event_id: u32) {
        let kind = if start {
            EventKind::GameEventStart
        } else {
            EventKind::GameEventEnd
        };
        self.dispatch(env, kind, EventArgs::new().with_vars(event_id, 0));
    }

    pub fn loot_state_changed(&mut self, env: &mut ScriptEnv<'_>, state: u32, unit: Option<ObjectGuid>) {
        let args = EventArgs::invoked_by(unit).with_vars(state, 0);
        self.dispatch(env, EventKind::GoLootStateChanged, args);
    }

    pub fn event_inform(&mut self, env: &mut ScriptEnv<'_>, event_id: u32) {
        self.dispatch(env, EventKind::GoEventInform, EventArgs::new().with_vars(event_id, 0));
    }

    pub fn spell_hit(&mut self, env: &mut ScriptEnv<'_>, caster: Option<ObjectGuid>, spell: SpellInfo) {
        let args = EventArgs::invoked_by(caster.filter(ObjectGuid::is_unit)).with_spell(spell);
        self.dispatch(env, EventKind::SpellHit, args);
    }

    pub fn just_summoned(&mut self, env: &mut ScriptEnv<'_>, summon: ObjectGuid) {
        self.dispatch(env, EventKind::SummonedUnit, EventArgs::new().with_invoker(summon));
    }

    pub fn summoned_creature_dies(&mut self, env: &mut ScriptEnv<'_>, summon: ObjectGuid) {
        self.dispatch(env, EventKind::SummonedUnitDies, EventArgs::new().with_invoker(summon));
    }

    pub fn summoned_creature_despawn(&mut self, env: &mut ScriptEnv<'_>, summon: ObjectGuid) {
        let args = EventArgs::new()
            .with_invoker(summon)
            .with_vars(summon.entry(), 0);
        self.dispatch(env, EventKind::SummonDespawned, args);
    }
}

impl ScriptAgent for SmartGameObjectAi {
    fn guid(&self) -> ObjectGuid {
        self.script.owner()
    }

    fn script(&self) -> &SmartScript {
        &self.script
    }

    /// Unspawned objects skip the respawn event until they appear.
    fn initialize(&mut self, env: &mut ScriptEnv<'_>) {
        self.script.initialize(env);
        if env.world.is_spawned(self.script.owner()) {
            self.script
                .process_events_for(env, EventKind::Respawn, &EventArgs::new());
        }
    }

    fn update(&mut self, env: &mut ScriptEnv<'_>, diff: u32) {
        self.script.on_update(env, diff);
    }

    fn deliver(&mut self, env: &mut ScriptEnv<'_>, request: ScriptRequest) -> Result<(), ScriptError> {
        apply_to_script(&mut self.script, env, request)
    }

    fn take_requests(&mut self) -> Vec<ScriptRequest> {
        self.script.take_requests()
    }
}
