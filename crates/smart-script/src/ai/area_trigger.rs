use std::sync::Arc;

use game_core::ObjectGuid;

use super::{ScriptAgent, not_addressable};
use crate::catalog::ScriptCatalog;
use crate::engine::{EventArgs, ScriptEnv, SmartScript};
use crate::error::ScriptError;
use crate::event::EventKind;
use crate::holder::ScriptType;
use crate::request::ScriptRequest;

/// AI of an area trigger. Rules are keyed by the trigger id, which is the
/// entry of the trigger's guid.
#[derive(Debug)]
pub struct SmartAreaTriggerAi {
    script: SmartScript,
}

impl SmartAreaTriggerAi {
    pub fn new(catalog: Arc<ScriptCatalog>, me: ObjectGuid) -> Self {
        Self {
            script: SmartScript::new(catalog, me, ScriptType::AreaTrigger),
        }
    }

    pub fn trigger_id(&self) -> u32 {
        self.script.owner().entry()
    }

    /// A unit stepped into the trigger.
    pub fn enter(&mut self, env: &mut ScriptEnv<'_>, unit: ObjectGuid) {
        let args = EventArgs::new()
            .with_invoker(unit)
            .with_vars(self.trigger_id(), 0);
        self.script
            .process_events_for(env, EventKind::AreaTriggerOnTrigger, &args);
    }
}

impl ScriptAgent for SmartAreaTriggerAi {
    fn guid(&self) -> ObjectGuid {
        self.script.owner()
    }

    fn script(&self) -> &SmartScript {
        &self.script
    }

    fn initialize(&mut self, env: &mut ScriptEnv<'_>) {
        self.script.initialize(env);
    }

    fn update(&mut self, env: &mut ScriptEnv<'_>, diff: u32) {
        self.script.on_update(env, diff);
    }

    fn deliver(&mut self, _env: &mut ScriptEnv<'_>, request: ScriptRequest) -> Result<(), ScriptError> {
        Err(not_addressable(&request))
    }

    fn take_requests(&mut self) -> Vec<ScriptRequest> {
        self.script.take_requests()
    }
}
