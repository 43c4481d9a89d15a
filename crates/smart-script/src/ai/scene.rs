use std::sync::Arc;

use game_core::ObjectGuid;

use super::{ScriptAgent, not_addressable};
use crate::catalog::ScriptCatalog;
use crate::engine::{EventArgs, ScriptEnv, SmartScript};
use crate::error::ScriptError;
use crate::event::EventKind;
use crate::holder::ScriptType;
use crate::request::ScriptRequest;

/// Script of one playing scene instance, keyed by the scene template id.
#[derive(Debug)]
pub struct SmartSceneAi {
    script: SmartScript,
}

impl SmartSceneAi {
    pub fn new(catalog: Arc<ScriptCatalog>, me: ObjectGuid) -> Self {
        Self {
            script: SmartScript::new(catalog, me, ScriptType::Scene),
        }
    }

    fn dispatch(&mut self, env: &mut ScriptEnv<'_>, kind: EventKind, args: EventArgs) {
        self.script.process_events_for(env, kind, &args);
    }

    pub fn start(&mut self, env: &mut ScriptEnv<'_>, player: ObjectGuid) {
        self.dispatch(env, EventKind::SceneStart, EventArgs::new().with_invoker(player));
    }

    /// A named trigger inside the scene fired.
    pub fn trigger(&mut self, env: &mut ScriptEnv<'_>, player: ObjectGuid, name: &str) {
        let args = EventArgs::new().with_invoker(player).with_text(name);
        self.dispatch(env, EventKind::SceneTrigger, args);
    }

    pub fn cancel(&mut self, env: &mut ScriptEnv<'_>, player: ObjectGuid) {
        self.dispatch(env, EventKind::SceneCancel, EventArgs::new().with_invoker(player));
    }

    pub fn complete(&mut self, env: &mut ScriptEnv<'_>, player: ObjectGuid) {
        self.dispatch(env, EventKind::SceneComplete, EventArgs::new().with_invoker(player));
    }
}

impl ScriptAgent for SmartSceneAi {
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
