use std::sync::Arc;

use strum::{Display, EnumString};

use game_core::ObjectGuid;

use super::{ScriptAgent, not_addressable};
use crate::catalog::ScriptCatalog;
use crate::engine::{EventArgs, ScriptEnv, SmartScript};
use crate::error::ScriptError;
use crate::event::EventKind;
use crate::holder::ScriptType;
use crate::request::ScriptRequest;

/// Quest status a player moved into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum QuestStatus {
    None,
    Incomplete,
    Complete,
    Failed,
    Rewarded,
}

/// Quest rules of one player. The script runs on the player and is keyed
/// by the quest id, so one player carries one adapter per scripted quest.
#[derive(Debug)]
pub struct SmartQuestAi {
    script: SmartScript,
    quest: u32,
}

impl SmartQuestAi {
    pub fn new(catalog: Arc<ScriptCatalog>, player: ObjectGuid, quest: u32) -> Self {
        Self {
            script: SmartScript::new(catalog, player, ScriptType::Quest).with_entry(quest),
            quest,
        }
    }

    pub fn quest(&self) -> u32 {
        self.quest
    }

    fn player(&self) -> ObjectGuid {
        self.script.owner()
    }

    pub fn status_changed(&mut self, env: &mut ScriptEnv<'_>, status: QuestStatus) {
        let kind = match status {
            QuestStatus::Incomplete => EventKind::QuestAccepted,
            QuestStatus::Complete => EventKind::QuestCompletion,
            QuestStatus::Failed => EventKind::QuestFail,
            QuestStatus::Rewarded => EventKind::QuestRewarded,
            QuestStatus::None => return,
        };
        let args = EventArgs::new().with_invoker(self.player());
        self.script.process_events_for(env, kind, &args);
    }

    /// Only completed objectives are reported.
    pub fn objective_changed(&mut self, env: &mut ScriptEnv<'_>, objective: u32, completed: bool) {
        if !completed {
            return;
        }
        let args = EventArgs::new()
            .with_invoker(self.player())
            .with_vars(objective, 0);
        self.script
            .process_events_for(env, EventKind::QuestObjCompletion, &args);
    }
}

impl ScriptAgent for SmartQuestAi {
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
