//! Host adapters.
//!
//! Each adapter owns the rule engine of one agent and turns host callbacks
//! into event dispatch. [`ScriptAgent`] is what a map needs to tick an
//! agent and hand it requests from other agents; which requests an agent
//! accepts is its capability set, so a request reaching an agent without
//! the matching engine is refused instead of misapplied.
mod area_trigger;
mod creature;
mod escort;
mod game_object;
mod quest;
mod scene;

use game_core::ObjectGuid;

use crate::engine::{ScriptEnv, SmartScript};
use crate::error::ScriptError;
use crate::request::ScriptRequest;

pub use area_trigger::SmartAreaTriggerAi;
pub use creature::SmartAi;
pub use escort::EscortState;
pub use game_object::SmartGameObjectAi;
pub use quest::{QuestStatus, SmartQuestAi};
pub use scene::SmartSceneAi;

/// Point id of the movement back to where an escort was interrupted.
pub const ESCORT_LAST_OOC_POINT: u32 = 0xFF_FFFF;

/// An agent a map can drive.
pub trait ScriptAgent {
    fn guid(&self) -> ObjectGuid;

    fn script(&self) -> &SmartScript;

    /// Loads rules and raises the initialization events.
    fn initialize(&mut self, env: &mut ScriptEnv<'_>);

    fn update(&mut self, env: &mut ScriptEnv<'_>, diff: u32);

    /// Applies a request another agent addressed to this one.
    fn deliver(&mut self, env: &mut ScriptEnv<'_>, request: ScriptRequest) -> Result<(), ScriptError>;

    /// Requests this agent produced for others.
    fn take_requests(&mut self) -> Vec<ScriptRequest>;

    /// Creature AI behind this agent, if it has one.
    fn creature_ai(&mut self) -> Option<&mut SmartAi> {
        None
    }
}

/// Applies the engine-level requests every scripted creature and game
/// object accepts. AI commands are left to the caller.
pub(crate) fn apply_to_script(
    script: &mut SmartScript,
    env: &mut ScriptEnv<'_>,
    request: ScriptRequest,
) -> Result<(), ScriptError> {
    match request {
        ScriptRequest::InstallTimedActionList {
            list_id,
            timer,
            allow_override,
            invoker,
            ..
        } => script.set_timed_action_list(list_id, timer, allow_override, invoker),
        ScriptRequest::SetData {
            field,
            value,
            invoker,
            ..
        } => script.set_data(env, field, value, invoker),
        ScriptRequest::DoAction { action, .. } => script.do_action(env, action),
        ScriptRequest::StoreTargets {
            list_id, targets, ..
        } => script.store_targets(list_id, targets),
        ScriptRequest::SetCounter {
            counter,
            value,
            reset,
            ..
        } => script.store_counter(env, counter, value, reset),
        ScriptRequest::Ai { target, .. } => {
            return Err(ScriptError::MissingCapability {
                agent: target,
                capability: "take AI commands",
            });
        }
    }
    Ok(())
}

/// Refusal for agents whose engine is not addressable by other agents.
pub(crate) fn not_addressable(request: &ScriptRequest) -> ScriptError {
    ScriptError::MissingCapability {
        agent: request.target(),
        capability: "accept script requests",
    }
}
