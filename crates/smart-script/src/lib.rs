//! Table-driven event/condition/action rules for NPC and object AI.
//!
//! Content authors write rows of "when EVENT happens, if the gates pass, do
//! ACTION to TARGETS". [`RuleTable`] validates those rows once into typed
//! [`Rule`]s; every live agent then runs its own [`SmartScript`] over them,
//! dispatching host callbacks, ticking timers and resolving targets through
//! the `game-core` oracles.
//!
//! Adapters in [`ai`] bind an engine to a creature, game object, area
//! trigger, scene or quest, and [`ScriptMap`] drives the agents of one map
//! together with its [`combat::CombatWorld`].
pub mod action;
pub mod ai;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod event;
mod executor;
pub mod holder;
pub mod map;
mod params;
pub mod request;
mod resolver;
pub mod table;
pub mod target;
pub mod waypoint;

pub use action::{Action, ActionKind, FollowCredit, InstDataKind, ListTimer};
pub use ai::{
    ESCORT_LAST_OOC_POINT, EscortState, QuestStatus, ScriptAgent, SmartAi, SmartAreaTriggerAi,
    SmartGameObjectAi, SmartQuestAi, SmartSceneAi,
};
pub use catalog::ScriptCatalog;
pub use engine::{ESCORT_TARGETS, EventArgs, ScriptEnv, SmartScript};
pub use error::{ScriptError, TableError};
pub use event::{Event, EventFlags, EventKind, EventParams};
pub use holder::{Rule, RuleKey, ScriptType};
pub use map::ScriptMap;
pub use request::{AiCommand, ScriptRequest};
pub use table::{LoadReport, LoadWarning, RuleTable, SmartScriptRow};
pub use target::{Target, TargetKind};
pub use waypoint::{Path, PathNode, PathTable, WaypointRow};
