//! Requests an engine leaves for other agents' AI.
//!
//! Actions that address another agent cannot reach into that agent while
//! the issuing engine is borrowed. They are queued here and delivered by
//! the owner of all agents once the issuing call has returned.
use game_core::ObjectGuid;

use crate::action::{FollowCredit, ListTimer};

/// Work addressed to an AI rather than to its rule engine.
#[derive(Clone, Debug, PartialEq)]
pub enum AiCommand {
    SetCombatMove {
        enabled: bool,
        stop_moving: bool,
    },
    SetAutoAttack(bool),
    AttackStart(ObjectGuid),
    EnterEvadeMode,
    StartPath {
        run: bool,
        path: u32,
        repeat: bool,
        invoker: Option<ObjectGuid>,
        start_point: u32,
        quest: u32,
        despawn_ms: u32,
    },
    PausePath {
        delay_ms: u32,
        forced: bool,
    },
    StopPath {
        despawn_ms: u32,
        quest: u32,
        fail: bool,
    },
    ResumePath,
    SetRun(bool),
    SetDisableGravity(bool),
    SetFollow {
        target: ObjectGuid,
        distance: f32,
        angle: f32,
        credit: u32,
        arrival_entry: u32,
        credit_type: FollowCredit,
    },
    StopFollow,
    SetEvadeDisabled(bool),
    SetInvincibilityHp {
        value: u32,
        pct: bool,
    },
    SetRangedMovement {
        distance: f32,
        angle: f32,
    },
}

/// A request for the agent `target()`.
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptRequest {
    InstallTimedActionList {
        target: ObjectGuid,
        list_id: u32,
        timer: ListTimer,
        allow_override: bool,
        invoker: Option<ObjectGuid>,
    },
    SetData {
        target: ObjectGuid,
        field: u32,
        value: u32,
        invoker: Option<ObjectGuid>,
    },
    DoAction {
        target: ObjectGuid,
        action: u32,
    },
    StoreTargets {
        target: ObjectGuid,
        list_id: u32,
        targets: Vec<ObjectGuid>,
    },
    SetCounter {
        target: ObjectGuid,
        counter: u32,
        value: u32,
        reset: bool,
    },
    Ai {
        target: ObjectGuid,
        command: AiCommand,
    },
}

impl ScriptRequest {
    pub fn target(&self) -> ObjectGuid {
        match self {
            Self::InstallTimedActionList { target, .. }
            | Self::SetData { target, .. }
            | Self::DoAction { target, .. }
            | Self::StoreTargets { target, .. }
            | Self::SetCounter { target, .. }
            | Self::Ai { target, .. } => *target,
        }
    }
}
