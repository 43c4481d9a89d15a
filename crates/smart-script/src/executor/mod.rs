//! Action execution.
//!
//! Every action family lives in its own module. Each family handler claims
//! the actions it knows and reports whether it did, so [`SmartScript::execute`]
//! can route without listing every action twice.
mod combat;
mod script;
mod unit;
mod world;

use tracing::error;

use game_core::ObjectGuid;

use crate::action::Action;
use crate::engine::{ActionCtx, ScriptEnv, SmartScript};

impl SmartScript {
    /// Performs the rule's action on the resolved `targets`.
    pub(crate) fn execute(
        &mut self,
        env: &mut ScriptEnv<'_>,
        ctx: &ActionCtx<'_>,
        targets: Vec<ObjectGuid>,
    ) {
        if matches!(ctx.rule.action, Action::None) {
            return;
        }
        let handled = self.unit_action(env, ctx, &targets)
            || self.combat_action(env, ctx, &targets)
            || self.script_action(env, ctx, &targets)
            || self.world_action(env, ctx, &targets);
        if !handled {
            error!(
                agent = %self.owner(),
                rule = %ctx.rule.key,
                action = ctx.rule.action.name(),
                "action has no handler"
            );
        }
    }

    /// Picks one of `targets` at random.
    pub(crate) fn random_target(&mut self, targets: &[ObjectGuid]) -> Option<ObjectGuid> {
        if targets.is_empty() {
            return None;
        }
        let index = self.rng().index(targets.len());
        targets.get(index).copied()
    }

    /// Picks one of `choices` at random; `None` when there are none.
    pub(crate) fn random_choice(&mut self, choices: &[u32]) -> Option<u32> {
        if choices.is_empty() {
            return None;
        }
        let index = self.rng().index(choices.len());
        choices.get(index).copied()
    }
}

fn units(targets: &[ObjectGuid]) -> impl Iterator<Item = ObjectGuid> + '_ {
    targets.iter().copied().filter(ObjectGuid::is_unit)
}

fn creatures(targets: &[ObjectGuid]) -> impl Iterator<Item = ObjectGuid> + '_ {
    targets.iter().copied().filter(ObjectGuid::is_creature)
}

fn players(targets: &[ObjectGuid]) -> impl Iterator<Item = ObjectGuid> + '_ {
    targets.iter().copied().filter(ObjectGuid::is_player)
}

fn game_objects(targets: &[ObjectGuid]) -> impl Iterator<Item = ObjectGuid> + '_ {
    targets.iter().copied().filter(ObjectGuid::is_game_object)
}
