//! Per-call context threaded through dispatch, resolution and execution.
use combat::CombatWorld;
use game_core::{ObjectGuid, SpellInfo, UnitOracle, WorldOracle};

use crate::holder::Rule;

/// Mutable access to the two collaborators every engine call needs.
pub struct ScriptEnv<'a> {
    pub world: &'a mut dyn WorldOracle,
    pub combat: &'a mut CombatWorld,
}

impl<'a> ScriptEnv<'a> {
    pub fn new(world: &'a mut dyn WorldOracle, combat: &'a mut CombatWorld) -> Self {
        Self { world, combat }
    }

    pub fn units(&self) -> &dyn UnitOracle {
        self.world.as_units()
    }

    /// Has a threat list entry or any combat reference.
    pub fn is_engaged(&self, guid: ObjectGuid) -> bool {
        self.combat.is_engaged(guid)
    }

    /// Puts `unit` into combat with `enemy`, through its threat list when it has one.
    pub fn engage(&mut self, unit: ObjectGuid, enemy: ObjectGuid) {
        let units = self.world.as_units();
        if units.can_have_threat_list(unit) {
            self.combat
                .add_threat(units, unit, enemy, 0.0, None, true, true);
        } else {
            self.combat.set_in_combat_with(units, unit, enemy);
        }
    }
}

/// Arguments of one event occurrence.
///
/// Callbacks fill in the subset their event kind defines: the unit that
/// caused it, up to two numbers, a flag, and spell, object or text context.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventArgs {
    pub invoker: Option<ObjectGuid>,
    pub var0: u32,
    pub var1: u32,
    pub flag: bool,
    pub spell: Option<SpellInfo>,
    pub object: Option<ObjectGuid>,
    pub text: String,
}

impl EventArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invoked_by(invoker: Option<ObjectGuid>) -> Self {
        Self {
            invoker,
            ..Self::default()
        }
    }

    pub fn with_invoker(mut self, invoker: ObjectGuid) -> Self {
        self.invoker = Some(invoker);
        self
    }

    pub fn with_vars(mut self, var0: u32, var1: u32) -> Self {
        self.var0 = var0;
        self.var1 = var1;
        self
    }

    pub fn with_flag(mut self, flag: bool) -> Self {
        self.flag = flag;
        self
    }

    pub fn with_spell(mut self, spell: SpellInfo) -> Self {
        self.spell = Some(spell);
        self
    }

    pub fn with_object(mut self, object: ObjectGuid) -> Self {
        self.object = Some(object);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_owned();
        self
    }
}

/// What an executing action knows about its origin.
pub(crate) struct ActionCtx<'r> {
    pub rule: &'r Rule,
    pub args: &'r EventArgs,
    /// Invoker of this occurrence, or the last known one.
    pub trigger: Option<ObjectGuid>,
}
