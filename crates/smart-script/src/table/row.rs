//! Positional rule rows as authored in content files.
use crate::action::ActionKind;
use crate::event::{EventFlags, EventKind};
use crate::holder::ScriptType;
use crate::target::TargetKind;

/// One authored rule before validation.
///
/// Column layout follows the content tables: five event parameters, seven
/// action parameters and four target parameters plus a literal position.
/// Every column but the chance (100) defaults to zero so content files only
/// spell out what a rule uses.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SmartScriptRow {
    pub entry_or_guid: i64,
    pub source_type: u32,
    pub id: u32,
    pub link: u32,
    pub event_type: u32,
    pub event_phase_mask: u32,
    pub event_chance: u32,
    pub event_flags: u32,
    pub event_params: [u32; 5],
    pub event_param_string: String,
    pub action_type: u32,
    pub action_params: [u32; 7],
    pub target_type: u32,
    pub target_params: [u32; 4],
    pub target_x: f32,
    pub target_y: f32,
    pub target_z: f32,
    pub target_o: f32,
    pub comment: String,
}

impl Default for SmartScriptRow {
    fn default() -> Self {
        Self {
            entry_or_guid: 0,
            source_type: 0,
            id: 0,
            link: 0,
            event_type: 0,
            event_phase_mask: 0,
            event_chance: 100,
            event_flags: 0,
            event_params: [0; 5],
            event_param_string: String::new(),
            action_type: 0,
            action_params: [0; 7],
            target_type: 0,
            target_params: [0; 4],
            target_x: 0.0,
            target_y: 0.0,
            target_z: 0.0,
            target_o: 0.0,
            comment: String::new(),
        }
    }
}

impl SmartScriptRow {
    pub fn new(entry_or_guid: i64, source_type: ScriptType, id: u32) -> Self {
        Self {
            entry_or_guid,
            source_type: source_type as u32,
            id,
            ..Self::default()
        }
    }

    pub fn event(mut self, kind: EventKind, params: &[u32]) -> Self {
        self.event_type = kind as u32;
        copy_into(&mut self.event_params, params);
        self
    }

    pub fn action(mut self, kind: ActionKind, params: &[u32]) -> Self {
        self.action_type = kind as u32;
        copy_into(&mut self.action_params, params);
        self
    }

    pub fn target(mut self, kind: TargetKind, params: &[u32]) -> Self {
        self.target_type = kind as u32;
        copy_into(&mut self.target_params, params);
        self
    }

    pub fn at(mut self, x: f32, y: f32, z: f32, o: f32) -> Self {
        self.target_x = x;
        self.target_y = y;
        self.target_z = z;
        self.target_o = o;
        self
    }

    pub fn link(mut self, link: u32) -> Self {
        self.link = link;
        self
    }

    pub fn phases(mut self, mask: u32) -> Self {
        self.event_phase_mask = mask;
        self
    }

    pub fn chance(mut self, chance: u32) -> Self {
        self.event_chance = chance;
        self
    }

    pub fn flags(mut self, flags: EventFlags) -> Self {
        self.event_flags = flags.bits();
        self
    }

    pub fn param_string(mut self, value: &str) -> Self {
        self.event_param_string = value.to_owned();
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_owned();
        self
    }
}

fn copy_into<const N: usize>(columns: &mut [u32; N], params: &[u32]) {
    for (column, value) in columns.iter_mut().zip(params) {
        *column = *value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_columns_in_order() {
        let row = SmartScriptRow::new(100, ScriptType::Creature, 3)
            .event(EventKind::UpdateIc, &[1000, 2000, 5000, 5000])
            .action(ActionKind::Cast, &[5000])
            .target(TargetKind::Victim, &[]);
        assert_eq!(row.event_type, 0);
        assert_eq!(row.event_params, [1000, 2000, 5000, 5000, 0]);
        assert_eq!(row.action_params[0], 5000);
        assert_eq!(row.target_type, 2);
        assert_eq!(row.event_chance, 100);
    }
}
