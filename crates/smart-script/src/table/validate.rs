//! Row to rule conversion.
use game_core::{EngineConfig, Position};

use crate::action::{Action, ActionKind};
use crate::error::TableError;
use crate::event::{Event, EventFlags, EventKind, EventParams};
use crate::holder::{Rule, RuleKey, ScriptType};
use crate::params::ParamReader;
use crate::table::{LoadWarning, SmartScriptRow};
use crate::target::{Target, TargetKind, TargetSelector};

/// Converts one row into a typed rule, or explains why it cannot run.
pub(crate) fn convert(
    row: &SmartScriptRow,
    warnings: &mut Vec<LoadWarning>,
) -> Result<Rule, TableError> {
    let script_type =
        ScriptType::from_u32(row.source_type).ok_or(TableError::UnknownScriptType {
            entry_or_guid: row.entry_or_guid,
            id: row.id,
            value: row.source_type,
        })?;
    let key = RuleKey::new(row.entry_or_guid, script_type, row.id);

    if row.link != 0 && row.link == row.id {
        return Err(TableError::SelfLink { key });
    }

    let event = convert_event(key, row, warnings)?;

    let action_kind = ActionKind::from_repr(row.action_type).ok_or(TableError::UnknownAction {
        key,
        value: row.action_type,
    })?;
    let mut reader = ParamReader::new(key, "action", &row.action_params);
    let action = Action::parse(action_kind, &mut reader)?;
    reader.finish(warnings);

    let target_kind = TargetKind::from_repr(row.target_type).ok_or(TableError::UnknownTarget {
        key,
        value: row.target_type,
    })?;
    let mut reader = ParamReader::new(key, "target", &row.target_params);
    let selector = TargetSelector::parse(target_kind, &mut reader)?;
    reader.finish(warnings);
    let target = Target::new(selector).at(Position::new(
        row.target_x,
        row.target_y,
        row.target_z,
        row.target_o,
    ));

    Ok(Rule {
        key,
        link: row.link,
        event,
        action,
        target,
        comment: row.comment.clone(),
    })
}

fn convert_event(
    key: RuleKey,
    row: &SmartScriptRow,
    warnings: &mut Vec<LoadWarning>,
) -> Result<Event, TableError> {
    let kind = EventKind::from_u32(row.event_type).ok_or(TableError::UnknownEvent {
        key,
        value: row.event_type,
    })?;
    if !kind.is_allowed_for(key.source_type) {
        return Err(TableError::EventNotAllowed {
            key,
            event: kind.into(),
            script_type: key.source_type.into(),
        });
    }
    if !EngineConfig::is_valid_phase_mask(row.event_phase_mask) {
        return Err(TableError::PhaseMaskOutOfRange {
            key,
            mask: row.event_phase_mask,
        });
    }
    let flags = EventFlags::from_bits(row.event_flags).ok_or(TableError::UnknownEventFlags {
        key,
        bits: row.event_flags & !EventFlags::all().bits(),
    })?;
    if row.event_chance > 100 {
        return Err(TableError::ChanceOutOfRange {
            key,
            chance: row.event_chance,
        });
    }

    let mut reader = ParamReader::new(key, "event", &row.event_params);
    let params = EventParams::parse(kind, &mut reader, &row.event_param_string)?;
    reader.finish(warnings);

    // Timed action list entries get their pacing from the list, not a repeat.
    if kind.is_timer_driven()
        && key.source_type != ScriptType::TimedActionList
        && params.repeat_window() == Some((0, 0))
        && !flags.contains(EventFlags::NOT_REPEATABLE)
    {
        return Err(TableError::MissingNotRepeatable {
            key,
            event: kind.into(),
        });
    }

    Ok(Event {
        kind,
        params,
        phase_mask: row.event_phase_mask,
        chance: row.event_chance,
        flags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> SmartScriptRow {
        SmartScriptRow::new(100, ScriptType::Creature, 0)
    }

    #[test]
    fn valid_row_converts() {
        let mut warnings = Vec::new();
        let rule = convert(
            &row()
                .event(EventKind::Aggro, &[])
                .action(ActionKind::Cast, &[5000])
                .target(TargetKind::Victim, &[]),
            &mut warnings,
        );
        let Ok(rule) = rule else {
            panic!("aggro cast should convert");
        };
        assert_eq!(rule.event.kind, EventKind::Aggro);
        assert!(matches!(rule.action, Action::Cast { spell: 5000, .. }));
        assert!(warnings.is_empty());
    }

    #[test]
    fn self_link_is_rejected() {
        let result = convert(&row().link(0).event(EventKind::Aggro, &[]), &mut Vec::new());
        assert!(result.is_ok());
        let mut linked = row().event(EventKind::Aggro, &[]);
        linked.id = 4;
        linked.link = 4;
        assert!(matches!(
            convert(&linked, &mut Vec::new()),
            Err(TableError::SelfLink { .. })
        ));
    }

    #[test]
    fn unbounded_timer_needs_not_repeatable() {
        let unbounded = row().event(EventKind::UpdateOoc, &[1000, 1000, 0, 0]);
        assert!(matches!(
            convert(&unbounded, &mut Vec::new()),
            Err(TableError::MissingNotRepeatable { .. })
        ));
        let once = unbounded.flags(EventFlags::NOT_REPEATABLE);
        assert!(convert(&once, &mut Vec::new()).is_ok());

        let mut listed = row().event(EventKind::UpdateIc, &[1000, 1000, 0, 0]);
        listed.source_type = ScriptType::TimedActionList as u32;
        assert!(convert(&listed, &mut Vec::new()).is_ok());
    }

    #[test]
    fn event_domain_is_checked() {
        let mut gossip = row().event(EventKind::GossipHello, &[]);
        gossip.source_type = ScriptType::AreaTrigger as u32;
        assert!(matches!(
            convert(&gossip, &mut Vec::new()),
            Err(TableError::EventNotAllowed { .. })
        ));
    }

    #[test]
    fn header_columns_are_bounded() {
        assert!(matches!(
            convert(&row().event(EventKind::Aggro, &[]).chance(101), &mut Vec::new()),
            Err(TableError::ChanceOutOfRange { chance: 101, .. })
        ));
        assert!(matches!(
            convert(&row().event(EventKind::Aggro, &[]).phases(0x1000), &mut Vec::new()),
            Err(TableError::PhaseMaskOutOfRange { .. })
        ));
        let mut flagged = row().event(EventKind::Aggro, &[]);
        flagged.event_flags = 0x40;
        assert!(matches!(
            convert(&flagged, &mut Vec::new()),
            Err(TableError::UnknownEventFlags { bits: 0x40, .. })
        ));
        let mut unknown = row();
        unknown.event_type = 14;
        assert!(matches!(
            convert(&unknown, &mut Vec::new()),
            Err(TableError::UnknownEvent { value: 14, .. })
        ));
    }

    #[test]
    fn leftover_params_warn_without_rejecting() {
        let mut warnings = Vec::new();
        let rule = convert(
            &row()
                .event(EventKind::Aggro, &[0, 0, 0, 0, 9])
                .action(ActionKind::Die, &[1]),
            &mut warnings,
        );
        assert!(rule.is_ok());
        assert_eq!(warnings.len(), 2);
    }
}
