use game_core::GameError;
use smart_script::{
    ActionKind, EventKind, LoadWarning, RuleKey, RuleTable, ScriptType, SmartScriptRow, TableError,
    TargetKind,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("smart_script=debug")
        .with_test_writer()
        .try_init();
}

fn creature(id: u32) -> SmartScriptRow {
    SmartScriptRow::new(100, ScriptType::Creature, id)
}

#[test]
fn bad_rows_are_left_out_of_an_otherwise_good_load() {
    init_logging();
    let mut unknown_action = creature(1).event(EventKind::Aggro, &[]);
    unknown_action.action_type = 9_999;
    let rows = vec![
        creature(0)
            .event(EventKind::Aggro, &[])
            .action(ActionKind::Cast, &[5000])
            .target(TargetKind::Victim, &[]),
        unknown_action,
        creature(2)
            .event(EventKind::GossipHello, &[0])
            .action(ActionKind::SetData, &[1, 1])
            .target(TargetKind::CreatureGuid, &[0, 100]),
        creature(3)
            .event(EventKind::UpdateIc, &[1000, 2000, 0, 0])
            .action(ActionKind::Die, &[]),
        creature(4)
            .event(EventKind::UpdateIc, &[1000, 2000, 3000, 4000])
            .action(ActionKind::Die, &[]),
    ];

    let (table, report) = RuleTable::from_rows(rows);

    assert_eq!(report.accepted, 2);
    assert_eq!(table.len(), 2);
    let codes: Vec<&str> = report.rejected.iter().map(GameError::error_code).collect();
    assert_eq!(
        codes,
        vec![
            "TABLE_UNKNOWN_ACTION",
            "TABLE_INVALID_PARAMS",
            "TABLE_MISSING_NOT_REPEATABLE"
        ]
    );
    assert!(report.rejected.iter().all(|e| e.key().is_some()));
    let ids: Vec<u32> = table
        .rules_for(100, ScriptType::Creature)
        .iter()
        .map(|r| r.id())
        .collect();
    assert_eq!(ids, vec![0, 4]);
}

#[test]
fn spawn_rules_and_timed_lists_live_apart() {
    let rows = vec![
        SmartScriptRow::new(-7, ScriptType::Creature, 0)
            .event(EventKind::Aggro, &[])
            .action(ActionKind::Die, &[]),
        creature(0)
            .event(EventKind::Aggro, &[])
            .action(ActionKind::Die, &[]),
        SmartScriptRow::new(300, ScriptType::TimedActionList, 0)
            .event(EventKind::UpdateIc, &[500, 500, 0, 0])
            .action(ActionKind::PlayEmote, &[1])
            .target(TargetKind::Myself, &[]),
        SmartScriptRow::new(300, ScriptType::TimedActionList, 1)
            .event(EventKind::UpdateIc, &[500, 500, 0, 0])
            .action(ActionKind::PlayEmote, &[2])
            .target(TargetKind::Myself, &[]),
    ];

    let (table, report) = RuleTable::from_rows(rows);

    assert!(report.is_clean(), "{report:?}");
    assert_eq!(table.rules_for(-7, ScriptType::Creature).len(), 1);
    assert_eq!(table.rules_for(100, ScriptType::Creature).len(), 1);
    assert_eq!(table.timed_list(300).len(), 2);
    assert!(table.timed_list(100).is_empty());
}

#[test]
fn a_link_to_nowhere_still_loads() {
    let (table, report) = RuleTable::from_rows([creature(0)
        .event(EventKind::Aggro, &[])
        .action(ActionKind::Die, &[])
        .link(3)]);

    assert_eq!(table.len(), 1);
    assert!(report.rejected.is_empty());
    assert_eq!(
        report.warnings,
        vec![LoadWarning::MissingLink {
            key: RuleKey::new(100, ScriptType::Creature, 0),
            link: 3,
        }]
    );
}

#[test]
fn phase_and_type_columns_are_checked() {
    let mut unknown_type = creature(0).event(EventKind::Aggro, &[]);
    unknown_type.source_type = 77;
    let rows = vec![
        unknown_type,
        creature(1).event(EventKind::Aggro, &[]).phases(1 << 12),
        SmartScriptRow::new(5, ScriptType::AreaTrigger, 0)
            .event(EventKind::Aggro, &[])
            .action(ActionKind::Die, &[]),
    ];

    let (table, report) = RuleTable::from_rows(rows);

    assert!(table.is_empty());
    assert!(matches!(
        report.rejected.as_slice(),
        [
            TableError::UnknownScriptType { value: 77, .. },
            TableError::PhaseMaskOutOfRange { .. },
            TableError::EventNotAllowed { .. },
        ]
    ));
}
