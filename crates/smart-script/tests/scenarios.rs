use std::sync::Arc;

use game_core::{EngineConfig, ObjectGuid, ObjectRecord, UnitOracle, WorldCommand, WorldSnapshot};
use smart_script::{
    ActionKind, AiCommand, EscortState, EventFlags, EventKind, PathTable, QuestStatus, RuleTable,
    ScriptAgent, ScriptCatalog, ScriptError, ScriptMap, ScriptRequest, ScriptType, SmartAi,
    SmartAreaTriggerAi, SmartGameObjectAi, SmartQuestAi, SmartSceneAi, SmartScriptRow,
    TargetKind, WaypointRow,
};

const NPC: u32 = 100;

fn npc() -> ObjectGuid {
    ObjectGuid::creature(NPC, 1)
}

fn player() -> ObjectGuid {
    ObjectGuid::player(1)
}

fn rule(id: u32) -> SmartScriptRow {
    SmartScriptRow::new(i64::from(NPC), ScriptType::Creature, id)
}

fn catalog_with(
    rows: Vec<SmartScriptRow>,
    waypoints: Vec<WaypointRow>,
    config: EngineConfig,
) -> Arc<ScriptCatalog> {
    let (rules, report) = RuleTable::from_rows(rows);
    assert!(report.rejected.is_empty(), "rejected rows: {:?}", report.rejected);
    let (paths, rejected) = PathTable::from_rows(waypoints);
    assert!(rejected.is_empty(), "rejected nodes: {rejected:?}");
    ScriptCatalog::new(rules, paths, config)
}

fn catalog(rows: Vec<SmartScriptRow>) -> Arc<ScriptCatalog> {
    catalog_with(rows, Vec::new(), EngineConfig::new())
}

fn world() -> WorldSnapshot {
    WorldSnapshot::new()
        .with(ObjectRecord::creature(NPC, 1))
        .with(ObjectRecord::player(1).at(2.0, 0.0, 0.0))
}

fn map_with(world: WorldSnapshot, catalog: &Arc<ScriptCatalog>, creatures: &[ObjectGuid]) -> ScriptMap<WorldSnapshot> {
    let mut map = ScriptMap::new(world, &EngineConfig::new());
    for guid in creatures {
        map.add_agent(Box::new(SmartAi::new(Arc::clone(catalog), *guid)))
            .unwrap();
    }
    map
}

fn emotes_of(world: &WorldSnapshot, who: ObjectGuid) -> Vec<u32> {
    world
        .commands()
        .iter()
        .filter_map(|command| match command {
            WorldCommand::PlayEmote { unit, emote } if *unit == who => Some(*emote),
            _ => None,
        })
        .collect()
}

fn count(world: &WorldSnapshot, matches: impl Fn(&WorldCommand) -> bool) -> usize {
    world.commands().iter().filter(|c| matches(c)).count()
}

fn emote_rule(id: u32, event: EventKind, params: &[u32], emote: u32) -> SmartScriptRow {
    rule(id)
        .event(event, params)
        .action(ActionKind::PlayEmote, &[emote])
        .target(TargetKind::Myself, &[])
}

#[test]
fn aggro_casts_at_the_attacker() {
    let catalog = catalog(vec![
        rule(0)
            .event(EventKind::Aggro, &[])
            .action(ActionKind::Cast, &[5000])
            .target(TargetKind::Victim, &[]),
    ]);
    let mut map = map_with(world(), &catalog, &[npc()]);

    map.deal_damage(player(), npc(), 10, 100, 100);

    assert!(map.world().commands().contains(&WorldCommand::CastSpell {
        caster: npc(),
        target: player(),
        spell: 5000,
        triggered: false,
    }));
    assert!(map.combat().is_in_combat_with(npc(), player()));

    // a second hit must not raise AGGRO again
    map.deal_damage(player(), npc(), 10, 90, 100);
    assert_eq!(count(map.world(), |c| matches!(c, WorldCommand::CastSpell { .. })), 1);
}

#[test]
fn cross_cast_resolves_casters_and_targets_apart() {
    let helper = |counter| ObjectGuid::creature(200, counter);
    let catalog = catalog(vec![
        rule(0)
            .event(EventKind::GossipHello, &[0])
            .action(
                ActionKind::CrossCast,
                &[7000, 0, TargetKind::CreatureRange as u32, 200, 0, 10],
            )
            .target(TargetKind::ActionInvoker, &[]),
    ]);
    let world = world()
        .with(ObjectRecord::creature(200, 2).at(5.0, 0.0, 0.0))
        .with(ObjectRecord::creature(200, 3).at(8.0, 0.0, 0.0))
        .with(ObjectRecord::creature(200, 4).at(30.0, 0.0, 0.0));
    let mut map = map_with(world, &catalog, &[npc()]);

    map.with_creature(npc(), |ai, env| ai.gossip_hello(env, player()))
        .unwrap();

    let casts: Vec<(ObjectGuid, ObjectGuid)> = map
        .world()
        .commands()
        .iter()
        .filter_map(|command| match command {
            WorldCommand::CastSpell {
                caster,
                target,
                spell: 7000,
                ..
            } => Some((*caster, *target)),
            _ => None,
        })
        .collect();
    assert_eq!(casts, vec![(helper(2), player()), (helper(3), player())]);
}

#[test]
fn ooc_timer_fires_then_repeats() {
    let catalog = catalog(vec![emote_rule(0, EventKind::UpdateOoc, &[1000, 1000, 2000, 2000], 1)]);
    let mut map = map_with(world(), &catalog, &[npc()]);

    map.update(999);
    assert!(emotes_of(map.world(), npc()).is_empty());
    map.update(1);
    assert_eq!(emotes_of(map.world(), npc()), vec![1]);

    map.update(1000);
    assert_eq!(emotes_of(map.world(), npc()).len(), 1);
    map.update(1000);
    assert_eq!(emotes_of(map.world(), npc()), vec![1, 1]);
}

#[test]
fn not_repeatable_rule_fires_once() {
    let catalog = catalog(vec![
        emote_rule(0, EventKind::UpdateOoc, &[0, 0, 0, 0], 2).flags(EventFlags::NOT_REPEATABLE),
    ]);
    let mut map = map_with(world(), &catalog, &[npc()]);

    for _ in 0..5 {
        map.update(100);
    }

    assert_eq!(emotes_of(map.world(), npc()), vec![2]);
}

#[test]
fn phase_mask_gates_rules() {
    let catalog = catalog(vec![
        emote_rule(0, EventKind::UpdateOoc, &[100, 100, 100, 100], 3).phases(1 << 1),
        rule(1)
            .event(EventKind::GossipHello, &[0])
            .action(ActionKind::SetEventPhase, &[2])
            .target(TargetKind::Myself, &[]),
        emote_rule(2, EventKind::EventPhaseChange, &[1 << 1], 4),
    ]);
    let mut map = map_with(world(), &catalog, &[npc()]);

    map.update(100);
    assert!(emotes_of(map.world(), npc()).is_empty());

    map.with_creature(npc(), |ai, env| ai.gossip_hello(env, player()))
        .unwrap();
    assert_eq!(map.agent(npc()).unwrap().script().phase(), 2);
    assert_eq!(emotes_of(map.world(), npc()), vec![4]);

    map.update(100);
    assert_eq!(emotes_of(map.world(), npc()), vec![4, 3]);
}

#[test]
fn phase_step_applies_increment_then_decrement() {
    let catalog = catalog(vec![
        rule(0)
            .event(EventKind::GossipHello, &[0])
            .action(ActionKind::SetEventPhase, &[5])
            .target(TargetKind::Myself, &[]),
        rule(1)
            .event(EventKind::ActionDone, &[1])
            .action(ActionKind::IncEventPhase, &[2, 1])
            .target(TargetKind::Myself, &[]),
        rule(2)
            .event(EventKind::ActionDone, &[2])
            .action(ActionKind::IncEventPhase, &[0, 9])
            .target(TargetKind::Myself, &[]),
    ]);
    let mut map = map_with(world(), &catalog, &[npc()]);
    let phase = |map: &ScriptMap<WorldSnapshot>| map.agent(npc()).unwrap().script().phase();

    map.with_creature(npc(), |ai, env| ai.gossip_hello(env, player()))
        .unwrap();
    assert_eq!(phase(&map), 5);

    map.with_creature(npc(), |ai, env| ai.do_action(env, 1))
        .unwrap();
    assert_eq!(phase(&map), 6);

    // decrement clamps at zero
    map.with_creature(npc(), |ai, env| ai.do_action(env, 2))
        .unwrap();
    assert_eq!(phase(&map), 0);
}

#[test]
fn rules_fire_in_authoring_order() {
    let catalog = catalog(vec![
        emote_rule(7, EventKind::GossipHello, &[0], 1),
        emote_rule(2, EventKind::GossipHello, &[0], 2),
        emote_rule(4, EventKind::GossipHello, &[0], 3),
    ]);
    let mut map = map_with(world(), &catalog, &[npc()]);

    map.with_creature(npc(), |ai, env| ai.gossip_hello(env, player()))
        .unwrap();

    assert_eq!(emotes_of(map.world(), npc()), vec![1, 2, 3]);
}

#[test]
fn linked_rules_run_in_chain() {
    let catalog = catalog(vec![
        emote_rule(0, EventKind::GossipHello, &[0], 5).link(1),
        emote_rule(1, EventKind::Link, &[], 6).link(2),
        emote_rule(2, EventKind::Link, &[], 7),
    ]);
    let mut map = map_with(world(), &catalog, &[npc()]);

    map.with_creature(npc(), |ai, env| ai.gossip_hello(env, player()))
        .unwrap();

    assert_eq!(emotes_of(map.world(), npc()), vec![5, 6, 7]);
}

#[test]
fn timed_action_list_runs_entries_in_order() {
    let list = |id: u32, delay: u32, emote: u32| {
        SmartScriptRow::new(5000, ScriptType::TimedActionList, id)
            .event(EventKind::UpdateIc, &[delay, delay, 0, 0])
            .action(ActionKind::PlayEmote, &[emote])
            .target(TargetKind::Myself, &[])
    };
    let catalog = catalog(vec![
        rule(0)
            .event(EventKind::GossipHello, &[0])
            .action(ActionKind::CallTimedActionList, &[5000, 2, 0])
            .target(TargetKind::Myself, &[]),
        list(0, 1000, 10),
        list(1, 2000, 11),
    ]);
    let mut map = map_with(world(), &catalog, &[npc()]);

    map.with_creature(npc(), |ai, env| ai.gossip_hello(env, player()))
        .unwrap();
    assert!(map.agent(npc()).unwrap().script().has_timed_action_list());

    // the second entry starts counting in the tick the first one fires
    map.update(1000);
    assert_eq!(emotes_of(map.world(), npc()), vec![10]);
    map.update(999);
    assert_eq!(emotes_of(map.world(), npc()), vec![10]);
    map.update(1);
    assert_eq!(emotes_of(map.world(), npc()), vec![10, 11]);

    map.update(100);
    assert!(!map.agent(npc()).unwrap().script().has_timed_action_list());
}

fn timed_event_rules() -> Vec<SmartScriptRow> {
    vec![
        rule(0)
            .event(EventKind::GossipHello, &[0])
            .action(ActionKind::CreateTimedEvent, &[7, 1000, 1000, 0, 0, 100]),
        emote_rule(1, EventKind::TimedEventTriggered, &[7], 8),
        rule(2)
            .event(EventKind::ReceiveEmote, &[5, 0, 0])
            .action(ActionKind::RemoveTimedEvent, &[7]),
    ]
}

#[test]
fn created_timed_event_fires_once() {
    let catalog = catalog(timed_event_rules());
    let mut map = map_with(world(), &catalog, &[npc()]);

    map.with_creature(npc(), |ai, env| ai.gossip_hello(env, player()))
        .unwrap();
    map.update(1000);
    assert_eq!(emotes_of(map.world(), npc()), vec![8]);

    map.update(5000);
    assert_eq!(emotes_of(map.world(), npc()), vec![8]);
    assert_eq!(map.agent(npc()).unwrap().script().stored_event_count(), 0);
}

#[test]
fn removed_timed_event_never_fires() {
    let catalog = catalog(timed_event_rules());
    let mut map = map_with(world(), &catalog, &[npc()]);

    map.with_creature(npc(), |ai, env| ai.gossip_hello(env, player()))
        .unwrap();
    map.update(500);
    assert_eq!(map.agent(npc()).unwrap().script().stored_event_ids(), vec![7]);

    map.with_creature(npc(), |ai, env| ai.received_emote(env, player(), 5))
        .unwrap();
    map.update(1000);

    assert!(emotes_of(map.world(), npc()).is_empty());
    assert!(map.agent(npc()).unwrap().script().stored_event_ids().is_empty());
}

#[test]
fn counter_event_matches_exact_value() {
    let catalog = catalog(vec![
        rule(0)
            .event(EventKind::GossipHello, &[0])
            .action(ActionKind::SetCounter, &[1, 1, 0])
            .target(TargetKind::Myself, &[]),
        emote_rule(1, EventKind::CounterSet, &[1, 2, 0, 0], 9),
    ]);
    let mut map = map_with(world(), &catalog, &[npc()]);

    map.with_creature(npc(), |ai, env| ai.gossip_hello(env, player()))
        .unwrap();
    assert!(emotes_of(map.world(), npc()).is_empty());
    map.with_creature(npc(), |ai, env| ai.gossip_hello(env, player()))
        .unwrap();

    assert_eq!(map.agent(npc()).unwrap().script().counter(1), Some(2));
    assert_eq!(emotes_of(map.world(), npc()), vec![9]);
}

#[test]
fn set_data_reaches_a_nearby_creature() {
    let other = ObjectGuid::creature(101, 2);
    let catalog = catalog(vec![
        rule(0)
            .event(EventKind::GossipHello, &[0])
            .action(ActionKind::SetData, &[3, 4])
            .target(TargetKind::ClosestCreature, &[101, 20, 0]),
        SmartScriptRow::new(101, ScriptType::Creature, 0)
            .event(EventKind::DataSet, &[3, 4, 0, 0])
            .action(ActionKind::PlayEmote, &[30])
            .target(TargetKind::Myself, &[]),
    ]);
    let world = world().with(ObjectRecord::creature(101, 2).at(5.0, 0.0, 0.0));
    let mut map = map_with(world, &catalog, &[npc(), other]);

    map.with_creature(npc(), |ai, env| ai.gossip_hello(env, player()))
        .unwrap();

    assert_eq!(emotes_of(map.world(), other), vec![30]);
    assert_eq!(map.agent(other).unwrap().script().last_invoker(), Some(npc()));
}

#[test]
fn escort_fails_when_the_invoker_leaves() {
    let escort = ObjectGuid::creature(200, 1);
    let waypoints = (1..=3)
        .map(|point_id| WaypointRow {
            path_id: 1,
            point_id,
            x: point_id as f32 * 10.0,
            y: 0.0,
            z: 0.0,
            orientation: None,
            delay_ms: 0,
        })
        .collect();
    let catalog = catalog_with(
        vec![
            SmartScriptRow::new(200, ScriptType::Creature, 0)
                .event(EventKind::GossipHello, &[0])
                .action(ActionKind::WpStart, &[0, 1, 0, 777, 0])
                .target(TargetKind::ActionInvoker, &[]),
            SmartScriptRow::new(200, ScriptType::Creature, 1)
                .event(EventKind::Death, &[])
                .action(ActionKind::PlayEmote, &[1])
                .target(TargetKind::Myself, &[]),
        ],
        waypoints,
        EngineConfig::new(),
    );
    let world = WorldSnapshot::new()
        .with(ObjectRecord::creature(200, 1))
        .with(ObjectRecord::player(1).at(2.0, 0.0, 0.0));
    let mut map = map_with(world, &catalog, &[escort]);

    let state = map
        .with_creature(escort, |ai, env| {
            ai.gossip_hello(env, player());
            ai.escort_state()
        })
        .unwrap();
    assert_eq!(state, EscortState::ESCORTING);
    assert!(map.world().commands().contains(&WorldCommand::MovePath {
        mover: escort,
        path_id: 1,
        start_point: 0,
        repeat: false,
    }));

    map.world_mut().move_to(player(), 500.0, 0.0, 0.0).unwrap();
    map.update(1000);
    map.update(1000);

    let world = map.world();
    assert_eq!(emotes_of(world, escort), vec![1]);
    assert_eq!(
        count(world, |c| matches!(c, WorldCommand::Despawn { object, .. } if *object == escort)),
        1
    );
    assert!(world.commands().contains(&WorldCommand::FailQuest {
        player: player(),
        quest: 777,
    }));
    let state = map
        .with_creature(escort, |ai, _| ai.escort_state())
        .unwrap();
    assert!(state.is_empty());
}

#[test]
fn completed_follow_credits_the_player() {
    let follower = ObjectGuid::creature(300, 1);
    let catalog = catalog(vec![
        SmartScriptRow::new(300, ScriptType::Creature, 0)
            .event(EventKind::GossipHello, &[0])
            .action(ActionKind::Follow, &[2, 0, 301, 999, 0])
            .target(TargetKind::ActionInvoker, &[]),
        SmartScriptRow::new(300, ScriptType::Creature, 1)
            .event(EventKind::FollowCompleted, &[])
            .action(ActionKind::PlayEmote, &[40])
            .target(TargetKind::Myself, &[]),
    ]);
    let world = WorldSnapshot::new()
        .with(ObjectRecord::creature(300, 1))
        .with(ObjectRecord::creature(301, 2).at(50.0, 0.0, 0.0))
        .with(ObjectRecord::player(1).at(2.0, 0.0, 0.0));
    let mut map = map_with(world, &catalog, &[follower]);

    let target = map
        .with_creature(follower, |ai, env| {
            ai.gossip_hello(env, player());
            ai.follow_target()
        })
        .unwrap();
    assert_eq!(target, Some(player()));

    map.update(1000);
    assert!(emotes_of(map.world(), follower).is_empty());

    map.world_mut().move_to(follower, 48.0, 0.0, 0.0).unwrap();
    map.update(1000);
    assert!(map.world().commands().contains(&WorldCommand::KilledMonsterCredit {
        player: player(),
        entry: 999,
    }));
    assert_eq!(emotes_of(map.world(), follower), vec![40]);

    map.update(5000);
    assert!(!map.world().is_in_world(follower));
}

#[test]
fn evade_sends_the_creature_home() {
    let catalog = catalog(vec![emote_rule(0, EventKind::Evade, &[], 50)]);
    let mut map = map_with(world(), &catalog, &[npc()]);
    map.deal_damage(player(), npc(), 10, 100, 100);
    assert!(map.combat().is_in_combat(npc()));

    let evading = map
        .with_creature(npc(), |ai, env| {
            ai.enter_evade_mode(env);
            ai.is_evading()
        })
        .unwrap();

    assert!(evading);
    assert!(!map.combat().is_in_combat(npc()));
    assert_eq!(emotes_of(map.world(), npc()), vec![50]);
    assert!(map.world().commands().contains(&WorldCommand::MoveHome { mover: npc() }));

    let evading = map
        .with_creature(npc(), |ai, env| {
            ai.just_reached_home(env);
            ai.is_evading()
        })
        .unwrap();
    assert!(!evading);
}

#[test]
fn runaway_action_chain_is_cut_off() {
    let catalog = catalog_with(
        vec![
            emote_rule(0, EventKind::ActionDone, &[1], 60).link(1),
            rule(1)
                .event(EventKind::Link, &[])
                .action(ActionKind::DoAction, &[1])
                .target(TargetKind::Myself, &[]),
        ],
        Vec::new(),
        EngineConfig::new().with_max_dispatch_depth(8),
    );
    let mut map = map_with(world(), &catalog, &[npc()]);

    map.with_creature(npc(), |ai, env| ai.do_action(env, 1))
        .unwrap();

    assert_eq!(emotes_of(map.world(), npc()), vec![60; 4]);
}

#[test]
fn game_object_rule_can_wait_for_report_use() {
    let chest = ObjectGuid::game_object(400, 1);
    let catalog = catalog(vec![
        SmartScriptRow::new(400, ScriptType::GameObject, 0)
            .event(EventKind::GossipHello, &[2])
            .action(ActionKind::GoSetLootState, &[3])
            .target(TargetKind::Myself, &[]),
    ]);
    let world = world().with(ObjectRecord::game_object(400, 1).at(1.0, 1.0, 0.0));
    let mut map = ScriptMap::new(world, &EngineConfig::new());
    let mut ai = SmartGameObjectAi::new(catalog, chest);
    let loot_state = |map: &ScriptMap<WorldSnapshot>| {
        count(map.world(), |c| {
            matches!(c, WorldCommand::SetLootState { object, state: 3 } if *object == chest)
        })
    };

    map.with_env(|env| {
        ai.initialize(env);
        ai.gossip_hello(env, player());
    });
    assert_eq!(loot_state(&map), 0);

    map.with_env(|env| ai.report_use(env, player()));
    assert_eq!(loot_state(&map), 1);
}

#[test]
fn game_object_refuses_creature_commands() {
    let chest = ObjectGuid::game_object(400, 1);
    let catalog = catalog(Vec::new());
    let world = world().with(ObjectRecord::game_object(400, 1));
    let mut map = ScriptMap::new(world, &EngineConfig::new());
    map.add_agent(Box::new(SmartGameObjectAi::new(catalog, chest)))
        .unwrap();

    let refused = map
        .with_agent(chest, |agent, env| {
            agent.deliver(
                env,
                ScriptRequest::Ai {
                    target: chest,
                    command: AiCommand::EnterEvadeMode,
                },
            )
        })
        .unwrap();

    assert!(matches!(refused, Err(ScriptError::MissingCapability { .. })));
    assert!(matches!(
        map.with_creature(chest, |_, _| ()),
        Err(ScriptError::MissingCapability { .. })
    ));
}

#[test]
fn area_trigger_credits_the_entering_player() {
    let trigger = ObjectGuid::area_trigger(4000, 1);
    let catalog = catalog(vec![
        SmartScriptRow::new(4000, ScriptType::AreaTrigger, 0)
            .event(EventKind::AreaTriggerOnTrigger, &[0])
            .action(ActionKind::CallAreaExploredOrEventHappens, &[66])
            .target(TargetKind::ActionInvoker, &[]),
    ]);
    let mut map = ScriptMap::new(world(), &EngineConfig::new());
    let mut ai = SmartAreaTriggerAi::new(catalog, trigger);
    assert_eq!(ai.trigger_id(), 4000);

    map.with_env(|env| {
        ai.initialize(env);
        ai.update(env, 100);
    });
    assert!(map.world().commands().is_empty());

    map.with_env(|env| ai.enter(env, player()));
    assert_eq!(
        map.world().commands(),
        &[WorldCommand::AreaExploredOrEventHappens {
            player: player(),
            quest: 66,
        }]
    );
    assert!(matches!(
        map.with_env(|env| ai.deliver(env, ScriptRequest::DoAction { target: trigger, action: 1 })),
        Err(ScriptError::MissingCapability { .. })
    ));
}

#[test]
fn scene_trigger_matches_its_name() {
    let scene = ObjectGuid::scene(8, 1);
    let catalog = catalog(vec![
        SmartScriptRow::new(8, ScriptType::Scene, 0)
            .event(EventKind::SceneTrigger, &[])
            .param_string("door")
            .action(ActionKind::PlayMovie, &[12])
            .target(TargetKind::ActionInvoker, &[]),
    ]);
    let mut map = ScriptMap::new(world(), &EngineConfig::new());
    let mut ai = SmartSceneAi::new(catalog, scene);

    map.with_env(|env| {
        ai.initialize(env);
        ai.trigger(env, player(), "window");
    });
    assert!(map.world().commands().is_empty());

    map.with_env(|env| ai.trigger(env, player(), "door"));
    assert_eq!(
        map.world().commands(),
        &[WorldCommand::PlayMovie {
            player: player(),
            movie: 12,
        }]
    );
}

#[test]
fn quest_completion_rewards_the_player() {
    let catalog = catalog(vec![
        SmartScriptRow::new(55, ScriptType::Quest, 0)
            .event(EventKind::QuestCompletion, &[])
            .action(ActionKind::AddItem, &[9, 1])
            .target(TargetKind::ActionInvoker, &[]),
    ]);
    let mut map = ScriptMap::new(world(), &EngineConfig::new());
    let mut quest = SmartQuestAi::new(catalog, player(), 55);
    assert_eq!(quest.quest(), 55);

    map.with_env(|env| {
        quest.initialize(env);
        quest.status_changed(env, QuestStatus::Incomplete);
    });
    assert!(map.world().commands().is_empty());

    map.with_env(|env| quest.status_changed(env, QuestStatus::Complete));
    assert_eq!(
        map.world().commands(),
        &[WorldCommand::AddItem {
            player: player(),
            item: 9,
            count: 1,
        }]
    );
    assert_eq!("rewarded".parse::<QuestStatus>().ok(), Some(QuestStatus::Rewarded));
}

#[test]
fn quest_requests_are_routed_through_the_map() {
    let catalog = catalog(vec![
        SmartScriptRow::new(55, ScriptType::Quest, 0)
            .event(EventKind::QuestAccepted, &[])
            .action(ActionKind::SetData, &[1, 1])
            .target(TargetKind::ClosestCreature, &[NPC, 30, 0]),
        emote_rule(0, EventKind::DataSet, &[1, 1, 0, 0], 70),
    ]);
    let mut map = map_with(world(), &catalog, &[npc()]);
    let mut quest = SmartQuestAi::new(Arc::clone(&catalog), player(), 55);

    map.with_env(|env| {
        quest.initialize(env);
        quest.status_changed(env, QuestStatus::Incomplete);
    });
    map.deliver_requests(quest.take_requests());

    assert_eq!(emotes_of(map.world(), npc()), vec![70]);
}

#[test]
fn unknown_agents_are_reported() {
    let mut map = ScriptMap::new(world(), &EngineConfig::new());
    assert_eq!(
        map.with_agent(npc(), |_, _| ()).err(),
        Some(ScriptError::AgentNotFound(npc()))
    );

    let catalog = catalog(Vec::new());
    map.add_agent(Box::new(SmartAi::new(Arc::clone(&catalog), npc())))
        .unwrap();
    assert_eq!(
        map.add_agent(Box::new(SmartAi::new(catalog, npc()))).err(),
        Some(ScriptError::DuplicateAgent(npc()))
    );
    assert_eq!(map.agent_count(), 1);
}
