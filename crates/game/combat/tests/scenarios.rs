use combat::{CombatNotice, CombatWorld, ThreatUpdate};
use game_core::{EngineConfig, ObjectGuid, ObjectRecord, ScriptRng, WorldSnapshot};

fn boss() -> ObjectGuid {
    ObjectGuid::creature(900, 1)
}

fn tank() -> ObjectGuid {
    ObjectGuid::player(1)
}

fn healer() -> ObjectGuid {
    ObjectGuid::player(2)
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("combat=trace")
        .with_test_writer()
        .try_init();
}

fn raid() -> WorldSnapshot {
    init_logging();
    WorldSnapshot::new()
        .with(ObjectRecord::creature(900, 1))
        .with(ObjectRecord::creature(901, 2).at(6.0, 0.0, 0.0))
        .with(ObjectRecord::player(1).at(2.0, 0.0, 0.0).with_group(1))
        .with(ObjectRecord::player(2).at(25.0, 0.0, 0.0).with_group(1))
        .with(ObjectRecord::player(3).at(3.0, 1.0, 0.0).with_group(1))
}

#[test]
fn ending_combat_clears_threat_in_both_directions() {
    let units = raid();
    let mut combat = CombatWorld::default();
    combat.add_threat(&units, boss(), tank(), 100.0, None, false, false);
    combat.add_threat(&units, boss(), healer(), 40.0, None, false, false);
    combat.take_notices();
    combat.take_threat_updates();

    combat.end_combat_between(&units, tank(), boss());

    assert!(!combat.is_in_combat_with(boss(), tank()));
    assert!(!combat.is_threatened_by(boss(), tank(), true));
    assert!(combat.is_in_combat(boss()));
    assert_eq!(combat.last_victim(boss()), Some(healer()));
    assert!(combat.take_threat_updates().contains(&ThreatUpdate::Remove {
        owner: boss(),
        victim: tank()
    }));
    assert!(combat.take_notices().contains(&CombatNotice::ExitedCombat { agent: tank() }));
    assert!(combat.check_invariants().is_ok());
}

#[test]
fn death_takes_agent_off_every_list() {
    let mut units = raid();
    let mut combat = CombatWorld::default();
    let add = ObjectGuid::creature(901, 2);
    combat.add_threat(&units, boss(), tank(), 100.0, None, false, false);
    combat.add_threat(&units, add, tank(), 100.0, None, false, false);
    combat.add_threat(&units, add, ObjectGuid::player(3), 10.0, None, false, false);

    units.record_mut(tank()).unwrap().alive = false;
    combat.end_all_combat(&units, tank());

    assert!(!combat.is_in_combat(tank()));
    assert!(!combat.is_engaged(boss()));
    assert!(!combat.is_in_combat(boss()));
    assert_eq!(combat.last_victim(add), Some(ObjectGuid::player(3)));
    assert!(combat.check_invariants().is_ok());
}

#[test]
fn pvp_combat_times_out_without_refresh() {
    let units = raid().with(ObjectRecord::player(4).at(4.0, 0.0, 0.0).with_faction(2));
    let config = EngineConfig::new().with_pvp_combat_timeout(1_000);
    let mut combat = CombatWorld::new(&config);
    let duelist = ObjectGuid::player(4);

    combat.set_in_combat_with(&units, tank(), duelist);
    combat.update(&units, 600);
    combat.set_in_combat_with(&units, tank(), duelist);
    combat.update(&units, 600);
    assert!(combat.is_in_combat_with(tank(), duelist));

    combat.update(&units, 500);
    assert!(!combat.is_in_combat(tank()));
    assert!(!combat.is_in_combat(duelist));
}

#[test]
fn periodic_update_reselects_victim() {
    let units = raid();
    let mut combat = CombatWorld::default();
    combat.add_threat(&units, boss(), tank(), 100.0, None, false, false);
    combat.add_threat(&units, boss(), ObjectGuid::player(3), 500.0, None, false, false);
    assert_eq!(combat.last_victim(boss()), Some(tank()));

    combat.update(&units, 1);
    assert_eq!(combat.last_victim(boss()), Some(ObjectGuid::player(3)));
    let updates = combat.take_threat_updates();
    assert!(updates.iter().any(|u| matches!(
        u,
        ThreatUpdate::Full { highest_changed: true, highest: Some(victim), .. } if *victim == ObjectGuid::player(3)
    )));
}

#[test]
fn arena_invariants_hold_under_mixed_operations() {
    let mut units = raid();
    let mut combat = CombatWorld::default();
    let mut rng = ScriptRng::new(0xC0FFEE);
    let owners = [boss(), ObjectGuid::creature(901, 2)];
    let players = [tank(), healer(), ObjectGuid::player(3)];

    for step in 0..400 {
        let owner = owners[rng.index(owners.len())];
        let player = players[rng.index(players.len())];
        match rng.urand(0, 7) {
            0..=2 => {
                let amount = rng.urand(0, 200) as f32 - 50.0;
                combat.add_threat(&units, owner, player, amount, None, false, false);
            }
            3 => combat.modify_threat_by_percent(owner, player, rng.urand(0, 150) as i32 - 100),
            4 => {
                combat.clear_threat(&units, owner, player);
            }
            5 => combat.end_combat_between(&units, owner, player),
            6 => {
                let record = units.record_mut(player).unwrap();
                record.alive = !record.alive;
                combat.revalidate_combat(&units, player);
            }
            _ => combat.update(&units, rng.urand(1, 1_500)),
        }
        combat.take_notices();
        if let Err(err) = combat.check_invariants() {
            panic!("step {step}: {err}");
        }
        for owner in owners {
            for (_, threat) in combat.threat_entries(owner) {
                assert!(threat >= 0.0);
            }
        }
    }
}
