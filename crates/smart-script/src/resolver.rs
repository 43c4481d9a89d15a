//! Target resolution: turns a rule's target description into objects.
use tracing::{error, trace};

use game_core::{AliveFilter, ObjectGuid, ObjectKind, ObjectSearch, SearchKind, WorldOracle};

use crate::engine::{ScriptEnv, SmartScript};
use crate::target::{Target, TargetSelector};

fn in_range(world: &dyn WorldOracle, from: ObjectGuid, to: ObjectGuid, min: f32, max: f32) -> bool {
    world
        .distance(from, to)
        .is_some_and(|d| d >= min && d <= max)
}

/// Distance limit of zero means unlimited.
fn within(world: &dyn WorldOracle, from: ObjectGuid, to: ObjectGuid, max: u32) -> bool {
    max == 0 || world.distance(from, to).is_some_and(|d| d <= max as f32)
}

fn closest(world: &dyn WorldOracle, origin: ObjectGuid, found: Vec<ObjectGuid>) -> Option<ObjectGuid> {
    found
        .into_iter()
        .filter(|g| *g != origin)
        .filter_map(|g| world.distance(origin, g).map(|d| (g, d)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(g, _)| g)
}

impl SmartScript {
    /// Objects `target` designates, given the invoker (or last invoker) of
    /// the current occurrence.
    ///
    /// Position and none targets resolve to nothing; actions read the
    /// literal position from the target description instead.
    pub(crate) fn get_targets(
        &mut self,
        env: &mut ScriptEnv<'_>,
        target: &Target,
        trigger: Option<ObjectGuid>,
    ) -> Vec<ObjectGuid> {
        use TargetSelector as S;
        let base = self.base();
        let me = self.me();
        let range = self.config().default_search_range;

        let mut targets = Vec::new();
        match target.selector {
            S::None | S::Position => {}
            S::Myself => targets.push(base),
            S::Victim => {
                if let Some(victim) = me.and_then(|me| self.victim_of(env, me)) {
                    targets.push(victim);
                }
            }
            S::Hostile {
                rank,
                max_dist,
                player_only,
                power_type,
            } => {
                let Some(me) = me else {
                    return targets;
                };
                let (method, offset) = rank.method();
                let world: &dyn WorldOracle = &*env.world;
                let picked = env.combat.select_target(
                    world.as_units(),
                    me,
                    method,
                    offset,
                    |g| {
                        within(world, me, g, max_dist)
                            && (!player_only || g.is_player())
                            && power_type.is_none_or(|p| world.power_type(g) == Some(p))
                    },
                    self.rng(),
                );
                targets.extend(picked);
            }
            S::Farthest {
                max_dist,
                player_only,
                in_los,
            } => {
                let Some(me) = me else {
                    return targets;
                };
                let world: &dyn WorldOracle = &*env.world;
                let picked = env.combat.select_target(
                    world.as_units(),
                    me,
                    combat::SelectTargetMethod::MaxDistance,
                    0,
                    |g| {
                        within(world, me, g, max_dist)
                            && (!player_only || g.is_player())
                            && (!in_los || world.is_within_los(me, g))
                    },
                    self.rng(),
                );
                targets.extend(picked);
            }
            S::ActionInvoker => targets.extend(trigger),
            S::ActionInvokerVehicle => {
                if let Some(vehicle) = trigger.and_then(|t| env.world.vehicle_base(t)) {
                    targets.push(vehicle);
                }
            }
            S::InvokerParty => {
                if let Some(player) = trigger.filter(|t| t.is_player()) {
                    let members = env.world.group_members(player);
                    if members.is_empty() {
                        targets.push(player);
                    } else {
                        let map = env.world.map_id(player);
                        targets.extend(members.into_iter().filter(|m| env.world.map_id(*m) == map));
                    }
                }
            }
            S::CreatureRange {
                entry,
                min_dist,
                max_dist,
                max_size,
            } => {
                let query = ObjectSearch::around(base, SearchKind::CREATURE, max_dist as f32).with_entry(entry);
                targets.extend(env.world.search(&query).into_iter().filter(|g| {
                    Some(*g) != me && in_range(&*env.world, base, *g, min_dist as f32, max_dist as f32)
                }));
                self.random_resize(&mut targets, max_size);
            }
            S::CreatureDistance {
                entry,
                dist,
                max_size,
            } => {
                let query = ObjectSearch::around(base, SearchKind::CREATURE, dist as f32).with_entry(entry);
                targets.extend(env.world.search(&query).into_iter().filter(|g| Some(*g) != me));
                self.random_resize(&mut targets, max_size);
            }
            S::GameObjectRange {
                entry,
                min_dist,
                max_dist,
                max_size,
            } => {
                let query =
                    ObjectSearch::around(base, SearchKind::GAME_OBJECT, max_dist as f32).with_entry(entry);
                targets.extend(env.world.search(&query).into_iter().filter(|g| {
                    *g != base && in_range(&*env.world, base, *g, min_dist as f32, max_dist as f32)
                }));
                self.random_resize(&mut targets, max_size);
            }
            S::GameObjectDistance {
                entry,
                dist,
                max_size,
            } => {
                let query = ObjectSearch::around(base, SearchKind::GAME_OBJECT, dist as f32).with_entry(entry);
                targets.extend(env.world.search(&query).into_iter().filter(|g| *g != base));
                self.random_resize(&mut targets, max_size);
            }
            S::CreatureGuid { spawn_id, entry } | S::GameObjectGuid { spawn_id, entry } => {
                let kind = if matches!(target.selector, S::CreatureGuid { .. }) {
                    ObjectKind::Creature
                } else {
                    ObjectKind::GameObject
                };
                // the host looks the spawn up on the map of the invoker or base object
                if let Some(found) = env.world.find_spawn(kind, u64::from(spawn_id)) {
                    if entry == 0 || found.entry() == entry {
                        targets.push(found);
                    }
                }
            }
            S::PlayerRange {
                min_dist,
                max_dist,
                max_count,
            } => {
                let query = ObjectSearch::around(base, SearchKind::PLAYER, max_dist as f32)
                    .with_min_range(min_dist as f32);
                targets.extend(env.world.search(&query));
                self.random_resize(&mut targets, max_count);
            }
            S::PlayerDistance { dist } => {
                let query = ObjectSearch::around(base, SearchKind::PLAYER, dist as f32);
                targets.extend(env.world.search(&query));
            }
            S::Stored { id } => match self.stored_targets(env.units(), id) {
                Some(stored) => targets = stored,
                None => trace!(agent = %self.owner(), id, "stored target list is empty"),
            },
            S::ClosestCreature { entry, dist, dead } => {
                let radius = if dist == 0 { range } else { dist as f32 };
                let alive = if dead { AliveFilter::Dead } else { AliveFilter::Alive };
                let query = ObjectSearch::around(base, SearchKind::CREATURE, radius)
                    .with_entry(entry)
                    .with_alive(alive);
                targets.extend(closest(&*env.world, base, env.world.search(&query)));
            }
            S::ClosestGameObject { entry, dist } => {
                let radius = if dist == 0 { range } else { dist as f32 };
                let query = ObjectSearch::around(base, SearchKind::GAME_OBJECT, radius).with_entry(entry);
                let found: Vec<ObjectGuid> = env
                    .world
                    .search(&query)
                    .into_iter()
                    .filter(|g| env.world.is_spawned(*g))
                    .collect();
                targets.extend(closest(&*env.world, base, found));
            }
            S::ClosestUnspawnedGameObject { entry, dist } => {
                let radius = if dist == 0 { range } else { dist as f32 };
                let query = ObjectSearch::around(base, SearchKind::GAME_OBJECT, radius).with_entry(entry);
                let found: Vec<ObjectGuid> = env
                    .world
                    .search(&query)
                    .into_iter()
                    .filter(|g| !env.world.is_spawned(*g))
                    .collect();
                targets.extend(closest(&*env.world, base, found));
            }
            S::ClosestPlayer { dist } => {
                let radius = if dist == 0 { range } else { dist as f32 };
                let query = ObjectSearch::around(base, SearchKind::PLAYER, radius);
                targets.extend(closest(&*env.world, base, env.world.search(&query)));
            }
            S::OwnerOrSummoner { owner_of_owner } => {
                let world = &*env.world;
                let owner = if base.is_creature() {
                    world
                        .charmer_or_owner(base)
                        .or_else(|| world.summoner(base))
                        .or_else(|| world.creator(base))
                } else {
                    world.charmer_or_owner(base).or_else(|| world.summoner(base))
                };
                let owner = owner.filter(|g| world.is_in_world(*g));
                if owner_of_owner {
                    targets.extend(owner.and_then(|o| world.charmer_or_owner(o)));
                } else {
                    targets.extend(owner);
                }
            }
            S::ThreatList { max_dist } => {
                if let Some(me) = me {
                    if env.world.can_have_threat_list(me) {
                        targets.extend(
                            env.combat
                                .sorted_threat_list(me)
                                .into_iter()
                                .filter(|g| within(&*env.world, me, *g, max_dist)),
                        );
                    }
                }
            }
            S::ClosestEnemy {
                max_dist,
                player_only,
            } => {
                if let Some(me) = me {
                    let query = ObjectSearch::around(me, SearchKind::UNIT, max_dist as f32)
                        .with_alive(AliveFilter::Alive);
                    let found: Vec<ObjectGuid> = env
                        .world
                        .search(&query)
                        .into_iter()
                        .filter(|g| {
                            env.world.is_valid_attack_target(me, *g) && (!player_only || g.is_player())
                        })
                        .collect();
                    targets.extend(closest(&*env.world, me, found));
                }
            }
            S::ClosestFriendly {
                max_dist,
                player_only,
            } => {
                if let Some(me) = me {
                    let query = ObjectSearch::around(me, SearchKind::UNIT, max_dist as f32)
                        .with_alive(AliveFilter::Alive);
                    let found: Vec<ObjectGuid> = env
                        .world
                        .search(&query)
                        .into_iter()
                        .filter(|g| {
                            env.world.is_friendly_to(me, *g) && (!player_only || g.is_player())
                        })
                        .collect();
                    targets.extend(closest(&*env.world, me, found));
                }
            }
            S::LootRecipients => {
                if let Some(me) = me {
                    targets.extend(env.world.loot_recipients(me));
                }
            }
            S::VehiclePassenger { seat_mask } => {
                if let Some(me) = me {
                    targets.extend(
                        env.world
                            .vehicle_passengers(me)
                            .into_iter()
                            .filter(|(seat, _)| {
                                seat_mask == 0 || seat_mask & (1u32 << u32::from(*seat).min(31)) != 0
                            })
                            .map(|(_, passenger)| passenger),
                    );
                }
            }
        }

        if targets.is_empty() && !target.is_none() && !target.is_position() {
            trace!(agent = %self.owner(), selector = ?target.selector, "target resolved to nothing");
        }
        targets
    }

    /// Keeps a random `max` of `targets`, preserving their order; 0 keeps all.
    fn random_resize(&mut self, targets: &mut Vec<ObjectGuid>, max: u32) {
        let max = max as usize;
        if max == 0 || targets.len() <= max {
            return;
        }
        let mut keep = rand::seq::index::sample(self.rng(), targets.len(), max).into_vec();
        keep.sort_unstable();
        *targets = keep.into_iter().map(|i| targets[i]).collect();
    }

    /// Objects `selector` designates when resolved from scratch, outside any
    /// rule, e.g. for the casters of a cross cast.
    pub(crate) fn resolve_selector(
        &mut self,
        env: &mut ScriptEnv<'_>,
        selector: &TargetSelector,
        trigger: Option<ObjectGuid>,
    ) -> Vec<ObjectGuid> {
        if matches!(selector, TargetSelector::None) {
            error!(agent = %self.owner(), "selector without a target kind");
            return Vec::new();
        }
        self.get_targets(env, &Target::new(selector.clone()), trigger)
    }
}

#[cfg(test)]
mod tests {
    use combat::CombatWorld;
    use game_core::{EngineConfig, ObjectRecord, PowerType, WorldSnapshot};

    use super::*;
    use crate::catalog::ScriptCatalog;
    use crate::holder::ScriptType;
    use crate::table::RuleTable;
    use crate::target::HostileRank;
    use crate::waypoint::PathTable;

    fn me() -> ObjectGuid {
        ObjectGuid::creature(100, 1)
    }

    fn player(counter: u64) -> ObjectGuid {
        ObjectGuid::player(counter)
    }

    struct Fixture {
        world: WorldSnapshot,
        combat: CombatWorld,
        script: SmartScript,
    }

    impl Fixture {
        fn new(world: WorldSnapshot) -> Self {
            let (rules, _) = RuleTable::from_rows(Vec::new());
            let catalog = ScriptCatalog::new(rules, PathTable::new(), EngineConfig::new());
            Self {
                world,
                combat: CombatWorld::default(),
                script: SmartScript::new(catalog, me(), ScriptType::Creature),
            }
        }

        fn resolve(&mut self, selector: TargetSelector) -> Vec<ObjectGuid> {
            self.resolve_for(selector, None)
        }

        fn resolve_for(&mut self, selector: TargetSelector, trigger: Option<ObjectGuid>) -> Vec<ObjectGuid> {
            let mut env = ScriptEnv::new(&mut self.world, &mut self.combat);
            self.script.get_targets(&mut env, &Target::new(selector), trigger)
        }
    }

    /// Three players on the creature's threat list: 100, 60 and 30 threat,
    /// standing 2, 4 and 6 yards away. Only the first one uses mana.
    fn engaged() -> Fixture {
        let rage = |counter: u64, x: f32| {
            let mut record = ObjectRecord::player(counter).at(x, 0.0, 0.0);
            record.power_type = Some(PowerType::Rage);
            record
        };
        let mut fixture = Fixture::new(
            WorldSnapshot::new()
                .with(ObjectRecord::creature(100, 1))
                .with(ObjectRecord::player(1).at(2.0, 0.0, 0.0))
                .with(rage(2, 4.0))
                .with(rage(3, 6.0)),
        );
        for (counter, threat) in [(1, 100.0), (2, 60.0), (3, 30.0)] {
            fixture
                .combat
                .add_threat(&fixture.world, me(), player(counter), threat, None, false, false);
        }
        fixture
    }

    fn hostile(rank: HostileRank, max_dist: u32, power_type: Option<PowerType>) -> TargetSelector {
        TargetSelector::Hostile {
            rank,
            max_dist,
            player_only: false,
            power_type,
        }
    }

    #[test]
    fn hostile_ranks_follow_threat_order() {
        let mut fixture = engaged();

        assert_eq!(fixture.resolve(hostile(HostileRank::SecondAggro, 0, None)), vec![player(2)]);
        assert_eq!(fixture.resolve(hostile(HostileRank::LastAggro, 0, None)), vec![player(3)]);

        for _ in 0..20 {
            let any = fixture.resolve(hostile(HostileRank::Random, 0, None));
            assert_eq!(any.len(), 1);
            assert!([player(1), player(2), player(3)].contains(&any[0]));

            let not_top = fixture.resolve(hostile(HostileRank::RandomNotTop, 0, None));
            assert_eq!(not_top.len(), 1);
            assert_ne!(not_top[0], player(1));
        }
    }

    #[test]
    fn hostile_filters_apply_after_ranking() {
        let mut fixture = engaged();

        // only the top threat uses mana, so the lowest ranked match is the top
        let mana = hostile(HostileRank::LastAggro, 0, Some(PowerType::Mana));
        assert_eq!(fixture.resolve(mana), vec![player(1)]);

        // the second entry stands 4 yards away and the third 6
        assert!(fixture.resolve(hostile(HostileRank::SecondAggro, 3, None)).is_empty());

        let energy = hostile(HostileRank::Random, 0, Some(PowerType::Energy));
        assert!(fixture.resolve(energy).is_empty());
    }

    #[test]
    fn threat_list_is_cut_by_distance() {
        let mut fixture = engaged();

        assert_eq!(
            fixture.resolve(TargetSelector::ThreatList { max_dist: 0 }),
            vec![player(1), player(2), player(3)]
        );
        assert_eq!(
            fixture.resolve(TargetSelector::ThreatList { max_dist: 5 }),
            vec![player(1), player(2)]
        );
    }

    #[test]
    fn ungrouped_invoker_is_its_own_party() {
        let mut far_member = ObjectRecord::player(3).with_group(7);
        far_member.map_id = 1;
        let mut fixture = Fixture::new(
            WorldSnapshot::new()
                .with(ObjectRecord::creature(100, 1))
                .with(ObjectRecord::player(1))
                .with(ObjectRecord::player(2).with_group(7))
                .with(far_member)
                .with(ObjectRecord::player(4).with_group(7)),
        );

        let alone = fixture.resolve_for(TargetSelector::InvokerParty, Some(player(1)));
        assert_eq!(alone, vec![player(1)]);

        // members on another map are left out
        let party = fixture.resolve_for(TargetSelector::InvokerParty, Some(player(2)));
        assert_eq!(party, vec![player(2), player(4)]);

        assert!(fixture.resolve_for(TargetSelector::InvokerParty, Some(me())).is_empty());
    }

    #[test]
    fn spawn_targets_check_the_entry() {
        let mut fixture = Fixture::new(
            WorldSnapshot::new()
                .with(ObjectRecord::creature(100, 1))
                .with(ObjectRecord::creature(200, 7).at(30.0, 0.0, 0.0))
                .with(ObjectRecord::game_object(300, 8).at(40.0, 0.0, 0.0)),
        );
        let guard = ObjectGuid::creature(200, 7);
        let door = ObjectGuid::game_object(300, 8);
        let creature = |spawn_id, entry| TargetSelector::CreatureGuid { spawn_id, entry };
        let object = |spawn_id, entry| TargetSelector::GameObjectGuid { spawn_id, entry };

        assert_eq!(fixture.resolve(creature(7, 200)), vec![guard]);
        assert_eq!(fixture.resolve(creature(7, 0)), vec![guard]);
        assert!(fixture.resolve(creature(7, 201)).is_empty());
        assert_eq!(fixture.resolve(object(8, 300)), vec![door]);
        assert!(fixture.resolve(object(8, 999)).is_empty());
        assert!(fixture.resolve(object(7, 0)).is_empty());
    }

    #[test]
    fn owner_of_owner_walks_two_links() {
        let summoner = ObjectGuid::creature(150, 9);
        let mut fixture = Fixture::new(
            WorldSnapshot::new()
                .with(ObjectRecord::creature(100, 1).summoned_by(summoner))
                .with(ObjectRecord::creature(150, 9).as_pet_of(player(1)))
                .with(ObjectRecord::player(1)),
        );
        let owner = TargetSelector::OwnerOrSummoner { owner_of_owner: false };
        let top = TargetSelector::OwnerOrSummoner { owner_of_owner: true };

        assert_eq!(fixture.resolve(owner), vec![summoner]);
        assert_eq!(fixture.resolve(top.clone()), vec![player(1)]);

        fixture.world.record_mut(summoner).unwrap().in_world = false;
        assert!(fixture.resolve(top).is_empty());
    }

    #[test]
    fn action_invoker_needs_an_invoker() {
        let mut fixture = Fixture::new(
            WorldSnapshot::new()
                .with(ObjectRecord::creature(100, 1))
                .with(ObjectRecord::player(1)),
        );

        assert!(fixture.resolve(TargetSelector::ActionInvoker).is_empty());
        assert_eq!(
            fixture.resolve_for(TargetSelector::ActionInvoker, Some(player(1))),
            vec![player(1)]
        );
    }

    #[test]
    fn size_limit_keeps_a_random_ordered_subset() {
        let mut world = WorldSnapshot::new().with(ObjectRecord::creature(100, 1));
        for counter in 2..=6 {
            world = world.with(ObjectRecord::creature(200, counter).at(counter as f32, 0.0, 0.0));
        }
        let mut fixture = Fixture::new(world);
        let all: Vec<ObjectGuid> = (2..=6).map(|c| ObjectGuid::creature(200, c)).collect();
        let nearby = |max_size| TargetSelector::CreatureDistance {
            entry: 200,
            dist: 50,
            max_size,
        };

        assert_eq!(fixture.resolve(nearby(0)), all);
        for _ in 0..10 {
            let picked = fixture.resolve(nearby(2));
            assert_eq!(picked.len(), 2);
            assert!(picked.iter().all(|g| all.contains(g)));
            assert!(picked[0] < picked[1]);
        }

        let mut few = vec![player(1)];
        fixture.script.random_resize(&mut few, 3);
        assert_eq!(few, vec![player(1)]);
    }
}
