//! Quests, items, gossip, game objects, summons and map-wide state.
use std::sync::Arc;

use tracing::{debug, error, warn};

use game_core::{ObjectGuid, SummonKind, SummonRequest, WorldCommand};

use super::{game_objects, players, units};
use crate::action::{Action, InstDataKind, SpawnGroupFlags, SummonFlags};
use crate::engine::{ActionCtx, ScriptEnv, SmartScript};
use crate::event::{Event, EventFlags, EventKind, EventParams};
use crate::holder::{Rule, RuleKey};

impl SmartScript {
    pub(super) fn world_action(
        &mut self,
        env: &mut ScriptEnv<'_>,
        ctx: &ActionCtx<'_>,
        targets: &[ObjectGuid],
    ) -> bool {
        let base = self.base();
        match ctx.rule.action {
            Action::FailQuest { quest } => {
                for player in players(targets) {
                    env.world.issue(WorldCommand::FailQuest { player, quest });
                }
            }
            Action::OfferQuest { quest, direct_add } => {
                for player in players(targets) {
                    env.world.issue(WorldCommand::OfferQuest {
                        player,
                        quest,
                        direct_add,
                    });
                }
            }
            Action::CallAreaExploredOrEventHappens { quest } => {
                for player in players(targets) {
                    env.world
                        .issue(WorldCommand::AreaExploredOrEventHappens { player, quest });
                }
            }
            Action::CallGroupEventHappens { quest } => {
                for player in players(targets) {
                    env.world
                        .issue(WorldCommand::GroupEventHappens { player, quest });
                }
            }
            Action::CallKilledMonster { creature } => {
                for target in targets.iter().copied() {
                    if target.is_player() {
                        env.world.issue(WorldCommand::KilledMonsterCredit {
                            player: target,
                            entry: creature,
                        });
                    } else if target.is_unit() {
                        // vehicles pass the credit on to the players riding them
                        for (_, passenger) in env.world.vehicle_passengers(target) {
                            if passenger.is_player() {
                                env.world.issue(WorldCommand::KilledMonsterCredit {
                                    player: passenger,
                                    entry: creature,
                                });
                            }
                        }
                    }
                }
            }
            Action::AddItem { item, count } => {
                for player in players(targets) {
                    env.world.issue(WorldCommand::AddItem {
                        player,
                        item,
                        count,
                    });
                }
            }
            Action::RemoveItem { item, count } => {
                for player in players(targets) {
                    env.world.issue(WorldCommand::RemoveItem {
                        player,
                        item,
                        count,
                    });
                }
            }
            Action::SendGossipMenu { menu, text } => {
                for player in players(targets) {
                    env.world.issue(WorldCommand::SendGossipMenu {
                        player,
                        source: base,
                        menu_id: menu,
                        text_id: text,
                    });
                }
            }
            Action::CloseGossip => {
                for player in players(targets) {
                    env.world.issue(WorldCommand::CloseGossip { player });
                }
            }
            Action::ActivateGobject => {
                let user = ctx.trigger.unwrap_or(base);
                for object in game_objects(targets) {
                    env.world.issue(WorldCommand::UseGameObject { object, user });
                }
            }
            Action::ActivateGameobject { action } => {
                for object in game_objects(targets) {
                    env.world
                        .issue(WorldCommand::ActivateGameObject { object, action });
                }
            }
            Action::ResetGobject => {
                for object in game_objects(targets) {
                    env.world.issue(WorldCommand::ResetGameObject { object });
                }
            }
            Action::GoSetLootState { state } => {
                for object in game_objects(targets) {
                    env.world.issue(WorldCommand::SetLootState { object, state });
                }
            }
            Action::GoSetGoState { state } => {
                for object in game_objects(targets) {
                    env.world.issue(WorldCommand::SetGoState { object, state });
                }
            }
            Action::EnableTempGobject { duration_s } => {
                for object in game_objects(targets) {
                    env.world.issue(WorldCommand::EnableTempGameObject {
                        object,
                        duration_ms: duration_s.saturating_mul(1000),
                    });
                }
            }
            Action::RemoveAllGameobjects => {
                for owner in units(targets) {
                    env.world.issue(WorldCommand::RemoveAllGameObjects { owner });
                }
            }
            Action::SummonCreature {
                creature,
                summon_type,
                duration_ms,
                storage_id,
                attack_invoker,
                flags,
                count,
            } => {
                let summoner = if flags.contains(SummonFlags::PREFER_UNIT) {
                    ctx.trigger.filter(ObjectGuid::is_unit).unwrap_or(base)
                } else {
                    base
                };
                let private_for = flags
                    .contains(SummonFlags::PERSONAL_SPAWN)
                    .then(|| env.world.private_object_owner(summoner).unwrap_or(summoner));
                let offset = ctx.rule.target.position;
                let mut positions: Vec<_> = targets
                    .iter()
                    .filter_map(|target| env.world.position(*target))
                    .map(|at| at.translated(&offset))
                    .collect();
                if ctx.rule.target.is_position() {
                    positions.push(offset);
                }

                let mut summoned = Vec::new();
                for position in positions {
                    for _ in 0..count.max(1) {
                        let request = SummonRequest {
                            summoner,
                            kind: SummonKind::Creature,
                            entry: creature,
                            position,
                            summon_type,
                            duration_ms,
                            private_for,
                        };
                        match env.world.summon(&request) {
                            Some(summon) => summoned.push(summon),
                            None => debug!(agent = %self.owner(), creature, "summon refused"),
                        }
                    }
                }
                if attack_invoker {
                    if let Some(enemy) = ctx.trigger.filter(ObjectGuid::is_unit) {
                        for summon in &summoned {
                            env.engage(*summon, enemy);
                        }
                    }
                }
                if storage_id != 0 && !summoned.is_empty() {
                    self.add_to_stored_targets(storage_id, &summoned);
                }
            }
            Action::SummonGo {
                entry,
                despawn_s,
                summon_type,
            } => {
                let offset = ctx.rule.target.position;
                let mut positions: Vec<_> = targets
                    .iter()
                    .filter_map(|target| env.world.position(*target))
                    .map(|at| at.relative(&offset))
                    .collect();
                if ctx.rule.target.is_position() {
                    positions.push(offset);
                }
                for position in positions {
                    let request = SummonRequest {
                        summoner: base,
                        kind: SummonKind::GameObject,
                        entry,
                        position,
                        summon_type,
                        duration_ms: despawn_s.saturating_mul(1000),
                        private_for: None,
                    };
                    if env.world.summon(&request).is_none() {
                        debug!(agent = %self.owner(), entry, "game object summon refused");
                    }
                }
            }
            Action::SummonCreatureGroup {
                group,
                attack_invoker,
            } => {
                let summoned = env.world.summon_creature_group(base, group);
                if attack_invoker {
                    if let Some(enemy) = ctx.trigger.filter(ObjectGuid::is_unit) {
                        for summon in summoned {
                            env.engage(summon, enemy);
                        }
                    }
                }
            }
            Action::SetInstData { field, data, kind } => {
                let Some(source) = self.instance_source(env, ctx) else {
                    return true;
                };
                match kind {
                    InstDataKind::Data => env.world.issue(WorldCommand::SetInstanceData {
                        source,
                        field,
                        data,
                    }),
                    InstDataKind::BossState => env.world.issue(WorldCommand::SetBossState {
                        source,
                        boss_id: field,
                        state: data,
                    }),
                }
            }
            Action::SetInstData64 { field } => {
                let Some(source) = self.instance_source(env, ctx) else {
                    return true;
                };
                match targets.first() {
                    Some(data) => env.world.issue(WorldCommand::SetInstanceGuidData {
                        source,
                        field,
                        data: *data,
                    }),
                    None => warn!(agent = %self.owner(), rule = %ctx.rule.key, "instance guid data without a target"),
                }
            }
            Action::GameEventStart { id } => {
                env.world
                    .issue(WorldCommand::StartGameEvent { event_id: id });
            }
            Action::GameEventStop { id } => {
                env.world.issue(WorldCommand::StopGameEvent { event_id: id });
            }
            Action::SpawnSpawngroup {
                group,
                min_delay,
                max_delay,
                flags,
            } => {
                if min_delay == 0 && max_delay == 0 {
                    env.world.issue(WorldCommand::SpawnGroup {
                        source: base,
                        group_id: group,
                        force: flags.contains(SpawnGroupFlags::FORCE_SPAWN),
                        ignore_respawn: flags.contains(SpawnGroupFlags::IGNORE_RESPAWN),
                    });
                } else {
                    self.delay_spawn_group_action(ctx, min_delay, max_delay);
                }
            }
            Action::DespawnSpawngroup {
                group,
                min_delay,
                max_delay,
                flags,
            } => {
                if min_delay == 0 && max_delay == 0 {
                    env.world.issue(WorldCommand::DespawnGroup {
                        source: base,
                        group_id: group,
                        delete_respawn_times: flags.contains(SpawnGroupFlags::NOSAVE_RESPAWN),
                    });
                } else {
                    self.delay_spawn_group_action(ctx, min_delay, max_delay);
                }
            }
            Action::RespawnBySpawnId { kind, spawn_id } => {
                env.world.issue(WorldCommand::RespawnBySpawnId {
                    source: base,
                    kind,
                    spawn_id: u64::from(spawn_id),
                });
            }
            _ => return false,
        }
        true
    }

    /// Object whose map carries the instance script, if it has one.
    fn instance_source(&self, env: &ScriptEnv<'_>, ctx: &ActionCtx<'_>) -> Option<ObjectGuid> {
        let source = [Some(self.base()), ctx.trigger]
            .into_iter()
            .flatten()
            .find(|g| env.world.has_instance_script(*g));
        if source.is_none() {
            error!(agent = %self.owner(), rule = %ctx.rule.key, "instance data set outside an instance");
        }
        source
    }

    /// Re-issues a spawn group action after a random delay, through a
    /// one-shot stored rule carrying the same action with no delay. Delays
    /// are authored in seconds.
    fn delay_spawn_group_action(&mut self, ctx: &ActionCtx<'_>, min_delay: u32, max_delay: u32) {
        let action = match ctx.rule.action {
            Action::SpawnSpawngroup { group, flags, .. } => Action::SpawnSpawngroup {
                group,
                min_delay: 0,
                max_delay: 0,
                flags,
            },
            Action::DespawnSpawngroup { group, flags, .. } => Action::DespawnSpawngroup {
                group,
                min_delay: 0,
                max_delay: 0,
                flags,
            },
            _ => return,
        };
        let id = self.next_synthetic_id();
        let event = Event::new(
            EventKind::Update,
            EventParams::MinMaxRepeat {
                min: min_delay.saturating_mul(1000),
                max: max_delay.saturating_mul(1000),
                repeat_min: 0,
                repeat_max: 0,
            },
        )
        .with_flags(EventFlags::NOT_REPEATABLE);
        let rule = Rule {
            key: RuleKey::new(ctx.rule.key.entry_or_guid, ctx.rule.key.source_type, id),
            link: 0,
            event,
            action,
            target: ctx.rule.target.clone(),
            comment: format!("delayed {}", ctx.rule.action.name()),
        };
        let holder = self.new_holder(Arc::new(rule));
        self.queue_install(holder);
    }
}
