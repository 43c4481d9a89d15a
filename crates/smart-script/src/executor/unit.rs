//! Speech, presentation, unit state and movement actions.
use tracing::{debug, warn};

use game_core::{DynamicFlags, NpcFlags, ObjectGuid, Position, UnitFlags, WorldCommand};

use super::{creatures, players, units};
use crate::action::Action;
use crate::engine::{ActionCtx, ScriptEnv, SmartScript};
use crate::request::{AiCommand, ScriptRequest};
use crate::target::TargetSelector;

/// Point `distance` short of `to`, on the line from `from`.
fn contact_point(from: &Position, to: &Position, distance: f32) -> Position {
    let length = to.distance(from);
    if length <= f32::EPSILON {
        return *to;
    }
    let t = distance / length;
    Position::new(
        to.x + (from.x - to.x) * t,
        to.y + (from.y - to.y) * t,
        to.z + (from.z - to.z) * t,
        to.o,
    )
}

impl SmartScript {
    pub(super) fn unit_action(
        &mut self,
        env: &mut ScriptEnv<'_>,
        ctx: &ActionCtx<'_>,
        targets: &[ObjectGuid],
    ) -> bool {
        let me = self.me();
        let base = self.base();
        match ctx.rule.action {
            Action::Talk {
                group,
                duration_ms,
                use_talk_target,
            } => self.talk(env, ctx, targets, group, duration_ms, use_talk_target),
            Action::SimpleTalk { group } => {
                for target in targets.iter().copied() {
                    if target.is_creature() {
                        let whisper_to = self.last_invoker().filter(ObjectGuid::is_player);
                        env.world.issue(WorldCommand::Talk {
                            speaker: target,
                            group,
                            whisper_to,
                        });
                    } else if let (Some(me), true) = (me, target.is_player()) {
                        env.world.issue(WorldCommand::Talk {
                            speaker: me,
                            group,
                            whisper_to: Some(target),
                        });
                    }
                }
            }
            Action::Sound { sound, only_self } => {
                for target in targets.iter().copied() {
                    let only_to = (only_self && target.is_player()).then_some(target);
                    env.world.issue(WorldCommand::PlaySound {
                        source: target,
                        sound,
                        only_to,
                    });
                }
            }
            Action::RandomSound {
                ref sounds,
                only_self,
            } => {
                for target in targets.iter().copied() {
                    let Some(sound) = self.random_choice(sounds) else {
                        break;
                    };
                    let only_to = (only_self && target.is_player()).then_some(target);
                    env.world.issue(WorldCommand::PlaySound {
                        source: target,
                        sound,
                        only_to,
                    });
                }
            }
            Action::PlayEmote { emote } => {
                for unit in units(targets) {
                    env.world.issue(WorldCommand::PlayEmote { unit, emote });
                }
            }
            Action::RandomEmote { ref emotes } => {
                for unit in units(targets) {
                    if let Some(emote) = self.random_choice(emotes) {
                        env.world.issue(WorldCommand::PlayEmote { unit, emote });
                    }
                }
            }
            Action::SetEmoteState { emote } => {
                for unit in units(targets) {
                    env.world.issue(WorldCommand::SetEmoteState { unit, emote });
                }
            }
            Action::SetFaction { faction } => {
                for unit in creatures(targets) {
                    env.world.issue(WorldCommand::SetFaction { unit, faction });
                }
            }
            Action::MorphToEntryOrModel { creature, model } => {
                if model == 0 && creature != 0 {
                    debug!(agent = %self.owner(), creature, "morph by template entry falls back to the native model");
                }
                for unit in creatures(targets) {
                    env.world.issue(WorldCommand::Morph {
                        unit,
                        display_id: model,
                    });
                }
            }
            Action::MountToEntryOrModel { creature, model } => {
                if model == 0 && creature != 0 {
                    debug!(agent = %self.owner(), creature, "mount by template entry dismounts instead");
                }
                for unit in units(targets) {
                    env.world.issue(WorldCommand::Mount {
                        unit,
                        display_id: model,
                    });
                }
            }
            Action::SetSheath { sheath } => {
                for unit in creatures(targets) {
                    env.world.issue(WorldCommand::SetSheath { unit, sheath });
                }
            }
            Action::SetVisibility { visible } => {
                for object in units(targets) {
                    env.world.issue(WorldCommand::SetVisible { object, visible });
                }
            }
            Action::SetActive { active } => {
                for object in targets.iter().copied() {
                    env.world.issue(WorldCommand::SetActive { object, active });
                }
            }
            Action::PlayMovie { movie } => {
                for player in players(targets) {
                    env.world.issue(WorldCommand::PlayMovie { player, movie });
                }
            }
            Action::SetReactState { state } => {
                for unit in creatures(targets) {
                    env.world.issue(WorldCommand::SetReactState { unit, state });
                }
            }
            Action::SetNpcFlag { flags } => self.npc_flags(env, targets, |_| flags),
            Action::AddNpcFlag { flags } => self.npc_flags(env, targets, |current| current | flags),
            Action::RemoveNpcFlag { flags } => {
                self.npc_flags(env, targets, |current| current & !flags)
            }
            Action::SetDynamicFlag { flags } => self.dynamic_flags(env, targets, |_| flags),
            Action::AddDynamicFlag { flags } => {
                self.dynamic_flags(env, targets, |current| current | flags)
            }
            Action::RemoveDynamicFlag { flags } => {
                self.dynamic_flags(env, targets, |current| current & !flags)
            }
            Action::SetHealthRegen { enabled } => {
                for unit in creatures(targets) {
                    env.world.issue(WorldCommand::SetHealthRegen { unit, enabled });
                }
            }
            Action::SetRoot { root } => {
                for unit in creatures(targets) {
                    env.world.issue(WorldCommand::SetRoot { unit, rooted: root });
                }
            }
            Action::SetRun { run } => {
                for unit in creatures(targets) {
                    self.push_request(ScriptRequest::Ai {
                        target: unit,
                        command: AiCommand::SetRun(run),
                    });
                }
            }
            Action::SetDisableGravity { disable } => {
                for unit in creatures(targets) {
                    self.push_request(ScriptRequest::Ai {
                        target: unit,
                        command: AiCommand::SetDisableGravity(disable),
                    });
                }
            }
            Action::SetMovementSpeed {
                movement_type,
                speed,
            } => {
                for unit in creatures(targets) {
                    env.world.issue(WorldCommand::SetMovementSpeed {
                        unit,
                        movement_type,
                        speed,
                    });
                }
            }
            Action::SetOrientation => {
                let Some(me) = me else {
                    return true;
                };
                let orientation = match ctx.rule.target.selector {
                    TargetSelector::Myself => env.world.home_position(me).map(|home| home.o),
                    TargetSelector::Position => Some(ctx.rule.target.position.o),
                    _ => targets.first().and_then(|target| {
                        let from = env.world.position(me)?;
                        Some(from.angle_to(&env.world.position(*target)?))
                    }),
                };
                if let Some(orientation) = orientation {
                    env.world
                        .issue(WorldCommand::SetOrientation { unit: me, orientation });
                }
            }
            Action::SetHomePos => match ctx.rule.target.selector {
                TargetSelector::Myself => {
                    if let Some(position) = me.and_then(|me| env.world.position(me)) {
                        env.world.issue(WorldCommand::SetHomePosition {
                            unit: base,
                            position,
                        });
                    }
                }
                TargetSelector::Position => {
                    if let Some(me) = me {
                        env.world.issue(WorldCommand::SetHomePosition {
                            unit: me,
                            position: ctx.rule.target.position,
                        });
                    }
                }
                _ => {
                    for unit in creatures(targets) {
                        if let Some(position) = env.world.position(unit) {
                            env.world
                                .issue(WorldCommand::SetHomePosition { unit, position });
                        }
                    }
                }
            },
            Action::SetHealthPct { pct } => {
                for unit in units(targets) {
                    env.world.issue(WorldCommand::SetHealthPct { unit, pct });
                }
            }
            Action::SetPower { power, value } => {
                for unit in units(targets) {
                    env.world.issue(WorldCommand::SetPower { unit, power, value });
                }
            }
            Action::AddPower { power, value } => {
                for unit in units(targets) {
                    env.world.issue(WorldCommand::ModifyPower {
                        unit,
                        power,
                        delta: i64::from(value),
                    });
                }
            }
            Action::RemovePower { power, value } => {
                for unit in units(targets) {
                    env.world.issue(WorldCommand::ModifyPower {
                        unit,
                        power,
                        delta: -i64::from(value),
                    });
                }
            }
            Action::SetCorpseDelay {
                delay_s,
                include_decay_ratio,
            } => {
                for unit in creatures(targets) {
                    env.world.issue(WorldCommand::SetCorpseDelay {
                        unit,
                        delay_s,
                        include_decay_ratio,
                    });
                }
            }
            Action::UpdateTemplate {
                entry,
                update_level,
            } => {
                for unit in creatures(targets) {
                    env.world.issue(WorldCommand::UpdateEntry {
                        unit,
                        entry,
                        update_level,
                    });
                }
            }
            Action::SetImmunePc { immune } => {
                self.unit_flag(env, targets, UnitFlags::IMMUNE_TO_PC, immune)
            }
            Action::SetImmuneNpc { immune } => {
                self.unit_flag(env, targets, UnitFlags::IMMUNE_TO_NPC, immune)
            }
            Action::SetUninteractible { enabled } => {
                self.unit_flag(env, targets, UnitFlags::UNINTERACTIBLE, enabled)
            }
            Action::MoveToPos {
                point_id,
                disable_pathfinding,
                contact_distance,
            } => {
                let Some(me) = me else {
                    return true;
                };
                let offset = ctx.rule.target.position;
                let destination = if ctx.rule.target.is_position() {
                    Some(offset)
                } else {
                    self.random_target(targets).and_then(|target| {
                        let at = env.world.position(target)?;
                        let at = if contact_distance > 0 {
                            let from = env.world.position(me)?;
                            contact_point(&from, &at, contact_distance as f32)
                        } else {
                            at
                        };
                        Some(at.translated(&offset))
                    })
                };
                match destination {
                    Some(position) => env.world.issue(WorldCommand::MovePoint {
                        mover: me,
                        point_id,
                        position,
                        generate_path: !disable_pathfinding,
                    }),
                    None => debug!(agent = %self.owner(), rule = %ctx.rule.key, "no destination to move to"),
                }
            }
            Action::JumpToPos { speed_xy, speed_z } => {
                let Some(me) = me else {
                    return true;
                };
                let offset = ctx.rule.target.position;
                let position = match self.random_target(targets) {
                    Some(target) => env.world.position(target).map(|at| at.translated(&offset)),
                    None => Some(offset),
                };
                if let Some(position) = position {
                    env.world.issue(WorldCommand::MoveJump {
                        mover: me,
                        position,
                        speed_xy: speed_xy as f32,
                        speed_z: speed_z as f32,
                    });
                }
            }
            Action::RandomMove { distance } => {
                for mover in creatures(targets) {
                    if distance > 0 {
                        env.world.issue(WorldCommand::MoveRandom {
                            mover,
                            radius: distance as f32,
                        });
                    } else {
                        env.world.issue(WorldCommand::MoveIdle { mover });
                    }
                }
            }
            Action::Teleport { map } => {
                for unit in units(targets) {
                    env.world.issue(WorldCommand::Teleport {
                        unit,
                        map_id: map,
                        position: ctx.rule.target.position,
                    });
                }
            }
            Action::ActivateTaxi { path } => {
                for player in players(targets) {
                    env.world.issue(WorldCommand::ActivateTaxi { player, path });
                }
            }
            Action::PauseMovement { timer_ms, force } => {
                for mover in units(targets) {
                    env.world.issue(WorldCommand::PauseMovement {
                        mover,
                        duration_ms: timer_ms,
                        forced: force,
                    });
                }
            }
            Action::ForceDespawn {
                delay_ms,
                respawn_s,
            } => {
                for object in targets.iter().copied().filter(|g| !g.is_player()) {
                    env.world.issue(WorldCommand::Despawn {
                        object,
                        delay_ms,
                        respawn_ms: respawn_s.saturating_mul(1000),
                    });
                }
            }
            Action::Die => {
                if let Some(me) = me.filter(|me| env.world.is_alive(*me)) {
                    env.world.issue(WorldCommand::Kill {
                        victim: me,
                        killer: None,
                    });
                }
            }
            Action::KillUnit => {
                for victim in units(targets) {
                    env.world.issue(WorldCommand::Kill {
                        victim,
                        killer: None,
                    });
                }
            }
            _ => return false,
        }
        true
    }

    /// Says text group `group` and arms the text-over timer.
    ///
    /// The owner speaks unless the first creature target does; with
    /// `use_talk_target` the owner speaks to that creature instead.
    fn talk(
        &mut self,
        env: &mut ScriptEnv<'_>,
        ctx: &ActionCtx<'_>,
        targets: &[ObjectGuid],
        group: u32,
        duration_ms: u32,
        use_talk_target: bool,
    ) {
        let mut talker = self.me();
        let mut talk_target = None;
        for target in targets.iter().copied() {
            if target.is_creature() && !env.world.is_pet(target) {
                if use_talk_target {
                    talk_target = Some(target);
                } else {
                    talker = Some(target);
                }
                break;
            }
            if target.is_player() {
                talk_target = Some(target);
                break;
            }
        }
        let talk_target = talk_target.or(self.last_invoker());
        let Some(talker) = talker else {
            warn!(agent = %self.owner(), rule = %ctx.rule.key, "talk without a creature to speak");
            return;
        };

        let duration = match duration_ms {
            0 => env.world.text_duration(talker, group).unwrap_or(0),
            ms => ms,
        };
        self.start_talk_timer(group, talker.entry(), duration);
        env.world.issue(WorldCommand::Talk {
            speaker: talker,
            group,
            whisper_to: talk_target,
        });
    }

    fn npc_flags(
        &mut self,
        env: &mut ScriptEnv<'_>,
        targets: &[ObjectGuid],
        update: impl Fn(NpcFlags) -> NpcFlags,
    ) {
        for unit in creatures(targets) {
            let flags = update(env.world.npc_flags(unit));
            env.world.issue(WorldCommand::SetNpcFlags { unit, flags });
        }
    }

    fn dynamic_flags(
        &mut self,
        env: &mut ScriptEnv<'_>,
        targets: &[ObjectGuid],
        update: impl Fn(DynamicFlags) -> DynamicFlags,
    ) {
        for unit in creatures(targets) {
            let flags = update(env.world.dynamic_flags(unit));
            env.world.issue(WorldCommand::SetDynamicFlags { unit, flags });
        }
    }

    fn unit_flag(&mut self, env: &mut ScriptEnv<'_>, targets: &[ObjectGuid], flag: UnitFlags, enabled: bool) {
        for unit in units(targets) {
            env.world.issue(WorldCommand::SetUnitFlag {
                unit,
                flag,
                enabled,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_point_stops_short_of_the_target() {
        let from = Position::xyz(0.0, 0.0, 0.0);
        let to = Position::xyz(10.0, 0.0, 0.0);
        let point = contact_point(&from, &to, 2.0);
        assert!((point.x - 8.0).abs() < 1e-4);
        assert!(point.y.abs() < 1e-4);
    }

    #[test]
    fn contact_point_on_top_of_target_is_the_target() {
        let at = Position::xyz(3.0, 4.0, 0.0);
        assert_eq!(contact_point(&at, &at, 5.0), at);
    }
}
