//! Spell, threat, combat and navigation actions.
use std::f32::consts::PI;

use tracing::{debug, trace};

use game_core::{AliveFilter, ObjectGuid, ObjectSearch, SearchKind, WorldCommand};

use super::{creatures, units};
use crate::action::{Action, CastFlags};
use crate::engine::{ActionCtx, ESCORT_TARGETS, ScriptEnv, SmartScript};
use crate::request::{AiCommand, ScriptRequest};

fn degrees(angle: u32) -> f32 {
    angle as f32 * PI / 180.0
}

fn threat_pct(inc: u32, dec: u32) -> i32 {
    (i64::from(inc) - i64::from(dec)).clamp(-100, i64::from(i32::MAX)) as i32
}

impl SmartScript {
    pub(super) fn combat_action(
        &mut self,
        env: &mut ScriptEnv<'_>,
        ctx: &ActionCtx<'_>,
        targets: &[ObjectGuid],
    ) -> bool {
        let me = self.me();
        match ctx.rule.action {
            Action::Cast {
                spell,
                flags,
                triggered,
                targets_limit,
            } => {
                let mut targets = targets.to_vec();
                if targets_limit > 0 && targets.len() > targets_limit as usize {
                    let mut keep: Vec<usize> =
                        rand::seq::index::sample(self.rng(), targets.len(), targets_limit as usize)
                            .into_vec();
                    keep.sort_unstable();
                    targets = keep.into_iter().map(|i| targets[i]).collect();
                }
                let caster = self.base();
                let mut cast_any = false;
                for target in units(&targets) {
                    if flags.contains(CastFlags::AURA_NOT_PRESENT) && env.world.has_aura(target, spell) {
                        trace!(agent = %self.owner(), spell, target = %target, "aura already present");
                        continue;
                    }
                    if flags.contains(CastFlags::INTERRUPT_PREVIOUS) && caster.is_unit() {
                        env.world.issue(WorldCommand::InterruptSpell {
                            unit: caster,
                            spell: None,
                            with_delayed: false,
                            instant: true,
                        });
                    }
                    env.world.issue(WorldCommand::CastSpell {
                        caster,
                        target,
                        spell,
                        triggered,
                    });
                    cast_any = true;
                }
                if cast_any && flags.contains(CastFlags::COMBAT_MOVE) {
                    self.ai_request_to_me(AiCommand::SetCombatMove {
                        enabled: false,
                        stop_moving: true,
                    });
                }
            }
            Action::SelfCast {
                spell,
                flags,
                triggered,
            } => {
                for target in units(targets) {
                    if flags.contains(CastFlags::AURA_NOT_PRESENT) && env.world.has_aura(target, spell) {
                        continue;
                    }
                    if flags.contains(CastFlags::INTERRUPT_PREVIOUS) {
                        env.world.issue(WorldCommand::InterruptSpell {
                            unit: target,
                            spell: None,
                            with_delayed: false,
                            instant: true,
                        });
                    }
                    env.world.issue(WorldCommand::CastSpell {
                        caster: target,
                        target,
                        spell,
                        triggered,
                    });
                }
            }
            Action::InvokerCast {
                spell,
                flags,
                triggered,
            } => {
                let Some(caster) = ctx.trigger.filter(ObjectGuid::is_unit) else {
                    debug!(agent = %self.owner(), rule = %ctx.rule.key, "invoker cast without an invoker");
                    return true;
                };
                if flags.contains(CastFlags::INTERRUPT_PREVIOUS) {
                    env.world.issue(WorldCommand::InterruptSpell {
                        unit: caster,
                        spell: None,
                        with_delayed: false,
                        instant: true,
                    });
                }
                for target in targets.iter().copied() {
                    if flags.contains(CastFlags::AURA_NOT_PRESENT)
                        && target.is_unit()
                        && env.world.has_aura(target, spell)
                    {
                        continue;
                    }
                    env.world.issue(WorldCommand::CastSpell {
                        caster,
                        target,
                        spell,
                        triggered,
                    });
                }
            }
            Action::CrossCast {
                spell,
                flags,
                ref casters,
            } => {
                let casters = self.resolve_selector(env, casters, ctx.trigger);
                let triggered = flags.contains(CastFlags::TRIGGERED);
                for caster in units(&casters) {
                    if flags.contains(CastFlags::INTERRUPT_PREVIOUS) {
                        env.world.issue(WorldCommand::InterruptSpell {
                            unit: caster,
                            spell: None,
                            with_delayed: false,
                            instant: true,
                        });
                    }
                    for target in units(targets) {
                        if flags.contains(CastFlags::AURA_NOT_PRESENT) && env.world.has_aura(target, spell) {
                            continue;
                        }
                        env.world.issue(WorldCommand::CastSpell {
                            caster,
                            target,
                            spell,
                            triggered,
                        });
                    }
                }
            }
            Action::InterruptSpell {
                with_delayed,
                spell,
                with_instant,
            } => {
                for unit in units(targets) {
                    env.world.issue(WorldCommand::InterruptSpell {
                        unit,
                        spell: (spell != 0).then_some(spell),
                        with_delayed,
                        instant: with_instant,
                    });
                }
            }
            Action::RemoveAurasFromSpell {
                spell,
                charges,
                only_own,
            } => {
                for unit in units(targets) {
                    env.world.issue(WorldCommand::RemoveAuras {
                        unit,
                        spell: (spell != 0).then_some(spell),
                        charges,
                        only_own,
                    });
                }
            }
            Action::ThreatSinglePct { inc, dec } => {
                let Some(me) = me else {
                    return true;
                };
                let pct = threat_pct(inc, dec);
                for target in units(targets) {
                    env.combat.modify_threat_by_percent(me, target, pct);
                }
            }
            Action::ThreatAllPct { inc, dec } => {
                if let Some(me) = me {
                    env.combat
                        .modify_all_threat_by_percent(me, threat_pct(inc, dec));
                }
            }
            Action::AddThreat { inc, dec } => {
                let Some(me) = me.filter(|me| env.world.can_have_threat_list(*me)) else {
                    return true;
                };
                let amount = inc as f32 - dec as f32;
                for target in units(targets) {
                    let oracle = env.world.as_units();
                    env.combat
                        .add_threat(oracle, me, target, amount, None, true, true);
                }
            }
            Action::AutoAttack { enabled } => self.ai_request_to_me(AiCommand::SetAutoAttack(enabled)),
            Action::AllowCombatMovement { enabled } => {
                self.ai_request_to_me(AiCommand::SetCombatMove {
                    enabled,
                    stop_moving: false,
                })
            }
            Action::Evade {
                to_respawn_position,
            } => {
                if to_respawn_position {
                    trace!(agent = %self.owner(), "evading toward the respawn position");
                }
                self.ai_request_to_me(AiCommand::EnterEvadeMode);
            }
            Action::DisableEvade { disable } => {
                self.ai_request_to_me(AiCommand::SetEvadeDisabled(disable))
            }
            Action::FleeForAssist { .. } => {
                if let Some(me) = me {
                    env.world.issue(WorldCommand::FleeForAssist { unit: me });
                }
            }
            Action::CombatStop => {
                if let Some(me) = me {
                    let oracle = env.world.as_units();
                    env.combat.end_all_combat(oracle, me);
                    env.world.issue(WorldCommand::StopAttack { unit: me });
                }
            }
            Action::AttackStop => {
                for unit in units(targets) {
                    env.world.issue(WorldCommand::StopAttack { unit });
                }
            }
            Action::AttackStart => {
                let unit_targets: Vec<ObjectGuid> = units(targets).collect();
                if let Some(victim) = self.random_target(&unit_targets) {
                    self.ai_request_to_me(AiCommand::AttackStart(victim));
                }
            }
            Action::CallForHelp { range, .. } => {
                if let Some(me) = me {
                    env.world.issue(WorldCommand::CallForHelp {
                        unit: me,
                        radius: range as f32,
                    });
                }
            }
            Action::SetInCombatWithZone => {
                for creature in creatures(targets) {
                    let query = ObjectSearch::around(creature, SearchKind::PLAYER, f32::MAX)
                        .with_alive(AliveFilter::Alive);
                    for player in env.world.search(&query) {
                        env.engage(creature, player);
                    }
                }
            }
            Action::SetInvincibilityHpLevel { min_hp, percent } => {
                let command = AiCommand::SetInvincibilityHp {
                    value: if percent != 0 { percent } else { min_hp },
                    pct: percent != 0,
                };
                for target in creatures(targets) {
                    self.push_request(ScriptRequest::Ai {
                        target,
                        command: command.clone(),
                    });
                }
            }
            Action::SetRangedMovement { distance, angle } => {
                for target in creatures(targets) {
                    self.push_request(ScriptRequest::Ai {
                        target,
                        command: AiCommand::SetRangedMovement {
                            distance: distance as f32,
                            angle: degrees(angle),
                        },
                    });
                }
            }
            Action::Follow {
                dist,
                angle,
                entry,
                credit,
                credit_type,
            } => {
                let command = match units(targets).next() {
                    Some(target) => AiCommand::SetFollow {
                        target,
                        distance: dist as f32 + 0.1,
                        angle: if angle > 6 { degrees(angle) } else { angle as f32 },
                        credit,
                        arrival_entry: entry,
                        credit_type,
                    },
                    None => AiCommand::StopFollow,
                };
                self.ai_request_to_me(command);
            }
            Action::WpStart {
                run,
                path,
                repeat,
                quest,
                despawn_ms,
            } => {
                self.store_targets(ESCORT_TARGETS, targets.to_vec());
                self.ai_request_to_me(AiCommand::StartPath {
                    run,
                    path,
                    repeat,
                    invoker: ctx.trigger,
                    start_point: 0,
                    quest,
                    despawn_ms,
                });
            }
            Action::WpPause { delay_ms } => self.ai_request_to_me(AiCommand::PausePath {
                delay_ms,
                forced: true,
            }),
            Action::WpStop {
                despawn_ms,
                quest,
                fail,
            } => self.ai_request_to_me(AiCommand::StopPath {
                despawn_ms,
                quest,
                fail,
            }),
            Action::WpResume => self.ai_request_to_me(AiCommand::ResumePath),
            Action::StartClosestWaypoint { ref paths } => {
                let catalog = self.catalog().clone();
                for target in creatures(targets) {
                    let Some(from) = env.world.position(target) else {
                        continue;
                    };
                    let closest = paths
                        .iter()
                        .filter_map(|id| catalog.paths.get(*id).map(|path| (*id, path)))
                        .filter_map(|(id, path)| {
                            let (index, distance) = path.closest_node(&from)?;
                            Some((id, path.node(index)?.point_id, distance))
                        })
                        .min_by(|a, b| a.2.total_cmp(&b.2));
                    match closest {
                        Some((path, start_point, _)) => self.push_request(ScriptRequest::Ai {
                            target,
                            command: AiCommand::StartPath {
                                run: false,
                                path,
                                repeat: true,
                                invoker: None,
                                start_point,
                                quest: 0,
                                despawn_ms: 0,
                            },
                        }),
                        None => debug!(agent = %self.owner(), target = %target, "no waypoint path near target"),
                    }
                }
            }
            _ => return false,
        }
        true
    }

    /// AI state change for the owning creature; other owners have no AI to steer.
    fn ai_request_to_me(&mut self, command: AiCommand) {
        match self.me() {
            Some(me) => self.push_request(ScriptRequest::Ai {
                target: me,
                command,
            }),
            None => debug!(agent = %self.owner(), ?command, "AI request without a creature base"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threat_percent_floors_at_minus_hundred() {
        assert_eq!(threat_pct(0, 250), -100);
        assert_eq!(threat_pct(50, 20), 30);
    }

    #[test]
    fn degrees_convert_to_radians() {
        assert!((degrees(180) - PI).abs() < 1e-6);
    }
}
