//! Waypoint escorts.
//!
//! The host moves the creature along a path and reports every node it
//! reaches; the controller here owns the escort bookkeeping around that
//! movement: pauses, the invoker range check, quest credit and the end of
//! the path.
use std::mem;

use bitflags::bitflags;
use tracing::{debug, error, trace, warn};

use game_core::{NpcFlags, ObjectGuid, WorldCommand};

use super::creature::{POINT_MOTION_TYPE, SmartAi};
use super::ESCORT_LAST_OOC_POINT;
use crate::engine::{ESCORT_TARGETS, EventArgs, ScriptEnv};
use crate::event::EventKind;

bitflags! {
    /// Escort progress of a creature.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct EscortState: u8 {
        const ESCORTING = 1 << 0;
        /// Walking back to where combat interrupted the escort.
        const RETURNING = 1 << 1;
        const PAUSED    = 1 << 2;
    }
}

#[derive(Clone, Debug, Default)]
pub(super) struct Escort {
    pub state: EscortState,
    pub path_id: u32,
    pub current_point: u32,
    pub repeat: bool,
    pub quest: u32,
    pub saved_npc_flags: Option<NpcFlags>,
    pub pause_timer: u32,
    pub pause_forced: bool,
    pub point_reached: bool,
    pub path_ended: bool,
    pub ooc_reached: bool,
    pub check_timer: u32,
}

impl Escort {
    fn is_escorting(&self) -> bool {
        self.state.contains(EscortState::ESCORTING)
    }

    fn waypoint_args(&self) -> EventArgs {
        EventArgs::new().with_vars(self.current_point, self.path_id)
    }
}

impl SmartAi {
    /// Starts walking `path_id`, replacing any escort in progress.
    ///
    /// A player invoker turns the creature into an escort: its NPC flags
    /// are stripped until the path ends.
    pub fn start_path(
        &mut self,
        env: &mut ScriptEnv<'_>,
        run: bool,
        path_id: u32,
        repeat: bool,
        invoker: Option<ObjectGuid>,
        start_point: u32,
    ) {
        let me = self.me();
        if self.escort.is_escorting() {
            self.stop_path(env, 0, 0, false);
        }
        self.set_run(env, run);
        if path_id == 0 {
            return;
        }
        if self.script.catalog().paths.get(path_id).is_none() {
            warn!(agent = %me, path_id, "waypoint path does not exist");
            return;
        }
        self.escort = Escort {
            state: EscortState::ESCORTING,
            path_id,
            current_point: start_point,
            repeat,
            check_timer: self.script.catalog().config.escort_check_interval_ms,
            ..Escort::default()
        };
        if invoker.is_some_and(|g| g.is_player()) {
            self.escort.saved_npc_flags = Some(env.world.npc_flags(me));
            env.world.issue(WorldCommand::SetNpcFlags {
                unit: me,
                flags: NpcFlags::empty(),
            });
        }
        debug!(agent = %me, path_id, start_point, repeat, "escort started");
        env.world.issue(WorldCommand::MovePath {
            mover: me,
            path_id,
            start_point,
            repeat,
        });
    }

    /// Pauses for `delay_ms`. A forced pause stops on the spot; otherwise
    /// the creature halts at the next node it reaches.
    pub fn pause_path(&mut self, env: &mut ScriptEnv<'_>, delay_ms: u32, forced: bool) {
        let me = self.me();
        if !self.escort.is_escorting() {
            env.world.issue(WorldCommand::PauseMovement {
                mover: me,
                duration_ms: delay_ms,
                forced,
            });
            return;
        }
        if self.escort.state.contains(EscortState::PAUSED) {
            error!(agent = %me, path_id = self.escort.path_id, "escort paused while already paused");
            return;
        }
        self.escort.pause_timer = delay_ms;
        if forced {
            self.escort.pause_forced = true;
            self.set_run(env, self.run);
            env.world.issue(WorldCommand::PauseMovement {
                mover: me,
                duration_ms: 0,
                forced: true,
            });
            if let Some(position) = env.world.position(me) {
                env.world.issue(WorldCommand::SetHomePosition { unit: me, position });
            }
        } else {
            self.escort.point_reached = false;
        }
        self.escort.state.insert(EscortState::PAUSED);
        let args = self.escort.waypoint_args();
        self.script
            .process_events_for(env, EventKind::WaypointPaused, &args);
    }

    pub fn resume_path(&mut self, env: &mut ScriptEnv<'_>) {
        if !self.escort.state.contains(EscortState::PAUSED) {
            trace!(agent = %self.me(), "resume without a paused escort");
            return;
        }
        let args = self.escort.waypoint_args();
        self.script
            .process_events_for(env, EventKind::WaypointResumed, &args);
        self.escort.state.remove(EscortState::PAUSED);
        self.escort.pause_forced = false;
        self.escort.point_reached = false;
        self.escort.pause_timer = 0;
        self.set_run(env, self.run);
        env.world.issue(WorldCommand::ResumeMovement { mover: self.me() });
    }

    /// Halts the escort and ends it, failing its quest when `fail` is set.
    pub fn stop_path(&mut self, env: &mut ScriptEnv<'_>, despawn_ms: u32, quest: u32, fail: bool) {
        let me = self.me();
        self.set_despawn_time(despawn_ms);
        env.world.issue(WorldCommand::MoveIdle { mover: me });
        if !self.escort.is_escorting() {
            return;
        }
        if quest != 0 {
            self.escort.quest = quest;
        }
        if self.escort.current_point != 0 {
            let args = self.escort.waypoint_args();
            self.script
                .process_events_for(env, EventKind::WaypointStopped, &args);
        }
        self.end_path(env, fail);
    }

    /// Clears the escort, settles its quest and restores the NPC flags.
    ///
    /// Only a successful end raises WAYPOINT_ENDED, restarts a repeating
    /// path and starts an armed despawn.
    pub(super) fn end_path(&mut self, env: &mut ScriptEnv<'_>, fail: bool) {
        let me = self.me();
        let escort = mem::take(&mut self.escort);
        if let Some(flags) = escort.saved_npc_flags {
            env.world.issue(WorldCommand::SetNpcFlags { unit: me, flags });
        }
        if escort.quest != 0 {
            self.credit_escort_quest(env, escort.quest, fail);
        }
        debug!(agent = %me, path_id = escort.path_id, fail, "escort ended");
        if fail {
            return;
        }
        let args = escort.waypoint_args();
        self.script
            .process_events_for(env, EventKind::WaypointEnded, &args);
        if escort.repeat {
            self.start_path(env, self.run, escort.path_id, true, None, 0);
        }
        self.start_despawn();
    }

    fn credit_escort_quest(&mut self, env: &mut ScriptEnv<'_>, quest: u32, fail: bool) {
        let Some(players) = self.script.stored_targets(env.units(), ESCORT_TARGETS) else {
            return;
        };
        match players.as_slice() {
            [player] if player.is_player() => {
                if fail {
                    let mut members = env.world.group_members(*player);
                    if members.is_empty() {
                        members.push(*player);
                    }
                    for member in members {
                        env.world.issue(WorldCommand::FailQuest {
                            player: member,
                            quest,
                        });
                    }
                } else {
                    env.world.issue(WorldCommand::GroupEventHappens {
                        player: *player,
                        quest,
                    });
                }
            }
            players => {
                for player in players.iter().copied().filter(ObjectGuid::is_player) {
                    let command = if fail {
                        WorldCommand::FailQuest { player, quest }
                    } else {
                        WorldCommand::AreaExploredOrEventHappens { player, quest }
                    };
                    env.world.issue(command);
                }
            }
        }
    }

    /// Whether an escorting player is still close enough.
    ///
    /// Without stored escort players there is nothing to check. A lone
    /// player also counts as near when any member of their group is.
    fn escort_invoker_in_range(&self, env: &ScriptEnv<'_>) -> bool {
        let me = self.me();
        let Some(targets) = self.script.stored_targets(env.units(), ESCORT_TARGETS) else {
            return true;
        };
        let mut max_distance = self.script.catalog().config.escort_max_player_distance;
        if env.world.has_instance_script(me) {
            max_distance *= 2.0;
        }
        let near = |guid: ObjectGuid| {
            env.world
                .distance(me, guid)
                .is_some_and(|d| d <= max_distance)
        };
        match targets.as_slice() {
            [player] if player.is_player() => {
                near(*player)
                    || env
                        .world
                        .group_members(*player)
                        .into_iter()
                        .any(|member| member != *player && near(member))
            }
            targets => targets
                .iter()
                .copied()
                .any(|guid| guid.is_player() && near(guid)),
        }
    }

    /// Ticks the escort: invoker range, pause expiry, path end and the
    /// return from combat.
    pub(super) fn update_path(&mut self, env: &mut ScriptEnv<'_>, diff: u32) {
        let me = self.me();
        if !self.escort.is_escorting() {
            return;
        }
        if self.escort.check_timer <= diff {
            if !self.escort_invoker_in_range(env) {
                debug!(agent = %me, "escort invoker out of range");
                let quest = self.escort.quest;
                self.stop_path(env, 0, quest, true);
                // out of range is handled like a death so scripts can clean up
                self.script.process_events_for(
                    env,
                    EventKind::Death,
                    &EventArgs::new().with_invoker(me),
                );
                env.world.issue(WorldCommand::Despawn {
                    object: me,
                    delay_ms: 0,
                    respawn_ms: 0,
                });
                return;
            }
            self.escort.check_timer = self.script.catalog().config.escort_check_interval_ms;
        } else {
            self.escort.check_timer -= diff;
        }

        let escort = &mut self.escort;
        if escort.state.contains(EscortState::PAUSED) && (escort.point_reached || escort.pause_forced) {
            let can_resume = escort.pause_timer != 0
                && !env.combat.is_in_combat(me)
                && !escort.state.contains(EscortState::RETURNING);
            if can_resume {
                if escort.pause_timer <= diff {
                    self.resume_path(env);
                } else {
                    escort.pause_timer -= diff;
                }
            }
        } else if escort.path_ended {
            escort.path_ended = false;
            self.stop_path(env, 0, 0, false);
            return;
        }

        if self.escort.state.contains(EscortState::RETURNING) && self.escort.ooc_reached {
            self.escort.state.remove(EscortState::RETURNING);
            self.escort.ooc_reached = false;
            self.set_run(env, self.run);
            env.world.issue(WorldCommand::ResumeMovement { mover: me });
        }
    }

    /// The host reached node `point_id` of `path_id`.
    pub fn waypoint_reached(&mut self, env: &mut ScriptEnv<'_>, point_id: u32, path_id: u32) {
        let me = self.me();
        let args = EventArgs::new().with_vars(point_id, path_id);
        if !self.escort.is_escorting() {
            self.script
                .process_events_for(env, EventKind::WaypointReached, &args);
            self.settle(env);
            return;
        }
        self.escort.current_point = point_id;
        self.script
            .process_events_for(env, EventKind::WaypointReached, &args);
        if !self.escort.is_escorting() {
            self.settle(env);
            return;
        }
        if self.escort.pause_timer != 0 && !self.escort.pause_forced {
            self.escort.point_reached = true;
            env.world.issue(WorldCommand::PauseMovement {
                mover: me,
                duration_ms: 0,
                forced: false,
            });
            if let Some(position) = env.world.position(me) {
                env.world.issue(WorldCommand::SetHomePosition { unit: me, position });
            }
        } else {
            let last = self
                .script
                .catalog()
                .paths
                .get(path_id)
                .and_then(|path| path.nodes.last())
                .map(|node| node.point_id);
            if last == Some(point_id) {
                self.escort.path_ended = true;
            }
        }
        self.settle(env);
    }

    /// The host finished a path on its own.
    pub fn waypoint_path_ended(&mut self, env: &mut ScriptEnv<'_>, point_id: u32, path_id: u32) {
        if self.escort.is_escorting() {
            self.escort.current_point = point_id;
            self.escort.path_ended = true;
            return;
        }
        let args = EventArgs::new().with_vars(point_id, path_id);
        self.script
            .process_events_for(env, EventKind::WaypointEnded, &args);
        self.settle(env);
    }

    /// Point movement finished; the return leg of an interrupted escort
    /// ends evade.
    pub fn movement_inform(&mut self, env: &mut ScriptEnv<'_>, movement_type: u32, point_id: u32) {
        let returned = movement_type == POINT_MOTION_TYPE && point_id == ESCORT_LAST_OOC_POINT;
        if returned {
            self.evading = false;
        }
        let args = EventArgs::new().with_vars(movement_type, point_id);
        self.script
            .process_events_for(env, EventKind::MovementInform, &args);
        if returned && self.escort.is_escorting() {
            self.escort.ooc_reached = true;
        }
        self.settle(env);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_escort_is_idle() {
        let escort = Escort::default();
        assert!(!escort.is_escorting());
        assert_eq!(escort.waypoint_args().var0, 0);
    }

    #[test]
    fn escort_states_combine() {
        let mut state = EscortState::ESCORTING;
        state.insert(EscortState::PAUSED);
        assert!(state.contains(EscortState::ESCORTING | EscortState::PAUSED));
        state.remove(EscortState::PAUSED);
        assert_eq!(state, EscortState::ESCORTING);
    }
}
