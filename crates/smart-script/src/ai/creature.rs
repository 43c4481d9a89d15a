//! Creature AI.
use std::f32::consts::FRAC_PI_2;
use std::mem;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use game_core::{
    AliveFilter, ObjectGuid, ObjectSearch, ReactState, SearchKind, SpellInfo, WorldCommand,
};

use super::escort::{Escort, EscortState};
use super::{ESCORT_LAST_OOC_POINT, ScriptAgent, apply_to_script};
use crate::action::FollowCredit;
use crate::catalog::ScriptCatalog;
use crate::engine::{EventArgs, ScriptEnv, SmartScript};
use crate::error::ScriptError;
use crate::event::EventKind;
use crate::holder::ScriptType;
use crate::request::{AiCommand, ScriptRequest};

/// Movement type hosts report for point movement.
pub const POINT_MOTION_TYPE: u32 = 8;

const INTERACTION_DISTANCE: f32 = 5.0;
const FOLLOW_CHECK_INTERVAL_MS: u32 = 1_000;
const FOLLOW_COMPLETE_DESPAWN_MS: u32 = 5_000;
const PET_FOLLOW_DISTANCE: f32 = 1.0;
/// Rounds of self-addressed AI commands one callback may chain.
const MAX_SETTLE_ROUNDS: usize = 32;

#[derive(Clone, Debug)]
struct Follow {
    target: ObjectGuid,
    distance: f32,
    angle: f32,
    credit: u32,
    arrival_entry: u32,
    credit_type: FollowCredit,
    check_timer: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Invincibility {
    Health(u32),
    Pct(u32),
}

/// AI of a scripted creature.
///
/// Owns the creature's rule engine plus the state its actions steer:
/// melee and chase toggles, evade handling, follow with arrival credit,
/// and the escort controller. Every public callback dispatches one event
/// and then applies whatever AI commands the rules addressed to this
/// creature before returning.
#[derive(Debug)]
pub struct SmartAi {
    pub(super) script: SmartScript,
    outbox: Vec<ScriptRequest>,
    settling: bool,
    engaged: bool,
    pub(super) evading: bool,
    evade_disabled: bool,
    can_auto_attack: bool,
    can_combat_move: bool,
    pub(super) run: bool,
    attack_distance: f32,
    attack_angle: f32,
    invincibility: Option<Invincibility>,
    follow: Option<Follow>,
    pub(super) escort: Escort,
    pub(super) pending_despawn_ms: u32,
    despawn_timer: Option<u32>,
}

impl SmartAi {
    pub fn new(catalog: Arc<ScriptCatalog>, me: ObjectGuid) -> Self {
        Self::with_seed(catalog, me, 0)
    }

    pub fn with_seed(catalog: Arc<ScriptCatalog>, me: ObjectGuid, world_seed: u64) -> Self {
        Self {
            script: SmartScript::with_seed(catalog, me, ScriptType::Creature, world_seed),
            outbox: Vec::new(),
            settling: false,
            engaged: false,
            evading: false,
            evade_disabled: false,
            can_auto_attack: true,
            can_combat_move: true,
            run: true,
            attack_distance: 0.0,
            attack_angle: 0.0,
            invincibility: None,
            follow: None,
            escort: Escort::default(),
            pending_despawn_ms: 0,
            despawn_timer: None,
        }
    }

    pub fn me(&self) -> ObjectGuid {
        self.script.owner()
    }

    pub fn script_mut(&mut self) -> &mut SmartScript {
        &mut self.script
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn is_evading(&self) -> bool {
        self.evading
    }

    pub fn can_auto_attack(&self) -> bool {
        self.can_auto_attack
    }

    pub fn can_combat_move(&self) -> bool {
        self.can_combat_move
    }

    pub fn escort_state(&self) -> EscortState {
        self.escort.state
    }

    pub fn follow_target(&self) -> Option<ObjectGuid> {
        self.follow.as_ref().map(|f| f.target)
    }

    /// Raises `kind` and settles the AI commands it produced.
    fn dispatch(&mut self, env: &mut ScriptEnv<'_>, kind: EventKind, args: EventArgs) {
        self.script.process_events_for(env, kind, &args);
        self.settle(env);
    }

    /// Applies requests the engine addressed to this creature and keeps
    /// the rest for the map.
    ///
    /// Commands applied here may dispatch again; the nested calls leave
    /// their requests to the outermost round.
    pub(super) fn settle(&mut self, env: &mut ScriptEnv<'_>) {
        if self.settling {
            return;
        }
        self.settling = true;
        self.settle_rounds(env);
        self.settling = false;
    }

    fn settle_rounds(&mut self, env: &mut ScriptEnv<'_>) {
        let me = self.me();
        for _ in 0..MAX_SETTLE_ROUNDS {
            let requests = self.script.take_requests();
            if requests.is_empty() {
                return;
            }
            for request in requests {
                if request.target() != me {
                    self.outbox.push(request);
                    continue;
                }
                match request {
                    ScriptRequest::Ai { command, .. } => self.apply(env, command),
                    other => {
                        if let Err(err) = apply_to_script(&mut self.script, env, other) {
                            debug!(agent = %me, %err, "self request refused");
                        }
                    }
                }
            }
        }
        if self.script.has_pending_requests() {
            warn!(agent = %me, "AI commands keep chaining, rest deferred to the next update");
        }
    }

    /// Applies one AI command.
    pub fn apply(&mut self, env: &mut ScriptEnv<'_>, command: AiCommand) {
        trace!(agent = %self.me(), ?command, "AI command");
        match command {
            AiCommand::SetCombatMove {
                enabled,
                stop_moving,
            } => self.set_combat_move(env, enabled, stop_moving),
            AiCommand::SetAutoAttack(enabled) => self.set_auto_attack(env, enabled),
            AiCommand::AttackStart(victim) => self.attack_start(env, victim),
            AiCommand::EnterEvadeMode => self.enter_evade_mode(env),
            AiCommand::StartPath {
                run,
                path,
                repeat,
                invoker,
                start_point,
                quest,
                despawn_ms,
            } => {
                self.start_path(env, run, path, repeat, invoker, start_point);
                self.escort.quest = quest;
                self.set_despawn_time(despawn_ms);
            }
            AiCommand::PausePath { delay_ms, forced } => self.pause_path(env, delay_ms, forced),
            AiCommand::StopPath {
                despawn_ms,
                quest,
                fail,
            } => self.stop_path(env, despawn_ms, quest, fail),
            AiCommand::ResumePath => self.resume_path(env),
            AiCommand::SetRun(run) => self.set_run(env, run),
            AiCommand::SetDisableGravity(disable) => {
                env.world.issue(WorldCommand::SetDisableGravity {
                    unit: self.me(),
                    disable,
                })
            }
            AiCommand::SetFollow {
                target,
                distance,
                angle,
                credit,
                arrival_entry,
                credit_type,
            } => {
                self.follow = Some(Follow {
                    target,
                    distance,
                    angle,
                    credit,
                    arrival_entry,
                    credit_type,
                    check_timer: FOLLOW_CHECK_INTERVAL_MS,
                });
                env.world.issue(WorldCommand::MoveFollow {
                    mover: self.me(),
                    target,
                    distance,
                    angle,
                });
            }
            AiCommand::StopFollow => self.stop_follow(env, false),
            AiCommand::SetEvadeDisabled(disabled) => self.evade_disabled = disabled,
            AiCommand::SetInvincibilityHp { value, pct } => {
                self.invincibility = match (value, pct) {
                    (0, _) => None,
                    (value, true) => Some(Invincibility::Pct(value)),
                    (value, false) => Some(Invincibility::Health(value)),
                };
            }
            AiCommand::SetRangedMovement { distance, angle } => {
                self.attack_distance = distance;
                self.attack_angle = angle;
                if self.engaged && self.can_combat_move {
                    self.chase_victim(env);
                }
            }
        }
    }

    // ===== combat =====

    /// Engages `victim`, swinging and chasing as far as the rules allow.
    pub fn attack_start(&mut self, env: &mut ScriptEnv<'_>, victim: ObjectGuid) {
        let me = self.me();
        if self.evading || !env.world.is_alive(me) || victim == me {
            return;
        }
        env.engage(me, victim);
        if self.can_auto_attack {
            env.world.issue(WorldCommand::StartMeleeAttack {
                attacker: me,
                victim,
            });
        }
        if self.can_combat_move {
            env.world.issue(WorldCommand::SetRun {
                unit: me,
                run: self.run,
            });
            env.world.issue(WorldCommand::MoveChase {
                mover: me,
                target: victim,
                distance: self.attack_distance,
                angle: self.attack_angle,
            });
        }
    }

    /// First engagement since the last evade; raises AGGRO once.
    pub fn just_engaged_with(&mut self, env: &mut ScriptEnv<'_>, enemy: ObjectGuid) {
        if self.engaged {
            return;
        }
        self.engaged = true;
        self.dispatch(env, EventKind::Aggro, EventArgs::new().with_invoker(enemy));
    }

    /// Combat ran out: evade unless the creature never engaged.
    pub fn just_exited_combat(&mut self, env: &mut ScriptEnv<'_>) {
        if self.engaged {
            self.enter_evade_mode(env);
        }
    }

    pub fn enter_evade_mode(&mut self, env: &mut ScriptEnv<'_>) {
        let me = self.me();
        if self.evade_disabled {
            self.dispatch(env, EventKind::Evade, EventArgs::new());
            return;
        }
        if self.evading || !env.world.is_alive(me) {
            return;
        }
        self.engaged = false;
        self.evading = true;
        env.combat.end_all_combat(env.world.as_units(), me);
        env.world.issue(WorldCommand::StopAttack { unit: me });
        self.script
            .process_events_for(env, EventKind::Evade, &EventArgs::new());
        self.set_run(env, self.run);

        if let Some(owner) = env.world.charmer_or_owner(me) {
            env.world.issue(WorldCommand::MoveFollow {
                mover: me,
                target: owner,
                distance: PET_FOLLOW_DISTANCE,
                angle: FRAC_PI_2,
            });
            self.evading = false;
        } else if self.escort.state.contains(EscortState::ESCORTING) {
            self.escort.state.insert(EscortState::RETURNING);
            self.return_to_last_ooc_position(env);
        } else if let Some(follow) = self.follow.clone() {
            env.world.issue(WorldCommand::MoveFollow {
                mover: me,
                target: follow.target,
                distance: follow.distance,
                angle: follow.angle,
            });
            self.evading = false;
        } else {
            env.world.issue(WorldCommand::MoveHome { mover: me });
        }

        if !self.evading {
            self.script.on_reset(env);
        }
        self.settle(env);
    }

    fn return_to_last_ooc_position(&mut self, env: &mut ScriptEnv<'_>) {
        let me = self.me();
        let Some(home) = env.world.home_position(me) else {
            return;
        };
        env.world.issue(WorldCommand::SetRun { unit: me, run: true });
        env.world.issue(WorldCommand::MovePoint {
            mover: me,
            point_id: ESCORT_LAST_OOC_POINT,
            position: home,
            generate_path: true,
        });
    }

    pub fn just_reached_home(&mut self, env: &mut ScriptEnv<'_>) {
        self.evading = false;
        self.script.on_reset(env);
        self.dispatch(env, EventKind::ReachedHome, EventArgs::new());
    }

    pub fn just_died(&mut self, env: &mut ScriptEnv<'_>, killer: Option<ObjectGuid>) {
        self.engaged = false;
        self.script
            .process_events_for(env, EventKind::Death, &EventArgs::invoked_by(killer));
        if self.escort.state.contains(EscortState::ESCORTING) {
            self.end_path(env, true);
        }
        self.settle(env);
    }

    pub fn killed_unit(&mut self, env: &mut ScriptEnv<'_>, victim: ObjectGuid) {
        self.dispatch(env, EventKind::Kill, EventArgs::new().with_invoker(victim));
    }

    /// Incoming damage; returns the amount the host should apply once the
    /// invincibility floor is honoured.
    pub fn damage_taken(
        &mut self,
        env: &mut ScriptEnv<'_>,
        attacker: Option<ObjectGuid>,
        damage: u32,
        health: u32,
        max_health: u32,
    ) -> u32 {
        let args = EventArgs::invoked_by(attacker).with_vars(damage, 0);
        self.dispatch(env, EventKind::Damaged, args);
        let floor = match self.invincibility {
            None => return damage,
            Some(Invincibility::Health(value)) => value,
            Some(Invincibility::Pct(pct)) => (u64::from(max_health) * u64::from(pct) / 100) as u32,
        };
        damage.min(health.saturating_sub(floor))
    }

    pub fn damage_dealt(&mut self, env: &mut ScriptEnv<'_>, victim: ObjectGuid, damage: u32) {
        let args = EventArgs::new().with_invoker(victim).with_vars(damage, 0);
        self.dispatch(env, EventKind::DamagedTarget, args);
    }

    pub fn healed(&mut self, env: &mut ScriptEnv<'_>, healer: Option<ObjectGuid>, amount: u32) {
        let args = EventArgs::invoked_by(healer).with_vars(amount, 0);
        self.dispatch(env, EventKind::ReceiveHeal, args);
    }

    pub fn spell_hit(&mut self, env: &mut ScriptEnv<'_>, caster: Option<ObjectGuid>, spell: SpellInfo) {
        let args = EventArgs::invoked_by(caster).with_spell(spell);
        self.dispatch(env, EventKind::SpellHit, args);
    }

    pub fn spell_hit_target(&mut self, env: &mut ScriptEnv<'_>, target: ObjectGuid, spell: SpellInfo) {
        let args = EventArgs::new().with_invoker(target).with_spell(spell);
        self.dispatch(env, EventKind::SpellHitTarget, args);
    }

    pub fn on_spell_cast(&mut self, env: &mut ScriptEnv<'_>, spell: SpellInfo) {
        self.dispatch(env, EventKind::OnSpellCast, EventArgs::new().with_spell(spell));
    }

    pub fn on_spell_start(&mut self, env: &mut ScriptEnv<'_>, spell: SpellInfo) {
        self.dispatch(env, EventKind::OnSpellStart, EventArgs::new().with_spell(spell));
    }

    pub fn on_spell_failed(&mut self, env: &mut ScriptEnv<'_>, spell: SpellInfo) {
        self.dispatch(env, EventKind::OnSpellFailed, EventArgs::new().with_spell(spell));
    }

    /// `who` moved within sight; the event kinds sort out combat state.
    pub fn move_in_line_of_sight(&mut self, env: &mut ScriptEnv<'_>, who: ObjectGuid) {
        let args = EventArgs::new().with_invoker(who);
        self.script.process_events_for(env, EventKind::OocLos, &args);
        self.script.process_events_for(env, EventKind::IcLos, &args);
        self.settle(env);
    }

    fn set_combat_move(&mut self, env: &mut ScriptEnv<'_>, enabled: bool, stop_moving: bool) {
        if self.can_combat_move == enabled {
            return;
        }
        self.can_combat_move = enabled;
        if !self.engaged {
            return;
        }
        if enabled {
            if env.world.react_state(self.me()) != ReactState::Passive {
                self.chase_victim(env);
            }
        } else if stop_moving {
            env.world.issue(WorldCommand::MoveIdle { mover: self.me() });
        }
    }

    fn chase_victim(&mut self, env: &mut ScriptEnv<'_>) {
        let me = self.me();
        let Some(victim) = self.script.victim_of(env, me) else {
            return;
        };
        env.world.issue(WorldCommand::SetRun {
            unit: me,
            run: self.run,
        });
        env.world.issue(WorldCommand::MoveChase {
            mover: me,
            target: victim,
            distance: self.attack_distance,
            angle: self.attack_angle,
        });
    }

    fn set_auto_attack(&mut self, env: &mut ScriptEnv<'_>, enabled: bool) {
        self.can_auto_attack = enabled;
        if !self.engaged {
            return;
        }
        let me = self.me();
        if !enabled {
            env.world.issue(WorldCommand::StopAttack { unit: me });
        } else if let Some(victim) = self.script.victim_of(env, me) {
            env.world.issue(WorldCommand::StartMeleeAttack {
                attacker: me,
                victim,
            });
        }
    }

    pub(super) fn set_run(&mut self, env: &mut ScriptEnv<'_>, run: bool) {
        self.run = run;
        env.world.issue(WorldCommand::SetRun {
            unit: self.me(),
            run,
        });
    }

    // ===== follow =====

    /// Ends a follow. A completed follow credits the followed player,
    /// raises FOLLOW_COMPLETED and despawns the creature shortly after.
    pub fn stop_follow(&mut self, env: &mut ScriptEnv<'_>, complete: bool) {
        let me = self.me();
        let Some(follow) = self.follow.take() else {
            return;
        };
        env.world.issue(WorldCommand::MoveIdle { mover: me });
        if !complete {
            return;
        }
        let player = Some(follow.target).filter(|g| g.is_player() && env.world.is_in_world(*g));
        if let Some(player) = player {
            if follow.credit != 0 {
                let command = match follow.credit_type {
                    FollowCredit::KilledMonster => WorldCommand::KilledMonsterCredit {
                        player,
                        entry: follow.credit,
                    },
                    FollowCredit::QuestEvent => WorldCommand::GroupEventHappens {
                        player,
                        quest: follow.credit,
                    },
                };
                env.world.issue(command);
            }
        }
        self.set_despawn_time(FOLLOW_COMPLETE_DESPAWN_MS);
        self.start_despawn();
        self.dispatch(env, EventKind::FollowCompleted, EventArgs::invoked_by(player));
    }

    fn update_follow(&mut self, env: &mut ScriptEnv<'_>, diff: u32) {
        let me = self.me();
        let Some(follow) = self.follow.as_mut() else {
            return;
        };
        if follow.arrival_entry == 0 {
            return;
        }
        if follow.check_timer > diff {
            follow.check_timer -= diff;
            return;
        }
        follow.check_timer = FOLLOW_CHECK_INTERVAL_MS;
        let query = ObjectSearch::around(me, SearchKind::CREATURE, INTERACTION_DISTANCE)
            .with_entry(follow.arrival_entry)
            .with_alive(AliveFilter::Alive);
        if env.world.search(&query).into_iter().any(|g| g != me) {
            debug!(agent = %me, "follow destination reached");
            self.stop_follow(env, true);
        }
    }

    // ===== despawn =====

    /// Arms a despawn that starts counting once [`Self::start_despawn`] runs.
    pub(super) fn set_despawn_time(&mut self, delay_ms: u32) {
        if self.despawn_timer.is_none() {
            self.pending_despawn_ms = delay_ms;
        }
    }

    pub(super) fn start_despawn(&mut self) {
        if self.pending_despawn_ms != 0 {
            self.despawn_timer = Some(mem::take(&mut self.pending_despawn_ms));
        }
    }

    /// Counts down an armed despawn.
    fn update_despawn(&mut self, env: &mut ScriptEnv<'_>, diff: u32) {
        let Some(timer) = self.despawn_timer else {
            return;
        };
        if timer > diff {
            self.despawn_timer = Some(timer - diff);
            return;
        }
        self.despawn_timer = None;
        env.world.issue(WorldCommand::Despawn {
            object: self.me(),
            delay_ms: 0,
            respawn_ms: 0,
        });
    }

    // ===== lifecycle callbacks =====

    pub fn reset(&mut self, env: &mut ScriptEnv<'_>) {
        self.script.on_reset(env);
        self.settle(env);
    }

    /// The creature came back after death or despawn.
    pub fn respawned(&mut self, env: &mut ScriptEnv<'_>) {
        self.engaged = false;
        self.evading = false;
        self.evade_disabled = false;
        self.follow = None;
        self.escort = Escort::default();
        self.pending_despawn_ms = 0;
        self.despawn_timer = None;
        self.script.on_reset(env);
        self.dispatch(env, EventKind::Respawn, EventArgs::new());
    }

    pub fn corpse_removed(&mut self, env: &mut ScriptEnv<'_>, respawn_delay_s: u32) {
        self.dispatch(env, EventKind::CorpseRemoved, EventArgs::new().with_vars(respawn_delay_s, 0));
    }

    pub fn on_despawn(&mut self, env: &mut ScriptEnv<'_>) {
        self.dispatch(env, EventKind::OnDespawn, EventArgs::new());
    }

    pub fn on_charmed(&mut self, env: &mut ScriptEnv<'_>, apply: bool) {
        self.dispatch(env, EventKind::Charmed, EventArgs::new().with_flag(apply));
    }

    pub fn received_emote(&mut self, env: &mut ScriptEnv<'_>, player: ObjectGuid, emote: u32) {
        let args = EventArgs::new().with_invoker(player).with_vars(emote, 0);
        self.dispatch(env, EventKind::ReceiveEmote, args);
    }

    pub fn set_data(&mut self, env: &mut ScriptEnv<'_>, field: u32, value: u32, invoker: Option<ObjectGuid>) {
        self.script.set_data(env, field, value, invoker);
        self.settle(env);
    }

    pub fn do_action(&mut self, env: &mut ScriptEnv<'_>, action: u32) {
        self.script.do_action(env, action);
        self.settle(env);
    }

    pub fn quest_accepted(&mut self, env: &mut ScriptEnv<'_>, player: ObjectGuid, quest: u32) {
        let args = EventArgs::new().with_invoker(player).with_vars(quest, 0);
        self.dispatch(env, EventKind::AcceptedQuest, args);
    }

    pub fn quest_rewarded(&mut self, env: &mut ScriptEnv<'_>, player: ObjectGuid, quest: u32, option: u32) {
        let args = EventArgs::new().with_invoker(player).with_vars(quest, option);
        self.dispatch(env, EventKind::RewardQuest, args);
    }

    pub fn gossip_hello(&mut self, env: &mut ScriptEnv<'_>, player: ObjectGuid) {
        self.dispatch(env, EventKind::GossipHello, EventArgs::new().with_invoker(player));
    }

    pub fn gossip_select(&mut self, env: &mut ScriptEnv<'_>, player: ObjectGuid, menu: u32, option: u32) {
        let args = EventArgs::new().with_invoker(player).with_vars(menu, option);
        self.dispatch(env, EventKind::GossipSelect, args);
    }

    pub fn game_event_start(&mut self, env: &mut ScriptEnv<'_>, event_id: u32) {
        self.dispatch(env, EventKind::GameEventStart, EventArgs::new().with_vars(event_id, 0));
    }

    pub fn game_event_end(&mut self, env: &mut ScriptEnv<'_>, event_id: u32) {
        self.dispatch(env, EventKind::GameEventEnd, EventArgs::new().with_vars(event_id, 0));
    }

    pub fn passenger_boarded(&mut self, env: &mut ScriptEnv<'_>, passenger: ObjectGuid, seat: u8, apply: bool) {
        let kind = if apply {
            EventKind::PassengerBoarded
        } else {
            EventKind::PassengerRemoved
        };
        let args = EventArgs::new().with_invoker(passenger).with_vars(u32::from(seat), 0);
        self.dispatch(env, kind, args);
    }

    pub fn is_summoned_by(&mut self, env: &mut ScriptEnv<'_>, summoner: ObjectGuid) {
        let args = if summoner.is_unit() {
            EventArgs::new().with_invoker(summoner)
        } else {
            EventArgs::new().with_object(summoner)
        };
        self.dispatch(env, EventKind::JustSummoned, args);
    }

    pub fn just_summoned(&mut self, env: &mut ScriptEnv<'_>, summon: ObjectGuid) {
        self.dispatch(env, EventKind::SummonedUnit, EventArgs::new().with_invoker(summon));
    }

    pub fn summoned_creature_dies(&mut self, env: &mut ScriptEnv<'_>, summon: ObjectGuid) {
        self.dispatch(env, EventKind::SummonedUnitDies, EventArgs::new().with_invoker(summon));
    }

    pub fn summoned_creature_despawn(&mut self, env: &mut ScriptEnv<'_>, summon: ObjectGuid) {
        let args = EventArgs::new()
            .with_invoker(summon)
            .with_vars(summon.entry(), 0);
        self.dispatch(env, EventKind::SummonDespawned, args);
    }
}

impl ScriptAgent for SmartAi {
    fn guid(&self) -> ObjectGuid {
        self.me()
    }

    fn script(&self) -> &SmartScript {
        &self.script
    }

    fn initialize(&mut self, env: &mut ScriptEnv<'_>) {
        self.script.initialize(env);
        if env.world.is_alive(self.me()) {
            self.script.on_reset(env);
            self.script
                .process_events_for(env, EventKind::Respawn, &EventArgs::new());
        }
        self.settle(env);
    }

    fn update(&mut self, env: &mut ScriptEnv<'_>, diff: u32) {
        if !env.world.is_in_world(self.me()) {
            return;
        }
        self.script.on_update(env, diff);
        self.settle(env);
        self.update_path(env, diff);
        self.update_follow(env, diff);
        self.update_despawn(env, diff);
        self.settle(env);
    }

    fn deliver(&mut self, env: &mut ScriptEnv<'_>, request: ScriptRequest) -> Result<(), ScriptError> {
        let result = match request {
            ScriptRequest::Ai { command, .. } => {
                self.apply(env, command);
                Ok(())
            }
            other => apply_to_script(&mut self.script, env, other),
        };
        self.settle(env);
        result
    }

    fn take_requests(&mut self) -> Vec<ScriptRequest> {
        mem::take(&mut self.outbox)
    }

    fn creature_ai(&mut self) -> Option<&mut SmartAi> {
        Some(self)
    }
}
