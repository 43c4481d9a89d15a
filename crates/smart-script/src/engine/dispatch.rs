//! Event routing, timers and the action entry point.
use std::sync::Arc;

use tracing::{error, trace};

use game_core::{
    AliveFilter, ConditionSource, ObjectGuid, ObjectSearch, PowerType, ScriptRng, SearchKind,
    UnitState,
};

use super::{ActionCtx, EventArgs, ListKind, RuleRef, ScriptEnv, SmartScript};
use crate::action::Action;
use crate::event::{
    ANY_MOVEMENT_POINT, EventFlags, EventKind, EventParams, LosHostility, RespawnCondition,
};
use crate::holder::{Rule, ScriptHolder};
use crate::target::{Target, TargetSelector};

/// Arms the first timer of a freshly loaded holder.
pub(super) fn init_timer(holder: &mut ScriptHolder, rng: &mut ScriptRng) {
    let kind = holder.rule.event.kind;
    match holder.rule.event.params {
        EventParams::MinMaxRepeat { min, max, .. }
            if matches!(
                kind,
                EventKind::Update | EventKind::UpdateIc | EventKind::UpdateOoc
            ) =>
        {
            set_timer(holder, rng.urand(min, max));
        }
        EventParams::Distance { repeat, .. } => set_timer(holder, repeat),
        _ => holder.active = true,
    }
}

fn set_timer(holder: &mut ScriptHolder, timer: u32) {
    holder.timer = timer;
    holder.active = timer == 0;
}

/// Actions that cannot run in the agent's current state and retry next tick.
pub(super) fn must_wait(action: &Action, state: UnitState) -> bool {
    match action {
        Action::Cast { .. } => action.waits_for_cast() && state.contains(UnitState::CASTING),
        Action::FleeForAssist { .. } => {
            state.intersects(UnitState::ROOT | UnitState::LOST_CONTROL)
        }
        _ => false,
    }
}

fn condition_source(rule: &Rule) -> ConditionSource {
    ConditionSource {
        entry_or_guid: rule.key.entry_or_guid,
        source_type: rule.key.source_type as u32,
        event_id: rule.id(),
    }
}

fn in_window(value: u32, min: u32, max: u32) -> bool {
    (min..=max).contains(&value)
}

fn health_of(env: &ScriptEnv<'_>, guid: ObjectGuid) -> Option<u32> {
    env.world.health_pct(guid).map(|pct| pct as u32)
}

impl SmartScript {
    /// Raises `kind` on every matching rule of the main list, in authoring order.
    ///
    /// Link rules are never dispatched directly; they only fire through the
    /// rule linking to them.
    pub fn process_events_for(&mut self, env: &mut ScriptEnv<'_>, kind: EventKind, args: &EventArgs) {
        if kind == EventKind::Link {
            return;
        }
        for index in 0..self.events.len() {
            let Some(holder) = self.events.get(index) else {
                break;
            };
            if holder.rule.event.kind != kind {
                continue;
            }
            let rref = RuleRef {
                list: ListKind::Events,
                index,
                serial: holder.serial,
            };
            let source = condition_source(&holder.rule);
            if !env.world.conditions_met(&source, args.invoker, Some(self.base())) {
                trace!(agent = %self.owner, rule = %holder.rule.key, "conditions not met");
                continue;
            }
            self.process_event(env, rref, args);
        }
    }

    /// Applies the generic gates, then routes to the kind-specific check.
    pub(crate) fn process_event(&mut self, env: &mut ScriptEnv<'_>, rref: RuleRef, args: &EventArgs) {
        if self.depth >= self.config().max_dispatch_depth {
            let key = self.holder(rref).map(|h| h.rule.key);
            error!(
                agent = %self.owner,
                rule = ?key,
                depth = self.depth,
                "event dispatch nested too deep, event dropped"
            );
            return;
        }
        self.depth += 1;
        self.route_event(env, rref, args);
        self.depth -= 1;
    }

    fn route_event(&mut self, env: &mut ScriptEnv<'_>, rref: RuleRef, args: &EventArgs) {
        let Some(holder) = self.holder(rref) else {
            return;
        };
        let rule = Arc::clone(&holder.rule);
        let event = &rule.event;
        if !holder.active && event.kind != EventKind::Link {
            return;
        }
        if event.phase_mask != 0 && !self.is_in_phase(event.phase_mask) {
            return;
        }
        if !event.is_repeatable() && holder.run_once {
            return;
        }
        if !event.flags.contains(EventFlags::WHILE_CHARMED) && env.world.is_charmed(self.owner)
        {
            return;
        }

        use EventKind as K;
        use EventParams as P;
        let me = self.me();
        let engaged = me.is_some_and(|me| env.is_engaged(me));

        match (event.kind, &event.params) {
            (K::Link, _) => self.process_action(env, rref, args),

            (K::UpdateOoc, &P::MinMaxRepeat { repeat_min, repeat_max, .. }) => {
                if engaged {
                    return;
                }
                self.process_timed_action(env, rref, repeat_min, repeat_max, args);
            }
            (K::UpdateIc, &P::MinMaxRepeat { repeat_min, repeat_max, .. }) => {
                if !engaged {
                    return;
                }
                self.process_timed_action(env, rref, repeat_min, repeat_max, args);
            }
            (K::Update, &P::MinMaxRepeat { repeat_min, repeat_max, .. }) => {
                self.process_timed_action(env, rref, repeat_min, repeat_max, args);
            }

            (K::HealthPct | K::ManaPct, &P::MinMaxRepeat { min, max, repeat_min, repeat_max }) => {
                let Some(me) = me.filter(|_| engaged) else {
                    return;
                };
                let pct = if event.kind == K::HealthPct {
                    env.world.health_pct(me)
                } else {
                    env.world.power_pct(me, PowerType::Mana)
                };
                let Some(pct) = pct else {
                    return;
                };
                if !in_window(pct as u32, min, max) {
                    return;
                }
                self.process_timed_action(env, rref, repeat_min, repeat_max, &EventArgs::new());
            }
            (
                K::TargetHealthPct | K::TargetManaPct,
                &P::MinMaxRepeat { min, max, repeat_min, repeat_max },
            ) => {
                let Some(victim) = self.engaged_victim(env) else {
                    return;
                };
                let pct = if event.kind == K::TargetHealthPct {
                    env.world.health_pct(victim)
                } else {
                    env.world.power_pct(victim, PowerType::Mana)
                };
                let Some(pct) = pct else {
                    return;
                };
                if !in_window(pct as u32, min, max) {
                    return;
                }
                let args = EventArgs::invoked_by(Some(victim));
                self.process_timed_action(env, rref, repeat_min, repeat_max, &args);
            }
            (K::Range, &P::MinMaxRepeat { min, max, repeat_min, repeat_max }) => {
                let (Some(me), Some(victim)) = (me, self.engaged_victim(env)) else {
                    return;
                };
                let in_range = env
                    .world
                    .distance(me, victim)
                    .is_some_and(|d| d >= min as f32 && d <= max as f32);
                if in_range {
                    let args = EventArgs::invoked_by(Some(victim));
                    self.process_timed_action(env, rref, repeat_min, repeat_max, &args);
                } else {
                    self.recalc_timer(rref, 500, 500);
                }
            }
            (K::VictimCasting, &P::VictimCasting { repeat_min, repeat_max, spell }) => {
                let Some(victim) = self.engaged_victim(env) else {
                    return;
                };
                let Some(casting) = env.world.current_cast(victim) else {
                    return;
                };
                if spell != 0 && casting != spell {
                    return;
                }
                let args = EventArgs::invoked_by(Some(victim));
                self.process_timed_action(env, rref, repeat_min, repeat_max, &args);
            }
            (K::FriendlyIsCc, &P::FriendlyIsCc { radius, repeat_min, repeat_max }) => {
                let Some(me) = me.filter(|_| engaged) else {
                    return;
                };
                let controlled = UnitState::FLEEING
                    | UnitState::CONFUSED
                    | UnitState::ROOT
                    | UnitState::STUNNED
                    | UnitState::CHARMED;
                let found: Vec<ObjectGuid> = self
                    .friendly_in_combat(env, me, radius as f32)
                    .into_iter()
                    .filter(|g| {
                        env.world.unit_state(*g).intersects(controlled) || env.world.is_charmed(*g)
                    })
                    .collect();
                if found.is_empty() {
                    self.recalc_timer(rref, 1000, 3000);
                    return;
                }
                let pick = found[self.rng().index(found.len())];
                let args = EventArgs::invoked_by(Some(pick));
                self.process_timed_action(env, rref, repeat_min, repeat_max, &args);
            }
            (K::FriendlyMissingBuff, &P::MissingBuff { spell, radius, repeat_min, repeat_max }) => {
                let Some(me) = me else {
                    return;
                };
                let found: Vec<ObjectGuid> = self
                    .friendly_in_combat(env, me, radius as f32)
                    .into_iter()
                    .filter(|g| !env.world.has_aura(*g, spell))
                    .collect();
                if found.is_empty() {
                    return;
                }
                let pick = found[self.rng().index(found.len())];
                let args = EventArgs::invoked_by(Some(pick));
                self.process_timed_action(env, rref, repeat_min, repeat_max, &args);
            }
            (K::HasAura, &P::Aura { spell, count, repeat_min, repeat_max }) => {
                let Some(me) = me else {
                    return;
                };
                let have = env.world.aura_count(me, spell);
                if (count == 0 && have == 0) || (count != 0 && have >= count) {
                    self.process_timed_action(env, rref, repeat_min, repeat_max, &EventArgs::new());
                }
            }
            (K::TargetBuffed, &P::Aura { spell, count, repeat_min, repeat_max }) => {
                let Some(victim) = me.and_then(|me| self.victim_of(env, me)) else {
                    return;
                };
                if env.world.aura_count(victim, spell) < count {
                    return;
                }
                let args = EventArgs::invoked_by(Some(victim));
                self.process_timed_action(env, rref, repeat_min, repeat_max, &args);
            }
            (
                K::FriendlyHealthPct,
                &P::FriendlyHealthPct { min_pct, max_pct, repeat_min, repeat_max, radius },
            ) => {
                let Some(me) = me.filter(|_| engaged) else {
                    return;
                };
                let Some(target) =
                    self.friendly_health_target(env, &rule.target, me, min_pct, max_pct, radius)
                else {
                    return;
                };
                let args = EventArgs::invoked_by(Some(target));
                self.process_timed_action(env, rref, repeat_min, repeat_max, &args);
            }
            (K::DistanceCreature | K::DistanceGameObject, &P::Distance { spawn_id, entry, dist, repeat }) => {
                let base = self.base();
                let (kind, search) = if event.kind == K::DistanceCreature {
                    (game_core::ObjectKind::Creature, SearchKind::CREATURE)
                } else {
                    (game_core::ObjectKind::GameObject, SearchKind::GAME_OBJECT)
                };
                let found = if spawn_id != 0 {
                    env.world.find_spawn(kind, u64::from(spawn_id)).filter(|g| {
                        env.world
                            .distance(base, *g)
                            .is_some_and(|d| d <= dist as f32)
                    })
                } else {
                    let query = ObjectSearch::around(base, search, dist as f32).with_entry(entry);
                    env.world.search(&query).into_iter().find(|g| *g != base)
                };
                if let Some(found) = found {
                    let args = EventArgs::invoked_by(Some(found));
                    self.process_timed_action(env, rref, repeat, repeat, &args);
                }
            }

            (K::Kill, &P::Kill { cooldown_min, cooldown_max, player_only, creature }) => {
                let (Some(_), Some(victim)) = (me, args.invoker) else {
                    return;
                };
                if player_only && !victim.is_player() {
                    return;
                }
                if creature != 0 && victim.entry() != creature {
                    return;
                }
                self.fire_after_cooldown(env, rref, cooldown_min, cooldown_max, args);
            }
            (K::SpellHit | K::SpellHitTarget, &P::SpellHit { spell, school, cooldown_min, cooldown_max }) => {
                let Some(info) = args.spell else {
                    return;
                };
                if spell != 0 && info.id != spell {
                    return;
                }
                if school != 0 && info.school_mask.bits() & school == 0 {
                    return;
                }
                self.fire_after_cooldown(env, rref, cooldown_min, cooldown_max, args);
            }
            (
                K::OnSpellCast | K::OnSpellFailed | K::OnSpellStart,
                &P::SpellCast { spell, cooldown_min, cooldown_max },
            ) => {
                if args.spell.is_none_or(|info| info.id != spell) {
                    return;
                }
                let args = EventArgs {
                    invoker: None,
                    ..args.clone()
                };
                self.fire_after_cooldown(env, rref, cooldown_min, cooldown_max, &args);
            }
            (
                K::OocLos | K::IcLos,
                &P::Los { hostility, max_dist, cooldown_min, cooldown_max, player_only },
            ) => {
                let (Some(me), Some(who)) = (me, args.invoker) else {
                    return;
                };
                if (event.kind == K::OocLos) == engaged {
                    return;
                }
                let near = env
                    .world
                    .distance(me, who)
                    .is_some_and(|d| d <= max_dist as f32);
                if !near || !env.world.is_within_los(me, who) {
                    return;
                }
                let hostile = env.world.is_hostile_to(me, who);
                let wanted = match hostility {
                    LosHostility::Any => true,
                    LosHostility::NotHostile => !hostile,
                    LosHostility::Hostile => hostile,
                };
                if !wanted || (player_only && !who.is_player()) {
                    return;
                }
                self.fire_after_cooldown(env, rref, cooldown_min, cooldown_max, args);
            }
            (K::Respawn, &P::Respawn { condition, map, area }) => {
                let base = self.base();
                match condition {
                    RespawnCondition::Map if env.world.map_id(base) != Some(map) => return,
                    RespawnCondition::Area if env.world.zone_id(base) != Some(area) => return,
                    _ => {}
                }
                self.process_action(env, rref, &EventArgs::new());
            }
            (K::SummonedUnit | K::SummonedUnitDies, &P::Summoned { creature, cooldown_min, cooldown_max }) => {
                let Some(summon) = args.invoker.filter(|g| g.is_creature()) else {
                    return;
                };
                if creature != 0 && summon.entry() != creature {
                    return;
                }
                self.fire_after_cooldown(env, rref, cooldown_min, cooldown_max, args);
            }
            (K::SummonDespawned, &P::Summoned { creature, cooldown_min, cooldown_max }) => {
                if creature != 0 && creature != args.var0 {
                    return;
                }
                self.fire_after_cooldown(env, rref, cooldown_min, cooldown_max, args);
            }
            (
                K::Damaged | K::DamagedTarget | K::ReceiveHeal,
                &P::MinMaxRepeat { min, max, repeat_min, repeat_max },
            ) => {
                if !in_window(args.var0, min, max) {
                    return;
                }
                self.fire_after_cooldown(env, rref, repeat_min, repeat_max, args);
            }
            (K::MovementInform, &P::MovementInform { movement_type, point_id }) => {
                if movement_type != 0 && args.var0 != movement_type {
                    return;
                }
                if point_id != ANY_MOVEMENT_POINT && args.var1 != point_id {
                    return;
                }
                self.process_action(env, rref, args);
            }
            (
                K::WaypointReached
                | K::WaypointPaused
                | K::WaypointResumed
                | K::WaypointStopped
                | K::WaypointEnded,
                &P::Waypoint { point_id, path_id },
            ) => {
                if me.is_none()
                    || (point_id != 0 && args.var0 != point_id)
                    || (path_id != 0 && args.var1 != path_id)
                {
                    return;
                }
                self.process_action(env, rref, args);
            }
            (K::AcceptedQuest | K::RewardQuest, &P::Quest { quest, cooldown_min, cooldown_max }) => {
                if quest != 0 && args.var0 != quest {
                    return;
                }
                self.fire_after_cooldown(env, rref, cooldown_min, cooldown_max, args);
            }
            (K::QuestObjCompletion, &P::QuestObjective { id }) => {
                if args.var0 == id {
                    self.process_action(env, rref, args);
                }
            }
            (K::ReceiveEmote, &P::Emote { emote, cooldown_min, cooldown_max }) => {
                if args.var0 == emote {
                    self.fire_after_cooldown(env, rref, cooldown_min, cooldown_max, args);
                }
            }
            (K::Charmed, &P::Charm { on_remove }) => {
                // flag is set while the charm is being applied
                if args.flag != on_remove {
                    self.process_action(env, rref, args);
                }
            }
            (K::PassengerBoarded | K::PassengerRemoved, &P::Cooldown { min, max }) => {
                if me.is_none() {
                    return;
                }
                self.fire_after_cooldown(env, rref, min, max, args);
            }
            (K::DataSet, &P::DataSet { id, value, cooldown_min, cooldown_max }) => {
                if id != args.var0 || value != args.var1 {
                    return;
                }
                self.fire_after_cooldown(env, rref, cooldown_min, cooldown_max, args);
            }
            (K::TextOver, &P::TextOver { text_group, creature_entry }) => {
                if args.var0 != text_group || (creature_entry != 0 && creature_entry != args.var1) {
                    return;
                }
                self.process_action(env, rref, args);
            }
            (K::TimedEventTriggered, &P::TimedEvent { id }) => {
                if id == args.var0 {
                    self.process_action(env, rref, args);
                }
            }
            (K::GossipHello, &P::GossipHello { filter }) => {
                // flag marks a report-use hello from a game object
                match filter {
                    1 if args.flag => return,
                    2 if !args.flag => return,
                    _ => {}
                }
                self.process_action(env, rref, args);
            }
            (K::GossipSelect, &P::Gossip { sender, action }) => {
                if sender != args.var0 || action != args.var1 {
                    return;
                }
                self.process_action(env, rref, args);
            }
            (K::GameEventStart | K::GameEventEnd, &P::GameEvent { id }) => {
                if id != args.var0 {
                    return;
                }
                self.process_action(env, rref, &EventArgs::new().with_vars(args.var0, 0));
            }
            (K::GoLootStateChanged, &P::GoLootState { state }) => {
                if state == args.var0 {
                    self.process_action(env, rref, args);
                }
            }
            (K::GoEventInform, &P::EventInform { id }) => {
                if id == args.var0 {
                    self.process_action(env, rref, &EventArgs::new().with_vars(args.var0, 0));
                }
            }
            (K::ActionDone, &P::DoAction { id }) => {
                if id == args.var0 {
                    self.process_action(env, rref, args);
                }
            }
            (K::EventPhaseChange, &P::PhaseChange { phase_mask }) => {
                if !self.is_in_phase(phase_mask) {
                    return;
                }
                let args = EventArgs::invoked_by(self.last_invoker);
                self.process_action(env, rref, &args);
            }
            (K::CounterSet, &P::Counter { id, value, cooldown_min, cooldown_max }) => {
                if id != args.var0 || self.counter(id) != Some(value) {
                    return;
                }
                self.fire_after_cooldown(env, rref, cooldown_min, cooldown_max, args);
            }
            (K::AreaTriggerOnTrigger, &P::AreaTrigger { id }) => {
                if id != 0 && id != args.var0 {
                    return;
                }
                self.process_action(env, rref, args);
            }
            (K::SceneTrigger, P::SceneTrigger { trigger }) => {
                if *trigger != args.text {
                    return;
                }
                self.process_action(env, rref, args);
            }

            (
                K::Aggro
                | K::Death
                | K::Evade
                | K::ReachedHome
                | K::Reset
                | K::CorpseRemoved
                | K::AiInit
                | K::JustSummoned
                | K::JustCreated
                | K::FollowCompleted
                | K::QuestAccepted
                | K::QuestCompletion
                | K::QuestRewarded
                | K::QuestFail
                | K::SceneStart
                | K::SceneCancel
                | K::SceneComplete
                | K::OnDespawn,
                _,
            ) => self.process_action(env, rref, args),

            (kind, params) => {
                error!(agent = %self.owner, rule = %rule.key, ?kind, ?params, "event parameters do not match kind");
            }
        }
    }

    /// Periodic rules: fire and re-arm with the repeat window when the
    /// conditions hold, otherwise retry after a capped delay.
    fn process_timed_action(
        &mut self,
        env: &mut ScriptEnv<'_>,
        rref: RuleRef,
        min: u32,
        max: u32,
        args: &EventArgs,
    ) {
        let Some(holder) = self.holder(rref) else {
            return;
        };
        let source = condition_source(&holder.rule);
        if env.world.conditions_met(&source, args.invoker, Some(self.base())) {
            self.recalc_timer(rref, min, max);
            self.process_action(env, rref, args);
        } else {
            let wait = min.min(self.config().condition_retry_cap_ms);
            self.recalc_timer(rref, wait, wait);
        }
    }

    /// One-shot kinds re-arm their cooldown, then act.
    fn fire_after_cooldown(
        &mut self,
        env: &mut ScriptEnv<'_>,
        rref: RuleRef,
        min: u32,
        max: u32,
        args: &EventArgs,
    ) {
        self.recalc_timer(rref, min, max);
        self.process_action(env, rref, args);
    }

    pub(crate) fn recalc_timer(&mut self, rref: RuleRef, min: u32, max: u32) {
        let timer = self.rng().urand(min, max);
        if let Some(holder) = self.holder_mut(rref) {
            set_timer(holder, timer);
        }
    }

    /// Rolls the chance, resolves targets, runs the action and chases the link.
    pub(crate) fn process_action(&mut self, env: &mut ScriptEnv<'_>, rref: RuleRef, args: &EventArgs) {
        let Some(holder) = self.holder(rref) else {
            return;
        };
        let rule = Arc::clone(&holder.rule);
        let chance = rule.event.chance;
        if rule.event.kind != EventKind::Link && chance > 0 && chance < 100 && !self.rng().roll_chance(chance) {
            trace!(agent = %self.owner, rule = %rule.key, chance, "chance roll failed");
            return;
        }
        if let Some(holder) = self.holder_mut(rref) {
            holder.run_once = true;
        }
        if args.invoker.is_some() {
            self.last_invoker = args.invoker;
        }
        let ctx = ActionCtx {
            rule: &rule,
            args,
            trigger: args.invoker.or(self.last_invoker),
        };
        let targets = self.get_targets(env, &rule.target, ctx.trigger);
        trace!(
            agent = %self.owner,
            rule = %rule.key,
            action = rule.action.name(),
            targets = targets.len(),
            "action"
        );
        self.execute(env, &ctx, targets);

        if rule.link != 0 && rule.link != rule.id() {
            match self.find_linked(rule.link) {
                Some(linked) => self.process_event(env, linked, args),
                None => error!(
                    agent = %self.owner,
                    rule = %rule.key,
                    link = rule.link,
                    "linked rule not found"
                ),
            }
        }
    }

    fn find_linked(&self, link: u32) -> Option<RuleRef> {
        self.events
            .iter()
            .enumerate()
            .find(|(_, h)| h.rule.id() == link && h.rule.event.kind == EventKind::Link)
            .map(|(index, h)| RuleRef {
                list: ListKind::Events,
                index,
                serial: h.serial,
            })
    }

    // ===== event predicates =====

    /// The owner's victim while it is engaged.
    fn engaged_victim(&mut self, env: &mut ScriptEnv<'_>) -> Option<ObjectGuid> {
        let me = self.me()?;
        if !env.is_engaged(me) {
            return None;
        }
        self.victim_of(env, me)
    }

    pub(crate) fn victim_of(&self, env: &mut ScriptEnv<'_>, me: ObjectGuid) -> Option<ObjectGuid> {
        if let Some(victim) = env.combat.last_victim(me) {
            return Some(victim);
        }
        env.combat.current_victim(env.world.as_units(), me)
    }

    /// Alive, non-hostile creatures in combat within `radius` of `me`.
    fn friendly_in_combat(&self, env: &ScriptEnv<'_>, me: ObjectGuid, radius: f32) -> Vec<ObjectGuid> {
        let query = ObjectSearch::around(me, SearchKind::CREATURE, radius).with_alive(AliveFilter::Alive);
        env.world
            .search(&query)
            .into_iter()
            .filter(|g| env.combat.is_in_combat(*g) && !env.world.is_hostile_to(me, *g))
            .collect()
    }

    fn friendly_health_target(
        &mut self,
        env: &mut ScriptEnv<'_>,
        target: &Target,
        me: ObjectGuid,
        min_pct: u32,
        max_pct: u32,
        radius: u32,
    ) -> Option<ObjectGuid> {
        match target.selector {
            TargetSelector::CreatureRange { .. }
            | TargetSelector::CreatureGuid { .. }
            | TargetSelector::CreatureDistance { .. }
            | TargetSelector::ClosestCreature { .. }
            | TargetSelector::ClosestPlayer { .. }
            | TargetSelector::PlayerRange { .. }
            | TargetSelector::PlayerDistance { .. } => {
                let candidates = self.get_targets(env, target, None);
                candidates.into_iter().find(|g| {
                    g.is_unit()
                        && env.world.is_friendly_to(me, *g)
                        && env.world.is_alive(*g)
                        && env.combat.is_in_combat(*g)
                        && health_of(env, *g).is_some_and(|p| in_window(p, min_pct, max_pct))
                })
            }
            TargetSelector::ActionInvoker => {
                let query = ObjectSearch::around(me, SearchKind::UNIT, radius as f32)
                    .with_alive(AliveFilter::Alive);
                env.world
                    .search(&query)
                    .into_iter()
                    .filter(|g| env.combat.is_in_combat(*g) && !env.world.is_hostile_to(me, *g))
                    .filter_map(|g| health_of(env, g).map(|p| (g, p)))
                    .filter(|(_, p)| in_window(*p, min_pct, max_pct))
                    .min_by_key(|(_, p)| *p)
                    .map(|(g, _)| g)
            }
            _ => None,
        }
    }
}
