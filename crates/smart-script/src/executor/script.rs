//! Actions on the rule engines themselves: phases, timed events, timed
//! action lists, counters, stored targets and cross-agent signalling.
use std::sync::Arc;

use tracing::{debug, error, warn};

use game_core::ObjectGuid;

use crate::action::{Action, ListTimer};
use crate::engine::{ActionCtx, EventArgs, ScriptEnv, SmartScript};
use crate::event::{Event, EventFlags, EventKind, EventParams};
use crate::holder::{Rule, RuleKey};
use crate::request::ScriptRequest;
use crate::target::Target;

/// Objects that run a rule engine of their own.
fn scripted(targets: &[ObjectGuid]) -> impl Iterator<Item = ObjectGuid> + '_ {
    targets
        .iter()
        .copied()
        .filter(|g| g.is_creature() || g.is_game_object())
}

impl SmartScript {
    pub(super) fn script_action(
        &mut self,
        env: &mut ScriptEnv<'_>,
        ctx: &ActionCtx<'_>,
        targets: &[ObjectGuid],
    ) -> bool {
        match ctx.rule.action {
            Action::SetEventPhase { phase } => self.set_phase(env, phase),
            Action::IncEventPhase { inc, dec } => {
                if inc != 0 {
                    self.inc_phase(env, inc);
                }
                if dec != 0 {
                    self.dec_phase(env, dec);
                }
            }
            Action::RandomPhase { ref phases } => {
                if let Some(phase) = self.random_choice(phases) {
                    self.set_phase(env, phase);
                }
            }
            Action::RandomPhaseRange { min, max } => {
                let phase = self.rng().urand(min, max);
                self.set_phase(env, phase);
            }
            Action::CreateTimedEvent {
                id,
                min,
                max,
                repeat_min,
                repeat_max,
                chance,
            } => self.create_timed_event(ctx, id, (min, max), (repeat_min, repeat_max), chance),
            Action::TriggerTimedEvent { id } => self.trigger_timed_event(env, id),
            Action::TriggerRandomTimedEvent { min, max } => {
                let id = self.rng().urand(min, max);
                self.trigger_timed_event(env, id);
            }
            Action::RemoveTimedEvent { id } => self.remove_stored_event(id),
            Action::CallTimedActionList {
                id,
                timer,
                allow_override,
            } => {
                if ctx.rule.target.is_none() {
                    error!(agent = %self.owner(), rule = %ctx.rule.key, list = id, "timed action list call without a target");
                    return true;
                }
                self.call_timed_action_list(targets, id, timer, allow_override);
            }
            Action::CallRandomTimedActionList { ref lists } => {
                if let Some(id) = self.random_choice(lists) {
                    self.call_timed_action_list(targets, id, ListTimer::Always, true);
                }
            }
            Action::CallRandomRangeTimedActionList { min, max } => {
                let id = self.rng().urand(min, max);
                self.call_timed_action_list(targets, id, ListTimer::Always, true);
            }
            Action::SetCounter {
                counter,
                value,
                reset,
            } => {
                if targets.is_empty() {
                    self.store_counter(env, counter, value, reset);
                }
                for target in scripted(targets) {
                    if target == self.owner() {
                        self.store_counter(env, counter, value, reset);
                    } else {
                        self.push_request(ScriptRequest::SetCounter {
                            target,
                            counter,
                            value,
                            reset,
                        });
                    }
                }
            }
            Action::StoreTargetList { id } => self.store_targets(id, targets.to_vec()),
            Action::AddToStoredTargetList { id } => {
                if targets.is_empty() {
                    warn!(agent = %self.owner(), rule = %ctx.rule.key, list = id, "nothing to add to stored targets");
                } else {
                    self.add_to_stored_targets(id, targets);
                }
            }
            Action::SendTargetToTarget { id } => {
                let Some(stored) = self.stored_targets(env.units(), id) else {
                    debug!(agent = %self.owner(), list = id, "no stored targets to send");
                    return true;
                };
                for target in scripted(targets) {
                    if target == self.owner() {
                        self.store_targets(id, stored.clone());
                    } else {
                        self.push_request(ScriptRequest::StoreTargets {
                            target,
                            list_id: id,
                            targets: stored.clone(),
                        });
                    }
                }
            }
            Action::SetData { field, data } => {
                let invoker = Some(self.base()).filter(ObjectGuid::is_unit);
                for target in scripted(targets) {
                    if target == self.owner() {
                        self.set_data(env, field, data, invoker);
                    } else {
                        self.push_request(ScriptRequest::SetData {
                            target,
                            field,
                            value: data,
                            invoker,
                        });
                    }
                }
            }
            Action::DoAction { action } => {
                for target in scripted(targets) {
                    if target == self.owner() {
                        self.do_action(env, action);
                    } else {
                        self.push_request(ScriptRequest::DoAction { target, action });
                    }
                }
            }
            Action::OverrideScriptBaseObject => {
                match targets.iter().copied().find(ObjectGuid::is_creature) {
                    Some(base) => self.override_base_object(base),
                    None => debug!(agent = %self.owner(), rule = %ctx.rule.key, "no creature to take over as base object"),
                }
            }
            Action::ResetScriptBaseObject => self.reset_base_object(),
            Action::CallScriptReset => {
                self.set_phase(env, 0);
                self.on_reset(env);
            }
            _ => return false,
        }
        true
    }

    /// Stores a rule that fires TIMED_EVENT_TRIGGERED with `id` on its own
    /// timer. An existing stored rule with the same id is replaced.
    fn create_timed_event(
        &mut self,
        ctx: &ActionCtx<'_>,
        id: u32,
        (min, max): (u32, u32),
        (repeat_min, repeat_max): (u32, u32),
        chance: u32,
    ) {
        let mut event = Event::new(
            EventKind::Update,
            EventParams::MinMaxRepeat {
                min,
                max,
                repeat_min,
                repeat_max,
            },
        );
        event.chance = if chance == 0 { 100 } else { chance };
        if repeat_min == 0 && repeat_max == 0 {
            event.flags = EventFlags::NOT_REPEATABLE;
        }
        let rule = Rule {
            key: RuleKey::new(ctx.rule.key.entry_or_guid, ctx.rule.key.source_type, id),
            link: 0,
            event,
            action: Action::TriggerTimedEvent { id },
            target: Target::none(),
            comment: format!("timed event {id}"),
        };
        let holder = self.new_holder(Arc::new(rule));
        self.queue_install(holder);
    }

    fn trigger_timed_event(&mut self, env: &mut ScriptEnv<'_>, id: u32) {
        if id == 0 {
            return;
        }
        let args = EventArgs::new().with_vars(id, 0);
        self.process_events_for(env, EventKind::TimedEventTriggered, &args);
    }

    /// Installs list `id` on every scripted target, the owner directly and
    /// everyone else through a request.
    fn call_timed_action_list(&mut self, targets: &[ObjectGuid], id: u32, timer: ListTimer, allow_override: bool) {
        let invoker = self.last_invoker();
        for target in scripted(targets) {
            if target == self.owner() {
                self.set_timed_action_list(id, timer, allow_override, invoker);
            } else {
                self.push_request(ScriptRequest::InstallTimedActionList {
                    target,
                    list_id: id,
                    timer,
                    allow_override,
                    invoker,
                });
            }
        }
    }
}
