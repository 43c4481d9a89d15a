//! Per-agent rule engine.
//!
//! A [`SmartScript`] owns the mutable copy of every rule its agent runs:
//! the main event list, the stored list of rules created at runtime, and
//! the currently running timed action list. Dispatch, target resolution and
//! action execution all go through it; anything addressed to another agent
//! leaves through the request outbox.
mod context;
mod dispatch;

use std::collections::BTreeMap;
use std::mem;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use game_core::env::compute_seed;
use game_core::{EngineConfig, ObjectGuid, ObjectKind, ScriptRng, UnitOracle};

use crate::action::ListTimer;
use crate::catalog::ScriptCatalog;
use crate::event::{EventFlags, EventKind};
use crate::holder::{Rule, ScriptHolder, ScriptType};
use crate::request::ScriptRequest;

pub use context::{EventArgs, ScriptEnv};
pub(crate) use context::ActionCtx;

/// Stored target list the escort keeps its players in.
pub const ESCORT_TARGETS: u32 = 0xFF_FFFF;

/// Which of the three rule lists a holder lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ListKind {
    Events,
    Stored,
    Timed,
}

/// Address of a holder that survives list mutation.
///
/// Lists can shrink or be replaced while an action runs. Lookups compare
/// the serial, so a stale reference resolves to nothing instead of to
/// whatever rule took its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RuleRef {
    pub list: ListKind,
    pub index: usize,
    pub serial: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Removal {
    Serial(u64),
    Id(u32),
}

#[derive(Clone, Debug, Default)]
struct TalkTimer {
    running: bool,
    remaining_ms: u32,
    group: u32,
    talker_entry: u32,
}

/// The rule engine of one agent.
#[derive(Debug)]
pub struct SmartScript {
    catalog: Arc<ScriptCatalog>,
    owner: ObjectGuid,
    script_type: ScriptType,
    entry: u32,
    base_override: Option<ObjectGuid>,

    events: Vec<ScriptHolder>,
    stored: Vec<ScriptHolder>,
    timed: Vec<ScriptHolder>,
    install: Vec<ScriptHolder>,
    removals: Vec<Removal>,

    phase: u32,
    counters: BTreeMap<u32, u32>,
    stored_targets: BTreeMap<u32, Vec<ObjectGuid>>,
    talk: TalkTimer,
    timed_list_invoker: Option<ObjectGuid>,
    last_invoker: Option<ObjectGuid>,

    depth: u32,
    next_serial: u64,
    next_synthetic: u32,
    rng: ScriptRng,
    requests: Vec<ScriptRequest>,
}

impl SmartScript {
    pub fn new(catalog: Arc<ScriptCatalog>, owner: ObjectGuid, script_type: ScriptType) -> Self {
        Self::with_seed(catalog, owner, script_type, 0)
    }

    /// Engine whose random rolls derive from `world_seed` and the owner identity.
    pub fn with_seed(
        catalog: Arc<ScriptCatalog>,
        owner: ObjectGuid,
        script_type: ScriptType,
        world_seed: u64,
    ) -> Self {
        let seed = compute_seed(world_seed, owner.entry(), owner.counter());
        Self {
            catalog,
            owner,
            script_type,
            entry: owner.entry(),
            base_override: None,
            events: Vec::new(),
            stored: Vec::new(),
            timed: Vec::new(),
            install: Vec::new(),
            removals: Vec::new(),
            phase: 0,
            counters: BTreeMap::new(),
            stored_targets: BTreeMap::new(),
            talk: TalkTimer::default(),
            timed_list_invoker: None,
            last_invoker: None,
            depth: 0,
            next_serial: 0,
            next_synthetic: 0,
            rng: ScriptRng::new(seed),
            requests: Vec::new(),
        }
    }

    /// Loads the rules authored for `entry` instead of the owner's own entry.
    ///
    /// Quest scripts run on the player but are keyed by quest id.
    pub fn with_entry(mut self, entry: u32) -> Self {
        self.entry = entry;
        self
    }

    // ===== accessors =====

    pub fn owner(&self) -> ObjectGuid {
        self.owner
    }

    pub fn script_type(&self) -> ScriptType {
        self.script_type
    }

    pub fn catalog(&self) -> &Arc<ScriptCatalog> {
        &self.catalog
    }

    pub(crate) fn config(&self) -> &EngineConfig {
        &self.catalog.config
    }

    /// Object actions treat as "self": the owner unless overridden.
    pub fn base(&self) -> ObjectGuid {
        self.base_override.unwrap_or(self.owner)
    }

    /// The base object when it is a creature.
    pub(crate) fn me(&self) -> Option<ObjectGuid> {
        let base = self.base();
        base.is_creature().then_some(base)
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    /// Phase 0 is outside every mask.
    pub fn is_in_phase(&self, mask: u32) -> bool {
        if self.phase == 0 {
            return false;
        }
        mask & (1 << (self.phase - 1)) != 0
    }

    pub fn counter(&self, id: u32) -> Option<u32> {
        self.counters.get(&id).copied()
    }

    pub fn last_invoker(&self) -> Option<ObjectGuid> {
        self.last_invoker
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn stored_event_count(&self) -> usize {
        self.stored.len() + self.install.len()
    }

    pub fn has_timed_action_list(&self) -> bool {
        !self.timed.is_empty()
    }

    /// Ids of the stored rules, installed or pending.
    pub fn stored_event_ids(&self) -> Vec<u32> {
        self.stored
            .iter()
            .chain(self.install.iter())
            .map(|h| h.rule.id())
            .collect()
    }

    pub fn has_pending_requests(&self) -> bool {
        !self.requests.is_empty()
    }

    pub fn take_requests(&mut self) -> Vec<ScriptRequest> {
        mem::take(&mut self.requests)
    }

    pub(crate) fn push_request(&mut self, request: ScriptRequest) {
        self.requests.push(request);
    }

    pub(crate) fn rng(&mut self) -> &mut ScriptRng {
        &mut self.rng
    }

    // ===== holder access =====

    fn list(&self, kind: ListKind) -> &Vec<ScriptHolder> {
        match kind {
            ListKind::Events => &self.events,
            ListKind::Stored => &self.stored,
            ListKind::Timed => &self.timed,
        }
    }

    fn list_mut(&mut self, kind: ListKind) -> &mut Vec<ScriptHolder> {
        match kind {
            ListKind::Events => &mut self.events,
            ListKind::Stored => &mut self.stored,
            ListKind::Timed => &mut self.timed,
        }
    }

    pub(crate) fn holder(&self, rref: RuleRef) -> Option<&ScriptHolder> {
        self.list(rref.list)
            .get(rref.index)
            .filter(|h| h.serial == rref.serial)
    }

    pub(crate) fn holder_mut(&mut self, rref: RuleRef) -> Option<&mut ScriptHolder> {
        self.list_mut(rref.list)
            .get_mut(rref.index)
            .filter(|h| h.serial == rref.serial)
    }

    fn rule_ref(&self, list: ListKind, index: usize) -> Option<RuleRef> {
        self.list(list).get(index).map(|h| RuleRef {
            list,
            index,
            serial: h.serial,
        })
    }

    fn next_serial(&mut self) -> u64 {
        self.next_serial += 1;
        self.next_serial
    }

    pub(crate) fn new_holder(&mut self, rule: Arc<Rule>) -> ScriptHolder {
        let serial = self.next_serial();
        ScriptHolder::new(rule, serial)
    }

    pub(crate) fn next_synthetic_id(&mut self) -> u32 {
        let id = EngineConfig::SYNTHETIC_EVENT_ID_BASE.wrapping_add(self.next_synthetic);
        self.next_synthetic = self.next_synthetic.wrapping_add(1);
        id
    }

    // ===== lifecycle =====

    /// Loads the agent's rules, arms their timers and raises the
    /// initialization events.
    ///
    /// Spawn-specific rules replace the template's rules entirely.
    pub fn initialize(&mut self, env: &mut ScriptEnv<'_>) {
        self.events.clear();
        self.stored.clear();
        self.install.clear();
        self.timed.clear();
        self.removals.clear();
        self.phase = 0;
        self.base_override = None;

        let difficulty = EventFlags::for_difficulty(env.world.difficulty(self.owner));
        let rules: Vec<Arc<Rule>> = self.load_rules().to_vec();
        for rule in rules {
            let flags = rule.event.flags;
            if flags.contains(EventFlags::DEBUG_ONLY) && !cfg!(debug_assertions) {
                continue;
            }
            if flags.intersects(EventFlags::DIFFICULTY_ALL)
                && (difficulty.is_empty() || !flags.contains(difficulty))
            {
                trace!(agent = %self.owner, rule = %rule.key, "rule skipped for map difficulty");
                continue;
            }
            let holder = self.new_holder(rule);
            self.events.push(holder);
        }
        debug!(agent = %self.owner, rules = self.events.len(), "script initialized");

        for holder in &mut self.events {
            dispatch::init_timer(holder, &mut self.rng);
        }
        self.process_events_for(env, EventKind::AiInit, &EventArgs::new());
        self.install_events();
        self.process_events_for(env, EventKind::JustCreated, &EventArgs::new());
        self.counters.clear();
    }

    fn load_rules(&self) -> &[Arc<Rule>] {
        let rules = &self.catalog.rules;
        if matches!(self.owner.kind(), ObjectKind::Creature | ObjectKind::GameObject) {
            let spawn = -(self.owner.counter() as i64);
            let specific = rules.rules_for(spawn, self.script_type);
            if !specific.is_empty() {
                return specific;
            }
        }
        rules.rules_for(i64::from(self.entry), self.script_type)
    }

    /// Restores the base object, re-arms every resettable rule and raises RESET.
    pub fn on_reset(&mut self, env: &mut ScriptEnv<'_>) {
        self.reset_base_object();
        for index in 0..self.events.len() {
            let holder = &mut self.events[index];
            if holder.rule.event.flags.contains(EventFlags::DONT_RESET) {
                continue;
            }
            dispatch::init_timer(holder, &mut self.rng);
            holder.run_once = false;
        }
        self.counters.clear();
        self.phase = 0;
        self.process_events_for(env, EventKind::Reset, &EventArgs::new());
        self.last_invoker = None;
    }

    /// Advances every timer by `diff` milliseconds and fires what is due.
    pub fn on_update(&mut self, env: &mut ScriptEnv<'_>, diff: u32) {
        self.install_events();

        for index in 0..self.events.len() {
            if let Some(rref) = self.rule_ref(ListKind::Events, index) {
                self.update_timer(env, rref, diff);
            }
        }
        for index in 0..self.stored.len() {
            if let Some(rref) = self.rule_ref(ListKind::Stored, index) {
                self.update_timer(env, rref, diff);
            }
        }

        let mut running = false;
        for index in 0..self.timed.len() {
            let Some(rref) = self.rule_ref(ListKind::Timed, index) else {
                continue;
            };
            if self.holder(rref).is_some_and(|h| h.enable_timed) {
                running = true;
                self.update_timer(env, rref, diff);
            }
        }
        if !running && !self.timed.is_empty() {
            trace!(agent = %self.owner, "timed action list finished");
            self.timed.clear();
        }

        // stored rules that fired once are done for good
        let spent: Vec<u64> = self
            .stored
            .iter()
            .filter(|h| !h.rule.event.is_repeatable() && h.run_once)
            .map(|h| h.serial)
            .collect();
        self.removals
            .extend(spent.into_iter().map(Removal::Serial));
        self.apply_removals();

        self.update_talk_timer(env, diff);
    }

    fn update_talk_timer(&mut self, env: &mut ScriptEnv<'_>, diff: u32) {
        if !self.talk.running {
            return;
        }
        if self.talk.remaining_ms > diff {
            self.talk.remaining_ms -= diff;
            return;
        }
        let talk = mem::take(&mut self.talk);
        if self.config().text_over_check {
            let args = EventArgs::new().with_vars(talk.group, talk.talker_entry);
            self.process_events_for(env, EventKind::TextOver, &args);
        }
    }

    pub(crate) fn start_talk_timer(&mut self, group: u32, talker_entry: u32, duration_ms: u32) {
        self.talk = TalkTimer {
            running: true,
            remaining_ms: duration_ms,
            group,
            talker_entry,
        };
    }

    /// Ticks one holder and processes it once its timer runs out.
    fn update_timer(&mut self, env: &mut ScriptEnv<'_>, rref: RuleRef, diff: u32) {
        let Some(holder) = self.holder(rref) else {
            return;
        };
        let rule = Arc::clone(&holder.rule);
        let kind = rule.event.kind;
        if kind == EventKind::Link {
            return;
        }
        if rule.event.phase_mask != 0 && !self.is_in_phase(rule.event.phase_mask) {
            return;
        }
        if rref.list == ListKind::Timed && !holder.enable_timed {
            return;
        }
        let engaged = self.me().is_some_and(|me| env.is_engaged(me));
        if kind == EventKind::UpdateIc && !engaged {
            return;
        }
        if kind == EventKind::UpdateOoc && engaged {
            return;
        }

        if holder.timer > diff {
            if let Some(holder) = self.holder_mut(rref) {
                holder.timer -= diff;
            }
            return;
        }

        if let Some(me) = self.me() {
            if dispatch::must_wait(&rule.action, env.world.unit_state(me)) {
                if let Some(holder) = self.holder_mut(rref) {
                    holder.timer = 1;
                }
                return;
            }
        }
        if let Some(holder) = self.holder_mut(rref) {
            holder.active = true;
        }
        if !kind.is_timer_driven() {
            return;
        }

        let args = if rref.list == ListKind::Timed {
            EventArgs::invoked_by(self.timed_list_invoker)
        } else {
            EventArgs::new()
        };
        self.process_event(env, rref, &args);

        if rref.list == ListKind::Timed {
            // hand the countdown to the next entry, unless the list was replaced meanwhile
            let Some(holder) = self.holder_mut(rref) else {
                return;
            };
            holder.enable_timed = false;
            if let Some(next) = self.timed.iter_mut().find(|h| h.rule.id() > rule.id()) {
                next.enable_timed = true;
            }
        }
    }

    // ===== stored rules =====

    /// Queues a holder for the stored list; it is installed on the next update.
    pub(crate) fn queue_install(&mut self, mut holder: ScriptHolder) {
        let id = holder.rule.id();
        self.removals.retain(|r| *r != Removal::Id(id));
        self.install.retain(|h| h.rule.id() != id);
        dispatch::init_timer(&mut holder, &mut self.rng);
        self.install.push(holder);
    }

    fn install_events(&mut self) {
        for holder in mem::take(&mut self.install) {
            let id = holder.rule.id();
            self.stored.retain(|h| h.rule.id() != id);
            self.stored.push(holder);
        }
    }

    /// Removes stored rule `id` at the end of the current update; it no
    /// longer fires in the meantime.
    pub(crate) fn remove_stored_event(&mut self, id: u32) {
        self.install.retain(|h| h.rule.id() != id);
        for holder in self.stored.iter_mut().filter(|h| h.rule.id() == id) {
            holder.active = false;
            holder.timer = u32::MAX;
        }
        self.removals.push(Removal::Id(id));
    }

    fn apply_removals(&mut self) {
        for removal in mem::take(&mut self.removals) {
            match removal {
                Removal::Serial(serial) => self.stored.retain(|h| h.serial != serial),
                Removal::Id(id) => self.stored.retain(|h| h.rule.id() != id),
            }
        }
    }

    // ===== timed action lists =====

    /// Replaces the running timed action list with list `list_id`.
    ///
    /// A running list is kept unless `allow_override` is set. Every entry is
    /// rewritten to the update kind `timer` selects; only the lowest id
    /// counts down at first.
    pub fn set_timed_action_list(
        &mut self,
        list_id: u32,
        timer: ListTimer,
        allow_override: bool,
        invoker: Option<ObjectGuid>,
    ) {
        if !allow_override && !self.timed.is_empty() {
            debug!(agent = %self.owner, list_id, "timed action list already running");
            return;
        }
        self.timed.clear();
        let rules = self.catalog.rules.timed_list(list_id).to_vec();
        if rules.is_empty() {
            warn!(agent = %self.owner, list_id, "timed action list has no rules");
            return;
        }
        let kind = match timer {
            ListTimer::OutOfCombat => EventKind::UpdateOoc,
            ListTimer::InCombat => EventKind::UpdateIc,
            ListTimer::Always => EventKind::Update,
        };
        for (index, rule) in rules.into_iter().enumerate() {
            let rule = if rule.event.kind == kind {
                rule
            } else {
                let mut rewritten = (*rule).clone();
                rewritten.event.kind = kind;
                Arc::new(rewritten)
            };
            let mut holder = self.new_holder(rule);
            holder.enable_timed = index == 0;
            dispatch::init_timer(&mut holder, &mut self.rng);
            self.timed.push(holder);
        }
        self.timed_list_invoker = invoker;
        debug!(agent = %self.owner, list_id, entries = self.timed.len(), "timed action list installed");
    }

    // ===== phases =====

    pub(crate) fn set_phase(&mut self, env: &mut ScriptEnv<'_>, phase: u32) {
        let old = self.phase;
        self.phase = phase.min(EngineConfig::MAX_PHASE);
        if old != self.phase {
            trace!(agent = %self.owner, from = old, to = self.phase, "phase changed");
            self.process_events_for(env, EventKind::EventPhaseChange, &EventArgs::new());
        }
    }

    pub(crate) fn inc_phase(&mut self, env: &mut ScriptEnv<'_>, inc: u32) {
        let phase = self.phase.saturating_add(inc).min(EngineConfig::MAX_PHASE);
        self.set_phase(env, phase);
    }

    pub(crate) fn dec_phase(&mut self, env: &mut ScriptEnv<'_>, dec: u32) {
        let phase = self.phase.saturating_sub(dec);
        self.set_phase(env, phase);
    }

    // ===== counters =====

    /// Adds to (or with `reset`, overwrites) counter `id` and raises COUNTER_SET.
    pub fn store_counter(&mut self, env: &mut ScriptEnv<'_>, id: u32, value: u32, reset: bool) {
        let entry = self.counters.entry(id).or_insert(0);
        *entry = if reset { value } else { entry.saturating_add(value) };
        self.process_events_for(env, EventKind::CounterSet, &EventArgs::new().with_vars(id, 0));
    }

    // ===== stored targets =====

    /// Replaces target list `id`.
    pub fn store_targets(&mut self, id: u32, targets: Vec<ObjectGuid>) {
        self.stored_targets.insert(id, targets);
    }

    /// Appends to target list `id`, skipping objects already in it.
    pub fn add_to_stored_targets(&mut self, id: u32, targets: &[ObjectGuid]) {
        let list = self.stored_targets.entry(id).or_default();
        for guid in targets {
            if !list.contains(guid) {
                list.push(*guid);
            }
        }
    }

    /// Members of list `id` that are still in the world.
    pub fn stored_targets(&self, units: &dyn UnitOracle, id: u32) -> Option<Vec<ObjectGuid>> {
        self.stored_targets.get(&id).map(|list| {
            list.iter()
                .copied()
                .filter(|g| units.is_in_world(*g))
                .collect()
        })
    }

    // ===== base object =====

    pub(crate) fn override_base_object(&mut self, base: ObjectGuid) {
        debug!(agent = %self.owner, base = %base, "script base object overridden");
        self.base_override = Some(base);
    }

    pub(crate) fn reset_base_object(&mut self) {
        self.base_override = None;
    }

    // ===== callbacks answered by the engine itself =====

    /// Data set on this agent by another script or the host.
    pub fn set_data(&mut self, env: &mut ScriptEnv<'_>, field: u32, value: u32, invoker: Option<ObjectGuid>) {
        let args = EventArgs::invoked_by(invoker).with_vars(field, value);
        self.process_events_for(env, EventKind::DataSet, &args);
    }

    /// Numeric action signalled to this agent.
    pub fn do_action(&mut self, env: &mut ScriptEnv<'_>, action: u32) {
        self.process_events_for(env, EventKind::ActionDone, &EventArgs::new().with_vars(action, 0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holder::RuleKey;
    use crate::table::{RuleTable, SmartScriptRow};
    use crate::waypoint::PathTable;
    use combat::CombatWorld;
    use game_core::{ObjectRecord, WorldSnapshot};

    fn engine(rows: Vec<SmartScriptRow>) -> SmartScript {
        let (rules, _) = RuleTable::from_rows(rows);
        let catalog = ScriptCatalog::new(rules, PathTable::new(), EngineConfig::new());
        SmartScript::new(catalog, ObjectGuid::creature(100, 1), ScriptType::Creature)
    }

    #[test]
    fn phase_zero_matches_no_mask() {
        let mut script = engine(Vec::new());
        assert!(!script.is_in_phase(0xFFF));
        script.phase = 2;
        assert!(script.is_in_phase(0b10));
        assert!(!script.is_in_phase(0b01));
    }

    #[test]
    fn stale_rule_refs_resolve_to_nothing() {
        let mut script = engine(Vec::new());
        let rule = Arc::new(Rule {
            key: RuleKey::new(100, ScriptType::Creature, 0),
            link: 0,
            event: crate::event::Event::new(EventKind::Aggro, crate::event::EventParams::None),
            action: crate::action::Action::Die,
            target: crate::target::Target::none(),
            comment: String::new(),
        });
        let holder = script.new_holder(Arc::clone(&rule));
        script.stored.push(holder);
        let rref = script.rule_ref(ListKind::Stored, 0).unwrap();
        script.stored.clear();
        let replacement = script.new_holder(rule);
        script.stored.push(replacement);
        assert!(script.holder(rref).is_none());
    }

    #[test]
    fn stored_targets_drop_vanished_objects() {
        let mut world = WorldSnapshot::new()
            .with(ObjectRecord::creature(100, 1))
            .with(ObjectRecord::player(1))
            .with(ObjectRecord::player(2));
        world.record_mut(ObjectGuid::player(2)).unwrap().in_world = false;
        let mut script = engine(Vec::new());
        script.store_targets(3, vec![ObjectGuid::player(1), ObjectGuid::player(2)]);
        assert_eq!(
            script.stored_targets(&world, 3),
            Some(vec![ObjectGuid::player(1)])
        );
        assert_eq!(script.stored_targets(&world, 4), None);
    }

    #[test]
    fn spawn_rules_shadow_template_rules() {
        let rows = vec![
            SmartScriptRow::new(100, ScriptType::Creature, 0).event(EventKind::Aggro, &[]),
            SmartScriptRow::new(100, ScriptType::Creature, 1).event(EventKind::Death, &[]),
            SmartScriptRow::new(-1, ScriptType::Creature, 0).event(EventKind::Evade, &[]),
        ];
        let mut script = engine(rows);
        let mut world = WorldSnapshot::new().with(ObjectRecord::creature(100, 1));
        let mut combat = CombatWorld::default();
        script.initialize(&mut ScriptEnv::new(&mut world, &mut combat));
        assert_eq!(script.event_count(), 1);
    }
}
