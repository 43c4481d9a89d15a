//! Shared combat and threat references.
//!
//! A reference is stored exactly once in the [`CombatWorld`](crate::CombatWorld)
//! arena and indexed from both participating agents by id, so neither side
//! can hold a stale copy.
use core::cmp::Ordering;

use game_core::{ObjectGuid, UnitFlags, UnitOracle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CombatRefId(pub(crate) u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreatRefId(pub(crate) u64);

/// Symmetric record that two agents are fighting each other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CombatReference {
    pub(crate) first: ObjectGuid,
    pub(crate) second: ObjectGuid,
    pub(crate) pvp: bool,
    pub(crate) pvp_timer: u32,
    pub(crate) suppressed_first: bool,
    pub(crate) suppressed_second: bool,
}

impl CombatReference {
    pub(crate) fn new(first: ObjectGuid, second: ObjectGuid, pvp: bool, timeout: u32) -> Self {
        Self {
            first,
            second,
            pvp,
            pvp_timer: if pvp { timeout } else { 0 },
            suppressed_first: false,
            suppressed_second: false,
        }
    }

    pub fn first(&self) -> ObjectGuid {
        self.first
    }

    pub fn second(&self) -> ObjectGuid {
        self.second
    }

    pub fn other(&self, guid: ObjectGuid) -> ObjectGuid {
        if guid == self.first {
            self.second
        } else {
            self.first
        }
    }

    pub fn is_pvp(&self) -> bool {
        self.pvp
    }

    /// Remaining decay time of a PvP reference.
    pub fn pvp_timer(&self) -> u32 {
        self.pvp_timer
    }

    pub fn is_suppressed_for(&self, guid: ObjectGuid) -> bool {
        if guid == self.first {
            self.suppressed_first
        } else {
            self.suppressed_second
        }
    }

    pub(crate) fn suppress_for(&mut self, guid: ObjectGuid) {
        if guid == self.first {
            self.suppressed_first = true;
        } else {
            self.suppressed_second = true;
        }
    }

    pub(crate) fn unsuppress_for(&mut self, guid: ObjectGuid) {
        if guid == self.first {
            self.suppressed_first = false;
        } else {
            self.suppressed_second = false;
        }
    }

    pub(crate) fn refresh_timer(&mut self, timeout: u32) {
        if self.pvp {
            self.pvp_timer = timeout;
        }
    }

    /// Advances the PvP decay timer; false once it has run out.
    pub(crate) fn tick(&mut self, diff: u32) -> bool {
        if self.pvp_timer <= diff {
            self.pvp_timer = 0;
            return false;
        }
        self.pvp_timer -= diff;
        true
    }
}

/// Availability of a threat reference. Declaration order is precedence order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum OnlineState {
    Offline,
    Suppressed,
    Online,
}

/// Taunt ranking of a threat reference.
///
/// `DETAUNT < NONE < TAUNT`, and taunts applied later rank above earlier ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TauntState(u32);

impl TauntState {
    pub const DETAUNT: Self = Self(0);
    pub const NONE: Self = Self(1);
    pub const TAUNT: Self = Self(2);

    /// Taunt state for the `index`-th live taunt aura, oldest first.
    pub(crate) const fn taunt(index: u32) -> Self {
        Self(Self::TAUNT.0 + index)
    }

    pub const fn is_taunting(&self) -> bool {
        self.0 >= Self::TAUNT.0
    }
}

/// Directed edge: `owner` is threatened by `victim` for some amount.
#[derive(Clone, Debug, PartialEq)]
pub struct ThreatReference {
    pub(crate) owner: ObjectGuid,
    pub(crate) victim: ObjectGuid,
    pub(crate) base_amount: f32,
    pub(crate) online: OnlineState,
    pub(crate) taunt: TauntState,
}

impl ThreatReference {
    pub(crate) fn new(owner: ObjectGuid, victim: ObjectGuid) -> Self {
        Self {
            owner,
            victim,
            base_amount: 0.0,
            online: OnlineState::Offline,
            taunt: TauntState::NONE,
        }
    }

    pub fn owner(&self) -> ObjectGuid {
        self.owner
    }

    pub fn victim(&self) -> ObjectGuid {
        self.victim
    }

    pub fn threat(&self) -> f32 {
        self.base_amount.max(0.0)
    }

    pub fn online_state(&self) -> OnlineState {
        self.online
    }

    pub fn taunt_state(&self) -> TauntState {
        self.taunt
    }

    pub fn is_online(&self) -> bool {
        self.online == OnlineState::Online
    }

    pub fn is_suppressed(&self) -> bool {
        self.online == OnlineState::Suppressed
    }

    pub fn is_offline(&self) -> bool {
        self.online == OnlineState::Offline
    }

    pub fn is_available(&self) -> bool {
        self.online > OnlineState::Offline
    }

    pub fn is_taunting(&self) -> bool {
        self.taunt.is_taunting()
    }

    /// Adds to the base amount, clamping at zero. Returns whether anything changed.
    pub(crate) fn add_threat(&mut self, amount: f32) -> bool {
        if amount == 0.0 {
            return false;
        }
        self.base_amount = (self.base_amount + amount).max(0.0);
        true
    }

    pub(crate) fn scale_threat(&mut self, factor: f32) -> bool {
        if factor == 1.0 {
            return false;
        }
        self.base_amount = (self.base_amount * factor).max(0.0);
        true
    }

    pub(crate) fn should_be_offline(&self, units: &dyn UnitOracle) -> bool {
        if !units.can_see_or_detect(self.owner, self.victim) {
            return true;
        }
        if !units.is_valid_attack_target(self.owner, self.victim) {
            return true;
        }
        !flags_allow_fighting(units, self.owner, self.victim)
            || !flags_allow_fighting(units, self.victim, self.owner)
    }

    pub(crate) fn should_be_suppressed(&self, units: &dyn UnitOracle) -> bool {
        if self.is_taunting() {
            return false;
        }
        if units.is_immune_to_damage(self.victim, units.melee_school_mask(self.owner)) {
            return true;
        }
        units.is_confused(self.victim) || units.has_breakable_stun(self.victim)
    }
}

fn flags_allow_fighting(units: &dyn UnitOracle, a: ObjectGuid, b: ObjectGuid) -> bool {
    if units.is_trigger(a) {
        return false;
    }
    let immunity = if units.is_player_controlled(a) {
        UnitFlags::IMMUNE_TO_PC
    } else {
        UnitFlags::IMMUNE_TO_NPC
    };
    !units.unit_flags(b).contains(immunity)
}

/// Total ranking used for the sorted threat list (greater ranks first).
pub(crate) fn rank(a: &ThreatReference, b: &ThreatReference) -> Ordering {
    a.online
        .cmp(&b.online)
        .then(a.taunt.cmp(&b.taunt))
        .then(a.threat().partial_cmp(&b.threat()).unwrap_or(Ordering::Equal))
}

/// True if `a`, with its threat weighted by `a_weight`, ranks below `b`.
pub(crate) fn ranks_below(a: &ThreatReference, b: &ThreatReference, a_weight: f32) -> bool {
    if a.online != b.online {
        return a.online < b.online;
    }
    if a.taunt != b.taunt {
        return a.taunt < b.taunt;
    }
    a.threat() * a_weight < b.threat()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(threat: f32) -> ThreatReference {
        let mut r = ThreatReference::new(ObjectGuid::creature(1, 1), ObjectGuid::player(1));
        r.base_amount = threat;
        r
    }

    #[test]
    fn threat_never_goes_negative() {
        let mut r = reference(10.0);
        assert!(r.add_threat(-25.0));
        assert_eq!(r.threat(), 0.0);
        assert!(!r.add_threat(0.0));
        r.scale_threat(-2.0);
        assert_eq!(r.threat(), 0.0);
    }

    #[test]
    fn online_state_outranks_taunt_and_threat() {
        let mut low_online = reference(1.0);
        low_online.online = OnlineState::Online;
        let mut high_suppressed = reference(1000.0);
        high_suppressed.online = OnlineState::Suppressed;
        high_suppressed.taunt = TauntState::TAUNT;
        assert_eq!(rank(&low_online, &high_suppressed), Ordering::Greater);
    }

    #[test]
    fn weighted_comparison() {
        let current = reference(100.0);
        assert!(!ranks_below(&current, &reference(105.0), 1.1));
        assert!(ranks_below(&current, &reference(125.0), 1.1));
        assert!(!ranks_below(&current, &reference(125.0), 1.3));
        assert!(ranks_below(&current, &reference(131.0), 1.3));
    }

    #[test]
    fn later_taunts_rank_higher() {
        assert!(TauntState::taunt(1) > TauntState::taunt(0));
        assert!(TauntState::taunt(0).is_taunting());
        assert!(!TauntState::NONE.is_taunting());
        assert!(TauntState::DETAUNT < TauntState::NONE);
    }

    #[test]
    fn pvp_timer_runs_out() {
        let mut r = CombatReference::new(ObjectGuid::player(1), ObjectGuid::player(2), true, 100);
        assert!(r.tick(60));
        assert!(!r.tick(40));
    }
}
