//! Target selection over a threat list.
use rand::RngCore;
use rand::seq::SliceRandom;

use game_core::{ObjectGuid, UnitOracle};

use crate::world::CombatWorld;

/// Ordering applied before offset and count are taken.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::FromRepr,
)]
#[strum(serialize_all = "snake_case")]
#[repr(u32)]
pub enum SelectTargetMethod {
    Random = 0,
    MaxThreat = 1,
    MinThreat = 2,
    MaxDistance = 3,
    MinDistance = 4,
}

impl CombatWorld {
    /// Up to `num` victims from `owner`'s threat list.
    ///
    /// Threat orderings put the current victim first. `offset` entries are
    /// skipped before the filter runs. `Random` keeps list order among the
    /// sampled entries.
    #[allow(clippy::too_many_arguments)]
    pub fn select_target_list(
        &mut self,
        units: &dyn UnitOracle,
        owner: ObjectGuid,
        num: usize,
        method: SelectTargetMethod,
        offset: usize,
        filter: impl Fn(ObjectGuid) -> bool,
        rng: &mut dyn RngCore,
    ) -> Vec<ObjectGuid> {
        if num == 0 || !units.can_have_threat_list(owner) {
            return Vec::new();
        }
        let mut candidates = match method {
            SelectTargetMethod::MaxDistance | SelectTargetMethod::MinDistance => {
                let mut by_distance: Vec<(ObjectGuid, f32)> = self
                    .agents
                    .get(&owner)
                    .into_iter()
                    .flat_map(|a| a.threat.entries.values())
                    .filter_map(|id| self.threat_refs.get(id))
                    .filter(|r| !r.is_offline())
                    .map(|r| (r.victim, units.distance(owner, r.victim).unwrap_or(f32::MAX)))
                    .collect();
                by_distance.sort_by(|a, b| a.1.total_cmp(&b.1));
                if method == SelectTargetMethod::MaxDistance {
                    by_distance.reverse();
                }
                by_distance.into_iter().map(|(guid, _)| guid).collect()
            }
            _ => {
                let current = self.current_victim(units, owner);
                let mut ordered: Vec<ObjectGuid> = current.into_iter().collect();
                ordered.extend(
                    self.agents
                        .get(&owner)
                        .into_iter()
                        .flat_map(|a| a.threat.sorted.iter())
                        .filter_map(|id| self.threat_refs.get(id))
                        .filter(|r| !r.is_offline() && Some(r.victim) != current)
                        .map(|r| r.victim),
                );
                if method == SelectTargetMethod::MinThreat {
                    ordered.reverse();
                }
                ordered
            }
        };

        if offset >= candidates.len() {
            return Vec::new();
        }
        candidates.drain(..offset);
        candidates.retain(|guid| filter(*guid));

        if method == SelectTargetMethod::Random && candidates.len() > num {
            let mut picked = rand::seq::index::sample(rng, candidates.len(), num).into_vec();
            picked.sort_unstable();
            return picked.into_iter().map(|i| candidates[i]).collect();
        }
        candidates.truncate(num);
        candidates
    }

    /// Single-target variant of [`CombatWorld::select_target_list`].
    pub fn select_target(
        &mut self,
        units: &dyn UnitOracle,
        owner: ObjectGuid,
        method: SelectTargetMethod,
        offset: usize,
        filter: impl Fn(ObjectGuid) -> bool,
        rng: &mut dyn RngCore,
    ) -> Option<ObjectGuid> {
        let candidates =
            self.select_target_list(units, owner, usize::MAX, method, offset, filter, rng);
        if method == SelectTargetMethod::Random {
            return candidates.choose(rng).copied();
        }
        candidates.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{ObjectRecord, ScriptRng, WorldSnapshot};

    fn boss() -> ObjectGuid {
        ObjectGuid::creature(500, 1)
    }

    fn setup() -> (WorldSnapshot, CombatWorld) {
        let units = WorldSnapshot::new()
            .with(ObjectRecord::creature(500, 1))
            .with(ObjectRecord::player(1).at(2.0, 0.0, 0.0))
            .with(ObjectRecord::player(2).at(20.0, 0.0, 0.0))
            .with(ObjectRecord::player(3).at(10.0, 0.0, 0.0));
        let mut combat = CombatWorld::default();
        for (n, amount) in [(1, 100.0), (2, 300.0), (3, 200.0)] {
            combat.add_threat(&units, boss(), ObjectGuid::player(n), amount, None, false, false);
        }
        (units, combat)
    }

    #[test]
    fn threat_orderings_start_at_current_victim() {
        let (units, mut combat) = setup();
        let mut rng = ScriptRng::new(7);
        let victim = combat.current_victim(&units, boss());
        let list = combat.select_target_list(
            &units,
            boss(),
            3,
            SelectTargetMethod::MaxThreat,
            0,
            |_| true,
            &mut rng,
        );
        assert_eq!(list.first().copied(), victim);
        assert_eq!(list.len(), 3);

        let mut reversed = combat.select_target_list(
            &units,
            boss(),
            3,
            SelectTargetMethod::MinThreat,
            0,
            |_| true,
            &mut rng,
        );
        reversed.reverse();
        assert_eq!(reversed, list);
    }

    #[test]
    fn distance_orderings() {
        let (units, mut combat) = setup();
        let mut rng = ScriptRng::new(7);
        let far = combat.select_target(&units, boss(), SelectTargetMethod::MaxDistance, 0, |_| true, &mut rng);
        assert_eq!(far, Some(ObjectGuid::player(2)));
        let near = combat.select_target(&units, boss(), SelectTargetMethod::MinDistance, 1, |_| true, &mut rng);
        assert_eq!(near, Some(ObjectGuid::player(3)));
    }

    #[test]
    fn filter_and_random_sampling() {
        let (units, mut combat) = setup();
        let mut rng = ScriptRng::new(11);
        let players = combat.select_target_list(
            &units,
            boss(),
            2,
            SelectTargetMethod::Random,
            0,
            |guid| guid != ObjectGuid::player(2),
            &mut rng,
        );
        assert_eq!(players.len(), 2);
        assert!(!players.contains(&ObjectGuid::player(2)));

        let none = combat.select_target(&units, boss(), SelectTargetMethod::MaxThreat, 5, |_| true, &mut rng);
        assert_eq!(none, None);
    }
}
