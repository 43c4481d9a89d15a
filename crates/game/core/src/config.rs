/// Engine configuration constants and tunable parameters.
///
/// Runtime-tunable values are plain fields so hosts can load them from TOML;
/// limits that shape data structures are associated constants.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// PvP combat references decay after this long without a refresh.
    pub pvp_combat_timeout_ms: u32,
    /// Longest wait before re-checking a rule whose conditions failed.
    pub condition_retry_cap_ms: u32,
    /// Maximum nesting of event dispatch re-entered from actions.
    pub max_dispatch_depth: u32,
    /// Escort invoker range check period.
    pub escort_check_interval_ms: u32,
    /// Escort fails when no stored player is within this distance.
    pub escort_max_player_distance: f32,
    /// Period of the threat list victim re-evaluation.
    pub threat_update_interval_ms: u32,
    /// Radius used by closest-object targets authored with distance 0.
    pub default_search_range: f32,
    /// Whether finished talk lines raise text-over events.
    pub text_over_check: bool,
}

impl EngineConfig {
    // ===== compile-time constants =====
    /// Number of distinct rule phases (phase mask bits).
    pub const MAX_PHASE: u32 = 12;
    /// Phase mask covering every valid phase.
    pub const ALL_PHASES: u32 = (1 << Self::MAX_PHASE) - 1;
    /// Upper bound on the choices carried by random-pick actions.
    pub const MAX_RANDOM_CHOICES: usize = 6;
    /// A melee-range challenger must exceed the current victim's threat by this factor.
    pub const THREAT_SWITCH_MELEE_PCT: f32 = 1.1;
    /// Any challenger exceeding the current victim's threat by this factor takes over.
    pub const THREAT_SWITCH_ANY_PCT: f32 = 1.3;
    /// Combined cap on threat redirection percentages.
    pub const REDIRECT_PCT_CAP: u32 = 100;
    /// Synthetic stored-event ids start here so they never collide with content ids.
    pub const SYNTHETIC_EVENT_ID_BASE: u32 = 0x7FFF_0000;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_PVP_COMBAT_TIMEOUT_MS: u32 = 5_000;
    pub const DEFAULT_CONDITION_RETRY_CAP_MS: u32 = 5_000;
    pub const DEFAULT_MAX_DISPATCH_DEPTH: u32 = 64;
    pub const DEFAULT_ESCORT_CHECK_INTERVAL_MS: u32 = 1_000;
    pub const DEFAULT_ESCORT_MAX_PLAYER_DISTANCE: f32 = 60.0;
    pub const DEFAULT_THREAT_UPDATE_INTERVAL_MS: u32 = 1_000;
    pub const DEFAULT_SEARCH_RANGE: f32 = 100.0;

    pub fn new() -> Self {
        Self {
            pvp_combat_timeout_ms: Self::DEFAULT_PVP_COMBAT_TIMEOUT_MS,
            condition_retry_cap_ms: Self::DEFAULT_CONDITION_RETRY_CAP_MS,
            max_dispatch_depth: Self::DEFAULT_MAX_DISPATCH_DEPTH,
            escort_check_interval_ms: Self::DEFAULT_ESCORT_CHECK_INTERVAL_MS,
            escort_max_player_distance: Self::DEFAULT_ESCORT_MAX_PLAYER_DISTANCE,
            threat_update_interval_ms: Self::DEFAULT_THREAT_UPDATE_INTERVAL_MS,
            default_search_range: Self::DEFAULT_SEARCH_RANGE,
            text_over_check: true,
        }
    }

    pub fn with_pvp_combat_timeout(mut self, timeout_ms: u32) -> Self {
        self.pvp_combat_timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_dispatch_depth(mut self, depth: u32) -> Self {
        self.max_dispatch_depth = depth;
        self
    }

    /// Returns true if `mask` only names valid phases.
    pub const fn is_valid_phase_mask(mask: u32) -> bool {
        mask & !Self::ALL_PHASES == 0
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_mask_bounds() {
        assert_eq!(EngineConfig::ALL_PHASES, 0xFFF);
        assert!(EngineConfig::is_valid_phase_mask(0));
        assert!(EngineConfig::is_valid_phase_mask(0x800));
        assert!(!EngineConfig::is_valid_phase_mask(0x1000));
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = EngineConfig::new().with_pvp_combat_timeout(250);
        assert_eq!(config.pvp_combat_timeout_ms, 250);
        assert_eq!(config.max_dispatch_depth, EngineConfig::DEFAULT_MAX_DISPATCH_DEPTH);
    }
}
