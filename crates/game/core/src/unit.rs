//! Unit flag sets and small unit enums.
use bitflags::bitflags;

bitflags! {
    /// Persistent unit flags visible to the client.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct UnitFlags: u32 {
        const SERVER_CONTROLLED     = 1 << 0;
        const NON_ATTACKABLE        = 1 << 1;
        const REMOVE_CLIENT_CONTROL = 1 << 2;
        const PLAYER_CONTROLLED     = 1 << 3;
        const IMMUNE_TO_PC          = 1 << 8;
        const IMMUNE_TO_NPC         = 1 << 9;
        const PET_IN_COMBAT         = 1 << 11;
        const PVP                   = 1 << 12;
        const SILENCED              = 1 << 13;
        const PACIFIED              = 1 << 17;
        const STUNNED               = 1 << 18;
        const IN_COMBAT             = 1 << 19;
        const DISARMED              = 1 << 21;
        const CONFUSED              = 1 << 22;
        const FLEEING               = 1 << 23;
        const POSSESSED             = 1 << 24;
        const UNINTERACTIBLE        = 1 << 25;
        const SKINNABLE             = 1 << 26;
    }
}

bitflags! {
    /// Interaction services offered by an NPC.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct NpcFlags: u32 {
        const GOSSIP      = 1 << 0;
        const QUESTGIVER  = 1 << 1;
        const TRAINER     = 1 << 4;
        const VENDOR      = 1 << 7;
        const REPAIR      = 1 << 12;
        const FLIGHTMASTER = 1 << 13;
        const INNKEEPER   = 1 << 16;
        const BANKER      = 1 << 17;
        const SPELLCLICK  = 1 << 24;
    }
}

bitflags! {
    /// Per-viewer dynamic presentation flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct DynamicFlags: u32 {
        const LOOTABLE    = 1 << 0;
        const TRACK_UNIT  = 1 << 1;
        const TAPPED      = 1 << 2;
        const SPECIALINFO = 1 << 4;
        const DEAD        = 1 << 5;
    }
}

bitflags! {
    /// Transient server-side unit states.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct UnitState: u32 {
        const DIED            = 1 << 0;
        const MELEE_ATTACKING = 1 << 1;
        const CHARMED         = 1 << 2;
        const STUNNED         = 1 << 3;
        const ROAMING         = 1 << 4;
        const CHASE           = 1 << 5;
        const FOCUSING        = 1 << 6;
        const FLEEING         = 1 << 7;
        const IN_FLIGHT       = 1 << 8;
        const FOLLOW          = 1 << 9;
        const ROOT            = 1 << 10;
        const CONFUSED        = 1 << 11;
        const DISTRACTED      = 1 << 12;
        const ISOLATED        = 1 << 13;
        const ATTACK_PLAYER   = 1 << 14;
        const CASTING         = 1 << 15;
        const POSSESSED       = 1 << 16;
        const CHARGING        = 1 << 17;
        const JUMPING         = 1 << 18;
        const MOVE            = 1 << 20;
        const ROTATING        = 1 << 21;
        const EVADE           = 1 << 22;

        const LOST_CONTROL = Self::CONFUSED.bits()
            | Self::STUNNED.bits()
            | Self::FLEEING.bits()
            | Self::CHARGING.bits()
            | Self::JUMPING.bits();
        const CONTROLLED = Self::CONFUSED.bits()
            | Self::STUNNED.bits()
            | Self::FLEEING.bits();
    }
}

/// How a creature reacts to hostiles entering its awareness.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::FromRepr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
#[repr(u32)]
pub enum ReactState {
    Passive = 0,
    Defensive = 1,
    #[default]
    Aggressive = 2,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::FromRepr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
#[repr(u32)]
pub enum SheathState {
    Unarmed = 0,
    Melee = 1,
    Ranged = 2,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::FromRepr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
#[repr(u32)]
pub enum PowerType {
    Mana = 0,
    Rage = 1,
    Focus = 2,
    Energy = 3,
    ComboPoints = 4,
    Runes = 5,
    RunicPower = 6,
}

/// Movement generator kinds reported by movement-inform callbacks.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::FromRepr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
#[repr(u32)]
pub enum MovementKind {
    Idle = 0,
    Random = 1,
    Waypoint = 2,
    Confused = 4,
    Chase = 5,
    Home = 6,
    Flight = 7,
    Point = 8,
    Fleeing = 9,
    Distract = 10,
    Assistance = 11,
    TimedFleeing = 13,
    Follow = 14,
    Rotate = 15,
    Effect = 16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_control_includes_stun_and_fear() {
        assert!(UnitState::LOST_CONTROL.contains(UnitState::STUNNED));
        assert!(UnitState::LOST_CONTROL.contains(UnitState::FLEEING));
        assert!(!UnitState::LOST_CONTROL.contains(UnitState::ROOT));
    }

    #[test]
    fn react_state_from_raw() {
        assert_eq!(ReactState::from_repr(0), Some(ReactState::Passive));
        assert_eq!(ReactState::from_repr(3), None);
        assert_eq!(MovementKind::from_repr(8), Some(MovementKind::Point));
    }
}
