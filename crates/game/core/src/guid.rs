//! Stable object identities.
use core::fmt;

/// Broad class of a world object.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ObjectKind {
    Player,
    Creature,
    GameObject,
    AreaTrigger,
    Scene,
}

/// Identity of a world object: kind, template entry and a unique counter.
///
/// For spawned creatures and game objects the counter doubles as the
/// database spawn id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectGuid {
    kind: ObjectKind,
    entry: u32,
    counter: u64,
}

impl ObjectGuid {
    pub const fn new(kind: ObjectKind, entry: u32, counter: u64) -> Self {
        Self {
            kind,
            entry,
            counter,
        }
    }

    pub const fn player(counter: u64) -> Self {
        Self::new(ObjectKind::Player, 0, counter)
    }

    pub const fn creature(entry: u32, counter: u64) -> Self {
        Self::new(ObjectKind::Creature, entry, counter)
    }

    pub const fn game_object(entry: u32, counter: u64) -> Self {
        Self::new(ObjectKind::GameObject, entry, counter)
    }

    pub const fn area_trigger(entry: u32, counter: u64) -> Self {
        Self::new(ObjectKind::AreaTrigger, entry, counter)
    }

    pub const fn scene(entry: u32, counter: u64) -> Self {
        Self::new(ObjectKind::Scene, entry, counter)
    }

    #[inline]
    pub const fn kind(&self) -> ObjectKind {
        self.kind
    }

    #[inline]
    pub const fn entry(&self) -> u32 {
        self.entry
    }

    #[inline]
    pub const fn counter(&self) -> u64 {
        self.counter
    }

    pub const fn is_player(&self) -> bool {
        matches!(self.kind, ObjectKind::Player)
    }

    pub const fn is_creature(&self) -> bool {
        matches!(self.kind, ObjectKind::Creature)
    }

    /// Players and creatures are units; everything else is not.
    pub const fn is_unit(&self) -> bool {
        matches!(self.kind, ObjectKind::Player | ObjectKind::Creature)
    }

    pub const fn is_game_object(&self) -> bool {
        matches!(self.kind, ObjectKind::GameObject)
    }
}

impl fmt::Display for ObjectGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.kind, self.entry, self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_classification() {
        assert!(ObjectGuid::player(1).is_unit());
        assert!(ObjectGuid::creature(100, 1).is_unit());
        assert!(!ObjectGuid::game_object(5, 1).is_unit());
        assert!(!ObjectGuid::scene(3, 1).is_unit());
    }

    #[test]
    fn display_includes_kind_entry_counter() {
        assert_eq!(ObjectGuid::creature(100, 7).to_string(), "creature-100-7");
        assert_eq!("game_object".parse::<ObjectKind>().ok(), Some(ObjectKind::GameObject));
    }
}
