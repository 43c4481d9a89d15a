//! Spell metadata the engines need: identity, school and threat attributes.
use bitflags::bitflags;

bitflags! {
    /// Damage schools.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SpellSchoolMask: u32 {
        const NORMAL = 1 << 0;
        const HOLY   = 1 << 1;
        const FIRE   = 1 << 2;
        const NATURE = 1 << 3;
        const FROST  = 1 << 4;
        const SHADOW = 1 << 5;
        const ARCANE = 1 << 6;

        const SPELL = Self::HOLY.bits()
            | Self::FIRE.bits()
            | Self::NATURE.bits()
            | Self::FROST.bits()
            | Self::SHADOW.bits()
            | Self::ARCANE.bits();
        const ALL = Self::NORMAL.bits() | Self::SPELL.bits();
    }
}

bitflags! {
    /// Spell attributes consulted by threat and scripting.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SpellAttributes: u32 {
        /// The spell never generates threat.
        const NO_THREAT         = 1 << 0;
        /// The spell generates no threat against an unengaged owner.
        const NO_INITIAL_THREAT = 1 << 1;
        const PASSIVE           = 1 << 2;
    }
}

/// Static information about a spell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellInfo {
    pub id: u32,
    pub school_mask: SpellSchoolMask,
    pub attributes: SpellAttributes,
}

impl SpellInfo {
    pub const fn new(id: u32, school_mask: SpellSchoolMask) -> Self {
        Self {
            id,
            school_mask,
            attributes: SpellAttributes::empty(),
        }
    }

    pub const fn with_attributes(mut self, attributes: SpellAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub const fn has_attribute(&self, attribute: SpellAttributes) -> bool {
        self.attributes.contains(attribute)
    }
}
