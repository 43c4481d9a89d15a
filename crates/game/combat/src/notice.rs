use game_core::ObjectGuid;

/// AI notifications produced by combat and threat bookkeeping.
///
/// The arena never calls into AI code directly; hosts drain these after each
/// mutating call and deliver them, so AI reactions cannot observe a
/// half-updated arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CombatNotice {
    /// `agent` went from no combat to combat, first against `enemy`.
    EnteredCombat { agent: ObjectGuid, enemy: ObjectGuid },
    /// `agent` has no remaining (unsuppressed) combat.
    ExitedCombat { agent: ObjectGuid },
    /// `victim` was newly put on `owner`'s threat list (or came back online).
    ThreatStarted { owner: ObjectGuid, victim: ObjectGuid },
    /// `owner`'s selected victim changed.
    VictimChanged {
        owner: ObjectGuid,
        victim: Option<ObjectGuid>,
    },
}

/// Threat list snapshot for network observers.
#[derive(Clone, Debug, PartialEq)]
pub enum ThreatUpdate {
    /// Whole list, highest first.
    Full {
        owner: ObjectGuid,
        highest_changed: bool,
        highest: Option<ObjectGuid>,
        entries: Vec<(ObjectGuid, f32)>,
    },
    Remove {
        owner: ObjectGuid,
        victim: ObjectGuid,
    },
    Clear {
        owner: ObjectGuid,
    },
}
