//! Combat and threat bookkeeping for scripted agents.
//!
//! [`CombatWorld`] is the single owner of every combat pair and threat edge
//! on a map. Agents hold id indices into it through [`CombatManager`] and
//! [`ThreatManager`], so both ends of a relationship always agree. Side
//! effects destined for AI code are queued as [`CombatNotice`]s and drained
//! by the host once the arena is consistent again.
pub mod combat_manager;
pub mod error;
pub mod notice;
pub mod reference;
pub mod select;
pub mod threat_manager;
pub mod world;

pub use combat_manager::{CombatManager, can_begin_combat};
pub use error::CombatError;
pub use notice::{CombatNotice, ThreatUpdate};
pub use reference::{
    CombatRefId, CombatReference, OnlineState, TauntState, ThreatRefId, ThreatReference,
};
pub use select::SelectTargetMethod;
pub use threat_manager::ThreatManager;
pub use world::CombatWorld;
