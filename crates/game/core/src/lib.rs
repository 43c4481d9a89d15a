//! World vocabulary shared by the combat and scripting crates.
//!
//! `game-core` defines object identities, positions, unit and spell flag
//! sets, the tunable [`EngineConfig`], and the oracle traits through which
//! the engines observe and command the host world. Nothing in here owns
//! game state; hosts implement [`env::UnitOracle`] and [`env::WorldOracle`]
//! over their own storage, and [`env::WorldSnapshot`] provides an in-memory
//! implementation for tools and tests.
pub mod config;
pub mod env;
pub mod error;
pub mod guid;
pub mod position;
pub mod spell;
pub mod unit;

pub use config::EngineConfig;
pub use env::{
    AliveFilter, ConditionSource, ObjectRecord, ObjectSearch, OracleError, ScriptRng,
    SearchKind, SummonKind, SummonRequest, TauntAura, UnitOracle, WorldCommand, WorldOracle,
    WorldSnapshot,
};
pub use error::{ErrorSeverity, GameError};
pub use guid::{ObjectGuid, ObjectKind};
pub use position::Position;
pub use spell::{SpellAttributes, SpellInfo, SpellSchoolMask};
pub use unit::{
    DynamicFlags, MovementKind, NpcFlags, PowerType, ReactState, SheathState, UnitFlags,
    UnitState,
};
