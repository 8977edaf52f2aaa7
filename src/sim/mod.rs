//! Deterministic battle simulation
//!
//! All battle logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Injected RNG only (seeded `Pcg32` by default)
//! - Stable iteration order (by entity index)
//! - No rendering or platform dependencies

pub mod ability;
pub mod aftermath;
pub mod arena;
pub mod collision;
pub mod context;
pub mod entity;
pub mod events;
pub mod hazard;
pub mod passives;
pub mod physics;
pub mod pipeline;
pub mod tick;

pub use ability::{Ability, AbilityKind};
pub use arena::{Arena, ArenaShape, Boundary, Bumper};
pub use collision::{Contact, detect_pairs, resolve_pair};
pub use context::{PendingSpawn, SimulationContext};
pub use entity::{DeathCause, Entity, EntityId, EntrantProfile, Role, Stats};
pub use events::BattleEvent;
pub use hazard::{Hazard, HazardKind, HazardSnapshot};
pub use pipeline::{Exchange, Outcome, PIPELINE, Stage};
pub use tick::{Battle, BattleSnapshot, EntitySnapshot, tick};
