//! Discrete battle events for presentation, audio and logging

use serde::{Deserialize, Serialize};

use super::ability::AbilityKind;
use super::entity::DeathCause;

/// Something noteworthy that happened during a tick (or at a heat boundary)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// Two spinners collided; intensity is the relative speed at impact
    Collision { a: String, b: String, intensity: f32 },
    /// An ability fired, with display text
    AbilityTriggered {
        entity: String,
        ability: AbilityKind,
        text: String,
    },
    /// A spinner left the battle
    Eliminated {
        entity: String,
        cause: DeathCause,
        /// Summoned fragments/clones never count toward rankings
        summon: bool,
        tick: u64,
    },
    /// A fragment or clone joined the battle
    Summoned { entity: String, origin: String },
    /// A dead spinner came back
    Revived { entity: String },
    HeatStarted {
        heat: usize,
        entrants: Vec<String>,
        finals: bool,
    },
    /// The current heat was thrown away and restarted from scratch
    HeatReset { heat: usize, trigger: String },
    HeatEnded { heat: usize, survivors: Vec<String> },
    /// The preliminary stage picked the group whose members form the real pool
    PreliminaryDecided { group: String, members: Vec<String> },
    TournamentEnded { winner: String },
}

impl BattleEvent {
    pub fn triggered(entity: &str, ability: AbilityKind, text: impl Into<String>) -> Self {
        BattleEvent::AbilityTriggered {
            entity: entity.to_string(),
            ability,
            text: text.into(),
        }
    }
}
