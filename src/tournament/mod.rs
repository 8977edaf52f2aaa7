//! Tournament orchestration: entrant cleanup, bracket planning and the heat
//! state machine

pub mod bracket;
pub mod scheduler;

pub use bracket::{advancers_for, dedupe_entrants, split_into_groups, split_into_heats};
pub use scheduler::{HeatKind, HeatRecord, TournamentHandle, TournamentPhase, start_tournament};
