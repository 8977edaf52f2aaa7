//! Spin Royale - a spinning-top battle used as a randomized elimination tournament
//!
//! Core modules:
//! - `sim`: Deterministic battle simulation (physics, arena, abilities, hazards)
//! - `tournament`: Heat/bracket scheduler driving the simulation
//! - `config`: Data-driven tournament and arena tuning
//! - `standings`: Final ranking derived from the elimination order

pub mod config;
pub mod error;
pub mod sim;
pub mod standings;
pub mod tournament;

pub use config::{ArenaConfig, BattleSpeed, TournamentConfig};
pub use error::TournamentError;
pub use standings::Standings;
pub use tournament::{TournamentHandle, TournamentPhase, start_tournament};

use glam::Vec2;

/// Simulation constants
pub mod consts {
    /// Maximum speed of a spinner (units per tick)
    pub const MAX_SPEED: f32 = 14.0;
    /// Baseline friction factor at full stamina
    pub const BASE_FRICTION: f32 = 0.995;
    /// Extra friction lost when stamina is fully drained
    pub const FATIGUE_FRICTION: f32 = 0.015;
    /// Passive stamina decay per tick
    pub const STAMINA_DECAY: f32 = 0.02;
    /// Knockout animation length (presentation only)
    pub const KO_TICKS: u32 = 60;
    /// Cosmetic spin per tick per point of spin_power
    pub const SPIN_RATE: f32 = 0.02;

    /// Radius = RADIUS_BASE + RADIUS_PER_WEIGHT * weight
    pub const RADIUS_BASE: f32 = 15.0;
    pub const RADIUS_PER_WEIGHT: f32 = 1.5;

    /// Base impulse = IMPULSE_BASE + rel_speed * IMPULSE_PER_SPEED + attack_sum * IMPULSE_PER_ATTACK
    pub const IMPULSE_BASE: f32 = 4.0;
    pub const IMPULSE_PER_SPEED: f32 = 0.9;
    pub const IMPULSE_PER_ATTACK: f32 = 0.1;

    /// Damage = max(MIN_DAMAGE, attack - DEFENSE_FACTOR * defense) * speed factor
    pub const MIN_DAMAGE: f32 = 1.0;
    pub const DEFENSE_FACTOR: f32 = 0.5;
    /// Relative speed giving a 1.0 damage speed factor
    pub const DAMAGE_REFERENCE_SPEED: f32 = 10.0;

    /// Substitute direction length threshold for coincident centers
    pub const CONTACT_EPSILON: f32 = 1e-4;

    /// Default circular arena
    pub const ARENA_RADIUS: f32 = 500.0;
    pub const ARENA_SLOPE: f32 = 0.25;
    /// Bowl force exponent on normalized distance
    pub const BOWL_EXPONENT: f32 = 1.5;
    /// Tangential nudge strength (fraction of slope)
    pub const ORBIT_NUDGE: f32 = 0.04;
    /// Minimum speed before the orbit nudge applies
    pub const ORBIT_MIN_SPEED: f32 = 4.0;
    /// Constant pull toward the horizontal center
    pub const CENTER_PULL: f32 = 0.01;
    /// Velocity kept (and reversed) after an edge save
    pub const EDGE_SAVE_DAMPING: f32 = 0.6;
    /// Restitution of the rectangle's top/bottom walls
    pub const WALL_RESTITUTION: f32 = 0.8;
    /// Extra normal kick from a pinball bumper
    pub const BUMPER_KICK: f32 = 3.0;

    /// Finals pit defaults
    pub const FINALS_WIDTH: f32 = 900.0;
    pub const FINALS_HEIGHT: f32 = 600.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
