//! Per-tournament simulation context
//!
//! Everything a subsystem may touch besides the entity list itself: the tick
//! counter, the injectable RNG, the arena, live hazards, the event sink and
//! the queue of spawns deferred to the tick boundary.

use glam::Vec2;
use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg32;

use super::arena::Arena;
use super::entity::{EntityId, EntrantProfile};
use super::events::BattleEvent;
use super::hazard::Hazard;

/// Work that must wait until the entity list is no longer being iterated
#[derive(Debug, Clone)]
pub enum PendingSpawn {
    /// A new summoned entity (fragment or clone)
    Summon {
        origin: EntityId,
        profile: EntrantProfile,
        pos: Vec2,
        vel: Vec2,
        stamina: f32,
    },
    /// Bring a dead entity back at the given position
    Revive {
        id: EntityId,
        pos: Vec2,
        stamina: f32,
    },
}

pub struct SimulationContext {
    /// Tick counter (monotonic across the whole tournament)
    pub tick: u64,
    pub rng: Box<dyn RngCore>,
    pub arena: Arena,
    pub hazards: Vec<Hazard>,
    pub events: Vec<BattleEvent>,
    pub pending: Vec<PendingSpawn>,
    /// Set by the aftermath pass when a heat-reset ability fires
    pub reset_requested: Option<String>,
    next_hazard_id: u32,
}

impl std::fmt::Debug for SimulationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationContext")
            .field("tick", &self.tick)
            .field("arena", &self.arena)
            .field("hazards", &self.hazards.len())
            .field("events", &self.events.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl SimulationContext {
    /// Context with the default seeded generator
    pub fn seeded(seed: u64, arena: Arena) -> Self {
        Self::with_rng(Box::new(Pcg32::seed_from_u64(seed)), arena)
    }

    /// Context with a caller-supplied random source
    pub fn with_rng(rng: Box<dyn RngCore>, arena: Arena) -> Self {
        Self {
            tick: 0,
            rng,
            arena,
            hazards: Vec::new(),
            events: Vec::new(),
            pending: Vec::new(),
            reset_requested: None,
            next_hazard_id: 1,
        }
    }

    /// Bernoulli trial from the injected RNG
    #[inline]
    pub fn roll(&mut self, chance: f64) -> bool {
        self.rng.random_bool(chance.clamp(0.0, 1.0))
    }

    #[inline]
    pub fn emit(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn spawn_hazard(&mut self, mut hazard: Hazard) {
        hazard.id = self.next_hazard_id;
        self.next_hazard_id += 1;
        self.hazards.push(hazard);
    }

    pub fn queue(&mut self, spawn: PendingSpawn) {
        self.pending.push(spawn);
    }

    /// Swap in a new arena and clear per-heat leftovers
    pub fn reset_for_heat(&mut self, arena: Arena) {
        self.arena = arena;
        self.hazards.clear();
        self.pending.clear();
        self.reset_requested = None;
    }
}
