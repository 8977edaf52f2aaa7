//! Spinner entities and entrant profiles
//!
//! Entities are never removed from a heat's list while the heat runs; a dead
//! spinner stays in place with `alive == false` so that [`EntityId`] handles
//! stay valid for the whole heat.

use glam::Vec2;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::ability::{Ability, AbilityKind};
use crate::consts::*;

/// Stable handle to an entity within one heat (its index in the entity list)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Fixed stats rolled when an entrant enters the bracket
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Cosmetic spin speed
    pub spin_power: f32,
    pub attack: f32,
    pub defense: f32,
    pub max_stamina: f32,
    pub weight: f32,
}

impl Stats {
    /// Roll stats from the fixed creation ranges
    pub fn roll(rng: &mut dyn RngCore) -> Self {
        Self {
            spin_power: rng.random_range(5.0..=10.0),
            attack: rng.random_range(5.0..=15.0),
            defense: rng.random_range(5.0..=15.0),
            max_stamina: rng.random_range(100.0..=150.0),
            weight: rng.random_range(5.0..=15.0),
        }
    }

    /// Collision radius derived from weight
    pub fn radius(&self) -> f32 {
        RADIUS_BASE + RADIUS_PER_WEIGHT * self.weight
    }
}

/// Everything needed to (re)spawn an entrant in any heat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrantProfile {
    pub label: String,
    pub stats: Stats,
    pub ability: Option<AbilityKind>,
}

impl EntrantProfile {
    pub fn roll(label: impl Into<String>, ability: Option<AbilityKind>, rng: &mut dyn RngCore) -> Self {
        Self {
            label: label.into(),
            stats: Stats::roll(rng),
            ability,
        }
    }
}

/// Whether an entity is a bracket entrant or something an ability created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Entrant,
    /// Fragments and clones: they fight but never count as survivors
    Summon { origin: EntityId },
}

/// How an entity left the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    /// Stamina ran out
    Exhausted,
    /// Crossed the arena boundary
    RingOut,
    /// Eaten from inside by a parasite
    Consumed,
}

/// Shared-damage linkage created by a tether
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub partner: EntityId,
    pub ticks_left: u32,
}

/// Timed conditions applied to an entity by other entities' abilities
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub poison_ticks: u32,
    pub poison_rate: f32,
    pub chill_ticks: u32,
    pub link: Option<Link>,
    /// Set while a parasite hides inside another entity
    pub hidden_in: Option<EntityId>,
}

/// One spinner in the arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub label: String,
    pub role: Role,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub stats: Stats,
    pub stamina: f32,
    pub alive: bool,
    /// Cosmetic rotation angle (radians)
    pub rotation: f32,
    /// Cosmetic hue in degrees, derived from the label
    pub hue: f32,
    pub ability: Option<Ability>,
    pub status: Status,
    /// Presentation-only knockout countdown
    pub ko_timer: u32,
    pub death: Option<DeathCause>,
    /// Died this tick and not yet seen by the aftermath pass
    #[serde(skip)]
    pub fresh_death: bool,
}

impl Entity {
    pub fn spawn(id: EntityId, profile: &EntrantProfile, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            label: profile.label.clone(),
            role: Role::Entrant,
            pos,
            vel,
            radius: profile.stats.radius(),
            stats: profile.stats,
            stamina: profile.stats.max_stamina,
            alive: true,
            rotation: 0.0,
            hue: label_hue(&profile.label),
            ability: profile.ability.map(Ability::new),
            status: Status::default(),
            ko_timer: 0,
            death: None,
            fresh_death: false,
        }
    }

    #[inline]
    pub fn kind(&self) -> Option<AbilityKind> {
        self.ability.as_ref().map(Ability::kind)
    }

    #[inline]
    pub fn has(&self, kind: AbilityKind) -> bool {
        self.kind() == Some(kind)
    }

    #[inline]
    pub fn is_entrant(&self) -> bool {
        matches!(self.role, Role::Entrant)
    }

    #[inline]
    pub fn is_hidden(&self) -> bool {
        self.status.hidden_in.is_some()
    }

    /// Intangible (phased ghost): skips entity collisions and hazards
    pub fn is_phased(&self) -> bool {
        matches!(self.ability, Some(Ability::Ghost { phased, .. }) if phased > 0)
    }

    /// Alive and physically present in the arena
    #[inline]
    pub fn is_active(&self) -> bool {
        self.alive && !self.is_hidden()
    }

    /// Alive, present and touchable
    #[inline]
    pub fn is_tangible(&self) -> bool {
        self.is_active() && !self.is_phased()
    }

    #[inline]
    pub fn stamina_ratio(&self) -> f32 {
        if self.stats.max_stamina > 0.0 {
            (self.stamina / self.stats.max_stamina).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Reduce stamina (never below zero); death is decided separately
    pub fn lose_stamina(&mut self, amount: f32) {
        if !self.alive || amount <= 0.0 {
            return;
        }
        self.stamina = (self.stamina - amount).max(0.0);
    }

    /// Explicit heal, capped at max stamina; returns the amount restored
    pub fn heal(&mut self, amount: f32) -> f32 {
        if !self.alive || amount <= 0.0 {
            return 0.0;
        }
        let before = self.stamina;
        self.stamina = (self.stamina + amount).min(self.stats.max_stamina);
        self.stamina - before
    }

    /// Mark the entity dead: stamina pinned to zero, KO timer started,
    /// explosive charge armed for the aftermath pass
    pub fn kill(&mut self, cause: DeathCause) {
        if !self.alive {
            return;
        }
        self.alive = false;
        self.stamina = 0.0;
        self.ko_timer = KO_TICKS;
        self.death = Some(cause);
        self.fresh_death = true;
        self.status.link = None;
        if let Some(Ability::Explosive { armed }) = &mut self.ability {
            *armed = true;
        }
    }

    /// Bring a dead entity back (revive effects only)
    pub fn revive(&mut self, pos: Vec2, stamina: f32) {
        self.alive = true;
        self.pos = pos;
        self.vel = Vec2::ZERO;
        self.stamina = stamina.clamp(1.0, self.stats.max_stamina);
        self.ko_timer = 0;
        self.death = None;
        self.fresh_death = false;
        self.status = Status::default();
    }
}

/// Deterministic hue in [0, 360) from a label (FNV-1a)
pub fn label_hue(label: &str) -> f32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in label.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    (hash % 360) as f32
}

/// Smallest angular distance between two hues, in degrees
pub fn hue_distance(a: f32, b: f32) -> f32 {
    let d = (a - b).abs() % 360.0;
    d.min(360.0 - d)
}

/// Apply collision/effect damage, sharing it with a live tether partner
pub fn deal_damage(entities: &mut [Entity], target: EntityId, amount: f32) {
    if amount <= 0.0 {
        return;
    }
    let idx = target.index();
    if !entities[idx].alive {
        return;
    }
    let partner = entities[idx]
        .status
        .link
        .map(|l| l.partner)
        .filter(|p| entities[p.index()].alive);

    match partner {
        Some(partner) => {
            let half = amount * 0.5;
            entities[idx].lose_stamina(half);
            entities[partner.index()].lose_stamina(half);
        }
        None => entities[idx].lose_stamina(amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(label: &str, ability: Option<AbilityKind>) -> EntrantProfile {
        EntrantProfile {
            label: label.to_string(),
            stats: Stats {
                spin_power: 5.0,
                attack: 10.0,
                defense: 10.0,
                max_stamina: 100.0,
                weight: 10.0,
            },
            ability,
        }
    }

    #[test]
    fn test_radius_from_weight() {
        let p = profile("a", None);
        assert!((p.stats.radius() - 30.0).abs() < 1e-5);
    }

    #[test]
    fn test_kill_arms_explosive() {
        let mut e = Entity::spawn(EntityId(0), &profile("boom", Some(AbilityKind::Explosive)), Vec2::ZERO, Vec2::ZERO);
        e.kill(DeathCause::Exhausted);
        assert!(!e.alive);
        assert_eq!(e.stamina, 0.0);
        assert_eq!(e.ko_timer, KO_TICKS);
        assert_eq!(e.ability, Some(Ability::Explosive { armed: true }));
    }

    #[test]
    fn test_stamina_never_negative() {
        let mut e = Entity::spawn(EntityId(0), &profile("a", None), Vec2::ZERO, Vec2::ZERO);
        e.lose_stamina(1000.0);
        assert_eq!(e.stamina, 0.0);
        assert!(e.alive, "death is decided by the death check, not by damage");
    }

    #[test]
    fn test_tether_shares_damage() {
        let mut list = vec![
            Entity::spawn(EntityId(0), &profile("a", None), Vec2::ZERO, Vec2::ZERO),
            Entity::spawn(EntityId(1), &profile("b", None), Vec2::ZERO, Vec2::ZERO),
        ];
        list[0].status.link = Some(Link {
            partner: EntityId(1),
            ticks_left: 10,
        });
        deal_damage(&mut list, EntityId(0), 20.0);
        assert!((list[0].stamina - 90.0).abs() < 1e-5);
        assert!((list[1].stamina - 90.0).abs() < 1e-5);
    }

    #[test]
    fn test_hue_distance_wraps() {
        assert!((hue_distance(350.0, 10.0) - 20.0).abs() < 1e-5);
        assert!((hue_distance(0.0, 180.0) - 180.0).abs() < 1e-5);
    }
}
