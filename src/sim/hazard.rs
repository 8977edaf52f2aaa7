//! Ability-spawned hazards: projectiles, mines, shockwaves, beams, pulses
//! and lobbed bombs
//!
//! Hazards hold a weak reference to the entity that fired them (its id);
//! the owner may be dead by the time the hazard lands. Every hazard is
//! removed once its lifetime runs out, silently.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ability::{Ability, AbilityKind};
use super::collision::shielded_from;
use super::context::SimulationContext;
use super::entity::{Entity, EntityId, deal_damage};

pub const GUNNER_PERIOD: u32 = 90;
pub const TRAPPER_PERIOD: u32 = 150;
pub const SHOCKWAVE_PERIOD: u32 = 200;
pub const LASER_PERIOD: u32 = 180;
pub const PULSAR_PERIOD: u32 = 160;
pub const BOMBER_PERIOD: u32 = 220;

pub const PROJECTILE_SPEED: f32 = 12.0;
pub const PROJECTILE_LIFETIME: u32 = 90;
pub const PROJECTILE_DAMAGE: f32 = 6.0;
pub const PROJECTILE_KNOCKBACK: f32 = 4.0;
pub const PROJECTILE_RADIUS: f32 = 5.0;

pub const TRAP_LIFETIME: u32 = 400;
pub const TRAP_RADIUS: f32 = 60.0;
pub const TRAP_DAMAGE: f32 = 10.0;
pub const TRAP_KNOCKBACK: f32 = 3.0;

pub const WAVE_GROWTH: f32 = 4.0;
pub const WAVE_LIFETIME: u32 = 40;
pub const WAVE_DAMAGE: f32 = 5.0;
pub const WAVE_KNOCKBACK: f32 = 5.0;
/// Thickness of the expanding ring front
pub const WAVE_BAND: f32 = 10.0;

pub const BEAM_GROWTH: f32 = 25.0;
pub const BEAM_MAX_LENGTH: f32 = 400.0;
pub const BEAM_LIFETIME: u32 = 30;
pub const BEAM_DAMAGE: f32 = 7.0;
pub const BEAM_KNOCKBACK: f32 = 2.0;
pub const BEAM_HALF_WIDTH: f32 = 6.0;

pub const PULSE_RADIUS: f32 = 120.0;
pub const PULSE_DAMAGE: f32 = 6.0;
pub const PULSE_KNOCKBACK: f32 = 5.0;

pub const BOMB_FLIGHT_TICKS: u32 = 45;
pub const BOMB_FUSE_TICKS: u32 = 30;
pub const BOMB_RADIUS: f32 = 50.0;
pub const BOMB_DAMAGE: f32 = 12.0;
pub const BOMB_KNOCKBACK: f32 = 6.0;
/// Peak height of a lobbed bomb (presentation only)
pub const BOMB_APEX: f32 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HazardKind {
    Projectile,
    Trap,
    Wave,
    Beam,
    Pulse,
    Bomb,
}

/// How a hazard moves each tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    Static,
    Linear { vel: Vec2 },
    /// Parametric lob from `from` to `to`; intangible until it lands
    Arc {
        from: Vec2,
        to: Vec2,
        duration: u32,
        elapsed: u32,
    },
    /// Segment anchored at the hazard position, growing along `dir`
    Beam { dir: Vec2, length: f32 },
    /// Ring whose radius grows every tick
    Ring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    /// Assigned by [`SimulationContext::spawn_hazard`]
    pub id: u32,
    pub kind: HazardKind,
    pub owner: EntityId,
    pub pos: Vec2,
    pub radius: f32,
    pub motion: Motion,
    /// Ticks left; zero means expired
    pub lifetime: u32,
    pub damage: f32,
    pub knockback: f32,
    /// Entities already struck (only consulted when `tracks_hits`)
    pub hits: Vec<EntityId>,
    pub tracks_hits: bool,
}

impl Hazard {
    fn base(kind: HazardKind, owner: EntityId, pos: Vec2, radius: f32, motion: Motion, lifetime: u32) -> Self {
        Self {
            id: 0,
            kind,
            owner,
            pos,
            radius,
            motion,
            lifetime,
            damage: 0.0,
            knockback: 0.0,
            hits: Vec::new(),
            tracks_hits: false,
        }
    }

    pub fn projectile(owner: EntityId, pos: Vec2, dir: Vec2) -> Self {
        let vel = dir.normalize_or(Vec2::X) * PROJECTILE_SPEED;
        Self {
            damage: PROJECTILE_DAMAGE,
            knockback: PROJECTILE_KNOCKBACK,
            ..Self::base(
                HazardKind::Projectile,
                owner,
                pos,
                PROJECTILE_RADIUS,
                Motion::Linear { vel },
                PROJECTILE_LIFETIME,
            )
        }
    }

    pub fn trap(owner: EntityId, pos: Vec2) -> Self {
        Self {
            damage: TRAP_DAMAGE,
            knockback: TRAP_KNOCKBACK,
            ..Self::base(HazardKind::Trap, owner, pos, TRAP_RADIUS, Motion::Static, TRAP_LIFETIME)
        }
    }

    pub fn wave(owner: EntityId, pos: Vec2) -> Self {
        Self {
            damage: WAVE_DAMAGE,
            knockback: WAVE_KNOCKBACK,
            tracks_hits: true,
            ..Self::base(HazardKind::Wave, owner, pos, 0.0, Motion::Ring, WAVE_LIFETIME)
        }
    }

    pub fn beam(owner: EntityId, pos: Vec2, dir: Vec2) -> Self {
        let motion = Motion::Beam {
            dir: dir.normalize_or(Vec2::X),
            length: 0.0,
        };
        Self {
            damage: BEAM_DAMAGE,
            knockback: BEAM_KNOCKBACK,
            tracks_hits: true,
            ..Self::base(HazardKind::Beam, owner, pos, BEAM_HALF_WIDTH, motion, BEAM_LIFETIME)
        }
    }

    pub fn pulse(owner: EntityId, pos: Vec2) -> Self {
        Self {
            damage: PULSE_DAMAGE,
            knockback: PULSE_KNOCKBACK,
            ..Self::base(HazardKind::Pulse, owner, pos, PULSE_RADIUS, Motion::Static, 1)
        }
    }

    pub fn bomb(owner: EntityId, from: Vec2, to: Vec2) -> Self {
        let motion = Motion::Arc {
            from,
            to,
            duration: BOMB_FLIGHT_TICKS,
            elapsed: 0,
        };
        // Once landed it sits as an area trap until the fuse runs out
        Self {
            damage: BOMB_DAMAGE,
            knockback: BOMB_KNOCKBACK,
            tracks_hits: true,
            ..Self::base(
                HazardKind::Bomb,
                owner,
                from,
                BOMB_RADIUS,
                motion,
                BOMB_FLIGHT_TICKS + BOMB_FUSE_TICKS,
            )
        }
    }

    /// Still in the air (lobbed hazards only)
    pub fn airborne(&self) -> bool {
        matches!(self.motion, Motion::Arc { duration, elapsed, .. } if elapsed < duration)
    }

    /// Height above the floor for presentation
    pub fn altitude(&self) -> f32 {
        match self.motion {
            Motion::Arc { duration, elapsed, .. } if elapsed < duration => {
                let t = elapsed as f32 / duration.max(1) as f32;
                4.0 * BOMB_APEX * t * (1.0 - t)
            }
            _ => 0.0,
        }
    }

    /// Far end of a beam segment
    pub fn beam_end(&self) -> Option<Vec2> {
        match self.motion {
            Motion::Beam { dir, length } => Some(self.pos + dir * length),
            _ => None,
        }
    }

    /// Apply one tick of motion
    fn advance(&mut self) {
        match &mut self.motion {
            Motion::Static => {}
            Motion::Linear { vel } => self.pos += *vel,
            Motion::Arc {
                from,
                to,
                duration,
                elapsed,
            } => {
                if *elapsed < *duration {
                    *elapsed += 1;
                    let t = *elapsed as f32 / (*duration).max(1) as f32;
                    self.pos = from.lerp(*to, t);
                }
            }
            Motion::Beam { length, .. } => *length = (*length + BEAM_GROWTH).min(BEAM_MAX_LENGTH),
            Motion::Ring => self.radius += WAVE_GROWTH,
        }
    }

    /// Whether this hazard's shape touches an entity
    fn touches(&self, entity: &Entity) -> bool {
        match self.motion {
            Motion::Ring => {
                let dist = entity.pos.distance(self.pos);
                (dist - self.radius).abs() <= entity.radius + WAVE_BAND * 0.5
            }
            Motion::Beam { dir, length } => {
                let end = self.pos + dir * length;
                distance_to_segment(entity.pos, self.pos, end) <= entity.radius + self.radius
            }
            _ => entity.pos.distance(self.pos) <= entity.radius + self.radius,
        }
    }

    /// Direction a struck entity is pushed
    fn push_direction(&self, entity: &Entity) -> Vec2 {
        match self.motion {
            Motion::Linear { vel } => vel.normalize_or(Vec2::X),
            Motion::Beam { dir, .. } => {
                let along = (entity.pos - self.pos).dot(dir);
                (entity.pos - (self.pos + dir * along)).normalize_or(dir.perp())
            }
            _ => (entity.pos - self.pos).normalize_or(Vec2::X),
        }
    }

    /// Single-contact hazards are spent by their first hit
    fn consumed_on_hit(&self) -> bool {
        matches!(self.kind, HazardKind::Projectile | HazardKind::Trap)
    }
}

/// Shortest distance from `p` to the segment `a`-`b`
pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Advance every live hazard one tick, apply hits, drop the expired ones
pub fn update_hazards(entities: &mut [Entity], ctx: &mut SimulationContext) {
    let mut hazards = std::mem::take(&mut ctx.hazards);

    for hazard in hazards.iter_mut() {
        hazard.advance();
        if let Motion::Linear { .. } = hazard.motion {
            if !ctx.arena.contains(hazard.pos) {
                hazard.lifetime = 0;
                continue;
            }
        }
        if !hazard.airborne() {
            strike(hazard, entities);
        }
        hazard.lifetime = hazard.lifetime.saturating_sub(1);
    }

    hazards.retain(|h| h.lifetime > 0);
    // Anything spawned while we held the list goes after the survivors
    hazards.append(&mut ctx.hazards);
    ctx.hazards = hazards;
}

fn strike(hazard: &mut Hazard, entities: &mut [Entity]) {
    for idx in 0..entities.len() {
        if hazard.lifetime == 0 {
            return;
        }
        let target = &entities[idx];
        if target.id == hazard.owner || !target.is_tangible() {
            continue;
        }
        if hazard.tracks_hits && hazard.hits.contains(&target.id) {
            continue;
        }
        if !hazard.touches(target) {
            continue;
        }
        let shielded = entities
            .get(hazard.owner.index())
            .is_some_and(|owner| shielded_from(target, owner));
        if shielded {
            continue;
        }

        if hazard.kind == HazardKind::Projectile && target.has(AbilityKind::Reflector) {
            if let Motion::Linear { vel } = &mut hazard.motion {
                *vel = -*vel;
            }
            hazard.owner = target.id;
            log::debug!("{} reflects projectile {}", target.label, hazard.id);
            continue;
        }

        let push = hazard.push_direction(target) * hazard.knockback;
        let id = target.id;
        if !matches!(entities[idx].ability, Some(Ability::Juggernaut)) {
            entities[idx].vel += push;
        }
        deal_damage(entities, id, hazard.damage);

        if hazard.tracks_hits {
            hazard.hits.push(id);
        }
        if hazard.consumed_on_hit() {
            hazard.lifetime = 0;
        }
    }
    // Pulses strike once, everyone in range, then vanish
    if hazard.kind == HazardKind::Pulse {
        hazard.lifetime = 0;
    }
}

/// Serializable view of a hazard for presentation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HazardSnapshot {
    pub id: u32,
    pub kind: HazardKind,
    pub pos: Vec2,
    pub radius: f32,
    pub altitude: f32,
    pub beam_end: Option<Vec2>,
    pub lifetime: u32,
}

impl From<&Hazard> for HazardSnapshot {
    fn from(h: &Hazard) -> Self {
        Self {
            id: h.id,
            kind: h.kind,
            pos: h.pos,
            radius: h.radius,
            altitude: h.altitude(),
            beam_end: h.beam_end(),
            lifetime: h.lifetime,
        }
    }
}
