//! Arena geometry, boundary forces and ring-out rules
//!
//! Two shapes:
//! - Circle: a bowl that pulls spinners toward the center; crossing the rim
//!   is a ring-out.
//! - Rectangle: the finals pit. Top/bottom are elastic walls, left/right are
//!   ring-out edges, optional pinball bumpers sit in the middle.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::ability::{Ability, AbilityKind, GRAVITY_BOWL_FACTOR};
use super::collision::reflect_velocity;
use super::entity::Entity;
use crate::consts::*;
use crate::polar_to_cartesian;

/// A round pinball obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bumper {
    pub pos: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArenaShape {
    Circle {
        radius: f32,
        /// Bowl slope strength
        slope: f32,
    },
    Rectangle {
        width: f32,
        height: f32,
        bumpers: Vec<Bumper>,
    },
}

/// Result of the boundary check for one entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Boundary {
    Inside,
    /// Would have rung out but an ability bounced it back in
    Saved {
        ability: AbilityKind,
        saves_left: Option<u8>,
    },
    RingOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub center: Vec2,
    pub shape: ArenaShape,
}

impl Default for Arena {
    fn default() -> Self {
        Self::circle(Vec2::ZERO, ARENA_RADIUS, ARENA_SLOPE)
    }
}

impl Arena {
    pub fn circle(center: Vec2, radius: f32, slope: f32) -> Self {
        Self {
            center,
            shape: ArenaShape::Circle { radius, slope },
        }
    }

    pub fn rectangle(center: Vec2, width: f32, height: f32, bumpers: Vec<Bumper>) -> Self {
        Self {
            center,
            shape: ArenaShape::Rectangle {
                width,
                height,
                bumpers,
            },
        }
    }

    /// Finals pit with the standard bumper layout (one central post, two flankers)
    pub fn finals_pit(center: Vec2, width: f32, height: f32) -> Self {
        let bumpers = vec![
            Bumper {
                pos: center,
                radius: 30.0,
            },
            Bumper {
                pos: center + Vec2::new(-width * 0.15, 0.0),
                radius: 25.0,
            },
            Bumper {
                pos: center + Vec2::new(width * 0.15, 0.0),
                radius: 25.0,
            },
        ];
        Self::rectangle(center, width, height, bumpers)
    }

    /// Whether a point lies inside the playable area
    pub fn contains(&self, pos: Vec2) -> bool {
        let offset = pos - self.center;
        match &self.shape {
            ArenaShape::Circle { radius, .. } => offset.length() <= *radius,
            ArenaShape::Rectangle { width, height, .. } => {
                offset.x.abs() <= width / 2.0 && offset.y.abs() <= height / 2.0
            }
        }
    }

    /// Spawn transforms (position, velocity) for `count` spinners
    pub fn spawn_points(&self, count: usize, rng: &mut dyn RngCore) -> Vec<(Vec2, Vec2)> {
        if count == 0 {
            return Vec::new();
        }
        let offset = rng.random_range(0.0..TAU);
        (0..count)
            .map(|i| {
                let theta = offset + TAU * i as f32 / count as f32;
                let pos = match &self.shape {
                    ArenaShape::Circle { radius, .. } => {
                        let r = radius * 0.55 + rng.random_range(-20.0..20.0);
                        self.center + polar_to_cartesian(r, theta)
                    }
                    ArenaShape::Rectangle { width, height, .. } => {
                        self.center
                            + Vec2::new(width * 0.35 * theta.cos(), height * 0.3 * theta.sin())
                    }
                };
                let inward = (self.center - pos).normalize_or(Vec2::X);
                let heading = Vec2::from_angle(rng.random_range(-0.6..0.6)).rotate(inward);
                let speed = rng.random_range(3.0..6.0);
                (pos, heading * speed)
            })
            .collect()
    }

    /// Uniform-ish random point well inside the arena (teleports, revivals)
    pub fn random_interior_point(&self, rng: &mut dyn RngCore) -> Vec2 {
        match &self.shape {
            ArenaShape::Circle { radius, .. } => {
                let r = radius * 0.7 * rng.random::<f32>().sqrt();
                let theta = rng.random_range(0.0..TAU);
                self.center + polar_to_cartesian(r, theta)
            }
            ArenaShape::Rectangle { width, height, .. } => {
                let x = rng.random_range(-0.35..0.35) * width;
                let y = rng.random_range(-0.35..0.35) * height;
                self.center + Vec2::new(x, y)
            }
        }
    }

    /// Shape forces: bowl pull and orbit nudge (circle), centering pull (both)
    pub fn apply_forces(&self, entity: &mut Entity) {
        if let ArenaShape::Circle { radius, slope } = self.shape {
            let offset = entity.pos - self.center;
            let dist = offset.length();
            if dist > CONTACT_EPSILON {
                let radial = offset / dist;
                let normalized = dist / radius;
                let mut pull = slope * normalized.powf(BOWL_EXPONENT);
                if matches!(entity.ability, Some(Ability::Gravity)) {
                    pull *= GRAVITY_BOWL_FACTOR;
                }
                entity.vel -= radial * pull;

                // Nudge fast spinners along their existing orbit direction
                if entity.vel.length() > ORBIT_MIN_SPEED {
                    let tangent = radial.perp();
                    let sign = radial.perp_dot(entity.vel).signum();
                    entity.vel += tangent * sign * ORBIT_NUDGE * slope;
                }
            }
        }

        let dx = entity.pos.x - self.center.x;
        if dx.abs() > 1.0 {
            entity.vel.x -= dx.signum() * CENTER_PULL;
        }
    }

    /// Walls, bumpers and ring-out check. Kills the entity on a ring-out.
    ///
    /// `anchor_alive` tells whether a SoulBound holder's anchor still lives.
    pub fn enforce_bounds(&self, entity: &mut Entity, anchor_alive: bool) -> Boundary {
        match &self.shape {
            ArenaShape::Circle { radius, .. } => {
                let offset = entity.pos - self.center;
                let dist = offset.length();
                if dist <= *radius {
                    return Boundary::Inside;
                }
                match edge_save(entity, anchor_alive) {
                    Some(saved) => {
                        let radial = offset.normalize_or(Vec2::X);
                        entity.pos = self.center + radial * (radius - entity.radius).max(0.0);
                        entity.vel = -entity.vel * EDGE_SAVE_DAMPING;
                        saved
                    }
                    None => {
                        entity.kill(super::entity::DeathCause::RingOut);
                        Boundary::RingOut
                    }
                }
            }
            ArenaShape::Rectangle {
                width,
                height,
                bumpers,
            } => {
                let half = Vec2::new(width / 2.0, height / 2.0);
                let min = self.center - half;
                let max = self.center + half;

                // Hard top/bottom walls
                if entity.pos.y - entity.radius < min.y {
                    entity.pos.y = min.y + entity.radius;
                    entity.vel.y = entity.vel.y.abs() * WALL_RESTITUTION;
                } else if entity.pos.y + entity.radius > max.y {
                    entity.pos.y = max.y - entity.radius;
                    entity.vel.y = -entity.vel.y.abs() * WALL_RESTITUTION;
                }

                for bumper in bumpers {
                    bounce_off_bumper(entity, bumper);
                }

                // Left/right are ring-out edges
                if entity.pos.x >= min.x && entity.pos.x <= max.x {
                    return Boundary::Inside;
                }
                match edge_save(entity, anchor_alive) {
                    Some(saved) => {
                        entity.pos.x = if entity.pos.x < min.x {
                            min.x + entity.radius
                        } else {
                            max.x - entity.radius
                        };
                        entity.vel = -entity.vel * EDGE_SAVE_DAMPING;
                        saved
                    }
                    None => {
                        entity.kill(super::entity::DeathCause::RingOut);
                        Boundary::RingOut
                    }
                }
            }
        }
    }
}

/// Consume a save if the entity's ability grants one
fn edge_save(entity: &mut Entity, anchor_alive: bool) -> Option<Boundary> {
    match &mut entity.ability {
        Some(Ability::Rebound { saves_left }) if *saves_left > 0 => {
            *saves_left -= 1;
            Some(Boundary::Saved {
                ability: AbilityKind::Rebound,
                saves_left: Some(*saves_left),
            })
        }
        Some(Ability::SoulBound { anchor: Some(_) }) if anchor_alive => {
            entity.stamina = entity.stamina.max(1.0);
            Some(Boundary::Saved {
                ability: AbilityKind::SoulBound,
                saves_left: None,
            })
        }
        _ => None,
    }
}

fn bounce_off_bumper(entity: &mut Entity, bumper: &Bumper) {
    let offset = entity.pos - bumper.pos;
    let min_dist = bumper.radius + entity.radius;
    let dist = offset.length();
    if dist >= min_dist {
        return;
    }
    let normal = if dist > CONTACT_EPSILON {
        offset / dist
    } else {
        Vec2::X
    };
    entity.pos = bumper.pos + normal * min_dist;
    if entity.vel.dot(normal) < 0.0 {
        entity.vel = reflect_velocity(entity.vel, normal);
    }
    entity.vel += normal * BUMPER_KICK;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{EntityId, EntrantProfile, Stats};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn spinner(ability: Option<AbilityKind>, pos: Vec2, vel: Vec2) -> Entity {
        let profile = EntrantProfile {
            label: "test".into(),
            stats: Stats {
                spin_power: 5.0,
                attack: 10.0,
                defense: 10.0,
                max_stamina: 100.0,
                weight: 10.0,
            },
            ability,
        };
        Entity::spawn(EntityId(0), &profile, pos, vel)
    }

    #[test]
    fn test_bowl_pulls_toward_center() {
        let arena = Arena::default();
        let mut e = spinner(None, Vec2::new(0.0, 400.0), Vec2::ZERO);
        arena.apply_forces(&mut e);
        assert!(e.vel.y < 0.0);
    }

    #[test]
    fn test_gravity_triples_bowl() {
        let arena = Arena::default();
        let mut plain = spinner(None, Vec2::new(0.0, 400.0), Vec2::ZERO);
        let mut heavy = spinner(Some(AbilityKind::Gravity), Vec2::new(0.0, 400.0), Vec2::ZERO);
        arena.apply_forces(&mut plain);
        arena.apply_forces(&mut heavy);
        assert!((heavy.vel.y - plain.vel.y * 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_orbit_nudge_preserves_spin_direction() {
        let arena = Arena::default();
        // On the +x axis moving counter-clockwise (+y) fast
        let mut e = spinner(None, Vec2::new(300.0, 0.0), Vec2::new(0.0, 10.0));
        let before = e.vel.y;
        arena.apply_forces(&mut e);
        assert!(e.vel.y > before);

        let mut e = spinner(None, Vec2::new(300.0, 0.0), Vec2::new(0.0, -10.0));
        let before = e.vel.y;
        arena.apply_forces(&mut e);
        assert!(e.vel.y < before);
    }

    #[test]
    fn test_ring_out_kills() {
        let arena = Arena::default();
        let mut e = spinner(None, Vec2::new(510.0, 0.0), Vec2::new(5.0, 0.0));
        assert_eq!(arena.enforce_bounds(&mut e, false), Boundary::RingOut);
        assert!(!e.alive);
    }

    #[test]
    fn test_rebound_saves_twice_then_dies() {
        let arena = Arena::default();
        let mut e = spinner(Some(AbilityKind::Rebound), Vec2::new(510.0, 0.0), Vec2::new(5.0, 0.0));
        for expected_left in [1u8, 0] {
            e.pos = Vec2::new(510.0, 0.0);
            e.vel = Vec2::new(5.0, 0.0);
            let outcome = arena.enforce_bounds(&mut e, false);
            assert_eq!(
                outcome,
                Boundary::Saved {
                    ability: AbilityKind::Rebound,
                    saves_left: Some(expected_left)
                }
            );
            assert!(e.alive);
            assert!(e.vel.x < 0.0 && e.vel.x.abs() < 5.0);
            assert!(arena.contains(e.pos));
        }
        e.pos = Vec2::new(510.0, 0.0);
        assert_eq!(arena.enforce_bounds(&mut e, false), Boundary::RingOut);
    }

    #[test]
    fn test_soulbound_needs_live_anchor() {
        let arena = Arena::default();
        let mut e = spinner(Some(AbilityKind::SoulBound), Vec2::new(510.0, 0.0), Vec2::X);
        e.ability = Some(Ability::SoulBound {
            anchor: Some(EntityId(1)),
        });
        e.stamina = 0.0;
        assert!(matches!(arena.enforce_bounds(&mut e, true), Boundary::Saved { .. }));
        assert_eq!(e.stamina, 1.0);

        e.pos = Vec2::new(510.0, 0.0);
        assert_eq!(arena.enforce_bounds(&mut e, false), Boundary::RingOut);
    }

    #[test]
    fn test_rectangle_walls_reflect() {
        let arena = Arena::finals_pit(Vec2::ZERO, FINALS_WIDTH, FINALS_HEIGHT);
        let mut e = spinner(None, Vec2::new(-300.0, 295.0), Vec2::new(0.0, 10.0));
        assert_eq!(arena.enforce_bounds(&mut e, false), Boundary::Inside);
        assert!((e.vel.y + 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_rectangle_sides_ring_out() {
        let arena = Arena::finals_pit(Vec2::ZERO, FINALS_WIDTH, FINALS_HEIGHT);
        let mut e = spinner(None, Vec2::new(460.0, 0.0), Vec2::new(3.0, 0.0));
        assert_eq!(arena.enforce_bounds(&mut e, false), Boundary::RingOut);
    }

    #[test]
    fn test_bumper_kicks_away() {
        let arena = Arena::finals_pit(Vec2::ZERO, FINALS_WIDTH, FINALS_HEIGHT);
        let mut e = spinner(None, Vec2::new(0.0, 50.0), Vec2::new(0.0, -5.0));
        arena.enforce_bounds(&mut e, false);
        assert!(e.vel.y > 0.0);
        assert!(e.pos.y >= 60.0 - 1e-3);
    }

    #[test]
    fn test_spawn_points_inside() {
        let mut rng = Pcg32::seed_from_u64(7);
        for arena in [
            Arena::default(),
            Arena::finals_pit(Vec2::ZERO, FINALS_WIDTH, FINALS_HEIGHT),
        ] {
            let points = arena.spawn_points(11, &mut rng);
            assert_eq!(points.len(), 11);
            for (pos, _) in points {
                assert!(arena.contains(pos));
            }
        }
    }
}
