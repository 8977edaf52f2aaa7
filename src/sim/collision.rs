//! Collision detection and base response between spinners
//!
//! Detection is a plain O(n²) circle-overlap sweep; entity counts per heat are
//! small. Resolution runs the base impulse model and hands the modifier
//! stages in [`super::pipeline`] a chance to rewrite the outcome before any
//! velocity or stamina is touched.

use glam::Vec2;

use super::ability::{Ability, AbilityKind, SLICE_CHANCE, SLICE_DAMAGE};
use super::context::SimulationContext;
use super::entity::{Entity, EntityId, Stats, deal_damage, hue_distance};
use super::events::BattleEvent;
use super::pipeline::{self, Exchange};
use crate::consts::*;

/// Hue window inside which a Prism holder ignores an opponent's ability
pub const PRISM_HUE_WINDOW: f32 = 60.0;

/// Result of an overlap test between two spinners
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// Unit vector from the first entity toward the second
    pub normal: Vec2,
    /// Overlap depth (positive when touching)
    pub penetration: f32,
    /// Closing speed along the normal (zero when separating)
    pub relative_speed: f32,
}

/// Overlap test; coincident centers get the +X direction instead of a NaN
pub fn contact(a: &Entity, b: &Entity) -> Option<Contact> {
    let offset = b.pos - a.pos;
    let dist = offset.length();
    let penetration = a.radius + b.radius - dist;
    if penetration <= 0.0 {
        return None;
    }
    let normal = if dist > CONTACT_EPSILON {
        offset / dist
    } else {
        Vec2::X
    };
    Some(Contact {
        normal,
        penetration,
        relative_speed: (a.vel - b.vel).dot(normal).max(0.0),
    })
}

/// All overlapping pairs of tangible spinners, in stable index order
pub fn detect_pairs(entities: &[Entity]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..entities.len() {
        if !entities[i].is_tangible() {
            continue;
        }
        for j in (i + 1)..entities.len() {
            if !entities[j].is_tangible() {
                continue;
            }
            if contact(&entities[i], &entities[j]).is_some() {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Base impulse for a collision
pub fn base_impulse(relative_speed: f32, attack_a: f32, attack_b: f32) -> f32 {
    IMPULSE_BASE + relative_speed * IMPULSE_PER_SPEED + (attack_a + attack_b) * IMPULSE_PER_ATTACK
}

/// Split an impulse inversely by weight: (share received by a, share received by b)
pub fn impulse_shares(impulse: f32, weight_a: f32, weight_b: f32) -> (f32, f32) {
    let total = weight_a + weight_b;
    if total <= 0.0 {
        return (impulse * 0.5, impulse * 0.5);
    }
    (impulse * weight_b / total, impulse * weight_a / total)
}

/// Stamina lost by `defender` when hit by `attacker` before any modifiers
pub fn collision_damage(attacker: &Stats, defender: &Stats, relative_speed: f32) -> f32 {
    let raw = (attacker.attack - DEFENSE_FACTOR * defender.defense).max(MIN_DAMAGE);
    raw * (relative_speed / DAMAGE_REFERENCE_SPEED).clamp(0.5, 2.0)
}

/// Whether `target`'s ability shields it from `source`'s ability effects
pub fn shielded_from(target: &Entity, source: &Entity) -> bool {
    match target.ability {
        Some(Ability::Immune) => true,
        Some(Ability::Prism) => hue_distance(target.hue, source.hue) < PRISM_HUE_WINDOW,
        _ => false,
    }
}

/// Push two overlapping circles apart along the normal, heavier one moves less
pub fn separate(a: &mut Entity, b: &mut Entity, contact: &Contact) {
    let (move_a, move_b) = impulse_shares(contact.penetration, a.stats.weight, b.stats.weight);
    a.pos -= contact.normal * move_a;
    b.pos += contact.normal * move_b;
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Mutable access to two distinct entities
fn pair_mut(entities: &mut [Entity], i: usize, j: usize) -> (&mut Entity, &mut Entity) {
    debug_assert!(i < j, "pair indices must be ordered");
    let (left, right) = entities.split_at_mut(j);
    (&mut left[i], &mut right[0])
}

/// Resolve one colliding pair: pass-through check, separation, base impulse,
/// modifier pipeline, then knockback and damage.
pub fn resolve_pair(entities: &mut [Entity], i: usize, j: usize, ctx: &mut SimulationContext) {
    debug_assert!(
        entities[i].alive && entities[j].alive,
        "dead entity offered as a collision target"
    );
    let Some(contact) = contact(&entities[i], &entities[j]) else {
        return;
    };

    if slice_through(entities, i, j, ctx) {
        return;
    }

    {
        let (a, b) = pair_mut(entities, i, j);
        separate(a, b, &contact);
    }

    let (a, b) = (&entities[i], &entities[j]);
    let impulse = base_impulse(contact.relative_speed, a.stats.attack, b.stats.attack);
    let shares = impulse_shares(impulse, a.stats.weight, b.stats.weight);
    let damage = [
        collision_damage(&b.stats, &a.stats, contact.relative_speed),
        collision_damage(&a.stats, &b.stats, contact.relative_speed),
    ];

    let mut exchange = Exchange::new(
        [EntityId(i as u32), EntityId(j as u32)],
        contact,
        [shares.0, shares.1],
        damage,
    );
    for stage in pipeline::PIPELINE.iter() {
        (stage.run)(&mut exchange, entities, ctx);
    }
    let outcome = exchange.fold();

    let normal = exchange.contact.normal;
    entities[i].vel -= normal * outcome.knockback[0];
    entities[j].vel += normal * outcome.knockback[1];
    deal_damage(entities, EntityId(i as u32), outcome.damage[0]);
    deal_damage(entities, EntityId(j as u32), outcome.damage[1]);

    pipeline::finish(&mut exchange, entities, ctx);

    ctx.emit(BattleEvent::Collision {
        a: entities[i].label.clone(),
        b: entities[j].label.clone(),
        intensity: contact.relative_speed,
    });
}

/// Slice holders may cut straight through: direct damage, no separation, no knockback
fn slice_through(entities: &mut [Entity], i: usize, j: usize, ctx: &mut SimulationContext) -> bool {
    let mut sliced = false;
    for (holder, target) in [(i, j), (j, i)] {
        if !entities[holder].has(AbilityKind::Slice) || !ctx.roll(SLICE_CHANCE) {
            continue;
        }
        sliced = true;
        if !shielded_from(&entities[target], &entities[holder]) {
            deal_damage(entities, EntityId(target as u32), SLICE_DAMAGE);
        }
        let text = format!("slices through {}", entities[target].label);
        ctx.emit(BattleEvent::triggered(
            &entities[holder].label,
            AbilityKind::Slice,
            text,
        ));
    }
    sliced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arena::Arena;
    use crate::sim::entity::EntrantProfile;

    fn stats() -> Stats {
        Stats {
            spin_power: 5.0,
            attack: 10.0,
            defense: 10.0,
            max_stamina: 100.0,
            weight: 10.0,
        }
    }

    fn spinner(id: u32, pos: Vec2, vel: Vec2) -> Entity {
        let profile = EntrantProfile {
            label: format!("s{id}"),
            stats: stats(),
            ability: None,
        };
        Entity::spawn(EntityId(id), &profile, pos, vel)
    }

    #[test]
    fn test_contact_miss_and_hit() {
        let a = spinner(0, Vec2::ZERO, Vec2::ZERO);
        let b = spinner(1, Vec2::new(100.0, 0.0), Vec2::ZERO);
        assert!(contact(&a, &b).is_none());

        let b = spinner(1, Vec2::new(50.0, 0.0), Vec2::ZERO);
        let c = contact(&a, &b).expect("overlapping");
        assert!((c.penetration - 10.0).abs() < 1e-5);
        assert!((c.normal - Vec2::X).length() < 1e-6);
    }

    #[test]
    fn test_coincident_centers_use_epsilon_direction() {
        let a = spinner(0, Vec2::new(3.0, 3.0), Vec2::ZERO);
        let b = spinner(1, Vec2::new(3.0, 3.0), Vec2::ZERO);
        let c = contact(&a, &b).expect("overlapping");
        assert!(c.normal.is_finite());
        assert!((c.normal.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_relative_speed_is_closing_speed_along_normal() {
        let a = spinner(0, Vec2::ZERO, Vec2::new(4.0, 9.0));
        let b = spinner(1, Vec2::new(50.0, 0.0), Vec2::new(-2.0, -9.0));
        let c = contact(&a, &b).expect("overlapping");
        assert!((c.relative_speed - 6.0).abs() < 1e-5, "tangential part ignored");

        let apart = spinner(1, Vec2::new(50.0, 0.0), Vec2::new(8.0, 0.0));
        let c = contact(&a, &apart).expect("overlapping");
        assert_eq!(c.relative_speed, 0.0);
    }

    #[test]
    fn test_heavier_receives_less() {
        let (light, heavy) = impulse_shares(10.0, 5.0, 15.0);
        assert!(light > heavy);
        assert!((light + heavy - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_damage_floor() {
        let weak = Stats {
            attack: 1.0,
            ..stats()
        };
        let tough = Stats {
            defense: 15.0,
            ..stats()
        };
        assert!((collision_damage(&weak, &tough, 10.0) - MIN_DAMAGE).abs() < 1e-6);
    }

    #[test]
    fn test_head_on_collision_bounces_apart() {
        let mut ctx = SimulationContext::seeded(1, Arena::default());
        let mut list = vec![
            spinner(0, Vec2::new(-29.0, 0.0), Vec2::new(10.0, 0.0)),
            spinner(1, Vec2::new(29.0, 0.0), Vec2::new(-10.0, 0.0)),
        ];
        resolve_pair(&mut list, 0, 1, &mut ctx);

        let n = Vec2::X;
        let va = list[0].vel.dot(n);
        let vb = list[1].vel.dot(n);
        assert!(va < 0.0 && vb > 0.0, "opposite signs along the normal");
        assert!(list[0].vel.length() < 10.0 && list[1].vel.length() < 10.0);

        let expected = collision_damage(&stats(), &stats(), 20.0);
        assert!((list[0].stamina - (100.0 - expected)).abs() < 1e-4);
        assert!((list[1].stamina - (100.0 - expected)).abs() < 1e-4);
        assert!(contact(&list[0], &list[1]).is_none(), "overlap removed");
    }

    #[test]
    fn test_reflect_velocity() {
        let velocity = Vec2::new(100.0, 0.0);
        let normal = Vec2::new(-1.0, 0.0);

        let reflected = reflect_velocity(velocity, normal);
        assert!((reflected.x - (-100.0)).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }
}
