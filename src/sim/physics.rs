//! Per-entity physics step: integrate, friction, speed cap, decay, statuses
//! and the death check

use super::ability::*;
use super::entity::{DeathCause, Entity};
use crate::consts::*;
use crate::normalize_angle;

/// Whether a SoulBound holder at `idx` is currently held alive by its anchor
///
/// The anchor must be alive, must not be the holder itself and must not be a
/// SoulBound holder too (no mutual immortality loops).
pub fn anchor_alive(entities: &[Entity], idx: usize) -> bool {
    let Some(Ability::SoulBound { anchor: Some(anchor) }) = entities[idx].ability else {
        return false;
    };
    if anchor.index() == idx {
        return false;
    }
    entities
        .get(anchor.index())
        .is_some_and(|a| a.alive && !a.has(AbilityKind::SoulBound))
}

/// Advance one entity by one tick
pub fn step_entity(entity: &mut Entity, anchor_alive: bool) {
    if !entity.alive {
        return;
    }
    let hyper = entity.has(AbilityKind::Hyperdrive);

    // Hidden parasites ride along with their host instead of moving
    if !entity.is_hidden() {
        let move_factor = if hyper { HYPERDRIVE_MOVE_FACTOR } else { 1.0 };
        entity.pos += entity.vel * move_factor;

        let mut friction = if hyper {
            HYPERDRIVE_FRICTION
        } else {
            BASE_FRICTION - FATIGUE_FRICTION * (1.0 - entity.stamina_ratio())
        };
        if entity.status.chill_ticks > 0 {
            friction *= CHILL_FRICTION;
        }
        entity.vel *= friction;

        let max_speed = if hyper {
            MAX_SPEED * HYPERDRIVE_SPEED_FACTOR
        } else {
            MAX_SPEED
        };
        entity.vel = entity.vel.clamp_length_max(max_speed);
        entity.rotation = normalize_angle(entity.rotation + entity.stats.spin_power * SPIN_RATE);
    }

    entity.lose_stamina(STAMINA_DECAY);
    tick_status(entity);
    death_check(entity, anchor_alive);
}

fn tick_status(entity: &mut Entity) {
    let status = &mut entity.status;
    let mut poison = 0.0;
    if status.poison_ticks > 0 {
        status.poison_ticks -= 1;
        poison = status.poison_rate;
    }
    status.chill_ticks = status.chill_ticks.saturating_sub(1);
    if let Some(link) = &mut status.link {
        link.ticks_left = link.ticks_left.saturating_sub(1);
        if link.ticks_left == 0 {
            status.link = None;
        }
    }
    entity.lose_stamina(poison);
}

/// Kill on empty stamina unless a live SoulBound anchor keeps it at 1
pub fn death_check(entity: &mut Entity, anchor_alive: bool) {
    if !entity.alive || entity.stamina > 0.0 {
        return;
    }
    if anchor_alive {
        entity.stamina = 1.0;
    } else {
        entity.kill(DeathCause::Exhausted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{EntityId, EntrantProfile, Link, Stats};
    use glam::Vec2;

    fn spinner(id: u32, ability: Option<AbilityKind>) -> Entity {
        let profile = EntrantProfile {
            label: format!("s{id}"),
            stats: Stats {
                spin_power: 5.0,
                attack: 10.0,
                defense: 10.0,
                max_stamina: 100.0,
                weight: 10.0,
            },
            ability,
        };
        Entity::spawn(EntityId(id), &profile, Vec2::ZERO, Vec2::new(5.0, 0.0))
    }

    #[test]
    fn test_step_moves_and_decays() {
        let mut e = spinner(0, None);
        step_entity(&mut e, false);
        assert!((e.pos.x - 5.0).abs() < 1e-5);
        assert!((e.vel.x - 5.0 * BASE_FRICTION).abs() < 1e-5);
        assert!((e.stamina - (100.0 - STAMINA_DECAY)).abs() < 1e-5);
    }

    #[test]
    fn test_tired_spinners_slow_faster() {
        let mut fresh = spinner(0, None);
        let mut tired = spinner(1, None);
        tired.stamina = 10.0;
        step_entity(&mut fresh, false);
        step_entity(&mut tired, false);
        assert!(tired.vel.x < fresh.vel.x);
    }

    #[test]
    fn test_speed_cap() {
        let mut e = spinner(0, None);
        e.vel = Vec2::new(100.0, 0.0);
        step_entity(&mut e, false);
        assert!(e.vel.length() <= MAX_SPEED + 1e-4);

        let mut h = spinner(1, Some(AbilityKind::Hyperdrive));
        h.vel = Vec2::new(100.0, 0.0);
        step_entity(&mut h, false);
        assert!(h.vel.length() > MAX_SPEED);
        assert!(h.vel.length() <= MAX_SPEED * HYPERDRIVE_SPEED_FACTOR + 1e-4);
    }

    #[test]
    fn test_exhaustion_kills() {
        let mut e = spinner(0, None);
        e.stamina = 0.01;
        step_entity(&mut e, false);
        assert!(!e.alive);
        assert_eq!(e.death, Some(DeathCause::Exhausted));
    }

    #[test]
    fn test_soulbound_floor() {
        let mut e = spinner(0, Some(AbilityKind::SoulBound));
        e.stamina = 0.01;
        step_entity(&mut e, true);
        assert!(e.alive);
        assert_eq!(e.stamina, 1.0);
    }

    #[test]
    fn test_anchor_rules() {
        let mut list = vec![spinner(0, Some(AbilityKind::SoulBound)), spinner(1, None)];
        list[0].ability = Some(Ability::SoulBound {
            anchor: Some(EntityId(1)),
        });
        assert!(anchor_alive(&list, 0));

        list[1].ability = Some(Ability::SoulBound {
            anchor: Some(EntityId(0)),
        });
        assert!(!anchor_alive(&list, 0), "mutual anchors do not protect");

        list[1].ability = None;
        list[1].kill(DeathCause::RingOut);
        assert!(!anchor_alive(&list, 0));
    }

    #[test]
    fn test_poison_and_link_expire() {
        let mut e = spinner(0, None);
        e.status.poison_ticks = 2;
        e.status.poison_rate = 1.0;
        e.status.link = Some(Link {
            partner: EntityId(1),
            ticks_left: 1,
        });
        step_entity(&mut e, false);
        step_entity(&mut e, false);
        step_entity(&mut e, false);
        let expected = 100.0 - 3.0 * STAMINA_DECAY - 2.0;
        assert!((e.stamina - expected).abs() < 1e-4);
        assert!(e.status.link.is_none());
    }
}
