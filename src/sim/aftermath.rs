//! Post-elimination pass: death checks and death-triggered abilities
//!
//! Runs once per tick after collisions and hazards. Death triggers may damage
//! other entities, which may kill them in turn, so the pass loops until no
//! fresh deaths remain. Revivals and new summons are only queued here; they
//! join the entity list at the tick boundary.

use glam::Vec2;

use super::ability::*;
use super::collision::shielded_from;
use super::context::{PendingSpawn, SimulationContext};
use super::entity::{Entity, EntrantProfile, Stats, deal_damage};
use super::events::BattleEvent;
use super::physics::{anchor_alive, death_check};

/// Share of the parent's max stamina each fragment starts with
pub const FRAGMENT_STAMINA: f32 = 0.3;
/// Fragment launch speed away from the parent's position
pub const FRAGMENT_SPEED: f32 = 4.0;

/// Kill anything with empty stamina, then resolve every fresh death
pub fn resolve_deaths(entities: &mut [Entity], ctx: &mut SimulationContext, heat_started_at: u64) {
    loop {
        sweep_exhausted(entities);

        let fresh: Vec<usize> = entities
            .iter()
            .enumerate()
            .filter(|(_, e)| e.fresh_death)
            .map(|(i, _)| i)
            .collect();
        if fresh.is_empty() {
            break;
        }
        for idx in fresh {
            entities[idx].fresh_death = false;
            on_death(entities, idx, ctx, heat_started_at);
        }
    }
}

fn sweep_exhausted(entities: &mut [Entity]) {
    for idx in 0..entities.len() {
        if entities[idx].alive && entities[idx].stamina <= 0.0 {
            let anchored = anchor_alive(entities, idx);
            death_check(&mut entities[idx], anchored);
        }
    }
}

fn announce(ctx: &mut SimulationContext, holder: &Entity, ability: AbilityKind, text: impl Into<String>) {
    let text = text.into();
    log::debug!("{} [{}]: {}", holder.label, ability, text);
    ctx.emit(BattleEvent::triggered(&holder.label, ability, text));
}

fn on_death(entities: &mut [Entity], idx: usize, ctx: &mut SimulationContext, heat_started_at: u64) {
    match entities[idx].kind() {
        Some(AbilityKind::Phoenix) => {
            if rise_again(entities, idx, ctx) {
                // Not an elimination: the phoenix is back next tick
                return;
            }
        }
        Some(AbilityKind::Neo) => {
            if ctx.tick.saturating_sub(heat_started_at) <= NEO_GRACE_TICKS && ctx.reset_requested.is_none() {
                ctx.reset_requested = Some(entities[idx].label.clone());
                announce(ctx, &entities[idx], AbilityKind::Neo, "rewinds the heat");
            }
        }
        Some(AbilityKind::Explosive) => explode(entities, idx, ctx),
        Some(AbilityKind::Martyr) => martyr(entities, idx, ctx),
        Some(AbilityKind::Splitter) => split(entities, idx, ctx),
        Some(AbilityKind::Curse) => curse(entities, idx, ctx),
        _ => {}
    }

    let dead = &entities[idx];
    log::debug!("{} eliminated ({:?}) at tick {}", dead.label, dead.death, ctx.tick);
    if let Some(cause) = dead.death {
        ctx.emit(BattleEvent::Eliminated {
            entity: dead.label.clone(),
            cause,
            summon: !dead.is_entrant(),
            tick: ctx.tick,
        });
    }
}

fn rise_again(entities: &mut [Entity], idx: usize, ctx: &mut SimulationContext) -> bool {
    let Some(Ability::Phoenix { used }) = &mut entities[idx].ability else {
        return false;
    };
    if *used {
        return false;
    }
    *used = true;
    let pos = ctx.arena.random_interior_point(&mut *ctx.rng);
    let stamina = entities[idx].stats.max_stamina * PHOENIX_STAMINA;
    ctx.queue(PendingSpawn::Revive {
        id: entities[idx].id,
        pos,
        stamina,
    });
    announce(ctx, &entities[idx], AbilityKind::Phoenix, "rises from the ashes");
    true
}

/// Living, present entities within `radius` of `idx` that its ability can reach
fn victims(entities: &[Entity], idx: usize, radius: f32) -> Vec<usize> {
    let source = &entities[idx];
    entities
        .iter()
        .enumerate()
        .filter(|(i, e)| {
            *i != idx
                && e.is_tangible()
                && e.pos.distance(source.pos) <= radius
                && !shielded_from(e, source)
        })
        .map(|(i, _)| i)
        .collect()
}

fn explode(entities: &mut [Entity], idx: usize, ctx: &mut SimulationContext) {
    let Some(Ability::Explosive { armed }) = &mut entities[idx].ability else {
        return;
    };
    if !*armed {
        return;
    }
    *armed = false;

    let center = entities[idx].pos;
    for victim in victims(entities, idx, EXPLOSION_RADIUS) {
        let offset = entities[victim].pos - center;
        let dist = offset.length().max(EXPLOSION_MIN_DISTANCE);
        let push = offset.normalize_or(Vec2::X) * (EXPLOSION_FORCE / dist);
        entities[victim].vel += push;
        let id = entities[victim].id;
        deal_damage(entities, id, EXPLOSION_DAMAGE);
    }
    announce(ctx, &entities[idx], AbilityKind::Explosive, "explodes");
}

fn martyr(entities: &mut [Entity], idx: usize, ctx: &mut SimulationContext) {
    for victim in victims(entities, idx, MARTYR_RADIUS) {
        let id = entities[victim].id;
        deal_damage(entities, id, MARTYR_DAMAGE);
    }
    announce(ctx, &entities[idx], AbilityKind::Martyr, "takes everyone nearby down with it");
}

fn split(entities: &mut [Entity], idx: usize, ctx: &mut SimulationContext) {
    let parent = &entities[idx];
    let stats = Stats {
        weight: parent.stats.weight * 0.5,
        max_stamina: parent.stats.max_stamina * 0.5,
        ..parent.stats
    };
    let base_angle = parent.rotation;
    for n in 0..SPLIT_FRAGMENTS {
        let angle = base_angle + std::f32::consts::TAU * n as f32 / SPLIT_FRAGMENTS as f32;
        let dir = Vec2::from_angle(angle);
        let profile = EntrantProfile {
            label: format!("{} fragment {}", parent.label, n + 1),
            stats,
            ability: None,
        };
        ctx.queue(PendingSpawn::Summon {
            origin: parent.id,
            profile,
            pos: parent.pos + dir * stats.radius(),
            vel: dir * FRAGMENT_SPEED,
            stamina: parent.stats.max_stamina * FRAGMENT_STAMINA,
        });
    }
    announce(ctx, &entities[idx], AbilityKind::Splitter, "splits apart");
}

fn curse(entities: &mut [Entity], idx: usize, ctx: &mut SimulationContext) {
    let Some(Ability::Curse {
        last_attacker: Some(attacker),
    }) = entities[idx].ability
    else {
        return;
    };
    let target = &entities[attacker.index()];
    if !target.alive || shielded_from(target, &entities[idx]) {
        return;
    }
    let text = format!("curses {}", target.label);
    deal_damage(entities, attacker, CURSE_DAMAGE);
    announce(ctx, &entities[idx], AbilityKind::Curse, text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arena::Arena;
    use crate::sim::entity::{DeathCause, EntityId};

    fn spinner(id: u32, ability: Option<AbilityKind>, pos: Vec2) -> Entity {
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
        Entity::spawn(EntityId(id), &profile, pos, Vec2::ZERO)
    }

    fn ctx() -> SimulationContext {
        SimulationContext::seeded(5, Arena::default())
    }

    fn eliminations(ctx: &SimulationContext) -> usize {
        ctx.events
            .iter()
            .filter(|e| matches!(e, BattleEvent::Eliminated { .. }))
            .count()
    }

    #[test]
    fn test_explosion_pushes_and_damages_in_radius_only() {
        let mut ctx = ctx();
        let mut list = vec![
            spinner(0, Some(AbilityKind::Explosive), Vec2::ZERO),
            spinner(1, None, Vec2::new(100.0, 0.0)),
            spinner(2, None, Vec2::new(-300.0, 0.0)),
        ];
        list[0].kill(DeathCause::Exhausted);
        resolve_deaths(&mut list, &mut ctx, 0);

        assert!((list[1].vel.x - EXPLOSION_FORCE / 100.0).abs() < 1e-4);
        assert!((list[1].stamina - (100.0 - EXPLOSION_DAMAGE)).abs() < 1e-4);
        assert_eq!(list[2].vel, Vec2::ZERO);
        assert!((list[2].stamina - 100.0).abs() < 1e-4);
        assert_eq!(list[0].ability, Some(Ability::Explosive { armed: false }));
        assert_eq!(eliminations(&ctx), 1);
    }

    #[test]
    fn test_explosion_close_range_uses_distance_floor() {
        let mut ctx = ctx();
        let mut list = vec![
            spinner(0, Some(AbilityKind::Explosive), Vec2::ZERO),
            spinner(1, None, Vec2::new(2.0, 0.0)),
        ];
        list[0].kill(DeathCause::RingOut);
        resolve_deaths(&mut list, &mut ctx, 0);
        assert!((list[1].vel.x - EXPLOSION_FORCE / EXPLOSION_MIN_DISTANCE).abs() < 1e-4);
    }

    #[test]
    fn test_chain_reaction_settles_in_one_pass() {
        let mut ctx = ctx();
        let mut list = vec![
            spinner(0, Some(AbilityKind::Martyr), Vec2::ZERO),
            spinner(1, Some(AbilityKind::Explosive), Vec2::new(100.0, 0.0)),
            spinner(2, None, Vec2::new(200.0, 0.0)),
        ];
        list[1].stamina = 5.0;
        list[0].kill(DeathCause::Exhausted);
        resolve_deaths(&mut list, &mut ctx, 0);
        assert!(!list[1].alive, "martyr damage finished the bomb off");
        assert!(list[2].stamina < 100.0, "and the bomb went off");
        assert_eq!(eliminations(&ctx), 2);
    }

    #[test]
    fn test_phoenix_revives_once() {
        let mut ctx = ctx();
        let mut list = vec![spinner(0, Some(AbilityKind::Phoenix), Vec2::ZERO)];
        list[0].kill(DeathCause::Exhausted);
        resolve_deaths(&mut list, &mut ctx, 0);
        assert_eq!(eliminations(&ctx), 0);
        assert!(matches!(
            ctx.pending.as_slice(),
            [PendingSpawn::Revive { stamina, .. }] if (*stamina - 50.0).abs() < 1e-4
        ));

        ctx.pending.clear();
        list[0].revive(Vec2::ZERO, 50.0);
        list[0].kill(DeathCause::Exhausted);
        resolve_deaths(&mut list, &mut ctx, 0);
        assert_eq!(eliminations(&ctx), 1);
        assert!(ctx.pending.is_empty());
    }

    #[test]
    fn test_neo_requests_reset_only_early() {
        let mut ctx = ctx();
        let mut list = vec![spinner(0, Some(AbilityKind::Neo), Vec2::ZERO)];
        ctx.tick = 100;
        list[0].kill(DeathCause::Exhausted);
        resolve_deaths(&mut list, &mut ctx, 0);
        assert_eq!(ctx.reset_requested.as_deref(), Some("s0"));

        let mut ctx = self::ctx();
        let mut list = vec![spinner(0, Some(AbilityKind::Neo), Vec2::ZERO)];
        ctx.tick = 500;
        list[0].kill(DeathCause::Exhausted);
        resolve_deaths(&mut list, &mut ctx, 0);
        assert!(ctx.reset_requested.is_none());
    }

    #[test]
    fn test_splitter_queues_fragments() {
        let mut ctx = ctx();
        let mut list = vec![spinner(0, Some(AbilityKind::Splitter), Vec2::ZERO)];
        list[0].kill(DeathCause::Exhausted);
        resolve_deaths(&mut list, &mut ctx, 0);
        assert_eq!(ctx.pending.len(), SPLIT_FRAGMENTS);
    }

    #[test]
    fn test_curse_hits_last_attacker() {
        let mut ctx = ctx();
        let mut list = vec![
            spinner(0, Some(AbilityKind::Curse), Vec2::ZERO),
            spinner(1, None, Vec2::new(400.0, 0.0)),
        ];
        list[0].ability = Some(Ability::Curse {
            last_attacker: Some(EntityId(1)),
        });
        list[0].kill(DeathCause::RingOut);
        resolve_deaths(&mut list, &mut ctx, 0);
        assert!((list[1].stamina - (100.0 - CURSE_DAMAGE)).abs() < 1e-4);
    }

    #[test]
    fn test_exhausted_entities_are_swept() {
        let mut ctx = ctx();
        let mut list = vec![spinner(0, None, Vec2::ZERO)];
        list[0].stamina = 0.0;
        resolve_deaths(&mut list, &mut ctx, 0);
        assert!(!list[0].alive);
        assert_eq!(eliminations(&ctx), 1);
    }
}
