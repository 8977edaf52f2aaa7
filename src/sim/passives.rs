//! Per-tick ability behaviour: teleports, dashes, force fields, healing,
//! phasing, hazard spawners, cloning and parasite incubation

use glam::Vec2;

use super::ability::*;
use super::collision::shielded_from;
use super::context::{PendingSpawn, SimulationContext};
use super::entity::{DeathCause, EntityId, Entity, EntrantProfile};
use super::events::BattleEvent;
use super::hazard::*;

/// Drop references to entities that have died since the last tick
pub fn revalidate_links(entities: &mut [Entity]) {
    let alive: Vec<bool> = entities.iter().map(|e| e.alive).collect();
    let is_alive = |id: EntityId| alive.get(id.index()).copied().unwrap_or(false);

    for entity in entities.iter_mut() {
        match &mut entity.ability {
            Some(Ability::Rival { rival }) => {
                if rival.is_some_and(|r| !is_alive(r)) {
                    *rival = None;
                }
            }
            Some(Ability::SoulBound { anchor }) => {
                if anchor.is_some_and(|a| !is_alive(a)) {
                    *anchor = None;
                }
            }
            Some(Ability::Revenge { last_attacker }) => {
                if last_attacker.is_some_and(|a| !is_alive(a)) {
                    *last_attacker = None;
                }
            }
            _ => {}
        }
        if entity.status.link.is_some_and(|l| !is_alive(l.partner)) {
            entity.status.link = None;
        }
    }
}

fn announce(ctx: &mut SimulationContext, holder: &Entity, ability: AbilityKind, text: impl Into<String>) {
    let text = text.into();
    log::debug!("{} [{}]: {}", holder.label, ability, text);
    ctx.emit(BattleEvent::triggered(&holder.label, ability, text));
}

/// Count a cooldown down; true (and rearmed) when it expires
fn cooldown_elapsed(cooldown: &mut u32, period: u32) -> bool {
    *cooldown = cooldown.saturating_sub(1);
    if *cooldown == 0 {
        *cooldown = period;
        true
    } else {
        false
    }
}

/// Closest other tangible entity
pub fn nearest_opponent(entities: &[Entity], idx: usize) -> Option<usize> {
    let origin = entities[idx].pos;
    entities
        .iter()
        .enumerate()
        .filter(|(i, e)| *i != idx && e.is_tangible())
        .min_by(|(_, a), (_, b)| {
            a.pos
                .distance_squared(origin)
                .total_cmp(&b.pos.distance_squared(origin))
        })
        .map(|(i, _)| i)
}

/// Run every per-tick ability for one tick
pub fn run_passives(entities: &mut [Entity], ctx: &mut SimulationContext) {
    let mut forces: Vec<(usize, Vec2)> = Vec::new();

    for idx in 0..entities.len() {
        if !entities[idx].alive {
            continue;
        }
        if entities[idx].is_hidden() {
            incubate(entities, idx, ctx);
            continue;
        }
        let Some(kind) = entities[idx].kind() else {
            continue;
        };
        match kind {
            AbilityKind::Blink => blink(entities, idx, ctx),
            AbilityKind::Dash => dash(entities, idx, ctx),
            AbilityKind::Magnet | AbilityKind::Repulsor => field(entities, idx, &mut forces),
            AbilityKind::Regenerator => regenerate(&mut entities[idx]),
            AbilityKind::Ghost => phase(entities, idx, ctx),
            AbilityKind::Gunner
            | AbilityKind::Trapper
            | AbilityKind::Shockwave
            | AbilityKind::Laser
            | AbilityKind::Pulsar
            | AbilityKind::Bomber => fire(entities, idx, ctx),
            AbilityKind::Cloner => clone_self(entities, idx, ctx),
            AbilityKind::Parasite => {
                // A copied parasite state without an actual host starts over
                if let Some(Ability::Parasite { host, .. }) = &mut entities[idx].ability {
                    *host = None;
                }
            }
            _ => {}
        }
    }

    // Fields are applied after every holder has looked at the same positions
    for (idx, force) in forces {
        entities[idx].vel += force;
    }
}

fn blink(entities: &mut [Entity], idx: usize, ctx: &mut SimulationContext) {
    let Some(Ability::Blink { cooldown }) = &mut entities[idx].ability else {
        return;
    };
    if !cooldown_elapsed(cooldown, BLINK_PERIOD) {
        return;
    }
    let target = ctx.arena.random_interior_point(&mut *ctx.rng);
    entities[idx].pos = target;
    announce(ctx, &entities[idx], AbilityKind::Blink, "blinks");
}

fn dash(entities: &mut [Entity], idx: usize, ctx: &mut SimulationContext) {
    let Some(Ability::Dash { cooldown }) = &mut entities[idx].ability else {
        return;
    };
    if !cooldown_elapsed(cooldown, DASH_PERIOD) {
        return;
    }
    let Some(target) = nearest_opponent(entities, idx) else {
        return;
    };
    let dir = (entities[target].pos - entities[idx].pos).normalize_or(Vec2::X);
    entities[idx].vel += dir * DASH_KICK;
    let text = format!("dashes at {}", entities[target].label);
    announce(ctx, &entities[idx], AbilityKind::Dash, text);
}

fn field(entities: &[Entity], idx: usize, forces: &mut Vec<(usize, Vec2)>) {
    let holder = &entities[idx];
    let (range, strength) = match holder.ability {
        Some(Ability::Magnet) => (MAGNET_RANGE, -MAGNET_PULL),
        Some(Ability::Repulsor) => (REPULSOR_RANGE, REPULSOR_PUSH),
        _ => return,
    };
    for (i, other) in entities.iter().enumerate() {
        if i == idx || !other.is_tangible() || shielded_from(other, holder) {
            continue;
        }
        let offset = other.pos - holder.pos;
        if offset.length() > range {
            continue;
        }
        forces.push((i, offset.normalize_or(Vec2::X) * strength));
    }
}

fn regenerate(entity: &mut Entity) {
    let wanted = match entity.ability {
        Some(Ability::Regenerator { pool }) => REGEN_RATE.min(pool),
        _ => return,
    };
    let healed = entity.heal(wanted);
    if let Some(Ability::Regenerator { pool }) = &mut entity.ability {
        *pool -= healed;
    }
}

fn phase(entities: &mut [Entity], idx: usize, ctx: &mut SimulationContext) {
    let Some(Ability::Ghost { cooldown, phased }) = &mut entities[idx].ability else {
        return;
    };
    if *phased > 0 {
        *phased -= 1;
        return;
    }
    if cooldown_elapsed(cooldown, GHOST_PERIOD) {
        *phased = GHOST_DURATION;
        announce(ctx, &entities[idx], AbilityKind::Ghost, "phases out");
    }
}

fn fire(entities: &mut [Entity], idx: usize, ctx: &mut SimulationContext) {
    let ready = match &mut entities[idx].ability {
        Some(Ability::Gunner { cooldown }) => cooldown_elapsed(cooldown, GUNNER_PERIOD),
        Some(Ability::Trapper { cooldown }) => cooldown_elapsed(cooldown, TRAPPER_PERIOD),
        Some(Ability::Shockwave { cooldown }) => cooldown_elapsed(cooldown, SHOCKWAVE_PERIOD),
        Some(Ability::Laser { cooldown }) => cooldown_elapsed(cooldown, LASER_PERIOD),
        Some(Ability::Pulsar { cooldown }) => cooldown_elapsed(cooldown, PULSAR_PERIOD),
        Some(Ability::Bomber { cooldown }) => cooldown_elapsed(cooldown, BOMBER_PERIOD),
        _ => false,
    };
    if !ready {
        return;
    }

    let holder = &entities[idx];
    let owner = holder.id;
    let target = nearest_opponent(entities, idx).map(|t| entities[t].pos);
    // With nobody to aim at, shots go out along the spin angle
    let aim = target
        .map(|t| (t - holder.pos).normalize_or(Vec2::X))
        .unwrap_or_else(|| Vec2::from_angle(holder.rotation));

    let (hazard, text) = match holder.ability {
        Some(Ability::Gunner { .. }) => {
            let muzzle = holder.pos + aim * (holder.radius + PROJECTILE_RADIUS + 1.0);
            (Hazard::projectile(owner, muzzle, aim), "fires")
        }
        Some(Ability::Trapper { .. }) => (Hazard::trap(owner, holder.pos), "drops a mine"),
        Some(Ability::Shockwave { .. }) => (Hazard::wave(owner, holder.pos), "sends a shockwave"),
        Some(Ability::Laser { .. }) => (Hazard::beam(owner, holder.pos, aim), "fires a laser"),
        Some(Ability::Pulsar { .. }) => (Hazard::pulse(owner, holder.pos), "pulses"),
        Some(Ability::Bomber { .. }) => {
            let Some(landing) = target else {
                return;
            };
            (Hazard::bomb(owner, holder.pos, landing), "lobs a bomb")
        }
        _ => return,
    };
    let kind = holder.kind().unwrap_or(AbilityKind::Gunner);
    announce(ctx, &entities[idx], kind, text);
    ctx.spawn_hazard(hazard);
}

fn clone_self(entities: &mut [Entity], idx: usize, ctx: &mut SimulationContext) {
    let holder = &mut entities[idx];
    let weakened = holder.stamina_ratio() < CLONE_THRESHOLD;
    let Some(Ability::Cloner { used }) = &mut holder.ability else {
        return;
    };
    if *used || !weakened {
        return;
    }
    *used = true;

    let profile = EntrantProfile {
        label: format!("{} clone", holder.label),
        stats: holder.stats,
        ability: None,
    };
    let offset = Vec2::from_angle(holder.rotation) * holder.radius * 2.0;
    ctx.queue(PendingSpawn::Summon {
        origin: holder.id,
        profile,
        pos: holder.pos + offset,
        vel: -holder.vel,
        stamina: holder.stamina,
    });
    announce(ctx, &entities[idx], AbilityKind::Cloner, "splits off a clone");
}

/// Hidden parasite: ride inside the host, then burst out and consume it
fn incubate(entities: &mut [Entity], idx: usize, ctx: &mut SimulationContext) {
    let Some(host) = entities[idx].status.hidden_in else {
        return;
    };
    let host_alive = entities[host.index()].alive;
    let host_pos = entities[host.index()].pos;

    let emerge = match &mut entities[idx].ability {
        Some(Ability::Parasite {
            host: Some(h),
            emerge_in,
        }) if *h == host => {
            *emerge_in = emerge_in.saturating_sub(1);
            *emerge_in == 0 || !host_alive
        }
        // Lost the parasite state while hidden (copied over): just leave
        _ => true,
    };
    entities[idx].pos = host_pos;
    if !emerge {
        return;
    }

    entities[idx].status.hidden_in = None;
    if let Some(Ability::Parasite { host, emerge_in }) = &mut entities[idx].ability {
        *host = None;
        *emerge_in = 0;
    }
    let nudge = Vec2::from_angle(entities[idx].rotation) * entities[host.index()].radius;
    entities[idx].pos = host_pos + nudge;

    if host_alive {
        entities[host.index()].kill(DeathCause::Consumed);
        let text = format!("bursts out of {}", entities[host.index()].label);
        announce(ctx, &entities[idx], AbilityKind::Parasite, text);
    }
}
