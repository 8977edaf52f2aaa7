//! Fixed timestep battle tick
//!
//! One heat's worth of entities plus the ordered per-tick update that drives
//! them. The update order is fixed:
//! links → passives → physics → arena → collisions → hazards → deaths →
//! pending spawns → KO timers.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ability::{Ability, AbilityKind};
use super::aftermath::resolve_deaths;
use super::arena::Boundary;
use super::collision::{detect_pairs, resolve_pair};
use super::context::{PendingSpawn, SimulationContext};
use super::entity::{Entity, EntityId, EntrantProfile, Role};
use super::events::BattleEvent;
use super::hazard::{HazardSnapshot, update_hazards};
use super::passives::{revalidate_links, run_passives};
use super::physics::{anchor_alive, step_entity};

/// A single heat in progress
#[derive(Debug, Clone)]
pub struct Battle {
    pub entities: Vec<Entity>,
    /// Context tick at which the heat started
    pub started_at: u64,
    /// Heat ends once this many entrants (or fewer) are alive
    pub target_survivors: usize,
}

impl Battle {
    /// Spawn every profile around the arena and assign heat-start links
    pub fn new(profiles: &[EntrantProfile], ctx: &mut SimulationContext, target_survivors: usize) -> Self {
        let points = ctx.arena.spawn_points(profiles.len(), &mut *ctx.rng);
        let mut entities: Vec<Entity> = profiles
            .iter()
            .zip(points)
            .enumerate()
            .map(|(i, (profile, (pos, vel)))| Entity::spawn(EntityId(i as u32), profile, pos, vel))
            .collect();

        assign_links(&mut entities, ctx);

        Self {
            entities,
            started_at: ctx.tick,
            target_survivors,
        }
    }

    pub fn living_entrants(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.alive && e.is_entrant())
    }

    pub fn is_decided(&self) -> bool {
        self.living_entrants().count() <= self.target_survivors
    }

    /// Labels of surviving entrants, in spawn order
    pub fn survivors(&self) -> Vec<String> {
        self.living_entrants().map(|e| e.label.clone()).collect()
    }

    /// Apply spawns queued during the tick
    pub fn flush_pending(&mut self, ctx: &mut SimulationContext) {
        for spawn in std::mem::take(&mut ctx.pending) {
            match spawn {
                PendingSpawn::Summon {
                    origin,
                    profile,
                    pos,
                    vel,
                    stamina,
                } => {
                    let id = EntityId(self.entities.len() as u32);
                    let mut summon = Entity::spawn(id, &profile, pos, vel);
                    summon.role = Role::Summon { origin };
                    summon.stamina = stamina.clamp(1.0, summon.stats.max_stamina);
                    let origin_label = self.entities[origin.index()].label.clone();
                    ctx.emit(BattleEvent::Summoned {
                        entity: summon.label.clone(),
                        origin: origin_label,
                    });
                    self.entities.push(summon);
                }
                PendingSpawn::Revive { id, pos, stamina } => {
                    let entity = &mut self.entities[id.index()];
                    entity.revive(pos, stamina);
                    ctx.emit(BattleEvent::Revived {
                        entity: entity.label.clone(),
                    });
                }
            }
        }
    }

    pub fn snapshot(&self, ctx: &SimulationContext) -> BattleSnapshot {
        BattleSnapshot {
            tick: ctx.tick,
            entities: self.entities.iter().map(EntitySnapshot::from).collect(),
            hazards: ctx.hazards.iter().map(HazardSnapshot::from).collect(),
        }
    }
}

/// SoulBound anchors and Rival targets, chosen once per heat
fn assign_links(entities: &mut [Entity], ctx: &mut SimulationContext) {
    for idx in 0..entities.len() {
        match entities[idx].kind() {
            Some(AbilityKind::SoulBound) => {
                // Anchoring to another SoulBound holder could make both immortal
                let candidates: Vec<EntityId> = entities
                    .iter()
                    .filter(|e| e.id.index() != idx && !e.has(AbilityKind::SoulBound))
                    .map(|e| e.id)
                    .collect();
                let anchor = pick(&candidates, ctx);
                entities[idx].ability = Some(Ability::SoulBound { anchor });
            }
            Some(AbilityKind::Rival) => {
                let candidates: Vec<EntityId> = entities
                    .iter()
                    .filter(|e| e.id.index() != idx)
                    .map(|e| e.id)
                    .collect();
                let rival = pick(&candidates, ctx);
                entities[idx].ability = Some(Ability::Rival { rival });
            }
            _ => {}
        }
    }
}

fn pick(candidates: &[EntityId], ctx: &mut SimulationContext) -> Option<EntityId> {
    if candidates.is_empty() {
        None
    } else {
        Some(candidates[ctx.rng.random_range(0..candidates.len())])
    }
}

/// Advance the battle by one fixed timestep
pub fn tick(battle: &mut Battle, ctx: &mut SimulationContext) {
    ctx.tick += 1;
    let entities = &mut battle.entities;

    revalidate_links(entities);
    run_passives(entities, ctx);

    for idx in 0..entities.len() {
        let anchored = anchor_alive(entities, idx);
        step_entity(&mut entities[idx], anchored);
    }

    for idx in 0..entities.len() {
        if !entities[idx].is_active() {
            continue;
        }
        let anchored = anchor_alive(entities, idx);
        ctx.arena.apply_forces(&mut entities[idx]);
        if let Boundary::Saved { ability, saves_left } = ctx.arena.enforce_bounds(&mut entities[idx], anchored) {
            let text = match saves_left {
                Some(left) => format!("bounces back from the edge ({left} left)"),
                None => "is pulled back from the edge".to_string(),
            };
            ctx.emit(BattleEvent::triggered(&entities[idx].label, ability, text));
        }
    }

    for (i, j) in detect_pairs(entities) {
        // Earlier contacts this tick may have hidden or phased one side
        if entities[i].is_tangible() && entities[j].is_tangible() {
            resolve_pair(entities, i, j, ctx);
        }
    }

    update_hazards(entities, ctx);
    resolve_deaths(entities, ctx, battle.started_at);
    battle.flush_pending(ctx);

    for entity in battle.entities.iter_mut() {
        if !entity.alive && entity.ko_timer > 0 {
            entity.ko_timer -= 1;
        }
    }
}

/// Presentation view of one spinner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: u32,
    pub label: String,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub rotation: f32,
    pub hue: f32,
    pub stamina: f32,
    pub max_stamina: f32,
    pub alive: bool,
    pub summon: bool,
    pub ability: Option<AbilityKind>,
    pub phased: bool,
    pub hidden: bool,
    pub ko_timer: u32,
}

impl From<&Entity> for EntitySnapshot {
    fn from(e: &Entity) -> Self {
        Self {
            id: e.id.0,
            label: e.label.clone(),
            pos: e.pos,
            vel: e.vel,
            radius: e.radius,
            rotation: e.rotation,
            hue: e.hue,
            stamina: e.stamina,
            max_stamina: e.stats.max_stamina,
            alive: e.alive,
            summon: !e.is_entrant(),
            ability: e.kind(),
            phased: e.is_phased(),
            hidden: e.is_hidden(),
            ko_timer: e.ko_timer,
        }
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub tick: u64,
    pub entities: Vec<EntitySnapshot>,
    pub hazards: Vec<HazardSnapshot>,
}
