//! Ability modifier pipeline for spinner collisions
//!
//! A collision between two spinners produces an [`Exchange`]: the base
//! knockback shares and base damage for both sides plus running multipliers.
//! The ordered [`PIPELINE`] stages read and rewrite those multipliers (or
//! apply side effects) before [`Exchange::fold`] turns them into final
//! knockback and damage. Several stages do not commute, so the order of
//! [`PIPELINE`] is part of the game rules:
//!
//! 1. target amplifiers
//! 2. immunity (must run before anything rolls dice)
//! 3. bounce amplifiers
//! 4. flat dealt/received modifiers
//! 5. state-conditional modifiers
//! 6. probabilistic triggers
//! 7. stored-energy release
//! 8. position swap
//! 9. damage over time
//! 10. life drain
//! 11. size mutation
//! 12. latch / shared damage
//! 13. infection

use super::ability::*;
use super::collision::{Contact, shielded_from};
use super::context::SimulationContext;
use super::entity::{Entity, EntityId, Link, deal_damage};
use super::events::BattleEvent;
use crate::consts::MAX_SPEED;

/// Running state of one collision as it flows through the stages.
///
/// Index 0 and 1 are the two sides; every per-side array describes what
/// happens *to* that side (`dealt` is what that side deals out).
#[derive(Debug, Clone)]
pub struct Exchange {
    pub ids: [EntityId; 2],
    pub contact: Contact,
    /// Base knockback received by each side
    pub shares: [f32; 2],
    /// Base damage received by each side
    pub base_damage: [f32; 2],
    pub dealt: [f32; 2],
    pub received: [f32; 2],
    /// Knockback-only multiplier on what each side receives
    pub knockback_scale: [f32; 2],
    /// Damage-only multiplier on what each side receives
    pub damage_scale: [f32; 2],
    /// Flat extra damage received by each side
    pub bonus_damage: [f32; 2],
    /// Side is shielded from the opponent's ability effects
    pub shielded: [bool; 2],
    /// Abilities copied this exchange, applied by [`finish`]
    pub pending_copy: [Option<Ability>; 2],
}

/// Final scalars after folding every multiplier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub knockback: [f32; 2],
    pub damage: [f32; 2],
}

impl Exchange {
    pub fn new(ids: [EntityId; 2], contact: Contact, shares: [f32; 2], base_damage: [f32; 2]) -> Self {
        Self {
            ids,
            contact,
            shares,
            base_damage,
            dealt: [1.0; 2],
            received: [1.0; 2],
            knockback_scale: [1.0; 2],
            damage_scale: [1.0; 2],
            bonus_damage: [0.0; 2],
            shielded: [false; 2],
            pending_copy: [None, None],
        }
    }

    /// Multiplier the opponent of `side` applies to it; shields reset it to 1
    fn incoming(&self, side: usize) -> f32 {
        if self.shielded[side] {
            1.0
        } else {
            self.dealt[1 - side]
        }
    }

    pub fn fold(&self) -> Outcome {
        let mut out = Outcome {
            knockback: [0.0; 2],
            damage: [0.0; 2],
        };
        for side in 0..2 {
            let incoming = self.incoming(side);
            out.knockback[side] =
                self.shares[side] * incoming * self.received[side] * self.knockback_scale[side];
            out.damage[side] = self.base_damage[side] * incoming * self.received[side] * self.damage_scale[side]
                + self.bonus_damage[side];
        }
        out
    }
}

pub type StageFn = fn(&mut Exchange, &mut [Entity], &mut SimulationContext);

/// One named step of the pipeline
pub struct Stage {
    pub name: &'static str,
    /// Abilities this stage acts on
    pub members: &'static [AbilityKind],
    /// May cancel part of the other side's effect
    pub may_veto: bool,
    /// May mutate the opponent's state (position, status, ability)
    pub mutates_target: bool,
    pub run: StageFn,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("members", &self.members)
            .field("may_veto", &self.may_veto)
            .field("mutates_target", &self.mutates_target)
            .finish()
    }
}

/// Abilities resolved before the pipeline (pass-through hits skip it entirely)
pub const PASS_THROUGH: &[AbilityKind] = &[AbilityKind::Slice];

pub const PIPELINE: &[Stage] = &[
    Stage {
        name: "target_amplifiers",
        members: &[AbilityKind::Revenge, AbilityKind::Rival, AbilityKind::Bully],
        may_veto: false,
        mutates_target: false,
        run: target_amplifiers,
    },
    Stage {
        name: "immunity",
        members: &[AbilityKind::Prism, AbilityKind::Immune],
        may_veto: true,
        mutates_target: false,
        run: immunity,
    },
    Stage {
        name: "bounce",
        members: &[AbilityKind::Bouncy, AbilityKind::Rubber],
        may_veto: false,
        mutates_target: false,
        run: bounce,
    },
    Stage {
        name: "flat_modifiers",
        members: &[
            AbilityKind::Spiky,
            AbilityKind::Tank,
            AbilityKind::GlassCannon,
            AbilityKind::Heavyweight,
            AbilityKind::Featherweight,
            AbilityKind::Juggernaut,
            AbilityKind::Thorns,
            AbilityKind::Brawler,
        ],
        may_veto: false,
        mutates_target: false,
        run: flat_modifiers,
    },
    Stage {
        name: "conditional_modifiers",
        members: &[
            AbilityKind::Momentum,
            AbilityKind::Rage,
            AbilityKind::LastStand,
            AbilityKind::Underdog,
        ],
        may_veto: false,
        mutates_target: false,
        run: conditional_modifiers,
    },
    Stage {
        name: "probabilistic_triggers",
        members: &[
            AbilityKind::Burst,
            AbilityKind::Dodge,
            AbilityKind::Counter,
            AbilityKind::Gambler,
            AbilityKind::Copycat,
            AbilityKind::Critical,
            AbilityKind::Mirror,
        ],
        may_veto: true,
        mutates_target: false,
        run: probabilistic_triggers,
    },
    Stage {
        name: "stored_energy",
        members: &[AbilityKind::Capacitor],
        may_veto: false,
        mutates_target: false,
        run: stored_energy,
    },
    Stage {
        name: "position_swap",
        members: &[AbilityKind::Swapper],
        may_veto: false,
        mutates_target: true,
        run: position_swap,
    },
    Stage {
        name: "damage_over_time",
        members: &[AbilityKind::Venom, AbilityKind::Freezer],
        may_veto: false,
        mutates_target: true,
        run: damage_over_time,
    },
    Stage {
        name: "life_drain",
        members: &[AbilityKind::Vampire],
        may_veto: false,
        mutates_target: true,
        run: life_drain,
    },
    Stage {
        name: "size_mutation",
        members: &[AbilityKind::Grower, AbilityKind::Shrinker],
        may_veto: false,
        mutates_target: false,
        run: size_mutation,
    },
    Stage {
        name: "latch",
        members: &[AbilityKind::Tether],
        may_veto: false,
        mutates_target: true,
        run: latch,
    },
    Stage {
        name: "infection",
        members: &[AbilityKind::Parasite],
        may_veto: false,
        mutates_target: true,
        run: infection,
    },
];

fn announce(ctx: &mut SimulationContext, holder: &Entity, ability: AbilityKind, text: String) {
    log::debug!("{} [{}]: {}", holder.label, ability, text);
    ctx.emit(BattleEvent::triggered(&holder.label, ability, text));
}

fn target_amplifiers(ex: &mut Exchange, entities: &mut [Entity], ctx: &mut SimulationContext) {
    for side in 0..2 {
        let holder = &entities[ex.ids[side].index()];
        let opp = &entities[ex.ids[1 - side].index()];
        match holder.ability {
            Some(Ability::Revenge {
                last_attacker: Some(attacker),
            }) if attacker == opp.id => {
                ex.dealt[side] *= 2.0;
                announce(ctx, holder, AbilityKind::Revenge, format!("takes revenge on {}", opp.label));
            }
            Some(Ability::Rival { rival: Some(rival) }) if rival == opp.id => {
                ex.dealt[side] *= 1.5;
            }
            Some(Ability::Bully) if opp.radius < holder.radius => {
                ex.dealt[side] *= 1.5;
            }
            _ => {}
        }
    }
}

fn immunity(ex: &mut Exchange, entities: &mut [Entity], _ctx: &mut SimulationContext) {
    for side in 0..2 {
        let holder = &entities[ex.ids[side].index()];
        let opp = &entities[ex.ids[1 - side].index()];
        ex.shielded[side] = shielded_from(holder, opp);
    }
}

fn bounce(ex: &mut Exchange, entities: &mut [Entity], _ctx: &mut SimulationContext) {
    for side in 0..2 {
        let other = 1 - side;
        match entities[ex.ids[side].index()].ability {
            Some(Ability::Bouncy) => {
                ex.knockback_scale[side] *= 1.4;
                if !ex.shielded[other] {
                    ex.knockback_scale[other] *= 1.4;
                }
            }
            Some(Ability::Rubber) => {
                ex.knockback_scale[side] *= 1.6;
                ex.damage_scale[side] *= 0.7;
            }
            _ => {}
        }
    }
}

fn flat_modifiers(ex: &mut Exchange, entities: &mut [Entity], _ctx: &mut SimulationContext) {
    for side in 0..2 {
        let other = 1 - side;
        match entities[ex.ids[side].index()].ability {
            Some(Ability::Spiky) => ex.dealt[side] *= 1.3,
            Some(Ability::Tank) => {
                ex.received[side] *= 0.6;
                ex.dealt[side] *= 0.85;
            }
            Some(Ability::GlassCannon) => {
                ex.dealt[side] *= 1.8;
                ex.received[side] *= 1.5;
            }
            Some(Ability::Heavyweight) => ex.received[side] *= 0.75,
            Some(Ability::Featherweight) => {
                ex.received[side] *= 1.4;
                ex.dealt[side] *= 1.15;
            }
            Some(Ability::Juggernaut) => ex.knockback_scale[side] = 0.0,
            Some(Ability::Thorns) => {
                if !ex.shielded[other] {
                    ex.bonus_damage[other] += THORNS_REFLECT * ex.base_damage[side];
                }
            }
            Some(Ability::Brawler) => {
                ex.dealt[side] *= 1.25;
                ex.received[side] *= 1.1;
            }
            _ => {}
        }
    }
}

fn conditional_modifiers(ex: &mut Exchange, entities: &mut [Entity], _ctx: &mut SimulationContext) {
    for side in 0..2 {
        let holder = &entities[ex.ids[side].index()];
        let opp = &entities[ex.ids[1 - side].index()];
        match holder.ability {
            Some(Ability::Momentum) => {
                ex.dealt[side] *= 1.0 + (holder.vel.length() / MAX_SPEED).min(1.0);
            }
            Some(Ability::Rage) if holder.stamina_ratio() < 0.3 => ex.dealt[side] *= 2.0,
            Some(Ability::LastStand) if holder.stamina_ratio() < 0.25 => ex.received[side] *= 0.5,
            Some(Ability::Underdog) if holder.stamina < opp.stamina => ex.dealt[side] *= 1.4,
            _ => {}
        }
    }
}

fn probabilistic_triggers(ex: &mut Exchange, entities: &mut [Entity], ctx: &mut SimulationContext) {
    for side in 0..2 {
        let other = 1 - side;
        let holder = &entities[ex.ids[side].index()];
        let opp = &entities[ex.ids[other].index()];
        // Offensive rolls are never made against a shielded opponent
        let opp_open = !ex.shielded[other];
        match holder.ability {
            Some(Ability::Burst) if opp_open => {
                if ctx.roll(BURST_CHANCE) {
                    ex.dealt[side] *= 2.5;
                    announce(ctx, holder, AbilityKind::Burst, "bursts!".into());
                }
            }
            Some(Ability::Critical) if opp_open => {
                if ctx.roll(CRITICAL_CHANCE) {
                    ex.dealt[side] *= 4.0;
                    announce(ctx, holder, AbilityKind::Critical, "critical hit!".into());
                }
            }
            Some(Ability::Gambler) if opp_open => {
                if ctx.roll(GAMBLER_CHANCE) {
                    ex.dealt[side] *= 2.0;
                    announce(ctx, holder, AbilityKind::Gambler, "wins the gamble".into());
                } else {
                    ex.dealt[side] *= 0.5;
                    announce(ctx, holder, AbilityKind::Gambler, "loses the gamble".into());
                }
            }
            Some(Ability::Dodge) => {
                if ctx.roll(DODGE_CHANCE) {
                    ex.received[side] = 0.0;
                    announce(ctx, holder, AbilityKind::Dodge, "dodges".into());
                }
            }
            Some(Ability::Counter) => {
                if ctx.roll(COUNTER_CHANCE) {
                    ex.received[side] *= 0.5;
                    if opp_open {
                        ex.received[other] *= 1.5;
                    }
                    announce(ctx, holder, AbilityKind::Counter, format!("counters {}", opp.label));
                }
            }
            Some(Ability::Copycat) if opp_open => {
                let copyable = opp.ability.as_ref().filter(|a| !a.copies_others()).cloned();
                if let Some(copied) = copyable {
                    if ctx.roll(COPYCAT_CHANCE) {
                        ex.pending_copy[side] = Some(copied);
                    }
                }
            }
            Some(Ability::Mirror) if opp_open => {
                ex.pending_copy[side] = opp.ability.as_ref().filter(|a| !a.copies_others()).cloned();
            }
            _ => {}
        }
    }
}

fn stored_energy(ex: &mut Exchange, entities: &mut [Entity], ctx: &mut SimulationContext) {
    for side in 0..2 {
        let other = 1 - side;
        let idx = ex.ids[side].index();
        let incoming = ex.base_damage[side] * ex.received[side];
        let mut released = 0.0;
        if let Some(Ability::Capacitor { stored }) = &mut entities[idx].ability {
            if *stored > 0.0 && !ex.shielded[other] {
                released = *stored;
                *stored = 0.0;
            }
            *stored = (*stored + incoming).min(CAPACITOR_CAP);
        } else {
            continue;
        }
        if released > 0.0 {
            ex.bonus_damage[other] += released;
            let text = format!("releases {released:.0} stored energy");
            announce(ctx, &entities[idx], AbilityKind::Capacitor, text);
        }
    }
}

fn position_swap(ex: &mut Exchange, entities: &mut [Entity], ctx: &mut SimulationContext) {
    let [a, b] = [ex.ids[0].index(), ex.ids[1].index()];
    let either_immune = matches!(entities[a].ability, Some(Ability::Immune))
        || matches!(entities[b].ability, Some(Ability::Immune));
    if either_immune {
        return;
    }
    for side in 0..2 {
        let other = 1 - side;
        let holder = ex.ids[side].index();
        if !entities[holder].has(AbilityKind::Swapper) || ex.shielded[other] {
            continue;
        }
        if ctx.roll(SWAP_CHANCE) {
            let pos_a = entities[a].pos;
            entities[a].pos = entities[b].pos;
            entities[b].pos = pos_a;
            ex.contact.normal = -ex.contact.normal;
            let text = format!("swaps places with {}", entities[ex.ids[other].index()].label);
            announce(ctx, &entities[holder], AbilityKind::Swapper, text);
            // One swap per collision
            return;
        }
    }
}

fn damage_over_time(ex: &mut Exchange, entities: &mut [Entity], _ctx: &mut SimulationContext) {
    for side in 0..2 {
        let other = 1 - side;
        if ex.shielded[other] {
            continue;
        }
        let target = ex.ids[other].index();
        match entities[ex.ids[side].index()].ability {
            Some(Ability::Venom) => {
                entities[target].status.poison_ticks = VENOM_TICKS;
                entities[target].status.poison_rate = VENOM_RATE;
            }
            Some(Ability::Freezer) => {
                entities[target].vel *= 0.5;
                entities[target].status.chill_ticks = CHILL_TICKS;
            }
            _ => {}
        }
    }
}

fn life_drain(ex: &mut Exchange, entities: &mut [Entity], _ctx: &mut SimulationContext) {
    for side in 0..2 {
        let other = 1 - side;
        let holder = ex.ids[side];
        if !entities[holder.index()].has(AbilityKind::Vampire) || ex.shielded[other] {
            continue;
        }
        let target = ex.ids[other];
        let amount = (VAMPIRE_DRAIN * ex.base_damage[other]).min(entities[target.index()].stamina);
        deal_damage(entities, target, amount);
        entities[holder.index()].heal(amount);
    }
}

fn size_mutation(ex: &mut Exchange, entities: &mut [Entity], _ctx: &mut SimulationContext) {
    for side in 0..2 {
        if ex.received[side] <= 0.0 {
            continue;
        }
        let holder = &mut entities[ex.ids[side].index()];
        match holder.ability {
            Some(Ability::Grower) => holder.radius = (holder.radius + GROWTH_STEP).min(MAX_RADIUS),
            Some(Ability::Shrinker) => holder.radius = (holder.radius - GROWTH_STEP).max(MIN_RADIUS),
            _ => {}
        }
    }
}

fn latch(ex: &mut Exchange, entities: &mut [Entity], ctx: &mut SimulationContext) {
    for side in 0..2 {
        let other = 1 - side;
        let holder = ex.ids[side];
        let target = ex.ids[other];
        if ex.shielded[other] {
            continue;
        }
        let free = entities[holder.index()].status.link.is_none()
            && entities[target.index()].status.link.is_none();
        let Some(Ability::Tether { latched }) = &mut entities[holder.index()].ability else {
            continue;
        };
        if !free || latched.contains(&target) {
            continue;
        }
        latched.push(target);
        entities[holder.index()].status.link = Some(Link {
            partner: target,
            ticks_left: TETHER_TICKS,
        });
        entities[target.index()].status.link = Some(Link {
            partner: holder,
            ticks_left: TETHER_TICKS,
        });
        let text = format!("latches onto {}", entities[target.index()].label);
        announce(ctx, &entities[holder.index()], AbilityKind::Tether, text);
    }
}

fn infection(ex: &mut Exchange, entities: &mut [Entity], ctx: &mut SimulationContext) {
    for side in 0..2 {
        let other = 1 - side;
        let holder = ex.ids[side];
        let host = ex.ids[other];
        if ex.shielded[other] || entities[holder.index()].is_hidden() {
            continue;
        }
        let ready = matches!(entities[holder.index()].ability, Some(Ability::Parasite { host: None, .. }));
        let host_taken = entities
            .iter()
            .any(|e| e.alive && e.status.hidden_in == Some(host));
        if !ready || host_taken || entities[host.index()].is_hidden() {
            continue;
        }

        let host_pos = entities[host.index()].pos;
        let parasite = &mut entities[holder.index()];
        parasite.ability = Some(Ability::Parasite {
            host: Some(host),
            emerge_in: PARASITE_INCUBATION,
        });
        parasite.status.hidden_in = Some(host);
        parasite.pos = host_pos;
        parasite.vel = glam::Vec2::ZERO;
        let text = format!("burrows into {}", entities[host.index()].label);
        announce(ctx, &entities[holder.index()], AbilityKind::Parasite, text);
        // A hidden parasite takes no further part in this collision
        ex.shares[side] = 0.0;
        ex.base_damage[side] = 0.0;
        ex.bonus_damage[side] = 0.0;
    }
}

/// Post-application bookkeeping: ability copies and attacker memory
pub fn finish(ex: &mut Exchange, entities: &mut [Entity], ctx: &mut SimulationContext) {
    for side in 0..2 {
        let other = 1 - side;
        let idx = ex.ids[side].index();
        if let Some(copied) = ex.pending_copy[side].take() {
            let kind = copied.kind();
            let source = entities[ex.ids[other].index()].label.clone();
            let via = entities[idx].kind().unwrap_or(AbilityKind::Mirror);
            entities[idx].ability = Some(copied);
            announce(ctx, &entities[idx], via, format!("copies {kind} from {source}"));
        }
        let attacker = ex.ids[other];
        match &mut entities[idx].ability {
            Some(Ability::Revenge { last_attacker }) | Some(Ability::Curse { last_attacker }) => {
                *last_attacker = Some(attacker);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arena::Arena;
    use crate::sim::collision::{collision_damage, resolve_pair};
    use crate::sim::entity::{EntrantProfile, Stats};
    use glam::Vec2;
    use rand::RngCore;

    /// RNG that always returns the same word: `random_bool` then always says
    /// yes (zeros) or always no (ones)
    struct FixedRng(u64);

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            self.0 as u32
        }
        fn next_u64(&mut self) -> u64 {
            self.0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for b in dest {
                *b = self.0 as u8;
            }
        }
    }

    fn always_trigger() -> SimulationContext {
        SimulationContext::with_rng(Box::new(FixedRng(0)), Arena::default())
    }

    fn never_trigger() -> SimulationContext {
        SimulationContext::with_rng(Box::new(FixedRng(u64::MAX)), Arena::default())
    }

    fn stats() -> Stats {
        Stats {
            spin_power: 5.0,
            attack: 10.0,
            defense: 10.0,
            max_stamina: 100.0,
            weight: 10.0,
        }
    }

    fn pair(a: Option<AbilityKind>, b: Option<AbilityKind>) -> Vec<Entity> {
        let make = |id: u32, label: &str, ability, pos, vel| {
            let profile = EntrantProfile {
                label: label.into(),
                stats: stats(),
                ability,
            };
            Entity::spawn(EntityId(id), &profile, pos, vel)
        };
        vec![
            make(0, "left", a, Vec2::new(-29.0, 0.0), Vec2::new(10.0, 0.0)),
            make(1, "right", b, Vec2::new(29.0, 0.0), Vec2::new(-10.0, 0.0)),
        ]
    }

    fn base() -> f32 {
        collision_damage(&stats(), &stats(), 20.0)
    }

    #[test]
    fn test_stage_order_is_fixed() {
        let names: Vec<_> = PIPELINE.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            [
                "target_amplifiers",
                "immunity",
                "bounce",
                "flat_modifiers",
                "conditional_modifiers",
                "probabilistic_triggers",
                "stored_energy",
                "position_swap",
                "damage_over_time",
                "life_drain",
                "size_mutation",
                "latch",
                "infection",
            ]
        );
    }

    #[test]
    fn test_each_ability_belongs_to_at_most_one_stage() {
        for kind in AbilityKind::ALL {
            let count = PIPELINE.iter().filter(|s| s.members.contains(&kind)).count()
                + PASS_THROUGH.iter().filter(|k| **k == kind).count();
            assert!(count <= 1, "{kind} appears in {count} stages");
        }
    }

    #[test]
    fn test_glass_cannon_hits_harder_and_breaks_easier() {
        let mut ctx = never_trigger();
        let mut list = pair(Some(AbilityKind::GlassCannon), None);
        resolve_pair(&mut list, 0, 1, &mut ctx);
        assert!((list[1].stamina - (100.0 - base() * 1.8)).abs() < 1e-3);
        assert!((list[0].stamina - (100.0 - base() * 1.5)).abs() < 1e-3);
    }

    #[test]
    fn test_immune_ignores_opponent_multipliers() {
        let mut ctx = always_trigger();
        let mut list = pair(Some(AbilityKind::Immune), Some(AbilityKind::Critical));
        resolve_pair(&mut list, 0, 1, &mut ctx);
        // Base collision damage only
        assert!((list[0].stamina - (100.0 - base())).abs() < 1e-3);
    }

    #[test]
    fn test_immune_blocks_swap_and_venom() {
        let mut ctx = always_trigger();
        let mut list = pair(Some(AbilityKind::Immune), Some(AbilityKind::Swapper));
        resolve_pair(&mut list, 0, 1, &mut ctx);
        assert!(list[0].pos.x < list[1].pos.x, "positions not swapped");

        let mut list = pair(Some(AbilityKind::Immune), Some(AbilityKind::Venom));
        resolve_pair(&mut list, 0, 1, &mut ctx);
        assert_eq!(list[0].status.poison_ticks, 0);
        assert_eq!(list[1].status.poison_ticks, 0);
    }

    #[test]
    fn test_swapper_trades_places() {
        let mut ctx = always_trigger();
        let mut list = pair(Some(AbilityKind::Swapper), None);
        resolve_pair(&mut list, 0, 1, &mut ctx);
        assert!(list[0].pos.x > list[1].pos.x);
        // Knockback still pushes them apart after the swap
        assert!(list[0].vel.x > 0.0 && list[1].vel.x < 0.0);
    }

    #[test]
    fn test_juggernaut_takes_damage_but_no_knockback() {
        let mut ctx = never_trigger();
        let mut list = pair(Some(AbilityKind::Juggernaut), None);
        resolve_pair(&mut list, 0, 1, &mut ctx);
        assert!((list[0].vel.x - 10.0).abs() < 1e-4);
        assert!(list[0].stamina < 100.0);
    }

    /// Order-sensitive pair: a dodge zeroes everything received, so the
    /// counter's 1.5x on the dodger multiplies zero
    #[test]
    fn test_dodge_and_counter_on_same_hit() {
        let mut ctx = always_trigger();
        let mut list = pair(Some(AbilityKind::Dodge), Some(AbilityKind::Counter));
        resolve_pair(&mut list, 0, 1, &mut ctx);
        assert!((list[0].stamina - 100.0).abs() < 1e-4, "dodge wins");
        assert!((list[1].stamina - (100.0 - base() * 0.5)).abs() < 1e-3);
    }

    /// Order-sensitive pair: rage and glass cannon stack multiplicatively
    #[test]
    fn test_rage_stacks_with_glass_cannon() {
        let mut ctx = never_trigger();
        let mut list = pair(Some(AbilityKind::Rage), Some(AbilityKind::GlassCannon));
        list[0].stamina = 20.0;
        resolve_pair(&mut list, 0, 1, &mut ctx);
        let expected = 100.0 - base() * 2.0 * 1.5;
        assert!((list[1].stamina - expected).abs() < 1e-3);
    }

    #[test]
    fn test_capacitor_releases_on_next_hit() {
        let mut ctx = never_trigger();
        let mut list = pair(Some(AbilityKind::Capacitor), None);
        resolve_pair(&mut list, 0, 1, &mut ctx);
        let stored = match list[0].ability {
            Some(Ability::Capacitor { stored }) => stored,
            _ => panic!("capacitor state lost"),
        };
        assert!((stored - base()).abs() < 1e-3);

        let after_first = list[1].stamina;
        list[0].pos = Vec2::new(-29.0, 0.0);
        list[1].pos = Vec2::new(29.0, 0.0);
        list[0].vel = Vec2::new(10.0, 0.0);
        list[1].vel = Vec2::new(-10.0, 0.0);
        resolve_pair(&mut list, 0, 1, &mut ctx);
        assert!((after_first - list[1].stamina - (base() + stored)).abs() < 1e-3);
    }

    #[test]
    fn test_mirror_deep_copies_current_state() {
        let mut ctx = never_trigger();
        let mut list = pair(Some(AbilityKind::Mirror), Some(AbilityKind::Rebound));
        list[1].ability = Some(Ability::Rebound { saves_left: 1 });
        resolve_pair(&mut list, 0, 1, &mut ctx);
        assert_eq!(list[0].ability, Some(Ability::Rebound { saves_left: 1 }));

        // Mutating the copy leaves the source alone
        if let Some(Ability::Rebound { saves_left }) = &mut list[0].ability {
            *saves_left = 0;
        }
        assert_eq!(list[1].ability, Some(Ability::Rebound { saves_left: 1 }));
    }

    #[test]
    fn test_copies_never_take_from_shielded() {
        let mut ctx = always_trigger();
        for copier in [AbilityKind::Mirror, AbilityKind::Copycat] {
            let mut list = pair(Some(copier), Some(AbilityKind::Immune));
            resolve_pair(&mut list, 0, 1, &mut ctx);
            assert_eq!(list[0].kind(), Some(copier), "{copier:?} copied an immune ability");
            assert_eq!(list[1].kind(), Some(AbilityKind::Immune));
        }
    }

    #[test]
    fn test_tether_never_relatches_same_pair() {
        let mut ctx = never_trigger();
        let mut list = pair(Some(AbilityKind::Tether), None);
        resolve_pair(&mut list, 0, 1, &mut ctx);
        assert!(list[0].status.link.is_some());

        list[0].status.link = None;
        list[1].status.link = None;
        list[0].pos = Vec2::new(-29.0, 0.0);
        list[1].pos = Vec2::new(29.0, 0.0);
        resolve_pair(&mut list, 0, 1, &mut ctx);
        assert!(list[0].status.link.is_none());
    }

    #[test]
    fn test_parasite_hides_in_host() {
        let mut ctx = never_trigger();
        let mut list = pair(Some(AbilityKind::Parasite), None);
        resolve_pair(&mut list, 0, 1, &mut ctx);
        assert_eq!(list[0].status.hidden_in, Some(EntityId(1)));
        assert!(matches!(
            list[0].ability,
            Some(Ability::Parasite { host: Some(EntityId(1)), .. })
        ));
    }

    #[test]
    fn test_grower_capped() {
        let mut ctx = never_trigger();
        let mut list = pair(Some(AbilityKind::Grower), None);
        list[0].radius = MAX_RADIUS - 0.5;
        list[0].pos = Vec2::new(-60.0, 0.0);
        resolve_pair(&mut list, 0, 1, &mut ctx);
        assert!((list[0].radius - MAX_RADIUS).abs() < 1e-5);
    }

    #[test]
    fn test_vampire_transfers_stamina() {
        let mut ctx = never_trigger();
        let mut list = pair(Some(AbilityKind::Vampire), None);
        list[0].stamina = 50.0;
        resolve_pair(&mut list, 0, 1, &mut ctx);
        let drained = VAMPIRE_DRAIN * base();
        assert!((list[0].stamina - (50.0 + drained - base())).abs() < 1e-3);
        assert!((list[1].stamina - (100.0 - base() - drained)).abs() < 1e-3);
    }
}
